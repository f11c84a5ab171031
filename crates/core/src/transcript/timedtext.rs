//! Timed-text caption parsing.
//!
//! A caption track is an XML document of `<text start=".." dur="..">` cues.
//! Cue text is often HTML-escaped on top of the XML escaping, so a second
//! entity pass runs after the XML parser has done its own.

use sxd_document::parser;
use sxd_xpath::nodeset::Node;
use sxd_xpath::{Context, Factory, Value};

use crate::result::TranscriptSegment;
use crate::{Result, YoinkError};

/// Parses a timed-text document into ordered, non-empty segments.
///
/// Missing, malformed or negative `start`/`dur` values read as 0.
///
/// # Errors
///
/// Returns [`YoinkError::TimedTextError`] if the document is not well-formed
/// XML.
pub fn parse_timed_text(xml: &str) -> Result<Vec<TranscriptSegment>> {
    let package = parser::parse(xml).map_err(|e| YoinkError::TimedTextError(e.to_string()))?;
    let xpath = Factory::new()
        .build("//text")
        .map_err(|e| YoinkError::TimedTextError(e.to_string()))?
        .ok_or_else(|| YoinkError::TimedTextError("empty XPath".to_string()))?;

    let value = xpath
        .evaluate(&Context::new(), package.as_document().root())
        .map_err(|e| YoinkError::TimedTextError(e.to_string()))?;

    let Value::Nodeset(nodes) = value else {
        return Ok(Vec::new());
    };

    let segments = nodes
        .document_order()
        .into_iter()
        .filter_map(|node| {
            let Node::Element(element) = node else {
                return None;
            };
            let text = decode_entities(&node.string_value()).replace('\n', " ");
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            Some(TranscriptSegment::new(
                seconds(element.attribute_value("start")),
                seconds(element.attribute_value("dur")),
                text,
            ))
        })
        .collect();

    Ok(segments)
}

fn seconds(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

/// Decodes the five entities caption text is escaped with.
///
/// `&amp;` is decoded before the other named entities, so a double-escaped
/// `&amp;lt;` ends up as `<`.
pub fn decode_entities(text: &str) -> String {
    text.replace("&#39;", "'")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
}
