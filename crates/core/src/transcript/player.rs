//! Locating the embedded player response.
//!
//! Video pages ship their metadata as a JSON object assigned to a global in
//! one of many inline scripts. The assignment is found by pattern matching,
//! which is fragile by nature, so it sits behind [`PlayerResponseSource`].

use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::parse::Document;
use crate::{Result, YoinkError};

static PLAYER_RESPONSE_STRICT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)ytInitialPlayerResponse\s*=\s*(\{.+?\});").unwrap());
static PLAYER_RESPONSE_PERMISSIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)ytInitialPlayerResponse\s*=\s*(\{.+\})\s*;").unwrap());

/// No script on the page held a parseable player response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("player response not found")]
pub struct PlayerDataNotFound;

/// Finds the player response object of a video page.
pub trait PlayerResponseSource: Send + Sync {
    fn locate(&self, doc: &Document) -> std::result::Result<Value, PlayerDataNotFound>;
}

/// Reads a JSON object assigned to a global variable in an inline script.
///
/// Every script is first tried with a lazy match up to the first `};`, which
/// is right for the common single-statement case. Only if no script yields
/// valid JSON that way are they tried again with a greedy match up to the
/// last `}` followed by `;`.
#[derive(Debug, Clone)]
pub struct ScriptAssignment {
    strict: Regex,
    permissive: Regex,
}

impl ScriptAssignment {
    pub const DEFAULT_VARIABLE: &'static str = "ytInitialPlayerResponse";

    /// Matches assignments to `variable`, which is taken literally.
    ///
    /// # Errors
    ///
    /// Returns [`YoinkError::ConfigError`] when the name makes the pattern
    /// exceed the regex size limit.
    pub fn new(variable: &str) -> Result<Self> {
        let name = regex::escape(variable);
        Ok(Self {
            strict: compile(&format!(r"(?s){name}\s*=\s*(\{{.+?\}});"))?,
            permissive: compile(&format!(r"(?s){name}\s*=\s*(\{{.+\}})\s*;"))?,
        })
    }
}

impl Default for ScriptAssignment {
    fn default() -> Self {
        Self { strict: PLAYER_RESPONSE_STRICT_RE.clone(), permissive: PLAYER_RESPONSE_PERMISSIVE_RE.clone() }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| YoinkError::ConfigError(format!("Invalid player variable pattern: {e}")))
}

impl PlayerResponseSource for ScriptAssignment {
    fn locate(&self, doc: &Document) -> std::result::Result<Value, PlayerDataNotFound> {
        let scripts = script_texts(doc);

        for (pass, pattern) in [("strict", &self.strict), ("permissive", &self.permissive)] {
            for script in &scripts {
                let Some(json) = pattern.captures(script).and_then(|c| c.get(1)) else {
                    continue;
                };
                if let Ok(value) = serde_json::from_str::<Value>(json.as_str())
                    && value.is_object()
                {
                    debug!(pass, "player response located");
                    return Ok(value);
                }
            }
        }

        Err(PlayerDataNotFound)
    }
}

fn script_texts(doc: &Document) -> Vec<String> {
    let Ok(selector) = Selector::parse("script") else {
        return Vec::new();
    };
    doc.html()
        .select(&selector)
        .map(|script| script.text().collect::<String>())
        .filter(|text| !text.is_empty())
        .collect()
}
