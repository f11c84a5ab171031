//! Shadow-DOM flattening.
//!
//! Standard tree cloning never crosses a shadow boundary, so content rendered
//! by web components is invisible to anything that walks the light DOM. This
//! module serializes a page with every open shadow root and `<slot>`
//! projection resolved into ordinary nodes.
//!
//! Shadow roots arrive in their declarative form: a
//! `<template shadowrootmode="open">` child of the host element. Closed roots
//! are as unreachable here as `element.shadowRoot` makes them in a browser.
//!
//! Slot assignment follows the host's light-DOM children: a named slot takes
//! the children whose `slot` attribute equals its name, the default slot takes
//! the unnamed element children and the non-blank text. Assignment is
//! flattened, so a slot projected into another slot resolves through its own
//! host.
//!
//! # Example
//!
//! ```rust
//! use mdyoink_core::{Document, shadow::flatten};
//!
//! let html = r#"<body><x-card><template shadowrootmode="open">
//!     <h2><slot name="title">Untitled</slot></h2>
//! </template><span slot="title">Hello</span></x-card></body>"#;
//!
//! let doc = Document::parse(html).unwrap();
//! let flat = flatten(&doc).unwrap();
//! let body = flat.body().unwrap().inner_html();
//! assert!(body.contains("<span slot=\"title\">Hello</span>"));
//! assert!(!body.contains("Untitled"));
//! ```

use ego_tree::NodeRef;
use scraper::{ElementRef, Node};
use tracing::debug;

use crate::Result;
use crate::parse::{Document, Element};

/// Elements whose text children are emitted without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "xmp", "iframe", "noembed", "noframes", "noscript", "plaintext"];

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

/// Produces a document in which shadow roots and slots are ordinary nodes.
///
/// Without any open shadow root the result is a plain deep clone. Otherwise
/// the `<head>` is kept verbatim and the `<body>` is re-serialized shadow-aware
/// and re-parsed into a fresh document.
pub fn flatten(doc: &Document) -> Result<Document> {
    if !has_shadow_roots(doc) {
        return Ok(doc.clone());
    }

    let head = doc.head().map(|head| head.inner_html()).unwrap_or_default();
    let body = doc.body().map(|body| inner_html_with_shadows(&body)).unwrap_or_default();
    debug!(head_len = head.len(), body_len = body.len(), "flattened shadow roots");

    Document::parse(&format!("<!DOCTYPE html><html><head>{head}</head><body>{body}</body></html>"))
}

/// Whether any element of the document hosts an open shadow root.
pub fn has_shadow_roots(doc: &Document) -> bool {
    doc.html()
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .any(|el| open_shadow_root(el).is_some())
}

/// Serializes an element's children with shadow roots and slots resolved.
///
/// The element's own shadow root, if any, is *not* entered; see
/// [`shadow_root_html`] for that.
pub fn inner_html_with_shadows(element: &Element<'_>) -> String {
    let mut out = String::new();
    write_children(&mut out, element.element_ref(), &mut Vec::new());
    out
}

/// Serializes the contents of an element's open shadow root, if it has one.
pub fn shadow_root_html(element: &Element<'_>) -> Option<String> {
    let host = element.element_ref();
    let root = open_shadow_root(host)?;
    let mut out = String::new();
    let mut hosts = vec![host];
    write_nodes(&mut out, shadow_root_nodes(root), false, &mut hosts);
    Some(out)
}

/// Length in characters of the text a browser's `textContent` would report:
/// light-DOM text only, template contents excluded.
pub fn light_text_len(element: &Element<'_>) -> usize {
    fn walk(element: ElementRef<'_>, total: &mut usize) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => *total += text.chars().count(),
                Node::Element(el) if el.name() == "template" => {}
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        walk(child, total);
                    }
                }
                _ => {}
            }
        }
    }

    let mut total = 0;
    walk(element.element_ref(), &mut total);
    total
}

/// Finds the declarative template holding an element's open shadow root.
fn open_shadow_root(host: ElementRef<'_>) -> Option<ElementRef<'_>> {
    host.children()
        .filter_map(ElementRef::wrap)
        .find(|child| shadow_mode(*child).is_some_and(|mode| mode.eq_ignore_ascii_case("open")))
}

/// Top-level nodes of a shadow root. The parser keeps template contents in a
/// fragment node under the `<template>` element, not as its direct children.
fn shadow_root_nodes<'a>(template: ElementRef<'a>) -> impl Iterator<Item = NodeRef<'a, Node>> {
    template
        .children()
        .filter(|child| child.value().is_fragment())
        .flat_map(|fragment| fragment.children())
}

fn shadow_mode(element: ElementRef<'_>) -> Option<&str> {
    let el = element.value();
    if el.name() != "template" {
        return None;
    }
    el.attr("shadowrootmode").or_else(|| el.attr("shadowroot"))
}

/// A node projected into a slot.
enum Slotted<'a> {
    Element(ElementRef<'a>),
    Text(&'a str),
}

/// Collects the light-DOM children of `host` assigned to `slot`.
fn assigned_nodes<'a>(host: ElementRef<'a>, slot: ElementRef<'a>) -> Vec<Slotted<'a>> {
    let name = slot.value().attr("name").unwrap_or("");
    let mut assigned = Vec::new();

    for child in host.children() {
        match child.value() {
            Node::Text(text) if name.is_empty() && !text.trim().is_empty() => assigned.push(Slotted::Text(&**text)),
            Node::Element(_) => {
                let Some(el) = ElementRef::wrap(child) else { continue };
                if shadow_mode(el).is_some() {
                    continue;
                }
                if el.value().attr("slot").unwrap_or("") == name {
                    assigned.push(Slotted::Element(el));
                }
            }
            _ => {}
        }
    }

    assigned
}

/// `hosts` is the stack of shadow hosts whose shadow trees enclose the nodes
/// being written; the innermost host owns any slot we meet.
fn write_children<'a>(out: &mut String, parent: ElementRef<'a>, hosts: &mut Vec<ElementRef<'a>>) {
    let raw = RAW_TEXT_ELEMENTS.contains(&parent.value().name());
    write_nodes(out, parent.children(), raw, hosts);
}

fn write_nodes<'a>(
    out: &mut String, nodes: impl Iterator<Item = NodeRef<'a, Node>>, raw: bool, hosts: &mut Vec<ElementRef<'a>>,
) {
    for child in nodes {
        match child.value() {
            Node::Text(text) => write_text(out, text, raw),
            Node::Element(_) => {
                let Some(el) = ElementRef::wrap(child) else { continue };
                if shadow_mode(el).is_some() {
                    continue;
                }
                if el.value().name() == "slot" {
                    write_slot(out, el, hosts);
                } else {
                    write_element(out, el, hosts);
                }
            }
            _ => {}
        }
    }
}

fn write_element<'a>(out: &mut String, element: ElementRef<'a>, hosts: &mut Vec<ElementRef<'a>>) {
    let el = element.value();
    let tag = el.name();

    out.push('<');
    out.push_str(tag);
    for (name, value) in el.attrs() {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&tag) {
        return;
    }

    if let Some(root) = open_shadow_root(element) {
        hosts.push(element);
        write_nodes(out, shadow_root_nodes(root), false, hosts);
        hosts.pop();
    } else {
        write_children(out, element, hosts);
    }

    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_slot<'a>(out: &mut String, slot: ElementRef<'a>, hosts: &mut Vec<ElementRef<'a>>) {
    let assigned = match hosts.last() {
        Some(host) => assigned_nodes(*host, slot),
        None => Vec::new(),
    };

    if assigned.is_empty() {
        write_children(out, slot, hosts);
        return;
    }

    // Projected nodes belong to the host's own tree, one level out.
    let host = hosts.pop();
    for node in assigned {
        match node {
            Slotted::Text(text) => write_text(out, text, false),
            Slotted::Element(el) if el.value().name() == "slot" => write_slot(out, el, hosts),
            Slotted::Element(el) => write_element(out, el, hosts),
        }
    }
    if let Some(host) = host {
        hosts.push(host);
    }
}

fn write_text(out: &mut String, text: &str, raw: bool) {
    if raw {
        out.push_str(text);
        return;
    }
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
