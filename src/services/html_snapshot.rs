//! Static-HTML document context for the DOM-structure detection tier.
//!
//! The live extension queries the page; outside a browser the same questions
//! are answered from an HTML string using a light tag scanner. Only the
//! selector forms the detector needs are supported: `tag`, `.class`, `#id`,
//! `[attr]`, `[attr="value"]`, and compounds of them such as
//! `nav[aria-label="breadcrumb"]`.

use std::collections::HashMap;

/// Read access to a document, as needed by detection.
pub trait DomContext {
    /// Whether at least one element matches `selector`.
    fn has_selector(&self, selector: &str) -> bool;

    /// Trimmed text of the first `<h1>`, or `None` when the page has none.
    fn first_heading_text(&self) -> Option<String>;
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attrs: HashMap<String, String>,
}

impl Element {
    fn classes(&self) -> impl Iterator<Item = &str> {
        self.attrs
            .get("class")
            .map(|c| c.split_whitespace())
            .into_iter()
            .flatten()
    }
}

/// A parsed snapshot of a page's opening tags and first heading.
#[derive(Debug, Clone, Default)]
pub struct HtmlSnapshot {
    elements: Vec<Element>,
    first_heading: Option<String>,
}

impl HtmlSnapshot {
    pub fn parse(html: &str) -> Self {
        let mut elements = Vec::new();
        let mut first_heading = None;
        let mut rest = html;

        while let Some(start) = rest.find('<') {
            rest = &rest[start..];
            if rest.starts_with("<!--") {
                rest = match rest.find("-->") {
                    Some(end) => &rest[end + 3..],
                    None => "",
                };
                continue;
            }
            let Some(end) = rest.find('>') else { break };
            let inner = &rest[1..end];
            rest = &rest[end + 1..];

            if inner.starts_with('/') || inner.starts_with('!') || inner.starts_with('?') {
                continue;
            }
            let Some(element) = parse_open_tag(inner) else {
                continue;
            };
            if element.tag == "h1" && first_heading.is_none() {
                let body = match find_ignore_ascii_case(rest, "</h1") {
                    Some(close) => &rest[..close],
                    None => rest,
                };
                first_heading = Some(collapse_whitespace(&decode_entities(&strip_tags(body))));
            }
            if element.tag == "script" || element.tag == "style" {
                let close = format!("</{}", element.tag);
                if let Some(pos) = find_ignore_ascii_case(rest, &close) {
                    rest = &rest[pos..];
                }
            }
            elements.push(element);
        }

        Self {
            elements,
            first_heading,
        }
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }
}

impl DomContext for HtmlSnapshot {
    fn has_selector(&self, selector: &str) -> bool {
        match SimpleSelector::parse(selector) {
            Some(sel) => self.elements.iter().any(|el| sel.matches(el)),
            None => false,
        }
    }

    fn first_heading_text(&self) -> Option<String> {
        self.first_heading.clone()
    }
}

/// Byte offset of the first ASCII case-insensitive match of `needle`.
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

fn parse_open_tag(inner: &str) -> Option<Element> {
    let inner = inner.trim_end_matches('/').trim();
    let name_end = inner
        .find(|c: char| c.is_whitespace())
        .unwrap_or(inner.len());
    let tag = inner[..name_end].to_ascii_lowercase();
    if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return None;
    }
    Some(Element {
        tag,
        attrs: parse_attributes(&inner[name_end..]),
    })
}

fn parse_attributes(mut input: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    loop {
        input = input.trim_start();
        if input.is_empty() {
            break;
        }
        let name_end = input
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(input.len());
        let name = input[..name_end].to_ascii_lowercase();
        input = input[name_end..].trim_start();

        let value = if let Some(after_eq) = input.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            match after_eq.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let body = &after_eq[1..];
                    let close = body.find(quote).unwrap_or(body.len());
                    input = body.get(close + 1..).unwrap_or("");
                    body[..close].to_string()
                }
                _ => {
                    let end = after_eq
                        .find(char::is_whitespace)
                        .unwrap_or(after_eq.len());
                    input = &after_eq[end..];
                    after_eq[..end].to_string()
                }
            }
        } else {
            String::new()
        };

        if !name.is_empty() {
            attrs.entry(name).or_insert(value);
        }
    }
    attrs
}

/// Strips HTML tags to get plain text.
fn strip_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    result
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One compound selector: optional tag plus any number of class, id and
/// attribute conditions.
#[derive(Debug, Default)]
struct SimpleSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

impl SimpleSelector {
    fn parse(selector: &str) -> Option<Self> {
        let selector = selector.trim();
        if selector.is_empty() || selector.contains(char::is_whitespace) && !selector.contains('[') {
            return None;
        }
        let mut sel = SimpleSelector::default();
        let mut rest = selector;

        let tag_end = rest.find(['.', '#', '[']).unwrap_or(rest.len());
        if tag_end > 0 {
            sel.tag = Some(rest[..tag_end].to_ascii_lowercase());
        }
        rest = &rest[tag_end..];

        while let Some(first) = rest.chars().next() {
            match first {
                '.' | '#' => {
                    let body = &rest[1..];
                    let end = body.find(['.', '#', '[']).unwrap_or(body.len());
                    let name = body[..end].to_string();
                    if name.is_empty() {
                        return None;
                    }
                    if first == '.' {
                        sel.classes.push(name);
                    } else {
                        sel.id = Some(name);
                    }
                    rest = &body[end..];
                }
                '[' => {
                    let close = rest.find(']')?;
                    let body = &rest[1..close];
                    let condition = match body.split_once('=') {
                        Some((name, value)) => {
                            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                            (name.trim().to_ascii_lowercase(), Some(value.to_string()))
                        }
                        None => (body.trim().to_ascii_lowercase(), None),
                    };
                    sel.attrs.push(condition);
                    rest = &rest[close + 1..];
                }
                _ => return None,
            }
        }
        Some(sel)
    }

    fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if &element.tag != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.attrs.get("id") != Some(id) {
                return false;
            }
        }
        if !self
            .classes
            .iter()
            .all(|class| element.classes().any(|c| c == class))
        {
            return false;
        }
        self.attrs.iter().all(|(name, expected)| match expected {
            Some(value) => element.attrs.get(name) == Some(value),
            None => element.attrs.contains_key(name),
        })
    }
}
