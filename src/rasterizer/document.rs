//! Minimal SVG document editing.
//!
//! Only the root element's start tag is ever rewritten, so edits are done on
//! the source text. roxmltree validates the document and locates the root.

use std::ops::Range;

use roxmltree::Document;

use crate::error::{Result, SvgfxError};

use super::size::{self, IntrinsicSize};

/// An SVG document held as text.
#[derive(Debug, Clone)]
pub struct SvgDocument {
    label: String,
    text: String,
}

/// An attribute found in the root start tag.
struct RawAttribute {
    name: Range<usize>,
    value: Range<usize>,
}

impl SvgDocument {
    /// Decodes and validates SVG source.
    ///
    /// Fails with a transcoding error if the data is not UTF-8 XML with an
    /// `<svg>` root element.
    pub fn parse(label: impl Into<String>, data: &[u8]) -> Result<Self> {
        let label = label.into();
        let text = std::str::from_utf8(data)
            .map_err(|e| SvgfxError::transcode(&label, e))?
            .trim_start_matches('\u{feff}')
            .to_string();

        {
            let doc = Document::parse(&text).map_err(|e| SvgfxError::transcode(&label, e))?;
            let root = doc.root_element();
            if !root.tag_name().name().eq_ignore_ascii_case("svg") {
                return Err(SvgfxError::transcode(
                    &label,
                    format!("root element is <{}>, expected <svg>", root.tag_name().name()),
                ));
            }
        }

        Ok(Self { label, text })
    }

    /// Resource path or caller label used in diagnostics.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The current source text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Intrinsic size declared by the root element, if any.
    pub fn intrinsic_size(&self) -> Option<IntrinsicSize> {
        size::intrinsic_size(&self.text)
    }

    /// Value of a root attribute as written in the source (entities not decoded).
    pub fn root_attribute(&self, name: &str) -> Option<&str> {
        let tag = self.root_start_tag().ok()?;
        let tag_text = &self.text[tag.clone()];
        scan_attributes(tag_text)
            .into_iter()
            .find(|attr| &tag_text[attr.name.clone()] == name)
            .map(|attr| &tag_text[attr.value])
    }

    /// Sets an attribute on the root element, replacing an existing value.
    pub fn set_root_attribute(&mut self, name: &str, value: &str) -> Result<()> {
        let tag = self.root_start_tag()?;
        let tag_text = &self.text[tag.clone()];
        let escaped = escape_attribute(value);

        let existing = scan_attributes(tag_text)
            .into_iter()
            .find(|attr| &tag_text[attr.name.clone()] == name);

        match existing {
            Some(attr) => {
                let start = tag.start + attr.value.start;
                let end = tag.start + attr.value.end;
                self.text.replace_range(start..end, &escaped);
            }
            None => {
                let insert_at = tag.start + tag_name_end(tag_text);
                self.text.insert_str(insert_at, &format!(" {name}=\"{escaped}\""));
            }
        }
        Ok(())
    }

    /// Byte range of the root element's start tag, `<svg` through `>`.
    fn root_start_tag(&self) -> Result<Range<usize>> {
        let doc = Document::parse(&self.text).map_err(|e| SvgfxError::transcode(&self.label, e))?;
        let start = doc.root_element().range().start;

        let mut quote = None;
        for (offset, byte) in self.text.as_bytes()[start..].iter().enumerate() {
            match (quote, *byte) {
                (None, b'"' | b'\'') => quote = Some(*byte),
                (Some(q), b) if b == q => quote = None,
                (None, b'>') => return Ok(start..start + offset + 1),
                _ => {}
            }
        }
        Err(SvgfxError::transcode(&self.label, "unterminated root start tag"))
    }
}

/// End offset of the element name inside a start tag.
fn tag_name_end(tag: &str) -> usize {
    tag.char_indices()
        .skip(1)
        .find(|(_, ch)| ch.is_whitespace() || *ch == '>' || *ch == '/')
        .map(|(idx, _)| idx)
        .unwrap_or(tag.len())
}

/// Tokenizes the attributes of a start tag.
fn scan_attributes(tag: &str) -> Vec<RawAttribute> {
    let bytes = tag.as_bytes();
    let mut attrs = Vec::new();
    let mut i = tag_name_end(tag);

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] == b'>' || bytes[i] == b'/' {
            break;
        }

        let name_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' {
            i += 1;
        }
        let name = name_start..i;

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            break;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || !matches!(bytes[i], b'"' | b'\'') {
            break;
        }

        let quote = bytes[i];
        let value_start = i + 1;
        let Some(len) = bytes[value_start..].iter().position(|b| *b == quote) else {
            break;
        };
        attrs.push(RawAttribute { name, value: value_start..value_start + len });
        i = value_start + len + 1;
    }

    attrs
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ICON: &str = r#"<?xml version="1.0"?>
<!-- comment with <svg> inside -->
<svg xmlns="http://www.w3.org/2000/svg" width="16" height="16" fill="currentColor" viewBox="0 0 16 16">
  <path fill-rule="evenodd" d="M0 0h16v16H0z"/>
</svg>"#;

    #[test]
    fn replaces_existing_root_attribute() {
        let mut doc = SvgDocument::parse("icon", ICON.as_bytes()).unwrap();
        doc.set_root_attribute("fill", "#ff0000").unwrap();

        assert_eq!(doc.root_attribute("fill"), Some("#ff0000"));
        assert!(doc.as_str().contains(r#"fill-rule="evenodd""#));
        assert!(!doc.as_str().contains("currentColor"));
    }

    #[test]
    fn inserts_missing_root_attribute() {
        let mut doc = SvgDocument::parse("icon", ICON.as_bytes()).unwrap();
        assert_eq!(doc.root_attribute("stroke"), None);

        doc.set_root_attribute("stroke", "#00ff00").unwrap();
        assert_eq!(doc.root_attribute("stroke"), Some("#00ff00"));
        // Child elements are untouched.
        assert!(doc.as_str().contains(r#"<path fill-rule="evenodd""#));
        assert!(Document::parse(doc.as_str()).is_ok());
    }

    #[test]
    fn single_quoted_and_spaced_attributes() {
        let svg = "<svg xmlns='http://www.w3.org/2000/svg' fill = 'blue' width='4' height='4'/>";
        let mut doc = SvgDocument::parse("q", svg.as_bytes()).unwrap();
        assert_eq!(doc.root_attribute("fill"), Some("blue"));
        doc.set_root_attribute("fill", "#123456").unwrap();
        assert_eq!(doc.root_attribute("fill"), Some("#123456"));
    }

    #[test]
    fn rejects_non_svg_documents() {
        let err = SvgDocument::parse("x", b"<html/>").unwrap_err();
        assert!(matches!(err, SvgfxError::Transcode { .. }));

        let err = SvgDocument::parse("x", b"not xml at all").unwrap_err();
        assert!(matches!(err, SvgfxError::Transcode { .. }));
    }

    #[test]
    fn intrinsic_size_is_read_from_root() {
        let doc = SvgDocument::parse("icon", ICON.as_bytes()).unwrap();
        assert_eq!(doc.intrinsic_size(), Some(IntrinsicSize::new(16.0, 16.0)));
    }
}
