//! quick-xml event stream -> arena tree.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{Attribute, Document, Element, NodeKind, DOCUMENT};
use crate::error::{EditError, Result};

pub(super) fn parse(text: &str) -> Result<Document> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(false);

    let mut doc = Document::empty();
    let mut open = vec![DOCUMENT];

    loop {
        let parent = open.last().copied().unwrap_or(DOCUMENT);
        let kind = match reader.read_event()? {
            Event::Start(e) => {
                let node = doc.create_element(element_from(&e, false)?);
                doc.append_child(parent, node);
                open.push(node);
                continue;
            }
            Event::Empty(e) => NodeKind::Element(element_from(&e, true)?),
            Event::End(e) => {
                if open.len() <= 1 {
                    let qname = e.name();
                    let name = utf8(qname.as_ref())?;
                    return Err(EditError::UnexpectedEnd(name.to_string()));
                }
                open.pop();
                continue;
            }
            Event::Text(e) => NodeKind::Text(utf8(&e)?.to_string()),
            Event::GeneralRef(e) => NodeKind::Text(format!("&{};", utf8(&e)?)),
            Event::CData(e) => NodeKind::CData(utf8(&e)?.to_string()),
            Event::Comment(e) => NodeKind::Comment(utf8(&e)?.to_string()),
            Event::Decl(e) => NodeKind::Markup(format!("<?{}?>", utf8(&e)?)),
            Event::PI(e) => NodeKind::Markup(format!("<?{}?>", utf8(&e)?)),
            Event::DocType(e) => NodeKind::Markup(format!("<!DOCTYPE {}>", utf8(&e)?)),
            Event::Eof => break,
        };
        let node = doc.push(kind);
        doc.append_child(parent, node);
    }

    if let Some(&unclosed) = open.last().filter(|&&node| node != DOCUMENT) {
        let name = doc
            .element(unclosed)
            .map(|el| el.name().to_string())
            .unwrap_or_default();
        return Err(EditError::Unclosed(name));
    }
    if doc.root().is_none() {
        return Err(EditError::NoRoot);
    }
    Ok(doc)
}

fn element_from(start: &BytesStart, self_closing: bool) -> Result<Element> {
    let name = utf8(start.name().as_ref())?.to_string();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let raw = utf8(&attr.value)?;
        let value = quick_xml::escape::unescape(raw)
            .map(Cow::into_owned)
            .unwrap_or_else(|_| raw.to_string());
        attributes.push(Attribute {
            name: utf8(attr.key.as_ref())?.to_string(),
            value,
            raw: Some(raw.to_string()),
        });
    }
    Ok(Element {
        name,
        attributes,
        raw_start: Some(utf8(start)?.to_string()),
        self_closing,
    })
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    Ok(std::str::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_are_unescaped() {
        let doc = parse(r#"<svg><text id="t" data-x="a &amp; b"/></svg>"#).unwrap();
        let node = doc.find_by_id("t").unwrap();
        assert_eq!(doc.element(node).unwrap().attr("data-x"), Some("a & b"));
    }

    #[test]
    fn test_prolog_and_doctype_survive() {
        let text = "<?xml version=\"1.0\"?>\n<!DOCTYPE svg>\n<svg/>";
        let doc = parse(text).unwrap();
        assert_eq!(doc.serialize(), text);
    }

    #[test]
    fn test_stray_end_tag_is_an_error() {
        assert!(matches!(
            parse("<svg/></g>"),
            Err(EditError::UnexpectedEnd(_)) | Err(EditError::Xml(_))
        ));
    }

    #[test]
    fn test_unclosed_element_is_an_error() {
        assert!(matches!(
            parse("<svg><g>"),
            Err(EditError::Unclosed(_)) | Err(EditError::Xml(_))
        ));
    }
}
