//! Arena tree -> document text.

use super::{Document, Element, NodeId, NodeKind, DOCUMENT};

pub(super) fn serialize(doc: &Document) -> String {
    let mut out = String::new();
    write_node(doc, DOCUMENT, &mut out);
    out
}

fn write_node(doc: &Document, node: NodeId, out: &mut String) {
    match doc.kind(node) {
        NodeKind::Document => {
            for &child in doc.children(node) {
                write_node(doc, child, out);
            }
        }
        NodeKind::Element(el) => {
            out.push('<');
            match &el.raw_start {
                Some(raw) => out.push_str(raw),
                None => write_start_tag(el, out),
            }
            let children = doc.children(node);
            if children.is_empty() && el.self_closing {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for &child in children {
                write_node(doc, child, out);
            }
            out.push_str("</");
            out.push_str(el.name());
            out.push('>');
        }
        NodeKind::Text(text) => out.push_str(text),
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeKind::CData(text) => {
            out.push_str("<![CDATA[");
            out.push_str(text);
            out.push_str("]]>");
        }
        NodeKind::Markup(text) => out.push_str(text),
    }
}

fn write_start_tag(el: &Element, out: &mut String) {
    out.push_str(el.name());
    for attr in &el.attributes {
        out.push(' ');
        out.push_str(&attr.name);
        out.push('=');
        match &attr.raw {
            // A raw value can only contain the quote it was not wrapped in.
            Some(raw) => {
                let quote = if raw.contains('"') { '\'' } else { '"' };
                out.push(quote);
                out.push_str(raw);
                out.push(quote);
            }
            None => {
                out.push('"');
                out.push_str(&quick_xml::escape::escape(attr.value.as_str()));
                out.push('"');
            }
        }
    }
}
