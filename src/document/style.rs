//! Inline `style` attribute access.

use super::Element;

/// Split on `;` outside parentheses and quoted strings, so values such as
/// `url(data:image/png;base64,...)` stay whole.
fn split_top_level(style: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in style.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                parts.push(&style[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&style[start..]);
    parts
}

fn declarations(style: &str) -> impl Iterator<Item = (&str, &str)> {
    split_top_level(style)
        .into_iter()
        .filter_map(|decl| decl.split_once(':'))
        .map(|(prop, value)| (prop.trim(), value.trim()))
        .filter(|(prop, _)| !prop.is_empty())
}

fn join(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(prop, value)| format!("{prop}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

impl Element {
    /// Value of a declaration in the inline style.
    pub fn style(&self, property: &str) -> Option<&str> {
        declarations(self.attr("style")?)
            .find(|(prop, _)| prop.eq_ignore_ascii_case(property))
            .map(|(_, value)| value)
    }

    /// Set a declaration in the inline style, replacing any existing one.
    pub fn set_style(&mut self, property: &str, value: &str) {
        if self.style(property) == Some(value) {
            return;
        }
        let mut decls: Vec<(String, String)> = self
            .attr("style")
            .map(|style| {
                declarations(style)
                    .map(|(p, v)| (p.to_string(), v.to_string()))
                    .collect()
            })
            .unwrap_or_default();
        match decls.iter_mut().find(|(p, _)| p.eq_ignore_ascii_case(property)) {
            Some(decl) => decl.1 = value.to_string(),
            None => decls.push((property.to_string(), value.to_string())),
        }
        self.set_attr("style", &join(&decls));
    }

    /// Drop a declaration from the inline style; an emptied style attribute
    /// is removed. Returns whether anything changed.
    pub fn remove_style(&mut self, property: &str) -> bool {
        if self.style(property).is_none() {
            return false;
        }
        let decls: Vec<(String, String)> = self
            .attr("style")
            .map(|style| {
                declarations(style)
                    .filter(|(p, _)| !p.eq_ignore_ascii_case(property))
                    .map(|(p, v)| (p.to_string(), v.to_string()))
                    .collect()
            })
            .unwrap_or_default();
        if decls.is_empty() {
            self.remove_attr("style");
        } else {
            self.set_attr("style", &join(&decls));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_declaration() {
        let el = Element::new("rect").with_attr("style", "fill:#fff ; stroke: red");
        assert_eq!(el.style("fill"), Some("#fff"));
        assert_eq!(el.style("stroke"), Some("red"));
        assert_eq!(el.style("opacity"), None);
    }

    #[test]
    fn test_set_replaces_or_appends() {
        let mut el = Element::new("rect").with_attr("style", "fill: #fff");
        el.set_style("fill", "#000");
        el.set_style("transform-box", "fill-box");
        assert_eq!(el.attr("style"), Some("fill: #000; transform-box: fill-box;"));
    }

    #[test]
    fn test_semicolons_inside_values_survive_rewrites() {
        let mut el = Element::new("rect")
            .with_attr("style", "fill:#000;filter:url(data:image/png;base64,AAAA);font-family:'a;b'");
        assert_eq!(el.style("filter"), Some("url(data:image/png;base64,AAAA)"));
        el.set_style("fill", "#ff0000");
        assert_eq!(
            el.attr("style"),
            Some("fill: #ff0000; filter: url(data:image/png;base64,AAAA); font-family: 'a;b';")
        );
    }

    #[test]
    fn test_remove_last_declaration_drops_attribute() {
        let mut el = Element::new("rect").with_attr("style", "fill: #fff;");
        assert!(el.remove_style("fill"));
        assert_eq!(el.attr("style"), None);
        assert!(!el.remove_style("fill"));
    }
}
