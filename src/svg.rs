//! Minimal SVG element tree.
//!
//! Layouts assemble `Node`s and serialize the document once. Attribute values
//! and text content are escaped during serialization, so no caller can embed
//! raw user text by accident.

use crate::format::{escape_xml, px};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    tag: &'static str,
    attrs: Vec<(&'static str, String)>,
    children: Vec<Node>,
    text: Option<String>,
}

impl Node {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    pub fn group() -> Self {
        Self::new("g")
    }

    /// `<g transform="translate(x, y)">`
    pub fn translated(x: f64, y: f64) -> Self {
        Self::group().attr("transform", format!("translate({}, {})", px(x), px(y)))
    }

    pub fn rect(width: f64, height: f64) -> Self {
        Self::new("rect")
            .num("width", width)
            .num("height", height)
    }

    pub fn text(content: impl Into<String>) -> Self {
        let mut node = Self::new("text");
        node.text = Some(content.into());
        node
    }

    /// Reference to a `<symbol>` declared in `<defs>`.
    pub fn use_ref(id: &str, size: f64) -> Self {
        Self::new("use")
            .attr("href", format!("#{id}"))
            .num("width", size)
            .num("height", size)
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    pub fn num(self, name: &'static str, value: f64) -> Self {
        self.attr(name, px(value))
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_xml(value));
            out.push('"');
        }

        if self.children.is_empty() && self.text.is_none() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        if let Some(text) = &self.text {
            out.push_str(&escape_xml(text));
        }
        for child in &self.children {
            child.write_to(out);
        }
        out.push_str("</");
        out.push_str(self.tag);
        out.push('>');
    }

    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }
}

/// Root `<svg>` element with explicit pixel size and a matching view box.
pub fn document(width: f64, height: f64) -> Node {
    Node::new("svg")
        .num("width", width)
        .num("height", height)
        .attr("viewBox", format!("0 0 {} {}", px(width), px(height)))
        .attr("fill", "none")
        .attr("xmlns", SVG_NS)
}

/// `<style>` block. CSS must avoid quote characters since text is escaped.
pub fn style(css: String) -> Node {
    let mut node = Node::new("style");
    node.text = Some(css);
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_closing_and_nested() {
        let svg = document(480.0, 200.0)
            .child(Node::rect(480.0, 200.0).attr("rx", "10"))
            .child(Node::translated(20.0, 35.0).child(Node::text("hi").class("title")));
        let markup = svg.to_markup();
        assert!(markup.starts_with(r#"<svg width="480" height="200" viewBox="0 0 480 200""#));
        assert!(markup.contains(r#"<rect width="480" height="200" rx="10"/>"#));
        assert!(markup.contains(
            r#"<g transform="translate(20, 35)"><text class="title">hi</text></g>"#
        ));
        assert!(markup.ends_with("</svg>"));
    }

    #[test]
    fn escapes_text_and_attributes() {
        let node = Node::text("<script>&").attr("data-x", "\"quoted\"");
        assert_eq!(
            node.to_markup(),
            r#"<text data-x="&quot;quoted&quot;">&lt;script&gt;&amp;</text>"#
        );
    }

    #[test]
    fn use_reference() {
        assert_eq!(
            Node::use_ref("icon-stars", 16.0).to_markup(),
            r##"<use href="#icon-stars" width="16" height="16"/>"##
        );
    }
}
