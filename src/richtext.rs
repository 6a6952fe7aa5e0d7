use kuchiki::{ElementData, NodeRef};
use quick_xml::escape::{escape, partial_escape};
use serde_json::{json, Map, Value};

/// A piece of a rich-text document as seen by the translator.
///
/// Rich-text values are node lists such as
/// `[{"type": "paragraph", "content": [...]}, {"type": "set", "attrs": {...}}]`.
/// Runs of prose nodes are translated as one HTML leaf; set nodes go through
/// the set strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Consecutive prose nodes rendered to HTML.
    Html(String),
    /// An embedded set node.
    Set {
        id: Option<String>,
        values: Map<String, Value>,
    },
}

/// Split a node list into HTML runs and embedded sets, in document order.
pub fn segments(nodes: &[Value]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut prose: Vec<Value> = Vec::new();

    for node in nodes {
        if node_type(node) != Some("set") {
            prose.push(node.clone());
            continue;
        }

        if !prose.is_empty() {
            segments.push(Segment::Html(render_html(&prose)));
            prose.clear();
        }

        let attrs = node.get("attrs");
        segments.push(Segment::Set {
            id: attrs
                .and_then(|attrs| attrs.get("id"))
                .and_then(Value::as_str)
                .map(str::to_string),
            values: attrs
                .and_then(|attrs| attrs.get("values"))
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        });
    }

    if !prose.is_empty() {
        segments.push(Segment::Html(render_html(&prose)));
    }

    segments
}

/// Wrap translated set values back into a `set` node.
///
/// `values` holds the set's fields together with its `type` and `enabled`
/// flags; the id moves to the node attributes.
pub fn set_node(id: Value, values: Map<String, Value>) -> Value {
    json!({
        "type": "set",
        "attrs": {
            "id": id,
            "values": values,
        }
    })
}

fn node_type(node: &Value) -> Option<&str> {
    node.get("type").and_then(Value::as_str)
}

fn attr<'a>(node: &'a Value, name: &str) -> Option<&'a Value> {
    node.get("attrs")
        .and_then(|attrs| attrs.get(name))
        .filter(|value| !value.is_null())
}

fn attr_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ==================== Rendering ====================

/// Render prose nodes to HTML.
pub fn render_html(nodes: &[Value]) -> String {
    let mut html = String::new();
    for node in nodes {
        render_node(node, &mut html);
    }
    html
}

fn render_children(node: &Value, html: &mut String) {
    if let Some(children) = node.get("content").and_then(Value::as_array) {
        for child in children {
            render_node(child, html);
        }
    }
}

fn render_wrapped(tag: &str, attributes: &[(&str, Option<&Value>)], node: &Value, html: &mut String) {
    open_tag(tag, attributes, html);
    render_children(node, html);
    html.push_str(&format!("</{}>", tag));
}

fn open_tag(tag: &str, attributes: &[(&str, Option<&Value>)], html: &mut String) {
    html.push('<');
    html.push_str(tag);
    for (name, value) in attributes {
        if let Some(value) = value {
            html.push_str(&format!(" {}=\"{}\"", name, escape(attr_text(value).as_str())));
        }
    }
    html.push('>');
}

fn render_node(node: &Value, html: &mut String) {
    match node_type(node) {
        Some("text") => render_text(node, html),
        Some("paragraph") => render_wrapped("p", &[], node, html),
        Some("heading") => {
            let level = attr(node, "level")
                .and_then(Value::as_u64)
                .unwrap_or(1)
                .clamp(1, 6);
            render_wrapped(&format!("h{}", level), &[], node, html);
        }
        Some("blockquote") => render_wrapped("blockquote", &[], node, html),
        Some("bulletList") => render_wrapped("ul", &[], node, html),
        Some("orderedList") => {
            let start = attr(node, "start").filter(|start| start.as_u64() != Some(1));
            render_wrapped("ol", &[("start", start)], node, html);
        }
        Some("listItem") => render_wrapped("li", &[], node, html),
        Some("codeBlock") => {
            let language = attr(node, "language")
                .map(|language| Value::String(format!("language-{}", attr_text(language))));
            html.push_str("<pre>");
            render_wrapped("code", &[("class", language.as_ref())], node, html);
            html.push_str("</pre>");
        }
        Some("horizontalRule") => html.push_str("<hr>"),
        Some("hardBreak") => html.push_str("<br>"),
        Some("image") => open_tag(
            "img",
            &[
                ("src", attr(node, "src")),
                ("alt", attr(node, "alt")),
                ("title", attr(node, "title")),
            ],
            html,
        ),
        _ => render_children(node, html),
    }
}

fn render_text(node: &Value, html: &mut String) {
    let text = node.get("text").and_then(Value::as_str).unwrap_or_default();
    let marks: &[Value] = node
        .get("marks")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut closing = Vec::new();
    for mark in marks {
        let Some(tag) = mark_tag(mark) else {
            continue;
        };
        if tag == "a" {
            open_tag(
                "a",
                &[
                    ("href", attr(mark, "href")),
                    ("target", attr(mark, "target")),
                    ("rel", attr(mark, "rel")),
                ],
                html,
            );
        } else {
            open_tag(tag, &[], html);
        }
        closing.push(tag);
    }

    html.push_str(&partial_escape(text));

    for tag in closing.into_iter().rev() {
        html.push_str(&format!("</{}>", tag));
    }
}

fn mark_tag(mark: &Value) -> Option<&'static str> {
    match node_type(mark)? {
        "bold" => Some("strong"),
        "italic" => Some("em"),
        "underline" => Some("u"),
        "strike" => Some("s"),
        "code" => Some("code"),
        "subscript" => Some("sub"),
        "superscript" => Some("sup"),
        "small" => Some("small"),
        "link" => Some("a"),
        _ => None,
    }
}

// ==================== Parsing ====================

/// Parse an HTML fragment into prose nodes.
///
/// The fragment goes through an HTML5 parser, so implied end tags, bare `<`
/// or `&` in text and named entities come out the way a browser reads them.
/// Unknown tags are unwrapped and stray inline content is wrapped in
/// paragraphs.
pub fn parse_html(html: &str) -> Vec<Value> {
    use kuchiki::traits::*;

    let document = kuchiki::parse_html().one(html);
    let mut builder = DocumentBuilder::default();

    let body = document.descendants().find(|node| {
        node.as_element()
            .is_some_and(|element| &*element.name.local == "body")
    });
    if let Some(body) = body {
        builder.children(&body);
    }

    builder.finish()
}

fn attribute(element: &ElementData, name: &str) -> Value {
    element
        .attributes
        .borrow()
        .get(name)
        .map_or(Value::Null, |value| Value::String(value.to_string()))
}

#[derive(Debug)]
struct BlockFrame {
    node: Map<String, Value>,
    content: Vec<Value>,
}

impl BlockFrame {
    fn new(node_type: &str, attrs: Option<Value>) -> Self {
        let mut node = Map::new();
        node.insert("type".to_string(), Value::String(node_type.to_string()));
        if let Some(attrs) = attrs {
            node.insert("attrs".to_string(), attrs);
        }
        Self {
            node,
            content: Vec::new(),
        }
    }

    fn node_type(&self) -> &str {
        self.node.get("type").and_then(Value::as_str).unwrap_or_default()
    }

    /// Containers hold blocks only; inline content needs a paragraph.
    fn holds_blocks(&self) -> bool {
        matches!(
            self.node_type(),
            "blockquote" | "bulletList" | "orderedList" | "listItem"
        )
    }

    /// Textblocks hold inline content only and never nest.
    fn is_textblock(&self) -> bool {
        matches!(self.node_type(), "paragraph" | "heading" | "codeBlock")
    }

    fn into_node(mut self) -> Value {
        if !self.content.is_empty() {
            self.node
                .insert("content".to_string(), Value::Array(self.content));
        }
        Value::Object(self.node)
    }
}

/// Builds a node list from a walk over the parsed DOM.
#[derive(Debug, Default)]
struct DocumentBuilder {
    root: Vec<Value>,
    blocks: Vec<BlockFrame>,
    marks: Vec<Value>,
}

impl DocumentBuilder {
    fn in_code_block(&self) -> bool {
        self.blocks
            .last()
            .is_some_and(|frame| frame.node_type() == "codeBlock")
    }

    fn push_node(&mut self, node: Value) {
        match self.blocks.last_mut() {
            Some(frame) => frame.content.push(node),
            None => self.root.push(node),
        }
    }

    fn close_top_block(&mut self) {
        if let Some(frame) = self.blocks.pop() {
            let node = frame.into_node();
            self.push_node(node);
        }
    }

    fn close_to(&mut self, depth: usize) {
        while self.blocks.len() > depth {
            self.close_top_block();
        }
    }

    fn close_textblocks(&mut self) {
        while self.blocks.last().is_some_and(BlockFrame::is_textblock) {
            self.close_top_block();
        }
    }

    /// Make sure inline content has a block to land in.
    fn ensure_inline_context(&mut self) {
        if self.blocks.last().map_or(true, BlockFrame::holds_blocks) {
            self.blocks.push(BlockFrame::new("paragraph", None));
        }
    }

    /// Open a block and return its depth. Any open paragraph, heading or
    /// code block is closed first.
    fn open_block(&mut self, node_type: &str, attrs: Option<Value>) -> usize {
        self.close_textblocks();
        self.blocks.push(BlockFrame::new(node_type, attrs));
        self.blocks.len() - 1
    }

    fn block(&mut self, node: &NodeRef, node_type: &str, attrs: Option<Value>) {
        let depth = self.open_block(node_type, attrs);
        self.children(node);
        self.close_to(depth);
    }

    fn children(&mut self, node: &NodeRef) {
        for child in node.children() {
            self.node(&child);
        }
    }

    fn node(&mut self, node: &NodeRef) {
        if let Some(text) = node.as_text() {
            self.text(&text.borrow());
            return;
        }
        let Some(element) = node.as_element() else {
            return;
        };

        let name: &str = &element.name.local;
        match name {
            "p" => self.block(node, "paragraph", None),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level: u64 = name[1..].parse().unwrap_or(1);
                self.block(node, "heading", Some(json!({"level": level})));
            }
            "blockquote" => self.block(node, "blockquote", None),
            "ul" => self.block(node, "bulletList", None),
            "ol" => {
                let start: u64 = element
                    .attributes
                    .borrow()
                    .get("start")
                    .and_then(|start| start.trim().parse().ok())
                    .unwrap_or(1);
                self.block(node, "orderedList", Some(json!({"start": start})));
            }
            "li" => self.block(node, "listItem", None),
            "pre" => self.block(node, "codeBlock", Some(json!({"language": null}))),
            "code" if self.in_code_block() => {
                let language = element.attributes.borrow().get("class").and_then(|class| {
                    class
                        .split_whitespace()
                        .find_map(|c| c.strip_prefix("language-"))
                        .map(str::to_string)
                });
                if let (Some(language), Some(frame)) = (language, self.blocks.last_mut()) {
                    frame
                        .node
                        .insert("attrs".to_string(), json!({"language": language}));
                }
                self.children(node);
            }
            "hr" => {
                self.close_textblocks();
                self.push_node(json!({"type": "horizontalRule"}));
            }
            "br" => {
                self.ensure_inline_context();
                self.push_node(json!({"type": "hardBreak"}));
            }
            "img" => {
                self.ensure_inline_context();
                self.push_node(json!({
                    "type": "image",
                    "attrs": {
                        "src": attribute(element, "src"),
                        "alt": attribute(element, "alt"),
                        "title": attribute(element, "title"),
                    }
                }));
            }
            "script" | "style" | "template" => {}
            _ => match mark_for_tag(name, element) {
                Some(mark) => {
                    self.marks.push(mark);
                    self.children(node);
                    self.marks.pop();
                }
                None => self.children(node),
            },
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }

        if self.in_code_block() {
            self.push_node(json!({"type": "text", "text": text}));
            return;
        }

        let needs_paragraph = self.blocks.last().map_or(true, BlockFrame::holds_blocks);
        if needs_paragraph && text.trim().is_empty() {
            // Formatting whitespace between blocks
            return;
        }

        self.ensure_inline_context();
        let mut node = Map::new();
        node.insert("type".to_string(), Value::String("text".to_string()));
        node.insert("text".to_string(), Value::String(text.to_string()));
        if !self.marks.is_empty() {
            node.insert("marks".to_string(), Value::Array(self.marks.clone()));
        }
        self.push_node(Value::Object(node));
    }

    fn finish(mut self) -> Vec<Value> {
        self.close_to(0);
        self.root
    }
}

fn mark_for_tag(name: &str, element: &ElementData) -> Option<Value> {
    let mark_type = match name {
        "strong" | "b" => "bold",
        "em" | "i" => "italic",
        "u" => "underline",
        "s" | "strike" | "del" => "strike",
        "code" => "code",
        "sub" => "subscript",
        "sup" => "superscript",
        "small" => "small",
        "a" => {
            return Some(json!({
                "type": "link",
                "attrs": {
                    "href": attribute(element, "href"),
                    "target": attribute(element, "target"),
                    "rel": attribute(element, "rel"),
                }
            }));
        }
        _ => return None,
    };
    Some(json!({"type": mark_type}))
}
