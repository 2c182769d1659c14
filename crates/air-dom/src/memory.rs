//! Arena-backed in-memory document.
//!
//! [`MemoryDom`] stands in for the browser in tests: it is the live document
//! the controller mutates, and its [`Dom::parse_page`] plays the part of
//! `DOMParser` for fetched pages.
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`]. Removed
//! nodes stay in the arena (detached) so stale handles never dangle; they
//! simply report `is_connected() == false`.

use std::cell::{Cell, RefCell};

use crate::{Dom, PageFragment};
use crate::html::{self, Token, VOID_ELEMENTS};
use crate::selector::{AttrMatch, Combinator, Complex, Compound, Selector};

/// Handle to a node in a [`MemoryDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

const DOCUMENT: NodeId = NodeId(0);

#[derive(Debug)]
enum NodeKind {
    Document,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Value set by user interaction; `None` means the default applies.
    dirty_value: Option<String>,
    /// Checkedness set by user interaction; `None` means the default applies.
    dirty_checked: Option<bool>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            dirty_value: None,
            dirty_checked: None,
        }
    }

    fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }
}

type Arena = Vec<NodeData>;

/// In-memory document implementing [`Dom`].
#[derive(Debug)]
pub struct MemoryDom {
    arena: RefCell<Arena>,
    pages_parsed: Cell<usize>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::parse("<html><head></head><body></body></html>")
    }
}

impl MemoryDom {
    /// Parse a full document.
    ///
    /// Content without an `<html>` root is wrapped in one.
    #[must_use]
    pub fn parse(html: &str) -> Self {
        let mut arena = vec![NodeData::new(NodeKind::Document)];
        build(&mut arena, DOCUMENT, html::tokenize(html));

        let has_root = arena[DOCUMENT.0]
            .children
            .iter()
            .any(|&c| arena[c.0].tag() == Some("html"));
        if !has_root {
            let root = push_node(
                &mut arena,
                NodeKind::Element {
                    tag: "html".to_owned(),
                    attrs: Vec::new(),
                },
            );
            let children = std::mem::take(&mut arena[DOCUMENT.0].children);
            for &child in &children {
                arena[child.0].parent = Some(root);
            }
            arena[root.0].children = children;
            arena[root.0].parent = Some(DOCUMENT);
            arena[DOCUMENT.0].children.push(root);
        }

        Self {
            arena: RefCell::new(arena),
            pages_parsed: Cell::new(0),
        }
    }

    /// First element matching a selector string anywhere in the document.
    ///
    /// Returns `None` for unparseable selectors as well as for no match.
    #[must_use]
    pub fn find(&self, selector: &str) -> Option<NodeId> {
        let selector = Selector::parse(selector).ok()?;
        self.query(&self.document_element(), &selector)
    }

    /// All elements matching a selector string anywhere in the document.
    #[must_use]
    pub fn find_all(&self, selector: &str) -> Vec<NodeId> {
        Selector::parse(selector)
            .map(|s| self.query_all(&self.document_element(), &s))
            .unwrap_or_default()
    }

    /// The document's `<title>` element, if any.
    #[must_use]
    pub fn title_element(&self) -> Option<NodeId> {
        self.find("title")
    }

    /// Simulate the user typing into or selecting a control.
    pub fn set_value(&self, node: NodeId, value: &str) {
        self.arena.borrow_mut()[node.0].dirty_value = Some(value.to_owned());
    }

    /// Simulate the user toggling a checkbox or radio.
    ///
    /// Checking a radio unchecks the others in its group.
    pub fn set_checked(&self, node: NodeId, checked: bool) {
        let mut arena = self.arena.borrow_mut();
        if checked && arena[node.0].attr("type") == Some("radio") {
            let name = arena[node.0].attr("name").map(str::to_owned);
            let group: Vec<NodeId> = descendants(&arena, DOCUMENT)
                .into_iter()
                .filter(|&n| {
                    n != node
                        && arena[n.0].tag() == Some("input")
                        && arena[n.0].attr("type") == Some("radio")
                        && arena[n.0].attr("name").map(str::to_owned) == name
                })
                .collect();
            for other in group {
                arena[other.0].dirty_checked = Some(false);
            }
        }
        arena[node.0].dirty_checked = Some(checked);
    }

    /// Value of an inline style property.
    #[must_use]
    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        let arena = self.arena.borrow();
        let style = arena[node.0].attr("style")?;
        parse_style(style)
            .into_iter()
            .find(|(k, _)| k == property)
            .map(|(_, v)| v)
    }

    /// How many fetched pages went through [`Dom::parse_page`].
    #[must_use]
    pub fn pages_parsed(&self) -> usize {
        self.pages_parsed.get()
    }

    /// Serialize the whole document element.
    #[must_use]
    pub fn outer_html(&self, node: NodeId) -> String {
        let arena = self.arena.borrow();
        let mut out = String::new();
        serialize(&arena, node, &mut out);
        out
    }
}

fn push_node(arena: &mut Arena, kind: NodeKind) -> NodeId {
    arena.push(NodeData::new(kind));
    NodeId(arena.len() - 1)
}

fn attach(arena: &mut Arena, parent: NodeId, child: NodeId, index: Option<usize>) {
    detach(arena, child);
    arena[child.0].parent = Some(parent);
    let children = &mut arena[parent.0].children;
    match index {
        Some(i) => children.insert(i.min(children.len()), child),
        None => children.push(child),
    }
}

fn detach(arena: &mut Arena, node: NodeId) {
    if let Some(parent) = arena[node.0].parent.take() {
        arena[parent.0].children.retain(|&c| c != node);
    }
}

/// Append parsed tokens under `parent`.
fn build(arena: &mut Arena, parent: NodeId, tokens: Vec<Token>) {
    let mut stack = vec![parent];

    for token in tokens {
        let top = *stack.last().unwrap_or(&parent);
        match token {
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => {
                // Sibling options and list items close each other implicitly.
                if (name == "option" || name == "li")
                    && stack.len() > 1
                    && arena[top.0].tag() == Some(name.as_str())
                {
                    stack.pop();
                }
                let top = *stack.last().unwrap_or(&parent);
                let is_void = self_closing || VOID_ELEMENTS.contains(&name.as_str());
                let node = push_node(arena, NodeKind::Element { tag: name, attrs });
                attach(arena, top, node, None);
                if !is_void {
                    stack.push(node);
                }
            }
            Token::EndTag { name } => {
                if let Some(pos) = stack
                    .iter()
                    .skip(1)
                    .rposition(|&n| arena[n.0].tag() == Some(name.as_str()))
                {
                    stack.truncate(pos + 1);
                }
            }
            Token::Text(text) => {
                let node = push_node(arena, NodeKind::Text(text));
                attach(arena, top, node, None);
            }
            Token::Comment(text) => {
                let node = push_node(arena, NodeKind::Comment(text));
                attach(arena, top, node, None);
            }
        }
    }
}

/// Element descendants of `scope` in document order (excluding `scope`).
fn descendants(arena: &Arena, scope: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeId> = arena[scope.0].children.iter().rev().copied().collect();
    while let Some(node) = stack.pop() {
        if arena[node.0].tag().is_some() {
            out.push(node);
        }
        stack.extend(arena[node.0].children.iter().rev().copied());
    }
    out
}

fn parent_element(arena: &Arena, node: NodeId) -> Option<NodeId> {
    arena[node.0]
        .parent
        .filter(|&p| arena[p.0].tag().is_some())
}

fn matches_selector(arena: &Arena, node: NodeId, selector: &Selector) -> bool {
    selector
        .alternatives()
        .iter()
        .any(|complex| matches_complex(arena, node, complex, complex.parts.len() - 1))
}

fn matches_complex(arena: &Arena, node: NodeId, complex: &Complex, idx: usize) -> bool {
    let (combinator, compound) = &complex.parts[idx];
    if !matches_compound(arena, node, compound) {
        return false;
    }
    if idx == 0 {
        return true;
    }
    match combinator {
        Combinator::Child => parent_element(arena, node)
            .is_some_and(|p| matches_complex(arena, p, complex, idx - 1)),
        Combinator::Descendant => {
            let mut current = parent_element(arena, node);
            while let Some(ancestor) = current {
                if matches_complex(arena, ancestor, complex, idx - 1) {
                    return true;
                }
                current = parent_element(arena, ancestor);
            }
            false
        }
    }
}

fn matches_compound(arena: &Arena, node: NodeId, compound: &Compound) -> bool {
    let data = &arena[node.0];
    let Some(tag) = data.tag() else {
        return false;
    };
    if compound.tag.as_deref().is_some_and(|t| t != tag) {
        return false;
    }
    if compound.id.as_deref().is_some_and(|id| data.attr("id") != Some(id)) {
        return false;
    }
    if !compound.classes.iter().all(|c| data.has_class(c)) {
        return false;
    }
    let attrs_match = compound.attrs.iter().all(|AttrMatch { name, value }| {
        match (data.attr(name), value) {
            (Some(actual), Some(expected)) => actual == expected.as_str(),
            (Some(_), None) => true,
            (None, _) => false,
        }
    });
    if !attrs_match {
        return false;
    }
    !compound.checked || checkedness(data)
}

fn checkedness(data: &NodeData) -> bool {
    let checkable =
        data.tag() == Some("input") && matches!(data.attr("type"), Some("checkbox" | "radio"));
    checkable
        && data
            .dirty_checked
            .unwrap_or_else(|| data.attr("checked").is_some())
}

fn text_of(arena: &Arena, node: NodeId, out: &mut String) {
    match &arena[node.0].kind {
        NodeKind::Text(text) => out.push_str(text),
        NodeKind::Comment(_) => {}
        NodeKind::Document | NodeKind::Element { .. } => {
            for &child in &arena[node.0].children {
                text_of(arena, child, out);
            }
        }
    }
}

fn serialize(arena: &Arena, node: NodeId, out: &mut String) {
    match &arena[node.0].kind {
        NodeKind::Document => serialize_children(arena, node, out),
        NodeKind::Element { tag, attrs } => {
            out.push('<');
            out.push_str(tag);
            for (key, value) in attrs {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&html::escape_attr(value));
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&tag.as_str()) {
                return;
            }
            serialize_children(arena, node, out);
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        NodeKind::Text(text) => {
            let raw = arena[node.0]
                .parent
                .and_then(|p| arena[p.0].tag())
                .is_some_and(|t| t == "script" || t == "style");
            if raw {
                out.push_str(text);
            } else {
                out.push_str(&html::escape_text(text));
            }
        }
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
    }
}

fn serialize_children(arena: &Arena, node: NodeId, out: &mut String) {
    for &child in &arena[node.0].children {
        serialize(arena, child, out);
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            Some((k.trim().to_owned(), v.trim().to_owned()))
        })
        .collect()
}

impl MemoryDom {
    fn set_attr_in(arena: &mut Arena, node: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut arena[node.0].kind {
            match attrs.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => value.clone_into(v),
                None => attrs.push((name.to_owned(), value.to_owned())),
            }
        }
    }

    fn replace_children(&self, node: NodeId, tokens: Vec<Token>) {
        let mut arena = self.arena.borrow_mut();
        let old = std::mem::take(&mut arena[node.0].children);
        for child in old {
            arena[child.0].parent = None;
        }
        build(&mut arena, node, tokens);
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn document_element(&self) -> NodeId {
        let arena = self.arena.borrow();
        arena[DOCUMENT.0]
            .children
            .iter()
            .copied()
            .find(|&c| arena[c.0].tag() == Some("html"))
            .unwrap_or(DOCUMENT)
    }

    fn body(&self) -> Option<NodeId> {
        self.find("body")
    }

    fn query(&self, scope: &NodeId, selector: &Selector) -> Option<NodeId> {
        let arena = self.arena.borrow();
        descendants(&arena, *scope)
            .into_iter()
            .find(|&n| matches_selector(&arena, n, selector))
    }

    fn query_all(&self, scope: &NodeId, selector: &Selector) -> Vec<NodeId> {
        let arena = self.arena.borrow();
        descendants(&arena, *scope)
            .into_iter()
            .filter(|&n| matches_selector(&arena, n, selector))
            .collect()
    }

    fn closest(&self, node: &NodeId, selector: &Selector) -> Option<NodeId> {
        let arena = self.arena.borrow();
        let mut current = arena[node.0].tag().map(|_| *node);
        while let Some(candidate) = current {
            if matches_selector(&arena, candidate, selector) {
                return Some(candidate);
            }
            current = parent_element(&arena, candidate);
        }
        None
    }

    fn tag_name(&self, node: &NodeId) -> String {
        self.arena.borrow()[node.0]
            .tag()
            .unwrap_or_default()
            .to_owned()
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.arena.borrow()[node.0].attr(name).map(str::to_owned)
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        Self::set_attr_in(&mut self.arena.borrow_mut(), *node, name, value);
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.arena.borrow()[node.0].has_class(class)
    }

    fn add_class(&self, node: &NodeId, class: &str) {
        let mut arena = self.arena.borrow_mut();
        if arena[node.0].has_class(class) {
            return;
        }
        let classes = match arena[node.0].attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_owned(),
        };
        Self::set_attr_in(&mut arena, *node, "class", &classes);
    }

    fn remove_class(&self, node: &NodeId, class: &str) {
        let mut arena = self.arena.borrow_mut();
        let Some(existing) = arena[node.0].attr("class") else {
            return;
        };
        let classes = existing
            .split_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        Self::set_attr_in(&mut arena, *node, "class", &classes);
    }

    fn set_style(&self, node: &NodeId, property: &str, value: &str) {
        let mut arena = self.arena.borrow_mut();
        let mut decls = arena[node.0].attr("style").map(parse_style).unwrap_or_default();
        match decls.iter_mut().find(|(k, _)| k == property) {
            Some((_, v)) => value.clone_into(v),
            None => decls.push((property.to_owned(), value.to_owned())),
        }
        let style = decls
            .iter()
            .map(|(k, v)| format!("{k}: {v};"))
            .collect::<Vec<_>>()
            .join(" ");
        Self::set_attr_in(&mut arena, *node, "style", &style);
    }

    fn value(&self, node: &NodeId) -> String {
        let arena = self.arena.borrow();
        let data = &arena[node.0];
        if let Some(value) = &data.dirty_value {
            return value.clone();
        }
        match data.tag() {
            Some("input") => match (data.attr("value"), data.attr("type")) {
                (Some(v), _) => v.to_owned(),
                (None, Some("checkbox" | "radio")) => "on".to_owned(),
                (None, _) => String::new(),
            },
            Some("textarea") => {
                let mut out = String::new();
                text_of(&arena, *node, &mut out);
                out
            }
            Some("select") => {
                let options: Vec<NodeId> = descendants(&arena, *node)
                    .into_iter()
                    .filter(|&n| arena[n.0].tag() == Some("option"))
                    .collect();
                let chosen = options
                    .iter()
                    .copied()
                    .find(|&n| arena[n.0].attr("selected").is_some())
                    .or_else(|| options.first().copied());
                chosen
                    .map(|opt| match arena[opt.0].attr("value") {
                        Some(v) => v.to_owned(),
                        None => {
                            let mut out = String::new();
                            text_of(&arena, opt, &mut out);
                            out.trim().to_owned()
                        }
                    })
                    .unwrap_or_default()
            }
            _ => String::new(),
        }
    }

    fn is_checked(&self, node: &NodeId) -> bool {
        checkedness(&self.arena.borrow()[node.0])
    }

    fn inner_html(&self, node: &NodeId) -> String {
        let arena = self.arena.borrow();
        let mut out = String::new();
        serialize_children(&arena, *node, &mut out);
        out
    }

    fn set_inner_html(&self, node: &NodeId, html: &str) {
        self.replace_children(*node, html::tokenize(html));
    }

    fn text_content(&self, node: &NodeId) -> String {
        let arena = self.arena.borrow();
        let mut out = String::new();
        text_of(&arena, *node, &mut out);
        out
    }

    fn set_text_content(&self, node: &NodeId, text: &str) {
        self.replace_children(*node, vec![Token::Text(text.to_owned())]);
    }

    fn create_element(&self, tag: &str) -> NodeId {
        push_node(
            &mut self.arena.borrow_mut(),
            NodeKind::Element {
                tag: tag.to_ascii_lowercase(),
                attrs: Vec::new(),
            },
        )
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) {
        attach(&mut self.arena.borrow_mut(), *parent, *child, None);
    }

    fn prepend_child(&self, parent: &NodeId, child: &NodeId) {
        attach(&mut self.arena.borrow_mut(), *parent, *child, Some(0));
    }

    fn insert_after(&self, reference: &NodeId, node: &NodeId) {
        let mut arena = self.arena.borrow_mut();
        let Some(parent) = arena[reference.0].parent else {
            return;
        };
        detach(&mut arena, *node);
        let index = arena[parent.0]
            .children
            .iter()
            .position(|c| c == reference)
            .map_or(0, |i| i + 1);
        attach(&mut arena, parent, *node, Some(index));
    }

    fn remove(&self, node: &NodeId) {
        detach(&mut self.arena.borrow_mut(), *node);
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        let arena = self.arena.borrow();
        let mut current = *node;
        loop {
            if current == DOCUMENT {
                return true;
            }
            match arena[current.0].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn title(&self) -> String {
        self.title_element()
            .map(|t| self.text_content(&t))
            .unwrap_or_default()
    }

    fn set_title(&self, title: &str) {
        let element = self.title_element().unwrap_or_else(|| {
            let parent = self.find("head").unwrap_or_else(|| self.document_element());
            let element = self.create_element("title");
            self.append_child(&parent, &element);
            element
        });
        self.set_text_content(&element, title);
    }

    fn reset_form(&self, form: &NodeId) {
        let mut arena = self.arena.borrow_mut();
        for node in descendants(&arena, *form) {
            arena[node.0].dirty_value = None;
            arena[node.0].dirty_checked = None;
        }
    }

    fn parse_page(&self, html: &str, main: &Selector) -> Option<PageFragment> {
        self.pages_parsed.set(self.pages_parsed.get() + 1);
        let page = MemoryDom::parse(html);
        let region = page.query(&page.document_element(), main)?;
        Some(PageFragment {
            content: page.inner_html(&region),
            title: page.title_element().map(|t| page.text_content(&t)),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sel(s: &str) -> Selector {
        Selector::parse(s).unwrap()
    }

    #[test]
    fn test_parse_wraps_fragment_in_html() {
        let dom = MemoryDom::parse("<p>hi</p>");
        let root = dom.document_element();
        assert_eq!(dom.tag_name(&root), "html");
        assert_eq!(dom.inner_html(&root), "<p>hi</p>");
    }

    #[test]
    fn test_query_descendant_and_class() {
        let dom = MemoryDom::parse(
            r#"<body><div class="galeria-container"><img src="a.jpg"></div><img src="b.jpg" class="img-destaque"><img src="c.jpg"></body>"#,
        );
        let root = dom.document_element();
        let found = dom.query_all(&root, &sel(".galeria-container img, .img-destaque"));
        let srcs: Vec<_> = found
            .iter()
            .map(|n| dom.attribute(n, "src").unwrap())
            .collect();
        assert_eq!(srcs, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_query_scope_excludes_self_but_matches_ancestors() {
        let dom = MemoryDom::parse(
            r#"<div class="formulario"><form id="f"><input id="nome"></form></div>"#,
        );
        let form = dom.find("#f").unwrap();
        // Matching sees ancestors outside the scope, like querySelector.
        assert!(dom.query(&form, &sel(".formulario input")).is_some());
        assert!(dom.query(&form, &sel("form")).is_none());
    }

    #[test]
    fn test_child_combinator() {
        let dom = MemoryDom::parse("<ul><li><ul><li id=\"deep\"></li></ul></li></ul>");
        let root = dom.document_element();
        let direct = dom.query_all(&root, &sel("body > ul > li"));
        assert!(direct.is_empty());
        let nested = dom.query_all(&root, &sel("li > ul > li"));
        assert_eq!(nested.len(), 1);
    }

    #[test]
    fn test_closest() {
        let dom = MemoryDom::parse(r#"<a href="x.html"><span id="s">go</span></a>"#);
        let span = dom.find("#s").unwrap();
        let link = dom.closest(&span, &sel("a[href]")).unwrap();
        assert_eq!(dom.attribute(&link, "href").as_deref(), Some("x.html"));
        assert_eq!(dom.closest(&span, &sel("form")), None);
    }

    #[test]
    fn test_classes() {
        let dom = MemoryDom::parse(r#"<main class="a"></main>"#);
        let main = dom.find("main").unwrap();
        dom.add_class(&main, "pa-exit");
        dom.add_class(&main, "pa-exit");
        assert_eq!(dom.attribute(&main, "class").as_deref(), Some("a pa-exit"));
        dom.remove_class(&main, "a");
        assert!(!dom.has_class(&main, "a"));
        assert!(dom.has_class(&main, "pa-exit"));
    }

    #[test]
    fn test_inner_html_round_trip_and_detach() {
        let dom = MemoryDom::parse("<main><p id=\"old\">old</p></main>");
        let main = dom.find("main").unwrap();
        let old = dom.find("#old").unwrap();
        dom.set_inner_html(&main, "<h1>Novo &amp; melhor</h1><img src=\"x.png\" alt=\"\">");
        assert_eq!(
            dom.inner_html(&main),
            "<h1>Novo &amp; melhor</h1><img src=\"x.png\" alt=\"\">"
        );
        assert!(!dom.is_connected(&old));
        assert!(dom.is_connected(&main));
    }

    #[test]
    fn test_insert_after_and_prepend() {
        let dom = MemoryDom::parse("<form><input id=\"a\"><input id=\"b\"></form>");
        let form = dom.find("form").unwrap();
        let a = dom.find("#a").unwrap();
        let msg = dom.create_element("div");
        dom.set_text_content(&msg, "erro");
        dom.insert_after(&a, &msg);
        let top = dom.create_element("p");
        dom.prepend_child(&form, &top);
        assert_eq!(
            dom.inner_html(&form),
            "<p></p><input id=\"a\"><div>erro</div><input id=\"b\">"
        );
    }

    #[test]
    fn test_form_values() {
        let dom = MemoryDom::parse(
            r#"<form>
                <input id="nome" value="Ana">
                <select id="uf"><option value="">--</option><option value="SP">SP</option></select>
                <textarea id="obs">nota</textarea>
                <input type="radio" name="m" id="pix" value="pix">
                <input type="radio" name="m" id="boleto" value="boleto" checked>
            </form>"#,
        );
        let nome = dom.find("#nome").unwrap();
        let uf = dom.find("#uf").unwrap();
        let obs = dom.find("#obs").unwrap();
        let pix = dom.find("#pix").unwrap();
        let boleto = dom.find("#boleto").unwrap();

        assert_eq!(dom.value(&nome), "Ana");
        assert_eq!(dom.value(&uf), "");
        assert_eq!(dom.value(&obs), "nota");
        assert!(dom.is_checked(&boleto));

        dom.set_value(uf, "SP");
        dom.set_checked(pix, true);
        assert_eq!(dom.value(&uf), "SP");
        assert!(dom.is_checked(&pix));
        assert!(!dom.is_checked(&boleto));
        assert_eq!(dom.find_all("input:checked"), vec![pix]);

        dom.reset_form(&dom.find("form").unwrap());
        assert_eq!(dom.value(&uf), "");
        assert!(dom.is_checked(&boleto));
    }

    #[test]
    fn test_style() {
        let dom = MemoryDom::parse("<img src=\"a\">");
        let img = dom.find("img").unwrap();
        dom.set_style(&img, "cursor", "zoom-in");
        dom.set_style(&img, "display", "none");
        dom.set_style(&img, "cursor", "pointer");
        assert_eq!(dom.style(img, "cursor").as_deref(), Some("pointer"));
        assert_eq!(
            dom.attribute(&img, "style").as_deref(),
            Some("cursor: pointer; display: none;")
        );
    }

    #[test]
    fn test_title() {
        let dom = MemoryDom::parse("<html><head></head><body></body></html>");
        assert_eq!(dom.title(), "");
        dom.set_title("Cadastro");
        assert_eq!(dom.title(), "Cadastro");
        dom.set_title("Projetos");
        assert_eq!(dom.find_all("title").len(), 1);
        assert_eq!(dom.title(), "Projetos");
    }

    #[test]
    fn test_implicit_option_close() {
        let dom = MemoryDom::parse("<select><option value=a>A<option value=b selected>B</select>");
        let select = dom.find("select").unwrap();
        assert_eq!(dom.find_all("option").len(), 2);
        assert_eq!(dom.value(&select), "b");
    }

    #[test]
    fn test_parse_page() {
        let dom = MemoryDom::default();
        let page = dom
            .parse_page(
                "<html><head><title>Projetos &ndash; Air</title></head>\
                 <body><nav>menu</nav><main><h1>Projetos</h1><p>Texto</p></main></body></html>",
                &sel("main"),
            )
            .unwrap();

        assert_eq!(page.content, "<h1>Projetos</h1><p>Texto</p>");
        assert_eq!(page.title.as_deref(), Some("Projetos – Air"));
        assert_eq!(dom.pages_parsed(), 1);
        assert_eq!(dom.find("h1"), None);
    }

    #[test]
    fn test_parse_page_without_title() {
        let page = MemoryDom::default()
            .parse_page("<main>x</main>", &sel("main"))
            .unwrap();
        assert_eq!(page.content, "x");
        assert_eq!(page.title, None);
    }

    #[test]
    fn test_parse_page_missing_main() {
        let dom = MemoryDom::default();
        assert_eq!(
            dom.parse_page("<html><body><p>404</p></body></html>", &sel("main")),
            None
        );
    }
}
