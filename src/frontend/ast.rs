use std::fmt;
use crate::frontend::data::*;

///////////////////////////////////////////////////////////////////////////////
// AST - ELEMENT
///////////////////////////////////////////////////////////////////////////////

/// Shared payload of `Node::Element` and `Node::Component`.
#[derive(Debug, Clone, PartialEq)]
pub struct Element<'a> {
    pub tag: Atom<'a>,
    pub attributes: Attributes<'a>,
    /// Always present; empty for self-closing tags.
    pub children: Vec<Node<'a>>,
    pub is_static: bool,
    pub location: Location,
}

impl<'a> Element<'a> {
    pub fn new(
        tag: impl Into<Atom<'a>>,
        attributes: Attributes<'a>,
        children: Vec<Node<'a>>,
        location: Location,
    ) -> Self {
        let is_static = !attributes.has_dynamic() && children.iter().all(Node::is_static);
        Element {
            tag: tag.into(),
            attributes,
            children,
            is_static,
            location,
        }
    }
}

///////////////////////////////////////////////////////////////////////////////
// ROOT AST
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Program,
    Element,
    Component,
    Text,
    Expression,
    Fragment,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Program => "program",
            NodeKind::Element => "element",
            NodeKind::Component => "component",
            NodeKind::Text => "text",
            NodeKind::Expression => "expression",
            NodeKind::Fragment => "fragment",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node<'a> {
    Program(Vec<Node<'a>>),
    Element(Element<'a>),
    /// A tag whose name starts with an uppercase character.
    Component(Element<'a>),
    /// Literal text. Always static.
    Text {
        value: Atom<'a>,
        location: Location,
    },
    /// Raw expression text, never inspected. Never static.
    Expression {
        expr: Atom<'a>,
        location: Location,
    },
    Fragment(Vec<Node<'a>>),
}

impl<'a> Node<'a> {
    /// Element or component, decided by the first character of `tag`.
    pub fn new_tag(
        tag: impl Into<Atom<'a>>,
        attributes: Attributes<'a>,
        children: Vec<Node<'a>>,
        location: Location,
    ) -> Self {
        let element = Element::new(tag, attributes, children, location);
        if is_component_name(&element.tag) {
            Node::Component(element)
        } else {
            Node::Element(element)
        }
    }
    pub fn new_text(value: impl Into<Atom<'a>>, location: Location) -> Self {
        Node::Text {value: value.into(), location}
    }
    pub fn new_expression(expr: impl Into<Atom<'a>>, location: Location) -> Self {
        Node::Expression {expr: expr.into(), location}
    }
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Program(_) => NodeKind::Program,
            Node::Element(_) => NodeKind::Element,
            Node::Component(_) => NodeKind::Component,
            Node::Text{..} => NodeKind::Text,
            Node::Expression{..} => NodeKind::Expression,
            Node::Fragment(_) => NodeKind::Fragment,
        }
    }
    pub fn is_static(&self) -> bool {
        is_static_node(self)
    }
    pub fn is_element(&self) -> bool {
        self.kind() == NodeKind::Element
    }
    pub fn is_component(&self) -> bool {
        self.kind() == NodeKind::Component
    }
    pub fn children(&self) -> &[Node<'a>] {
        match self {
            Node::Program(xs) => xs,
            Node::Fragment(xs) => xs,
            Node::Element(x) => &x.children,
            Node::Component(x) => &x.children,
            Node::Text{..} => &[],
            Node::Expression{..} => &[],
        }
    }
    pub fn unpack_element(&self) -> Option<&Element<'a>> {
        match self {
            Node::Element(x) => Some(x),
            Node::Component(x) => Some(x),
            _ => None,
        }
    }
    pub fn unpack_text(&self) -> Option<&Atom<'a>> {
        match self {
            Node::Text{value, ..} => Some(value),
            _ => None,
        }
    }
    pub fn unpack_expression(&self) -> Option<&Atom<'a>> {
        match self {
            Node::Expression{expr, ..} => Some(expr),
            _ => None,
        }
    }
    pub fn into_children(self) -> Vec<Node<'a>> {
        match self {
            Node::Program(xs) => xs,
            Node::Fragment(xs) => xs,
            Node::Element(x) => x.children,
            Node::Component(x) => x.children,
            Node::Text{..} => Vec::new(),
            Node::Expression{..} => Vec::new(),
        }
    }
}

pub fn is_component_name(tag: &str) -> bool {
    tag.chars().next().map(char::is_uppercase).unwrap_or(false)
}

/// Program and fragment nodes fall through to `true`, like any kind the
/// rules below do not mention. Elements and components answer from the flag
/// `Element::new` computed, so the check never walks a subtree.
pub fn is_static_node(node: &Node) -> bool {
    match node {
        Node::Expression{..} => false,
        Node::Text{..} => true,
        Node::Element(x) | Node::Component(x) => x.is_static,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Node {
        Node::new_text(value, Location::start())
    }

    #[test]
    fn classification_by_first_character() {
        let loc = Location::start();
        assert!(Node::new_tag("Foo", Attributes::new(), vec![], loc).is_component());
        assert!(Node::new_tag("div", Attributes::new(), vec![], loc).is_element());
        assert!(Node::new_tag("my-Foo", Attributes::new(), vec![], loc).is_element());
    }

    #[test]
    fn static_flag_follows_children_and_attributes() {
        let loc = Location::start();
        let expr = Node::new_expression("x", loc);
        let dynamic_child = Node::new_tag("div", Attributes::new(), vec![expr], loc);
        assert!(!dynamic_child.is_static());
        let outer = Node::new_tag("section", Attributes::new(), vec![text("a"), dynamic_child], loc);
        assert!(!outer.is_static());
        assert!(!outer.unpack_element().unwrap().is_static);

        let mut attrs = Attributes::new();
        attrs.insert("id", AttrValue::Dynamic("y".into()));
        assert!(!Node::new_tag("div", attrs, vec![], loc).is_static());
    }

    #[test]
    fn static_flag_is_computed_once_per_element() {
        let loc = Location::start();
        let mut node = Node::new_tag("p", Attributes::new(), vec![text("a")], loc);
        for _ in 0..1000 {
            node = Node::new_tag("div", Attributes::new(), vec![node], loc);
        }
        assert!(node.is_static());
        let outer = Node::new_tag("div", Attributes::new(), vec![node, Node::new_expression("x", loc)], loc);
        assert!(!outer.is_static());
        assert!(outer.children()[0].is_static());
    }

    #[test]
    fn unlisted_kinds_default_to_static() {
        let loc = Location::start();
        let fragment = Node::Fragment(vec![Node::new_expression("x", loc)]);
        assert!(fragment.is_static());
        assert!(Node::Program(vec![]).is_static());
    }
}
