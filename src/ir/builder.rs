//! AST to SSA translation.
use tracing::debug;
use crate::errors::StructuralError;
use crate::frontend::ast::{is_static_node, Element, Node, NodeKind};
use crate::frontend::data::AttrValue;
use crate::ir::*;

/// Translates one AST into one `Ir`. Consumed by `build`, so every
/// compilation gets a fresh builder and fresh counters.
#[derive(Debug, Default)]
pub struct IrBuilder {
    ir: Ir,
}

impl IrBuilder {
    pub fn new() -> Self {
        IrBuilder {ir: Ir::new()}
    }

    /// Builds and optimizes.
    pub fn build(self, node: &Node) -> Result<Ir, StructuralError> {
        let mut ir = self.build_unoptimized(node)?;
        passes::optimize(&mut ir);
        Ok(ir)
    }

    pub fn build_unoptimized(mut self, node: &Node) -> Result<Ir, StructuralError> {
        let root = self.visit(node)?;
        self.ir.root = root;
        debug!(
            instructions = self.ir.instruction_count(),
            root = ?self.ir.root,
            "built ir"
        );
        Ok(self.ir)
    }

    ///////////////////////////////////////////////////////////////////////////
    // EMISSION
    ///////////////////////////////////////////////////////////////////////////

    fn push(&mut self, dest: Option<Name>, op: Op) {
        let entry = self.ir.entry;
        self.ir.blocks
            .entry(entry)
            .or_insert_with(|| BasicBlock::new(entry))
            .instructions
            .push(Instruction {dest, op, block: entry});
    }

    fn define(&mut self, prefix: &str, op: Op) -> Name {
        let dest = self.ir.fresh_name(prefix);
        self.push(Some(dest.clone()), op);
        dest
    }

    ///////////////////////////////////////////////////////////////////////////
    // VISITORS
    ///////////////////////////////////////////////////////////////////////////

    fn visit(&mut self, node: &Node) -> Result<Option<Name>, StructuralError> {
        match node {
            Node::Program(children) => self.visit_program(children),
            Node::Element(element) => self.visit_element(element).map(Some),
            Node::Component(element) => self.visit_component(element).map(Some),
            Node::Text{value, ..} => {
                Ok(Some(self.define("text", Op::CreateText {text: value.to_string()})))
            }
            Node::Expression{expr, ..} => {
                Ok(Some(self.define("expr", Op::Load {expr: expr.to_string()})))
            }
            Node::Fragment(children) => self.visit_fragment(children).map(Some),
        }
    }

    /// The last value produced is the render root.
    fn visit_program(&mut self, children: &[Node]) -> Result<Option<Name>, StructuralError> {
        let mut last = None;
        for child in children {
            if let Some(value) = self.visit(child)? {
                last = Some(value);
            }
        }
        Ok(last)
    }

    fn visit_element(&mut self, element: &Element) -> Result<Name, StructuralError> {
        check_tag(element, NodeKind::Element)?;
        let node = self.define("el", Op::CreateElement {
            tag: element.tag.to_string(),
            is_static: element.is_static,
        });
        for attribute in &element.attributes {
            let value = self.attribute_value(&attribute.value);
            self.push(None, Op::SetProp {
                element: node.clone(),
                key: attribute.name.to_string(),
                value,
            });
        }
        for child in &element.children {
            if let Some(child) = self.visit(child)? {
                self.push(None, Op::AppendChild {parent: node.clone(), child});
            }
        }
        Ok(node)
    }

    fn attribute_value(&mut self, value: &AttrValue) -> Name {
        match value {
            AttrValue::Flag => self.define("const", Op::Alloc {
                value: AllocValue::Literal(Literal::Bool(true)),
                is_static: true,
            }),
            AttrValue::Literal(x) => self.define("const", Op::Alloc {
                value: AllocValue::Literal(Literal::Str(x.to_string())),
                is_static: true,
            }),
            AttrValue::Dynamic(x) => self.define("expr", Op::Load {expr: x.to_string()}),
        }
    }

    /// Children, when present, reach the component as a `children` prop.
    fn visit_component(&mut self, element: &Element) -> Result<Name, StructuralError> {
        check_tag(element, NodeKind::Component)?;
        let children = if element.children.is_empty() {
            None
        } else {
            Some(self.visit_fragment(&element.children)?)
        };
        let mut props: Vec<Prop> = element.attributes
            .iter()
            .map(|attribute| {
                let value = match &attribute.value {
                    AttrValue::Flag => PropValue::Literal(Literal::Bool(true)),
                    AttrValue::Literal(x) => PropValue::Literal(Literal::Str(x.to_string())),
                    AttrValue::Dynamic(x) => PropValue::Expr(x.to_string()),
                };
                Prop {key: attribute.name.to_string(), value}
            })
            .collect();
        if let Some(children) = children {
            props.push(Prop {key: String::from("children"), value: PropValue::Value(children)});
        }
        let props = self.define("props", Op::Alloc {
            value: AllocValue::Props(props),
            is_static: element.is_static,
        });
        Ok(self.define("comp", Op::Call {
            component: element.tag.to_string(),
            props,
            is_static: element.is_static,
        }))
    }

    fn visit_fragment(&mut self, children: &[Node]) -> Result<Name, StructuralError> {
        let mut values = Vec::with_capacity(children.len());
        for child in children {
            if let Some(value) = self.visit(child)? {
                values.push(value);
            }
        }
        Ok(self.define("frag", Op::Alloc {
            value: AllocValue::Fragment(values),
            is_static: children.iter().all(is_static_node),
        }))
    }
}

fn check_tag(element: &Element, kind: NodeKind) -> Result<(), StructuralError> {
    if element.tag.is_empty() {
        let kind = match kind {
            NodeKind::Component => "component",
            _ => "element",
        };
        return Err(StructuralError::MissingTagName {kind, location: element.location});
    }
    let callable = element.tag
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$');
    if kind == NodeKind::Component && !callable {
        return Err(StructuralError::InvalidComponentName {
            name: element.tag.to_string(),
            location: element.location,
        });
    }
    Ok(())
}

/// Builds optimized IR for an already parsed program.
pub fn build_ir(node: &Node) -> Result<Ir, StructuralError> {
    IrBuilder::new().build(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::frontend::parser::parse_source;
    use crate::frontend::data::{Attributes, Location};

    fn unoptimized(source: &str) -> Ir {
        let node = parse_source(source).unwrap();
        IrBuilder::new().build_unoptimized(&node).unwrap()
    }

    fn listing(ir: &Ir) -> Vec<String> {
        ir.instructions().iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn element_with_attribute_and_expression() {
        let ir = unoptimized(r#"<div id="x">{msg}</div>"#);
        assert_eq!(listing(&ir), vec![
            r#"el0 = create_element "div" dynamic"#,
            r#"const0 = alloc "x" static"#,
            r#"set_prop el0 "id" const0"#,
            "expr0 = load {msg} dynamic",
            "append_child el0 expr0",
        ]);
        assert_eq!(ir.root.as_deref(), Some("el0"));
    }

    #[test]
    fn flags_and_dynamic_attributes() {
        let ir = unoptimized("<input disabled value={v}/>");
        assert_eq!(listing(&ir), vec![
            r#"el0 = create_element "input" dynamic"#,
            "const0 = alloc true static",
            r#"set_prop el0 "disabled" const0"#,
            "expr0 = load {v} dynamic",
            r#"set_prop el0 "value" expr0"#,
        ]);
    }

    #[test]
    fn component_passes_children_as_prop() {
        let ir = unoptimized(r#"<Card title="t" n={count}><b>hi</b></Card>"#);
        assert_eq!(listing(&ir), vec![
            r#"el0 = create_element "b" static"#,
            r#"text0 = create_text "hi" static"#,
            "append_child el0 text0",
            "frag0 = alloc [el0] static",
            r#"props0 = alloc {"title": "t", "n": {count}, "children": frag0} dynamic"#,
            "comp0 = call Card props0 dynamic",
        ]);
        assert_eq!(ir.root.as_deref(), Some("comp0"));
    }

    #[test]
    fn program_root_is_last_value() {
        let ir = unoptimized("<a/>text<b/>");
        assert_eq!(ir.root.as_deref(), Some("el1"));
        assert_eq!(IrBuilder::new().build_unoptimized(&Node::Program(vec![])).unwrap().root, None);
    }

    #[test]
    fn fragment_collects_children() {
        let loc = Location::start();
        let node = Node::Fragment(vec![
            Node::new_text("a", loc),
            Node::new_expression("b", loc),
        ]);
        let ir = IrBuilder::new().build_unoptimized(&node).unwrap();
        assert_eq!(listing(&ir).last().unwrap(), "frag0 = alloc [text0, expr0] dynamic");
    }

    #[test]
    fn empty_tag_name_is_structural_error() {
        let node = parse_source("<>x</>").unwrap();
        let err = IrBuilder::new().build(&node).unwrap_err();
        assert!(matches!(err, StructuralError::MissingTagName {kind: "element", ..}));

        let element = Element::new("", Attributes::new(), vec![], Location::start());
        let err = IrBuilder::new().build(&Node::Component(element)).unwrap_err();
        assert!(matches!(err, StructuralError::MissingTagName {kind: "component", ..}));
    }

    #[test]
    fn component_names_must_be_identifiers() {
        let node = parse_source("<div><My-Widget/></div>").unwrap();
        let err = IrBuilder::new().build(&node).unwrap_err();
        assert_eq!(err, StructuralError::InvalidComponentName {
            name: String::from("My-Widget"),
            location: Location {offset: 5, line: 1, column: 6},
        });
        assert!(IrBuilder::new().build(&parse_source("<my-widget/><My_Widget2/>").unwrap()).is_ok());
    }

    #[test]
    fn every_instruction_lives_in_the_entry_block() {
        let ir = unoptimized("<ul><li>a</li><li>{b}</li></ul>");
        assert_eq!(ir.blocks.len(), 1);
        assert!(ir.instructions().iter().all(|x| x.block == ir.entry));
    }
}
