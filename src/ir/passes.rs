//! IR optimization passes.
//!
//! The passes run once each, in a fixed order: dead-code elimination,
//! constant aliasing, common-subexpression detection.
use std::collections::{HashMap, HashSet};
use tracing::debug;
use crate::ir::*;

pub fn optimize(ir: &mut Ir) {
    let removed = eliminate_dead_code(ir);
    let aliased = alias_constants(ir);
    let duplicates = detect_common_subexpressions(ir);
    debug!(removed, aliased, duplicates, "optimized ir");
}

///////////////////////////////////////////////////////////////////////////////
// DEAD CODE
///////////////////////////////////////////////////////////////////////////////

/// Drops instructions whose destination is never read. The render root
/// counts as read. `call` and `store` always stay.
///
/// Single pass: an instruction that only fed a removed instruction survives.
pub fn eliminate_dead_code(ir: &mut Ir) -> usize {
    let root = ir.root.clone();
    let block = match ir.entry_block_mut() {
        Some(block) => block,
        None => return 0,
    };
    let mut referenced: HashSet<Name> = block.instructions
        .iter()
        .flat_map(|x| x.op.operands())
        .cloned()
        .collect();
    referenced.extend(root);
    let before = block.instructions.len();
    block.instructions.retain(|x| match &x.dest {
        Some(dest) => referenced.contains(dest) || x.op.has_side_effects(),
        None => true,
    });
    before - block.instructions.len()
}

///////////////////////////////////////////////////////////////////////////////
// CONSTANT ALIASING
///////////////////////////////////////////////////////////////////////////////

/// Renames every read of a static `alloc` to a fresh alias recorded in
/// `Ir::aliases`. Returns the number of rewritten operands.
pub fn alias_constants(ir: &mut Ir) -> usize {
    let mut instructions = match ir.entry_block_mut() {
        Some(block) => std::mem::take(&mut block.instructions),
        None => return 0,
    };
    let mut constants: HashSet<Name> = instructions
        .iter()
        .filter(|x| matches!(x.op, Op::Alloc{is_static: true, ..}))
        .filter_map(|x| x.dest.clone())
        .collect();
    let mut count = 0;
    for instruction in instructions.iter_mut() {
        for operand in instruction.op.operands_mut() {
            if constants.contains(operand.as_str()) {
                let alias = ir.fresh_name("alias");
                ir.aliases.insert(alias.clone(), operand.clone());
                constants.insert(alias.clone());
                *operand = alias;
                count += 1;
            }
        }
    }
    if let Some(block) = ir.entry_block_mut() {
        block.instructions = instructions;
    }
    count
}

///////////////////////////////////////////////////////////////////////////////
// COMMON SUBEXPRESSIONS
///////////////////////////////////////////////////////////////////////////////

/// Records repeated `create_element`/`create_text` instructions in
/// `Ir::duplicates`, keyed on the op and its tag or text. The static flag is
/// not part of the key. Nothing is removed or rewritten.
pub fn detect_common_subexpressions(ir: &mut Ir) -> usize {
    let mut seen: HashMap<(&'static str, &str), &Name> = HashMap::new();
    let mut found = Vec::new();
    for instruction in ir.instructions() {
        let (value, dest) = match (&instruction.op, &instruction.dest) {
            (Op::CreateElement{tag, ..}, Some(dest)) => (tag, dest),
            (Op::CreateText{text}, Some(dest)) => (text, dest),
            _ => continue,
        };
        let key = (instruction.op.name(), value.as_str());
        match seen.get(&key) {
            Some(first) => found.push((dest.clone(), (*first).clone())),
            None => {
                seen.insert(key, dest);
            }
        }
    }
    let count = found.len();
    ir.duplicates.extend(found);
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::frontend::parser::parse_source;

    fn build(source: &str) -> Ir {
        IrBuilder::new().build(&parse_source(source).unwrap()).unwrap()
    }

    fn ops(ir: &Ir) -> Vec<String> {
        ir.instructions().iter().map(|x| x.to_string()).collect()
    }

    fn instruction(dest: Option<&str>, op: Op) -> Instruction {
        Instruction {dest: dest.map(String::from), op, block: 0}
    }

    #[test]
    fn unreferenced_values_are_removed() {
        let ir = build("<a/>hello<b/>");
        assert_eq!(ops(&ir), vec![r#"el1 = create_element "b" static"#]);
    }

    #[test]
    fn calls_survive_without_readers() {
        let ir = build("<Foo/><b/>");
        assert_eq!(ops(&ir), vec![
            "props0 = alloc {} static",
            "comp0 = call Foo alias0 static",
            r#"el0 = create_element "b" static"#,
        ]);
    }

    #[test]
    fn elimination_is_a_single_pass() {
        let mut ir = Ir::new();
        let literal = AllocValue::Literal(Literal::Str("x".into()));
        ir.blocks.get_mut(&0).unwrap().instructions = vec![
            instruction(Some("const0"), Op::Alloc {value: literal, is_static: true}),
            instruction(Some("frag0"), Op::Alloc {
                value: AllocValue::Fragment(vec!["const0".into()]),
                is_static: true,
            }),
            instruction(Some("const1"), Op::Alloc {
                value: AllocValue::Literal(Literal::Bool(true)),
                is_static: true,
            }),
            instruction(None, Op::Store {slot: "s".into(), value: "const1".into()}),
        ];
        assert_eq!(eliminate_dead_code(&mut ir), 1);
        let dests: Vec<_> = ir.instructions().iter().map(|x| x.dest.clone()).collect();
        assert_eq!(dests, vec![Some("const0".to_owned()), Some("const1".to_owned()), None]);
    }

    #[test]
    fn missing_entry_block_is_a_no_op() {
        let mut ir = Ir::new();
        ir.blocks.clear();
        optimize(&mut ir);
        assert_eq!(ir.instruction_count(), 0);
    }

    #[test]
    fn static_allocs_are_read_through_aliases() {
        let ir = build(r#"<div id="x" title={t}/>"#);
        assert_eq!(ops(&ir), vec![
            r#"el0 = create_element "div" dynamic"#,
            r#"const0 = alloc "x" static"#,
            r#"set_prop el0 "id" alias0"#,
            "expr0 = load {t} dynamic",
            r#"set_prop el0 "title" expr0"#,
        ]);
        assert_eq!(ir.aliases.get("alias0").map(String::as_str), Some("const0"));
        assert_eq!(ir.resolve("alias0"), "const0");
    }

    #[test]
    fn repeated_nodes_are_recorded_not_merged() {
        let ir = build("<p><br/><br/>x x</p>");
        assert_eq!(ir.duplicates.get("el2").map(String::as_str), Some("el1"));
        assert_eq!(ir.duplicates.len(), 1);
        assert_eq!(ir.instructions().len(), 7);
    }

    #[test]
    fn duplicates_ignore_the_static_flag() {
        let ir = build("<p><div>a</div><div>{x}</div></p>");
        assert_eq!(ops(&ir)[1], r#"el1 = create_element "div" static"#);
        assert_eq!(ops(&ir)[4], r#"el2 = create_element "div" dynamic"#);
        assert_eq!(ir.duplicates.get("el2").map(String::as_str), Some("el1"));
        assert_eq!(ir.duplicates.len(), 1);
    }

    #[test]
    fn tags_and_texts_do_not_collide() {
        let ir = build("<p><b/>b</p>");
        assert!(ir.duplicates.is_empty());
    }

    #[test]
    fn no_unreferenced_pure_values_survive() {
        let sources = [
            r#"<div id="x">{msg}</div>"#,
            "<ul><li>a</li>{b}<li c={d}/></ul> tail <Foo x=1/> {e}",
            "<a/><b/><c>t</c>",
        ];
        for source in sources.iter() {
            let ir = build(source);
            let referenced: HashSet<&str> = ir.instructions()
                .iter()
                .flat_map(|x| x.op.operands())
                .map(|x| ir.resolve(x))
                .chain(ir.root.as_deref())
                .collect();
            for x in ir.instructions() {
                if let Some(dest) = &x.dest {
                    assert!(
                        x.op.has_side_effects() || referenced.contains(dest.as_str()),
                        "{} survived in {}",
                        x,
                        source
                    );
                }
            }
        }
    }
}
