//! SSA intermediate representation.
//!
//! Every instruction defines at most one fresh name. Today only the entry
//! block is populated; the predecessor, successor and dominator sets are kept
//! for control-flow constructs the template language does not have yet.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use itertools::Itertools;
use serde::{Serialize, Deserialize};

pub mod builder;
pub mod passes;
pub mod query;

pub use builder::IrBuilder;
pub use query::{analyze_ir, print_ir, IrStats};

pub type Name = String;
pub type BlockId = usize;

///////////////////////////////////////////////////////////////////////////////
// VALUES
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Str(String),
}

impl Literal {
    /// Target-language spelling. Strings use JSON escaping, which is valid JS.
    pub fn to_js(&self) -> String {
        match self {
            Literal::Bool(x) => x.to_string(),
            Literal::Str(x) => serde_json::Value::String(x.clone()).to_string(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_js())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PropValue {
    Literal(Literal),
    /// Opaque expression text.
    Expr(String),
    /// A previously defined value.
    Value(Name),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Prop {
    pub key: String,
    pub value: PropValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AllocValue {
    /// An attribute literal.
    Literal(Literal),
    /// A component's props object.
    Props(Vec<Prop>),
    /// An array of child values.
    Fragment(Vec<Name>),
}

///////////////////////////////////////////////////////////////////////////////
// INSTRUCTIONS
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    CreateElement {
        tag: String,
        is_static: bool,
    },
    CreateText {
        text: String,
    },
    Alloc {
        value: AllocValue,
        is_static: bool,
    },
    Load {
        expr: String,
    },
    SetProp {
        element: Name,
        key: String,
        value: Name,
    },
    AppendChild {
        parent: Name,
        child: Name,
    },
    Call {
        component: String,
        props: Name,
        is_static: bool,
    },
    Store {
        slot: String,
        value: Name,
    },
    /// Any op this version does not know. Only produced by deserialization.
    #[serde(other)]
    Unsupported,
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Op::CreateElement{..} => "create_element",
            Op::CreateText{..} => "create_text",
            Op::Alloc{..} => "alloc",
            Op::Load{..} => "load",
            Op::SetProp{..} => "set_prop",
            Op::AppendChild{..} => "append_child",
            Op::Call{..} => "call",
            Op::Store{..} => "store",
            Op::Unsupported => "unsupported",
        }
    }
    /// Value names this op reads, in argument order. Tag and key strings are
    /// literals and not included.
    pub fn operands(&self) -> Vec<&Name> {
        match self {
            Op::Alloc{value: AllocValue::Props(props), ..} => {
                props
                    .iter()
                    .filter_map(|prop| match &prop.value {
                        PropValue::Value(x) => Some(x),
                        _ => None,
                    })
                    .collect()
            }
            Op::Alloc{value: AllocValue::Fragment(xs), ..} => xs.iter().collect(),
            Op::SetProp{element, value, ..} => vec![element, value],
            Op::AppendChild{parent, child} => vec![parent, child],
            Op::Call{props, ..} => vec![props],
            Op::Store{value, ..} => vec![value],
            _ => Vec::new(),
        }
    }
    pub fn operands_mut(&mut self) -> Vec<&mut Name> {
        match self {
            Op::Alloc{value: AllocValue::Props(props), ..} => {
                props
                    .iter_mut()
                    .filter_map(|prop| match &mut prop.value {
                        PropValue::Value(x) => Some(x),
                        _ => None,
                    })
                    .collect()
            }
            Op::Alloc{value: AllocValue::Fragment(xs), ..} => xs.iter_mut().collect(),
            Op::SetProp{element, value, ..} => vec![element, value],
            Op::AppendChild{parent, child} => vec![parent, child],
            Op::Call{props, ..} => vec![props],
            Op::Store{value, ..} => vec![value],
            _ => Vec::new(),
        }
    }
    /// Ops kept even when nothing reads their result.
    pub fn has_side_effects(&self) -> bool {
        match self {
            Op::Call{..} | Op::Store{..} => true,
            _ => false,
        }
    }
    /// `None` for ops that produce no node or value.
    pub fn is_static(&self) -> Option<bool> {
        match self {
            Op::CreateElement{is_static, ..} => Some(*is_static),
            Op::CreateText{..} => Some(true),
            Op::Alloc{is_static, ..} => Some(*is_static),
            Op::Load{..} => Some(false),
            Op::Call{is_static, ..} => Some(*is_static),
            _ => None,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn flag(is_static: bool) -> &'static str {
            if is_static {"static"} else {"dynamic"}
        }
        match self {
            Op::CreateElement{tag, is_static} => {
                write!(f, "create_element {:?} {}", tag, flag(*is_static))
            }
            Op::CreateText{text} => write!(f, "create_text {:?} static", text),
            Op::Alloc{value, is_static} => {
                let value = match value {
                    AllocValue::Literal(x) => x.to_js(),
                    AllocValue::Props(props) => {
                        let entries = props
                            .iter()
                            .map(|prop| match &prop.value {
                                PropValue::Literal(x) => format!("{:?}: {}", prop.key, x),
                                PropValue::Expr(x) => format!("{:?}: {{{}}}", prop.key, x),
                                PropValue::Value(x) => format!("{:?}: {}", prop.key, x),
                            })
                            .join(", ");
                        format!("{{{}}}", entries)
                    }
                    AllocValue::Fragment(xs) => format!("[{}]", xs.iter().join(", ")),
                };
                write!(f, "alloc {} {}", value, flag(*is_static))
            }
            Op::Load{expr} => write!(f, "load {{{}}} dynamic", expr),
            Op::SetProp{element, key, value} => write!(f, "set_prop {} {:?} {}", element, key, value),
            Op::AppendChild{parent, child} => write!(f, "append_child {} {}", parent, child),
            Op::Call{component, props, is_static} => {
                write!(f, "call {} {} {}", component, props, flag(*is_static))
            }
            Op::Store{slot, value} => write!(f, "store {:?} {}", slot, value),
            Op::Unsupported => write!(f, "unsupported"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub dest: Option<Name>,
    pub op: Op,
    pub block: BlockId,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.dest {
            Some(dest) => write!(f, "{} = {}", dest, self.op),
            None => write!(f, "{}", self.op),
        }
    }
}

///////////////////////////////////////////////////////////////////////////////
// BLOCKS
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    pub instructions: Vec<Instruction>,
    pub predecessors: BTreeSet<BlockId>,
    pub successors: BTreeSet<BlockId>,
    pub dominators: BTreeSet<BlockId>,
}

impl BasicBlock {
    pub fn new(id: BlockId) -> Self {
        BasicBlock {
            id,
            instructions: Vec::new(),
            predecessors: BTreeSet::new(),
            successors: BTreeSet::new(),
            dominators: std::iter::once(id).collect(),
        }
    }
}

///////////////////////////////////////////////////////////////////////////////
// ROOT IR
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ir {
    pub blocks: BTreeMap<BlockId, BasicBlock>,
    pub entry: BlockId,
    /// alias -> aliased name. Resolved by the generator before emission.
    #[serde(default)]
    pub aliases: BTreeMap<Name, Name>,
    /// Structurally repeated node creations: dest -> first occurrence.
    /// Diagnostic only; nodes have identity and are never merged.
    #[serde(default)]
    pub duplicates: BTreeMap<Name, Name>,
    #[serde(default)]
    pub counters: BTreeMap<String, usize>,
    /// The value returned by `render`.
    #[serde(default)]
    pub root: Option<Name>,
}

impl Default for Ir {
    fn default() -> Self {
        Ir::new()
    }
}

impl Ir {
    pub fn new() -> Self {
        let entry = 0;
        let mut blocks = BTreeMap::new();
        blocks.insert(entry, BasicBlock::new(entry));
        Ir {
            blocks,
            entry,
            aliases: BTreeMap::new(),
            duplicates: BTreeMap::new(),
            counters: BTreeMap::new(),
            root: None,
        }
    }
    /// Mints `{prefix}{n}` with a monotonic counter per prefix.
    pub fn fresh_name(&mut self, prefix: &str) -> Name {
        let counter = self.counters.entry(prefix.to_owned()).or_insert(0);
        let name = format!("{}{}", prefix, counter);
        *counter += 1;
        name
    }
    pub fn entry_block(&self) -> Option<&BasicBlock> {
        self.blocks.get(&self.entry)
    }
    pub fn entry_block_mut(&mut self) -> Option<&mut BasicBlock> {
        self.blocks.get_mut(&self.entry)
    }
    /// Entry block instructions, or nothing if the entry block is missing.
    pub fn instructions(&self) -> &[Instruction] {
        self.entry_block()
            .map(|block| block.instructions.as_slice())
            .unwrap_or(&[])
    }
    /// Follows the alias chain starting at `name`.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        let mut current = name;
        for _ in 0..=self.aliases.len() {
            match self.aliases.get(current) {
                Some(next) => current = next.as_str(),
                None => break,
            }
        }
        current
    }
    pub fn instruction_count(&self) -> usize {
        self.blocks.values().map(|x| x.instructions.len()).sum()
    }
}
