//! JavaScript emission.
//!
//! The emitted factory is the whole boundary to the runtime:
//!
//! ```text
//! (function (construct, mount, patch) {
//!   return function render(props, state) { ... };
//! })
//! ```
use std::collections::{HashMap, HashSet};
use itertools::Itertools;
use tracing::{trace, warn};
use crate::compiler::{CompileOptions, Target};
use crate::errors::GenerationAnomaly;
use crate::ir::*;
use crate::codegen::names::{identifiers, NameMap};

///////////////////////////////////////////////////////////////////////////////
// OUTPUT BUFFER
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Default)]
struct Writer {
    minify: bool,
    depth: usize,
    buffer: String,
}

impl Writer {
    fn line(&mut self, text: &str) {
        if self.minify {
            self.buffer.push_str(text);
            return;
        }
        for _ in 0..self.depth {
            self.buffer.push_str("  ");
        }
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }
    fn open(&mut self, text: &str) {
        self.line(text);
        self.depth += 1;
    }
    fn close(&mut self, text: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
    }
    /// `} else {` and friends.
    fn reopen(&mut self, text: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.open(text);
    }
    fn finish(self) -> String {
        if self.minify {
            self.buffer
        } else {
            self.buffer.trim_end().to_owned()
        }
    }
}

fn quote(value: &str) -> String {
    Literal::Str(value.to_owned()).to_js()
}

///////////////////////////////////////////////////////////////////////////////
// GENERATOR
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub code: String,
    pub anomalies: Vec<GenerationAnomaly>,
}

/// One generator per compilation; every cache it keeps is dropped with it.
pub struct CodeGenerator<'o> {
    options: &'o CompileOptions,
    names: NameMap,
    /// Serialized static literal -> IR name of its first emission.
    static_literals: HashMap<String, Name>,
    /// IR name of a skipped literal -> IR name emitted in its place.
    redirects: HashMap<Name, Name>,
    anomalies: Vec<GenerationAnomaly>,
    out: Writer,
}

impl<'o> CodeGenerator<'o> {
    pub fn new(options: &'o CompileOptions) -> Self {
        CodeGenerator {
            options,
            names: NameMap::new(options.minify, HashSet::new()),
            static_literals: HashMap::new(),
            redirects: HashMap::new(),
            anomalies: Vec::new(),
            out: Writer {minify: options.minify, ..Writer::default()},
        }
    }

    pub fn generate(mut self, ir: &Ir) -> Generated {
        if self.options.target == Target::Wasm {
            warn!("wasm target has no dedicated backend; emitting js");
        }
        self.names = NameMap::new(self.options.minify, template_words(ir));
        self.out.open("(function (construct, mount, patch) {");
        if self.options.inline_cache {
            self.out.line("const __templates = Object.create(null);");
            self.out.line(
                "const __cached = (tag) => structuredClone(__templates[tag] || (__templates[tag] = construct(tag, {})));"
            );
        }
        self.out.open("return function render(props, state) {");
        match ir.entry_block() {
            Some(block) => {
                for (index, instruction) in block.instructions.iter().enumerate() {
                    self.emit(ir, index, instruction);
                }
                self.emit_return(ir);
            }
            None => {
                let anomaly = GenerationAnomaly::MissingEntryBlock(ir.entry);
                warn!("{}", anomaly);
                self.anomalies.push(anomaly);
            }
        }
        self.out.close("};");
        self.out.close("})");
        Generated {
            code: self.out.finish(),
            anomalies: self.anomalies,
        }
    }

    /// Emitted name for an operand: alias chain first, then literal
    /// deduplication, then renaming.
    fn value(&mut self, ir: &Ir, name: &str) -> String {
        let resolved = ir.resolve(name);
        let target = self.redirects
            .get(resolved)
            .cloned()
            .unwrap_or_else(|| resolved.to_owned());
        self.names.get(&target)
    }

    fn bind(&mut self, dest: &Option<Name>, expr: String) {
        match dest {
            Some(dest) => {
                let dest = self.names.get(dest);
                self.out.line(&format!("const {} = {};", dest, expr));
            }
            None => self.out.line(&format!("{};", expr)),
        }
    }

    fn emit(&mut self, ir: &Ir, index: usize, instruction: &Instruction) {
        trace!(index, %instruction, "emit");
        let dest = &instruction.dest;
        match &instruction.op {
            Op::CreateElement{tag, is_static} => {
                let expr = if self.options.inline_cache && *is_static {
                    format!("__cached({})", quote(tag))
                } else {
                    format!("construct({}, {{}})", quote(tag))
                };
                self.bind(dest, expr);
            }
            Op::CreateText{text} => {
                self.bind(dest, format!("construct(\"#text\", {{ value: {} }})", quote(text)));
            }
            Op::Alloc{value: AllocValue::Literal(literal), is_static} => {
                let key = literal.to_js();
                if let (true, true, Some(dest)) = (self.options.static_optimization, *is_static, dest) {
                    if let Some(first) = self.static_literals.get(&key) {
                        self.redirects.insert(dest.clone(), first.clone());
                        return;
                    }
                    self.static_literals.insert(key.clone(), dest.clone());
                }
                self.bind(dest, key);
            }
            Op::Alloc{value: AllocValue::Props(props), ..} => {
                let entries = props
                    .iter()
                    .map(|prop| {
                        let value = match &prop.value {
                            PropValue::Literal(x) => x.to_js(),
                            PropValue::Expr(x) => format!("({})", x),
                            PropValue::Value(x) => self.value(ir, x),
                        };
                        format!("{}: {}", quote(&prop.key), value)
                    })
                    .collect::<Vec<_>>();
                let expr = if entries.is_empty() {
                    String::from("{}")
                } else {
                    format!("{{ {} }}", entries.join(", "))
                };
                self.bind(dest, expr);
            }
            Op::Alloc{value: AllocValue::Fragment(children), ..} => {
                let children = children.iter().map(|x| self.value(ir, x)).collect::<Vec<_>>();
                self.bind(dest, format!("[{}]", children.iter().join(", ")));
            }
            Op::Load{expr} => {
                self.bind(dest, format!("({})", expr));
            }
            Op::SetProp{element, key, value} => {
                let element = self.value(ir, element);
                let value = self.value(ir, value);
                self.out.line(&format!("{}.props[{}] = {};", element, quote(key), value));
            }
            Op::AppendChild{parent, child} => {
                let parent = self.value(ir, parent);
                let child = self.value(ir, child);
                self.out.line(&format!("{}.children.push({});", parent, child));
            }
            Op::Call{component, props, ..} => {
                let props = self.value(ir, props);
                self.bind(dest, format!("{}({})", component, props));
            }
            Op::Store{slot, value} => {
                let value = self.value(ir, value);
                self.out.line(&format!("state[{}] = {};", quote(slot), value));
            }
            Op::Unsupported => {
                let anomaly = GenerationAnomaly::UnsupportedOp {index};
                warn!("{}", anomaly);
                self.anomalies.push(anomaly);
            }
        }
    }

    /// Mounts on the first render into `state.container`, patches after.
    fn emit_return(&mut self, ir: &Ir) {
        let root = match &ir.root {
            Some(root) => self.value(ir, root),
            None => {
                self.out.line("return null;");
                return;
            }
        };
        self.out.open("if (state && state.container) {");
        self.out.open("if (state.node) {");
        self.out.line(&format!("patch(state.node, {}, state.container);", root));
        self.out.reopen("} else {");
        self.out.line(&format!("mount({}, state.container);", root));
        self.out.close("}");
        self.out.line(&format!("state.node = {};", root));
        self.out.close("}");
        self.out.line(&format!("return {};", root));
    }
}

/// Words the template's own code uses: expression identifiers and component
/// names. Minified names must not shadow them.
fn template_words(ir: &Ir) -> HashSet<String> {
    let mut words = HashSet::new();
    for instruction in ir.blocks.values().flat_map(|x| x.instructions.iter()) {
        match &instruction.op {
            Op::Load{expr} => words.extend(identifiers(expr).map(String::from)),
            Op::Alloc{value: AllocValue::Props(props), ..} => {
                for prop in props {
                    if let PropValue::Expr(expr) = &prop.value {
                        words.extend(identifiers(expr).map(String::from));
                    }
                }
            }
            Op::Call{component, ..} => {
                words.extend(identifiers(component).map(String::from));
            }
            _ => {}
        }
    }
    words
}

pub fn generate(ir: &Ir, options: &CompileOptions) -> String {
    CodeGenerator::new(options).generate(ir).code
}
