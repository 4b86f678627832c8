//! External Compiler API
use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use tracing::debug_span;
use crate::codegen::CodeGenerator;
use crate::errors::Result;
use crate::frontend::parser::parse_source;
use crate::ir::{Ir, IrBuilder};

///////////////////////////////////////////////////////////////////////////////
// OPTIONS
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Js,
    /// Accepted, but emits the same code as `Js`.
    Wasm,
}

impl Default for Target {
    fn default() -> Self {
        Target::Js
    }
}

impl FromStr for Target {
    type Err = String;
    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "js" => Ok(Target::Js),
            "wasm" => Ok(Target::Wasm),
            other => Err(format!("unknown target {:?} (expected js or wasm)", other)),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Js => f.write_str("js"),
            Target::Wasm => f.write_str("wasm"),
        }
    }
}

/// Code generation switches. Missing keys in a config file take the
/// `Default` value, which turns every optimization off.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    pub target: Target,
    pub minify: bool,
    pub inline_cache: bool,
    pub static_optimization: bool,
}

impl CompileOptions {
    /// The configuration used by `compile`.
    pub fn optimized() -> Self {
        CompileOptions {
            target: Target::Js,
            minify: true,
            inline_cache: true,
            static_optimization: true,
        }
    }
}

///////////////////////////////////////////////////////////////////////////////
// ENTRYPOINTS
///////////////////////////////////////////////////////////////////////////////

/// Tokenizes, parses and builds optimized IR.
pub fn build_ir(source: &str) -> Result<Ir> {
    let node = parse_source(source)?;
    let ir = IrBuilder::new().build(&node)?;
    Ok(ir)
}

pub fn compile(source: &str) -> Result<String> {
    compile_with_options(source, &CompileOptions::optimized())
}

pub fn compile_with_options(source: &str, options: &CompileOptions) -> Result<String> {
    let span = debug_span!("compile", bytes = source.len(), target = %options.target);
    let _guard = span.enter();
    let ir = build_ir(source)?;
    let output = CodeGenerator::new(options).generate(&ir);
    Ok(output.code)
}
