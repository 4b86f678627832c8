//! Compiles markup+expression templates into UI-tree construction code.
//!
//! The pipeline is fixed: tokenizer, recursive-descent parser, SSA builder
//! (which runs the optimizer), code generator. Every call builds fresh state.
pub mod errors;
pub mod frontend;
pub mod ir;
pub mod codegen;
pub mod compiler;

pub use compiler::{build_ir, compile, compile_with_options, CompileOptions, Target};
pub use errors::{CompileError, GenerationAnomaly, Result, StructuralError, SyntaxError};
pub use ir::{analyze_ir, print_ir, Ir, IrStats};
