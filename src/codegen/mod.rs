//! IR to target code.
pub mod js;
pub mod names;

pub use js::{generate, CodeGenerator, Generated};
