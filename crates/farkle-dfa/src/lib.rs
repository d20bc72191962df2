//! The pattern-language parser and DFA compiler for the Farkle
//! parser-construction toolchain (`spec.md` §4.2, §4.3).

mod minimize;
mod nfa;
mod pattern;
mod subset_construction;

pub mod compiler;

pub use compiler::compile;
pub use pattern::parse as parse_pattern;
