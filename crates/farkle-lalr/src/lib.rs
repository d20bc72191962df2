//! The LALR(1) table generator for the Farkle parser-construction
//! toolchain (`spec.md` §4.4).

mod closure;
mod conflict;
mod item;
mod lookahead;

pub mod tables;

pub use item::Item;
pub use lookahead::Lookahead;
pub use tables::{build as compile, Lr0Automaton};
