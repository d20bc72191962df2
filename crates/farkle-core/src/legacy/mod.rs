//! Read-only import of legacy "enhanced grammar tables" grammars
//! (`spec.md` §6).

mod egt_import;
mod reader;

pub use egt_import::{import, LegacyGrammar, MAGIC};
