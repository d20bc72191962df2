//! The parse-action vocabulary surfaced by the LR driver (`spec.md` §4.8),
//! grounded on `sherpa-rust-rt/types/parse_action.rs`'s `ParseAction`
//! shape, trimmed to the table-driven subset this driver needs — no
//! `Fork`/`ScannerToken`/bytecode-level variants, since this driver
//! interprets a `CompiledLr` directly rather than compiling to a VM.

use farkle_core::types::{Position, ProductionId, TerminalId};

/// One step taken by [`crate::driver::parse`], useful for tracing.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseAction {
  Shift { terminal: TerminalId, position: Position },
  Reduce { production: ProductionId, symbol_count: usize },
  Accept,
  Error { found: Option<TerminalId>, expected: Vec<TerminalId>, position: Position },
  EndOfInput { position: Position },
}
