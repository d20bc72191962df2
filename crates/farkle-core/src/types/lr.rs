use std::collections::BTreeMap;

use super::handles::{LrStateId, NonterminalId, ProductionId, TerminalId};

/// A per-terminal LR action (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LrAction {
  Shift(LrStateId),
  Reduce(ProductionId),
  /// Emitted by `NonAssoc` conflict resolution (`spec.md` §4.4 step 4):
  /// rejects this terminal at this state even though a naive table build
  /// would otherwise shift or reduce.
  Error,
}

/// The end-of-input action, stored separately from per-terminal actions
/// (`spec.md` §3, §4.4 "Output").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EofAction {
  Reduce(ProductionId),
  Accept,
}

/// One row of the LR table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LrStateRow {
  pub actions: BTreeMap<TerminalId, LrAction>,
  pub gotos: BTreeMap<NonterminalId, LrStateId>,
  pub eof_action: Option<EofAction>,
}

/// A compiled LALR(1) action/goto table (`spec.md` §4.4).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledLr {
  pub start_state: LrStateId,
  pub states: Vec<LrStateRow>,
}

impl CompiledLr {
  pub fn row(&self, id: LrStateId) -> &LrStateRow {
    &self.states[id.index()]
  }
}
