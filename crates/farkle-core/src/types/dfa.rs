use super::handles::{DfaStateId, TerminalId};

/// One DFA state: an ordered edge table plus at most one accept tag
/// (`spec.md` §3). Edges are sorted by `char_lo` for binary search and for
/// a deterministic wire encoding (`spec.md` §4.6).
#[derive(Debug, Clone, Default)]
pub struct DfaState {
  pub edges: Vec<(char, char, DfaStateId)>,
  pub accept: Option<TerminalId>,
  /// The `.` fallback transition, taken only when no explicit edge in
  /// `edges` covers the input character (`spec.md` §4.3 item 5, §9: `.`
  /// has strictly lower priority than any concrete class in the same state).
  pub default: Option<DfaStateId>,
}

impl DfaState {
  pub fn transition(&self, c: char) -> Option<DfaStateId> {
    self
      .edges
      .binary_search_by(|(lo, hi, _)| {
        if c < *lo {
          std::cmp::Ordering::Greater
        } else if c > *hi {
          std::cmp::Ordering::Less
        } else {
          std::cmp::Ordering::Equal
        }
      })
      .ok()
      .map(|i| self.edges[i].2)
      .or(self.default)
  }
}

/// A compiled, minimized lexer automaton (`spec.md` §4.3).
#[derive(Debug, Clone, Default)]
pub struct CompiledDfa {
  pub start_state: DfaStateId,
  pub states: Vec<DfaState>,
}

impl CompiledDfa {
  pub fn state(&self, id: DfaStateId) -> &DfaState {
    &self.states[id.index()]
  }
}
