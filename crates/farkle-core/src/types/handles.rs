use std::fmt::{self, Display};

/// A dense, stable index into the terminal table of a [`GrammarDefinition`](crate::builder::GrammarDefinition).
///
/// Terminal handles occupy `0..terminal_count` in a space disjoint from
/// [`NonterminalId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TerminalId(pub u32);

/// A dense, stable index into the nonterminal table. Disjoint from [`TerminalId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NonterminalId(pub u32);

/// A dense, stable index into the production table. Production rows are
/// sorted by head nonterminal (`spec.md` §3), so a nonterminal's productions
/// always form a contiguous range of `ProductionId`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ProductionId(pub u32);

/// A dense, stable index into the group table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct GroupId(pub u32);

/// An opaque identity used by the operator scope (`spec.md` §4.5) to tie a
/// terminal or a production's contextual precedence to a row in the
/// precedence table. Terminals and productions share one disjoint handle
/// space, per `spec.md` §9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PrecedenceToken(pub u32);

/// An LR automaton state index, assigned by the LALR compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LrStateId(pub u32);

/// A DFA state index, assigned by the DFA compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DfaStateId(pub u32);

macro_rules! display_as_index {
  ($($ty:ident),* $(,)?) => {
    $(
      impl Display for $ty {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
          write!(f, "{}", self.0)
        }
      }

      impl From<u32> for $ty {
        fn from(value: u32) -> Self {
          $ty(value)
        }
      }

      impl From<$ty> for u32 {
        fn from(value: $ty) -> Self {
          value.0
        }
      }

      impl $ty {
        /// Returns the handle's raw index, usable to address a row in the
        /// corresponding table.
        pub fn index(self) -> usize {
          self.0 as usize
        }
      }
    )*
  };
}

display_as_index!(
  TerminalId,
  NonterminalId,
  ProductionId,
  GroupId,
  PrecedenceToken,
  LrStateId,
  DfaStateId
);

/// A symbol referenced from a production body: either a terminal or a
/// nonterminal. `spec.md` §3 describes productions as sequences of
/// "symbol handles (terminals or nonterminals)"; this is that union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SymbolId {
  Terminal(TerminalId),
  Nonterminal(NonterminalId),
}

impl Display for SymbolId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SymbolId::Terminal(t) => write!(f, "t{}", t.0),
      SymbolId::Nonterminal(n) => write!(f, "n{}", n.0),
    }
  }
}
