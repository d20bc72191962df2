//! LR(0) items over the augmented grammar (`spec.md` §4.4 steps 1–2).

use farkle_core::types::{NonterminalId, ProductionId, SymbolId};

use crate::closure::AugmentedGrammar;

/// An LR(0) item: a production and a dot position in its body. Mirrors
/// the reference toolchain's `Item` (production handle + dot), minus the
/// extra lexer-state field that toolchain carries for scanner productions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Item {
  pub production: ProductionId,
  pub dot: usize,
}

impl Item {
  pub fn start(production: ProductionId) -> Self {
    Item { production, dot: 0 }
  }

  pub fn symbol_at_dot(&self, grammar: &AugmentedGrammar) -> Option<SymbolId> {
    grammar.body(self.production).get(self.dot).map(|e| e.symbol)
  }

  pub fn is_complete(&self, grammar: &AugmentedGrammar) -> bool {
    self.dot >= grammar.body(self.production).len()
  }

  pub fn advance(&self) -> Item {
    Item { production: self.production, dot: self.dot + 1 }
  }
}

/// The initial (dot-at-zero) items of every production belonging to
/// `nonterminal`, mirroring the reference toolchain's
/// `get_production_start_items`.
pub fn production_start_items(nonterminal: NonterminalId, grammar: &AugmentedGrammar) -> Vec<Item> {
  grammar.productions_of(nonterminal).into_iter().map(Item::start).collect()
}
