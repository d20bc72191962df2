//! The augmented-grammar view and LR(0) item-set closure
//! (`spec.md` §4.4 steps 1–2), mirroring the reference toolchain's
//! worklist-driven `create_closure`/`get_production_start_items`.

use std::collections::{BTreeSet, VecDeque};

use farkle_core::builder::GrammarDefinition;
use farkle_core::types::{BodyElement, NonterminalId, ProductionId, SymbolId};

use crate::item::{production_start_items, Item};

/// `grammar` plus a synthetic `S' -> S` production (`spec.md` §4.4 step
/// 1). The synthetic production and its head nonterminal exist only in
/// this view; nothing is written back into `def`.
pub struct AugmentedGrammar<'a> {
  pub def: &'a GrammarDefinition,
  pub augmented_start: ProductionId,
  augmented_head: NonterminalId,
  synthetic_body: Vec<BodyElement>,
}

impl<'a> AugmentedGrammar<'a> {
  pub fn new(def: &'a GrammarDefinition) -> Self {
    let augmented_start = ProductionId(def.productions.len() as u32);
    let augmented_head = NonterminalId(def.nonterminals.len() as u32);
    let synthetic_body = vec![BodyElement { symbol: SymbolId::Nonterminal(def.start), significant: true }];
    AugmentedGrammar { def, augmented_start, augmented_head, synthetic_body }
  }

  pub fn body(&self, production: ProductionId) -> &[BodyElement] {
    if production == self.augmented_start {
      &self.synthetic_body
    } else {
      &self.def.production(production).body
    }
  }

  pub fn productions_of(&self, nonterminal: NonterminalId) -> Vec<ProductionId> {
    if nonterminal == self.augmented_head {
      vec![self.augmented_start]
    } else {
      self.def.nonterminal(nonterminal).productions.clone()
    }
  }
}

/// The closure of a set of LR(0) items (`spec.md` §4.4 step 2): for every
/// item with the dot before a nonterminal, add that nonterminal's start
/// items, worklist-driven like the reference toolchain's `create_closure`.
pub fn closure(items: impl IntoIterator<Item = Item>, grammar: &AugmentedGrammar) -> BTreeSet<Item> {
  let mut seen = BTreeSet::new();
  let mut queue: VecDeque<Item> = items.into_iter().collect();
  while let Some(item) = queue.pop_front() {
    if seen.insert(item) {
      if let Some(SymbolId::Nonterminal(n)) = item.symbol_at_dot(grammar) {
        for start in production_start_items(n, grammar) {
          queue.push_back(start);
        }
      }
    }
  }
  seen
}

#[cfg(test)]
mod tests {
  use super::*;
  use farkle_core::builder::{analyze, BuilderConfig, GrammarBuilder};
  use farkle_core::types::{CharRanges, RegexAst};

  fn single_production_grammar() -> GrammarDefinition {
    let mut builder: GrammarBuilder<i64> = GrammarBuilder::new(BuilderConfig::default());
    let digit = builder.terminal(
      "digit",
      RegexAst::Chars(CharRanges::from_ranges(vec![('0', '9')])),
      std::sync::Arc::new(|_pos, text: &str| Ok(text.parse::<i64>().unwrap_or(0))),
    );
    let start = builder.nonterminal("Start");
    let prod = builder.production(start).extend(SymbolId::Terminal(digit)).finish(&mut builder, |c, _| Ok(c[0]));
    builder.set_productions(start, vec![prod]);
    builder.set_start_nonterminal(start);
    let (def, _callbacks, diagnostics) = analyze(builder);
    assert!(!diagnostics.has_errors());
    def
  }

  #[test]
  fn closure_of_the_augmented_start_item_reaches_the_grammar_start() {
    let def = single_production_grammar();
    let augmented = AugmentedGrammar::new(&def);
    let closed = closure([Item::start(augmented.augmented_start)], &augmented);
    assert!(closed.iter().any(|item| item.production == def.nonterminal(def.start).productions[0]));
  }
}
