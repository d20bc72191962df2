//! Lookahead computation via spontaneous generation + propagation
//! (`spec.md` §4.4 step 3): the efficient alternative to building the full
//! canonical LR(1) item-set collection, grounded on the same FOLLOW-set
//! fixpoint idiom the reference toolchain's `follow.rs` uses, generalized
//! from productions to LR(0) items.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use farkle_core::types::{NonterminalId, SymbolId, TerminalId};

use crate::closure::AugmentedGrammar;
use crate::item::Item;
use crate::tables::Lr0Automaton;

/// A lookahead symbol: either a grammar terminal or end-of-input. End-of-
/// input is tracked here rather than as a real `TerminalId` because it is
/// never matched by the tokenizer (`spec.md` §4.4 "Output": "the
/// end-of-input action is stored separately").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lookahead {
  Terminal(TerminalId),
  EndOfInput,
}

struct FirstSets {
  first: HashMap<NonterminalId, BTreeSet<TerminalId>>,
  nullable: HashMap<NonterminalId, bool>,
}

impl FirstSets {
  fn compute(grammar: &AugmentedGrammar) -> Self {
    let mut first: HashMap<NonterminalId, BTreeSet<TerminalId>> =
      grammar.def.nonterminals.iter().map(|n| (n.id, BTreeSet::new())).collect();
    let mut nullable: HashMap<NonterminalId, bool> = grammar.def.nonterminals.iter().map(|n| (n.id, false)).collect();

    let mut changed = true;
    while changed {
      changed = false;
      for nt in &grammar.def.nonterminals {
        for &pid in &nt.productions {
          let mut seq_nullable = true;
          for elem in grammar.body(pid) {
            match elem.symbol {
              SymbolId::Terminal(t) => {
                if first.get_mut(&nt.id).unwrap().insert(t) {
                  changed = true;
                }
                seq_nullable = false;
                break;
              }
              SymbolId::Nonterminal(n) => {
                let n_first: Vec<TerminalId> = first[&n].iter().copied().collect();
                for t in n_first {
                  if first.get_mut(&nt.id).unwrap().insert(t) {
                    changed = true;
                  }
                }
                if !nullable[&n] {
                  seq_nullable = false;
                  break;
                }
              }
            }
          }
          if seq_nullable && !nullable[&nt.id] {
            nullable.insert(nt.id, true);
            changed = true;
          }
        }
      }
    }

    FirstSets { first, nullable }
  }

  /// FIRST of a symbol sequence, plus whether the whole sequence is
  /// nullable (all symbols nullable, or the sequence is empty).
  fn of_sequence(&self, symbols: &[SymbolId]) -> (BTreeSet<TerminalId>, bool) {
    let mut out = BTreeSet::new();
    for &sym in symbols {
      match sym {
        SymbolId::Terminal(t) => {
          out.insert(t);
          return (out, false);
        }
        SymbolId::Nonterminal(n) => {
          out.extend(self.first[&n].iter().copied());
          if !self.nullable[&n] {
            return (out, false);
          }
        }
      }
    }
    (out, true)
  }
}

/// Per-kernel-item lookahead sets, computed once and queryable per state
/// to recover the complete (item, lookahead-set) closure for any state.
pub struct LalrLookaheads {
  first_sets: FirstSets,
  per_kernel_item: HashMap<(usize, Item), BTreeSet<Lookahead>>,
}

impl LalrLookaheads {
  /// Runs the spontaneous-generation-plus-propagation algorithm
  /// (`spec.md` §4.4 step 3). `start_item` (in `start_state`) is seeded
  /// with end-of-input; every other kernel item starts empty and is
  /// filled in by spontaneous generation and propagation to a fixpoint.
  pub fn compute(automaton: &Lr0Automaton, grammar: &AugmentedGrammar, start_state: usize, start_item: Item) -> Self {
    let first_sets = FirstSets::compute(grammar);
    let mut per_kernel_item: HashMap<(usize, Item), BTreeSet<Lookahead>> = HashMap::new();
    per_kernel_item.entry((start_state, start_item)).or_default().insert(Lookahead::EndOfInput);

    let mut propagations: Vec<((usize, Item), (usize, Item))> = Vec::new();

    for (state, kernel) in automaton.kernels.iter().enumerate() {
      for &item in kernel {
        let seeded = closure_with_spread(&[(item, None)], grammar, &first_sets);
        for (closed_item, spread) in seeded {
          let Some(symbol) = closed_item.symbol_at_dot(grammar) else { continue };
          let Some(&target_state) = automaton.goto[state].get(&symbol) else { continue };
          let target_item = closed_item.advance();
          match spread {
            None => propagations.push(((state, item), (target_state, target_item))),
            Some(la) => {
              per_kernel_item.entry((target_state, target_item)).or_default().insert(la);
            }
          }
        }
      }
    }

    let mut worklist: VecDeque<(usize, Item)> = per_kernel_item.keys().copied().collect();
    while let Some(key) = worklist.pop_front() {
      let current = per_kernel_item.get(&key).cloned().unwrap_or_default();
      for (src, dst) in &propagations {
        if *src == key {
          let entry = per_kernel_item.entry(*dst).or_default();
          let before = entry.len();
          entry.extend(current.iter().copied());
          if entry.len() != before {
            worklist.push_back(*dst);
          }
        }
      }
    }

    LalrLookaheads { first_sets, per_kernel_item }
  }

  /// The complete (item, lookahead-set) map for `state`, including items
  /// only reachable via closure (e.g. an empty production opened while
  /// expanding a nonterminal) — recovered by re-closing the state's
  /// kernel items under their final, propagated lookaheads
  /// (`spec.md` §4.4 step 3).
  pub fn close_state(
    &self,
    state: usize,
    kernel: &BTreeSet<Item>,
    grammar: &AugmentedGrammar,
  ) -> BTreeMap<Item, BTreeSet<Lookahead>> {
    let seed: Vec<(Item, Option<Lookahead>)> = kernel
      .iter()
      .flat_map(|&item| {
        self
          .per_kernel_item
          .get(&(state, item))
          .cloned()
          .unwrap_or_default()
          .into_iter()
          .map(move |la| (item, Some(la)))
      })
      .collect();
    let closed = closure_with_spread(&seed, grammar, &self.first_sets);
    let mut out: BTreeMap<Item, BTreeSet<Lookahead>> = BTreeMap::new();
    for (item, spread) in closed {
      if let Some(la) = spread {
        out.entry(item).or_default().insert(la);
      }
    }
    out
  }
}

/// An LR(1)-style closure that carries a lookahead "spread" value through
/// FIRST-set computation: `None` is the dummy marker `#` used to detect
/// propagation links (Dragon book Algorithm 4.63); `Some(_)` is a
/// concrete, spontaneously generated lookahead.
fn closure_with_spread(
  seed: &[(Item, Option<Lookahead>)],
  grammar: &AugmentedGrammar,
  first_sets: &FirstSets,
) -> Vec<(Item, Option<Lookahead>)> {
  let mut seen: BTreeSet<(Item, Option<Lookahead>)> = BTreeSet::new();
  let mut queue: VecDeque<(Item, Option<Lookahead>)> = seed.to_vec().into();
  while let Some((item, spread)) = queue.pop_front() {
    if !seen.insert((item, spread)) {
      continue;
    }
    if let Some(SymbolId::Nonterminal(n)) = item.symbol_at_dot(grammar) {
      let beta: Vec<SymbolId> = grammar.body(item.production)[item.dot + 1..].iter().map(|e| e.symbol).collect();
      let (first_beta, beta_nullable) = first_sets.of_sequence(&beta);
      let mut spreads: Vec<Option<Lookahead>> = first_beta.into_iter().map(|t| Some(Lookahead::Terminal(t))).collect();
      if beta_nullable {
        spreads.push(spread);
      }
      for p in grammar.productions_of(n) {
        for &s in &spreads {
          queue.push_back((Item::start(p), s));
        }
      }
    }
  }
  seen.into_iter().collect()
}
