//! LR(0) automaton construction and LALR(1) action/goto table assembly
//! (`spec.md` §4.4), grounded on the reference toolchain's
//! `intermediate/algorithm/recursive_ascent.rs` state-construction loop.

use std::collections::{BTreeMap, BTreeSet};

use farkle_core::builder::GrammarDefinition;
use farkle_core::types::{CompiledLr, FarkleError, LrStateId, LrStateRow, SymbolId};

use crate::closure::{closure, AugmentedGrammar};
use crate::conflict;
use crate::item::Item;
use crate::lookahead::{Lookahead, LalrLookaheads};

/// The canonical LR(0) collection: one kernel item-set, its closure, and
/// its goto edges per state, indexed by state number.
pub struct Lr0Automaton {
  pub kernels: Vec<BTreeSet<Item>>,
  pub closures: Vec<BTreeSet<Item>>,
  pub goto: Vec<BTreeMap<SymbolId, usize>>,
}

/// Builds the canonical LR(0) item-set collection (`spec.md` §4.4 step 2):
/// a worklist over kernel item-sets, each transitioned by every symbol
/// that appears after a dot in its closure.
pub(crate) fn build_automaton(grammar: &AugmentedGrammar, start_item: Item) -> Lr0Automaton {
  let start_kernel: BTreeSet<Item> = [start_item].into_iter().collect();
  let mut index_of: BTreeMap<BTreeSet<Item>, usize> = BTreeMap::new();
  let mut kernels = Vec::new();
  let mut closures = Vec::new();
  let mut goto: Vec<BTreeMap<SymbolId, usize>> = Vec::new();

  index_of.insert(start_kernel.clone(), 0);
  kernels.push(start_kernel);
  closures.push(BTreeSet::new());
  goto.push(BTreeMap::new());

  let mut worklist = vec![0usize];
  while let Some(state) = worklist.pop() {
    let closed = closure(kernels[state].iter().copied(), grammar);

    let mut by_symbol: BTreeMap<SymbolId, BTreeSet<Item>> = BTreeMap::new();
    for &item in &closed {
      if let Some(symbol) = item.symbol_at_dot(grammar) {
        by_symbol.entry(symbol).or_default().insert(item.advance());
      }
    }

    for (symbol, target_kernel) in by_symbol {
      let target = if let Some(&existing) = index_of.get(&target_kernel) {
        existing
      } else {
        let new_state = kernels.len();
        index_of.insert(target_kernel.clone(), new_state);
        kernels.push(target_kernel);
        closures.push(BTreeSet::new());
        goto.push(BTreeMap::new());
        worklist.push(new_state);
        new_state
      };
      goto[state].insert(symbol, target);
    }

    closures[state] = closed;
  }

  Lr0Automaton { kernels, closures, goto }
}

/// Builds the full LALR(1) action/goto table for `grammar`
/// (`spec.md` §4.4): the canonical LR(0) automaton, lookaheads by
/// spontaneous generation + propagation, then per-state conflict
/// resolution.
pub fn build(grammar: &GrammarDefinition) -> (CompiledLr, Vec<FarkleError>) {
  let augmented = AugmentedGrammar::new(grammar);
  let start_item = Item::start(augmented.augmented_start);
  let automaton = build_automaton(&augmented, start_item);
  let lookaheads = LalrLookaheads::compute(&automaton, &augmented, 0, start_item);

  let mut diagnostics = Vec::new();
  let mut rows = Vec::with_capacity(automaton.kernels.len());

  for (state, kernel) in automaton.kernels.iter().enumerate() {
    let item_lookaheads = lookaheads.close_state(state, kernel, &augmented);

    let mut reduce_by_terminal: BTreeMap<farkle_core::types::TerminalId, Vec<farkle_core::types::ProductionId>> =
      BTreeMap::new();
    let mut reduce_at_eof: Vec<farkle_core::types::ProductionId> = Vec::new();
    let mut accept = false;

    for (&item, las) in &item_lookaheads {
      if !item.is_complete(&augmented) {
        continue;
      }
      if item.production == augmented.augmented_start {
        if las.contains(&Lookahead::EndOfInput) {
          accept = true;
        }
        continue;
      }
      for &la in las {
        match la {
          Lookahead::Terminal(t) => reduce_by_terminal.entry(t).or_default().push(item.production),
          Lookahead::EndOfInput => reduce_at_eof.push(item.production),
        }
      }
    }

    let mut shift_terminals: BTreeMap<farkle_core::types::TerminalId, LrStateId> = BTreeMap::new();
    let mut gotos: BTreeMap<farkle_core::types::NonterminalId, LrStateId> = BTreeMap::new();
    for (&symbol, &target) in &automaton.goto[state] {
      match symbol {
        SymbolId::Terminal(t) => {
          shift_terminals.insert(t, LrStateId(target as u32));
        }
        SymbolId::Nonterminal(n) => {
          gotos.insert(n, LrStateId(target as u32));
        }
      }
    }

    let mut actions = BTreeMap::new();
    let mut terminals: BTreeSet<farkle_core::types::TerminalId> = BTreeSet::new();
    terminals.extend(shift_terminals.keys().copied());
    terminals.extend(reduce_by_terminal.keys().copied());
    for terminal in terminals {
      let shift = shift_terminals.get(&terminal).copied();
      let reduce = conflict::resolve_reduce_reduce(
        grammar,
        state as u32,
        &format!("terminal {terminal}"),
        reduce_by_terminal.remove(&terminal).unwrap_or_default(),
        &mut diagnostics,
      );
      if let Some(action) =
        conflict::resolve_shift_reduce(grammar, state as u32, terminal, shift, reduce, &mut diagnostics)
      {
        actions.insert(terminal, action);
      }
    }

    let eof_reduce = conflict::resolve_reduce_reduce(grammar, state as u32, "end-of-input", reduce_at_eof, &mut diagnostics);
    let eof_action = if accept || eof_reduce.is_some() {
      Some(conflict::resolve_accept_reduce(state as u32, accept, eof_reduce, &mut diagnostics))
    } else {
      None
    };

    rows.push(LrStateRow { actions, gotos, eof_action });
  }

  (CompiledLr { start_state: LrStateId(0), states: rows }, diagnostics)
}

#[cfg(test)]
mod tests {
  use super::*;
  use farkle_core::builder::{analyze, BuilderConfig, GrammarBuilder};
  use farkle_core::types::{Associativity, CharRanges, LrAction, RegexAst};

  // Expr -> Expr '+' num | num
  fn sum_grammar() -> GrammarDefinition {
    let mut builder: GrammarBuilder<i64> = GrammarBuilder::new(BuilderConfig::default());
    let num = builder.terminal(
      "num",
      RegexAst::Chars(CharRanges::from_ranges(vec![('0', '9')])),
      std::sync::Arc::new(|_pos, text: &str| Ok(text.parse::<i64>().unwrap_or(0))),
    );
    let plus = builder.literal("+");
    let expr = builder.nonterminal("Expr");
    let add = builder
      .production(expr)
      .extend(SymbolId::Nonterminal(expr))
      .append(SymbolId::Terminal(plus))
      .extend(SymbolId::Terminal(num))
      .finish(&mut builder, |c, _| Ok(c[0] + c[1]));
    let atom = builder.production(expr).extend(SymbolId::Terminal(num)).finish(&mut builder, |c, _| Ok(c[0]));
    builder.set_productions(expr, vec![add, atom]);
    builder.set_start_nonterminal(expr);
    let (def, _callbacks, diagnostics) = analyze(builder);
    assert!(!diagnostics.has_errors());
    def
  }

  #[test]
  fn builds_a_shift_reduce_table_for_a_left_recursive_sum() {
    let def = sum_grammar();
    let (table, diagnostics) = build(&def);
    assert!(diagnostics.is_empty());
    assert!(table.states.len() >= 3);

    let start_row = table.row(table.start_state);
    let num = def.terminals.iter().find(|t| t.name == "num").unwrap().id;
    assert!(matches!(start_row.actions.get(&num), Some(LrAction::Shift(_))));
  }

  #[test]
  fn non_assoc_operator_rejects_chained_use() {
    let mut builder: GrammarBuilder<i64> = GrammarBuilder::new(BuilderConfig::default());
    let num = builder.terminal(
      "num",
      RegexAst::Chars(CharRanges::from_ranges(vec![('0', '9')])),
      std::sync::Arc::new(|_pos, text: &str| Ok(text.parse::<i64>().unwrap_or(0))),
    );
    let eq = builder.literal("==");
    builder.precedence_group(Associativity::NonAssoc, &["=="]);
    let expr = builder.nonterminal("Expr");
    let cmp = builder
      .production(expr)
      .extend(SymbolId::Nonterminal(expr))
      .append(SymbolId::Terminal(eq))
      .extend(SymbolId::Nonterminal(expr))
      .finish(&mut builder, |c, _| Ok((c[0] == c[1]) as i64));
    let atom = builder.production(expr).extend(SymbolId::Terminal(num)).finish(&mut builder, |c, _| Ok(c[0]));
    builder.set_productions(expr, vec![cmp, atom]);
    builder.set_start_nonterminal(expr);
    let (def, _callbacks, diagnostics) = analyze(builder);
    assert!(!diagnostics.has_errors());

    let (table, _diags) = build(&def);
    let has_error_action = table.states.iter().any(|row| row.actions.values().any(|a| matches!(a, LrAction::Error)));
    assert!(has_error_action);
  }
}
