use std::collections::{BTreeSet, HashSet, VecDeque};

use crate::types::{
  Diagnostics, EntityRef, FarkleError, NonterminalId, Production, ProductionId, ProductionSetState,
  SemanticCallbacks, SymbolId, TerminalId,
};

use super::{grammar_builder::GrammarBuilder, grammar_db::GrammarDefinition};

/// Runs the builder's analysis pass (`spec.md` §4.1) and freezes the
/// symbol graph into a [`GrammarDefinition`]. Consumes the builder: per
/// `spec.md` §3 Lifecycle, "symbol-graph objects exist only inside the
/// builder; they are frozen exactly once when analysis begins".
pub fn analyze<V: Clone + 'static>(
  mut builder: GrammarBuilder<V>,
) -> (GrammarDefinition, SemanticCallbacks<V>, Diagnostics) {
  // Step 3: a grammar consisting of a single terminal and no nonterminals
  // gets a synthesized one-production start wrapping that terminal.
  if builder.graph.nonterminals().is_empty() && builder.graph.terminals().len() == 1 {
    synthesize_single_terminal_wrapper(&mut builder);
  }

  let start = match builder.start {
    Some(s) => s,
    None => builder.graph.nonterminals().first().map(|n| n.id).unwrap_or(NonterminalId(0)),
  };

  // Renumber productions so each nonterminal's productions form a
  // contiguous range ordered by head (`spec.md` §3), which is what lets
  // the artifact codec store a nonterminal's production list as a single
  // (start, count) pair instead of an explicit index list.
  canonicalize_production_order(&mut builder.graph);

  // Step 5a: EMPTY_NONTERMINAL / duplicate-production-within-nonterminal checks.
  for nt in builder.graph.nonterminals() {
    if nt.state != ProductionSetState::Set || nt.productions.is_empty() {
      builder.context.diagnostics.push(FarkleError::EmptyNonterminal { nonterminal: nt.id, name: nt.name.clone() });
      continue;
    }
    let mut seen_bodies: HashSet<Vec<SymbolId>> = HashSet::new();
    for &pid in &nt.productions {
      let body: Vec<SymbolId> = builder.graph.production(pid).symbols().collect();
      if !seen_bodies.insert(body) {
        builder
          .context
          .diagnostics
          .push(FarkleError::DuplicateProduction { nonterminal: nt.id, production: pid });
      }
    }
  }

  // Step 5b: nullable-terminal check (structural heuristic; the DFA
  // compiler performs the authoritative NFA-based check).
  for t in builder.graph.terminals() {
    if let Some(regex) = &t.regex {
      if regex.is_structurally_nullable() {
        builder
          .context
          .diagnostics
          .push(FarkleError::NullableTerminal { terminal: t.id, name: t.name.clone() });
      }
    }
  }

  // Step 1: breadth-first reachability walk from `start`, checking
  // cancellation between nonterminal expansions (`spec.md` §5).
  let walk = walk_reachable(&builder, start);
  let (reachable_nonterminals, reachable_terminals) = (walk.nonterminals, walk.terminals);

  // Step 5c: unreachable-symbol warnings. Skipped entirely when the walk
  // was cancelled partway through — the reachable sets it produced are
  // incomplete, so every remaining symbol would be misreported as
  // unreachable.
  if walk.cancelled {
    builder.context.diagnostics.push(FarkleError::Cancelled);
  } else {
    let reachable_nt_set: HashSet<NonterminalId> = reachable_nonterminals.iter().copied().collect();
    for nt in builder.graph.nonterminals() {
      if !reachable_nt_set.contains(&nt.id) {
        builder.context.diagnostics.push(FarkleError::Warning {
          code: "FARKLE0016",
          message: format!("nonterminal `{}` is unreachable from the start symbol", nt.display_name()),
          entity: Some(EntityRef::Nonterminal(nt.id)),
        });
      }
    }
    let reachable_t_set: HashSet<TerminalId> = reachable_terminals.iter().copied().collect();
    for t in builder.graph.terminals() {
      if !reachable_t_set.contains(&t.id) && !t.is_virtual() {
        builder.context.diagnostics.push(FarkleError::Warning {
          code: "FARKLE0016",
          message: format!("terminal `{}` is unreachable from the start symbol", t.display_name()),
          entity: Some(EntityRef::Terminal(t.id)),
        });
      }
    }
  }

  let def = GrammarDefinition {
    terminals: builder.graph.terminals().to_vec(),
    nonterminals: builder.graph.nonterminals().to_vec(),
    productions: builder.graph.productions().to_vec(),
    groups: builder.graph.groups().to_vec(),
    operator_scope: builder.operator_scope.clone(),
    start,
    grammar_name: builder.grammar_name.clone(),
    case_sensitive: builder.context.config.case_sensitive,
    auto_whitespace: builder.context.config.auto_whitespace,
    reachable_terminals,
    reachable_nonterminals,
  };

  (def, builder.callbacks, builder.context.diagnostics)
}

fn canonicalize_production_order(graph: &mut super::symbol_graph::SymbolGraph) {
  let mut new_order: Vec<ProductionId> = Vec::with_capacity(graph.productions.len());
  for nt in &graph.nonterminals {
    new_order.extend(nt.productions.iter().copied());
  }
  let referenced: HashSet<ProductionId> = new_order.iter().copied().collect();
  for (i, p) in graph.productions.iter().enumerate() {
    if !referenced.contains(&ProductionId(i as u32)) {
      new_order.push(ProductionId(i as u32));
    }
  }

  let mut old_to_new = vec![ProductionId(0); graph.productions.len()];
  for (new_id, &old_id) in new_order.iter().enumerate() {
    old_to_new[old_id.index()] = ProductionId(new_id as u32);
  }

  let mut reordered: Vec<Production> = new_order
    .iter()
    .enumerate()
    .map(|(new_id, &old_id)| {
      let mut p = graph.productions[old_id.index()].clone();
      p.id = ProductionId(new_id as u32);
      p
    })
    .collect();
  std::mem::swap(&mut graph.productions, &mut reordered);

  for nt in &mut graph.nonterminals {
    for pid in &mut nt.productions {
      *pid = old_to_new[pid.index()];
    }
  }
}

fn synthesize_single_terminal_wrapper<V: Clone + 'static>(builder: &mut GrammarBuilder<V>) {
  let only_terminal = TerminalId(0);
  let start_nt = builder.nonterminal("Start");
  let prod = builder
    .production(start_nt)
    .extend(SymbolId::Terminal(only_terminal))
    .finish(builder, |children: &[V], _pid: ProductionId| Ok(children[0].clone()));
  builder.set_productions(start_nt, vec![prod]);
  builder.start = Some(start_nt);
}

/// The result of [`walk_reachable`]: the reachable symbol sets, and whether
/// the walk ran to completion or was cut short by cancellation.
struct ReachabilityWalk {
  nonterminals: Vec<NonterminalId>,
  terminals: Vec<TerminalId>,
  cancelled: bool,
}

fn walk_reachable<V>(builder: &GrammarBuilder<V>, start: NonterminalId) -> ReachabilityWalk {
  let mut seen_nt = BTreeSet::new();
  let mut seen_t = BTreeSet::new();
  let mut queue = VecDeque::new();
  queue.push_back(start);
  seen_nt.insert(start);

  let mut cancelled = false;
  while let Some(nt_id) = queue.pop_front() {
    if builder.context.cancellation.is_cancelled() {
      cancelled = true;
      break;
    }
    let nt = builder.graph.nonterminal(nt_id);
    for &pid in &nt.productions {
      let production: &Production = builder.graph.production(pid);
      for element in &production.body {
        match element.symbol {
          SymbolId::Terminal(t) => {
            seen_t.insert(t);
          }
          SymbolId::Nonterminal(n) => {
            if seen_nt.insert(n) {
              queue.push_back(n);
            }
          }
        }
      }
    }
  }

  ReachabilityWalk { nonterminals: seen_nt.into_iter().collect(), terminals: seen_t.into_iter().collect(), cancelled }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;

  use super::*;
  use crate::builder::{BuilderConfig, CancellationToken, GrammarBuilder};
  use crate::types::{CharRanges, RegexAst};

  /// `Start -> Mid`, `Mid -> Leaf`, `Leaf -> digit`: a chain deep enough
  /// that cancelling after the first nonterminal is dequeued still leaves
  /// `Leaf` (and its terminal) undiscovered.
  fn chain_grammar() -> GrammarBuilder<()> {
    let mut builder: GrammarBuilder<()> = GrammarBuilder::new(BuilderConfig::default());
    let digit = builder.terminal(
      "digit",
      RegexAst::Chars(CharRanges::from_ranges(vec![('0', '9')])),
      Arc::new(|_pos, _text: &str| Ok(())),
    );
    let leaf = builder.nonterminal("Leaf");
    let leaf_prod = builder.production(leaf).extend(SymbolId::Terminal(digit)).finish(&mut builder, |_, _| Ok(()));
    builder.set_productions(leaf, vec![leaf_prod]);

    let mid = builder.nonterminal("Mid");
    let mid_prod = builder.production(mid).extend(SymbolId::Nonterminal(leaf)).finish(&mut builder, |_, _| Ok(()));
    builder.set_productions(mid, vec![mid_prod]);

    let start = builder.nonterminal("Start");
    let start_prod = builder.production(start).extend(SymbolId::Nonterminal(mid)).finish(&mut builder, |_, _| Ok(()));
    builder.set_productions(start, vec![start_prod]);
    builder.set_start_nonterminal(start);
    builder
  }

  #[test]
  fn cancellation_cuts_the_reachability_walk_short_and_records_a_diagnostic() {
    let mut builder = chain_grammar();
    // Lets the first dequeue (`Start`) through, then cancels before `Mid`
    // is expanded — `Leaf` must never be discovered.
    let calls = AtomicU32::new(0);
    builder.context.cancellation = CancellationToken::new(move || calls.fetch_add(1, Ordering::SeqCst) >= 1);

    let (def, _callbacks, diagnostics) = analyze(builder);

    assert!(diagnostics.errors().any(|e| matches!(e, FarkleError::Cancelled)));
    assert!(def.reachable_nonterminals.iter().any(|n| def.nonterminal(*n).display_name() == "Start"));
    assert!(!def.reachable_nonterminals.iter().any(|n| def.nonterminal(*n).display_name() == "Leaf"));
    assert!(def.reachable_terminals.is_empty());
    // The walk never reached `Leaf`, so it must not be misreported as an
    // unreachable-symbol warning.
    assert!(!diagnostics.all().iter().any(|e| matches!(e, FarkleError::Warning { .. })));
  }

  #[test]
  fn an_uncancelled_walk_reaches_every_nonterminal() {
    let builder = chain_grammar();
    let (def, _callbacks, diagnostics) = analyze(builder);
    assert!(!diagnostics.errors().any(|e| matches!(e, FarkleError::Cancelled)));
    assert_eq!(def.reachable_nonterminals.len(), 3);
    assert_eq!(def.reachable_terminals.len(), 1);
  }
}
