//! Shift/reduce, reduce/reduce, and accept/reduce conflict resolution
//! (`spec.md` §4.4 step 4), grounded on the reference toolchain's
//! contextual-precedence handling in `types/production.rs`.

use farkle_core::builder::GrammarDefinition;
use farkle_core::types::{
  Associativity, FarkleError, LalrConflictKind, LrAction, LrStateId, PrecedenceInfo, ProductionId, TerminalId,
};

fn terminal_precedence(grammar: &GrammarDefinition, terminal: TerminalId) -> Option<PrecedenceInfo> {
  let token = grammar.terminal(terminal).precedence_token?;
  grammar.operator_scope.lookup(token)
}

fn production_precedence(grammar: &GrammarDefinition, production: ProductionId) -> Option<PrecedenceInfo> {
  let p = grammar.production(production);
  let token = p.precedence_token.or_else(|| p.rightmost_terminal().and_then(|t| grammar.terminal(t).precedence_token))?;
  grammar.operator_scope.lookup(token)
}

/// Resolves a shift-vs-reduce choice for one terminal in one state
/// (`spec.md` §4.4 step 4). `None` inputs mean "no candidate of that
/// kind"; returns `None` only when neither a shift nor a reduce applies.
pub fn resolve_shift_reduce(
  grammar: &GrammarDefinition,
  state: u32,
  terminal: TerminalId,
  shift: Option<LrStateId>,
  reduce: Option<ProductionId>,
  diagnostics: &mut Vec<FarkleError>,
) -> Option<LrAction> {
  match (shift, reduce) {
    (None, None) => None,
    (Some(target), None) => Some(LrAction::Shift(target)),
    (None, Some(production)) => Some(LrAction::Reduce(production)),
    (Some(target), Some(production)) => {
      let shift_prec = terminal_precedence(grammar, terminal);
      let reduce_prec = production_precedence(grammar, production);
      match (shift_prec, reduce_prec) {
        (Some(s), Some(r)) if s.level != r.level => {
          Some(if s.level > r.level { LrAction::Shift(target) } else { LrAction::Reduce(production) })
        }
        (Some(s), Some(r)) => match s.associativity {
          Associativity::Left => Some(LrAction::Reduce(production)),
          Associativity::Right => Some(LrAction::Shift(target)),
          Associativity::NonAssoc => {
            let _ = r;
            Some(LrAction::Error)
          }
        },
        _ => {
          diagnostics.push(FarkleError::LalrConflict {
            kind: LalrConflictKind::ShiftReduce,
            state,
            detail: format!("terminal {terminal} has no comparable precedence; defaulting to shift"),
          });
          Some(LrAction::Shift(target))
        }
      }
    }
  }
}

/// Resolves a reduce/reduce conflict among the complete items that all
/// want to reduce on the same lookahead (`spec.md` §4.4 step 4).
pub fn resolve_reduce_reduce(
  grammar: &GrammarDefinition,
  state: u32,
  terminal_desc: &str,
  mut candidates: Vec<ProductionId>,
  diagnostics: &mut Vec<FarkleError>,
) -> Option<ProductionId> {
  candidates.sort();
  candidates.dedup();
  match candidates.len() {
    0 => None,
    1 => Some(candidates[0]),
    _ => {
      if grammar.operator_scope.resolve_reduce_reduce {
        let precedences: Option<Vec<PrecedenceInfo>> =
          candidates.iter().map(|&p| production_precedence(grammar, p)).collect();
        if let Some(precedences) = precedences {
          let best = precedences
            .iter()
            .enumerate()
            .max_by_key(|(_, info)| info.level)
            .map(|(i, _)| candidates[i])
            .expect("candidates is non-empty");
          return Some(best);
        }
      }
      diagnostics.push(FarkleError::LalrConflict {
        kind: LalrConflictKind::ReduceReduce,
        state,
        detail: format!("{} productions reduce on {terminal_desc}; defaulting to the earliest declared", candidates.len()),
      });
      candidates.into_iter().min()
    }
  }
}

/// Resolves an accept-vs-reduce choice on end-of-input. Accept always
/// wins when both apply — `spec.md` §4.4 step 4: "accept/reduce
/// conflicts are always flagged as errors", with accept taken as the
/// surviving action.
pub fn resolve_accept_reduce(
  state: u32,
  accept: bool,
  reduce: Option<ProductionId>,
  diagnostics: &mut Vec<FarkleError>,
) -> farkle_core::types::EofAction {
  use farkle_core::types::EofAction;
  match (accept, reduce) {
    (true, None) => EofAction::Accept,
    (false, Some(production)) => EofAction::Reduce(production),
    (true, Some(production)) => {
      diagnostics.push(FarkleError::LalrConflict {
        kind: LalrConflictKind::AcceptReduce,
        state,
        detail: format!("production {production} also reduces at end-of-input; defaulting to accept"),
      });
      EofAction::Accept
    }
    (false, None) => unreachable!("caller only invokes resolve_accept_reduce when accept or reduce applies"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use farkle_core::builder::{analyze, BuilderConfig, GrammarBuilder};
  use farkle_core::types::{CharRanges, RegexAst, SymbolId};

  fn grammar_with_precedence_groups() -> (GrammarDefinition, TerminalId, TerminalId, ProductionId, ProductionId) {
    let mut builder: GrammarBuilder<i64> = GrammarBuilder::new(BuilderConfig::default());
    let num = builder.terminal(
      "num",
      RegexAst::Chars(CharRanges::from_ranges(vec![('0', '9')])),
      std::sync::Arc::new(|_pos, text: &str| Ok(text.parse::<i64>().unwrap_or(0))),
    );
    let plus = builder.literal("+");
    let star = builder.literal("*");
    builder.precedence_group(Associativity::Left, &["+"]);
    builder.precedence_group(Associativity::Left, &["*"]);

    let expr = builder.nonterminal("Expr");
    let add = builder
      .production(expr)
      .extend(SymbolId::Nonterminal(expr))
      .append(SymbolId::Terminal(plus))
      .extend(SymbolId::Nonterminal(expr))
      .finish(&mut builder, |c, _| Ok(c[0] + c[1]));
    let mul = builder
      .production(expr)
      .extend(SymbolId::Nonterminal(expr))
      .append(SymbolId::Terminal(star))
      .extend(SymbolId::Nonterminal(expr))
      .finish(&mut builder, |c, _| Ok(c[0] * c[1]));
    let atom = builder.production(expr).extend(SymbolId::Terminal(num)).finish(&mut builder, |c, _| Ok(c[0]));
    builder.set_productions(expr, vec![add, mul, atom]);
    builder.set_start_nonterminal(expr);
    let (def, _callbacks, diagnostics) = analyze(builder);
    assert!(!diagnostics.has_errors());
    (def, plus, star, add, mul)
  }

  #[test]
  fn higher_precedence_terminal_wins_the_shift() {
    let (def, _plus, star, add, _mul) = grammar_with_precedence_groups();
    let mut diags = Vec::new();
    let action = resolve_shift_reduce(&def, 0, star, Some(LrStateId(1)), Some(add), &mut diags);
    assert_eq!(action, Some(LrAction::Shift(LrStateId(1))));
    assert!(diags.is_empty());
  }

  #[test]
  fn left_associative_tie_reduces() {
    let (def, plus, _star, add, _mul) = grammar_with_precedence_groups();
    let mut diags = Vec::new();
    let action = resolve_shift_reduce(&def, 0, plus, Some(LrStateId(1)), Some(add), &mut diags);
    assert_eq!(action, Some(LrAction::Reduce(add)));
    assert!(diags.is_empty());
  }

  #[test]
  fn unresolvable_shift_reduce_defaults_to_shift_with_a_diagnostic() {
    let mut builder: GrammarBuilder<i64> = GrammarBuilder::new(BuilderConfig::default());
    let num = builder.terminal(
      "num",
      RegexAst::Chars(CharRanges::from_ranges(vec![('0', '9')])),
      std::sync::Arc::new(|_pos, text: &str| Ok(text.parse::<i64>().unwrap_or(0))),
    );
    let expr = builder.nonterminal("Expr");
    let atom = builder.production(expr).extend(SymbolId::Terminal(num)).finish(&mut builder, |c, _| Ok(c[0]));
    builder.set_productions(expr, vec![atom]);
    builder.set_start_nonterminal(expr);
    let (def, _callbacks, diagnostics) = analyze(builder);
    assert!(!diagnostics.has_errors());

    let mut diags = Vec::new();
    let action = resolve_shift_reduce(&def, 3, num, Some(LrStateId(2)), Some(atom), &mut diags);
    assert_eq!(action, Some(LrAction::Shift(LrStateId(2))));
    assert_eq!(diags.len(), 1);
    assert!(matches!(diags[0], FarkleError::LalrConflict { kind: LalrConflictKind::ShiftReduce, .. }));
  }

  #[test]
  fn reduce_reduce_defaults_to_the_earliest_declared_production() {
    let (def, _plus, _star, add, mul) = grammar_with_precedence_groups();
    let mut diags = Vec::new();
    let chosen = resolve_reduce_reduce(&def, 5, "num", vec![mul, add], &mut diags);
    assert_eq!(chosen, Some(add));
    assert_eq!(diags.len(), 1);
    assert!(matches!(diags[0], FarkleError::LalrConflict { kind: LalrConflictKind::ReduceReduce, .. }));
  }

  #[test]
  fn accept_reduce_always_defaults_to_accept() {
    let mut diags = Vec::new();
    let action = resolve_accept_reduce(7, true, Some(ProductionId(0)), &mut diags);
    assert_eq!(action, farkle_core::types::EofAction::Accept);
    assert_eq!(diags.len(), 1);
    assert!(matches!(diags[0], FarkleError::LalrConflict { kind: LalrConflictKind::AcceptReduce, .. }));
  }
}
