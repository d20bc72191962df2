//! The LR shift/reduce loop and semantic dispatch (`spec.md` §4.8),
//! grounded on the shift/reduce/goto bookkeeping implied by
//! `sherpa-rust-rt/types/parse_context.rs` plus the reference toolchain's
//! goto-after-reduce step (`compile/build_graph/flow/goto.rs`), reshaped
//! from bytecode interpretation into direct table interpretation.

use std::collections::BTreeSet;

use farkle_core::builder::GrammarDefinition;
use farkle_core::types::{
  CompiledDfa, CompiledLr, EofAction, FarkleError, LrAction, LrStateId, Position, ProductionId, SemanticCallbacks,
  TerminalId, UserError,
};

use crate::action::ParseAction;
use crate::hook::TokenizerHook;
use crate::tokenizer::{Token, Tokenizer};

enum NextSymbol<'a, V> {
  Real(Token<'a>),
  Virtual(TerminalId, Position, V),
}

impl<'a, V> NextSymbol<'a, V> {
  fn terminal(&self) -> TerminalId {
    match self {
      NextSymbol::Real(t) => t.terminal,
      NextSymbol::Virtual(t, ..) => *t,
    }
  }

  fn position(&self) -> Position {
    match self {
      NextSymbol::Real(t) => t.position,
      NextSymbol::Virtual(_, p, _) => *p,
    }
  }
}

/// A value pushed onto the parse stack: either an already-computed value
/// (the result of a reduce, or a hook-supplied virtual terminal) or an
/// unevaluated shifted token. Transforms run lazily, at the point a token
/// is actually read as a significant reduce child (`spec.md` §4.8) —
/// terminals only ever `append`-ed (punctuation, literals with no
/// registered transform) are popped and discarded without ever needing one.
enum StackValue<'a, V> {
  Computed(V),
  Token(Token<'a>),
}

impl<'a, V: Clone> StackValue<'a, V> {
  fn resolve(self, callbacks: &SemanticCallbacks<V>) -> Result<V, FarkleError> {
    match self {
      StackValue::Computed(v) => Ok(v),
      StackValue::Token(token) => {
        let transform = callbacks
          .transforms
          .get(&token.terminal)
          .unwrap_or_else(|| panic!("terminal {} is used as a significant symbol but has no registered transform", token.terminal));
        transform(token.position, token.text)
          .map_err(|UserError(message)| FarkleError::UserError { message, position: Some(token.position) })
      }
    }
  }
}

/// Runs `grammar`'s LALR(1) table `table` over `input`, dispatching
/// `callbacks`' transform/fuse actions on every shift/reduce
/// (`spec.md` §4.8). `hook`, if given, is consulted before every LR step
/// for a virtual terminal (`spec.md` §6). `trace`, if given, is called
/// with every [`ParseAction`] the driver takes, for diagnostics/tooling.
pub fn parse<V: Clone>(
  grammar: &GrammarDefinition,
  callbacks: &SemanticCallbacks<V>,
  dfa: &CompiledDfa,
  table: &CompiledLr,
  input: &str,
  mut hook: Option<&mut dyn TokenizerHook<V>>,
  mut trace: Option<&mut dyn FnMut(ParseAction)>,
) -> Result<V, FarkleError> {
  let mut tokenizer = Tokenizer::new(grammar, dfa, input);
  let mut states: Vec<LrStateId> = vec![table.start_state];
  let mut values: Vec<StackValue<'_, V>> = Vec::new();
  let mut lookahead: Option<NextSymbol<'_, V>> = None;

  loop {
    let current_state = *states.last().expect("the state stack is never empty during a parse");
    if lookahead.is_none() {
      lookahead = next_significant_symbol(grammar, &mut tokenizer, &mut hook, current_state)?;
    }
    let row = table.row(current_state);

    let action = lookahead.as_ref().and_then(|symbol| row.actions.get(&symbol.terminal()).copied());

    match (lookahead.is_some(), action) {
      (false, _) => match row.eof_action {
        Some(EofAction::Accept) => {
          if let Some(trace) = trace.as_deref_mut() {
            trace(ParseAction::Accept);
          }
          let result = values.pop().expect("a completed parse leaves exactly one value");
          return result.resolve(callbacks);
        }
        Some(EofAction::Reduce(production)) => {
          let symbol_count = reduce(grammar, callbacks, table, &mut states, &mut values, production)?;
          if let Some(trace) = trace.as_deref_mut() {
            trace(ParseAction::Reduce { production, symbol_count });
          }
        }
        None => {
          let position = tokenizer.position();
          if let Some(trace) = trace.as_deref_mut() {
            trace(ParseAction::EndOfInput { position });
          }
          return Err(FarkleError::UnexpectedEndOfInput { expected: expected_terminals(grammar, row), position });
        }
      },
      (true, Some(LrAction::Shift(target))) => {
        let symbol = lookahead.take().expect("checked Some above");
        let terminal = symbol.terminal();
        let position = symbol.position();
        let value = match symbol {
          NextSymbol::Real(token) => StackValue::Token(token),
          NextSymbol::Virtual(_, _, value) => StackValue::Computed(value),
        };
        states.push(target);
        values.push(value);
        if let Some(trace) = trace.as_deref_mut() {
          trace(ParseAction::Shift { terminal, position });
        }
      }
      (true, Some(LrAction::Reduce(production))) => {
        let symbol_count = reduce(grammar, callbacks, table, &mut states, &mut values, production)?;
        if let Some(trace) = trace.as_deref_mut() {
          trace(ParseAction::Reduce { production, symbol_count });
        }
      }
      (true, error_or_none) => {
        debug_assert!(matches!(error_or_none, None | Some(LrAction::Error)));
        let symbol = lookahead.take().expect("checked Some above");
        let expected = expected_terminals(grammar, row);
        if let Some(trace) = trace.as_deref_mut() {
          trace(ParseAction::Error { found: Some(symbol.terminal()), expected: expected.clone(), position: symbol.position() });
        }
        return Err(FarkleError::SyntaxError { found: symbol.terminal(), expected, position: symbol.position() });
      }
    }
  }
}

fn next_significant_symbol<'a, V>(
  grammar: &GrammarDefinition,
  tokenizer: &mut Tokenizer<'a>,
  hook: &mut Option<&mut dyn TokenizerHook<V>>,
  lr_state: LrStateId,
) -> Result<Option<NextSymbol<'a, V>>, FarkleError> {
  loop {
    if let Some(hook) = hook.as_deref_mut() {
      if let Some((terminal, value)) = hook.try_produce(tokenizer.position(), lr_state) {
        return Ok(Some(NextSymbol::Virtual(terminal, tokenizer.position(), value)));
      }
    }
    match tokenizer.next_token()? {
      None => return Ok(None),
      // Noise tokens are dropped here, not in the tokenizer, so error
      // messages can still reference the raw token stream (`spec.md`
      // §4.8 step 1).
      Some(token) if grammar.terminal(token.terminal).is_noise() => continue,
      Some(token) => return Ok(Some(NextSymbol::Real(token))),
    }
  }
}

fn reduce<'a, V: Clone>(
  grammar: &GrammarDefinition,
  callbacks: &SemanticCallbacks<V>,
  table: &CompiledLr,
  states: &mut Vec<LrStateId>,
  values: &mut Vec<StackValue<'a, V>>,
  production: ProductionId,
) -> Result<usize, FarkleError> {
  let p = grammar.production(production);
  let body_len = p.len();
  let popped = values.split_off(values.len() - body_len);
  states.truncate(states.len() - body_len);

  let mut children = Vec::with_capacity(p.significant_indices().count());
  for (element, value) in p.body.iter().zip(popped) {
    if element.significant {
      children.push(value.resolve(callbacks)?);
    }
  }
  let fuse = callbacks.fuses.get(&production).expect("every production has a fuse action");
  let value = fuse
    .invoke(&children, production)
    .map_err(|UserError(message)| FarkleError::UserError { message, position: None })?;

  let top = *states.last().expect("the state stack is never empty during a reduce");
  let target = *table.row(top).gotos.get(&p.head).expect("an LALR table always has a goto for a reducible head");
  states.push(target);
  values.push(StackValue::Computed(value));
  Ok(body_len)
}

/// The syntax-error "expected" set: terminals with a real action in the
/// current state, excluding `Error` actions, `Hidden` terminals, and
/// deduplicated by display name (`spec.md` §7).
fn expected_terminals(grammar: &GrammarDefinition, row: &farkle_core::types::LrStateRow) -> Vec<TerminalId> {
  let mut seen_names: BTreeSet<&str> = BTreeSet::new();
  let mut expected = Vec::new();
  for (&terminal, action) in &row.actions {
    if matches!(action, LrAction::Error) {
      continue;
    }
    let t = grammar.terminal(terminal);
    if t.is_hidden() {
      continue;
    }
    if seen_names.insert(t.display_name()) {
      expected.push(terminal);
    }
  }
  expected
}

#[cfg(test)]
mod tests {
  use super::*;
  use farkle_core::builder::{analyze, BuilderConfig, GrammarBuilder};
  use farkle_core::types::{CharRanges, DfaState, DfaStateId, RegexAst, SymbolId};
  use farkle_lalr_for_tests as lalr;

  // A hand-assembled single-digit-sum DFA/LR pair (`digit ('+' digit)*`
  // folded left), good enough to exercise the shift/reduce/goto loop
  // without depending on `farkle-dfa`/`farkle-lalr`.
  mod farkle_lalr_for_tests {
    pub use farkle_lalr::compile;
  }

  fn sum_grammar_with_tables() -> (GrammarDefinition, SemanticCallbacks<i64>, CompiledDfa, CompiledLr) {
    let mut builder: GrammarBuilder<i64> = GrammarBuilder::new(BuilderConfig::default());
    let digit = builder.terminal(
      "digit",
      RegexAst::Chars(CharRanges::from_ranges(vec![('0', '9')])),
      std::sync::Arc::new(|_pos, text: &str| Ok(text.parse::<i64>().unwrap_or(0))),
    );
    let plus = builder.literal("+");
    let expr = builder.nonterminal("Expr");
    let add = builder
      .production(expr)
      .extend(SymbolId::Nonterminal(expr))
      .append(SymbolId::Terminal(plus))
      .extend(SymbolId::Terminal(digit))
      .finish(&mut builder, |c, _| Ok(c[0] + c[1]));
    let atom = builder.production(expr).extend(SymbolId::Terminal(digit)).finish(&mut builder, |c, _| Ok(c[0]));
    builder.set_productions(expr, vec![add, atom]);
    builder.set_start_nonterminal(expr);
    let (def, callbacks, diagnostics) = analyze(builder);
    assert!(!diagnostics.has_errors());

    let mut states = vec![DfaState::default()];
    let digit_accept = states.len() as u32;
    states.push(DfaState { accept: Some(digit), ..Default::default() });
    states[0].edges.push(('0', '9', DfaStateId(digit_accept)));
    let plus_accept = states.len() as u32;
    states.push(DfaState { accept: Some(plus), ..Default::default() });
    states[0].edges.push(('+', '+', DfaStateId(plus_accept)));
    states[0].edges.sort();
    let dfa = CompiledDfa { start_state: DfaStateId(0), states };

    let (table, diagnostics) = lalr::compile(&def);
    assert!(diagnostics.is_empty());
    (def, callbacks, dfa, table)
  }

  #[test]
  fn parses_a_left_associative_sum() {
    let (def, callbacks, dfa, table) = sum_grammar_with_tables();
    let result: i64 = parse(&def, &callbacks, &dfa, &table, "1+2+3", None, None).unwrap();
    assert_eq!(result, 6);
  }

  #[test]
  fn traces_every_shift_and_reduce() {
    let (def, callbacks, dfa, table) = sum_grammar_with_tables();
    let mut actions = Vec::new();
    let mut trace = |action: ParseAction| actions.push(action);
    let result: i64 = parse(&def, &callbacks, &dfa, &table, "1+2", None, Some(&mut trace)).unwrap();
    assert_eq!(result, 3);
    assert!(actions.iter().any(|a| matches!(a, ParseAction::Shift { .. })));
    assert!(actions.iter().any(|a| matches!(a, ParseAction::Reduce { .. })));
    assert_eq!(actions.last(), Some(&ParseAction::Accept));
  }

  #[test]
  fn reports_a_lexical_error_position() {
    let (def, callbacks, dfa, table) = sum_grammar_with_tables();
    let err = parse(&def, &callbacks, &dfa, &table, "1+?", None, None).unwrap_err();
    assert!(matches!(err, FarkleError::LexicalError { ch: Some('?'), .. }));
  }

  #[test]
  fn reports_a_syntax_error_with_an_expected_set() {
    let (def, callbacks, dfa, table) = sum_grammar_with_tables();
    let err = parse(&def, &callbacks, &dfa, &table, "1+", None, None).unwrap_err();
    match err {
      FarkleError::UnexpectedEndOfInput { expected, .. } => assert!(!expected.is_empty()),
      other => panic!("expected UnexpectedEndOfInput, got {other:?}"),
    }
  }
}
