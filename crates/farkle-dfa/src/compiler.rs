//! DFA compiler orchestration (`spec.md` §4.3): turns a grammar's tagged
//! terminal regexes into a single minimized [`CompiledDfa`].

use farkle_core::builder::GrammarDefinition;
use farkle_core::types::{CharRanges, CompiledDfa, FarkleError, RegexAst, TerminalAttributes, TerminalId};

use crate::{minimize, nfa, subset_construction};

/// Compiles every non-virtual terminal's regex into one combined,
/// minimized DFA (`spec.md` §4.3). Input order (used for
/// `prioritise_by_order` tie-breaking) is each terminal's declaration
/// order, i.e. its [`TerminalId`].
///
/// Returns the compiled automaton plus any non-fatal `DFA_CONFLICT`
/// diagnostics; a nullable terminal or a state-count overflow is a hard
/// error (`spec.md` §4.3 "Failure").
pub fn compile(grammar: &GrammarDefinition, prioritise_by_order: bool) -> Result<(CompiledDfa, Vec<FarkleError>), FarkleError> {
  // Reachability is a grammar-graph property only: it never walks onto the
  // group/noise terminals the tokenizer recognises outside of any
  // production, so those are always compiled too (`spec.md` §4.1, Group).
  let reachable: std::collections::BTreeSet<TerminalId> = grammar.reachable_terminals.iter().copied().collect();
  let mut inputs: Vec<(RegexAst, TerminalId)> = Vec::new();
  for terminal in &grammar.terminals {
    let always_lexed = terminal.attributes.contains(TerminalAttributes::Noise)
      | terminal.attributes.contains(TerminalAttributes::GroupStart)
      | terminal.attributes.contains(TerminalAttributes::GroupEnd)
      | terminal.attributes.contains(TerminalAttributes::Newline);
    if !reachable.contains(&terminal.id) && !always_lexed {
      continue;
    }
    let Some(regex) = &terminal.regex else { continue };
    let regex = resolve_pattern(regex)?;
    let regex = if grammar.case_sensitive { regex } else { fold_case(&regex) };
    check_not_nullable(&regex, terminal.id, &terminal.name)?;
    inputs.push((regex, terminal.id));
  }

  let nfa = nfa::build(&inputs)?;
  let result = subset_construction::subset_construct(&nfa, prioritise_by_order)?;
  let minimized = minimize::minimize(result.dfa);
  Ok((minimized, result.diagnostics))
}

fn resolve_pattern(regex: &RegexAst) -> Result<RegexAst, FarkleError> {
  match regex {
    RegexAst::StringPattern(s) => crate::pattern::parse(s),
    other => Ok(other.clone()),
  }
}

/// Authoritative nullability check via NFA epsilon-closure
/// (`spec.md` §4.3 "Failure": "a terminal whose language contains the
/// empty string is rejected").
fn check_not_nullable(regex: &RegexAst, id: TerminalId, name: &str) -> Result<(), FarkleError> {
  let solo = nfa::build(&[(regex.clone(), id)])?;
  let closure = nfa::epsilon_closure(&solo, [solo.start]);
  if closure.iter().any(|s| solo.states[s.0].accept.is_some()) {
    return Err(FarkleError::NullableTerminal { terminal: id, name: name.to_string() });
  }
  Ok(())
}

/// Expands every character-class transition to include its opposite case
/// (`spec.md` §9: "Case-insensitivity is implemented at DFA-construction
/// time by expanding each character-class transition... grammars are not
/// mutated").
fn fold_case(regex: &RegexAst) -> RegexAst {
  match regex {
    RegexAst::Any => RegexAst::Any,
    RegexAst::Chars(ranges) => RegexAst::Chars(add_opposite_case(ranges)),
    RegexAst::AllButChars(ranges) => RegexAst::AllButChars(add_opposite_case(ranges)),
    RegexAst::Concat(parts) => RegexAst::Concat(parts.iter().map(fold_case).collect()),
    RegexAst::Alt(parts) => RegexAst::Alt(parts.iter().map(fold_case).collect()),
    RegexAst::Loop { inner, min, max } => RegexAst::Loop { inner: Box::new(fold_case(inner)), min: *min, max: *max },
    RegexAst::StringPattern(s) => RegexAst::StringPattern(s.clone()),
  }
}

fn add_opposite_case(ranges: &CharRanges) -> CharRanges {
  let mut out: Vec<(char, char)> = ranges.ranges().to_vec();
  for &(lo, hi) in ranges.ranges() {
    let mut c = lo;
    loop {
      for other in c.to_uppercase().chain(c.to_lowercase()) {
        out.push((other, other));
      }
      if c == hi {
        break;
      }
      c = char::from_u32(c as u32 + 1).unwrap_or(hi);
    }
  }
  CharRanges::from_ranges(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use farkle_core::builder::{analyze, BuilderConfig, GrammarBuilder};
  use farkle_core::types::{CharRanges, SymbolId};

  fn digit_grammar() -> GrammarDefinition {
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
  fn compiles_a_single_digit_terminal() {
    let def = digit_grammar();
    let (dfa, diagnostics) = compile(&def, false).unwrap();
    assert!(diagnostics.is_empty());
    let next = dfa.state(dfa.start_state).transition('7').unwrap();
    assert_eq!(dfa.state(next).accept, Some(TerminalId(0)));
  }

  #[test]
  fn rejects_a_nullable_terminal() {
    let mut builder: GrammarBuilder<i64> = GrammarBuilder::new(BuilderConfig::default());
    builder.terminal(
      "maybe",
      RegexAst::Chars(CharRanges::single('x')).opt(),
      std::sync::Arc::new(|_pos, _text: &str| Ok(0)),
    );
    let start = builder.nonterminal("Start");
    let only = TerminalId(0);
    let prod = builder.production(start).extend(SymbolId::Terminal(only)).finish(&mut builder, |c, _| Ok(c[0]));
    builder.set_productions(start, vec![prod]);
    builder.set_start_nonterminal(start);
    let (def, _callbacks, _diagnostics) = analyze(builder);
    assert!(matches!(compile(&def, false), Err(FarkleError::NullableTerminal { .. })));
  }

  #[test]
  fn case_insensitive_grammar_matches_both_cases() {
    let mut builder: GrammarBuilder<i64> = GrammarBuilder::new(BuilderConfig { case_sensitive: false, ..BuilderConfig::default() });
    builder.terminal("kw", RegexAst::literal("if"), std::sync::Arc::new(|_pos, _text: &str| Ok(0)));
    let start = builder.nonterminal("Start");
    let only = TerminalId(0);
    let prod = builder.production(start).extend(SymbolId::Terminal(only)).finish(&mut builder, |c, _| Ok(c[0]));
    builder.set_productions(start, vec![prod]);
    builder.set_start_nonterminal(start);
    let (def, _callbacks, diagnostics) = analyze(builder);
    assert!(!diagnostics.has_errors());
    let (dfa, _) = compile(&def, false).unwrap();
    for text in ["if", "IF", "If"] {
      let mut state = dfa.start_state;
      for c in text.chars() {
        state = dfa.state(state).transition(c).unwrap_or_else(|| panic!("no transition for '{c}' in `{text}`"));
      }
      assert_eq!(dfa.state(state).accept, Some(TerminalId(0)), "failed for {text}");
    }
  }
}
