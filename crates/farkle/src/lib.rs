//! The Farkle parser-construction toolchain: a grammar builder front-end,
//! a regex-to-DFA compiler, an LALR(1) table generator, and a tokenizer +
//! LR driver runtime, assembled into one `compile()` → [`CompiledGrammar`]
//! surface (`spec.md` §2). Grounded on the reference toolchain's own
//! facade crate, which depends on and re-exports its constituent crates
//! rather than reimplementing anything itself.

use farkle_core::types::Severity;

pub use farkle_core::artifact::{DecodedArtifact, GrammarArtifact};
pub use farkle_core::builder::{analyze, BuilderConfig, GrammarBuilder, GrammarDefinition, GrammarView};
pub use farkle_core::legacy::{import as import_legacy_grammar, LegacyGrammar};
pub use farkle_core::types;
pub use farkle_core::types::{FarkleError, SemanticCallbacks};

pub use farkle_runtime::{ParseAction, Token, TokenizerHook};

/// A fully compiled grammar: the frozen definition, its semantic
/// callbacks, and the DFA/LALR tables needed to drive a parse
/// (`spec.md` §2's "builder → compilers → artifact → runtime" pipeline,
/// collapsed into a single in-memory handle for callers that don't need
/// to round-trip through the binary artifact format).
pub struct CompiledGrammar<V> {
  pub definition: GrammarDefinition,
  pub callbacks: SemanticCallbacks<V>,
  pub dfa: types::CompiledDfa,
  pub table: types::CompiledLr,
}

impl<V: Clone> CompiledGrammar<V> {
  /// Parses `input` against this grammar, dispatching transform/fuse
  /// callbacks as the LR driver shifts and reduces (`spec.md` §4.8).
  pub fn parse(&self, input: &str) -> Result<V, FarkleError> {
    farkle_runtime::driver::parse(&self.definition, &self.callbacks, &self.dfa, &self.table, input, None, None)
  }

  /// As [`Self::parse`], but consults `hook` for virtual terminals before
  /// every LR step (`spec.md` §6).
  pub fn parse_with_hook(&self, input: &str, hook: &mut dyn TokenizerHook<V>) -> Result<V, FarkleError> {
    farkle_runtime::driver::parse(&self.definition, &self.callbacks, &self.dfa, &self.table, input, Some(hook), None)
  }

  /// As [`Self::parse`], additionally recording every [`ParseAction`] the
  /// driver takes, for tracing/debugging.
  pub fn parse_traced(&self, input: &str, trace: &mut dyn FnMut(ParseAction)) -> Result<V, FarkleError> {
    farkle_runtime::driver::parse(&self.definition, &self.callbacks, &self.dfa, &self.table, input, None, Some(trace))
  }

  /// Encodes this grammar's definition and compiled tables into a
  /// serializable [`GrammarArtifact`] (`spec.md` §4.6). The semantic
  /// callbacks never travel inside it — only [`Self::parse`] and friends
  /// can exercise them, since closures are not serializable.
  pub fn artifact(&self) -> GrammarArtifact {
    GrammarArtifact::encode(&self.definition, Some(&self.dfa), Some(&self.table))
  }
}

/// Runs the full pipeline over `builder`: freezes it into a
/// [`GrammarDefinition`], compiles the DFA, compiles the LALR(1) table,
/// and bundles the result into a [`CompiledGrammar`] (`spec.md` §2).
///
/// On any error-severity diagnostic from any stage, compilation stops and
/// every diagnostic collected so far is returned — builder structural
/// errors short-circuit before the (possibly unrecoverable) compiler
/// stages run, matching the "collected, not thrown" propagation policy of
/// `spec.md` §7. `BuilderConfig::promote_warnings_to_errors` is honored
/// here, against the diagnostics of every stage, since it is otherwise
/// unconsumed once the builder is frozen into a [`GrammarDefinition`].
pub fn compile<V: Clone + 'static>(builder: GrammarBuilder<V>) -> Result<CompiledGrammar<V>, Vec<FarkleError>> {
  let config = *builder.config();
  let (definition, callbacks, builder_diagnostics) = analyze(builder);
  let mut diagnostics: Vec<FarkleError> = builder_diagnostics.into_vec();
  if has_errors(&diagnostics, config.promote_warnings_to_errors) {
    return Err(diagnostics);
  }

  let (dfa, dfa_diagnostics) = match farkle_dfa::compile(&definition, config.prioritise_by_order) {
    Ok(result) => result,
    Err(fatal) => {
      diagnostics.push(fatal);
      return Err(diagnostics);
    }
  };
  diagnostics.extend(dfa_diagnostics);

  let (table, lalr_diagnostics) = farkle_lalr::compile(&definition);
  diagnostics.extend(lalr_diagnostics);

  if has_errors(&diagnostics, config.promote_warnings_to_errors) {
    return Err(diagnostics);
  }

  Ok(CompiledGrammar { definition, callbacks, dfa, table })
}

fn has_errors(diagnostics: &[FarkleError], promote_warnings: bool) -> bool {
  diagnostics.iter().any(|d| d.severity() == Severity::Error || (promote_warnings && d.severity() == Severity::Warning))
}

/// Decodes a [`GrammarArtifact`] produced by a previous [`compile`] call
/// (or read from disk) back into its definition and compiled tables.
/// Semantic callbacks must be supplied separately — they never travel
/// inside the artifact (`spec.md` §4.6).
pub fn decode_artifact(artifact: &GrammarArtifact) -> Result<&DecodedArtifact, FarkleError> {
  artifact.decode()
}

#[cfg(test)]
mod tests {
  use super::*;
  use farkle_core::types::{CharRanges, RegexAst, SymbolId};

  fn sum_grammar() -> GrammarBuilder<i64> {
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
    builder
  }

  #[test]
  fn compiles_and_parses_a_left_associative_sum() {
    let grammar = compile(sum_grammar()).expect("compile");
    assert_eq!(grammar.parse("1+2+3").unwrap(), 6);
  }

  #[test]
  fn round_trips_through_the_binary_artifact() {
    let grammar = compile(sum_grammar()).expect("compile");
    let artifact = grammar.artifact();
    let decoded = decode_artifact(&artifact).expect("decode");
    assert_eq!(decoded.grammar.terminals.len(), grammar.definition.terminals.len());
    assert!(decoded.dfa.is_some());
    assert!(decoded.lr.is_some());
  }

  #[test]
  fn surfaces_a_lexical_error() {
    let grammar = compile(sum_grammar()).expect("compile");
    let err = grammar.parse("1+?").unwrap_err();
    assert!(matches!(err, FarkleError::LexicalError { ch: Some('?'), .. }));
  }
}
