//! Scenario 4 of `spec.md` §8: `+` is left-associative, `*` is
//! non-associative — chaining `*` at the same precedence level must be
//! rejected rather than silently picking an associativity.

use std::sync::Arc;

use farkle::types::{Associativity, CharRanges, RegexAst, SymbolId};
use farkle::{BuilderConfig, GrammarBuilder};

fn grammar() -> GrammarBuilder<i64> {
  let mut builder: GrammarBuilder<i64> = GrammarBuilder::new(BuilderConfig::default());
  let number = builder.terminal(
    "Number",
    RegexAst::Loop { inner: Box::new(RegexAst::Chars(CharRanges::from_ranges(vec![('0', '9')]))), min: 1, max: None },
    Arc::new(|_pos, text: &str| Ok(text.parse::<i64>().unwrap())),
  );

  builder.precedence_group(Associativity::Left, &["+"]);
  builder.precedence_group(Associativity::NonAssoc, &["*"]);
  let plus = builder.literal("+");
  let star = builder.literal("*");

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
  let atom = builder.production(expr).extend(SymbolId::Terminal(number)).finish(&mut builder, |c, _| Ok(c[0]));

  builder.set_productions(expr, vec![add, mul, atom]);
  builder.set_start_nonterminal(expr);
  builder
}

#[test]
fn left_associative_plus_chains_freely() {
  let grammar = farkle::compile(grammar()).expect("compile");
  assert_eq!(grammar.parse("3+4+5").unwrap(), 12);
}

#[test]
fn non_associative_star_rejects_chaining() {
  let grammar = farkle::compile(grammar()).expect("compile");
  assert!(grammar.parse("3*4*5").is_err());
  assert_eq!(grammar.parse("3*4").unwrap(), 12);
}
