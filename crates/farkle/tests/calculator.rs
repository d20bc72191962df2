//! Scenario 1 of `spec.md` §8: a standard arithmetic calculator with
//! `+ - * /`, unary minus, parentheses, and left-to-right associativity
//! within a precedence level.

use std::sync::Arc;

use farkle::types::{Associativity, CharRanges, RegexAst, SymbolId};
use farkle::{BuilderConfig, GrammarBuilder};

fn calculator() -> GrammarBuilder<i64> {
  let mut builder: GrammarBuilder<i64> = GrammarBuilder::new(BuilderConfig::default());

  let number = builder.terminal(
    "Number",
    RegexAst::Loop { inner: Box::new(RegexAst::Chars(CharRanges::from_ranges(vec![('0', '9')]))), min: 1, max: None },
    Arc::new(|_pos, text: &str| Ok(text.parse::<i64>().unwrap())),
  );
  let lparen = builder.literal("(");
  let rparen = builder.literal(")");

  builder.precedence_group(Associativity::Left, &["+", "-"]);
  builder.precedence_group(Associativity::Left, &["*", "/"]);
  let unary = builder.new_precedence_token();
  builder.operator_scope_mut().push_group(Associativity::Right, vec![unary]);

  let plus = builder.literal("+");
  let minus = builder.literal("-");
  let star = builder.literal("*");
  let slash = builder.literal("/");

  let expr = builder.nonterminal("Expr");
  let add = builder
    .production(expr)
    .extend(SymbolId::Nonterminal(expr))
    .append(SymbolId::Terminal(plus))
    .extend(SymbolId::Nonterminal(expr))
    .finish(&mut builder, |c, _| Ok(c[0] + c[1]));
  let sub = builder
    .production(expr)
    .extend(SymbolId::Nonterminal(expr))
    .append(SymbolId::Terminal(minus))
    .extend(SymbolId::Nonterminal(expr))
    .finish(&mut builder, |c, _| Ok(c[0] - c[1]));
  let mul = builder
    .production(expr)
    .extend(SymbolId::Nonterminal(expr))
    .append(SymbolId::Terminal(star))
    .extend(SymbolId::Nonterminal(expr))
    .finish(&mut builder, |c, _| Ok(c[0] * c[1]));
  let div = builder
    .production(expr)
    .extend(SymbolId::Nonterminal(expr))
    .append(SymbolId::Terminal(slash))
    .extend(SymbolId::Nonterminal(expr))
    .finish(&mut builder, |c, _| Ok(c[0] / c[1]));
  let neg = builder
    .production(expr)
    .append(SymbolId::Terminal(minus))
    .extend(SymbolId::Nonterminal(expr))
    .with_precedence(unary)
    .finish(&mut builder, |c, _| Ok(-c[0]));
  let paren = builder
    .production(expr)
    .append(SymbolId::Terminal(lparen))
    .extend(SymbolId::Nonterminal(expr))
    .append(SymbolId::Terminal(rparen))
    .finish(&mut builder, |c, _| Ok(c[0]));
  let atom = builder.production(expr).extend(SymbolId::Terminal(number)).finish(&mut builder, |c, _| Ok(c[0]));

  builder.set_productions(expr, vec![add, sub, mul, div, neg, paren, atom]);
  builder.set_start_nonterminal(expr);
  builder
}

#[test]
fn evaluates_left_to_right_within_a_precedence_level() {
  let grammar = farkle::compile(calculator()).expect("compile");
  assert_eq!(grammar.parse("5 * 5 - 25").unwrap(), 0);
  assert_eq!(grammar.parse("6 / 2 * (1 + 2)").unwrap(), 9);
  assert_eq!(grammar.parse("125 / 25 / 5").unwrap(), 1);
}

#[test]
fn unary_minus_binds_tighter_than_any_binary_operator() {
  let grammar = farkle::compile(calculator()).expect("compile");
  assert_eq!(grammar.parse("-5 + 10").unwrap(), 5);
  assert_eq!(grammar.parse("-(2 + 3)").unwrap(), -5);
}

#[test]
fn empty_input_is_rejected() {
  let grammar = farkle::compile(calculator()).expect("compile");
  assert!(grammar.parse("").is_err());
}
