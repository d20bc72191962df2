//! Scenarios 2 and 3 of `spec.md` §8: line and block lexical groups,
//! captured verbatim as a single container token.

use std::sync::Arc;

use farkle::types::{GroupFlags, SymbolId};
use farkle::{BuilderConfig, GrammarBuilder};

// Group containers are created internally by `group_line`/`group_block`
// rather than through `terminal()`, so they carry no transform callback
// at build time — it is registered directly on the compiled grammar's
// public `callbacks` field, once the container's handle is known.

#[test]
fn line_group_excludes_the_trailing_newline() {
  let mut builder: GrammarBuilder<String> = GrammarBuilder::new(BuilderConfig::default());
  let bang = builder.literal("!!");
  let (container, _group) = builder.group_line(bang, "BangLine", GroupFlags::none());
  let start = builder.nonterminal("Start");
  let prod = builder.production(start).extend(SymbolId::Terminal(container)).finish(&mut builder, |c, _| Ok(c[0].clone()));
  builder.set_productions(start, vec![prod]);
  builder.set_start_nonterminal(start);

  let mut grammar = farkle::compile(builder).expect("compile");
  grammar.callbacks.transforms.insert(container, Arc::new(|_pos, text: &str| Ok(text.to_string())));

  assert_eq!(grammar.parse("!! No new line").unwrap(), "!! No new line");
  assert_eq!(grammar.parse("!! Has new line\n").unwrap(), "!! Has new line");
}

#[test]
fn block_group_captures_delimiters_and_unicode_content_verbatim() {
  let mut builder: GrammarBuilder<String> = GrammarBuilder::new(BuilderConfig::default());
  let lbrace = builder.literal("{");
  let rbrace = builder.literal("}");
  let (container, _group) = builder.group_block(lbrace, rbrace, "Brace", GroupFlags::KeepEndToken);
  let start = builder.nonterminal("Start");
  let prod = builder.production(start).extend(SymbolId::Terminal(container)).finish(&mut builder, |c, _| Ok(c[0].clone()));
  builder.set_productions(start, vec![prod]);
  builder.set_start_nonterminal(start);

  let mut grammar = farkle::compile(builder).expect("compile");
  grammar.callbacks.transforms.insert(container, Arc::new(|_pos, text: &str| Ok(text.to_string())));

  assert_eq!(grammar.parse("{\u{1F199}\u{1F199}}").unwrap(), "{\u{1F199}\u{1F199}}");
}
