//! Scenario 6 of `spec.md` §8: importing an enhanced-grammar-tables file
//! describing the same calculator yields an LALR table equivalent (up to
//! state renumbering — here, built identically, so numbering matches
//! exactly) to the one compiled from scratch.
//!
//! There is no legacy-format encoder in this workspace (the importer is
//! read-only, per `spec.md` §6), so this test hand-encodes the exact byte
//! stream `farkle_core::legacy::import` expects, built directly from a
//! grammar compiled through the normal builder pipeline.

use std::sync::Arc;

use farkle::types::{CharRanges, RegexAst, SymbolId};
use farkle::{BuilderConfig, GrammarBuilder};

fn sum_grammar() -> farkle::GrammarBuilder<i64> {
  let mut builder: GrammarBuilder<i64> = GrammarBuilder::new(BuilderConfig::default());
  let digit = builder.terminal(
    "digit",
    RegexAst::Chars(CharRanges::from_ranges(vec![('0', '9')])),
    Arc::new(|_pos, text: &str| Ok(text.parse::<i64>().unwrap())),
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

/// A little-endian, length-prefixed-string writer mirroring
/// `farkle_core::legacy::reader::EgtReader`'s exact field encoding.
#[derive(Default)]
struct EgtWriter(Vec<u8>);

impl EgtWriter {
  fn u8(&mut self, v: u8) {
    self.0.push(v);
  }
  fn bool(&mut self, v: bool) {
    self.u8(v as u8);
  }
  fn u16(&mut self, v: u16) {
    self.0.extend_from_slice(&v.to_le_bytes());
  }
  fn u32(&mut self, v: u32) {
    self.0.extend_from_slice(&v.to_le_bytes());
  }
  fn string(&mut self, s: &str) {
    self.u32(s.len() as u32);
    self.0.extend_from_slice(s.as_bytes());
  }
}

/// Encodes `(def, dfa, table)` — a grammar with exactly one nonterminal
/// and two terminals (`digit`, `+`) — as an enhanced-grammar-tables blob.
/// Legacy symbol indices: `0` = the nonterminal, `1 + TerminalId` = each
/// terminal, and one final index for end-of-input.
fn encode_legacy(dfa: &farkle::types::CompiledDfa, table: &farkle::types::CompiledLr) -> Vec<u8> {
  let terminal_count = 2u32;
  let eoi_index = 1 + terminal_count;
  let symbol_count = eoi_index + 1;

  let mut edges_flat: Vec<(char, char, u32)> = Vec::new();
  for state in &dfa.states {
    for &(lo, hi, target) in &state.edges {
      edges_flat.push((lo, hi, target.0));
    }
  }

  let mut w = EgtWriter::default();
  w.0.extend_from_slice(b"EGTBLOB0");
  w.u16(1);

  w.u8(b't');
  w.u32(symbol_count);
  w.u32(edges_flat.len() as u32);
  w.u32(2); // rule_count
  w.u32(dfa.states.len() as u32);
  w.u32(table.states.len() as u32);
  w.u32(0); // group_count

  w.u8(b'S');
  w.u32(0);
  w.u8(0); // Nonterminal
  w.string("Expr");

  w.u8(b'S');
  w.u32(1);
  w.u8(1); // Terminal
  w.string("digit");

  w.u8(b'S');
  w.u32(2);
  w.u8(1); // Terminal
  w.string("+");

  w.u8(b'S');
  w.u32(eoi_index);
  w.u8(3); // EndOfInput
  w.string("$end");

  for (i, &(lo, hi, _)) in edges_flat.iter().enumerate() {
    w.u8(b'c');
    w.u32(i as u32);
    w.u32(1);
    w.u32(lo as u32);
    w.u32(hi as u32);
  }

  // rule 0: Expr -> Expr + digit, rule 1: Expr -> digit
  w.u8(b'R');
  w.u32(0);
  w.u32(0);
  w.u32(3);
  w.u32(0);
  w.u32(2);
  w.u32(1);

  w.u8(b'R');
  w.u32(1);
  w.u32(0);
  w.u32(1);
  w.u32(1);

  let mut charset_of_edge = 0u32;
  for (state_index, state) in dfa.states.iter().enumerate() {
    w.u8(b'D');
    w.u32(state_index as u32);
    w.bool(state.accept.is_some());
    w.u32(state.accept.map(|t| t.0).unwrap_or(0));
    w.u32(state.edges.len() as u32);
    for _ in &state.edges {
      w.u32(charset_of_edge);
      let target = edges_flat[charset_of_edge as usize].2;
      w.u32(target);
      charset_of_edge += 1;
    }
  }
  w.u8(b'i');
  w.u32(dfa.start_state.0);

  let terminal_legacy_index = |t: u32| 1 + t;
  for (state_index, row) in table.states.iter().enumerate() {
    let mut actions: Vec<(u32, u8, u32)> = Vec::new();
    for (&terminal, action) in &row.actions {
      match action {
        farkle::types::LrAction::Shift(target) => actions.push((terminal_legacy_index(terminal.0), 0, target.0)),
        farkle::types::LrAction::Reduce(production) => actions.push((terminal_legacy_index(terminal.0), 1, production.0)),
        farkle::types::LrAction::Error => {}
      }
    }
    for (&nonterminal, target) in &row.gotos {
      actions.push((nonterminal.0, 3, target.0));
    }
    match row.eof_action {
      Some(farkle::types::EofAction::Reduce(production)) => actions.push((eoi_index, 1, production.0)),
      Some(farkle::types::EofAction::Accept) => actions.push((eoi_index, 2, 0)),
      None => {}
    }

    w.u8(b'L');
    w.u32(state_index as u32);
    w.u32(actions.len() as u32);
    for (symbol_index, kind, target) in actions {
      w.u32(symbol_index);
      w.u8(kind);
      w.u32(target);
    }
  }
  w.u8(b'l');
  w.u32(table.start_state.0);

  w.0
}

#[test]
fn legacy_import_is_structurally_equivalent_to_a_from_scratch_compile() {
  let builder = sum_grammar();
  let (definition, _callbacks, diagnostics) = farkle::analyze(builder);
  assert!(!diagnostics.has_errors());

  let (dfa, dfa_diagnostics) = farkle_dfa::compile(&definition, false).expect("dfa compile");
  assert!(dfa_diagnostics.is_empty());
  let (table, lalr_diagnostics) = farkle_lalr::compile(&definition);
  assert!(lalr_diagnostics.is_empty());

  let bytes = encode_legacy(&dfa, &table);
  let imported = farkle::import_legacy_grammar(&bytes).expect("import");

  assert_eq!(imported.lr, table);
  assert_eq!(imported.dfa.start_state, dfa.start_state);
  assert_eq!(imported.dfa.states.len(), dfa.states.len());
  for (imported_state, original_state) in imported.dfa.states.iter().zip(&dfa.states) {
    assert_eq!(imported_state.accept, original_state.accept);
    assert_eq!(imported_state.edges, original_state.edges);
  }
}
