//! Read-only import of a pre-existing "enhanced grammar tables" binary
//! (`spec.md` §6): the older GOLD-family format, which ships a grammar as
//! already-compiled DFA and LALR tables rather than source patterns. The
//! importer therefore produces a [`GrammarDefinition`] with every terminal's
//! `regex` left `None` (the DFA is taken as-is, never recompiled) alongside
//! the imported [`CompiledDfa`] and [`CompiledLr`].

use std::collections::BTreeSet;

use crate::builder::GrammarDefinition;
use crate::types::{
  BodyElement, CharRanges, CompiledDfa, CompiledLr, DfaState, DfaStateId, EofAction, FarkleError, Group, GroupEnd,
  GroupFlags, GroupId, LrAction, LrStateId, LrStateRow, Nonterminal, NonterminalId, OperatorScope, Production,
  ProductionId, ProductionSetState, SymbolId, Terminal, TerminalAttributes, TerminalId,
};

use super::reader::EgtReader;

pub const MAGIC: &[u8; 8] = b"EGTBLOB0";

/// Legacy symbol kinds (`spec.md` §6): the closed set the importer maps
/// onto the current model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LegacySymbolKind {
  Nonterminal,
  Terminal,
  Noise,
  EndOfInput,
  GroupStart,
  GroupEnd,
  Error,
}

impl LegacySymbolKind {
  fn from_byte(b: u8) -> Result<Self, FarkleError> {
    match b {
      0 => Ok(LegacySymbolKind::Nonterminal),
      1 => Ok(LegacySymbolKind::Terminal),
      2 => Ok(LegacySymbolKind::Noise),
      3 => Ok(LegacySymbolKind::EndOfInput),
      4 => Ok(LegacySymbolKind::GroupStart),
      5 => Ok(LegacySymbolKind::GroupEnd),
      6 => Ok(LegacySymbolKind::Error),
      other => Err(FarkleError::UnsupportedFormat { detail: format!("unknown legacy symbol kind {other}") }),
    }
  }
}

struct LegacySymbol {
  kind: LegacySymbolKind,
  name: String,
}

/// The result of a legacy import: a structural grammar plus its
/// already-compiled automata, ready to drive a parse without a separate
/// DFA/LALR compilation pass.
pub struct LegacyGrammar {
  pub definition: GrammarDefinition,
  pub dfa: CompiledDfa,
  pub lr: CompiledLr,
}

struct RawGroup {
  container_symbol: u32,
  start_symbol: u32,
  end_symbol: Option<u32>,
  flags: GroupFlags,
  nesting: Vec<u32>,
}

pub fn import(bytes: &[u8]) -> Result<LegacyGrammar, FarkleError> {
  let mut r = EgtReader::new(bytes);
  let magic = r.bytes(8)?;
  if magic != MAGIC.as_slice() {
    return Err(FarkleError::UnsupportedFormat { detail: "not an enhanced grammar tables file".into() });
  }
  let _version = r.u16()?;

  let mut symbols: Vec<LegacySymbol> = Vec::new();
  let mut charsets: Vec<CharRanges> = Vec::new();
  let mut rules: Vec<(u32, u32, Vec<u32>)> = Vec::new(); // (index, head, body)
  let mut dfa_states: Vec<Option<DfaState>> = Vec::new();
  let mut dfa_start: Option<u32> = None;
  let mut lalr_states: Vec<Option<Vec<(u32, u8, u32)>>> = Vec::new();
  let mut lalr_start: Option<u32> = None;
  let mut raw_groups: Vec<RawGroup> = Vec::new();

  while !r.at_eof() {
    match r.u8()? {
      b't' => {
        let symbol_count = r.u32()? as usize;
        let charset_count = r.u32()? as usize;
        let rule_count = r.u32()? as usize;
        let dfa_count = r.u32()? as usize;
        let lalr_count = r.u32()? as usize;
        let _group_count = r.u32()? as usize;
        symbols.resize_with(symbol_count, || LegacySymbol { kind: LegacySymbolKind::Error, name: String::new() });
        charsets.resize_with(charset_count, CharRanges::default);
        rules.reserve(rule_count);
        dfa_states.resize_with(dfa_count, || None);
        lalr_states.resize_with(lalr_count, || None);
      }
      b'S' => {
        let index = r.u32()? as usize;
        let kind = LegacySymbolKind::from_byte(r.u8()?)?;
        let name = r.string()?;
        let slot = symbols
          .get_mut(index)
          .ok_or_else(|| FarkleError::UnsupportedFormat { detail: "symbol index out of range".into() })?;
        *slot = LegacySymbol { kind, name };
      }
      b'c' => {
        let index = r.u32()? as usize;
        let range_count = r.u32()?;
        let mut ranges = Vec::with_capacity(range_count as usize);
        for _ in 0..range_count {
          let lo = char_from_legacy(r.u32()?)?;
          let hi = char_from_legacy(r.u32()?)?;
          ranges.push((lo, hi));
        }
        let slot = charsets
          .get_mut(index)
          .ok_or_else(|| FarkleError::UnsupportedFormat { detail: "charset index out of range".into() })?;
        *slot = CharRanges::from_ranges(ranges);
      }
      b'R' => {
        let index = r.u32()?;
        let head = r.u32()?;
        let body_len = r.u32()?;
        let body = (0..body_len).map(|_| r.u32()).collect::<Result<Vec<_>, _>>()?;
        rules.push((index, head, body));
      }
      b'D' => {
        let index = r.u32()? as usize;
        let is_accept = r.bool()?;
        let accept_symbol = r.u32()?;
        let edge_count = r.u32()?;
        let mut edges = Vec::with_capacity(edge_count as usize);
        for _ in 0..edge_count {
          let charset_index = r.u32()? as usize;
          let target = r.u32()?;
          let ranges = charsets
            .get(charset_index)
            .ok_or_else(|| FarkleError::UnsupportedFormat { detail: "charset index out of range".into() })?;
          for &(lo, hi) in ranges.ranges() {
            edges.push((lo, hi, DfaStateId(target)));
          }
        }
        edges.sort_by_key(|(lo, _, _)| *lo);
        let accept = if is_accept { Some(accept_symbol) } else { None };
        let slot = dfa_states
          .get_mut(index)
          .ok_or_else(|| FarkleError::UnsupportedFormat { detail: "DFA state index out of range".into() })?;
        *slot = Some(DfaState { edges, accept: accept.map(TerminalId), default: None });
      }
      b'i' => dfa_start = Some(r.u32()?),
      b'L' => {
        let index = r.u32()? as usize;
        let action_count = r.u32()?;
        let mut actions = Vec::with_capacity(action_count as usize);
        for _ in 0..action_count {
          let symbol_index = r.u32()?;
          let kind = r.u8()?;
          let target = r.u32()?;
          actions.push((symbol_index, kind, target));
        }
        let slot = lalr_states
          .get_mut(index)
          .ok_or_else(|| FarkleError::UnsupportedFormat { detail: "LALR state index out of range".into() })?;
        *slot = Some(actions);
      }
      b'l' => lalr_start = Some(r.u32()?),
      b'g' => {
        let _index = r.u32()?;
        let container_symbol = r.u32()?;
        let start_symbol = r.u32()?;
        let has_end_token = r.bool()?;
        let end_symbol_raw = r.u32()?;
        let end_symbol = if has_end_token { Some(end_symbol_raw) } else { None };
        let advance_by_character = r.bool()?;
        let keep_end_token = r.bool()?;
        let ends_on_end_of_input = r.bool()?;
        let nesting_count = r.u32()?;
        let nesting = (0..nesting_count).map(|_| r.u32()).collect::<Result<Vec<_>, _>>()?;
        let mut flags = GroupFlags::none();
        if advance_by_character {
          flags |= GroupFlags::AdvanceByCharacter;
        }
        if keep_end_token {
          flags |= GroupFlags::KeepEndToken;
        }
        if ends_on_end_of_input {
          flags |= GroupFlags::EndsOnEndOfInput;
        }
        raw_groups.push(RawGroup { container_symbol, start_symbol, end_symbol, flags, nesting });
      }
      b'p' => {
        let _name = r.string()?;
        let _value = r.string()?;
      }
      other => return Err(FarkleError::UnsupportedFormat { detail: format!("unknown legacy record tag {other}") }),
    }
  }

  build(symbols, rules, dfa_states, dfa_start, lalr_states, lalr_start, raw_groups)
}

#[allow(clippy::too_many_arguments)]
fn build(
  symbols: Vec<LegacySymbol>,
  rules: Vec<(u32, u32, Vec<u32>)>,
  dfa_states: Vec<Option<DfaState>>,
  dfa_start: Option<u32>,
  lalr_states: Vec<Option<Vec<(u32, u8, u32)>>>,
  lalr_start: Option<u32>,
  raw_groups: Vec<RawGroup>,
) -> Result<LegacyGrammar, FarkleError> {
  // Assign dense, disjoint terminal/nonterminal handles in legacy symbol
  // order; `EndOfInput` gets no handle (`spec.md` §6's seven-kind map, of
  // which only `EndOfInput` has no counterpart in the current model).
  let mut legacy_to_symbol: Vec<Option<SymbolId>> = Vec::with_capacity(symbols.len());
  let mut terminals: Vec<Terminal> = Vec::new();
  let mut nonterminals: Vec<Nonterminal> = Vec::new();
  for legacy in &symbols {
    let handle = match legacy.kind {
      LegacySymbolKind::Nonterminal => {
        let id = NonterminalId(nonterminals.len() as u32);
        nonterminals.push(Nonterminal::new(id, legacy.name.clone()));
        Some(SymbolId::Nonterminal(id))
      }
      LegacySymbolKind::EndOfInput => None,
      _ => {
        let id = TerminalId(terminals.len() as u32);
        let mut attributes = TerminalAttributes::Terminal;
        match legacy.kind {
          LegacySymbolKind::Noise => attributes |= TerminalAttributes::Noise,
          LegacySymbolKind::GroupStart => attributes |= TerminalAttributes::GroupStart,
          LegacySymbolKind::GroupEnd => attributes |= TerminalAttributes::GroupEnd,
          _ => {}
        }
        terminals.push(Terminal {
          id,
          name: legacy.name.clone(),
          attributes,
          regex: None,
          display_override: None,
          literal_content: None,
          precedence_token: None,
        });
        Some(SymbolId::Terminal(id))
      }
    };
    legacy_to_symbol.push(handle);
  }

  let symbol_of = |index: u32| -> Result<SymbolId, FarkleError> {
    legacy_to_symbol
      .get(index as usize)
      .copied()
      .flatten()
      .ok_or_else(|| FarkleError::UnsupportedFormat { detail: format!("symbol {index} has no current-model handle") })
  };
  let terminal_of = |index: u32| -> Result<TerminalId, FarkleError> {
    match symbol_of(index)? {
      SymbolId::Terminal(t) => Ok(t),
      SymbolId::Nonterminal(_) => Err(FarkleError::UnsupportedFormat { detail: format!("symbol {index} is not a terminal") }),
    }
  };

  // Build productions grouped by head, so the table matches this crate's
  // contiguous-per-head invariant (`spec.md` §3), and remember how each
  // legacy rule index maps to its new production id for the LALR import.
  let mut by_head: Vec<Vec<(u32, Vec<u32>)>> = vec![Vec::new(); nonterminals.len()];
  for (index, head, body) in &rules {
    let SymbolId::Nonterminal(head_id) = symbol_of(*head)? else {
      return Err(FarkleError::UnsupportedFormat { detail: "rule head is not a nonterminal".into() });
    };
    by_head[head_id.index()].push((*index, body.clone()));
  }

  let mut productions: Vec<Production> = Vec::with_capacity(rules.len());
  let mut rule_remap = vec![ProductionId(0); rules.len()];
  for (nt_index, nt_rules) in by_head.iter().enumerate() {
    let start = productions.len() as u32;
    for (legacy_index, body) in nt_rules {
      let new_id = ProductionId(productions.len() as u32);
      rule_remap[*legacy_index as usize] = new_id;
      let body = body
        .iter()
        .map(|&sym| Ok(BodyElement { symbol: symbol_of(sym)?, significant: true }))
        .collect::<Result<Vec<_>, FarkleError>>()?;
      productions.push(Production { id: new_id, head: NonterminalId(nt_index as u32), body, precedence_token: None });
    }
    let nt = &mut nonterminals[nt_index];
    nt.productions = (start..productions.len() as u32).map(ProductionId).collect();
    nt.state = if nt_rules.is_empty() { ProductionSetState::Unset } else { ProductionSetState::Set };
  }

  // Groups: validate that every group's ending symbol is either
  // GroupEnd-kind or the group ends on end-of-line (`spec.md` §6).
  let mut groups = Vec::with_capacity(raw_groups.len());
  for (index, raw) in raw_groups.iter().enumerate() {
    let container = terminal_of(raw.container_symbol)?;
    let start = terminal_of(raw.start_symbol)?;
    let end = match raw.end_symbol {
      Some(end_symbol) => {
        let end_terminal = terminal_of(end_symbol)?;
        let kind = symbols[end_symbol as usize].kind;
        if kind != LegacySymbolKind::GroupEnd {
          return Err(FarkleError::UnsupportedFormat {
            detail: format!("group {index}'s ending symbol is neither group-end nor end-of-line"),
          });
        }
        GroupEnd::Token(end_terminal)
      }
      None => GroupEnd::EndOfLine,
    };
    groups.push(Group {
      id: GroupId(index as u32),
      start,
      end,
      container,
      flags: raw.flags,
      allowed_nesting: raw.nesting.iter().map(|&g| GroupId(g)).collect::<BTreeSet<_>>(),
    });
  }

  // DFA.
  let dfa_states: Vec<DfaState> = dfa_states
    .into_iter()
    .enumerate()
    .map(|(i, s)| s.ok_or_else(|| FarkleError::UnsupportedFormat { detail: format!("DFA state {i} was never defined") }))
    .collect::<Result<_, _>>()?;
  let dfa_start = dfa_start.ok_or_else(|| FarkleError::UnsupportedFormat { detail: "missing initial DFA state".into() })?;
  let dfa = CompiledDfa { start_state: DfaStateId(dfa_start), states: dfa_states };

  // LALR.
  let mut lr_states = Vec::with_capacity(lalr_states.len());
  for (i, state) in lalr_states.into_iter().enumerate() {
    let raw_actions =
      state.ok_or_else(|| FarkleError::UnsupportedFormat { detail: format!("LALR state {i} was never defined") })?;
    let mut row = LrStateRow::default();
    for (symbol_index, kind, target) in raw_actions {
      match (legacy_to_symbol.get(symbol_index as usize).copied().flatten(), kind) {
        (Some(SymbolId::Terminal(t)), 0) => {
          row.actions.insert(t, LrAction::Shift(LrStateId(target)));
        }
        (Some(SymbolId::Terminal(t)), 1) => {
          row.actions.insert(t, LrAction::Reduce(rule_remap[target as usize]));
        }
        (Some(SymbolId::Nonterminal(n)), 3) => {
          row.gotos.insert(n, LrStateId(target));
        }
        (None, 1) => row.eof_action = Some(EofAction::Reduce(rule_remap[target as usize])),
        (None, 2) => row.eof_action = Some(EofAction::Accept),
        _ => return Err(FarkleError::UnsupportedFormat { detail: format!("malformed LALR action in state {i}") }),
      }
    }
    lr_states.push(row);
  }
  let lalr_start = lalr_start.ok_or_else(|| FarkleError::UnsupportedFormat { detail: "missing initial LALR state".into() })?;
  let lr = CompiledLr { start_state: LrStateId(lalr_start), states: lr_states };

  let start = nonterminals
    .first()
    .map(|n| n.id)
    .ok_or_else(|| FarkleError::UnsupportedFormat { detail: "legacy grammar has no nonterminals".into() })?;
  let (reachable_nonterminals, reachable_terminals) = reachable_from(&nonterminals, &productions, start);

  let definition = GrammarDefinition {
    terminals,
    nonterminals,
    productions,
    groups,
    operator_scope: OperatorScope::default(),
    start,
    grammar_name: None,
    case_sensitive: true,
    auto_whitespace: false,
    reachable_terminals,
    reachable_nonterminals,
  };

  Ok(LegacyGrammar { definition, dfa, lr })
}

fn char_from_legacy(v: u32) -> Result<char, FarkleError> {
  char::from_u32(v).ok_or_else(|| FarkleError::UnsupportedFormat { detail: "invalid character in legacy charset".into() })
}

/// BFS from `start` over the production graph, same traversal the builder
/// runs during analysis, since a legacy grammar needs its reachable sets
/// computed too rather than assumed to cover every imported symbol.
fn reachable_from(
  nonterminals: &[Nonterminal],
  productions: &[Production],
  start: NonterminalId,
) -> (Vec<NonterminalId>, Vec<TerminalId>) {
  let mut seen_nt = BTreeSet::new();
  let mut seen_t = BTreeSet::new();
  let mut queue = std::collections::VecDeque::new();
  queue.push_back(start);
  seen_nt.insert(start);

  while let Some(nt_id) = queue.pop_front() {
    let Some(nt) = nonterminals.get(nt_id.index()) else { continue };
    for &pid in &nt.productions {
      let Some(production) = productions.get(pid.index()) else { continue };
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

  (seen_nt.into_iter().collect(), seen_t.into_iter().collect())
}
