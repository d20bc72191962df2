//! Binary encoding of a [`GrammarDefinition`] plus its optional compiled
//! automata (`spec.md` §4.6): header, stream index, string/blob heaps, a
//! table stream, and optional DFA/LR streams.

use crate::builder::GrammarDefinition;
use crate::types::{
  Associativity, AssociativityGroup, BodyElement, CharRanges, CompiledDfa, CompiledLr, DfaState, DfaStateId,
  EofAction, FarkleError, Group, GroupEnd, GroupFlags, GroupId, LrAction, LrStateId, LrStateRow, Nonterminal,
  NonterminalId, OperatorScope, PrecedenceToken, Production, ProductionId, ProductionSetState, RegexAst,
  SymbolId, Terminal, TerminalAttributes, TerminalId,
};

use super::heap::{self, BlobHeapBuilder, StringHeapBuilder, NONE_HANDLE};

pub const MAGIC: &[u8; 8] = b"FRKLGRMR";
pub const VERSION_MAJOR: u16 = 1;
pub const VERSION_MINOR: u16 = 0;

const STREAM_STRINGS: u32 = 1;
const STREAM_BLOBS: u32 = 2;
const STREAM_TABLES: u32 = 3;
const STREAM_DFA: u32 = 4;
const STREAM_LR: u32 = 5;

/// Width, in bytes, of an index field that references a row of some table.
/// Chosen per table based on that table's row count (`spec.md` §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexWidth {
  U16,
  U32,
}

impl IndexWidth {
  fn for_row_count(count: usize) -> Self {
    if count <= u16::MAX as usize {
      IndexWidth::U16
    } else {
      IndexWidth::U32
    }
  }

  fn bytes(self) -> usize {
    match self {
      IndexWidth::U16 => 2,
      IndexWidth::U32 => 4,
    }
  }
}

#[derive(Default)]
struct ByteWriter {
  buf: Vec<u8>,
}

impl ByteWriter {
  fn u8(&mut self, v: u8) {
    self.buf.push(v);
  }

  fn u16(&mut self, v: u16) {
    self.buf.extend_from_slice(&v.to_le_bytes());
  }

  fn u32(&mut self, v: u32) {
    self.buf.extend_from_slice(&v.to_le_bytes());
  }

  fn idx(&mut self, v: u32, width: IndexWidth) {
    match width {
      IndexWidth::U16 => self.u16(v as u16),
      IndexWidth::U32 => self.u32(v),
    }
  }

  fn bytes(&mut self, b: &[u8]) {
    self.buf.extend_from_slice(b);
  }

  fn len(&self) -> usize {
    self.buf.len()
  }
}

struct ByteReader<'a> {
  bytes: &'a [u8],
  pos: usize,
}

impl<'a> ByteReader<'a> {
  fn new(bytes: &'a [u8]) -> Self {
    ByteReader { bytes, pos: 0 }
  }

  fn take(&mut self, n: usize) -> Result<&'a [u8], FarkleError> {
    let slice = self
      .bytes
      .get(self.pos..self.pos + n)
      .ok_or_else(|| FarkleError::UnsupportedFormat { detail: "truncated artifact stream".into() })?;
    self.pos += n;
    Ok(slice)
  }

  fn u8(&mut self) -> Result<u8, FarkleError> {
    Ok(self.take(1)?[0])
  }

  fn u16(&mut self) -> Result<u16, FarkleError> {
    Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
  }

  fn u32(&mut self) -> Result<u32, FarkleError> {
    Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
  }

  fn idx(&mut self, width: IndexWidth) -> Result<u32, FarkleError> {
    match width {
      IndexWidth::U16 => self.u16().map(u32::from),
      IndexWidth::U32 => self.u32(),
    }
  }

  fn remaining(&self) -> usize {
    self.bytes.len() - self.pos
  }
}

/// Decoded form of an encoded [`super::GrammarArtifact`]: the grammar plus
/// whichever compiled automata were present in the streams that were read.
pub struct DecodedArtifact {
  pub grammar: GrammarDefinition,
  pub dfa: Option<CompiledDfa>,
  pub lr: Option<CompiledLr>,
  /// Set when the stream index named a stream this version does not
  /// recognize (`spec.md` §4.6 forward-compatibility rule).
  pub has_unknown_data: bool,
}

pub fn encode(def: &GrammarDefinition, dfa: Option<&CompiledDfa>, lr: Option<&CompiledLr>) -> Vec<u8> {
  let mut strings = StringHeapBuilder::new();
  let mut blobs = BlobHeapBuilder::new();
  let tables = encode_tables(def, &mut strings, &mut blobs);
  let string_bytes = strings.into_bytes();
  let blob_bytes = blobs.into_bytes();
  let dfa_bytes = dfa.map(encode_dfa);
  let lr_bytes = lr.map(|lr| encode_lr(lr, def));

  let mut streams: Vec<(u32, Vec<u8>)> = vec![
    (STREAM_STRINGS, string_bytes),
    (STREAM_BLOBS, blob_bytes),
    (STREAM_TABLES, tables),
  ];
  if let Some(b) = dfa_bytes {
    streams.push((STREAM_DFA, b));
  }
  if let Some(b) = lr_bytes {
    streams.push((STREAM_LR, b));
  }

  let mut w = ByteWriter::default();
  w.bytes(MAGIC);
  w.u16(VERSION_MAJOR);
  w.u16(VERSION_MINOR);
  w.u32(streams.len() as u32);

  let index_start = w.len();
  // 12 bytes per stream-index entry: id, offset, length.
  for _ in &streams {
    w.u32(0);
    w.u32(0);
    w.u32(0);
  }

  let mut offsets = Vec::with_capacity(streams.len());
  for (_, data) in &streams {
    offsets.push((w.len(), data.len()));
    w.bytes(data);
  }

  for (i, (id, _)) in streams.iter().enumerate() {
    let (offset, length) = offsets[i];
    let entry_pos = index_start + i * 12;
    w.buf[entry_pos..entry_pos + 4].copy_from_slice(&id.to_le_bytes());
    w.buf[entry_pos + 4..entry_pos + 8].copy_from_slice(&(offset as u32).to_le_bytes());
    w.buf[entry_pos + 8..entry_pos + 12].copy_from_slice(&(length as u32).to_le_bytes());
  }

  w.buf
}

pub fn decode(bytes: &[u8]) -> Result<DecodedArtifact, FarkleError> {
  let mut r = ByteReader::new(bytes);
  let magic = r.take(8)?;
  if magic != MAGIC {
    return Err(FarkleError::UnsupportedFormat { detail: "bad magic number".into() });
  }
  let major = r.u16()?;
  let _minor = r.u16()?;
  if major != VERSION_MAJOR {
    return Err(FarkleError::UnsupportedFormat { detail: format!("unsupported major version {major}") });
  }
  let stream_count = r.u32()?;

  let mut strings: Option<&[u8]> = None;
  let mut blobs: Option<&[u8]> = None;
  let mut tables: Option<&[u8]> = None;
  let mut dfa_bytes: Option<&[u8]> = None;
  let mut lr_bytes: Option<&[u8]> = None;
  let mut has_unknown_data = false;

  for _ in 0..stream_count {
    let id = r.u32()?;
    let offset = r.u32()? as usize;
    let length = r.u32()? as usize;
    let data = bytes
      .get(offset..offset + length)
      .ok_or_else(|| FarkleError::UnsupportedFormat { detail: "stream index out of bounds".into() })?;
    match id {
      STREAM_STRINGS => strings = Some(data),
      STREAM_BLOBS => blobs = Some(data),
      STREAM_TABLES => tables = Some(data),
      STREAM_DFA => dfa_bytes = Some(data),
      STREAM_LR => lr_bytes = Some(data),
      _ => has_unknown_data = true,
    }
  }

  let strings = strings.ok_or_else(|| FarkleError::UnsupportedFormat { detail: "missing string heap".into() })?;
  let blobs = blobs.ok_or_else(|| FarkleError::UnsupportedFormat { detail: "missing blob heap".into() })?;
  let tables = tables.ok_or_else(|| FarkleError::UnsupportedFormat { detail: "missing table stream".into() })?;

  let grammar = decode_tables(tables, strings, blobs)?;
  let dfa = dfa_bytes.map(decode_dfa).transpose()?;
  let lr = lr_bytes.map(|b| decode_lr(b, &grammar)).transpose()?;

  Ok(DecodedArtifact { grammar, dfa, lr, has_unknown_data })
}

// ---- table stream ----------------------------------------------------

fn encode_tables(def: &GrammarDefinition, strings: &mut StringHeapBuilder, blobs: &mut BlobHeapBuilder) -> Vec<u8> {
  let term_w = IndexWidth::for_row_count(def.terminals.len());
  let nonterm_w = IndexWidth::for_row_count(def.nonterminals.len());
  let prod_w = IndexWidth::for_row_count(def.productions.len());
  let group_w = IndexWidth::for_row_count(def.groups.len());

  let mut w = ByteWriter::default();
  w.u32(def.terminals.len() as u32);
  w.u32(def.nonterminals.len() as u32);
  w.u32(def.productions.len() as u32);
  w.u32(def.groups.len() as u32);
  w.u32(def.start.0);
  w.u32(strings.intern_opt(def.grammar_name.as_deref()));
  w.u8(def.case_sensitive as u8);
  w.u8(def.auto_whitespace as u8);

  // Terminals.
  for t in &def.terminals {
    w.u32(strings.intern(&t.name));
    w.u32(strings.intern_opt(t.display_override.as_deref()));
    w.u32(strings.intern_opt(t.literal_content.as_deref()));
    w.u8(u8::from(t.attributes));
    match t.precedence_token {
      Some(tok) => w.u32(tok.0),
      None => w.u32(NONE_HANDLE),
    }
    match &t.regex {
      Some(regex) => {
        let mut rw = ByteWriter::default();
        encode_regex(&mut rw, regex);
        w.u32(blobs.push(&rw.buf));
      }
      None => w.u32(NONE_HANDLE),
    }
  }

  // Nonterminals: productions form a contiguous range by construction
  // (`canonicalize_production_order`), so each row stores start + count.
  for n in &def.nonterminals {
    w.u32(strings.intern(&n.name));
    w.u32(strings.intern_opt(n.display_override.as_deref()));
    let start = n.productions.first().map(|p| p.0).unwrap_or(0);
    w.idx(start, prod_w);
    w.u32(n.productions.len() as u32);
    w.u8(matches!(n.state, ProductionSetState::Set) as u8);
  }

  // Productions.
  for p in &def.productions {
    w.idx(p.head.0, nonterm_w);
    match p.precedence_token {
      Some(tok) => w.u32(tok.0),
      None => w.u32(NONE_HANDLE),
    }
    let mut bw = ByteWriter::default();
    bw.u32(p.body.len() as u32);
    for elem in &p.body {
      match elem.symbol {
        SymbolId::Terminal(t) => {
          bw.u8(0);
          bw.u32(t.0);
        }
        SymbolId::Nonterminal(n) => {
          bw.u8(1);
          bw.u32(n.0);
        }
      }
      bw.u8(elem.significant as u8);
    }
    w.u32(blobs.push(&bw.buf));
  }

  // Groups.
  for g in &def.groups {
    w.idx(g.start.0, term_w);
    match g.end {
      GroupEnd::Token(t) => {
        w.u8(0);
        w.idx(t.0, term_w);
      }
      GroupEnd::EndOfLine => {
        w.u8(1);
        w.idx(0, term_w);
      }
    }
    w.idx(g.container.0, term_w);
    w.u8(u8::from(g.flags));
    w.u32(g.allowed_nesting.len() as u32);
    for nested in &g.allowed_nesting {
      w.idx(nested.0, group_w);
    }
  }

  // Operator scope.
  w.u32(def.operator_scope.groups.len() as u32);
  for group in &def.operator_scope.groups {
    w.u8(match group.associativity {
      Associativity::Left => 0,
      Associativity::Right => 1,
      Associativity::NonAssoc => 2,
    });
    w.u32(group.tokens.len() as u32);
    for tok in &group.tokens {
      w.u32(tok.0);
    }
  }
  w.u8(def.operator_scope.resolve_reduce_reduce as u8);

  w.buf
}

fn decode_tables(tables: &[u8], strings: &[u8], blobs: &[u8]) -> Result<GrammarDefinition, FarkleError> {
  let mut r = ByteReader::new(tables);
  let terminal_count = r.u32()? as usize;
  let nonterminal_count = r.u32()? as usize;
  let production_count = r.u32()? as usize;
  let group_count = r.u32()? as usize;
  let start = NonterminalId(r.u32()?);
  let grammar_name = heap::string_at_opt(strings, r.u32()?)?;
  let case_sensitive = r.u8()? != 0;
  let auto_whitespace = r.u8()? != 0;

  let term_w = IndexWidth::for_row_count(terminal_count);
  let nonterm_w = IndexWidth::for_row_count(nonterminal_count);
  let prod_w = IndexWidth::for_row_count(production_count);
  let group_w = IndexWidth::for_row_count(group_count);

  let mut terminals = Vec::with_capacity(terminal_count);
  for i in 0..terminal_count {
    let name = heap::string_at(strings, r.u32()?)?;
    let display_override = heap::string_at_opt(strings, r.u32()?)?;
    let literal_content = heap::string_at_opt(strings, r.u32()?)?;
    let attributes = TerminalAttributes::from(r.u8()?);
    let precedence_raw = r.u32()?;
    let precedence_token = if precedence_raw == NONE_HANDLE { None } else { Some(PrecedenceToken(precedence_raw)) };
    let regex_handle = r.u32()?;
    let regex = if regex_handle == NONE_HANDLE {
      None
    } else {
      let blob = heap::blob_at(blobs, regex_handle)?;
      Some(decode_regex(&mut ByteReader::new(blob))?)
    };
    terminals.push(Terminal {
      id: TerminalId(i as u32),
      name,
      attributes,
      regex,
      display_override,
      literal_content,
      precedence_token,
    });
  }

  let mut nonterminals = Vec::with_capacity(nonterminal_count);
  for i in 0..nonterminal_count {
    let name = heap::string_at(strings, r.u32()?)?;
    let display_override = heap::string_at_opt(strings, r.u32()?)?;
    let prod_start = r.idx(prod_w)?;
    let prod_count = r.u32()?;
    let is_set = r.u8()? != 0;
    nonterminals.push(Nonterminal {
      id: NonterminalId(i as u32),
      name,
      display_override,
      productions: (prod_start..prod_start + prod_count).map(ProductionId).collect(),
      state: if is_set { ProductionSetState::Set } else { ProductionSetState::Unset },
    });
  }

  let mut productions = Vec::with_capacity(production_count);
  for i in 0..production_count {
    let head = NonterminalId(r.idx(nonterm_w)?);
    let precedence_raw = r.u32()?;
    let precedence_token = if precedence_raw == NONE_HANDLE { None } else { Some(PrecedenceToken(precedence_raw)) };
    let body_handle = r.u32()?;
    let body_blob = heap::blob_at(blobs, body_handle)?;
    let mut br = ByteReader::new(body_blob);
    let elem_count = br.u32()?;
    let mut body = Vec::with_capacity(elem_count as usize);
    for _ in 0..elem_count {
      let kind = br.u8()?;
      let raw = br.u32()?;
      let symbol = if kind == 0 { SymbolId::Terminal(TerminalId(raw)) } else { SymbolId::Nonterminal(NonterminalId(raw)) };
      let significant = br.u8()? != 0;
      body.push(BodyElement { symbol, significant });
    }
    productions.push(Production { id: ProductionId(i as u32), head, body, precedence_token });
  }

  let mut groups = Vec::with_capacity(group_count);
  for i in 0..group_count {
    let start_term = TerminalId(r.idx(term_w)?);
    let end_kind = r.u8()?;
    let end_token = TerminalId(r.idx(term_w)?);
    let end = if end_kind == 0 { GroupEnd::Token(end_token) } else { GroupEnd::EndOfLine };
    let container = TerminalId(r.idx(term_w)?);
    let flags = GroupFlags::from(r.u8()?);
    let nesting_count = r.u32()?;
    let mut allowed_nesting = std::collections::BTreeSet::new();
    for _ in 0..nesting_count {
      allowed_nesting.insert(GroupId(r.idx(group_w)?));
    }
    groups.push(Group { id: GroupId(i as u32), start: start_term, end, container, flags, allowed_nesting });
  }

  let op_group_count = r.u32()?;
  let mut op_groups = Vec::with_capacity(op_group_count as usize);
  for _ in 0..op_group_count {
    let associativity = match r.u8()? {
      0 => Associativity::Left,
      1 => Associativity::Right,
      _ => Associativity::NonAssoc,
    };
    let token_count = r.u32()?;
    let tokens = (0..token_count).map(|_| Ok(PrecedenceToken(r.u32()?))).collect::<Result<_, FarkleError>>()?;
    op_groups.push(AssociativityGroup { associativity, tokens });
  }
  let resolve_reduce_reduce = r.u8()? != 0;
  let operator_scope = OperatorScope { groups: op_groups, resolve_reduce_reduce };

  let (reachable_nonterminals, reachable_terminals) = reachability(&nonterminals, &productions, start);

  Ok(GrammarDefinition {
    terminals,
    nonterminals,
    productions,
    groups,
    operator_scope,
    start,
    grammar_name,
    case_sensitive,
    auto_whitespace,
    reachable_terminals,
    reachable_nonterminals,
  })
}

/// Recomputes reachability from `start`, mirroring the builder's analysis
/// pass (`spec.md` §4.1 step 1) so a decoded artifact reports the same
/// reachable sets a fresh `analyze()` would have, rather than persisting
/// them as a separate (and possibly stale) stream.
fn reachability(
  nonterminals: &[Nonterminal],
  productions: &[Production],
  start: NonterminalId,
) -> (Vec<NonterminalId>, Vec<TerminalId>) {
  use std::collections::{BTreeSet, VecDeque};

  let mut seen_nt = BTreeSet::new();
  let mut seen_t = BTreeSet::new();
  let mut queue = VecDeque::new();
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

// ---- regex AST blob ----------------------------------------------------

fn encode_regex(w: &mut ByteWriter, regex: &RegexAst) {
  match regex {
    RegexAst::Any => w.u8(0),
    RegexAst::Chars(ranges) => {
      w.u8(1);
      encode_ranges(w, ranges);
    }
    RegexAst::AllButChars(ranges) => {
      w.u8(2);
      encode_ranges(w, ranges);
    }
    RegexAst::Concat(parts) => {
      w.u8(3);
      w.u32(parts.len() as u32);
      for p in parts {
        encode_regex(w, p);
      }
    }
    RegexAst::Alt(parts) => {
      w.u8(4);
      w.u32(parts.len() as u32);
      for p in parts {
        encode_regex(w, p);
      }
    }
    RegexAst::Loop { inner, min, max } => {
      w.u8(5);
      w.u32(*min as u32);
      match max {
        Some(m) => {
          w.u8(1);
          w.u32(*m as u32);
        }
        None => w.u8(0),
      }
      encode_regex(w, inner);
    }
    RegexAst::StringPattern(s) => {
      w.u8(6);
      w.u32(s.len() as u32);
      w.bytes(s.as_bytes());
    }
  }
}

fn encode_ranges(w: &mut ByteWriter, ranges: &CharRanges) {
  w.u32(ranges.ranges().len() as u32);
  for &(lo, hi) in ranges.ranges() {
    w.u32(lo as u32);
    w.u32(hi as u32);
  }
}

fn decode_regex(r: &mut ByteReader) -> Result<RegexAst, FarkleError> {
  match r.u8()? {
    0 => Ok(RegexAst::Any),
    1 => Ok(RegexAst::Chars(decode_ranges(r)?)),
    2 => Ok(RegexAst::AllButChars(decode_ranges(r)?)),
    3 => {
      let count = r.u32()?;
      let parts = (0..count).map(|_| decode_regex(r)).collect::<Result<_, _>>()?;
      Ok(RegexAst::Concat(parts))
    }
    4 => {
      let count = r.u32()?;
      let parts = (0..count).map(|_| decode_regex(r)).collect::<Result<_, _>>()?;
      Ok(RegexAst::Alt(parts))
    }
    5 => {
      let min = r.u32()? as usize;
      let max = if r.u8()? != 0 { Some(r.u32()? as usize) } else { None };
      let inner = Box::new(decode_regex(r)?);
      Ok(RegexAst::Loop { inner, min, max })
    }
    6 => {
      let len = r.u32()? as usize;
      let bytes = r.take(len)?;
      Ok(RegexAst::StringPattern(
        String::from_utf8(bytes.to_vec()).map_err(|e| FarkleError::UnsupportedFormat { detail: e.to_string() })?,
      ))
    }
    tag => Err(FarkleError::UnsupportedFormat { detail: format!("unknown regex AST tag {tag}") }),
  }
}

fn decode_ranges(r: &mut ByteReader) -> Result<CharRanges, FarkleError> {
  let count = r.u32()?;
  let mut ranges = Vec::with_capacity(count as usize);
  for _ in 0..count {
    let lo = r.u32()?;
    let hi = r.u32()?;
    let lo = char::from_u32(lo).ok_or_else(|| FarkleError::UnsupportedFormat { detail: "invalid char range".into() })?;
    let hi = char::from_u32(hi).ok_or_else(|| FarkleError::UnsupportedFormat { detail: "invalid char range".into() })?;
    ranges.push((lo, hi));
  }
  Ok(CharRanges::from_ranges(ranges))
}

// ---- DFA stream ---------------------------------------------------------

fn encode_dfa(dfa: &CompiledDfa) -> Vec<u8> {
  let state_w = IndexWidth::for_row_count(dfa.states.len());
  let mut w = ByteWriter::default();
  w.u32(dfa.states.len() as u32);
  w.idx(dfa.start_state.0, state_w);
  for state in &dfa.states {
    w.u32(state.edges.len() as u32);
    for &(lo, hi, target) in &state.edges {
      w.u32(lo as u32);
      w.u32(hi as u32);
      w.idx(target.0, state_w);
    }
    match state.accept {
      Some(t) => w.u32(t.0),
      None => w.u32(NONE_HANDLE),
    }
    match state.default {
      Some(d) => w.idx(d.0, state_w),
      None => w.idx(NONE_HANDLE, state_w),
    }
  }
  w.buf
}

fn decode_dfa(bytes: &[u8]) -> Result<CompiledDfa, FarkleError> {
  let mut r = ByteReader::new(bytes);
  let state_count = r.u32()? as usize;
  let state_w = IndexWidth::for_row_count(state_count);
  let start_state = DfaStateId(r.idx(state_w)?);
  let mut states = Vec::with_capacity(state_count);
  for _ in 0..state_count {
    let edge_count = r.u32()?;
    let mut edges = Vec::with_capacity(edge_count as usize);
    for _ in 0..edge_count {
      let lo = char_from_u32(r.u32()?)?;
      let hi = char_from_u32(r.u32()?)?;
      let target = DfaStateId(r.idx(state_w)?);
      edges.push((lo, hi, target));
    }
    let accept_raw = r.u32()?;
    let accept = if accept_raw == NONE_HANDLE { None } else { Some(TerminalId(accept_raw)) };
    let default_raw = r.idx(state_w)?;
    let default = if default_raw == NONE_HANDLE { None } else { Some(DfaStateId(default_raw)) };
    states.push(DfaState { edges, accept, default });
  }
  Ok(CompiledDfa { start_state, states })
}

fn char_from_u32(v: u32) -> Result<char, FarkleError> {
  char::from_u32(v).ok_or_else(|| FarkleError::UnsupportedFormat { detail: "invalid char in DFA stream".into() })
}

// ---- LR stream -----------------------------------------------------------

fn encode_lr(lr: &CompiledLr, def: &GrammarDefinition) -> Vec<u8> {
  let state_w = IndexWidth::for_row_count(lr.states.len());
  let mut w = ByteWriter::default();
  w.u32(lr.states.len() as u32);
  w.u32(def.terminals.len() as u32);
  w.u32(def.nonterminals.len() as u32);
  w.idx(lr.start_state.0, state_w);
  for row in &lr.states {
    w.u32(row.actions.len() as u32);
    for (&term, action) in &row.actions {
      w.u32(term.0);
      match action {
        LrAction::Shift(s) => {
          w.u8(0);
          w.idx(s.0, state_w);
        }
        LrAction::Reduce(p) => {
          w.u8(1);
          w.u32(p.0);
        }
        LrAction::Error => w.u8(2),
      }
    }
    w.u32(row.gotos.len() as u32);
    for (&nt, &target) in &row.gotos {
      w.u32(nt.0);
      w.idx(target.0, state_w);
    }
    match row.eof_action {
      Some(EofAction::Reduce(p)) => {
        w.u8(0);
        w.u32(p.0);
      }
      Some(EofAction::Accept) => w.u8(1),
      None => w.u8(2),
    }
  }
  w.buf
}

fn decode_lr(bytes: &[u8], _def: &GrammarDefinition) -> Result<CompiledLr, FarkleError> {
  let mut r = ByteReader::new(bytes);
  let state_count = r.u32()? as usize;
  let state_w = IndexWidth::for_row_count(state_count);
  let _terminal_count = r.u32()?;
  let _nonterminal_count = r.u32()?;
  let start_state = LrStateId(r.idx(state_w)?);
  let mut states = Vec::with_capacity(state_count);
  for _ in 0..state_count {
    let action_count = r.u32()?;
    let mut actions = std::collections::BTreeMap::new();
    for _ in 0..action_count {
      let term = TerminalId(r.u32()?);
      let action = match r.u8()? {
        0 => LrAction::Shift(LrStateId(r.idx(state_w)?)),
        1 => LrAction::Reduce(ProductionId(r.u32()?)),
        _ => LrAction::Error,
      };
      actions.insert(term, action);
    }
    let goto_count = r.u32()?;
    let mut gotos = std::collections::BTreeMap::new();
    for _ in 0..goto_count {
      let nt = NonterminalId(r.u32()?);
      let target = LrStateId(r.idx(state_w)?);
      gotos.insert(nt, target);
    }
    let eof_action = match r.u8()? {
      0 => Some(EofAction::Reduce(ProductionId(r.u32()?))),
      1 => Some(EofAction::Accept),
      _ => None,
    };
    states.push(LrStateRow { actions, gotos, eof_action });
  }
  let _ = r.remaining();
  Ok(CompiledLr { start_state, states })
}
