//! The DFA-driven tokenizer (`spec.md` §4.7), grounded on the cursor and
//! line/column bookkeeping of `sherpa-rust-rt/types/parse_context.rs`,
//! reshaped from a C-ABI-friendly struct into a safe, table-driven
//! longest-match loop over a [`CompiledDfa`].

use std::collections::HashMap;

use farkle_core::builder::GrammarDefinition;
use farkle_core::types::{CompiledDfa, FarkleError, GroupEnd, GroupId, Position, TerminalAttributes, TerminalId};

/// A lexed token: the recognised terminal, its matched text, and the
/// (1-based) position of its first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
  pub terminal: TerminalId,
  pub text: &'a str,
  pub position: Position,
}

struct GroupFrame {
  group: GroupId,
  start_position: Position,
  start_byte: usize,
}

/// The result of one [`Tokenizer::run_dfa`] scan.
struct DfaScan {
  accept: Option<(TerminalId, usize)>,
  dead_end: usize,
}

/// Drives a [`CompiledDfa`] over an input string, tracking line/column
/// position and the group-nesting stack (`spec.md` §4.7, §4.9).
pub struct Tokenizer<'a> {
  grammar: &'a GrammarDefinition,
  dfa: &'a CompiledDfa,
  input: &'a str,
  chars: Vec<(usize, char)>,
  index: usize,
  line: u32,
  column: u32,
  last_was_cr: bool,
  group_stack: Vec<GroupFrame>,
  groups_by_start: HashMap<TerminalId, GroupId>,
  newline_terminal: Option<TerminalId>,
}

impl<'a> Tokenizer<'a> {
  pub fn new(grammar: &'a GrammarDefinition, dfa: &'a CompiledDfa, input: &'a str) -> Self {
    let groups_by_start = grammar.groups.iter().map(|g| (g.start, g.id)).collect();
    let newline_terminal = grammar.terminals.iter().find(|t| t.attributes.contains(TerminalAttributes::Newline)).map(|t| t.id);
    Tokenizer {
      grammar,
      dfa,
      input,
      chars: input.char_indices().collect(),
      index: 0,
      line: 1,
      column: 1,
      last_was_cr: false,
      group_stack: Vec::new(),
      groups_by_start,
      newline_terminal,
    }
  }

  pub fn position(&self) -> Position {
    Position { line: self.line, column: self.column, offset: self.byte_offset_at(self.index) as u32 }
  }

  fn byte_offset_at(&self, index: usize) -> usize {
    self.chars.get(index).map(|&(b, _)| b).unwrap_or(self.input.len())
  }

  /// The line/column/offset of `target_index`, an unconsumed index at or
  /// after the cursor — replays the same advance logic as [`Self::advance_one`]
  /// without mutating the cursor, so a failed scan can report exactly
  /// where it broke down rather than where it started (`spec.md` §8
  /// scenario 5).
  fn position_at(&self, target_index: usize) -> Position {
    let mut line = self.line;
    let mut column = self.column;
    let mut last_was_cr = self.last_was_cr;
    for &(_, ch) in &self.chars[self.index..target_index] {
      match ch {
        '\n' => {
          if !last_was_cr {
            line += 1;
            column = 1;
          }
          last_was_cr = false;
        }
        '\r' => {
          line += 1;
          column = 1;
          last_was_cr = true;
        }
        _ => {
          column += 1;
          last_was_cr = false;
        }
      }
    }
    Position { line, column, offset: self.byte_offset_at(target_index) as u32 }
  }

  fn advance_one(&mut self) {
    let (_, ch) = self.chars[self.index];
    self.index += 1;
    match ch {
      '\n' => {
        if !self.last_was_cr {
          self.line += 1;
          self.column = 1;
        }
        self.last_was_cr = false;
      }
      '\r' => {
        self.line += 1;
        self.column = 1;
        self.last_was_cr = true;
      }
      _ => {
        self.column += 1;
        self.last_was_cr = false;
      }
    }
  }

  fn advance_chars(&mut self, count: usize) {
    for _ in 0..count {
      self.advance_one();
    }
  }

  /// Skips runs of `char::is_whitespace()` between tokens when
  /// `auto_whitespace` is set. When a `newline` terminal is declared, `\n`
  /// and `\r` are left for the DFA to match as that terminal instead of
  /// being silently consumed here (`spec.md` §9: "`newline` is always
  /// significant when declared").
  fn skip_raw_whitespace(&mut self) {
    while let Some(&(_, ch)) = self.chars.get(self.index) {
      let is_declared_newline = self.newline_terminal.is_some() && (ch == '\n' || ch == '\r');
      if ch.is_whitespace() && !is_declared_newline {
        self.advance_one();
      } else {
        break;
      }
    }
  }

  /// Longest-match scan from `start_index`: the DFA runs until it dead-ends,
  /// remembering the most recent accept state (`spec.md` §4.7 step 2).
  /// `dead_end` is the index the scan could not get past — the start of a
  /// wholly-unrecognised token, or the character where a longer match
  /// broke down — so a caller with no `accept` at all can still report the
  /// precise point of failure rather than the scan's starting point.
  fn run_dfa(&self, start_index: usize) -> DfaScan {
    let mut state = self.dfa.start_state;
    let mut index = start_index;
    let mut last_accept = None;
    loop {
      if let Some(terminal) = self.dfa.state(state).accept {
        last_accept = Some((terminal, index));
      }
      let Some(&(_, ch)) = self.chars.get(index) else { break };
      match self.dfa.state(state).transition(ch) {
        Some(next) => {
          state = next;
          index += 1;
        }
        None => break,
      }
    }
    DfaScan { accept: last_accept, dead_end: index }
  }

  fn emit(&mut self, terminal: TerminalId, start_index: usize, end_index: usize, position: Position) -> Token<'a> {
    let start_byte = self.byte_offset_at(start_index);
    self.advance_chars(end_index - start_index);
    let end_byte = self.byte_offset_at(self.index);
    Token { terminal, text: &self.input[start_byte..end_byte], position }
  }

  /// Returns the next token, or `None` at end of input. Returns all
  /// matched terminals, including noise ones — those are dropped by the
  /// LR driver, not here (`spec.md` §4.8 step 1).
  pub fn next_token(&mut self) -> Result<Option<Token<'a>>, FarkleError> {
    if !self.group_stack.is_empty() {
      return self.next_group_token();
    }
    if self.grammar.auto_whitespace {
      self.skip_raw_whitespace();
    }
    if self.index >= self.chars.len() {
      return Ok(None);
    }
    let start_index = self.index;
    let position = self.position();
    let scan = self.run_dfa(start_index);
    match scan.accept {
      Some((terminal, end_index)) => {
        let token = self.emit(terminal, start_index, end_index, position);
        if self.grammar.terminal(terminal).attributes.contains(TerminalAttributes::GroupStart) {
          if let Some(&group) = self.groups_by_start.get(&terminal) {
            self.group_stack.push(GroupFrame { group, start_position: position, start_byte: self.byte_offset_at(start_index) });
            return self.next_token();
          }
        }
        Ok(Some(token))
      }
      None => {
        let ch = self.chars.get(scan.dead_end).map(|&(_, c)| c);
        let position = self.position_at(scan.dead_end);
        Err(FarkleError::LexicalError { ch, position })
      }
    }
  }

  fn close_innermost_group(&mut self, end_index: usize, keep_end_token: bool) -> Result<Option<Token<'a>>, FarkleError> {
    let frame = self.group_stack.pop().expect("called with a non-empty group stack");
    let container = self.grammar.group(frame.group).container;
    let content_end_byte = self.byte_offset_at(self.index);
    if end_index > self.index {
      self.advance_chars(end_index - self.index);
    }
    let final_end_byte = if keep_end_token { self.byte_offset_at(self.index) } else { content_end_byte };
    if self.group_stack.is_empty() {
      Ok(Some(Token { terminal: container, text: &self.input[frame.start_byte..final_end_byte], position: frame.start_position }))
    } else {
      self.next_group_token()
    }
  }

  fn handle_group_end_of_input(&mut self) -> Result<Option<Token<'a>>, FarkleError> {
    let frame = match self.group_stack.last() {
      Some(f) => f,
      None => return Ok(None),
    };
    let group = self.grammar.group(frame.group);
    if group.ends_on_end_of_input() {
      let end_index = self.index;
      self.close_innermost_group(end_index, false)
    } else {
      Err(FarkleError::UnterminatedGroup { group: frame.group, start_position: frame.start_position })
    }
  }

  /// Consumes characters while inside one or more open groups
  /// (`spec.md` §4.7 step 4, §4.9 tokenizer state machine). The DFA is
  /// consulted at every position to detect the active group's end
  /// condition or a legally nested group start; everything else is
  /// consumed as raw group content, one character at a time when
  /// `ADVANCE_BY_CHARACTER` is set, or as the longest recognised noise
  /// run otherwise.
  fn next_group_token(&mut self) -> Result<Option<Token<'a>>, FarkleError> {
    loop {
      if self.index >= self.chars.len() {
        return self.handle_group_end_of_input();
      }
      let frame_group = self.group_stack.last().expect("loop guarded by non-empty group_stack").group;
      let group = self.grammar.group(frame_group).clone();

      match group.end {
        GroupEnd::EndOfLine => {
          let (_, ch) = self.chars[self.index];
          if ch == '\n' || ch == '\r' {
            let end_index = self.index;
            return self.close_innermost_group(end_index, false);
          }
        }
        GroupEnd::Token(end_terminal) => {
          if let Some((terminal, end_index)) = self.run_dfa(self.index).accept {
            if terminal == end_terminal {
              return self.close_innermost_group(end_index, group.keep_end_token());
            }
            if self.grammar.terminal(terminal).attributes.contains(TerminalAttributes::GroupStart) {
              if let Some(&nested) = self.groups_by_start.get(&terminal) {
                if group.allowed_nesting.contains(&nested) {
                  let start_byte = self.byte_offset_at(self.index);
                  self.advance_chars(end_index - self.index);
                  self.group_stack.push(GroupFrame { group: nested, start_position: self.position(), start_byte });
                  continue;
                }
              }
            }
          }
        }
      }

      if group.advance_by_character() {
        self.advance_one();
      } else if let Some((terminal, end_index)) = self.run_dfa(self.index).accept {
        if self.grammar.terminal(terminal).attributes.contains(TerminalAttributes::Noise) {
          self.advance_chars(end_index - self.index);
        } else {
          self.advance_one();
        }
      } else {
        self.advance_one();
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use farkle_core::builder::{analyze, BuilderConfig, GrammarBuilder};
  use farkle_core::types::{CharRanges, RegexAst};

  // A tiny stand-in so this crate's tests don't depend on `farkle-dfa`
  // (the runtime crate only ever consumes an already-compiled `CompiledDfa`).
  mod farkle_dfa_for_tests {
    use farkle_core::builder::GrammarDefinition;
    use farkle_core::types::{CompiledDfa, DfaState, DfaStateId, FarkleError};

    /// A hand-assembled DFA good enough for tokenizer tests: one state
    /// per declared terminal, each a self-loop on its first matched
    /// class, accepting immediately. This is deliberately not a faithful
    /// regex compiler — only `next_token`'s driving logic is under test
    /// here, not pattern matching.
    pub fn compile(def: &GrammarDefinition) -> (CompiledDfa, Vec<FarkleError>) {
      let mut states = vec![DfaState::default()];
      for t in &def.terminals {
        if t.regex.is_none() {
          continue;
        }
        let accept_state = states.len() as u32;
        let mut accept = DfaState { accept: Some(t.id), ..Default::default() };
        if t.name == "ident" {
          accept.edges.push(('a', 'z', DfaStateId(accept_state)));
        }
        states.push(accept);
        let lo_hi = match t.literal_content.as_deref() {
          Some(s) if s.len() == 1 => Some((s.chars().next().unwrap(), s.chars().next().unwrap())),
          _ if t.name == "ident" => Some(('a', 'z')),
          _ => None,
        };
        if let Some((lo, hi)) = lo_hi {
          states[0].edges.push((lo, hi, DfaStateId(accept_state)));
        }
      }
      states[0].edges.sort();
      (CompiledDfa { start_state: DfaStateId(0), states }, Vec::new())
    }
  }

  #[test]
  fn newline_sequences_each_advance_the_line_counter_by_one() {
    let mut builder: GrammarBuilder<()> = GrammarBuilder::new(BuilderConfig::default());
    let ident = builder.terminal(
      "ident",
      RegexAst::Loop { inner: Box::new(RegexAst::Chars(CharRanges::from_ranges(vec![('a', 'z')]))), min: 1, max: None },
      std::sync::Arc::new(|_pos, _text: &str| Ok(())),
    );
    let start = builder.nonterminal("Start");
    let prod = builder.production(start).extend(farkle_core::types::SymbolId::Terminal(ident)).finish(&mut builder, |_, _| Ok(()));
    builder.set_productions(start, vec![prod]);
    builder.set_start_nonterminal(start);
    let (def, _callbacks, diagnostics) = analyze(builder);
    assert!(!diagnostics.has_errors());
    let (dfa, _diags) = farkle_dfa_for_tests::compile(&def);

    let mut tokenizer = Tokenizer::new(&def, &dfa, "a\r\nb\nc");
    let first = tokenizer.next_token().unwrap().unwrap();
    assert_eq!(first.position.line, 1);
    let second = tokenizer.next_token().unwrap().unwrap();
    assert_eq!(second.position.line, 2);
    let third = tokenizer.next_token().unwrap().unwrap();
    assert_eq!(third.position.line, 3);
  }

  #[test]
  fn a_declared_newline_terminal_is_tokenized_instead_of_skipped_as_whitespace() {
    use farkle_core::types::{CompiledDfa, DfaState, DfaStateId};

    let mut builder: GrammarBuilder<()> = GrammarBuilder::new(BuilderConfig::default());
    let ident = builder.terminal(
      "ident",
      RegexAst::Chars(CharRanges::from_ranges(vec![('a', 'z')])),
      std::sync::Arc::new(|_pos, _text: &str| Ok(())),
    );
    let newline = builder.newline();
    let start = builder.nonterminal("Start");
    let prod = builder
      .production(start)
      .extend(farkle_core::types::SymbolId::Terminal(ident))
      .extend(farkle_core::types::SymbolId::Terminal(newline))
      .extend(farkle_core::types::SymbolId::Terminal(ident))
      .finish(&mut builder, |_, _| Ok(()));
    builder.set_productions(start, vec![prod]);
    builder.set_start_nonterminal(start);
    let (def, _callbacks, diagnostics) = analyze(builder);
    assert!(!diagnostics.has_errors());

    // state0 --'a'-'z'--> state1 (ident accept); state0 --'\n'/'\r'--> state2
    // (newline accept). A plain space has no transition, so it only ever
    // gets consumed by `skip_raw_whitespace`, never the DFA.
    let mut states = vec![DfaState::default(), DfaState { accept: Some(ident), ..Default::default() }, DfaState {
      accept: Some(newline),
      ..Default::default()
    }];
    states[0].edges.push(('a', 'z', DfaStateId(1)));
    states[0].edges.push(('\n', '\n', DfaStateId(2)));
    states[0].edges.push(('\r', '\r', DfaStateId(2)));
    let dfa = CompiledDfa { start_state: DfaStateId(0), states };

    let mut tokenizer = Tokenizer::new(&def, &dfa, "a \n b");
    let first = tokenizer.next_token().unwrap().unwrap();
    assert_eq!(first.terminal, ident);
    assert_eq!(first.position.line, 1);
    let second = tokenizer.next_token().unwrap().unwrap();
    assert_eq!(second.terminal, newline);
    assert_eq!(second.text, "\n");
    let third = tokenizer.next_token().unwrap().unwrap();
    assert_eq!(third.terminal, ident);
    assert_eq!(third.position.line, 2);
  }

  #[test]
  fn lexical_error_reports_where_a_partial_match_broke_down() {
    use farkle_core::types::{CompiledDfa, DfaState, DfaStateId};

    let mut builder: GrammarBuilder<()> = GrammarBuilder::new(BuilderConfig::default());
    let true_lit = builder.literal("true");
    let start = builder.nonterminal("Start");
    let prod =
      builder.production(start).extend(farkle_core::types::SymbolId::Terminal(true_lit)).finish(&mut builder, |_, _| Ok(()));
    builder.set_productions(start, vec![prod]);
    builder.set_start_nonterminal(start);
    let (def, _callbacks, diagnostics) = analyze(builder);
    assert!(!diagnostics.has_errors());

    // One state per character of "true"; no other transitions exist, so
    // "truffle" matches "tru" then dead-ends at 'f'.
    let mut states = vec![DfaState::default(); 4];
    states.push(DfaState { accept: Some(true_lit), ..Default::default() });
    states[0].edges.push(('t', 't', DfaStateId(1)));
    states[1].edges.push(('r', 'r', DfaStateId(2)));
    states[2].edges.push(('u', 'u', DfaStateId(3)));
    states[3].edges.push(('e', 'e', DfaStateId(4)));
    let dfa = CompiledDfa { start_state: DfaStateId(0), states };

    let mut tokenizer = Tokenizer::new(&def, &dfa, "truffle");
    let err = tokenizer.next_token().unwrap_err();
    match err {
      FarkleError::LexicalError { ch, position } => {
        assert_eq!(ch, Some('f'));
        assert_eq!(position.column, 4);
      }
      other => panic!("expected LexicalError, got {other:?}"),
    }
  }
}
