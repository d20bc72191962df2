use std::collections::HashMap;

use crate::types::{
  EntityRef, FarkleError, Group, GroupEnd, GroupFlags, GroupId, NonterminalId, OperatorScope, Position,
  ProductionId, RegexAst, SemanticCallbacks, Terminal, TerminalAttributes, TerminalId, TransformFn,
};

use super::{
  context::{BuildContext, BuilderConfig},
  production_builder::ProductionBuilder,
  symbol_graph::SymbolGraph,
};

/// One entry of the `comments` metadata option (`spec.md` §4.1).
#[derive(Debug, Clone)]
pub enum CommentSpec {
  Line { start: String },
  Block { start: String, end: String },
}

/// The fluent composition surface for a grammar's symbol graph
/// (`spec.md` §4.1). Generic over the user's semantic value type `V`, per
/// design note (a) in `spec.md` §9: semantic types are erased at the
/// artifact boundary and carried only through [`SemanticCallbacks`].
pub struct GrammarBuilder<V> {
  pub(crate) graph: SymbolGraph,
  pub(crate) context: BuildContext,
  pub(crate) callbacks: SemanticCallbacks<V>,
  pub(crate) operator_scope: OperatorScope,
  pub(crate) start: Option<NonterminalId>,
  pub(crate) grammar_name: Option<String>,
  pub(crate) comments: Vec<CommentSpec>,
  pub(crate) newline_terminal: Option<TerminalId>,
  literal_dedup: HashMap<String, TerminalId>,
  special_names: HashMap<String, TerminalId>,
  renamed_terminals: HashMap<TerminalId, String>,
  renamed_nonterminals: HashMap<NonterminalId, String>,
  next_precedence_token: u32,
}

impl<V> Default for GrammarBuilder<V> {
  fn default() -> Self {
    Self::new(BuilderConfig::default())
  }
}

impl<V> GrammarBuilder<V> {
  pub fn new(config: BuilderConfig) -> Self {
    GrammarBuilder {
      graph: SymbolGraph::new(),
      context: BuildContext::new(config),
      callbacks: SemanticCallbacks::new(),
      operator_scope: OperatorScope::default(),
      start: None,
      grammar_name: None,
      comments: Vec::new(),
      newline_terminal: None,
      literal_dedup: HashMap::new(),
      special_names: HashMap::new(),
      renamed_terminals: HashMap::new(),
      renamed_nonterminals: HashMap::new(),
      next_precedence_token: 0,
    }
  }

  pub fn config(&self) -> &BuilderConfig {
    &self.context.config
  }

  pub fn set_grammar_name(&mut self, name: impl Into<String>) -> &mut Self {
    self.grammar_name = Some(name.into());
    self
  }

  pub fn set_start_nonterminal(&mut self, nonterminal: NonterminalId) -> &mut Self {
    self.start = Some(nonterminal);
    self
  }

  pub fn operator_scope_mut(&mut self) -> &mut OperatorScope {
    &mut self.operator_scope
  }

  /// Allocates a fresh, disjoint precedence token (`spec.md` §4.5, §9: a
  /// single disjoint handle space shared by terminals and productions).
  pub fn new_precedence_token(&mut self) -> crate::types::PrecedenceToken {
    let tok = crate::types::PrecedenceToken(self.next_precedence_token);
    self.next_precedence_token += 1;
    tok
  }

  /// Binds `terminal`'s shift precedence to `token` (`spec.md` §4.4 step
  /// 4). Call before pushing `token` into an operator scope group.
  pub fn set_terminal_precedence(&mut self, terminal: TerminalId, token: crate::types::PrecedenceToken) {
    self.graph.terminal_mut(terminal).precedence_token = Some(token);
  }

  /// Declares one associativity group over literal strings, auto-mapping
  /// each to the terminal recognising it the way `literal(...)` does
  /// (`spec.md` §4.5: "literals are auto-mapped to the terminal
  /// recognising them"). Earlier calls form lower-precedence groups.
  pub fn precedence_group(&mut self, associativity: crate::types::Associativity, literals: &[&str]) -> &mut Self {
    let tokens: Vec<crate::types::PrecedenceToken> = literals
      .iter()
      .map(|lit| {
        let terminal = self.literal(lit);
        let token = self.new_precedence_token();
        self.set_terminal_precedence(terminal, token);
        token
      })
      .collect();
    self.operator_scope.push_group(associativity, tokens);
    self
  }

  pub fn diagnostics(&self) -> &crate::types::Diagnostics {
    &self.context.diagnostics
  }

  // ---------------------------------------------------------------------
  // Terminals
  // ---------------------------------------------------------------------

  /// `terminal(name, regex, transform)` (`spec.md` §4.1).
  pub fn terminal(&mut self, name: impl Into<String>, regex: RegexAst, transform: TransformFn<V>) -> TerminalId {
    let name = name.into();
    let id = self.graph.push_terminal(|id| Terminal {
      id,
      name,
      attributes: TerminalAttributes::Terminal,
      regex: Some(regex),
      display_override: None,
      literal_content: None,
      precedence_token: None,
    });
    self.callbacks.transforms.insert(id, transform);
    id
  }

  /// A terminal declared by name only; never matched by the DFA, only
  /// producible through the tokenizer hook (`spec.md` §4.1, §6).
  pub fn virtual_terminal(&mut self, name: impl Into<String>) -> TerminalId {
    let name = name.into();
    self.graph.push_terminal(|id| Terminal {
      id,
      name,
      attributes: TerminalAttributes::Terminal,
      regex: None,
      display_override: None,
      literal_content: None,
      precedence_token: None,
    })
  }

  /// A terminal whose regex matches exactly one fixed string. Literals
  /// equal by content (under the grammar's case-sensitivity flag) are
  /// deduplicated to the same handle (`spec.md` §4.1, §8: "idempotent").
  pub fn literal(&mut self, content: &str) -> TerminalId {
    let key = canonical_literal_key(content, self.context.config.case_sensitive);
    if let Some(&id) = self.literal_dedup.get(&key) {
      return id;
    }
    let id = self.graph.push_terminal(|id| Terminal {
      id,
      name: content.to_string(),
      attributes: TerminalAttributes::Terminal,
      regex: Some(RegexAst::literal(content)),
      display_override: None,
      literal_content: Some(content.to_string()),
      precedence_token: None,
    });
    self.literal_dedup.insert(key, id);
    id
  }

  /// The `newline` singleton (`spec.md` §4.1): `\r\n | \n | \r`. Idempotent
  /// — repeated calls return the same handle.
  pub fn newline(&mut self) -> TerminalId {
    if let Some(id) = self.newline_terminal {
      return id;
    }
    let regex = RegexAst::Alt(vec![
      RegexAst::literal("\r\n"),
      RegexAst::literal("\n"),
      RegexAst::literal("\r"),
    ]);
    let id = self.graph.push_terminal(|id| Terminal {
      id,
      name: "newline".to_string(),
      attributes: TerminalAttributes::Terminal | TerminalAttributes::Newline,
      regex: Some(regex),
      display_override: None,
      literal_content: None,
      precedence_token: None,
    });
    self.newline_terminal = Some(id);
    id
  }

  /// A `noise_symbols` entry (`spec.md` §4.1): recognized but never
  /// reaches the LR driver.
  pub fn noise_symbol(&mut self, name: impl Into<String>, regex: RegexAst) -> TerminalId {
    let name = name.into();
    self.graph.push_terminal(|id| Terminal {
      id,
      name,
      attributes: TerminalAttributes::Terminal | TerminalAttributes::Noise,
      regex: Some(regex),
      display_override: None,
      literal_content: None,
      precedence_token: None,
    })
  }

  /// Attaches a globally-unique special name to a terminal
  /// (`spec.md` §3 invariant, §4.1 step 4). Returns a
  /// [`FarkleError::DuplicateSpecialName`] diagnostic (pushed to
  /// `diagnostics()`) if the name is already taken.
  pub fn set_special_name(&mut self, terminal: TerminalId, name: impl Into<String>) {
    let name = name.into();
    if let Some(&first) = self.special_names.get(&name) {
      if first != terminal {
        self.context.diagnostics.push(FarkleError::DuplicateSpecialName { name, first, second: terminal });
        return;
      }
    }
    self.special_names.insert(name, terminal);
    self.graph.terminal_mut(terminal).attributes |= TerminalAttributes::SpecialNamed;
  }

  /// `rename(new_name)` (`spec.md` §4.1). If a terminal is renamed more
  /// than once with different names, the first override wins and a
  /// warning is recorded — "the original name is never chosen over an
  /// override".
  pub fn rename_terminal(&mut self, terminal: TerminalId, new_name: impl Into<String>) {
    let new_name = new_name.into();
    if let Some(existing) = self.renamed_terminals.get(&terminal) {
      if existing != &new_name {
        self.context.diagnostics.push(FarkleError::Warning {
          code: "FARKLE0013",
          message: format!(
            "terminal {terminal} renamed more than once ('{existing}' kept, '{new_name}' ignored)"
          ),
          entity: Some(EntityRef::Terminal(terminal)),
        });
        return;
      }
    }
    self.renamed_terminals.insert(terminal, new_name.clone());
    self.graph.terminal_mut(terminal).display_override = Some(new_name);
  }

  pub fn rename_nonterminal(&mut self, nonterminal: NonterminalId, new_name: impl Into<String>) {
    let new_name = new_name.into();
    if let Some(existing) = self.renamed_nonterminals.get(&nonterminal) {
      if existing != &new_name {
        self.context.diagnostics.push(FarkleError::Warning {
          code: "FARKLE0013",
          message: format!(
            "nonterminal {nonterminal} renamed more than once ('{existing}' kept, '{new_name}' ignored)"
          ),
          entity: Some(EntityRef::Nonterminal(nonterminal)),
        });
        return;
      }
    }
    self.renamed_nonterminals.insert(nonterminal, new_name.clone());
    self.graph.nonterminal_mut(nonterminal).display_override = Some(new_name);
  }

  // ---------------------------------------------------------------------
  // Nonterminals & productions
  // ---------------------------------------------------------------------

  pub fn nonterminal(&mut self, name: impl Into<String>) -> NonterminalId {
    self.graph.push_nonterminal(name.into())
  }

  pub fn production(&mut self, head: NonterminalId) -> ProductionBuilder {
    ProductionBuilder::new(head)
  }

  /// Sets a nonterminal's ordered production list. Settable exactly once
  /// per the `UNSET -> SET` state machine (`spec.md` §4.9); subsequent
  /// calls are ignored and emit a warning.
  pub fn set_productions(&mut self, nonterminal: NonterminalId, productions: Vec<ProductionId>) {
    use crate::types::ProductionSetState;
    let nt = self.graph.nonterminal_mut(nonterminal);
    if nt.state == ProductionSetState::Set {
      self.context.diagnostics.push(FarkleError::Warning {
        code: "FARKLE0014",
        message: format!("set_productions called more than once for nonterminal {nonterminal}"),
        entity: Some(EntityRef::Nonterminal(nonterminal)),
      });
      return;
    }
    nt.productions = productions;
    nt.state = ProductionSetState::Set;
  }

  // ---------------------------------------------------------------------
  // Groups
  // ---------------------------------------------------------------------

  /// A line group: consumed up to (not including) end-of-line
  /// (`spec.md` §3, scenario 2 in §8).
  pub fn group_line(
    &mut self,
    start: TerminalId,
    container_name: impl Into<String>,
    flags: GroupFlags,
  ) -> (TerminalId, GroupId) {
    self.graph.terminal_mut(start).attributes |= TerminalAttributes::GroupStart;
    let container = self.graph.push_terminal(|id| Terminal {
      id,
      name: container_name.into(),
      attributes: TerminalAttributes::Terminal,
      regex: None,
      display_override: None,
      literal_content: None,
      precedence_token: None,
    });
    let group_id =
      self
        .graph
        .push_group(|id| Group { id, start, end: GroupEnd::EndOfLine, container, flags, allowed_nesting: Default::default() });
    (container, group_id)
  }

  /// A block group: consumed until a matching end terminal
  /// (`spec.md` §3, scenario 3 in §8).
  pub fn group_block(
    &mut self,
    start: TerminalId,
    end: TerminalId,
    container_name: impl Into<String>,
    flags: GroupFlags,
  ) -> (TerminalId, GroupId) {
    self.graph.terminal_mut(start).attributes |= TerminalAttributes::GroupStart;
    self.graph.terminal_mut(end).attributes |= TerminalAttributes::GroupEnd;
    let container = self.graph.push_terminal(|id| Terminal {
      id,
      name: container_name.into(),
      attributes: TerminalAttributes::Terminal,
      regex: None,
      display_override: None,
      literal_content: None,
      precedence_token: None,
    });
    let group_id = self.graph.push_group(|id| Group {
      id,
      start,
      end: GroupEnd::Token(end),
      container,
      flags,
      allowed_nesting: Default::default(),
    });
    (container, group_id)
  }

  pub fn allow_nesting(&mut self, outer: GroupId, inner: GroupId) {
    self.graph.groups[outer.index()].allowed_nesting.insert(inner);
  }

  /// `comments: [LineComment(start) | BlockComment(start, end)]`
  /// (`spec.md` §4.1). Sugar over a literal + noise-attributed group.
  pub fn line_comment(&mut self, start: &str) {
    let start_tok = self.literal(start);
    self.graph.terminal_mut(start_tok).attributes |= TerminalAttributes::Noise;
    let (container, _group) = self.group_line(start_tok, format!("{start}-line-comment"), GroupFlags::none());
    self.graph.terminal_mut(container).attributes |= TerminalAttributes::Noise;
    self.comments.push(CommentSpec::Line { start: start.to_string() });
  }

  pub fn block_comment(&mut self, start: &str, end: &str) {
    let start_tok = self.literal(start);
    let end_tok = self.literal(end);
    self.graph.terminal_mut(start_tok).attributes |= TerminalAttributes::Noise;
    self.graph.terminal_mut(end_tok).attributes |= TerminalAttributes::Noise;
    let (container, _group) =
      self.group_block(start_tok, end_tok, format!("{start}-block-comment"), GroupFlags::KeepEndToken);
    self.graph.terminal_mut(container).attributes |= TerminalAttributes::Noise;
    self.comments.push(CommentSpec::Block { start: start.to_string(), end: end.to_string() });
  }

  pub(crate) fn graph(&self) -> &SymbolGraph {
    &self.graph
  }
}

fn canonical_literal_key(content: &str, case_sensitive: bool) -> String {
  if case_sensitive {
    content.to_string()
  } else {
    content.to_lowercase()
  }
}

/// A transform callback that simply returns a constant, useful for
/// punctuation terminals whose text is never inspected.
pub fn ignore_text<V: Clone + Send + Sync + 'static>(value: V) -> TransformFn<V> {
  std::sync::Arc::new(move |_pos: Position, _text: &str| Ok(value.clone()))
}
