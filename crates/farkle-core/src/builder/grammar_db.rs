use crate::types::{
  Group, NonterminalId, OperatorScope, Production, ProductionId, SymbolId, Terminal, TerminalId,
};

/// The frozen, arena-free, handle-indexed grammar produced by
/// [`super::analysis::analyze`] and consumed by both compilers, the
/// artifact codec, and the legacy importer. Immutable once produced
/// (`spec.md` §3 Lifecycle).
#[derive(Debug, Clone)]
pub struct GrammarDefinition {
  pub terminals: Vec<Terminal>,
  pub nonterminals: Vec<crate::types::Nonterminal>,
  pub productions: Vec<Production>,
  pub groups: Vec<Group>,
  pub operator_scope: OperatorScope,
  pub start: NonterminalId,
  pub grammar_name: Option<String>,
  pub case_sensitive: bool,
  pub auto_whitespace: bool,
  /// Every terminal reachable from `start`, in declaration order; informs
  /// the "unreachable symbols" warning (`spec.md` §4.1 step 5) and is
  /// retained so `farkle-dfa` only ever compiles terminals that matter.
  pub reachable_terminals: Vec<TerminalId>,
  pub reachable_nonterminals: Vec<NonterminalId>,
}

impl GrammarDefinition {
  pub fn terminal(&self, id: TerminalId) -> &Terminal {
    &self.terminals[id.index()]
  }

  pub fn nonterminal(&self, id: NonterminalId) -> &crate::types::Nonterminal {
    &self.nonterminals[id.index()]
  }

  pub fn production(&self, id: ProductionId) -> &Production {
    &self.productions[id.index()]
  }

  pub fn group(&self, id: crate::types::GroupId) -> &Group {
    &self.groups[id.index()]
  }

  /// A read-only view suited to the out-of-scope CLI/templating
  /// collaborators named in `spec.md` §6, which only ever need stringified
  /// grammar entities, never the builder's internal arena types.
  pub fn view(&self) -> GrammarView<'_> {
    GrammarView { def: self }
  }
}

/// Read-only enumeration of grammar entities (`spec.md` §6): "terminals,
/// nonterminals, productions with stringified forms".
pub struct GrammarView<'a> {
  def: &'a GrammarDefinition,
}

impl<'a> GrammarView<'a> {
  pub fn terminals(&self) -> impl Iterator<Item = (TerminalId, &'a str)> {
    self.def.terminals.iter().map(|t| (t.id, t.display_name()))
  }

  pub fn nonterminals(&self) -> impl Iterator<Item = (NonterminalId, &'a str)> {
    self.def.nonterminals.iter().map(|n| (n.id, n.display_name()))
  }

  pub fn production_string(&self, id: ProductionId) -> String {
    let p = self.def.production(id);
    let head = self.def.nonterminal(p.head).display_name();
    let body: Vec<String> = p
      .body
      .iter()
      .map(|e| match e.symbol {
        SymbolId::Terminal(t) => self.def.terminal(t).display_name().to_string(),
        SymbolId::Nonterminal(n) => self.def.nonterminal(n).display_name().to_string(),
      })
      .collect();
    format!("{head} -> {}", body.join(" "))
  }

  pub fn productions(&self) -> impl Iterator<Item = ProductionId> {
    (0..self.def.productions.len() as u32).map(ProductionId)
  }
}
