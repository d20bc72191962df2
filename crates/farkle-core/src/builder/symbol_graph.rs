use crate::types::{
  Group, GroupId, Nonterminal, NonterminalId, Production, ProductionId, Terminal, TerminalId,
};

/// The in-memory symbol graph, addressed exclusively by stable handles
/// (`spec.md` §9: "use an arena + stable indices; resolve references by
/// handle; freeze the arena before compilation"). Nothing outside the
/// builder ever holds a direct reference into this arena — only handles,
/// which remain valid for the arena's entire lifetime.
#[derive(Debug, Default)]
pub struct SymbolGraph {
  pub(crate) terminals: Vec<Terminal>,
  pub(crate) nonterminals: Vec<Nonterminal>,
  pub(crate) productions: Vec<Production>,
  pub(crate) groups: Vec<Group>,
}

impl SymbolGraph {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push_terminal(&mut self, build: impl FnOnce(TerminalId) -> Terminal) -> TerminalId {
    let id = TerminalId(self.terminals.len() as u32);
    self.terminals.push(build(id));
    id
  }

  pub fn push_nonterminal(&mut self, name: String) -> NonterminalId {
    let id = NonterminalId(self.nonterminals.len() as u32);
    self.nonterminals.push(Nonterminal::new(id, name));
    id
  }

  pub fn push_production(&mut self, build: impl FnOnce(ProductionId) -> Production) -> ProductionId {
    let id = ProductionId(self.productions.len() as u32);
    self.productions.push(build(id));
    id
  }

  pub fn push_group(&mut self, build: impl FnOnce(GroupId) -> Group) -> GroupId {
    let id = GroupId(self.groups.len() as u32);
    self.groups.push(build(id));
    id
  }

  pub fn terminal(&self, id: TerminalId) -> &Terminal {
    &self.terminals[id.index()]
  }

  pub fn terminal_mut(&mut self, id: TerminalId) -> &mut Terminal {
    &mut self.terminals[id.index()]
  }

  pub fn nonterminal(&self, id: NonterminalId) -> &Nonterminal {
    &self.nonterminals[id.index()]
  }

  pub fn nonterminal_mut(&mut self, id: NonterminalId) -> &mut Nonterminal {
    &mut self.nonterminals[id.index()]
  }

  pub fn production(&self, id: ProductionId) -> &Production {
    &self.productions[id.index()]
  }

  pub fn group(&self, id: GroupId) -> &Group {
    &self.groups[id.index()]
  }

  pub fn terminals(&self) -> &[Terminal] {
    &self.terminals
  }

  pub fn nonterminals(&self) -> &[Nonterminal] {
    &self.nonterminals
  }

  pub fn productions(&self) -> &[Production] {
    &self.productions
  }

  pub fn groups(&self) -> &[Group] {
    &self.groups
  }
}
