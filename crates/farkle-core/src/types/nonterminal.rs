use super::handles::{NonterminalId, ProductionId};

/// The nonterminal production-setting state machine (`spec.md` §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductionSetState {
  #[default]
  Unset,
  Set,
}

/// A nonterminal symbol: a stable handle, a display name, and an ordered,
/// non-empty list of production handles once frozen.
#[derive(Debug, Clone)]
pub struct Nonterminal {
  pub id: NonterminalId,
  pub name: String,
  pub display_override: Option<String>,
  pub productions: Vec<ProductionId>,
  pub state: ProductionSetState,
}

impl Nonterminal {
  pub fn new(id: NonterminalId, name: String) -> Self {
    Nonterminal {
      id,
      name,
      display_override: None,
      productions: Vec::new(),
      state: ProductionSetState::Unset,
    }
  }

  pub fn display_name(&self) -> &str {
    self.display_override.as_deref().unwrap_or(&self.name)
  }

  pub fn is_set(&self) -> bool {
    self.state == ProductionSetState::Set
  }
}
