use super::handles::{NonterminalId, PrecedenceToken, ProductionId, SymbolId};

/// A single element of a production body: the symbol plus whether it is
/// *significant* (contributes to the fuse callback's argument list).
/// `spec.md` §4.1 distinguishes `append` (non-significant) from `extend`
/// (significant).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyElement {
  pub symbol: SymbolId,
  pub significant: bool,
}

/// A production (rewrite rule `head -> body*`) with an optional contextual
/// precedence token used to override the default shift/reduce
/// precedence derived from the rightmost body terminal (`spec.md` §3, §4.4).
#[derive(Debug, Clone)]
pub struct Production {
  pub id: ProductionId,
  pub head: NonterminalId,
  pub body: Vec<BodyElement>,
  pub precedence_token: Option<PrecedenceToken>,
}

impl Production {
  pub fn symbols(&self) -> impl Iterator<Item = SymbolId> + '_ {
    self.body.iter().map(|e| e.symbol)
  }

  pub fn significant_indices(&self) -> impl Iterator<Item = usize> + '_ {
    self.body.iter().enumerate().filter(|(_, e)| e.significant).map(|(i, _)| i)
  }

  pub fn len(&self) -> usize {
    self.body.len()
  }

  pub fn is_empty(&self) -> bool {
    self.body.is_empty()
  }

  /// The rightmost terminal in the body, used as the default precedence
  /// source when no explicit `with_precedence` token was supplied
  /// (`spec.md` §4.4).
  pub fn rightmost_terminal(&self) -> Option<super::handles::TerminalId> {
    self.body.iter().rev().find_map(|e| match e.symbol {
      SymbolId::Terminal(t) => Some(t),
      SymbolId::Nonterminal(_) => None,
    })
  }
}
