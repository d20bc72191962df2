use crate::types::{BodyElement, FuseAction, PrecedenceToken, ProductionId, SymbolId, UserError};

use super::grammar_builder::GrammarBuilder;

/// Fluent production-body construction (`spec.md` §4.1): `append` for
/// non-significant symbols, `extend` for symbols that contribute to the
/// fuse callback's argument list, then exactly one of `finish`/
/// `finish_constant` to register the production.
pub struct ProductionBuilder {
  head: crate::types::NonterminalId,
  body: Vec<BodyElement>,
  precedence_token: Option<PrecedenceToken>,
}

impl ProductionBuilder {
  pub(crate) fn new(head: crate::types::NonterminalId) -> Self {
    ProductionBuilder { head, body: Vec::new(), precedence_token: None }
  }

  /// Appends a non-significant symbol (does not reach the fuse callback).
  pub fn append(mut self, symbol: SymbolId) -> Self {
    self.body.push(BodyElement { symbol, significant: false });
    self
  }

  /// Appends a significant symbol (its computed value is passed to the
  /// fuse callback, in grammar order).
  pub fn extend(mut self, symbol: SymbolId) -> Self {
    self.body.push(BodyElement { symbol, significant: true });
    self
  }

  /// Overrides the production's contextual precedence token, used instead
  /// of the rightmost body terminal's precedence during shift/reduce and
  /// reduce/reduce resolution (`spec.md` §3, §4.4).
  pub fn with_precedence(mut self, token: PrecedenceToken) -> Self {
    self.precedence_token = Some(token);
    self
  }

  /// Finalizes the production with a fuse callback invoked on reduction.
  pub fn finish<V: 'static>(
    self,
    builder: &mut GrammarBuilder<V>,
    fuse: impl Fn(&[V], ProductionId) -> Result<V, UserError> + Send + Sync + 'static,
  ) -> ProductionId {
    self.finish_with_action(builder, FuseAction::Fuse(std::sync::Arc::new(fuse)))
  }

  /// Finalizes the production with a constant semantic value, ignoring any
  /// significant children.
  pub fn finish_constant<V: Clone + 'static>(self, builder: &mut GrammarBuilder<V>, value: V) -> ProductionId {
    self.finish_with_action(builder, FuseAction::Constant(value))
  }

  fn finish_with_action<V: 'static>(self, builder: &mut GrammarBuilder<V>, action: FuseAction<V>) -> ProductionId {
    let head = self.head;
    let body = self.body;
    let precedence_token = self.precedence_token;
    let id = builder.graph.push_production(|id| crate::types::Production { id, head, body, precedence_token });
    builder.callbacks.fuses.insert(id, action);
    id
  }
}
