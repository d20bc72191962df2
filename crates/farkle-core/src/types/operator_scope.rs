use super::handles::PrecedenceToken;

/// Associativity of one precedence group (`spec.md` §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
  Left,
  Right,
  NonAssoc,
}

/// One row of the operator scope: an associativity applied to an ordered
/// set of precedence tokens that all share that precedence level.
#[derive(Debug, Clone)]
pub struct AssociativityGroup {
  pub associativity: Associativity,
  pub tokens: Vec<PrecedenceToken>,
}

/// The grammar-wide precedence-and-associativity table (`spec.md` §4.5).
/// Earlier groups in `groups` have *lower* precedence than later ones.
#[derive(Debug, Clone, Default)]
pub struct OperatorScope {
  pub groups: Vec<AssociativityGroup>,
  /// When true, reduce/reduce conflicts between productions with
  /// comparable contextual precedence tokens are resolved by picking the
  /// higher-precedence production, rather than left as a diagnostic
  /// (`spec.md` §4.4 step 4).
  pub resolve_reduce_reduce: bool,
}

/// The result of comparing two precedence tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrecedenceInfo {
  pub level: usize,
  pub associativity: Associativity,
}

impl OperatorScope {
  pub fn push_group(&mut self, associativity: Associativity, tokens: Vec<PrecedenceToken>) -> &mut Self {
    self.groups.push(AssociativityGroup { associativity, tokens });
    self
  }

  /// Looks up a token's precedence level (higher = binds tighter) and
  /// associativity. Returns `None` if the token is not registered in any
  /// group — "unknown" precedence per `spec.md` §4.4 step 4.
  pub fn lookup(&self, token: PrecedenceToken) -> Option<PrecedenceInfo> {
    self.groups.iter().enumerate().find_map(|(level, group)| {
      group
        .tokens
        .contains(&token)
        .then_some(PrecedenceInfo { level, associativity: group.associativity })
    })
  }
}
