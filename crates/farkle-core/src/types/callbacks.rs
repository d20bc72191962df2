use std::{collections::HashMap, fmt, sync::Arc};

use super::handles::{ProductionId, TerminalId};

/// A 1-based line/column/byte-offset position, per `spec.md` §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
  pub line: u32,
  pub column: u32,
  pub offset: u32,
}

impl fmt::Display for Position {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.line, self.column)
  }
}

/// Signals a user-raised error from inside a transform/fuse callback
/// (`spec.md` §4.8, §7 `USER_ERROR`).
#[derive(Debug, Clone)]
pub struct UserError(pub String);

/// A terminal's transform callback: `(position, matched text) -> value`,
/// invoked on every shift (`spec.md` §4.8).
pub type TransformFn<V> = Arc<dyn Fn(Position, &str) -> Result<V, UserError> + Send + Sync>;

/// A production's semantic action, attached via `finish`/`finish_constant`
/// (`spec.md` §4.1, §4.8).
#[derive(Clone)]
pub enum FuseAction<V> {
  /// `finish(fuse_fn)` — invoked with the significant child values, in
  /// grammar order, plus the production handle for diagnostics.
  Fuse(Arc<dyn Fn(&[V], ProductionId) -> Result<V, UserError> + Send + Sync>),
  /// `finish_constant(v)` — ignores child values.
  Constant(V),
}

impl<V: Clone> FuseAction<V> {
  pub fn invoke(&self, children: &[V], production: ProductionId) -> Result<V, UserError> {
    match self {
      FuseAction::Fuse(f) => f(children, production),
      FuseAction::Constant(v) => Ok(v.clone()),
    }
  }
}

/// The in-memory, non-serializable half of a compiled grammar: the
/// transform and fuse callbacks keyed by terminal/production handle.
///
/// A [`crate::artifact::GrammarArtifact`] can be written to and read from a
/// binary file; this table cannot (closures are not `Serialize`), so it
/// always travels alongside an artifact within a single process rather
/// than through the artifact's own byte stream.
pub struct SemanticCallbacks<V> {
  pub transforms: HashMap<TerminalId, TransformFn<V>>,
  pub fuses: HashMap<ProductionId, FuseAction<V>>,
}

impl<V> Default for SemanticCallbacks<V> {
  fn default() -> Self {
    SemanticCallbacks { transforms: HashMap::new(), fuses: HashMap::new() }
  }
}

impl<V> SemanticCallbacks<V> {
  pub fn new() -> Self {
    Self::default()
  }
}
