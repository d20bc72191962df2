use crate::types::Diagnostics;

/// Grammar-wide knobs that are not part of the symbol graph itself
/// (`SPEC_FULL.md` §4.11). Analogous to the reference toolchain's
/// `ParserConfig`, trimmed to what `spec.md` actually names.
#[derive(Debug, Clone, Copy)]
pub struct BuilderConfig {
  pub case_sensitive: bool,
  pub auto_whitespace: bool,
  /// When set, a caller driving the full pipeline (e.g. `farkle::compile`)
  /// treats warning diagnostics as build-failing too (`spec.md` §7:
  /// "unless the caller explicitly promotes them"). Not consulted inside
  /// this crate — `Diagnostics` itself stays a plain collection.
  pub promote_warnings_to_errors: bool,
  /// DFA-compiler tie-break rule for equal-length accepts with no other
  /// ordering (`spec.md` §4.3 item 3, §9).
  pub prioritise_by_order: bool,
}

impl Default for BuilderConfig {
  fn default() -> Self {
    BuilderConfig {
      case_sensitive: true,
      auto_whitespace: true,
      promote_warnings_to_errors: false,
      prioritise_by_order: false,
    }
  }
}

/// A cancellation signal checked between nonterminal expansions during the
/// analysis pass (`spec.md` §5). Holds an optional callback so embedders
/// can wire this to whatever cancellation primitive they use (an atomic
/// flag, a channel poll, a deadline check) without this crate depending
/// on any of them.
#[derive(Default)]
pub struct CancellationToken {
  check: Option<Box<dyn Fn() -> bool + Send + Sync>>,
}

impl CancellationToken {
  pub fn none() -> Self {
    Self::default()
  }

  pub fn new(check: impl Fn() -> bool + Send + Sync + 'static) -> Self {
    CancellationToken { check: Some(Box::new(check)) }
  }

  pub fn is_cancelled(&self) -> bool {
    self.check.as_ref().map(|f| f()).unwrap_or(false)
  }
}

/// Carries configuration, diagnostics, and cancellation state through a
/// single builder analysis pass. The workspace's analogue of the
/// reference toolchain's `Journal` (`journal/mod.rs`), trimmed to a
/// single-threaded shape since `spec.md` §5 states builders are not
/// thread-safe and are used single-threaded followed by a freeze-and-publish
/// step — the reference toolchain's `RwLock`-guarded multi-threaded scratch
/// pad has no counterpart here.
#[derive(Default)]
pub struct BuildContext {
  pub config: BuilderConfig,
  pub diagnostics: Diagnostics,
  pub cancellation: CancellationToken,
}

impl BuildContext {
  pub fn new(config: BuilderConfig) -> Self {
    BuildContext { config, diagnostics: Diagnostics::new(), cancellation: CancellationToken::none() }
  }
}
