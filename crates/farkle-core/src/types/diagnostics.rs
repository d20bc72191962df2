use std::fmt;

use super::{
  callbacks::Position,
  handles::{GroupId, NonterminalId, ProductionId, TerminalId},
};

/// Diagnostic severity. Warnings never fail a build unless the caller
/// explicitly promotes them (`spec.md` §7, `BuilderConfig::promote_warnings_to_errors`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
  Warning,
  Error,
}

/// A symbol or production referenced by a diagnostic, for tooling that
/// wants to highlight the offending grammar entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
  Terminal(TerminalId),
  Nonterminal(NonterminalId),
  Production(ProductionId),
  Group(GroupId),
}

/// The three LALR conflict kinds (`spec.md` §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LalrConflictKind {
  ShiftReduce,
  ReduceReduce,
  AcceptReduce,
}

/// Every diagnostic the core can produce, both at build time and at parse
/// time (`spec.md` §7). Kept as a single hand-rolled enum, the way the
/// reference toolchain's `SherpaError` covers both load-time and
/// runtime error kinds in one type rather than splitting them.
#[derive(Debug, Clone)]
pub enum FarkleError {
  EmptyNonterminal { nonterminal: NonterminalId, name: String },
  DuplicateProduction { nonterminal: NonterminalId, production: ProductionId },
  NullableTerminal { terminal: TerminalId, name: String },
  LalrConflict { kind: LalrConflictKind, state: u32, detail: String },
  DfaConflict { terminals: Vec<TerminalId>, detail: String },
  DuplicateSpecialName { name: String, first: TerminalId, second: TerminalId },
  UnsupportedFormat { detail: String },
  /// The embedder's [`crate::builder::CancellationToken`] fired during the
  /// analysis pass's reachability walk (`spec.md` §5). The resulting
  /// `GrammarDefinition` still gets built and returned, but over a
  /// reachable-symbol set that stopped wherever the walk was cut off —
  /// callers must treat it as incomplete rather than authoritative.
  Cancelled,

  LexicalError { ch: Option<char>, position: Position },
  SyntaxError { found: TerminalId, expected: Vec<TerminalId>, position: Position },
  UnexpectedEndOfInput { expected: Vec<TerminalId>, position: Position },
  UnterminatedGroup { group: GroupId, start_position: Position },
  UserError { message: String, position: Option<Position> },

  /// A non-fatal note: an unreachable symbol, a renamed-twice symbol, a
  /// redundant `set_productions` call, etc.
  Warning { code: &'static str, message: String, entity: Option<EntityRef> },
}

impl FarkleError {
  /// A stable identifier, per `spec.md` §6 ("FARKLE0001..0008 or similar
  /// stable identifiers").
  pub fn code(&self) -> &'static str {
    match self {
      FarkleError::EmptyNonterminal { .. } => "FARKLE0001",
      FarkleError::DuplicateProduction { .. } => "FARKLE0002",
      FarkleError::NullableTerminal { .. } => "FARKLE0003",
      FarkleError::LalrConflict { .. } => "FARKLE0004",
      FarkleError::DfaConflict { .. } => "FARKLE0005",
      FarkleError::DuplicateSpecialName { .. } => "FARKLE0006",
      FarkleError::UnsupportedFormat { .. } => "FARKLE0007",
      FarkleError::LexicalError { .. } => "FARKLE0008",
      FarkleError::SyntaxError { .. } => "FARKLE0009",
      FarkleError::UnexpectedEndOfInput { .. } => "FARKLE0010",
      FarkleError::UnterminatedGroup { .. } => "FARKLE0011",
      FarkleError::UserError { .. } => "FARKLE0012",
      FarkleError::Cancelled => "FARKLE0013",
      FarkleError::Warning { code, .. } => code,
    }
  }

  pub fn severity(&self) -> Severity {
    match self {
      FarkleError::Warning { .. } => Severity::Warning,
      _ => Severity::Error,
    }
  }

  pub fn position(&self) -> Option<Position> {
    match self {
      FarkleError::LexicalError { position, .. }
      | FarkleError::SyntaxError { position, .. }
      | FarkleError::UnexpectedEndOfInput { position, .. }
      | FarkleError::UnterminatedGroup { start_position: position, .. } => Some(*position),
      FarkleError::UserError { position, .. } => *position,
      _ => None,
    }
  }
}

impl fmt::Display for FarkleError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[{}] ", self.code())?;
    match self {
      FarkleError::EmptyNonterminal { name, .. } => {
        write!(f, "nonterminal `{name}` has no productions")
      }
      FarkleError::DuplicateProduction { nonterminal, .. } => {
        write!(f, "nonterminal {nonterminal} declares the same production twice")
      }
      FarkleError::NullableTerminal { name, .. } => {
        write!(f, "terminal `{name}` matches the empty string")
      }
      FarkleError::LalrConflict { kind, state, detail } => {
        write!(f, "{kind:?} conflict in state {state}: {detail}")
      }
      FarkleError::DfaConflict { detail, .. } => write!(f, "DFA conflict: {detail}"),
      FarkleError::DuplicateSpecialName { name, .. } => {
        write!(f, "special name `{name}` is used by more than one terminal")
      }
      FarkleError::UnsupportedFormat { detail } => write!(f, "unsupported format: {detail}"),
      FarkleError::LexicalError { ch, position } => match ch {
        Some(c) => write!(f, "unexpected character '{c}' at {position}"),
        None => write!(f, "lexical error at {position}"),
      },
      FarkleError::SyntaxError { position, .. } => write!(f, "syntax error at {position}"),
      FarkleError::UnexpectedEndOfInput { position, .. } => {
        write!(f, "unexpected end of input at {position}")
      }
      FarkleError::UnterminatedGroup { start_position, .. } => {
        write!(f, "unterminated group starting at {start_position}")
      }
      FarkleError::UserError { message, .. } => write!(f, "{message}"),
      FarkleError::Cancelled => write!(f, "analysis cancelled before reachability could be fully computed"),
      FarkleError::Warning { message, .. } => write!(f, "{message}"),
    }
  }
}

impl std::error::Error for FarkleError {}

/// Collects diagnostics during a builder analysis pass or a parse, the way
/// the reference toolchain's `Journal` accumulates `SherpaError`s instead
/// of failing on the first one (`spec.md` §7's "collected, not thrown"
/// propagation policy).
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
  entries: Vec<FarkleError>,
}

impl Diagnostics {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, error: FarkleError) {
    self.entries.push(error);
  }

  pub fn errors(&self) -> impl Iterator<Item = &FarkleError> {
    self.entries.iter().filter(|e| e.severity() == Severity::Error)
  }

  pub fn warnings(&self) -> impl Iterator<Item = &FarkleError> {
    self.entries.iter().filter(|e| e.severity() == Severity::Warning)
  }

  pub fn all(&self) -> &[FarkleError] {
    &self.entries
  }

  pub fn has_errors(&self) -> bool {
    self.errors().next().is_some()
  }

  pub fn into_vec(self) -> Vec<FarkleError> {
    self.entries
  }
}
