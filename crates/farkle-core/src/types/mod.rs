//! The data model of `spec.md` §3: handles, terminals, nonterminals,
//! productions, groups, the regex AST, operator scopes, semantic
//! callbacks, and diagnostics.

pub mod callbacks;
pub mod dfa;
pub mod diagnostics;
pub mod group;
pub mod handles;
pub mod lr;
pub mod nonterminal;
pub mod operator_scope;
pub mod production;
pub mod regex;
pub mod terminal;

pub use callbacks::{FuseAction, Position, SemanticCallbacks, TransformFn, UserError};
pub use dfa::{CompiledDfa, DfaState};
pub use diagnostics::{Diagnostics, EntityRef, FarkleError, LalrConflictKind, Severity};
pub use group::{Group, GroupEnd, GroupFlags};
pub use lr::{CompiledLr, EofAction, LrAction, LrStateRow};
pub use handles::{
  DfaStateId, GroupId, LrStateId, NonterminalId, PrecedenceToken, ProductionId, SymbolId, TerminalId,
};
pub use nonterminal::{Nonterminal, ProductionSetState};
pub use operator_scope::{Associativity, AssociativityGroup, OperatorScope, PrecedenceInfo};
pub use production::{BodyElement, Production};
pub use regex::{CharRanges, RegexAst};
pub use terminal::{Terminal, TerminalAttributes};
