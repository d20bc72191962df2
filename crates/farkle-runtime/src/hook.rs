//! The tokenizer hook interface (`spec.md` §6): "a callable invoked before
//! each LR step with `(input_cursor, current_lr_state) -> Option<Token>`.
//! Returning `Some(t)` injects a virtual terminal; returning `None`
//! delegates to the DFA tokenizer." No direct reference-toolchain
//! counterpart exists — its "Call" states are a compile-time construct,
//! not a runtime hook.

use farkle_core::types::{LrStateId, Position, TerminalId};

/// Implemented by callers that want to inject virtual terminals
/// (`spec.md` §4.1 "Virtual terminals ... only producible by a custom
/// tokenizer hook"). Since a virtual terminal has no backing regex or
/// matched text, the hook supplies the semantic value directly rather
/// than leaving it to a transform callback.
pub trait TokenizerHook<V> {
  fn try_produce(&mut self, cursor: Position, lr_state: LrStateId) -> Option<(TerminalId, V)>;
}
