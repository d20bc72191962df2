use std::collections::BTreeSet;

use super::handles::{GroupId, TerminalId};

/// A group's end condition (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupEnd {
  /// A block group, ended by a specific terminal.
  Token(TerminalId),
  /// A line group, ended by end-of-line (the tokenizer's newline
  /// recognition, not necessarily a declared `newline` terminal).
  EndOfLine,
}

#[bitmask_enum::bitmask(u8)]
/// Group behavior flags, per `spec.md` §3.
pub enum GroupFlags {
  /// Unmatched characters inside the group are consumed one at a time
  /// rather than as the longest matching noise run.
  AdvanceByCharacter,
  /// The end-condition text is included in the emitted container token.
  KeepEndToken,
  /// End-of-input is itself a valid terminator for this group.
  EndsOnEndOfInput,
}

impl Default for GroupFlags {
  fn default() -> Self {
    GroupFlags::none()
  }
}

/// A lexical context consumed by the tokenizer as a single token
/// (`spec.md` §3, §4.7).
#[derive(Debug, Clone)]
pub struct Group {
  pub id: GroupId,
  pub start: TerminalId,
  pub end: GroupEnd,
  /// What the group is reported to the parser as.
  pub container: TerminalId,
  pub flags: GroupFlags,
  /// Groups that may legally start while this one is active.
  pub allowed_nesting: BTreeSet<GroupId>,
}

impl Group {
  pub fn advance_by_character(&self) -> bool {
    self.flags.contains(GroupFlags::AdvanceByCharacter)
  }

  pub fn keep_end_token(&self) -> bool {
    self.flags.contains(GroupFlags::KeepEndToken)
  }

  pub fn ends_on_end_of_input(&self) -> bool {
    self.flags.contains(GroupFlags::EndsOnEndOfInput)
  }
}
