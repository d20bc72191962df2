use super::{handles::PrecedenceToken, handles::TerminalId, regex::RegexAst};

#[bitmask_enum::bitmask(u8)]
/// Attribute flags carried by every terminal, per `spec.md` §3.
///
/// Mirrors the reference toolchain's use of `bitmask_enum` for its own
/// `RecursionType` and `SherpaErrorSeverity` flag sets.
pub enum TerminalAttributes {
  /// Ordinary terminal, reported to the parser.
  Terminal,
  /// Skipped by the tokenizer when `auto_whitespace` is enabled and the
  /// group stack is empty; never reaches the LR driver.
  Noise,
  /// Excluded from a syntax error's "expected" set (`spec.md` §7).
  Hidden,
  /// Starts a group (`spec.md` §3, Group).
  GroupStart,
  /// Ends a group.
  GroupEnd,
  /// The distinguished `newline` terminal (`spec.md` §4.1).
  Newline,
  /// Carries a globally unique special name (`spec.md` §3 invariant).
  SpecialNamed,
}

impl Default for TerminalAttributes {
  fn default() -> Self {
    TerminalAttributes::Terminal
  }
}

/// A terminal symbol: a stable handle, a display name, attribute flags, and
/// (for all but virtual terminals) a regex defining its lexical language.
#[derive(Debug, Clone)]
pub struct Terminal {
  pub id: TerminalId,
  /// Informational only — not required to be unique, except when
  /// `attributes` includes `SPECIAL_NAMED` (`spec.md` §3 invariant).
  pub name: String,
  pub attributes: TerminalAttributes,
  /// `None` for virtual terminals (`spec.md` §4.1): no regex, only
  /// producible via the tokenizer hook (`spec.md` §6).
  pub regex: Option<RegexAst>,
  /// An override name set via `rename()` (`spec.md` §4.1). When present,
  /// this is preferred over `name` for diagnostics and the "expected set".
  pub display_override: Option<String>,
  /// Set when this terminal was created via `literal(...)`; canonical
  /// content used for deduplication.
  pub literal_content: Option<String>,
  /// The precedence token the operator scope uses to look up this
  /// terminal's shift precedence (`spec.md` §4.4 step 4, §4.5: "literals
  /// are auto-mapped to the terminal recognising them"). `None` for
  /// terminals never entered into an associativity group.
  pub precedence_token: Option<PrecedenceToken>,
}

impl Terminal {
  pub fn display_name(&self) -> &str {
    self.display_override.as_deref().unwrap_or(&self.name)
  }

  pub fn is_virtual(&self) -> bool {
    self.regex.is_none()
  }

  pub fn is_noise(&self) -> bool {
    self.attributes.contains(TerminalAttributes::Noise)
  }

  pub fn is_hidden(&self) -> bool {
    self.attributes.contains(TerminalAttributes::Hidden)
  }
}
