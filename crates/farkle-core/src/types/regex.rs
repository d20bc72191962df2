use std::fmt;

/// An inclusive, sorted, disjoint range of Unicode scalar values. `spec.md`
/// §3 requires character ranges to be sorted and disjoint; [`CharRanges`]
/// maintains that invariant on construction rather than trusting callers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CharRanges(Vec<(char, char)>);

impl CharRanges {
  /// Builds a [`CharRanges`] from arbitrary (possibly overlapping,
  /// possibly unsorted) ranges, merging and sorting them.
  pub fn from_ranges(mut ranges: Vec<(char, char)>) -> Self {
    ranges.retain(|(lo, hi)| lo <= hi);
    ranges.sort_by_key(|(lo, _)| *lo);
    let mut merged: Vec<(char, char)> = Vec::with_capacity(ranges.len());
    for (lo, hi) in ranges {
      match merged.last_mut() {
        Some(last) if (last.1 as u32).saturating_add(1) >= lo as u32 => {
          last.1 = last.1.max(hi);
        }
        _ => merged.push((lo, hi)),
      }
    }
    CharRanges(merged)
  }

  pub fn single(c: char) -> Self {
    CharRanges(vec![(c, c)])
  }

  pub fn ranges(&self) -> &[(char, char)] {
    &self.0
  }

  pub fn contains(&self, c: char) -> bool {
    self
      .0
      .binary_search_by(|(lo, hi)| {
        if c < *lo {
          std::cmp::Ordering::Greater
        } else if c > *hi {
          std::cmp::Ordering::Less
        } else {
          std::cmp::Ordering::Equal
        }
      })
      .is_ok()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// The complement of this set over the full scalar-value range, used to
  /// implement `AllButChars` and negated classes (`[^...]`, `\D`, `\S`,
  /// `\P{...}`).
  pub fn negate(&self) -> CharRanges {
    let mut out = Vec::new();
    let mut cursor: u32 = 0;
    for &(lo, hi) in &self.0 {
      let lo_u = lo as u32;
      if lo_u > cursor {
        push_scalar_range(&mut out, cursor, lo_u - 1);
      }
      cursor = (hi as u32).saturating_add(1);
    }
    if cursor <= char::MAX as u32 {
      push_scalar_range(&mut out, cursor, char::MAX as u32);
    }
    CharRanges(out)
  }
}

fn push_scalar_range(out: &mut Vec<(char, char)>, lo: u32, hi: u32) {
  // Surrogate code points (0xD800..=0xDFFF) are not valid `char`s; splitting
  // a complement range across that gap keeps every emitted range valid.
  const SURROGATE_LO: u32 = 0xD800;
  const SURROGATE_HI: u32 = 0xDFFF;
  let lo = lo.min(0x10FFFF);
  let hi = hi.min(0x10FFFF);
  if lo > hi {
    return;
  }
  if hi < SURROGATE_LO || lo > SURROGATE_HI {
    if let (Some(l), Some(h)) = (char::from_u32(lo), char::from_u32(hi)) {
      out.push((l, h));
    }
    return;
  }
  if lo < SURROGATE_LO {
    if let (Some(l), Some(h)) = (char::from_u32(lo), char::from_u32(SURROGATE_LO - 1)) {
      out.push((l, h));
    }
  }
  if hi > SURROGATE_HI {
    if let (Some(l), Some(h)) = (char::from_u32(SURROGATE_HI + 1), char::from_u32(hi)) {
      out.push((l, h));
    }
  }
}

/// The regex AST, a closed sum type per `spec.md` §3. Built either
/// programmatically by a caller or parsed from a pattern string by
/// `farkle-dfa`'s pattern parser.
#[derive(Debug, Clone, PartialEq)]
pub enum RegexAst {
  /// Matches any single character. Given lower priority than any concrete
  /// class in the same DFA state (`spec.md` §4.3 item 5, §9).
  Any,
  Chars(CharRanges),
  AllButChars(CharRanges),
  Concat(Vec<RegexAst>),
  Alt(Vec<RegexAst>),
  Loop {
    inner: Box<RegexAst>,
    min: usize,
    max: Option<usize>,
  },
  /// A pattern string that has not yet been parsed into a concrete AST.
  /// Parsing is performed lazily by `farkle-dfa::pattern::parse` the first
  /// time the regex is compiled, and the result is not cached on this
  /// variant — callers that compile the same terminal repeatedly should
  /// parse eagerly with [`RegexAst::parse`].
  StringPattern(String),
}

impl RegexAst {
  pub fn literal(s: &str) -> RegexAst {
    RegexAst::Concat(s.chars().map(|c| RegexAst::Chars(CharRanges::single(c))).collect())
  }

  pub fn opt(self) -> RegexAst {
    RegexAst::Loop { inner: Box::new(self), min: 0, max: Some(1) }
  }

  pub fn star(self) -> RegexAst {
    RegexAst::Loop { inner: Box::new(self), min: 0, max: None }
  }

  pub fn plus(self) -> RegexAst {
    RegexAst::Loop { inner: Box::new(self), min: 1, max: None }
  }

  /// True if this AST, without running full NFA analysis, is *structurally*
  /// guaranteed to match the empty string (all branches nullable). Used by
  /// the builder's analysis pass (`spec.md` §4.1 item 5) for a cheap
  /// early check; the DFA compiler performs the authoritative check via
  /// NFA epsilon-closure (`spec.md` §4.3 "Failure").
  pub fn is_structurally_nullable(&self) -> bool {
    match self {
      RegexAst::Any | RegexAst::Chars(_) | RegexAst::AllButChars(_) => false,
      RegexAst::StringPattern(s) => s.is_empty(),
      RegexAst::Concat(parts) => parts.iter().all(RegexAst::is_structurally_nullable),
      RegexAst::Alt(parts) => parts.iter().any(RegexAst::is_structurally_nullable),
      RegexAst::Loop { inner, min, .. } => *min == 0 || inner.is_structurally_nullable(),
    }
  }
}

impl fmt::Display for RegexAst {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RegexAst::Any => f.write_str("."),
      RegexAst::Chars(ranges) => write!(f, "[{} ranges]", ranges.ranges().len()),
      RegexAst::AllButChars(ranges) => write!(f, "[^{} ranges]", ranges.ranges().len()),
      RegexAst::Concat(parts) => {
        for p in parts {
          write!(f, "{p}")?;
        }
        Ok(())
      }
      RegexAst::Alt(parts) => {
        for (i, p) in parts.iter().enumerate() {
          if i > 0 {
            f.write_str("|")?;
          }
          write!(f, "{p}")?;
        }
        Ok(())
      }
      RegexAst::Loop { inner, min, max } => match max {
        Some(max) if *min == 0 && *max == 1 => write!(f, "({inner})?"),
        None if *min == 0 => write!(f, "({inner})*"),
        None if *min == 1 => write!(f, "({inner})+"),
        Some(max) => write!(f, "({inner}){{{min},{max}}}"),
        None => write!(f, "({inner}){{{min},}}"),
      },
      RegexAst::StringPattern(s) => write!(f, "/{s}/"),
    }
  }
}
