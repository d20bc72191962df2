//! Recursive-descent parser for the pattern language of `spec.md` §4.2,
//! producing a [`RegexAst`]. Whitespace inside a pattern string is
//! significant — there is no implicit `x`-mode.

use farkle_core::types::{CharRanges, FarkleError, RegexAst};

/// The closed set of named character classes recognised by `\p{Name}` /
/// `\P{Name}` (`spec.md` §4.2: "the repo documents a predefined list; any
/// name outside it is a parse error"). This workspace's list.
fn named_class(name: &str) -> Option<CharRanges> {
  match name {
    "Alpha" => Some(CharRanges::from_ranges(vec![('a', 'z'), ('A', 'Z')])),
    "Digit" => Some(CharRanges::from_ranges(vec![('0', '9')])),
    "Alnum" => Some(CharRanges::from_ranges(vec![('a', 'z'), ('A', 'Z'), ('0', '9')])),
    "Upper" => Some(CharRanges::from_ranges(vec![('A', 'Z')])),
    "Lower" => Some(CharRanges::from_ranges(vec![('a', 'z')])),
    "Space" => Some(whitespace_ranges()),
    _ => None,
  }
}

fn whitespace_ranges() -> CharRanges {
  CharRanges::from_ranges(vec![(' ', ' '), ('\t', '\t'), ('\n', '\n'), ('\r', '\r')])
}

fn digit_ranges() -> CharRanges {
  CharRanges::from_ranges(vec![('0', '9')])
}

/// Parses a complete pattern string into a [`RegexAst`]
/// (`spec.md` §4.2). Called lazily the first time a
/// [`RegexAst::StringPattern`] is compiled.
pub fn parse(pattern: &str) -> Result<RegexAst, FarkleError> {
  let chars: Vec<char> = pattern.chars().collect();
  let mut p = Parser { chars: &chars, pos: 0 };
  let ast = p.parse_alt()?;
  if p.pos != p.chars.len() {
    return Err(FarkleError::UnsupportedFormat {
      detail: format!("unexpected trailing character '{}' in pattern `{pattern}`", p.chars[p.pos]),
    });
  }
  Ok(ast)
}

struct Parser<'a> {
  chars: &'a [char],
  pos: usize,
}

impl<'a> Parser<'a> {
  fn peek(&self) -> Option<char> {
    self.chars.get(self.pos).copied()
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.peek();
    if c.is_some() {
      self.pos += 1;
    }
    c
  }

  fn expect(&mut self, c: char) -> Result<(), FarkleError> {
    if self.bump() == Some(c) {
      Ok(())
    } else {
      Err(FarkleError::UnsupportedFormat { detail: format!("expected '{c}' in pattern") })
    }
  }

  // alternation: lowest precedence
  fn parse_alt(&mut self) -> Result<RegexAst, FarkleError> {
    let mut branches = vec![self.parse_concat()?];
    while self.peek() == Some('|') {
      self.bump();
      branches.push(self.parse_concat()?);
    }
    Ok(if branches.len() == 1 { branches.pop().unwrap() } else { RegexAst::Alt(branches) })
  }

  fn parse_concat(&mut self) -> Result<RegexAst, FarkleError> {
    let mut parts = Vec::new();
    while let Some(c) = self.peek() {
      if c == '|' || c == ')' {
        break;
      }
      parts.push(self.parse_quantified()?);
    }
    Ok(match parts.len() {
      0 => RegexAst::Concat(Vec::new()),
      1 => parts.pop().unwrap(),
      _ => RegexAst::Concat(parts),
    })
  }

  fn parse_quantified(&mut self) -> Result<RegexAst, FarkleError> {
    let atom = self.parse_atom()?;
    match self.peek() {
      Some('?') => {
        self.bump();
        Ok(atom.opt())
      }
      Some('*') => {
        self.bump();
        Ok(atom.star())
      }
      Some('+') => {
        self.bump();
        Ok(atom.plus())
      }
      Some('{') => {
        self.bump();
        let (min, max) = self.parse_bounds()?;
        self.expect('}')?;
        if let Some(max) = max {
          if min > max {
            return Err(FarkleError::UnsupportedFormat { detail: format!("invalid quantifier bounds {{{min},{max}}}: m > n") });
          }
        }
        Ok(RegexAst::Loop { inner: Box::new(atom), min, max })
      }
      _ => Ok(atom),
    }
  }

  fn parse_bounds(&mut self) -> Result<(usize, Option<usize>), FarkleError> {
    let min = self.parse_number()?;
    if self.peek() == Some(',') {
      self.bump();
      if self.peek() == Some('}') {
        Ok((min, None))
      } else {
        let max = self.parse_number()?;
        Ok((min, Some(max)))
      }
    } else {
      Ok((min, Some(min)))
    }
  }

  fn parse_number(&mut self) -> Result<usize, FarkleError> {
    let start = self.pos;
    while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
      self.bump();
    }
    if self.pos == start {
      return Err(FarkleError::UnsupportedFormat { detail: "expected a number in quantifier".into() });
    }
    self.chars[start..self.pos]
      .iter()
      .collect::<String>()
      .parse()
      .map_err(|_| FarkleError::UnsupportedFormat { detail: "quantifier number out of range".into() })
  }

  fn parse_atom(&mut self) -> Result<RegexAst, FarkleError> {
    match self.bump() {
      Some('.') => Ok(RegexAst::Any),
      Some('(') => {
        let inner = self.parse_alt()?;
        self.expect(')')?;
        Ok(inner)
      }
      Some('[') => self.parse_class(),
      Some('\\') => self.parse_escape(),
      Some(c) => Ok(RegexAst::Chars(CharRanges::single(c))),
      None => Err(FarkleError::UnsupportedFormat { detail: "unexpected end of pattern".into() }),
    }
  }

  fn parse_escape(&mut self) -> Result<RegexAst, FarkleError> {
    match self.bump() {
      Some('d') => Ok(RegexAst::Chars(digit_ranges())),
      Some('D') => Ok(RegexAst::AllButChars(digit_ranges())),
      Some('s') => Ok(RegexAst::Chars(whitespace_ranges())),
      Some('S') => Ok(RegexAst::AllButChars(whitespace_ranges())),
      Some('p') => Ok(RegexAst::Chars(self.parse_named_class()?)),
      Some('P') => Ok(RegexAst::AllButChars(self.parse_named_class()?)),
      Some(c) => Ok(RegexAst::Chars(CharRanges::single(c))),
      None => Err(FarkleError::UnsupportedFormat { detail: "dangling '\\' at end of pattern".into() }),
    }
  }

  fn parse_named_class(&mut self) -> Result<CharRanges, FarkleError> {
    self.expect('{')?;
    let start = self.pos;
    while self.peek().map(|c| c != '}').unwrap_or(false) {
      self.bump();
    }
    let name: String = self.chars[start..self.pos].iter().collect();
    self.expect('}')?;
    named_class(&name).ok_or_else(|| FarkleError::UnsupportedFormat { detail: format!("unknown named character set `{name}`") })
  }

  fn parse_class(&mut self) -> Result<RegexAst, FarkleError> {
    let negate = self.peek() == Some('^');
    if negate {
      self.bump();
    }
    let mut ranges = Vec::new();
    while self.peek().map(|c| c != ']').unwrap_or(false) {
      let lo = self.parse_class_char()?;
      if self.peek() == Some('-') && self.chars.get(self.pos + 1).map(|&c| c != ']').unwrap_or(false) {
        self.bump();
        let hi = self.parse_class_char()?;
        ranges.push((lo, hi));
      } else {
        ranges.push((lo, lo));
      }
    }
    self.expect(']')?;
    let set = CharRanges::from_ranges(ranges);
    Ok(if negate { RegexAst::AllButChars(set) } else { RegexAst::Chars(set) })
  }

  fn parse_class_char(&mut self) -> Result<char, FarkleError> {
    match self.bump() {
      Some('\\') => self
        .bump()
        .ok_or_else(|| FarkleError::UnsupportedFormat { detail: "dangling '\\' inside character class".into() }),
      Some(c) => Ok(c),
      None => Err(FarkleError::UnsupportedFormat { detail: "unterminated character class".into() }),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_literal_concat() {
    let ast = parse("ab").unwrap();
    assert_eq!(ast, RegexAst::Concat(vec![RegexAst::Chars(CharRanges::single('a')), RegexAst::Chars(CharRanges::single('b'))]));
  }

  #[test]
  fn parses_alternation_and_quantifiers() {
    let ast = parse("a|b*").unwrap();
    match ast {
      RegexAst::Alt(branches) => assert_eq!(branches.len(), 2),
      other => panic!("expected Alt, got {other:?}"),
    }
  }

  #[test]
  fn parses_class_with_range() {
    let ast = parse("[a-z0-9]").unwrap();
    match ast {
      RegexAst::Chars(ranges) => assert!(ranges.contains('m') && ranges.contains('5') && !ranges.contains('!')),
      other => panic!("expected Chars, got {other:?}"),
    }
  }

  #[test]
  fn rejects_bad_quantifier_bounds() {
    assert!(parse("a{3,1}").is_err());
  }

  #[test]
  fn rejects_unknown_named_class() {
    assert!(parse("\\p{Nope}").is_err());
  }
}
