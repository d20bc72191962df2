//! Thompson-style NFA construction from a set of tagged regular
//! expressions (`spec.md` §4.3 item 1).

use farkle_core::types::{CharRanges, FarkleError, RegexAst, TerminalId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NfaStateId(pub usize);

/// An accept tag carried by a final NFA state: the terminal it completes
/// and the input position of that terminal's pattern, used for
/// accept-priority resolution (`spec.md` §4.3 item 3).
#[derive(Debug, Clone, Copy)]
pub struct AcceptTag {
  pub terminal: TerminalId,
  pub input_position: u32,
}

#[derive(Debug, Default)]
pub struct NfaState {
  pub epsilons: Vec<NfaStateId>,
  pub ranges: Vec<(char, char, NfaStateId)>,
  pub accept: Option<AcceptTag>,
}

#[derive(Debug)]
pub struct Nfa {
  pub states: Vec<NfaState>,
  pub start: NfaStateId,
}

impl Nfa {
  fn new_state(&mut self) -> NfaStateId {
    let id = NfaStateId(self.states.len());
    self.states.push(NfaState::default());
    id
  }

  fn add_epsilon(&mut self, from: NfaStateId, to: NfaStateId) {
    self.states[from.0].epsilons.push(to);
  }

  fn add_range(&mut self, from: NfaStateId, lo: char, hi: char, to: NfaStateId) {
    self.states[from.0].ranges.push((lo, hi, to));
  }
}

/// Builds a combined NFA over every `(regex, terminal)` pair, tagging each
/// accepting state with its terminal and input position (`spec.md` §4.3
/// item 1). `RegexAst::StringPattern` entries are parsed via
/// [`crate::pattern::parse`] before construction.
pub fn build(inputs: &[(RegexAst, TerminalId)]) -> Result<Nfa, FarkleError> {
  let mut nfa = Nfa { states: Vec::new(), start: NfaStateId(0) };
  let start = nfa.new_state();
  nfa.start = start;

  for (position, (regex, terminal)) in inputs.iter().enumerate() {
    let resolved;
    let regex = match regex {
      RegexAst::StringPattern(s) => {
        resolved = crate::pattern::parse(s)?;
        &resolved
      }
      other => other,
    };
    let (frag_start, frag_end) = build_fragment(&mut nfa, regex)?;
    nfa.add_epsilon(start, frag_start);
    nfa.states[frag_end.0].accept = Some(AcceptTag { terminal: *terminal, input_position: position as u32 });
  }

  Ok(nfa)
}

/// Returns `(entry, exit)` states for `regex`, with no transitions out of
/// `exit` yet (the caller attaches whatever follows, or marks it accepting).
fn build_fragment(nfa: &mut Nfa, regex: &RegexAst) -> Result<(NfaStateId, NfaStateId), FarkleError> {
  match regex {
    RegexAst::Any => {
      let (a, b) = (nfa.new_state(), nfa.new_state());
      nfa.add_range(a, '\u{0}', char::MAX, b);
      Ok((a, b))
    }
    RegexAst::Chars(ranges) => build_ranges_fragment(nfa, ranges),
    RegexAst::AllButChars(ranges) => build_ranges_fragment(nfa, &ranges.negate()),
    RegexAst::Concat(parts) => {
      if parts.is_empty() {
        let s = nfa.new_state();
        return Ok((s, s));
      }
      let mut iter = parts.iter();
      let (mut entry, mut exit) = build_fragment(nfa, iter.next().unwrap())?;
      let first_entry = entry;
      for part in iter {
        let (next_entry, next_exit) = build_fragment(nfa, part)?;
        nfa.add_epsilon(exit, next_entry);
        entry = next_entry;
        exit = next_exit;
      }
      Ok((first_entry, exit))
    }
    RegexAst::Alt(branches) => {
      let entry = nfa.new_state();
      let exit = nfa.new_state();
      for branch in branches {
        let (b_entry, b_exit) = build_fragment(nfa, branch)?;
        nfa.add_epsilon(entry, b_entry);
        nfa.add_epsilon(b_exit, exit);
      }
      Ok((entry, exit))
    }
    RegexAst::Loop { inner, min, max } => build_loop_fragment(nfa, inner, *min, *max),
    RegexAst::StringPattern(s) => {
      let parsed = crate::pattern::parse(s)?;
      build_fragment(nfa, &parsed)
    }
  }
}

fn build_ranges_fragment(nfa: &mut Nfa, ranges: &CharRanges) -> Result<(NfaStateId, NfaStateId), FarkleError> {
  let a = nfa.new_state();
  let b = nfa.new_state();
  for &(lo, hi) in ranges.ranges() {
    nfa.add_range(a, lo, hi, b);
  }
  Ok((a, b))
}

fn build_loop_fragment(
  nfa: &mut Nfa,
  inner: &RegexAst,
  min: usize,
  max: Option<usize>,
) -> Result<(NfaStateId, NfaStateId), FarkleError> {
  match max {
    // Bounded repetition: unrolled as a concatenation of `min` mandatory
    // copies followed by `max - min` optional copies.
    Some(max) => {
      let entry = nfa.new_state();
      let mut cursor = entry;
      for _ in 0..min {
        let (f_entry, f_exit) = build_fragment(nfa, inner)?;
        nfa.add_epsilon(cursor, f_entry);
        cursor = f_exit;
      }
      let exit = nfa.new_state();
      nfa.add_epsilon(cursor, exit);
      for _ in min..max {
        let (f_entry, f_exit) = build_fragment(nfa, inner)?;
        nfa.add_epsilon(cursor, f_entry);
        cursor = f_exit;
        nfa.add_epsilon(cursor, exit);
      }
      Ok((entry, exit))
    }
    // Unbounded: `min` mandatory copies, then a Kleene star on the tail.
    None => {
      let entry = nfa.new_state();
      let mut cursor = entry;
      for _ in 0..min {
        let (f_entry, f_exit) = build_fragment(nfa, inner)?;
        nfa.add_epsilon(cursor, f_entry);
        cursor = f_exit;
      }
      let loop_entry = nfa.new_state();
      let loop_exit = nfa.new_state();
      nfa.add_epsilon(cursor, loop_entry);
      let (f_entry, f_exit) = build_fragment(nfa, inner)?;
      nfa.add_epsilon(loop_entry, f_entry);
      nfa.add_epsilon(f_exit, loop_entry);
      nfa.add_epsilon(loop_entry, loop_exit);
      Ok((entry, loop_exit))
    }
  }
}

/// The epsilon-closure of a set of NFA states, used both by subset
/// construction and by the nullable-terminal authoritative check
/// (`spec.md` §4.3 "Failure").
pub fn epsilon_closure(nfa: &Nfa, states: impl IntoIterator<Item = NfaStateId>) -> std::collections::BTreeSet<NfaStateId> {
  let mut seen: std::collections::BTreeSet<NfaStateId> = std::collections::BTreeSet::new();
  let mut stack: Vec<NfaStateId> = states.into_iter().collect();
  while let Some(s) = stack.pop() {
    if seen.insert(s) {
      for &next in &nfa.states[s.0].epsilons {
        stack.push(next);
      }
    }
  }
  seen
}

#[cfg(test)]
mod tests {
  use super::*;
  use farkle_core::types::CharRanges;

  #[test]
  fn builds_epsilon_closure_reaching_accept() {
    let inputs = vec![(RegexAst::Chars(CharRanges::single('a')), TerminalId(0))];
    let nfa = build(&inputs).unwrap();
    let closure = epsilon_closure(&nfa, [nfa.start]);
    assert!(closure.contains(&nfa.start));
  }

  #[test]
  fn empty_concat_is_nullable_via_closure() {
    let inputs = vec![(RegexAst::Concat(vec![]), TerminalId(0))];
    let nfa = build(&inputs).unwrap();
    let closure = epsilon_closure(&nfa, [nfa.start]);
    assert!(closure.iter().any(|s| nfa.states[s.0].accept.is_some()));
  }
}
