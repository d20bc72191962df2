//! Subset construction from an [`Nfa`] to a [`CompiledDfa`]
//! (`spec.md` §4.3 items 2–3, 5).

use std::collections::{BTreeMap, BTreeSet};

use farkle_core::types::{CompiledDfa, DfaState, DfaStateId, FarkleError, TerminalId};

use crate::nfa::{epsilon_closure, Nfa, NfaStateId};

/// An implementation cap on DFA state count (`spec.md` §4.3 "Failure":
/// "exceeding an implementation cap ≈ 2^31").
const MAX_STATES: usize = 1 << 20;

pub struct SubsetResult {
  pub dfa: CompiledDfa,
  pub diagnostics: Vec<FarkleError>,
}

/// Runs subset construction, then resolves accept-priority ties per
/// `spec.md` §4.3 item 3 and the "equal-length accept ties" open-question
/// decision recorded in `DESIGN.md`.
pub fn subset_construct(nfa: &Nfa, prioritise_by_order: bool) -> Result<SubsetResult, FarkleError> {
  let mut diagnostics = Vec::new();
  let start_set = epsilon_closure(nfa, [nfa.start]);

  let mut state_of: BTreeMap<BTreeSet<NfaStateId>, DfaStateId> = BTreeMap::new();
  let mut states: Vec<DfaState> = Vec::new();
  let mut queue: Vec<BTreeSet<NfaStateId>> = Vec::new();

  let start_id = DfaStateId(0);
  state_of.insert(start_set.clone(), start_id);
  states.push(DfaState::default());
  queue.push(start_set);

  while let Some(set) = queue.pop() {
    let id = state_of[&set];
    let (edges, default, accept) = build_transitions(nfa, &set, &mut state_of, &mut states, &mut queue)?;
    let accept = resolve_accept_priority(&accept, prioritise_by_order, &mut diagnostics);
    states[id.index()] = DfaState { edges, default, accept };
    if states.len() > MAX_STATES {
      return Err(FarkleError::UnsupportedFormat { detail: format!("DFA state count exceeds the {MAX_STATES} state cap") });
    }
  }

  Ok(SubsetResult { dfa: CompiledDfa { start_state: start_id, states }, diagnostics })
}

type AcceptCandidate = (TerminalId, u32);

#[allow(clippy::type_complexity)]
fn build_transitions(
  nfa: &Nfa,
  set: &BTreeSet<NfaStateId>,
  state_of: &mut BTreeMap<BTreeSet<NfaStateId>, DfaStateId>,
  states: &mut Vec<DfaState>,
  queue: &mut Vec<BTreeSet<NfaStateId>>,
) -> Result<(Vec<(char, char, DfaStateId)>, Option<DfaStateId>, Vec<AcceptCandidate>), FarkleError> {
  let mut boundaries: BTreeSet<u32> = BTreeSet::new();
  let mut any_range = false;
  let mut any_dot = false;
  for &s in set {
    for &(lo, hi, _) in &nfa.states[s.0].ranges {
      if lo == '\u{0}' && hi == char::MAX {
        any_dot = true;
        continue;
      }
      any_range = true;
      boundaries.insert(lo as u32);
      let next = (hi as u32).saturating_add(1);
      if next <= 0x10FFFF {
        boundaries.insert(next);
      }
    }
  }

  let mut accept: Vec<AcceptCandidate> = Vec::new();
  for &s in set {
    if let Some(tag) = nfa.states[s.0].accept {
      accept.push((tag.terminal, tag.input_position));
    }
  }

  if !any_range {
    let default = if any_dot { move_dot_and_close(nfa, set, state_of, states, queue) } else { None };
    return Ok((Vec::new(), default, accept));
  }

  let mut points: Vec<u32> = boundaries.into_iter().collect();
  points.sort_unstable();
  let mut edges = Vec::new();
  for window in points.windows(2) {
    let (lo_u, hi_u) = (window[0], window[1] - 1);
    if let (Some(lo), Some(hi)) = (char::from_u32(lo_u), char::from_u32(hi_u)) {
      if let Some(target) = move_and_close(nfa, set, lo, state_of, states, queue) {
        edges.push((lo, hi, target));
      }
    }
  }
  // The final boundary's open-ended tail, up to char::MAX.
  if let Some(&last) = points.last() {
    if last <= 0x10FFFF {
      if let Some(lo) = char::from_u32(last) {
        if let Some(target) = move_and_close(nfa, set, lo, state_of, states, queue) {
          edges.push((lo, char::MAX, target));
        }
      }
    }
  }

  let default = if any_dot { move_dot_and_close(nfa, set, state_of, states, queue) } else { None };

  Ok((edges, default, accept))
}

/// Like [`move_and_close`], but follows only the literal `.` edges (full
/// `'\u{0}'..=char::MAX` ranges), not narrow explicit ranges that happen
/// to start at `'\u{0}'`.
fn move_dot_and_close(
  nfa: &Nfa,
  set: &BTreeSet<NfaStateId>,
  state_of: &mut BTreeMap<BTreeSet<NfaStateId>, DfaStateId>,
  states: &mut Vec<DfaState>,
  queue: &mut Vec<BTreeSet<NfaStateId>>,
) -> Option<DfaStateId> {
  let mut moved: BTreeSet<NfaStateId> = BTreeSet::new();
  for &s in set {
    for &(lo, hi, target) in &nfa.states[s.0].ranges {
      if lo == '\u{0}' && hi == char::MAX {
        moved.insert(target);
      }
    }
  }
  close_into_state(nfa, moved, state_of, states, queue)
}

fn move_and_close(
  nfa: &Nfa,
  set: &BTreeSet<NfaStateId>,
  representative: char,
  state_of: &mut BTreeMap<BTreeSet<NfaStateId>, DfaStateId>,
  states: &mut Vec<DfaState>,
  queue: &mut Vec<BTreeSet<NfaStateId>>,
) -> Option<DfaStateId> {
  let mut moved: BTreeSet<NfaStateId> = BTreeSet::new();
  for &s in set {
    for &(lo, hi, target) in &nfa.states[s.0].ranges {
      if representative >= lo && representative <= hi {
        moved.insert(target);
      }
    }
  }
  close_into_state(nfa, moved, state_of, states, queue)
}

fn close_into_state(
  nfa: &Nfa,
  moved: BTreeSet<NfaStateId>,
  state_of: &mut BTreeMap<BTreeSet<NfaStateId>, DfaStateId>,
  states: &mut Vec<DfaState>,
  queue: &mut Vec<BTreeSet<NfaStateId>>,
) -> Option<DfaStateId> {
  if moved.is_empty() {
    return None;
  }
  let closure = epsilon_closure(nfa, moved);
  if let Some(&id) = state_of.get(&closure) {
    return Some(id);
  }
  let id = DfaStateId(states.len() as u32);
  state_of.insert(closure.clone(), id);
  states.push(DfaState::default());
  queue.push(closure);
  Some(id)
}

/// Resolves multiple simultaneous accept tags in one DFA state
/// (`spec.md` §4.3 item 3; open-question decision in `DESIGN.md`).
fn resolve_accept_priority(
  candidates: &[AcceptCandidate],
  prioritise_by_order: bool,
  diagnostics: &mut Vec<FarkleError>,
) -> Option<TerminalId> {
  if candidates.is_empty() {
    return None;
  }
  let distinct: BTreeSet<TerminalId> = candidates.iter().map(|(t, _)| *t).collect();
  if distinct.len() == 1 {
    return Some(*distinct.iter().next().unwrap());
  }
  let winner = candidates.iter().min_by_key(|(_, pos)| *pos).map(|(t, _)| *t);
  if !prioritise_by_order {
    diagnostics.push(FarkleError::DfaConflict {
      terminals: distinct.into_iter().collect(),
      detail: "multiple terminals accept the same input with no input-order priority requested".into(),
    });
  }
  winner
}

#[cfg(test)]
mod tests {
  use super::*;
  use farkle_core::types::{CharRanges, RegexAst};

  #[test]
  fn single_char_accepts() {
    let inputs = vec![(RegexAst::Chars(CharRanges::single('a')), TerminalId(0))];
    let nfa = crate::nfa::build(&inputs).unwrap();
    let result = subset_construct(&nfa, false).unwrap();
    assert!(result.diagnostics.is_empty());
    let start = result.dfa.state(result.dfa.start_state);
    let next = start.transition('a').expect("a should transition");
    assert_eq!(result.dfa.state(next).accept, Some(TerminalId(0)));
  }

  #[test]
  fn conflicting_equal_length_accepts_report_a_diagnostic() {
    let inputs = vec![
      (RegexAst::Chars(CharRanges::single('a')), TerminalId(0)),
      (RegexAst::Chars(CharRanges::single('a')), TerminalId(1)),
    ];
    let nfa = crate::nfa::build(&inputs).unwrap();
    let result = subset_construct(&nfa, false).unwrap();
    assert_eq!(result.diagnostics.len(), 1);
  }

  #[test]
  fn prioritise_by_order_suppresses_the_diagnostic() {
    let inputs = vec![
      (RegexAst::Chars(CharRanges::single('a')), TerminalId(0)),
      (RegexAst::Chars(CharRanges::single('a')), TerminalId(1)),
    ];
    let nfa = crate::nfa::build(&inputs).unwrap();
    let result = subset_construct(&nfa, true).unwrap();
    assert!(result.diagnostics.is_empty());
    let start = result.dfa.state(result.dfa.start_state);
    let next = start.transition('a').unwrap();
    assert_eq!(result.dfa.state(next).accept, Some(TerminalId(0)));
  }
}
