//! Hopcroft partition-refinement minimization (`spec.md` §4.3 item 4):
//! states with different accept tags are initially distinguishable.

use std::collections::{BTreeSet, VecDeque};

use farkle_core::types::{CompiledDfa, DfaState, DfaStateId, TerminalId};

/// Minimizes `dfa` in place, returning the equivalent minimal automaton.
/// The minimized states drop the compact `.`-default representation in
/// favor of fully explicit edges over the refined alphabet; this keeps the
/// algorithm simple at the cost of a slightly larger edge table.
pub fn minimize(dfa: CompiledDfa) -> CompiledDfa {
  let n = dfa.states.len();
  if n == 0 {
    return dfa;
  }

  let reps = alphabet_representatives(&dfa.states);
  // `trans[s][c]` = the state reached from state `s` on the representative
  // character of class `c`, or `None` if that character has no transition.
  let trans: Vec<Vec<Option<usize>>> =
    (0..n).map(|s| reps.iter().map(|&ch| dfa.states[s].transition(ch).map(|t| t.index())).collect()).collect();

  let mut groups: std::collections::BTreeMap<Option<TerminalId>, BTreeSet<usize>> = Default::default();
  for s in 0..n {
    groups.entry(dfa.states[s].accept).or_default().insert(s);
  }
  let mut partition: Vec<BTreeSet<usize>> = groups.into_values().collect();
  let mut worklist: VecDeque<BTreeSet<usize>> = partition.iter().cloned().collect();

  while let Some(a) = worklist.pop_front() {
    for c in 0..reps.len() {
      let preimage: BTreeSet<usize> = (0..n).filter(|&s| trans[s][c].map(|t| a.contains(&t)).unwrap_or(false)).collect();
      if preimage.is_empty() {
        continue;
      }
      let mut next_partition = Vec::with_capacity(partition.len());
      for block in &partition {
        let inter: BTreeSet<usize> = block.intersection(&preimage).copied().collect();
        let diff: BTreeSet<usize> = block.difference(&preimage).copied().collect();
        if inter.is_empty() || diff.is_empty() {
          next_partition.push(block.clone());
          continue;
        }
        if let Some(pos) = worklist.iter().position(|w| w == block) {
          worklist.remove(pos);
          worklist.push_back(inter.clone());
          worklist.push_back(diff.clone());
        } else if inter.len() <= diff.len() {
          worklist.push_back(inter.clone());
        } else {
          worklist.push_back(diff.clone());
        }
        next_partition.push(inter);
        next_partition.push(diff);
      }
      partition = next_partition;
    }
  }

  rebuild(&dfa, &reps, &trans, &partition)
}

/// One representative character per maximal interval over which every
/// state's transition decision is constant, mirroring the boundary
/// technique `subset_construction` uses to avoid enumerating every
/// Unicode scalar value individually.
fn alphabet_representatives(states: &[DfaState]) -> Vec<char> {
  let mut boundaries: BTreeSet<u32> = BTreeSet::new();
  boundaries.insert(0);
  for state in states {
    for &(lo, hi, _) in &state.edges {
      boundaries.insert(lo as u32);
      let next = (hi as u32).saturating_add(1);
      if next <= 0x10FFFF {
        boundaries.insert(next);
      }
    }
  }
  boundaries.into_iter().filter_map(char::from_u32).collect()
}

fn rebuild(dfa: &CompiledDfa, reps: &[char], trans: &[Vec<Option<usize>>], partition: &[BTreeSet<usize>]) -> CompiledDfa {
  let block_of: Vec<usize> = {
    let mut map = vec![0usize; dfa.states.len()];
    for (block_id, block) in partition.iter().enumerate() {
      for &s in block {
        map[s] = block_id;
      }
    }
    map
  };

  let mut new_states: Vec<DfaState> = Vec::with_capacity(partition.len());
  for block in partition {
    let representative = *block.iter().next().expect("partition blocks are never empty");
    let accept = dfa.states[representative].accept;
    let mut edges: Vec<(char, char, DfaStateId)> = Vec::new();
    let mut run: Option<(char, usize)> = None;
    for (c, &rep_char) in reps.iter().enumerate() {
      let target = trans[representative][c].map(|t| block_of[t]);
      let continues_run = matches!((&run, target), (Some((_, run_target)), Some(t)) if *run_target == t);
      if !continues_run {
        if let Some((lo, run_target)) = run.take() {
          edges.push((lo, prev_char(rep_char), DfaStateId(run_target as u32)));
        }
        run = target.map(|t| (rep_char, t));
      }
    }
    if let Some((lo, run_target)) = run {
      edges.push((lo, char::MAX, DfaStateId(run_target as u32)));
    }
    new_states.push(DfaState { edges, accept, default: None });
  }

  CompiledDfa { start_state: DfaStateId(block_of[dfa.start_state.index()] as u32), states: new_states }
}

fn prev_char(c: char) -> char {
  char::from_u32((c as u32).saturating_sub(1)).unwrap_or(c)
}

#[cfg(test)]
mod tests {
  use super::*;
  use farkle_core::types::{CharRanges, RegexAst, TerminalId};

  #[test]
  fn minimizing_a_single_pattern_preserves_matches() {
    let inputs = vec![(RegexAst::literal("ab"), TerminalId(0))];
    let nfa = crate::nfa::build(&inputs).unwrap();
    let result = crate::subset_construction::subset_construct(&nfa, false).unwrap();
    let minimized = minimize(result.dfa);

    let s0 = minimized.start_state;
    let s1 = minimized.state(s0).transition('a').expect("a");
    let s2 = minimized.state(s1).transition('b').expect("b");
    assert_eq!(minimized.state(s2).accept, Some(TerminalId(0)));
  }

  #[test]
  fn merges_equivalent_states() {
    // "a(c|c)" has two redundant branches that should collapse to one state.
    let inputs = vec![(
      RegexAst::Concat(vec![
        RegexAst::Chars(CharRanges::single('a')),
        RegexAst::Alt(vec![RegexAst::Chars(CharRanges::single('c')), RegexAst::Chars(CharRanges::single('c'))]),
      ]),
      TerminalId(0),
    )];
    let nfa = crate::nfa::build(&inputs).unwrap();
    let result = crate::subset_construction::subset_construct(&nfa, false).unwrap();
    let before = result.dfa.states.len();
    let minimized = minimize(result.dfa);
    assert!(minimized.states.len() <= before);
  }
}
