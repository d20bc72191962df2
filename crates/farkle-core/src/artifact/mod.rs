//! The binary grammar artifact (`spec.md` §4.6): a serializable,
//! closure-free container for a [`GrammarDefinition`] plus its optional
//! compiled automata. Semantic callbacks never travel inside this
//! container — see [`crate::types::SemanticCallbacks`].

mod codec;
mod heap;

use std::sync::OnceLock;

use crate::builder::GrammarDefinition;
use crate::types::{CompiledDfa, CompiledLr, FarkleError};

pub use codec::DecodedArtifact;

/// An immutable, versioned byte buffer holding an encoded grammar
/// (`spec.md` §4.6 Invariants: "immutable after emission", "the artifact's
/// data buffer is the single owner of all grammar data"). Decoding is
/// performed on first access and cached.
pub struct GrammarArtifact {
  bytes: Vec<u8>,
  decoded: OnceLock<DecodedArtifact>,
}

impl GrammarArtifact {
  /// Encodes a grammar definition and its optional compiled automata into
  /// a new artifact.
  pub fn encode(def: &GrammarDefinition, dfa: Option<&CompiledDfa>, lr: Option<&CompiledLr>) -> Self {
    GrammarArtifact { bytes: codec::encode(def, dfa, lr), decoded: OnceLock::new() }
  }

  /// Wraps a byte buffer produced by a previous call to [`Self::encode`]
  /// (or read from disk). Decoding is deferred to [`Self::decode`].
  pub fn from_bytes(bytes: Vec<u8>) -> Self {
    GrammarArtifact { bytes, decoded: OnceLock::new() }
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.bytes
  }

  pub fn into_bytes(self) -> Vec<u8> {
    self.bytes
  }

  /// Decodes the artifact, caching the result so repeated calls are free.
  /// Unknown streams (from a newer minor version) are skipped rather than
  /// rejected (`spec.md` §4.6 forward-compatibility rule); check
  /// [`DecodedArtifact::has_unknown_data`] if that matters to the caller.
  pub fn decode(&self) -> Result<&DecodedArtifact, FarkleError> {
    if self.decoded.get().is_none() {
      let decoded = codec::decode(&self.bytes)?;
      let _ = self.decoded.set(decoded);
    }
    Ok(self.decoded.get().expect("just initialized"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::builder::{analyze, BuilderConfig, GrammarBuilder};
  use crate::types::{CharRanges, RegexAst, SymbolId};

  fn build_tiny_grammar() -> GrammarDefinition {
    let mut builder: GrammarBuilder<i64> = GrammarBuilder::new(BuilderConfig::default());
    let digit = builder.terminal(
      "digit",
      RegexAst::Chars(CharRanges::from_ranges(vec![('0', '9')])),
      std::sync::Arc::new(|_pos: crate::types::Position, text: &str| Ok(text.parse::<i64>().unwrap_or(0))),
    );
    let start = builder.nonterminal("Start");
    let prod = builder
      .production(start)
      .extend(SymbolId::Terminal(digit))
      .finish(&mut builder, |children: &[i64], _| Ok(children[0]));
    builder.set_productions(start, vec![prod]);
    builder.set_start_nonterminal(start);
    let (def, _callbacks, diagnostics) = analyze(builder);
    assert!(!diagnostics.has_errors());
    def
  }

  #[test]
  fn round_trips_a_grammar_definition() {
    let def = build_tiny_grammar();
    let artifact = GrammarArtifact::encode(&def, None, None);
    let decoded = artifact.decode().expect("decode");
    assert_eq!(decoded.grammar.terminals.len(), def.terminals.len());
    assert_eq!(decoded.grammar.nonterminals.len(), def.nonterminals.len());
    assert_eq!(decoded.grammar.productions.len(), def.productions.len());
    assert_eq!(decoded.grammar.start, def.start);
    assert!(decoded.dfa.is_none());
    assert!(decoded.lr.is_none());
    assert!(!decoded.has_unknown_data);
  }

  #[test]
  fn rejects_bad_magic() {
    let bytes = vec![0u8; 32];
    let artifact = GrammarArtifact::from_bytes(bytes);
    assert!(artifact.decode().is_err());
  }

  #[test]
  fn skips_unknown_streams() {
    // Hand-assemble a minimal valid artifact (an empty grammar) carrying
    // one extra, unrecognized stream, simulating a newer-minor-version
    // artifact read by an older decoder.
    let strings = vec![0u8];
    let blobs: Vec<u8> = Vec::new();
    let mut tables = Vec::new();
    for _ in 0..5 {
      tables.extend_from_slice(&0u32.to_le_bytes()); // 4 counts + start
    }
    tables.extend_from_slice(&u32::MAX.to_le_bytes()); // grammar_name: none
    tables.push(1); // case_sensitive
    tables.push(1); // auto_whitespace
    tables.extend_from_slice(&0u32.to_le_bytes()); // operator scope group count
    tables.push(0); // resolve_reduce_reduce
    let unknown = vec![0xABu8];

    let streams: Vec<(u32, &[u8])> = vec![(1, &strings), (2, &blobs), (3, &tables), (999, &unknown)];

    let mut bytes = Vec::new();
    bytes.extend_from_slice(codec::MAGIC);
    bytes.extend_from_slice(&codec::VERSION_MAJOR.to_le_bytes());
    bytes.extend_from_slice(&codec::VERSION_MINOR.to_le_bytes());
    bytes.extend_from_slice(&(streams.len() as u32).to_le_bytes());
    let index_start = bytes.len();
    bytes.resize(index_start + streams.len() * 12, 0);

    let mut entries = Vec::with_capacity(streams.len());
    for (id, data) in &streams {
      let offset = bytes.len() as u32;
      entries.push((*id, offset, data.len() as u32));
      bytes.extend_from_slice(data);
    }
    for (i, (id, offset, len)) in entries.into_iter().enumerate() {
      let pos = index_start + i * 12;
      bytes[pos..pos + 4].copy_from_slice(&id.to_le_bytes());
      bytes[pos + 4..pos + 8].copy_from_slice(&offset.to_le_bytes());
      bytes[pos + 8..pos + 12].copy_from_slice(&len.to_le_bytes());
    }

    let artifact = GrammarArtifact::from_bytes(bytes);
    let decoded = artifact.decode().expect("decode");
    assert!(decoded.has_unknown_data);
    assert_eq!(decoded.grammar.terminals.len(), 0);
  }
}
