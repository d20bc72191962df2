//! The shared data model, builder front-end, binary artifact codec, and
//! legacy grammar import for the Farkle parser-construction toolchain
//! (`spec.md` §3, §4.1, §4.6, §6). The DFA compiler, LALR table
//! generator, and runtime driver are separate crates built on top of the
//! types exported here.

pub mod artifact;
pub mod builder;
pub mod legacy;
pub mod types;

pub use artifact::{DecodedArtifact, GrammarArtifact};
pub use builder::{analyze, BuildContext, BuilderConfig, GrammarBuilder, GrammarDefinition};
pub use legacy::{import as import_legacy_grammar, LegacyGrammar};
