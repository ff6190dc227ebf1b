pub mod builder;
pub mod pairwise;
pub mod setcover;
pub mod smt;
pub mod tree;
pub mod value;
pub mod writer;

pub use builder::{BuilderConfig, CandidateBuilder, OptionalMode, XmlSnippet};
pub use pairwise::{CoveringArray, PairwiseConfig, PairwiseGenerator, TestPattern};
pub use setcover::{generate_candidates, select_snippets, CandidateConfig, SetCoverConfig};
pub use tree::XmlElement;
pub use value::ValueSynthesizer;
pub use writer::OutputWriter;
