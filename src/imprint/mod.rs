//! Imprint discovery: ranking, classification, hub rescue, field extraction
//! and the per-URL pipeline tying them together.

pub mod classifier;
pub mod extraction;
pub mod pipeline;
pub mod ranker;
pub mod rescue;

pub use classifier::{Classification, classify};
pub use pipeline::{ImprintPipeline, parse_input_url};
pub use ranker::rank;
pub use rescue::maybe_rescue;
