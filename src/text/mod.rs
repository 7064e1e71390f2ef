//! Transcript text processing: normalization and chunking.

mod chunker;
mod normalize;

pub use chunker::{chunk_text, estimate_tokens, Chunk, DEFAULT_TOKEN_BUDGET};
pub use normalize::normalize;

pub(crate) use normalize::decode_entities;
