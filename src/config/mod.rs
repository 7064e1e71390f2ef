//! Configuration management.

mod prompts;
mod settings;

pub use prompts::{
    ChunkPrompts, FallbackPrompts, Prompts, ReducePrompts, SinglePassPrompts, TranscribePrompts,
};
pub use settings::{
    ChunkingSettings, GeneralSettings, MetadataSettings, PromptSettings, Settings,
    SummarizeSettings, TranscriptSettings,
};
