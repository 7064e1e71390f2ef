//! Prompt templates for Oppsum.
//!
//! Prompts can be customized by placing TOML files in the custom prompts
//! directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    /// Prompts for summarizing one chunk of a multi-chunk transcript.
    pub chunk: ChunkPrompts,
    /// Prompts for summarizing a transcript that fits a single chunk.
    pub single: SinglePassPrompts,
    /// Prompts for reducing chunk summaries into one final summary.
    pub reduce: ReducePrompts,
    /// Prompts for metadata-only summaries when no transcript exists.
    pub fallback: FallbackPrompts,
    /// Prompts for presenting a transcript readably.
    pub transcribe: TranscribePrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}


/// Prompts for per-chunk summarization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkPrompts {
    pub system: String,
    pub user: String,
}

impl Default for ChunkPrompts {
    fn default() -> Self {
        Self {
            system: r#"You summarize one section of a longer video transcript at a time. Write natural, conversational prose, as if telling a friend what happened in this part of the video. Only describe what the section actually says; never invent content that is not in it. You see one section in isolation, so do not refer to specifics from other sections."#.to_string(),

            user: r#"You are reading part {{position}} of {{total}} of the transcript of "{{title}}" by {{author}}.

Transcript section:
{{chunk}}

Write a conversational summary of this section. Focus on:
- the key points discussed in this part
- important information or insights shared
- interesting details or examples mentioned
- how this section contributes to the overall video

Keep it natural and flowing, like you're explaining what you just heard to someone."#.to_string(),
        }
    }
}

/// Prompts for summarizing a short transcript in one pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinglePassPrompts {
    pub system: String,
    pub user: String,
}

impl Default for SinglePassPrompts {
    fn default() -> Self {
        Self {
            system: r#"You create natural, human-like summaries of videos from their transcripts. You have the actual transcript, so write as if you watched the video yourself. Never invent content that is not in the transcript."#.to_string(),

            user: r#"Video Information:
- Title: {{title}}
- Creator: {{author}}
- Duration: {{duration}}
- Views: {{views}}
- Published: {{published}}

Full Transcript:
{{chunk}}

Write a conversational summary in flowing paragraphs (not bullet points) that covers:
- what the video is mainly about
- the most interesting or useful points from the actual content
- key insights, concepts, or takeaways for the viewer

Write naturally, as if you're telling a friend about a video you just watched. Avoid generic phrases like "This video discusses..." - narrate what actually happens, with specific details and examples from the transcript."#.to_string(),
        }
    }
}

/// Prompts for reducing section summaries into one final text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducePrompts {
    pub system: String,
    pub user: String,
}

impl Default for ReducePrompts {
    fn default() -> Self {
        Self {
            system: r#"You combine section summaries of a video into one final, cohesive summary. Write as if you watched the entire video and are now telling a friend what it's about. Work only from the section summaries; never invent content they do not support."#.to_string(),

            user: r#"Video: "{{title}}" by {{author}}
Duration: {{duration}}

Section summaries, in order:
{{sections}}

Create a natural, flowing summary that:
1. captures the main theme and purpose of the video
2. highlights the most interesting or valuable points
3. explains what viewers will learn or gain from watching
4. feels conversational and engaging, not robotic

Write in flowing paragraphs without bullet points, synthesizing one coherent narrative rather than a list of parts."#.to_string(),
        }
    }
}

/// Prompts for metadata-only summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackPrompts {
    pub system: String,
    pub user: String,
}

impl Default for FallbackPrompts {
    fn default() -> Self {
        Self {
            system: r#"You describe videos from their metadata when no transcript is available. Be honest that you are working from the title and description only. Never claim to know what is said in the video, and never invent specific content, quotes, or claims the metadata cannot support."#.to_string(),

            user: r#"The transcript isn't available for this video, so base your description on its metadata.

Video Information:
- Title: {{title}}
- Creator: {{author}}
- Duration: {{duration}}
- Views: {{views}}
- Published: {{published}}
- Description: {{description}}

Write a short, conversational description in flowing paragraphs. Explain what the video likely covers and why someone might want to watch it, making clear that this is inferred from the title and description rather than from the video's actual content."#.to_string(),
        }
    }
}

/// Prompts for presenting an extracted transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscribePrompts {
    pub system: String,
    pub user: String,
}

impl Default for TranscribePrompts {
    fn default() -> Self {
        Self {
            system: r#"You present raw video transcripts in a clean, readable format. Keep all the content; change only presentation. Never add content that is not in the transcript."#.to_string(),

            user: r#"Video: "{{title}}" by {{author}} ({{duration}})

Raw transcript:
{{transcript}}

Present this transcript in a readable format. Add paragraph breaks where appropriate, fix obvious transcription errors, and make it flow naturally. Keep all the content. Add brief section headers if you notice distinct topics being discussed."#.to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from defaults, with optional custom directory and
    /// variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let chunk_path = custom_path.join("chunk.toml");
            if chunk_path.exists() {
                let content = std::fs::read_to_string(&chunk_path)?;
                prompts.chunk = toml::from_str(&content)?;
            }

            let single_path = custom_path.join("single.toml");
            if single_path.exists() {
                let content = std::fs::read_to_string(&single_path)?;
                prompts.single = toml::from_str(&content)?;
            }

            let reduce_path = custom_path.join("reduce.toml");
            if reduce_path.exists() {
                let content = std::fs::read_to_string(&reduce_path)?;
                prompts.reduce = toml::from_str(&content)?;
            }

            let fallback_path = custom_path.join("fallback.toml");
            if fallback_path.exists() {
                let content = std::fs::read_to_string(&fallback_path)?;
                prompts.fallback = toml::from_str(&content)?;
            }

            let transcribe_path = custom_path.join("transcribe.toml");
            if transcribe_path.exists() {
                let content = std::fs::read_to_string(&transcribe_path)?;
                prompts.transcribe = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom
    /// config variables. Provided variables take precedence.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.chunk.system.is_empty());
        assert!(!prompts.reduce.user.is_empty());
        assert!(prompts.fallback.system.contains("Never claim"));
    }

    #[test]
    fn test_render_template() {
        let template = "Part {{position}} of {{total}}.";
        let mut vars = std::collections::HashMap::new();
        vars.insert("position".to_string(), "2".to_string());
        vars.insert("total".to_string(), "3".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Part 2 of 3.");
    }

    #[test]
    fn test_custom_variables_are_overridden_by_provided() {
        let mut prompts = Prompts::default();
        prompts
            .variables
            .insert("title".to_string(), "from config".to_string());

        let mut vars = std::collections::HashMap::new();
        vars.insert("title".to_string(), "from call".to_string());

        let result = prompts.render_with_custom("{{title}}", &vars);
        assert_eq!(result, "from call");
    }
}
