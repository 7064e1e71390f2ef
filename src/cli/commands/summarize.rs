//! Summarize command implementation.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::summarize::{Action, SummaryMethod, SummaryResult};
use crate::video::VideoRef;
use anyhow::Result;

/// Run the summarize command.
pub async fn run_summarize(
    input: &str,
    model: Option<String>,
    budget: Option<usize>,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check() {
        Output::error(&format!("{}", e));
        Output::info("Run 'oppsum doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.summarize.model = model;
    }
    if let Some(budget) = budget {
        settings.chunking.token_budget = budget;
    }

    let video = VideoRef::parse(input)?;
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Processing video...");
    let result = orchestrator.process(&video, Action::Summarize).await;
    spinner.finish_and_clear();

    print_result(&result);
    Ok(())
}

/// Render a pipeline result, including its provenance.
pub(crate) fn print_result(result: &SummaryResult) {
    Output::header(&result.video.title);
    Output::kv("Author", &result.video.author);
    Output::kv("Duration", &result.video.duration_label);
    Output::kv("Views", &result.video.views_label);
    println!();

    match result.method {
        SummaryMethod::Transcript => {
            let source = result.transcript_source.as_deref().unwrap_or("unknown");
            Output::success(&format!(
                "Based on the actual video transcript (via {})",
                source
            ));
        }
        SummaryMethod::MetadataFallback => {
            Output::warning("Based on video metadata only - no transcript was available");
            for attempt in &result.attempted_layers {
                Output::list_item(&format!("{}: {}", attempt.layer, attempt.reason));
            }
        }
    }

    println!("\n{}\n", result.text);
}
