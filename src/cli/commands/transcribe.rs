//! Transcribe command implementation.

use super::summarize::print_result;
use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::summarize::Action;
use crate::video::VideoRef;
use anyhow::Result;

/// Run the transcribe command.
pub async fn run_transcribe(input: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check() {
        Output::error(&format!("{}", e));
        Output::info("Run 'oppsum doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let video = VideoRef::parse(input)?;
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Extracting transcript...");
    let result = orchestrator.process(&video, Action::Transcribe).await;
    spinner.finish_and_clear();

    print_result(&result);
    Ok(())
}
