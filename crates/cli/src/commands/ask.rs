//! `compass ask`: Run one chat turn and print the answer.

use compass_core::DeploymentMode;
use compass_pipeline::{ChatOutcome, ChatTurn};
use std::path::PathBuf;

pub async fn run(
    prompt: String,
    model: Option<String>,
    profile: Option<PathBuf>,
    mode: Option<DeploymentMode>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(mode)?;
    let orchestrator = compass_pipeline::build_from_config(&config)?;

    let turn = ChatTurn {
        prompt,
        model,
        profile: super::load_profile(profile.as_deref())?,
        history: Vec::new(),
    };

    match orchestrator.handle(&turn).await {
        ChatOutcome::Answer(text) => {
            println!("{text}");
            Ok(())
        }
        ChatOutcome::Failed(message) => Err(message.into()),
    }
}
