//! `compass explain`: Dry run: show the classification and the request
//! that would be sent, without calling any backend.

use compass_core::DeploymentMode;
use compass_pipeline::ChatTurn;
use std::path::PathBuf;

pub async fn run(
    prompt: String,
    profile: Option<PathBuf>,
    mode: Option<DeploymentMode>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(mode)?;
    let orchestrator = compass_pipeline::build_from_config(&config)?;

    let turn = ChatTurn {
        prompt,
        model: None,
        profile: super::load_profile(profile.as_deref())?,
        history: Vec::new(),
    };
    let plan = orchestrator.plan(&turn);

    println!(
        "Context: {} (academic {}, professional {})",
        plan.context, plan.score.academic, plan.score.professional
    );
    println!("{}", serde_json::to_string_pretty(&plan.request)?);

    Ok(())
}
