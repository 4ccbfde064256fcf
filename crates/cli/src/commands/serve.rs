//! `compass serve`: Start the HTTP gateway.

use compass_core::DeploymentMode;

pub async fn run(
    port_override: Option<u16>,
    mode: Option<DeploymentMode>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(mode)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🧭 Compass Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Mode:      {}", config.mode);
    println!("   Model:     {} via {}", config.default_model, config.default_provider);
    if config.mode == DeploymentMode::Retrieval {
        println!("   Index:     {}", config.retrieval.persist_dir.display());
    }

    compass_gateway::start(config).await?;

    Ok(())
}
