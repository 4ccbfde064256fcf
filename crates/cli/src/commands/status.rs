//! `compass status`: Show the effective configuration.

use compass_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(None)?;

    println!("🧭 Compass Status");
    println!("=================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Mode:         {}", config.mode);
    println!("  Provider:     {}", config.default_provider);
    println!("  Model:        {}", config.default_model);
    println!("  API key:      {}", if config.api_key.is_some() { "set" } else { "not set" });
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!("  Index dir:    {}", config.retrieval.persist_dir.display());
    println!(
        "  Index models: embed={} llm={} top_k={}",
        config.retrieval.embed_model, config.retrieval.llm_model, config.retrieval.top_k
    );
    println!(
        "  Eager init:   {}",
        if config.retrieval.eager_init { "enabled" } else { "disabled" }
    );

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file; run `compass onboard` first");
    }

    Ok(())
}
