//! `compass doctor`: Diagnose setup problems.

use compass_config::AppConfig;
use compass_core::DeploymentMode;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Compass Doctor: System Diagnostics");
    println!("======================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found");
    } else {
        println!("  ⚠️  No config file, using defaults (run `compass onboard`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. See above for details.");
            return Ok(());
        }
    };

    let router = compass_providers::router::build_from_config(&config);
    match router.default() {
        Some(provider) => match provider.health_check().await {
            Ok(true) => println!("  ✅ Provider '{}' reachable", provider.name()),
            Ok(false) | Err(_) => {
                println!("  ❌ Provider '{}' not reachable", provider.name());
                issues += 1;
            }
        },
        None => {
            println!("  ❌ Provider '{}' not available", config.default_provider);
            issues += 1;
        }
    }

    if config.mode == DeploymentMode::Retrieval {
        match compass_retrieval::store::load(&config.retrieval.persist_dir) {
            Ok(store) => println!(
                "  ✅ Retrieval index loaded ({} chunks)",
                store.chunks.len()
            ),
            Err(e) => {
                println!("  ❌ Retrieval index unusable: {e}");
                println!("     Build one with `compass index <docs>`");
                issues += 1;
            }
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
