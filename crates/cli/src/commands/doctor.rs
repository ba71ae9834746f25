//! `teamkb doctor` — Diagnose system health.

use teamkb_config::AppConfig;
use teamkb_providers::OpenAiCompatGenerator;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 TeamKB Doctor — System Diagnostics");
    println!("=====================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file — using defaults (run `teamkb config init`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  Fix the configuration before running further checks.");
            return Ok(());
        }
    };

    // Note store
    match teamkb_store::open_from_config(&config.store).await {
        Ok(store) => match store.count().await {
            Ok(n) => println!("  ✅ Note store ({}) reachable, {n} note(s)", store.name()),
            Err(e) => {
                println!("  ❌ Note store ({}) unreadable: {e}", store.name());
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Note store unavailable: {e}");
            issues += 1;
        }
    }

    // Generation backend
    match OpenAiCompatGenerator::from_config(&config.generation) {
        Ok(generator) => match generator.health_check().await {
            Ok(true) => println!("  ✅ Generation backend reachable at {}", generator.base_url()),
            Ok(false) => {
                println!(
                    "  ⚠️  Generation backend at {} answered with an error status",
                    generator.base_url()
                );
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Generation backend unreachable: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Could not build generation client: {e}");
            issues += 1;
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
