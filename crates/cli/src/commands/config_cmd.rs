//! `teamkb config` — Configuration management commands.

use teamkb_config::{AppConfig, PagingMode};

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let warnings = warnings(&config);
            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Backend:   {}", config.generation.base_url);
            println!("   Model:     {}", config.generation.model);
            println!(
                "   Gateway:   {}:{}",
                config.gateway.host, config.gateway.port
            );
            println!("   Store:     {}", config.store.backend);
            println!(
                "   Paging:    {:?} (page size {})",
                config.retrieval.paging, config.retrieval.page_size
            );
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

/// Settings that are valid but probably not what the user wants.
fn warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.generation.temperature > 0.0 {
        warnings.push(format!(
            "generation.temperature is {}; answers will not be reproducible",
            config.generation.temperature
        ));
    }
    if config.store.backend == "memory" {
        warnings.push("store.backend = \"memory\": notes are lost on restart".to_string());
    }
    if config.gateway.cors_origins.is_empty() {
        warnings.push("gateway.cors_origins is empty: any origin may call the API".to_string());
    }
    if config.gateway.host == "0.0.0.0" {
        warnings.push("Gateway bound to 0.0.0.0; the API has no authentication".to_string());
    }
    if config.retrieval.paging == PagingMode::Advisory && config.retrieval.page_size > 50 {
        warnings.push("retrieval.page_size only gates the next cursor in advisory mode".to_string());
    }

    warnings
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config()?;
    if config.generation.api_key.is_some() {
        config.generation.api_key = Some("[REDACTED]".into());
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    if config_path.exists() {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run `teamkb config init`.");
        return Ok(());
    }

    std::fs::create_dir_all(&config_dir)?;
    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Point generation.base_url at your chat-completions backend");
    println!("   2. Run: teamkb notes add --title \"...\" --content \"...\"");
    println!("   3. Run: teamkb ask \"...\"\n");
    Ok(())
}
