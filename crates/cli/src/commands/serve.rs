//! `teamkb serve` — Start the HTTP API server.

pub async fn run(
    port_override: Option<u16>,
    host_override: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config()?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }
    if let Some(host) = host_override {
        config.gateway.host = host;
    }

    println!("📚 TeamKB Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Backend:   {} ({})", config.generation.base_url, config.generation.model);
    println!("   Store:     {}", config.store.backend);

    teamkb_gateway::start(config).await?;

    Ok(())
}
