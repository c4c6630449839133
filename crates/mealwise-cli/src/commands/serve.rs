//! Server command implementation

use anyhow::Result;
use mealwise_core::Config;
use mealwise_server::ServerConfig;

use super::build_analyzer;

pub async fn cmd_serve(config: Config, host: &str, port: u16) -> Result<()> {
    println!("🚀 Starting Mealwise web server...");
    println!("   Listening: http://{}:{}", host, port);
    match &config.backend.url {
        Some(url) => println!("   Analytics backend: {} (local fallback enabled)", url),
        None => println!("   Analytics backend: none (local computation)"),
    }

    // Comma-separated list of allowed CORS origins
    let allowed_origins: Vec<String> = std::env::var("MEALWISE_ALLOWED_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if !allowed_origins.is_empty() {
        println!("   CORS origins: {}", allowed_origins.join(", "));
    }

    let analyzer = build_analyzer(config)?;
    mealwise_server::serve(analyzer, host, port, ServerConfig { allowed_origins }).await
}
