//! Knockgate: an authenticating gateway that gates TCP/UDP access to
//! protected backends behind a dynamic IP allowlist, admin API, and
//! hot-reloadable configuration.

mod bootstrap;
mod di;
mod server;

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::Parser;
use knockgate_application::ports::ConfigSource;
use ring::rand::{SecureRandom, SystemRandom};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "knockgate")]
#[command(version)]
#[command(about = "Authenticating knock-knock gateway for TCP/UDP services")]
struct Cli {
    /// Path to the gateway's YAML configuration file.
    #[arg(short, long, default_value = "gateway.yaml")]
    config: PathBuf,

    /// Emit structured JSON logs instead of human-readable ones.
    #[arg(long)]
    json_logs: bool,
}

/// Reads `KNOCKGATE_HMAC_SECRET` (base64) for session-token signing. With
/// none set, a fresh 32-byte key is generated for this process only —
/// every outstanding session token becomes unverifiable across a restart,
/// which matches this gateway's "no persistence across restart" design
/// (see DESIGN.md), but rules out running more than one instance behind a
/// load balancer without setting the variable to a shared value.
fn load_or_generate_hmac_secret() -> anyhow::Result<Vec<u8>> {
    if let Ok(encoded) = std::env::var("KNOCKGATE_HMAC_SECRET") {
        let secret = STANDARD
            .decode(encoded.trim())
            .map_err(|e| anyhow::anyhow!("KNOCKGATE_HMAC_SECRET is not valid base64: {e}"))?;
        if secret.len() < 16 {
            anyhow::bail!("KNOCKGATE_HMAC_SECRET must decode to at least 16 bytes");
        }
        return Ok(secret);
    }

    warn!("KNOCKGATE_HMAC_SECRET not set; generating an ephemeral signing key for this process");
    let rng = SystemRandom::new();
    let mut secret = vec![0u8; 32];
    rng.fill(&mut secret)
        .map_err(|_| anyhow::anyhow!("failed to generate a random HMAC secret"))?;
    Ok(secret)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    bootstrap::init_logging(cli.json_logs);

    info!("knockgate starting");

    let config_source = bootstrap::load_config(&cli.config).await?;
    let snapshot = config_source.current().await;
    let container = di::Container::build(config_source, &snapshot)?;

    let hmac_secret = load_or_generate_hmac_secret()?;

    server::run(container, hmac_secret).await
}
