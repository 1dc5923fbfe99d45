use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use knockgate_application::ports::{ConfigSource, CredentialVerifier, SessionTokenIssuer};
use knockgate_infrastructure::auth::{BcryptCredentialVerifier, HmacTokenIssuer};
use knockgate_jobs::{DnsRefreshJob, JobRunner, RateLimiterGcJob, SessionCleanupJob};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::di::Container;

/// Subscribes to config-change notifications (C15) and applies the new
/// document to the reload-sensitive collaborators: the blocklist and
/// permanent allowlist partitions, and the forwarder set. Session, rate
/// limiter and DNS state are untouched by a reload — they are scoped to
/// their own lifecycle (login, traffic, the DNS refresh job).
fn spawn_config_reload_watcher(container: &Container, shutdown: CancellationToken) {
    let mut rx = container.config_source.subscribe();
    let blocklist = container.blocklist.clone();
    let allowlist = container.allowlist.clone();
    let forwarders = container.forwarders.clone();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("config reload watcher shutting down");
                    return;
                }
                changed = rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    let snapshot = rx.borrow_and_update().clone();
                    blocklist.reload(&snapshot.config.network_access_control);
                    allowlist.reload_permanent(&snapshot.config.network_access_control);
                    forwarders.reload(&snapshot.config.protected_services);
                    info!(generation = snapshot.generation, "applied reloaded configuration");
                }
            }
        }
    });
}

/// Starts the forwarders, background jobs, config hot-reload plumbing, and
/// the admin HTTP API, then blocks until the process receives Ctrl+C.
pub async fn run(container: Container, hmac_secret: Vec<u8>) -> anyhow::Result<()> {
    let snapshot = container.config_source.current().await;
    let config = snapshot.config.clone();

    container.forwarders.start_all(&config.protected_services);

    let shutdown = CancellationToken::new();
    container
        .config_source
        .watch(shutdown.child_token())
        .map_err(|e| anyhow::anyhow!(e))?;
    spawn_config_reload_watcher(&container, shutdown.child_token());

    let mut jobs = JobRunner::new()
        .with_session_cleanup(SessionCleanupJob::new(
            container.sessions.clone(),
            config.session_config.session_cleanup_interval_seconds,
        ))
        .with_rate_limiter_gc(RateLimiterGcJob::new(container.rate_limiter.clone()));

    if !config.network_access_control.allowed_dynamic_dns_hostnames.is_empty() {
        jobs = jobs.with_dns_refresh(DnsRefreshJob::new(
            container.dns.clone(),
            container.allowlist.clone(),
            config.network_access_control.allowed_dynamic_dns_hostnames.clone(),
            config.network_access_control.dns_refresh_interval_seconds,
        ));
    }
    jobs.start().await;

    let credential_verifier: Arc<dyn CredentialVerifier> = Arc::new(BcryptCredentialVerifier::new());
    let token_issuer: Arc<dyn SessionTokenIssuer> = Arc::new(HmacTokenIssuer::new(&hmac_secret));
    let config_source: Arc<dyn ConfigSource> = container.config_source.clone();

    let state = knockgate_api::AppState {
        sessions: container.sessions.clone(),
        blocklist: container.blocklist.clone(),
        allowlist: container.allowlist.clone(),
        rate_limiter: container.rate_limiter.clone(),
        real_ip: container.real_ip.clone(),
        access_facade: container.access_facade.clone(),
        revocation: container.revocation.clone(),
        credential_verifier,
        token_issuer,
        config_source,
        forwarders: container.forwarders.clone(),
    };

    let app = knockgate_api::create_api_routes(state).layer(TraceLayer::new_for_http());

    let bind: SocketAddr = format!(
        "{}:{}",
        config.proxy_server_config.listen_address, config.proxy_server_config.admin_api_port
    )
    .parse()?;
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(admin_api = %bind, "admin API listening");

    let serve = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(ctrl_c(shutdown.clone()));

    serve.await?;
    container.forwarders.shutdown();
    Ok(())
}

async fn ctrl_c(shutdown: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("failed to install Ctrl+C handler, shutdown signal unavailable");
        return;
    }
    info!("shutdown signal received");
    shutdown.cancel();
    // give in-flight admin API requests a moment to drain before the
    // forwarder sockets underneath them are torn down.
    tokio::time::sleep(Duration::from_millis(200)).await;
}
