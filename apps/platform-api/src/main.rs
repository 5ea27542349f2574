//! Tessera identity platform API server.
//!
//! Wires tenant resolution, token verification, revocation, and the
//! member-management surface into one Axum application, plus the periodic
//! sweeps for expired blacklist rows and overdue invitations.

mod config;
mod middleware;

use axum::routing::get;
use axum::Router;
use config::Config;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::time::Duration;
use tessera_api_members::{members_router, MembersApiState};
use tessera_auth::{
    DevUserOverride, JwksClient, RevocationStore, TokenVerifier, VerificationContext,
    VerifierOptions,
};
use tessera_authz::OrganizationAccessControl;
use tessera_core::TenantId;
use tessera_db::models::OrganizationInvitation;
use tessera_tenant::{DomainCache, TenantResolver};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Interval between expiry sweeps.
const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let pool = match PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Error: failed to connect to database: {e}");
            std::process::exit(1);
        }
    };

    let domain_cache = DomainCache::new();
    let resolver = TenantResolver::new(
        config.resolver_config(),
        domain_cache.clone(),
        pool.clone(),
    );

    let revocation = RevocationStore::new(pool.clone());
    let access = OrganizationAccessControl::new(pool.clone());

    let admin_jwks = match JwksClient::new(config.admin_jwks_url.clone()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let verifier = TokenVerifier::new(
        config.admin_issuer.clone(),
        admin_jwks,
        VerifierOptions {
            is_production: config.is_production,
            is_integration_test: config.is_integration_test,
            dev_user: config
                .dev_user_id
                .clone()
                .map(|user_id| DevUserOverride { user_id }),
        },
    );

    let admin_context = VerificationContext {
        tenant_id: TenantId::admin(),
        issuer: config.admin_issuer.clone(),
        local_keys: vec![],
    };

    let state = MembersApiState::new(
        verifier,
        revocation.clone(),
        admin_context,
        config.management_audience.clone(),
        access,
        pool.clone(),
    );

    spawn_sweeper(revocation, pool.clone());

    let app = Router::new()
        .merge(members_router(state))
        .layer(axum::middleware::from_fn_with_state(
            resolver,
            middleware::resolve_tenant,
        ))
        .route("/healthz", get(|| async { "ok" }))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "Starting platform API");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Error: failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "Server exited with error");
    }
}

/// Periodic maintenance: expired blacklist rows and overdue invitations.
fn spawn_sweeper(revocation: RevocationStore, pool: sqlx::PgPool) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = revocation.sweep_expired().await {
                error!(error = %e, "Blacklist sweep failed");
            }
            match OrganizationInvitation::expire_overdue(&pool).await {
                Ok(expired) if expired > 0 => {
                    info!(expired, "Expired overdue invitations");
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "Invitation expiry sweep failed"),
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install ^C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
