/*
 * Responsibility
 * - Load Config → build the CORS engine (policy, rule table, dynamic source) → assemble Router
 * - Apply middleware (HTTP plumbing outermost, then CORS)
 * - Start with axum::serve()
 */
use std::{panic, process, sync::Arc};

use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::error::AppError;
use crate::middleware;
use crate::services::cors::{
    EnvironmentPolicy, OriginAuthorizer, PatternRuleSet, PreflightResponder, RejectionRecorder,
};
use crate::services::registry::{CachedRegistrySource, DynamicOriginSource, ValkeyRegistryClient};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,origin_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Outside production, fail fast so the crash is noticed immediately.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<(), AppError> {
    init_tracing();
    let config = Config::from_env().inspect_err(|err| {
        tracing::error!(error = %err, "failed to load configuration");
    })?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting origin-gate in {} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).inspect_err(|err| {
        tracing::error!(error = %err, "failed to build CORS engine");
    })?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the process-level CORS engine and inject it into the shared application state.
///
/// When a service registry is configured, its background refresher is spawned here,
/// so this must run inside a tokio runtime.
pub fn build_state(config: &Config) -> Result<AppState, AppError> {
    let policy = EnvironmentPolicy::new(
        config.app_env,
        config.cors_allowed_origins.clone(),
        &config.patterns.root_domain,
    );
    let rules = PatternRuleSet::compile(&config.patterns)?;

    let dynamic: Option<Arc<dyn DynamicOriginSource>> = match &config.registry {
        Some(registry) => {
            let client = ValkeyRegistryClient::new(&registry.url, registry.key.clone())?;
            let source = Arc::new(CachedRegistrySource::new());
            source.spawn_refresher(client, registry.refresh_interval, registry.timeout);
            Some(source)
        }
        None => None,
    };

    tracing::info!(
        environment = %policy.environment(),
        static_origins = policy.static_allow_list().len(),
        wildcard_enabled = policy.wildcard_enabled(),
        rules = ?rules.rule_ids(),
        dynamic_source = dynamic.is_some(),
        "CORS policy ready"
    );

    let authorizer = Arc::new(OriginAuthorizer::new(policy, rules, dynamic));
    let responder = Arc::new(PreflightResponder::new(
        config.cors_advertise_credentials,
        config.cors_max_age_seconds,
    ));

    Ok(AppState::new(
        authorizer,
        responder,
        Arc::new(RejectionRecorder::default()),
    ))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes())
        .with_state(state.clone());

    let router = middleware::cors::apply(router, state);
    middleware::http::apply(router, config)
}
