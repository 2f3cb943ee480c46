use anyhow::{Context, Result};
use axum::{
    RequestPartsExt, Router,
    extract::{FromRequestParts, MatchedPath, rejection::MatchedPathRejection},
    http::request::Parts,
    middleware,
    response::{IntoResponse, Redirect},
    routing::get,
};
use axum_login::{
    AuthManagerLayerBuilder,
    tower_sessions::{Expiry, SessionManagerLayer},
};
use axum_server::tls_rustls::RustlsConfig;
use axum_template::engine::Engine;
use clap::Parser;
use directories::ProjectDirs;
use minijinja::Environment;
use state::{AppState, SharedState};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};
use time::Duration;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tower_sessions_sqlx_store::SqliteStore;
use tracing::{debug, info};
use tracing_subscriber::filter::EnvFilter;

mod api;
mod auth;
mod config;
mod error;
mod html;
mod state;
mod util;

pub use config::EnvConfig;

const API_PREFIX: &str = "/api/v1";
const APP_PREFIX: &str = "/app";

/// An extractor that derives the name of a template from the route that
/// matched the request, e.g. `/app/locations/{id}` → `locations_id.html.j2`
pub(crate) struct TemplateKey(pub String);

impl<S> FromRequestParts<S> for TemplateKey
where
    S: Send + Sync,
{
    type Rejection = MatchedPathRejection;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        let path = parts.extract::<MatchedPath>().await?;
        Ok(TemplateKey(template_key(path.as_str())))
    }
}

fn template_key(matched_path: &str) -> String {
    let mut key = matched_path
        .trim_start_matches(APP_PREFIX)
        .trim_matches('/')
        .replace(['{', '}'], "")
        .replace('/', "_");
    if key.is_empty() {
        key = "_INDEX".to_string();
    }
    key.push_str(".html.j2");
    key
}

pub(crate) fn template_engine<P: AsRef<Path>>(
    envname: &str,
    template_dir: P,
) -> Engine<minijinja::Environment<'static>> {
    debug!(envname, dir = ?template_dir.as_ref(), "Creating template engine");
    let mut jinja = Environment::new();
    jinja.set_loader(minijinja::path_loader(template_dir));
    minijinja_contrib::add_to_environment(&mut jinja);
    jinja.add_filter("app_url", util::app_url);
    jinja.add_filter("append_query_param", util::append_query_param);
    jinja.add_filter("distance", util::format_distance);
    jinja.add_filter("stars", util::stars);
    jinja.add_global("environment", envname);
    Engine::from(jinja)
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[arg(short, long, default_value = "prod", help = "Name of the configuration section to use")]
    pub env: String,
    #[arg(short, long, help = "Path to the configuration file")]
    pub config: Option<PathBuf>,
    #[arg(
        short,
        long,
        help = "Directory containing the database, templates and static files"
    )]
    pub datadir: Option<PathBuf>,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "venues", "venueweb")
}

/// Build the application router, including the session and authentication
/// layers
pub(crate) async fn app(state: AppState) -> Result<Router> {
    let session_store = SqliteStore::new(state.db.pool().clone());
    session_store.migrate().await?;
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(state.config.tls.is_some())
        .with_expiry(Expiry::OnInactivity(Duration::days(1)));

    let auth_backend = auth::SqliteAuthBackend::new(state.db.clone());
    let auth_layer = AuthManagerLayerBuilder::new(auth_backend, session_layer).build();

    let app = Router::new()
        .route("/", get(root))
        .route("/favicon.ico", get(favicon_redirect))
        .nest_service("/static", ServeDir::new(state.datadir.join("static")))
        .nest(
            APP_PREFIX,
            html::router(state.clone()).layer(middleware::map_response_with_state(
                state.clone(),
                error::html_response_mapper,
            )),
        )
        .nest(
            API_PREFIX,
            api::router().layer(middleware::map_response(error::api_response_mapper)),
        )
        .with_state(state)
        .layer(auth_layer)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));
    Ok(app)
}

#[cfg(test)]
pub(crate) async fn test_app(pool: sqlx::Pool<sqlx::Sqlite>) -> Result<(Router, AppState)> {
    let state = Arc::new(SharedState::test(pool));
    let app = app(state.clone()).await?;
    Ok((app, state))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("VENUEWEB_LOG"))
        .init();
    let args = Cli::parse();
    let dirs = project_dirs();
    let config_path = args
        .config
        .or_else(|| dirs.as_ref().map(|d| d.config_dir().join("config.yaml")))
        .context("Unable to determine the configuration file path")?;
    let datadir = args
        .datadir
        .or_else(|| dirs.as_ref().map(|d| d.data_dir().to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));
    let env = EnvConfig::load(&config_path, &args.env)?;
    debug!(?env, ?datadir, "Loaded configuration");

    let shared_state = Arc::new(SharedState::new(&args.env, env.clone(), datadir).await?);
    let app = app(shared_state).await?;

    let addr: SocketAddr = format!("{}:{}", env.listen.host, env.listen.port)
        .parse()
        .with_context(|| "Invalid listen address")?;
    match env.tls {
        Some(tls) => {
            let tlsconfig = RustlsConfig::from_pem_file(&tls.cert, &tls.key)
                .await
                .with_context(|| format!("Unable to load certificate '{}'", tls.cert))?;
            info!("Listening on https://{}", addr);
            axum_server::bind_rustls(addr, tlsconfig)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!("Listening on http://{}", addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(?e, "Unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn root() -> impl IntoResponse {
    Redirect::permanent(&util::app_url("/locations"))
}

async fn favicon_redirect() -> impl IntoResponse {
    Redirect::permanent("/static/favicon.ico")
}
