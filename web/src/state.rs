use crate::{EnvConfig, template_engine};
use anyhow::{Context, Result};
use axum::response::IntoResponse;
use axum_template::{RenderHtml, engine::Engine};
use libvenue::{Database, geo::Coordinates};
use serde::Serialize;
use std::{path::PathBuf, sync::Arc};
use tracing::{debug, trace};

type TemplateEngine = Engine<minijinja::Environment<'static>>;

#[derive(Debug)]
pub struct SharedState {
    pub db: Database,
    pub tmpl: TemplateEngine,
    pub config: EnvConfig,
    pub datadir: PathBuf,
}

impl SharedState {
    pub async fn new(envname: &str, env: EnvConfig, datadir: PathBuf) -> Result<Self> {
        let tmpl_path = datadir.join("templates");
        let template = template_engine(envname, &tmpl_path);
        trace!("Creating shared app state");
        let dbpath = datadir.join(&env.database);
        debug!(?dbpath, "Opening database");
        Ok(Self {
            db: Database::open(&dbpath)
                .await
                .with_context(|| format!("Unable to open database {}", dbpath.display()))?,
            tmpl: template,
            config: env,
            datadir,
        })
    }

    #[cfg(test)]
    pub fn test(pool: sqlx::Pool<sqlx::Sqlite>) -> Self {
        let template = template_engine("test", "./templates");
        debug!("Creating test shared app state");
        Self {
            db: Database::from(pool),
            tmpl: template,
            config: EnvConfig {
                listen: crate::config::ListenConfig {
                    host: "127.0.0.1".to_string(),
                    port: 8080,
                },
                database: "test-database.sqlite".to_string(),
                reference_point: None,
                tls: None,
            },
            datadir: ".".into(),
        }
    }

    /// The point that location queries measure distances from by default
    pub fn reference_point(&self) -> Coordinates {
        self.config.reference_point()
    }

    pub fn render_template<K, S>(&self, key: K, ctx: S) -> impl IntoResponse + use<K, S>
    where
        K: AsRef<str>,
        S: Serialize,
    {
        RenderHtml(key, self.tmpl.clone(), ctx)
    }
}

pub type AppState = Arc<SharedState>;
