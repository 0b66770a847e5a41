use std::rc::Rc;
use std::str::FromStr;
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};

use crate::domain::entities::query::DEFAULT_PAGE_SIZE;
use crate::infra::http::client::{
    HttpRecordSource, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BASE_DELAY, DEFAULT_TIMEOUT,
};
use crate::usecase::controllers::pagination::DEFAULT_WINDOW_RADIUS;
use crate::usecase::ports::source::RecordSource;
use crate::usecase::services::result_cache::DEFAULT_CACHE_CAPACITY;

pub const ENV_ENDPOINT: &str = "ARK_GRID_ENDPOINT";
pub const ENV_DB: &str = "ARK_GRID_DB";
pub const ENV_PAGE_SIZE: &str = "ARK_GRID_PAGE_SIZE";
pub const ENV_CACHE_CAPACITY: &str = "ARK_GRID_CACHE_CAPACITY";
pub const ENV_WINDOW_RADIUS: &str = "ARK_GRID_WINDOW_RADIUS";
pub const ENV_TIMEOUT_SECS: &str = "ARK_GRID_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "ARK_GRID_MAX_RETRIES";

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    Http { base_url: String },
    #[cfg(not(target_arch = "wasm32"))]
    Sqlite { db_path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridConfig {
    pub source: SourceConfig,
    pub page_size: usize,
    pub cache_capacity: usize,
    pub window_radius: usize,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::Http {
                base_url: DEFAULT_ENDPOINT.to_string(),
            },
            page_size: DEFAULT_PAGE_SIZE,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            window_radius: DEFAULT_WINDOW_RADIUS,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl GridConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from a key lookup. Unset or blank keys keep their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let source = match get(ENV_DB) {
            #[cfg(not(target_arch = "wasm32"))]
            Some(db) => SourceConfig::Sqlite {
                db_path: if db == "default" {
                    default_db_path()?
                } else {
                    PathBuf::from(db)
                },
            },
            #[cfg(target_arch = "wasm32")]
            Some(_) => bail!("{ENV_DB} is not supported in the browser build"),
            None => SourceConfig::Http {
                base_url: get(ENV_ENDPOINT).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            },
        };

        let page_size = parse_or(&get, ENV_PAGE_SIZE, defaults.page_size)?;
        if page_size == 0 {
            bail!("{ENV_PAGE_SIZE} must be greater than zero");
        }
        let cache_capacity = parse_or(&get, ENV_CACHE_CAPACITY, defaults.cache_capacity)?;
        if cache_capacity == 0 {
            bail!("{ENV_CACHE_CAPACITY} must be greater than zero");
        }

        Ok(Self {
            source,
            page_size,
            cache_capacity,
            window_radius: parse_or(&get, ENV_WINDOW_RADIUS, defaults.window_radius)?,
            timeout: Duration::from_secs(parse_or(
                &get,
                ENV_TIMEOUT_SECS,
                defaults.timeout.as_secs(),
            )?),
            max_retries: parse_or(&get, ENV_MAX_RETRIES, defaults.max_retries)?,
        })
    }

    pub fn build_source(&self) -> Result<Rc<dyn RecordSource>> {
        match &self.source {
            SourceConfig::Http { base_url } => {
                let source = HttpRecordSource::new(base_url, self.timeout)
                    .context("failed to build http source")?
                    .with_retries(self.max_retries, DEFAULT_RETRY_BASE_DELAY);
                tracing::info!(endpoint = source.base_url(), "using remote ark endpoint");
                Ok(Rc::new(source))
            }
            #[cfg(not(target_arch = "wasm32"))]
            SourceConfig::Sqlite { db_path } => Ok(Rc::new(
                crate::infra::sqlite::repo::SqliteRecordSource::open(db_path.clone())?,
            )),
        }
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|err| anyhow!("invalid {key} value `{raw}`: {err}")),
        None => Ok(default),
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn default_db_path() -> Result<PathBuf> {
    let project_dirs = directories::ProjectDirs::from("org", "ark-grid", "ark-grid")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))?;
    Ok(project_dirs.data_local_dir().join("arks.sqlite"))
}

#[cfg(not(target_arch = "wasm32"))]
pub fn default_webview_data_dir() -> Result<PathBuf> {
    let project_dirs = directories::ProjectDirs::from("org", "ark-grid", "ark-grid")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))?;
    let webview_data_dir = project_dirs.data_local_dir().join("webview");
    std::fs::create_dir_all(&webview_data_dir).with_context(|| {
        format!(
            "failed to create webview dir: {}",
            webview_data_dir.display()
        )
    })?;
    Ok(webview_data_dir)
}
