use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::entities::record::ResponsePage;
use crate::infra::sqlite::queries::{query_arks, ArkQuery};
use crate::infra::sqlite::schema::init_db;
use crate::platform::desktop::blocking::run_blocking;
use crate::usecase::ports::source::{FetchError, RecordSource};
use crate::usecase::services::request_builder::RequestDescriptor;

/// Answers data requests from a local ARK database, the way the remote
/// endpoint would.
#[derive(Debug, Clone)]
pub struct SqliteRecordSource {
    pub db_path: PathBuf,
}

impl SqliteRecordSource {
    /// Opens (and if needed creates) the database at `db_path`.
    pub fn open(db_path: PathBuf) -> Result<Self> {
        init_db(&db_path)?;
        tracing::info!(db = %db_path.display(), "using local ark database");
        Ok(Self { db_path })
    }
}

#[async_trait(?Send)]
impl RecordSource for SqliteRecordSource {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<ResponsePage, FetchError> {
        let query = ArkQuery::from_request(request)?;
        let db_path = self.db_path.clone();
        run_blocking(move || query_arks(&db_path, &query)).map_err(|err| {
            tracing::error!(error = %err, "local ark query failed");
            FetchError::Server {
                status: 500,
                message: err.to_string(),
            }
        })
    }
}
