use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::types::Value;

use crate::domain::entities::field::FieldId;
use crate::domain::entities::query::{SortDirection, DEFAULT_PAGE_SIZE};
use crate::domain::entities::record::{ArkRecord, ResponsePage};
use crate::infra::sqlite::schema::open_connection;
use crate::usecase::ports::source::FetchError;
use crate::usecase::services::request_builder::{
    RequestDescriptor, PARAM_ORDER, PARAM_PAGE, PARAM_PAGE_SIZE, PARAM_SORT_BY,
};

/// A data request as the endpoint reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArkQuery {
    pub filter: Option<(FieldId, String)>,
    pub sort: Option<(FieldId, SortDirection)>,
    pub page: usize,
    pub page_size: usize,
}

impl ArkQuery {
    /// Interpret request parameters: `page`/`pageSize` default to 0/10, the
    /// first non-empty filter column wins, and sorting needs both `sortBy`
    /// and `order`.
    pub fn from_request(request: &RequestDescriptor) -> Result<Self, FetchError> {
        let page = parse_number(request, PARAM_PAGE)?.unwrap_or(0);
        let page_size = parse_number(request, PARAM_PAGE_SIZE)?.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(bad_request(format!("{PARAM_PAGE_SIZE} must be greater than zero")));
        }

        let filter = FieldId::ALL.into_iter().find_map(|field| {
            request
                .param(field.as_param())
                .filter(|value| !value.is_empty())
                .map(|value| (field, value.to_string()))
        });

        let sort_by = request
            .param(PARAM_SORT_BY)
            .map(|value| value.parse::<FieldId>().map_err(|err| bad_request(err.to_string())))
            .transpose()?;
        let order = request
            .param(PARAM_ORDER)
            .map(|value| match value {
                "asc" => Ok(SortDirection::Asc),
                "desc" => Ok(SortDirection::Desc),
                other => Err(bad_request(format!("unsupported order `{other}`"))),
            })
            .transpose()?;

        Ok(Self {
            filter,
            sort: sort_by.zip(order),
            page,
            page_size,
        })
    }
}

fn parse_number(request: &RequestDescriptor, key: &str) -> Result<Option<usize>, FetchError> {
    request
        .param(key)
        .map(|value| {
            value
                .parse::<usize>()
                .map_err(|_| bad_request(format!("{key} must be a non-negative integer")))
        })
        .transpose()
}

fn bad_request(message: String) -> FetchError {
    FetchError::Server {
        status: 400,
        message,
    }
}

pub fn query_arks(db_path: &Path, query: &ArkQuery) -> Result<ResponsePage> {
    let conn = open_connection(db_path)?;

    // column names come from FieldId, never from user text
    let mut where_sql = String::new();
    let mut filter_params = Vec::<Value>::new();
    if let Some((field, term)) = &query.filter {
        where_sql = format!("WHERE {} LIKE ?", field.as_param());
        filter_params.push(Value::Text(format!("%{term}%")));
    }

    let count_sql = format!("SELECT COUNT(*) FROM arks {where_sql}");
    let total_results: i64 = conn
        .query_row(
            &count_sql,
            rusqlite::params_from_iter(filter_params.iter().cloned()),
            |row| row.get(0),
        )
        .context("failed to query filtered row count")?;
    let total_results = usize::try_from(total_results).context("negative row count")?;

    let order_sql = match query.sort {
        Some((field, direction)) => format!(
            "ORDER BY COALESCE({}, '') {}, id ASC",
            field.as_param(),
            direction.as_param()
        ),
        None => "ORDER BY id ASC".to_string(),
    };

    let row_sql = format!(
        "SELECT ark, original_identifier, project, path, url
         FROM arks
         {where_sql}
         {order_sql}
         LIMIT ? OFFSET ?"
    );
    let mut row_params = filter_params;
    row_params.push(Value::Integer(
        i64::try_from(query.page_size).context("page size out of range")?,
    ));
    row_params.push(Value::Integer(
        i64::try_from(query.page.saturating_mul(query.page_size)).context("offset out of range")?,
    ));

    let mut row_stmt = conn
        .prepare(&row_sql)
        .context("failed to prepare page query")?;
    let rows = row_stmt
        .query_map(rusqlite::params_from_iter(row_params), |row| {
            Ok(ArkRecord {
                ark: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                original_identifier: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                project: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                path: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                url: row.get(4)?,
            })
        })
        .context("failed to query page rows")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect page rows")?;

    Ok(ResponsePage {
        rows,
        total_results,
        total_pages: total_results.div_ceil(query.page_size),
        page: Some(query.page),
        page_size: Some(query.page_size),
    })
}
