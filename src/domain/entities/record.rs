use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArkRecord {
    #[serde(deserialize_with = "null_as_empty")]
    pub ark: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub original_identifier: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub project: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub path: String,
    pub url: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// One page of results as returned by the data endpoint.
///
/// `total_pages` is computed by the endpoint; the client only uses it for
/// bounds checking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePage {
    #[serde(rename = "data")]
    pub rows: Vec<ArkRecord>,
    pub total_results: usize,
    pub total_pages: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
}
