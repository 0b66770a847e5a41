use crate::domain::entities::query::QuerySignature;

pub const DATA_PATH: &str = "/data";

pub const PARAM_PAGE: &str = "page";
pub const PARAM_PAGE_SIZE: &str = "pageSize";
pub const PARAM_SORT_BY: &str = "sortBy";
pub const PARAM_ORDER: &str = "order";

/// Wire form of a query: endpoint path plus ordered query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestDescriptor {
    pub path: String,
    pub params: Vec<(&'static str, String)>,
}

impl RequestDescriptor {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBuilder {
    path: String,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new(DATA_PATH)
    }
}

impl RequestBuilder {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Map a signature to its request. Parameters always come out in the
    /// same order: page, pageSize, the filter column, sortBy, order. Absent
    /// filter or sort parts emit nothing.
    pub fn build(&self, signature: &QuerySignature) -> RequestDescriptor {
        let mut params = vec![
            (PARAM_PAGE, signature.page.index.to_string()),
            (PARAM_PAGE_SIZE, signature.page.size.to_string()),
        ];

        if let Some(filter) = &signature.filter {
            params.push((filter.field.as_param(), filter.value.clone()));
        }

        if let Some(sort) = signature.sort {
            params.push((PARAM_SORT_BY, sort.field.as_param().to_string()));
            params.push((PARAM_ORDER, sort.direction.as_param().to_string()));
        }

        tracing::debug!(?params, "built data request");

        RequestDescriptor {
            path: self.path.clone(),
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::field::FieldId;
    use crate::domain::entities::query::SortDirection;

    #[test]
    fn bare_signature_only_carries_paging() {
        let request = RequestBuilder::default().build(&QuerySignature::default());

        assert_eq!(request.path, "/data");
        assert_eq!(
            request.params,
            vec![("page", "0".to_string()), ("pageSize", "10".to_string())]
        );
        assert_eq!(request.param(PARAM_SORT_BY), None);
        assert_eq!(request.param(PARAM_ORDER), None);
    }

    #[test]
    fn filter_sort_and_page_map_to_params() {
        let signature = QuerySignature::default()
            .with_filter(FieldId::Project, "astro")
            .with_sort(FieldId::Ark, SortDirection::Desc)
            .with_page(0, 10);

        let request = RequestBuilder::default().build(&signature);

        assert_eq!(
            request.params,
            vec![
                ("page", "0".to_string()),
                ("pageSize", "10".to_string()),
                ("project", "astro".to_string()),
                ("sortBy", "ark".to_string()),
                ("order", "desc".to_string()),
            ]
        );
    }

    #[test]
    fn equal_signatures_build_identical_requests() {
        let builder = RequestBuilder::new("/api/data");
        let first = QuerySignature::default()
            .with_sort(FieldId::Path, SortDirection::Asc)
            .with_page(3, 25);
        let second = QuerySignature::default()
            .with_page(3, 25)
            .with_sort(FieldId::Path, SortDirection::Asc);

        assert_eq!(builder.build(&first), builder.build(&second));
        assert_eq!(builder.build(&first).param("order"), Some("asc"));
    }
}
