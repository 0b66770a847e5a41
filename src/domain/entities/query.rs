use crate::domain::entities::field::FieldId;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_param(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortSpec {
    pub field: FieldId,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterSpec {
    pub field: FieldId,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageSpec {
    pub index: usize,
    pub size: usize,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            index: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Filter, sort and page selection at one point in time.
///
/// Structural equality is cache-key identity: two signatures built from the
/// same parts compare and hash equal no matter how they were assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QuerySignature {
    pub filter: Option<FilterSpec>,
    pub sort: Option<SortSpec>,
    pub page: PageSpec,
}

impl QuerySignature {
    pub fn new(filter: Option<FilterSpec>, sort: Option<SortSpec>, page: PageSpec) -> Self {
        Self { filter, sort, page }
    }

    pub fn with_filter(mut self, field: FieldId, value: impl Into<String>) -> Self {
        self.filter = Some(FilterSpec {
            field,
            value: value.into(),
        });
        self
    }

    pub fn with_sort(mut self, field: FieldId, direction: SortDirection) -> Self {
        self.sort = Some(SortSpec { field, direction });
        self
    }

    pub fn with_page(mut self, index: usize, size: usize) -> Self {
        self.page = PageSpec { index, size };
        self
    }
}
