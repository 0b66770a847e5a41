use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::usecase::ports::source::ValidationError;

/// Columns the remote record set can be filtered or sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    Ark,
    OriginalIdentifier,
    Project,
    Path,
}

impl FieldId {
    pub const ALL: [FieldId; 4] = [
        FieldId::Ark,
        FieldId::OriginalIdentifier,
        FieldId::Project,
        FieldId::Path,
    ];

    /// Wire name, used both as a filter parameter key and as a `sortBy` value.
    pub fn as_param(self) -> &'static str {
        match self {
            FieldId::Ark => "ark",
            FieldId::OriginalIdentifier => "original_identifier",
            FieldId::Project => "project",
            FieldId::Path => "path",
        }
    }

    pub fn meta(self) -> &'static ColumnMeta {
        COLUMNS
            .iter()
            .find(|column| column.field == self)
            .unwrap_or(&COLUMNS[0])
    }

    pub fn is_filterable(self) -> bool {
        self.meta().filterable
    }

    pub fn is_sortable(self) -> bool {
        self.meta().sortable
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

impl FromStr for FieldId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        FieldId::ALL
            .into_iter()
            .find(|field| field.as_param() == value)
            .ok_or_else(|| ValidationError::UnknownField(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMeta {
    pub field: FieldId,
    pub header: &'static str,
    pub filterable: bool,
    pub sortable: bool,
    pub width: u32,
}

// The path filter is not offered: the endpoint does not apply it reliably.
pub const COLUMNS: [ColumnMeta; 4] = [
    ColumnMeta {
        field: FieldId::Ark,
        header: "ARK",
        filterable: true,
        sortable: true,
        width: 50,
    },
    ColumnMeta {
        field: FieldId::OriginalIdentifier,
        header: "Original Identifier",
        filterable: true,
        sortable: true,
        width: 250,
    },
    ColumnMeta {
        field: FieldId::Project,
        header: "Project",
        filterable: true,
        sortable: true,
        width: 600,
    },
    ColumnMeta {
        field: FieldId::Path,
        header: "Path",
        filterable: false,
        sortable: true,
        width: 300,
    },
];

pub fn filterable_columns() -> impl Iterator<Item = &'static ColumnMeta> {
    COLUMNS.iter().filter(|column| column.filterable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_ids_round_trip_through_wire_names() {
        for field in FieldId::ALL {
            let parsed: FieldId = field.as_param().parse().expect("wire name should parse");
            assert_eq!(parsed, field);
        }
    }

    #[test]
    fn unknown_field_is_a_validation_error() {
        let result = "url".parse::<FieldId>();

        assert_eq!(result, Err(ValidationError::UnknownField("url".to_string())));
    }

    #[test]
    fn every_field_has_exactly_one_column() {
        for field in FieldId::ALL {
            let count = COLUMNS.iter().filter(|column| column.field == field).count();
            assert_eq!(count, 1, "{field} should have one column entry");
        }
    }

    #[test]
    fn path_is_sortable_but_not_filterable() {
        assert!(FieldId::Path.is_sortable());
        assert!(!FieldId::Path.is_filterable());
        assert_eq!(
            filterable_columns().map(|column| column.field).collect::<Vec<_>>(),
            vec![FieldId::Ark, FieldId::OriginalIdentifier, FieldId::Project]
        );
    }
}
