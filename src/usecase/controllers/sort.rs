use crate::domain::entities::field::FieldId;
use crate::domain::entities::query::{SortDirection, SortSpec};

/// Single-column sort state.
///
/// Toggling the sorted column flips its direction; toggling any other column
/// replaces the sort with that column ascending. Once a column is sorted,
/// toggling never returns the grid to an unsorted state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortController {
    active: Option<SortSpec>,
}

impl SortController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, field: FieldId) -> Option<SortSpec> {
        let next = match self.active {
            Some(current) if current.field == field => SortSpec {
                field,
                direction: current.direction.flipped(),
            },
            _ => SortSpec {
                field,
                direction: SortDirection::Asc,
            },
        };
        self.active = Some(next);
        self.active
    }

    pub fn active(&self) -> Option<SortSpec> {
        self.active
    }

    pub fn direction_of(&self, field: FieldId) -> Option<SortDirection> {
        self.active
            .filter(|spec| spec.field == field)
            .map(|spec| spec.direction)
    }
}
