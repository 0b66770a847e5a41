use crate::domain::entities::field::FieldId;
use crate::domain::entities::query::FilterSpec;
use crate::usecase::ports::source::ValidationError;

/// Holds the one committed filter. Nothing here reacts to keystrokes; a
/// filter only changes through [`FilterController::submit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterController {
    active: Option<FilterSpec>,
}

impl FilterController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active filter. Surrounding whitespace is dropped and a
    /// blank value clears it.
    ///
    /// Submitting against a column that is not filterable leaves the current
    /// filter untouched and reports the rejection.
    pub fn submit(&mut self, field: FieldId, value: &str) -> Result<Option<&FilterSpec>, ValidationError> {
        if !field.is_filterable() {
            return Err(ValidationError::NotFilterable(field));
        }

        let value = value.trim();
        self.active = if value.is_empty() {
            None
        } else {
            Some(FilterSpec {
                field,
                value: value.to_string(),
            })
        };
        Ok(self.active.as_ref())
    }

    pub fn active(&self) -> Option<&FilterSpec> {
        self.active.as_ref()
    }
}
