pub mod field;
pub mod query;
pub mod record;
