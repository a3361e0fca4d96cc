use serde::{Deserialize, Serialize};

pub mod cell;
pub mod field;
pub mod field_type;
pub mod type_option;
pub mod user;

// Re-export field model types
pub use field::{Cell, CellWrite, Field, NewField, RowOrder, TypeOptions, View};

// Re-export type tags and format enums
pub use field_type::{DateFormat, FieldType, FieldVisibility, NumberFormat, TimeFormat, ViewLayout};

// Re-export parsed cell and type-option structures
pub use cell::{
    ChecklistCellData, DateCellData, FileMediaCellData, FileMediaItem, PersonCellData,
    RelationCellData, SelectCellData, SelectOption,
};
pub use type_option::{
    DateTimeFormats, DateTypeOption, NumberTypeOption, PersonTypeOption, RelationTypeOption,
    RollupTypeOption, SelectTypeOption, TypeOptionData, ROLLUP_TYPE_OPTION_KEYS,
};
pub use user::UserDateTimePreference;

/// Schema version written once the Rollup/Time misclassification has been corrected.
pub const TARGET_SCHEMA_VERSION: i64 = 2;

/// Structured error types for database operations.
///
/// Structural absence (a document that is not a database, a missing
/// container) is never an error; these variants cover lookups of ids the
/// caller named explicitly and failures of injected collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum DatabaseError {
    #[error("Field not found: {id}")]
    FieldNotFound { id: String },

    #[error("View not found: {id}")]
    ViewNotFound { id: String },

    #[error("Row not found: {id}")]
    RowNotFound { id: String },

    #[error("Failed to load row document {key}: {message}")]
    LoaderFailed { key: String, message: String },

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl DatabaseError {
    pub fn internal(message: impl Into<String>) -> Self {
        DatabaseError::InternalError {
            message: message.into(),
        }
    }
}
