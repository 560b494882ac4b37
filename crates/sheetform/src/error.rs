use sheetform_common::CellValue;
use sheetform_io::IoError;
use thiserror::Error;

/// A single cell value that does not satisfy its column.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("value must not be empty")]
    Empty,

    #[error("invalid enum value \"{0}\"")]
    UnknownEnum(CellValue),

    #[error("value \"{0}\" is not a number")]
    NotANumber(String),

    #[error("value \"{0}\" is not a date")]
    NotADate(String),

    /// Raised by read/write hooks.
    #[error("{0}")]
    Custom(String),
}

/// The workbook or a handler does not have the shape the schema declares.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("sheet \"{sheet}\" not found in workbook")]
    MissingSheet { sheet: String },

    #[error("column \"{column}\" not found in sheet \"{sheet}\"")]
    MissingColumn { sheet: String, column: String },

    #[error(
        "row handler of sheet \"{sheet}\" returned unsupported type \"{found}\": only object/false/null are allowed"
    )]
    RowHandlerType { sheet: String, found: String },

    #[error("invalid manifest: {}", .issues.join("; "))]
    InvalidManifest { issues: Vec<String> },
}

/// Coarse classification of a [`SheetformError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Schema,
    Io,
}

#[derive(Debug, Error)]
pub enum SheetformError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Read failure at a 1-based display row (header is row 1).
    #[error("sheet \"{sheet}\" row {row} column \"{column}\": {source}")]
    Cell {
        sheet: String,
        row: usize,
        column: String,
        #[source]
        source: ValidationError,
    },

    /// Write failure at a 0-based index into the caller's rows.
    #[error("sheet \"{sheet}\" data index {index} column \"{column}\": {source}")]
    WriteCell {
        sheet: String,
        index: usize,
        column: String,
        #[source]
        source: ValidationError,
    },

    #[error("sheet \"{sheet}\" row {row} is invalid")]
    RowRejected { sheet: String, row: usize },

    #[error("sheet \"{sheet}\" row {row}: {message}")]
    Handler {
        sheet: String,
        row: usize,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] IoError),
}

impl SheetformError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SheetformError::Schema(_) => ErrorKind::Schema,
            SheetformError::Cell { .. }
            | SheetformError::WriteCell { .. }
            | SheetformError::RowRejected { .. }
            | SheetformError::Handler { .. } => ErrorKind::Validation,
            SheetformError::Io(_) => ErrorKind::Io,
        }
    }

    /// The underlying cell-level failure, if any.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            SheetformError::Cell { source, .. } | SheetformError::WriteCell { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}
