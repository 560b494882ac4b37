//! Declarative column, sheet and workbook schemas for xlsx import/export.
//!
//! A [`WorkbookDef`] reads an uploaded workbook into validated records keyed
//! by field name and writes such records back into xlsx bytes. Parsing goes
//! through `sheetform-io` backends; this crate owns the schema semantics.

pub mod column;
pub mod error;
pub mod import;
pub mod manifest;
pub mod sheet;
pub mod workbook;

pub use column::{ColumnDef, ColumnEnum, ColumnType, ValueHook};
pub use error::{ErrorKind, SchemaError, SheetformError, ValidationError};
pub use import::{ColumnSpec, ImportKit};
pub use manifest::{Manifest, ManifestIssue, manifest_schema};
pub use sheet::{RowContext, RowHandler, RowHandlerError, RowOutcome, SheetDef};
pub use workbook::{ReadBackend, SheetRows, WorkbookConfig, WorkbookDef};

pub use sheetform_common::{CellValue, Row};
pub use sheetform_io::{DirectorySink, DownloadSink, FileSource, IoError};
