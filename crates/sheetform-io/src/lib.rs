//! Spreadsheet I/O for sheetform.
//!
//! Backends turn xlsx bytes into sparse [`SheetData`] grids and back; the
//! [`grid`] module converts grids into header-keyed rows; [`source`] holds the
//! seams through which callers hand in files and receive downloads.

pub mod backends;
pub mod error;
pub mod grid;
pub mod source;
pub mod traits;

#[cfg(feature = "calamine")]
pub use backends::CalamineAdapter;
#[cfg(feature = "umya")]
pub use backends::UmyaAdapter;
pub use error::IoError;
pub use grid::{rows_to_sheet, sheet_headers, sheet_to_rows};
pub use source::{DirectorySink, DownloadSink, FileSource};
pub use traits::{SheetData, SpreadsheetReader, SpreadsheetWriter};

// Re-export for convenience
pub use sheetform_common::{CellValue, Row};
