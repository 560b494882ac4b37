use crate::column::ColumnDef;
use crate::error::{SchemaError, SheetformError};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use sheetform_common::{CellValue, Row};
use sheetform_io::{SheetData, rows_to_sheet, sheet_to_rows};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Arguments handed to a row handler for each non-blank data row.
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    /// Validated record, keyed by field.
    pub data: &'a Row,
    /// Raw row, keyed by header.
    pub raw: &'a Row,
    /// 0-based data row index; the display row is `index + 2`.
    pub index: usize,
}

/// What a row handler decided about a row.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RowOutcome {
    /// Keep the record unchanged.
    #[default]
    Keep,
    /// The row is invalid; the read fails.
    Reject,
    /// Overwrite or add these fields on the record.
    Merge(Row),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowHandlerError {
    #[error("unsupported handler result type \"{0}\"")]
    UnsupportedType(String),
    #[error("{0}")]
    Message(String),
}

impl RowOutcome {
    /// Interpret a dynamic handler result: `null` keeps, `false` rejects, an
    /// object merges. Anything else is rejected with its type name.
    pub fn try_from_json(value: JsonValue) -> Result<Self, RowHandlerError> {
        match value {
            JsonValue::Null => Ok(RowOutcome::Keep),
            JsonValue::Bool(false) => Ok(RowOutcome::Reject),
            JsonValue::Object(map) => Ok(RowOutcome::Merge(
                map.into_iter()
                    .map(|(k, v)| {
                        let cell = match v {
                            JsonValue::Array(_) | JsonValue::Object(_) => {
                                CellValue::Text(v.to_string())
                            }
                            scalar => serde_json::from_value(scalar).unwrap_or_default(),
                        };
                        (k, cell)
                    })
                    .collect(),
            )),
            other => Err(RowHandlerError::UnsupportedType(json_type_name(&other).into())),
        }
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "Null",
        JsonValue::Bool(_) => "Boolean",
        JsonValue::Number(_) => "Number",
        JsonValue::String(_) => "String",
        JsonValue::Array(_) => "Array",
        JsonValue::Object(_) => "Object",
    }
}

pub type RowHandler =
    Arc<dyn Fn(RowContext<'_>) -> Result<RowOutcome, RowHandlerError> + Send + Sync>;

/// Sheet declaration: ordered columns plus optional row post-processing.
#[derive(Clone)]
pub struct SheetDef {
    name: String,
    columns: IndexMap<String, ColumnDef>,
    row_handler: Option<RowHandler>,
    max_row_count: Option<usize>,
}

impl fmt::Debug for SheetDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetDef")
            .field("name", &self.name)
            .field("columns", &self.columns)
            .field("row_handler", &self.row_handler.is_some())
            .field("max_row_count", &self.max_row_count)
            .finish()
    }
}

impl SheetDef {
    /// Columns keep declaration order. Redeclaring a header replaces the
    /// earlier definition in its first position.
    pub fn new(name: impl Into<String>, columns: impl IntoIterator<Item = ColumnDef>) -> Self {
        let mut map = IndexMap::new();
        for column in columns {
            map.insert(column.name().to_string(), column);
        }
        Self {
            name: name.into(),
            columns: map,
            row_handler: None,
            max_row_count: None,
        }
    }

    pub fn with_row_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(RowContext<'_>) -> Result<RowOutcome, RowHandlerError> + Send + Sync + 'static,
    {
        self.row_handler = Some(Arc::new(handler));
        self
    }

    /// Read at most `count` non-blank data rows; `0` means no cap.
    pub fn with_max_row_count(mut self, count: usize) -> Self {
        self.max_row_count = (count > 0).then_some(count);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.values()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.get(name)
    }

    pub fn max_row_count(&self) -> Option<usize> {
        self.max_row_count
    }

    /// Validate a raw sheet into records. Blank rows are dropped silently;
    /// the first invalid cell or rejected row aborts the whole read.
    pub fn read(&self, sheet: &SheetData) -> Result<Vec<Row>, SheetformError> {
        let raw_rows = sheet_to_rows(sheet);
        let mut data = Vec::with_capacity(raw_rows.len());
        let mut skipped = 0usize;
        let mut processed = 0usize;

        for (index, raw) in raw_rows.iter().enumerate() {
            if raw.values().all(CellValue::is_blank) {
                skipped += 1;
                continue;
            }
            // blank rows never count toward the cap
            if self.max_row_count.is_some_and(|max| processed >= max) {
                break;
            }
            processed += 1;
            let row = index + 2;

            let mut record = Row::with_capacity(self.columns.len());
            for (name, column) in &self.columns {
                let value = raw.get(name).ok_or_else(|| SchemaError::MissingColumn {
                    sheet: self.name.clone(),
                    column: name.clone(),
                })?;
                let parsed =
                    column
                        .parse_read_value(value.clone())
                        .map_err(|source| SheetformError::Cell {
                            sheet: self.name.clone(),
                            row,
                            column: name.clone(),
                            source,
                        })?;
                record.insert(column.field().to_string(), parsed);
            }

            if let Some(handler) = &self.row_handler {
                let outcome = handler(RowContext {
                    data: &record,
                    raw,
                    index,
                })
                .map_err(|err| self.handler_error(row, err))?;
                match outcome {
                    RowOutcome::Keep => {}
                    RowOutcome::Reject => {
                        return Err(SheetformError::RowRejected {
                            sheet: self.name.clone(),
                            row,
                        });
                    }
                    RowOutcome::Merge(extra) => record.extend(extra),
                }
            }

            data.push(record);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            sheet = self.name.as_str(),
            rows = data.len(),
            skipped,
            "sheet read"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = skipped;

        Ok(data)
    }

    /// Lay out records under a header row of the declared column names.
    pub fn write(&self, rows: &[Row]) -> Result<SheetData, SheetformError> {
        let header: Vec<CellValue> = self
            .columns
            .keys()
            .map(|name| CellValue::Text(name.clone()))
            .collect();
        let mut grid = Vec::with_capacity(rows.len() + 1);
        grid.push(header);

        for (index, row) in rows.iter().enumerate() {
            let mut cells = Vec::with_capacity(self.columns.len());
            for (name, column) in &self.columns {
                let value = row.get(column.field()).cloned().unwrap_or_default();
                let cell =
                    column
                        .parse_write_value(value)
                        .map_err(|source| SheetformError::WriteCell {
                            sheet: self.name.clone(),
                            index,
                            column: name.clone(),
                            source,
                        })?;
                cells.push(cell);
            }
            grid.push(cells);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(sheet = self.name.as_str(), rows = rows.len(), "sheet written");

        Ok(rows_to_sheet(grid))
    }

    fn handler_error(&self, row: usize, err: RowHandlerError) -> SheetformError {
        match err {
            RowHandlerError::UnsupportedType(found) => SchemaError::RowHandlerType {
                sheet: self.name.clone(),
                found,
            }
            .into(),
            RowHandlerError::Message(message) => SheetformError::Handler {
                sheet: self.name.clone(),
                row,
                message,
            },
        }
    }
}
