//! Single-sheet import/export built from `{label, field, required}` specs.

use crate::column::ColumnDef;
use crate::error::SheetformError;
use crate::sheet::{RowContext, RowHandlerError, RowOutcome, SheetDef};
use crate::workbook::{SheetRows, WorkbookConfig, WorkbookDef};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sheetform_common::Row;
use sheetform_io::{DownloadSink, FileSource};

const TEMPLATE_SUFFIX: &str = "-数据导入模板";

/// One import column: `label` is the header text, `field` the record key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnSpec {
    pub label: String,
    pub field: String,
    #[serde(default = "default_true")]
    pub required: bool,
}

fn default_true() -> bool {
    true
}

impl ColumnSpec {
    pub fn new(label: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            field: field.into(),
            required: true,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

impl From<&ColumnSpec> for ColumnDef {
    fn from(spec: &ColumnSpec) -> Self {
        ColumnDef::new(&spec.label, &spec.field).required(spec.required)
    }
}

/// Template download, import and export for one kind of data.
///
/// `data_name` may be hierarchical (`服务器/国产化服务器`); every `/` becomes
/// `_` in the sheet and file names.
#[derive(Debug, Clone)]
pub struct ImportKit {
    data_name: String,
    sheet: SheetDef,
    config: WorkbookConfig,
}

impl ImportKit {
    pub fn new(data_name: impl Into<String>, specs: impl IntoIterator<Item = ColumnSpec>) -> Self {
        let data_name = data_name.into();
        let columns: Vec<ColumnDef> = specs.into_iter().map(|spec| (&spec).into()).collect();
        Self {
            sheet: SheetDef::new(sanitize(&data_name), columns),
            data_name,
            config: WorkbookConfig::default(),
        }
    }

    pub fn with_row_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(RowContext<'_>) -> Result<RowOutcome, RowHandlerError> + Send + Sync + 'static,
    {
        self.sheet = self.sheet.with_row_handler(handler);
        self
    }

    pub fn with_config(mut self, config: WorkbookConfig) -> Self {
        self.config = config;
        self
    }

    pub fn data_name(&self) -> &str {
        &self.data_name
    }

    pub fn sheet_name(&self) -> &str {
        self.sheet.name()
    }

    pub fn template_file_stem(&self) -> String {
        format!("{}{TEMPLATE_SUFFIX}", self.sheet_name())
    }

    pub fn workbook_def(&self) -> WorkbookDef {
        WorkbookDef::new([self.sheet.clone()]).with_config(self.config.clone())
    }

    /// Deliver a header-only workbook for users to fill in.
    pub fn download_template(&self, sink: &impl DownloadSink) -> Result<(), SheetformError> {
        self.workbook_def()
            .write_as(&[], &self.template_file_stem(), sink)
    }

    /// Read an uploaded file back into records.
    pub async fn read_data(&self, source: impl FileSource) -> Result<Vec<Row>, SheetformError> {
        let sheets = self.workbook_def().read(source).await?;
        Ok(sheets
            .into_iter()
            .next()
            .map(|sheet| sheet.rows)
            .unwrap_or_default())
    }

    /// Deliver `rows` as `<sheet name>.<extension>`.
    pub fn export(&self, rows: Vec<Row>, sink: &impl DownloadSink) -> Result<(), SheetformError> {
        let name = self.sheet_name().to_string();
        self.workbook_def()
            .write_as(&[SheetRows::new(name.as_str(), rows)], &name, sink)
    }
}

fn sanitize(data_name: &str) -> String {
    data_name.replace('/', "_")
}
