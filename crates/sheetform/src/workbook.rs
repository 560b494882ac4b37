use crate::error::{SchemaError, SheetformError};
use crate::sheet::SheetDef;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sheetform_common::Row;
use sheetform_io::{
    CalamineAdapter, DownloadSink, FileSource, IoError, SpreadsheetReader, SpreadsheetWriter,
    UmyaAdapter,
};

/// Backend used to parse uploaded workbooks. Writing always goes through umya.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReadBackend {
    #[default]
    Calamine,
    Umya,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbookConfig {
    pub read_backend: ReadBackend,
    /// Appended to download names, without the dot.
    pub extension: String,
}

impl Default for WorkbookConfig {
    fn default() -> Self {
        Self {
            read_backend: ReadBackend::Calamine,
            extension: "xlsx".to_string(),
        }
    }
}

/// Records of one sheet, as produced by a read and consumed by a write.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SheetRows {
    pub name: String,
    pub rows: Vec<Row>,
}

impl SheetRows {
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

/// Ordered set of sheet declarations describing a whole file.
#[derive(Debug, Clone, Default)]
pub struct WorkbookDef {
    sheets: IndexMap<String, SheetDef>,
    config: WorkbookConfig,
}

impl WorkbookDef {
    pub fn new(sheets: impl IntoIterator<Item = SheetDef>) -> Self {
        let mut map = IndexMap::new();
        for sheet in sheets {
            map.insert(sheet.name().to_string(), sheet);
        }
        Self {
            sheets: map,
            config: WorkbookConfig::default(),
        }
    }

    pub fn with_config(mut self, config: WorkbookConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &WorkbookConfig {
        &self.config
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetDef> {
        self.sheets.get(name)
    }

    pub fn sheets(&self) -> impl Iterator<Item = &SheetDef> {
        self.sheets.values()
    }

    /// Load `source` and read every declared sheet, in declaration order.
    pub async fn read(&self, source: impl FileSource) -> Result<Vec<SheetRows>, SheetformError> {
        let bytes = source.read_bytes().await?;
        self.read_bytes(bytes)
    }

    /// Read an xlsx buffer already in memory.
    ///
    /// All declared sheets must be present; a missing one fails the read
    /// before any sheet is validated.
    pub fn read_bytes(&self, bytes: Vec<u8>) -> Result<Vec<SheetRows>, SheetformError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "sheetform_read",
            bytes = bytes.len(),
            backend = ?self.config.read_backend,
            sheets = self.sheets.len()
        )
        .entered();

        match self.config.read_backend {
            ReadBackend::Calamine => {
                let reader = CalamineAdapter::open_bytes(bytes)
                    .map_err(|e| IoError::from_backend("calamine", e))?;
                self.read_with(reader, "calamine")
            }
            ReadBackend::Umya => {
                let reader =
                    UmyaAdapter::open_bytes(bytes).map_err(|e| IoError::from_backend("umya", e))?;
                self.read_with(reader, "umya")
            }
        }
    }

    fn read_with<R: SpreadsheetReader>(
        &self,
        mut reader: R,
        backend: &'static str,
    ) -> Result<Vec<SheetRows>, SheetformError> {
        let present = reader
            .sheet_names()
            .map_err(|e| IoError::from_backend(backend, e))?;
        if let Some(missing) = self.sheets.keys().find(|name| !present.contains(name)) {
            return Err(SchemaError::MissingSheet {
                sheet: missing.clone(),
            }
            .into());
        }

        let mut out = Vec::with_capacity(self.sheets.len());
        for (name, def) in &self.sheets {
            let data = reader
                .read_sheet(name)
                .map_err(|e| IoError::from_backend(backend, e))?;
            out.push(SheetRows {
                name: name.clone(),
                rows: def.read(&data)?,
            });
        }
        Ok(out)
    }

    /// Render `data` into xlsx bytes with one sheet per declaration.
    ///
    /// Sheets absent from `data` are written header-only; entries naming an
    /// undeclared sheet are ignored. With duplicate names the first wins.
    pub fn write(&self, data: &[SheetRows]) -> Result<Vec<u8>, SheetformError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("sheetform_write", sheets = self.sheets.len()).entered();

        let mut by_name: FxHashMap<&str, &[Row]> = FxHashMap::default();
        for sheet in data {
            by_name
                .entry(sheet.name.as_str())
                .or_insert(sheet.rows.as_slice());
        }

        let mut writer = UmyaAdapter::new();
        for (name, def) in &self.sheets {
            let rows = by_name.get(name.as_str()).copied().unwrap_or_default();
            let sheet = def.write(rows)?;
            writer
                .write_sheet(name, sheet)
                .map_err(|e| IoError::from_backend("umya", e))?;
        }
        let bytes = writer
            .save_to_bytes()
            .map_err(|e| IoError::from_backend("umya", e))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(bytes = bytes.len(), "workbook written");
        Ok(bytes)
    }

    /// Write `data` and hand the file to `sink` as `<save_as>.<extension>`.
    pub fn write_as(
        &self,
        data: &[SheetRows],
        save_as: &str,
        sink: &impl DownloadSink,
    ) -> Result<(), SheetformError> {
        let bytes = self.write(data)?;
        let filename = format!("{save_as}.{}", self.config.extension);
        #[cfg(feature = "tracing")]
        tracing::info!(filename = filename.as_str(), "delivering workbook");
        sink.deliver(&filename, bytes)?;
        Ok(())
    }
}
