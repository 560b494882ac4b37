#![cfg(feature = "calamine")]

use crate::traits::{SheetData, SpreadsheetReader};
use sheetform_common::CellValue;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Range, Reader, Xlsx, XlsxError};

/// Read-only xlsx backend over an in-memory buffer.
///
/// Date-formatted cells surface as their numeric serial so column coercion
/// sees the same value regardless of cell formatting.
pub struct CalamineAdapter {
    workbook: Xlsx<Cursor<Vec<u8>>>,
    sheet_names: Vec<String>,
}

impl CalamineAdapter {
    fn convert_value(data: &Data) -> CellValue {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Int(*i),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Text(e.to_string()),
            #[allow(unreachable_patterns)]
            other => CellValue::Text(other.to_string()),
        }
    }

    fn range_to_cells(range: &Range<Data>) -> BTreeMap<(u32, u32), CellValue> {
        let (start_row, start_col) = range.start().unwrap_or_default();
        let mut cells = BTreeMap::new();
        for (row, col, val) in range.used_cells() {
            // Calamine uses 0-based offsets from the range start
            let excel_row = start_row + row as u32 + 1;
            let excel_col = start_col + col as u32 + 1;
            let value = Self::convert_value(val);
            if !value.is_blank() {
                cells.insert((excel_row, excel_col), value);
            }
        }
        cells
    }
}

impl SpreadsheetReader for CalamineAdapter {
    type Error = XlsxError;

    fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, Self::Error>
    where
        Self: Sized,
    {
        let data = std::fs::read(path).map_err(XlsxError::Io)?;
        Self::open_bytes(data)
    }

    fn open_bytes(data: Vec<u8>) -> Result<Self, Self::Error>
    where
        Self: Sized,
    {
        let workbook = Xlsx::new(Cursor::new(data))?;
        let sheet_names = workbook.sheet_names().to_vec();
        #[cfg(feature = "tracing")]
        tracing::debug!(backend = "calamine", sheets = sheet_names.len(), "opened workbook");
        Ok(Self {
            workbook,
            sheet_names,
        })
    }

    fn sheet_names(&self) -> Result<Vec<String>, Self::Error> {
        Ok(self.sheet_names.clone())
    }

    fn read_sheet(&mut self, sheet: &str) -> Result<SheetData, Self::Error> {
        let range = self.workbook.worksheet_range(sheet)?;
        let cells = Self::range_to_cells(&range);
        Ok(SheetData { cells })
    }
}
