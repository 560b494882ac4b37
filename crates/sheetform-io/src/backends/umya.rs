#![cfg(feature = "umya")]

use crate::traits::{SheetData, SpreadsheetReader, SpreadsheetWriter};
use sheetform_common::CellValue;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;
use umya_spreadsheet::{CellRawValue, Spreadsheet, XlsxError, reader::xlsx};

/// Read/write xlsx backend. Writing starts from a workbook with no sheets.
pub struct UmyaAdapter {
    workbook: Spreadsheet,
}

impl Default for UmyaAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl UmyaAdapter {
    pub fn new() -> Self {
        Self {
            workbook: umya_spreadsheet::new_file_empty_worksheet(),
        }
    }

    fn convert_cell_value(cv: &umya_spreadsheet::CellValue) -> CellValue {
        let raw = cv.get_raw_value();
        if raw.is_error() {
            return CellValue::Text(cv.get_value().to_string());
        }
        match raw {
            CellRawValue::Numeric(n) => CellValue::Number(*n),
            CellRawValue::Bool(b) => CellValue::Bool(*b),
            CellRawValue::String(s) => CellValue::Text(s.to_string()),
            CellRawValue::RichText(rt) => CellValue::Text(rt.get_text().to_string()),
            CellRawValue::Lazy(s) => {
                let txt: &str = s.as_ref();
                if let Ok(n) = txt.parse::<f64>() {
                    CellValue::Number(n)
                } else if txt.eq_ignore_ascii_case("TRUE") {
                    CellValue::Bool(true)
                } else if txt.eq_ignore_ascii_case("FALSE") {
                    CellValue::Bool(false)
                } else {
                    CellValue::Text(txt.to_string())
                }
            }
            CellRawValue::Error(_) | CellRawValue::Empty => CellValue::Empty,
        }
    }

    fn missing_sheet(sheet: &str) -> XlsxError {
        XlsxError::CellError(format!("sheet \"{sheet}\" not found"))
    }
}

impl SpreadsheetReader for UmyaAdapter {
    type Error = XlsxError;

    fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, Self::Error>
    where
        Self: Sized,
    {
        let workbook = xlsx::read(path.as_ref())?;
        Ok(Self { workbook })
    }

    fn open_bytes(data: Vec<u8>) -> Result<Self, Self::Error>
    where
        Self: Sized,
    {
        let workbook = xlsx::read_reader(Cursor::new(data), true)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            backend = "umya",
            sheets = workbook.get_sheet_count(),
            "opened workbook"
        );
        Ok(Self { workbook })
    }

    fn sheet_names(&self) -> Result<Vec<String>, Self::Error> {
        Ok(self
            .workbook
            .get_sheet_collection()
            .iter()
            .map(|ws| ws.get_name().to_string())
            .collect())
    }

    fn read_sheet(&mut self, sheet: &str) -> Result<SheetData, Self::Error> {
        let ws = self
            .workbook
            .get_sheet_by_name(sheet)
            .ok_or_else(|| Self::missing_sheet(sheet))?;
        let mut cells: BTreeMap<(u32, u32), CellValue> = BTreeMap::new();
        for cell in ws.get_cell_collection() {
            let coord = cell.get_coordinate();
            let col = *coord.get_col_num();
            let row = *coord.get_row_num();
            let value = Self::convert_cell_value(cell.get_cell_value());
            if value.is_blank() {
                continue;
            }
            cells.insert((row, col), value);
        }
        Ok(SheetData { cells })
    }
}

impl SpreadsheetWriter for UmyaAdapter {
    type Error = XlsxError;

    fn create_sheet(&mut self, name: &str) -> Result<(), Self::Error> {
        if self.workbook.get_sheet_by_name(name).is_none() {
            self.workbook
                .new_sheet(name)
                .map_err(|e| XlsxError::CellError(format!("cannot create sheet \"{name}\": {e}")))?;
        }
        Ok(())
    }

    fn write_cell(
        &mut self,
        sheet: &str,
        row: u32,
        col: u32,
        value: CellValue,
    ) -> Result<(), Self::Error> {
        let ws = self
            .workbook
            .get_sheet_by_name_mut(sheet)
            .ok_or_else(|| Self::missing_sheet(sheet))?;
        // umya uses (col, row)
        let cell = ws.get_cell_mut((col, row));
        match value {
            CellValue::Empty => {
                cell.set_blank();
            }
            CellValue::Bool(b) => {
                cell.set_value_bool(b);
            }
            CellValue::Int(i) => {
                cell.set_value_number(i as f64);
            }
            CellValue::Number(n) => {
                cell.set_value_number(n);
            }
            CellValue::Text(s) => {
                // never let umya guess a type for text
                cell.set_value_string(s);
            }
        }
        Ok(())
    }

    fn save_to_bytes(&mut self) -> Result<Vec<u8>, Self::Error> {
        let mut buf = Cursor::new(Vec::new());
        umya_spreadsheet::writer::xlsx::write_writer(&self.workbook, &mut buf)?;
        Ok(buf.into_inner())
    }
}
