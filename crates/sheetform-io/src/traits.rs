use sheetform_common::CellValue;
use std::collections::BTreeMap;
use std::path::Path;

/// Sparse grid of one worksheet. Keys are 1-based `(row, col)`; only
/// non-empty cells are stored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SheetData {
    pub cells: BTreeMap<(u32, u32), CellValue>,
}

impl SheetData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value; blank values clear the cell instead.
    pub fn set(&mut self, row: u32, col: u32, value: CellValue) {
        if matches!(value, CellValue::Empty) {
            self.cells.remove(&(row, col));
            return;
        }
        self.cells.insert((row, col), value);
    }

    pub fn get(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Used range as `((first_row, first_col), (last_row, last_col))`.
    pub fn used_range(&self) -> Option<((u32, u32), (u32, u32))> {
        let first_row = self.cells.keys().next()?.0;
        let last_row = self.cells.keys().next_back()?.0;
        let (first_col, last_col) = self
            .cells
            .keys()
            .fold((u32::MAX, 0), |(lo, hi), (_, c)| (lo.min(*c), hi.max(*c)));
        Some(((first_row, first_col), (last_row, last_col)))
    }
}

pub trait SpreadsheetReader {
    type Error: std::error::Error + Send + Sync + 'static;

    fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, Self::Error>
    where
        Self: Sized;

    fn open_bytes(data: Vec<u8>) -> Result<Self, Self::Error>
    where
        Self: Sized;

    /// Sheet names in workbook order.
    fn sheet_names(&self) -> Result<Vec<String>, Self::Error>;

    fn read_sheet(&mut self, sheet: &str) -> Result<SheetData, Self::Error>;

    fn has_sheet(&self, sheet: &str) -> Result<bool, Self::Error> {
        Ok(self.sheet_names()?.iter().any(|name| name == sheet))
    }
}

pub trait SpreadsheetWriter {
    type Error: std::error::Error + Send + Sync + 'static;

    fn create_sheet(&mut self, name: &str) -> Result<(), Self::Error>;

    fn write_cell(
        &mut self,
        sheet: &str,
        row: u32,
        col: u32,
        value: CellValue,
    ) -> Result<(), Self::Error>;

    /// Create `sheet` and copy every stored cell of `data` into it.
    fn write_sheet(&mut self, sheet: &str, data: SheetData) -> Result<(), Self::Error> {
        self.create_sheet(sheet)?;
        for ((r, c), value) in data.cells {
            self.write_cell(sheet, r, c, value)?;
        }
        Ok(())
    }

    /// Serialize the workbook into xlsx bytes.
    fn save_to_bytes(&mut self) -> Result<Vec<u8>, Self::Error>;
}
