//! Conversion between the sparse [`SheetData`] grid and header-keyed rows.
//!
//! Reading treats the first row of the used range as the header. Every data
//! row inside the used range is returned, blank ones included, so the row at
//! index `i` sits `i + 1` rows below the header.

use crate::traits::SheetData;
use rustc_hash::{FxHashMap, FxHashSet};
use sheetform_common::{CellValue, Row};

const EMPTY_HEADER: &str = "__EMPTY";

/// Header keys for the used range, de-duplicated.
///
/// Blank header cells become `__EMPTY`, `__EMPTY_1`, ...; repeated names get
/// `_1`, `_2`, ... suffixes in order of appearance.
pub fn sheet_headers(sheet: &SheetData) -> Vec<String> {
    let Some(((first_row, first_col), (_, last_col))) = sheet.used_range() else {
        return Vec::new();
    };

    let mut used: FxHashSet<String> = FxHashSet::default();
    let mut suffixes: FxHashMap<String, usize> = FxHashMap::default();
    let mut headers = Vec::with_capacity((last_col - first_col + 1) as usize);
    for col in first_col..=last_col {
        let base = match sheet.get(first_row, col) {
            Some(v) if !v.is_blank() => v.to_string(),
            _ => EMPTY_HEADER.to_string(),
        };
        let mut name = base.clone();
        if used.contains(&name) {
            let n = suffixes.entry(base.clone()).or_insert(0);
            loop {
                *n += 1;
                name = format!("{base}_{n}");
                if !used.contains(&name) {
                    break;
                }
            }
        }
        used.insert(name.clone());
        headers.push(name);
    }
    headers
}

/// Convert a sheet into header-keyed rows; missing cells are `Empty`.
pub fn sheet_to_rows(sheet: &SheetData) -> Vec<Row> {
    let Some(((first_row, first_col), (last_row, _))) = sheet.used_range() else {
        return Vec::new();
    };
    let headers = sheet_headers(sheet);

    ((first_row + 1)..=last_row)
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .map(|(offset, header)| {
                    let value = sheet
                        .get(row, first_col + offset as u32)
                        .cloned()
                        .unwrap_or_default();
                    (header.clone(), value)
                })
                .collect()
        })
        .collect()
}

/// Build a sheet from an array of rows, anchored at `A1`.
pub fn rows_to_sheet<I, R>(rows: I) -> SheetData
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = CellValue>,
{
    let mut sheet = SheetData::new();
    for (r, row) in rows.into_iter().enumerate() {
        for (c, value) in row.into_iter().enumerate() {
            sheet.set(r as u32 + 1, c as u32 + 1, value);
        }
    }
    sheet
}
