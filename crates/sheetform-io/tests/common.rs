// Shared fixture builders for xlsx integration tests.
#![allow(dead_code)]

use std::io::Cursor;
use std::path::PathBuf;

/// Build an xlsx workbook in memory; the book starts with a single `Sheet1`.
pub fn build_workbook_bytes<F>(f: F) -> Vec<u8>
where
    F: FnOnce(&mut umya_spreadsheet::Spreadsheet),
{
    let mut book = umya_spreadsheet::new_file();
    f(&mut book);
    let mut buf = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut buf).expect("write fixture");
    buf.into_inner()
}

/// Same as [`build_workbook_bytes`] but persisted to a temp file.
pub fn build_workbook<F>(f: F) -> PathBuf
where
    F: FnOnce(&mut umya_spreadsheet::Spreadsheet),
{
    let bytes = build_workbook_bytes(f);
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.into_path().join("fixture.xlsx");
    std::fs::write(&path, bytes).expect("write fixture file");
    path
}
