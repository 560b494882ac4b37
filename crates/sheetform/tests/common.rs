// Shared fixtures for workbook-level integration tests.
#![allow(dead_code)]

use sheetform::{CellValue, Row};
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

/// Persist `bytes` under a fresh temp directory and return the file path.
pub fn persist(bytes: &[u8], name: &str) -> PathBuf {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.into_path().join(name);
    std::fs::write(&path, bytes).expect("write fixture file");
    path
}

pub fn row<const N: usize>(pairs: [(&str, CellValue); N]) -> Row {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}
