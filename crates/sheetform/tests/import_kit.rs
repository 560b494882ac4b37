// Template download, import and export through a directory sink.
mod common;

use common::row;
use sheetform::{
    CellValue, ColumnSpec, DirectorySink, ErrorKind, ImportKit, IoError, RowHandlerError,
    RowOutcome, SheetformError,
};
use std::sync::Mutex;

fn kit() -> ImportKit {
    ImportKit::new(
        "服务器/国产化服务器",
        [
            ColumnSpec::new("编号", "no"),
            ColumnSpec::new("名称", "name"),
            ColumnSpec::new("备注", "note").optional(),
        ],
    )
}

#[tokio::test]
async fn template_is_header_only_and_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    kit().download_template(&DirectorySink::new(dir.path())).unwrap();

    let path = dir.path().join("服务器_国产化服务器-数据导入模板.xlsx");
    assert!(path.exists());
    let rows = kit().read_data(path).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn export_then_import() {
    let captured = Mutex::new(None);
    let sink = |name: &str, bytes: Vec<u8>| -> Result<(), IoError> {
        *captured.lock().unwrap() = Some((name.to_string(), bytes));
        Ok(())
    };
    let rows = vec![
        row([("no", "A001".into()), ("name", "web-1".into())]),
        row([
            ("no", "A002".into()),
            ("name", "db-1".into()),
            ("note", "主库".into()),
        ]),
    ];
    kit().export(rows, &sink).unwrap();

    let (name, bytes) = captured.into_inner().unwrap().unwrap();
    assert_eq!(name, "服务器_国产化服务器.xlsx");
    let read = kit().read_data(bytes).await.unwrap();
    assert_eq!(read.len(), 2);
    assert_eq!(read[0]["note"], CellValue::Empty);
    assert_eq!(read[1]["note"], CellValue::from("主库"));
}

#[tokio::test]
async fn row_handler_can_enrich_or_reject() {
    let rows = vec![
        row([("no", "A001".into()), ("name", "web-1".into())]),
        row([("no", "X999".into()), ("name", "old".into())]),
    ];
    let captured = Mutex::new(Vec::new());
    let sink = |_: &str, bytes: Vec<u8>| -> Result<(), IoError> {
        *captured.lock().unwrap() = bytes;
        Ok(())
    };
    kit().export(rows, &sink).unwrap();
    let bytes = captured.into_inner().unwrap();

    let tagging = kit().with_row_handler(|ctx| {
        let mut extra = sheetform::Row::new();
        extra.insert("line".into(), CellValue::Int(ctx.index as i64 + 2));
        Ok(RowOutcome::Merge(extra))
    });
    let read = tagging.read_data(bytes.clone()).await.unwrap();
    assert_eq!(read[1]["line"], CellValue::Int(3));

    let strict = kit().with_row_handler(|ctx| {
        if ctx.data["no"].as_text().is_some_and(|no| no.starts_with('X')) {
            Err(RowHandlerError::Message("retired asset".into()))
        } else {
            Ok(RowOutcome::Keep)
        }
    });
    let err = strict.read_data(bytes).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(matches!(err, SheetformError::Handler { row: 3, .. }));
    insta::assert_snapshot!(err.to_string(), @r#"sheet "服务器_国产化服务器" row 3: retired asset"#);
}
