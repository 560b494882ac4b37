//! Declarative workbook schemas in YAML or JSON.
//!
//! A manifest carries everything a [`WorkbookDef`] needs except hooks and row
//! handlers, which are attached in code after [`Manifest::build`].

use crate::column::{ColumnDef, ColumnEnum, ColumnType};
use crate::error::SchemaError;
use crate::sheet::SheetDef;
use crate::workbook::{WorkbookConfig, WorkbookDef};
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sheetform_common::CellValue;
use std::fmt;

/// Excel sheet names: 1-31 chars, none of `[]:*?/\`, no leading or trailing
/// apostrophe.
static SHEET_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\[\]:*?/\\']([^\[\]:*?/\\]{0,29}[^\[\]:*?/\\'])?$")
        .expect("sheet name regex must compile")
});

/// Canonical manifest representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(
    title = "sheetform workbook manifest",
    description = "Sheets and columns of an xlsx import/export schema."
)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Sheets in workbook order.
    pub sheets: Vec<SheetManifest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SheetManifest {
    pub name: String,
    /// Cap on data rows read; omitted or 0 reads everything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_row_count: Option<usize>,
    pub columns: Vec<ColumnManifest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ColumnManifest {
    /// Header text.
    pub name: String,
    /// Record key.
    pub field: String,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default, rename = "type")]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<EnumManifest>,
}

/// Scalar label/value pair. Arrays and objects are rejected by validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EnumManifest {
    pub label: JsonValue,
    pub value: JsonValue,
}

fn default_true() -> bool {
    true
}

/// A single validation failure, addressed by a dotted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestIssue {
    pub path: String,
    pub message: String,
}

impl ManifestIssue {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ManifestIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl Manifest {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn from_yaml_reader<R: std::io::Read>(reader: R) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(reader)
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Every invariant violation, in document order.
    pub fn issues(&self) -> Vec<ManifestIssue> {
        let mut issues = Vec::new();

        if self.sheets.is_empty() {
            issues.push(ManifestIssue::new("sheets", "at least one sheet is required"));
        }

        let mut sheet_names = FxHashSet::default();
        for (si, sheet) in self.sheets.iter().enumerate() {
            let path = format!("sheets[{si}]");
            if !SHEET_NAME.is_match(&sheet.name) {
                issues.push(ManifestIssue::new(
                    format!("{path}.name"),
                    format!(
                        "`{}` is not a valid sheet name (1-31 chars, no []:*?/\\)",
                        sheet.name
                    ),
                ));
            }
            if !sheet_names.insert(sheet.name.as_str()) {
                issues.push(ManifestIssue::new(
                    format!("{path}.name"),
                    format!("duplicate sheet `{}`", sheet.name),
                ));
            }
            if sheet.columns.is_empty() {
                issues.push(ManifestIssue::new(
                    format!("{path}.columns"),
                    "at least one column is required",
                ));
            }

            let mut names = FxHashSet::default();
            let mut fields = FxHashSet::default();
            for (ci, column) in sheet.columns.iter().enumerate() {
                let path = format!("{path}.columns[{ci}]");
                if column.name.trim().is_empty() {
                    issues.push(ManifestIssue::new(
                        format!("{path}.name"),
                        "header must not be empty",
                    ));
                } else if !names.insert(column.name.as_str()) {
                    issues.push(ManifestIssue::new(
                        format!("{path}.name"),
                        format!("duplicate column `{}`", column.name),
                    ));
                }
                if column.field.trim().is_empty() {
                    issues.push(ManifestIssue::new(
                        format!("{path}.field"),
                        "field must not be empty",
                    ));
                } else if !fields.insert(column.field.as_str()) {
                    issues.push(ManifestIssue::new(
                        format!("{path}.field"),
                        format!("duplicate field `{}`", column.field),
                    ));
                }
                if column.column_type.is_date() && !column.enums.is_empty() {
                    issues.push(ManifestIssue::new(
                        format!("{path}.enums"),
                        "enums are not applied to date columns",
                    ));
                }
                for (ei, entry) in column.enums.iter().enumerate() {
                    for (key, value) in [("label", &entry.label), ("value", &entry.value)] {
                        if value.is_array() || value.is_object() {
                            issues.push(ManifestIssue::new(
                                format!("{path}.enums[{ei}].{key}"),
                                "must be a string, number, boolean or null",
                            ));
                        }
                    }
                }
            }
        }

        issues
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        let issues = self.issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::InvalidManifest {
                issues: issues.iter().map(ToString::to_string).collect(),
            })
        }
    }

    /// Validate and build the workbook schema with the default config.
    pub fn build(&self) -> Result<WorkbookDef, SchemaError> {
        self.build_with(WorkbookConfig::default())
    }

    pub fn build_with(&self, config: WorkbookConfig) -> Result<WorkbookDef, SchemaError> {
        self.validate()?;
        let sheets = self.sheets.iter().map(|sheet| {
            let columns = sheet.columns.iter().map(|column| {
                ColumnDef::new(&column.name, &column.field)
                    .required(column.required)
                    .with_type(column.column_type)
                    .with_enums(column.enums.iter().map(|entry| {
                        ColumnEnum::new(json_cell(&entry.label), json_cell(&entry.value))
                    }))
            });
            SheetDef::new(&sheet.name, columns)
                .with_max_row_count(sheet.max_row_count.unwrap_or_default())
        });
        Ok(WorkbookDef::new(sheets).with_config(config))
    }
}

fn json_cell(value: &JsonValue) -> CellValue {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

/// JSON Schema of [`Manifest`], for editor tooling.
pub fn manifest_schema() -> schemars::Schema {
    schemars::schema_for!(Manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASSETS: &str = r#"
sheets:
  - name: 资产
    max_row_count: 100
    columns:
      - name: 编号
        field: no
      - name: 购入日期
        field: bought
        type: date
        required: false
      - name: 状态
        field: status
        enums:
          - { label: 在用, value: active }
          - { label: 报废, value: 0 }
"#;

    #[test]
    fn yaml_defaults_apply() {
        let manifest = Manifest::from_yaml_str(ASSETS).unwrap();
        let columns = &manifest.sheets[0].columns;
        assert!(columns[0].required);
        assert_eq!(columns[0].column_type, ColumnType::String);
        assert!(!columns[1].required);
        assert_eq!(columns[1].column_type, ColumnType::Date);
        assert!(manifest.issues().is_empty());
    }

    #[test]
    fn builds_equivalent_workbook_def() {
        let book = Manifest::from_yaml_str(ASSETS).unwrap().build().unwrap();
        let sheet = book.sheet("资产").unwrap();
        assert_eq!(sheet.max_row_count(), Some(100));
        let status = sheet.column("状态").unwrap();
        assert_eq!(status.field(), "status");
        assert_eq!(status.enums()[1], ColumnEnum::new("报废", 0i64));
        assert_eq!(
            status.parse_read_value("在用".into()),
            Ok(CellValue::from("active"))
        );
    }

    #[test]
    fn collects_every_issue() {
        let yaml = r#"
sheets:
  - name: "bad/name"
    columns:
      - { name: a, field: x }
      - { name: a, field: x }
      - { name: d, field: d, type: date, enums: [{ label: [1], value: 1 }] }
  - name: "bad/name"
    columns: []
"#;
        let manifest = Manifest::from_yaml_str(yaml).unwrap();
        let paths: Vec<_> = manifest.issues().into_iter().map(|i| i.path).collect();
        assert_eq!(
            paths,
            [
                "sheets[0].name",
                "sheets[0].columns[1].name",
                "sheets[0].columns[1].field",
                "sheets[0].columns[2].enums",
                "sheets[0].columns[2].enums[0].label",
                "sheets[1].name",
                "sheets[1].name",
                "sheets[1].columns",
            ]
        );
        assert!(matches!(
            manifest.build(),
            Err(SchemaError::InvalidManifest { issues }) if issues.len() == 8
        ));
    }

    #[test]
    fn sheet_name_rules() {
        let longest = "x".repeat(31);
        let too_long = "x".repeat(32);
        for ok in ["资产", "Sheet 1", "a'b", longest.as_str()] {
            assert!(SHEET_NAME.is_match(ok), "{ok}");
        }
        for bad in ["", "'quoted'", "a:b", "[x]", too_long.as_str()] {
            assert!(!SHEET_NAME.is_match(bad), "{bad}");
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let yaml = "sheets:\n  - name: s\n    columns: []\n    colour: red\n";
        assert!(Manifest::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn json_and_yaml_agree() {
        let from_yaml = Manifest::from_yaml_str(ASSETS).unwrap();
        let json = serde_json::to_string(&from_yaml).unwrap();
        assert_eq!(Manifest::from_json_str(&json).unwrap(), from_yaml);
    }

    #[test]
    fn schema_names_the_column_types() {
        let schema = serde_json::to_value(manifest_schema()).unwrap();
        let text = schema.to_string();
        for ty in ["string", "number", "date", "datetime"] {
            assert!(text.contains(&format!("\"{ty}\"")), "{ty}");
        }
        assert_eq!(schema["title"], "sheetform workbook manifest");
    }
}
