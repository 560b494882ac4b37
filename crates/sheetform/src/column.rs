use crate::error::ValidationError;
use chrono::{NaiveDate, NaiveDateTime};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sheetform_common::{CellValue, legacy_serial_to_datetime};
use std::fmt;
use std::sync::Arc;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Value transform run before the built-in coercion (read) or before
/// formatting (write). Receives the current value and the column it belongs to.
pub type ValueHook =
    Arc<dyn Fn(CellValue, &ColumnDef) -> Result<CellValue, ValidationError> + Send + Sync>;

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    String,
    Number,
    Date,
    DateTime,
}

impl ColumnType {
    pub fn is_date(self) -> bool {
        matches!(self, ColumnType::Date | ColumnType::DateTime)
    }
}

/// One entry of an enum column: `label` is what the sheet shows, `value`
/// what the record holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnEnum {
    pub label: CellValue,
    pub value: CellValue,
}

impl ColumnEnum {
    pub fn new(label: impl Into<CellValue>, value: impl Into<CellValue>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Column declaration: binds a header `name` to a record `field`.
#[derive(Clone)]
pub struct ColumnDef {
    name: String,
    field: String,
    required: bool,
    column_type: ColumnType,
    enums: Vec<ColumnEnum>,
    read_parser: Option<ValueHook>,
    write_parser: Option<ValueHook>,
}

impl fmt::Debug for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("name", &self.name)
            .field("field", &self.field)
            .field("required", &self.required)
            .field("column_type", &self.column_type)
            .field("enums", &self.enums)
            .field("read_parser", &self.read_parser.is_some())
            .field("write_parser", &self.write_parser.is_some())
            .finish()
    }
}

impl ColumnDef {
    /// Required string column without enums or hooks.
    pub fn new(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            required: true,
            column_type: ColumnType::String,
            enums: Vec::new(),
            read_parser: None,
            write_parser: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = column_type;
        self
    }

    pub fn with_enums(mut self, enums: impl IntoIterator<Item = ColumnEnum>) -> Self {
        self.enums = enums.into_iter().collect();
        self
    }

    pub fn with_read_parser<F>(mut self, hook: F) -> Self
    where
        F: Fn(CellValue, &ColumnDef) -> Result<CellValue, ValidationError> + Send + Sync + 'static,
    {
        self.read_parser = Some(Arc::new(hook));
        self
    }

    pub fn with_write_parser<F>(mut self, hook: F) -> Self
    where
        F: Fn(CellValue, &ColumnDef) -> Result<CellValue, ValidationError> + Send + Sync + 'static,
    {
        self.write_parser = Some(Arc::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn enums(&self) -> &[ColumnEnum] {
        &self.enums
    }

    /// Enum mapping applies only to non-date columns.
    fn maps_enums(&self) -> bool {
        !self.enums.is_empty() && !self.column_type.is_date()
    }

    /// Coerce a raw cell value into its record value.
    pub fn parse_read_value(&self, value: CellValue) -> Result<CellValue, ValidationError> {
        let value = match &self.read_parser {
            Some(hook) => hook(value, self)?,
            None => value,
        };
        if value.is_blank() {
            if self.required {
                return Err(ValidationError::Empty);
            }
            return Ok(value);
        }

        let value = match self.column_type {
            ColumnType::Date | ColumnType::DateTime => self.parse_read_date(value)?,
            ColumnType::Number => match value.parse_int_lenient() {
                Some(n) => CellValue::Int(n),
                None => return Err(ValidationError::NotANumber(value.to_string())),
            },
            ColumnType::String => value,
        };

        if self.maps_enums() {
            return self
                .enums
                .iter()
                .find(|e| e.label.loosely_eq(&value))
                .map(|e| e.value.clone())
                .ok_or(ValidationError::UnknownEnum(value));
        }
        Ok(value)
    }

    /// Convert a record value into the cell value written to the sheet.
    pub fn parse_write_value(&self, value: CellValue) -> Result<CellValue, ValidationError> {
        let value = match &self.write_parser {
            Some(hook) => hook(value, self)?,
            None => value,
        };
        if value.is_blank() {
            return Ok(value);
        }

        let value = match self.column_type {
            ColumnType::DateTime => value,
            ColumnType::Date => match value {
                CellValue::Text(s) => {
                    CellValue::Text(s.split(' ').next().unwrap_or_default().to_string())
                }
                other => return Err(ValidationError::NotADate(other.to_string())),
            },
            _ => value,
        };

        if self.maps_enums() {
            return self
                .enums
                .iter()
                .find(|e| e.value.loosely_eq(&value))
                .map(|e| e.label.clone())
                .ok_or(ValidationError::UnknownEnum(value));
        }
        Ok(value)
    }

    fn parse_read_date(&self, value: CellValue) -> Result<CellValue, ValidationError> {
        let parsed = match &value {
            CellValue::Int(_) | CellValue::Number(_) => {
                value.as_f64().and_then(legacy_serial_to_datetime)
            }
            CellValue::Text(s) => parse_date_text(s),
            _ => None,
        };
        let dt = parsed.ok_or_else(|| ValidationError::NotADate(value.to_string()))?;
        let format = if self.column_type == ColumnType::DateTime {
            DATETIME_FORMAT
        } else {
            DATE_FORMAT
        };
        Ok(CellValue::Text(dt.format(format).to_string()))
    }
}

/// Accept text already written in display form, so written sheets read back.
fn parse_date_text(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::from(s)
    }

    #[test]
    fn required_blank_values_fail_for_every_type() {
        for ty in [
            ColumnType::String,
            ColumnType::Number,
            ColumnType::Date,
            ColumnType::DateTime,
        ] {
            let col = ColumnDef::new("c", "c").with_type(ty);
            assert_eq!(col.parse_read_value(CellValue::Empty), Err(ValidationError::Empty));
            assert_eq!(col.parse_read_value(text("")), Err(ValidationError::Empty));
        }
    }

    #[test]
    fn optional_blank_values_pass_through() {
        let col = ColumnDef::new("c", "c")
            .required(false)
            .with_type(ColumnType::Number)
            .with_enums([ColumnEnum::new("是", 1i64)]);
        assert_eq!(col.parse_read_value(CellValue::Empty), Ok(CellValue::Empty));
        assert_eq!(col.parse_read_value(text("")), Ok(text("")));
        assert_eq!(col.parse_write_value(CellValue::Empty), Ok(CellValue::Empty));
    }

    #[test]
    fn number_columns_truncate() {
        let col = ColumnDef::new("n", "n").with_type(ColumnType::Number);
        assert_eq!(col.parse_read_value(CellValue::Number(7.9)), Ok(CellValue::Int(7)));
        assert_eq!(col.parse_read_value(text("12 台")), Ok(CellValue::Int(12)));
        assert_eq!(
            col.parse_read_value(text("n/a")),
            Err(ValidationError::NotANumber("n/a".into()))
        );
        // write does not coerce numbers
        assert_eq!(col.parse_write_value(CellValue::Number(7.9)), Ok(CellValue::Number(7.9)));
    }

    #[test]
    fn date_serial_uses_legacy_conversion() {
        let date = ColumnDef::new("d", "d").with_type(ColumnType::Date);
        let datetime = ColumnDef::new("dt", "dt").with_type(ColumnType::DateTime);
        assert_eq!(date.parse_read_value(CellValue::Number(44927.0)), Ok(text("2023-01-01")));
        assert_eq!(
            datetime.parse_read_value(CellValue::Number(44927.0)),
            Ok(text("2023-01-01 08:00:00"))
        );
        assert_eq!(
            datetime.parse_read_value(CellValue::Number(44927.25)),
            Ok(text("2023-01-01 14:00:00"))
        );
    }

    #[test]
    fn date_text_is_normalized_and_garbage_rejected() {
        let date = ColumnDef::new("d", "d").with_type(ColumnType::Date);
        let datetime = ColumnDef::new("dt", "dt").with_type(ColumnType::DateTime);
        assert_eq!(date.parse_read_value(text("2023-01-01 09:30:00")), Ok(text("2023-01-01")));
        assert_eq!(
            datetime.parse_read_value(text("2023-01-01")),
            Ok(text("2023-01-01 00:00:00"))
        );
        assert_eq!(
            date.parse_read_value(text("soon")),
            Err(ValidationError::NotADate("soon".into()))
        );
        assert!(date.parse_read_value(CellValue::Bool(true)).is_err());
    }

    #[test]
    fn date_write_truncates_and_is_idempotent() {
        let date = ColumnDef::new("d", "d").with_type(ColumnType::Date);
        let once = date.parse_write_value(text("2023-01-01 08:00:00")).unwrap();
        assert_eq!(once, text("2023-01-01"));
        assert_eq!(date.parse_write_value(once.clone()), Ok(once));

        let datetime = ColumnDef::new("dt", "dt").with_type(ColumnType::DateTime);
        assert_eq!(
            datetime.parse_write_value(text("2023-01-01 08:00:00")),
            Ok(text("2023-01-01 08:00:00"))
        );
        assert!(date.parse_write_value(CellValue::Int(44927)).is_err());
    }

    #[test]
    fn enums_map_in_both_directions() {
        let col = ColumnDef::new("状态", "status").with_enums([
            ColumnEnum::new("在用", "active"),
            ColumnEnum::new("停用", "retired"),
        ]);
        assert_eq!(col.parse_read_value(text("停用")), Ok(text("retired")));
        assert_eq!(col.parse_write_value(text("active")), Ok(text("在用")));
        assert_eq!(
            col.parse_read_value(text("报废")),
            Err(ValidationError::UnknownEnum(text("报废")))
        );
        assert_eq!(
            col.parse_write_value(text("scrapped")),
            Err(ValidationError::UnknownEnum(text("scrapped")))
        );
    }

    #[test]
    fn numeric_enum_labels_match_coerced_numbers() {
        let col = ColumnDef::new("级别", "level")
            .with_type(ColumnType::Number)
            .with_enums([ColumnEnum::new(1i64, "low"), ColumnEnum::new(2i64, "high")]);
        assert_eq!(col.parse_read_value(CellValue::Number(2.0)), Ok(text("high")));
        assert_eq!(col.parse_write_value(text("low")), Ok(CellValue::Int(1)));
    }

    #[test]
    fn date_columns_ignore_enums() {
        let col = ColumnDef::new("d", "d")
            .with_type(ColumnType::Date)
            .with_enums([ColumnEnum::new("x", "y")]);
        assert_eq!(col.parse_read_value(CellValue::Int(44927)), Ok(text("2023-01-01")));
        assert_eq!(col.parse_write_value(text("2023-01-01")), Ok(text("2023-01-01")));
    }

    #[test]
    fn hooks_run_before_coercion() {
        let col = ColumnDef::new("数量", "qty")
            .with_type(ColumnType::Number)
            .with_read_parser(|v, _| match v {
                CellValue::Text(s) => Ok(CellValue::Text(s.replace(',', ""))),
                other => Ok(other),
            })
            .with_write_parser(|v, column| {
                if v.is_blank() {
                    Err(ValidationError::Custom(format!("{} is mandatory", column.name())))
                } else {
                    Ok(v)
                }
            });
        assert_eq!(col.parse_read_value(text("1,200")), Ok(CellValue::Int(1200)));
        assert_eq!(
            col.parse_write_value(CellValue::Empty),
            Err(ValidationError::Custom("数量 is mandatory".into()))
        );
    }

    #[test]
    fn hook_can_blank_a_required_value() {
        let col = ColumnDef::new("c", "c").with_read_parser(|_, _| Ok(CellValue::Empty));
        assert_eq!(col.parse_read_value(text("x")), Err(ValidationError::Empty));
    }
}
