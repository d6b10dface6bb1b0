//! In-memory typed columns and the table that groups them.
//!
//! A [`TypedColumn`] is an ordered sequence of optional values of one logical type.
//! Nulls are plain `None`s here; the binary kernels translate them to and from the
//! type-specific in-band sentinels.

use arrow::array::{Array, StructArray};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

use crate::error::CopybinError;
use crate::types::{FieldSpec, JsonRepr, LogicalType, SchemaDescriptor};

/// Structured (JSON-like) values in one of the caller-selectable representations.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonColumn {
    Value(Vec<Option<Value>>),
    Text(Vec<Option<String>>),
    Struct(StructArray),
}

impl JsonColumn {
    pub fn repr(&self) -> JsonRepr {
        match self {
            Self::Value(_) => JsonRepr::Value,
            Self::Text(_) => JsonRepr::Text,
            Self::Struct(_) => JsonRepr::Struct,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Value(v) => v.len(),
            Self::Text(v) => v.len(),
            Self::Struct(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        match self {
            Self::Value(v) => v.iter().filter(|x| x.is_none()).count(),
            Self::Text(v) => v.iter().filter(|x| x.is_none()).count(),
            Self::Struct(a) => a.null_count(),
        }
    }
}

/// One column of values, tagged by logical type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedColumn {
    Boolean(Vec<Option<bool>>),
    Int8(Vec<Option<i8>>),
    Int16(Vec<Option<i16>>),
    Int32(Vec<Option<i32>>),
    Int64(Vec<Option<i64>>),
    Float32(Vec<Option<f32>>),
    Float64(Vec<Option<f64>>),
    /// Unscaled integers: the decimal value is `values[i] / 10^scale`.
    Decimal {
        precision: u8,
        scale: u8,
        values: Vec<Option<i128>>,
    },
    Date(Vec<Option<NaiveDate>>),
    Time(Vec<Option<NaiveTime>>),
    Datetime(Vec<Option<NaiveDateTime>>),
    Text(Vec<Option<String>>),
    Blob(Vec<Option<Vec<u8>>>),
    Json(JsonColumn),
}

// Applies the same expression to the `Vec<Option<_>>` of every plain variant.
macro_rules! with_values {
    ($col:expr, $v:ident => $body:expr, $json:ident => $json_body:expr) => {
        match $col {
            TypedColumn::Boolean($v) => $body,
            TypedColumn::Int8($v) => $body,
            TypedColumn::Int16($v) => $body,
            TypedColumn::Int32($v) => $body,
            TypedColumn::Int64($v) => $body,
            TypedColumn::Float32($v) => $body,
            TypedColumn::Float64($v) => $body,
            TypedColumn::Decimal { values: $v, .. } => $body,
            TypedColumn::Date($v) => $body,
            TypedColumn::Time($v) => $body,
            TypedColumn::Datetime($v) => $body,
            TypedColumn::Text($v) => $body,
            TypedColumn::Blob($v) => $body,
            TypedColumn::Json($json) => $json_body,
        }
    };
}

impl TypedColumn {
    /// Convenience constructor for decimal columns.
    pub fn decimal(precision: u8, scale: u8, values: Vec<Option<i128>>) -> Self {
        Self::Decimal {
            precision,
            scale,
            values,
        }
    }

    pub fn len(&self) -> usize {
        with_values!(self, v => v.len(), j => j.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        with_values!(self, v => v.iter().filter(|x| x.is_none()).count(), j => j.null_count())
    }

    /// The logical type this column holds.
    pub fn logical_type(&self) -> LogicalType {
        match self {
            Self::Boolean(_) => LogicalType::Boolean,
            Self::Int8(_) => LogicalType::Int8,
            Self::Int16(_) => LogicalType::Int16,
            Self::Int32(_) => LogicalType::Int32,
            Self::Int64(_) => LogicalType::Int64,
            Self::Float32(_) => LogicalType::Float32,
            Self::Float64(_) => LogicalType::Float64,
            Self::Decimal {
                precision, scale, ..
            } => LogicalType::Decimal {
                precision: *precision,
                scale: *scale,
            },
            Self::Date(_) => LogicalType::Date,
            Self::Time(_) => LogicalType::Time,
            Self::Datetime(_) => LogicalType::Datetime,
            Self::Text(_) => LogicalType::Text,
            Self::Blob(_) => LogicalType::Blob,
            Self::Json(j) => LogicalType::Json(j.repr()),
        }
    }

    /// Returns `true` if this column can be written as `target`.
    ///
    /// Decimals may be written at any precision/scale (they are rescaled on encode),
    /// and any JSON representation can be written to a JSON column.
    pub fn is_compatible_with(&self, target: &LogicalType) -> bool {
        match (self, target) {
            (Self::Decimal { .. }, LogicalType::Decimal { .. }) => true,
            (Self::Json(_), LogicalType::Json(_)) => true,
            (col, target) => col.logical_type() == *target,
        }
    }
}

/// A set of equally long columns bound to an ordered schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    schema: SchemaDescriptor,
    columns: Vec<TypedColumn>,
}

impl Table {
    /// Binds `columns` to `schema` by position.
    ///
    /// Fails if the counts differ, a column is not writable as its declared type,
    /// or the columns do not all have the same number of rows.
    pub fn try_new(
        schema: SchemaDescriptor,
        columns: Vec<TypedColumn>,
    ) -> Result<Self, CopybinError> {
        if schema.len() != columns.len() {
            return Err(CopybinError::SchemaMismatch(format!(
                "schema has {} columns but {} were provided",
                schema.len(),
                columns.len()
            )));
        }

        for (field, column) in schema.iter().zip(&columns) {
            if !column.is_compatible_with(&field.logical_type) {
                return Err(CopybinError::SchemaMismatch(format!(
                    "column '{}' is declared as {} but holds {}",
                    field.name,
                    field.logical_type,
                    column.logical_type()
                )));
            }
        }

        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some((field, column)) = schema
                .iter()
                .zip(&columns)
                .find(|(_, c)| c.len() != expected)
            {
                return Err(CopybinError::SchemaMismatch(format!(
                    "column '{}' has {} rows, expected {}",
                    field.name,
                    column.len(),
                    expected
                )));
            }
        }

        Ok(Self { schema, columns })
    }

    /// Builds a table whose schema is derived from the columns themselves.
    pub fn from_columns<I, S>(columns: I) -> Result<Self, CopybinError>
    where
        I: IntoIterator<Item = (S, TypedColumn)>,
        S: Into<String>,
    {
        let mut fields = Vec::new();
        let mut data = Vec::new();
        for (name, column) in columns {
            fields.push(FieldSpec::new(name, column.logical_type()));
            data.push(column);
        }
        Self::try_new(SchemaDescriptor::try_from_fields(fields)?, data)
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    pub fn columns(&self) -> &[TypedColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&TypedColumn> {
        self.schema.index_of(name).map(|idx| &self.columns[idx])
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(TypedColumn::len).unwrap_or(0)
    }

    pub fn into_parts(self) -> (SchemaDescriptor, Vec<TypedColumn>) {
        (self.schema, self.columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len_and_null_count() {
        let col = TypedColumn::Text(vec![Some("".into()), None, Some("ab".into())]);
        assert_eq!(col.len(), 3);
        assert_eq!(col.null_count(), 1);
        assert_eq!(col.logical_type(), LogicalType::Text);

        let dec = TypedColumn::decimal(10, 2, vec![Some(12345), None]);
        assert_eq!(dec.logical_type(), LogicalType::Decimal { precision: 10, scale: 2 });
        assert_eq!(dec.null_count(), 1);
    }

    #[test]
    fn test_table_rejects_ragged_columns() {
        let result = Table::from_columns(vec![
            ("a", TypedColumn::Int32(vec![Some(1), Some(2)])),
            ("b", TypedColumn::Int32(vec![Some(1)])),
        ]);
        assert!(matches!(result, Err(CopybinError::SchemaMismatch(_))));
    }

    #[test]
    fn test_table_rejects_type_mismatch() {
        let schema = SchemaDescriptor::new().with("a", LogicalType::Int64).unwrap();
        let result = Table::try_new(schema, vec![TypedColumn::Int32(vec![Some(1)])]);
        assert!(matches!(result, Err(CopybinError::SchemaMismatch(_))));
    }

    #[test]
    fn test_decimal_column_accepts_other_wire_scale() {
        let schema = SchemaDescriptor::new()
            .with("d", LogicalType::Decimal { precision: 9, scale: 1 })
            .unwrap();
        let table = Table::try_new(schema, vec![TypedColumn::decimal(12, 4, vec![Some(1)])]);
        assert!(table.is_ok());
    }

    #[test]
    fn test_column_lookup_by_name() {
        let table = Table::from_columns(vec![
            ("x", TypedColumn::Boolean(vec![Some(true)])),
            ("y", TypedColumn::Int8(vec![None])),
        ])
        .unwrap();
        assert_eq!(table.num_rows(), 1);
        assert_eq!(table.column("y"), Some(&TypedColumn::Int8(vec![None])));
        assert_eq!(table.column("z"), None);
    }
}
