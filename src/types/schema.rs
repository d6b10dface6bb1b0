//! The ordered schema descriptor shared by every stage of a transfer.
//!
//! Order is load-bearing: the database binds binary files to columns strictly by
//! position, so the n-th field here always corresponds to file `n`.

use crate::error::CopybinError;
use crate::types::LogicalType;
use serde::{Deserialize, Serialize};

/// Per-column metadata reported by the driver or supplied by the caller.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMeta {
    /// For text columns, the maximum value size in bytes the driver reported.
    /// Longer decoded values are cut to it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,

    /// The timezone the database attached to the column, if any. It is not part of
    /// the binary data; values are always exchanged as naive UTC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
}

/// One named column of a [`SchemaDescriptor`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub logical_type: LogicalType,
    #[serde(default)]
    pub meta: ColumnMeta,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
            meta: ColumnMeta::default(),
        }
    }

    pub fn with_meta(mut self, meta: ColumnMeta) -> Self {
        self.meta = meta;
        self
    }
}

/// An ordered column-name -> (type, metadata) mapping. Insertion order is wire order.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(try_from = "Vec<FieldSpec>", into = "Vec<FieldSpec>")]
pub struct SchemaDescriptor {
    fields: Vec<FieldSpec>,
}

impl SchemaDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a descriptor from fields in wire order, rejecting duplicate names.
    pub fn try_from_fields(fields: Vec<FieldSpec>) -> Result<Self, CopybinError> {
        let mut schema = Self::new();
        for field in fields {
            schema.push_field(field)?;
        }
        Ok(schema)
    }

    /// Appends a column with default metadata.
    pub fn push(
        &mut self,
        name: impl Into<String>,
        logical_type: LogicalType,
    ) -> Result<(), CopybinError> {
        self.push_field(FieldSpec::new(name, logical_type))
    }

    pub fn push_field(&mut self, field: FieldSpec) -> Result<(), CopybinError> {
        if self.index_of(&field.name).is_some() {
            return Err(CopybinError::SchemaMismatch(format!(
                "duplicate column name '{}'",
                field.name
            )));
        }
        self.fields.push(field);
        Ok(())
    }

    /// Builder-style [`SchemaDescriptor::push`].
    pub fn with(
        mut self,
        name: impl Into<String>,
        logical_type: LogicalType,
    ) -> Result<Self, CopybinError> {
        self.push(name, logical_type)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldSpec> {
        self.fields.iter()
    }

    pub fn field(&self, index: usize) -> Option<&FieldSpec> {
        self.fields.get(index)
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Renders `index: name` pairs, used in error messages about positional binding.
    pub fn describe_positions(&self) -> String {
        self.fields
            .iter()
            .enumerate()
            .map(|(idx, f)| format!("{}: {}", idx, f.name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl TryFrom<Vec<FieldSpec>> for SchemaDescriptor {
    type Error = CopybinError;

    fn try_from(fields: Vec<FieldSpec>) -> Result<Self, Self::Error> {
        Self::try_from_fields(fields)
    }
}

impl From<SchemaDescriptor> for Vec<FieldSpec> {
    fn from(schema: SchemaDescriptor) -> Self {
        schema.fields
    }
}

impl<'a> IntoIterator for &'a SchemaDescriptor {
    type Item = &'a FieldSpec;
    type IntoIter = std::slice::Iter<'a, FieldSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
