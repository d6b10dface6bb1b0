//! This module contains the kernel for structured (JSON) columns.
//!
//! On the wire a JSON column is a text column holding one JSON document per row; the
//! null marker is inherited from the text codec. In memory the caller picks the
//! representation ([`JsonRepr`]): dynamic `serde_json::Value`s, the raw text, or an
//! Arrow `StructArray` whose fields are inferred from the decoded objects.

use std::sync::Arc;

use arrow::array::{Array, StructArray};
use arrow::buffer::NullBuffer;
use arrow::datatypes::Schema;
use arrow::json::reader::infer_json_schema_from_iterator;
use arrow::json::{LineDelimitedWriter, ReaderBuilder};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use serde::de::IgnoredAny;
use serde_json::Value;

use crate::error::CopybinError;
use crate::kernels::text;
use crate::types::{JsonColumn, JsonRepr};

//==================================================================================
// 1. Public API
//==================================================================================

pub fn encode(column: &JsonColumn) -> Result<Vec<u8>, CopybinError> {
    match column {
        JsonColumn::Value(values) => {
            let docs = values
                .iter()
                .map(|v| v.as_ref().map(serde_json::to_string).transpose())
                .collect::<Result<Vec<_>, _>>()?;
            text::encode(&docs)
        }
        JsonColumn::Text(values) => {
            for (row, doc) in values.iter().enumerate() {
                if let Some(doc) = doc {
                    serde_json::from_str::<IgnoredAny>(doc).map_err(|e| {
                        CopybinError::InvalidValue(format!(
                            "row {}: not a JSON document: {}",
                            row, e
                        ))
                    })?;
                }
            }
            text::encode(values)
        }
        JsonColumn::Struct(array) => text::encode(&struct_to_documents(array)?),
    }
}

pub fn decode(bytes: &[u8], repr: JsonRepr) -> Result<JsonColumn, CopybinError> {
    let docs = text::decode(bytes)?;
    match repr {
        JsonRepr::Text => Ok(JsonColumn::Text(docs)),
        JsonRepr::Value => Ok(JsonColumn::Value(parse_documents(&docs)?)),
        JsonRepr::Struct => Ok(JsonColumn::Struct(documents_to_struct(&parse_documents(
            &docs,
        )?)?)),
    }
}

//==================================================================================
// 2. Helpers
//==================================================================================

fn parse_documents(docs: &[Option<String>]) -> Result<Vec<Option<Value>>, CopybinError> {
    docs.iter()
        .enumerate()
        .map(|(row, doc)| {
            doc.as_deref()
                .map(|d| {
                    serde_json::from_str(d).map_err(|e| {
                        CopybinError::CorruptData(format!(
                            "row {}: invalid JSON document: {}",
                            row, e
                        ))
                    })
                })
                .transpose()
        })
        .collect()
}

/// Builds a struct array from one JSON object per row; `None` rows become null.
fn documents_to_struct(values: &[Option<Value>]) -> Result<StructArray, CopybinError> {
    let validity: Vec<bool> = values.iter().map(Option::is_some).collect();
    let nulls = validity.contains(&false).then(|| NullBuffer::from(validity));

    let objects: Vec<&Value> = values.iter().flatten().collect();
    if let Some(row) = values
        .iter()
        .position(|v| matches!(v, Some(doc) if !doc.is_object()))
    {
        return Err(CopybinError::UnsupportedType(format!(
            "row {}: only JSON objects can be decoded as a struct, use the value representation instead",
            row
        )));
    }

    let schema = infer_json_schema_from_iterator(objects.iter().map(|v| Ok(*v)))?;
    if schema.fields().is_empty() {
        return Ok(StructArray::new_empty_fields(values.len(), nulls));
    }

    let empty = Value::Object(serde_json::Map::new());
    let rows: Vec<&Value> = values.iter().map(|v| v.as_ref().unwrap_or(&empty)).collect();
    let mut decoder = ReaderBuilder::new(Arc::new(schema))
        .with_batch_size(rows.len().max(1))
        .with_coerce_primitive(true)
        .build_decoder()?;
    decoder.serialize(&rows)?;
    let batch = decoder.flush()?.ok_or_else(|| {
        CopybinError::InternalError("JSON decoder produced no batch".to_string())
    })?;

    let (fields, columns, _) = StructArray::from(batch).into_parts();
    Ok(StructArray::try_new(fields, columns, nulls)?)
}

/// Renders each row of a struct array as a JSON object; null rows become `None`.
fn struct_to_documents(array: &StructArray) -> Result<Vec<Option<String>>, CopybinError> {
    let len = array.len();
    if array.num_columns() == 0 {
        return Ok((0..len)
            .map(|i| array.is_valid(i).then(|| "{}".to_string()))
            .collect());
    }

    let (fields, columns, _) = array.clone().into_parts();
    let batch = RecordBatch::try_new_with_options(
        Arc::new(Schema::new(fields)),
        columns,
        &RecordBatchOptions::new().with_row_count(Some(len)),
    )?;
    let mut writer = LineDelimitedWriter::new(Vec::new());
    writer.write(&batch)?;
    writer.finish()?;
    let rendered = String::from_utf8(writer.into_inner())
        .map_err(|e| CopybinError::InternalError(format!("JSON writer emitted non-UTF-8: {}", e)))?;

    let lines: Vec<&str> = rendered.lines().collect();
    if lines.len() != len {
        return Err(CopybinError::InternalError(format!(
            "JSON writer emitted {} rows for a {}-row struct",
            lines.len(),
            len
        )));
    }
    Ok(lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| array.is_valid(i).then(|| line.to_string()))
        .collect())
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
