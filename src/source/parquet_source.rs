//! Typed-family source over Parquet files

use super::{clamp_range, Row, RowStream, RowVisitor, SourceKind, TabularSource};
use crate::error::{InspectError, Result};
use crate::schema::{Column, ColumnType, Schema};
use crate::value::{Temporal, Value};
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use parquet::basic::{ConvertedType, LogicalType, Type as PhysicalType};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;
use parquet::schema::types::Type;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Days between 0001-01-01 (CE day 1) and the Unix epoch
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Parquet file; schema and row count come from the footer
pub struct ParquetSource {
    path: PathBuf,
    reader: SerializedFileReader<File>,
    schema: Schema,
    row_count: usize,
}

impl ParquetSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => InspectError::not_found(path),
            _ => InspectError::Io(e),
        })?;
        let reader = SerializedFileReader::new(file)
            .map_err(|e| InspectError::unreadable(path, e.to_string()))?;

        let file_metadata = reader.metadata().file_metadata();
        let row_count = file_metadata.num_rows().max(0) as usize;
        let schema = schema_from_parquet(file_metadata.schema_descr().root_schema());

        debug!(
            "Opened typed source {} ({} columns, {} rows, {} row groups)",
            path.display(),
            schema.width(),
            row_count,
            reader.metadata().num_row_groups()
        );

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            schema,
            row_count,
        })
    }

    fn convert_row(
        &self,
        number: usize,
        item: std::result::Result<parquet::record::Row, parquet::errors::ParquetError>,
    ) -> Result<Row> {
        item.map(|row| {
            let values = row
                .get_column_iter()
                .map(|(_, field)| field_to_value(field))
                .collect();
            Row::new(number, values)
        })
        .map_err(|e| InspectError::row_parse(&self.path, number, e.to_string()))
    }
}

impl TabularSource for ParquetSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Typed
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn row_count(&self) -> usize {
        self.row_count
    }

    fn scan(&self, start: usize, end: usize, visit: &mut RowVisitor<'_>) -> Result<()> {
        let (start, end) = clamp_range(start, end, self.row_count);
        if start == end {
            return Ok(());
        }

        let metadata = self.reader.metadata();
        let mut group_start = 0usize;
        for group_index in 0..metadata.num_row_groups() {
            let group_rows = metadata.row_group(group_index).num_rows().max(0) as usize;
            let group_end = group_start + group_rows;
            if group_end <= start {
                group_start = group_end;
                continue;
            }
            if group_start >= end {
                break;
            }

            let group = self
                .reader
                .get_row_group(group_index)
                .map_err(|e| InspectError::unreadable(&self.path, e.to_string()))?;
            let rows = group
                .get_row_iter(None)
                .map_err(|e| InspectError::unreadable(&self.path, e.to_string()))?;

            let skip = start.saturating_sub(group_start);
            let take = end.min(group_end) - (group_start + skip);
            for (offset, item) in rows.skip(skip).take(take).enumerate() {
                let number = group_start + skip + offset + 1;
                visit(self.convert_row(number, item))?;
            }
            group_start = group_end;
        }
        Ok(())
    }

    fn stream(&self) -> Result<RowStream<'_>> {
        let rows = self
            .reader
            .get_row_iter(None)
            .map_err(|e| InspectError::unreadable(&self.path, e.to_string()))?;
        Ok(Box::new(
            rows.take(self.row_count)
                .enumerate()
                .map(move |(index, item)| self.convert_row(index + 1, item)),
        ))
    }
}


fn schema_from_parquet(root: &Type) -> Schema {
    Schema::new(
        root.get_fields()
            .iter()
            .map(|field| Column::new(field.name(), column_type(field)))
            .collect(),
    )
}

fn column_type(field: &Type) -> ColumnType {
    if !field.is_primitive() {
        return ColumnType::Unknown;
    }
    let info = field.get_basic_info();
    let logical = info.logical_type();
    let converted = info.converted_type();

    let temporal = matches!(
        logical,
        Some(LogicalType::Date) | Some(LogicalType::Time { .. }) | Some(LogicalType::Timestamp { .. })
    ) || matches!(
        converted,
        ConvertedType::DATE
            | ConvertedType::TIME_MILLIS
            | ConvertedType::TIME_MICROS
            | ConvertedType::TIMESTAMP_MILLIS
            | ConvertedType::TIMESTAMP_MICROS
    );
    let decimal =
        matches!(logical, Some(LogicalType::Decimal { .. })) || converted == ConvertedType::DECIMAL;

    match field.get_physical_type() {
        PhysicalType::BOOLEAN => ColumnType::Boolean,
        PhysicalType::INT32 | PhysicalType::INT64 => {
            if temporal {
                ColumnType::Temporal
            } else if decimal {
                ColumnType::Float
            } else {
                ColumnType::Integer
            }
        }
        PhysicalType::INT96 => ColumnType::Temporal,
        PhysicalType::FLOAT | PhysicalType::DOUBLE => ColumnType::Float,
        PhysicalType::BYTE_ARRAY | PhysicalType::FIXED_LEN_BYTE_ARRAY => {
            let textual = matches!(
                logical,
                Some(LogicalType::String) | Some(LogicalType::Enum) | Some(LogicalType::Json)
            ) || matches!(
                converted,
                ConvertedType::UTF8 | ConvertedType::ENUM | ConvertedType::JSON
            );
            if textual {
                ColumnType::String
            } else if decimal {
                ColumnType::Float
            } else {
                ColumnType::Unknown
            }
        }
    }
}

/// Convert a decoded Parquet cell into a tagged value
pub fn field_to_value(field: &Field) -> Value {
    match field {
        Field::Null => Value::Null,
        Field::Bool(b) => Value::Boolean(*b),
        Field::Byte(v) => Value::Integer(*v as i64),
        Field::Short(v) => Value::Integer(*v as i64),
        Field::Int(v) => Value::Integer(*v as i64),
        Field::Long(v) => Value::Integer(*v),
        Field::UByte(v) => Value::Integer(*v as i64),
        Field::UShort(v) => Value::Integer(*v as i64),
        Field::UInt(v) => Value::Integer(*v as i64),
        Field::ULong(v) => i64::try_from(*v)
            .map(Value::Integer)
            .unwrap_or(Value::Float(*v as f64)),
        Field::Float(v) => Value::Float(*v as f64),
        Field::Double(v) => Value::Float(*v),
        Field::Str(s) => Value::Text(s.clone()),
        Field::Date(days) => days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map(|d| Value::Temporal(Temporal::Date(d)))
            .unwrap_or(Value::Integer(*days as i64)),
        Field::TimestampMillis(ms) => timestamp_value(*ms, 1_000),
        Field::TimestampMicros(us) => timestamp_value(*us, 1_000_000),
        Field::Decimal(_) => {
            let rendered = field.to_string();
            rendered
                .parse::<f64>()
                .map(Value::Float)
                .unwrap_or(Value::Text(rendered))
        }
        other => Value::Text(other.to_string()),
    }
}

fn timestamp_value(ticks: i64, per_second: i64) -> Value {
    let secs = ticks.div_euclid(per_second);
    let nanos = (ticks.rem_euclid(per_second) * (1_000_000_000 / per_second)) as u32;
    DateTime::<Utc>::from_timestamp(secs, nanos)
        .map(|dt| Value::Temporal(Temporal::DateTime(dt.naive_utc())))
        .unwrap_or(Value::Integer(ticks))
}
