use polars::prelude::*;

/// Name of the timestamp index column after ingest.
pub const TIMESTAMP: &str = "timestamp";

/// Canonical OHLCV column names, in frame order after the timestamp.
pub const OHLCV: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// Source header → canonical name. Headers not listed pass through untouched.
pub const COLUMN_RENAMES: [(&str, &str); 5] = [
    ("Open", "open"),
    ("High", "high"),
    ("Low", "low"),
    ("Close", "close"),
    ("Volume", "volume"),
];

/// Expected schema for a canonical price frame
pub struct BarSchema;

impl BarSchema {
    /// Get the canonical bar schema
    pub fn schema() -> Schema {
        let mut fields = vec![Field::new(
            TIMESTAMP.into(),
            DataType::Datetime(TimeUnit::Milliseconds, None),
        )];
        fields.extend(
            OHLCV
                .iter()
                .map(|name| Field::new((*name).into(), DataType::Float64)),
        );
        Schema::from_iter(fields)
    }

    /// Validate DataFrame against schema: same columns, same order, same types.
    pub fn validate(df: &DataFrame) -> Result<(), SchemaError> {
        let expected = Self::schema();
        let actual = df.schema();

        for field in expected.iter_fields() {
            let actual_dtype = actual
                .get(field.name())
                .ok_or_else(|| SchemaError::MissingColumn(field.name().to_string()))?;
            if actual_dtype != field.dtype() {
                return Err(SchemaError::TypeMismatch {
                    column: field.name().to_string(),
                    expected: field.dtype().clone(),
                    actual: actual_dtype.clone(),
                });
            }
        }

        let expected_order: Vec<&str> = expected.iter_names().map(|n| n.as_str()).collect();
        let actual_order: Vec<&str> = actual.iter_names().map(|n| n.as_str()).collect();
        if expected_order != actual_order {
            return Err(SchemaError::ColumnOrder(actual_order.join(",")));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Type mismatch in column {column}: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },

    #[error("Unexpected column layout: {0}")]
    ColumnOrder(String),
}
