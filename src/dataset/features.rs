//! Arrow schema to `datasets` feature descriptions (`dataset_info.json`).

use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use serde_json::{json, Map, Value};

/// Feature map for a whole schema, keyed by column name in schema order.
pub fn schema_features(schema: &Schema) -> Value {
    let mut features = Map::with_capacity(schema.fields().len());
    for field in schema.fields() {
        features.insert(field.name().clone(), field_feature(field.data_type()));
    }
    Value::Object(features)
}

fn field_feature(data_type: &DataType) -> Value {
    match data_type {
        DataType::Struct(fields) => {
            let mut nested = Map::with_capacity(fields.len());
            for field in fields {
                nested.insert(field.name().clone(), field_feature(field.data_type()));
            }
            Value::Object(nested)
        }
        DataType::List(item) | DataType::LargeList(item) => list_feature(item, None),
        DataType::FixedSizeList(item, len) => list_feature(item, Some(*len)),
        other => json!({ "dtype": value_dtype(other), "_type": "Value" }),
    }
}

fn list_feature(item: &Field, length: Option<i32>) -> Value {
    let inner = field_feature(item.data_type());
    let type_name = if matches!(item.data_type(), DataType::Struct(_)) {
        "List"
    } else {
        "Sequence"
    };
    let mut feature = Map::new();
    feature.insert("feature".to_string(), inner);
    if let Some(length) = length {
        feature.insert("length".to_string(), Value::from(length));
    }
    feature.insert("_type".to_string(), Value::from(type_name));
    Value::Object(feature)
}

/// `datasets` dtype name for a scalar Arrow type.
pub fn value_dtype(data_type: &DataType) -> String {
    match data_type {
        DataType::Null => "null".to_string(),
        DataType::Boolean => "bool".to_string(),
        DataType::Int8 => "int8".to_string(),
        DataType::Int16 => "int16".to_string(),
        DataType::Int32 => "int32".to_string(),
        DataType::Int64 => "int64".to_string(),
        DataType::UInt8 => "uint8".to_string(),
        DataType::UInt16 => "uint16".to_string(),
        DataType::UInt32 => "uint32".to_string(),
        DataType::UInt64 => "uint64".to_string(),
        DataType::Float16 => "float16".to_string(),
        DataType::Float32 => "float32".to_string(),
        DataType::Float64 => "float64".to_string(),
        DataType::Utf8 | DataType::Utf8View => "string".to_string(),
        DataType::LargeUtf8 => "large_string".to_string(),
        DataType::Binary | DataType::BinaryView | DataType::FixedSizeBinary(_) => {
            "binary".to_string()
        }
        DataType::LargeBinary => "large_binary".to_string(),
        DataType::Date32 => "date32".to_string(),
        DataType::Date64 => "date64".to_string(),
        DataType::Timestamp(unit, tz) => {
            let unit = time_unit(unit);
            match tz {
                Some(tz) => format!("timestamp[{unit}, tz={tz}]"),
                None => format!("timestamp[{unit}]"),
            }
        }
        DataType::Time32(unit) => format!("time32[{}]", time_unit(unit)),
        DataType::Time64(unit) => format!("time64[{}]", time_unit(unit)),
        DataType::Duration(unit) => format!("duration[{}]", time_unit(unit)),
        DataType::Decimal128(precision, scale) | DataType::Decimal256(precision, scale) => {
            format!("decimal({precision}, {scale})")
        }
        other => other.to_string().to_ascii_lowercase(),
    }
}

fn time_unit(unit: &TimeUnit) -> &'static str {
    match unit {
        TimeUnit::Second => "s",
        TimeUnit::Millisecond => "ms",
        TimeUnit::Microsecond => "us",
        TimeUnit::Nanosecond => "ns",
    }
}
