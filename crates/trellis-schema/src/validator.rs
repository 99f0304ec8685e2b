use bson::{Bson, Document, doc};

use crate::column::{Column, ColumnType, RealColumn};
use crate::error::SchemaError;
use crate::registry::SchemaRegistry;

impl SchemaRegistry {
    /// Transcribe an entity's column metadata into a `$jsonSchema`
    /// validator document for collection creation.
    ///
    /// One pass over the declared real columns; virtual columns are not
    /// stored and do not appear. Nested entities recurse.
    pub fn validator(&self, entity: &str) -> Result<Document, SchemaError> {
        Ok(doc! { "$jsonSchema": self.object_schema(entity)? })
    }

    fn object_schema(&self, entity: &str) -> Result<Document, SchemaError> {
        let schema = self.entity(entity)?;
        let mut properties = Document::new();
        let mut required: Vec<String> = Vec::new();

        for column in &schema.columns {
            let Column::Real(real) = column else { continue };
            properties.insert(real.storage_name(), self.column_schema(entity, real)?);
            if real.required {
                required.push(real.storage_name().to_string());
            }
        }

        let mut out = doc! { "bsonType": "object" };
        if !required.is_empty() {
            out.insert("required", required);
        }
        out.insert("properties", properties);
        Ok(out)
    }

    fn column_schema(&self, entity: &str, column: &RealColumn) -> Result<Document, SchemaError> {
        if column.types.is_empty() {
            return Err(SchemaError::UnsupportedType {
                entity: entity.to_string(),
                column: column.name.clone(),
            });
        }

        let mut out = Document::new();
        let types: Vec<&str> = column.types.iter().map(|t| bson_type(*t)).collect();
        if types.len() == 1 {
            out.insert("bsonType", types[0]);
        } else {
            out.insert("bsonType", types);
        }

        if column.has_type(ColumnType::Enumeration) && !column.values.is_empty() {
            out.insert("enum", Bson::Array(column.values.clone()));
        }
        if let Some(pattern) = &column.pattern {
            out.insert("pattern", pattern.as_str());
        }
        if let Some(minimum) = column.minimum {
            out.insert("minimum", minimum);
        }
        if let Some(maximum) = column.maximum {
            out.insert("maximum", maximum);
        }
        if let Some(min_length) = column.min_length {
            out.insert("minLength", min_length as i64);
        }
        if let Some(max_length) = column.max_length {
            out.insert("maxLength", max_length as i64);
        }

        if let Some(nested) = column.nested_entity() {
            if column.is_array() {
                out.insert("items", self.object_schema(nested)?);
            } else {
                // Inline the nested object's constraints.
                let nested_schema = self.object_schema(nested)?;
                for (key, value) in nested_schema {
                    if key != "bsonType" {
                        out.insert(key, value);
                    }
                }
            }
        }

        Ok(out)
    }
}

fn bson_type(t: ColumnType) -> &'static str {
    match t {
        ColumnType::Identifier => "objectId",
        ColumnType::Null => "null",
        ColumnType::Binary => "binData",
        ColumnType::Boolean => "bool",
        ColumnType::Integer => "long",
        ColumnType::Decimal => "decimal",
        ColumnType::Number => "double",
        ColumnType::String | ColumnType::Enumeration | ColumnType::Pattern => "string",
        ColumnType::Timestamp => "timestamp",
        ColumnType::Date => "date",
        ColumnType::Array => "array",
        ColumnType::Map | ColumnType::Object => "object",
    }
}
