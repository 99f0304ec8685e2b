//! Scalar normalization for filter operands and stored values.

use bson::Bson;
use bson::oid::ObjectId;
use trellis_query::MatchOp;
use trellis_schema::{ColumnType, RealColumn};

use crate::error::PipelineError;

/// Normalize one scalar against its column declaration.
///
/// Identifier-tagged columns turn well-formed hex strings into native
/// ObjectIds; Date/Timestamp-tagged columns turn RFC 3339 strings into
/// native datetimes. Everything else passes through unchanged.
pub fn cast(value: Bson, column: &RealColumn) -> Bson {
    if column.has_type(ColumnType::Identifier)
        && let Bson::String(s) = &value
        && let Ok(oid) = ObjectId::parse_str(s)
    {
        return Bson::ObjectId(oid);
    }

    if (column.has_type(ColumnType::Date) || column.has_type(ColumnType::Timestamp))
        && let Bson::String(s) = &value
        && let Ok(dt) = bson::DateTime::parse_rfc3339_str(s)
    {
        return Bson::DateTime(dt);
    }

    value
}

/// Cast every element of an array operand. Used for the set and range
/// operators, whose operands must be ordered sequences.
pub fn cast_many(
    value: Bson,
    column: &RealColumn,
    op: MatchOp,
) -> Result<Vec<Bson>, PipelineError> {
    match value {
        Bson::Array(items) => Ok(items.into_iter().map(|v| cast(v, column)).collect()),
        other => Err(PipelineError::TypeMismatch {
            op,
            got: format!("{:?}", other.element_type()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_column() -> RealColumn {
        RealColumn::new("id", [ColumnType::Identifier])
    }

    fn date_column() -> RealColumn {
        RealColumn::new("created", [ColumnType::Date])
    }

    #[test]
    fn identifier_string_becomes_object_id() {
        let cast = cast(
            Bson::String("507f1f77bcf86cd799439011".into()),
            &id_column(),
        );
        assert!(matches!(cast, Bson::ObjectId(_)));
    }

    #[test]
    fn malformed_identifier_passes_through() {
        let value = Bson::String("not-an-oid".into());
        assert_eq!(cast(value.clone(), &id_column()), value);
    }

    #[test]
    fn date_string_becomes_datetime() {
        let cast = cast(
            Bson::String("2024-05-01T12:00:00Z".into()),
            &date_column(),
        );
        assert!(matches!(cast, Bson::DateTime(_)));
    }

    #[test]
    fn untagged_column_is_untouched() {
        let column = RealColumn::new("name", [ColumnType::String]);
        let value = Bson::String("507f1f77bcf86cd799439011".into());
        assert_eq!(cast(value.clone(), &column), value);
    }

    #[test]
    fn cast_many_maps_elements() {
        let values = cast_many(
            Bson::Array(vec![
                Bson::String("507f1f77bcf86cd799439011".into()),
                Bson::String("507f191e810c19729de860ea".into()),
            ]),
            &id_column(),
            MatchOp::Contain,
        )
        .unwrap();
        assert!(values.iter().all(|v| matches!(v, Bson::ObjectId(_))));
    }

    #[test]
    fn cast_many_rejects_scalars() {
        let err = cast_many(Bson::Int32(3), &id_column(), MatchOp::Contain).unwrap_err();
        assert!(matches!(err, PipelineError::TypeMismatch { .. }));
    }
}
