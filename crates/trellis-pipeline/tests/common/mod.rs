use trellis_schema::{ColumnType, EntitySchema, RealColumn, SchemaRegistry, VirtualColumn};

/// Shared fixture entities:
///
/// - `User { id, name, teamId }` — plain row, no relations.
/// - `Account { id, ownerId, owner → User, settings { contactId,
///   contact → User } }` — joins at the root and inside an embedded
///   object.
/// - `Feed { id, notifications: [Notification { userId, message,
///   user → User }] }` — a join nested inside an embedded array.
/// - `Team { id, name, members ⇒ [User] }` — a many join kept as an
///   array.
pub fn registry() -> SchemaRegistry {
    SchemaRegistry::builder()
        .entity(
            EntitySchema::new("User")
                .collection("users")
                .column(RealColumn::new("id", [ColumnType::Identifier]).store_as("_id"))
                .column(RealColumn::new("name", [ColumnType::String]))
                .column(RealColumn::new("teamId", [ColumnType::Identifier]))
                .primary("id"),
        )
        .entity(
            EntitySchema::new("Account")
                .collection("accounts")
                .column(RealColumn::new("id", [ColumnType::Identifier]).store_as("_id"))
                .column(RealColumn::new("ownerId", [ColumnType::Identifier]))
                .column(VirtualColumn::new("owner", "ownerId", "User", "id"))
                .column(RealColumn::new("settings", [ColumnType::Object]).entity("AccountSettings"))
                .primary("id"),
        )
        .entity(
            EntitySchema::new("AccountSettings")
                .column(RealColumn::new("contactId", [ColumnType::Identifier]))
                .column(VirtualColumn::new("contact", "contactId", "User", "id")),
        )
        .entity(
            EntitySchema::new("Feed")
                .collection("feeds")
                .column(RealColumn::new("id", [ColumnType::Identifier]).store_as("_id"))
                .column(
                    RealColumn::new("notifications", [ColumnType::Array]).entity("Notification"),
                )
                .primary("id"),
        )
        .entity(
            EntitySchema::new("Notification")
                .column(RealColumn::new("userId", [ColumnType::Identifier]))
                .column(RealColumn::new("message", [ColumnType::String]))
                .column(VirtualColumn::new("user", "userId", "User", "id")),
        )
        .entity(
            EntitySchema::new("Team")
                .collection("teams")
                .column(RealColumn::new("id", [ColumnType::Identifier]).store_as("_id"))
                .column(RealColumn::new("name", [ColumnType::String]))
                .column(
                    VirtualColumn::new("members", "id", "User", "teamId")
                        .many()
                        .all(),
                )
                .primary("id"),
        )
        .build()
}

pub fn fields(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| p.to_string()).collect()
}
