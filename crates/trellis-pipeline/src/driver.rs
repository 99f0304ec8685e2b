use bson::Document;

/// Store collaborator that executes a compiled pipeline.
///
/// The compiler never touches I/O; the driver owns connection, session and
/// retry policy. The session context is passed through opaquely.
pub trait Driver {
    type Session;
    type Error: std::error::Error + Send + Sync + 'static;
    type Cursor: Iterator<Item = Result<Document, Self::Error>>;

    fn run_pipeline(
        &self,
        collection: &str,
        stages: Vec<Document>,
        session: &mut Self::Session,
    ) -> Result<Self::Cursor, Self::Error>;
}
