pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Lookup {operation} failed: {source}")]
    LookupFailed {
        operation: &'static str,
        #[source]
        source: Box<Error>,
    },
}
