use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid query parameters: {0}")]
    InvalidQuery(String),

    #[error("not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for sf_domain::CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidQuery(msg) => sf_domain::CoreError::Validation(msg),
            StoreError::NotFound => sf_domain::CoreError::Validation("not found".into()),
            StoreError::Database(e) => sf_domain::CoreError::Transient(e.to_string()),
        }
    }
}
