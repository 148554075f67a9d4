use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<diesel::result::Error> for MarketDataError {
    fn from(err: diesel::result::Error) -> Self {
        MarketDataError::DatabaseError(err.to_string())
    }
}
