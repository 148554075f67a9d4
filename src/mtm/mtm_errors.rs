use thiserror::Error;

#[derive(Error, Debug)]
pub enum MtmError {
    #[error("Unknown lock selector '{0}' (expected cbot|premium|fx or locked|open)")]
    InvalidLockSelector(String),
}
