use thiserror::Error;

pub type PlResult<T> = Result<T, PlError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlError {
    #[error("Value '{value}' is not numeric")]
    NonNumeric { value: String },
}
