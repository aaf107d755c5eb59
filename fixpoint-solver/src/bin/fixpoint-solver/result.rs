use thiserror::Error;

pub(crate) type FixpointResult<T> = Result<T, FixpointError>;

#[derive(Error, Debug)]
pub(crate) enum FixpointError {
    #[error("IO error, more details: {0}")]
    IOError(#[from] std::io::Error),
    #[error("The {model} model needs a size of at least {minimum}, got {size}.")]
    InvalidSize {
        model: String,
        minimum: u32,
        size: u32,
    },
}
