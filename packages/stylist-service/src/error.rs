pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Qdrant error: {message}")]
	Qdrant { message: String },
	#[error("Timed out: {operation}")]
	Timeout { operation: String },
}
impl From<stylist_providers::Error> for Error {
	fn from(err: stylist_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<stylist_storage::Error> for Error {
	fn from(err: stylist_storage::Error) -> Self {
		match err {
			stylist_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			stylist_storage::Error::SerdeJson(inner) => Self::Storage { message: inner.to_string() },
			stylist_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			stylist_storage::Error::Qdrant(inner) => Self::Qdrant { message: inner.to_string() },
		}
	}
}
