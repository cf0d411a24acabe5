pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid argument: {message}")]
	InvalidArgument { message: String },
	#[error("Embedding service unavailable: {message}")]
	EmbeddingUnavailable { message: String },
	#[error("Embedding dimension mismatch: expected {expected}, got {actual}.")]
	DimensionMismatch { expected: usize, actual: usize },
	#[error("Catalog error: {message}")]
	Catalog { message: String },
}
impl From<scout_domain::Error> for Error {
	fn from(err: scout_domain::Error) -> Self {
		match err {
			scout_domain::Error::DimensionMismatch { left, right } =>
				Self::DimensionMismatch { expected: left, actual: right },
		}
	}
}

impl From<scout_catalog::Error> for Error {
	fn from(err: scout_catalog::Error) -> Self {
		Self::Catalog { message: err.to_string() }
	}
}
