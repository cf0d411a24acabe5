mod catalog;
mod similarity;

pub use catalog::{CatalogItem, RetrievalFilter};
pub use similarity::cosine_similarity;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Vector dimensions do not match: {left} vs {right}.")]
	DimensionMismatch { left: usize, right: usize },
}
