use std::{
	collections::HashSet,
	fs,
	path::{Path, PathBuf},
};

use scout_domain::{CatalogItem, RetrievalFilter};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read catalog file at {path:?}: {source}")]
	Read { path: PathBuf, source: std::io::Error },
	#[error("Failed to parse catalog file at {path:?}: {source}")]
	Parse { path: PathBuf, source: serde_json::Error },
	#[error("Duplicate catalog item id {id:?}.")]
	DuplicateId { id: String },
}

/// Read-only view of the product catalog. The research pipeline never writes
/// through this seam.
pub trait CatalogStore
where
	Self: Send + Sync,
{
	fn list_items(&self, filter: &RetrievalFilter) -> Vec<CatalogItem>;
}

/// Flat in-memory catalog. The corpus is small enough for exhaustive scans;
/// there is no index to maintain.
pub struct InMemoryCatalog {
	items: Vec<CatalogItem>,
}
impl InMemoryCatalog {
	pub fn new(items: Vec<CatalogItem>) -> Result<Self> {
		let mut seen = HashSet::with_capacity(items.len());

		for item in &items {
			if !seen.insert(item.id.as_str()) {
				return Err(Error::DuplicateId { id: item.id.clone() });
			}
		}

		Ok(Self { items })
	}

	/// Loads a JSON array of catalog items.
	pub fn from_json_file(path: &Path) -> Result<Self> {
		let raw =
			fs::read_to_string(path).map_err(|err| Error::Read {
				path: path.to_path_buf(),
				source: err,
			})?;
		let items: Vec<CatalogItem> = serde_json::from_str(&raw)
			.map_err(|err| Error::Parse { path: path.to_path_buf(), source: err })?;

		Self::new(items)
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}
impl CatalogStore for InMemoryCatalog {
	fn list_items(&self, filter: &RetrievalFilter) -> Vec<CatalogItem> {
		self.items.iter().filter(|item| filter.matches(item)).cloned().collect()
	}
}
