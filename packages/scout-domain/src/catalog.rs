use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One catalog record. Owned by the catalog store; the research pipeline only
/// reads it.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CatalogItem {
	pub id: String,
	pub name: String,
	pub category: String,
	pub tier: String,
	pub price: f64,
	/// Free-form specification bag. A BTreeMap keeps `search_text` derivation
	/// independent of insertion order.
	#[serde(default)]
	pub spec: BTreeMap<String, String>,
}
impl CatalogItem {
	/// The text embedded for this item. Deterministic: same record, same text.
	pub fn search_text(&self) -> String {
		let mut out = String::with_capacity(64);

		out.push_str(&self.name);
		out.push(' ');
		out.push_str(&self.category);
		out.push(' ');
		out.push_str(&self.tier);
		out.push_str(" price ");
		out.push_str(&self.price.to_string());

		for (key, value) in &self.spec {
			out.push(' ');
			out.push_str(key);
			out.push(' ');
			out.push_str(value);
		}

		out
	}
}

/// Structural predicates applied to the candidate set before any scoring.
/// An absent field places no constraint.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RetrievalFilter {
	#[serde(default)]
	pub category: Option<String>,
	#[serde(default)]
	pub tier: Option<String>,
	#[serde(default)]
	pub min_price: Option<f64>,
	#[serde(default)]
	pub max_price: Option<f64>,
}
impl RetrievalFilter {
	/// Category and tier match case-insensitively; price bounds are inclusive.
	pub fn matches(&self, item: &CatalogItem) -> bool {
		if let Some(category) = self.category.as_deref()
			&& !category.eq_ignore_ascii_case(&item.category)
		{
			return false;
		}
		if let Some(tier) = self.tier.as_deref()
			&& !tier.eq_ignore_ascii_case(&item.tier)
		{
			return false;
		}
		if let Some(min_price) = self.min_price
			&& item.price < min_price
		{
			return false;
		}
		if let Some(max_price) = self.max_price
			&& item.price > max_price
		{
			return false;
		}

		true
	}
}
