use crate::{Error, Result};

/// Cosine similarity between two vectors of equal dimensionality.
///
/// Accumulates in f64 and clamps the result into [-1, 1] so float noise never
/// pushes a self-similarity above 1. A zero vector on either side scores 0.0
/// rather than dividing by a zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
	if a.len() != b.len() {
		return Err(Error::DimensionMismatch { left: a.len(), right: b.len() });
	}

	let mut dot = 0.0_f64;
	let mut norm_a = 0.0_f64;
	let mut norm_b = 0.0_f64;

	for (x, y) in a.iter().zip(b.iter()) {
		let x = f64::from(*x);
		let y = f64::from(*y);

		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	if norm_a == 0.0 || norm_b == 0.0 {
		return Ok(0.0);
	}

	Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0) as f32)
}
