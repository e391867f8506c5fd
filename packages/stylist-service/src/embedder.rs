use std::time::Duration;

use crate::{Context, Error, Result, bounded};

/// Embeds one text as an L2-normalized vector of the configured dimension.
///
/// Blank text yields the zero vector without calling the provider.
pub async fn embed_text(ctx: &Context, text: &str) -> Result<Vec<f32>> {
	let cfg = &ctx.cfg.providers.embedding;
	let dim = ctx.cfg.storage.qdrant.vector_dim as usize;

	if text.trim().is_empty() {
		return Ok(vec![0.0; dim]);
	}

	let texts = [text.to_string()];
	let mut vectors = bounded(
		"embedding",
		Duration::from_millis(cfg.timeout_ms),
		ctx.providers.embedding.embed(cfg, &texts),
	)
	.await?;

	if vectors.len() != 1 {
		return Err(Error::Provider {
			message: format!("Embedding provider returned {} vectors for one input.", vectors.len()),
		});
	}

	let mut vector = vectors.swap_remove(0);

	if vector.len() != dim {
		return Err(Error::Provider {
			message: format!(
				"Embedding vector dimension mismatch: expected {dim}, got {}.",
				vector.len()
			),
		});
	}

	l2_normalize(&mut vector);

	Ok(vector)
}

fn l2_normalize(vector: &mut [f32]) {
	let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();

	if norm > f32::EPSILON {
		vector.iter_mut().for_each(|value| *value /= norm);
	}
}
