use std::hash::{Hash, Hasher};

use anyhow::Result;
use twox_hash::XxHash64;

use ragdb_core::traits::Embedder;

/// Deterministic bag-of-tokens embedder for tests and development.
///
/// Each lowercased token is hashed into one of `dim` buckets; the vector is
/// L2-normalised. Texts sharing no tokens are orthogonal, so cosine distance
/// between them is exactly 1.0.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in tokens(text) {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let idx = (hasher.finish() % self.dim as u64) as usize;
            v[idx] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_and_case_do_not_change_tokens() {
        let e = HashEmbedder::new(64);
        assert_eq!(e.embed_text("Objectives:"), e.embed_text("objectives"));
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let e = HashEmbedder::new(16);
        assert!(e.embed_text("  ").iter().all(|x| *x == 0.0));
    }
}
