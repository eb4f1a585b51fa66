//! Embedding seam for chunk records.
//!
//! Real deployments plug a remote model in behind [`Embedder`]. The bundled
//! [`LocalHashEmbedder`] hashes word and bigram features into a fixed-size,
//! L2-normalized vector so the pipeline runs offline and deterministically.

use std::thread;
use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::error::EmbedError;

pub const DEFAULT_MODEL_ID: &str = "local-hash-v1";
pub const DEFAULT_EMBEDDING_DIM: usize = 768;

pub trait Embedder {
    fn model_id(&self) -> &str;

    fn dimensions(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;
}

#[derive(Debug, Clone)]
pub struct LocalHashEmbedder {
    model_id: String,
    dimensions: usize,
}

impl LocalHashEmbedder {
    pub fn new(model_id: &str, dimensions: usize) -> Self {
        let trimmed = model_id.trim();
        Self {
            model_id: if trimmed.is_empty() {
                DEFAULT_MODEL_ID.to_string()
            } else {
                trimmed.to_string()
            },
            dimensions: dimensions.max(8),
        }
    }
}

impl Default for LocalHashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_ID, DEFAULT_EMBEDDING_DIM)
    }
}

impl Embedder for LocalHashEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vector = vec![0_f32; self.dimensions];

        for feature in features(text) {
            let hash = stable_hash(&feature);
            let index = (hash % self.dimensions as u64) as usize;
            let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
            let weight = 1.0 + (((hash >> 48) & 0xFF) as f32 / 255.0);
            vector[index] += sign * weight;
        }

        normalize_vector(&mut vector);
        Ok(vector)
    }
}

/// Bounded exponential backoff for transient embedding failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self, attempt: usize) -> Duration {
        let factor = 1_u32.checked_shl(attempt as u32).unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Embedded {
    pub vector: Vec<f32>,
    pub retries: usize,
}

pub fn embed_with_retry<E>(
    embedder: &E,
    text: &str,
    policy: &RetryPolicy,
) -> Result<Embedded, EmbedError>
where
    E: Embedder + ?Sized,
{
    embed_with_retry_using(embedder, text, policy, thread::sleep)
}

/// Rate-limit errors are returned at once; transient errors are retried up to
/// `max_retries` times, sleeping between attempts.
pub fn embed_with_retry_using<E, S>(
    embedder: &E,
    text: &str,
    policy: &RetryPolicy,
    mut sleep: S,
) -> Result<Embedded, EmbedError>
where
    E: Embedder + ?Sized,
    S: FnMut(Duration),
{
    let mut retries = 0usize;
    loop {
        match embedder.embed(text) {
            Ok(vector) => return Ok(Embedded { vector, retries }),
            Err(err) if err.is_retryable() && retries < policy.max_retries => {
                tracing::warn!(error = %err, retries, "retrying embedding request");
                sleep(policy.backoff(retries));
                retries += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn stable_hash(value: &str) -> u64 {
    let digest = Sha256::digest(value.as_bytes());
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

fn features(text: &str) -> Vec<String> {
    let words = text
        .split_whitespace()
        .map(|value| {
            value
                .chars()
                .filter(|character| character.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|value| !value.is_empty())
        .collect::<Vec<String>>();

    let mut features = Vec::<String>::with_capacity(words.len() * 2);
    for (index, word) in words.iter().enumerate() {
        features.push(format!("w:{word}"));
        if let Some(next) = words.get(index + 1) {
            features.push(format!("b:{word}_{next}"));
        }
    }
    features
}

fn normalize_vector(values: &mut [f32]) {
    let squared_norm = values
        .iter()
        .map(|value| f64::from(*value) * f64::from(*value))
        .sum::<f64>();

    if squared_norm <= 0.0 {
        return;
    }

    let norm = squared_norm.sqrt() as f32;
    for value in values {
        *value /= norm;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;

    #[test]
    fn local_embedding_is_deterministic_and_normalized() {
        let embedder = LocalHashEmbedder::new("", 64);
        let first = embedder.embed("Setiap pengemudi wajib").expect("local embed");
        let second = embedder.embed("Setiap pengemudi wajib").expect("local embed");

        assert_eq!(embedder.model_id(), DEFAULT_MODEL_ID);
        assert_eq!(first.len(), 64);
        assert_eq!(first, second);
        let norm = first.iter().map(|value| value * value).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn empty_text_embeds_to_zero_vector() {
        let embedder = LocalHashEmbedder::new("m", 16);
        let vector = embedder.embed(" ... ").expect("local embed");
        assert!(vector.iter().all(|value| *value == 0.0));
    }

    struct FlakyEmbedder {
        failures: Cell<usize>,
        error: EmbedError,
    }

    impl Embedder for FlakyEmbedder {
        fn model_id(&self) -> &str {
            "flaky"
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedError> {
            if self.failures.get() > 0 {
                self.failures.set(self.failures.get() - 1);
                return Err(self.error.clone());
            }
            Ok(vec![1.0, 0.0])
        }
    }

    #[test]
    fn transient_errors_are_retried_with_growing_backoff() {
        let embedder = FlakyEmbedder {
            failures: Cell::new(2),
            error: EmbedError::Transient("connection reset".to_string()),
        };
        let sleeps = RefCell::new(Vec::new());

        let embedded = embed_with_retry_using(&embedder, "x", &RetryPolicy::default(), |delay| {
            sleeps.borrow_mut().push(delay)
        })
        .expect("recovers after retries");

        assert_eq!(embedded.retries, 2);
        assert_eq!(
            sleeps.into_inner(),
            vec![Duration::from_millis(500), Duration::from_millis(1000)]
        );
    }

    #[test]
    fn transient_errors_give_up_after_max_retries() {
        let embedder = FlakyEmbedder {
            failures: Cell::new(10),
            error: EmbedError::Transient("timeout".to_string()),
        };
        let policy = RetryPolicy {
            max_retries: 2,
            ..RetryPolicy::default()
        };

        let err = embed_with_retry_using(&embedder, "x", &policy, |_| {}).expect_err("exhausted");
        assert_eq!(err, EmbedError::Transient("timeout".to_string()));
        assert_eq!(embedder.failures.get(), 7);
    }

    #[test]
    fn rate_limit_errors_are_not_retried() {
        let embedder = FlakyEmbedder {
            failures: Cell::new(1),
            error: EmbedError::RateLimited("quota exceeded".to_string()),
        };
        let mut slept = false;

        let err = embed_with_retry_using(&embedder, "x", &RetryPolicy::default(), |_| {
            slept = true
        })
        .expect_err("rate limit is fatal");

        assert!(matches!(err, EmbedError::RateLimited(_)));
        assert!(!slept);
    }

    #[test]
    fn backoff_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_millis(500));
        assert_eq!(policy.backoff(3), Duration::from_secs(4));
        assert_eq!(policy.backoff(10), Duration::from_secs(8));
        assert_eq!(policy.backoff(64), Duration::from_secs(8));
    }
}
