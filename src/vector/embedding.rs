//! Query embedding generation.
//!
//! The corpus embeddings arrive precomputed from the embedding store; this
//! module only turns a search query into a vector. `FastEmbedGenerator`
//! runs a local fastembed model; tests use `MockEmbeddingGenerator`.

use crate::vector::math::normalize_vector;
use crate::vector::{VectorDimension, VectorError};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::Path;
use std::sync::Mutex;

/// Maximum length of a text accepted for embedding, in characters.
pub const MAX_EMBED_TEXT_CHARS: usize = 8000;

/// Trait for generating embeddings from text.
///
/// Implementations must be thread-safe; the service calls them from the
/// blocking thread pool.
pub trait EmbeddingGenerator: Send + Sync {
    /// Generate embeddings for multiple texts.
    ///
    /// # Arguments
    /// * `texts` - Slice of text strings to generate embeddings for
    ///
    /// # Returns
    /// A vector of embeddings, one for each input text, or an error
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError>;

    /// Get the dimension of embeddings produced by this generator.
    #[must_use]
    fn dimension(&self) -> VectorDimension;
}

/// Embeds a single text, enforcing the 1..=8000 character bound.
pub fn embed_one(generator: &dyn EmbeddingGenerator, text: &str) -> Result<Vec<f32>, VectorError> {
    let chars = text.chars().count();
    if chars == 0 || chars > MAX_EMBED_TEXT_CHARS {
        return Err(VectorError::EmbeddingFailed(format!(
            "text length {chars} outside 1..={MAX_EMBED_TEXT_CHARS} characters"
        )));
    }

    generator
        .generate_embeddings(&[text])?
        .into_iter()
        .next()
        .ok_or_else(|| VectorError::EmbeddingFailed("model returned no embedding".to_string()))
}

/// FastEmbed implementation of [`EmbeddingGenerator`].
pub struct FastEmbedGenerator {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimension: VectorDimension,
}

impl std::fmt::Debug for FastEmbedGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedGenerator")
            .field("model", &self.model_name)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl FastEmbedGenerator {
    /// Create a generator for the named model, caching weights in `cache_dir`.
    ///
    /// # Errors
    /// Returns an error if the model name is unknown or the model fails to
    /// initialize or download.
    pub fn new(model_name: &str, cache_dir: &Path, show_progress: bool) -> Result<Self, VectorError> {
        let model = parse_embedding_model(model_name)?;
        let mut text_model = TextEmbedding::try_new(
            InitOptions::new(model)
                .with_cache_dir(cache_dir.to_path_buf())
                .with_show_download_progress(show_progress),
        )
        .map_err(|e| VectorError::EmbeddingFailed(
            format!("Failed to initialize embedding model: {e}. Ensure you have internet connection for first-time model download")
        ))?;

        // Probe the output width once instead of keeping a per-model table
        let probe = text_model
            .embed(vec!["probe"], None)
            .map_err(|e| VectorError::EmbeddingFailed(format!("Failed to probe model: {e}")))?;
        let width = probe.first().map(Vec::len).unwrap_or_default();

        Ok(Self {
            model: Mutex::new(text_model),
            model_name: model_name.to_string(),
            dimension: VectorDimension::new(width)?,
        })
    }
}

impl EmbeddingGenerator for FastEmbedGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let text_strings: Vec<String> = texts.iter().map(|&s| s.to_string()).collect();

        let embeddings = self
            .model
            .lock()
            .map_err(|_| {
                VectorError::EmbeddingFailed(
                    "Failed to acquire embedding model lock - model may be poisoned".to_string(),
                )
            })?
            .embed(text_strings, None)
            .map_err(|e| {
                VectorError::EmbeddingFailed(format!("Failed to generate embeddings: {e}"))
            })?;

        for embedding in embeddings.iter() {
            self.dimension.validate_vector(embedding)?;
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}

/// Parse a model name from settings into a fastembed model.
pub fn parse_embedding_model(name: &str) -> Result<EmbeddingModel, VectorError> {
    match name {
        "AllMiniLML6V2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "AllMiniLML12V2" => Ok(EmbeddingModel::AllMiniLML12V2),
        "BGESmallENV15" => Ok(EmbeddingModel::BGESmallENV15),
        "BGEBaseENV15" => Ok(EmbeddingModel::BGEBaseENV15),
        "BGELargeENV15" => Ok(EmbeddingModel::BGELargeENV15),
        "MultilingualE5Small" => Ok(EmbeddingModel::MultilingualE5Small),
        "MultilingualE5Base" => Ok(EmbeddingModel::MultilingualE5Base),
        "MultilingualE5Large" => Ok(EmbeddingModel::MultilingualE5Large),
        other => Err(VectorError::EmbeddingFailed(format!(
            "Unknown embedding model '{other}'. Supported: AllMiniLML6V2, AllMiniLML12V2, BGESmallENV15, BGEBaseENV15, BGELargeENV15, MultilingualE5Small, MultilingualE5Base, MultilingualE5Large"
        ))),
    }
}

/// Mock embedding generator for testing.
///
/// Generates deterministic embeddings from keywords in the text so tests
/// can line queries up with hand-built corpus vectors.
#[cfg(test)]
pub struct MockEmbeddingGenerator {
    dimension: VectorDimension,
    fail: bool,
}

#[cfg(test)]
impl MockEmbeddingGenerator {
    #[must_use]
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: VectorDimension::new(dimension).unwrap(),
            fail: false,
        }
    }

    /// A generator whose every call fails.
    #[must_use]
    pub fn failing(dimension: usize) -> Self {
        Self {
            dimension: VectorDimension::new(dimension).unwrap(),
            fail: true,
        }
    }
}

#[cfg(test)]
impl EmbeddingGenerator for MockEmbeddingGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        if self.fail {
            return Err(VectorError::EmbeddingFailed("mock outage".to_string()));
        }

        let dim = self.dimension.get();
        let mut embeddings = Vec::new();

        for text in texts {
            let lower = text.to_lowercase();
            let mut embedding = vec![0.0; dim];

            if lower.contains("graph") && dim > 0 {
                embedding[0] = 1.0;
            }
            if lower.contains("protein") && dim > 1 {
                embedding[1] = 1.0;
            }
            if lower.contains("climate") && dim > 2 {
                embedding[2] = 1.0;
            }
            if embedding.iter().all(|v| *v == 0.0) {
                embedding[dim - 1] = 1.0;
            }

            normalize_vector(&mut embedding);
            embeddings.push(embedding);
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_embedding_generator() {
        let generator = MockEmbeddingGenerator::with_dimension(4);
        let embeddings = generator
            .generate_embeddings(&["graph neural networks", "protein folding"])
            .unwrap();

        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0], vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(embeddings[1], vec![0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_embed_one_enforces_length() {
        let generator = MockEmbeddingGenerator::with_dimension(4);
        assert!(embed_one(&generator, "").is_err());
        assert!(embed_one(&generator, &"x".repeat(MAX_EMBED_TEXT_CHARS + 1)).is_err());
        assert_eq!(embed_one(&generator, "climate").unwrap().len(), 4);
    }

    #[test]
    fn test_parse_embedding_model() {
        assert!(parse_embedding_model("AllMiniLML6V2").is_ok());
        assert!(parse_embedding_model("MultilingualE5Small").is_ok());
        assert!(parse_embedding_model("gpt-embed-9000").is_err());
    }
}
