pub mod embeddings;
pub mod factory;

pub use embeddings::{EmbeddingError, EmbeddingGenerator, EmbeddingModel};
pub use factory::{EmbeddingProviderFactory, ModelLoader};
