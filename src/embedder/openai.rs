/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint.
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Embedder;
use crate::config::OpenAiConfig;
use crate::error::{RagError, Result};
use crate::http;

pub struct OpenAiEmbedder {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    dimensions: usize,
    batch_size: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(cfg: &OpenAiConfig) -> Result<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| RagError::config("OPENAI_API_KEY is not set"))?;

        Ok(Self {
            client: http::build_client(cfg.timeout())?,
            url: http::endpoint(&cfg.base_url, "embeddings"),
            api_key,
            model: cfg.embedding_model.clone(),
            dimensions: cfg.embedding_dimensions,
            batch_size: cfg.embedding_batch_size.max(1),
        })
    }

    fn embed_request(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };
        let resp: EmbeddingResponse =
            http::post_json(&self.client, &self.url, &self.api_key, "embeddings", &body)?;
        order_embeddings(resp, texts.len(), self.dimensions)
    }
}

/// Reorder response rows by `index` and check count and width.
fn order_embeddings(
    resp: EmbeddingResponse,
    expected: usize,
    dimensions: usize,
) -> Result<Vec<Vec<f32>>> {
    if resp.data.len() != expected {
        return Err(RagError::service(format!(
            "embeddings returned {} vectors for {expected} inputs",
            resp.data.len()
        )));
    }

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for row in resp.data {
        if row.embedding.len() != dimensions {
            return Err(RagError::service(format!(
                "embedding has {} dimensions, expected {dimensions}",
                row.embedding.len()
            )));
        }
        let slot = slots
            .get_mut(row.index)
            .filter(|s| s.is_none())
            .ok_or_else(|| {
                RagError::service(format!("embeddings returned invalid index {}", row.index))
            })?;
        *slot = Some(row.embedding);
    }

    Ok(slots.into_iter().flatten().collect())
}

impl Embedder for OpenAiEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            debug!("Embedding batch of {} texts with {}", batch.len(), self.model);
            vectors.extend(self.embed_request(batch)?);
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
