//! Page chunking and batched embedding.
//!
//! Chunks feed retrieval; they never affect insight generation or
//! annotation. Embedding failures therefore degrade to empty vectors
//! instead of failing the request.

use crate::document::Page;
use crate::model::Embedder;
use crate::output::ChunkRecord;
use std::sync::Arc;
use tracing::{debug, warn};

/// Approximate word budget per chunk.
const CHUNK_WORD_TARGET: usize = 600;
/// Texts per embedding call.
const EMBED_BATCH_SIZE: usize = 32;

/// A chunk before embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct RawChunk {
    pub text: String,
    pub page_number: usize,
}

/// Split pages into word-bounded chunks, preserving page numbers.
///
/// Blocks never split across chunks; a chunk closes when adding the next
/// block would exceed the word target. Chunks never span pages.
pub fn chunk_pages(pages: &[Page]) -> Vec<RawChunk> {
    let mut chunks = Vec::new();

    for page in pages {
        let mut text = String::new();
        let mut words = 0usize;

        for block in &page.blocks {
            let block_words = block.text.split_whitespace().count();
            if block_words == 0 {
                continue;
            }
            if words > 0 && words + block_words > CHUNK_WORD_TARGET {
                chunks.push(RawChunk {
                    text: std::mem::take(&mut text),
                    page_number: page.number,
                });
                words = 0;
            }
            if !text.is_empty() {
                text.push_str("\n\n");
            }
            text.push_str(&block.text);
            words += block_words;
        }

        if !text.is_empty() {
            chunks.push(RawChunk {
                text,
                page_number: page.number,
            });
        }
    }

    debug!("chunked {} pages into {} chunks", pages.len(), chunks.len());
    chunks
}

/// Embed chunks in fixed-size batches.
///
/// With no embedder configured, or when a batch fails, the affected chunks
/// carry empty vectors.
pub async fn embed_chunks(
    chunks: Vec<RawChunk>,
    embedder: Option<&Arc<dyn Embedder>>,
) -> Vec<ChunkRecord> {
    let Some(embedder) = embedder else {
        return chunks
            .into_iter()
            .map(|c| ChunkRecord {
                text: c.text,
                page_number: c.page_number,
                embedding: Vec::new(),
            })
            .collect();
    };

    let mut records = Vec::with_capacity(chunks.len());

    for batch in chunks.chunks(EMBED_BATCH_SIZE) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let embeddings = match embedder.embed(&texts).await {
            Ok(vectors) if vectors.len() == batch.len() => vectors,
            Ok(vectors) => {
                warn!(
                    "embedding batch size mismatch: sent {}, got {}; dropping vectors",
                    batch.len(),
                    vectors.len()
                );
                vec![Vec::new(); batch.len()]
            }
            Err(e) => {
                warn!("embedding batch failed, continuing without vectors: {e}");
                vec![Vec::new(); batch.len()]
            }
        };
        for (chunk, embedding) in batch.iter().zip(embeddings) {
            records.push(ChunkRecord {
                text: chunk.text.clone(),
                page_number: chunk.page_number,
                embedding,
            });
        }
    }

    records
}
