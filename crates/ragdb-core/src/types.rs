//! Domain types shared by the vector store and the search engine.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// Document-level attributes attached to a chunk at ingestion time.
///
/// Every field is optional: chunks produced by different extraction passes
/// (text layer, OCR, manual repair) carry different subsets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunking_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_timestamp: Option<String>,
}

impl ChunkMetadata {
    /// Column names in storage order.
    pub const FIELD_NAMES: [&'static str; 7] = [
        "filename",
        "section_number",
        "section_title",
        "extraction_method",
        "chunking_method",
        "document_id",
        "upload_timestamp",
    ];

    pub fn get(&self, field: &str) -> Option<&str> {
        match field {
            "filename" => self.filename.as_deref(),
            "section_number" => self.section_number.as_deref(),
            "section_title" => self.section_title.as_deref(),
            "extraction_method" => self.extraction_method.as_deref(),
            "chunking_method" => self.chunking_method.as_deref(),
            "document_id" => self.document_id.as_deref(),
            "upload_timestamp" => self.upload_timestamp.as_deref(),
            _ => None,
        }
    }

    /// Sets a field by column name. Returns `false` for unknown names.
    pub fn set(&mut self, field: &str, value: Option<String>) -> bool {
        let slot = match field {
            "filename" => &mut self.filename,
            "section_number" => &mut self.section_number,
            "section_title" => &mut self.section_title,
            "extraction_method" => &mut self.extraction_method,
            "chunking_method" => &mut self.chunking_method,
            "document_id" => &mut self.document_id,
            "upload_timestamp" => &mut self.upload_timestamp,
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// A stored unit of document text, the atomic retrievable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    #[serde(default)]
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(id: impl Into<ChunkId>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: ChunkMetadata::default() }
    }

    pub fn with_metadata(mut self, metadata: ChunkMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// One row of a nearest-neighbour query, in store order.
///
/// `distance` is the store's dissimilarity: 0 means identical, larger is less
/// similar. Stores never report negative distances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryHit {
    pub chunk: Chunk,
    pub distance: f32,
}
