//! # Document Model
//!
//! Documents, their creation-time metadata, and the payload they carry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ServiceError, ServiceResult};

/// Document body: raw bytes for files, JSON text otherwise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "lowercase")]
pub enum Payload {
    File(Vec<u8>),
    Json(String),
}

impl Payload {
    /// Select the populated side from the caller's discriminator
    pub fn select(is_file: bool, data: Vec<u8>, json: String) -> Self {
        if is_file {
            Payload::File(data)
        } else {
            Payload::Json(json)
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Payload::File(_))
    }

    /// Same kind, no body
    pub fn emptied(&self) -> Self {
        match self {
            Payload::File(_) => Payload::File(Vec::new()),
            Payload::Json(_) => Payload::Json(String::new()),
        }
    }
}

/// A named artifact owned by exactly one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pub mime: String,
    pub public: bool,
    pub created_at: DateTime<Utc>,

    /// Logins allowed to read beyond the owner, in caller order
    pub grant: Vec<String>,

    /// Login of the owning user
    pub owner: String,

    pub payload: Payload,
}

impl Document {
    pub fn is_file(&self) -> bool {
        self.payload.is_file()
    }

    /// File bytes, empty for JSON documents
    pub fn data(&self) -> &[u8] {
        match &self.payload {
            Payload::File(bytes) => bytes,
            Payload::Json(_) => &[],
        }
    }

    /// JSON text, empty for file documents
    pub fn json(&self) -> &str {
        match &self.payload {
            Payload::Json(text) => text,
            Payload::File(_) => "",
        }
    }

    /// Metadata-only copy, as returned in listings
    pub fn summary(&self) -> Document {
        Document {
            payload: self.payload.emptied(),
            ..self.clone()
        }
    }
}

/// Caller-supplied metadata for an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub name: String,

    /// Binary file when true, JSON payload when false
    #[serde(rename = "file")]
    pub is_file: bool,

    #[serde(default)]
    pub public: bool,

    #[serde(default)]
    pub mime: String,

    #[serde(default)]
    pub grant: Vec<String>,
}

impl DocumentMeta {
    /// Parse the JSON metadata form sent alongside an upload
    pub fn from_json(raw: &str) -> ServiceResult<Self> {
        let meta: DocumentMeta = serde_json::from_str(raw)
            .map_err(|e| ServiceError::invalid_input(format!("invalid meta data: {}", e)))?;
        meta.validate()?;
        Ok(meta)
    }

    pub fn validate(&self) -> ServiceResult<()> {
        if self.name.trim().is_empty() {
            return Err(ServiceError::invalid_input("document name must not be empty"));
        }
        Ok(())
    }
}

/// Parse a document id supplied as text
pub fn parse_document_id(raw: &str) -> ServiceResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| ServiceError::invalid_input(format!("malformed document id {:?}", raw)))
}
