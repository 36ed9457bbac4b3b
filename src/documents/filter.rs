//! # Listing Filters
//!
//! Exact-match post-filtering of loaded listings.

use super::model::Document;

/// Attribute a listing can be filtered on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKey {
    Name,
    Mime,
    Public,
}

impl FilterKey {
    /// Recognise a filter key; anything else is `None`
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "name" => Some(FilterKey::Name),
            "mime" => Some(FilterKey::Mime),
            "public" => Some(FilterKey::Public),
            _ => None,
        }
    }

    fn matches(self, doc: &Document, value: &str) -> bool {
        match self {
            FilterKey::Name => doc.name == value,
            FilterKey::Mime => doc.mime == value,
            FilterKey::Public => doc.public == (value == "true"),
        }
    }
}

/// Keep documents whose `key` attribute equals `value`.
///
/// Unknown keys yield an empty result. `public` compares against the literal
/// `"true"`; any other value selects non-public documents.
pub fn filter_documents(docs: &[Document], key: &str, value: &str) -> Vec<Document> {
    match FilterKey::parse(key) {
        Some(key) => docs.iter().filter(|d| key.matches(d, value)).cloned().collect(),
        None => Vec::new(),
    }
}
