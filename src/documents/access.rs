//! # Document Access
//!
//! Three-tier read policy: the owner, any login in the grant list, or anyone
//! when the document is public. Deletes are owner-scoped by the store itself.

use super::model::Document;
use crate::errors::{ServiceError, ServiceResult};

/// Why a read was allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTier {
    Owner,
    Granted,
    Public,
}

/// Permission checker for document operations
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentAccess;

impl DocumentAccess {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the tier granting `login` read access, if any
    pub fn read_tier(&self, doc: &Document, login: &str) -> Option<AccessTier> {
        if doc.owner == login {
            Some(AccessTier::Owner)
        } else if doc.grant.iter().any(|g| g == login) {
            Some(AccessTier::Granted)
        } else if doc.public {
            Some(AccessTier::Public)
        } else {
            None
        }
    }

    /// Check read permission
    pub fn check_read(&self, doc: &Document, login: &str) -> ServiceResult<AccessTier> {
        self.read_tier(doc, login).ok_or(ServiceError::Forbidden)
    }
}
