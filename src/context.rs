//! Request Context
//!
//! Context carried through every service call: a request id for log
//! correlation and an optional deadline shared by all store and cache calls
//! of the request.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use crate::errors::{ServiceError, ServiceResult};

/// Context carried through a single request
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request ID for tracing
    pub request_id: Uuid,

    /// Point after which remaining work is abandoned
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Create an unbounded context
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            deadline: None,
        }
    }

    /// Bound the context to `timeout` from now.
    ///
    /// A timeout too large to represent leaves the context unbounded.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fail fast with `Cancelled` once the deadline has passed
    pub fn ensure_active(&self) -> ServiceResult<()> {
        if self.is_expired() {
            Err(ServiceError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Run a store or cache call under this context's deadline
    pub async fn bounded<F, T>(&self, fut: F) -> ServiceResult<T>
    where
        F: Future<Output = T>,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| ServiceError::Cancelled),
            None => Ok(fut.await),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
