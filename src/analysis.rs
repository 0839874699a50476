//! Analysis trigger: asks the backend for a corpus-wide summary once an
//! upload has succeeded.

use std::sync::Arc;

use crate::client::Backend;
use crate::error::AnalysisError;

/// Summary text exactly as the backend returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary(pub String);

impl Summary {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

pub struct AnalysisTrigger<B: ?Sized> {
    backend: Arc<B>,
}

impl<B: Backend + ?Sized> AnalysisTrigger<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub async fn analyze(&self) -> Result<Summary, AnalysisError> {
        tracing::info!("Requesting document summary");
        match self.backend.summary().await {
            Ok(summary) => Ok(Summary(summary)),
            Err(e) => {
                tracing::warn!("Summary request failed: {}", e);
                Err(e.into())
            }
        }
    }
}
