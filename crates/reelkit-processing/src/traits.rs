//! Probing seam used at ingestion.

use async_trait::async_trait;

/// Reads what ingestion needs to know about a still before an asset is
/// created from it.
#[async_trait]
pub trait MediaProcessor: Send + Sync {
    type Metadata: Send + Sync;

    /// Probe header-level metadata (format, pixel size).
    async fn extract_metadata(&self, data: &[u8]) -> Result<Self::Metadata, anyhow::Error>;

    /// Full decode check.
    fn validate(&self, data: &[u8]) -> Result<(), anyhow::Error>;

    fn get_dimensions(&self, data: &[u8]) -> Option<(u32, u32)>;
}
