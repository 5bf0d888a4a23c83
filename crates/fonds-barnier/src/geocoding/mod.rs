pub mod geoapify;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

pub use geoapify::GeoapifyClient;

/// Queries shorter than this never reach the geocoding provider; the
/// suggestion list is cleared instead.
pub const MIN_QUERY_LEN: usize = 3;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One ranked autocomplete match. Immutable once built; the order of a
/// candidate list is the provider's ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressCandidate {
    pub label: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("autocomplete request failed: {0}")]
    Transport(String),
    #[error("autocomplete returned status {0}")]
    Status(u16),
    #[error("autocomplete response could not be decoded: {0}")]
    Decode(String),
}

/// Seam between the resolver and the concrete geocoding provider.
#[async_trait]
pub trait GeocodingGateway: Send + Sync {
    async fn autocomplete(&self, query: &str) -> Result<Vec<AddressCandidate>, GeocodeError>;
}

/// A resolved suggestion list tagged with the sequence number of the request
/// that produced it. Responses may complete out of order; the session keeps a
/// batch only when its sequence is at least as new as the last applied one.
#[derive(Debug, Clone)]
pub struct SuggestionBatch {
    pub sequence: u64,
    pub candidates: Vec<AddressCandidate>,
}

impl SuggestionBatch {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Turns partial address text into ranked candidates, absorbing provider
/// failures and tagging every response for stale-response detection.
pub struct AddressResolver<G> {
    gateway: Arc<G>,
    sequence: AtomicU64,
}

impl<G> AddressResolver<G>
where
    G: GeocodingGateway,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            sequence: AtomicU64::new(0),
        }
    }

    /// Resolves `query` into a suggestion batch.
    ///
    /// Queries shorter than [`MIN_QUERY_LEN`] produce an empty batch without
    /// touching the network; the batch still consumes a sequence number so it
    /// supersedes any slower in-flight resolution. Provider failures are
    /// logged and collapse to an empty batch, never an error.
    pub async fn resolve(&self, query: &str) -> SuggestionBatch {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;

        if query.chars().count() < MIN_QUERY_LEN {
            return SuggestionBatch {
                sequence,
                candidates: Vec::new(),
            };
        }

        let candidates = match self.gateway.autocomplete(query).await {
            Ok(candidates) => {
                debug!(sequence, count = candidates.len(), "autocomplete resolved");
                candidates
            }
            Err(err) => {
                warn!(sequence, error = %err, "autocomplete failed, treating as no matches");
                Vec::new()
            }
        };

        SuggestionBatch {
            sequence,
            candidates,
        }
    }
}
