pub mod georisques;

use async_trait::async_trait;
use serde::Serialize;

use crate::geocoding::Coordinates;

pub use georisques::GeorisquesClient;

/// Search radius, in meters, applied to a zone lookup when the caller does
/// not override it.
pub const DEFAULT_RADIUS_METERS: u32 = 100;

/// The three GASPAR registries consulted by the eligibility chain, in
/// evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardKind {
    /// Territoire à Risque important d'Inondation: mapped major flood zone.
    Tri,
    /// Plan de Prévention des Risques d'Inondation: active prevention plan.
    Ppri,
    /// Programme d'Actions de Prévention des Inondations: approved program.
    Papi,
}

impl HazardKind {
    pub fn label(self) -> &'static str {
        match self {
            HazardKind::Tri => "TRI",
            HazardKind::Ppri => "PPRI",
            HazardKind::Papi => "PAPI",
        }
    }
}

impl std::fmt::Display for HazardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HazardLookupError {
    #[error("{kind} registry request failed: {detail}")]
    Transport { kind: HazardKind, detail: String },
    #[error("{kind} registry returned status {status}")]
    Status { kind: HazardKind, status: u16 },
    #[error("{kind} registry response could not be decoded: {detail}")]
    Decode { kind: HazardKind, detail: String },
}

/// Seam between the evaluator and the concrete registry backend.
///
/// A lookup answers "is a zone of this kind present within `radius_meters`
/// of the coordinates". Errors are surfaced here so the evaluator can apply
/// its fail-closed policy in one place.
#[async_trait]
pub trait HazardRegistry: Send + Sync {
    async fn zone_present(
        &self,
        kind: HazardKind,
        coords: Coordinates,
        radius_meters: u32,
    ) -> Result<bool, HazardLookupError>;
}
