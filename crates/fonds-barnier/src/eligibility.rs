use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::geocoding::Coordinates;
use crate::hazards::{HazardKind, HazardRegistry, DEFAULT_RADIUS_METERS};

/// Final eligibility classification shown to the claimant.
///
/// `PotentiallyEligible` is part of the published outcome domain and has a
/// user-facing message, but no path through the evaluation chain produces
/// it; the subsidy rule as implemented only yields eligible/not-eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    Eligible,
    PotentiallyEligible,
    NotEligible,
}

impl Verdict {
    /// Fixed French wording presented for each verdict.
    pub fn message(self) -> &'static str {
        match self {
            Verdict::Eligible => "Vous êtes éligible au Fonds Barnier !",
            Verdict::PotentiallyEligible => {
                "Vous êtes potentiellement éligible. Un diagnostic de vulnérabilité est nécessaire."
            }
            Verdict::NotEligible => "Vous n'êtes pas éligible au Fonds Barnier.",
        }
    }
}

/// Per-registry presence results for one evaluation run. `None` means the
/// chain never reached that registry (or the run has not started).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HazardFlags {
    pub tri: Option<bool>,
    pub ppri: Option<bool>,
    pub papi: Option<bool>,
}

/// What one completed evaluation run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityOutcome {
    pub verdict: Verdict,
    pub flags: HazardFlags,
}

/// Runs the TRI → PPRI → PAPI chain against a hazard registry.
///
/// The chain is a logical AND with early exit: a property must sit in a
/// mapped flood-risk zone (TRI), under an active prevention plan (PPRI), and
/// inside an approved action program (PAPI). Each step is a prerequisite for
/// the next, so a negative answer ends the run without querying the
/// remaining registries.
pub struct EligibilityEvaluator<R> {
    registry: Arc<R>,
    radius_meters: u32,
}

impl<R> EligibilityEvaluator<R>
where
    R: HazardRegistry,
{
    pub fn new(registry: Arc<R>) -> Self {
        Self::with_radius(registry, DEFAULT_RADIUS_METERS)
    }

    pub fn with_radius(registry: Arc<R>, radius_meters: u32) -> Self {
        Self {
            registry,
            radius_meters,
        }
    }

    /// Evaluates a bound coordinate pair. Always terminates in a concrete
    /// verdict: registry failures degrade to "zone absent" rather than
    /// aborting the run, so the worst failure mode is a conservative
    /// not-eligible, never an error or a stuck run.
    pub async fn evaluate(&self, coords: Coordinates) -> EligibilityOutcome {
        let mut flags = HazardFlags::default();

        let tri = self.probe(HazardKind::Tri, coords).await;
        flags.tri = Some(tri);
        if !tri {
            return self.conclude(Verdict::NotEligible, flags);
        }

        let ppri = self.probe(HazardKind::Ppri, coords).await;
        flags.ppri = Some(ppri);
        if !ppri {
            return self.conclude(Verdict::NotEligible, flags);
        }

        let papi = self.probe(HazardKind::Papi, coords).await;
        flags.papi = Some(papi);
        let verdict = if papi {
            Verdict::Eligible
        } else {
            Verdict::NotEligible
        };
        self.conclude(verdict, flags)
    }

    /// Single fail-closed point: an unreachable or undecodable registry
    /// counts as "zone absent".
    async fn probe(&self, kind: HazardKind, coords: Coordinates) -> bool {
        match self
            .registry
            .zone_present(kind, coords, self.radius_meters)
            .await
        {
            Ok(present) => present,
            Err(err) => {
                warn!(kind = kind.label(), error = %err, "registry lookup failed, treating zone as absent");
                false
            }
        }
    }

    fn conclude(&self, verdict: Verdict, flags: HazardFlags) -> EligibilityOutcome {
        info!(?verdict, ?flags, "eligibility evaluation concluded");
        EligibilityOutcome { verdict, flags }
    }
}
