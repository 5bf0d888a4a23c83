//! Address-resolution and eligibility-decision pipeline for the Fonds
//! Barnier flood-relief subsidy.
//!
//! The flow mirrors the form a claimant fills in: a partial address is
//! resolved to ranked candidates ([`geocoding`]), selecting a candidate binds
//! its coordinates ([`session`]), and a bound coordinate pair is evaluated
//! against the TRI, PPRI, and PAPI flood-hazard registries in that order
//! ([`hazards`], [`eligibility`]) to produce a verdict.

pub mod config;
pub mod eligibility;
pub mod error;
pub mod geocoding;
pub mod hazards;
pub mod session;
pub mod telemetry;

pub use eligibility::{EligibilityEvaluator, EligibilityOutcome, HazardFlags, Verdict};
pub use geocoding::{AddressCandidate, AddressResolver, Coordinates, SuggestionBatch};
pub use hazards::{HazardKind, HazardRegistry};
pub use session::{EvaluationTicket, InteractionState};
