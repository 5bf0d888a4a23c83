use tracing::debug;

use crate::eligibility::{EligibilityOutcome, HazardFlags, Verdict};
use crate::geocoding::{AddressCandidate, Coordinates, SuggestionBatch, MIN_QUERY_LEN};

/// Permission to run one evaluation, handed out by
/// [`InteractionState::begin_evaluation`]. Carries the coordinates the run
/// is bound to and the epoch the session was in when it started; the
/// outcome is installed only if the epoch is still current when the run
/// finishes.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationTicket {
    pub coords: Coordinates,
    epoch: u64,
}

/// The shared mutable state behind the address form: query text, ranked
/// suggestions, the coordinates bound to the selected candidate, the
/// per-registry flags, the verdict, and the in-flight guard.
///
/// All transitions are synchronous and infallible; asynchronous work
/// (resolution, evaluation) happens outside and feeds its results back in
/// through [`apply_suggestions`](Self::apply_suggestions) and
/// [`finish_evaluation`](Self::finish_evaluation), which discard anything
/// the session has since moved past.
#[derive(Debug, Default)]
pub struct InteractionState {
    query: String,
    suggestions: Vec<AddressCandidate>,
    applied_sequence: u64,
    bound: Option<Coordinates>,
    flags: HazardFlags,
    verdict: Option<Verdict>,
    loading: bool,
    epoch: u64,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &[AddressCandidate] {
        &self.suggestions
    }

    pub fn bound_coordinates(&self) -> Option<Coordinates> {
        self.bound
    }

    pub fn hazard_flags(&self) -> HazardFlags {
        self.flags
    }

    pub fn verdict(&self) -> Option<Verdict> {
        self.verdict
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Replaces the query text. Any prior selection and verdict no longer
    /// describe the new text, so the coordinates unbind and the flags and
    /// verdict reset; an in-flight evaluation is orphaned by bumping the
    /// epoch. Too-short queries also clear the suggestion list, matching the
    /// resolver's refusal to query the provider for them.
    pub fn edit_query(&mut self, text: impl Into<String>) {
        self.query = text.into();
        self.bound = None;
        self.flags = HazardFlags::default();
        self.verdict = None;
        self.epoch += 1;
        if !self.wants_suggestions() {
            self.suggestions.clear();
        }
    }

    /// Whether the current query is long enough to resolve.
    pub fn wants_suggestions(&self) -> bool {
        self.query.chars().count() >= MIN_QUERY_LEN
    }

    /// Installs a resolved suggestion batch unless a newer batch has already
    /// been applied. Returns whether the batch was kept.
    pub fn apply_suggestions(&mut self, batch: SuggestionBatch) -> bool {
        if batch.sequence < self.applied_sequence {
            debug!(
                stale = batch.sequence,
                current = self.applied_sequence,
                "discarding stale suggestion batch"
            );
            return false;
        }
        self.applied_sequence = batch.sequence;
        self.suggestions = batch.candidates;
        true
    }

    /// Selects the candidate at `index`: the query text becomes the
    /// candidate's label, the suggestion list clears, the coordinates bind,
    /// and any previous verdict resets. Pure state transition; an
    /// out-of-range index is a no-op returning `None`.
    pub fn select_candidate(&mut self, index: usize) -> Option<AddressCandidate> {
        if index >= self.suggestions.len() {
            return None;
        }
        let candidate = self.suggestions.remove(index);
        self.suggestions.clear();
        self.query = candidate.label.clone();
        self.bound = Some(candidate.coordinates);
        self.flags = HazardFlags::default();
        self.verdict = None;
        Some(candidate)
    }

    /// Whether the evaluation trigger is enabled: coordinates bound and no
    /// run already in flight.
    pub fn can_evaluate(&self) -> bool {
        self.bound.is_some() && !self.loading
    }

    /// Starts an evaluation run. Returns `None` (a no-op, not an error) when
    /// the trigger is disabled; otherwise resets the flags and verdict, sets
    /// the loading guard, and hands back a ticket for this run.
    pub fn begin_evaluation(&mut self) -> Option<EvaluationTicket> {
        if !self.can_evaluate() {
            return None;
        }
        let coords = self.bound?;
        self.flags = HazardFlags::default();
        self.verdict = None;
        self.loading = true;
        Some(EvaluationTicket {
            coords,
            epoch: self.epoch,
        })
    }

    /// Completes an evaluation run. The loading guard always clears; the
    /// outcome is installed only when the ticket's epoch is still current,
    /// so a run orphaned by an address edit never overwrites newer state.
    /// Returns whether the outcome was kept.
    pub fn finish_evaluation(&mut self, ticket: EvaluationTicket, outcome: EligibilityOutcome) -> bool {
        self.loading = false;
        if ticket.epoch != self.epoch {
            debug!(
                run_epoch = ticket.epoch,
                current_epoch = self.epoch,
                "discarding outcome of an orphaned evaluation run"
            );
            return false;
        }
        self.flags = outcome.flags;
        self.verdict = Some(outcome.verdict);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(label: &str, latitude: f64, longitude: f64) -> AddressCandidate {
        AddressCandidate {
            label: label.to_string(),
            coordinates: Coordinates {
                latitude,
                longitude,
            },
        }
    }

    fn two_candidates() -> SuggestionBatch {
        SuggestionBatch {
            sequence: 1,
            candidates: vec![
                candidate("12 Rue de la Paix, 75002 Paris", 48.8692, 2.3310),
                candidate("12 Rue de la Paix, 69002 Lyon", 45.7640, 4.8357),
            ],
        }
    }

    fn outcome(verdict: Verdict) -> EligibilityOutcome {
        EligibilityOutcome {
            verdict,
            flags: HazardFlags {
                tri: Some(true),
                ppri: Some(true),
                papi: Some(verdict == Verdict::Eligible),
            },
        }
    }

    #[test]
    fn short_queries_clear_suggestions_and_suppress_resolution() {
        let mut state = InteractionState::new();
        state.edit_query("12 Rue");
        assert!(state.apply_suggestions(two_candidates()));
        assert_eq!(state.suggestions().len(), 2);

        state.edit_query("12");
        assert!(!state.wants_suggestions());
        assert!(state.suggestions().is_empty());
    }

    #[test]
    fn selecting_a_candidate_binds_its_coordinates() {
        let mut state = InteractionState::new();
        state.edit_query("12 Rue");
        state.apply_suggestions(two_candidates());

        let selected = state.select_candidate(1).expect("second candidate exists");
        assert_eq!(selected.label, "12 Rue de la Paix, 69002 Lyon");
        assert_eq!(state.query(), "12 Rue de la Paix, 69002 Lyon");
        assert!(state.suggestions().is_empty());
        let bound = state.bound_coordinates().expect("coordinates bound");
        assert!((bound.latitude - 45.7640).abs() < f64::EPSILON);
        assert!(state.can_evaluate(), "trigger enables after selection");
    }

    #[test]
    fn selecting_out_of_range_is_a_no_op() {
        let mut state = InteractionState::new();
        state.edit_query("12 Rue");
        state.apply_suggestions(two_candidates());
        assert!(state.select_candidate(5).is_none());
        assert_eq!(state.suggestions().len(), 2);
        assert!(state.bound_coordinates().is_none());
    }

    #[test]
    fn stale_suggestion_batches_are_discarded() {
        let mut state = InteractionState::new();
        state.edit_query("12 Rue de la P");
        let newer = SuggestionBatch {
            sequence: 7,
            candidates: vec![candidate("12 Rue de la Paix, 75002 Paris", 48.8692, 2.3310)],
        };
        assert!(state.apply_suggestions(newer));

        let stale = SuggestionBatch {
            sequence: 3,
            candidates: vec![candidate("12 Rue de Lappe, 75011 Paris", 48.8530, 2.3730)],
        };
        assert!(!state.apply_suggestions(stale));
        assert_eq!(state.suggestions()[0].label, "12 Rue de la Paix, 75002 Paris");
    }

    #[test]
    fn evaluation_is_disabled_until_coordinates_bind() {
        let mut state = InteractionState::new();
        state.edit_query("12 Rue");
        assert!(!state.can_evaluate());
        assert!(state.begin_evaluation().is_none());
    }

    #[test]
    fn loading_guard_suppresses_reentrant_runs() {
        let mut state = InteractionState::new();
        state.edit_query("12 Rue");
        state.apply_suggestions(two_candidates());
        state.select_candidate(0);

        let ticket = state.begin_evaluation().expect("first run starts");
        assert!(state.is_loading());
        assert!(state.begin_evaluation().is_none(), "second trigger is a no-op");

        assert!(state.finish_evaluation(ticket, outcome(Verdict::Eligible)));
        assert!(!state.is_loading());
        assert_eq!(state.verdict(), Some(Verdict::Eligible));
        assert_eq!(state.hazard_flags().tri, Some(true));
    }

    #[test]
    fn verdict_resets_on_edit_and_on_new_run() {
        let mut state = InteractionState::new();
        state.edit_query("12 Rue");
        state.apply_suggestions(two_candidates());
        state.select_candidate(0);

        let ticket = state.begin_evaluation().expect("run starts");
        state.finish_evaluation(ticket, outcome(Verdict::Eligible));
        assert_eq!(state.verdict(), Some(Verdict::Eligible));

        state.edit_query("12 Rue de");
        assert_eq!(state.verdict(), None);
        assert_eq!(state.hazard_flags(), HazardFlags::default());
        assert!(state.bound_coordinates().is_none(), "edit unbinds");
    }

    #[test]
    fn editing_mid_flight_orphans_the_run() {
        let mut state = InteractionState::new();
        state.edit_query("12 Rue");
        state.apply_suggestions(two_candidates());
        state.select_candidate(0);

        let ticket = state.begin_evaluation().expect("run starts");
        state.edit_query("99 Avenue");

        assert!(
            !state.finish_evaluation(ticket, outcome(Verdict::Eligible)),
            "orphaned outcome is discarded"
        );
        assert!(!state.is_loading(), "guard still clears");
        assert_eq!(state.verdict(), None);
    }
}
