use clap::Args;
use fonds_barnier::config::AppConfig;
use fonds_barnier::error::AppError;
use fonds_barnier::telemetry;
use fonds_barnier::InteractionState;

use crate::infra::build_pipeline;

#[derive(Args, Debug)]
pub(crate) struct CheckArgs {
    /// Address to resolve, e.g. "12 Rue de la Paix Paris"
    pub(crate) address: String,
    /// Pick this suggestion instead of the top-ranked one (1-based)
    #[arg(long, default_value_t = 1)]
    pub(crate) pick: usize,
    /// Only list the address suggestions, skip the evaluation
    #[arg(long)]
    pub(crate) suggestions_only: bool,
}

/// One-shot run of the interaction pipeline: resolve the address, bind the
/// picked candidate's coordinates, evaluate, print the verdict.
pub(crate) async fn run_check(args: CheckArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let pipeline = build_pipeline(&config)?;

    let mut state = InteractionState::new();
    state.edit_query(args.address);

    if !state.wants_suggestions() {
        println!("Adresse trop courte : saisissez au moins 3 caractères.");
        return Ok(());
    }

    let batch = pipeline.resolver.resolve(state.query()).await;
    state.apply_suggestions(batch);

    if state.suggestions().is_empty() {
        println!("Aucune adresse trouvée pour « {} ».", state.query());
        return Ok(());
    }

    println!("Adresses proposées :");
    for (rank, candidate) in state.suggestions().iter().enumerate() {
        println!("  {}. {}", rank + 1, candidate.label);
    }

    if args.suggestions_only {
        return Ok(());
    }

    let index = args.pick.saturating_sub(1);
    let Some(selected) = state.select_candidate(index) else {
        println!("Aucune suggestion n°{} — choisissez un rang listé ci-dessus.", args.pick);
        return Ok(());
    };
    println!();
    println!("Adresse retenue : {}", selected.label);
    println!(
        "Coordonnées : {:.4}, {:.4}",
        selected.coordinates.latitude, selected.coordinates.longitude
    );

    // Selection always binds, so the ticket is available here.
    let Some(ticket) = state.begin_evaluation() else {
        return Ok(());
    };
    let outcome = pipeline.evaluator.evaluate(ticket.coords).await;
    state.finish_evaluation(ticket, outcome);

    let flags = state.hazard_flags();
    println!();
    println!("Zone TRI : {}", flag_label(flags.tri));
    println!("PPRI actif : {}", flag_label(flags.ppri));
    println!("PAPI approuvé : {}", flag_label(flags.papi));
    if let Some(verdict) = state.verdict() {
        println!();
        println!("{}", verdict.message());
    }

    Ok(())
}

fn flag_label(flag: Option<bool>) -> &'static str {
    match flag {
        Some(true) => "oui",
        Some(false) => "non",
        None => "non consulté",
    }
}
