mod check;
mod cli;
mod infra;
mod routes;
mod server;

use fonds_barnier::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
