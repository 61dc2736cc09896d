mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use employer_network::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
