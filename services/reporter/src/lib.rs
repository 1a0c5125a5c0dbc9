mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use coaching_compliance::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
