//! Schema migration CLI for the collector database.
//!
//! Reads `DATABASE_URL` from the environment (or `.env`), e.g. `migration up`.

use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    cli::run_cli(migration::Migrator).await;
}
