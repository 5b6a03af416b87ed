use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use trail_import::db::{self, repository, repository::Table};

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Target {
    Trails,
    CarParks,
    Transport,
    All,
}

impl Target {
    /// Children first so each count reflects rows actually removed by that step
    fn tables(self) -> &'static [Table] {
        match self {
            Self::Trails => &[Table::Trails],
            Self::CarParks => &[Table::CarParks],
            Self::Transport => &[Table::TransportLinks],
            Self::All => &[Table::TransportLinks, Table::CarParks, Table::Trails],
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "clear")]
#[command(about = "Delete imported rows and reset their ids", long_about = None)]
struct Args {
    #[arg(value_enum)]
    target: Target,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let pool = db::create_pool().await?;
    db::run_migrations(&pool).await?;

    for &table in args.target.tables() {
        let removed = repository::clear_table(&pool, table).await?;
        tracing::info!("Deleted {} rows from {}", removed, table.name());
    }

    Ok(())
}
