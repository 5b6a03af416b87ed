use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use trail_import::config::{Bbox, FetchArgs, ServiceImportConfig, DEFAULT_BBOX};
use trail_import::db::{self, MemoryStore, PgStore, TrailStore};
use trail_import::importer::{import_services, OverpassFetcher};

#[derive(Parser, Debug)]
#[command(name = "import-services")]
#[command(about = "Link car parks and public transport to imported trails", long_about = None)]
struct Args {
    /// Bounding box: min_lon,min_lat,max_lon,max_lat
    #[arg(short, long, default_value = DEFAULT_BBOX)]
    bbox: Bbox,

    /// Max distance from a trail, in km
    #[arg(long, default_value_t = 1.0)]
    search_radius_km: f64,

    /// Run against an in-memory store instead of the database
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    fetch: FetchArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let config = ServiceImportConfig {
        bbox: args.bbox,
        search_radius_km: args.search_radius_km,
    };

    tracing::info!("Starting service import");
    tracing::info!("Bounding box: {}", config.bbox);

    let fetcher = OverpassFetcher::from_config(&args.fetch.to_config())?;

    let store: Box<dyn TrailStore> = if args.dry_run {
        tracing::warn!("Dry run: in-memory store has no trails, nothing will be linked");
        Box::new(MemoryStore::new())
    } else {
        tracing::info!("Connecting to database...");
        let pool = db::create_pool()
            .await
            .context("failed to connect to database")?;
        db::run_migrations(&pool).await?;
        Box::new(PgStore::new(pool))
    };

    let report = import_services(&fetcher, store.as_ref(), &config)
        .await
        .context("failed to load trails")?;

    report.log_summary();
    tracing::info!("Linked {} car parks", report.car_parks.saved);
    tracing::info!("Linked {} transport links", report.transport.saved);

    Ok(())
}
