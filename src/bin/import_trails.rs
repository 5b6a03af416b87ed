use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use trail_import::config::{
    Bbox, ElevationArgs, FetchArgs, TrailImportConfig, DEFAULT_BBOX, DEFAULT_TRAIL_KEYWORDS,
};
use trail_import::db::{self, MemoryStore, PgStore, TrailStore};
use trail_import::importer::elevation::{ElevationLookup, OpenElevationClient};
use trail_import::importer::{import_trails, OverpassFetcher};

#[derive(Parser, Debug)]
#[command(name = "import-trails")]
#[command(about = "Import hiking trails from OpenStreetMap", long_about = None)]
struct Args {
    /// Bounding box: min_lon,min_lat,max_lon,max_lat
    #[arg(short, long, default_value = DEFAULT_BBOX)]
    bbox: Bbox,

    /// Regex alternation matched against way names
    #[arg(long, default_value = DEFAULT_TRAIL_KEYWORDS)]
    keywords: String,

    /// Shortest trail kept, in km
    #[arg(long, default_value_t = 1.5)]
    min_length_km: f64,

    /// Longest trail kept, in km
    #[arg(long, default_value_t = 60.0)]
    max_length_km: f64,

    /// Keep trails longer than --max-length-km
    #[arg(long)]
    keep_extreme: bool,

    /// Run against an in-memory store instead of the database
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    fetch: FetchArgs,

    #[command(flatten)]
    elevation: ElevationArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let config = TrailImportConfig {
        bbox: args.bbox,
        name_keywords: args.keywords.clone(),
        min_length_km: args.min_length_km,
        skip_extreme_trails: !args.keep_extreme,
        max_length_km: args.max_length_km,
    };
    let elevation_config = args.elevation.to_config();

    tracing::info!("Starting trail import");
    tracing::info!("Bounding box: {}", config.bbox);

    let fetcher = OverpassFetcher::from_config(&args.fetch.to_config())?;
    let elevation_client = if elevation_config.enabled {
        Some(OpenElevationClient::new(&elevation_config)?)
    } else {
        tracing::info!("Elevation lookups disabled");
        None
    };
    let elevation = elevation_client
        .as_ref()
        .map(|client| client as &dyn ElevationLookup);

    let store: Box<dyn TrailStore> = if args.dry_run {
        tracing::info!("Dry run: using in-memory store");
        Box::new(MemoryStore::new())
    } else {
        tracing::info!("Connecting to database...");
        let pool = db::create_pool()
            .await
            .context("failed to connect to database")?;
        db::run_migrations(&pool).await?;
        tracing::info!("Database connection established");
        Box::new(PgStore::new(pool))
    };

    let report = import_trails(
        &fetcher,
        elevation,
        store.as_ref(),
        &config,
        elevation_config.sample_stride,
    )
    .await;

    report.log_summary();
    tracing::info!("Imported {} trails", report.saved);

    Ok(())
}
