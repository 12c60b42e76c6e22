use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tilewall::api;
use tilewall::models::{AppConfig, GridSpec, Orientation};
use tilewall::rendering::{encode_png, render_grid_preview, SourceImage};
use tilewall::server;
use tilewall::services::{
    CancelToken, PdfAssembler, PipelineStage, ProgressObserver, ProgressUpdate, TilePipeline,
};

#[derive(Parser)]
#[command(name = "tilewall")]
#[command(about = "Tilewall - split an image into enhanced, print-ready A4 poster tiles")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Cut an image into tiles and write them as a PDF
    Render {
        /// Source image (PNG or JPEG)
        #[arg(short, long)]
        input: PathBuf,

        /// Output PDF file path (defaults to the configured document name)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of page columns
        #[arg(short, long)]
        cols: Option<u32>,

        /// Number of page rows
        #[arg(short, long)]
        rows: Option<u32>,

        /// Use landscape pages
        #[arg(short, long)]
        landscape: bool,

        /// Also write every tile as a JPEG into this directory
        #[arg(long)]
        tiles_dir: Option<PathBuf>,
    },
    /// Write a PNG preview of the image with the cut grid drawn on it
    Preview {
        /// Source image (PNG or JPEG)
        #[arg(short, long)]
        input: PathBuf,

        /// Output PNG file path
        #[arg(short, long)]
        output: PathBuf,

        /// Number of page columns
        #[arg(short, long)]
        cols: Option<u32>,

        /// Number of page rows
        #[arg(short, long)]
        rows: Option<u32>,

        /// Use landscape pages
        #[arg(short, long)]
        landscape: bool,
    },
}

const JOB_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tilewall API",
        description = "Split an image into enhanced, print-ready A4 poster tiles",
        version = "0.1.0",
        license(name = "MIT")
    ),
    paths(
        api::handle_create_job,
        api::handle_get_job,
        api::handle_job_events,
        api::handle_job_preview,
        api::handle_job_document,
        api::handle_delete_job,
        api::handle_grid_preview,
    ),
    components(schemas(api::JobCreatedResponse)),
    tags(
        (name = "Jobs", description = "Background tile jobs"),
        (name = "Preview", description = "Grid previews")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Render {
            input,
            output,
            cols,
            rows,
            landscape,
            tiles_dir,
        }) => run_render_command(&input, output, cols, rows, landscape, tiles_dir),
        Some(Commands::Preview {
            input,
            output,
            cols,
            rows,
            landscape,
        }) => run_preview_command(&input, &output, cols, rows, landscape),
        Some(Commands::Serve) => run_server().await,
        None => {
            run_status_command();
            Ok(())
        }
    }
}

fn init_cli_logging() {
    // Minimal logging for CLI
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tilewall=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();
}

fn resolve_grid(
    config: &AppConfig,
    cols: Option<u32>,
    rows: Option<u32>,
    landscape: bool,
) -> anyhow::Result<GridSpec> {
    let orientation = landscape.then_some(Orientation::Landscape);
    Ok(config.grid.resolve(cols, rows, orientation)?)
}

/// Prints one line per finished tile
struct ConsoleProgress;

impl ProgressObserver for ConsoleProgress {
    fn on_progress(&mut self, update: &ProgressUpdate<'_>) {
        if update.stage == PipelineStage::Encode {
            println!("  tile {}/{} done", update.tile_index + 1, update.total_tiles);
        }
    }
}

/// Cut an image into tiles and assemble a PDF (no server needed)
fn run_render_command(
    input: &Path,
    output: Option<PathBuf>,
    cols: Option<u32>,
    rows: Option<u32>,
    landscape: bool,
    tiles_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    init_cli_logging();

    let config = AppConfig::from_env();
    let grid = resolve_grid(&config, cols, rows, landscape)?;
    let output = output.unwrap_or_else(|| PathBuf::from(&config.document_name));

    let bytes = std::fs::read(input)?;
    let mut pipeline = TilePipeline::with_page_format(grid, config.page_format());
    pipeline.load_bytes(&bytes)?;

    let (tile_width, tile_height) = pipeline.tile_size();
    println!(
        "Cutting {} into {}x{} {} pages ({tile_width}x{tile_height} px each)",
        input.display(),
        grid.cols(),
        grid.rows(),
        grid.orientation()
    );

    let tiles = pipeline.run(&CancelToken::new(), &mut ConsoleProgress)?;

    if let Some(dir) = tiles_dir {
        std::fs::create_dir_all(&dir)?;
        for tile in tiles {
            let (row, col) = grid.cell(tile.index);
            let path = dir.join(format!("tile_r{}_c{}.jpg", row + 1, col + 1));
            std::fs::write(&path, &tile.jpeg)?;
        }
        println!("Wrote {} tiles to {}", tiles.len(), dir.display());
    }

    let pdf = pipeline.assemble(&PdfAssembler::new())?;
    std::fs::write(&output, &pdf)?;
    println!("Rendered {} ({} bytes)", output.display(), pdf.len());

    Ok(())
}

/// Render the grid preview to a PNG file
fn run_preview_command(
    input: &Path,
    output: &Path,
    cols: Option<u32>,
    rows: Option<u32>,
    landscape: bool,
) -> anyhow::Result<()> {
    init_cli_logging();

    let config = AppConfig::from_env();
    let grid = resolve_grid(&config, cols, rows, landscape)?;

    let bytes = std::fs::read(input)?;
    let source = SourceImage::decode(&bytes)?;
    let preview = render_grid_preview(&source, &grid, &config.page_format())?;
    let png = encode_png(&preview)?;

    std::fs::write(output, &png)?;
    println!("Rendered {} ({} bytes)", output.display(), png.len());

    Ok(())
}

fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    // Read environment variables
    let bind_addr = std::env::var("BIND_ADDR").ok();
    let config_file = std::env::var("CONFIG_FILE").ok();

    // Header
    println!("Tilewall v{VERSION}");
    println!("Split an image into enhanced, print-ready A4 poster tiles\n");

    // Environment variables section
    println!("Environment Variables:");
    println!(
        "  BIND_ADDR   = {}",
        bind_addr.as_deref().unwrap_or("0.0.0.0:3000 (default)")
    );
    println!(
        "  CONFIG_FILE = {}",
        config_file.as_deref().unwrap_or("(not set)")
    );

    let config = AppConfig::from_env();
    let (tile_width, tile_height) = config.page_format().pixel_size();

    println!("\nDefaults:");
    println!(
        "  Grid:     {}x{} {}",
        config.grid.cols, config.grid.rows, config.grid.orientation
    );
    println!(
        "  Tiles:    {tile_width}x{tile_height} px portrait at {} DPI",
        config.dpi
    );
    println!("  Document: {}", config.document_name);
    println!(
        "  Uploads:  up to {} MiB",
        config.max_upload_bytes / (1024 * 1024)
    );
    println!(
        "  Jobs:     {} at once, {} kept for {}s",
        config.max_concurrent_jobs, config.max_jobs, config.job_retention_secs
    );

    println!("\nCommands:");
    println!("  tilewall render -i IMAGE   Cut an image into a PDF of tiles");
    println!("  tilewall preview -i IMAGE -o OUT.png");
    println!("                             Preview the cut grid");
    println!("  tilewall serve             Start the HTTP server");
    println!("\nRun 'tilewall --help' for more options.");
}

async fn run_server() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tilewall=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let config = AppConfig::from_env();

    // Create application state using shared server module
    let state = server::create_app_state(config);
    state.jobs.spawn_sweeper(JOB_SWEEP_INTERVAL);

    // Build router: start with shared API routes, add production-only routes
    let app = server::build_router(state)
        // OpenAPI documentation (production only)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Tilewall server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
