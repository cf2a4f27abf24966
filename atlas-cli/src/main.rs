use atlas_core::{
    ContainerSize, DEFAULT_DATASET_URL, DatasetSource, FileDatasetSource, HostDocument,
    HttpDatasetSource, OutputFormat, ProjectionMode, RenderConfig, RenderReport, render_map,
};

use std::{
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::{Context, bail, ensure};
use clap::Parser;
use tracing::{Level, event};

#[derive(Parser, Debug)]
#[command(version, about = "Draws the US states topology as an SVG map", long_about = None)]
struct Args {
    /// URL of the topology to draw
    #[arg(short, long, env = "ATLAS_DATASET_URL", default_value = DEFAULT_DATASET_URL)]
    url: String,

    /// Read the topology from a local file instead of fetching it
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Name of the topology object to draw
    #[arg(short, long, default_value = "states")]
    object: String,

    /// Width of the map container in pixels
    #[arg(long, default_value_t = 975)]
    width: u32,

    /// Height of the map container in pixels
    #[arg(long, default_value_t = 610)]
    height: u32,

    #[arg(short, long, default_value_t, value_enum)]
    format: OutputFormat,

    /// How topology coordinates are placed on the map surface
    #[arg(short, long, default_value_t, value_enum)]
    projection: ProjectionMode,

    /// Where to write the map, defaults to a timestamped file in `generated/`
    #[arg(long)]
    output: Option<PathBuf>,

    /// Seconds to wait for the dataset, 0 waits forever
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();

    let size = ContainerSize::new(args.width, args.height);
    ensure!(!size.is_empty(), "Map container cannot be {size}");

    let config = RenderConfig {
        object_name: args.object.clone(),
        fetch_timeout: (args.timeout_secs > 0).then(|| Duration::from_secs(args.timeout_secs)),
        projection: args.projection,
        ..Default::default()
    };
    let container_id = config.container_id.clone();

    let (document, report) = match &args.input {
        Some(path) => render_cancellable(&FileDatasetSource::new(path), size, config).await?,
        None => render_cancellable(&HttpDatasetSource::new(&args.url), size, config).await?,
    };

    event!(
        Level::INFO,
        "Drew {} of {} features",
        report.shape_count,
        report.feature_count
    );

    let map_filename = match args.output {
        Some(path) => path,
        None => default_output(args.format)?,
    };

    println!("Saving map as {:?} to: {}", args.format, map_filename.display());

    save(&document, &container_id, args.format, &map_filename).await
}

async fn render_cancellable<S: DatasetSource>(
    source: &S,
    size: ContainerSize,
    config: RenderConfig,
) -> anyhow::Result<(HostDocument, RenderReport)> {
    tokio::select! {
        rendered = render_map(source, size, config) => Ok(rendered?),
        _ = tokio::signal::ctrl_c() => bail!("Interrupted while rendering the map"),
    }
}

fn default_output(format: OutputFormat) -> anyhow::Result<PathBuf> {
    let now = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH)?;

    match Path::new("generated").try_exists() {
        Ok(false) => {
            std::fs::create_dir("generated").context("Failed to create 'generated' directory")?;
            println!("Directory 'generated' created.");
        }
        Err(e) => {
            return Err(e).context("Error checking for 'generated' directory");
        }
        _ => {}
    }

    Ok(PathBuf::from(format!(
        "generated/{}-map.{}",
        now.as_millis(),
        format.extension()
    )))
}

async fn save(
    document: &HostDocument,
    container_id: &str,
    format: OutputFormat,
    path: &Path,
) -> anyhow::Result<()> {
    let contents = match format {
        OutputFormat::Svg => document
            .to_svg_string(container_id)
            .context("Nothing was rendered")?,
        OutputFormat::Html => document.to_html(),
    };

    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to save {format:?} file"))
}
