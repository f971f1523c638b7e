use anyhow::{bail, Context};
use clap::Parser;
use slidepress::{
    size_by_id, DirArchiver, ExportConfig, ExportPipeline, StaticSurface, TilePolicy,
    SIZE_CATALOG,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Carve HTML slide markup into fixed-size carousel image tiles
#[derive(Parser, Debug)]
#[command(name = "slidepress", version, about)]
struct Args {
    /// Path to the markup file to render
    #[arg(long)]
    input: PathBuf,

    /// Directory the archive folder is written under
    #[arg(long, default_value = "out")]
    out: PathBuf,

    /// Output size: one of the catalog ids or aspect labels (3:4, 9:16, 1:1)
    #[arg(long, default_value = "3:4")]
    size: String,

    /// Partitioning policy
    #[arg(long, default_value = "fit", value_parser = parse_policy)]
    policy: TilePolicy,

    /// Marker class identifying exportable containers
    #[arg(long)]
    marker: Option<String>,

    /// Base URL for resolving linked stylesheet hrefs
    #[arg(long)]
    base_url: Option<url::Url>,

    /// Print a JSON manifest of the produced files
    #[arg(long)]
    manifest: bool,
}

fn parse_policy(value: &str) -> Result<TilePolicy, String> {
    match value {
        "fit" | "fit-center" => Ok(TilePolicy::FitCenter),
        "grid" => Ok(TilePolicy::Grid),
        other => Err(format!("unknown policy `{other}` (expected fit or grid)")),
    }
}

#[derive(serde::Serialize)]
struct Manifest {
    archive_dir: String,
    size: slidepress::OutputSize,
    policy: TilePolicy,
    files: Vec<ManifestEntry>,
}

#[derive(serde::Serialize)]
struct ManifestEntry {
    name: String,
    width: u32,
    height: u32,
    bytes: usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let size = match args.size.parse::<u32>() {
        Ok(id) => size_by_id(id),
        Err(_) => SIZE_CATALOG
            .iter()
            .copied()
            .find(|s| s.aspect == args.size || s.label == args.size),
    };
    let Some(size) = size else {
        bail!(
            "unknown size `{}`; expected one of {}",
            args.size,
            SIZE_CATALOG
                .iter()
                .map(|s| s.aspect)
                .collect::<Vec<_>>()
                .join(", ")
        );
    };

    let markup = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    let mut surface = StaticSurface::new();
    if let Some(base) = args.base_url {
        surface = surface.with_base_url(base);
    }
    surface.load(&markup).context("loading markup")?;

    let mut config = ExportConfig::default();
    if let Some(marker) = args.marker {
        config.marker_class = marker;
    }
    let prefix = config.archive_prefix.clone();

    let pipeline = ExportPipeline::new(Arc::new(surface), config)
        .with_archiver(Box::new(DirArchiver::new(&args.out)));

    let runtime = tokio::runtime::Runtime::new().context("starting runtime")?;
    let images = runtime
        .block_on(pipeline.export(size, args.policy))
        .context("export failed")?;

    // DirArchiver wrote a timestamped folder; report what landed there
    let archive_dir = newest_archive_dir(&args.out, &prefix)
        .unwrap_or_else(|| args.out.display().to_string());

    if args.manifest {
        let manifest = Manifest {
            archive_dir: archive_dir.clone(),
            size,
            policy: args.policy,
            files: images
                .iter()
                .map(|image| ManifestEntry {
                    name: image.filename(),
                    width: image.width,
                    height: image.height,
                    bytes: image.png.len(),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&manifest)?);
    } else {
        println!(
            "exported {} images ({}x{}, {} policy) under {}",
            images.len(),
            size.width,
            size.height,
            args.policy,
            archive_dir
        );
    }

    Ok(())
}

/// Most recently created archive folder matching the prefix
fn newest_archive_dir(root: &PathBuf, prefix: &str) -> Option<String> {
    let entries = std::fs::read_dir(root).ok()?;
    entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(prefix))
        .filter_map(|e| {
            let modified = e.metadata().ok()?.modified().ok()?;
            Some((modified, e.path()))
        })
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, path)| path.display().to_string())
}
