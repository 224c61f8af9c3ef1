use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use painter::PixelRect;
use tools::{RenderJob, load_layer, load_source, load_text, parse_extent, render_once, write_ops};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Render one GeoJSON layer and dump the drawing operations as JSON lines")]
struct Args {
    /// GeoJSON FeatureCollection, Feature or array of features
    data: PathBuf,

    /// Layer configuration (JSON)
    #[arg(long)]
    layer: Option<PathBuf>,

    /// TrueType/OpenType font used by the label program
    #[arg(long)]
    font: Option<PathBuf>,

    /// Hyphenation patterns, whitespace separated (TeX pattern files)
    #[arg(long)]
    patterns: Option<PathBuf>,

    /// Surface width in pixels
    #[arg(long, env = "MAPPER_WIDTH", default_value_t = 800.0)]
    width: f64,

    /// Surface height in pixels
    #[arg(long, env = "MAPPER_HEIGHT", default_value_t = 600.0)]
    height: f64,

    /// View extent minX,minY,maxX,maxY in the layer projection (default: data extent)
    #[arg(long)]
    extent: Option<String>,

    /// Print the metrics snapshot when done
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let source = load_source(&args.data)?;
    let layer = load_layer(args.layer.as_deref())?;
    let text = load_text(args.font.as_deref(), args.patterns.as_deref(), &layer)?;
    let extent = args.extent.as_deref().map(parse_extent).transpose()?;
    info!(features = source.len(), layer = %layer.id, "loaded");

    let output = render_once(RenderJob {
        source,
        layer,
        text,
        rect: PixelRect::new(args.width, args.height),
        extent,
    })
    .await?;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_ops(&mut out, &output.ops)?;
    out.flush()?;

    if args.metrics {
        let snapshot = output.metrics.snapshot();
        for (name, value) in snapshot.counters {
            eprintln!("{name} {value}");
        }
        for (name, h) in snapshot.histograms {
            eprintln!("{name} count={} sum={} min={} max={}", h.count, h.sum, h.min, h.max);
        }
    }
    Ok(())
}
