//! Helpers behind the `mapper` binary: load a layer, render it once onto a
//! recording surface, dump the operations.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use foundation::{Extent, Projection};
use layers::{LayerConfig, TextResources};
use painter::{PixelRect, RecordingSurface, SurfaceOp, View};
use runtime::{ChannelError, Metrics, RenderEvent, Renderer, RendererConfig};
use source::{CollectionError, FeatureCollection, SpatialSource};
use text::{BoxFont, Font, FontError, Hyphenator, NoHyphenation, PatternHyphenator, TextLayout, TtfFont};
use tracing::{info, warn};

#[derive(Debug)]
pub enum MapperError {
    Io { path: PathBuf, source: std::io::Error },
    Collection(CollectionError),
    Layer(serde_json::Error),
    Font(FontError),
    Extent(String),
    Channel(ChannelError),
    Output(std::io::Error),
}

impl std::fmt::Display for MapperError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapperError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            MapperError::Collection(e) => write!(f, "features: {e}"),
            MapperError::Layer(e) => write!(f, "layer config: {e}"),
            MapperError::Font(e) => write!(f, "font: {e}"),
            MapperError::Extent(msg) => write!(f, "extent: {msg}"),
            MapperError::Channel(e) => write!(f, "render: {e}"),
            MapperError::Output(e) => write!(f, "output: {e}"),
        }
    }
}

impl std::error::Error for MapperError {}

impl From<ChannelError> for MapperError {
    fn from(e: ChannelError) -> Self {
        MapperError::Channel(e)
    }
}

fn read(path: &Path) -> Result<String, MapperError> {
    std::fs::read_to_string(path).map_err(|source| MapperError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// `minX,minY,maxX,maxY`.
pub fn parse_extent(s: &str) -> Result<Extent, MapperError> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| MapperError::Extent(format!("{s:?}: {e}")))?;
    let &[min_x, min_y, max_x, max_y] = parts.as_slice() else {
        return Err(MapperError::Extent(format!("{s:?}: expected four numbers")));
    };
    let mut extent = Extent::new(min_x, min_y, max_x, max_y);
    extent.normalize();
    Ok(extent)
}

pub fn load_source(path: &Path) -> Result<SpatialSource, MapperError> {
    let collection = FeatureCollection::from_geojson_str(&read(path)?).map_err(MapperError::Collection)?;
    Ok(SpatialSource::from_features(collection.features))
}

pub fn load_layer(path: Option<&Path>) -> Result<LayerConfig, MapperError> {
    match path {
        Some(path) => LayerConfig::from_json_str(&read(path)?).map_err(MapperError::Layer),
        None => Ok(LayerConfig::default()),
    }
}

/// The box font stands in when no font file is given.
pub fn load_text(font: Option<&Path>, patterns: Option<&Path>, layer: &LayerConfig) -> Result<TextResources, MapperError> {
    let font: Arc<dyn Font> = match font {
        Some(path) => Arc::new(TtfFont::from_file(path).map_err(MapperError::Font)?),
        None => Arc::new(BoxFont),
    };
    let hyphenator: Arc<dyn Hyphenator> = match patterns {
        Some(path) => Arc::new(PatternHyphenator::from_pattern_text(&read(path)?)),
        None => Arc::new(NoHyphenation),
    };
    Ok(TextResources::new(font, hyphenator, TextLayout::new(layer.autosize)))
}

/// Bounding box of the source in the layer projection, or the unit square
/// for an empty source.
pub fn source_extent(source: &SpatialSource, projection: &dyn Projection) -> Extent {
    match source.extent() {
        Some(e) => {
            let bl = projection.forward(e.bottom_left());
            let tr = projection.forward(e.top_right());
            let mut out = Extent::new(bl[0], bl[1], tr[0], tr[1]);
            out.normalize();
            out
        }
        None => Extent::new(0.0, 0.0, 1.0, 1.0),
    }
}

#[derive(Debug)]
pub struct RenderJob {
    pub source: SpatialSource,
    pub layer: LayerConfig,
    pub text: TextResources,
    pub rect: PixelRect,
    /// Defaults to the source extent.
    pub extent: Option<Extent>,
}

#[derive(Debug)]
pub struct RenderOutput {
    pub ops: Vec<SurfaceOp>,
    pub outcome: Option<RenderEvent>,
    pub metrics: Metrics,
}

/// Start a renderer, wait for the unit's data, render one frame and stop.
pub async fn render_once(job: RenderJob) -> Result<RenderOutput, MapperError> {
    let extent = job
        .extent
        .unwrap_or_else(|| source_extent(&job.source, &job.layer.projection));
    let view = View::new(job.rect, extent);
    let mut renderer = Renderer::new(
        RendererConfig::default(),
        job.layer,
        job.source,
        view,
        RecordingSurface::new(),
        Arc::new(job.text),
    );
    renderer.start()?;
    let outcome = renderer.render_frame().await?;
    match &outcome {
        Some(RenderEvent::Failed { payload, .. }) => warn!(%payload, "render failed"),
        Some(_) => info!(ops = renderer.surface().ops().len(), "render complete"),
        None => info!("layer hidden"),
    }
    renderer.stop();
    let metrics = renderer.metrics().clone();
    let ops = renderer.surface_mut().take_ops();
    Ok(RenderOutput { ops, outcome, metrics })
}

/// One JSON value per line.
pub fn write_ops(out: &mut impl Write, ops: &[SurfaceOp]) -> Result<(), MapperError> {
    for op in ops {
        let line = serde_json::to_string(op).map_err(|e| MapperError::Output(e.into()))?;
        writeln!(out, "{line}").map_err(MapperError::Output)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{MapperError, RenderJob, load_layer, parse_extent, render_once, source_extent, write_ops};
    use foundation::{Extent, Geometry, ProjectionKind};
    use layers::{LayerConfig, TextResources};
    use painter::{PixelRect, SurfaceOp};
    use pretty_assertions::assert_eq;
    use runtime::RenderEvent;
    use source::{Feature, SpatialSource};

    #[test]
    fn parses_extents() {
        assert_eq!(parse_extent("0, 1,10,5").unwrap(), Extent::new(0.0, 1.0, 10.0, 5.0));
        assert_eq!(parse_extent("10,5,0,1").unwrap(), Extent::new(0.0, 1.0, 10.0, 5.0));
        assert!(matches!(parse_extent("1,2,3"), Err(MapperError::Extent(_))));
        assert!(matches!(parse_extent("a,b,c,d"), Err(MapperError::Extent(_))));
    }

    #[test]
    fn missing_layer_file_uses_defaults() {
        assert_eq!(load_layer(None).unwrap(), LayerConfig::default());
    }

    #[test]
    fn source_extent_is_projected() {
        let src = SpatialSource::from_features(vec![Feature::new("a", Geometry::Point([180.0, 0.0]))]);
        let e = source_extent(&src, &ProjectionKind::WebMercator);
        assert!((e.max_x - 20_037_508.342_789_244).abs() < 1e-6);
        assert_eq!(source_extent(&SpatialSource::new(), &ProjectionKind::Identity), Extent::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn ops_are_written_as_json_lines() {
        let mut out = Vec::new();
        write_ops(&mut out, &[SurfaceOp::Clear, SurfaceOp::Clear]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\"clear\"\n\"clear\"\n");
    }

    #[tokio::test]
    async fn renders_a_source_once() {
        let square = Feature::new(
            "a",
            Geometry::Polygon(vec![vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]]]),
        );
        let output = render_once(RenderJob {
            source: SpatialSource::from_features(vec![square]),
            layer: LayerConfig::default(),
            text: TextResources::default(),
            rect: PixelRect::new(40.0, 40.0),
            extent: None,
        })
        .await
        .unwrap();
        assert!(matches!(output.outcome, Some(RenderEvent::Completed(_))));
        assert_eq!(output.ops.first(), Some(&SurfaceOp::Clear));
        assert_eq!(output.metrics.counter("render.completed"), 1);
    }
}
