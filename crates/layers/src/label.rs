use foundation::{Position, Ring};
use protocol::DrawEvent;
use source::Feature;
use text::Text;
use tracing::trace;

use crate::program::{Program, ProgramError, RenderContext};

/// Font size along lines when `params.fontSize` is absent, in view units.
pub const DEFAULT_LINE_FONT_SIZE: f64 = 100.0;

/// Lays `params.text` into polygons (auto-sized) and along lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct Label;

fn param_text<'f>(feature: &'f Feature) -> Result<Option<&'f str>, ProgramError> {
    match feature.params().and_then(|p| p.get("text")) {
        None => Ok(None),
        Some(v) => v.as_str().map(Some).ok_or_else(|| ProgramError::InvalidParam {
            feature: feature.id.clone(),
            key: "text".to_string(),
            expected: "a string",
        }),
    }
}

fn font_size(feature: &Feature) -> Result<f64, ProgramError> {
    match feature.params().and_then(|p| p.get("fontSize")) {
        None => Ok(DEFAULT_LINE_FONT_SIZE),
        Some(v) => v
            .as_f64()
            .filter(|fs| *fs > 0.0)
            .ok_or_else(|| ProgramError::InvalidParam {
                feature: feature.id.clone(),
                key: "fontSize".to_string(),
                expected: "a positive number",
            }),
    }
}

impl Program for Label {
    fn name(&self) -> &'static str {
        "label"
    }

    fn line_string(&self, ctx: &mut RenderContext<'_>, coordinates: Vec<Position>, feature: &Feature) -> Result<(), ProgramError> {
        let Some(s) = param_text(feature)? else {
            return Ok(());
        };
        let fs = font_size(feature)?;
        let res = ctx.text;
        let text = Text::new(s, res.font.clone(), res.hyphenator.as_ref());
        let groups = res.layout.draw_text_on_line(&ctx.transform, &coordinates, &text, fs);
        trace!(feature = %feature.id, glyphs = groups.len(), "text on line");
        for ops in groups {
            ctx.emit(DrawEvent::Instructions(ops));
        }
        Ok(())
    }

    fn polygon(&self, ctx: &mut RenderContext<'_>, coordinates: Vec<Ring>, feature: &Feature) -> Result<(), ProgramError> {
        let Some(s) = param_text(feature)? else {
            return Ok(());
        };
        let res = ctx.text;
        let text = Text::new(s, res.font.clone(), res.hyphenator.as_ref());
        let (fs, ops) = res.layout.draw_text_in_polygon_auto(&ctx.transform, &coordinates, &text);
        trace!(feature = %feature.id, font_size = fs, "text in polygon");
        if !ops.is_empty() {
            ctx.emit(DrawEvent::Instructions(ops));
        }
        Ok(())
    }
}
