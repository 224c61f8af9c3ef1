use protocol::{DrawEvent, PathOp};
use serde_json::{Map, Value, json};
use source::Feature;

use crate::program::RenderContext;

/// Follow a dotted path (`style.lineWidth`) through nested objects.
pub fn path_key<'a>(props: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut cur = props.get(parts.next()?)?;
    for part in parts {
        cur = cur.as_object()?.get(part)?;
    }
    Some(cur)
}

/// Like [`path_key`], but a string value `"@other.path"` is resolved once
/// more against the same properties.
pub fn get_property<'a>(props: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let val = path_key(props, path)?;
    match val.as_str() {
        Some(s) if s.len() > 1 && s.starts_with('@') => path_key(props, &s[1..]),
        _ => Some(val),
    }
}

fn is_set(val: &Value) -> bool {
    match val {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0 && !x.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Emit `save` and one `set` per style entry of `feature`.
///
/// Numbers are in view units and get multiplied by the transform's x scale;
/// `dashLine` pairs likewise. Unset, `false`, zero and empty values are
/// skipped.
pub fn process_style(feature: &Feature, ctx: &mut RenderContext<'_>) {
    ctx.emit(DrawEvent::Context(PathOp::Save));
    let Some(style) = feature.style() else {
        return;
    };
    let scale = ctx.transform.get_scale()[0];
    for key in style.keys() {
        let Some(val) = get_property(&feature.properties, &format!("style.{key}")) else {
            continue;
        };
        if !is_set(val) {
            continue;
        }
        let out = if let Some(n) = val.as_f64() {
            json!(n * scale)
        } else if key == "dashLine" {
            match dash_pair(val) {
                Some([on, off]) => json!([on * scale, off * scale]),
                None => val.clone(),
            }
        } else {
            val.clone()
        };
        ctx.emit(DrawEvent::set(key.clone(), out));
    }
}

fn dash_pair(val: &Value) -> Option<[f64; 2]> {
    let arr = val.as_array()?;
    Some([arr.first()?.as_f64()?, arr.get(1)?.as_f64()?])
}

#[cfg(test)]
mod tests {
    use super::{get_property, path_key, process_style};
    use crate::program::{RenderContext, TextResources};
    use foundation::{Geometry, ProjectionKind, Transform};
    use pretty_assertions::assert_eq;
    use protocol::{DrawEvent, PathOp};
    use serde_json::{Map, Value, json};
    use source::Feature;

    fn props(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn path_key_walks_nested_objects() {
        let p = props(json!({"style": {"stroke": {"width": 3}}, "name": "x"}));
        assert_eq!(path_key(&p, "style.stroke.width"), Some(&json!(3)));
        assert_eq!(path_key(&p, "name"), Some(&json!("x")));
        assert_eq!(path_key(&p, "name.inner"), None);
        assert_eq!(path_key(&p, "missing"), None);
    }

    #[test]
    fn at_prefix_redirects_once() {
        let p = props(json!({
            "style": {"fillStyle": "@params.color", "strokeStyle": "@"},
            "params": {"color": "@style.fillStyle"},
        }));
        assert_eq!(get_property(&p, "style.fillStyle"), Some(&json!("@style.fillStyle")));
        assert_eq!(get_property(&p, "style.strokeStyle"), Some(&json!("@")));
    }

    #[test]
    fn style_entries_become_scaled_sets() {
        let res = TextResources::default();
        let mut t = Transform::new();
        t.scale(2.0, -2.0, None);
        let mut ctx = RenderContext::new(t, ProjectionKind::Identity, &res);
        let f = Feature::new("a", Geometry::Point([0.0, 0.0])).with_property(
            "style",
            json!({
                "dashLine": [1, 3],
                "fillStyle": "@params.color",
                "hidden": false,
                "lineWidth": 1.5,
                "strokeStyle": "",
            }),
        )
        .with_property("params", json!({"color": "red"}));

        process_style(&f, &mut ctx);
        assert_eq!(
            ctx.events(),
            &[
                DrawEvent::Context(PathOp::Save),
                DrawEvent::set("dashLine", json!([2.0, 6.0])),
                DrawEvent::set("fillStyle", "red"),
                DrawEvent::set("lineWidth", 3.0),
            ]
        );
    }

    #[test]
    fn no_style_still_saves() {
        let res = TextResources::default();
        let mut ctx = RenderContext::new(Transform::new(), ProjectionKind::Identity, &res);
        process_style(&Feature::new("a", Geometry::Point([0.0, 0.0])), &mut ctx);
        assert_eq!(ctx.events(), &[DrawEvent::Context(PathOp::Save)]);
    }
}
