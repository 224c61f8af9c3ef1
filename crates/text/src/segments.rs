use foundation::{Extent, Position, Ring, is_zero, stable_total_cmp_f64};

/// Horizontal writable span `[left, right]` on one scanline.
pub type Segment = [Position; 2];

/// Intersection of segment `a` (point `ap`, vector `av`) with segment `b`.
///
/// With `infinite` both are treated as lines; otherwise the intersection must
/// lie within both segments, end points included. Parallel or degenerate
/// inputs never intersect.
pub fn line_intersect(ap: Position, av: Position, bp: Position, bv: Position, infinite: bool) -> Option<Position> {
    let cross = av[0] * bv[1] - av[1] * bv[0];
    if is_zero(cross) {
        return None;
    }
    let dx = ap[0] - bp[0];
    let dy = ap[1] - bp[1];
    let ta = (bv[0] * dy - bv[1] * dx) / cross;
    let tb = (av[0] * dy - av[1] * dx) / cross;
    if infinite || ((0.0..=1.0).contains(&ta) && (0.0..=1.0).contains(&tb)) {
        Some([ap[0] + ta * av[0], ap[1] + ta * av[1]])
    } else {
        None
    }
}

/// Inside spans of `polygon` on the scanline `index * line_height` below the
/// top of its extent.
///
/// Returns `None` once the scanline falls below the polygon (or the polygon is
/// empty, or `line_height` is not a positive number). Rings are treated as
/// closed. An edge counts when `min_y < y <= max_y`, so a vertex shared by two
/// edges is crossed once and horizontal edges never count. Intersections are
/// sorted left to right and paired.
pub fn get_writable_segments(polygon: &[Ring], line_height: f64, index: usize) -> Option<Vec<Segment>> {
    if !(line_height > 0.0 && line_height.is_finite()) {
        return None;
    }
    let extent = Extent::from_positions(polygon.iter().flatten())?;
    let offset = index as f64 * line_height;
    if offset > extent.height() {
        return None;
    }

    let y = extent.max_y - offset;
    let ap = [extent.min_x, y];
    let av = [extent.width(), 0.0];
    let mut hits: Vec<Position> = Vec::new();

    for ring in polygon {
        let n = ring.len();
        if n < 2 {
            continue;
        }
        let edges = if ring[0] == ring[n - 1] { n - 1 } else { n };
        for k in 0..edges {
            let a = ring[k];
            let b = ring[(k + 1) % n];
            let (lo, hi) = (a[1].min(b[1]), a[1].max(b[1]));
            if !(lo < y && y <= hi) {
                continue;
            }
            if let Some(p) = line_intersect(ap, av, a, [b[0] - a[0], b[1] - a[1]], false) {
                hits.push(p);
            }
        }
    }

    hits.sort_by(|a, b| stable_total_cmp_f64(a[0], b[0]));
    Some(hits.chunks_exact(2).map(|pair| [pair[0], pair[1]]).collect())
}

#[cfg(test)]
mod tests {
    use super::{get_writable_segments, line_intersect};
    use pretty_assertions::assert_eq;

    fn square() -> Vec<Vec<[f64; 2]>> {
        vec![vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]]
    }

    #[test]
    fn square_top_scanline_spans_full_width() {
        let segments = get_writable_segments(&square(), 1.0, 0).unwrap();
        assert_eq!(segments, vec![[[0.0, 10.0], [10.0, 10.0]]]);
        assert_eq!(
            get_writable_segments(&square(), 1.0, 3).unwrap(),
            vec![[[0.0, 7.0], [10.0, 7.0]]]
        );
        assert!(get_writable_segments(&square(), 1.0, 10).is_some());
        assert_eq!(get_writable_segments(&square(), 1.0, 11), None);
    }

    #[test]
    fn convex_polygon_terminates() {
        let triangle = vec![vec![[0.0, 0.0], [8.0, 0.0], [4.0, 6.0], [0.0, 0.0]]];
        let lh = 0.7;
        let mut index = 0;
        while let Some(segments) = get_writable_segments(&triangle, lh, index) {
            assert_eq!(segments.len(), 1, "line {index}");
            index += 1;
        }
        assert!(index as f64 * lh > 6.0);
        assert_eq!(index, 9);
        assert!(!get_writable_segments(&triangle, lh, 0).unwrap().is_empty());
    }

    #[test]
    fn holes_split_the_scanline() {
        let donut = vec![
            vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]],
            vec![[4.0, 2.0], [6.0, 2.0], [6.0, 8.0], [4.0, 8.0], [4.0, 2.0]],
        ];
        let segments = get_writable_segments(&donut, 1.0, 5).unwrap();
        assert_eq!(
            segments,
            vec![[[0.0, 5.0], [4.0, 5.0]], [[6.0, 5.0], [10.0, 5.0]]]
        );
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(get_writable_segments(&[], 1.0, 0), None);
        assert_eq!(get_writable_segments(&square(), 0.0, 0), None);
        assert_eq!(get_writable_segments(&square(), f64::NAN, 0), None);
    }

    #[test]
    fn bounded_and_infinite_intersections() {
        let hit = line_intersect([0.0, 0.0], [10.0, 0.0], [5.0, -1.0], [0.0, 2.0], false);
        assert_eq!(hit, Some([5.0, 0.0]));
        assert_eq!(line_intersect([0.0, 0.0], [10.0, 0.0], [5.0, 1.0], [0.0, 2.0], false), None);
        assert_eq!(
            line_intersect([0.0, 0.0], [10.0, 0.0], [5.0, 1.0], [0.0, 2.0], true),
            Some([5.0, 0.0])
        );
        // parallel
        assert_eq!(line_intersect([0.0, 0.0], [1.0, 1.0], [0.0, 1.0], [2.0, 2.0], true), None);
    }
}
