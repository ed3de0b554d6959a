//! Rigid-body surface sampling.
//!
//! Boundary particles are generated on rigid surfaces as uniform lattices,
//! deduplicated through the core's [`DistanceIndex`] so that shared face
//! edges and corners, or overlapping triangles, each yield a single sample.

use space::{DistanceIndex, SpaceError};

/// Dedup radius as a fraction of the sample spacing.
const DEDUP_FRACTION: f32 = 0.5;

/// A triangle given by its three vertices.
pub type Triangle = [[f32; 3]; 3];

/// Sample all six faces of an axis-aligned box on a `spacing` lattice.
///
/// Face lattices share their edge and corner points; the distance index
/// keeps one sample per shared point. Fails with
/// [`SpaceError::InvalidParameter`] on a degenerate box or spacing.
pub fn sample_box_surface(
    min: [f32; 3],
    max: [f32; 3],
    spacing: f32,
) -> Result<Vec<[f32; 3]>, SpaceError> {
    validate_spacing(spacing)?;
    let mut index = sample_index(min, max, spacing)?;
    let radius_squared = dedup_radius_squared(spacing);

    for axis in 0..3 {
        let u = (axis + 1) % 3;
        let v = (axis + 2) % 3;
        let u_count = lattice_count(max[u] - min[u], spacing);
        let v_count = lattice_count(max[v] - min[v], spacing);
        for face in [min[axis], max[axis]] {
            for i in 0..u_count {
                for j in 0..v_count {
                    let mut p = [0.0f32; 3];
                    p[axis] = face;
                    p[u] = lattice_coord(min[u], max[u], i, u_count);
                    p[v] = lattice_coord(min[v], max[v], j, v_count);
                    index.insert_if_unique(p, radius_squared);
                }
            }
        }
    }

    let samples = index.positions();
    tracing::debug!(count = samples.len(), spacing, "sampled box surface");
    Ok(samples)
}

/// Sample triangle surfaces on a uniform barycentric lattice, deduplicated
/// across triangles so shared edges are sampled once.
pub fn sample_triangle_surface(
    triangles: &[Triangle],
    spacing: f32,
) -> Result<Vec<[f32; 3]>, SpaceError> {
    validate_spacing(spacing)?;
    let (min, max) = triangle_bounds(triangles)?;
    let mut index = sample_index(min, max, spacing)?;
    let radius_squared = dedup_radius_squared(spacing);

    for triangle in triangles {
        let [a, b, c] = *triangle;
        let ab = edge_length(a, b);
        let ac = edge_length(a, c);
        let steps = ((ab.max(ac) / spacing).ceil() as usize).max(1);
        for i in 0..=steps {
            for j in 0..=(steps - i) {
                let s = i as f32 / steps as f32;
                let t = j as f32 / steps as f32;
                let r = 1.0 - s - t;
                let p = [
                    r * a[0] + s * b[0] + t * c[0],
                    r * a[1] + s * b[1] + t * c[1],
                    r * a[2] + s * b[2] + t * c[2],
                ];
                index.insert_if_unique(p, radius_squared);
            }
        }
    }

    let samples = index.positions();
    tracing::debug!(
        triangles = triangles.len(),
        count = samples.len(),
        spacing,
        "sampled triangle surface"
    );
    Ok(samples)
}

fn dedup_radius_squared(spacing: f32) -> f32 {
    let radius = spacing * DEDUP_FRACTION;
    radius * radius
}

fn validate_spacing(spacing: f32) -> Result<(), SpaceError> {
    if !spacing.is_finite() || spacing <= 0.0 {
        return Err(SpaceError::InvalidParameter(format!(
            "sample spacing {spacing} is not a strictly positive finite value"
        )));
    }
    Ok(())
}

/// Distance index sized to the sampled geometry, padded by one cell so the
/// surface itself never sits on the index boundary.
fn sample_index(
    min: [f32; 3],
    max: [f32; 3],
    spacing: f32,
) -> Result<DistanceIndex, SpaceError> {
    let pad = spacing.max(1.0e-3);
    let lo = [min[0] - pad, min[1] - pad, min[2] - pad];
    let hi = [max[0] + pad, max[1] + pad, max[2] + pad];
    DistanceIndex::new(hi, lo, spacing.max(1.0e-3))
}

fn lattice_count(extent: f32, spacing: f32) -> usize {
    ((extent / spacing).round() as usize).max(1) + 1
}

fn lattice_coord(lo: f32, hi: f32, step: usize, count: usize) -> f32 {
    if count <= 1 {
        return lo;
    }
    lo + (hi - lo) * step as f32 / (count - 1) as f32
}

fn edge_length(a: [f32; 3], b: [f32; 3]) -> f32 {
    (0..3).map(|i| (a[i] - b[i]) * (a[i] - b[i])).sum::<f32>().sqrt()
}

fn triangle_bounds(triangles: &[Triangle]) -> Result<([f32; 3], [f32; 3]), SpaceError> {
    if triangles.is_empty() {
        return Err(SpaceError::InvalidParameter(
            "cannot sample an empty triangle list".to_owned(),
        ));
    }
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for triangle in triangles {
        for vertex in triangle {
            for axis in 0..3 {
                min[axis] = min[axis].min(vertex[axis]);
                max[axis] = max[axis].max(vertex[axis]);
            }
        }
    }
    Ok((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn min_pair_distance(samples: &[[f32; 3]]) -> f32 {
        let mut best = f32::INFINITY;
        for (i, a) in samples.iter().enumerate() {
            for b in &samples[i + 1..] {
                best = best.min(edge_length(*a, *b));
            }
        }
        best
    }

    #[test]
    fn unit_cube_faces_share_edges_and_corners() {
        let samples = sample_box_surface([0.0; 3], [1.0; 3], 0.25).unwrap();
        // 5x5 lattice per face: 6*25 raw points, minus shared edges (12
        // edges x 5) and over-subtracted corners (8, re-added twice each).
        assert_eq!(samples.len(), 98);
        assert!(min_pair_distance(&samples) >= 0.25 * DEDUP_FRACTION);
    }

    #[test]
    fn resampling_does_not_grow_the_set() {
        let first = sample_box_surface([0.0; 3], [1.0; 3], 0.25).unwrap();
        let second = sample_box_surface([0.0; 3], [1.0; 3], 0.25).unwrap();
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn triangle_pair_shares_its_diagonal() {
        // Two triangles forming the unit square in the z=0 plane.
        let triangles = [
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [[1.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        ];
        let samples = sample_triangle_surface(&triangles, 0.25).unwrap();
        assert!(!samples.is_empty());
        assert!(min_pair_distance(&samples) >= 0.25 * DEDUP_FRACTION);
        // All samples stay in the square's plane.
        assert!(samples.iter().all(|p| p[2] == 0.0));
    }

    #[test]
    fn empty_triangle_list_is_rejected() {
        assert!(sample_triangle_surface(&[], 0.25).is_err());
    }

    #[test]
    fn bad_spacing_is_rejected() {
        assert!(sample_box_surface([0.0; 3], [1.0; 3], 0.0).is_err());
        assert!(sample_box_surface([0.0; 3], [1.0; 3], f32::NAN).is_err());
        assert!(sample_triangle_surface(
            &[[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]],
            -1.0
        )
        .is_err());
    }
}
