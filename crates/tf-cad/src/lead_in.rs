//! Lead-in edge detection
//!
//! The lead-in edge of a cylinder is the circular boundary edge furthest
//! along `+axis` from the cylinder origin. Which end the user perceives as
//! "top" does not matter; only the surface axis does.

use glam::DVec3;

use crate::error::ValidationError;
use crate::kernel::{Cylinder, EdgeInfo, FaceId};

/// Signed distance of `point` along the cylinder axis, measured from its origin
pub fn axial_height(cylinder: &Cylinder, point: DVec3) -> f64 {
    (point - cylinder.origin).dot(cylinder.axis)
}

/// Circular edges with their axial heights, in input order
pub fn rank_circular_edges<'a>(
    cylinder: &Cylinder,
    edges: &'a [EdgeInfo],
) -> Vec<(&'a EdgeInfo, f64)> {
    edges
        .iter()
        .filter_map(|e| {
            e.curve
                .circle_center()
                .map(|center| (e, axial_height(cylinder, center)))
        })
        .collect()
}

/// Pick the circular edge with the greatest axial height
///
/// Ties keep the first edge in input order. Edge order is defined by the
/// host document, so tie resolution is not stable across documents.
pub fn select_lead_in_edge<'a>(
    face: FaceId,
    cylinder: &Cylinder,
    edges: &'a [EdgeInfo],
) -> Result<&'a EdgeInfo, ValidationError> {
    let mut best: Option<(&EdgeInfo, f64)> = None;

    for (edge, height) in rank_circular_edges(cylinder, edges) {
        if best.is_none_or(|(_, h)| height > h) {
            best = Some((edge, height));
        }
    }

    let (edge, height) = best.ok_or(ValidationError::NoLeadInEdge(face))?;
    tracing::debug!("Lead-in edge {} at axial height {:.4}", edge.id, height);
    Ok(edge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{Curve, EdgeId};
    use approx::assert_relative_eq;

    fn edge(face: FaceId, curve: Curve) -> EdgeInfo {
        EdgeInfo {
            id: EdgeId::new(),
            face,
            curve,
        }
    }

    #[test]
    fn test_selects_positive_end() {
        let face = FaceId::new();
        let cyl = Cylinder::new(DVec3::Z, DVec3::ZERO, 5.0);
        let edges = vec![
            edge(face, Curve::circle(DVec3::new(0.0, 0.0, 5.0), 5.0)),
            edge(face, Curve::circle(DVec3::new(0.0, 0.0, -5.0), 5.0)),
        ];

        let top = select_lead_in_edge(face, &cyl, &edges).unwrap();
        assert_eq!(top.id, edges[0].id);

        // Order of enumeration does not matter
        let reversed: Vec<EdgeInfo> = edges.iter().rev().copied().collect();
        let top = select_lead_in_edge(face, &cyl, &reversed).unwrap();
        assert_eq!(top.id, edges[0].id);
    }

    #[test]
    fn test_follows_axis_direction() {
        let face = FaceId::new();
        // Axis pointing down: the lower circle is the lead-in
        let cyl = Cylinder::new(DVec3::NEG_Z, DVec3::new(0.0, 0.0, 10.0), 4.0);
        let high = edge(face, Curve::circle(DVec3::new(0.0, 0.0, 10.0), 4.0));
        let low = edge(face, Curve::circle(DVec3::ZERO, 4.0));
        let edges = [high, low];

        let top = select_lead_in_edge(face, &cyl, &edges).unwrap();
        assert_eq!(top.id, low.id);
    }

    #[test]
    fn test_ignores_non_circular_edges() {
        let face = FaceId::new();
        let cyl = Cylinder::new(DVec3::Z, DVec3::ZERO, 5.0);
        let edges = vec![
            edge(face, Curve::Other),
            edge(face, Curve::circle(DVec3::new(0.0, 0.0, 2.0), 5.0)),
        ];

        let top = select_lead_in_edge(face, &cyl, &edges).unwrap();
        assert_eq!(top.id, edges[1].id);
    }

    #[test]
    fn test_rank_keeps_input_order() {
        let face = FaceId::new();
        let cyl = Cylinder::new(DVec3::Z, DVec3::new(0.0, 0.0, 1.0), 5.0);
        let edges = vec![
            edge(face, Curve::circle(DVec3::new(0.0, 0.0, -3.0), 5.0)),
            edge(face, Curve::Other),
            edge(face, Curve::circle(DVec3::new(0.0, 0.0, 6.0), 5.0)),
        ];

        let ranked = rank_circular_edges(&cyl, &edges);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].0.id, edges[0].id);
        assert_relative_eq!(ranked[0].1, -4.0);
        assert_eq!(ranked[1].0.id, edges[2].id);
        assert_relative_eq!(ranked[1].1, 5.0);
    }

    #[test]
    fn test_no_circular_edges() {
        let face = FaceId::new();
        let cyl = Cylinder::new(DVec3::Z, DVec3::ZERO, 5.0);
        let edges = vec![edge(face, Curve::Other)];

        assert_eq!(
            select_lead_in_edge(face, &cyl, &edges).unwrap_err(),
            ValidationError::NoLeadInEdge(face)
        );
        assert!(select_lead_in_edge(face, &cyl, &[]).is_err());
    }

    #[test]
    fn test_tie_keeps_first() {
        let face = FaceId::new();
        let cyl = Cylinder::new(DVec3::X, DVec3::ZERO, 5.0);
        // Same axial height, offset sideways
        let a = edge(face, Curve::circle(DVec3::new(3.0, 1.0, 0.0), 5.0));
        let b = edge(face, Curve::circle(DVec3::new(3.0, -1.0, 0.0), 5.0));
        let edges = [a, b];

        assert_eq!(select_lead_in_edge(face, &cyl, &edges).unwrap().id, a.id);
    }

    #[test]
    fn test_axial_height_offset_origin() {
        let cyl = Cylinder::new(DVec3::new(0.0, 2.0, 0.0), DVec3::new(1.0, 1.0, 1.0), 1.0);
        assert_relative_eq!(axial_height(&cyl, DVec3::new(1.0, 4.5, 1.0)), 3.5);
    }
}
