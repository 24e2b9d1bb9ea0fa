//! Line-of-sight checks against scene geometry.
//!
//! A single nearest-hit query from the source toward the target, stopped
//! just short of the target so the surface the receiver sits on does not
//! count as an obstruction.

use glam::DVec3;

use signalscape_core::constants::LOS_END_CLEARANCE_M;

use crate::index::{cast_ray, safe_normalize, GeometryIndex, Hit};

/// The first surface between `from` and `to`, ignoring the last `end_clearance` meters.
///
/// Coincident endpoints never report an obstruction.
pub fn first_obstruction<G: GeometryIndex + ?Sized>(
    index: &G,
    from: DVec3,
    to: DVec3,
    end_clearance: f64,
) -> Option<Hit> {
    let delta = to - from;
    let dir = safe_normalize(delta)?;
    let range = delta.length() - end_clearance.max(0.0);
    if range <= 0.0 {
        return None;
    }
    cast_ray(index, from, dir, range)
}

/// Check line-of-sight between two scene points.
///
/// Returns true if no surface blocks the straight path from `from` to `to`.
pub fn has_line_of_sight<G: GeometryIndex + ?Sized>(index: &G, from: DVec3, to: DVec3) -> bool {
    first_obstruction(index, from, to, LOS_END_CLEARANCE_M).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::OpenSpace;
    use crate::mesh::TriangleIndex;
    use signalscape_core::enums::MaterialClass;

    /// Flat ground with a 40 m tall block in the middle.
    fn make_block_scene() -> TriangleIndex {
        let mut index = TriangleIndex::new();
        index.add_ground(1000.0, 0.0, MaterialClass::Terrain);
        index.add_box(
            DVec3::new(-20.0, 0.0, -20.0),
            DVec3::new(20.0, 40.0, 20.0),
            MaterialClass::ConcreteMidRise,
        );
        index.build();
        index
    }

    #[test]
    fn test_los_open_space() {
        let from = DVec3::new(0.0, 10.0, -500.0);
        let to = DVec3::new(0.0, 10.0, 500.0);
        assert!(has_line_of_sight(&OpenSpace, from, to));
    }

    #[test]
    fn test_los_blocked_by_block() {
        let index = make_block_scene();

        // Two points at 10 m on opposite sides of the block are blocked
        let from = DVec3::new(0.0, 10.0, -200.0);
        let to = DVec3::new(0.0, 10.0, 200.0);

        assert!(
            !has_line_of_sight(&index, from, to),
            "LOS should be blocked by the 40 m block"
        );
        let hit = first_obstruction(&index, from, to, LOS_END_CLEARANCE_M).unwrap();
        assert_eq!(hit.material, MaterialClass::ConcreteMidRise);
        assert!((hit.point.z + 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_los_over_block() {
        let index = make_block_scene();

        // High enough to pass over the roof
        let from = DVec3::new(0.0, 60.0, -200.0);
        let to = DVec3::new(0.0, 60.0, 200.0);

        assert!(
            has_line_of_sight(&index, from, to),
            "LOS should be clear at 60 m over a 40 m block"
        );
    }

    #[test]
    fn test_receiver_on_surface_is_not_obstructed() {
        let index = make_block_scene();

        // Receiver sits exactly on the ground plane.
        let from = DVec3::new(-300.0, 30.0, -300.0);
        let to = DVec3::new(-100.0, 0.0, -100.0);
        assert!(has_line_of_sight(&index, from, to));
    }

    #[test]
    fn test_coincident_points() {
        let index = make_block_scene();
        let p = DVec3::new(0.0, 10.0, -200.0);
        assert!(has_line_of_sight(&index, p, p));
    }
}
