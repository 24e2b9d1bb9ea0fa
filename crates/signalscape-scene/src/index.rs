//! The nearest-hit query interface between the engine and the scene layer.
//!
//! The scene layer owns and rebuilds the index; the engine only issues
//! read-only queries. A failed query is never fatal to the engine: see
//! [`cast_ray`].

use glam::DVec3;
use thiserror::Error;

use signalscape_core::constants::EPSILON;
use signalscape_core::enums::MaterialClass;

/// Closest intersection of a ray with the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub point: DVec3,
    /// Distance from the ray origin (meters).
    pub distance: f64,
    /// Unit surface normal, facing the incoming ray.
    pub normal: DVec3,
    pub material: MaterialClass,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Triangles were added since the last build.
    #[error("Geometry index has not been built")]
    NotBuilt,

    /// Zero-length or non-finite ray direction.
    #[error("Degenerate ray direction {0:?}")]
    DegenerateRay(DVec3),
}

/// Read-only nearest-hit queries over scene surfaces.
pub trait GeometryIndex {
    /// Closest surface hit along `direction` from `origin` within `max_distance`.
    ///
    /// `direction` need not be normalized.
    fn nearest_hit(
        &self,
        origin: DVec3,
        direction: DVec3,
        max_distance: f64,
    ) -> Result<Option<Hit>, GeometryError>;
}

impl<T: GeometryIndex + ?Sized> GeometryIndex for &T {
    fn nearest_hit(
        &self,
        origin: DVec3,
        direction: DVec3,
        max_distance: f64,
    ) -> Result<Option<Hit>, GeometryError> {
        (**self).nearest_hit(origin, direction, max_distance)
    }
}

impl<T: GeometryIndex + ?Sized> GeometryIndex for std::sync::Arc<T> {
    fn nearest_hit(
        &self,
        origin: DVec3,
        direction: DVec3,
        max_distance: f64,
    ) -> Result<Option<Hit>, GeometryError> {
        (**self).nearest_hit(origin, direction, max_distance)
    }
}

/// Empty scene: every query misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSpace;

impl GeometryIndex for OpenSpace {
    fn nearest_hit(
        &self,
        _origin: DVec3,
        _direction: DVec3,
        _max_distance: f64,
    ) -> Result<Option<Hit>, GeometryError> {
        Ok(None)
    }
}

/// Query the index, treating any failure as open space.
pub fn cast_ray<G: GeometryIndex + ?Sized>(
    index: &G,
    origin: DVec3,
    direction: DVec3,
    max_distance: f64,
) -> Option<Hit> {
    if max_distance.is_nan() || max_distance <= 0.0 {
        return None;
    }
    match index.nearest_hit(origin, direction, max_distance) {
        Ok(hit) => hit,
        Err(err) => {
            tracing::debug!(%err, "geometry query failed, treating as open space");
            None
        }
    }
}

/// Normalize `v`, or `None` if it is too short or not finite.
pub fn safe_normalize(v: DVec3) -> Option<DVec3> {
    let len = v.length();
    if len.is_finite() && len > EPSILON {
        Some(v / len)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unbuilt;

    impl GeometryIndex for Unbuilt {
        fn nearest_hit(
            &self,
            _origin: DVec3,
            _direction: DVec3,
            _max_distance: f64,
        ) -> Result<Option<Hit>, GeometryError> {
            Err(GeometryError::NotBuilt)
        }
    }

    #[test]
    fn test_open_space_never_hits() {
        let hit = cast_ray(&OpenSpace, DVec3::ZERO, DVec3::X, 1000.0);
        assert!(hit.is_none());
    }

    #[test]
    fn test_query_failure_degrades_to_miss() {
        assert!(cast_ray(&Unbuilt, DVec3::ZERO, DVec3::X, 1000.0).is_none());
    }

    #[test]
    fn test_non_positive_range_skips_query() {
        assert!(cast_ray(&Unbuilt, DVec3::ZERO, DVec3::X, 0.0).is_none());
        assert!(cast_ray(&Unbuilt, DVec3::ZERO, DVec3::X, -3.0).is_none());
        assert!(cast_ray(&Unbuilt, DVec3::ZERO, DVec3::X, f64::NAN).is_none());
    }

    #[test]
    fn test_safe_normalize() {
        assert_eq!(safe_normalize(DVec3::new(0.0, 3.0, 0.0)), Some(DVec3::Y));
        assert_eq!(safe_normalize(DVec3::ZERO), None);
        assert_eq!(safe_normalize(DVec3::new(f64::NAN, 0.0, 0.0)), None);
    }
}
