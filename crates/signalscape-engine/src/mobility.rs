//! Transmitter mobility as an explicit state transition.
//!
//! `advance` never mutates its input: it returns the next mobility state and
//! the resulting position, and the caller decides where to store them.

use std::f64::consts::TAU;

use glam::DVec3;

use signalscape_core::constants::EPSILON;
use signalscape_core::types::Mobility;

/// Result of advancing a mobility state by one time step.
#[derive(Debug, Clone, PartialEq)]
pub struct MobilityStep {
    pub mobility: Mobility,
    pub position: DVec3,
}

/// Advance `mobility` from `position` by `dt` seconds.
pub fn advance(mobility: &Mobility, position: DVec3, dt: f64) -> MobilityStep {
    let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
    match mobility {
        Mobility::Stationary => MobilityStep {
            mobility: Mobility::Stationary,
            position,
        },
        Mobility::Orbit {
            center,
            radius,
            altitude,
            angular_speed,
            phase,
        } => {
            let phase = (phase + angular_speed * dt).rem_euclid(TAU);
            MobilityStep {
                mobility: Mobility::Orbit {
                    center: *center,
                    radius: *radius,
                    altitude: *altitude,
                    angular_speed: *angular_speed,
                    phase,
                },
                position: orbit_position(*center, *radius, *altitude, phase),
            }
        }
        Mobility::Waypoints {
            points,
            speed,
            current_idx,
            progress,
        } => advance_waypoints(points, *speed, *current_idx, *progress, position, dt),
    }
}

/// Point on a horizontal orbit at `phase`.
pub fn orbit_position(center: DVec3, radius: f64, altitude: f64, phase: f64) -> DVec3 {
    DVec3::new(
        center.x + radius * phase.cos(),
        altitude,
        center.z + radius * phase.sin(),
    )
}

fn advance_waypoints(
    points: &[DVec3],
    speed: f64,
    current_idx: usize,
    progress: f64,
    position: DVec3,
    dt: f64,
) -> MobilityStep {
    let unchanged = || MobilityStep {
        mobility: Mobility::Waypoints {
            points: points.to_vec(),
            speed,
            current_idx,
            progress,
        },
        position,
    };

    let n = points.len();
    if n < 2 || !(speed.is_finite() && speed > 0.0) {
        return unchanged();
    }
    let segment_length = |i: usize| points[i].distance(points[(i + 1) % n]);
    // Only segments longer than EPSILON are walked.
    let loop_length: f64 = (0..n)
        .map(segment_length)
        .filter(|length| *length > EPSILON)
        .sum();
    if loop_length <= 0.0 {
        // Every segment is degenerate.
        return unchanged();
    }

    let mut idx = current_idx % n;
    let mut progress = if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    };
    // Whole laps leave the state unchanged, so only the remainder is walked.
    let mut remaining = (speed * dt) % loop_length;

    loop {
        let length = segment_length(idx);
        if length <= EPSILON {
            idx = (idx + 1) % n;
            progress = 0.0;
            continue;
        }
        let left_in_segment = (1.0 - progress) * length;
        if remaining < left_in_segment {
            progress += remaining / length;
            break;
        }
        remaining -= left_in_segment;
        idx = (idx + 1) % n;
        progress = 0.0;
    }

    let position = points[idx].lerp(points[(idx + 1) % n], progress);
    MobilityStep {
        mobility: Mobility::Waypoints {
            points: points.to_vec(),
            speed,
            current_idx: idx,
            progress,
        },
        position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn square_loop(side: f64, speed: f64) -> Mobility {
        Mobility::Waypoints {
            points: vec![
                DVec3::new(0.0, 5.0, 0.0),
                DVec3::new(side, 5.0, 0.0),
                DVec3::new(side, 5.0, side),
                DVec3::new(0.0, 5.0, side),
            ],
            speed,
            current_idx: 0,
            progress: 0.0,
        }
    }

    fn waypoint_state(mobility: &Mobility) -> (usize, f64) {
        match mobility {
            Mobility::Waypoints {
                current_idx,
                progress,
                ..
            } => (*current_idx, *progress),
            other => panic!("expected waypoints, got {other:?}"),
        }
    }

    #[test]
    fn test_stationary_stays_put() {
        let p = DVec3::new(3.0, 4.0, 5.0);
        let step = advance(&Mobility::Stationary, p, 10.0);
        assert_eq!(step.position, p);
        assert_eq!(step.mobility, Mobility::Stationary);
    }

    #[test]
    fn test_orbit_quarter_turn() {
        let orbit = Mobility::Orbit {
            center: DVec3::new(100.0, 0.0, -50.0),
            radius: 40.0,
            altitude: 80.0,
            angular_speed: FRAC_PI_2,
            phase: 0.0,
        };
        let step = advance(&orbit, DVec3::ZERO, 1.0);
        let expected = DVec3::new(100.0, 80.0, -10.0);
        assert!((step.position - expected).length() < 1e-9, "got {:?}", step.position);
        match step.mobility {
            Mobility::Orbit { phase, .. } => assert!((phase - FRAC_PI_2).abs() < 1e-12),
            other => panic!("expected orbit, got {other:?}"),
        }
        // The input state is left alone.
        assert!(matches!(orbit, Mobility::Orbit { phase, .. } if phase == 0.0));
    }

    #[test]
    fn test_orbit_phase_wraps() {
        let orbit = Mobility::Orbit {
            center: DVec3::ZERO,
            radius: 10.0,
            altitude: 30.0,
            angular_speed: -1.0,
            phase: 0.5,
        };
        let step = advance(&orbit, DVec3::ZERO, 2.0);
        match step.mobility {
            Mobility::Orbit { phase, .. } => {
                assert!((0.0..TAU).contains(&phase));
                assert!((phase - (TAU - 1.5)).abs() < 1e-12);
            }
            other => panic!("expected orbit, got {other:?}"),
        }
        assert!((step.position.y - 30.0).abs() < 1e-12);
        assert!((step.position.length_squared() - (100.0 + 900.0)).abs() < 1e-9);
    }

    #[test]
    fn test_waypoint_segment_completes_exactly() {
        // 128 m segments at 16 m/s in 0.5 s steps: 16 steps per segment.
        let mut mobility = square_loop(128.0, 16.0);
        let mut position = DVec3::new(0.0, 5.0, 0.0);
        for _ in 0..15 {
            let step = advance(&mobility, position, 0.5);
            mobility = step.mobility;
            position = step.position;
        }
        assert_eq!(waypoint_state(&mobility), (0, 0.9375));
        assert!((position - DVec3::new(120.0, 5.0, 0.0)).length() < 1e-9);

        let step = advance(&mobility, position, 0.5);
        assert_eq!(waypoint_state(&step.mobility), (1, 0.0));
        assert!((step.position - DVec3::new(128.0, 5.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn test_waypoints_loop_back_to_first() {
        let mobility = Mobility::Waypoints {
            points: vec![DVec3::ZERO, DVec3::new(10.0, 0.0, 0.0), DVec3::new(10.0, 0.0, 10.0)],
            speed: 1.0,
            current_idx: 2,
            progress: 0.5,
        };
        // Closing segment is sqrt(200) long; walk past its end by 3 m.
        let closing = 200f64.sqrt();
        let dt = closing * 0.5 + 3.0;
        let step = advance(&mobility, DVec3::ZERO, dt);
        let (idx, progress) = waypoint_state(&step.mobility);
        assert_eq!(idx, 0);
        assert!((progress - 0.3).abs() < 1e-9);
        assert!((step.position - DVec3::new(3.0, 0.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn test_waypoints_whole_laps() {
        let mobility = square_loop(25.0, 10.0);
        // 100 m loop, 3.5 laps.
        let step = advance(&mobility, DVec3::ZERO, 35.0);
        assert_eq!(waypoint_state(&step.mobility), (2, 0.0));
        assert!((step.position - DVec3::new(25.0, 5.0, 25.0)).length() < 1e-9);
    }

    #[test]
    fn test_coincident_waypoints_are_skipped() {
        let a = DVec3::ZERO;
        let b = DVec3::new(20.0, 0.0, 0.0);
        let mobility = Mobility::Waypoints {
            points: vec![a, a, b, b],
            speed: 5.0,
            current_idx: 0,
            progress: 0.0,
        };
        let step = advance(&mobility, a, 1.0);
        let (idx, progress) = waypoint_state(&step.mobility);
        assert_eq!(idx, 1);
        assert!((progress - 0.25).abs() < 1e-12);
        assert!((step.position - DVec3::new(5.0, 0.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_fully_degenerate_loop_stays_put() {
        let p = DVec3::new(7.0, 1.0, 7.0);
        let mobility = Mobility::Waypoints {
            points: vec![p, p, p],
            speed: 5.0,
            current_idx: 1,
            progress: 0.0,
        };
        let step = advance(&mobility, p, 3.0);
        assert_eq!(step.position, p);
        assert_eq!(step.mobility, mobility);
    }

    #[test]
    fn test_loop_of_tiny_segments_stays_put() {
        // Each side is below EPSILON but the sides add up to more.
        let side = 0.4 * EPSILON;
        let mobility = square_loop(side, 1.0);
        let p = DVec3::new(0.0, 5.0, 0.0);
        let step = advance(&mobility, p, 1.0);
        assert_eq!(step.position, p);
        assert_eq!(step.mobility, mobility);
    }

    #[test]
    fn test_two_point_route_ping_pongs() {
        // 40 m each way at 8 m/s: 5 s per segment.
        let a = DVec3::new(0.0, 2.0, 0.0);
        let b = DVec3::new(40.0, 2.0, 0.0);
        let mut mobility = Mobility::Waypoints {
            points: vec![a, b],
            speed: 8.0,
            current_idx: 0,
            progress: 0.0,
        };

        let step = advance(&mobility, a, 5.0);
        assert_eq!(waypoint_state(&step.mobility), (1, 0.0));
        assert!((step.position - b).length() < 1e-9);
        mobility = step.mobility;

        let step = advance(&mobility, b, 5.0);
        assert_eq!(waypoint_state(&step.mobility), (0, 0.0));
        assert!((step.position - a).length() < 1e-9);
        mobility = step.mobility;

        let step = advance(&mobility, a, 2.5);
        assert_eq!(waypoint_state(&step.mobility), (0, 0.5));
        assert!((step.position - DVec3::new(20.0, 2.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn test_zero_dt_and_bad_speed_do_not_move() {
        let mobility = square_loop(50.0, 10.0);
        let p = DVec3::new(1.0, 2.0, 3.0);
        assert_eq!(advance(&mobility, p, 0.0).mobility, mobility);
        assert_eq!(advance(&mobility, p, f64::NAN).mobility, mobility);

        let stalled = square_loop(50.0, -3.0);
        let step = advance(&stalled, p, 1.0);
        assert_eq!(step.position, p);
        assert_eq!(step.mobility, stalled);
    }
}
