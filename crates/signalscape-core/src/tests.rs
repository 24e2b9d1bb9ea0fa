#[cfg(test)]
mod tests {
    use glam::DVec3;

    use crate::commands::{CameraCommand, SessionCommand};
    use crate::config::{ConfigError, EngineConfig};
    use crate::constants::*;
    use crate::enums::*;
    use crate::events::SessionEvent;
    use crate::state::*;
    use crate::types::{Mobility, SimTime, Transmitter};

    fn sample_transmitter() -> Transmitter {
        Transmitter {
            id: 7,
            position: DVec3::new(10.0, 30.0, -5.0),
            power_dbm: DEFAULT_TX_POWER_DBM,
            frequency_mhz: DEFAULT_TX_FREQUENCY_MHZ,
            color: TRANSMITTER_PALETTE[0],
            mobility: Mobility::Waypoints {
                points: vec![DVec3::ZERO, DVec3::new(100.0, 0.0, 0.0)],
                speed: 5.0,
                current_idx: 1,
                progress: 0.25,
            },
        }
    }

    #[test]
    fn test_material_class_serde() {
        let variants = vec![
            MaterialClass::Water,
            MaterialClass::Terrain,
            MaterialClass::Glass,
            MaterialClass::ConcreteLowRise,
            MaterialClass::ConcreteMidRise,
            MaterialClass::EmissiveHighRise,
            MaterialClass::Metal,
        ];
        for v in variants {
            let json = serde_json::to_string(&v).unwrap();
            let back: MaterialClass = serde_json::from_str(&json).unwrap();
            assert_eq!(v, back);
        }
    }

    #[test]
    fn test_hop_material_labels() {
        assert_eq!(HopMaterial::LineOfSight.label(), "line-of-sight");
        assert_eq!(HopMaterial::Surface(MaterialClass::Glass).label(), "glass");

        let json = serde_json::to_string(&HopMaterial::Surface(MaterialClass::Water)).unwrap();
        assert_eq!(json, r#"{"kind":"Surface","material":"Water"}"#);
        let back: HopMaterial = serde_json::from_str(&json).unwrap();
        assert_eq!(back, HopMaterial::Surface(MaterialClass::Water));
    }

    #[test]
    fn test_quality_tier_ordering() {
        assert!(QualityTier::Excellent > QualityTier::Good);
        assert!(QualityTier::Good > QualityTier::Fair);
        assert!(QualityTier::Fair > QualityTier::Poor);
        assert!(QualityTier::Poor > QualityTier::Dead);
        assert_eq!(QualityTier::default(), QualityTier::Dead);
    }

    #[test]
    fn test_transmitter_serde_round_trip() {
        let tx = sample_transmitter();
        let json = serde_json::to_string(&tx).unwrap();
        assert!(json.contains(r#""mode":"Waypoints""#));
        let back: Transmitter = serde_json::from_str(&json).unwrap();
        assert_eq!(tx, back);
    }

    #[test]
    fn test_transmitter_mobility_defaults_to_stationary() {
        let json = r#"{"id":1,"position":[0.0,10.0,0.0],"power_dbm":30.0,"frequency_mhz":900.0,"color":[1,2,3]}"#;
        let tx: Transmitter = serde_json::from_str(json).unwrap();
        assert_eq!(tx.mobility, Mobility::Stationary);
        assert!(!tx.mobility.is_mobile());
    }

    #[test]
    fn test_mobility_is_mobile() {
        let orbit = Mobility::Orbit {
            center: DVec3::ZERO,
            radius: 50.0,
            altitude: 40.0,
            angular_speed: 0.2,
            phase: 0.0,
        };
        assert!(orbit.is_mobile());

        let single_point = Mobility::Waypoints {
            points: vec![DVec3::ZERO],
            speed: 5.0,
            current_idx: 0,
            progress: 0.0,
        };
        assert!(!single_point.is_mobile());
    }

    #[test]
    fn test_command_serde() {
        let json = r#"{"type":"AddTransmitter","position":[1.0,2.0,3.0],"power_dbm":null,"frequency_mhz":1800.0}"#;
        let cmd: SessionCommand = serde_json::from_str(json).unwrap();
        match cmd {
            SessionCommand::AddTransmitter {
                position,
                power_dbm,
                frequency_mhz,
                mobility,
            } => {
                assert_eq!(position, DVec3::new(1.0, 2.0, 3.0));
                assert_eq!(power_dbm, None);
                assert_eq!(frequency_mhz, Some(1800.0));
                assert_eq!(mobility, Mobility::Stationary);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let fly = CameraCommand::FlyTo {
            target: DVec3::new(5.0, 0.0, 5.0),
            distance: 80.0,
        };
        let json = serde_json::to_string(&fly).unwrap();
        let back: CameraCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(fly, back);

        let focus: SessionCommand =
            serde_json::from_str(r#"{"type":"FocusTransmitter","id":3}"#).unwrap();
        assert!(matches!(focus, SessionCommand::FocusTransmitter { id: 3 }));
    }

    #[test]
    fn test_event_serde() {
        let event = SessionEvent::VehicleHandover(HandoverEvent {
            position: DVec3::new(1.0, 1.5, 2.0),
            sample_index: 4,
            from_index: 0,
            to_index: 1,
            from_id: 10,
            to_id: 11,
        });
        let json = serde_json::to_string(&event).unwrap();
        let back: SessionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn test_ray_bundle_polyline() {
        let hop = |origin: DVec3, hit: DVec3, power: f64| RayHop {
            origin,
            hit_point: hit,
            distance_m: origin.distance(hit),
            fspl_db: 0.0,
            reflection_loss_db: 0.0,
            material: HopMaterial::LineOfSight,
            power_dbm: power,
        };
        let a = DVec3::ZERO;
        let b = DVec3::new(10.0, 0.0, 0.0);
        let c = DVec3::new(10.0, 0.0, 10.0);
        let bundle = RayBundle {
            transmitter_id: 1,
            direction: DVec3::X,
            hops: vec![hop(a, b, -40.0), hop(b, c, -60.0)],
        };
        assert_eq!(bundle.polyline(), vec![a, b, c]);
        assert_eq!(bundle.final_power_dbm(), Some(-60.0));

        let empty = RayBundle {
            transmitter_id: 1,
            direction: DVec3::X,
            hops: Vec::new(),
        };
        assert!(empty.polyline().is_empty());
        assert_eq!(empty.final_power_dbm(), None);
    }

    #[test]
    fn test_probe_result_defaults() {
        let result = ProbeResult::default();
        assert!(result.is_empty());
        assert!(result.best_row().is_none());
        assert!(result.margin_or_infinite().is_infinite());
        assert_eq!(result.quality, QualityTier::Dead);
    }

    #[test]
    fn test_sim_time_advance() {
        let mut time = SimTime::default();
        time.advance(0.5);
        time.advance(0.25);
        assert_eq!(time.tick, 2);
        assert!((time.elapsed_secs - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_snapshot_serde() {
        let snapshot = SessionSnapshot {
            transmitters: vec![sample_transmitter()],
            revision: 3,
            ..Default::default()
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: SessionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, back);
    }

    // ---- Config ----

    #[test]
    fn test_config_defaults_match_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.max_bounces, MAX_BOUNCES);
        assert_eq!(config.max_ray_range_m, MAX_RAY_RANGE_M);
        assert_eq!(config.field_max_sources, FIELD_MAX_SOURCES);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{"max_bounces": 3, "probe_interval_secs": 0.25}"#;
        let config = EngineConfig::from_json_str(json).unwrap();
        assert_eq!(config.max_bounces, 3);
        assert_eq!(config.probe_interval_secs, 0.25);
        assert_eq!(config.base_ray_count, BASE_RAY_COUNT);
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let err = EngineConfig::from_json_str(r#"{"drive_sample_step_m": 0.0}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "drive_sample_step_m",
                ..
            }
        ));

        let err = EngineConfig::from_json_str(r#"{"min_ray_count": 500}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "base_ray_count",
                ..
            }
        ));

        let err = EngineConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_rays_per_transmitter_scales_down_to_minimum() {
        let config = EngineConfig::default();
        assert_eq!(config.rays_per_transmitter(0), BASE_RAY_COUNT);
        assert_eq!(config.rays_per_transmitter(1), BASE_RAY_COUNT);
        assert_eq!(config.rays_per_transmitter(2), BASE_RAY_COUNT / 2);
        assert_eq!(config.rays_per_transmitter(3), BASE_RAY_COUNT / 3);
        assert_eq!(config.rays_per_transmitter(50), MIN_RAY_COUNT);

        let mut previous = u32::MAX;
        for count in 1..20 {
            let rays = config.rays_per_transmitter(count);
            assert!(rays <= previous);
            assert!(rays >= MIN_RAY_COUNT);
            previous = rays;
        }
    }
}
