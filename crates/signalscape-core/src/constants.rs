//! Propagation constants and tuning parameters.

/// Default simulation tick rate (Hz), coupled to rendering.
pub const TICK_RATE: u32 = 60;

/// Seconds per tick at the default tick rate.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

/// Guard for denominators and vector normalization.
pub const EPSILON: f64 = 1e-9;

/// Speed of light (m/s).
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

// --- Path loss ---

/// FSPL constant for distance in km and frequency in MHz.
pub const FSPL_CONSTANT_DB: f64 = 32.4;

/// Distances below this are treated as this (meters).
pub const FSPL_MIN_DISTANCE_M: f64 = 1.0;

/// Reflection loss band for glass (dB at normal incidence, dB at grazing).
pub const GLASS_REFLECTION_LOSS_DB: (f64, f64) = (10.0, 20.0);

/// Reflection loss band for metal.
pub const METAL_REFLECTION_LOSS_DB: (f64, f64) = (0.0, 3.0);

/// Reflection loss band for concrete, terrain, water and everything else.
pub const DEFAULT_REFLECTION_LOSS_DB: (f64, f64) = (3.0, 9.0);

// --- Ray propagation ---

/// Received power floor (dBm). Ray marching halts at or below it.
pub const POWER_FLOOR_DBM: f64 = -110.0;

/// Maximum range of a single ray-geometry query (meters).
pub const MAX_RAY_RANGE_M: f64 = 5000.0;

/// Maximum number of reflections per ray.
pub const MAX_BOUNCES: u32 = 2;

/// Offset applied to ray origins so a ray never re-hits the surface it left (meters).
pub const RAY_ORIGIN_OFFSET_M: f64 = 0.05;

/// Offset of the first ray origin from the transmitter itself (meters).
pub const TRANSMITTER_CLEARANCE_M: f64 = 0.5;

/// Ray budget shared by all transmitters; each gets `BASE / count`.
pub const BASE_RAY_COUNT: u32 = 384;

/// Rays per transmitter never drop below this.
pub const MIN_RAY_COUNT: u32 = 96;

// --- Point probe ---

/// Extra loss applied to a non-line-of-sight path (dB).
pub const OBSTRUCTION_PENALTY_DB: f64 = 25.0;

/// LOS queries stop this far short of the receiver (meters).
pub const LOS_END_CLEARANCE_M: f64 = 0.5;

/// Best received power above which the quality tier is Excellent (dBm).
pub const QUALITY_EXCELLENT_DBM: f64 = -70.0;

/// Best received power above which the quality tier is Good (dBm).
pub const QUALITY_GOOD_DBM: f64 = -85.0;

/// Best received power above which the quality tier is Fair (dBm).
pub const QUALITY_FAIR_DBM: f64 = -100.0;

/// Best received power above which the quality tier is Poor (dBm).
pub const QUALITY_POOR_DBM: f64 = -110.0;

/// Signals above this level count as strong interferers (dBm).
pub const STRONG_SIGNAL_DBM: f64 = -80.0;

/// Minimum best/second-best margin for a stable serving cell (dB).
pub const HANDOVER_MARGIN_DB: f64 = 3.0;

/// Softmax temperature for visual blending weights (dB).
pub const SOFTMAX_TEMPERATURE_DB: f64 = 4.0;

// --- Interference field ---

/// Maximum number of transmitters contributing to the field.
pub const FIELD_MAX_SOURCES: usize = 8;

/// Fringe stretch factor applied to the wavenumber.
pub const FIELD_SPATIAL_STRETCH: f64 = 30.0;

/// Divisor applied to the carrier frequency so oscillation is visible.
/// 2.4 GHz renders at ~4.8 cycles per second.
pub const FIELD_TIME_SLOWDOWN: f64 = 5.0e8;

/// Gain inside the soft intensity compression `1 - exp(-scale * E^2)`.
pub const FIELD_INTENSITY_SCALE: f64 = 2500.0;

/// Distances below this are clamped when computing field amplitude (meters).
pub const FIELD_MIN_DISTANCE_M: f64 = 1.0;

// --- Drive test ---

/// Spatial resampling step along a drive route (meters).
pub const DRIVE_SAMPLE_STEP_M: f64 = 6.0;

/// Minimum interval between live probe analyses (seconds, ~10 Hz).
pub const PROBE_MIN_INTERVAL_SECS: f64 = 0.1;

/// Default probe vehicle speed (m/s).
pub const PROBE_VEHICLE_SPEED: f64 = 12.0;

/// Trace bucket thresholds on best received power (dBm).
pub const TRACE_GREEN_DBM: f64 = -70.0;
pub const TRACE_YELLOW_DBM: f64 = -85.0;
pub const TRACE_ORANGE_DBM: f64 = -100.0;

// --- Transmitter defaults ---

/// Default transmit power for newly placed transmitters (dBm).
pub const DEFAULT_TX_POWER_DBM: f64 = 36.0;

/// Default carrier frequency for newly placed transmitters (MHz).
pub const DEFAULT_TX_FREQUENCY_MHZ: f64 = 2400.0;

/// Display colors assigned to transmitters in placement order.
pub const TRANSMITTER_PALETTE: [[u8; 3]; 8] = [
    [0x4f, 0xc3, 0xf7],
    [0xff, 0x8a, 0x65],
    [0xba, 0x68, 0xc8],
    [0x81, 0xc7, 0x84],
    [0xff, 0xd5, 0x4f],
    [0xf0, 0x62, 0x92],
    [0x4d, 0xb6, 0xac],
    [0x90, 0xa4, 0xae],
];

// --- Camera ---

/// Viewing distance used when framing a transmitter (meters).
pub const FOCUS_DISTANCE_M: f64 = 150.0;
