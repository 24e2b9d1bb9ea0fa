//! Free-space path loss and material reflection loss.
//!
//! Pure functions; every input is sanitized to a finite result.

use glam::DVec3;

use signalscape_core::constants::*;
use signalscape_core::enums::MaterialClass;
use signalscape_scene::index::safe_normalize;

/// Free-space path loss in dB for `distance_m` meters at `frequency_mhz`.
///
/// `32.4 + 20 log10(f_MHz) + 20 log10(d_km)`, with distance floored at 1 m.
pub fn free_space_path_loss(distance_m: f64, frequency_mhz: f64) -> f64 {
    let distance_km = sanitize(distance_m).max(FSPL_MIN_DISTANCE_M) / 1000.0;
    let frequency_mhz = sanitize(frequency_mhz).max(EPSILON);
    FSPL_CONSTANT_DB + 20.0 * frequency_mhz.log10() + 20.0 * distance_km.log10()
}

/// Loss band (normal incidence, grazing incidence) for a material, in dB.
pub fn reflection_band(material: MaterialClass) -> (f64, f64) {
    match material {
        MaterialClass::Glass => GLASS_REFLECTION_LOSS_DB,
        MaterialClass::Metal => METAL_REFLECTION_LOSS_DB,
        MaterialClass::Water
        | MaterialClass::Terrain
        | MaterialClass::ConcreteLowRise
        | MaterialClass::ConcreteMidRise
        | MaterialClass::EmissiveHighRise => DEFAULT_REFLECTION_LOSS_DB,
    }
}

/// Reflection loss in dB for a ray arriving along `incident` at a surface with `normal`.
///
/// Interpolates the material band by `1 - |n·i|`: the low end at normal
/// incidence, the high end at grazing. Degenerate vectors count as normal incidence.
pub fn reflection_loss(material: MaterialClass, normal: DVec3, incident: DVec3) -> f64 {
    let (low, high) = reflection_band(material);
    let grazing = match (safe_normalize(normal), safe_normalize(incident)) {
        (Some(n), Some(i)) => (1.0 - n.dot(i).abs()).clamp(0.0, 1.0),
        _ => 0.0,
    };
    low + (high - low) * grazing
}

/// Mirror `incident` about the unit `normal`.
pub fn reflect(incident: DVec3, normal: DVec3) -> DVec3 {
    incident - 2.0 * incident.dot(normal) * normal
}

/// Convert a power in dBm to watts.
pub fn dbm_to_watts(dbm: f64) -> f64 {
    10f64.powf((dbm - 30.0) / 10.0)
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
