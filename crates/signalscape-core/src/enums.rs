//! Enumeration types used throughout the engine.

use serde::{Deserialize, Serialize};

/// Surface material class reported by the geometry index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialClass {
    Water,
    #[default]
    Terrain,
    /// Curtain-wall glass.
    Glass,
    ConcreteLowRise,
    ConcreteMidRise,
    /// Lit high-rise facades. Reflect like concrete.
    EmissiveHighRise,
    Metal,
}

impl MaterialClass {
    pub fn label(&self) -> &'static str {
        match self {
            MaterialClass::Water => "water",
            MaterialClass::Terrain => "terrain",
            MaterialClass::Glass => "glass",
            MaterialClass::ConcreteLowRise => "concrete-low-rise",
            MaterialClass::ConcreteMidRise => "concrete-mid-rise",
            MaterialClass::EmissiveHighRise => "emissive-high-rise",
            MaterialClass::Metal => "metal",
        }
    }
}

/// What a ray hop travelled through or bounced off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "material")]
pub enum HopMaterial {
    /// Direct path from the transmitter.
    LineOfSight,
    /// Path after reflecting off a surface of this class.
    Surface(MaterialClass),
}

impl HopMaterial {
    pub fn label(&self) -> &'static str {
        match self {
            HopMaterial::LineOfSight => "line-of-sight",
            HopMaterial::Surface(material) => material.label(),
        }
    }
}

/// Five-tier signal quality derived from the best received power.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    #[default]
    Dead,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl QualityTier {
    pub fn label(&self) -> &'static str {
        match self {
            QualityTier::Dead => "dead",
            QualityTier::Poor => "poor",
            QualityTier::Fair => "fair",
            QualityTier::Good => "good",
            QualityTier::Excellent => "excellent",
        }
    }
}

/// Four-bucket color used by the drive-test heat trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraceColor {
    Green,
    Yellow,
    Orange,
    Red,
}
