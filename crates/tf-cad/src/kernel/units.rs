//! Length units used by host documents

use std::fmt;

use serde::{Deserialize, Serialize};

/// Length unit of a document or a user-facing value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LengthUnit {
    /// Millimeters (scale by 0.001)
    #[default]
    Millimeters,
    /// Centimeters (scale by 0.01)
    Centimeters,
    /// Meters (no scaling)
    Meters,
    /// Inches (scale by 0.0254)
    Inches,
}

impl LengthUnit {
    /// Size of one unit in meters
    pub fn scale_factor(&self) -> f64 {
        match self {
            LengthUnit::Millimeters => 0.001,
            LengthUnit::Centimeters => 0.01,
            LengthUnit::Meters => 1.0,
            LengthUnit::Inches => 0.0254,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LengthUnit::Millimeters => "Millimeters",
            LengthUnit::Centimeters => "Centimeters",
            LengthUnit::Meters => "Meters",
            LengthUnit::Inches => "Inches",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            LengthUnit::Millimeters => "mm",
            LengthUnit::Centimeters => "cm",
            LengthUnit::Meters => "m",
            LengthUnit::Inches => "in",
        }
    }

    pub const ALL: &'static [LengthUnit] = &[
        LengthUnit::Millimeters,
        LengthUnit::Centimeters,
        LengthUnit::Meters,
        LengthUnit::Inches,
    ];

    /// Convert `value` expressed in this unit into `target`
    pub fn convert(&self, value: f64, target: LengthUnit) -> f64 {
        if *self == target {
            return value;
        }
        value * self.scale_factor() / target.scale_factor()
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Convert a length between units
pub fn convert(value: f64, from: LengthUnit, to: LengthUnit) -> f64 {
    from.convert(value, to)
}
