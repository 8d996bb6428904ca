use thiserror::Error;

/// Fatal errors raised by the calibration core.
///
/// Advisory conditions (low Reynolds number, beta or DP outside the sensor
/// envelope) are never reported here, they travel as [`crate::Warning`] tags
/// on the computed result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    /// A flow rate input was zero or negative.
    #[error("{name} must be positive, got {value} L/min")]
    NonPositiveFlow { name: &'static str, value: f64 },

    /// A diameter input was zero or negative.
    #[error("{name} must be positive, got {value} mm")]
    NonPositiveDiameter { name: &'static str, value: f64 },

    /// An orifice diameter does not fit inside the pipe bore.
    #[error("{name} of {value} mm must be smaller than the {pipe_diameter_mm} mm pipe bore")]
    DiameterExceedsBore {
        name: &'static str,
        value: f64,
        pipe_diameter_mm: f64,
    },

    /// The operating differential pressure was zero or negative.
    #[error("differential pressure must be positive, got {value} mbar")]
    NonPositivePressure { value: f64 },

    /// The oil identifier does not match any reference record.
    #[error("unknown oil `{0}`, expected one of VG220, VG320")]
    UnknownOil(String),

    /// The viscosity model produced a non-positive or non-finite value.
    #[error("kinematic viscosity at {temp_c} °C is non-physical ({value} cSt)")]
    NonPhysicalViscosity { temp_c: f64, value: f64 },

    /// The density model produced a non-positive or non-finite value.
    #[error("density at {temp_c} °C is non-physical ({value} kg/m³)")]
    NonPhysicalDensity { temp_c: f64, value: f64 },

    /// The liquid correction factor radicand would be non-positive.
    #[error(
        "correction factor undefined: oil density {density_kgm3} kg/m³ \
         must lie in (0, {float_density_kgm3}) kg/m³"
    )]
    CorrectionFactorDomain {
        density_kgm3: f64,
        float_density_kgm3: f64,
    },

    /// The orifice sizing iteration did not settle within its cap.
    #[error("orifice sizing did not converge after {iterations} iterations (last d = {last_diameter_mm} mm)")]
    NoConvergence {
        iterations: usize,
        last_diameter_mm: f64,
    },
}

pub type Result<T, E = CalibrationError> = std::result::Result<T, E>;

/// Rejects non-positive (or NaN) flow inputs.
pub(crate) fn ensure_positive_flow(name: &'static str, value: f64) -> Result<f64> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(CalibrationError::NonPositiveFlow { name, value })
    }
}

/// Rejects non-positive (or NaN) diameter inputs.
pub(crate) fn ensure_positive_diameter(name: &'static str, value: f64) -> Result<f64> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(CalibrationError::NonPositiveDiameter { name, value })
    }
}

/// Rejects diameters outside `(0, pipe_diameter_mm)`.
pub(crate) fn ensure_within_bore(name: &'static str, value: f64, pipe_diameter_mm: f64) -> Result<f64> {
    ensure_positive_diameter(name, value)?;
    if value < pipe_diameter_mm {
        Ok(value)
    } else {
        Err(CalibrationError::DiameterExceedsBore {
            name,
            value,
            pipe_diameter_mm,
        })
    }
}
