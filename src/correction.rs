//! Inverse sizing: which orifice makes a misreading sensor read true.

use log::debug;

use crate::error::{ensure_positive_flow, ensure_within_bore, Result};
use crate::oil::{fluid_properties, Oil};
use crate::orifice::{reynolds_number, size_for_fluid, OrificePlate, SizingConfig};
use crate::sensor::{Warnings, GL40};

/// Changes below this magnitude (percent) do not warrant a new plate.
pub const ORIFICE_CHANGE_DEAD_BAND_PCT: f64 = 0.5;

/// What to do with the installed plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrificeAction {
    Enlarge,
    Reduce,
    Keep,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionResult {
    pub oil: Oil,
    pub temperature_c: f64,
    pub true_flow_lpm: f64,
    pub sensor_reading_lpm: f64,
    pub current_orifice_mm: f64,

    pub current_beta: f64,
    pub current_dp_mbar: f64,
    pub current_reynolds: f64,

    pub corrected_orifice_mm: f64,
    pub corrected_beta: f64,
    pub corrected_dp_mbar: f64,
    pub corrected_reynolds: f64,

    /// Negative when the sensor under-reads.
    pub reading_error_pct: f64,
    /// Positive when the replacement plate must be larger.
    pub orifice_change_pct: f64,

    /// Advisories for the corrected operating point.
    pub corrected_warnings: Warnings,
}

impl CorrectionResult {
    pub fn recommendation(&self) -> OrificeAction {
        if self.orifice_change_pct.abs() <= ORIFICE_CHANGE_DEAD_BAND_PCT {
            OrificeAction::Keep
        } else if self.orifice_change_pct > 0.0 {
            OrificeAction::Enlarge
        } else {
            OrificeAction::Reduce
        }
    }
}

/// Computes the orifice that makes the sensor indicate `true_flow_lpm`.
///
/// The installed plate is evaluated at the true flow. The replacement is
/// sized for the true flow at the differential pressure the installed plate
/// develops at the indicated flow, so an accurate reading returns the
/// installed bore.
///
/// # Errors
///
/// Fails on non-positive flows, on an installed orifice outside the pipe
/// bore, on non-physical fluid state, and if the sizing iteration does not
/// converge.
pub fn calculate_corrected_orifice(
    oil: Oil,
    temp_c: f64,
    true_flow_lpm: f64,
    sensor_reading_lpm: f64,
    current_orifice_mm: f64,
) -> Result<CorrectionResult> {
    ensure_positive_flow("true flow", true_flow_lpm)?;
    ensure_positive_flow("sensor reading", sensor_reading_lpm)?;
    ensure_within_bore("current orifice", current_orifice_mm, GL40.pipe_diameter_mm)?;

    let fluid = fluid_properties(oil, temp_c)?;
    let cd = GL40.discharge_coefficient;
    let rho = fluid.density_kgm3;

    let current = OrificePlate::gl40(current_orifice_mm);
    let current_dp = current.differential_pressure_mbar(cd, true_flow_lpm, rho);
    let indicated_dp = current.differential_pressure_mbar(cd, sensor_reading_lpm, rho);

    let corrected = size_for_fluid(
        &GL40,
        &fluid,
        true_flow_lpm,
        indicated_dp,
        &SizingConfig::default(),
    )?;

    let reading_error_pct = (sensor_reading_lpm - true_flow_lpm) / true_flow_lpm * 100.0;
    let orifice_change_pct =
        (corrected.orifice_diameter_mm - current_orifice_mm) / current_orifice_mm * 100.0;

    debug!(
        "correction: {current_orifice_mm} mm -> {:.3} mm ({orifice_change_pct:+.2}%), reading error {reading_error_pct:+.2}%",
        corrected.orifice_diameter_mm
    );

    Ok(CorrectionResult {
        oil,
        temperature_c: temp_c,
        true_flow_lpm,
        sensor_reading_lpm,
        current_orifice_mm,
        current_beta: current.beta(),
        current_dp_mbar: current_dp,
        current_reynolds: reynolds_number(true_flow_lpm, &fluid, GL40.pipe_diameter_mm),
        corrected_orifice_mm: corrected.orifice_diameter_mm,
        corrected_beta: corrected.beta_ratio,
        corrected_dp_mbar: corrected.differential_pressure_mbar,
        corrected_reynolds: corrected.reynolds_number,
        reading_error_pct,
        orifice_change_pct,
        corrected_warnings: corrected.warnings,
    })
}
