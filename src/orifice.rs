//! Incompressible sharp-edged orifice flow and the orifice sizing solver.
//!
//! Governing equation, with velocity-of-approach factor:
//!
//! ```text
//! Q = Cd / sqrt(1 - β⁴) · A · sqrt(2·ΔP / ρ),    A = π·d²/4,    β = d / D
//! ```

use std::f64::consts::{FRAC_PI_4, PI};

use log::{debug, trace, warn};

use crate::error::{ensure_positive_diameter, ensure_positive_flow, CalibrationError, Result};
use crate::oil::{correction_factor_for_density, fluid_properties, FluidProperties, Oil};
use crate::sensor::{SensorGeometry, Warning, Warnings, GL40};

pub const LPM_PER_M3S: f64 = 60_000.0;
pub const PA_PER_MBAR: f64 = 100.0;

pub fn lpm_to_m3s(flow_lpm: f64) -> f64 {
    flow_lpm / LPM_PER_M3S
}

pub fn m3s_to_lpm(flow_m3s: f64) -> f64 {
    flow_m3s * LPM_PER_M3S
}

/// An orifice plate installed in a pipe of bore `pipe_d_mm`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrificePlate {
    pub orifice_d_mm: f64,
    pub pipe_d_mm: f64,
}

impl OrificePlate {
    pub fn new(orifice_d_mm: f64, pipe_d_mm: f64) -> Self {
        Self {
            orifice_d_mm,
            pipe_d_mm,
        }
    }

    /// Plate of the given bore in the GL40 line.
    pub fn gl40(orifice_d_mm: f64) -> Self {
        Self::new(orifice_d_mm, GL40.pipe_diameter_mm)
    }

    pub fn beta(&self) -> f64 {
        self.orifice_d_mm / self.pipe_d_mm
    }

    /// `1 / sqrt(1 - β⁴)`
    pub fn velocity_of_approach(&self) -> f64 {
        1.0 / (1.0 - self.beta().powi(4)).sqrt()
    }

    pub fn area_m2(&self) -> f64 {
        let d_m = self.orifice_d_mm / 1000.0;
        FRAC_PI_4 * d_m.powi(2)
    }

    /// Volumetric flow (L/min) through the plate at `dp_mbar`.
    pub fn flow_lpm(&self, cd: f64, dp_mbar: f64, density_kgm3: f64) -> f64 {
        let dp_pa = dp_mbar * PA_PER_MBAR;
        let q = cd * self.velocity_of_approach() * self.area_m2() * (2.0 * dp_pa / density_kgm3).sqrt();
        m3s_to_lpm(q)
    }

    /// Differential pressure (mbar) developed by `flow_lpm`.
    pub fn differential_pressure_mbar(&self, cd: f64, flow_lpm: f64, density_kgm3: f64) -> f64 {
        let velocity_term = lpm_to_m3s(flow_lpm) / (cd * self.velocity_of_approach() * self.area_m2());
        velocity_term.powi(2) * density_kgm3 / 2.0 / PA_PER_MBAR
    }
}

/// Pipe Reynolds number `4·ρ·Q / (π·μ·D)`.
pub fn reynolds_number(flow_lpm: f64, fluid: &FluidProperties, pipe_d_mm: f64) -> f64 {
    let q = lpm_to_m3s(flow_lpm);
    let d_m = pipe_d_mm / 1000.0;
    4.0 * fluid.density_kgm3 * q / (PI * fluid.dynamic_viscosity_pas() * d_m)
}

/// Iteration controls for [`size_orifice`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingConfig {
    pub max_iters: usize,
    /// Relative change in diameter below which the iteration stops.
    pub rel_tol: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            max_iters: 100,
            rel_tol: 1e-6,
        }
    }
}

/// Converged diameter and the iterations it took.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sizing {
    pub diameter_mm: f64,
    pub iterations: usize,
}

/// Finds the orifice diameter that passes `flow_lpm` at `dp_mbar`.
///
/// Seeds from the β → 0 closed form, then iterates towards the fixed point of
/// `g(d) = sqrt(4·Q·sqrt(1 − β⁴) / (π·Cd·sqrt(2ΔP/ρ)))`. Each update is
/// weighted by `1 − β⁴`, the reciprocal of `1 − g'(d)` at the root, and is kept
/// inside a bracket on `(0, D)` that shrinks with the sign of `g(d) − d`; an
/// update leaving the bracket is replaced by its midpoint.
///
/// # Errors
///
/// Returns [`CalibrationError::NoConvergence`] if the diameter has not
/// settled after `config.max_iters` updates.
pub fn size_orifice(
    sensor: &SensorGeometry,
    flow_lpm: f64,
    density_kgm3: f64,
    dp_mbar: f64,
    config: &SizingConfig,
) -> Result<Sizing> {
    let q = lpm_to_m3s(flow_lpm);
    let pipe_d = sensor.pipe_diameter_m();
    let ideal_velocity = (2.0 * dp_mbar * PA_PER_MBAR / density_kgm3).sqrt();
    let area_scale = 4.0 * q / (PI * sensor.discharge_coefficient * ideal_velocity);

    // g(0) > 0 and g(D) = 0, so the root lies strictly inside the bore.
    let (mut lo, mut hi) = (0.0, pipe_d);
    let mut d = area_scale.sqrt();
    if !(d > lo && d < hi) {
        d = 0.5 * (lo + hi);
    }
    trace!("sizing seed d0 = {:.6} mm", d * 1000.0);

    for iteration in 1..=config.max_iters {
        let beta4 = (d / pipe_d).powi(4);
        let target = (area_scale * (1.0 - beta4).sqrt()).sqrt();
        let residual = target - d;

        if residual > 0.0 {
            lo = d;
        } else {
            hi = d;
        }

        let mut next = d + (1.0 - beta4) * residual;
        if !(next > lo && next < hi) {
            next = 0.5 * (lo + hi);
        }

        trace!(
            "iteration {iteration}: beta = {:.6}, d = {:.6} mm",
            beta4.powf(0.25),
            next * 1000.0
        );

        if (next - d).abs() <= config.rel_tol * next {
            return Ok(Sizing {
                diameter_mm: next * 1000.0,
                iterations: iteration,
            });
        }
        d = next;
    }

    Err(CalibrationError::NoConvergence {
        iterations: config.max_iters,
        last_diameter_mm: d * 1000.0,
    })
}

/// Sizing outcome for one (oil, temperature, flow) point.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationResult {
    pub oil: Oil,
    pub flow_lpm: f64,
    pub temperature_c: f64,
    pub kinematic_viscosity_cst: f64,
    pub dynamic_viscosity_mpas: f64,
    pub density_kgm3: f64,
    pub orifice_diameter_mm: f64,
    pub beta_ratio: f64,
    pub correction_factor: f64,
    pub reynolds_number: f64,
    pub differential_pressure_mbar: f64,
    pub warnings: Warnings,
    pub iterations: usize,
}

impl CalculationResult {
    pub fn is_valid(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn plate(&self) -> OrificePlate {
        OrificePlate::gl40(self.orifice_diameter_mm)
    }
}

/// Sizes the GL40 orifice for `flow_lpm` of `oil` at `temp_c`, operating at
/// the midpoint of the sensor DP range.
pub fn calculate_orifice_diameter(flow_lpm: f64, oil: Oil, temp_c: f64) -> Result<CalculationResult> {
    calculate_orifice_diameter_at(
        flow_lpm,
        oil,
        temp_c,
        GL40.operating_dp_mbar(),
        &SizingConfig::default(),
    )
}

/// As [`calculate_orifice_diameter`], at an explicit operating DP.
pub fn calculate_orifice_diameter_at(
    flow_lpm: f64,
    oil: Oil,
    temp_c: f64,
    dp_mbar: f64,
    config: &SizingConfig,
) -> Result<CalculationResult> {
    ensure_positive_flow("flow", flow_lpm)?;
    if !(dp_mbar > 0.0 && dp_mbar.is_finite()) {
        return Err(CalibrationError::NonPositivePressure { value: dp_mbar });
    }

    let fluid = fluid_properties(oil, temp_c)?;
    size_for_fluid(&GL40, &fluid, flow_lpm, dp_mbar, config)
}

pub(crate) fn size_for_fluid(
    sensor: &SensorGeometry,
    fluid: &FluidProperties,
    flow_lpm: f64,
    dp_mbar: f64,
    config: &SizingConfig,
) -> Result<CalculationResult> {
    let lcf = correction_factor_for_density(sensor, fluid.density_kgm3)?;
    let sizing = size_orifice(sensor, flow_lpm, fluid.density_kgm3, dp_mbar, config)?;
    let diameter_mm = ensure_positive_diameter("sized orifice", sizing.diameter_mm)?;

    let plate = OrificePlate::new(diameter_mm, sensor.pipe_diameter_mm);
    let beta = plate.beta();
    let reynolds = reynolds_number(flow_lpm, fluid, sensor.pipe_diameter_mm);
    let dp = plate.differential_pressure_mbar(sensor.discharge_coefficient, flow_lpm, fluid.density_kgm3);

    let mut warnings = sensor.check(reynolds, beta, dp);
    if !fluid.in_validated_range() {
        warnings.insert(Warning::TemperatureOutOfRange);
    }

    debug!(
        "{} @ {} °C, {flow_lpm} L/min: d = {diameter_mm:.3} mm, beta = {beta:.4}, Re = {reynolds:.0}, dP = {dp:.2} mbar ({} iterations)",
        fluid.oil, fluid.temperature_c, sizing.iterations
    );
    if !warnings.is_empty() {
        warn!("{flow_lpm} L/min sizing raised {warnings:?}");
    }

    Ok(CalculationResult {
        oil: fluid.oil,
        flow_lpm,
        temperature_c: fluid.temperature_c,
        kinematic_viscosity_cst: fluid.kinematic_viscosity_cst,
        dynamic_viscosity_mpas: fluid.dynamic_viscosity_mpas,
        density_kgm3: fluid.density_kgm3,
        orifice_diameter_mm: diameter_mm,
        beta_ratio: beta,
        correction_factor: lcf,
        reynolds_number: reynolds,
        differential_pressure_mbar: dp,
        warnings,
        iterations: sizing.iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn plate_geometry() {
        let plate = OrificePlate::gl40(20.5);
        assert_relative_eq!(plate.beta(), 0.5);
        assert_relative_eq!(plate.velocity_of_approach(), 1.0 / (1.0 - 0.0625_f64).sqrt());
        assert_relative_eq!(plate.area_m2(), PI * 0.0205 * 0.0205 / 4.0);
    }

    #[test]
    fn forward_flow_and_dp_are_inverse() {
        let plate = OrificePlate::gl40(18.0);
        let dp = plate.differential_pressure_mbar(0.61, 90.0, 870.0);
        assert_relative_eq!(plate.flow_lpm(0.61, dp, 870.0), 90.0, max_relative = 1e-12);
    }

    #[test]
    fn dp_grows_with_flow_for_a_fixed_plate() {
        let plate = OrificePlate::gl40(15.0);
        let low = plate.differential_pressure_mbar(0.61, 50.0, 874.6);
        let high = plate.differential_pressure_mbar(0.61, 150.0, 874.6);
        assert_relative_eq!(high / low, 9.0, max_relative = 1e-12);
    }

    #[test]
    fn reynolds_grows_with_flow() {
        let fluid = fluid_properties(Oil::Vg220, 50.0).unwrap();
        let low = reynolds_number(50.0, &fluid, 41.0);
        let high = reynolds_number(150.0, &fluid, 41.0);
        assert!(high > low && low > 0.0);
        assert_relative_eq!(high, 610.0, max_relative = 0.01);
    }

    #[test]
    fn sized_orifice_reproduces_target_flow() {
        for oil in Oil::ALL {
            for temp in [20.0, 40.0, 50.0, 80.0] {
                for flow in [10.0, 50.0, 150.0, 250.0] {
                    let result = calculate_orifice_diameter(flow, oil, temp).unwrap();
                    let forward = result.plate().flow_lpm(
                        GL40.discharge_coefficient,
                        GL40.operating_dp_mbar(),
                        result.density_kgm3,
                    );
                    assert_relative_eq!(forward, flow, max_relative = 1e-3);
                    assert_relative_eq!(result.differential_pressure_mbar, 125.0, max_relative = 1e-3);
                    assert!(result.beta_ratio > 0.0 && result.beta_ratio < 1.0);
                }
            }
        }
    }

    #[test]
    fn sizing_is_deterministic() {
        let a = calculate_orifice_diameter(120.0, Oil::Vg320, 45.0).unwrap();
        let b = calculate_orifice_diameter(120.0, Oil::Vg320, 45.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn explicit_dp_changes_the_diameter() {
        let config = SizingConfig::default();
        let low = calculate_orifice_diameter_at(100.0, Oil::Vg220, 50.0, 60.0, &config).unwrap();
        let high = calculate_orifice_diameter_at(100.0, Oil::Vg220, 50.0, 190.0, &config).unwrap();
        assert!(low.orifice_diameter_mm > high.orifice_diameter_mm);
        assert_relative_eq!(low.differential_pressure_mbar, 60.0, max_relative = 1e-3);
    }

    #[test]
    fn small_flow_raises_beta_warning() {
        let result = calculate_orifice_diameter(10.0, Oil::Vg220, 50.0).unwrap();
        assert!(result.beta_ratio < GL40.beta_min);
        assert!(result.warnings.contains(&Warning::BetaOutOfRange));
        assert!(!result.warnings.contains(&Warning::DpOutOfRange));
    }

    #[test]
    fn cold_oil_flags_temperature_and_reynolds() {
        let result = calculate_orifice_diameter(100.0, Oil::Vg320, 10.0).unwrap();
        assert!(result.warnings.contains(&Warning::TemperatureOutOfRange));
        assert!(result.warnings.contains(&Warning::LowReynolds));
    }

    #[test]
    fn rejects_non_positive_inputs() {
        assert!(matches!(
            calculate_orifice_diameter(0.0, Oil::Vg220, 50.0),
            Err(CalibrationError::NonPositiveFlow { .. })
        ));
        assert!(matches!(
            calculate_orifice_diameter(-5.0, Oil::Vg220, 50.0),
            Err(CalibrationError::NonPositiveFlow { .. })
        ));
        assert!(matches!(
            calculate_orifice_diameter_at(50.0, Oil::Vg220, 50.0, 0.0, &SizingConfig::default()),
            Err(CalibrationError::NonPositivePressure { .. })
        ));
    }

    #[test]
    fn iteration_cap_is_enforced() {
        let config = SizingConfig {
            max_iters: 1,
            ..SizingConfig::default()
        };
        let err = size_orifice(&GL40, 150.0, 874.6, 125.0, &config).unwrap_err();
        assert!(matches!(err, CalibrationError::NoConvergence { iterations: 1, .. }));
    }

    #[test]
    fn converges_close_to_the_pipe_bore() {
        let config = SizingConfig::default();
        for flow in [300.0, 1_000.0] {
            let sizing = size_orifice(&GL40, flow, 874.6, 125.0, &config).unwrap();
            let plate = OrificePlate::gl40(sizing.diameter_mm);
            assert_relative_eq!(plate.flow_lpm(0.61, 125.0, 874.6), flow, max_relative = 1e-3);
        }

        // β is within 1e-6 of unity here, so only the bracket is checked.
        let sizing = size_orifice(&GL40, 100_000.0, 874.6, 125.0, &config).unwrap();
        assert!(sizing.diameter_mm < GL40.pipe_diameter_mm);
        assert!(sizing.diameter_mm > 40.9);
    }

    #[test]
    fn converges_for_tiny_flows() {
        let sizing = size_orifice(&GL40, 1e-3, 874.6, 125.0, &SizingConfig::default()).unwrap();
        assert!(sizing.diameter_mm > 0.0);
        let plate = OrificePlate::gl40(sizing.diameter_mm);
        assert_relative_eq!(plate.flow_lpm(0.61, 125.0, 874.6), 1e-3, max_relative = 1e-3);
    }
}
