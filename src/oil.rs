//! Oil reference data and the temperature-dependent fluid property model.
//!
//! Kinematic viscosity follows the Walther-ASTM (ASTM D341) double-log curve
//! anchored at the two ISO reference temperatures, density follows a linear
//! thermal-expansion law from the 15 °C reference.

use std::fmt;
use std::str::FromStr;

use log::warn;

use crate::error::{CalibrationError, Result};
use crate::sensor::{SensorGeometry, GL40};

pub const ZERO_CELSIUS_K: f64 = 273.15;
/// Lower reference temperature of the viscosity curve (°C).
pub const REF_TEMP_LOW_C: f64 = 40.0;
/// Upper reference temperature of the viscosity curve (°C).
pub const REF_TEMP_HIGH_C: f64 = 100.0;
/// Reference temperature of the tabulated density (°C).
pub const DENSITY_REF_TEMP_C: f64 = 15.0;
/// Volumetric thermal expansion coefficient for mineral gear oils (1/°C).
pub const THERMAL_EXPANSION_COEFF: f64 = 0.000_65;
/// Offset added to ν (cSt) inside the Walther double logarithm.
pub const WALTHER_OFFSET_CST: f64 = 0.7;

/// Temperature band (°C) over which the property model is validated.
pub const VALIDATED_TEMP_MIN_C: f64 = 20.0;
pub const VALIDATED_TEMP_MAX_C: f64 = 80.0;

/// Immutable reference data for one oil grade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OilRecord {
    pub name: &'static str,
    /// Kinematic viscosity at 40 °C (cSt).
    pub viscosity_40c: f64,
    /// Kinematic viscosity at 100 °C (cSt).
    pub viscosity_100c: f64,
    /// Density at 15 °C (kg/m³).
    pub density_15c: f64,
}

const VG220: OilRecord = OilRecord {
    name: "VG220",
    viscosity_40c: 220.0,
    viscosity_100c: 19.0,
    density_15c: 895.0,
};

const VG320: OilRecord = OilRecord {
    name: "VG320",
    viscosity_40c: 320.0,
    viscosity_100c: 24.5,
    density_15c: 900.0,
};

/// Supported industrial gear oil grades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Oil {
    Vg220,
    Vg320,
}

impl Oil {
    pub const ALL: [Oil; 2] = [Oil::Vg220, Oil::Vg320];

    pub fn record(self) -> &'static OilRecord {
        match self {
            Oil::Vg220 => &VG220,
            Oil::Vg320 => &VG320,
        }
    }

    pub fn name(self) -> &'static str {
        self.record().name
    }
}

impl fmt::Display for Oil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Oil {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self> {
        Oil::ALL
            .into_iter()
            .find(|oil| oil.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CalibrationError::UnknownOil(s.to_string()))
    }
}

/// Constants of `log10(log10(ν + 0.7)) = A − B·log10(T_K)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaltherConstants {
    pub a: f64,
    pub b: f64,
}

impl WaltherConstants {
    pub fn viscosity_cst(&self, temp_c: f64) -> f64 {
        let log_log_nu = self.a - self.b * (temp_c + ZERO_CELSIUS_K).log10();
        10f64.powf(10f64.powf(log_log_nu)) - WALTHER_OFFSET_CST
    }
}

fn walther_y(nu_cst: f64) -> f64 {
    (nu_cst + WALTHER_OFFSET_CST).log10().log10()
}

impl OilRecord {
    /// Solves the two-point linear system for the Walther constants.
    pub fn walther_constants(&self) -> WaltherConstants {
        let x1 = (REF_TEMP_LOW_C + ZERO_CELSIUS_K).log10();
        let x2 = (REF_TEMP_HIGH_C + ZERO_CELSIUS_K).log10();
        let y1 = walther_y(self.viscosity_40c);
        let y2 = walther_y(self.viscosity_100c);

        let b = (y1 - y2) / (x2 - x1);
        let a = y1 + b * x1;

        WaltherConstants { a, b }
    }
}

/// Kinematic viscosity (cSt) of `oil` at `temp_c`.
///
/// Outside 20–80 °C the value is still returned, but its accuracy is not
/// validated; see [`in_validated_range`].
pub fn viscosity(oil: Oil, temp_c: f64) -> f64 {
    oil.record().walther_constants().viscosity_cst(temp_c)
}

/// Density (kg/m³) of `oil` at `temp_c`.
pub fn density(oil: Oil, temp_c: f64) -> f64 {
    let rho_15 = oil.record().density_15c;
    rho_15 * (1.0 - THERMAL_EXPANSION_COEFF * (temp_c - DENSITY_REF_TEMP_C))
}

/// Dynamic viscosity in mPa·s from cSt and kg/m³.
pub fn dynamic_viscosity_mpas(kinematic_cst: f64, density_kgm3: f64) -> f64 {
    kinematic_cst * density_kgm3 / 1000.0
}

pub fn in_validated_range(temp_c: f64) -> bool {
    (VALIDATED_TEMP_MIN_C..=VALIDATED_TEMP_MAX_C).contains(&temp_c)
}

/// Fluid state of one oil at one temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluidProperties {
    pub oil: Oil,
    pub temperature_c: f64,
    pub kinematic_viscosity_cst: f64,
    pub dynamic_viscosity_mpas: f64,
    pub density_kgm3: f64,
}

impl FluidProperties {
    pub fn dynamic_viscosity_pas(&self) -> f64 {
        self.dynamic_viscosity_mpas / 1000.0
    }

    pub fn in_validated_range(&self) -> bool {
        in_validated_range(self.temperature_c)
    }
}

/// Evaluates and checks the fluid state of `oil` at `temp_c`.
///
/// # Errors
///
/// Fails when the models yield a non-positive or non-finite viscosity or
/// density.
pub fn fluid_properties(oil: Oil, temp_c: f64) -> Result<FluidProperties> {
    let nu = viscosity(oil, temp_c);
    if !(nu > 0.0 && nu.is_finite()) {
        return Err(CalibrationError::NonPhysicalViscosity { temp_c, value: nu });
    }

    let rho = density(oil, temp_c);
    if !(rho > 0.0 && rho.is_finite()) {
        return Err(CalibrationError::NonPhysicalDensity { temp_c, value: rho });
    }

    if !in_validated_range(temp_c) {
        warn!(
            "{oil} at {temp_c} °C is outside the validated {VALIDATED_TEMP_MIN_C}-{VALIDATED_TEMP_MAX_C} °C band"
        );
    }

    Ok(FluidProperties {
        oil,
        temperature_c: temp_c,
        kinematic_viscosity_cst: nu,
        dynamic_viscosity_mpas: dynamic_viscosity_mpas(nu, rho),
        density_kgm3: rho,
    })
}

/// Liquid correction factor for a fluid of density `density_kgm3` in a
/// water-calibrated float sensor.
///
/// `actual_flow = scale_reading × LCF`.
pub fn correction_factor_for_density(sensor: &SensorGeometry, density_kgm3: f64) -> Result<f64> {
    let rho_float = sensor.float_density_kgm3;
    let rho_water = sensor.water_density_kgm3;

    if !(density_kgm3 > 0.0 && density_kgm3 < rho_float) {
        return Err(CalibrationError::CorrectionFactorDomain {
            density_kgm3,
            float_density_kgm3: rho_float,
        });
    }

    let numerator = (rho_float - density_kgm3) * rho_water;
    let denominator = (rho_float - rho_water) * density_kgm3;

    Ok((numerator / denominator).sqrt())
}

/// Liquid correction factor of `oil` at `temp_c` for the GL40 sensor.
pub fn correction_factor(oil: Oil, temp_c: f64) -> Result<f64> {
    correction_factor_for_density(&GL40, density(oil, temp_c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn reference_points_round_trip() {
        for oil in Oil::ALL {
            let record = oil.record();
            assert_relative_eq!(
                viscosity(oil, REF_TEMP_LOW_C),
                record.viscosity_40c,
                max_relative = 1e-6
            );
            assert_relative_eq!(
                viscosity(oil, REF_TEMP_HIGH_C),
                record.viscosity_100c,
                max_relative = 1e-6
            );
        }
    }

    #[test]
    fn reference_records_are_ordered() {
        for oil in Oil::ALL {
            let r = oil.record();
            assert!(r.viscosity_40c > r.viscosity_100c);
            assert!(r.viscosity_100c > 0.0);
        }
    }

    #[test]
    fn viscosity_decreases_with_temperature() {
        for oil in Oil::ALL {
            let mut previous = viscosity(oil, 20.0);
            for step in 1..=60 {
                let nu = viscosity(oil, 20.0 + f64::from(step));
                assert!(nu < previous, "{oil}: {nu} !< {previous} at step {step}");
                previous = nu;
            }
        }
    }

    #[test]
    fn vg220_interpolates_between_references() {
        let nu = viscosity(Oil::Vg220, 50.0);
        assert!(100.0 < nu && nu < 150.0, "nu = {nu}");
    }

    #[test]
    fn density_at_reference_and_above() {
        assert_relative_eq!(density(Oil::Vg220, 15.0), 895.0);
        assert_relative_eq!(density(Oil::Vg320, 15.0), 900.0);

        let rho_40 = density(Oil::Vg220, 40.0);
        assert!(rho_40 < 895.0);
        assert_relative_eq!(rho_40, 880.456_25, max_relative = 1e-9);
        assert_relative_eq!(density(Oil::Vg220, 50.0), 872.0, max_relative = 0.01);
    }

    #[test]
    fn density_decreases_with_temperature() {
        for oil in Oil::ALL {
            let samples: Vec<f64> = (20..=80).step_by(10).map(|t| density(oil, f64::from(t))).collect();
            assert!(samples.windows(2).all(|w| w[1] < w[0]));
        }
    }

    #[test]
    fn dynamic_viscosity_from_kinematic() {
        let props = fluid_properties(Oil::Vg220, 40.0).unwrap();
        assert_relative_eq!(props.kinematic_viscosity_cst, 220.0, max_relative = 1e-9);
        assert_relative_eq!(
            props.dynamic_viscosity_mpas,
            220.0 * 880.456_25 / 1000.0,
            max_relative = 1e-9
        );
        assert_relative_eq!(props.dynamic_viscosity_pas(), props.dynamic_viscosity_mpas / 1000.0);
        assert!(props.in_validated_range());
    }

    #[test]
    fn correction_factor_is_real_and_above_one() {
        for oil in Oil::ALL {
            for t in (20..=80).step_by(5) {
                let lcf = correction_factor(oil, f64::from(t)).unwrap();
                assert!(lcf.is_finite());
                assert!(1.0 < lcf && lcf < 1.2, "{oil} @ {t}: {lcf}");
            }
        }
        assert_relative_eq!(correction_factor(Oil::Vg220, 50.0).unwrap(), 1.073, max_relative = 0.01);
    }

    #[test]
    fn correction_factor_rejects_dense_fluid() {
        let err = correction_factor_for_density(&GL40, 8020.0).unwrap_err();
        assert!(matches!(err, CalibrationError::CorrectionFactorDomain { .. }));

        let err = correction_factor_for_density(&GL40, 0.0).unwrap_err();
        assert!(matches!(err, CalibrationError::CorrectionFactorDomain { .. }));
    }

    #[test]
    fn non_physical_density_is_rejected() {
        // ρ reaches zero near 1553 °C for the linear expansion law.
        let err = fluid_properties(Oil::Vg220, 2000.0).unwrap_err();
        assert!(matches!(err, CalibrationError::NonPhysicalDensity { .. }));
    }

    #[test]
    fn parses_oil_names() {
        assert_eq!("VG220".parse::<Oil>().unwrap(), Oil::Vg220);
        assert_eq!("vg320".parse::<Oil>().unwrap(), Oil::Vg320);
        assert_eq!(
            "VG460".parse::<Oil>().unwrap_err(),
            CalibrationError::UnknownOil("VG460".to_string())
        );
        assert_eq!(Oil::Vg320.to_string(), "VG320");
    }
}
