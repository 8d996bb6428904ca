//! GL40 sensor geometry and the validity envelope shared by both solvers.

use std::collections::BTreeSet;
use std::fmt;

/// Fixed geometry and operating limits of one sensor model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorGeometry {
    pub pipe_diameter_mm: f64,
    pub dp_min_mbar: f64,
    pub dp_max_mbar: f64,
    pub beta_min: f64,
    pub beta_max: f64,
    pub re_min: f64,
    pub discharge_coefficient: f64,
    pub float_density_kgm3: f64,
    pub water_density_kgm3: f64,
}

/// Eletta S2 GL40: 41 mm bore, stainless steel float, 50–200 mbar.
pub const GL40: SensorGeometry = SensorGeometry {
    pipe_diameter_mm: 41.0,
    dp_min_mbar: 50.0,
    dp_max_mbar: 200.0,
    beta_min: 0.25,
    beta_max: 0.75,
    re_min: 4000.0,
    discharge_coefficient: 0.61,
    float_density_kgm3: 8020.0,
    water_density_kgm3: 1000.0,
};

impl SensorGeometry {
    pub fn pipe_diameter_m(&self) -> f64 {
        self.pipe_diameter_mm / 1000.0
    }

    /// Design operating point: the midpoint of the valid DP range.
    pub fn operating_dp_mbar(&self) -> f64 {
        0.5 * (self.dp_min_mbar + self.dp_max_mbar)
    }

    pub fn beta_in_range(&self, beta: f64) -> bool {
        (self.beta_min..=self.beta_max).contains(&beta)
    }

    pub fn dp_in_range(&self, dp_mbar: f64) -> bool {
        (self.dp_min_mbar..=self.dp_max_mbar).contains(&dp_mbar)
    }

    /// Collects the advisory tags raised by one operating point.
    pub fn check(&self, reynolds: f64, beta: f64, dp_mbar: f64) -> Warnings {
        let mut warnings = Warnings::new();
        if reynolds < self.re_min {
            warnings.insert(Warning::LowReynolds);
        }
        if !self.beta_in_range(beta) {
            warnings.insert(Warning::BetaOutOfRange);
        }
        if !self.dp_in_range(dp_mbar) {
            warnings.insert(Warning::DpOutOfRange);
        }
        warnings
    }
}

/// Non-fatal validity violations attached to a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Warning {
    LowReynolds,
    BetaOutOfRange,
    DpOutOfRange,
    TemperatureOutOfRange,
}

pub type Warnings = BTreeSet<Warning>;

impl Warning {
    pub fn tag(self) -> &'static str {
        match self {
            Warning::LowReynolds => "LOW_REYNOLDS",
            Warning::BetaOutOfRange => "BETA_OUT_OF_RANGE",
            Warning::DpOutOfRange => "DP_OUT_OF_RANGE",
            Warning::TemperatureOutOfRange => "TEMPERATURE_OUT_OF_RANGE",
        }
    }

    /// Operator-facing explanation of the tag.
    pub fn describe(self, sensor: &SensorGeometry) -> String {
        match self {
            Warning::LowReynolds => format!(
                "Reynolds number below {} - flow may be laminar, reducing measurement accuracy",
                sensor.re_min
            ),
            Warning::BetaOutOfRange => format!(
                "beta ratio outside valid range [{}-{}] - may cause measurement errors",
                sensor.beta_min, sensor.beta_max
            ),
            Warning::DpOutOfRange => format!(
                "differential pressure outside sensor range [{}-{} mbar]",
                sensor.dp_min_mbar, sensor.dp_max_mbar
            ),
            Warning::TemperatureOutOfRange => format!(
                "temperature outside validated range [{}-{} °C]",
                crate::oil::VALIDATED_TEMP_MIN_C,
                crate::oil::VALIDATED_TEMP_MAX_C
            ),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
