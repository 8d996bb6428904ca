//! Orifice sizing for a water-calibrated differential-pressure flow sensor
//! running industrial gear oils.
//!
//! The crate derives temperature-dependent oil properties, the liquid
//! correction factor of the float sensor, the orifice bore that meets a target
//! flow at the sensor's design differential pressure, and the replacement bore
//! that corrects a misreading installation.
//!
//! ```
//! use oil_orifice::{calculate_orifice_diameter, Oil};
//!
//! let result = calculate_orifice_diameter(150.0, Oil::Vg220, 50.0).unwrap();
//! assert!(result.beta_ratio > 0.0 && result.beta_ratio < 1.0);
//! ```

pub mod correction;
pub mod error;
pub mod oil;
pub mod orifice;
pub mod sensor;

pub use correction::{calculate_corrected_orifice, CorrectionResult, OrificeAction};
pub use error::{CalibrationError, Result};
pub use oil::{correction_factor, density, fluid_properties, viscosity, FluidProperties, Oil, OilRecord};
pub use orifice::{calculate_orifice_diameter, calculate_orifice_diameter_at, CalculationResult, SizingConfig};
pub use sensor::{SensorGeometry, Warning, Warnings, GL40};
