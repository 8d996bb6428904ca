//! Terminal rendering of calculation results.

use chrono::Local;
use tabled::{Style, Table, Tabled};

use oil_orifice::{
    CalculationResult, CorrectionResult, FluidProperties, Oil, OrificeAction, Warnings, GL40,
};

const WIDTH: usize = 55;

pub fn header() -> String {
    let rule = "═".repeat(WIDTH);
    format!(
        "{rule}\n  ELETTA S2 GL40 CALIBRATION RESULTS\n  {}\n{rule}\n\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}

pub fn footer() -> String {
    format!("{}\n", "═".repeat(WIDTH))
}

/// Formats a non-negative number rounded to an integer with `,` grouping.
pub fn group_thousands(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 && digits != "0" {
        grouped.insert(0, '-');
    }
    grouped
}

pub fn inputs(lines: &[(&str, String)]) -> String {
    let rows: String = lines
        .iter()
        .map(|(label, value)| format!("  {:<17}{value}\n", format!("{label}:")))
        .collect();
    format!("Input Parameters:\n{rows}\n")
}

pub fn fluid_properties(fluid: &FluidProperties) -> String {
    format!(
        "Fluid Properties @ {}°C:\n\
         \x20 Kinematic Viscosity:  {:.1} cSt\n\
         \x20 Dynamic Viscosity:    {:.1} mPa·s\n\
         \x20 Density:              {:.0} kg/m³\n\n",
        fluid.temperature_c,
        fluid.kinematic_viscosity_cst,
        fluid.dynamic_viscosity_mpas,
        fluid.density_kgm3
    )
}

fn warnings(title: &str, warnings: &Warnings) -> String {
    if warnings.is_empty() {
        return String::new();
    }
    let items: String = warnings
        .iter()
        .map(|warning| format!("  - [{warning}] {}\n", warning.describe(&GL40)))
        .collect();
    format!("⚠ {title}:\n{items}\n")
}

pub fn calculation(result: &CalculationResult) -> String {
    let mut out = format!(
        "Calculated Results:\n\
         \x20 Orifice Diameter:      {:.1} mm\n\
         \x20 Beta Ratio:            {:.3}\n\
         \x20 Correction Factor:     {:.3}\n\
         \x20 Reynolds Number:       {}\n\
         \x20 Differential Pressure: {:.0} mbar\n\n",
        result.orifice_diameter_mm,
        result.beta_ratio,
        result.correction_factor,
        group_thousands(result.reynolds_number),
        result.differential_pressure_mbar
    );

    out.push_str(&warnings("Warnings", &result.warnings));
    if result.is_valid() {
        out.push_str("Status: ✓ All parameters within valid range\n");
    } else {
        out.push_str("Status: ⚠ Some parameters outside recommended range\n");
    }
    out
}

pub fn correction_factor(lcf: f64) -> String {
    format!("Correction Factor:    {lcf:.3}\n\n")
}

#[derive(Tabled)]
struct SweepRow {
    #[tabled(rename = "Flow (L/min)")]
    flow: String,
    #[tabled(rename = "Orifice (mm)")]
    orifice: String,
    #[tabled(rename = "Beta (-)")]
    beta: String,
    #[tabled(rename = "Reynolds (-)")]
    reynolds: String,
    #[tabled(rename = "ΔP (mbar)")]
    dp: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&CalculationResult> for SweepRow {
    fn from(result: &CalculationResult) -> Self {
        let status = if result.is_valid() {
            "✓".to_string()
        } else {
            result
                .warnings
                .iter()
                .map(|w| w.tag())
                .collect::<Vec<_>>()
                .join(" ")
        };
        Self {
            flow: format!("{:.1}", result.flow_lpm),
            orifice: format!("{:.1}", result.orifice_diameter_mm),
            beta: format!("{:.3}", result.beta_ratio),
            reynolds: group_thousands(result.reynolds_number),
            dp: format!("{:.0}", result.differential_pressure_mbar),
            status,
        }
    }
}

pub fn sweep_table(results: &[CalculationResult]) -> String {
    let rows: Vec<SweepRow> = results.iter().map(SweepRow::from).collect();
    let table = Table::new(rows).with(Style::modern()).to_string();
    format!("Calibration Table:\n\n{table}\n\n")
}

pub fn correction(result: &CorrectionResult) -> String {
    let direction = if result.reading_error_pct > 0.0 { "HIGH" } else { "LOW" };
    let mut out = format!(
        "Current Situation:\n\
         \x20 Sensor reads {:.1}% {direction}\n\
         \x20 Current Orifice:      {:.1} mm\n\
         \x20 Current Beta Ratio:   {:.3}\n\
         \x20 Current ΔP:           {:.0} mbar\n\
         \x20 Current Reynolds:     {}\n\n",
        result.reading_error_pct.abs(),
        result.current_orifice_mm,
        result.current_beta,
        result.current_dp_mbar,
        group_thousands(result.current_reynolds)
    );

    out.push_str(&format!(
        "Recommended Correction:\n\
         \x20 Corrected Orifice:    {:.1} mm\n\
         \x20 Corrected Beta Ratio: {:.3}\n\
         \x20 Corrected ΔP:         {:.0} mbar\n\
         \x20 Corrected Reynolds:   {}\n\n",
        result.corrected_orifice_mm,
        result.corrected_beta,
        result.corrected_dp_mbar,
        group_thousands(result.corrected_reynolds)
    ));

    let change = result.orifice_change_pct.abs();
    let action = match result.recommendation() {
        OrificeAction::Enlarge => format!(
            "Action: Replace orifice with one {change:.1}% LARGER ({:.1} mm)",
            result.corrected_orifice_mm
        ),
        OrificeAction::Reduce => format!(
            "Action: Replace orifice with one {change:.1}% SMALLER ({:.1} mm)",
            result.corrected_orifice_mm
        ),
        OrificeAction::Keep => {
            "Action: Current orifice size is acceptable (< 0.5% change needed)".to_string()
        }
    };
    out.push_str(&action);
    out.push_str("\n\n");

    out.push_str(&warnings("Warnings with corrected orifice", &result.corrected_warnings));
    out
}

pub fn oil_line(oil: Oil) -> (&'static str, String) {
    ("Oil Type", oil.to_string())
}
