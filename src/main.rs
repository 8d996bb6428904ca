use std::process::ExitCode;

use clap::Parser;
use log::{info, warn};

use oil_orifice::{
    calculate_corrected_orifice, calculate_orifice_diameter, correction_factor, fluid_properties,
    CalculationResult, Oil, GL40,
};
use oil_orifice::oil::{in_validated_range, VALIDATED_TEMP_MAX_C, VALIDATED_TEMP_MIN_C};

mod report;

/// Upper end of the GL40 flow scale (L/min).
const MAX_FLOW_LPM: f64 = 250.0;

/// Orifice sizing for the Eletta S2 GL40 flow monitor running VG220/VG320 gear oils.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Oil type: VG220 or VG320.
    #[arg(long)]
    oil: Oil,

    /// Operating temperature in °C.
    #[arg(short, long, allow_negative_numbers = true)]
    temp: f64,

    /// Target flow rate in L/min for a single point calculation.
    #[arg(short, long)]
    flow: Option<f64>,

    /// Min and max flow in L/min for a calibration table.
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"])]
    flow_range: Option<Vec<f64>>,

    /// Number of rows in the calibration table.
    #[arg(long, default_value_t = 10)]
    steps: usize,

    /// Show fluid properties only.
    #[arg(long)]
    props_only: bool,

    /// Calculate the corrected orifice diameter. Requires --true-flow, --sensor-reading and --current-orifice.
    #[arg(long)]
    correct: bool,

    /// Actual flow rate in L/min (correction mode).
    #[arg(long)]
    true_flow: Option<f64>,

    /// Current sensor reading in L/min (correction mode).
    #[arg(long)]
    sensor_reading: Option<f64>,

    /// Installed orifice diameter in mm (correction mode).
    #[arg(long)]
    current_orifice: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
enum Mode {
    Single {
        flow: f64,
    },
    Sweep {
        min: f64,
        max: f64,
        steps: usize,
    },
    Properties,
    Correct {
        true_flow: f64,
        sensor_reading: f64,
        current_orifice: f64,
    },
}

fn check_flow(label: &str, flow: f64) -> Result<f64, String> {
    if flow <= 0.0 || flow > MAX_FLOW_LPM {
        Err(format!(
            "{label} {flow} L/min outside valid range (0-{})",
            MAX_FLOW_LPM
        ))
    } else {
        Ok(flow)
    }
}

fn resolve_mode(args: &Args) -> Result<Mode, String> {
    let selected = [
        args.flow.is_some(),
        args.flow_range.is_some(),
        args.props_only,
        args.correct,
    ]
    .into_iter()
    .filter(|&on| on)
    .count();

    match selected {
        0 => return Err("must specify --flow, --flow-range, --props-only, or --correct".into()),
        1 => {}
        _ => {
            return Err(
                "can only specify one of --flow, --flow-range, --props-only, or --correct".into(),
            )
        }
    }

    if args.correct {
        let true_flow = args.true_flow.ok_or("--correct requires --true-flow")?;
        let sensor_reading = args
            .sensor_reading
            .ok_or("--correct requires --sensor-reading")?;
        let current_orifice = args
            .current_orifice
            .ok_or("--correct requires --current-orifice")?;

        if current_orifice <= 0.0 || current_orifice >= GL40.pipe_diameter_mm {
            return Err(format!(
                "current orifice {current_orifice} mm outside valid range (0-{})",
                GL40.pipe_diameter_mm
            ));
        }

        return Ok(Mode::Correct {
            true_flow: check_flow("true flow", true_flow)?,
            sensor_reading: check_flow("sensor reading", sensor_reading)?,
            current_orifice,
        });
    }

    if let Some(flow) = args.flow {
        return Ok(Mode::Single {
            flow: check_flow("flow rate", flow)?,
        });
    }

    if let Some(range) = &args.flow_range {
        let (min, max) = match range.as_slice() {
            [min, max] => (*min, *max),
            _ => return Err("--flow-range takes exactly two values".into()),
        };
        if min <= 0.0 || max > MAX_FLOW_LPM {
            return Err(format!(
                "flow range outside valid range (0-{} L/min)",
                MAX_FLOW_LPM
            ));
        }
        if min >= max {
            return Err("minimum flow must be less than maximum flow".into());
        }
        if args.steps < 2 {
            return Err("--steps must be at least 2".into());
        }
        return Ok(Mode::Sweep {
            min,
            max,
            steps: args.steps,
        });
    }

    Ok(Mode::Properties)
}

/// Evenly spaced flows from `min` to `max` inclusive.
fn sweep_flows(min: f64, max: f64, steps: usize) -> Vec<f64> {
    let step = (max - min) / (steps - 1) as f64;
    (0..steps).map(|i| min + i as f64 * step).collect()
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mode = resolve_mode(args)?;
    let oil = args.oil;
    let temp = args.temp;

    if !in_validated_range(temp) {
        warn!("temperature {temp} °C outside validated range");
        eprintln!(
            "Warning: Temperature {temp}°C outside validated range ({}-{}°C)",
            VALIDATED_TEMP_MIN_C, VALIDATED_TEMP_MAX_C
        );
    }

    let fluid = fluid_properties(oil, temp)?;
    let mut out = report::header();
    let temp_line = ("Temperature", format!("{temp} °C"));

    match mode {
        Mode::Single { flow } => {
            let result = calculate_orifice_diameter(flow, oil, temp)?;
            out.push_str(&report::inputs(&[
                report::oil_line(oil),
                temp_line,
                ("Target Flow", format!("{flow} L/min")),
            ]));
            out.push_str(&report::fluid_properties(&fluid));
            out.push_str(&report::calculation(&result));
        }
        Mode::Sweep { min, max, steps } => {
            let results = sweep_flows(min, max, steps)
                .into_iter()
                .map(|flow| calculate_orifice_diameter(flow, oil, temp))
                .collect::<Result<Vec<CalculationResult>, _>>()?;
            out.push_str(&report::inputs(&[
                report::oil_line(oil),
                temp_line,
                ("Flow Range", format!("{min}-{max} L/min")),
            ]));
            out.push_str(&report::fluid_properties(&fluid));
            out.push_str(&report::sweep_table(&results));
        }
        Mode::Properties => {
            out.push_str(&report::inputs(&[report::oil_line(oil), temp_line]));
            out.push_str(&report::fluid_properties(&fluid));
            out.push_str(&report::correction_factor(correction_factor(oil, temp)?));
        }
        Mode::Correct {
            true_flow,
            sensor_reading,
            current_orifice,
        } => {
            let result =
                calculate_corrected_orifice(oil, temp, true_flow, sensor_reading, current_orifice)?;
            out.push_str(&report::inputs(&[
                report::oil_line(oil),
                temp_line,
                ("True Flow", format!("{true_flow} L/min")),
                ("Sensor Reading", format!("{sensor_reading} L/min")),
                ("Current Orifice", format!("{current_orifice} mm")),
            ]));
            out.push_str(&report::fluid_properties(&fluid));
            out.push_str(&report::correction(&result));
        }
    }

    out.push_str(&report::footer());
    print!("{out}");
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();

    info!(" [!] Parsed arguments: {} @ {} °C", args.oil, args.temp);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
