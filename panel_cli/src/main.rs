//! # Stiffpanel CLI
//!
//! Command-line front end for `panel_core`:
//!
//! - `evaluate <FILE>` prints failure values and sensitivities of a panel file
//! - `verify <FILE>` runs the finite-difference self tests
//! - `demo [OUTPUT]` writes a sample panel file to start from
//!
//! Set `RUST_LOG=debug` to see critical loads and Newton iteration counts.

mod demo;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{arg, ArgMatches, Command};
use log::info;
use panel_core::file_io::{load_panel, save_panel, PanelFile};
use panel_core::panel::{DesignField, FailureMode};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

fn cli() -> Command {
    Command::new("panel_cli")
        .about("Stiffened-panel failure and sensitivity evaluation")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("evaluate")
                .about("Evaluates failure values and sensitivities of a panel file")
                .arg(arg!(<FILE> "Path to a panel json file").value_parser(clap::value_parser!(PathBuf)))
                .arg(arg!(--json "Print the results as json")),
        )
        .subcommand(
            Command::new("verify")
                .about("Checks every sensitivity against finite differences")
                .arg(arg!(<FILE> "Path to a panel json file").value_parser(clap::value_parser!(PathBuf)))
                .arg(
                    arg!(--epsilon [EPSILON] "Finite-difference step")
                        .value_parser(clap::value_parser!(f64))
                        .default_value("1e-6"),
                )
                .arg(
                    arg!(--seed [SEED] "Seed of the random perturbation directions")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("0"),
                )
                .arg(
                    arg!(--tolerance [TOLERANCE] "Largest accepted relative error")
                        .value_parser(clap::value_parser!(f64))
                        .default_value("1e-4"),
                ),
        )
        .subcommand(
            Command::new("demo")
                .about("Writes a sample panel file")
                .arg(
                    arg!([OUTPUT] "Output path")
                        .value_parser(clap::value_parser!(PathBuf))
                        .default_value("demo_panel.json"),
                ),
        )
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let matches = cli().get_matches();

    if let Err(e) = match matches.subcommand() {
        Some(("evaluate", sub_m)) => evaluate(sub_m),
        Some(("verify", sub_m)) => verify(sub_m),
        Some(("demo", sub_m)) => write_demo(sub_m),
        _ => Err(anyhow!("Invalid subcommand")),
    } {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn required<'a, T: Clone + Send + Sync + 'static>(matches: &'a ArgMatches, id: &str) -> Result<&'a T> {
    matches
        .get_one::<T>(id)
        .ok_or_else(|| anyhow!("Missing argument {}", id))
}

fn load(matches: &ArgMatches) -> Result<PanelFile> {
    let path = required::<PathBuf>(matches, "FILE")?;
    load_panel(path).with_context(|| format!("Failed to load {}", path.display()))
}

#[derive(Serialize)]
struct EvaluationReport {
    label: String,
    strain: [f64; 6],
    aggregate: f64,
    fails: Vec<(String, f64)>,
    governing_mode: String,
    strain_sens: [f64; 6],
    design_var_nums: Vec<usize>,
    dv_sens: Vec<f64>,
    fields: Vec<(String, f64)>,
}

fn evaluate(matches: &ArgMatches) -> Result<()> {
    let file = load(matches)?;
    let panel = &file.panel;

    let values = panel.compute_failure_values(&file.strain)?;
    let (_, strain_sens) = panel.eval_failure_strain_sens(&file.strain)?;
    let mut dv_sens = vec![0.0; panel.num_design_vars()];
    panel.add_failure_dv_sens(&file.strain, 1.0, &mut dv_sens)?;

    let report = EvaluationReport {
        label: file.label.clone(),
        strain: file.strain,
        aggregate: values.aggregate,
        fails: FailureMode::ALL
            .iter()
            .map(|mode| (mode.name().to_string(), values.get(*mode)))
            .collect(),
        governing_mode: values.governing_mode().name().to_string(),
        strain_sens,
        design_var_nums: panel.design_var_nums(),
        dv_sens,
        fields: DesignField::ALL
            .iter()
            .map(|field| (field.name().to_string(), panel.eval_design_field_value(*field)))
            .collect(),
    };

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Panel: {}", report.label);
    println!();
    println!("Failure values:");
    for (name, value) in &report.fails {
        println!("  {:<20} {:>12.6}", name, value);
    }
    println!("  {:<20} {:>12.6}  ({} governs)", "aggregate", report.aggregate, report.governing_mode);
    println!();
    println!("d(aggregate)/d(strain):");
    for (name, value) in ["e11", "e22", "g12", "k11", "k22", "k12"].iter().zip(&report.strain_sens) {
        println!("  {:<20} {:>14.6e}", name, value);
    }
    println!();
    println!("d(aggregate)/d(design variable):");
    if report.dv_sens.is_empty() {
        println!("  (no active design variables)");
    }
    for (num, value) in report.design_var_nums.iter().zip(&report.dv_sens) {
        println!("  dv {:<17} {:>14.6e}", num, value);
    }
    println!();
    println!("Design fields:");
    for (name, value) in &report.fields {
        println!("  {:<28} {:>12.6e}", name, value);
    }
    Ok(())
}

fn verify(matches: &ArgMatches) -> Result<()> {
    let file = load(matches)?;
    let epsilon = *required::<f64>(matches, "epsilon")?;
    let seed = *required::<u64>(matches, "seed")?;
    let tolerance = *required::<f64>(matches, "tolerance")?;

    let mut rng = StdRng::seed_from_u64(seed);
    let report = file.panel.self_test(&file.strain, epsilon, &mut rng)?;

    println!("{:<32} {:>16} {:>16} {:>10}", "check", "adjoint", "finite diff", "rel err");
    for named in &report.checks {
        let check = &named.check;
        let flag = if check.passed(tolerance) { "" } else { "  <-- FAIL" };
        println!(
            "{:<32} {:>16.8e} {:>16.8e} {:>10.2e}{}",
            named.name, check.adjoint, check.finite_difference, check.relative_error, flag
        );
    }
    println!();
    println!("Max relative error: {:.3e}", report.max_relative_error());

    if report.passed(tolerance) {
        println!("All {} checks passed", report.checks.len());
        Ok(())
    } else {
        let worst = report
            .worst()
            .map(|c| c.name.clone())
            .unwrap_or_default();
        Err(anyhow!(
            "Derivative check failed (worst: {}, tolerance {:e})",
            worst,
            tolerance
        ))
    }
}

fn write_demo(matches: &ArgMatches) -> Result<()> {
    let path = required::<PathBuf>(matches, "OUTPUT")?;
    let file = demo::demo_file();
    save_panel(&file, path).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("demo panel written");
    println!("Wrote {}", path.display());
    Ok(())
}
