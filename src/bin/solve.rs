//! Command line frame solver
//!
//! ```text
//! frame-solve <input.json> <output.json> [case] [--matrices <path>]
//! ```
//!
//! The result document is always written, with FAILED status when the
//! analysis does not complete; the exit code is non-zero in that case.

use std::process::ExitCode;

use anyhow::{bail, Context};
use log::{error, info};

use frame_solver::analysis::{analyze, element_matrices, AnalysisOptions};
use frame_solver::model::ModelInput;
use frame_solver::results::{write_matrices, AnalysisOutput};

const USAGE: &str = "usage: frame-solve <input.json> <output.json> [case] [--matrices <path>]";

struct Args {
    input: String,
    output: String,
    case: String,
    matrices: Option<String>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut positional = Vec::new();
    let mut matrices = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--matrices" => matrices = Some(args.next().context("--matrices needs a path")?),
            "-h" | "--help" => bail!(USAGE),
            _ => positional.push(arg),
        }
    }

    if positional.len() < 2 || positional.len() > 3 {
        bail!(USAGE);
    }
    let mut positional = positional.into_iter();
    Ok(Args {
        input: positional.next().unwrap_or_default(),
        output: positional.next().unwrap_or_default(),
        case: positional.next().unwrap_or_else(|| AnalysisOptions::default().case_name),
        matrices,
    })
}

fn run(args: &Args) -> anyhow::Result<bool> {
    let options = AnalysisOptions::for_case(&args.case);

    let output = match ModelInput::from_json_file(&args.input) {
        Ok(model) => {
            info!(
                "Loaded {}: {} nodes, {} elements",
                args.input,
                model.num_nodes(),
                model.num_elements()
            );
            let output = analyze(&model, &options);
            if output.is_success() {
                if let Some(path) = &args.matrices {
                    let matrices = element_matrices(&model, &options)?;
                    write_matrices(&matrices, path)?;
                    info!("Element matrices written to {}", path);
                }
            }
            output
        }
        Err(e) => {
            error!("Could not load {}: {}", args.input, e);
            AnalysisOutput::failed(&e)
        }
    };

    output
        .write_json(&args.output)
        .with_context(|| format!("writing results to {}", args.output))?;
    info!("Results written to {}", args.output);
    Ok(output.is_success())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
