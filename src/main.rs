use agro_pipeline::config::{render_config, resolve_config};
use agro_pipeline::gateway::{HttpTransport, StaticLocator};
use agro_pipeline::output::{render_json, render_text};
use agro_pipeline::workflow::parse_position;
use agro_pipeline::{run_pipeline, Gateways, LocationInput, RunInputs};
use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod cli;

fn main() -> ExitCode {
    let args = cli::RootArgs::parse();
    let verbose = matches!(&args.command, cli::Command::Run(run) if run.verbose);
    init_tracing(verbose);

    let outcome = match args.command {
        cli::Command::Run(args) => run(args),
        cli::Command::Config(args) => config(args),
    };
    match outcome {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(args: cli::RunArgs) -> Result<ExitCode> {
    let config = resolve_config(args.source.config.as_deref())?;
    let device = args
        .device_position
        .as_deref()
        .map(parse_position)
        .transpose()
        .context("parse --device-position")?;

    let location = if args.use_current_location {
        LocationInput::CurrentDevice
    } else if let (Some(city), Some(state)) = (args.city, args.state) {
        LocationInput::Place { city, state }
    } else if let (Some(latitude), Some(longitude)) = (args.latitude, args.longitude) {
        LocationInput::Coordinates {
            latitude,
            longitude,
        }
    } else {
        LocationInput::Manual
    };
    let inputs = RunInputs {
        location,
        rainfall: args.rainfall,
        temperature: args.temperature,
        soil_color: args.soil_color,
        ph: args.ph,
        stop_after: args.stop_after,
    };

    let transport = HttpTransport::new(config.timeout());
    let gateways = Gateways::from_config(&config, &transport);
    let locator = StaticLocator::new(device);
    let report = run_pipeline(&gateways, &locator, &inputs)?;

    if args.json {
        println!("{}", render_json(&report)?);
    } else {
        print!("{}", render_text(&report));
    }
    Ok(if report.completed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn config(args: cli::ConfigArgs) -> Result<ExitCode> {
    let config = resolve_config(args.source.config.as_deref())?;
    println!("{}", render_config(&config)?);
    Ok(ExitCode::SUCCESS)
}
