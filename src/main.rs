use clap::Parser;
use dssat_simobs::SimObsError;
use dssat_simobs::cli::{Args, commands};
use std::process;

fn main() {
    let args = Args::parse();

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    if let Err(error) = runtime.block_on(commands::run(args)) {
        eprintln!("Error: {:#}", error);
        process::exit(exit_code(&error));
    }
}

/// 2 for bad input (crop name, configuration), 1 for everything else
fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<SimObsError>() {
        Some(SimObsError::InvalidCrop { .. } | SimObsError::Configuration { .. }) => 2,
        _ => 1,
    }
}
