//! Evaluate one point from the command line
//!
//! Usage: evaluate_point <lat> <lon> <crop_id> <L|I|H> [user_data.json]
//!
//! Reads the requirement catalogue and the SSURGO extract from `DATA_DIR`
//! (default `data`) and prints the evaluation response as JSON.

use anyhow::{bail, Context, Result};
use soil_quality_rust::{CatalogueHandle, EvaluationRequest, SoilQualityEvaluator, SsurgoExtract, UserData};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "soil_quality_rust=info,warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !(4..=5).contains(&args.len()) {
        bail!("usage: evaluate_point <lat> <lon> <crop_id> <L|I|H> [user_data.json]");
    }

    let lat: f64 = args[0].parse().with_context(|| format!("invalid latitude '{}'", args[0]))?;
    let lon: f64 = args[1].parse().with_context(|| format!("invalid longitude '{}'", args[1]))?;
    let mut request = EvaluationRequest::new(lat, lon, &args[2], &args[3]);

    if let Some(path) = args.get(4) {
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
        let user: UserData = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path))?;
        request.user_data = Some(user);
    }

    let data_dir = PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()));

    let start = Instant::now();
    let catalogue = CatalogueHandle::load_dir(&data_dir)?;
    let extract = SsurgoExtract::load_dir(&data_dir)?;
    tracing::info!(elapsed_ms = start.elapsed().as_millis() as u64, "Loaded data");

    let evaluator = SoilQualityEvaluator::new(Arc::new(catalogue));
    let response = evaluator.evaluate(&request, &extract)?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
