//! Sample Transaction Generator
//!
//! Prints canned transactions as JSON lines, ready to paste or pipe into
//! the interactive front-end.

use anyhow::Result;
use fraud_scoring::samples::{sample_fraud, sample_normal};
use fraud_scoring::validator::validate;
use rand::Rng;
use tracing::{info, warn};

/// Share of fraudulent samples in the output
const FRAUD_RATE: f64 = 0.2;
const SAMPLE_COUNT: usize = 20;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_generator=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut rng = rand::thread_rng();
    let mut fraud_count = 0;

    for _ in 0..SAMPLE_COUNT {
        let is_fraud = rng.gen_bool(FRAUD_RATE);
        let raw = if is_fraud {
            fraud_count += 1;
            sample_fraud(&mut rng)
        } else {
            sample_normal(&mut rng)
        };

        let record = match validate(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Generated sample failed validation");
                continue;
            }
        };
        println!("{}", serde_json::to_string(&record.to_raw())?);
    }

    info!(
        total = SAMPLE_COUNT,
        fraudulent = fraud_count,
        "Sample generation complete"
    );
    Ok(())
}
