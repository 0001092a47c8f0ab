//! Fraud Scoring - Interactive Front-End
//!
//! Reads transactions from the terminal, scores them against the four
//! classifiers and prints the report.

use anyhow::{Context, Result};
use fraud_scoring::{
    config::{AppConfig, LoggingConfig},
    error::FraudScoringError,
    metrics::ScoringMetrics,
    models::{ModelRegistry, PredictionAggregator},
    presentation::{analyze, render_error, resolve_input, InputSource, ReportRenderer},
    types::transaction::field_names,
};
use serde_json::{Map, Value};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
Commands:
  normal          score a typical legitimate transaction
  fraud           score a transaction shaped like fraud
  manual          enter amount, time and v1..v28 one by one
  {...}           score a JSON object (same as: json {...})
  summary         show session statistics
  help            show this message
  quit            exit";

fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging)?;

    info!("Starting fraud scoring front-end");
    info!(
        alert_threshold = config.scoring.alert_threshold,
        model_threshold = config.scoring.model_threshold,
        "Configuration loaded"
    );

    let registry = ModelRegistry::shared(&config.models).with_context(|| {
        format!(
            "Could not load the models; check that the .onnx files are in '{}'",
            config.models.models_dir
        )
    })?;
    println!("✅ {} models loaded", registry.keys().count());

    let metrics = Arc::new(ScoringMetrics::new());
    let aggregator = PredictionAggregator::new(&config.scoring).with_metrics(metrics.clone());
    let renderer = ReportRenderer::new(&config.scoring, &config.presentation);
    let mut rng = rand::thread_rng();

    println!("{}", HELP);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let command = line.trim();

        let source = match command {
            "" => continue,
            "quit" | "exit" => break,
            "help" => {
                println!("{}", HELP);
                continue;
            }
            "summary" => {
                metrics.print_summary();
                continue;
            }
            "normal" => InputSource::SampleNormal,
            "fraud" => InputSource::SampleFraud,
            "manual" => match read_manual(&mut lines)? {
                Some(raw) => InputSource::Manual(raw),
                None => break,
            },
            _ => InputSource::Json(json_payload(command).to_string()),
        };

        let raw = match resolve_input(source, &mut rng) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Input rejected");
                println!("{}", render_error(&e));
                continue;
            }
        };
        println!("{}", serde_json::to_string_pretty(&raw)?);

        let started = Instant::now();
        match analyze(&raw, &aggregator, registry) {
            Ok(result) => {
                let elapsed = started.elapsed();
                metrics.record_result(elapsed, &result);
                info!(
                    request_id = %result.request_id,
                    mean_fraud_probability = result.mean_fraud_probability,
                    is_fraud_alert = result.is_fraud_alert,
                    processing_time_us = elapsed.as_micros(),
                    "Transaction scored"
                );
                println!("{}", renderer.render(&result));
            }
            Err(e) => {
                match &e {
                    FraudScoringError::Validation(v) => {
                        metrics.record_validation_failure();
                        warn!(fields = ?v.fields(), "Transaction rejected");
                    }
                    FraudScoringError::Scoring(s) => {
                        metrics.record_scoring_failure();
                        warn!(model = %s.key(), "Transaction could not be scored");
                    }
                    _ => {}
                }
                println!("{}", render_error(&e));
            }
        }
    }

    info!("Fraud scoring front-end shutting down...");
    metrics.print_summary();

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("fraud_scoring={}", logging.level).parse()?);
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    if logging.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
    Ok(())
}

/// JSON text of a command: `json <text>` drops the keyword, anything else
/// is taken verbatim. A bare `json` is empty input.
fn json_payload(command: &str) -> &str {
    match command.split_once(char::is_whitespace) {
        Some(("json", rest)) => rest.trim(),
        None if command == "json" => "",
        _ => command,
    }
}

/// Prompt for every field; a blank answer keeps the form default.
///
/// Returns `None` when stdin closes mid-form.
fn read_manual<B: BufRead>(lines: &mut io::Lines<B>) -> Result<Option<Map<String, Value>>> {
    let mut raw = Map::new();

    for name in field_names() {
        let default = match name.as_str() {
            "amount" => Value::from(100.0),
            "time" => Value::from(3600),
            _ => Value::from(0.0),
        };

        print!("  {} [{}]: ", name, default);
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            return Ok(None);
        };
        let line = line?;
        let answer = line.trim();

        // Anything that is not a JSON number is kept as text so the
        // validator can name the field
        let value = if answer.is_empty() {
            default
        } else {
            serde_json::from_str::<Value>(answer)
                .ok()
                .filter(Value::is_number)
                .unwrap_or_else(|| Value::from(answer))
        };
        raw.insert(name, value);
    }

    Ok(Some(raw))
}
