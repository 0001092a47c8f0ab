//! In-process scoring statistics for the interactive session.

use crate::types::{AggregateResult, ModelKey};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for scoring calls
pub struct ScoringMetrics {
    /// Total transactions scored
    pub transactions_scored: AtomicU64,
    /// Total aggregate alerts raised
    pub alerts_raised: AtomicU64,
    /// Records rejected by the validator
    pub validation_failures: AtomicU64,
    /// Scoring calls that failed on a model
    pub scoring_failures: AtomicU64,
    /// End-to-end scoring times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Model inference times (in microseconds)
    model_times: RwLock<BTreeMap<ModelKey, Vec<u64>>>,
    /// Mean fraud probability distribution buckets
    score_buckets: RwLock<[u64; 10]>,
    /// Model agreement per scored transaction
    model_agreements: RwLock<Vec<f64>>,
    start_time: Instant,
}

impl ScoringMetrics {
    pub fn new() -> Self {
        Self {
            transactions_scored: AtomicU64::new(0),
            alerts_raised: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            scoring_failures: AtomicU64::new(0),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            model_times: RwLock::new(BTreeMap::new()),
            score_buckets: RwLock::new([0; 10]),
            model_agreements: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a successful scoring call
    pub fn record_result(&self, processing_time: Duration, result: &AggregateResult) {
        self.transactions_scored.fetch_add(1, Ordering::Relaxed);
        if result.is_fraud_alert {
            self.alerts_raised.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        let bucket = (result.mean_fraud_probability * 10.0).clamp(0.0, 9.0) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }

        self.record_model_agreement(result);
    }

    pub fn record_validation_failure(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scoring_failure(&self) {
        self.scoring_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record model inference time
    pub fn record_model_time(&self, key: ModelKey, duration: Duration) {
        if let Ok(mut times) = self.model_times.write() {
            let model_times = times.entry(key).or_default();
            model_times.push(duration.as_micros() as u64);
            if model_times.len() > 1000 {
                model_times.drain(0..500);
            }
        }
    }

    /// Agreement = 1 - std dev of the fraud probabilities
    fn record_model_agreement(&self, result: &AggregateResult) {
        let scores: Vec<f64> = result.scores.values().map(|s| s.fraud_probability).collect();
        if scores.len() < 2 {
            return;
        }

        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / scores.len() as f64;
        let agreement = 1.0 - variance.sqrt().min(1.0);

        if let Ok(mut agreements) = self.model_agreements.write() {
            agreements.push(agreement);
            if agreements.len() > 1000 {
                agreements.drain(0..500);
            }
        }
    }

    pub fn get_processing_stats(&self) -> ProcessingStats {
        let Ok(times) = self.processing_times.read() else {
            return ProcessingStats::default();
        };
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted = times.clone();
        sorted.sort_unstable();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sorted.iter().sum::<u64>() / count as u64,
            p50_us: percentile(&sorted, 0.50),
            p95_us: percentile(&sorted, 0.95),
            p99_us: percentile(&sorted, 0.99),
            max_us: sorted[count - 1],
        }
    }

    pub fn get_model_stats(&self) -> BTreeMap<ModelKey, ModelStats> {
        let Ok(times) = self.model_times.read() else {
            return BTreeMap::new();
        };

        times
            .iter()
            .filter(|(_, t)| !t.is_empty())
            .map(|(key, model_times)| {
                let mut sorted = model_times.clone();
                sorted.sort_unstable();
                let count = sorted.len();
                (
                    *key,
                    ModelStats {
                        calls: count as u64,
                        mean_us: sorted.iter().sum::<u64>() / count as u64,
                        p50_us: percentile(&sorted, 0.50),
                        p99_us: percentile(&sorted, 0.99),
                    },
                )
            })
            .collect()
    }

    pub fn get_avg_agreement(&self) -> f64 {
        match self.model_agreements.read() {
            Ok(agreements) if !agreements.is_empty() => {
                agreements.iter().sum::<f64>() / agreements.len() as f64
            }
            _ => 0.0,
        }
    }

    pub fn get_score_distribution(&self) -> [u64; 10] {
        self.score_buckets.read().map(|b| *b).unwrap_or([0; 10])
    }

    /// Log summary statistics
    /// Log the session summary box
    pub fn print_summary(&self) {
        for line in self.summary_lines() {
            info!("{}", line);
        }
    }

    /// Session summary as box-drawn lines, every boxed row the same width
    pub fn summary_lines(&self) -> Vec<String> {
        let scored = self.transactions_scored.load(Ordering::Relaxed);
        let alerts = self.alerts_raised.load(Ordering::Relaxed);
        let rejected = self.validation_failures.load(Ordering::Relaxed);
        let failed = self.scoring_failures.load(Ordering::Relaxed);
        let alert_rate = if scored > 0 {
            (alerts as f64 / scored as f64) * 100.0
        } else {
            0.0
        };

        let processing = self.get_processing_stats();
        let agreement = self.get_avg_agreement();
        let score_dist = self.get_score_distribution();

        let mut lines = vec![
            rule('╔', '╗'),
            boxed(&format!("{:^width$}", "FRAUD SCORING - SESSION SUMMARY", width = SUMMARY_WIDTH)),
            rule('╠', '╣'),
            boxed(&format!(
                " Transactions Scored: {:>8}  │  Session: {:>8.1}s",
                scored,
                self.start_time.elapsed().as_secs_f64()
            )),
            boxed(&format!(
                " Fraud Alerts:        {:>8}  │  Alert Rate: {:>6.1}%",
                alerts, alert_rate
            )),
            boxed(&format!(
                " Rejected Records:    {:>8}  │  Scoring Failures: {:>6}",
                rejected, failed
            )),
            rule('╠', '╣'),
            boxed(&format!(
                " Scoring Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5}",
                processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
            )),
            boxed(&format!(
                " Model Agreement: {:>5.1}% (higher = models agree more)",
                agreement * 100.0
            )),
            rule('╠', '╣'),
            boxed(" Mean Fraud Probability Distribution:"),
        ];

        let total: u64 = score_dist.iter().sum();
        for (i, &count) in score_dist.iter().enumerate() {
            let pct = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar = "█".repeat(((pct / 2.0) as usize).min(20));
            lines.push(boxed(&format!(
                "   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            )));
        }
        lines.push(rule('╚', '╝'));

        let model_stats = self.get_model_stats();
        if !model_stats.is_empty() {
            lines.push("Model Inference Times (μs):".to_string());
            for (key, stats) in &model_stats {
                lines.push(format!(
                    "  {}: mean={} p50={} p99={} (calls={})",
                    key, stats.mean_us, stats.p50_us, stats.p99_us, stats.calls
                ));
            }
        }

        lines
    }
}

impl Default for ScoringMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Characters between the left and right borders of the summary box
const SUMMARY_WIDTH: usize = 62;

fn rule(left: char, right: char) -> String {
    format!("{}{}{}", left, "═".repeat(SUMMARY_WIDTH), right)
}

fn boxed(content: &str) -> String {
    let pad = SUMMARY_WIDTH.saturating_sub(content.chars().count());
    format!("║{}{}║", content, " ".repeat(pad))
}

fn percentile(sorted: &[u64], q: f64) -> u64 {
    let idx = ((sorted.len() as f64 * q) as usize).min(sorted.len() - 1);
    sorted[idx]
}

/// Scoring time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Model-specific statistics
#[derive(Debug)]
pub struct ModelStats {
    pub calls: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p99_us: u64,
}
