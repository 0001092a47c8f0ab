//! Presentation adapter: turns user input into a scoring call and renders
//! the aggregate as a plain-text report.
//!
//! The report has the same sections the dashboard always showed: an alert
//! banner, one metric per model, a bar chart of per-model fraud probability,
//! a gauge of the mean and a detailed table.

use crate::config::{PresentationConfig, ScoringConfig};
use crate::error::{FraudScoringError, Result};
use crate::models::aggregator::PredictionAggregator;
use crate::models::registry::ModelRegistry;
use crate::samples::{sample_fraud, sample_normal};
use crate::types::{AggregateResult, RiskBand, RiskBandThresholds};
use crate::validator::{parse_json, validate};
use rand::Rng;
use serde_json::{Map, Value};

const BAR_WIDTH: usize = 40;
const GAUGE_WIDTH: usize = 50;

/// Where a transaction comes from
#[derive(Debug, Clone)]
pub enum InputSource {
    /// Field values typed in by the user
    Manual(Map<String, Value>),
    SampleNormal,
    SampleFraud,
    /// Pasted JSON text; empty text falls back to the normal sample
    Json(String),
}

/// Turn an input source into a raw field mapping.
pub fn resolve_input<R: Rng + ?Sized>(source: InputSource, rng: &mut R) -> Result<Map<String, Value>> {
    match source {
        InputSource::Manual(raw) => Ok(raw),
        InputSource::SampleNormal => Ok(sample_normal(rng)),
        InputSource::SampleFraud => Ok(sample_fraud(rng)),
        InputSource::Json(text) if text.trim().is_empty() => Ok(sample_normal(rng)),
        InputSource::Json(text) => parse_json(&text),
    }
}

/// Validate a raw mapping and score it against every model.
pub fn analyze(
    raw: &Map<String, Value>,
    aggregator: &PredictionAggregator,
    registry: &ModelRegistry,
) -> Result<AggregateResult> {
    let record = validate(raw)?;
    let result = aggregator.score(&record, registry)?;
    Ok(result)
}

/// Rendering settings for the report
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    model_threshold: f64,
    risk_bands: RiskBandThresholds,
}

impl ReportRenderer {
    pub fn new(scoring: &ScoringConfig, presentation: &PresentationConfig) -> Self {
        Self {
            model_threshold: scoring.model_threshold,
            risk_bands: presentation.risk_bands.clone(),
        }
    }

    /// Full report: banner, metrics, chart, gauge, table
    pub fn render(&self, result: &AggregateResult) -> String {
        [
            self.render_banner(result),
            self.render_model_metrics(result),
            self.render_bar_chart(result),
            self.render_gauge(result),
            self.render_table(result),
        ]
        .join("\n")
    }

    pub fn render_banner(&self, result: &AggregateResult) -> String {
        let title = if result.is_fraud_alert {
            "🚨 FRAUD ALERT"
        } else {
            "✅ SAFE TRANSACTION"
        };

        section(vec![
            title.to_string(),
            format!("  Mean fraud probability: {}", percent(result.mean_fraud_probability)),
            format!("  Max fraud probability:  {}", percent(result.max_fraud_probability)),
            format!(
                "  Models flagging fraud:  {}/{}",
                result.models_flagging,
                result.scores.len()
            ),
        ])
    }

    pub fn render_model_metrics(&self, result: &AggregateResult) -> String {
        let mut lines = vec!["Results by model".to_string()];
        lines.extend(result.scores.iter().map(|(key, score)| {
            format!(
                "  {:<20} {:>6}  (Normal: {})",
                key.display_name(),
                percent(score.fraud_probability),
                percent(score.normal_probability)
            )
        }));
        section(lines)
    }

    /// Horizontal bars, one per model, marked `!` above the per-model threshold
    pub fn render_bar_chart(&self, result: &AggregateResult) -> String {
        let mut lines = vec!["Fraud probability by model".to_string()];
        lines.extend(result.fraud_probabilities().into_iter().map(|(key, p)| {
            let filled = ((p * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
            let marker = if p > self.model_threshold { '!' } else { ' ' };
            format!(
                "  {:<10} |{}{}| {:.3} {}",
                key.as_str(),
                "█".repeat(filled),
                " ".repeat(BAR_WIDTH - filled),
                p,
                marker
            )
        }));
        section(lines)
    }

    /// Gauge of the mean with its colour band and the alert threshold marked `|`
    pub fn render_gauge(&self, result: &AggregateResult) -> String {
        let mean = result.mean_fraud_probability;
        let position = |p: f64| ((p * GAUGE_WIDTH as f64).round() as usize).min(GAUGE_WIDTH);

        let needle = position(mean);
        let threshold = position(result.alert_threshold);
        let scale: String = (0..=GAUGE_WIDTH)
            .map(|i| {
                if i == needle {
                    '▲'
                } else if i == threshold {
                    '|'
                } else {
                    let p = i as f64 / GAUGE_WIDTH as f64;
                    match RiskBand::from_probability(p, &self.risk_bands) {
                        RiskBand::Low => '░',
                        RiskBand::Medium => '▒',
                        RiskBand::High => '▓',
                    }
                }
            })
            .collect();

        let band = RiskBand::from_probability(mean, &self.risk_bands);
        let delta = mean - result.alert_threshold;

        section(vec![
            "Mean fraud probability".to_string(),
            format!("  0 {} 1", scale),
            format!(
                "  {:.3} ({:?} risk, {:+.3} vs threshold {:.2})",
                mean, band, delta, result.alert_threshold
            ),
        ])
    }

    pub fn render_table(&self, result: &AggregateResult) -> String {
        let mut lines = vec![
            "Detailed predictions".to_string(),
            format!(
                "  {:<12} │ {:>18} │ {:>17} │ {:<10}",
                "Model", "Normal Probability", "Fraud Probability", "Prediction"
            ),
            format!("  {}", "─".repeat(66)),
        ];
        lines.extend(result.scores.iter().map(|(key, score)| {
            format!(
                "  {:<12} │ {:>18.4} │ {:>17.4} │ {}",
                title_case(key.as_str()),
                score.normal_probability,
                score.fraud_probability,
                score.verdict(self.model_threshold)
            )
        }));
        section(lines)
    }
}

/// Render any failure as a one-line message naming the failing component
pub fn render_error(error: &FraudScoringError) -> String {
    format!("❌ {}", error)
}

fn section(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn percent(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ModelKey, ModelScore};
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeMap;

    fn result(fraud: [f64; 4]) -> AggregateResult {
        let scores: BTreeMap<ModelKey, ModelScore> = ModelKey::ALL
            .iter()
            .zip(fraud)
            .map(|(key, p)| (*key, ModelScore::from_fraud(p)))
            .collect();
        let mean = fraud.iter().sum::<f64>() / 4.0;
        AggregateResult {
            request_id: "req".to_string(),
            scores,
            mean_fraud_probability: mean,
            max_fraud_probability: fraud.iter().copied().fold(0.0, f64::max),
            alert_threshold: 0.5,
            is_fraud_alert: mean > 0.5,
            models_flagging: fraud.iter().filter(|&&p| p > 0.5).count(),
            scored_at: Utc::now(),
        }
    }

    fn renderer() -> ReportRenderer {
        ReportRenderer::new(&ScoringConfig::default(), &PresentationConfig::default())
    }

    #[test]
    fn test_banner_reflects_alert() {
        let alert = renderer().render_banner(&result([0.9, 0.8, 0.6, 0.7]));
        assert!(alert.starts_with("🚨 FRAUD ALERT"));
        assert!(alert.contains("75.0%"));
        assert!(alert.contains("90.0%"));

        let safe = renderer().render_banner(&result([0.1, 0.2, 0.1, 0.2]));
        assert!(safe.starts_with("✅ SAFE TRANSACTION"));
    }

    #[test]
    fn test_table_labels_each_model() {
        let table = renderer().render_table(&result([0.2, 0.4, 0.9, 0.5]));
        let rows: Vec<&str> = table.lines().skip(3).collect();

        assert_eq!(rows.len(), 4);
        assert!(rows[0].starts_with("  Logistic") && rows[0].ends_with("NORMAL"));
        assert!(rows[1].starts_with("  Kneighbors") && rows[1].ends_with("NORMAL"));
        assert!(rows[2].starts_with("  Svc") && rows[2].ends_with("FRAUDE"));
        // 0.5 is not above the per-model threshold
        assert!(rows[3].starts_with("  Tree") && rows[3].ends_with("NORMAL"));
        assert!(rows[2].contains("0.9000"));
    }

    #[test]
    fn test_bar_chart_marks_models_above_threshold() {
        let chart = renderer().render_bar_chart(&result([0.2, 0.4, 0.9, 0.7]));
        let flagged: Vec<&str> = chart.lines().filter(|l| l.ends_with('!')).collect();
        assert_eq!(flagged.len(), 2);
    }

    #[test]
    fn test_gauge_reports_band() {
        let gauge = renderer().render_gauge(&result([0.9, 0.8, 0.9, 0.8]));
        assert!(gauge.contains("High risk"));
        assert!(gauge.contains("+0.350"));
    }

    #[test]
    fn test_full_report_has_every_section() {
        let report = renderer().render(&result([0.2, 0.4, 0.9, 0.7]));
        for section in [
            "Results by model",
            "Fraud probability by model",
            "Mean fraud probability",
            "Detailed predictions",
        ] {
            assert!(report.contains(section), "missing section {}", section);
        }
        assert!(report.contains("Decision Tree"));
    }

    #[test]
    fn test_sections_end_with_one_newline() {
        let renderer = renderer();
        let result = result([0.2, 0.4, 0.9, 0.7]);

        for section in [
            renderer.render_banner(&result),
            renderer.render_model_metrics(&result),
            renderer.render_bar_chart(&result),
            renderer.render_gauge(&result),
            renderer.render_table(&result),
        ] {
            assert!(section.ends_with('\n') && !section.ends_with("\n\n"));
        }
        assert_eq!(renderer.render_model_metrics(&result).lines().count(), 5);
    }

    #[test]
    fn test_resolve_input() {
        let mut rng = StdRng::seed_from_u64(1);

        assert!(resolve_input(InputSource::Json(String::new()), &mut rng).is_ok());
        assert_eq!(
            resolve_input(InputSource::SampleFraud, &mut rng).unwrap()["amount"],
            Value::from(5000.0)
        );
        assert!(matches!(
            resolve_input(InputSource::Json("{\"amount\": ".to_string()), &mut rng),
            Err(FraudScoringError::MalformedJson(_))
        ));
    }

    #[test]
    fn test_render_error_names_component() {
        let err = FraudScoringError::NotAnObject;
        assert!(render_error(&err).contains("input:"));
    }
}
