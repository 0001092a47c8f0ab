//! Canned example transactions.
//!
//! The fraudulent profile uses a large amount at an unusual hour and widens
//! the spread of the components most associated with fraud.

use crate::types::transaction::PCA_COMPONENTS;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde_json::{Map, Value};

/// Components drawn from the wider distribution in the fraudulent sample
const FRAUD_SIGNAL_COMPONENTS: [usize; 5] = [1, 3, 7, 10, 14];

/// A typical legitimate transaction: $100.50 at 01:00
pub fn sample_normal<R: Rng + ?Sized>(rng: &mut R) -> Map<String, Value> {
    build(100.50, 3600, |_| 1.0, rng)
}

/// A transaction shaped like fraud: $5000.00 at 07:00
pub fn sample_fraud<R: Rng + ?Sized>(rng: &mut R) -> Map<String, Value> {
    build(
        5000.00,
        25200,
        |i| if FRAUD_SIGNAL_COMPONENTS.contains(&i) { 2.0 } else { 0.5 },
        rng,
    )
}

fn build<R, F>(amount: f64, time: u32, std_dev: F, rng: &mut R) -> Map<String, Value>
where
    R: Rng + ?Sized,
    F: Fn(usize) -> f64,
{
    let mut raw = Map::new();
    raw.insert("amount".to_string(), Value::from(amount));
    raw.insert("time".to_string(), Value::from(time));

    for i in 1..=PCA_COMPONENTS {
        let value = match Normal::new(0.0, std_dev(i)) {
            Ok(normal) => normal.sample(rng),
            Err(_) => 0.0,
        };
        raw.insert(format!("v{}", i), Value::from(value));
    }

    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::validate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_samples_pass_validation() {
        let mut rng = StdRng::seed_from_u64(7);

        let normal = validate(&sample_normal(&mut rng)).unwrap();
        assert_eq!(normal.amount(), 100.50);
        assert_eq!(normal.time(), 3600);

        let fraud = validate(&sample_fraud(&mut rng)).unwrap();
        assert_eq!(fraud.amount(), 5000.00);
        assert_eq!(fraud.time(), 25200);
    }

    #[test]
    fn test_samples_are_seeded() {
        let a = sample_fraud(&mut StdRng::seed_from_u64(42));
        let b = sample_fraud(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
