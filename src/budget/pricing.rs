//! Model pricing and cost computation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Per-model rates in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    #[serde(rename = "input")]
    pub input_per_million: f64,
    #[serde(rename = "output")]
    pub output_per_million: f64,
}

impl ModelPricing {
    pub fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            input_per_million,
            output_per_million,
        }
    }

    pub fn cost(&self, prompt_tokens: u64, completion_tokens: u64) -> CostBreakdown {
        let input = prompt_tokens as f64 / 1_000_000.0 * self.input_per_million;
        let output = completion_tokens as f64 / 1_000_000.0 * self.output_per_million;
        CostBreakdown {
            input,
            output,
            total: input + output,
        }
    }
}

/// Cost of one call in USD.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub input: f64,
    pub output: f64,
    pub total: f64,
}

impl CostBreakdown {
    pub const ZERO: CostBreakdown = CostBreakdown {
        input: 0.0,
        output: 0.0,
        total: 0.0,
    };

    pub fn accumulate(&mut self, other: &CostBreakdown) {
        self.input += other.input;
        self.output += other.output;
        self.total += other.total;
    }
}

/// Immutable lookup table from exact model id to pricing.
#[derive(Debug, Clone, Default)]
pub struct PricingTable {
    models: HashMap<String, ModelPricing>,
}

impl PricingTable {
    /// Negative or non-finite rates are clamped to zero so costs stay non-negative.
    pub fn new(models: HashMap<String, ModelPricing>) -> Self {
        let models = models
            .into_iter()
            .map(|(model, pricing)| {
                let clamped = ModelPricing::new(
                    non_negative(pricing.input_per_million),
                    non_negative(pricing.output_per_million),
                );
                if clamped != pricing {
                    tracing::warn!("Invalid rates for model {} clamped to zero", model);
                }
                (model, clamped)
            })
            .collect();
        Self { models }
    }

    pub fn get(&self, model: &str) -> Option<&ModelPricing> {
        self.models.get(model)
    }

    pub fn is_priced(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Cost of a call. Unknown models cost zero and log a warning.
    pub fn cost(&self, model: &str, prompt_tokens: u64, completion_tokens: u64) -> CostBreakdown {
        match self.models.get(model) {
            Some(pricing) => pricing.cost(prompt_tokens, completion_tokens),
            None => {
                tracing::warn!("No pricing entry for model {}, reporting zero cost", model);
                CostBreakdown::ZERO
            }
        }
    }
}

/// Render a USD amount for humans.
///
/// Tiny amounts are shown per thousand calls (`$0.40/1K`); otherwise the
/// precision shrinks as the amount grows. Rounding is half-up at the shown
/// precision, and the band is picked from the rounded amount so `0.99996`
/// renders as `$1.00`.
pub fn format_cost(value: f64) -> String {
    if value == 0.0 {
        return "$0.00".to_string();
    }
    let per_thousand = round_half_up(value * 1000.0, 2);
    if per_thousand < 1.0 {
        return format!("${:.2}/1K", per_thousand);
    }
    let decimals = if round_half_up(value, 4) < 0.01 {
        4
    } else if round_half_up(value, 3) < 1.0 {
        3
    } else {
        2
    };
    format!("${:.*}", decimals, round_half_up(value, decimals))
}

fn non_negative(rate: f64) -> f64 {
    if rate.is_finite() && rate > 0.0 {
        rate
    } else {
        0.0
    }
}

/// Half-up rounding with a small tolerance for binary representation error
/// (0.0285 is stored as 0.028499999...).
fn round_half_up(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor + 0.5 + 1e-9).floor() / factor
}
