//! Usage records and session-level aggregation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pricing::{CostBreakdown, PricingTable};
use crate::llm::TokenUsage;

/// Result of one provider call, with cost attributed to the model that answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: Uuid,
    pub task: String,
    /// Model that actually responded (may be the fallback)
    pub model: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub cost: CostBreakdown,
    /// False when the model had no pricing entry and cost was reported as zero
    pub priced: bool,
    pub fallback_used: bool,
    pub timestamp: DateTime<Utc>,
}

impl UsageRecord {
    pub fn new(
        task: impl Into<String>,
        model: impl Into<String>,
        usage: TokenUsage,
        pricing: &PricingTable,
        fallback_used: bool,
    ) -> Self {
        let model = model.into();
        let priced = pricing.is_priced(&model);
        let cost = pricing.cost(&model, usage.prompt_tokens, usage.completion_tokens);
        Self {
            id: Uuid::new_v4(),
            task: task.into(),
            model,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            cost,
            priced,
            fallback_used,
            timestamp: Utc::now(),
        }
    }
}

/// Totals over a set of usage records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageSummary {
    pub calls: usize,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub cost: CostBreakdown,
    pub unpriced_calls: usize,
    pub fallback_calls: usize,
}

impl UsageSummary {
    fn add(&mut self, record: &UsageRecord) {
        self.calls += 1;
        self.prompt_tokens += record.prompt_tokens;
        self.completion_tokens += record.completion_tokens;
        self.total_tokens += record.total_tokens;
        self.cost.accumulate(&record.cost);
        if !record.priced {
            self.unpriced_calls += 1;
        }
        if record.fallback_used {
            self.fallback_calls += 1;
        }
    }
}

/// Usage accumulated by one caller over a session.
#[derive(Debug, Clone, Default)]
pub struct UsageLedger {
    records: Vec<UsageRecord>,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: UsageRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[UsageRecord] {
        &self.records
    }

    pub fn summary(&self) -> UsageSummary {
        let mut summary = UsageSummary::default();
        for record in &self.records {
            summary.add(record);
        }
        summary
    }

    /// Totals grouped by the model that answered.
    pub fn by_model(&self) -> BTreeMap<String, UsageSummary> {
        let mut grouped: BTreeMap<String, UsageSummary> = BTreeMap::new();
        for record in &self.records {
            grouped.entry(record.model.clone()).or_default().add(record);
        }
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::ModelPricing;
    use std::collections::HashMap;

    fn pricing() -> PricingTable {
        let mut models = HashMap::new();
        models.insert("openai/gpt-4o-mini".to_string(), ModelPricing::new(0.15, 0.60));
        PricingTable::new(models)
    }

    #[test]
    fn test_record_flags_unpriced_models() {
        let priced = UsageRecord::new(
            "features",
            "openai/gpt-4o-mini",
            TokenUsage::new(1_000_000, 0),
            &pricing(),
            false,
        );
        assert!(priced.priced);
        assert!((priced.cost.total - 0.15).abs() < 1e-12);

        let unpriced = UsageRecord::new(
            "features",
            "local-model",
            TokenUsage::new(500, 500),
            &pricing(),
            true,
        );
        assert!(!unpriced.priced);
        assert_eq!(unpriced.cost, CostBreakdown::ZERO);
    }

    #[test]
    fn test_ledger_summary_and_grouping() {
        let pricing = pricing();
        let mut ledger = UsageLedger::new();
        ledger.record(UsageRecord::new("a", "openai/gpt-4o-mini", TokenUsage::new(100, 50), &pricing, false));
        ledger.record(UsageRecord::new("b", "openai/gpt-4o-mini", TokenUsage::new(200, 25), &pricing, true));
        ledger.record(UsageRecord::new("c", "unknown", TokenUsage::new(10, 10), &pricing, false));

        let summary = ledger.summary();
        assert_eq!(summary.calls, 3);
        assert_eq!(summary.prompt_tokens, 310);
        assert_eq!(summary.completion_tokens, 85);
        assert_eq!(summary.total_tokens, 395);
        assert_eq!(summary.unpriced_calls, 1);
        assert_eq!(summary.fallback_calls, 1);

        let grouped = ledger.by_model();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["openai/gpt-4o-mini"].calls, 2);
        assert_eq!(grouped["unknown"].cost, CostBreakdown::ZERO);
    }
}
