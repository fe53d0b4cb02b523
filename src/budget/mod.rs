//! Budget module - task tiers, model pricing and cost tracking.
//!
//! # Key Concepts
//! - Tasks: declarative primary/fallback model pair and token budget per task
//! - Pricing: per-million-token rates keyed by exact model id
//! - Ledger: usage records attributed to the model that actually answered

mod ledger;
mod pricing;
mod tasks;

pub use ledger::{UsageLedger, UsageRecord, UsageSummary};
pub use pricing::{format_cost, CostBreakdown, ModelPricing, PricingTable};
pub use tasks::{TaskConfig, TaskRegistry, Tier};
