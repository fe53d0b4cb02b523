//! # plancraft
//!
//! Orchestration core for generating product-planning artifacts (insight
//! summaries, feature lists, requirement documents, design tokens,
//! implementation prompts) with external LLM providers.
//!
//! This library provides:
//! - Task-to-model routing from an editable models file
//! - Single-substitution fallback when a provider call fails
//! - Per-call cost attribution to the model that actually answered
//! - Skill detection and prompt enrichment for exported artifacts
//!
//! ## Architecture
//!
//! ```text
//!        ┌──────────────────────────────────┐
//!        │       FallbackOrchestrator       │
//!        │  (task registry, pricing table)  │
//!        └────────────────┬─────────────────┘
//!                         │
//!                         ▼
//!                ┌─────────────────┐
//!                │ ProviderRouter  │
//!                └───┬─────────┬───┘
//!                    ▼         ▼
//!             OpenRouter     Gemini
//!             (vendor/model) (model)
//! ```
//!
//! ## Task Flow
//! 1. Look up the task's primary/fallback pair and budget
//! 2. Call the primary model; on failure call the fallback once
//! 3. Attribute token usage and cost to the model that answered
//! 4. For exports, detect skills in the planning text and merge the bundle
//!
//! ## Modules
//! - `budget`: Task tiers, model pricing and usage ledger
//! - `llm`: Provider protocols and routing
//! - `orchestrator`: Fallback execution and design variations
//! - `skills`: Skill registry, detection and prompt bundling

pub mod budget;
pub mod config;
pub mod llm;
pub mod orchestrator;
pub mod skills;

pub use config::{ConfigError, FallbackPolicy, OrchestratorConfig, ProviderSettings};
pub use orchestrator::{FallbackOrchestrator, OrchestratorError, Overrides, TaskOutput};
