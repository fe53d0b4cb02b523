//! Skill enrichment for generated artifacts.
//!
//! The registry directory contains:
//! - `index.json` - skill definitions and keyword detection patterns
//! - `<skill>/SKILL.md` - reference documents with `## Quick Start` and other sections
//!
//! Export-style tasks detect skills from the accumulated planning text, build a
//! [`PromptBundle`] and merge it into the generated output. Registry or document
//! failures degrade to an empty bundle and never block generation.

mod bundler;
mod detector;
mod document;
mod registry;
pub mod types;

pub use bundler::{DetailLevel, PromptBundle, PromptBundler, SkillSection, QUICK_START_HEADING};
pub use detector::{DetectionContext, SkillDetector};
pub use document::{parse_frontmatter, DocSection, SkillDocument};
pub use registry::{SkillError, SkillRegistry, DOC_FILE, INDEX_FILE};
pub use types::*;

/// Detect skills in `context` and bundle them at `level`.
pub fn enrich(registry: &SkillRegistry, context: &DetectionContext, level: DetailLevel) -> PromptBundle {
    let detected = SkillDetector::new(registry).detect(context);
    PromptBundler::new(registry).build(detected, level)
}

/// Enrich `generated` with skills detected in `context`.
///
/// Load the registry once with [`SkillRegistry::load_or_empty`] and reuse it
/// across calls; documents are parsed only at load. An empty registry leaves
/// `generated` unchanged.
pub fn enrich_output(
    registry: &SkillRegistry,
    context: &DetectionContext,
    level: DetailLevel,
    generated: &str,
) -> String {
    let bundle = enrich(registry, context, level);
    tracing::info!(
        "Enriched output with {} skills",
        bundle.detected_skills.len()
    );
    bundle.merge_into(generated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_enrich_output_end_to_end() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        std::fs::write(
            root.join(INDEX_FILE),
            r#"{
                "skills": [
                    {"name": "stripe-billing", "category": "payments", "description": "Stripe",
                     "complexity": "advanced", "requires_tools": ["stripe-cli"]},
                    {"name": "base", "category": "core", "description": "Baseline",
                     "complexity": "foundational", "requires_tools": []}
                ],
                "usage": {"detection_patterns": [{"skill": "stripe-billing", "trigger": ["stripe"]}]}
            }"#,
        )
        .unwrap();
        std::fs::create_dir_all(root.join("stripe-billing")).unwrap();
        std::fs::write(
            root.join("stripe-billing").join(DOC_FILE),
            "## Quick Start\n\nstripe init\n",
        )
        .unwrap();

        let registry = SkillRegistry::load_or_empty(root).await;
        let context = DetectionContext::new().with_field("Charge customers through Stripe");
        let merged = enrich_output(&registry, &context, DetailLevel::QuickStart, "PROMPT");

        assert!(merged.starts_with("PROMPT\n\n---\n\n# Integration Skills"));
        assert!(merged.contains("## Skill: stripe-billing"));
        assert!(merged.contains("## Skill: base"));
        assert!(merged.contains("stripe init"));

        // Documents stay in memory after load.
        std::fs::remove_dir_all(root.join("stripe-billing")).unwrap();
        let again = enrich_output(&registry, &context, DetailLevel::QuickStart, "PROMPT");
        assert_eq!(again, merged);
    }

    #[tokio::test]
    async fn test_missing_registry_leaves_output_unchanged() {
        let temp = tempdir().unwrap();
        let registry = SkillRegistry::load_or_empty(&temp.path().join("absent")).await;
        let context = DetectionContext::new().with_field("stripe");
        let merged = enrich_output(&registry, &context, DetailLevel::Full, "PROMPT");
        assert_eq!(merged, "PROMPT");
    }
}
