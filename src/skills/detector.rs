//! Keyword-based skill detection over free text.

use std::collections::HashSet;

use super::registry::SkillRegistry;
use super::types::DetectedSkill;

/// Free-text fields gathered from the planning session (research notes,
/// feature descriptions, generated requirements, ...).
#[derive(Debug, Clone, Default)]
pub struct DetectionContext {
    fields: Vec<String>,
}

impl DetectionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, text: impl Into<String>) -> Self {
        self.push(text);
        self
    }

    pub fn push(&mut self, text: impl Into<String>) {
        self.fields.push(text.into());
    }

    /// All fields joined and case-folded.
    fn combined(&self) -> String {
        self.fields.join("\n").to_lowercase()
    }
}

impl<S: Into<String>> FromIterator<S> for DetectionContext {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Matches detection patterns from a registry against a context.
pub struct SkillDetector<'a> {
    registry: &'a SkillRegistry,
}

impl<'a> SkillDetector<'a> {
    pub fn new(registry: &'a SkillRegistry) -> Self {
        Self { registry }
    }

    /// Detect skills in pattern order, then append foundational skills not
    /// already present.
    ///
    /// A skill appears at most once. When several patterns name the same
    /// skill, the first match wins and later matched keywords are not merged.
    pub fn detect(&self, context: &DetectionContext) -> Vec<DetectedSkill> {
        let text = context.combined();
        let mut detected: Vec<DetectedSkill> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for pattern in self.registry.patterns() {
            if seen.contains(pattern.skill.as_str()) {
                continue;
            }

            let matched: Vec<String> = pattern
                .trigger
                .iter()
                .filter(|t| !t.trim().is_empty() && text.contains(&t.to_lowercase()))
                .cloned()
                .collect();
            if matched.is_empty() {
                continue;
            }

            let Some(definition) = self.registry.get(&pattern.skill) else {
                tracing::warn!(
                    "Detection pattern references unknown skill {}",
                    pattern.skill
                );
                continue;
            };

            tracing::debug!("Detected skill {} via {:?}", definition.name, matched);
            seen.insert(definition.name.as_str());
            detected.push(DetectedSkill {
                definition: definition.clone(),
                matched_keywords: matched,
            });
        }

        for definition in self.registry.foundational() {
            if seen.insert(definition.name.as_str()) {
                detected.push(DetectedSkill {
                    definition: definition.clone(),
                    matched_keywords: Vec::new(),
                });
            }
        }

        detected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::types::{DetectionPattern, SkillDefinition};
    use std::collections::HashMap;

    fn skill(name: &str, complexity: &str) -> SkillDefinition {
        SkillDefinition {
            name: name.to_string(),
            category: "test".to_string(),
            description: format!("{} skill", name),
            complexity: complexity.to_string(),
            required_tools: Vec::new(),
            doc_path: None,
        }
    }

    fn pattern(skill: &str, triggers: &[&str]) -> DetectionPattern {
        DetectionPattern {
            skill: skill.to_string(),
            trigger: triggers.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn registry() -> SkillRegistry {
        SkillRegistry::from_parts(
            vec![
                skill("stripe-billing", "advanced"),
                skill("supabase-auth", "intermediate"),
                skill("project-foundations", "foundational"),
            ],
            vec![
                pattern("stripe-billing", &["stripe", "checkout"]),
                pattern("supabase-auth", &["login", "Supabase"]),
                pattern("project-foundations", &["typescript"]),
                pattern("stripe-billing", &["subscription"]),
                pattern("ghost-skill", &["stripe"]),
            ],
            HashMap::new(),
        )
    }

    fn names(detected: &[DetectedSkill]) -> Vec<&str> {
        detected.iter().map(|d| d.name()).collect()
    }

    #[test]
    fn test_matches_only_present_triggers() {
        let registry = registry();
        let context = DetectionContext::new().with_field("Users pay with Stripe each month.");
        let detected = SkillDetector::new(&registry).detect(&context);

        assert_eq!(names(&detected), vec!["stripe-billing", "project-foundations"]);
        assert_eq!(detected[0].matched_keywords, vec!["stripe"]);
    }

    #[test]
    fn test_foundational_added_once_without_matches() {
        let registry = registry();
        let detected = SkillDetector::new(&registry).detect(&DetectionContext::new());

        assert_eq!(names(&detected), vec!["project-foundations"]);
        assert!(detected[0].matched_keywords.is_empty());
    }

    #[test]
    fn test_foundational_added_once_when_also_matched() {
        let registry = registry();
        let context = DetectionContext::new().with_field("Built in TypeScript");
        let detected = SkillDetector::new(&registry).detect(&context);

        let count = detected.iter().filter(|d| d.name() == "project-foundations").count();
        assert_eq!(count, 1);
        assert_eq!(detected[0].matched_keywords, vec!["typescript"]);
    }

    #[test]
    fn test_first_pattern_wins_without_merging() {
        let registry = registry();
        let context: DetectionContext =
            ["stripe checkout flow", "monthly subscription plans"].into_iter().collect();
        let detected = SkillDetector::new(&registry).detect(&context);

        let stripe: Vec<&DetectedSkill> =
            detected.iter().filter(|d| d.name() == "stripe-billing").collect();
        assert_eq!(stripe.len(), 1);
        assert_eq!(stripe[0].matched_keywords, vec!["stripe", "checkout"]);
    }

    #[test]
    fn test_order_follows_patterns_not_relevance() {
        let registry = registry();
        let context = DetectionContext::new()
            .with_field("SUPABASE login, supabase login, supabase everywhere")
            .with_field("one stripe mention");
        let detected = SkillDetector::new(&registry).detect(&context);

        assert_eq!(
            names(&detected),
            vec!["stripe-billing", "supabase-auth", "project-foundations"]
        );
        assert_eq!(detected[1].matched_keywords, vec!["login", "Supabase"]);
    }

    #[test]
    fn test_unknown_skill_in_pattern_is_skipped() {
        let registry = SkillRegistry::from_parts(
            vec![],
            vec![pattern("ghost-skill", &["stripe"])],
            HashMap::new(),
        );
        let context = DetectionContext::new().with_field("stripe");
        assert!(SkillDetector::new(&registry).detect(&context).is_empty());
    }
}
