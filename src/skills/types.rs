//! Types for the skill registry.

use serde::{Deserialize, Serialize};

/// The complexity tag that makes a skill part of every detection result.
pub const FOUNDATIONAL: &str = "foundational";

/// One enrichable integration pattern from the registry index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    /// Skill name (also its folder name, e.g. "stripe-billing")
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub complexity: String,
    /// External tooling that must be installed and authenticated
    #[serde(default, rename = "requires_tools")]
    pub required_tools: Vec<String>,
    /// Reference document path relative to the registry root.
    /// Defaults to `<name>/SKILL.md`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_path: Option<String>,
}

impl SkillDefinition {
    pub fn is_foundational(&self) -> bool {
        self.complexity == FOUNDATIONAL
    }

    pub fn doc_path(&self) -> String {
        self.doc_path
            .clone()
            .unwrap_or_else(|| format!("{}/{}", self.name, super::registry::DOC_FILE))
    }
}

/// Trigger keywords that flag a skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionPattern {
    pub skill: String,
    #[serde(default)]
    pub trigger: Vec<String>,
}

/// On-disk registry index (`index.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillIndex {
    #[serde(default)]
    pub skills: Vec<SkillDefinition>,
    #[serde(default)]
    pub usage: SkillUsage,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillUsage {
    #[serde(default)]
    pub detection_patterns: Vec<DetectionPattern>,
}

/// A skill matched against a detection context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedSkill {
    pub definition: SkillDefinition,
    /// Triggers that matched; empty for foundational skills added unconditionally
    pub matched_keywords: Vec<String>,
}

impl DetectedSkill {
    pub fn name(&self) -> &str {
        &self.definition.name
    }
}
