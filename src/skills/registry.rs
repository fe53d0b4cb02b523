//! Skill registry loaded from an on-disk index plus reference documents.
//!
//! Layout:
//! - `index.json` - skill definitions and detection patterns
//! - `<skill>/SKILL.md` - reference document (or the skill's `doc_path`)

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;

use super::document::SkillDocument;
use super::types::{DetectionPattern, SkillDefinition, SkillIndex};

pub const INDEX_FILE: &str = "index.json";
pub const DOC_FILE: &str = "SKILL.md";

#[derive(Debug, Error)]
pub enum SkillError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Loaded skills, detection patterns and pre-parsed reference documents.
#[derive(Debug, Clone, Default)]
pub struct SkillRegistry {
    skills: Vec<SkillDefinition>,
    patterns: Vec<DetectionPattern>,
    documents: HashMap<String, SkillDocument>,
}

impl SkillRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a registry from already-loaded parts.
    pub fn from_parts(
        skills: Vec<SkillDefinition>,
        patterns: Vec<DetectionPattern>,
        documents: HashMap<String, SkillDocument>,
    ) -> Self {
        let mut seen = std::collections::HashSet::new();
        let skills = skills
            .into_iter()
            .filter(|s| {
                let fresh = seen.insert(s.name.clone());
                if !fresh {
                    tracing::warn!("Duplicate skill definition {} ignored", s.name);
                }
                fresh
            })
            .collect();

        Self {
            skills,
            patterns,
            documents,
        }
    }

    /// Load the index and every reference document under `root`.
    ///
    /// A missing index is an error; a missing document only drops that
    /// skill's documentation.
    pub async fn load(root: &Path) -> Result<Self, SkillError> {
        let index_path = root.join(INDEX_FILE);
        let content = fs::read_to_string(&index_path)
            .await
            .map_err(|source| SkillError::Io {
                path: index_path.clone(),
                source,
            })?;
        let index: SkillIndex =
            serde_json::from_str(&content).map_err(|source| SkillError::Parse {
                path: index_path,
                source,
            })?;

        let mut documents = HashMap::new();
        for skill in &index.skills {
            let doc_path = root.join(skill.doc_path());
            match fs::read_to_string(&doc_path).await {
                Ok(text) => {
                    documents.insert(skill.name.clone(), SkillDocument::parse(&text));
                }
                Err(e) => {
                    tracing::warn!(
                        "Reference document for skill {} unavailable at {}: {}",
                        skill.name,
                        doc_path.display(),
                        e
                    );
                }
            }
        }

        tracing::info!(
            "Loaded {} skills ({} documents, {} detection patterns) from {}",
            index.skills.len(),
            documents.len(),
            index.usage.detection_patterns.len(),
            root.display()
        );

        Ok(Self::from_parts(
            index.skills,
            index.usage.detection_patterns,
            documents,
        ))
    }

    /// Load, degrading to an empty registry on any error.
    pub async fn load_or_empty(root: &Path) -> Self {
        match Self::load(root).await {
            Ok(registry) => registry,
            Err(e) => {
                tracing::warn!("Skill registry unavailable, continuing without skills: {}", e);
                Self::empty()
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&SkillDefinition> {
        self.skills.iter().find(|s| s.name == name)
    }

    pub fn skills(&self) -> &[SkillDefinition] {
        &self.skills
    }

    pub fn patterns(&self) -> &[DetectionPattern] {
        &self.patterns
    }

    pub fn document(&self, name: &str) -> Option<&SkillDocument> {
        self.documents.get(name)
    }

    pub fn foundational(&self) -> impl Iterator<Item = &SkillDefinition> {
        self.skills.iter().filter(|s| s.is_foundational())
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}
