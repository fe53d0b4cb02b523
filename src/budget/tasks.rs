//! Task registry: which models serve which named task, and with what budget.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::llm::{ChatOptions, ModelRoute};

/// Cost/quality grouping used when assigning model pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Low cost, fast
    Fast,
    /// Mid cost, structured output
    Structured,
    /// High cost, critical documents
    Critical,
}

/// How to execute one named task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    #[serde(skip)]
    pub name: String,
    pub primary: ModelRoute,
    pub fallback: ModelRoute,
    pub max_tokens: u64,
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
}

impl TaskConfig {
    pub fn options(&self) -> ChatOptions {
        ChatOptions {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

/// Immutable set of task configurations keyed by task name.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, TaskConfig>,
}

impl TaskRegistry {
    /// Build from parsed entries; each entry takes its map key as its name.
    pub fn new(tasks: impl IntoIterator<Item = (String, TaskConfig)>) -> Self {
        Self {
            tasks: tasks
                .into_iter()
                .map(|(name, mut config)| {
                    config.name = name.clone();
                    (name, config)
                })
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&TaskConfig> {
        self.tasks.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskConfig> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
