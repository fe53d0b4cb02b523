//! Prompt bundle assembly from detected skills.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::document::SkillDocument;
use super::registry::SkillRegistry;
use super::types::DetectedSkill;

/// Heading of the section extracted at [`DetailLevel::QuickStart`].
pub const QUICK_START_HEADING: &str = "Quick Start";

/// Header placed above a rendered bundle.
pub const BUNDLE_HEADER: &str = "# Integration Skills";

/// How much of each skill's reference document to include.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetailLevel {
    #[default]
    QuickStart,
    Full,
}

impl FromStr for DetailLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quick-start" | "quickstart" | "quick_start" => Ok(DetailLevel::QuickStart),
            "full" => Ok(DetailLevel::Full),
            other => Err(format!("unknown detail level: {}", other)),
        }
    }
}

/// Rendered enrichment for one detected skill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillSection {
    pub skill: String,
    pub content: String,
}

/// Final enrichment output for one export request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PromptBundle {
    pub skill_sections: Vec<SkillSection>,
    /// Consolidated pre-flight setup, one entry per distinct tool
    pub tool_setup_instructions: String,
    pub detected_skills: Vec<DetectedSkill>,
}

impl PromptBundle {
    pub fn is_empty(&self) -> bool {
        self.detected_skills.is_empty()
    }

    /// Render the bundle as markdown. An empty bundle renders as "".
    pub fn render(&self) -> String {
        if self.is_empty() {
            return String::new();
        }

        let mut out = String::new();
        let _ = writeln!(out, "{}\n", BUNDLE_HEADER);
        if !self.tool_setup_instructions.is_empty() {
            let _ = writeln!(out, "{}\n", self.tool_setup_instructions.trim_end());
        }
        for section in &self.skill_sections {
            let _ = writeln!(out, "{}\n", section.content.trim_end());
        }
        out.trim_end().to_string()
    }

    /// Append the rendered bundle to generated text. Empty bundles leave the
    /// text untouched.
    pub fn merge_into(&self, generated: &str) -> String {
        let rendered = self.render();
        if rendered.is_empty() {
            return generated.to_string();
        }
        format!("{}\n\n---\n\n{}\n", generated.trim_end(), rendered)
    }
}

/// Builds [`PromptBundle`]s using documents from a registry.
pub struct PromptBundler<'a> {
    registry: &'a SkillRegistry,
}

impl<'a> PromptBundler<'a> {
    pub fn new(registry: &'a SkillRegistry) -> Self {
        Self { registry }
    }

    pub fn build(&self, detected: Vec<DetectedSkill>, level: DetailLevel) -> PromptBundle {
        if detected.is_empty() {
            return PromptBundle::default();
        }

        // tool -> skills that need it, in first-seen order of skills
        let mut tools: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut skill_sections = Vec::with_capacity(detected.len());

        for skill in &detected {
            let definition = &skill.definition;
            let mut content = metadata_block(skill);

            let skill_tools = distinct(&definition.required_tools);
            if !skill_tools.is_empty() {
                let _ = writeln!(content, "### Tool Setup\n");
                for tool in &skill_tools {
                    let _ = writeln!(content, "{}", tool_setup_block(tool));
                    let users = tools.entry(tool.to_string()).or_default();
                    if !users.iter().any(|u| u == &definition.name) {
                        users.push(definition.name.clone());
                    }
                }
            }

            match self.registry.document(&definition.name) {
                Some(doc) => {
                    let _ = writeln!(content, "### Documentation\n");
                    let _ = writeln!(content, "{}", documentation(doc, level, &definition.name));
                }
                None => {
                    tracing::warn!(
                        "No reference document for skill {}, emitting metadata only",
                        definition.name
                    );
                }
            }

            skill_sections.push(SkillSection {
                skill: definition.name.clone(),
                content: content.trim_end().to_string(),
            });
        }

        PromptBundle {
            skill_sections,
            tool_setup_instructions: preflight_section(&tools),
            detected_skills: detected,
        }
    }
}

fn metadata_block(skill: &DetectedSkill) -> String {
    let definition = &skill.definition;
    let mut out = String::new();
    let _ = writeln!(out, "## Skill: {}\n", definition.name);
    let _ = writeln!(out, "- Category: {}", definition.category);
    let _ = writeln!(out, "- Description: {}", definition.description);
    if !skill.matched_keywords.is_empty() {
        let _ = writeln!(out, "- Detected via: {}", skill.matched_keywords.join(", "));
    }
    out.push('\n');
    out
}

fn documentation(doc: &SkillDocument, level: DetailLevel, skill: &str) -> String {
    match level {
        DetailLevel::Full => doc.full_text().to_string(),
        DetailLevel::QuickStart => match doc.section(QUICK_START_HEADING) {
            Some(section) => section.render(),
            None => {
                tracing::debug!("Skill {} has no Quick Start section, using full document", skill);
                doc.full_text().to_string()
            }
        },
    }
}

fn distinct(items: &[String]) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for item in items {
        let item = item.trim();
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Setup steps for a known external tool; unknown tools get a generic template.
struct ToolTemplate {
    display: &'static str,
    install: &'static str,
    authenticate: &'static str,
    configure: &'static str,
}

fn tool_template(tool: &str) -> ToolTemplate {
    match tool.to_lowercase().as_str() {
        "stripe" | "stripe-cli" => ToolTemplate {
            display: "Stripe CLI",
            install: "Install the Stripe CLI from https://stripe.com/docs/stripe-cli",
            authenticate: "Run `stripe login` and confirm the pairing code in the dashboard",
            configure: "Set STRIPE_SECRET_KEY and STRIPE_WEBHOOK_SECRET (`stripe listen --print-secret`)",
        },
        "supabase" | "supabase-cli" => ToolTemplate {
            display: "Supabase CLI",
            install: "Install with `npm install -g supabase` or your package manager",
            authenticate: "Run `supabase login` with a personal access token",
            configure: "Run `supabase link --project-ref <project-ref>`; set SUPABASE_URL and SUPABASE_ANON_KEY",
        },
        "vercel" | "vercel-cli" => ToolTemplate {
            display: "Vercel CLI",
            install: "Install with `npm install -g vercel`",
            authenticate: "Run `vercel login`",
            configure: "Run `vercel link` and `vercel env pull` to sync environment variables",
        },
        "github" | "gh" | "github-cli" => ToolTemplate {
            display: "GitHub CLI",
            install: "Install from https://cli.github.com",
            authenticate: "Run `gh auth login`",
            configure: "Set the default repository with `gh repo set-default`",
        },
        "firebase" | "firebase-cli" => ToolTemplate {
            display: "Firebase CLI",
            install: "Install with `npm install -g firebase-tools`",
            authenticate: "Run `firebase login`",
            configure: "Run `firebase use <project-id>`",
        },
        _ => ToolTemplate {
            display: "",
            install: "Install the tool following its official documentation",
            authenticate: "Authenticate with the account used for this project",
            configure: "Configure required credentials as environment variables (never commit them)",
        },
    }
}

fn tool_title(tool: &str, template: &ToolTemplate) -> String {
    if template.display.is_empty() {
        format!("`{}`", tool)
    } else {
        format!("{} (`{}`)", template.display, tool)
    }
}

/// Per-skill setup guidance for one tool.
fn tool_setup_block(tool: &str) -> String {
    let template = tool_template(tool);
    format!(
        "**Setup: {}**\n1. {}\n2. {}\n3. {}\n",
        tool_title(tool, &template),
        template.install,
        template.authenticate,
        template.configure
    )
}

/// Consolidated pre-flight section; each tool listed once with the skills
/// that need it.
fn preflight_section(tools: &BTreeMap<String, Vec<String>>) -> String {
    if tools.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    let _ = writeln!(out, "## Pre-flight Setup\n");
    let _ = writeln!(
        out,
        "Install and authenticate these tools before starting implementation:\n"
    );
    for (tool, skills) in tools {
        let template = tool_template(tool);
        let _ = writeln!(out, "- [ ] {}", tool_title(tool, &template));
        let _ = writeln!(out, "  - Required by: {}", skills.join(", "));
        let _ = writeln!(out, "  - Authenticate: {}", template.authenticate);
        let _ = writeln!(out, "  - Configure: {}", template.configure);
    }
    out.trim_end().to_string()
}
