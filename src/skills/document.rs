//! Skill reference documents, parsed once into ordered sections.

use serde::Serialize;

/// A level-2 section of a reference document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocSection {
    pub heading: String,
    /// Body text, including any nested `###` subsections
    pub content: String,
}

impl DocSection {
    pub fn render(&self) -> String {
        format!("## {}\n\n{}", self.heading, self.content)
    }
}

/// A parsed `SKILL.md`: optional frontmatter, preamble, then `##` sections in order.
#[derive(Debug, Clone)]
pub struct SkillDocument {
    frontmatter: Option<serde_yaml::Value>,
    preamble: String,
    sections: Vec<DocSection>,
    body: String,
}

impl SkillDocument {
    pub fn parse(content: &str) -> Self {
        let (frontmatter, body) = parse_frontmatter(content);

        let mut preamble = String::new();
        let mut sections: Vec<DocSection> = Vec::new();
        let mut in_fence = false;

        for line in body.lines() {
            let trimmed = line.trim_start();
            if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
                in_fence = !in_fence;
            }

            if !in_fence {
                if let Some(heading) = line.strip_prefix("## ") {
                    sections.push(DocSection {
                        heading: heading.trim().to_string(),
                        content: String::new(),
                    });
                    continue;
                }
            }

            let target = match sections.last_mut() {
                Some(section) => &mut section.content,
                None => &mut preamble,
            };
            target.push_str(line);
            target.push('\n');
        }

        for section in &mut sections {
            section.content = section.content.trim().to_string();
        }

        Self {
            frontmatter,
            preamble: preamble.trim().to_string(),
            sections,
            body: body.trim().to_string(),
        }
    }

    /// Look up a section by heading, case-insensitively.
    ///
    /// An exact match wins; otherwise the first heading starting with `heading`
    /// (so "Quick Start" finds "Quick Start (5 minutes)").
    pub fn section(&self, heading: &str) -> Option<&DocSection> {
        let wanted = heading.trim().to_lowercase();
        self.sections
            .iter()
            .find(|s| s.heading.to_lowercase() == wanted)
            .or_else(|| {
                self.sections
                    .iter()
                    .find(|s| s.heading.to_lowercase().starts_with(&wanted))
            })
    }

    pub fn sections(&self) -> &[DocSection] {
        &self.sections
    }

    pub fn headings(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.heading.as_str())
    }

    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    /// Whole document without frontmatter.
    pub fn full_text(&self) -> &str {
        &self.body
    }

    pub fn description(&self) -> Option<&str> {
        self.frontmatter
            .as_ref()
            .and_then(|fm| fm.get("description"))
            .and_then(|v| v.as_str())
    }
}

/// Parse YAML frontmatter from markdown content.
/// Returns (frontmatter, body) where frontmatter is the parsed YAML.
pub fn parse_frontmatter(content: &str) -> (Option<serde_yaml::Value>, &str) {
    let Some(rest) = content.strip_prefix("---") else {
        return (None, content);
    };

    let Some(end_pos) = rest.find("\n---") else {
        return (None, content);
    };

    let yaml_str = &rest[..end_pos];
    let after = &rest[end_pos + 4..];
    // Drop the remainder of the closing fence line.
    let body = after.split_once('\n').map_or("", |(_, b)| b).trim_start();

    match serde_yaml::from_str(yaml_str) {
        Ok(value) => (Some(value), body),
        Err(_) => (None, content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"---
name: stripe-billing
description: Subscription billing with Stripe
---

# Stripe Billing

Intro paragraph.

## Quick Start

Install the SDK.

### Keys

Set STRIPE_SECRET_KEY.

```bash
## not a heading inside a fence
stripe login
```

## Full Implementation

Webhooks and customer portal.
"#;

    #[test]
    fn test_parse_frontmatter() {
        let (frontmatter, body) = parse_frontmatter(DOC);
        let fm = frontmatter.unwrap();
        assert_eq!(fm.get("name").unwrap().as_str().unwrap(), "stripe-billing");
        assert!(body.starts_with("# Stripe Billing"));
    }

    #[test]
    fn test_parse_frontmatter_no_frontmatter() {
        let content = "# Just a heading\n\nSome content.";
        let (frontmatter, body) = parse_frontmatter(content);
        assert!(frontmatter.is_none());
        assert_eq!(body, content);
    }

    #[test]
    fn test_sections_in_order_with_nested_content() {
        let doc = SkillDocument::parse(DOC);
        let headings: Vec<&str> = doc.headings().collect();
        assert_eq!(headings, vec!["Quick Start", "Full Implementation"]);
        assert_eq!(doc.preamble(), "# Stripe Billing\n\nIntro paragraph.");

        let quick = doc.section("quick start").unwrap();
        assert!(quick.content.contains("### Keys"));
        assert!(quick.content.contains("## not a heading inside a fence"));
        assert!(!quick.content.contains("Webhooks"));
        assert_eq!(doc.description(), Some("Subscription billing with Stripe"));
    }

    #[test]
    fn test_section_prefix_match() {
        let doc = SkillDocument::parse("## Quick Start (5 minutes)\n\nGo.\n");
        assert_eq!(doc.section("Quick Start").unwrap().content, "Go.");
        assert!(doc.section("Troubleshooting").is_none());
    }

    #[test]
    fn test_full_text_excludes_frontmatter() {
        let doc = SkillDocument::parse(DOC);
        assert!(!doc.full_text().contains("description:"));
        assert!(doc.full_text().contains("Webhooks and customer portal."));
    }
}
