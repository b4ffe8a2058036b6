//! Rule document and blocklist loading
//!
//! The rule document is TOML: a mandatory `default_action` plus zero or
//! more `[[rule]]` tables in `RuleDef` shape. The blocklist is plaintext,
//! one domain per line; `#` comments and blank lines are ignored.

use std::path::Path;

use anyhow::{Context, Result};
use flowgate_core::{Action, RuleDef};
use serde::Deserialize;
use tracing::info;

/// Parsed rule document
#[derive(Debug, Deserialize)]
pub struct RuleDocument {
    /// Verdict for flows no rule matches; mandatory
    pub default_action: String,

    /// Raw rule definitions, validated by the core on load
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleDef>,
}

impl RuleDocument {
    /// Load and parse a rule document from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read rule document: {}", path.display()))?;
        let doc: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse rule document: {}", path.display()))?;
        Ok(doc)
    }

    /// The document's default action as a typed value
    pub fn default_action(&self) -> Result<Action> {
        Action::parse(&self.default_action)
            .with_context(|| format!("invalid default_action: '{}'", self.default_action))
    }
}

/// Load a blocklist file into a vector of domain lines
pub fn load_blocklist(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read blocklist: {}", path.display()))?;

    let domains: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();

    info!(count = domains.len(), path = %path.display(), "loaded blocklist");
    Ok(domains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_rule_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            default_action = "allow"

            [[rule]]
            priority = 10
            direction = "out"
            protocols = ["tcp"]
            action = "block"
            tuples = [{{ dst_host = "*.ads.example.com", dst_ports = ["443"] }}]
            "#
        )
        .unwrap();

        let doc = RuleDocument::load(file.path()).unwrap();
        assert_eq!(doc.default_action().unwrap(), Action::Allow);
        assert_eq!(doc.rules.len(), 1);
        assert_eq!(doc.rules[0].priority, 10);
    }

    #[test]
    fn test_document_without_default_action_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[[rule]]\npriority = 1\ndirection = \"out\"\naction = \"allow\"\n").unwrap();
        assert!(RuleDocument::load(file.path()).is_err());
    }

    #[test]
    fn test_load_blocklist_skips_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "# corpus\nevil.test\n\n  tracker.example  \n# done\n").unwrap();

        let domains = load_blocklist(file.path()).unwrap();
        assert_eq!(domains, vec!["evil.test", "tracker.example"]);
    }
}
