//! Severity classification of edits.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::clause::Clause;
use super::EditKind;
use crate::error::Result;

/// How much attention an edit deserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        };
        f.write_str(name)
    }
}

/// One classification rule, matched against a clause heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityRule {
    pub pattern: String,
    pub severity: Severity,
}

impl SeverityRule {
    pub fn new(pattern: impl Into<String>, severity: Severity) -> Self {
        Self {
            pattern: pattern.into(),
            severity,
        }
    }
}

/// Ordered severity rules plus fallbacks. The first matching rule wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityTable {
    pub rules: Vec<SeverityRule>,
    pub default_insert_delete: Severity,
    pub default_modify: Severity,
}

impl Default for SeverityTable {
    fn default() -> Self {
        Self {
            rules: vec![
                SeverityRule::new(
                    r"(?i)\b(amount|price|fee|payment|term|duration|termination|terminate)\b",
                    Severity::High,
                ),
                SeverityRule::new("금액|대금|기간|해지|해제|보증", Severity::High),
            ],
            default_insert_delete: Severity::Medium,
            default_modify: Severity::Low,
        }
    }
}

/// A [`SeverityTable`] with its patterns compiled.
#[derive(Debug, Clone)]
pub struct SeverityClassifier {
    rules: Vec<(Regex, Severity)>,
    default_insert_delete: Severity,
    default_modify: Severity,
}

impl SeverityClassifier {
    pub fn new(table: &SeverityTable) -> Result<Self> {
        let rules = table
            .rules
            .iter()
            .map(|rule| Ok((Regex::new(&rule.pattern)?, rule.severity)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            rules,
            default_insert_delete: table.default_insert_delete,
            default_modify: table.default_modify,
        })
    }

    /// Classifier with no rules and the standard fallbacks.
    pub fn fallback() -> Self {
        let table = SeverityTable::default();
        Self {
            rules: Vec::new(),
            default_insert_delete: table.default_insert_delete,
            default_modify: table.default_modify,
        }
    }

    /// Severity of an edit touching clause `a` and/or `b`.
    ///
    /// Rules are tried in order; for each rule both headings are checked, so
    /// the result does not depend on which side is which.
    pub fn classify(&self, kind: EditKind, a: Option<&Clause>, b: Option<&Clause>) -> Severity {
        let headings: Vec<String> = a.into_iter().chain(b).map(Clause::heading).collect();
        let matched = self
            .rules
            .iter()
            .find(|(re, _)| headings.iter().any(|h| re.is_match(h)))
            .map(|(_, severity)| *severity);

        matched.unwrap_or(match kind {
            EditKind::Insert | EditKind::Delete => self.default_insert_delete,
            EditKind::Modify => self.default_modify,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clause(label: &str, title: &str) -> Clause {
        Clause {
            index: 0,
            label: Some(label.to_string()),
            title: title.to_string(),
            body: String::new(),
            page_index: 0,
            start: 0,
            end: 0,
        }
    }

    #[test]
    fn test_default_rules() {
        let classifier = SeverityClassifier::new(&SeverityTable::default()).unwrap();
        let payment = clause("Clause 1", "Payment");
        let notices = clause("Clause 9", "Notices");
        let korean = clause("제3조", "계약기간");

        assert_eq!(
            classifier.classify(EditKind::Modify, Some(&payment), Some(&payment)),
            Severity::High
        );
        assert_eq!(
            classifier.classify(EditKind::Modify, Some(&notices), Some(&notices)),
            Severity::Low
        );
        assert_eq!(
            classifier.classify(EditKind::Insert, None, Some(&notices)),
            Severity::Medium
        );
        assert_eq!(
            classifier.classify(EditKind::Delete, Some(&korean), None),
            Severity::High
        );
    }

    #[test]
    fn test_modify_checks_both_sides() {
        let classifier = SeverityClassifier::new(&SeverityTable::default()).unwrap();
        let before = clause("Clause 2", "Notices");
        let after = clause("Clause 2", "Termination");
        assert_eq!(
            classifier.classify(EditKind::Modify, Some(&before), Some(&after)),
            classifier.classify(EditKind::Modify, Some(&after), Some(&before)),
        );
        assert_eq!(
            classifier.classify(EditKind::Modify, Some(&before), Some(&after)),
            Severity::High
        );
    }

    #[test]
    fn test_first_rule_wins() {
        let table = SeverityTable {
            rules: vec![
                SeverityRule::new("(?i)penalty", Severity::Low),
                SeverityRule::new("(?i)penalty|fee", Severity::High),
            ],
            ..SeverityTable::default()
        };
        let classifier = SeverityClassifier::new(&table).unwrap();
        let penalty = clause("Clause 3", "Penalty fee");
        assert_eq!(
            classifier.classify(EditKind::Insert, None, Some(&penalty)),
            Severity::Low
        );
    }

    #[test]
    fn test_severity_deserializes_lowercase() {
        let table: SeverityTable =
            serde_json::from_str(r#"{"rules":[{"pattern":"x","severity":"high"}]}"#).unwrap();
        assert_eq!(table.rules[0].severity, Severity::High);
        assert_eq!(table.default_modify, Severity::Low);
    }
}
