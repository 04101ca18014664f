//! Clause-level comparison of two documents.
//!
//! Both documents are segmented into clauses, the clauses are aligned, and
//! every difference becomes an [`Edit`] with a severity taken from the
//! configured [`SeverityTable`]. Edits come out in the order of the later
//! document.

mod align;
mod clause;
mod severity;

pub use align::{align, Pairing};
pub use clause::{normalize_body, Clause, ClauseConfig, ClauseSegmenter, DEFAULT_MARKER_PATTERN};
pub use severity::{Severity, SeverityClassifier, SeverityRule, SeverityTable};

use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::model::Document;

/// Kind of clause-level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    Insert,
    Delete,
    Modify,
}

impl std::fmt::Display for EditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EditKind::Insert => "insert",
            EditKind::Delete => "delete",
            EditKind::Modify => "modify",
        };
        f.write_str(name)
    }
}

/// Serializable reference to a clause inside an [`Edit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClauseRef {
    pub index: usize,
    pub label: Option<String>,
    pub title: String,
    pub page_index: usize,
    pub text: String,
}

impl From<&Clause> for ClauseRef {
    fn from(clause: &Clause) -> Self {
        Self {
            index: clause.index,
            label: clause.label.clone(),
            title: clause.title.clone(),
            page_index: clause.page_index,
            text: clause.body.trim().to_string(),
        }
    }
}

/// One clause-level difference.
///
/// `clause_a` is `None` for inserts and `clause_b` is `None` for deletes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edit {
    pub kind: EditKind,
    pub clause_a: Option<ClauseRef>,
    pub clause_b: Option<ClauseRef>,
    pub severity: Severity,
}

impl Edit {
    /// The same change seen from the other document.
    pub fn inverted(&self) -> Edit {
        let kind = match self.kind {
            EditKind::Insert => EditKind::Delete,
            EditKind::Delete => EditKind::Insert,
            EditKind::Modify => EditKind::Modify,
        };
        Edit {
            kind,
            clause_a: self.clause_b.clone(),
            clause_b: self.clause_a.clone(),
            severity: self.severity,
        }
    }

    /// Label of the clause this edit is about, preferring the later side.
    pub fn label(&self) -> Option<&str> {
        self.clause_b
            .as_ref()
            .or(self.clause_a.as_ref())
            .and_then(|c| c.label.as_deref())
    }
}

/// Edit counts per kind and severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub inserts: usize,
    pub deletes: usize,
    pub modifies: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl DiffSummary {
    pub fn from_edits(edits: &[Edit]) -> Self {
        let mut summary = Self::default();
        for edit in edits {
            match edit.kind {
                EditKind::Insert => summary.inserts += 1,
                EditKind::Delete => summary.deletes += 1,
                EditKind::Modify => summary.modifies += 1,
            }
            match edit.severity {
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.inserts + self.deletes + self.modifies
    }
}

/// Clause diff engine with compiled configuration.
#[derive(Debug, Clone)]
pub struct DiffEngine {
    segmenter: ClauseSegmenter,
    classifier: SeverityClassifier,
}

impl DiffEngine {
    /// Compile an engine from configuration.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        Ok(Self {
            segmenter: ClauseSegmenter::new(&config.clauses)?,
            classifier: SeverityClassifier::new(&config.severity)?,
        })
    }

    pub fn segmenter(&self) -> &ClauseSegmenter {
        &self.segmenter
    }

    /// Segment a document with this engine's marker grammar.
    pub fn clauses(&self, doc: &Document) -> Vec<Clause> {
        self.segmenter.segment(doc)
    }

    /// Compare `a` (earlier) with `b` (later).
    ///
    /// A blank document on either side yields no edits.
    pub fn diff(&self, a: &Document, b: &Document) -> Vec<Edit> {
        if a.is_blank() || b.is_blank() {
            log::debug!("Skipping diff of blank document");
            return Vec::new();
        }
        let clauses_a = self.clauses(a);
        let clauses_b = self.clauses(b);
        self.diff_clauses(&clauses_a, &clauses_b)
    }

    /// Compare two already segmented clause lists.
    pub fn diff_clauses(&self, a: &[Clause], b: &[Clause]) -> Vec<Edit> {
        let bodies_a: Vec<String> = a.iter().map(Clause::normalized_body).collect();
        let bodies_b: Vec<String> = b.iter().map(Clause::normalized_body).collect();
        let pairings = align(a, b, &bodies_a, &bodies_b);

        // B index paired with each A clause, unchanged pairs included
        let mut partner_of_a: Vec<Option<usize>> = vec![None; a.len()];
        for pairing in &pairings {
            if let Pairing::Both(i, j) = *pairing {
                partner_of_a[i] = Some(j);
            }
        }

        let mut keyed: Vec<((i64, u8, usize), Edit)> = Vec::new();
        for pairing in pairings {
            match pairing {
                Pairing::Both(i, j) => {
                    if bodies_a[i] == bodies_b[j] {
                        continue;
                    }
                    let edit = self.edit(EditKind::Modify, Some(&a[i]), Some(&b[j]));
                    keyed.push(((j as i64, 0, 0), edit));
                }
                Pairing::OnlyB(j) => {
                    let edit = self.edit(EditKind::Insert, None, Some(&b[j]));
                    keyed.push(((j as i64, 0, 0), edit));
                }
                Pairing::OnlyA(i) => {
                    let anchor = partner_of_a[..i]
                        .iter()
                        .rev()
                        .find_map(|partner| *partner)
                        .map_or(-1, |j| j as i64);
                    let edit = self.edit(EditKind::Delete, Some(&a[i]), None);
                    keyed.push(((anchor, 1, i), edit));
                }
            }
        }

        keyed.sort_by_key(|(key, _)| *key);
        let edits: Vec<Edit> = keyed.into_iter().map(|(_, edit)| edit).collect();
        log::debug!(
            "Diffed {} vs {} clauses: {} edits",
            a.len(),
            b.len(),
            edits.len()
        );
        edits
    }

    fn edit(&self, kind: EditKind, a: Option<&Clause>, b: Option<&Clause>) -> Edit {
        Edit {
            kind,
            severity: self.classifier.classify(kind, a, b),
            clause_a: a.map(ClauseRef::from),
            clause_b: b.map(ClauseRef::from),
        }
    }
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default()).unwrap_or_else(|e| {
            log::error!("Default diff configuration failed to compile: {}", e);
            Self {
                segmenter: ClauseSegmenter::unmarked(),
                classifier: SeverityClassifier::fallback(),
            }
        })
    }
}

/// Compare two documents with the default configuration.
pub fn diff(a: &Document, b: &Document) -> Vec<Edit> {
    DiffEngine::default().diff(a, b)
}
