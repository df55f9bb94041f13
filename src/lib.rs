//! Charge Match - filing verification engine
//!
//! Decides whether a charge-registration document from the company registry
//! is the filing a user describes (company, persons entitled, brief
//! description, creation date).
//!
//! Architecture:
//! ```text
//! [Page texts]
//!       ↓
//! ┌──────────────────────────────────────────────┐
//! │  raw pages       → charge code (first page)  │
//! │  joined pages    → normalized text           │
//! │  normalized text → ExtractedFields (rules)   │
//! └──────────────────────────────────────────────┘
//!       ↓ + Query, NormalizedDate
//! [MatchReport: verdict + per-criterion detail]
//! ```
//!
//! Batches of candidate documents are evaluated in parallel (rayon); there is
//! no state shared between documents.

pub mod config;
pub mod date;
pub mod error;
pub mod fields;
pub mod matcher;
pub mod similarity;
pub mod text;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use date::NormalizedDate;
pub use error::{DateFormatError, Result};
pub use fields::{extract_charge_code, extract_fields, ExtractedFields};
pub use matcher::{assess, evaluate, Criterion, CriterionOutcome, MatchReport, Query, ACCEPT_THRESHOLD};
pub use similarity::{ratio, score, ScoreMode};
pub use text::DocumentText;

// =============================================================================
// DATA STRUCTURES
// =============================================================================

/// One filing from a company's filing history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Candidate {
    /// Listing text for the filing, when the caller has it.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub pages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CandidateOutcome {
    /// The listing does not mention the query's month.
    Skipped,
    Evaluated(MatchReport),
}

impl CandidateOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, CandidateOutcome::Evaluated(report) if report.matched)
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Reads page texts into fields, charge code included.
pub fn extract_document<S: AsRef<str>>(pages: &[S]) -> ExtractedFields {
    read_document(pages).1
}

fn read_document<S: AsRef<str>>(pages: &[S]) -> (DocumentText, ExtractedFields) {
    let doc = DocumentText::from_pages(pages);
    let mut fields = extract_fields(&doc.normalized);
    fields.charge_code = doc.charge_code.clone();
    (doc, fields)
}

/// Evaluates one document against a query whose date is already parsed.
pub fn verify_pages<S: AsRef<str>>(
    pages: &[S],
    query: &Query,
    date: &NormalizedDate,
    mode: ScoreMode,
) -> MatchReport {
    let (doc, fields) = read_document(pages);
    let mut report = assess(&fields, query, date, mode);
    report.readable = doc.is_readable();

    if !report.readable {
        warn!(pages = pages.len(), "document has no text");
    }
    info!(
        matched = report.matched,
        failed = ?report.failed(),
        charge_code = ?report.fields.charge_code,
        "document evaluated"
    );
    report
}

/// Evaluates one document. Fails only when the query date is malformed.
pub fn verify_document<S: AsRef<str>>(pages: &[S], query: &Query, mode: ScoreMode) -> Result<MatchReport> {
    let date = query.date()?;
    Ok(verify_pages(pages, query, &date, mode))
}

/// Evaluates candidates in parallel, in input order. Candidates whose
/// listing does not mention the query month are skipped unread.
pub fn verify_batch(query: &Query, candidates: &[Candidate], mode: ScoreMode) -> Result<Vec<CandidateOutcome>> {
    let date = query.date()?;

    let outcomes = candidates
        .par_iter()
        .map(|candidate| match &candidate.description {
            Some(description) if !date.mentioned_in(description) => CandidateOutcome::Skipped,
            _ => CandidateOutcome::Evaluated(verify_pages(&candidate.pages, query, &date, mode)),
        })
        .collect();

    Ok(outcomes)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn filing_pages() -> Vec<String> {
        vec![
            "Particulars of a charge\n\
             Company number: 01234567\n\
             Company name: Acme Ltd\n\
             Company number: 01234567\n\
             Charge code: 0123 4567 8901"
                .to_string(),
            "Date of creation: 15/03/2023\n\
             Persons entitled: HSBC UK Bank PLC\n\
             Charge creation date: 15/03/2023\n\
             Brief description: All assets of the company\n\
             Contains floating charge.\n\
             Authentication of form"
                .to_string(),
        ]
    }

    fn query() -> Query {
        Query::new("Acme Ltd", "HSBC UK Bank PLC", "All assets of the company", "15 March 2023")
    }

    #[test]
    fn test_extract_document() {
        let fields = extract_document(&filing_pages());
        assert_eq!(fields.company_name.as_deref(), Some("ACME LTD"));
        assert_eq!(fields.persons_entitled.as_deref(), Some("HSBC UK BANK PLC"));
        assert_eq!(fields.brief_description.as_deref(), Some("ALL ASSETS OF THE COMPANY"));
        assert_eq!(fields.month_in_num.as_deref(), Some("15/03/2023"));
        assert_eq!(fields.charge_code.as_deref(), Some("012345678901"));
    }

    #[test]
    fn test_verify_document_match() {
        let report = verify_document(&filing_pages(), &query(), ScoreMode::Truncated).unwrap();
        assert!(report.matched);
        assert!(report.readable);
    }

    #[test]
    fn test_verify_document_bad_date() {
        let mut q = query();
        q.creation_date = "2023-03-15".into();
        let err = verify_document(&filing_pages(), &q, ScoreMode::Truncated).unwrap_err();
        assert_eq!(err, DateFormatError::new("2023-03-15"));
    }

    #[test]
    fn test_unreadable_document() {
        let pages: Vec<String> = vec![String::new()];
        let report = verify_document(&pages, &query(), ScoreMode::Truncated).unwrap();
        assert!(!report.matched);
        assert!(!report.readable);
        assert_eq!(report.fields, ExtractedFields::default());
    }

    #[test]
    fn test_batch_keeps_order_and_skips_other_months() {
        let candidates = vec![
            Candidate {
                description: Some("Registration of charge, created on 2 April 2023".into()),
                pages: filing_pages(),
            },
            Candidate { description: None, pages: vec!["unrelated".into()] },
            Candidate {
                description: Some("Registration of charge, created on 15 March 2023".into()),
                pages: filing_pages(),
            },
        ];
        let outcomes = verify_batch(&query(), &candidates, ScoreMode::Truncated).unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0], CandidateOutcome::Skipped);
        assert!(!outcomes[1].is_match());
        assert!(matches!(outcomes[1], CandidateOutcome::Evaluated(_)));
        assert!(outcomes[2].is_match());
    }

    #[test]
    fn test_batch_bad_date() {
        let mut q = query();
        q.creation_date = "March 2023".into();
        assert!(verify_batch(&q, &[], ScoreMode::Percent).is_err());
    }
}
