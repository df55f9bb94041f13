//! Match verdict for one document against the user's query.

use serde::{Deserialize, Serialize};

use crate::date::NormalizedDate;
use crate::fields::ExtractedFields;
use crate::similarity::{score_field, ScoreMode};

/// Minimum score for the fuzzy criteria.
pub const ACCEPT_THRESHOLD: u32 = 95;

// =============================================================================
// DATA STRUCTURES
// =============================================================================

/// What the user expects the filing to say.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub company_name: String,
    pub persons_entitled: String,
    pub brief_description: String,
    /// `<day> <full month name> <year>`, e.g. `"15 March 2023"`.
    pub creation_date: String,
}

impl Query {
    pub fn new(
        company_name: impl Into<String>,
        persons_entitled: impl Into<String>,
        brief_description: impl Into<String>,
        creation_date: impl Into<String>,
    ) -> Self {
        Self {
            company_name: company_name.into(),
            persons_entitled: persons_entitled.into(),
            brief_description: brief_description.into(),
            creation_date: creation_date.into(),
        }
    }

    pub fn date(&self) -> crate::Result<NormalizedDate> {
        NormalizedDate::parse(&self.creation_date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    CompanyName,
    PersonsEntitled,
    BriefDescription,
    CreationDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionOutcome {
    pub criterion: Criterion,
    pub passed: bool,
    /// Query value in the form it is compared in.
    pub expected: String,
    pub found: Option<String>,
    /// Set for the fuzzy criteria only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    pub matched: bool,
    /// False when the document had no text at all.
    pub readable: bool,
    pub fields: ExtractedFields,
    pub criteria: Vec<CriterionOutcome>,
}

impl MatchReport {
    pub fn failed(&self) -> Vec<Criterion> {
        self.criteria
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.criterion)
            .collect()
    }
}

// =============================================================================
// EVALUATION
// =============================================================================

/// Checks all four criteria and keeps the per-criterion detail.
pub fn assess(
    extracted: &ExtractedFields,
    query: &Query,
    date: &NormalizedDate,
    mode: ScoreMode,
) -> MatchReport {
    let criteria = vec![
        exact(Criterion::CompanyName, extracted.company_name.as_deref(), query.company_name.to_uppercase()),
        fuzzy(Criterion::PersonsEntitled, extracted.persons_entitled.as_deref(), query.persons_entitled.to_uppercase(), mode),
        fuzzy(Criterion::BriefDescription, extracted.brief_description.as_deref(), query.brief_description.to_uppercase(), mode),
        exact(Criterion::CreationDate, extracted.month_in_num.as_deref(), date.month_in_num.clone()),
    ];

    MatchReport {
        matched: criteria.iter().all(|c| c.passed),
        readable: true,
        fields: extracted.clone(),
        criteria,
    }
}

/// True only if company name and creation date match exactly and both
/// fuzzy fields reach [`ACCEPT_THRESHOLD`].
pub fn evaluate(extracted: &ExtractedFields, query: &Query, date: &NormalizedDate, mode: ScoreMode) -> bool {
    assess(extracted, query, date, mode).matched
}

fn exact(criterion: Criterion, found: Option<&str>, expected: String) -> CriterionOutcome {
    CriterionOutcome {
        criterion,
        passed: found == Some(expected.as_str()),
        found: found.map(str::to_string),
        expected,
        score: None,
    }
}

fn fuzzy(criterion: Criterion, found: Option<&str>, expected: String, mode: ScoreMode) -> CriterionOutcome {
    let score = score_field(found, &expected, mode);
    CriterionOutcome {
        criterion,
        passed: score >= ACCEPT_THRESHOLD,
        found: found.map(str::to_string),
        expected,
        score: Some(score),
    }
}
