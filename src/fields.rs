//! Field extraction from charge-registration text.
//!
//! Each field is one [`SegmentRule`]: a start anchor, and either a set of
//! terminator phrases (free text) or a token shape (dates). The rules run
//! independently over the upper-cased normalized text, so every anchor and
//! terminator here is upper-case.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

// =============================================================================
// DATA STRUCTURES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    CompanyName,
    BriefDescription,
    MonthInNum,
    PersonsEntitled,
}

/// `None` means the anchors were not found; `Some("")` means they were, with
/// nothing between them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub company_name: Option<String>,
    pub brief_description: Option<String>,
    pub month_in_num: Option<String>,
    pub persons_entitled: Option<String>,
    pub charge_code: Option<String>,
}

impl ExtractedFields {
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::CompanyName => self.company_name.as_deref(),
            Field::BriefDescription => self.brief_description.as_deref(),
            Field::MonthInNum => self.month_in_num.as_deref(),
            Field::PersonsEntitled => self.persons_entitled.as_deref(),
        }
    }

    fn set(&mut self, field: Field, value: Option<String>) {
        match field {
            Field::CompanyName => self.company_name = value,
            Field::BriefDescription => self.brief_description = value,
            Field::MonthInNum => self.month_in_num = value,
            Field::PersonsEntitled => self.persons_entitled = value,
        }
    }
}

/// What follows a rule's start anchor.
#[derive(Debug, Clone, Copy)]
pub enum Segment {
    /// Shortest text up to the earliest of these phrases.
    Until(&'static [&'static str]),
    /// A token of this regex shape, directly after the anchor.
    Token(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct SegmentRule {
    pub field: Field,
    pub start: &'static str,
    pub segment: Segment,
    /// Phrases cut off the captured text again, at their first occurrence.
    pub retrim: &'static [&'static str],
}

impl SegmentRule {
    fn pattern(&self) -> String {
        let start = regex::escape(self.start);
        match self.segment {
            Segment::Until(ends) => {
                let ends: Vec<String> = ends.iter().map(|e| regex::escape(e)).collect();
                format!(r"{start}\s*(.*?)(?:{})", ends.join("|"))
            }
            Segment::Token(shape) => format!(r"{start}\s*({shape})"),
        }
    }

    fn apply(&self, re: &Regex, text: &str) -> Option<String> {
        let captured = re.captures(text)?.get(1)?.as_str();
        let mut value = captured.trim();
        for phrase in self.retrim {
            if let Some(idx) = value.find(phrase) {
                value = value[..idx].trim();
            }
        }
        Some(value.to_string())
    }
}

// =============================================================================
// RULES
// =============================================================================

/// Field rules for the registry's charge-registration form.
pub const CHARGE_RULES: &[SegmentRule] = &[
    SegmentRule {
        field: Field::CompanyName,
        start: "COMPANY NAME:",
        segment: Segment::Until(&["COMPANY NUMBER:"]),
        retrim: &[],
    },
    SegmentRule {
        field: Field::BriefDescription,
        start: "BRIEF DESCRIPTION:",
        segment: Segment::Until(&[
            "CONTAINS FIXED CHARGE",
            "CONTAINS NEGATIVE PLEDGE",
            "CONTAINS FLOATING CHARGE",
            "CONTAINS",
            "AUTHENTICATION OF FORM",
            "CERTIFIED BY:",
            "CERTIFICATION STATEMENT:",
        ]),
        // "CONTAINS" is a prefix of the specific phrases, checked last
        retrim: &[
            "CONTAINS FIXED CHARGE",
            "CONTAINS NEGATIVE PLEDGE",
            "CONTAINS FLOATING CHARGE",
            "CONTAINS",
        ],
    },
    SegmentRule {
        field: Field::MonthInNum,
        start: "DATE OF CREATION:",
        segment: Segment::Token(r"\d{2}/\d{2}/\d{4}"),
        retrim: &[],
    },
    SegmentRule {
        field: Field::PersonsEntitled,
        start: "PERSONS ENTITLED:",
        segment: Segment::Until(&[
            "CHARGE",
            "DATE OF CREATION",
            "BRIEF DESCRIPTION",
            "AUTHENTICATION",
            "CERTIFIED BY:",
            "CERTIFICATION STATEMENT:",
        ]),
        retrim: &[],
    },
];

lazy_static! {
    static ref CHARGE_RULE_PATTERNS: Vec<Regex> = compile_rules(CHARGE_RULES);

    // Raw page text, whitespace intact
    static ref CHARGE_CODE_PATTERN: Regex = Regex::new(
        r"Charge code:\s*(\d{3,4}\s*\d{3,4}\s*\d{3,4})"
    ).unwrap();
}

/// Compiles a rule table. Rules are built from escaped literals and fixed
/// token shapes, so a failure here is a bug in the table.
pub fn compile_rules(rules: &[SegmentRule]) -> Vec<Regex> {
    rules
        .iter()
        .map(|rule| Regex::new(&rule.pattern()).unwrap())
        .collect()
}

// =============================================================================
// EXTRACTION FUNCTIONS
// =============================================================================

/// Runs a rule table over normalized text. Never fails; unmatched fields
/// stay `None`. `charge_code` is left untouched.
pub fn extract_with_rules(normalized: &str, rules: &[SegmentRule], patterns: &[Regex]) -> ExtractedFields {
    let mut fields = ExtractedFields::default();

    for (rule, re) in rules.iter().zip(patterns) {
        let value = rule.apply(re, normalized);
        if value.is_none() {
            debug!(field = ?rule.field, anchor = rule.start, "field not found");
        }
        fields.set(rule.field, value);
    }

    fields
}

/// Extracts company name, brief description, creation date and persons
/// entitled from normalized text.
pub fn extract_fields(normalized: &str) -> ExtractedFields {
    extract_with_rules(normalized, CHARGE_RULES, &CHARGE_RULE_PATTERNS)
}

/// Charge code on a single raw page, digits only.
pub fn charge_code_in(page: &str) -> Option<String> {
    let caps = CHARGE_CODE_PATTERN.captures(page)?;
    let code: String = caps[1].chars().filter(|c| !c.is_whitespace()).collect();
    Some(code)
}

/// First charge code across raw pages, in page order. Stops at the first
/// page that has one.
pub fn extract_charge_code<S: AsRef<str>>(pages: &[S]) -> Option<String> {
    pages.iter().find_map(|page| charge_code_in(page.as_ref()))
}

// =============================================================================
// TESTS
// =============================================================================
