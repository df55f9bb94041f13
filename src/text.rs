//! Canonical single-line form of extracted PDF text.

use serde::Serialize;

/// Joins newlines, collapses whitespace runs, trims and upper-cases.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Page texts of one document, read the way the field extractors need them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentText {
    /// Pages joined in order, each followed by a newline.
    pub raw: String,
    /// `raw` after [`normalize`].
    pub normalized: String,
    /// First charge code found while reading pages.
    pub charge_code: Option<String>,
    readable: bool,
}

impl DocumentText {
    pub fn from_pages<S: AsRef<str>>(pages: &[S]) -> Self {
        let mut raw = String::new();
        let mut charge_code = None;
        let mut readable = false;

        for page in pages {
            let page = page.as_ref();
            raw.push_str(page);
            raw.push('\n');
            readable |= !page.trim().is_empty();
            if charge_code.is_none() {
                charge_code = crate::fields::charge_code_in(page);
            }
        }

        let normalized = normalize(&raw);
        Self { raw, normalized, charge_code, readable }
    }

    /// False when there were no pages or every page was blank.
    pub fn is_readable(&self) -> bool {
        self.readable
    }
}
