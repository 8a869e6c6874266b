//! Validation findings and mergeable reports
//!
//! A [`ValidationReport`] is an ordered, append-only list of
//! [`ValidationFinding`]s. It is valid when every finding is valid (an empty
//! report is valid). Argument parsing failures and schema issues can both be
//! folded into one report.
//!
//! Reports are plain values: share them across threads only behind your own
//! synchronization.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ArgumentError, Result};
use crate::json::{self, JsonSettings};
use crate::validator::SchemaIssue;

/// A single named validation outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFinding {
    /// Field or rule that was checked
    pub name: String,
    /// Textual form of the checked value, possibly empty
    pub value: String,
    pub is_valid: bool,
    pub message: String,
}

impl ValidationFinding {
    pub fn new(
        name: impl Into<String>,
        value: impl fmt::Display,
        is_valid: bool,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.to_string(),
            is_valid,
            message: message.into(),
        }
    }

    pub fn valid(name: impl Into<String>, value: impl fmt::Display) -> Self {
        Self::new(name, value, true, String::new())
    }

    pub fn invalid(
        name: impl Into<String>,
        value: impl fmt::Display,
        message: impl Into<String>,
    ) -> Self {
        Self::new(name, value, false, message)
    }
}

/// Ordered collection of findings with a derived validity flag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    findings: Vec<ValidationFinding>,
}

/// Summary view holding only the failed findings
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary<'a> {
    pub validation_errors: Vec<&'a ValidationFinding>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, finding: ValidationFinding) {
        self.findings.push(finding);
    }

    /// Record a failed check with an empty value
    pub fn add_failure(&mut self, name: impl Into<String>, message: impl Into<String>) {
        self.add(ValidationFinding::invalid(name, "", message));
    }

    pub fn add_entry(
        &mut self,
        name: impl Into<String>,
        message: impl Into<String>,
        is_valid: bool,
        value: impl fmt::Display,
    ) {
        self.add(ValidationFinding::new(name, value, is_valid, message));
    }

    /// Append every finding of `other`, keeping its order, after this report's findings
    pub fn merge(&mut self, other: &ValidationReport) {
        self.findings.extend(other.findings.iter().cloned());
    }

    /// One invalid `argument` finding per rejected token
    pub fn add_argument_errors(&mut self, errors: &[ArgumentError]) {
        for error in errors {
            self.add(ValidationFinding::invalid(
                "argument",
                &error.token,
                error.to_string(),
            ));
        }
    }

    /// One invalid finding per schema issue, named after its severity
    pub fn add_schema_issues(&mut self, issues: &[SchemaIssue]) {
        for issue in issues {
            self.add(ValidationFinding::invalid(
                issue.severity.to_string(),
                issue.position().unwrap_or_default(),
                issue.message.clone(),
            ));
        }
    }

    pub fn is_valid(&self) -> bool {
        self.findings.iter().all(|f| f.is_valid)
    }

    pub fn findings(&self) -> &[ValidationFinding] {
        &self.findings
    }

    pub fn failures(&self) -> impl Iterator<Item = &ValidationFinding> {
        self.findings.iter().filter(|f| !f.is_valid)
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn summary(&self) -> ValidationSummary<'_> {
        ValidationSummary {
            validation_errors: self.failures().collect(),
        }
    }

    /// Render the failure summary as `{ "validationErrors": [...] }`
    pub fn to_json(&self, settings: &JsonSettings) -> Result<String> {
        json::serialize(&self.summary(), settings)
    }
}

impl Extend<ValidationFinding> for ValidationReport {
    fn extend<I: IntoIterator<Item = ValidationFinding>>(&mut self, iter: I) {
        self.findings.extend(iter);
    }
}

impl FromIterator<ValidationFinding> for ValidationReport {
    fn from_iter<I: IntoIterator<Item = ValidationFinding>>(iter: I) -> Self {
        Self {
            findings: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .to_json(&JsonSettings::default())
            .map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
