//! Integrity validation
//!
//! Checks the canonical list and the derived artifacts for structural and
//! cross-referential consistency. Validation never mutates data; every anomaly
//! becomes a [`Finding`] classified as an error or a warning.
//!
//! ## Checks
//! 1. **Countries**: required fields, duplicate and malformed keys, calling
//!    code format, empty currency/language lists (warnings)
//! 2. **Dial codes**: `+` prefix, references to known countries
//! 3. **Currencies**: 3-letter codes, uniqueness, references
//! 4. **Languages**: 2-letter codes (warning only), uniqueness, references
//! 5. **Calling-code index**: references

use std::collections::HashSet;

use serde::Serialize;
use serde_json::json;

use crate::country::Country;
use crate::store::Dataset;

/// Which part of the dataset a finding belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Countries,
    DialCodes,
    Currencies,
    Languages,
    CallingCodeIndex,
}

impl Section {
    pub fn title(&self) -> &'static str {
        match self {
            Section::Countries => "Countries",
            Section::DialCodes => "Dial Codes",
            Section::Currencies => "Currencies",
            Section::Languages => "Languages",
            Section::CallingCodeIndex => "Calling Code Index",
        }
    }

    /// Noun used in "Validated N ..." lines
    pub fn noun(&self) -> &'static str {
        match self {
            Section::Countries => "countries",
            Section::DialCodes => "dial codes",
            Section::Currencies => "currencies",
            Section::Languages => "languages",
            Section::CallingCodeIndex => "calling code groups",
        }
    }
}

/// One anomaly found during validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub code: &'static str,
    pub section: Section,
    pub message: String,
}

/// Overall validation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    PassWithWarnings,
    Fail,
}

impl Outcome {
    /// Only a failed validation blocks
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Fail)
    }
}

/// Result of validating a dataset
#[derive(Debug, Default, Clone, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
    /// Number of items checked per section, in check order
    pub checked: Vec<(Section, usize)>,
}

impl ValidationReport {
    pub fn outcome(&self) -> Outcome {
        if !self.errors.is_empty() {
            Outcome::Fail
        } else if !self.warnings.is_empty() {
            Outcome::PassWithWarnings
        } else {
            Outcome::Pass
        }
    }

    /// Findings of one section, errors first
    pub fn section_findings(&self, section: Section) -> (Vec<&Finding>, Vec<&Finding>) {
        (
            self.errors.iter().filter(|f| f.section == section).collect(),
            self.warnings.iter().filter(|f| f.section == section).collect(),
        )
    }

    /// Machine-readable report
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "outcome": self.outcome(),
            "errors": self.errors.len(),
            "warnings": self.warnings.len(),
            "checked": self.checked.iter()
                .map(|(section, count)| (section.noun().replace(' ', "_"), json!(count)))
                .collect::<serde_json::Map<_, _>>(),
            "findings": {
                "errors": self.errors,
                "warnings": self.warnings,
            },
        })
    }

    fn error(&mut self, section: Section, code: &'static str, message: String) {
        self.errors.push(Finding { code, section, message });
    }

    fn warn(&mut self, section: Section, code: &'static str, message: String) {
        self.warnings.push(Finding { code, section, message });
    }
}

/// Validate the canonical list and every derived artifact
pub fn validate(dataset: &Dataset) -> ValidationReport {
    let mut report = ValidationReport::default();

    let known = check_countries(&dataset.countries, &mut report);
    check_dial_codes(dataset, &known, &mut report);
    check_currencies(dataset, &known, &mut report);
    check_languages(dataset, &known, &mut report);
    check_calling_code_index(dataset, &known, &mut report);

    tracing::info!(
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "validation finished"
    );
    report
}

/// Returns the set of known cca2 codes.
///
/// An empty `calling_code` is accepted for territories without a dial code.
/// This deliberately departs from the older validator, which treated `""` as
/// missing; here only an absent or null field is reported.
fn check_countries<'a>(countries: &'a [Country], report: &mut ValidationReport) -> HashSet<&'a str> {
    let section = Section::Countries;
    let mut seen_cca2 = HashSet::new();
    let mut seen_cca3 = HashSet::new();

    for (index, country) in countries.iter().enumerate() {
        let label = label(index, country);

        for (field, missing) in [
            ("cca2", country.cca2.is_empty()),
            ("cca3", country.cca3.is_empty()),
            ("name", country.name.is_empty()),
            ("calling_code", country.calling_code.is_none()),
        ] {
            if missing {
                report.error(
                    section,
                    "MISSING_FIELD",
                    format!("Country at index {} missing {}", index, field),
                );
            }
        }

        // Empty keys were reported above and are not compared for duplicates
        if !country.cca2.is_empty() && !seen_cca2.insert(country.cca2.as_str()) {
            report.error(section, "DUPLICATE_CCA2", format!("Duplicate cca2: {}", country.cca2));
        }
        if !country.cca3.is_empty() && !seen_cca3.insert(country.cca3.as_str()) {
            report.error(section, "DUPLICATE_CCA3", format!("Duplicate cca3: {}", country.cca3));
        }

        if !country.cca2.is_empty() && country.cca2.chars().count() != 2 {
            report.error(section, "INVALID_CCA2", format!("{}: cca2 must be 2 characters", label));
        }
        if !country.cca3.is_empty() && country.cca3.chars().count() != 3 {
            report.error(section, "INVALID_CCA3", format!("{}: cca3 must be 3 characters", label));
        }

        let calling_code = country.calling_code();
        if !calling_code.is_empty() && !calling_code.starts_with('+') {
            report.error(
                section,
                "INVALID_CALLING_CODE",
                format!("{}: calling_code must start with +", label),
            );
        }

        if country.currency.is_empty() {
            report.warn(section, "NO_CURRENCY", format!("{}: no currency defined", label));
        }
        if country.languages.is_empty() {
            report.warn(section, "NO_LANGUAGES", format!("{}: no languages defined", label));
        }
    }

    report.checked.push((section, countries.len()));
    seen_cca2
}

fn check_dial_codes(dataset: &Dataset, known: &HashSet<&str>, report: &mut ValidationReport) {
    let section = Section::DialCodes;
    for dial in &dataset.dial_codes {
        if !dial.code.starts_with('+') {
            report.error(
                section,
                "INVALID_DIAL_CODE",
                format!("Dial code {} must start with +", dial.code),
            );
        }
        for cca2 in &dial.countries {
            if !known.contains(cca2.as_str()) {
                report.error(
                    section,
                    "DANGLING_REFERENCE",
                    format!("Dial code {} references unknown country: {}", dial.code, cca2),
                );
            }
        }
    }
    report.checked.push((section, dataset.dial_codes.len()));
}

fn check_currencies(dataset: &Dataset, known: &HashSet<&str>, report: &mut ValidationReport) {
    let section = Section::Currencies;
    let mut seen = HashSet::new();
    for currency in &dataset.currencies {
        if currency.code.chars().count() != 3 {
            report.error(
                section,
                "INVALID_CURRENCY_CODE",
                format!("Currency code must be 3 characters: {}", currency.code),
            );
        }
        if !seen.insert(currency.code.as_str()) {
            report.error(
                section,
                "DUPLICATE_CURRENCY",
                format!("Duplicate currency code: {}", currency.code),
            );
        }
        for cca2 in &currency.countries {
            if !known.contains(cca2.as_str()) {
                report.error(
                    section,
                    "DANGLING_REFERENCE",
                    format!("Currency {} references unknown country: {}", currency.code, cca2),
                );
            }
        }
    }
    report.checked.push((section, dataset.currencies.len()));
}

fn check_languages(dataset: &Dataset, known: &HashSet<&str>, report: &mut ValidationReport) {
    let section = Section::Languages;
    let mut seen = HashSet::new();
    for language in &dataset.languages {
        // Some language tags are longer than ISO 639-1; warn only
        if language.code.chars().count() != 2 {
            report.warn(
                section,
                "LANGUAGE_CODE_LENGTH",
                format!("Language code should be 2 characters: {}", language.code),
            );
        }
        if !seen.insert(language.code.as_str()) {
            report.error(
                section,
                "DUPLICATE_LANGUAGE",
                format!("Duplicate language code: {}", language.code),
            );
        }
        for cca2 in &language.countries {
            if !known.contains(cca2.as_str()) {
                report.error(
                    section,
                    "DANGLING_REFERENCE",
                    format!("Language {} references unknown country: {}", language.code, cca2),
                );
            }
        }
    }
    report.checked.push((section, dataset.languages.len()));
}

fn check_calling_code_index(dataset: &Dataset, known: &HashSet<&str>, report: &mut ValidationReport) {
    let section = Section::CallingCodeIndex;
    for (code, countries) in &dataset.by_calling_code {
        for country in countries {
            if !known.contains(country.cca2.as_str()) {
                report.error(
                    section,
                    "DANGLING_REFERENCE",
                    format!(
                        "Calling code {:?} references unknown country: {}",
                        code, country.cca2
                    ),
                );
            }
        }
    }
    report.checked.push((section, dataset.by_calling_code.len()));
}

fn label(index: usize, country: &Country) -> String {
    if country.name.is_empty() {
        format!("Country at index {}", index)
    } else {
        country.name.clone()
    }
}
