//! Read-only access to a generated dataset
//!
//! A [`Catalog`] is loaded once and then shared by reference; it holds no
//! global state.

use std::path::Path;

use crate::country::Country;
use crate::derive::{CurrencyGroup, DialCode, LanguageGroup};
use crate::error::Result;
use crate::store::{DataDir, Dataset};

/// Lookups over the canonical list and its derived indexes
#[derive(Debug, Clone)]
pub struct Catalog {
    dataset: Dataset,
}

impl Catalog {
    /// Load every artifact from a data directory
    pub fn load(data_dir: impl AsRef<Path>) -> Result<Self> {
        let dataset = DataDir::new(data_dir).load_dataset()?;
        Ok(Self { dataset })
    }

    /// Build a catalog from an in-memory canonical list
    pub fn from_countries(countries: Vec<Country>) -> Self {
        Self {
            dataset: Dataset::from_countries(countries),
        }
    }

    pub fn countries(&self) -> &[Country] {
        &self.dataset.countries
    }

    pub fn dial_codes(&self) -> &[DialCode] {
        &self.dataset.dial_codes
    }

    pub fn currencies(&self) -> &[CurrencyGroup] {
        &self.dataset.currencies
    }

    pub fn languages(&self) -> &[LanguageGroup] {
        &self.dataset.languages
    }

    /// Lookup by alpha-2 code, ignoring case
    pub fn by_cca2(&self, code: &str) -> Option<&Country> {
        self.dataset.by_cca2.get(&code.to_uppercase())
    }

    /// Lookup by alpha-3 code, ignoring case
    pub fn by_cca3(&self, code: &str) -> Option<&Country> {
        self.dataset.by_cca3.get(&code.to_uppercase())
    }

    /// Lookup by alpha-2, then alpha-3 code
    pub fn by_code(&self, code: &str) -> Option<&Country> {
        self.by_cca2(code).or_else(|| self.by_cca3(code))
    }

    /// Countries sharing a calling code; `"44"` and `"+44"` are equivalent
    pub fn by_calling_code(&self, code: &str) -> &[Country] {
        let code = code.trim();
        let normalized = if code.starts_with('+') {
            code.to_string()
        } else {
            format!("+{}", code)
        };
        self.dataset
            .by_calling_code
            .get(&normalized)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Countries in a region, ignoring case
    pub fn by_region(&self, region: &str) -> Vec<&Country> {
        self.dataset
            .countries
            .iter()
            .filter(|c| c.region.eq_ignore_ascii_case(region))
            .collect()
    }

    /// Countries using a currency, ignoring case
    pub fn by_currency(&self, code: &str) -> Vec<&Country> {
        self.dataset
            .currencies
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code))
            .map(|c| self.resolve(&c.countries))
            .unwrap_or_default()
    }

    /// Countries listing a language, ignoring case
    pub fn by_language(&self, code: &str) -> Vec<&Country> {
        self.dataset
            .languages
            .iter()
            .find(|l| l.code.eq_ignore_ascii_case(code))
            .map(|l| self.resolve(&l.countries))
            .unwrap_or_default()
    }

    /// Case-insensitive substring search over name and native name
    pub fn search(&self, query: &str) -> Vec<&Country> {
        let query = query.to_lowercase();
        self.dataset
            .countries
            .iter()
            .filter(|c| {
                c.name.to_lowercase().contains(&query)
                    || c.native_name.to_lowercase().contains(&query)
            })
            .collect()
    }

    fn resolve(&self, codes: &[String]) -> Vec<&Country> {
        codes
            .iter()
            .filter_map(|code| self.dataset.by_cca2.get(code))
            .collect()
    }
}
