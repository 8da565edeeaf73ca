//! Derivation engine
//!
//! Computes every derived artifact from the canonical country list. All
//! builders are pure: they only read the input and return fresh values.
//!
//! Two policies are worth knowing about:
//!
//! - `dial_codes` skips countries with an empty calling code, while
//!   `by_calling_code` groups them under the `""` key.
//! - The direct indexes (`by_cca2`, `by_cca3`) let a later duplicate key
//!   replace an earlier one. Duplicates are reported by the validator.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::country::{collate, Country};

/// Countries sharing one dial code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialCode {
    #[serde(default)]
    pub code: String,
    /// Member cca2 codes in canonical order
    #[serde(default)]
    pub countries: Vec<String>,
}

/// A currency and the countries that use it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyGroup {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub countries: Vec<String>,
}

/// A language and the countries that list it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageGroup {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub countries: Vec<String>,
}

/// Key → country index
pub type CountryIndex = BTreeMap<String, Country>;

/// Calling code → countries index
pub type CallingCodeIndex = BTreeMap<String, Vec<Country>>;

/// The full set of artifacts derived from one canonical list
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedArtifacts {
    pub dial_codes: Vec<DialCode>,
    pub currencies: Vec<CurrencyGroup>,
    pub languages: Vec<LanguageGroup>,
    pub by_cca2: CountryIndex,
    pub by_cca3: CountryIndex,
    pub by_calling_code: CallingCodeIndex,
}

impl DerivedArtifacts {
    /// Derive every artifact from the canonical list
    pub fn build(countries: &[Country]) -> Self {
        let artifacts = Self {
            dial_codes: build_dial_codes(countries),
            currencies: build_currencies(countries),
            languages: build_languages(countries),
            by_cca2: build_by_cca2(countries),
            by_cca3: build_by_cca3(countries),
            by_calling_code: build_by_calling_code(countries),
        };
        debug!(
            dial_codes = artifacts.dial_codes.len(),
            currencies = artifacts.currencies.len(),
            languages = artifacts.languages.len(),
            "derived artifacts"
        );
        artifacts
    }
}

/// Group cca2 codes by calling code, skipping countries without one.
///
/// Groups are ordered by plain string comparison, so `+1` < `+20` < `+7`.
pub fn build_dial_codes(countries: &[Country]) -> Vec<DialCode> {
    let mut groups: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for country in countries {
        let code = country.calling_code();
        if code.is_empty() {
            continue;
        }
        groups.entry(code).or_default().push(country.cca2.clone());
    }

    groups
        .into_iter()
        .map(|(code, countries)| DialCode {
            code: code.to_string(),
            countries,
        })
        .collect()
}

/// Group countries by currency code
pub fn build_currencies(countries: &[Country]) -> Vec<CurrencyGroup> {
    let mut groups: Vec<CurrencyGroup> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for country in countries {
        for currency in &country.currency {
            let idx = *positions.entry(currency.code.clone()).or_insert_with(|| {
                groups.push(CurrencyGroup {
                    code: currency.code.clone(),
                    name: currency.name.clone(),
                    symbol: currency.symbol.clone(),
                    countries: Vec::new(),
                });
                groups.len() - 1
            });
            push_unique(&mut groups[idx].countries, &country.cca2);
        }
    }

    groups.sort_by(|a, b| collate(&a.code, &b.code));
    groups
}

/// Group countries by language code
pub fn build_languages(countries: &[Country]) -> Vec<LanguageGroup> {
    let mut groups: Vec<LanguageGroup> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for country in countries {
        for language in &country.languages {
            let idx = *positions.entry(language.code.clone()).or_insert_with(|| {
                groups.push(LanguageGroup {
                    code: language.code.clone(),
                    name: language.name.clone(),
                    countries: Vec::new(),
                });
                groups.len() - 1
            });
            push_unique(&mut groups[idx].countries, &country.cca2);
        }
    }

    groups.sort_by(|a, b| collate(&a.code, &b.code));
    groups
}

/// Index by alpha-2 code. A later duplicate replaces an earlier one.
pub fn build_by_cca2(countries: &[Country]) -> CountryIndex {
    countries
        .iter()
        .map(|c| (c.cca2.clone(), c.clone()))
        .collect()
}

/// Index by alpha-3 code. A later duplicate replaces an earlier one.
pub fn build_by_cca3(countries: &[Country]) -> CountryIndex {
    countries
        .iter()
        .map(|c| (c.cca3.clone(), c.clone()))
        .collect()
}

/// Group full records by calling code, keeping `""` as its own group
pub fn build_by_calling_code(countries: &[Country]) -> CallingCodeIndex {
    let mut index = CallingCodeIndex::new();
    for country in countries {
        index
            .entry(country.calling_code().to_string())
            .or_default()
            .push(country.clone());
    }
    index
}

fn push_unique(list: &mut Vec<String>, cca2: &str) {
    if !list.iter().any(|c| c == cca2) {
        list.push(cca2.to_string());
    }
}
