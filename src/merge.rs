//! Merge an external country dataset into the canonical list
//!
//! Existing data is never overwritten. A field of an existing record is only
//! filled from the external record when it is unset (see the `is_*`
//! predicates). Unknown countries are appended, and the result is sorted by
//! display name. Applying the same external snapshot twice is a no-op the
//! second time.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::country::{collate, Country, Currency, Flag, Language};
use crate::error::{DatasetError, Result};

/// Currency code used when the external record lists no currency
pub const PLACEHOLDER_CURRENCY_CODE: &str = "N/A";

/// Counts reported after a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeSummary {
    pub total: usize,
    pub added: usize,
    pub updated: usize,
    /// External records dropped because they could not be converted
    pub skipped: usize,
}

/// True when a currency list carries no real data
pub fn is_placeholder_currency(currency: &[Currency]) -> bool {
    currency
        .first()
        .map(|c| c.code == PLACEHOLDER_CURRENCY_CODE)
        .unwrap_or(true)
}

/// True when the native name was never set to something distinct
pub fn is_unset_native_name(country: &Country) -> bool {
    country.native_name.is_empty() || country.native_name == country.name
}

/// True when the calling code is absent or empty
pub fn is_unset_calling_code(country: &Country) -> bool {
    country.calling_code().is_empty()
}

/// Merge `incoming` into `existing`, returning the new canonical list
pub fn merge_countries(existing: Vec<Country>, incoming: Vec<Country>) -> (Vec<Country>, MergeSummary) {
    let mut merged = existing;
    let mut summary = MergeSummary::default();

    let mut positions: HashMap<String, usize> = HashMap::new();
    for (idx, country) in merged.iter().enumerate() {
        positions.entry(country.cca2.clone()).or_insert(idx);
    }

    for external in incoming {
        match positions.get(&external.cca2) {
            Some(&idx) => {
                if fill_gaps(&mut merged[idx], external) {
                    summary.updated += 1;
                }
            }
            None => {
                debug!(cca2 = %external.cca2, "adding country");
                positions.insert(external.cca2.clone(), merged.len());
                merged.push(external);
                summary.added += 1;
            }
        }
    }

    merged.sort_by(|a, b| collate(&a.name, &b.name));
    summary.total = merged.len();
    (merged, summary)
}

/// Fill unset fields of `target` from `source`. Returns whether anything changed.
fn fill_gaps(target: &mut Country, source: Country) -> bool {
    let mut changed = false;

    if is_unset_calling_code(target) && target.calling_code != source.calling_code {
        target.calling_code = source.calling_code;
        changed = true;
    }

    if is_placeholder_currency(&target.currency)
        && !is_placeholder_currency(&source.currency)
        && target.currency != source.currency
    {
        target.currency = source.currency;
        changed = true;
    }

    if target.languages.is_empty() && !source.languages.is_empty() {
        target.languages = source.languages;
        changed = true;
    }

    if is_unset_native_name(target) && target.native_name != source.native_name {
        target.native_name = source.native_name;
        changed = true;
    }

    if changed {
        debug!(cca2 = %target.cca2, "filled missing fields");
    }
    changed
}

/// Country record in the mledoze/countries layout
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalCountry {
    #[serde(default)]
    pub name: ExternalName,
    #[serde(default)]
    pub cca2: String,
    #[serde(default)]
    pub cca3: String,
    #[serde(default)]
    pub ccn3: String,
    #[serde(default)]
    pub idd: Idd,
    #[serde(default, deserialize_with = "object_entries")]
    pub currencies: Vec<(String, ExternalCurrency)>,
    #[serde(default, deserialize_with = "object_entries")]
    pub languages: Vec<(String, String)>,
    #[serde(default)]
    pub flag: String,
    #[serde(default)]
    pub capital: Vec<String>,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub subregion: String,
    #[serde(default)]
    pub tld: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalName {
    #[serde(default)]
    pub common: String,
    #[serde(default)]
    pub official: String,
    /// Native names keyed by language, in document order
    #[serde(default, deserialize_with = "object_entries")]
    pub native: Vec<(String, NativeName)>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NativeName {
    #[serde(default)]
    pub common: String,
    #[serde(default)]
    pub official: String,
}

/// International direct dialing: root plus suffixes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Idd {
    #[serde(default)]
    pub root: String,
    #[serde(default)]
    pub suffixes: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalCurrency {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

impl ExternalCountry {
    /// Convert into a canonical record. Records without a cca2 are dropped.
    pub fn into_country(self) -> Option<Country> {
        if self.cca2.is_empty() {
            return None;
        }

        let name = self.name.common;
        let mut native_name = if name.is_empty() {
            self.name.official.clone()
        } else {
            name.clone()
        };
        if let Some((_, first)) = self.name.native.into_iter().next() {
            if !first.common.is_empty() {
                native_name = first.common;
            }
        }

        let calling_code = if self.idd.root.is_empty() {
            String::new()
        } else {
            let suffix = self.idd.suffixes.first().map(String::as_str).unwrap_or("");
            format!("{}{}", self.idd.root, suffix)
        };

        let mut currency: Vec<Currency> = self
            .currencies
            .into_iter()
            .map(|(code, info)| {
                let name = info.name.unwrap_or_else(|| code.clone());
                Currency::new(code, name, info.symbol.unwrap_or_default())
            })
            .collect();
        if currency.is_empty() {
            currency.push(Currency::new(PLACEHOLDER_CURRENCY_CODE, PLACEHOLDER_CURRENCY_CODE, ""));
        }

        let mut languages: Vec<Language> = self
            .languages
            .into_iter()
            .map(|(code, name)| Language::new(code, name))
            .collect();
        if languages.is_empty() {
            languages.push(Language::new("en", "English"));
        }

        Some(Country {
            flag: Flag {
                emoji: self.flag,
                svg: Flag::svg_path_for(&self.cca2),
            },
            cca2: self.cca2,
            cca3: self.cca3,
            ccn3: self.ccn3,
            name,
            native_name,
            calling_code: Some(calling_code),
            currency,
            languages,
            capital: self.capital.into_iter().next().unwrap_or_default(),
            region: self.region,
            subregion: self.subregion,
            tld: self.tld.into_iter().next().unwrap_or_default(),
            extra: BTreeMap::new(),
        })
    }
}

/// Parse an external dataset body. The body must be a JSON array; individual
/// records that fail to convert are skipped and counted.
pub fn parse_external(body: &str) -> Result<(Vec<Country>, usize)> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| DatasetError::MalformedRemote(e.to_string()))?;
    let Value::Array(records) = value else {
        return Err(DatasetError::MalformedRemote(
            "expected a JSON array of countries".to_string(),
        ));
    };

    let mut countries = Vec::with_capacity(records.len());
    let mut skipped = 0;
    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<ExternalCountry>(record) {
            Ok(external) => match external.into_country() {
                Some(country) => countries.push(country),
                None => {
                    debug!(index, "skipping record without cca2");
                    skipped += 1;
                }
            },
            Err(e) => {
                warn!(index, error = %e, "skipping unreadable external record");
                skipped += 1;
            }
        }
    }
    Ok((countries, skipped))
}

/// Fetch and parse the external dataset with a single blocking GET
pub fn fetch_external(url: &str) -> Result<(Vec<Country>, usize)> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(|e| DatasetError::fetch(url, format!("failed to create HTTP client: {}", e)))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| DatasetError::fetch(url, e))?;

    info!(status = %response.status(), url, "fetched external dataset");
    if !response.status().is_success() {
        return Err(DatasetError::fetch(url, format!("HTTP {}", response.status())));
    }

    let body = response.text().map_err(|e| DatasetError::fetch(url, e))?;
    parse_external(&body)
}

/// Entries of a JSON object in document order; anything else reads as empty
fn object_entries<'de, D, T>(deserializer: D) -> std::result::Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| serde_json::from_value(v).map(|v| (k, v)).map_err(D::Error::custom))
            .collect(),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn external_body() -> String {
        json!([
            {
                "name": {
                    "common": "Germany",
                    "official": "Federal Republic of Germany",
                    "native": { "deu": { "common": "Deutschland", "official": "Bundesrepublik Deutschland" } }
                },
                "cca2": "DE",
                "cca3": "DEU",
                "ccn3": "276",
                "idd": { "root": "+4", "suffixes": ["9"] },
                "currencies": { "EUR": { "name": "Euro", "symbol": "€" } },
                "languages": { "deu": "German" },
                "flag": "🇩🇪",
                "capital": ["Berlin"],
                "region": "Europe",
                "subregion": "Western Europe",
                "tld": [".de"]
            },
            {
                "name": { "common": "Antarctica", "official": "Antarctica" },
                "cca2": "AQ",
                "cca3": "ATA",
                "idd": { "root": "", "suffixes": [] },
                "currencies": [],
                "languages": {},
                "region": "Antarctic"
            },
            {
                "name": { "common": "Nowhere" },
                "cca3": "NWH"
            },
            {
                "name": "not an object",
                "cca2": "ZZ"
            }
        ])
        .to_string()
    }

    #[test]
    fn test_parse_external_conversion() {
        let (countries, skipped) = parse_external(&external_body()).unwrap();
        assert_eq!(countries.len(), 2);
        assert_eq!(skipped, 2);

        let de = &countries[0];
        assert_eq!(de.name, "Germany");
        assert_eq!(de.native_name, "Deutschland");
        assert_eq!(de.calling_code(), "+49");
        assert_eq!(de.currency, vec![Currency::new("EUR", "Euro", "€")]);
        assert_eq!(de.capital, "Berlin");
        assert_eq!(de.tld, ".de");
        assert_eq!(de.flag.svg, "flags/de.svg");

        let aq = &countries[1];
        assert_eq!(aq.calling_code, Some(String::new()));
        assert!(is_placeholder_currency(&aq.currency));
        assert_eq!(aq.languages, vec![Language::new("en", "English")]);
    }

    #[test]
    fn test_external_maps_keep_document_order() {
        let body = r#"[{
            "name": {
                "common": "Switzerland",
                "native": {
                    "gsw": { "common": "Schweiz", "official": "Schweizerische Eidgenossenschaft" },
                    "fra": { "common": "Suisse", "official": "Confédération suisse" }
                }
            },
            "cca2": "CH",
            "currencies": { "CHF": { "name": "Swiss franc", "symbol": "Fr." }, "EUR": { "name": "Euro" } },
            "languages": { "gsw": "Swiss German", "fra": "French", "ita": "Italian", "roh": "Romansh" }
        }]"#;
        let (countries, _) = parse_external(body).unwrap();
        let ch = &countries[0];

        assert_eq!(ch.native_name, "Schweiz");
        let currencies: Vec<_> = ch.currency.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(currencies, vec!["CHF", "EUR"]);
        let languages: Vec<_> = ch.languages.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(languages, vec!["gsw", "fra", "ita", "roh"]);
    }

    #[test]
    fn test_parse_external_rejects_non_array() {
        let err = parse_external(r#"{"message": "rate limited"}"#).unwrap_err();
        assert!(matches!(err, DatasetError::MalformedRemote(_)));
        assert!(parse_external("<html>").is_err());
    }

    #[test]
    fn test_predicates() {
        assert!(is_placeholder_currency(&[]));
        assert!(is_placeholder_currency(&[Currency::new("N/A", "N/A", "")]));
        assert!(!is_placeholder_currency(&[Currency::new("EUR", "Euro", "€")]));

        let mut country = Country::new("DE", "DEU", "Germany");
        assert!(is_unset_native_name(&country));
        assert!(is_unset_calling_code(&country));
        country.native_name = "Deutschland".into();
        country.calling_code = Some("+49".into());
        assert!(!is_unset_native_name(&country));
        assert!(!is_unset_calling_code(&country));
    }

    #[test]
    fn test_merge_fills_only_gaps() {
        let existing = vec![
            Country::new("DE", "DEU", "Germany")
                .with_currency(Currency::new("N/A", "N/A", ""))
                .with_language(Language::new("de", "German")),
        ];
        let (incoming, _) = parse_external(&external_body()).unwrap();

        let (merged, summary) = merge_countries(existing, incoming);
        assert_eq!(summary.added, 1);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.total, 2);

        let de = merged.iter().find(|c| c.cca2 == "DE").unwrap();
        assert_eq!(de.calling_code(), "+49");
        assert_eq!(de.currency[0].code, "EUR");
        assert_eq!(de.native_name, "Deutschland");
        // existing non-empty languages are kept
        assert_eq!(de.languages, vec![Language::new("de", "German")]);
    }

    #[test]
    fn test_merge_never_overwrites() {
        let mut existing = vec![Country::new("DE", "DEU", "Germany")
            .with_calling_code("+49")
            .with_currency(Currency::new("DEM", "Mark", "DM"))
            .with_language(Language::new("de", "German"))];
        existing[0].native_name = "Deutschland (local)".into();

        let (incoming, _) = parse_external(&external_body()).unwrap();
        let (merged, summary) = merge_countries(existing.clone(), incoming);

        assert_eq!(summary.updated, 0);
        let de = merged.iter().find(|c| c.cca2 == "DE").unwrap();
        assert_eq!(de, &existing[0]);
    }

    #[test]
    fn test_placeholder_never_replaces_currency() {
        let existing = vec![Country::new("AQ", "ATA", "Antarctica")];
        let (incoming, _) = parse_external(&external_body()).unwrap();
        let (merged, _) = merge_countries(existing, incoming);
        let aq = merged.iter().find(|c| c.cca2 == "AQ").unwrap();
        assert!(aq.currency.is_empty());
    }

    #[test]
    fn test_merge_sorted_by_name() {
        let existing = vec![
            Country::new("ZA", "ZAF", "South Africa"),
            Country::new("AL", "ALB", "Albania"),
        ];
        let (incoming, _) = parse_external(&external_body()).unwrap();
        let (merged, _) = merge_countries(existing, incoming);
        let names: Vec<_> = merged.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Albania", "Antarctica", "Germany", "South Africa"]);
    }

    #[test]
    fn test_merge_idempotent() {
        let existing = vec![
            Country::new("DE", "DEU", "Germany"),
            Country::new("FR", "FRA", "France").with_calling_code("+33"),
        ];
        let (incoming, _) = parse_external(&external_body()).unwrap();

        let (once, _) = merge_countries(existing, incoming.clone());
        let (twice, summary) = merge_countries(once.clone(), incoming);
        assert_eq!(once, twice);
        assert_eq!(summary.added, 0);
        assert_eq!(summary.updated, 0);
    }
}
