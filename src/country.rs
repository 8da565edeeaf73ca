//! Country record types

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// A single country in the canonical list
///
/// Scalar fields that are absent (or `null`) in the source deserialize to
/// empty strings so derivation stays permissive. `calling_code` keeps the
/// absent/empty distinction: `None` is a missing field, `Some("")` is a
/// territory without a dial code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    /// ISO 3166-1 alpha-2 code (primary key)
    #[serde(default, deserialize_with = "null_as_default")]
    pub cca2: String,
    /// ISO 3166-1 alpha-3 code
    #[serde(default, deserialize_with = "null_as_default")]
    pub cca3: String,
    /// ISO 3166-1 numeric code
    #[serde(default, deserialize_with = "null_as_default")]
    pub ccn3: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub native_name: String,
    /// International dial prefix, e.g. `+44`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calling_code: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub currency: Vec<Currency>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub languages: Vec<Language>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub flag: Flag,
    #[serde(default, deserialize_with = "null_as_default")]
    pub capital: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub region: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subregion: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tld: String,
    /// Fields this crate does not model, kept verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A currency used by a country
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Currency {
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub symbol: String,
}

/// A language spoken in a country
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Language {
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Flag representations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Flag {
    #[serde(default, deserialize_with = "null_as_default")]
    pub emoji: String,
    /// Relative path of the SVG asset, e.g. `flags/fr.svg`
    #[serde(default, deserialize_with = "null_as_default")]
    pub svg: String,
}

impl Flag {
    /// Relative SVG path used for a country code
    pub fn svg_path_for(cca2: &str) -> String {
        format!("flags/{}.svg", cca2.to_lowercase())
    }
}

impl Currency {
    pub fn new(code: impl Into<String>, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            symbol: symbol.into(),
        }
    }
}

impl Language {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

impl Country {
    /// Create a record with only its keys and name set
    pub fn new(cca2: impl Into<String>, cca3: impl Into<String>, name: impl Into<String>) -> Self {
        let cca2 = cca2.into();
        let name = name.into();
        Self {
            flag: Flag {
                emoji: String::new(),
                svg: Flag::svg_path_for(&cca2),
            },
            cca3: cca3.into(),
            ccn3: String::new(),
            native_name: name.clone(),
            name,
            calling_code: None,
            currency: Vec::new(),
            languages: Vec::new(),
            capital: String::new(),
            region: String::new(),
            subregion: String::new(),
            tld: String::new(),
            extra: BTreeMap::new(),
            cca2,
        }
    }

    pub fn with_calling_code(mut self, code: impl Into<String>) -> Self {
        self.calling_code = Some(code.into());
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency.push(currency);
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.languages.push(language);
        self
    }

    /// Calling code, with an absent field read as empty
    pub fn calling_code(&self) -> &str {
        self.calling_code.as_deref().unwrap_or("")
    }

    /// Whether this country uses the given currency code
    pub fn uses_currency(&self, code: &str) -> bool {
        self.currency.iter().any(|c| c.code == code)
    }

    /// Whether this country lists the given language code
    pub fn speaks(&self, code: &str) -> bool {
        self.languages.iter().any(|l| l.code == code)
    }
}

/// Ordering for display names and currency/language codes: case-insensitive,
/// with byte order breaking ties so the result is total and stable.
pub fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
