//! CountryKit
//!
//! A static reference dataset of world countries and the offline pipeline
//! that keeps it consistent.
//!
//! ## Features
//!
//! - **Derivation**: dial-code, currency and language groups plus direct
//!   lookup indexes, all computed from one canonical list
//! - **Atomic Artifacts**: every generated file is replaced via temp file and
//!   rename, with a SHA256 manifest for drift detection
//! - **Integrity Validation**: duplicate keys, malformed codes and dangling
//!   references, classified as errors or warnings
//! - **Non-destructive Merge**: fill gaps from an external dataset without
//!   overwriting curated fields
//!
//! ## Pipeline
//!
//! ```text
//! countries.json ──► derive ──► dial-codes.json, currencies.json, languages.json,
//!       ▲                       countries_by_{cca2,cca3,calling_code}.json,
//!       │                       countries.min.json, checksums.sha256
//!     merge                              │
//!  (remote dataset)                      ▼
//!                                     validate ──► pass / warnings / fail
//! ```

pub mod catalog;
pub mod checksum;
pub mod config;
pub mod country;
pub mod derive;
pub mod error;
pub mod flags;
pub mod merge;
pub mod store;
pub mod validate;

pub use catalog::Catalog;
pub use checksum::Checksum;
pub use config::{KitConfig, OutputFormat};
pub use country::{Country, Currency, Flag, Language};
pub use derive::{CurrencyGroup, DerivedArtifacts, DialCode, LanguageGroup};
pub use error::{DatasetError, Result};
pub use flags::{FlagFetcher, FlagSummary};
pub use merge::{merge_countries, MergeSummary};
pub use store::{DataDir, Dataset, GenerationSummary, WriteOptions};
pub use validate::{validate, Outcome, ValidationReport};
