//! Artifact store
//!
//! Owns the fixed on-disk layout of the dataset and every read and write of
//! it. Each file is replaced atomically (write to a temp file, then rename), so
//! readers never observe a partially written artifact.
//!
//! ```text
//! data/
//! ├── countries.json                   canonical list
//! ├── countries.min.json
//! ├── dial-codes.json
//! ├── currencies.json
//! ├── languages.json
//! ├── countries_by_cca2.json
//! ├── countries_by_cca3.json
//! ├── countries_by_calling_code.json
//! └── checksums.sha256
//! ```

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::checksum::{parse_manifest, render_manifest, Checksum, ChecksumLine};
use crate::config::OutputFormat;
use crate::country::Country;
use crate::derive::{
    CallingCodeIndex, CountryIndex, CurrencyGroup, DerivedArtifacts, DialCode, LanguageGroup,
};
use crate::error::{DatasetError, Result};

pub const COUNTRIES_FILE: &str = "countries.json";
pub const COUNTRIES_MIN_FILE: &str = "countries.min.json";
pub const DIAL_CODES_FILE: &str = "dial-codes.json";
pub const CURRENCIES_FILE: &str = "currencies.json";
pub const LANGUAGES_FILE: &str = "languages.json";
pub const BY_CCA2_FILE: &str = "countries_by_cca2.json";
pub const BY_CCA3_FILE: &str = "countries_by_cca3.json";
pub const BY_CALLING_CODE_FILE: &str = "countries_by_calling_code.json";
pub const CHECKSUMS_FILE: &str = "checksums.sha256";

/// Generated files, in the order they are written and listed in the manifest
pub const GENERATED_FILES: &[&str] = &[
    DIAL_CODES_FILE,
    CURRENCIES_FILE,
    LANGUAGES_FILE,
    COUNTRIES_MIN_FILE,
    BY_CCA2_FILE,
    BY_CCA3_FILE,
    BY_CALLING_CODE_FILE,
];

/// Options for a generation run
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    pub format: OutputFormat,
    pub write_checksums: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Pretty,
            write_checksums: true,
        }
    }
}

/// Counts reported after a generation run
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSummary {
    pub countries: usize,
    pub dial_codes: usize,
    pub currencies: usize,
    pub languages: usize,
    /// How much smaller `countries.min.json` is than `countries.json`, in percent
    pub minified_saving: f64,
    pub files_written: Vec<String>,
}

/// Canonical list plus every derived artifact, as read back from disk
#[derive(Debug, Clone)]
pub struct Dataset {
    pub countries: Vec<Country>,
    pub dial_codes: Vec<DialCode>,
    pub currencies: Vec<CurrencyGroup>,
    pub languages: Vec<LanguageGroup>,
    pub by_cca2: CountryIndex,
    pub by_cca3: CountryIndex,
    pub by_calling_code: CallingCodeIndex,
}

impl Dataset {
    /// Build a dataset in memory without touching disk
    pub fn from_countries(countries: Vec<Country>) -> Self {
        let derived = DerivedArtifacts::build(&countries);
        Self {
            countries,
            dial_codes: derived.dial_codes,
            currencies: derived.currencies,
            languages: derived.languages,
            by_cca2: derived.by_cca2,
            by_cca3: derived.by_cca3,
            by_calling_code: derived.by_calling_code,
        }
    }
}

/// Result of checking one manifest entry
#[derive(Debug, Clone)]
pub struct ChecksumStatus {
    pub file: String,
    pub expected: Checksum,
    /// `None` when the file is missing
    pub actual: Option<Checksum>,
}

impl ChecksumStatus {
    pub fn is_valid(&self) -> bool {
        self.actual.as_ref() == Some(&self.expected)
    }

    /// Convert a failed check into an error
    pub fn into_error(self) -> DatasetError {
        DatasetError::ChecksumMismatch {
            file: self.file,
            expected: self.expected.to_string(),
            actual: self
                .actual
                .map(|c| c.to_string())
                .unwrap_or_else(|| "<missing>".to_string()),
        }
    }
}

/// A data directory with the fixed artifact layout
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the root path of the data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a file inside the data directory
    pub fn path(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    /// Read the canonical list
    pub fn load_countries(&self) -> Result<Vec<Country>> {
        read_json(&self.path(COUNTRIES_FILE))
    }

    /// Replace the canonical list
    pub fn save_countries(&self, countries: &[Country], format: OutputFormat) -> Result<()> {
        write_json_atomic(&self.path(COUNTRIES_FILE), &countries, format)?;
        info!(count = countries.len(), "saved canonical list");
        Ok(())
    }

    /// Read the canonical list and every derived artifact
    pub fn load_dataset(&self) -> Result<Dataset> {
        Ok(Dataset {
            countries: self.load_countries()?,
            dial_codes: read_json(&self.path(DIAL_CODES_FILE))?,
            currencies: read_json(&self.path(CURRENCIES_FILE))?,
            languages: read_json(&self.path(LANGUAGES_FILE))?,
            by_cca2: read_json(&self.path(BY_CCA2_FILE))?,
            by_cca3: read_json(&self.path(BY_CCA3_FILE))?,
            by_calling_code: read_json(&self.path(BY_CALLING_CODE_FILE))?,
        })
    }

    /// Regenerate every derived artifact from the canonical list.
    ///
    /// The canonical list is read and parsed before anything is written, so a
    /// missing or malformed source leaves existing artifacts untouched.
    pub fn generate(&self, options: WriteOptions) -> Result<GenerationSummary> {
        let countries = self.load_countries()?;
        info!(count = countries.len(), root = %self.root.display(), "loaded canonical list");

        let artifacts = DerivedArtifacts::build(&countries);
        self.write_artifacts(&countries, &artifacts, options)
    }

    /// Write derived artifacts, the minified canonical copy, and the checksum manifest
    pub fn write_artifacts(
        &self,
        countries: &[Country],
        artifacts: &DerivedArtifacts,
        options: WriteOptions,
    ) -> Result<GenerationSummary> {
        fs::create_dir_all(&self.root).map_err(|source| DatasetError::ArtifactWrite {
            path: self.root.clone(),
            source,
        })?;

        let format = options.format;
        let mut manifest = Vec::new();
        let mut record = |file: &str, bytes: Vec<u8>| {
            manifest.push(ChecksumLine {
                checksum: Checksum::from_bytes(&bytes),
                file: file.to_string(),
            });
            bytes.len()
        };

        record(DIAL_CODES_FILE, write_json_atomic(&self.path(DIAL_CODES_FILE), &artifacts.dial_codes, format)?);
        record(CURRENCIES_FILE, write_json_atomic(&self.path(CURRENCIES_FILE), &artifacts.currencies, format)?);
        record(LANGUAGES_FILE, write_json_atomic(&self.path(LANGUAGES_FILE), &artifacts.languages, format)?);
        let minified_len = record(
            COUNTRIES_MIN_FILE,
            write_json_atomic(&self.path(COUNTRIES_MIN_FILE), &countries, OutputFormat::Compact)?,
        );
        record(BY_CCA2_FILE, write_json_atomic(&self.path(BY_CCA2_FILE), &artifacts.by_cca2, format)?);
        record(BY_CCA3_FILE, write_json_atomic(&self.path(BY_CCA3_FILE), &artifacts.by_cca3, format)?);
        record(
            BY_CALLING_CODE_FILE,
            write_json_atomic(&self.path(BY_CALLING_CODE_FILE), &artifacts.by_calling_code, format)?,
        );

        let mut files_written: Vec<String> = manifest.iter().map(|l| l.file.clone()).collect();
        if options.write_checksums {
            write_atomic(&self.path(CHECKSUMS_FILE), render_manifest(&manifest).as_bytes())?;
            files_written.push(CHECKSUMS_FILE.to_string());
        } else {
            // A manifest from an earlier run no longer describes these artifacts
            let manifest_path = self.path(CHECKSUMS_FILE);
            match fs::remove_file(&manifest_path) {
                Ok(()) => debug!("removed stale checksum manifest"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(DatasetError::ArtifactWrite {
                        path: manifest_path,
                        source,
                    })
                }
            }
        }

        let source_len = fs::metadata(self.path(COUNTRIES_FILE))
            .map(|m| m.len() as f64)
            .unwrap_or(0.0);
        let minified_saving = if source_len > 0.0 {
            (1.0 - minified_len as f64 / source_len) * 100.0
        } else {
            0.0
        };

        info!(files = files_written.len(), "wrote derived artifacts");

        Ok(GenerationSummary {
            countries: countries.len(),
            dial_codes: artifacts.dial_codes.len(),
            currencies: artifacts.currencies.len(),
            languages: artifacts.languages.len(),
            minified_saving,
            files_written,
        })
    }

    /// Recompute digests for every file listed in `checksums.sha256`
    pub fn verify_checksums(&self) -> Result<Vec<ChecksumStatus>> {
        let manifest_path = self.path(CHECKSUMS_FILE);
        let content = fs::read_to_string(&manifest_path)
            .map_err(|e| DatasetError::unavailable(&manifest_path, e))?;

        let statuses = parse_manifest(&content)
            .into_iter()
            .map(|line| {
                let actual = fs::read(self.path(&line.file))
                    .ok()
                    .map(|bytes| Checksum::from_bytes(&bytes));
                ChecksumStatus {
                    file: line.file,
                    expected: line.checksum,
                    actual,
                }
            })
            .collect();
        Ok(statuses)
    }
}

/// Read and parse a JSON file. A missing or unreadable file is `SourceUnavailable`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| DatasetError::unavailable(path, e))?;
    serde_json::from_slice(&bytes).map_err(|source| DatasetError::MalformedSource {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize a value and replace `path` atomically. Returns the bytes written.
pub fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    format: OutputFormat,
) -> Result<Vec<u8>> {
    let bytes = match format {
        OutputFormat::Pretty => serde_json::to_vec_pretty(value)?,
        OutputFormat::Compact => serde_json::to_vec(value)?,
    };
    write_atomic(path, &bytes)?;
    Ok(bytes)
}

/// Write bytes to a temp file beside `path`, sync, then rename over `path`
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let wrap = |source: std::io::Error| DatasetError::ArtifactWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(wrap)?;
        }
    }

    let tmp_path = tmp_write_path(path);
    let write_result = (|| -> std::io::Result<()> {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()
    })();

    if let Err(error) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(wrap(error));
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        wrap(e)
    })?;

    debug!(path = %path.display(), bytes = bytes.len(), "artifact written");
    Ok(())
}

fn tmp_write_path(path: &Path) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(format!(".tmp.{}.{}", std::process::id(), unique));
    PathBuf::from(tmp)
}
