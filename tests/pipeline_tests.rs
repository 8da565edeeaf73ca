//! Pipeline Tests
//!
//! Runs merge, generation, and validation against a data directory on disk.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use countrykit::merge::parse_external;
use countrykit::store::{
    BY_CALLING_CODE_FILE, CHECKSUMS_FILE, COUNTRIES_FILE, COUNTRIES_MIN_FILE, DIAL_CODES_FILE,
    GENERATED_FILES,
};
use countrykit::{
    merge_countries, validate, Catalog, Country, DataDir, DatasetError, OutputFormat, Outcome,
    WriteOptions,
};
use tempfile::TempDir;

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    fs::read_to_string(path).unwrap()
}

fn seeded_dir() -> (TempDir, DataDir) {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(COUNTRIES_FILE), fixture("countries.json")).unwrap();
    let data = DataDir::new(temp.path());
    (temp, data)
}

fn names(countries: &[Country]) -> Vec<&str> {
    countries.iter().map(|c| c.name.as_str()).collect()
}

// =============================================================================
// Generation
// =============================================================================

#[test]
fn test_generate_writes_every_artifact() {
    let (temp, data) = seeded_dir();

    let summary = data.generate(WriteOptions::default()).unwrap();
    assert_eq!(summary.countries, 4);
    // +1 and +20; Bouvet Island has no dial code
    assert_eq!(summary.dial_codes, 2);
    assert_eq!(summary.currencies, 4);
    assert_eq!(summary.languages, 4);

    for file in GENERATED_FILES {
        assert!(temp.path().join(file).exists(), "missing {}", file);
    }
    assert!(temp.path().join(CHECKSUMS_FILE).exists());
}

#[test]
fn test_generated_artifacts_pass_validation() {
    let (_temp, data) = seeded_dir();
    data.generate(WriteOptions::default()).unwrap();

    let dataset = data.load_dataset().unwrap();
    let report = validate(&dataset);

    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert_eq!(report.outcome(), Outcome::Pass);
}

#[test]
fn test_dial_codes_use_string_order() {
    let (temp, data) = seeded_dir();
    data.generate(WriteOptions::default()).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join(DIAL_CODES_FILE)).unwrap()).unwrap();
    assert_eq!(
        raw,
        serde_json::json!([
            { "code": "+1", "countries": ["US", "CA"] },
            { "code": "+20", "countries": ["EG"] }
        ])
    );
}

#[test]
fn test_empty_calling_code_grouped_only_in_index() {
    let (temp, data) = seeded_dir();
    data.generate(WriteOptions::default()).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join(BY_CALLING_CODE_FILE)).unwrap())
            .unwrap();
    let empty = raw[""].as_array().unwrap();
    assert_eq!(empty.len(), 1);
    assert_eq!(empty[0]["cca2"], "BV");
    assert_eq!(raw["+1"].as_array().unwrap().len(), 2);
}

#[test]
fn test_minified_copy_matches_canonical_list() {
    let (temp, data) = seeded_dir();
    let summary = data.generate(WriteOptions::default()).unwrap();

    let minified = fs::read_to_string(temp.path().join(COUNTRIES_MIN_FILE)).unwrap();
    assert!(!minified.contains('\n'));

    let parsed: Vec<Country> = serde_json::from_str(&minified).unwrap();
    assert_eq!(parsed, data.load_countries().unwrap());
    assert!(summary.minified_saving > 0.0);
}

#[test]
fn test_regeneration_is_byte_identical() {
    let (temp, data) = seeded_dir();
    data.generate(WriteOptions::default()).unwrap();
    let first: Vec<Vec<u8>> = GENERATED_FILES
        .iter()
        .map(|f| fs::read(temp.path().join(f)).unwrap())
        .collect();

    data.generate(WriteOptions::default()).unwrap();
    let second: Vec<Vec<u8>> = GENERATED_FILES
        .iter()
        .map(|f| fs::read(temp.path().join(f)).unwrap())
        .collect();

    assert_eq!(first, second);
}

#[test]
fn test_compact_format() {
    let (temp, data) = seeded_dir();
    let options = WriteOptions {
        format: OutputFormat::Compact,
        write_checksums: false,
    };
    let summary = data.generate(options).unwrap();

    assert!(!summary.files_written.iter().any(|f| f == CHECKSUMS_FILE));
    assert!(!temp.path().join(CHECKSUMS_FILE).exists());
    let dial = fs::read_to_string(temp.path().join(DIAL_CODES_FILE)).unwrap();
    assert!(!dial.contains('\n'));
}

#[test]
fn test_generate_without_checksums_drops_old_manifest() {
    let (temp, data) = seeded_dir();
    data.generate(WriteOptions::default()).unwrap();
    assert!(temp.path().join(CHECKSUMS_FILE).exists());

    let mut countries = data.load_countries().unwrap();
    countries.retain(|c| c.cca2 != "CA");
    data.save_countries(&countries, OutputFormat::Pretty).unwrap();

    let options = WriteOptions {
        write_checksums: false,
        ..WriteOptions::default()
    };
    data.generate(options).unwrap();

    assert!(!temp.path().join(CHECKSUMS_FILE).exists());
    let err = data.verify_checksums().unwrap_err();
    assert!(matches!(err, DatasetError::SourceUnavailable { .. }));
}

#[test]
fn test_malformed_source_leaves_artifacts_untouched() {
    let (temp, data) = seeded_dir();
    data.generate(WriteOptions::default()).unwrap();
    let before = fs::read(temp.path().join(DIAL_CODES_FILE)).unwrap();

    fs::write(temp.path().join(COUNTRIES_FILE), "[{\"cca2\": ").unwrap();
    let err = data.generate(WriteOptions::default()).unwrap_err();
    assert!(matches!(err, DatasetError::MalformedSource { .. }));

    assert_eq!(fs::read(temp.path().join(DIAL_CODES_FILE)).unwrap(), before);
}

#[test]
fn test_checksums_verify_after_generation() {
    let (temp, data) = seeded_dir();
    data.generate(WriteOptions::default()).unwrap();

    let statuses = data.verify_checksums().unwrap();
    assert_eq!(statuses.len(), GENERATED_FILES.len());
    assert!(statuses.iter().all(|s| s.is_valid()));

    fs::write(temp.path().join(DIAL_CODES_FILE), "[]").unwrap();
    let invalid: Vec<_> = data
        .verify_checksums()
        .unwrap()
        .into_iter()
        .filter(|s| !s.is_valid())
        .collect();
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0].file, DIAL_CODES_FILE);
}

// =============================================================================
// Artifact invariants
// =============================================================================

fn assert_membership_invariants(data: &DataDir) {
    let dataset = data.load_dataset().unwrap();

    for dial in &dataset.dial_codes {
        let mut seen = HashSet::new();
        for cca2 in &dial.countries {
            assert!(seen.insert(cca2), "{} listed twice under {}", cca2, dial.code);
            assert_eq!(dataset.by_cca2[cca2].calling_code(), dial.code);
        }
    }

    for currency in &dataset.currencies {
        let mut seen = HashSet::new();
        for cca2 in &currency.countries {
            assert!(seen.insert(cca2), "{} listed twice under {}", cca2, currency.code);
            assert!(dataset.by_cca2[cca2].uses_currency(&currency.code));
        }
    }

    for language in &dataset.languages {
        let mut seen = HashSet::new();
        for cca2 in &language.countries {
            assert!(seen.insert(cca2), "{} listed twice under {}", cca2, language.code);
            assert!(dataset.by_cca2[cca2].speaks(&language.code));
        }
    }

    // every country appears in the group of each of its codes
    for country in &dataset.countries {
        for currency in &country.currency {
            let group = dataset.currencies.iter().find(|g| g.code == currency.code).unwrap();
            assert!(group.countries.contains(&country.cca2));
        }
        if !country.calling_code().is_empty() {
            let dial = dataset.dial_codes.iter().find(|d| d.code == country.calling_code()).unwrap();
            assert!(dial.countries.contains(&country.cca2));
        }
    }

    for country in &dataset.countries {
        assert_eq!(&dataset.by_cca2[&country.cca2], country);
        assert_eq!(&dataset.by_cca3[&country.cca3], country);
    }
}

#[test]
fn test_group_membership_on_fixture() {
    let (_temp, data) = seeded_dir();
    data.generate(WriteOptions::default()).unwrap();
    assert_membership_invariants(&data);
}

#[test]
fn test_group_membership_after_merge() {
    let (_temp, data) = seeded_dir();
    let (incoming, _) = parse_external(&fixture("external.json")).unwrap();
    let (merged, _) = merge_countries(data.load_countries().unwrap(), incoming);
    data.save_countries(&merged, OutputFormat::Pretty).unwrap();

    data.generate(WriteOptions::default()).unwrap();
    assert_membership_invariants(&data);
}

// =============================================================================
// Validation of hand-edited data
// =============================================================================

#[test]
fn test_validation_catches_duplicate_after_edit() {
    let (_temp, data) = seeded_dir();
    let mut countries = data.load_countries().unwrap();
    let mut copy = countries[0].clone();
    copy.name = "United States (copy)".to_string();
    countries.push(copy);
    data.save_countries(&countries, OutputFormat::Pretty).unwrap();

    data.generate(WriteOptions::default()).unwrap();
    let report = validate(&data.load_dataset().unwrap());

    assert_eq!(report.outcome(), Outcome::Fail);
    assert!(report.errors.iter().any(|f| f.code == "DUPLICATE_CCA2"));
    assert!(report.errors.iter().any(|f| f.code == "DUPLICATE_CCA3"));
}

// =============================================================================
// Merge
// =============================================================================

#[test]
fn test_merge_then_generate() {
    let (_temp, data) = seeded_dir();
    let existing = data.load_countries().unwrap();

    let (incoming, skipped) = parse_external(&fixture("external.json")).unwrap();
    assert_eq!(incoming.len(), 3);
    assert_eq!(skipped, 1);

    let (merged, summary) = merge_countries(existing, incoming);
    assert_eq!(summary.added, 2);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.total, 6);
    assert_eq!(
        names(&merged),
        vec![
            "Bouvet Island",
            "Canada",
            "Egypt",
            "Germany",
            "Heard Island and McDonald Islands",
            "United States",
        ]
    );

    data.save_countries(&merged, OutputFormat::Pretty).unwrap();
    data.generate(WriteOptions::default()).unwrap();

    let report = validate(&data.load_dataset().unwrap());
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    // External language codes are three letters
    assert_eq!(report.outcome(), Outcome::PassWithWarnings);
    assert!(report.warnings.iter().all(|f| f.code == "LANGUAGE_CODE_LENGTH"));
}

#[test]
fn test_merged_records_are_converted() {
    let (incoming, _) = parse_external(&fixture("external.json")).unwrap();
    let catalog = Catalog::from_countries(incoming);

    let germany = catalog.by_cca2("DE").unwrap();
    assert_eq!(germany.calling_code(), "+49");
    assert_eq!(germany.native_name, "Deutschland");
    assert_eq!(germany.capital, "Berlin");
    assert_eq!(germany.flag.svg, "flags/de.svg");

    let heard = catalog.by_cca2("HM").unwrap();
    assert_eq!(heard.calling_code, Some(String::new()));
    assert_eq!(heard.currency[0].code, "N/A");
    assert_eq!(heard.tld, ".hm");
}

#[test]
fn test_merge_is_idempotent_on_disk() {
    let (temp, data) = seeded_dir();
    let body = fixture("external.json");

    let (incoming, _) = parse_external(&body).unwrap();
    let (merged, _) = merge_countries(data.load_countries().unwrap(), incoming);
    data.save_countries(&merged, OutputFormat::Pretty).unwrap();
    let first = fs::read(temp.path().join(COUNTRIES_FILE)).unwrap();

    let (incoming, _) = parse_external(&body).unwrap();
    let (merged, summary) = merge_countries(data.load_countries().unwrap(), incoming);
    data.save_countries(&merged, OutputFormat::Pretty).unwrap();
    let second = fs::read(temp.path().join(COUNTRIES_FILE)).unwrap();

    assert_eq!(summary.added, 0);
    assert_eq!(summary.updated, 0);
    assert_eq!(first, second);
}

#[test]
fn test_merge_fills_gaps_without_overwriting() {
    let (_temp, data) = seeded_dir();
    let mut existing = data.load_countries().unwrap();
    let canada = existing.iter_mut().find(|c| c.cca2 == "CA").unwrap();
    canada.calling_code = Some(String::new());
    canada.currency.clear();
    canada.capital = "Toronto".to_string();

    let (incoming, _) = parse_external(&fixture("external.json")).unwrap();
    let (merged, summary) = merge_countries(existing, incoming);
    assert_eq!(summary.updated, 1);

    let catalog = Catalog::from_countries(merged);
    let canada = catalog.by_cca2("CA").unwrap();
    assert_eq!(canada.calling_code(), "+1");
    assert_eq!(canada.currency[0].name, "Canadian dollar");
    // Only unset fields are filled
    assert_eq!(canada.capital, "Toronto");
    assert_eq!(canada.languages.len(), 2);
}

// =============================================================================
// Catalog
// =============================================================================

#[test]
fn test_catalog_over_generated_data() {
    let (temp, data) = seeded_dir();
    data.generate(WriteOptions::default()).unwrap();

    let catalog = Catalog::load(temp.path()).unwrap();
    assert_eq!(catalog.countries().len(), 4);
    assert_eq!(catalog.by_cca3("can").unwrap().name, "Canada");
    assert_eq!(catalog.by_calling_code("1").len(), 2);
    assert_eq!(names(&catalog.by_calling_code("+20").to_vec()), vec!["Egypt"]);
    assert_eq!(catalog.by_language("fr").len(), 1);
    assert_eq!(catalog.by_region("americas").len(), 2);
    assert_eq!(catalog.search("bouvet")[0].cca2, "BV");
}
