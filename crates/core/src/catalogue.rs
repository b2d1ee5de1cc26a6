//! Test-type catalogue files.
//!
//! A catalogue is a YAML document listing the lab and imaging test types a facility offers:
//!
//! ```yaml
//! lab_tests:
//!   - code: CBC
//!     name: Complete blood count
//!     criteria:
//!       - { name: Hemoglobin, sequence: 1, lower_limit: 12.0, upper_limit: 16.0, units: g/dL }
//! imaging_tests:
//!   - { code: XR-CH, name: Chest X-ray }
//! ```
//!
//! Parsing is strict: unknown keys are rejected and the error names the offending path.

use crate::context::CoreContext;
use crate::error::{ClinicalError, ClinicalResult};
use crate::imaging::{ImagingService, ImagingTestType};
use crate::lab::{LabService, LabTestType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Catalogue {
    pub lab_tests: Vec<LabTestType>,
    pub imaging_tests: Vec<ImagingTestType>,
}

/// Counts of test types written by [`Catalogue::import`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub lab_tests: usize,
    pub imaging_tests: usize,
    pub skipped: usize,
}

impl Catalogue {
    /// Parse a catalogue from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `ClinicalError::Catalogue` if the YAML does not match the catalogue schema, any
    /// unknown key is present, or a code is listed twice.
    pub fn parse(yaml_text: &str) -> ClinicalResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        let catalogue = match serde_path_to_error::deserialize::<_, Catalogue>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(ClinicalError::Catalogue(format!(
                    "catalogue schema mismatch at {path}: {source}"
                )));
            }
        };

        catalogue.check_unique_codes()?;
        Ok(catalogue)
    }

    pub fn load(path: &Path) -> ClinicalResult<Self> {
        let text = std::fs::read_to_string(path).map_err(ClinicalError::FileRead)?;
        Self::parse(&text)
    }

    fn check_unique_codes(&self) -> ClinicalResult<()> {
        let mut lab = HashSet::new();
        if let Some(dup) = self.lab_tests.iter().find(|t| !lab.insert(t.code.as_str())) {
            return Err(ClinicalError::Catalogue(format!(
                "lab test code '{}' is listed more than once",
                dup.code
            )));
        }
        let mut imaging = HashSet::new();
        if let Some(dup) = self
            .imaging_tests
            .iter()
            .find(|t| !imaging.insert(t.code.as_str()))
        {
            return Err(ClinicalError::Catalogue(format!(
                "imaging test code '{}' is listed more than once",
                dup.code
            )));
        }
        Ok(())
    }

    /// Write every test type whose code is not yet known to the store.
    pub fn import(&self, ctx: &CoreContext) -> ClinicalResult<ImportSummary> {
        let lab = LabService::new(ctx.clone());
        let imaging = ImagingService::new(ctx.clone());
        let mut summary = ImportSummary::default();

        let known: HashSet<String> = lab
            .test_types()?
            .into_iter()
            .map(|t| t.record.code.into_inner())
            .collect();
        for test_type in &self.lab_tests {
            if known.contains(test_type.code.as_str()) {
                summary.skipped += 1;
                continue;
            }
            lab.add_test_type(test_type.clone())?;
            summary.lab_tests += 1;
        }

        let known: HashSet<String> = imaging
            .test_types()?
            .into_iter()
            .map(|t| t.record.code.into_inner())
            .collect();
        for test_type in &self.imaging_tests {
            if known.contains(test_type.code.as_str()) {
                summary.skipped += 1;
                continue;
            }
            imaging.add_test_type(test_type.clone())?;
            summary.imaging_tests += 1;
        }

        tracing::info!(
            "catalogue import: {} lab, {} imaging, {} already known",
            summary.lab_tests,
            summary.imaging_tests,
            summary.skipped
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_ctx;
    use std::io::Write;

    const CATALOGUE: &str = r#"
lab_tests:
  - code: CBC
    name: Complete blood count
    criteria:
      - name: Hemoglobin
        sequence: 1
        lower_limit: 12.0
        upper_limit: 16.0
        units: g/dL
      - name: WBC
        sequence: 2
imaging_tests:
  - code: XR-CH
    name: Chest X-ray
"#;

    #[test]
    fn test_parse_catalogue() {
        let catalogue = Catalogue::parse(CATALOGUE).expect("parse should succeed");
        assert_eq!(catalogue.lab_tests.len(), 1);
        assert_eq!(catalogue.lab_tests[0].criteria.len(), 2);
        assert_eq!(catalogue.lab_tests[0].criteria[1].lower_limit, None);
        assert_eq!(catalogue.imaging_tests[0].code.as_str(), "XR-CH");
    }

    #[test]
    fn test_unknown_key_reports_path() {
        let yaml = "lab_tests:\n  - code: CBC\n    name: Blood\n    colour: red\n";
        let err = Catalogue::parse(yaml).unwrap_err();
        match err {
            ClinicalError::Catalogue(msg) => {
                assert!(msg.contains("lab_tests[0]"), "{msg}");
                assert!(msg.contains("colour"), "{msg}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_code_is_rejected() {
        let yaml = "imaging_tests:\n  - code: '  '\n    name: Chest X-ray\n";
        assert!(matches!(
            Catalogue::parse(yaml),
            Err(ClinicalError::Catalogue(_))
        ));
    }

    #[test]
    fn test_duplicate_codes_are_rejected() {
        let yaml = "imaging_tests:\n  - { code: A, name: One }\n  - { code: A, name: Two }\n";
        assert!(matches!(
            Catalogue::parse(yaml),
            Err(ClinicalError::Catalogue(msg)) if msg.contains("'A'")
        ));
    }

    #[test]
    fn test_load_and_import_is_idempotent() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        file.write_all(CATALOGUE.as_bytes()).expect("write catalogue");

        let catalogue = Catalogue::load(file.path()).expect("load should succeed");
        let ctx = test_ctx();

        let first = catalogue.import(&ctx).unwrap();
        assert_eq!((first.lab_tests, first.imaging_tests, first.skipped), (1, 1, 0));

        let second = catalogue.import(&ctx).unwrap();
        assert_eq!((second.lab_tests, second.imaging_tests, second.skipped), (0, 0, 2));
        assert_eq!(LabService::new(ctx).test_types().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Catalogue::load(&dir.path().join("absent.yaml")),
            Err(ClinicalError::FileRead(_))
        ));
    }
}
