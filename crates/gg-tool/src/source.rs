use std::fs;
use std::path::Path;

use gg_api::{load_bundle_dir, StoryBundle};
use gg_core::GalgameError;

use crate::{GgToolError, TestCase, TESTCASE_SCHEMA_V1};

/// Scans `example_dir` as a story bundle, swapping in the case's entry script
/// when it names one.
pub fn load_case_bundle(example_dir: &Path, case: &TestCase) -> Result<StoryBundle, GgToolError> {
    let mut bundle =
        load_bundle_dir(&example_dir.to_string_lossy()).map_err(GgToolError::Bundle)?;
    if let Some(entry_script) = &case.entry_script {
        if !bundle.files.contains_key(entry_script) {
            return Err(GgToolError::Bundle(GalgameError::new(
                "BUNDLE_BASE_SCRIPT",
                format!("Entry script \"{}\" is not part of the bundle.", entry_script),
            )));
        }
        bundle.manifest.base_script = entry_script.clone();
    }
    Ok(bundle)
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, GgToolError> {
    let raw = fs::read_to_string(case_path).map_err(|source| GgToolError::ReadFile {
        path: case_path.to_path_buf(),
        source,
    })?;
    let parsed: TestCase = serde_json::from_str(&raw).map_err(|source| GgToolError::ParseCase {
        path: case_path.to_path_buf(),
        source,
    })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(GgToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}
