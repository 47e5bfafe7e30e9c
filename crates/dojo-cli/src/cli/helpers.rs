use dojo_core::domain::DojoError;
use dojo_core::table::{DojoTable, ScanOptions};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub(super) const DJSON_EXTENSION: &str = "djson";

/// Builds the table from either source form: a directory is scanned, a
/// `.djson` file is loaded as an index.
pub(super) fn load_table(target: &Path, scan_options: &ScanOptions) -> Result<DojoTable, DojoError> {
    if target.is_dir() {
        return DojoTable::from_dojodir(target, scan_options);
    }

    let is_djson = target
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case(DJSON_EXTENSION));
    if target.is_file() && is_djson {
        return DojoTable::from_djson_file(target);
    }

    Err(DojoError::input_validation(
        "INPUT.CLI_TARGET",
        format!(
            "target '{}' is neither a dojo directory nor a .djson file",
            target.display()
        ),
    ))
}

/// Flat `basename -> md5` JSON object shipped alongside published tables.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct ChecksumManifest {
    #[serde(flatten)]
    digests: BTreeMap<String, String>,
}

impl ChecksumManifest {
    pub(super) fn digests(&self) -> &BTreeMap<String, String> {
        &self.digests
    }
}

pub(super) fn load_checksum_manifest(path: &Path) -> Result<ChecksumManifest, DojoError> {
    let content = fs::read_to_string(path).map_err(|source| {
        DojoError::io_system(
            "IO.CHECKSUM_MANIFEST",
            format!(
                "failed to read checksum manifest '{}': {}",
                path.display(),
                source
            ),
        )
    })?;
    serde_json::from_str(&content).map_err(|source| {
        DojoError::input_validation(
            "INPUT.CHECKSUM_MANIFEST",
            format!(
                "failed to parse checksum manifest '{}': {}",
                path.display(),
                source
            ),
        )
    })
}
