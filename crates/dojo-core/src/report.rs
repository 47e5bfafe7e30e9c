//! Dojo report metadata (`.djrepo` files).
//!
//! A pseudopotential `X.psp8` carries a sibling `X.djrepo` JSON document with
//! its identity fields and the payloads of the validation trials that have
//! been run for it. The trial payloads themselves are opaque to this crate;
//! the scientific content is only ever rendered into notebooks.

use crate::domain::DojoError;
use crate::periodic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Validation trials a complete dojo report is expected to carry.
pub const DOJO_TRIALS: [&str; 5] = ["deltafactor", "gbrv_bcc", "gbrv_fcc", "phgamma", "ghosts"];

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DojoReport {
    pub symbol: String,
    #[serde(rename = "Z")]
    pub z: u32,
    #[serde(rename = "Z_val")]
    pub z_val: f64,
    #[serde(default)]
    pub l_max: Option<u32>,
    pub md5: String,
    pub xc_name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub hints: Option<Hints>,
    #[serde(flatten)]
    pub trials: BTreeMap<String, serde_json::Value>,
}

/// Suggested plane-wave cutoffs in Hartree, one per accuracy level.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Hints {
    pub low: EcutHint,
    pub normal: EcutHint,
    pub high: EcutHint,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct EcutHint {
    pub ecut: f64,
}

impl DojoReport {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MetadataError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| MetadataError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content).map_err(|error| match error {
            MetadataError::ParseJson { source } => MetadataError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_json_str(source: &str) -> Result<Self, MetadataError> {
        let report: Self = serde_json::from_str(source)
            .map_err(|source| MetadataError::ParseJson { source })?;
        report.validate()?;
        Ok(report)
    }

    /// Well-formedness check for the identity fields. A missing `hints`
    /// section is not a schema violation; tables under construction surface
    /// it as a validation finding instead.
    pub fn validate(&self) -> Result<(), MetadataError> {
        let expected = periodic::z_for_symbol(&self.symbol).ok_or_else(|| {
            MetadataError::UnknownSymbol {
                symbol: self.symbol.clone(),
            }
        })?;
        if expected != self.z {
            return Err(MetadataError::SymbolMismatch {
                symbol: self.symbol.clone(),
                z: self.z,
                expected,
            });
        }

        if self.md5.len() != 32
            || !self
                .md5
                .bytes()
                .all(|byte| byte.is_ascii_digit() || (b'a'..=b'f').contains(&byte))
        {
            return Err(MetadataError::MalformedDigest {
                digest: self.md5.clone(),
            });
        }

        if let Some(hints) = &self.hints {
            let (low, normal, high) = (hints.low.ecut, hints.normal.ecut, hints.high.ecut);
            let all_finite_positive = [low, normal, high]
                .iter()
                .all(|ecut| ecut.is_finite() && *ecut > 0.0);
            if !all_finite_positive || low > normal || normal > high {
                return Err(MetadataError::InvalidHints { low, normal, high });
            }
        }

        Ok(())
    }

    pub fn has_hints(&self) -> bool {
        self.hints.is_some()
    }

    pub fn has_trial(&self, trial: &str) -> bool {
        self.trials.contains_key(trial)
    }

    pub fn missing_trials(&self) -> Vec<&'static str> {
        DOJO_TRIALS
            .into_iter()
            .filter(|trial| !self.has_trial(trial))
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("failed to read dojo report '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse dojo report '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to parse dojo report JSON: {source}")]
    ParseJson { source: serde_json::Error },
    #[error("unknown element symbol '{symbol}'")]
    UnknownSymbol { symbol: String },
    #[error("atomic number {z} does not match symbol '{symbol}' (expected {expected})")]
    SymbolMismatch {
        symbol: String,
        z: u32,
        expected: u32,
    },
    #[error("md5 digest '{digest}' is not 32 lowercase hex characters")]
    MalformedDigest { digest: String },
    #[error(
        "ecut hints must be finite, positive and ordered low <= normal <= high (low={low}, normal={normal}, high={high})"
    )]
    InvalidHints { low: f64, normal: f64, high: f64 },
}

impl From<MetadataError> for DojoError {
    fn from(error: MetadataError) -> Self {
        let message = error.to_string();
        match error {
            MetadataError::Read { .. } => DojoError::io_system("IO.DJREPO_READ", message),
            MetadataError::Parse { .. } | MetadataError::ParseJson { .. } => {
                DojoError::metadata("META.DJREPO_PARSE", message)
            }
            MetadataError::UnknownSymbol { .. }
            | MetadataError::SymbolMismatch { .. }
            | MetadataError::MalformedDigest { .. }
            | MetadataError::InvalidHints { .. } => {
                DojoError::metadata("META.DJREPO_SCHEMA", message)
            }
        }
    }
}
