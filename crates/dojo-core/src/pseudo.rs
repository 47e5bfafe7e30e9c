//! One pseudopotential on disk.
//!
//! The pseudo file itself is an opaque byte payload; identity comes from the
//! sibling `.djrepo` report when one exists, or from the filename stem when
//! it does not.

use crate::domain::{DojoError, DojoResult};
use crate::periodic;
use crate::report::DojoReport;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DJREPO_EXTENSION: &str = "djrepo";

#[derive(Debug, Clone)]
pub struct Pseudo {
    path: PathBuf,
    basename: String,
    symbol: String,
    z: u32,
    z_val: Option<f64>,
    md5: String,
    report: Option<DojoReport>,
}

impl Pseudo {
    /// Reads the pseudo bytes, computes their md5 digest and adopts the
    /// identity recorded in the sibling `.djrepo` report. A missing report is
    /// tolerated (the table validation pass reports it); a malformed one is a
    /// hard error.
    pub fn from_file(path: impl AsRef<Path>) -> DojoResult<Self> {
        let path = path.as_ref();
        let basename = file_basename(path)?;

        let bytes = fs::read(path).map_err(|source| {
            DojoError::io_system(
                "IO.PSEUDO_READ",
                format!("failed to read pseudo file '{}': {}", path.display(), source),
            )
        })?;
        let md5 = format!("{:x}", md5::compute(&bytes));

        let djrepo_path = sibling_with_extension(path, DJREPO_EXTENSION);
        if djrepo_path.is_file() {
            let report = DojoReport::from_file(&djrepo_path).map_err(DojoError::from)?;
            return Ok(Self {
                path: path.to_path_buf(),
                basename,
                symbol: report.symbol.clone(),
                z: report.z,
                z_val: Some(report.z_val),
                md5,
                report: Some(report),
            });
        }

        warn!(
            pseudo = %path.display(),
            "no sibling .djrepo report found; deriving identity from the filename"
        );
        let (symbol, z) = element_from_basename(&basename).ok_or_else(|| {
            DojoError::input_validation(
                "INPUT.PSEUDO_SYMBOL",
                format!(
                    "cannot derive an element symbol from pseudo basename '{}'",
                    basename
                ),
            )
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            basename,
            symbol,
            z,
            z_val: None,
            md5,
            report: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn basename(&self) -> &str {
        &self.basename
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub const fn z(&self) -> u32 {
        self.z
    }

    pub const fn z_val(&self) -> Option<f64> {
        self.z_val
    }

    /// Hex md5 digest of the pseudo file bytes, computed at load time.
    pub fn md5(&self) -> &str {
        &self.md5
    }

    pub const fn report(&self) -> Option<&DojoReport> {
        self.report.as_ref()
    }

    pub const fn has_report(&self) -> bool {
        self.report.is_some()
    }

    pub fn has_hints(&self) -> bool {
        self.report
            .as_ref()
            .is_some_and(DojoReport::has_hints)
    }
}

/// Swaps the final extension, `X.psp8` -> `X.<extension>`. Shared by the
/// djrepo lookup and the notebook writer (`.in`, `.out`, `.ipynb` siblings).
pub fn sibling_with_extension(path: &Path, extension: &str) -> PathBuf {
    path.with_extension(extension)
}

fn file_basename(path: &Path) -> DojoResult<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            DojoError::input_validation(
                "INPUT.PSEUDO_PATH",
                format!("pseudo path '{}' has no usable file name", path.display()),
            )
        })
}

/// Leading element token of a basename such as `Si.psp8`, `Si-d.psp8` or
/// `Lu_f.psp8`, resolved against the periodic table together with its Z.
fn element_from_basename(basename: &str) -> Option<(String, u32)> {
    let stem = basename.split('.').next()?;
    let token = stem
        .split(['-', '_'])
        .next()
        .filter(|token| !token.is_empty())?;
    periodic::z_for_symbol(token).map(|z| (token.to_owned(), z))
}

#[cfg(test)]
mod tests {
    use super::{Pseudo, sibling_with_extension};
    use crate::domain::DojoErrorCategory;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_pseudo(dir: &Path, basename: &str, payload: &[u8]) -> std::path::PathBuf {
        let path = dir.join(basename);
        fs::write(&path, payload).expect("pseudo file should be written");
        path
    }

    fn write_djrepo(pseudo_path: &Path, symbol: &str, z: u32, md5: &str) {
        let djrepo = sibling_with_extension(pseudo_path, "djrepo");
        let content = format!(
            r#"{{
              "symbol": "{symbol}",
              "Z": {z},
              "Z_val": 4.0,
              "md5": "{md5}",
              "xc_name": "PBE",
              "hints": {{
                "low": {{"ecut": 12.0}},
                "normal": {{"ecut": 16.0}},
                "high": {{"ecut": 22.0}}
              }}
            }}"#
        );
        fs::write(&djrepo, content).expect("djrepo file should be written");
    }

    #[test]
    fn pseudo_with_report_adopts_report_identity() {
        let temp = TempDir::new().expect("tempdir should be created");
        let payload = b"psp8 payload bytes";
        let path = write_pseudo(temp.path(), "Si.psp8", payload);
        let digest = format!("{:x}", md5::compute(payload));
        write_djrepo(&path, "Si", 14, &digest);

        let pseudo = Pseudo::from_file(&path).expect("pseudo should load");
        assert_eq!(pseudo.basename(), "Si.psp8");
        assert_eq!(pseudo.symbol(), "Si");
        assert_eq!(pseudo.z(), 14);
        assert_eq!(pseudo.z_val(), Some(4.0));
        assert_eq!(pseudo.md5(), digest);
        assert!(pseudo.has_report());
        assert!(pseudo.has_hints());
    }

    #[test]
    fn pseudo_without_report_derives_symbol_from_basename() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = write_pseudo(temp.path(), "Lu-fcore.psp8", b"payload");

        let pseudo = Pseudo::from_file(&path).expect("pseudo should load without djrepo");
        assert_eq!(pseudo.symbol(), "Lu");
        assert_eq!(pseudo.z(), 71);
        assert!(!pseudo.has_report());
        assert!(!pseudo.has_hints());

        let path = write_pseudo(temp.path(), "C_hard.psp8", b"payload");
        let pseudo = Pseudo::from_file(&path).expect("pseudo should load without djrepo");
        assert_eq!(pseudo.symbol(), "C");
        assert_eq!(pseudo.z(), 6);
    }

    #[test]
    fn unknown_basename_symbol_is_an_input_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = write_pseudo(temp.path(), "mystery.psp8", b"payload");

        let error = Pseudo::from_file(&path).expect_err("unknown symbol should fail");
        assert_eq!(error.category(), DojoErrorCategory::InputValidation);
        assert_eq!(error.code(), "INPUT.PSEUDO_SYMBOL");
    }

    #[test]
    fn malformed_djrepo_is_a_hard_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = write_pseudo(temp.path(), "Si.psp8", b"payload");
        fs::write(sibling_with_extension(&path, "djrepo"), "{ not json")
            .expect("djrepo file should be written");

        let error = Pseudo::from_file(&path).expect_err("malformed djrepo should fail");
        assert_eq!(error.category(), DojoErrorCategory::Metadata);
        assert_eq!(error.code(), "META.DJREPO_PARSE");
    }

    #[test]
    fn sibling_extension_swap_matches_notebook_expectations() {
        let path = Path::new("/tables/ONCVPSP-PBE/Si.psp8");
        assert_eq!(
            sibling_with_extension(path, "in"),
            Path::new("/tables/ONCVPSP-PBE/Si.in")
        );
        assert_eq!(
            sibling_with_extension(path, "ipynb"),
            Path::new("/tables/ONCVPSP-PBE/Si.ipynb")
        );
    }
}
