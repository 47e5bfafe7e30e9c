//! `DojoTable`: an ordered collection of pseudopotentials loaded either from
//! a dojo directory scan or from a `.djson` index file, plus the validation
//! pass that reports findings over it.

use crate::domain::{DojoError, PseudoFormat, TableResult};
use crate::pseudo::Pseudo;
use globset::{Glob, GlobMatcher};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Exclusion controls for [`DojoTable::from_dojodir`].
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Exact basenames to skip.
    pub exclude_basenames: Vec<String>,
    /// `|`-separated glob tokens, e.g. `"*_r.psp8|*-sp.psp8"`.
    pub exclude_wildcard: Option<String>,
}

impl ScanOptions {
    fn compile_wildcards(&self) -> TableResult<Vec<GlobMatcher>> {
        let Some(wildcard) = &self.exclude_wildcard else {
            return Ok(Vec::new());
        };

        let mut matchers = Vec::new();
        for token in wildcard.split('|').filter(|token| !token.is_empty()) {
            let matcher = Glob::new(token)
                .map_err(|source| {
                    DojoError::input_validation(
                        "INPUT.EXCLUDE_WILDCARD",
                        format!("invalid exclusion glob '{}': {}", token, source),
                    )
                })?
                .compile_matcher();
            matchers.push(matcher);
        }
        Ok(matchers)
    }
}

/// The `dojo_info` header of a `.djson` index.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TableInfo {
    #[serde(default)]
    pub pp_type: Option<String>,
    #[serde(default)]
    pub xc_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub dojo_dir: Option<String>,
    #[serde(flatten)]
    pub extras: BTreeMap<String, serde_json::Value>,
}

impl TableInfo {
    pub fn summary_line(&self) -> String {
        let pp_type = self.pp_type.as_deref().unwrap_or("unknown");
        let xc_name = self.xc_name.as_deref().unwrap_or("unknown");
        let version = self.version.as_deref().unwrap_or("unversioned");
        format!("{} table, xc={}, version {}", pp_type, xc_name, version)
    }
}

#[derive(Debug, Clone)]
pub struct DojoTable {
    origin: String,
    pseudos: Vec<Pseudo>,
    info: Option<TableInfo>,
}

impl DojoTable {
    /// Scans one directory (non-recursive) for pseudo files and loads each
    /// of them. Missing djrepo reports are tolerated here and surface later
    /// through [`DojoTable::find_errors`]; unreadable files and malformed
    /// metadata are hard errors.
    pub fn from_dojodir(top: impl AsRef<Path>, options: &ScanOptions) -> TableResult<Self> {
        let top = top.as_ref();
        let wildcard_matchers = options.compile_wildcards()?;

        let entries = fs::read_dir(top).map_err(|source| {
            DojoError::io_system(
                "IO.TABLE_SCAN",
                format!("failed to scan dojo directory '{}': {}", top.display(), source),
            )
        })?;

        let mut pseudos = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| {
                DojoError::io_system(
                    "IO.TABLE_SCAN",
                    format!("failed to scan dojo directory '{}': {}", top.display(), source),
                )
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(format) = PseudoFormat::from_path(&path) else {
                continue;
            };

            let basename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            if options
                .exclude_basenames
                .iter()
                .any(|excluded| excluded == &basename)
            {
                debug!(%basename, "skipping pseudo excluded by basename");
                continue;
            }
            if wildcard_matchers
                .iter()
                .any(|matcher| matcher.is_match(&basename))
            {
                debug!(%basename, "skipping pseudo excluded by wildcard");
                continue;
            }

            debug!(%basename, %format, "loading pseudo file");
            pseudos.push(Pseudo::from_file(&path)?);
        }

        if pseudos.is_empty() {
            return Err(DojoError::input_validation(
                "INPUT.TABLE_EMPTY",
                format!(
                    "no pseudopotential files found in dojo directory '{}'",
                    top.display()
                ),
            ));
        }

        sort_pseudos(&mut pseudos);
        Ok(Self {
            origin: top.to_string_lossy().into_owned(),
            pseudos,
            info: None,
        })
    }

    /// Loads a `.djson` index file. Pseudo files resolve as siblings of the
    /// index; every listed file must exist and match the recorded md5 and
    /// symbol. The resulting table carries the index's `dojo_info`.
    pub fn from_djson_file(path: impl AsRef<Path>) -> TableResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| {
            DojoError::io_system(
                "IO.DJSON_READ",
                format!("failed to read djson file '{}': {}", path.display(), source),
            )
        })?;
        let index: DjsonIndex = serde_json::from_str(&content).map_err(|source| {
            DojoError::input_validation(
                "INPUT.DJSON_PARSE",
                format!("failed to parse djson file '{}': {}", path.display(), source),
            )
        })?;

        let info = index.dojo_info.ok_or_else(|| {
            DojoError::input_validation(
                "INPUT.DJSON_SCHEMA",
                format!(
                    "djson file '{}' is missing the required 'dojo_info' object",
                    path.display()
                ),
            )
        })?;

        let table_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut seen_basenames = BTreeSet::new();
        let mut pseudos = Vec::new();
        for (symbol, entry) in &index.pseudos_metadata {
            let pseudo_path = resolve_listed_basename(path, table_dir, &entry.basename)?;
            if !seen_basenames.insert(entry.basename.clone()) {
                return Err(DojoError::input_validation(
                    "INPUT.DJSON_DUPLICATE",
                    format!(
                        "djson file '{}' lists basename '{}' more than once",
                        path.display(),
                        entry.basename
                    ),
                ));
            }
            if !pseudo_path.is_file() {
                return Err(DojoError::input_validation(
                    "INPUT.DJSON_MISSING_FILE",
                    format!(
                        "pseudo file '{}' listed in '{}' does not exist",
                        pseudo_path.display(),
                        path.display()
                    ),
                ));
            }

            let pseudo = Pseudo::from_file(&pseudo_path)?;
            if pseudo.md5() != entry.md5 {
                return Err(DojoError::metadata(
                    "META.DJSON_MD5",
                    format!(
                        "pseudo file '{}' has md5 {} but the djson index records {}",
                        pseudo_path.display(),
                        pseudo.md5(),
                        entry.md5
                    ),
                ));
            }
            if pseudo.symbol() != symbol {
                return Err(DojoError::metadata(
                    "META.DJSON_SYMBOL",
                    format!(
                        "pseudo file '{}' identifies as '{}' but is listed under '{}'",
                        pseudo_path.display(),
                        pseudo.symbol(),
                        symbol
                    ),
                ));
            }
            pseudos.push(pseudo);
        }

        sort_pseudos(&mut pseudos);
        Ok(Self {
            origin: path.to_string_lossy().into_owned(),
            pseudos,
            info: Some(info),
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn len(&self) -> usize {
        self.pseudos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pseudos.is_empty()
    }

    /// Pseudos in ascending Z order, ties broken by basename.
    pub fn iter(&self) -> impl Iterator<Item = &Pseudo> {
        self.pseudos.iter()
    }

    pub fn pseudos_for_symbol(&self, symbol: &str) -> Vec<&Pseudo> {
        self.pseudos
            .iter()
            .filter(|pseudo| pseudo.symbol() == symbol)
            .collect()
    }

    pub const fn info(&self) -> Option<&TableInfo> {
        self.info.as_ref()
    }

    /// Element symbols carried by more than one pseudo, in Z order.
    pub fn duplicated_symbols(&self) -> Vec<String> {
        let mut counts: BTreeMap<(u32, &str), usize> = BTreeMap::new();
        for pseudo in &self.pseudos {
            *counts.entry((pseudo.z(), pseudo.symbol())).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|((_, symbol), _)| symbol.to_owned())
            .collect()
    }

    /// Pure validation pass over the loaded table. Returns human-readable
    /// findings and never fails; hard failures belong to loading.
    pub fn find_errors(
        &self,
        checksums: Option<&BTreeMap<String, String>>,
        require_hints: bool,
    ) -> Vec<String> {
        let mut findings = Vec::new();

        for symbol in self.duplicated_symbols() {
            let basenames: Vec<&str> = self
                .pseudos_for_symbol(&symbol)
                .iter()
                .map(|pseudo| pseudo.basename())
                .collect();
            findings.push(format!(
                "multiple pseudos found for element '{}': {}",
                symbol,
                basenames.join(", ")
            ));
        }

        for pseudo in &self.pseudos {
            if let Some(manifest) = checksums {
                match manifest.get(pseudo.basename()) {
                    None => findings.push(format!(
                        "basename '{}' is missing from the checksum manifest",
                        pseudo.basename()
                    )),
                    Some(digest) if digest != pseudo.md5() => findings.push(format!(
                        "checksum manifest records md5 {} for '{}' but the file has {}",
                        digest,
                        pseudo.basename(),
                        pseudo.md5()
                    )),
                    Some(_) => {}
                }
            }

            match pseudo.report() {
                Some(report) => {
                    if report.md5 != pseudo.md5() {
                        findings.push(format!(
                            "djrepo for '{}' records md5 {} but the file has {}",
                            pseudo.basename(),
                            report.md5,
                            pseudo.md5()
                        ));
                    }
                    if require_hints && !report.has_hints() {
                        findings.push(format!(
                            "djrepo for '{}' has no ecut hints",
                            pseudo.basename()
                        ));
                    }
                }
                None => {
                    findings.push(format!(
                        "no djrepo report found for '{}'",
                        pseudo.basename()
                    ));
                    if require_hints {
                        findings.push(format!(
                            "djrepo for '{}' has no ecut hints",
                            pseudo.basename()
                        ));
                    }
                }
            }
        }

        if !findings.is_empty() {
            warn!(
                origin = %self.origin,
                finding_count = findings.len(),
                "table validation produced findings"
            );
        }
        findings
    }
}

#[derive(Debug, Deserialize)]
struct DjsonIndex {
    #[serde(default)]
    dojo_info: Option<TableInfo>,
    #[serde(default)]
    pseudos_metadata: BTreeMap<String, DjsonEntry>,
}

#[derive(Debug, Deserialize)]
struct DjsonEntry {
    basename: String,
    md5: String,
}

/// A listed basename must stay inside the djson directory; anything with
/// path separators or parent components is rejected.
fn resolve_listed_basename(
    djson_path: &Path,
    table_dir: &Path,
    basename: &str,
) -> TableResult<PathBuf> {
    let is_plain_name = Path::new(basename)
        .file_name()
        .is_some_and(|name| name == basename && basename != "..");
    if !is_plain_name {
        return Err(DojoError::input_validation(
            "INPUT.DJSON_BASENAME",
            format!(
                "basename '{}' listed in '{}' does not resolve inside the table directory",
                basename,
                djson_path.display()
            ),
        ));
    }
    Ok(table_dir.join(basename))
}

fn sort_pseudos(pseudos: &mut [Pseudo]) {
    pseudos.sort_by(|a, b| {
        a.z()
            .cmp(&b.z())
            .then_with(|| a.basename().cmp(b.basename()))
    });
}

/// Serializable outcome of a validation run, written alongside the human
/// summary for CI consumption.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub origin: String,
    pub pseudo_count: usize,
    pub finding_count: usize,
    pub passed: bool,
    pub findings: Vec<String>,
}

impl ValidationReport {
    pub fn from_findings(table: &DojoTable, findings: Vec<String>) -> Self {
        Self {
            origin: table.origin().to_owned(),
            pseudo_count: table.len(),
            finding_count: findings.len(),
            passed: findings.is_empty(),
            findings,
        }
    }

    pub fn write_to(&self, report_path: &Path) -> TableResult<()> {
        if let Some(parent_dir) = report_path.parent() {
            fs::create_dir_all(parent_dir).map_err(|source| {
                DojoError::io_system(
                    "IO.REPORT_DIR",
                    format!(
                        "failed to create report directory '{}': {}",
                        parent_dir.display(),
                        source
                    ),
                )
            })?;
        }

        let report_json = serde_json::to_string_pretty(self).map_err(|source| {
            DojoError::internal(
                "SYS.REPORT_JSON",
                format!(
                    "failed to serialize validation report '{}': {}",
                    report_path.display(),
                    source
                ),
            )
        })?;
        fs::write(report_path, report_json).map_err(|source| {
            DojoError::io_system(
                "IO.REPORT_WRITE",
                format!(
                    "failed to write validation report '{}': {}",
                    report_path.display(),
                    source
                ),
            )
        })
    }
}

pub fn render_human_summary(report: &ValidationReport) -> String {
    let mut lines = Vec::new();
    let status = if report.passed { "PASS" } else { "FAIL" };
    lines.push(format!("Validation status: {}", status));
    lines.push(format!("Table: {}", report.origin));
    lines.push(format!(
        "Pseudos: {} ({} findings)",
        report.pseudo_count, report.finding_count
    ));
    for finding in &report.findings {
        lines.push(format!("  finding: {}", finding));
    }
    lines.join("\n")
}
