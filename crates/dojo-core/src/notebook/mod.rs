//! Validation-notebook assembly.
//!
//! Builds the fixed sequence of markdown and code cells documenting a
//! pseudopotential's validation plots, writes the document next to the
//! pseudo (or to a temporary file) and can hand it to a `jupyter notebook`
//! server. The code cells carry Python source for the reader's kernel; that
//! text is payload data, not something this crate executes.

pub mod document;

use crate::domain::{DojoError, DojoResult};
use crate::pseudo::sibling_with_extension;
use document::{Cell, Notebook};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct NotebookOptions {
    /// Append the interactive validation-widget cells.
    pub with_validation: bool,
    /// Append the GBRV equation-of-state cells.
    pub with_eos: bool,
    /// Write to a persisted temporary file instead of the sibling `.ipynb`.
    pub tmpfile: bool,
}

impl NotebookOptions {
    pub const fn for_write() -> Self {
        Self {
            with_validation: false,
            with_eos: false,
            tmpfile: false,
        }
    }

    pub const fn for_open() -> Self {
        Self {
            with_validation: false,
            with_eos: true,
            tmpfile: true,
        }
    }
}

impl Default for NotebookOptions {
    fn default() -> Self {
        Self::for_write()
    }
}

/// Assembles the validation notebook for `pseudopath` and writes it to disk,
/// returning the path of the written document.
pub fn write_notebook(pseudopath: &Path, options: &NotebookOptions) -> DojoResult<PathBuf> {
    let absolute = std::path::absolute(pseudopath).map_err(|source| {
        DojoError::io_system(
            "IO.NOTEBOOK_PATH",
            format!(
                "failed to resolve pseudo path '{}': {}",
                pseudopath.display(),
                source
            ),
        )
    })?;
    let basename = absolute
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let notebook = assemble_notebook(&absolute, &basename, options);
    let notebook_path = if options.tmpfile {
        persisted_tempfile_path(&basename)?
    } else {
        sibling_with_extension(&absolute, "ipynb")
    };

    notebook.write_to(&notebook_path)?;
    debug!(notebook = %notebook_path.display(), "validation notebook written");
    Ok(notebook_path)
}

/// Writes the notebook to a temporary file and opens it with
/// `jupyter notebook`, returning the server's exit code.
pub fn make_open_notebook(pseudopath: &Path, options: &NotebookOptions) -> DojoResult<i32> {
    let notebook_path = write_notebook(
        pseudopath,
        &NotebookOptions {
            tmpfile: true,
            ..*options
        },
    )?;

    let path_list = std::env::var_os("PATH").unwrap_or_default();
    let jupyter = find_program_in_path("jupyter", &path_list).ok_or_else(|| {
        DojoError::io_system(
            "RUN.JUPYTER_MISSING",
            "cannot find 'jupyter' in PATH; install it with `pip install jupyter`",
        )
    })?;

    let status = Command::new(&jupyter)
        .arg("notebook")
        .arg(&notebook_path)
        .status()
        .map_err(|source| {
            DojoError::io_system(
                "RUN.JUPYTER_SPAWN",
                format!(
                    "failed to launch '{} notebook {}': {}",
                    jupyter.display(),
                    notebook_path.display(),
                    source
                ),
            )
        })?;
    Ok(status.code().unwrap_or(1))
}

/// PATH lookup over an explicit path-list string, kept pure so it is
/// testable without touching the process environment.
pub fn find_program_in_path(program: &str, path_list: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(path_list)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

fn persisted_tempfile_path(basename: &str) -> DojoResult<PathBuf> {
    let tempfile = tempfile::Builder::new()
        .prefix(basename)
        .suffix(".ipynb")
        .tempfile()
        .map_err(|source| {
            DojoError::io_system(
                "IO.NOTEBOOK_TMPFILE",
                format!("failed to create temporary notebook file: {}", source),
            )
        })?;
    let (_, path) = tempfile.keep().map_err(|source| {
        DojoError::io_system(
            "IO.NOTEBOOK_TMPFILE",
            format!("failed to persist temporary notebook file: {}", source),
        )
    })?;
    Ok(path)
}

fn assemble_notebook(absolute: &Path, basename: &str, options: &NotebookOptions) -> Notebook {
    let mut notebook = Notebook::new();

    notebook.extend([
        Cell::markdown(format!("# PseudoDojo notebook for {}", basename)),
        Cell::code("from __future__ import print_function, division, unicode_literals\n%matplotlib notebook"),
        Cell::markdown("Construct the pseudo object and get the DojoReport"),
        Cell::code(format!(
            "from pseudo_dojo.core.pseudos import dojopseudo_from_file\npseudo = dojopseudo_from_file('{}')\nreport = pseudo.dojo_report",
            absolute.display()
        )),
        Cell::markdown("## ONCVPSP Input File:"),
        Cell::code("input_file = pseudo.filepath.replace(\".psp8\", \".in\")\n%cat $input_file"),
        Cell::code(
            "# Get data from the output file\nfrom pseudo_dojo.ppcodes.oncvpsp import OncvOutputParser, PseudoGenDataPlotter\nonc_parser = OncvOutputParser(pseudo.filepath.replace(\".psp8\", \".out\"))\n# Parse the file and build the plotter\nonc_parser.scan()\nplotter = onc_parser.make_plotter()",
        ),
        Cell::markdown("## AE and PS radial wavefunctions $\\phi(r)$:"),
        Cell::code("fig = plotter.plot_radial_wfs(show=False)"),
        Cell::markdown(
            "## Arctan of the logarithmic derivatives:\nFor a pseudo to qualify for a GW tag, in general no deviations should be present up to 8 Ha.\nReal ghosts are mostly observed when two steps in a PS curve touch.",
        ),
        Cell::code("fig = plotter.plot_atan_logders(show=False)"),
        Cell::markdown(
            "## Convergence in $G$-space estimated by ONCVPSP:\ncalculated in the atomic configuration",
        ),
        Cell::code("fig = plotter.plot_ene_vs_ecut(show=False)"),
        Cell::markdown(
            "## Projectors:\nIn general the second projector in any channel should have one node more than the first.\nPushing the energy of the second projector too high may cause an additional node.\nThis will most likely introduce ghosts.",
        ),
        Cell::code("fig = plotter.plot_projectors(show=False)"),
        Cell::markdown(
            "## Core-Valence-Model charge densities:\nMuch better convergence properties have been achieved using icmod 3.\nfcfact mainly determines the height of the model core charge,\nrcfact mainly determines the width of the model core charge.",
        ),
        Cell::code("fig = plotter.plot_densities(show=False)"),
        Cell::markdown("## Local potential and $l$-dependent potentials:"),
        Cell::code("fig = plotter.plot_potentials(show=False)"),
        Cell::markdown("## Model core charge and form factors computed by ABINIT"),
        Cell::code(
            "with pseudo.open_pspsfile() as psps:\n    fform_fig = psps.plot(show=False);\nfform_fig",
        ),
        Cell::markdown(
            "## Ghosts Test\nSelf-consistent band structure calculation on a regular mesh.\nThe algorithm to detect ghosts is just an indication, usually on the side of false positives.\nZoom in on the band plot to see if an actual ghost is there.",
        ),
        Cell::code("fig = report.plot_ebands(with_soc=False, show=False); fig"),
        Cell::markdown(
            "## Convergence of the total energy:\nComputed from the deltafactor runs at the Wien2k equilibrium volume.",
        ),
        Cell::code("fig = report.plot_etotal_vs_ecut(show=False)"),
        Cell::code("fig = report.plot_etotal_vs_ecut(inv_ecut=True, show=False)"),
        Cell::markdown("## Convergence of the deltafactor results:"),
        Cell::code(
            "fig = report.plot_deltafactor_convergence(xc=pseudo.xc, what=(\"dfact_meV\", \"dfactprime_meV\"), show=False)",
        ),
    ]);

    if options.with_validation {
        notebook.extend([
            Cell::markdown("## PseudoDojo validation:"),
            Cell::code("report.ipw_validate()"),
        ]);
    }

    notebook.extend([
        Cell::markdown(
            "## Convergence of $\\Delta v_0$, $\\Delta b_0$, and $\\Delta b_1$ (deltafactor tests)",
        ),
        Cell::code(
            "# Here we plot the difference wrt Wien2k results.\nfig = report.plot_deltafactor_convergence(xc=pseudo.xc, what=(\"-dfact_meV\", \"-dfactprime_meV\"), show=False)",
        ),
        Cell::markdown("## Deltafactor EOS for the different cutoff energies:"),
        Cell::code("fig = report.plot_deltafactor_eos(show=False)"),
        Cell::markdown("## Convergence of the GBRV lattice parameters:"),
        Cell::code("fig = report.plot_gbrv_convergence(show=False)"),
        Cell::markdown("## Convergence of the phonon frequencies at $\\Gamma$:"),
        Cell::code("fig = report.plot_phonon_convergence(show=False)"),
    ]);

    if options.with_eos {
        notebook.extend([
            Cell::markdown("## GBRV EOS for the FCC structure:"),
            Cell::code("fig = report.plot_gbrv_eos(struct_type=\"fcc\", show=False)"),
            Cell::markdown("## GBRV EOS for the BCC structure:"),
            Cell::code("fig = report.plot_gbrv_eos(struct_type=\"bcc\", show=False)"),
        ]);
    }

    notebook
}

#[cfg(test)]
mod tests {
    use super::{NotebookOptions, find_program_in_path, write_notebook};
    use serde_json::Value;
    use std::fs;
    use tempfile::TempDir;

    fn cell_sources(notebook_path: &std::path::Path) -> Vec<String> {
        let parsed: Value = serde_json::from_str(
            &fs::read_to_string(notebook_path).expect("notebook should be readable"),
        )
        .expect("notebook JSON should parse");
        parsed["cells"]
            .as_array()
            .expect("cells should be an array")
            .iter()
            .map(|cell| cell["source"].as_str().unwrap_or_default().to_owned())
            .collect()
    }

    #[test]
    fn default_notebook_is_written_next_to_the_pseudo() {
        let temp = TempDir::new().expect("tempdir should be created");
        let pseudo_path = temp.path().join("Si.psp8");
        fs::write(&pseudo_path, b"payload").expect("pseudo file should be written");

        let notebook_path = write_notebook(&pseudo_path, &NotebookOptions::for_write())
            .expect("notebook should be written");
        assert_eq!(notebook_path, temp.path().join("Si.ipynb"));

        let sources = cell_sources(&notebook_path);
        assert_eq!(sources.len(), 36);
        assert_eq!(sources[0], "# PseudoDojo notebook for Si.psp8");
        assert!(
            sources[3].contains("dojopseudo_from_file('") && sources[3].contains("Si.psp8')"),
            "construction cell should embed the absolute pseudo path: {}",
            sources[3]
        );
        assert!(
            !sources.iter().any(|source| source.contains("ipw_validate")),
            "validation widget should be absent by default"
        );
        assert!(
            !sources.iter().any(|source| source.contains("plot_gbrv_eos")),
            "EOS cells should be absent by default"
        );
    }

    #[test]
    fn validation_and_eos_flags_append_their_cells() {
        let temp = TempDir::new().expect("tempdir should be created");
        let pseudo_path = temp.path().join("Si.psp8");
        fs::write(&pseudo_path, b"payload").expect("pseudo file should be written");

        let options = NotebookOptions {
            with_validation: true,
            with_eos: true,
            tmpfile: false,
        };
        let notebook_path =
            write_notebook(&pseudo_path, &options).expect("notebook should be written");

        let sources = cell_sources(&notebook_path);
        assert_eq!(sources.len(), 42);
        assert!(sources.iter().any(|source| source == "report.ipw_validate()"));
        assert!(
            sources
                .iter()
                .any(|source| source.contains("plot_gbrv_eos(struct_type=\"fcc\""))
        );
        assert!(
            sources
                .iter()
                .any(|source| source.contains("plot_gbrv_eos(struct_type=\"bcc\""))
        );
    }

    #[test]
    fn tmpfile_mode_persists_a_named_temporary_notebook() {
        let temp = TempDir::new().expect("tempdir should be created");
        let pseudo_path = temp.path().join("Si.psp8");
        fs::write(&pseudo_path, b"payload").expect("pseudo file should be written");

        let options = NotebookOptions {
            tmpfile: true,
            ..NotebookOptions::for_write()
        };
        let notebook_path =
            write_notebook(&pseudo_path, &options).expect("notebook should be written");

        let file_name = notebook_path
            .file_name()
            .and_then(|name| name.to_str())
            .expect("tempfile should have a name");
        assert!(file_name.starts_with("Si.psp8"));
        assert!(file_name.ends_with(".ipynb"));
        assert!(notebook_path.is_file(), "tempfile notebook should persist");
        fs::remove_file(&notebook_path).expect("persisted tempfile should be removable");
    }

    #[test]
    fn path_lookup_only_reports_existing_programs() {
        let temp = TempDir::new().expect("tempdir should be created");
        let bin_dir = temp.path().join("bin");
        fs::create_dir_all(&bin_dir).expect("bin dir should be created");
        fs::write(bin_dir.join("jupyter"), "#!/bin/sh\n").expect("stub should be written");

        let path_list = std::env::join_paths([temp.path().to_path_buf(), bin_dir.clone()])
            .expect("path list should join");
        assert_eq!(
            find_program_in_path("jupyter", &path_list),
            Some(bin_dir.join("jupyter"))
        );
        assert_eq!(find_program_in_path("no-such-tool", &path_list), None);
    }
}
