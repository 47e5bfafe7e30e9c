pub mod errors;

pub use errors::{DojoError, DojoErrorCategory, DojoResult, TableResult};

use std::fmt::{Display, Formatter};
use std::path::Path;

/// On-disk pseudopotential formats the table tooling recognizes.
///
/// The payload of a pseudopotential file is never parsed; the format only
/// drives directory scanning and sibling-file derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PseudoFormat {
    Psp8,
}

impl PseudoFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Psp8 => "psp8",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        if extension.eq_ignore_ascii_case(Self::Psp8.extension()) {
            Some(Self::Psp8)
        } else {
            None
        }
    }
}

impl Display for PseudoFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).extension())
    }
}
