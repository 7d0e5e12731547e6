//! Error Module
//!
//! Typed failures for a single report run. Each variant belongs to one of
//! three classes: input errors and output errors fail the file being
//! processed, decoration errors only degrade the result.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// How severe a [`ReportError`] is for the file that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The source table cannot be used. Fatal for the file.
    Input,
    /// Optional decoration (logo, tags) is unusable. Processing continues.
    Decoration,
    /// An artifact could not be written. Fatal for the file.
    Output,
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read source table {path:?}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("source table {path:?} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("failed to load logo {path:?}: {source}")]
    Logo {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("logo {path:?} has a zero dimension")]
    EmptyLogo { path: PathBuf },

    #[error("failed to write {path:?}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Input => "input",
            ErrorKind::Decoration => "decoration",
            ErrorKind::Output => "output",
        }
    }
}

impl ReportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReportError::SourceRead { .. } | ReportError::MissingColumn { .. } => ErrorKind::Input,
            ReportError::Logo { .. } | ReportError::EmptyLogo { .. } => ErrorKind::Decoration,
            ReportError::Output { .. } => ErrorKind::Output,
        }
    }

    /// Shorthand for wrapping an I/O failure on an output artifact.
    pub(crate) fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Output {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_each_variant() {
        let missing = ReportError::MissingColumn {
            path: PathBuf::from("host.csv"),
            column: "Rationale",
        };
        assert_eq!(missing.kind(), ErrorKind::Input);
        assert!(missing.to_string().contains("'Rationale'"));

        let logo = ReportError::EmptyLogo {
            path: PathBuf::from("logo.png"),
        };
        assert_eq!(logo.kind(), ErrorKind::Decoration);

        let out = ReportError::output(
            "out.pdf",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(out.kind(), ErrorKind::Output);
    }
}
