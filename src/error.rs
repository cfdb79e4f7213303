//! Error types for the frame solver
//!
//! Every failure carries a machine-readable code (`E101`, `E301`, ...) plus a
//! catalog entry with a title, a description and a suggested fix. Input and
//! geometry errors abort a run before any numerical work is done.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for solver operations
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("[E101] Input file not found: {0}")]
    InputNotFound(String),

    #[error("[E102] Invalid JSON input: {0}")]
    InvalidJson(String),

    #[error("[E103] Missing material or section: {0}")]
    MissingProperty(String),

    #[error("[E104] Load case '{0}' is not defined in the input")]
    LoadCaseNotFound(String),

    #[error("[E105] Invalid reference: {0}")]
    InvalidReference(String),

    #[error("[E106] Unsupported analysis: {0}")]
    UnsupportedAnalysis(String),

    #[error("[E107] Response spectrum function '{0}' is not defined")]
    FunctionNotFound(String),

    #[error("[E108] Load case '{0}' has no response spectrum loads")]
    NoSpectrumLoads(String),

    #[error("[E201] Zero length element: {0}")]
    ZeroLengthElement(String),

    #[error("[E202] Invalid section properties: {0}")]
    InvalidSection(String),

    #[error("[E203] Unstable release configuration: {0}")]
    UnstableRelease(String),

    #[error("[E300] Numerical failure: {0}")]
    Numerical(String),

    #[error("[E301] Structure is unstable (singular stiffness matrix): {0}")]
    Mechanism(String),

    #[error("[E302] Huge displacements detected: {0}")]
    ExcessiveDisplacement(String),

    #[error("[E303] Eigenvalue extraction failed: {0}")]
    EigenFailure(String),

    #[error("[E401] Result write failure: {0}")]
    WriteFailure(String),

    #[error("[E000] Unknown system error: {0}")]
    Internal(String),
}

/// Result type for solver operations
pub type FrameResult<T> = Result<T, SolverError>;

/// Serializable error payload written into a FAILED result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub title: String,
    pub desc: String,
    pub fix: String,
}

struct CatalogEntry {
    title: &'static str,
    desc: &'static str,
    fix: &'static str,
}

impl SolverError {
    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InputNotFound(_) => "E101",
            Self::InvalidJson(_) => "E102",
            Self::MissingProperty(_) => "E103",
            Self::LoadCaseNotFound(_) => "E104",
            Self::InvalidReference(_) => "E105",
            Self::UnsupportedAnalysis(_) => "E106",
            Self::FunctionNotFound(_) => "E107",
            Self::NoSpectrumLoads(_) => "E108",
            Self::ZeroLengthElement(_) => "E201",
            Self::InvalidSection(_) => "E202",
            Self::UnstableRelease(_) => "E203",
            Self::Numerical(_) => "E300",
            Self::Mechanism(_) => "E301",
            Self::ExcessiveDisplacement(_) => "E302",
            Self::EigenFailure(_) => "E303",
            Self::WriteFailure(_) => "E401",
            Self::Internal(_) => "E000",
        }
    }

    /// Context string attached when the error was raised
    pub fn context(&self) -> &str {
        match self {
            Self::InputNotFound(s)
            | Self::InvalidJson(s)
            | Self::MissingProperty(s)
            | Self::LoadCaseNotFound(s)
            | Self::InvalidReference(s)
            | Self::UnsupportedAnalysis(s)
            | Self::FunctionNotFound(s)
            | Self::NoSpectrumLoads(s)
            | Self::ZeroLengthElement(s)
            | Self::InvalidSection(s)
            | Self::UnstableRelease(s)
            | Self::Numerical(s)
            | Self::Mechanism(s)
            | Self::ExcessiveDisplacement(s)
            | Self::EigenFailure(s)
            | Self::WriteFailure(s)
            | Self::Internal(s) => s,
        }
    }

    /// True for errors raised while reading or validating the model
    pub fn is_input_error(&self) -> bool {
        self.code().starts_with("E1") || self.code().starts_with("E2")
    }

    /// Full catalog entry with the context appended to the description
    pub fn details(&self) -> ErrorDetails {
        let entry = catalog(self.code());
        let mut desc = entry.desc.to_string();
        if !self.context().is_empty() {
            desc.push_str("\n\nContext: ");
            desc.push_str(self.context());
        }
        ErrorDetails {
            code: self.code().to_string(),
            title: entry.title.to_string(),
            desc,
            fix: entry.fix.to_string(),
        }
    }
}

fn catalog(code: &str) -> CatalogEntry {
    match code {
        "E101" => CatalogEntry {
            title: "Input File Not Found",
            desc: "The solver could not locate the input .json file at the specified path.",
            fix: "Ensure the file path is correct and the file exists. Avoid special characters in the filename.",
        },
        "E102" => CatalogEntry {
            title: "Invalid JSON Format",
            desc: "The input file is corrupted or is not a valid JSON structure.",
            fix: "Open the file in a text editor to check for missing braces or syntax errors.",
        },
        "E103" => CatalogEntry {
            title: "Missing Material or Section",
            desc: "An element is referencing a Material or Section name that was not defined in the properties list.",
            fix: "Check your 'elements' list. Ensure every 'sec_name' matches a name in the 'sections' list exactly.",
        },
        "E104" => CatalogEntry {
            title: "Load Case Not Found",
            desc: "The requested Load Case name does not exist in the 'load_cases' definition.",
            fix: "Check the spelling of the Load Case name or ensure at least one load case is defined in the input.",
        },
        "E105" => CatalogEntry {
            title: "Unknown Node or Element Reference",
            desc: "An element or load refers to a node or element id that does not exist, or a node id is defined twice.",
            fix: "Check node ids in 'elements' and 'loads'. Every id must be defined exactly once.",
        },
        "E106" => CatalogEntry {
            title: "Unsupported Analysis Option",
            desc: "The load case requests an analysis the engine does not support (P-Delta, nonlinear or time history).",
            fix: "Switch the load case to Linear Static, Modal or Response Spectrum and clear the P-Delta flag.",
        },
        "E107" => CatalogEntry {
            title: "Spectrum Function Not Found",
            desc: "A response spectrum load refers to a function that is not defined in 'functions'.",
            fix: "Define the function or correct the function name in the load case.",
        },
        "E108" => CatalogEntry {
            title: "No Response Spectrum Loads",
            desc: "The response spectrum load case does not apply any spectrum in U1, U2 or U3.",
            fix: "Add at least one (direction, function, scale) entry to the load case.",
        },
        "E201" => CatalogEntry {
            title: "Zero Length Element",
            desc: "An element has a length of effectively zero (Start Node and End Node are coincident).",
            fix: "Check node coordinates and end offsets. Delete or merge coincident nodes.",
        },
        "E202" => CatalogEntry {
            title: "Invalid Section Properties",
            desc: "A section has Area (A) or Inertia (I) equal to or less than zero.",
            fix: "Review the Section Database. Area and Inertia must be positive values.",
        },
        "E203" => CatalogEntry {
            title: "Unstable Release Configuration",
            desc: "An element has releases that make it internally unstable (e.g., released torsion or axial force at both ends).",
            fix: "Check member releases. You cannot release the same DOF at both ends unless the element is a truss/link.",
        },
        "E300" => CatalogEntry {
            title: "Linear Algebra Failure",
            desc: "The linear solver produced a non-finite result or failed for a reason other than a mechanism.",
            fix: "Check for extreme stiffness ratios and unit consistency between E, section properties and loads.",
        },
        "E301" => CatalogEntry {
            title: "Structure is Unstable (Singular Matrix)",
            desc: "The Stiffness Matrix is singular and cannot be inverted. This usually means the structure is a 'Mechanism' (it moves freely).",
            fix: "1. Check Support Conditions (is the structure floating?).\n2. Check for disconnected nodes.\n3. Check for too many internal releases (e.g. 3 hinges in a span).",
        },
        "E302" => CatalogEntry {
            title: "Huge Displacements Detected",
            desc: "The solver calculated displacements exceeding reasonable limits (e.g., > 1e6 meters).",
            fix: "Check your units (E modulus vs Load units). Ensure your model is restrained against rotation.",
        },
        "E303" => CatalogEntry {
            title: "Eigenvalue Extraction Failed",
            desc: "The modal solver could not extract the requested modes.",
            fix: "Check that the structure is supported, that the mass source assigns mass, and that the model is connected.",
        },
        "E401" => CatalogEntry {
            title: "Result Write Failure",
            desc: "Could not save the results file.",
            fix: "Ensure the output file is not open in another program. Check folder write permissions.",
        },
        _ => CatalogEntry {
            title: "Unknown System Error",
            desc: "An unexpected error occurred that does not match any known error codes.",
            fix: "Run with RUST_LOG=debug for a detailed log. Contact the developer.",
        },
    }
}

/// Missing files and unreadable contents are input errors; anything else is
/// treated as a failure to write results.
impl From<std::io::Error> for SolverError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::NotFound => Self::InputNotFound(err.to_string()),
            ErrorKind::InvalidData | ErrorKind::UnexpectedEof => Self::InvalidJson(err.to_string()),
            _ => Self::WriteFailure(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for SolverError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidJson(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_append_context() {
        let err = SolverError::ZeroLengthElement("Element ID: 7".to_string());
        let details = err.details();
        assert_eq!(details.code, "E201");
        assert_eq!(details.title, "Zero Length Element");
        assert!(details.desc.ends_with("Context: Element ID: 7"));
    }

    #[test]
    fn test_unknown_code_falls_back() {
        let details = SolverError::Internal(String::new()).details();
        assert_eq!(details.code, "E000");
        assert_eq!(details.title, "Unknown System Error");
        assert!(!details.desc.contains("Context"));
    }

    #[test]
    fn test_input_category() {
        assert!(SolverError::LoadCaseNotFound("X".into()).is_input_error());
        assert!(SolverError::UnstableRelease("X".into()).is_input_error());
        assert!(!SolverError::Mechanism("X".into()).is_input_error());
    }

    #[test]
    fn test_io_errors_by_kind() {
        use std::io::{Error, ErrorKind};

        let missing = SolverError::from(Error::new(ErrorKind::NotFound, "model.json"));
        assert_eq!(missing.code(), "E101");
        assert!(missing.is_input_error());

        let garbled = SolverError::from(Error::new(ErrorKind::InvalidData, "stream did not contain valid UTF-8"));
        assert_eq!(garbled.code(), "E102");

        let denied = SolverError::from(Error::new(ErrorKind::PermissionDenied, "results.json"));
        assert_eq!(denied.code(), "E401");
    }
}
