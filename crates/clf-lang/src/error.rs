use derive_more::From;
use orion_error::{ErrorCode, StructError, UvsReason};

use crate::checker::{CheckError, CheckKind};

#[derive(Debug, Clone, PartialEq, thiserror::Error, From)]
pub enum CompileReason {
    #[error("unresolved reference")]
    SpecReference,
    #[error("duplicate name")]
    SpecUniqueness,
    #[error("missing required field")]
    SpecRequiredField,
    #[error("unknown output type")]
    SpecUnknownOutputType,
    #[error("invalid authentication")]
    SpecAuthConfiguration,
    #[error("template render error")]
    TemplateRender,
    #[error("internal error")]
    Internal,
    #[error("{0}")]
    Uvs(UvsReason),
}

impl ErrorCode for CompileReason {
    fn error_code(&self) -> i32 {
        match self {
            Self::SpecReference => 3001,
            Self::SpecUniqueness => 3002,
            Self::SpecRequiredField => 3003,
            Self::SpecUnknownOutputType => 3004,
            Self::SpecAuthConfiguration => 3005,
            Self::TemplateRender => 3006,
            Self::Internal => 3007,
            Self::Uvs(u) => u.error_code(),
        }
    }
}

impl From<CheckKind> for CompileReason {
    fn from(kind: CheckKind) -> Self {
        match kind {
            CheckKind::Reference => Self::SpecReference,
            CheckKind::Uniqueness => Self::SpecUniqueness,
            CheckKind::RequiredField => Self::SpecRequiredField,
            CheckKind::UnknownOutputType => Self::SpecUnknownOutputType,
            CheckKind::AuthConfiguration => Self::SpecAuthConfiguration,
        }
    }
}

pub type CompileError = StructError<CompileReason>;
pub type CompileResult<T> = Result<T, CompileError>;

/// Fold a non-empty diagnostic list into one error. The reason follows the
/// first diagnostic; the detail carries all of them, one per line.
pub(crate) fn diagnostics_error(errors: &[CheckError]) -> CompileError {
    let reason = errors
        .first()
        .map(|e| CompileReason::from(e.kind))
        .unwrap_or(CompileReason::Internal);
    let lines: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    StructError::from(reason).with_detail(format!("spec errors:\n{}", lines.join("\n")))
}

pub(crate) fn internal(detail: impl Into<String>) -> CompileError {
    StructError::from(CompileReason::Internal).with_detail(detail.into())
}
