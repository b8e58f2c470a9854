use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::exec::CommandOutput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationInvalidArgument,

    PermissionDenied,
    UnsafeWorkingDir,

    UnsupportedTier,
    InvalidLocalTier,
    NoDestinationFound,

    RegistryLookupFailed,
    LocalAliasUnavailable,
    RootPathUnavailable,
    SourceUnreachable,

    LockHeld,

    StepFailed,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::PermissionDenied => "preflight.permission_denied",
            ErrorCode::UnsafeWorkingDir => "preflight.unsafe_working_dir",

            ErrorCode::UnsupportedTier => "topology.unsupported_tier",
            ErrorCode::InvalidLocalTier => "topology.invalid_local_tier",
            ErrorCode::NoDestinationFound => "topology.no_destination_found",

            ErrorCode::RegistryLookupFailed => "registry.lookup_failed",
            ErrorCode::LocalAliasUnavailable => "registry.local_alias_unavailable",
            ErrorCode::RootPathUnavailable => "registry.root_path_unavailable",
            ErrorCode::SourceUnreachable => "content.source_unreachable",

            ErrorCode::LockHeld => "run.lock_held",

            ErrorCode::StepFailed => "pipeline.step_failed",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupDetails {
    pub identity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepFailedDetails {
    pub step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        let details = serde_json::to_value(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.into(),
            value,
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            details,
        )
    }

    pub fn permission_denied(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        let expected = expected.into();
        let actual = actual.into();
        Self::new(
            ErrorCode::PermissionDenied,
            format!("Must run as operator account '{}'", expected),
            serde_json::json!({ "expected": expected, "actual": actual }),
        )
        .with_hint("Switch to the operator account before promoting")
    }

    pub fn unsafe_working_dir(cwd: impl Into<String>, code_root: impl Into<String>) -> Self {
        let cwd = cwd.into();
        Self::new(
            ErrorCode::UnsafeWorkingDir,
            "Current directory is inside the managed code tree",
            serde_json::json!({ "cwd": cwd, "codeRoot": code_root.into() }),
        )
        .with_hint("Re-run from outside the deployed code directory (e.g. $HOME)")
    }

    pub fn unsupported_tier(identity: impl Into<String>) -> Self {
        let identity = identity.into();
        Self::new(
            ErrorCode::UnsupportedTier,
            format!("No promotion target for environment '{}'", identity),
            serde_json::json!({ "identity": identity }),
        )
        .with_hint("Code promotes test -> stage and stage -> prod only")
    }

    pub fn invalid_local_tier(identity: impl Into<String>) -> Self {
        let identity = identity.into();
        Self::new(
            ErrorCode::InvalidLocalTier,
            format!("Environment '{}' cannot receive a content refresh", identity),
            serde_json::json!({ "identity": identity }),
        )
        .with_hint("Content refreshes only test and stage environments")
    }

    pub fn no_destination_found(tier: impl Into<String>) -> Self {
        let tier = tier.into();
        Self::new(
            ErrorCode::NoDestinationFound,
            format!("No '{}' instances registered", tier),
            serde_json::json!({ "tier": tier }),
        )
    }

    pub fn registry_lookup_failed(identity: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::lookup(
            ErrorCode::RegistryLookupFailed,
            "Registry lookup failed",
            identity,
            Some(cause.into()),
        )
    }

    pub fn local_alias_unavailable(identity: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::lookup(
            ErrorCode::LocalAliasUnavailable,
            "Local environment alias unavailable",
            identity,
            Some(cause.into()),
        )
        .with_hint("Check that this host has a registered site alias")
    }

    pub fn root_path_unavailable(identity: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::lookup(
            ErrorCode::RootPathUnavailable,
            "Could not resolve environment root path",
            identity,
            Some(cause.into()),
        )
    }

    pub fn source_unreachable(identity: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::lookup(
            ErrorCode::SourceUnreachable,
            "Production source is unreachable",
            identity,
            Some(cause.into()),
        )
        .with_retryable(true)
    }

    fn lookup(
        code: ErrorCode,
        message: &str,
        identity: impl Into<String>,
        cause: Option<String>,
    ) -> Self {
        let details = serde_json::to_value(LookupDetails {
            identity: identity.into(),
            cause,
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
        Self::new(code, message, details)
    }

    pub fn lock_held(identity: impl Into<String>, lock_path: impl Into<String>) -> Self {
        let identity = identity.into();
        Self::new(
            ErrorCode::LockHeld,
            format!("Another promotion is already running against '{}'", identity),
            serde_json::json!({ "identity": identity, "lockPath": lock_path.into() }),
        )
        .with_retryable(true)
        .with_hint("Wait for the other run to finish, or remove the lock file if it is stale")
    }

    pub fn step_failed(
        step: impl Into<String>,
        target: Option<String>,
        command: impl Into<String>,
        output: &CommandOutput,
    ) -> Self {
        let step = step.into();
        let message = match &target {
            Some(target) => format!("Step '{}' failed for {}", step, target),
            None => format!("Step '{}' failed", step),
        };
        let details = serde_json::to_value(StepFailedDetails {
            step,
            target,
            command: command.into(),
            exit_code: output.exit_code,
            stdout: output.stdout.clone(),
            stderr: output.stderr.clone(),
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(ErrorCode::StepFailed, message, details)
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            serde_json::json!({ "path": path.into(), "error": err.to_string() }),
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        problem: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            serde_json::json!({ "key": key.into(), "problem": problem.into() }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIoError,
            "IO error",
            serde_json::json!({ "error": error.into(), "context": context }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            serde_json::json!({ "error": error.into(), "context": context }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = Some(retryable);
        self
    }
}
