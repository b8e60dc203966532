//! Fatal batch errors and the report-and-terminate policy.
//!
//! The library never exits the process. A failed batch comes back as a
//! [`FatalBatchError`] and the binary hands it to [`log_and_exit`].

use std::fmt;

use chrono::Utc;
use log::error;
use serde::Serialize;

use crate::constants::{EVENT_ERROR_CODE_500, FATAL_EXIT_CODE, SIMULATION_WORKER_EXCEPTION};

/// A fault that escaped a batch upload.
///
/// Always classified as a simulation worker exception with severity 500.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalBatchError {
    message: String,
    error_code: &'static str,
    severity: &'static str,
}

#[derive(Serialize)]
struct FatalReport<'a> {
    message: &'a str,
    error_code: &'a str,
    severity: &'a str,
    timestamp: String,
}

impl FatalBatchError {
    /// Wrap a fault raised while dispatching or settling a batch
    pub fn from_fault(fault: &anyhow::Error) -> Self {
        FatalBatchError {
            message: format!("S3 writer exception: {:#}", fault),
            error_code: SIMULATION_WORKER_EXCEPTION,
            severity: EVENT_ERROR_CODE_500,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn error_code(&self) -> &str {
        self.error_code
    }

    pub fn severity(&self) -> &str {
        self.severity
    }

    /// Structured JSON record used by [`log_and_exit`]
    pub fn to_json(&self) -> String {
        let report = FatalReport {
            message: &self.message,
            error_code: self.error_code,
            severity: self.severity,
            timestamp: Utc::now().to_rfc3339(),
        };
        serde_json::to_string(&report).unwrap_or_else(|_| self.to_string())
    }
}

impl fmt::Display for FatalBatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}] {}", self.error_code, self.severity, self.message)
    }
}

impl std::error::Error for FatalBatchError {}

/// Log a fatal batch error and terminate the process
pub fn log_and_exit(err: &FatalBatchError) -> ! {
    error!("{}", err.to_json());
    std::process::exit(FATAL_EXIT_CODE)
}
