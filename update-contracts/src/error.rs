// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

/// Failure reported by a telemetry sink
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricsError {
    #[error("metrics sink unavailable: {0}")]
    Unavailable(String),

    #[error("sample {sample} out of range for {name} (max {max})")]
    OutOfRange { name: String, sample: u32, max: u32 },

    #[error("failed to send {name}: {reason}")]
    SendFailed { name: String, reason: String },
}
