// SPDX-License-Identifier: GPL-3.0-only

use enumflags2::BitFlags;
use update_types::ExitFlag;

use crate::MetricsError;

/// Enumerated-histogram sink.
pub trait MetricsLibrary: Send + Sync {
    /// Record `sample` in the enum histogram `name` with `max` buckets.
    fn send_enum_to_uma(&self, name: &str, sample: u32, max: u32) -> Result<(), MetricsError>;
}

/// Process-wide context handed to telemetry reporting.
///
/// Built once by the update agent and passed explicitly to the calls that
/// need it.
pub trait SystemState: Send + Sync {
    fn metrics_lib(&self) -> &dyn MetricsLibrary;

    /// Flags describing the current update attempt (boot mode, resume, test
    /// image, test server).
    fn error_code_flags(&self) -> BitFlags<ExitFlag>;
}
