// SPDX-License-Identifier: GPL-3.0-only

//! Error code reporting to UMA

use enumflags2::BitFlags;
use tracing::{info, warn};
use update_contracts::SystemState;
use update_types::{ActionExitCode, ErrorCode, ExitFlag, base_error_code, code_to_string};

pub const NORMAL_ERROR_CODES_METRIC: &str = "Installer.NormalErrorCodes";
pub const DEV_MODE_ERROR_CODES_METRIC: &str = "Installer.DevModeErrorCodes";

/// Histogram an error code with `flags` belongs to. Resuming is normal on
/// production devices, so that flag alone keeps the normal bucket.
pub fn uma_metric_for_flags(flags: BitFlags<ExitFlag>) -> &'static str {
    let mut significant = flags;
    significant.remove(ExitFlag::Resumed);
    if significant.is_empty() {
        NORMAL_ERROR_CODES_METRIC
    } else {
        DEV_MODE_ERROR_CODES_METRIC
    }
}

/// Record `code` in the error code histogram selected by the current attempt.
///
/// Flags carried by `code` win; otherwise the attempt's flags are taken from
/// `system`. Sink failures are logged and dropped.
pub fn send_error_code_to_uma(system: &dyn SystemState, code: ActionExitCode) {
    let uma_code = base_error_code(code);

    let flags = if code.flags.is_empty() {
        system.error_code_flags()
    } else {
        code.flags
    };
    let metric = uma_metric_for_flags(flags);
    let sample = uma_code.base().as_u32();

    info!(
        "Sending error code {} ({}) to UMA metric: {}. Flags = {:#x}",
        sample,
        code_to_string(uma_code),
        metric,
        flags.bits()
    );

    if let Err(e) =
        system
            .metrics_lib()
            .send_enum_to_uma(metric, sample, ErrorCode::UMA_REPORTED_MAX)
    {
        warn!("Failed to send error code to {}: {}", metric, e);
    }
}
