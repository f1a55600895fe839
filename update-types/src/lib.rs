// SPDX-License-Identifier: GPL-3.0-only

//! Canonical data models for the update agent utility layer
//!
//! - `ActionExitCode` → outcome of an update action plus context flags
//! - `FilesystemSize` → geometry of an ext2-family filesystem
//!
//! Normalization of exit codes for telemetry lives here too, since it is a
//! pure function of the model.

pub mod error_code;
pub mod filesystem;

pub use error_code::{
    ActionExitCode, ErrorCode, ExitFlag, ExitKind, HTTP_RESPONSE_BASE, SPECIAL_FLAGS_MASK,
    base_error_code, code_to_string,
};
pub use filesystem::FilesystemSize;
