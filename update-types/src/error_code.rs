// SPDX-License-Identifier: GPL-3.0-only

//! Action exit codes
//!
//! An [`ActionExitCode`] is a base outcome ([`ExitKind`]) plus a set of
//! out-of-band [`ExitFlag`]s describing the system the outcome happened on.
//! On the wire (Omaha pings, logs from older agents) both are packed into a
//! single `u32`: the flags occupy the top four bits and the base value the
//! rest. [`ActionExitCode::from_raw`] accepts every `u32`.

use std::fmt;

use enumflags2::{BitFlags, bitflags};
use serde::{Deserialize, Serialize};

/// Raw values at or above this encode an HTTP response (`2000 + status`).
pub const HTTP_RESPONSE_BASE: u32 = 2000;

/// Bit positions reserved for [`ExitFlag`]s in the packed representation.
pub const SPECIAL_FLAGS_MASK: u32 = 0xF000_0000;

/// Base outcome of an action. Discriminants are the packed values and are
/// also the telemetry bucket indices, so they must stay contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Error = 1,
    OmahaRequestError = 2,
    OmahaResponseHandlerError = 3,
    FilesystemCopierError = 4,
    PostinstallRunnerError = 5,
    SetBootableFlagError = 6,
    InstallDeviceOpenError = 7,
    KernelDeviceOpenError = 8,
    DownloadTransferError = 9,
    PayloadHashMismatchError = 10,
    PayloadSizeMismatchError = 11,
    DownloadPayloadVerificationError = 12,
    DownloadNewPartitionInfoError = 13,
    DownloadWriteError = 14,
    NewRootfsVerificationError = 15,
    NewKernelVerificationError = 16,
    SignedDeltaPayloadExpectedError = 17,
    DownloadPayloadPubKeyVerificationError = 18,
    PostinstallBootedFromFirmwareB = 19,
    DownloadStateInitializationError = 20,
    DownloadInvalidMetadataMagicString = 21,
    DownloadSignatureMissingInManifest = 22,
    DownloadManifestParseError = 23,
    DownloadMetadataSignatureError = 24,
    DownloadMetadataSignatureVerificationError = 25,
    DownloadMetadataSignatureMismatch = 26,
    DownloadOperationHashVerificationError = 27,
    DownloadOperationExecutionError = 28,
    DownloadOperationHashMismatch = 29,
    OmahaRequestEmptyResponseError = 30,
    OmahaRequestXmlParseError = 31,
    DownloadInvalidMetadataSize = 32,
    DownloadInvalidMetadataSignature = 33,
    OmahaResponseInvalid = 34,
    OmahaUpdateIgnoredPerPolicy = 35,
    OmahaUpdateDeferredPerPolicy = 36,
    OmahaErrorInHttpResponse = 37,
    DownloadOperationHashMissingError = 38,
    DownloadMetadataSignatureMissingError = 39,
    OmahaUpdateDeferredForBackoff = 40,
    PostinstallPowerwashError = 41,
}

impl ErrorCode {
    /// Every base code, indexed by its packed value.
    pub const ALL: [ErrorCode; 42] = [
        ErrorCode::Success,
        ErrorCode::Error,
        ErrorCode::OmahaRequestError,
        ErrorCode::OmahaResponseHandlerError,
        ErrorCode::FilesystemCopierError,
        ErrorCode::PostinstallRunnerError,
        ErrorCode::SetBootableFlagError,
        ErrorCode::InstallDeviceOpenError,
        ErrorCode::KernelDeviceOpenError,
        ErrorCode::DownloadTransferError,
        ErrorCode::PayloadHashMismatchError,
        ErrorCode::PayloadSizeMismatchError,
        ErrorCode::DownloadPayloadVerificationError,
        ErrorCode::DownloadNewPartitionInfoError,
        ErrorCode::DownloadWriteError,
        ErrorCode::NewRootfsVerificationError,
        ErrorCode::NewKernelVerificationError,
        ErrorCode::SignedDeltaPayloadExpectedError,
        ErrorCode::DownloadPayloadPubKeyVerificationError,
        ErrorCode::PostinstallBootedFromFirmwareB,
        ErrorCode::DownloadStateInitializationError,
        ErrorCode::DownloadInvalidMetadataMagicString,
        ErrorCode::DownloadSignatureMissingInManifest,
        ErrorCode::DownloadManifestParseError,
        ErrorCode::DownloadMetadataSignatureError,
        ErrorCode::DownloadMetadataSignatureVerificationError,
        ErrorCode::DownloadMetadataSignatureMismatch,
        ErrorCode::DownloadOperationHashVerificationError,
        ErrorCode::DownloadOperationExecutionError,
        ErrorCode::DownloadOperationHashMismatch,
        ErrorCode::OmahaRequestEmptyResponseError,
        ErrorCode::OmahaRequestXmlParseError,
        ErrorCode::DownloadInvalidMetadataSize,
        ErrorCode::DownloadInvalidMetadataSignature,
        ErrorCode::OmahaResponseInvalid,
        ErrorCode::OmahaUpdateIgnoredPerPolicy,
        ErrorCode::OmahaUpdateDeferredPerPolicy,
        ErrorCode::OmahaErrorInHttpResponse,
        ErrorCode::DownloadOperationHashMissingError,
        ErrorCode::DownloadMetadataSignatureMissingError,
        ErrorCode::OmahaUpdateDeferredForBackoff,
        ErrorCode::PostinstallPowerwashError,
    ];

    /// Number of telemetry buckets (one per base code).
    pub const UMA_REPORTED_MAX: u32 = Self::ALL.len() as u32;

    pub fn from_repr(value: u32) -> Option<Self> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Self::ALL.get(index))
            .copied()
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Error => "Error",
            Self::OmahaRequestError => "OmahaRequestError",
            Self::OmahaResponseHandlerError => "OmahaResponseHandlerError",
            Self::FilesystemCopierError => "FilesystemCopierError",
            Self::PostinstallRunnerError => "PostinstallRunnerError",
            Self::SetBootableFlagError => "SetBootableFlagError",
            Self::InstallDeviceOpenError => "InstallDeviceOpenError",
            Self::KernelDeviceOpenError => "KernelDeviceOpenError",
            Self::DownloadTransferError => "DownloadTransferError",
            Self::PayloadHashMismatchError => "PayloadHashMismatchError",
            Self::PayloadSizeMismatchError => "PayloadSizeMismatchError",
            Self::DownloadPayloadVerificationError => "DownloadPayloadVerificationError",
            Self::DownloadNewPartitionInfoError => "DownloadNewPartitionInfoError",
            Self::DownloadWriteError => "DownloadWriteError",
            Self::NewRootfsVerificationError => "NewRootfsVerificationError",
            Self::NewKernelVerificationError => "NewKernelVerificationError",
            Self::SignedDeltaPayloadExpectedError => "SignedDeltaPayloadExpectedError",
            Self::DownloadPayloadPubKeyVerificationError => {
                "DownloadPayloadPubKeyVerificationError"
            }
            Self::PostinstallBootedFromFirmwareB => "PostinstallBootedFromFirmwareB",
            Self::DownloadStateInitializationError => "DownloadStateInitializationError",
            Self::DownloadInvalidMetadataMagicString => "DownloadInvalidMetadataMagicString",
            Self::DownloadSignatureMissingInManifest => "DownloadSignatureMissingInManifest",
            Self::DownloadManifestParseError => "DownloadManifestParseError",
            Self::DownloadMetadataSignatureError => "DownloadMetadataSignatureError",
            Self::DownloadMetadataSignatureVerificationError => {
                "DownloadMetadataSignatureVerificationError"
            }
            Self::DownloadMetadataSignatureMismatch => "DownloadMetadataSignatureMismatch",
            Self::DownloadOperationHashVerificationError => {
                "DownloadOperationHashVerificationError"
            }
            Self::DownloadOperationExecutionError => "DownloadOperationExecutionError",
            Self::DownloadOperationHashMismatch => "DownloadOperationHashMismatch",
            Self::OmahaRequestEmptyResponseError => "OmahaRequestEmptyResponseError",
            Self::OmahaRequestXmlParseError => "OmahaRequestXmlParseError",
            Self::DownloadInvalidMetadataSize => "DownloadInvalidMetadataSize",
            Self::DownloadInvalidMetadataSignature => "DownloadInvalidMetadataSignature",
            Self::OmahaResponseInvalid => "OmahaResponseInvalid",
            Self::OmahaUpdateIgnoredPerPolicy => "OmahaUpdateIgnoredPerPolicy",
            Self::OmahaUpdateDeferredPerPolicy => "OmahaUpdateDeferredPerPolicy",
            Self::OmahaErrorInHttpResponse => "OmahaErrorInHttpResponse",
            Self::DownloadOperationHashMissingError => "DownloadOperationHashMissingError",
            Self::DownloadMetadataSignatureMissingError => {
                "DownloadMetadataSignatureMissingError"
            }
            Self::OmahaUpdateDeferredForBackoff => "OmahaUpdateDeferredForBackoff",
            Self::PostinstallPowerwashError => "PostinstallPowerwashError",
        }
    }
}

/// Context attached to an exit code about the system it was produced on.
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitFlag {
    /// Devserver or Omaha sandbox in use.
    TestOmahaUrl = 1 << 28,
    /// Running a dev/test image rather than an MP-signed one.
    TestImage = 1 << 29,
    /// The attempt resumed an interrupted update.
    Resumed = 1 << 30,
    /// Boot mode is not normal.
    DevMode = 1 << 31,
}

impl ExitFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TestOmahaUrl => "TestOmahaUrl",
            Self::TestImage => "TestImage",
            Self::Resumed => "Resumed",
            Self::DevMode => "DevMode",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ExitKind {
    Known(ErrorCode),
    /// HTTP status returned by the update server.
    HttpResponse(u32),
    /// Base value outside the known enumeration and below the HTTP range.
    Unrecognized(u32),
}

/// Outcome of an action together with its context flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionExitCode {
    pub kind: ExitKind,
    pub flags: BitFlags<ExitFlag>,
}

impl ActionExitCode {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            kind: ExitKind::Known(code),
            flags: BitFlags::empty(),
        }
    }

    pub fn http_response(status: u32) -> Self {
        Self {
            kind: ExitKind::HttpResponse(status),
            flags: BitFlags::empty(),
        }
    }

    pub fn with_flags(mut self, flags: impl Into<BitFlags<ExitFlag>>) -> Self {
        self.flags |= flags.into();
        self
    }

    /// Unpack a raw code. Never fails: values that name nothing become
    /// [`ExitKind::Unrecognized`].
    pub fn from_raw(raw: u32) -> Self {
        let flags = BitFlags::<ExitFlag>::from_bits_truncate(raw);
        let base = raw & !SPECIAL_FLAGS_MASK;

        let kind = match ErrorCode::from_repr(base) {
            Some(code) => ExitKind::Known(code),
            None if base >= HTTP_RESPONSE_BASE => ExitKind::HttpResponse(base - HTTP_RESPONSE_BASE),
            None => ExitKind::Unrecognized(base),
        };

        Self { kind, flags }
    }

    pub fn to_raw(self) -> u32 {
        let base = match self.kind {
            ExitKind::Known(code) => code.as_u32(),
            ExitKind::HttpResponse(status) => HTTP_RESPONSE_BASE.saturating_add(status),
            ExitKind::Unrecognized(value) => value,
        };
        (base & !SPECIAL_FLAGS_MASK) | self.flags.bits()
    }

    /// Base code this outcome is bucketed under.
    pub fn base(self) -> ErrorCode {
        match self.kind {
            ExitKind::Known(code) => code,
            // All HTTP failures share one bucket to keep the enum small.
            ExitKind::HttpResponse(_) => ErrorCode::OmahaErrorInHttpResponse,
            ExitKind::Unrecognized(_) => ErrorCode::Error,
        }
    }

    pub fn is_success(self) -> bool {
        self.kind == ExitKind::Known(ErrorCode::Success)
    }
}

impl Default for ActionExitCode {
    fn default() -> Self {
        Self::new(ErrorCode::Error)
    }
}

impl From<ErrorCode> for ActionExitCode {
    fn from(code: ErrorCode) -> Self {
        Self::new(code)
    }
}

impl fmt::Display for ActionExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&code_to_string(*self))
    }
}

/// Strip the flags and fold every value into a known bucket.
///
/// Idempotent: feeding the result back in returns it unchanged.
pub fn base_error_code(code: ActionExitCode) -> ActionExitCode {
    ActionExitCode::new(code.base())
}

/// Stable label for logs, e.g. `DownloadWriteError [Resumed]`.
pub fn code_to_string(code: ActionExitCode) -> String {
    let mut label = match code.kind {
        ExitKind::Known(base) => base.as_str().to_string(),
        ExitKind::HttpResponse(status) => format!("OmahaRequestHttpResponse({status})"),
        ExitKind::Unrecognized(value) => format!("Unknown error: {value}"),
    };

    if !code.flags.is_empty() {
        let names: Vec<&str> = code.flags.iter().map(ExitFlag::as_str).collect();
        label.push_str(&format!(" [{}]", names.join(", ")));
    }

    label
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[u32] = &[
        0,
        1,
        14,
        37,
        41,
        42,
        500,
        1999,
        2000,
        2404,
        0x0FFF_FFFF,
        0x4000_000E,
        0x8000_0000,
        0xC000_07D0,
        u32::MAX,
    ];

    #[test]
    fn all_is_indexed_by_discriminant() {
        for (index, code) in ErrorCode::ALL.iter().enumerate() {
            assert_eq!(code.as_u32() as usize, index);
        }
        assert_eq!(ErrorCode::UMA_REPORTED_MAX, 42);
    }

    #[test]
    fn flag_mask_covers_every_flag() {
        assert_eq!(BitFlags::<ExitFlag>::all().bits(), SPECIAL_FLAGS_MASK);
    }

    #[test]
    fn base_error_code_is_idempotent_and_total() {
        for &raw in SAMPLES {
            let once = base_error_code(ActionExitCode::from_raw(raw));
            assert!(once.flags.is_empty(), "flags left on {raw:#x}");
            assert!(matches!(once.kind, ExitKind::Known(_)), "unmapped {raw:#x}");
            assert_eq!(base_error_code(once), once);
        }
    }

    #[test]
    fn http_range_collapses_into_one_bucket() {
        let code = ActionExitCode::from_raw(HTTP_RESPONSE_BASE + 404);
        assert_eq!(code.kind, ExitKind::HttpResponse(404));
        assert_eq!(
            base_error_code(code),
            ActionExitCode::new(ErrorCode::OmahaErrorInHttpResponse)
        );
    }

    #[test]
    fn gap_values_collapse_to_generic_error() {
        let code = ActionExitCode::from_raw(500);
        assert_eq!(code.kind, ExitKind::Unrecognized(500));
        assert_eq!(base_error_code(code).base(), ErrorCode::Error);
    }

    #[test]
    fn raw_form_keeps_flags_and_base() {
        let code = ActionExitCode::new(ErrorCode::DownloadWriteError)
            .with_flags(ExitFlag::Resumed | ExitFlag::DevMode);
        assert_eq!(code.to_raw(), 0xC000_000E);
        assert_eq!(ActionExitCode::from_raw(0xC000_000E), code);
    }

    #[test]
    fn renders_labels_with_flag_suffix() {
        assert_eq!(
            code_to_string(ErrorCode::DownloadWriteError.into()),
            "DownloadWriteError"
        );
        assert_eq!(
            code_to_string(ActionExitCode::from_raw(0xC000_000E)),
            "DownloadWriteError [Resumed, DevMode]"
        );
        assert_eq!(
            code_to_string(ActionExitCode::from_raw(2503)),
            "OmahaRequestHttpResponse(503)"
        );
        assert_eq!(code_to_string(ActionExitCode::from_raw(77)), "Unknown error: 77");
    }

    #[test]
    fn exit_code_roundtrips_through_json() {
        let code = ActionExitCode::http_response(500).with_flags(ExitFlag::TestImage);
        let json = serde_json::to_string(&code).expect("serialize exit code");
        let parsed: ActionExitCode = serde_json::from_str(&json).expect("deserialize exit code");
        assert_eq!(parsed, code);
    }
}
