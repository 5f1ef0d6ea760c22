//! Errors returned by the probe and their place in the status taxonomy.

use crate::{
    loader::LoaderError,
    status::{ClassifiedStatus, StatusClass},
};

#[derive(serde::Serialize, Debug, Clone, thiserror::Error)]
pub enum ProbeError {
    /// The vendor runtime library could not be loaded at all.
    #[error("{vendor} runtime not loadable from '{path}': {source}")]
    LibraryLoad {
        vendor: &'static str,
        path: std::path::PathBuf,
        #[source]
        source: LoaderError,
    },

    /// The library loaded but lacks a required entry point.
    #[error("{vendor} runtime at '{path}' is missing required symbol '{symbol}'")]
    MissingSymbol {
        vendor: &'static str,
        path: std::path::PathBuf,
        symbol: &'static str,
    },

    /// A vendor call returned a non-success status.
    #[error("{operation} failed: {status}")]
    Vendor {
        operation: &'static str,
        status: ClassifiedStatus,
    },

    /// The device index is not within `[0, device_count)`.
    #[error("{vendor} device index {index} out of range (device count {device_count})")]
    DeviceOutOfRange {
        vendor: &'static str,
        index: u32,
        device_count: u32,
    },

    /// The device previously faulted and is not called again until reset.
    #[error("{vendor} device {index} is unusable after an earlier fault: {status}")]
    DeviceUnusable {
        vendor: &'static str,
        index: u32,
        status: ClassifiedStatus,
    },

    #[error("{vendor} runtime has no attribute {attribute}")]
    AttributeUnsupported {
        vendor: &'static str,
        attribute: &'static str,
    },

    #[error("{vendor} runtime reported a negative device count ({count})")]
    NegativeDeviceCount { vendor: &'static str, count: i32 },

    /// The vendor reported more free than total memory.
    #[error("{vendor} device {index} reported free {free} bytes above total {total} bytes")]
    InconsistentMemory {
        vendor: &'static str,
        index: u32,
        free: u64,
        total: u64,
    },
}

pub type ProbeResult<T> = std::result::Result<T, ProbeError>;

impl ProbeError {
    /// Where this error falls in the status taxonomy.
    pub fn class(&self) -> StatusClass {
        match self {
            ProbeError::LibraryLoad { .. } | ProbeError::MissingSymbol { .. } => {
                StatusClass::Unavailable
            }
            ProbeError::Vendor { status, .. } | ProbeError::DeviceUnusable { status, .. } => {
                status.class
            }
            ProbeError::DeviceOutOfRange { .. }
            | ProbeError::AttributeUnsupported { .. }
            | ProbeError::NegativeDeviceCount { .. }
            | ProbeError::InconsistentMemory { .. } => StatusClass::Misuse,
        }
    }

    /// The vendor status behind this error, if any.
    pub fn status(&self) -> Option<&ClassifiedStatus> {
        match self {
            ProbeError::Vendor { status, .. } | ProbeError::DeviceUnusable { status, .. } => {
                Some(status)
            }
            _ => None,
        }
    }
}
