//! # llm_gpu_discovery: GPU vendor runtime probing for LLM inference
//!
//! Loads vendor GPU runtimes (CUDA, ROCm HIP, MUSA) at run time, without
//! linking against any vendor SDK, and reports how many devices each one
//! drives, their properties and their free memory.
//!
//! ## Features
//!
//! * One adapter per CUDA-runtime-shaped vendor library, selected by path at run time
//! * Vendor status codes classified as unavailable, misuse, device fault or transient
//! * Devices that fault are fenced off until explicitly reset
//! * Multi-vendor discovery with optional per-vendor threads and a deadline
//! * Host CPU and RAM fallback
//! * Logging tools

// Internal modules
mod binding;
mod discovery;
mod error;
mod ffi;
mod handle;
mod host;
mod loader;
mod logging;
mod report;
mod status;
pub mod vendors;

// Internal imports
#[allow(unused_imports)]
use anyhow::{anyhow, bail, Error, Result};
#[allow(unused_imports)]
use tracing::{debug, error, info, span, trace, warn, Level};

// Public exports
pub use self::{
    binding::VendorRuntime,
    discovery::{
        DeviceFailure, DiscoveredDevice, DiscoveryReport, ProbeConfig, VendorCandidate,
        VendorOutcome, VendorReport,
    },
    error::{ProbeError, ProbeResult},
    ffi::{
        RawDeviceProp, RawHipDevicePropHead, RawProperties, RawStatus, RawUuid,
        PROPERTIES_BUFFER_BYTES, STATUS_SUCCESS,
    },
    handle::{InitResult, Initialized, VendorHandle},
    host::HostReport,
    loader::{DynamicLoader, LibraryHandle, LoaderError, SystemLoader},
    logging::{i_ln, i_nln, i_nlns, LoggingConfig, LoggingConfigTrait},
    report::{DeviceProperties, DriverVersion, MemoryReport, TextureLimits},
    status::{ClassifiedStatus, StatusClass},
    vendors::{DeviceAttribute, PropertiesAbi, SymbolNames, Vendor, VendorSpec},
};
