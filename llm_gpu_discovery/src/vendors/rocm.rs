//! AMD ROCm HIP runtime (`libamdhip64`).

use super::{
    catalog::{attribute_catalog, status_catalog},
    DeviceAttribute, PropertiesAbi, SymbolNames, Vendor, VendorSpec,
};
use crate::report::DriverVersion;

pub static ROCM: VendorSpec = VendorSpec {
    vendor: Vendor::Rocm,
    name: "ROCm",
    symbols: SymbolNames {
        set_device: "hipSetDevice",
        device_synchronize: "hipDeviceSynchronize",
        device_reset: "hipDeviceReset",
        mem_get_info: "hipMemGetInfo",
        get_device_count: "hipGetDeviceCount",
        device_get_attribute: "hipDeviceGetAttribute",
        driver_get_version: "hipDriverGetVersion",
        get_device_properties: "hipGetDeviceProperties",
    },
    default_libraries: &["libamdhip64.so", "libamdhip64.so.6", "libamdhip64.so.5"],
    properties_abi: PropertiesAbi::HipLegacy,
    lookup_status: HipError::lookup,
    empty_statuses: &[HipError::NoDevice as i32, HipError::InsufficientDriver as i32],
    attribute_code,
    decode_driver_version: decode_hip_version,
};

status_catalog! {
    /// `hipError_t`.
    pub enum HipError {
        Success = 0 => Success,
        InvalidValue = 1 => Misuse,
        OutOfMemory = 2 => Unavailable,
        NotInitialized = 3 => Unavailable,
        Deinitialized = 4 => Unavailable,
        ProfilerDisabled = 5 => Unavailable,
        ProfilerNotInitialized = 6 => Misuse,
        ProfilerAlreadyStarted = 7 => Misuse,
        ProfilerAlreadyStopped = 8 => Misuse,
        InvalidConfiguration = 9 => Misuse,
        InvalidPitchValue = 12 => Misuse,
        InvalidSymbol = 13 => Misuse,
        InvalidDevicePointer = 17 => Misuse,
        InvalidMemcpyDirection = 21 => Misuse,
        InsufficientDriver = 35 => Unavailable,
        MissingConfiguration = 52 => Misuse,
        PriorLaunchFailure = 53 => DeviceFault,
        InvalidDeviceFunction = 98 => Misuse,
        NoDevice = 100 => Unavailable,
        InvalidDevice = 101 => Misuse,
        InvalidImage = 200 => Misuse,
        InvalidContext = 201 => Misuse,
        ContextAlreadyCurrent = 202 => Misuse,
        MapFailed = 205 => Misuse,
        UnmapFailed = 206 => Misuse,
        ArrayIsMapped = 207 => Misuse,
        AlreadyMapped = 208 => Misuse,
        NoBinaryForGpu = 209 => Unavailable,
        AlreadyAcquired = 210 => Misuse,
        NotMapped = 211 => Misuse,
        NotMappedAsArray = 212 => Misuse,
        NotMappedAsPointer = 213 => Misuse,
        ECCNotCorrectable = 214 => DeviceFault,
        UnsupportedLimit = 215 => Misuse,
        ContextAlreadyInUse = 216 => Unavailable,
        PeerAccessUnsupported = 217 => Misuse,
        InvalidKernelFile = 218 => Misuse,
        InvalidGraphicsContext = 219 => Misuse,
        InvalidSource = 300 => Misuse,
        FileNotFound = 301 => Unavailable,
        SharedObjectSymbolNotFound = 302 => Unavailable,
        SharedObjectInitFailed = 303 => Unavailable,
        OperatingSystem = 304 => Unavailable,
        InvalidHandle = 400 => Misuse,
        IllegalState = 401 => Misuse,
        NotFound = 500 => Misuse,
        NotReady = 600 => Transient,
        IllegalAddress = 700 => DeviceFault,
        LaunchOutOfResources = 701 => Misuse,
        LaunchTimeOut = 702 => DeviceFault,
        PeerAccessAlreadyEnabled = 704 => Misuse,
        PeerAccessNotEnabled = 705 => Misuse,
        SetOnActiveProcess = 708 => Misuse,
        ContextIsDestroyed = 709 => Misuse,
        Assert = 710 => DeviceFault,
        HostMemoryAlreadyRegistered = 712 => Misuse,
        HostMemoryNotRegistered = 713 => Misuse,
        LaunchFailure = 719 => DeviceFault,
        CooperativeLaunchTooLarge = 720 => Misuse,
        NotSupported = 801 => Unavailable,
        StreamCaptureUnsupported = 900 => Misuse,
        StreamCaptureInvalidated = 901 => Misuse,
        StreamCaptureMerge = 902 => Misuse,
        StreamCaptureUnmatched = 903 => Misuse,
        StreamCaptureUnjoined = 904 => Misuse,
        StreamCaptureIsolation = 905 => Misuse,
        StreamCaptureImplicit = 906 => Misuse,
        CapturedEvent = 907 => Misuse,
        StreamCaptureWrongThread = 908 => Misuse,
        GraphExecUpdateFailure = 910 => Misuse,
        Unknown = 999 => Unavailable,
        RuntimeMemory = 1052 => Unavailable,
        RuntimeOther = 1053 => Unavailable,
    }
}

attribute_catalog! {
    /// The subset of `hipDeviceAttribute_t` the probe reads.
    ///
    /// HIP numbers its attributes alphabetically, unlike CUDA.
    pub enum HipDeviceAttr {
        EccEnabled = 0,
        ClockRate = 5,
        ConcurrentKernels = 8,
        CooperativeLaunch = 10,
        Integrated = 16,
        L2CacheSize = 19,
        ComputeCapabilityMajor = 23,
        ManagedMemory = 24,
        MaxBlockDimX = 26,
        MaxBlockDimY = 27,
        MaxBlockDimZ = 28,
        MaxGridDimX = 29,
        MaxGridDimY = 30,
        MaxGridDimZ = 31,
        MaxThreadsPerBlock = 56,
        MaxThreadsPerMultiProcessor = 57,
        MemoryBusWidth = 59,
        MemoryClockRate = 60,
        ComputeCapabilityMinor = 61,
        MultiprocessorCount = 63,
        PciBusId = 67,
        PciDeviceId = 68,
        PciDomainId = 69,
    }
}

fn attribute_code(attribute: DeviceAttribute) -> Option<i32> {
    let attr = match attribute {
        DeviceAttribute::MaxThreadsPerBlock => HipDeviceAttr::MaxThreadsPerBlock,
        DeviceAttribute::MaxBlockDimX => HipDeviceAttr::MaxBlockDimX,
        DeviceAttribute::MaxBlockDimY => HipDeviceAttr::MaxBlockDimY,
        DeviceAttribute::MaxBlockDimZ => HipDeviceAttr::MaxBlockDimZ,
        DeviceAttribute::MaxGridDimX => HipDeviceAttr::MaxGridDimX,
        DeviceAttribute::MaxGridDimY => HipDeviceAttr::MaxGridDimY,
        DeviceAttribute::MaxGridDimZ => HipDeviceAttr::MaxGridDimZ,
        DeviceAttribute::ClockRate => HipDeviceAttr::ClockRate,
        DeviceAttribute::MultiProcessorCount => HipDeviceAttr::MultiprocessorCount,
        DeviceAttribute::Integrated => HipDeviceAttr::Integrated,
        DeviceAttribute::ConcurrentKernels => HipDeviceAttr::ConcurrentKernels,
        DeviceAttribute::EccEnabled => HipDeviceAttr::EccEnabled,
        DeviceAttribute::PciBusId => HipDeviceAttr::PciBusId,
        DeviceAttribute::PciDeviceId => HipDeviceAttr::PciDeviceId,
        DeviceAttribute::PciDomainId => HipDeviceAttr::PciDomainId,
        DeviceAttribute::MemoryClockRate => HipDeviceAttr::MemoryClockRate,
        DeviceAttribute::GlobalMemoryBusWidth => HipDeviceAttr::MemoryBusWidth,
        DeviceAttribute::L2CacheSize => HipDeviceAttr::L2CacheSize,
        DeviceAttribute::MaxThreadsPerMultiProcessor => HipDeviceAttr::MaxThreadsPerMultiProcessor,
        DeviceAttribute::ComputeCapabilityMajor => HipDeviceAttr::ComputeCapabilityMajor,
        DeviceAttribute::ComputeCapabilityMinor => HipDeviceAttr::ComputeCapabilityMinor,
        DeviceAttribute::ManagedMemory => HipDeviceAttr::ManagedMemory,
        DeviceAttribute::CooperativeLaunch => HipDeviceAttr::CooperativeLaunch,
        // Read from the properties head instead.
        DeviceAttribute::MaxSharedMemoryPerBlock | DeviceAttribute::WarpSize => return None,
    };
    Some(attr.code())
}

/// `major * 10_000_000 + minor * 100_000 + patch`.
fn decode_hip_version(raw: i32) -> DriverVersion {
    if raw <= 0 {
        return DriverVersion::Unknown;
    }
    DriverVersion::Known {
        major: raw / 10_000_000,
        minor: (raw / 100_000) % 100,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusClass;

    #[test]
    fn test_decode_hip_version() {
        assert_eq!(
            decode_hip_version(60_140_092),
            DriverVersion::Known { major: 6, minor: 1 }
        );
        assert_eq!(decode_hip_version(0), DriverVersion::Unknown);
    }

    #[test]
    fn test_classification() {
        assert_eq!(ROCM.classify(100).class, StatusClass::Unavailable);
        assert_eq!(ROCM.classify(700).class, StatusClass::DeviceFault);
        assert_eq!(ROCM.classify(600).class, StatusClass::Transient);
        assert_eq!(ROCM.classify(1053).name, "RuntimeOther");
    }

    #[test]
    fn test_unmapped_attributes() {
        assert_eq!(ROCM.attribute_code(DeviceAttribute::WarpSize), None);
        assert_eq!(
            ROCM.attribute_code(DeviceAttribute::GlobalMemoryBusWidth),
            Some(59)
        );
    }
}
