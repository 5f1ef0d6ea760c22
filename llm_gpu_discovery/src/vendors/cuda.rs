//! NVIDIA CUDA runtime (`libcudart`).

use super::{
    catalog::{attribute_catalog, status_catalog},
    decode_thousands_version, DeviceAttribute, PropertiesAbi, SymbolNames, Vendor, VendorSpec,
};

pub static CUDA: VendorSpec = VendorSpec {
    vendor: Vendor::Cuda,
    name: "CUDA",
    symbols: SymbolNames {
        set_device: "cudaSetDevice",
        device_synchronize: "cudaDeviceSynchronize",
        device_reset: "cudaDeviceReset",
        mem_get_info: "cudaMemGetInfo",
        get_device_count: "cudaGetDeviceCount",
        device_get_attribute: "cudaDeviceGetAttribute",
        driver_get_version: "cudaDriverGetVersion",
        get_device_properties: "cudaGetDeviceProperties",
    },
    default_libraries: &["libcudart.so", "libcudart.so.12", "libcudart.so.11.0", "cudart64_12.dll"],
    // cudaDeviceProp changed shape in 12.0; only the shared head is read.
    properties_abi: PropertiesAbi::Prefix,
    lookup_status: CudaError::lookup,
    empty_statuses: &[CudaError::NoDevice as i32, CudaError::InsufficientDriver as i32],
    attribute_code,
    decode_driver_version: decode_thousands_version,
};

status_catalog! {
    /// `cudaError_t`.
    pub enum CudaError {
        Success = 0 => Success,
        InvalidValue = 1 => Misuse,
        MemoryAllocation = 2 => Unavailable,
        InitializationError = 3 => Unavailable,
        CudartUnloading = 4 => Unavailable,
        ProfilerDisabled = 5 => Unavailable,
        ProfilerNotInitialized = 6 => Misuse,
        ProfilerAlreadyStarted = 7 => Misuse,
        ProfilerAlreadyStopped = 8 => Misuse,
        InvalidConfiguration = 9 => Misuse,
        InvalidPitchValue = 12 => Misuse,
        InvalidSymbol = 13 => Misuse,
        InvalidHostPointer = 16 => Misuse,
        InvalidDevicePointer = 17 => Misuse,
        InvalidTexture = 18 => Misuse,
        InvalidTextureBinding = 19 => Misuse,
        InvalidChannelDescriptor = 20 => Misuse,
        InvalidMemcpyDirection = 21 => Misuse,
        AddressOfConstant = 22 => Misuse,
        TextureFetchFailed = 23 => Misuse,
        TextureNotBound = 24 => Misuse,
        SynchronizationError = 25 => DeviceFault,
        InvalidFilterSetting = 26 => Misuse,
        InvalidNormSetting = 27 => Misuse,
        MixedDeviceExecution = 28 => Misuse,
        NotYetImplemented = 31 => Misuse,
        MemoryValueTooLarge = 32 => Misuse,
        StubLibrary = 34 => Unavailable,
        InsufficientDriver = 35 => Unavailable,
        CallRequiresNewerDriver = 36 => Unavailable,
        InvalidSurface = 37 => Misuse,
        DuplicateVariableName = 43 => Misuse,
        DuplicateTextureName = 44 => Misuse,
        DuplicateSurfaceName = 45 => Misuse,
        DevicesUnavailable = 46 => Unavailable,
        IncompatibleDriverContext = 49 => Unavailable,
        MissingConfiguration = 52 => Misuse,
        PriorLaunchFailure = 53 => DeviceFault,
        LaunchMaxDepthExceeded = 65 => Misuse,
        LaunchFileScopedTex = 66 => Misuse,
        LaunchFileScopedSurf = 67 => Misuse,
        SyncDepthExceeded = 68 => Misuse,
        LaunchPendingCountExceeded = 69 => Misuse,
        InvalidDeviceFunction = 98 => Misuse,
        NoDevice = 100 => Unavailable,
        InvalidDevice = 101 => Misuse,
        DeviceNotLicensed = 102 => Unavailable,
        SoftwareValidityNotEstablished = 103 => Unavailable,
        StartupFailure = 127 => Unavailable,
        InvalidKernelImage = 200 => Misuse,
        DeviceUninitialized = 201 => Misuse,
        MapBufferObjectFailed = 205 => Misuse,
        UnmapBufferObjectFailed = 206 => Misuse,
        ArrayIsMapped = 207 => Misuse,
        AlreadyMapped = 208 => Misuse,
        NoKernelImageForDevice = 209 => Unavailable,
        AlreadyAcquired = 210 => Misuse,
        NotMapped = 211 => Misuse,
        NotMappedAsArray = 212 => Misuse,
        NotMappedAsPointer = 213 => Misuse,
        ECCUncorrectable = 214 => DeviceFault,
        UnsupportedLimit = 215 => Misuse,
        DeviceAlreadyInUse = 216 => Unavailable,
        PeerAccessUnsupported = 217 => Misuse,
        InvalidPtx = 218 => Misuse,
        InvalidGraphicsContext = 219 => Misuse,
        NvlinkUncorrectable = 220 => DeviceFault,
        JitCompilerNotFound = 221 => Unavailable,
        UnsupportedPtxVersion = 222 => Unavailable,
        JitCompilationDisabled = 223 => Unavailable,
        UnsupportedExecAffinity = 224 => Unavailable,
        UnsupportedDevSideSync = 225 => Misuse,
        InvalidSource = 300 => Misuse,
        FileNotFound = 301 => Unavailable,
        SharedObjectSymbolNotFound = 302 => Unavailable,
        SharedObjectInitFailed = 303 => Unavailable,
        OperatingSystem = 304 => Unavailable,
        InvalidResourceHandle = 400 => Misuse,
        IllegalState = 401 => Misuse,
        LossyQuery = 402 => Misuse,
        SymbolNotFound = 500 => Misuse,
        NotReady = 600 => Transient,
        IllegalAddress = 700 => DeviceFault,
        LaunchOutOfResources = 701 => Misuse,
        LaunchTimeout = 702 => DeviceFault,
        LaunchIncompatibleTexturing = 703 => Misuse,
        PeerAccessAlreadyEnabled = 704 => Misuse,
        PeerAccessNotEnabled = 705 => Misuse,
        SetOnActiveProcess = 708 => Misuse,
        ContextIsDestroyed = 709 => Misuse,
        Assert = 710 => DeviceFault,
        TooManyPeers = 711 => Misuse,
        HostMemoryAlreadyRegistered = 712 => Misuse,
        HostMemoryNotRegistered = 713 => Misuse,
        HardwareStackError = 714 => DeviceFault,
        IllegalInstruction = 715 => DeviceFault,
        MisalignedAddress = 716 => DeviceFault,
        InvalidAddressSpace = 717 => DeviceFault,
        InvalidPc = 718 => DeviceFault,
        LaunchFailure = 719 => DeviceFault,
        CooperativeLaunchTooLarge = 720 => Misuse,
        NotPermitted = 800 => Unavailable,
        NotSupported = 801 => Unavailable,
        SystemNotReady = 802 => Unavailable,
        SystemDriverMismatch = 803 => Unavailable,
        CompatNotSupportedOnDevice = 804 => Unavailable,
        MpsConnectionFailed = 805 => Unavailable,
        MpsRpcFailure = 806 => Unavailable,
        MpsServerNotReady = 807 => Unavailable,
        MpsMaxClientsReached = 808 => Unavailable,
        MpsMaxConnectionsReached = 809 => Unavailable,
        MpsClientTerminated = 810 => Unavailable,
        CdpNotSupported = 811 => Unavailable,
        CdpVersionMismatch = 812 => Unavailable,
        StreamCaptureUnsupported = 900 => Misuse,
        StreamCaptureInvalidated = 901 => Misuse,
        StreamCaptureMerge = 902 => Misuse,
        StreamCaptureUnmatched = 903 => Misuse,
        StreamCaptureUnjoined = 904 => Misuse,
        StreamCaptureIsolation = 905 => Misuse,
        StreamCaptureImplicit = 906 => Misuse,
        CapturedEvent = 907 => Misuse,
        StreamCaptureWrongThread = 908 => Misuse,
        Timeout = 909 => Transient,
        GraphExecUpdateFailure = 910 => Misuse,
        ExternalDevice = 911 => DeviceFault,
        InvalidClusterSize = 912 => Misuse,
        Unknown = 999 => Unavailable,
        ApiFailureBase = 10000 => Unavailable,
    }
}

attribute_catalog! {
    /// The subset of `cudaDeviceAttr` the probe reads.
    pub enum CudaDeviceAttr {
        MaxThreadsPerBlock = 1,
        MaxBlockDimX = 2,
        MaxBlockDimY = 3,
        MaxBlockDimZ = 4,
        MaxGridDimX = 5,
        MaxGridDimY = 6,
        MaxGridDimZ = 7,
        MaxSharedMemoryPerBlock = 8,
        WarpSize = 10,
        ClockRate = 13,
        MultiProcessorCount = 16,
        Integrated = 18,
        ConcurrentKernels = 31,
        EccEnabled = 32,
        PciBusId = 33,
        PciDeviceId = 34,
        MemoryClockRate = 36,
        GlobalMemoryBusWidth = 37,
        L2CacheSize = 38,
        MaxThreadsPerMultiProcessor = 39,
        PciDomainId = 50,
        ComputeCapabilityMajor = 75,
        ComputeCapabilityMinor = 76,
        ManagedMemory = 83,
        CooperativeLaunch = 95,
    }
}

fn attribute_code(attribute: DeviceAttribute) -> Option<i32> {
    let attr = match attribute {
        DeviceAttribute::MaxThreadsPerBlock => CudaDeviceAttr::MaxThreadsPerBlock,
        DeviceAttribute::MaxBlockDimX => CudaDeviceAttr::MaxBlockDimX,
        DeviceAttribute::MaxBlockDimY => CudaDeviceAttr::MaxBlockDimY,
        DeviceAttribute::MaxBlockDimZ => CudaDeviceAttr::MaxBlockDimZ,
        DeviceAttribute::MaxGridDimX => CudaDeviceAttr::MaxGridDimX,
        DeviceAttribute::MaxGridDimY => CudaDeviceAttr::MaxGridDimY,
        DeviceAttribute::MaxGridDimZ => CudaDeviceAttr::MaxGridDimZ,
        DeviceAttribute::MaxSharedMemoryPerBlock => CudaDeviceAttr::MaxSharedMemoryPerBlock,
        DeviceAttribute::WarpSize => CudaDeviceAttr::WarpSize,
        DeviceAttribute::ClockRate => CudaDeviceAttr::ClockRate,
        DeviceAttribute::MultiProcessorCount => CudaDeviceAttr::MultiProcessorCount,
        DeviceAttribute::Integrated => CudaDeviceAttr::Integrated,
        DeviceAttribute::ConcurrentKernels => CudaDeviceAttr::ConcurrentKernels,
        DeviceAttribute::EccEnabled => CudaDeviceAttr::EccEnabled,
        DeviceAttribute::PciBusId => CudaDeviceAttr::PciBusId,
        DeviceAttribute::PciDeviceId => CudaDeviceAttr::PciDeviceId,
        DeviceAttribute::PciDomainId => CudaDeviceAttr::PciDomainId,
        DeviceAttribute::MemoryClockRate => CudaDeviceAttr::MemoryClockRate,
        DeviceAttribute::GlobalMemoryBusWidth => CudaDeviceAttr::GlobalMemoryBusWidth,
        DeviceAttribute::L2CacheSize => CudaDeviceAttr::L2CacheSize,
        DeviceAttribute::MaxThreadsPerMultiProcessor => {
            CudaDeviceAttr::MaxThreadsPerMultiProcessor
        }
        DeviceAttribute::ComputeCapabilityMajor => CudaDeviceAttr::ComputeCapabilityMajor,
        DeviceAttribute::ComputeCapabilityMinor => CudaDeviceAttr::ComputeCapabilityMinor,
        DeviceAttribute::ManagedMemory => CudaDeviceAttr::ManagedMemory,
        DeviceAttribute::CooperativeLaunch => CudaDeviceAttr::CooperativeLaunch,
    };
    Some(attr.code())
}
