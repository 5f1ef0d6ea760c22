//! Moore Threads MUSA runtime (`libmusart`).

use super::{
    catalog::{attribute_catalog, status_catalog},
    decode_thousands_version, DeviceAttribute, PropertiesAbi, SymbolNames, Vendor, VendorSpec,
};

pub static MUSA: VendorSpec = VendorSpec {
    vendor: Vendor::Musa,
    name: "MUSA",
    symbols: SymbolNames {
        set_device: "musaSetDevice",
        device_synchronize: "musaDeviceSynchronize",
        device_reset: "musaDeviceReset",
        mem_get_info: "musaMemGetInfo",
        get_device_count: "musaGetDeviceCount",
        device_get_attribute: "musaDeviceGetAttribute",
        driver_get_version: "musaDriverGetVersion",
        get_device_properties: "musaGetDeviceProperties",
    },
    default_libraries: &["libmusart.so", "libmusart.so.1"],
    properties_abi: PropertiesAbi::Full,
    lookup_status: MusaError::lookup,
    empty_statuses: &[MusaError::NoDevice as i32, MusaError::InsufficientDriver as i32],
    attribute_code,
    decode_driver_version: decode_thousands_version,
};

status_catalog! {
    /// `musaError_t`.
    pub enum MusaError {
        Success = 0 => Success,
        InvalidValue = 1 => Misuse,
        MemoryAllocation = 2 => Unavailable,
        InitializationError = 3 => Unavailable,
        MusartUnloading = 4 => Unavailable,
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
        MtlinkUncorrectable = 220 => DeviceFault,
        JitCompilerNotFound = 221 => Unavailable,
        UnsupportedPtxVersion = 222 => Unavailable,
        JitCompilationDisabled = 223 => Unavailable,
        UnsupportedExecAffinity = 224 => Unavailable,
        InvalidSource = 300 => Misuse,
        FileNotFound = 301 => Unavailable,
        SharedObjectSymbolNotFound = 302 => Unavailable,
        SharedObjectInitFailed = 303 => Unavailable,
        OperatingSystem = 304 => Unavailable,
        InvalidResourceHandle = 400 => Misuse,
        IllegalState = 401 => Misuse,
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
    /// `musaDeviceAttr`.
    pub enum MusaDeviceAttr {
        MaxThreadsPerBlock = 1,
        MaxBlockDimX = 2,
        MaxBlockDimY = 3,
        MaxBlockDimZ = 4,
        MaxGridDimX = 5,
        MaxGridDimY = 6,
        MaxGridDimZ = 7,
        MaxSharedMemoryPerBlock = 8,
        TotalConstantMemory = 9,
        WarpSize = 10,
        MaxPitch = 11,
        MaxRegistersPerBlock = 12,
        ClockRate = 13,
        TextureAlignment = 14,
        GpuOverlap = 15,
        MultiProcessorCount = 16,
        KernelExecTimeout = 17,
        Integrated = 18,
        CanMapHostMemory = 19,
        ComputeMode = 20,
        MaxTexture1DWidth = 21,
        MaxTexture2DWidth = 22,
        MaxTexture2DHeight = 23,
        MaxTexture3DWidth = 24,
        MaxTexture3DHeight = 25,
        MaxTexture3DDepth = 26,
        MaxTexture2DLayeredWidth = 27,
        MaxTexture2DLayeredHeight = 28,
        MaxTexture2DLayeredLayers = 29,
        SurfaceAlignment = 30,
        ConcurrentKernels = 31,
        EccEnabled = 32,
        PciBusId = 33,
        PciDeviceId = 34,
        TccDriver = 35,
        MemoryClockRate = 36,
        GlobalMemoryBusWidth = 37,
        L2CacheSize = 38,
        MaxThreadsPerMultiProcessor = 39,
        AsyncEngineCount = 40,
        UnifiedAddressing = 41,
        MaxTexture1DLayeredWidth = 42,
        MaxTexture1DLayeredLayers = 43,
        MaxTexture2DGatherWidth = 45,
        MaxTexture2DGatherHeight = 46,
        MaxTexture3DWidthAlt = 47,
        MaxTexture3DHeightAlt = 48,
        MaxTexture3DDepthAlt = 49,
        PciDomainId = 50,
        TexturePitchAlignment = 51,
        MaxTextureCubemapWidth = 52,
        MaxTextureCubemapLayeredWidth = 53,
        MaxTextureCubemapLayeredLayers = 54,
        MaxSurface1DWidth = 55,
        MaxSurface2DWidth = 56,
        MaxSurface2DHeight = 57,
        MaxSurface3DWidth = 58,
        MaxSurface3DHeight = 59,
        MaxSurface3DDepth = 60,
        MaxSurface1DLayeredWidth = 61,
        MaxSurface1DLayeredLayers = 62,
        MaxSurface2DLayeredWidth = 63,
        MaxSurface2DLayeredHeight = 64,
        MaxSurface2DLayeredLayers = 65,
        MaxSurfaceCubemapWidth = 66,
        MaxSurfaceCubemapLayeredWidth = 67,
        MaxSurfaceCubemapLayeredLayers = 68,
        MaxTexture1DLinearWidth = 69,
        MaxTexture2DLinearWidth = 70,
        MaxTexture2DLinearHeight = 71,
        MaxTexture2DLinearPitch = 72,
        MaxTexture2DMipmappedWidth = 73,
        MaxTexture2DMipmappedHeight = 74,
        ComputeCapabilityMajor = 75,
        ComputeCapabilityMinor = 76,
        MaxTexture1DMipmappedWidth = 77,
        StreamPrioritiesSupported = 78,
        GlobalL1CacheSupported = 79,
        LocalL1CacheSupported = 80,
        MaxSharedMemoryPerMultiprocessor = 81,
        MaxRegistersPerMultiprocessor = 82,
        ManagedMemory = 83,
        IsMultiGpuBoard = 84,
        MultiGpuBoardGroupID = 85,
        HostNativeAtomicSupported = 86,
        SingleToDoublePrecisionPerfRatio = 87,
        PageableMemoryAccess = 88,
        ConcurrentManagedAccess = 89,
        ComputePreemptionSupported = 90,
        CanUseHostPointerForRegisteredMem = 91,
        Reserved92 = 92,
        Reserved93 = 93,
        Reserved94 = 94,
        CooperativeLaunch = 95,
        CooperativeMultiDeviceLaunch = 96,
        MaxSharedMemoryPerBlockOptin = 97,
        CanFlushRemoteWrites = 98,
        HostRegisterSupported = 99,
        PageableMemoryAccessUsesHostPageTables = 100,
        DirectManagedMemAccessFromHost = 101,
        MaxBlocksPerMultiprocessor = 106,
        MaxPersistingL2CacheSize = 108,
        MaxAccessPolicyWindowSize = 109,
        ReservedSharedMemoryPerBlock = 111,
        SparseMusaArraySupported = 112,
        HostRegisterReadOnlySupported = 113,
        MaxTimelineSemaphoreInteropSupported = 114,
        MemoryPoolsSupported = 115,
        GPUDirectRDMASupported = 116,
        GPUDirectRDMAFlushWritesOptions = 117,
        GPUDirectRDMAWritesOrdering = 118,
        MemoryPoolSupportedHandleTypes = 119,
    }
}

fn attribute_code(attribute: DeviceAttribute) -> Option<i32> {
    let attr = match attribute {
        DeviceAttribute::MaxThreadsPerBlock => MusaDeviceAttr::MaxThreadsPerBlock,
        DeviceAttribute::MaxBlockDimX => MusaDeviceAttr::MaxBlockDimX,
        DeviceAttribute::MaxBlockDimY => MusaDeviceAttr::MaxBlockDimY,
        DeviceAttribute::MaxBlockDimZ => MusaDeviceAttr::MaxBlockDimZ,
        DeviceAttribute::MaxGridDimX => MusaDeviceAttr::MaxGridDimX,
        DeviceAttribute::MaxGridDimY => MusaDeviceAttr::MaxGridDimY,
        DeviceAttribute::MaxGridDimZ => MusaDeviceAttr::MaxGridDimZ,
        DeviceAttribute::MaxSharedMemoryPerBlock => MusaDeviceAttr::MaxSharedMemoryPerBlock,
        DeviceAttribute::WarpSize => MusaDeviceAttr::WarpSize,
        DeviceAttribute::ClockRate => MusaDeviceAttr::ClockRate,
        DeviceAttribute::MultiProcessorCount => MusaDeviceAttr::MultiProcessorCount,
        DeviceAttribute::Integrated => MusaDeviceAttr::Integrated,
        DeviceAttribute::ConcurrentKernels => MusaDeviceAttr::ConcurrentKernels,
        DeviceAttribute::EccEnabled => MusaDeviceAttr::EccEnabled,
        DeviceAttribute::PciBusId => MusaDeviceAttr::PciBusId,
        DeviceAttribute::PciDeviceId => MusaDeviceAttr::PciDeviceId,
        DeviceAttribute::PciDomainId => MusaDeviceAttr::PciDomainId,
        DeviceAttribute::MemoryClockRate => MusaDeviceAttr::MemoryClockRate,
        DeviceAttribute::GlobalMemoryBusWidth => MusaDeviceAttr::GlobalMemoryBusWidth,
        DeviceAttribute::L2CacheSize => MusaDeviceAttr::L2CacheSize,
        DeviceAttribute::MaxThreadsPerMultiProcessor => {
            MusaDeviceAttr::MaxThreadsPerMultiProcessor
        }
        DeviceAttribute::ComputeCapabilityMajor => MusaDeviceAttr::ComputeCapabilityMajor,
        DeviceAttribute::ComputeCapabilityMinor => MusaDeviceAttr::ComputeCapabilityMinor,
        DeviceAttribute::ManagedMemory => MusaDeviceAttr::ManagedMemory,
        DeviceAttribute::CooperativeLaunch => MusaDeviceAttr::CooperativeLaunch,
    };
    Some(attr.code())
}
