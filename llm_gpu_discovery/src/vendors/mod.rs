//! Vendor descriptors: everything that differs between the CUDA-runtime-shaped
//! vendor libraries, as immutable data.

pub(crate) mod catalog;
pub mod cuda;
pub mod musa;
pub mod rocm;

use crate::{
    ffi::RawStatus,
    report::DriverVersion,
    status::{ClassifiedStatus, StatusClass},
};

/// Name given to a status code missing from a vendor catalog.
pub const UNRECOGNIZED_STATUS: &str = "unrecognized";

#[derive(
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
)]
pub enum Vendor {
    Cuda,
    Rocm,
    Musa,
}

impl Vendor {
    pub const ALL: [Vendor; 3] = [Vendor::Cuda, Vendor::Rocm, Vendor::Musa];

    pub fn spec(self) -> &'static VendorSpec {
        match self {
            Vendor::Cuda => &cuda::CUDA,
            Vendor::Rocm => &rocm::ROCM,
            Vendor::Musa => &musa::MUSA,
        }
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Exported names of the eight required runtime entry points.
#[derive(Debug, Clone, Copy)]
pub struct SymbolNames {
    pub set_device: &'static str,
    pub device_synchronize: &'static str,
    pub device_reset: &'static str,
    pub mem_get_info: &'static str,
    pub get_device_count: &'static str,
    pub device_get_attribute: &'static str,
    pub driver_get_version: &'static str,
    pub get_device_properties: &'static str,
}

impl SymbolNames {
    pub fn all(&self) -> [&'static str; 8] {
        [
            self.set_device,
            self.device_synchronize,
            self.device_reset,
            self.mem_get_info,
            self.get_device_count,
            self.device_get_attribute,
            self.driver_get_version,
            self.get_device_properties,
        ]
    }
}

/// How much of the properties struct written by the vendor is trusted.
#[derive(serde::Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertiesAbi {
    /// The whole struct matches [`crate::ffi::RawDeviceProp`].
    Full,
    /// Only the leading fields up to the compute capability match; the rest
    /// is filled through attribute queries.
    Prefix,
    /// The struct starts with [`crate::ffi::RawHipDevicePropHead`]. No UUID is
    /// reported; everything past the compute capability comes from attribute
    /// queries.
    HipLegacy,
}

/// Device attributes the probe knows how to ask every vendor for.
///
/// Numeric identities are vendor specific; see each vendor's attribute catalog.
#[derive(serde::Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceAttribute {
    MaxThreadsPerBlock,
    MaxBlockDimX,
    MaxBlockDimY,
    MaxBlockDimZ,
    MaxGridDimX,
    MaxGridDimY,
    MaxGridDimZ,
    MaxSharedMemoryPerBlock,
    WarpSize,
    ClockRate,
    MultiProcessorCount,
    Integrated,
    ConcurrentKernels,
    EccEnabled,
    PciBusId,
    PciDeviceId,
    PciDomainId,
    MemoryClockRate,
    GlobalMemoryBusWidth,
    L2CacheSize,
    MaxThreadsPerMultiProcessor,
    ComputeCapabilityMajor,
    ComputeCapabilityMinor,
    ManagedMemory,
    CooperativeLaunch,
}

impl DeviceAttribute {
    pub fn name(self) -> &'static str {
        match self {
            DeviceAttribute::MaxThreadsPerBlock => "MaxThreadsPerBlock",
            DeviceAttribute::MaxBlockDimX => "MaxBlockDimX",
            DeviceAttribute::MaxBlockDimY => "MaxBlockDimY",
            DeviceAttribute::MaxBlockDimZ => "MaxBlockDimZ",
            DeviceAttribute::MaxGridDimX => "MaxGridDimX",
            DeviceAttribute::MaxGridDimY => "MaxGridDimY",
            DeviceAttribute::MaxGridDimZ => "MaxGridDimZ",
            DeviceAttribute::MaxSharedMemoryPerBlock => "MaxSharedMemoryPerBlock",
            DeviceAttribute::WarpSize => "WarpSize",
            DeviceAttribute::ClockRate => "ClockRate",
            DeviceAttribute::MultiProcessorCount => "MultiProcessorCount",
            DeviceAttribute::Integrated => "Integrated",
            DeviceAttribute::ConcurrentKernels => "ConcurrentKernels",
            DeviceAttribute::EccEnabled => "EccEnabled",
            DeviceAttribute::PciBusId => "PciBusId",
            DeviceAttribute::PciDeviceId => "PciDeviceId",
            DeviceAttribute::PciDomainId => "PciDomainId",
            DeviceAttribute::MemoryClockRate => "MemoryClockRate",
            DeviceAttribute::GlobalMemoryBusWidth => "GlobalMemoryBusWidth",
            DeviceAttribute::L2CacheSize => "L2CacheSize",
            DeviceAttribute::MaxThreadsPerMultiProcessor => "MaxThreadsPerMultiProcessor",
            DeviceAttribute::ComputeCapabilityMajor => "ComputeCapabilityMajor",
            DeviceAttribute::ComputeCapabilityMinor => "ComputeCapabilityMinor",
            DeviceAttribute::ManagedMemory => "ManagedMemory",
            DeviceAttribute::CooperativeLaunch => "CooperativeLaunch",
        }
    }
}

/// Static description of one vendor runtime.
pub struct VendorSpec {
    pub vendor: Vendor,
    pub name: &'static str,
    pub symbols: SymbolNames,
    /// Library names handed to the loader when the caller supplies no path.
    pub default_libraries: &'static [&'static str],
    pub properties_abi: PropertiesAbi,
    pub(crate) lookup_status: fn(RawStatus) -> Option<(&'static str, StatusClass)>,
    /// Device-count statuses meaning "runtime present, nothing to drive".
    pub empty_statuses: &'static [RawStatus],
    pub(crate) attribute_code: fn(DeviceAttribute) -> Option<i32>,
    pub(crate) decode_driver_version: fn(i32) -> DriverVersion,
}

impl VendorSpec {
    /// Looks `code` up in the vendor catalog. Unknown codes are `Unavailable`.
    pub fn classify(&self, code: RawStatus) -> ClassifiedStatus {
        let (name, class) =
            (self.lookup_status)(code).unwrap_or((UNRECOGNIZED_STATUS, StatusClass::Unavailable));
        ClassifiedStatus {
            vendor: self.name,
            code,
            name,
            class,
        }
    }

    /// True when a failed device-count query should read as zero devices.
    pub fn is_empty_status(&self, code: RawStatus) -> bool {
        self.empty_statuses.contains(&code)
    }

    pub fn attribute_code(&self, attribute: DeviceAttribute) -> Option<i32> {
        (self.attribute_code)(attribute)
    }

    pub fn decode_driver_version(&self, raw: i32) -> DriverVersion {
        (self.decode_driver_version)(raw)
    }
}

impl std::fmt::Debug for VendorSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorSpec")
            .field("name", &self.name)
            .field("symbols", &self.symbols)
            .field("default_libraries", &self.default_libraries)
            .field("properties_abi", &self.properties_abi)
            .finish()
    }
}

/// `major * 1000 + minor * 10`, the CUDA runtime encoding also used by MUSA.
pub(crate) fn decode_thousands_version(raw: i32) -> DriverVersion {
    if raw <= 0 {
        return DriverVersion::Unknown;
    }
    let major = raw / 1000;
    DriverVersion::Known {
        major,
        minor: (raw - major * 1000) / 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_thousands_version() {
        assert_eq!(
            decode_thousands_version(12040),
            DriverVersion::Known {
                major: 12,
                minor: 4
            }
        );
        assert_eq!(decode_thousands_version(0), DriverVersion::Unknown);
    }

    #[test]
    fn test_unrecognized_status_is_unavailable() {
        for vendor in Vendor::ALL {
            let status = vendor.spec().classify(424_242);
            assert_eq!(status.name, UNRECOGNIZED_STATUS);
            assert_eq!(status.class, StatusClass::Unavailable);
            assert_eq!(status.vendor, vendor.name());
        }
    }

    #[test]
    fn test_success_is_zero_for_every_vendor() {
        for vendor in Vendor::ALL {
            assert!(vendor.spec().classify(0).is_success());
        }
    }

    #[test]
    fn test_empty_statuses_are_unavailable() {
        for vendor in Vendor::ALL {
            let spec = vendor.spec();
            assert!(spec.is_empty_status(100));
            assert!(spec.is_empty_status(35));
            for code in spec.empty_statuses {
                assert_eq!(spec.classify(*code).class, StatusClass::Unavailable);
            }
            assert!(!spec.is_empty_status(0));
        }
    }

    #[test]
    fn test_symbol_names_are_distinct() {
        for vendor in Vendor::ALL {
            let mut names = vendor.spec().symbols.all().to_vec();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), 8, "{vendor} has duplicate symbol names");
        }
    }

    #[test]
    fn test_every_vendor_maps_the_prefix_fill_attributes() {
        use DeviceAttribute::*;
        for vendor in Vendor::ALL {
            for attribute in [
                MultiProcessorCount,
                Integrated,
                ConcurrentKernels,
                EccEnabled,
                PciBusId,
                PciDeviceId,
                PciDomainId,
                MemoryClockRate,
                GlobalMemoryBusWidth,
                L2CacheSize,
                MaxThreadsPerMultiProcessor,
                ManagedMemory,
                CooperativeLaunch,
            ] {
                assert!(
                    vendor.spec().attribute_code(attribute).is_some(),
                    "{vendor} lacks {}",
                    attribute.name()
                );
            }
        }
    }
}
