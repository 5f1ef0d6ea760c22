//! Initializer, bootstrapper and releaser for one vendor runtime.

use crate::{
    binding::{BoundRuntime, VendorRuntime},
    error::{ProbeError, ProbeResult},
    ffi::{RawStatus, STATUS_SUCCESS},
    loader::{DynamicLoader, LoaderError},
    report::{DeviceProperties, DriverVersion, MemoryReport},
    status::{ClassifiedStatus, StatusClass},
    vendors::{DeviceAttribute, PropertiesAbi, Vendor, VendorSpec},
};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

/// Outcome of [`VendorHandle::init`].
pub type InitResult = ProbeResult<Initialized>;

#[derive(Debug)]
pub struct Initialized {
    pub handle: VendorHandle,
    /// Zero when the runtime loaded but reported no usable device.
    pub device_count: u32,
}

/// A live, fully resolved binding to one loaded vendor runtime.
///
/// Operations take `&mut self`: the runtime's selected device is shared state,
/// so calls on one handle never interleave.
pub struct VendorHandle {
    spec: &'static VendorSpec,
    runtime: Box<dyn VendorRuntime>,
    library_path: PathBuf,
    verbose: bool,
    driver_version: DriverVersion,
    device_count: u32,
    faulted: HashMap<u32, ClassifiedStatus>,
}

impl VendorHandle {
    /// Opens the runtime at `path`, resolves every required entry point and
    /// reads the driver version and device count.
    ///
    /// On error no library is left open.
    pub fn init(
        spec: &'static VendorSpec,
        loader: &dyn DynamicLoader,
        path: &Path,
        verbose: bool,
    ) -> InitResult {
        let library = loader.open(path).map_err(|source| ProbeError::LibraryLoad {
            vendor: spec.name,
            path: path.to_path_buf(),
            source,
        })?;

        let runtime = match BoundRuntime::bind(library, &spec.symbols) {
            Ok(runtime) => runtime,
            Err((library, unresolved)) => {
                crate::debug!(
                    "{} symbol {} unresolved: {}",
                    spec.name,
                    unresolved.symbol,
                    unresolved.source
                );
                if let Err(e) = library.close() {
                    crate::warn!("{} failed to close {}: {e}", spec.name, path.display());
                }
                return Err(ProbeError::MissingSymbol {
                    vendor: spec.name,
                    path: path.to_path_buf(),
                    symbol: unresolved.symbol,
                });
            }
        };

        let mut handle = Self {
            spec,
            runtime: Box::new(runtime),
            library_path: path.to_path_buf(),
            verbose,
            driver_version: DriverVersion::Unknown,
            device_count: 0,
            faulted: HashMap::new(),
        };

        let version = handle.runtime.driver_version();
        match handle.record("driver_version", None, version) {
            Ok(raw) => handle.driver_version = spec.decode_driver_version(raw),
            Err(e) => crate::warn!("{} driver version unknown: {e}", spec.name),
        }

        let count = handle.runtime.device_count();
        handle.device_count = match count {
            Err(code) if spec.is_empty_status(code) => {
                let status = spec.classify(code);
                handle.log_call("device_count", None, &status);
                crate::info!("{} runtime present without devices: {status}", spec.name);
                0
            }
            count => {
                let count = handle.record("device_count", None, count)?;
                u32::try_from(count).map_err(|_| ProbeError::NegativeDeviceCount {
                    vendor: spec.name,
                    count,
                })?
            }
        };

        crate::info!(
            "{} runtime loaded from {}: driver {}, {} device(s)",
            spec.name,
            path.display(),
            handle.driver_version,
            handle.device_count
        );
        let device_count = handle.device_count;
        Ok(Initialized {
            handle,
            device_count,
        })
    }

    /// Selects device `index` and reads its memory state.
    pub fn bootstrap(&mut self, index: u32) -> ProbeResult<MemoryReport> {
        self.check_usable(index)?;
        self.select(index)?;
        let reply = self.runtime.mem_get_info();
        let (free, total) = self.record("mem_get_info", Some(index), reply)?;
        MemoryReport::from_free_total(free, total).ok_or(ProbeError::InconsistentMemory {
            vendor: self.spec.name,
            index,
            free,
            total,
        })
    }

    /// One properties query for device `index`.
    ///
    /// For runtimes whose properties struct is only trusted up to the compute
    /// capability, the remaining fields come from attribute queries.
    /// Each vendor's struct is decoded with its own layout.
    pub fn properties(&mut self, index: u32) -> ProbeResult<DeviceProperties> {
        self.check_usable(index)?;
        let reply = self.runtime.device_properties(index as i32);
        let raw = self.record("device_properties", Some(index), reply)?;
        let mut props = match self.spec.properties_abi {
            PropertiesAbi::Full => return Ok(DeviceProperties::from_raw_full(&raw.device_prop())),
            PropertiesAbi::Prefix => DeviceProperties::from_raw_prefix(&raw.device_prop()),
            PropertiesAbi::HipLegacy => DeviceProperties::from_hip_head(&raw.hip_head()),
        };
        self.fill_from_attributes(index, &mut props)?;
        Ok(props)
    }

    pub fn attribute(&mut self, index: u32, attribute: DeviceAttribute) -> ProbeResult<i32> {
        self.check_usable(index)?;
        let code =
            self.spec
                .attribute_code(attribute)
                .ok_or(ProbeError::AttributeUnsupported {
                    vendor: self.spec.name,
                    attribute: attribute.name(),
                })?;
        let reply = self.runtime.device_attribute(code, index as i32);
        self.record("device_attribute", Some(index), reply)
    }

    /// Blocks until all work on device `index` has finished.
    pub fn synchronize(&mut self, index: u32) -> ProbeResult<()> {
        self.check_usable(index)?;
        self.select(index)?;
        let reply = self.runtime.device_synchronize();
        self.record("device_synchronize", Some(index), reply)
    }

    /// Resets device `index`. This is the only call allowed on a faulted
    /// device; on success its fault mark is cleared.
    pub fn reset_device(&mut self, index: u32) -> ProbeResult<()> {
        self.check_index(index)?;
        let was_faulted = self.faulted.contains_key(&index);
        if let Err(e) = self.select(index) {
            // Selection can keep returning the sticky fault the reset clears.
            if !(was_faulted && e.class() == StatusClass::DeviceFault) {
                return Err(e);
            }
            crate::warn!(
                "{} device {index} selection failed before reset, resetting anyway: {e}",
                self.spec.name
            );
        }
        let reply = self.runtime.device_reset();
        self.record("device_reset", Some(index), reply)?;
        if let Some(status) = self.faulted.remove(&index) {
            crate::info!(
                "{} device {index} reset, clearing earlier fault {status}",
                self.spec.name
            );
        }
        Ok(())
    }

    /// Closes the library. Nothing resolved from it is called afterwards.
    pub fn release(self) -> Result<(), LoaderError> {
        crate::debug!(
            "{} releasing runtime {}",
            self.spec.name,
            self.library_path.display()
        );
        self.runtime.close()
    }

    pub fn vendor(&self) -> Vendor {
        self.spec.vendor
    }

    pub fn spec(&self) -> &'static VendorSpec {
        self.spec
    }

    pub fn library_path(&self) -> &Path {
        &self.library_path
    }

    pub fn driver_version(&self) -> DriverVersion {
        self.driver_version
    }

    pub fn device_count(&self) -> u32 {
        self.device_count
    }

    /// The fault that made device `index` unusable, if any.
    pub fn fault(&self, index: u32) -> Option<&ClassifiedStatus> {
        self.faulted.get(&index)
    }

    fn check_index(&self, index: u32) -> ProbeResult<()> {
        if index >= self.device_count {
            return Err(ProbeError::DeviceOutOfRange {
                vendor: self.spec.name,
                index,
                device_count: self.device_count,
            });
        }
        Ok(())
    }

    fn check_usable(&self, index: u32) -> ProbeResult<()> {
        self.check_index(index)?;
        match self.faulted.get(&index) {
            Some(status) => Err(ProbeError::DeviceUnusable {
                vendor: self.spec.name,
                index,
                status: status.clone(),
            }),
            None => Ok(()),
        }
    }

    fn select(&mut self, index: u32) -> ProbeResult<()> {
        let reply = self.runtime.set_device(index as i32);
        self.record("set_device", Some(index), reply)
    }

    /// Classifies the reply of one vendor call and remembers device faults.
    fn record<T>(
        &mut self,
        operation: &'static str,
        index: Option<u32>,
        reply: Result<T, RawStatus>,
    ) -> ProbeResult<T> {
        match reply {
            Ok(value) => {
                self.log_call(operation, index, &self.spec.classify(STATUS_SUCCESS));
                Ok(value)
            }
            Err(code) => {
                let status = self.spec.classify(code);
                self.log_call(operation, index, &status);
                if status.class == StatusClass::DeviceFault {
                    if let Some(index) = index {
                        crate::warn!(
                            "{} device {index} marked unusable after {operation}: {status}",
                            self.spec.name
                        );
                        self.faulted.entry(index).or_insert_with(|| status.clone());
                    }
                }
                Err(ProbeError::Vendor { operation, status })
            }
        }
    }

    fn log_call(&self, operation: &str, index: Option<u32>, status: &ClassifiedStatus) {
        let device = index.map_or_else(String::new, |i| format!(" device {i}"));
        if self.verbose {
            crate::debug!("{}{device} {operation}: {status}", self.spec.name);
        } else {
            crate::trace!("{}{device} {operation}: {status}", self.spec.name);
        }
    }

    fn fill_from_attributes(
        &mut self,
        index: u32,
        props: &mut DeviceProperties,
    ) -> ProbeResult<()> {
        use DeviceAttribute::*;
        props.multi_processor_count = self.attribute(index, MultiProcessorCount)?;
        props.integrated = self.attribute(index, Integrated)? != 0;
        props.concurrent_kernels = self.attribute(index, ConcurrentKernels)? != 0;
        props.ecc_enabled = self.attribute(index, EccEnabled)? != 0;
        props.pci_bus_id = self.attribute(index, PciBusId)?;
        props.pci_device_id = self.attribute(index, PciDeviceId)?;
        props.pci_domain_id = self.attribute(index, PciDomainId)?;
        props.memory_clock_rate = self.attribute(index, MemoryClockRate)?;
        props.memory_bus_width = self.attribute(index, GlobalMemoryBusWidth)?;
        props.l2_cache_size = self.attribute(index, L2CacheSize)?;
        props.max_threads_per_multi_processor =
            self.attribute(index, MaxThreadsPerMultiProcessor)?;
        props.managed_memory = self.attribute(index, ManagedMemory)? != 0;
        props.cooperative_launch = self.attribute(index, CooperativeLaunch)? != 0;
        Ok(())
    }
}

impl std::fmt::Debug for VendorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorHandle")
            .field("vendor", &self.spec.name)
            .field("library_path", &self.library_path)
            .field("driver_version", &self.driver_version)
            .field("device_count", &self.device_count)
            .field("faulted", &self.faulted)
            .finish()
    }
}
