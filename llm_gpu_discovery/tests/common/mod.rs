//! Shared helpers for the integration tests: an in-process mock vendor
//! runtime and a loader that hands it out.
//!
//! The mock entry points are plain `extern "C"` functions backed by global
//! state, one state slot per mock vendor. Tests using them run `#[serial]`.
#![allow(dead_code)]

use llm_gpu_discovery::*;
use std::{
    collections::HashMap,
    ffi::{c_int, c_void},
    path::{Path, PathBuf},
    ptr::NonNull,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

pub const GB: usize = 1_000_000_000;

/// Status codes with the same meaning in every supported runtime.
pub const OK: i32 = 0;
pub const INVALID_VALUE: i32 = 1;
pub const INITIALIZATION_ERROR: i32 = 3;
pub const NO_DEVICE: i32 = 100;
pub const ILLEGAL_ADDRESS: i32 = 700;

#[derive(Debug, Clone)]
pub struct MockDevice {
    pub name: &'static str,
    pub uuid: [u8; 16],
    pub total: usize,
    pub free: usize,
    pub major: i32,
    pub minor: i32,
    pub multi_processor_count: i32,
    pub mem_status: i32,
    pub properties_status: i32,
}

impl MockDevice {
    pub fn new(total: usize, free: usize) -> Self {
        Self {
            name: "Mock GPU",
            uuid: [0xab; 16],
            total,
            free,
            major: 2,
            minor: 1,
            multi_processor_count: 16,
            mem_status: OK,
            properties_status: OK,
        }
    }
}

#[derive(Debug)]
pub struct MockState {
    pub device_count: i32,
    pub count_status: i32,
    pub count_delay_ms: u64,
    pub version: i32,
    pub version_status: i32,
    pub set_device_status: i32,
    pub devices: Vec<MockDevice>,
    pub selected: i32,
    /// Every entry point invoked, in order.
    pub calls: Vec<&'static str>,
}

impl MockState {
    pub const EMPTY: MockState = MockState {
        device_count: 0,
        count_status: OK,
        count_delay_ms: 0,
        version: 0,
        version_status: OK,
        set_device_status: OK,
        devices: Vec::new(),
        selected: -1,
        calls: Vec::new(),
    };

    /// A healthy runtime with one mock device per entry of `devices`.
    pub fn with_devices(devices: Vec<MockDevice>) -> Self {
        Self {
            device_count: devices.len() as i32,
            version: 12040,
            devices,
            ..Self::EMPTY
        }
    }
}

/// Which global state slot a mock runtime is backed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    A,
    B,
}

static STATES: [Mutex<MockState>; 2] = [Mutex::new(MockState::EMPTY), Mutex::new(MockState::EMPTY)];

fn slot_state<const V: usize>() -> MutexGuard<'static, MockState> {
    STATES[V].lock().unwrap_or_else(|e| e.into_inner())
}

pub fn state(slot: Slot) -> MutexGuard<'static, MockState> {
    match slot {
        Slot::A => slot_state::<0>(),
        Slot::B => slot_state::<1>(),
    }
}

pub fn reset(slot: Slot, new_state: MockState) {
    *state(slot) = new_state;
}

pub fn calls(slot: Slot) -> Vec<&'static str> {
    state(slot).calls.clone()
}

extern "C" fn set_device<const V: usize>(device: c_int) -> c_int {
    let mut s = slot_state::<V>();
    s.calls.push("set_device");
    if s.set_device_status == OK {
        s.selected = device;
    }
    s.set_device_status
}

extern "C" fn device_synchronize<const V: usize>() -> c_int {
    let mut s = slot_state::<V>();
    s.calls.push("device_synchronize");
    OK
}

extern "C" fn device_reset<const V: usize>() -> c_int {
    let mut s = slot_state::<V>();
    s.calls.push("device_reset");
    // Clears the sticky error selection kept reporting.
    s.set_device_status = OK;
    let selected = s.selected;
    if selected >= 0 {
        if let Some(device) = s.devices.get_mut(selected as usize) {
            device.mem_status = OK;
            device.properties_status = OK;
        }
    }
    OK
}

extern "C" fn mem_get_info<const V: usize>(free: *mut usize, total: *mut usize) -> c_int {
    let mut s = slot_state::<V>();
    s.calls.push("mem_get_info");
    let Some(device) = usize::try_from(s.selected)
        .ok()
        .and_then(|i| s.devices.get(i))
    else {
        return INVALID_VALUE;
    };
    if device.mem_status != OK {
        return device.mem_status;
    }
    unsafe {
        *free = device.free;
        *total = device.total;
    }
    OK
}

extern "C" fn get_device_count<const V: usize>(count: *mut c_int) -> c_int {
    let delay = {
        let mut s = slot_state::<V>();
        s.calls.push("get_device_count");
        s.count_delay_ms
    };
    if delay > 0 {
        std::thread::sleep(std::time::Duration::from_millis(delay));
    }
    let s = slot_state::<V>();
    if s.count_status != OK {
        return s.count_status;
    }
    unsafe { *count = s.device_count };
    OK
}

/// Answers `attribute code + 1000 * device` so tests can tell which
/// attribute filled which field.
extern "C" fn device_get_attribute<const V: usize>(
    value: *mut c_int,
    attr: c_int,
    device: c_int,
) -> c_int {
    let mut s = slot_state::<V>();
    s.calls.push("device_get_attribute");
    if device < 0 || device >= s.device_count {
        return INVALID_VALUE;
    }
    unsafe { *value = attr + 1000 * device };
    OK
}

extern "C" fn driver_get_version<const V: usize>(version: *mut c_int) -> c_int {
    let mut s = slot_state::<V>();
    s.calls.push("driver_get_version");
    if s.version_status != OK {
        return s.version_status;
    }
    unsafe { *version = s.version };
    OK
}

/// The device behind a properties query, or the status the query fails with.
fn queried_device<const V: usize>(device: c_int) -> Result<MockDevice, c_int> {
    let mut s = slot_state::<V>();
    s.calls.push("get_device_properties");
    let Some(mock) = usize::try_from(device).ok().and_then(|i| s.devices.get(i)) else {
        return Err(INVALID_VALUE);
    };
    if mock.properties_status != OK {
        return Err(mock.properties_status);
    }
    Ok(mock.clone())
}

/// Writes a MUSA/CUDA shaped struct.
extern "C" fn get_device_properties<const V: usize>(
    prop: *mut RawDeviceProp,
    device: c_int,
) -> c_int {
    let mock = match queried_device::<V>(device) {
        Ok(mock) => mock,
        Err(status) => return status,
    };
    let mut raw = RawDeviceProp::zeroed();
    for (dst, src) in raw.name.iter_mut().zip(mock.name.bytes()) {
        *dst = src as std::ffi::c_char;
    }
    raw.uuid.bytes = mock.uuid;
    raw.total_global_mem = mock.total;
    raw.warp_size = 32;
    raw.major = mock.major;
    raw.minor = mock.minor;
    raw.multi_processor_count = mock.multi_processor_count;
    raw.memory_bus_width = 256;
    unsafe { prop.write(raw) };
    OK
}

/// Writes HIP's `hipDeviceProp_tR0000` head, which has no UUID.
extern "C" fn get_hip_device_properties<const V: usize>(
    prop: *mut RawHipDevicePropHead,
    device: c_int,
) -> c_int {
    let mock = match queried_device::<V>(device) {
        Ok(mock) => mock,
        Err(status) => return status,
    };
    let mut head = RawHipDevicePropHead::zeroed();
    for (dst, src) in head.name.iter_mut().zip(mock.name.bytes()) {
        *dst = src as std::ffi::c_char;
    }
    head.total_global_mem = mock.total;
    head.warp_size = 64;
    head.major = mock.major;
    head.minor = mock.minor;
    unsafe { prop.write(head) };
    OK
}

fn symbol_table<const V: usize>(vendor: Vendor) -> HashMap<String, usize> {
    let get_properties = match vendor.spec().properties_abi {
        PropertiesAbi::HipLegacy => get_hip_device_properties::<V> as usize,
        PropertiesAbi::Full | PropertiesAbi::Prefix => get_device_properties::<V> as usize,
    };
    let addresses: [usize; 8] = [
        set_device::<V> as usize,
        device_synchronize::<V> as usize,
        device_reset::<V> as usize,
        mem_get_info::<V> as usize,
        get_device_count::<V> as usize,
        device_get_attribute::<V> as usize,
        driver_get_version::<V> as usize,
        get_properties,
    ];
    vendor
        .spec()
        .symbols
        .all()
        .iter()
        .zip(addresses)
        .map(|(name, address)| (name.to_string(), address))
        .collect()
}

/// Loader serving mock runtimes registered by path, counting every library
/// it opens and every library that gets closed.
#[derive(Default)]
pub struct MockLoader {
    libraries: HashMap<PathBuf, HashMap<String, usize>>,
    pub opens: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
}

impl MockLoader {
    pub fn new() -> Self {
        Default::default()
    }

    /// Serves `vendor`'s symbol names at `path`, backed by `slot`.
    pub fn with_runtime<P: Into<PathBuf>>(mut self, path: P, vendor: Vendor, slot: Slot) -> Self {
        let table = match slot {
            Slot::A => symbol_table::<0>(vendor),
            Slot::B => symbol_table::<1>(vendor),
        };
        self.libraries.insert(path.into(), table);
        self
    }

    pub fn without_symbol<P: AsRef<Path>>(mut self, path: P, symbol: &str) -> Self {
        if let Some(table) = self.libraries.get_mut(path.as_ref()) {
            table.remove(symbol);
        }
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl DynamicLoader for MockLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn LibraryHandle>, LoaderError> {
        match self.libraries.get(path) {
            Some(symbols) => {
                self.opens.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(MockLibrary {
                    symbols: symbols.clone(),
                    closes: Arc::clone(&self.closes),
                }))
            }
            None => Err(LoaderError::Open {
                path: path.to_path_buf(),
                reason: "No such file or directory".to_string(),
            }),
        }
    }
}

struct MockLibrary {
    symbols: HashMap<String, usize>,
    closes: Arc<AtomicUsize>,
}

impl LibraryHandle for MockLibrary {
    fn resolve(&self, symbol: &str) -> Result<NonNull<c_void>, LoaderError> {
        self.symbols
            .get(symbol)
            .and_then(|address| NonNull::new(*address as *mut c_void))
            .ok_or_else(|| LoaderError::Resolve {
                symbol: symbol.to_string(),
                reason: "undefined symbol".to_string(),
            })
    }

    fn close(self: Box<Self>) -> Result<(), LoaderError> {
        Ok(())
    }
}

impl Drop for MockLibrary {
    fn drop(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

pub const MUSA_PATH: &str = "/mock/libmusart.so";
pub const CUDA_PATH: &str = "/mock/libcudart.so";
pub const ROCM_PATH: &str = "/mock/libamdhip64.so";
pub const MOCK_PATH: &str = "/mock/libruntime.so";

/// Initialises `vendor` from whatever `loader` serves at `path`, verbosely.
pub fn init_mock(loader: &MockLoader, vendor: Vendor, path: &str) -> InitResult {
    VendorHandle::init(vendor.spec(), loader, Path::new(path), true)
}

/// A ready handle over `devices` on slot A.
pub fn mock_handle(vendor: Vendor, devices: Vec<MockDevice>) -> (MockLoader, VendorHandle) {
    reset(Slot::A, MockState::with_devices(devices));
    let loader = MockLoader::new().with_runtime(MOCK_PATH, vendor, Slot::A);
    let initialized = init_mock(&loader, vendor, MOCK_PATH).unwrap();
    (loader, initialized.handle)
}
