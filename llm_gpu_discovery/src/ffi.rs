//! Raw ABI shared by the CUDA-runtime-shaped vendor libraries.
//!
//! The entry point signatures are identical across `cuda*`, `hip*` and `musa*`
//! runtimes; only the symbol names and the numeric meaning of statuses differ.
//! [`RawDeviceProp`] mirrors the MUSA runtime's `musaDeviceProp` field for field.
//! Its leading fields (up to and including `minor`) are laid out the same way
//! in `cudaDeviceProp`. HIP's plain `hipGetDeviceProperties` export writes the
//! older `hipDeviceProp_tR0000` layout instead, see [`RawHipDevicePropHead`].

use std::ffi::{c_char, c_int, c_uint, c_void};

/// Raw status value returned by every vendor entry point.
pub type RawStatus = c_int;

/// Zero means success in every supported runtime.
pub const STATUS_SUCCESS: RawStatus = 0;

pub type FnSetDevice = unsafe extern "C" fn(device: c_int) -> RawStatus;
pub type FnDeviceSynchronize = unsafe extern "C" fn() -> RawStatus;
pub type FnDeviceReset = unsafe extern "C" fn() -> RawStatus;
pub type FnMemGetInfo = unsafe extern "C" fn(free: *mut usize, total: *mut usize) -> RawStatus;
pub type FnGetDeviceCount = unsafe extern "C" fn(count: *mut c_int) -> RawStatus;
pub type FnDeviceGetAttribute =
    unsafe extern "C" fn(value: *mut c_int, attr: c_int, device: c_int) -> RawStatus;
pub type FnDriverGetVersion = unsafe extern "C" fn(version: *mut c_int) -> RawStatus;
/// `prop` points at a vendor specific struct; see [`RawProperties`].
pub type FnGetDeviceProperties =
    unsafe extern "C" fn(prop: *mut c_void, device: c_int) -> RawStatus;

/// 16-byte device UUID.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawUuid {
    pub bytes: [u8; 16],
}

/// Bytes reserved for a properties query.
///
/// Vendor property structs grow between releases, so the query always writes
/// into a buffer far larger than [`RawDeviceProp`].
pub const PROPERTIES_BUFFER_BYTES: usize = 8192;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawDeviceProp {
    pub name: [c_char; 256],
    pub uuid: RawUuid,
    pub luid: [c_char; 8],
    pub luid_device_node_mask: c_uint,
    pub total_global_mem: usize,
    pub shared_mem_per_block: usize,
    pub regs_per_block: c_int,
    pub warp_size: c_int,
    pub mem_pitch: usize,
    pub max_threads_per_block: c_int,
    pub max_threads_dim: [c_int; 3],
    pub max_grid_size: [c_int; 3],
    pub clock_rate: c_int,
    pub total_const_mem: usize,
    pub major: c_int,
    pub minor: c_int,
    // Fields below are only trusted for vendors with a full properties ABI.
    pub texture_alignment: usize,
    pub texture_pitch_alignment: usize,
    pub device_overlap: c_int,
    pub multi_processor_count: c_int,
    pub kernel_exec_timeout_enabled: c_int,
    pub integrated: c_int,
    pub can_map_host_memory: c_int,
    pub compute_mode: c_int,
    pub max_texture_1d: c_int,
    pub max_texture_1d_mipmap: c_int,
    pub max_texture_1d_linear: c_int,
    pub max_texture_2d: [c_int; 2],
    pub max_texture_2d_mipmap: [c_int; 2],
    pub max_texture_2d_linear: [c_int; 3],
    pub max_texture_2d_gather: [c_int; 2],
    pub max_texture_3d: [c_int; 3],
    pub max_texture_3d_alt: [c_int; 3],
    pub max_texture_cubemap: c_int,
    pub max_texture_1d_layered: [c_int; 2],
    pub max_texture_2d_layered: [c_int; 3],
    pub max_texture_cubemap_layered: [c_int; 2],
    pub max_surface_1d: c_int,
    pub max_surface_2d: [c_int; 2],
    pub max_surface_3d: [c_int; 3],
    pub max_surface_1d_layered: [c_int; 2],
    pub max_surface_2d_layered: [c_int; 3],
    pub max_surface_cubemap: c_int,
    pub max_surface_cubemap_layered: [c_int; 2],
    pub surface_alignment: usize,
    pub concurrent_kernels: c_int,
    pub ecc_enabled: c_int,
    pub pci_bus_id: c_int,
    pub pci_device_id: c_int,
    pub pci_domain_id: c_int,
    pub tcc_driver: c_int,
    pub async_engine_count: c_int,
    pub unified_addressing: c_int,
    pub memory_clock_rate: c_int,
    pub memory_bus_width: c_int,
    pub l2_cache_size: c_int,
    pub persisting_l2_cache_max_size: c_int,
    pub max_threads_per_multi_processor: c_int,
    pub stream_priorities_supported: c_int,
    pub global_l1_cache_supported: c_int,
    pub local_l1_cache_supported: c_int,
    pub shared_mem_per_multiprocessor: usize,
    pub regs_per_multiprocessor: c_int,
    pub managed_memory: c_int,
    pub is_multi_gpu_board: c_int,
    pub multi_gpu_board_group_id: c_int,
    pub host_native_atomic_supported: c_int,
    pub single_to_double_precision_perf_ratio: c_int,
    pub pageable_memory_access: c_int,
    pub concurrent_managed_access: c_int,
    pub compute_preemption_supported: c_int,
    pub can_use_host_pointer_for_registered_mem: c_int,
    pub cooperative_launch: c_int,
    pub cooperative_multi_device_launch: c_int,
    pub shared_mem_per_block_optin: usize,
    pub pageable_memory_access_uses_host_page_tables: c_int,
    pub direct_managed_mem_access_from_host: c_int,
    pub max_blocks_per_multi_processor: c_int,
    pub access_policy_max_window_size: c_int,
    pub reserved_shared_mem_per_block: usize,
}

impl RawDeviceProp {
    /// An all-zero struct; every field is plain old data.
    pub fn zeroed() -> Self {
        // SAFETY: every field is an integer or an array of integers.
        unsafe { std::mem::zeroed() }
    }
}

/// Leading fields of HIP's `hipDeviceProp_tR0000`, up to the compute
/// capability. Unlike the CUDA and MUSA structs it has no UUID or LUID.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawHipDevicePropHead {
    pub name: [c_char; 256],
    pub total_global_mem: usize,
    pub shared_mem_per_block: usize,
    pub regs_per_block: c_int,
    pub warp_size: c_int,
    pub max_threads_per_block: c_int,
    pub max_threads_dim: [c_int; 3],
    pub max_grid_size: [c_int; 3],
    pub clock_rate: c_int,
    pub memory_clock_rate: c_int,
    pub memory_bus_width: c_int,
    pub total_const_mem: usize,
    pub major: c_int,
    pub minor: c_int,
}

impl RawHipDevicePropHead {
    pub fn zeroed() -> Self {
        // SAFETY: every field is an integer or an array of integers.
        unsafe { std::mem::zeroed() }
    }
}

/// Zeroed, suitably aligned bytes written by one properties query.
///
/// Which struct the bytes hold depends on the vendor, so they are read back
/// through the view matching its [`crate::PropertiesAbi`].
#[repr(C, align(16))]
pub struct RawProperties([u8; PROPERTIES_BUFFER_BYTES]);

impl RawProperties {
    pub fn new() -> Box<Self> {
        Box::new(Self([0; PROPERTIES_BUFFER_BYTES]))
    }

    pub fn as_mut_ptr(&mut self) -> *mut c_void {
        self.0.as_mut_ptr().cast()
    }

    pub fn device_prop(&self) -> RawDeviceProp {
        // SAFETY: the buffer is larger than and aligned for `RawDeviceProp`,
        // and any bit pattern is a valid value of it.
        unsafe { std::ptr::read(self.0.as_ptr().cast::<RawDeviceProp>()) }
    }

    pub fn hip_head(&self) -> RawHipDevicePropHead {
        // SAFETY: as above, for `RawHipDevicePropHead`.
        unsafe { std::ptr::read(self.0.as_ptr().cast::<RawHipDevicePropHead>()) }
    }
}

impl std::fmt::Debug for RawProperties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawProperties")
            .field("bytes", &PROPERTIES_BUFFER_BYTES)
            .finish()
    }
}

// Checked at compile time so the buffer can never be smaller than a view.
const _: () = assert!(std::mem::size_of::<RawDeviceProp>() <= PROPERTIES_BUFFER_BYTES);
const _: () = assert!(std::mem::align_of::<RawDeviceProp>() <= 16);
const _: () = assert!(std::mem::size_of::<RawHipDevicePropHead>() <= PROPERTIES_BUFFER_BYTES);
const _: () = assert!(std::mem::align_of::<RawHipDevicePropHead>() <= 16);

/// Reads a NUL-terminated, possibly unterminated, C char array.
pub(crate) fn c_chars_to_string(chars: &[c_char]) -> String {
    let bytes: Vec<u8> = chars
        .iter()
        .take_while(|c| **c != 0)
        .map(|c| *c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}
