use crate::ffi::{c_chars_to_string, RawDeviceProp, RawHipDevicePropHead};

const GB: f64 = 1_073_741_824.0;

/// Driver version as reported by the vendor runtime.
#[derive(serde::Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverVersion {
    Known {
        major: i32,
        minor: i32,
    },
    /// The version query failed or returned nothing usable.
    #[default]
    Unknown,
}

impl DriverVersion {
    pub fn is_known(&self) -> bool {
        matches!(self, DriverVersion::Known { .. })
    }
}

impl std::fmt::Display for DriverVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverVersion::Known { major, minor } => write!(f, "{major}.{minor}"),
            DriverVersion::Unknown => f.write_str("unknown"),
        }
    }
}

/// Memory of one device at one point in time.
///
/// Stale as soon as anything allocates on the device; a hint, not a reservation.
#[derive(serde::Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryReport {
    pub total: u64,
    pub free: u64,
    pub used: u64,
}

impl MemoryReport {
    /// `None` when `free` exceeds `total`.
    pub fn from_free_total(free: u64, total: u64) -> Option<Self> {
        let used = total.checked_sub(free)?;
        Some(Self { total, free, used })
    }
}

impl std::fmt::Display for MemoryReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "total {:.2} GB, free {:.2} GB, used {:.2} GB",
            self.total as f64 / GB,
            self.free as f64 / GB,
            self.used as f64 / GB
        )
    }
}

/// Texture and surface size limits, carried as reported.
#[derive(serde::Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureLimits {
    pub max_texture_1d: i32,
    pub max_texture_1d_mipmap: i32,
    pub max_texture_1d_linear: i32,
    pub max_texture_2d: [i32; 2],
    pub max_texture_2d_mipmap: [i32; 2],
    pub max_texture_2d_linear: [i32; 3],
    pub max_texture_2d_gather: [i32; 2],
    pub max_texture_3d: [i32; 3],
    pub max_texture_3d_alt: [i32; 3],
    pub max_texture_cubemap: i32,
    pub max_texture_1d_layered: [i32; 2],
    pub max_texture_2d_layered: [i32; 3],
    pub max_texture_cubemap_layered: [i32; 2],
    pub max_surface_1d: i32,
    pub max_surface_2d: [i32; 2],
    pub max_surface_3d: [i32; 3],
    pub max_surface_1d_layered: [i32; 2],
    pub max_surface_2d_layered: [i32; 3],
    pub max_surface_cubemap: i32,
    pub max_surface_cubemap_layered: [i32; 2],
    pub texture_alignment: u64,
    pub texture_pitch_alignment: u64,
    pub surface_alignment: u64,
}

/// Snapshot of a device's properties from a single vendor query.
#[derive(serde::Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceProperties {
    pub name: String,
    pub uuid: [u8; 16],
    pub total_global_mem: u64,
    pub shared_mem_per_block: u64,
    pub regs_per_block: i32,
    pub warp_size: i32,
    pub mem_pitch: u64,
    pub max_threads_per_block: i32,
    pub max_threads_dim: [i32; 3],
    pub max_grid_size: [i32; 3],
    /// Kilohertz.
    pub clock_rate: i32,
    pub total_const_mem: u64,
    pub compute_major: i32,
    pub compute_minor: i32,
    pub multi_processor_count: i32,
    pub integrated: bool,
    pub concurrent_kernels: bool,
    pub ecc_enabled: bool,
    pub pci_bus_id: i32,
    pub pci_device_id: i32,
    pub pci_domain_id: i32,
    /// Kilohertz.
    pub memory_clock_rate: i32,
    /// Bits.
    pub memory_bus_width: i32,
    pub l2_cache_size: i32,
    pub max_threads_per_multi_processor: i32,
    pub managed_memory: bool,
    pub cooperative_launch: bool,
    pub kernel_exec_timeout_enabled: bool,
    pub can_map_host_memory: bool,
    pub compute_mode: i32,
    pub async_engine_count: i32,
    pub unified_addressing: bool,
    pub persisting_l2_cache_max_size: i32,
    pub stream_priorities_supported: bool,
    pub global_l1_cache_supported: bool,
    pub local_l1_cache_supported: bool,
    pub shared_mem_per_multiprocessor: u64,
    pub regs_per_multiprocessor: i32,
    pub is_multi_gpu_board: bool,
    pub multi_gpu_board_group_id: i32,
    pub host_native_atomic_supported: bool,
    pub single_to_double_precision_perf_ratio: i32,
    pub pageable_memory_access: bool,
    pub concurrent_managed_access: bool,
    pub compute_preemption_supported: bool,
    pub can_use_host_pointer_for_registered_mem: bool,
    pub cooperative_multi_device_launch: bool,
    pub shared_mem_per_block_optin: u64,
    pub pageable_memory_access_uses_host_page_tables: bool,
    pub direct_managed_mem_access_from_host: bool,
    pub max_blocks_per_multi_processor: i32,
    pub access_policy_max_window_size: i32,
    pub reserved_shared_mem_per_block: u64,
    pub limits: TextureLimits,
}

impl DeviceProperties {
    /// Only the head shared by every CUDA-shaped properties struct.
    pub(crate) fn from_raw_prefix(raw: &RawDeviceProp) -> Self {
        Self {
            name: c_chars_to_string(&raw.name),
            uuid: raw.uuid.bytes,
            total_global_mem: raw.total_global_mem as u64,
            shared_mem_per_block: raw.shared_mem_per_block as u64,
            regs_per_block: raw.regs_per_block,
            warp_size: raw.warp_size,
            mem_pitch: raw.mem_pitch as u64,
            max_threads_per_block: raw.max_threads_per_block,
            max_threads_dim: raw.max_threads_dim,
            max_grid_size: raw.max_grid_size,
            clock_rate: raw.clock_rate,
            total_const_mem: raw.total_const_mem as u64,
            compute_major: raw.major,
            compute_minor: raw.minor,
            ..Default::default()
        }
    }

    /// HIP's `R0000` head. The UUID stays zero and so reads as unknown.
    pub(crate) fn from_hip_head(head: &RawHipDevicePropHead) -> Self {
        Self {
            name: c_chars_to_string(&head.name),
            total_global_mem: head.total_global_mem as u64,
            shared_mem_per_block: head.shared_mem_per_block as u64,
            regs_per_block: head.regs_per_block,
            warp_size: head.warp_size,
            max_threads_per_block: head.max_threads_per_block,
            max_threads_dim: head.max_threads_dim,
            max_grid_size: head.max_grid_size,
            clock_rate: head.clock_rate,
            total_const_mem: head.total_const_mem as u64,
            compute_major: head.major,
            compute_minor: head.minor,
            ..Default::default()
        }
    }

    pub(crate) fn from_raw_full(raw: &RawDeviceProp) -> Self {
        Self {
            multi_processor_count: raw.multi_processor_count,
            integrated: raw.integrated != 0,
            concurrent_kernels: raw.concurrent_kernels != 0,
            ecc_enabled: raw.ecc_enabled != 0,
            pci_bus_id: raw.pci_bus_id,
            pci_device_id: raw.pci_device_id,
            pci_domain_id: raw.pci_domain_id,
            memory_clock_rate: raw.memory_clock_rate,
            memory_bus_width: raw.memory_bus_width,
            l2_cache_size: raw.l2_cache_size,
            max_threads_per_multi_processor: raw.max_threads_per_multi_processor,
            managed_memory: raw.managed_memory != 0,
            cooperative_launch: raw.cooperative_launch != 0,
            kernel_exec_timeout_enabled: raw.kernel_exec_timeout_enabled != 0,
            can_map_host_memory: raw.can_map_host_memory != 0,
            compute_mode: raw.compute_mode,
            async_engine_count: raw.async_engine_count,
            unified_addressing: raw.unified_addressing != 0,
            persisting_l2_cache_max_size: raw.persisting_l2_cache_max_size,
            stream_priorities_supported: raw.stream_priorities_supported != 0,
            global_l1_cache_supported: raw.global_l1_cache_supported != 0,
            local_l1_cache_supported: raw.local_l1_cache_supported != 0,
            shared_mem_per_multiprocessor: raw.shared_mem_per_multiprocessor as u64,
            regs_per_multiprocessor: raw.regs_per_multiprocessor,
            is_multi_gpu_board: raw.is_multi_gpu_board != 0,
            multi_gpu_board_group_id: raw.multi_gpu_board_group_id,
            host_native_atomic_supported: raw.host_native_atomic_supported != 0,
            single_to_double_precision_perf_ratio: raw.single_to_double_precision_perf_ratio,
            pageable_memory_access: raw.pageable_memory_access != 0,
            concurrent_managed_access: raw.concurrent_managed_access != 0,
            compute_preemption_supported: raw.compute_preemption_supported != 0,
            can_use_host_pointer_for_registered_mem: raw.can_use_host_pointer_for_registered_mem
                != 0,
            cooperative_multi_device_launch: raw.cooperative_multi_device_launch != 0,
            shared_mem_per_block_optin: raw.shared_mem_per_block_optin as u64,
            pageable_memory_access_uses_host_page_tables: raw
                .pageable_memory_access_uses_host_page_tables
                != 0,
            direct_managed_mem_access_from_host: raw.direct_managed_mem_access_from_host != 0,
            max_blocks_per_multi_processor: raw.max_blocks_per_multi_processor,
            access_policy_max_window_size: raw.access_policy_max_window_size,
            reserved_shared_mem_per_block: raw.reserved_shared_mem_per_block as u64,
            limits: TextureLimits {
                max_texture_1d: raw.max_texture_1d,
                max_texture_1d_mipmap: raw.max_texture_1d_mipmap,
                max_texture_1d_linear: raw.max_texture_1d_linear,
                max_texture_2d: raw.max_texture_2d,
                max_texture_2d_mipmap: raw.max_texture_2d_mipmap,
                max_texture_2d_linear: raw.max_texture_2d_linear,
                max_texture_2d_gather: raw.max_texture_2d_gather,
                max_texture_3d: raw.max_texture_3d,
                max_texture_3d_alt: raw.max_texture_3d_alt,
                max_texture_cubemap: raw.max_texture_cubemap,
                max_texture_1d_layered: raw.max_texture_1d_layered,
                max_texture_2d_layered: raw.max_texture_2d_layered,
                max_texture_cubemap_layered: raw.max_texture_cubemap_layered,
                max_surface_1d: raw.max_surface_1d,
                max_surface_2d: raw.max_surface_2d,
                max_surface_3d: raw.max_surface_3d,
                max_surface_1d_layered: raw.max_surface_1d_layered,
                max_surface_2d_layered: raw.max_surface_2d_layered,
                max_surface_cubemap: raw.max_surface_cubemap,
                max_surface_cubemap_layered: raw.max_surface_cubemap_layered,
                texture_alignment: raw.texture_alignment as u64,
                texture_pitch_alignment: raw.texture_pitch_alignment as u64,
                surface_alignment: raw.surface_alignment as u64,
            },
            ..Self::from_raw_prefix(raw)
        }
    }

    /// `GPU-xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`, or `None` for an all-zero UUID.
    pub fn uuid_string(&self) -> Option<String> {
        if self.uuid.iter().all(|b| *b == 0) {
            return None;
        }
        let hex: Vec<String> = self.uuid.iter().map(|b| format!("{b:02x}")).collect();
        Some(format!(
            "GPU-{}-{}-{}-{}-{}",
            hex[0..4].concat(),
            hex[4..6].concat(),
            hex[6..8].concat(),
            hex[8..10].concat(),
            hex[10..16].concat()
        ))
    }
}

impl std::fmt::Display for DeviceProperties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "DeviceProperties:")?;
        crate::i_nlns(
            f,
            &[
                format_args!("Name: {}", self.name),
                format_args!(
                    "UUID: {}",
                    self.uuid_string().as_deref().unwrap_or("unknown")
                ),
                format_args!(
                    "Compute capability: {}.{}",
                    self.compute_major, self.compute_minor
                ),
                format_args!(
                    "Global memory: {:.2} GB",
                    self.total_global_mem as f64 / GB
                ),
                format_args!("Multiprocessors: {}", self.multi_processor_count),
                format_args!("Memory bus width: {} bits", self.memory_bus_width),
                format_args!(
                    "PCI: {:04x}:{:02x}:{:02x}",
                    self.pci_domain_id, self.pci_bus_id, self.pci_device_id
                ),
            ],
        )
    }
}
