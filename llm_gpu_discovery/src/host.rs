use crate::report::MemoryReport;

/// CPU and system memory of the host, reported alongside any GPUs so a
/// process without a usable vendor runtime still has somewhere to run.
#[derive(serde::Serialize, Debug, Clone, PartialEq)]
pub struct HostReport {
    /// Physical cores. Falls back to the logical count when running in a VM.
    pub cpu_cores: usize,
    pub logical_cpus: usize,
    pub cpu_brand: Option<String>,
    /// `free` is the memory available to new allocations.
    pub memory: MemoryReport,
}

impl HostReport {
    pub fn probe() -> crate::Result<Self> {
        let mut sys = sysinfo::System::new_all();
        sys.refresh_all();

        let logical_cpus = sys.cpus().len();
        let cpu_cores = match sys.physical_core_count() {
            Some(cores) => cores,
            None => logical_cpus,
        };
        let cpu_brand = sys
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .filter(|brand| !brand.is_empty());

        let total = sys.total_memory();
        let available = sys.available_memory();
        let memory = match MemoryReport::from_free_total(available, total) {
            Some(memory) => memory,
            None => crate::bail!(
                "Available system RAM {:.2} GB is greater than total system RAM {:.2} GB",
                (available as f64) / 1_073_741_824.0,
                (total as f64) / 1_073_741_824.0
            ),
        };

        Ok(Self {
            cpu_cores,
            logical_cpus,
            cpu_brand,
            memory,
        })
    }
}

impl std::fmt::Display for HostReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "HostReport:")?;
        crate::i_nlns(
            f,
            &[
                format_args!(
                    "CPU: {}",
                    self.cpu_brand.as_deref().unwrap_or("unknown")
                ),
                format_args!(
                    "Cores: {} physical, {} logical",
                    self.cpu_cores, self.logical_cpus
                ),
                format_args!(
                    "Total system RAM: {:.2} GB",
                    (self.memory.total as f64) / 1_073_741_824.0
                ),
                format_args!(
                    "Available system RAM: {:.2} GB",
                    (self.memory.free as f64) / 1_073_741_824.0
                ),
            ],
        )
    }
}
