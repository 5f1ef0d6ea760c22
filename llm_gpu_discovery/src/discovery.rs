//! Multi-vendor aggregation: drive every configured vendor runtime and merge
//! what they report into one ordered list of devices.

use crate::{
    error::ProbeError,
    handle::{Initialized, VendorHandle},
    host::HostReport,
    loader::{DynamicLoader, SystemLoader},
    logging::{LoggingConfig, LoggingConfigTrait},
    report::{DeviceProperties, DriverVersion, MemoryReport},
    vendors::Vendor,
};
use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc},
    time::{Duration, Instant},
};

/// One vendor to try, with the library paths to try it from, in order.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct VendorCandidate {
    pub vendor: Vendor,
    /// Empty means the vendor's default library names.
    #[serde(default)]
    pub library_paths: Vec<PathBuf>,
}

impl VendorCandidate {
    pub fn new(vendor: Vendor) -> Self {
        Self {
            vendor,
            library_paths: Vec::new(),
        }
    }

    pub fn library_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.library_paths.push(path.into());
        self
    }

    pub fn paths_or_default(&self) -> Vec<PathBuf> {
        if self.library_paths.is_empty() {
            self.vendor
                .spec()
                .default_libraries
                .iter()
                .map(PathBuf::from)
                .collect()
        } else {
            self.library_paths.clone()
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ProbeConfig {
    /// Vendors in discovery order. Devices are reported in this order.
    pub vendors: Vec<VendorCandidate>,

    /// Probe each vendor on its own thread.
    pub parallel: bool,

    /// With `parallel`, stop waiting for vendors after this many milliseconds.
    /// A vendor still running is reported as timed out and its thread is
    /// abandoned.
    pub timeout_ms: Option<u64>,

    /// Log every vendor call at DEBUG instead of TRACE.
    pub verbose: bool,

    /// Include host CPU and RAM in the report.
    pub probe_host: bool,

    /// Determines error handling behavior for configuration issues.
    ///
    /// If true, the probe will return an error when encountering configuration issues.
    /// If false (default), issues will be logged and execution will continue if possible.
    pub error_on_config_issue: bool,

    #[serde(skip)]
    pub logging_config: LoggingConfig,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            vendors: Vendor::ALL.into_iter().map(VendorCandidate::new).collect(),
            parallel: false,
            timeout_ms: None,
            verbose: false,
            probe_host: true,
            error_on_config_issue: false,
            logging_config: LoggingConfig {
                logging_enabled: false,
                ..Default::default()
            },
        }
    }
}

impl LoggingConfigTrait for ProbeConfig {
    fn logging_config_mut(&mut self) -> &mut LoggingConfig {
        &mut self.logging_config
    }
}

impl ProbeConfig {
    pub fn new() -> Self {
        Default::default()
    }

    /// Loads a config from JSON. Missing fields take their default values.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| crate::anyhow!("Failed to read {}: {e}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| crate::anyhow!("Failed to parse {}: {e}", path.display()))?;
        Ok(config)
    }

    /// Replaces the vendor list.
    pub fn vendors<I: IntoIterator<Item = VendorCandidate>>(mut self, vendors: I) -> Self {
        self.vendors = vendors.into_iter().collect();
        self
    }

    pub fn vendor(mut self, candidate: VendorCandidate) -> Self {
        self.vendors.push(candidate);
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn probe_host(mut self, probe_host: bool) -> Self {
        self.probe_host = probe_host;
        self
    }

    pub fn error_on_config_issue(mut self, error_on_config_issue: bool) -> Self {
        self.error_on_config_issue = error_on_config_issue;
        self
    }

    pub(crate) fn initialize(&mut self) -> crate::Result<()> {
        if self.vendors.is_empty() {
            if self.error_on_config_issue {
                crate::bail!("No vendors configured to probe");
            } else {
                crate::warn!("No vendors configured to probe. Only the host will be reported");
            }
        }
        if self.timeout_ms.is_some() && !self.parallel {
            if self.error_on_config_issue {
                crate::bail!("A probe timeout requires parallel probing");
            } else {
                crate::warn!("A probe timeout requires parallel probing. Enabling parallel probing");
                self.parallel = true;
            }
        }
        let mut seen = Vec::new();
        for candidate in &self.vendors {
            if seen.contains(&candidate.vendor) {
                if self.error_on_config_issue {
                    crate::bail!("{} is listed more than once", candidate.vendor);
                } else {
                    crate::warn!(
                        "{} is listed more than once. Each entry is probed separately",
                        candidate.vendor
                    );
                }
            }
            seen.push(candidate.vendor);
        }
        Ok(())
    }

    /// Probes with the platform dynamic loader.
    pub fn probe(&mut self) -> crate::Result<DiscoveryReport> {
        self.probe_with(Arc::new(SystemLoader))
    }

    /// Probes every configured vendor with `loader`.
    ///
    /// Only configuration issues fail the whole probe. Vendor and device
    /// failures are part of the returned report.
    pub fn probe_with(&mut self, loader: Arc<dyn DynamicLoader>) -> crate::Result<DiscoveryReport> {
        self.logging_config.load_logger()?;
        self.initialize()?;

        let probes = if self.parallel {
            self.probe_parallel(loader)
        } else {
            self.vendors
                .iter()
                .map(|candidate| probe_vendor(candidate, loader.as_ref(), self.verbose))
                .collect()
        };

        let mut report = DiscoveryReport::default();
        for probe in probes {
            report.devices.extend(probe.devices);
            report.failures.extend(probe.failures);
            report.vendors.push(VendorReport {
                vendor: probe.vendor,
                outcome: probe.outcome,
            });
        }

        if self.probe_host {
            match HostReport::probe() {
                Ok(host) => report.host = Some(host),
                Err(e) => crate::warn!("Failed to probe host CPU and RAM: {e}"),
            }
        }

        crate::info!("{}", report);
        Ok(report)
    }

    fn probe_parallel(&self, loader: Arc<dyn DynamicLoader>) -> Vec<VendorProbe> {
        // A deadline past what `Instant` can hold means no deadline.
        let deadline = self
            .timeout_ms
            .and_then(|ms| Instant::now().checked_add(Duration::from_millis(ms)));
        let (tx, rx) = mpsc::channel();
        let dispatch = tracing::dispatcher::get_default(|d| d.clone());

        let mut slots: Vec<Option<VendorProbe>> = Vec::with_capacity(self.vendors.len());
        for (position, candidate) in self.vendors.iter().enumerate() {
            slots.push(None);
            let tx = tx.clone();
            let thread_loader = Arc::clone(&loader);
            let thread_candidate = candidate.clone();
            let dispatch = dispatch.clone();
            let verbose = self.verbose;
            let spawned = std::thread::Builder::new()
                .name(format!("probe-{}", candidate.vendor.name()))
                .spawn(move || {
                    let probe = tracing::dispatcher::with_default(&dispatch, || {
                        probe_vendor(&thread_candidate, thread_loader.as_ref(), verbose)
                    });
                    // The receiver is gone once the deadline has passed.
                    let _ = tx.send((position, probe));
                });
            if let Err(e) = spawned {
                crate::warn!(
                    "Failed to spawn probe thread for {}: {e}. Probing inline",
                    candidate.vendor
                );
                slots[position] = Some(probe_vendor(candidate, loader.as_ref(), self.verbose));
            }
        }
        drop(tx);

        let mut pending = slots.iter().filter(|slot| slot.is_none()).count();
        while pending > 0 {
            let received = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    rx.recv_timeout(deadline - now).ok()
                }
                None => rx.recv().ok(),
            };
            match received {
                Some((position, probe)) => {
                    slots[position] = Some(probe);
                    pending -= 1;
                }
                None => break,
            }
        }

        slots
            .into_iter()
            .zip(&self.vendors)
            .map(|(slot, candidate)| {
                slot.unwrap_or_else(|| {
                    crate::warn!(
                        "{} probe did not finish in time. Abandoning its thread",
                        candidate.vendor
                    );
                    VendorProbe {
                        vendor: candidate.vendor,
                        outcome: VendorOutcome::TimedOut,
                        devices: Vec::new(),
                        failures: Vec::new(),
                    }
                })
            })
            .collect()
    }
}

/// What became of one vendor.
#[derive(serde::Serialize, Debug, Clone)]
pub enum VendorOutcome {
    /// The runtime loaded and reported at least one device.
    Present {
        library: PathBuf,
        driver: DriverVersion,
        device_count: u32,
    },
    /// The runtime loaded but has no usable device.
    PresentEmpty {
        library: PathBuf,
        driver: DriverVersion,
    },
    /// No candidate library could be initialised; one error per candidate.
    Failed { errors: Vec<ProbeError> },
    /// The probe was still running at the deadline.
    TimedOut,
}

impl VendorOutcome {
    pub fn is_present(&self) -> bool {
        matches!(
            self,
            VendorOutcome::Present { .. } | VendorOutcome::PresentEmpty { .. }
        )
    }
}

#[derive(serde::Serialize, Debug, Clone)]
pub struct VendorReport {
    pub vendor: Vendor,
    pub outcome: VendorOutcome,
}

#[derive(serde::Serialize, Debug, Clone)]
pub struct DiscoveredDevice {
    pub vendor: Vendor,
    /// Index within the vendor's own device list.
    pub index: u32,
    /// `GPU-` followed by the device UUID, when the vendor reports one.
    pub id: Option<String>,
    pub properties: DeviceProperties,
    pub memory: MemoryReport,
}

/// A device that was enumerated but could not be probed.
#[derive(serde::Serialize, Debug, Clone)]
pub struct DeviceFailure {
    pub vendor: Vendor,
    pub index: u32,
    pub error: ProbeError,
}

#[derive(serde::Serialize, Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// One entry per configured vendor, in discovery order.
    pub vendors: Vec<VendorReport>,
    /// Vendor discovery order, then ascending index within a vendor.
    pub devices: Vec<DiscoveredDevice>,
    pub failures: Vec<DeviceFailure>,
    pub host: Option<HostReport>,
}

impl DiscoveryReport {
    pub fn has_gpu(&self) -> bool {
        !self.devices.is_empty()
    }

    pub fn outcome(&self, vendor: Vendor) -> Option<&VendorOutcome> {
        self.vendors
            .iter()
            .find(|report| report.vendor == vendor)
            .map(|report| &report.outcome)
    }

    pub fn devices_of(&self, vendor: Vendor) -> impl Iterator<Item = &DiscoveredDevice> {
        self.devices.iter().filter(move |d| d.vendor == vendor)
    }
}

impl std::fmt::Display for DiscoveryReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "DiscoveryReport:")?;
        for report in &self.vendors {
            match &report.outcome {
                VendorOutcome::Present {
                    library,
                    driver,
                    device_count,
                } => crate::i_nln(
                    f,
                    format_args!(
                        "{}: {device_count} device(s), driver {driver}, {}",
                        report.vendor,
                        library.display()
                    ),
                )?,
                VendorOutcome::PresentEmpty { library, driver } => crate::i_nln(
                    f,
                    format_args!(
                        "{}: no devices, driver {driver}, {}",
                        report.vendor,
                        library.display()
                    ),
                )?,
                VendorOutcome::Failed { errors } => crate::i_nln(
                    f,
                    format_args!("{}: unavailable ({} attempt(s))", report.vendor, errors.len()),
                )?,
                VendorOutcome::TimedOut => {
                    crate::i_nln(f, format_args!("{}: timed out", report.vendor))?
                }
            }
        }
        for device in &self.devices {
            crate::i_nln(
                f,
                format_args!(
                    "{} {} {}: {}",
                    device.vendor,
                    device.index,
                    device.properties.name,
                    device.memory
                ),
            )?;
        }
        for failure in &self.failures {
            crate::i_nln(
                f,
                format_args!("{} {} failed: {}", failure.vendor, failure.index, failure.error),
            )?;
        }
        if let Some(host) = &self.host {
            crate::i_nln(f, format_args!("{host}"))?;
        }
        Ok(())
    }
}

struct VendorProbe {
    vendor: Vendor,
    outcome: VendorOutcome,
    devices: Vec<DiscoveredDevice>,
    failures: Vec<DeviceFailure>,
}

/// Tries each candidate path until one initialises, then probes its devices.
fn probe_vendor(
    candidate: &VendorCandidate,
    loader: &dyn DynamicLoader,
    verbose: bool,
) -> VendorProbe {
    let spec = candidate.vendor.spec();
    let mut errors = Vec::new();
    for path in candidate.paths_or_default() {
        match VendorHandle::init(spec, loader, &path, verbose) {
            Ok(initialized) => {
                if !errors.is_empty() {
                    crate::debug!(
                        "{} loaded from {} after {} failed attempt(s)",
                        spec.name,
                        path.display(),
                        errors.len()
                    );
                }
                return probe_devices(initialized);
            }
            Err(e) => {
                crate::warn!("{} unavailable: {e}", spec.name);
                errors.push(e);
            }
        }
    }
    VendorProbe {
        vendor: candidate.vendor,
        outcome: VendorOutcome::Failed { errors },
        devices: Vec::new(),
        failures: Vec::new(),
    }
}

fn probe_devices(initialized: Initialized) -> VendorProbe {
    let Initialized {
        mut handle,
        device_count,
    } = initialized;
    let vendor = handle.vendor();
    let library = handle.library_path().to_path_buf();
    let driver = handle.driver_version();

    let mut devices = Vec::new();
    let mut failures = Vec::new();
    for index in 0..device_count {
        let probed = handle
            .properties(index)
            .and_then(|properties| Ok((properties, handle.bootstrap(index)?)));
        match probed {
            Ok((properties, memory)) => devices.push(DiscoveredDevice {
                vendor,
                index,
                id: properties.uuid_string(),
                properties,
                memory,
            }),
            Err(error) => {
                crate::warn!("{vendor} device {index} skipped: {error}");
                failures.push(DeviceFailure {
                    vendor,
                    index,
                    error,
                });
            }
        }
    }

    if let Err(e) = handle.release() {
        crate::warn!("{vendor} failed to release runtime {}: {e}", library.display());
    }

    let outcome = if device_count == 0 {
        VendorOutcome::PresentEmpty { library, driver }
    } else {
        VendorOutcome::Present {
            library,
            driver,
            device_count,
        }
    };
    VendorProbe {
        vendor,
        outcome,
        devices,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProbeConfig::default();
        let vendors: Vec<Vendor> = config.vendors.iter().map(|c| c.vendor).collect();
        assert_eq!(vendors, Vendor::ALL);
        assert!(!config.parallel);
        assert!(!config.logging_config.logging_enabled);
    }

    #[test]
    fn test_paths_or_default() {
        let musa = VendorCandidate::new(Vendor::Musa);
        assert_eq!(musa.paths_or_default()[0], PathBuf::from("libmusart.so"));
        let custom = VendorCandidate::new(Vendor::Musa).library_path("/opt/musa/lib/libmusart.so");
        assert_eq!(
            custom.paths_or_default(),
            vec![PathBuf::from("/opt/musa/lib/libmusart.so")]
        );
    }

    #[test]
    fn test_initialize_empty_vendors() {
        let mut config = ProbeConfig::new().vendors(Vec::new());
        assert!(config.initialize().is_ok());
        let mut config = ProbeConfig::new().vendors(Vec::new()).error_on_config_issue(true);
        assert!(config.initialize().is_err());
    }

    #[test]
    fn test_initialize_timeout_enables_parallel() {
        let mut config = ProbeConfig::new().timeout(Duration::from_secs(1));
        config.initialize().unwrap();
        assert!(config.parallel);
        let mut config = ProbeConfig::new()
            .timeout(Duration::from_secs(1))
            .error_on_config_issue(true);
        assert!(config.initialize().is_err());
    }

    #[test]
    fn test_timeout_saturates() {
        let config = ProbeConfig::new().timeout(Duration::MAX);
        assert_eq!(config.timeout_ms, Some(u64::MAX));
        let config = ProbeConfig::new().timeout(Duration::from_millis(250));
        assert_eq!(config.timeout_ms, Some(250));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"{
                "vendors": [
                    { "vendor": "Musa", "library_paths": ["/opt/musa/lib/libmusart.so"] },
                    { "vendor": "Cuda" }
                ],
                "parallel": true,
                "timeout_ms": 2500
            }"#,
        )
        .unwrap();
        let config = ProbeConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.vendors.len(), 2);
        assert_eq!(config.vendors[0].vendor, Vendor::Musa);
        assert!(config.vendors[1].library_paths.is_empty());
        assert!(config.parallel);
        assert_eq!(config.timeout_ms, Some(2500));
        assert!(config.probe_host);
    }

    #[test]
    fn test_from_json_file_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"not json").unwrap();
        assert!(ProbeConfig::from_json_file(file.path()).is_err());
    }
}
