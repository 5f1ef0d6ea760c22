//! GPU discovery CLI: probe vendor runtimes and print what they report
//! ==================================================
//!
//! Loads each requested vendor runtime by path, enumerates its devices and
//! prints properties and free memory, plus host CPU and RAM.
//!
//! ## Quick start
//! ```bash
//! cargo run --bin llm-gpu-discovery-cli
//! ```
//!
//! ## Flags
//! | Flag                       | Default                  | Purpose                                            |
//! |----------------------------|--------------------------|----------------------------------------------------|
//! | `--config <PATH>`          | _(none)_                 | JSON probe config; flags below override it.        |
//! | `--vendor <VENDOR>`        | `cuda`, `rocm`, `musa`   | Vendors to probe, in order (repeatable).           |
//! | `--cuda-lib <PATH>`        | vendor sonames           | Runtime library paths to try (repeatable).         |
//! | `--rocm-lib <PATH>`        | vendor sonames           | Same for ROCm HIP.                                 |
//! | `--musa-lib <PATH>`        | vendor sonames           | Same for MUSA.                                     |
//! | `--parallel`               | off                      | One thread per vendor.                             |
//! | `--timeout-ms <MS>`        | _(none)_                 | Abandon vendors still probing after this long.     |
//! | `--json`                   | off                      | Print the report as JSON.                          |
//!
//! ## Examples
//! *Probe only MUSA from a custom install:*
//! ```bash
//! llm-gpu-discovery-cli --vendor musa --musa-lib /usr/local/musa/lib/libmusart.so
//! ```
//!
//! ## Exit codes
//! * `0`: probe ran (vendors may still be unavailable)
//! * `1`: configuration error
//! * `2`: argument parsing error (from **clap**)

use llm_gpu_discovery::*;

#[derive(Debug, clap::Parser)]
#[command(name = "llm-gpu-discovery-cli", version)]
struct Cli {
    /// JSON file holding a probe config.
    #[arg(long, value_name = "PATH")]
    config: Option<std::path::PathBuf>,

    /// Vendors to probe, in discovery order.
    #[arg(long = "vendor", value_enum)]
    vendors: Vec<Vendor>,

    /// CUDA runtime library paths, tried in order.
    #[arg(long, value_name = "PATH")]
    cuda_lib: Vec<std::path::PathBuf>,

    /// ROCm HIP runtime library paths, tried in order.
    #[arg(long, value_name = "PATH")]
    rocm_lib: Vec<std::path::PathBuf>,

    /// MUSA runtime library paths, tried in order.
    #[arg(long, value_name = "PATH")]
    musa_lib: Vec<std::path::PathBuf>,

    /// Probe each vendor on its own thread.
    #[arg(long)]
    parallel: bool,

    /// Give up on vendors still probing after this many milliseconds.
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Log every vendor call.
    #[arg(long)]
    verbose: bool,

    /// Skip the host CPU and RAM report.
    #[arg(long)]
    no_host: bool,

    /// Treat configuration issues as errors.
    #[arg(long)]
    strict: bool,

    /// Also write logs to this directory.
    #[arg(long, value_name = "PATH")]
    log_dir: Option<std::path::PathBuf>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = <Cli as clap::Parser>::parse();

    let mut config = match &cli.config {
        Some(path) => ProbeConfig::from_json_file(path)?,
        None => ProbeConfig::default(),
    };

    if !cli.vendors.is_empty() {
        config = config.vendors(cli.vendors.iter().copied().map(VendorCandidate::new));
    }
    for candidate in config.vendors.iter_mut() {
        let paths = match candidate.vendor {
            Vendor::Cuda => &cli.cuda_lib,
            Vendor::Rocm => &cli.rocm_lib,
            Vendor::Musa => &cli.musa_lib,
        };
        if !paths.is_empty() {
            candidate.library_paths = paths.clone();
        }
    }

    config.parallel |= cli.parallel;
    if let Some(ms) = cli.timeout_ms {
        config = config.timeout(std::time::Duration::from_millis(ms));
    }
    config.verbose |= cli.verbose;
    config.probe_host &= !cli.no_host;
    config.error_on_config_issue |= cli.strict;

    // Logs go to stderr so JSON output stays parseable.
    config = config.logging_enabled(true);
    if cli.verbose {
        config = config.log_level_debug();
    } else if cli.json {
        config = config.log_level_warn();
    }
    if let Some(log_dir) = &cli.log_dir {
        config = config.log_dir(log_dir);
    }

    let report = config.probe()?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
        for device in &report.devices {
            println!("{}", device.properties);
        }
    }

    Ok(())
}
