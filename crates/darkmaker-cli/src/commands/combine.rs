use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, ValueEnum};
use darkmaker_core::calibrate::CalibrationSpec;
use darkmaker_core::console::ChannelConsole;
use darkmaker_core::consts::{
    DEFAULT_DISPOSITION_SUBFOLDER, DEFAULT_EXPOSURE_TOLERANCE, DEFAULT_MIN_MAX_DROP,
    DEFAULT_PEDESTAL, DEFAULT_SIGMA_THRESHOLD, DEFAULT_TEMPERATURE_TOLERANCE,
};
use darkmaker_core::group::{GroupingConfig, Tolerance};
use darkmaker_core::io::{scan_descriptors, FitsStore};
use darkmaker_core::session::config::{InputDisposition, OutputTarget, SessionConfig};
use darkmaker_core::session::{spawn_session, CancelFlag, SessionOutcome};
use darkmaker_core::stack::CombineMethod;
use tracing::{debug, info};

use crate::summary::print_session_summary;
use crate::terminal::TerminalPrinter;

#[derive(Clone, ValueEnum)]
pub enum MethodArg {
    Mean,
    Median,
    MinMax,
    SigmaClip,
}

#[derive(Args)]
pub struct CombineArgs {
    /// Input FITS frames
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Session config file (TOML); replaces the settings flags below
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output file, or output directory when grouping
    #[arg(short, long, default_value = "master-dark.fits")]
    pub output: PathBuf,

    /// Combination method
    #[arg(long, value_enum, default_value = "sigma-clip")]
    pub method: MethodArg,

    /// Values dropped from each end for min/max clipping
    #[arg(long, default_value_t = DEFAULT_MIN_MAX_DROP)]
    pub drop: usize,

    /// Threshold in standard deviations for sigma clipping
    #[arg(long, default_value_t = DEFAULT_SIGMA_THRESHOLD)]
    pub sigma: f64,

    /// Subtract a constant pedestal before combining
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = &*DEFAULT_PEDESTAL.to_string().leak(),
        conflicts_with_all = ["bias_file", "bias_dir"]
    )]
    pub pedestal: Option<u16>,

    /// Subtract this bias/dark file before combining
    #[arg(long, conflicts_with = "bias_dir")]
    pub bias_file: Option<PathBuf>,

    /// Subtract the best-matching file from this directory before combining
    #[arg(long)]
    pub bias_dir: Option<PathBuf>,

    /// Group by dimensions and binning
    #[arg(long)]
    pub group_size: bool,

    /// Group by exposure
    #[arg(long)]
    pub group_exposure: bool,

    /// Group by temperature
    #[arg(long)]
    pub group_temperature: bool,

    /// Fractional exposure tolerance for grouping
    #[arg(long, default_value_t = DEFAULT_EXPOSURE_TOLERANCE)]
    pub exposure_tolerance: f64,

    /// Fractional temperature tolerance for grouping
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE_TOLERANCE)]
    pub temperature_tolerance: f64,

    /// Skip groups with fewer files than this
    #[arg(long)]
    pub min_group_size: Option<usize>,

    /// Combine even if not all frames are darks
    #[arg(long)]
    pub ignore_type: bool,

    /// Move inputs into a subfolder afterwards (%d = date, %t = time)
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_DISPOSITION_SUBFOLDER)]
    pub move_inputs: Option<String>,
}

/// Run one session to completion on a worker thread, printing its console
/// lines as they arrive.
///
/// The CLI installs no interrupt handler, so the session's cancel flag is
/// never raised and a run ends either completed or failed.
pub fn run(args: &CombineArgs) -> Result<()> {
    let config = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid session config")?
    } else {
        build_config_from_args(args)?
    };
    debug!(from_file = args.config.is_some(), "Session config ready");

    let store = Arc::new(FitsStore);
    let descriptors = scan_descriptors(store.as_ref(), &args.files)?;
    info!(frames = descriptors.len(), "Scanned input frames");
    print_session_summary(&config, descriptors.len());

    let (console, lines) = ChannelConsole::channel();
    let handle = spawn_session(
        descriptors,
        config,
        store,
        Arc::new(console),
        CancelFlag::new(),
    )
    .context("Failed to start session worker")?;

    let printer = TerminalPrinter::new();
    for line in lines {
        printer.print(&line);
    }
    printer.finish();

    let outcome = handle
        .join()
        .map_err(|_| anyhow!("Session worker panicked"))?;
    match outcome {
        SessionOutcome::Completed { written } => {
            info!(masters = written.len(), "Session complete");
            for path in written {
                println!("Saved to {}", path.display());
            }
            Ok(())
        }
        // Unreachable from the CLI, see above.
        SessionOutcome::Cancelled { .. } => bail!("Session cancelled"),
        SessionOutcome::Failed(e) => {
            let title = e.category().title();
            Err(anyhow::Error::new(e).context(title))
        }
    }
}

fn build_config_from_args(args: &CombineArgs) -> Result<SessionConfig> {
    let method = match args.method {
        MethodArg::Mean => CombineMethod::Mean,
        MethodArg::Median => CombineMethod::Median,
        MethodArg::MinMax => CombineMethod::MinMaxClip {
            drop_per_end: args.drop,
        },
        MethodArg::SigmaClip => CombineMethod::SigmaClip {
            threshold: args.sigma,
        },
    };

    let calibration = if let Some(amount) = args.pedestal {
        CalibrationSpec::Pedestal { amount }
    } else if let Some(ref path) = args.bias_file {
        CalibrationSpec::FixedFile { path: path.clone() }
    } else if let Some(ref path) = args.bias_dir {
        CalibrationSpec::AutoDirectory { path: path.clone() }
    } else {
        CalibrationSpec::None
    };

    let grouping = GroupingConfig {
        by_size: args.group_size,
        by_exposure: args.group_exposure,
        by_temperature: args.group_temperature,
        exposure_tolerance: Tolerance::new(args.exposure_tolerance)?,
        temperature_tolerance: Tolerance::new(args.temperature_tolerance)?,
    };

    let output = if grouping.is_grouped() {
        OutputTarget::Directory(args.output.clone())
    } else {
        OutputTarget::File(args.output.clone())
    };

    let disposition = match args.move_inputs {
        Some(ref template) => InputDisposition::SubFolder {
            name_template: template.clone(),
        },
        None => InputDisposition::Nothing,
    };

    let config = SessionConfig {
        output,
        method,
        calibration,
        grouping,
        ignore_file_type: args.ignore_type,
        min_group_size: args.min_group_size,
        disposition,
    };
    config.validate()?;
    Ok(config)
}
