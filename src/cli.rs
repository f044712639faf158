use crate::apartment::ApartmentGuard;
use crate::config::types::{ApartmentMode, ApartmentOptions};
use crate::config::GuardConfig;
use crate::crypto::{CipherContext, CipherProvider, LibCrypto};
use crate::handle::{KernelHandle, ModuleHandle, ProcessHandle};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about = "Acquire and release native resources through rawguard owners", long_about = None)]
struct Cli {
    /// Path to a rawguard.json configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a file into a kernel handle
    File {
        path: PathBuf,
    },
    /// Load a dynamic module
    Module {
        name: String,
        /// Symbol to resolve after loading
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Open a process handle
    Process {
        /// Target pid (defaults to this process)
        #[arg(long)]
        pid: Option<u32>,
    },
    /// Initialize and tear down a threading-model apartment
    Apartment {
        /// Threading model (defaults to the configured one)
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },
    /// Load libcrypto and allocate a cipher context
    Cipher {
        /// Library file name (defaults to the platform candidates)
        #[arg(long)]
        library: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Multithreaded,
    ApartmentThreaded,
}

impl From<ModeArg> for ApartmentMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Multithreaded => ApartmentMode::Multithreaded,
            ModeArg::ApartmentThreaded => ApartmentMode::ApartmentThreaded,
        }
    }
}

/// One probe outcome, printed as JSON on stdout.
#[derive(Debug, Serialize)]
struct ProbeReport {
    resource: &'static str,
    target: String,
    acquired: bool,
    detail: Option<String>,
}

pub fn run() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => GuardConfig::load_from_file(path)?,
        None => GuardConfig::load_default()?,
    };
    config.apply();

    let report = probe(cli.command, &config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn probe(command: Commands, config: &GuardConfig) -> Result<ProbeReport> {
    match command {
        Commands::File { path } => {
            let handle = open_kernel_handle(&path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            Ok(ProbeReport {
                resource: "kernel object",
                target: path.display().to_string(),
                acquired: handle.is_valid(),
                detail: Some(format!("{:?}", handle.get())),
            })
        }
        Commands::Module { name, symbol } => {
            let module = ModuleHandle::load(&name)?;
            let detail = match symbol {
                Some(symbol) => {
                    let ptr = module.symbol(&symbol)?;
                    Some(format!("{} at {:p}", symbol, ptr))
                }
                None => None,
            };
            Ok(ProbeReport {
                resource: "dynamic module",
                target: name,
                acquired: module.is_valid(),
                detail,
            })
        }
        Commands::Process { pid } => {
            let pid = pid.unwrap_or_else(std::process::id);
            let process = ProcessHandle::open(pid)?;
            Ok(ProbeReport {
                resource: "process",
                target: pid.to_string(),
                acquired: process.is_valid(),
                detail: Some(format!("{:?}", process.get())),
            })
        }
        Commands::Apartment { mode } => {
            let options = match mode {
                Some(mode) => ApartmentOptions {
                    mode: mode.into(),
                    ..config.apartment
                },
                None => config.apartment,
            };
            let guard = ApartmentGuard::new(options);
            Ok(ProbeReport {
                resource: "apartment",
                target: format!("{:?}", options.mode),
                acquired: guard.ok(),
                detail: Some(format!("{:?}", guard.state())),
            })
        }
        Commands::Cipher { library } => {
            let provider = match &library {
                Some(name) => LibCrypto::load_from(name)?,
                None => LibCrypto::load()?,
            };
            let ctx = CipherContext::new(&provider);
            Ok(cipher_report(
                library.unwrap_or_else(|| "libcrypto".to_string()),
                &ctx,
            ))
        }
    }
}

#[cfg(unix)]
fn open_kernel_handle(path: &Path) -> crate::Result<KernelHandle> {
    KernelHandle::open_read_only(path)
}

#[cfg(windows)]
fn open_kernel_handle(path: &Path) -> crate::Result<KernelHandle> {
    use std::os::windows::io::IntoRawHandle;
    let file = std::fs::File::open(path)?;
    Ok(KernelHandle::from_raw(file.into_raw_handle() as isize))
}

fn cipher_report<P: CipherProvider>(target: String, ctx: &CipherContext<'_, P>) -> ProbeReport {
    ProbeReport {
        resource: "cipher context",
        target,
        acquired: ctx.is_owning(),
        detail: Some(format!(
            "{:?} from {}",
            ctx.state(),
            std::any::type_name_of_val(ctx.provider())
        )),
    }
}
