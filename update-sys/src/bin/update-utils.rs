// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use nix::mount::MsFlags;
use tracing_subscriber::{EnvFilter, fmt};
use update_sys::boot::boot_device_in;
use update_sys::device::{
    is_removable_device_in, partition_number, root_device, sysfs_block_device,
};
use update_sys::{MountManager, UtilsConfig, boot_kernel_device, filesystem_size};
use update_types::{ActionExitCode, base_error_code, code_to_string};

#[derive(Debug, Parser)]
#[command(name = "update-utils")]
#[command(about = "Inspect devices, filesystems and exit codes used by the update agent")]
struct Args {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Whole-disk device of a partition
    RootDevice { device: String },
    /// Partition number of a partition device
    PartitionNumber { device: String },
    /// sysfs entry of a block device
    SysfsBlock { device: String },
    /// Whether a whole-disk device is removable
    Removable { device: String },
    /// Device the system booted from
    BootDevice,
    /// Kernel partition paired with a root partition (default: the boot device)
    BootKernelDevice { device: Option<String> },
    /// Block count and size of an ext2/3/4 filesystem
    FsSize {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Decode and normalize a raw action exit code
    ErrorCode {
        raw: u32,
        #[arg(long)]
        json: bool,
    },
    /// Mount a filesystem
    Mount {
        device: PathBuf,
        mountpoint: PathBuf,
        #[arg(long)]
        read_only: bool,
        #[arg(long)]
        no_exec: bool,
    },
    /// Unmount a filesystem
    Unmount { mountpoint: PathBuf },
}

/// Prints a path-algebra result, failing on the empty "no answer" value.
fn print_answer(answer: String, what: &str, input: &str) -> Result<()> {
    if answer.is_empty() {
        bail!("no {what} for {input:?}");
    }
    println!("{answer}");
    Ok(())
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("update_utils=info,update_sys=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => UtilsConfig::load(path)?,
        None => UtilsConfig::default(),
    };

    match args.command {
        Command::RootDevice { device } => {
            print_answer(root_device(&device), "root device", &device)?
        }
        Command::PartitionNumber { device } => {
            print_answer(partition_number(&device), "partition number", &device)?
        }
        Command::SysfsBlock { device } => {
            print_answer(sysfs_block_device(&device), "sysfs entry", &device)?
        }
        Command::Removable { device } => {
            println!("{}", is_removable_device_in(&config.sysfs_block_dir, &device));
        }
        Command::BootDevice => {
            print_answer(boot_device_in(&config), "boot device", "/")?;
        }
        Command::BootKernelDevice { device } => {
            let device = device.unwrap_or_else(|| boot_device_in(&config));
            print_answer(boot_kernel_device(&device), "kernel device", &device)?
        }
        Command::FsSize { path, json } => {
            let size = filesystem_size(&path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&size)?);
            } else {
                println!("block_count: {}", size.block_count);
                println!("block_size: {}", size.block_size);
                println!("total_bytes: {}", size.total_bytes());
            }
        }
        Command::ErrorCode { raw, json } => {
            let code = ActionExitCode::from_raw(raw);
            let base = base_error_code(code);
            if json {
                let report = serde_json::json!({
                    "raw": raw,
                    "code": code,
                    "label": code_to_string(code),
                    "base": base.base(),
                    "base_label": code_to_string(base),
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{} -> {}", code_to_string(code), code_to_string(base));
            }
        }
        Command::Mount {
            device,
            mountpoint,
            read_only,
            no_exec,
        } => {
            if unsafe { libc::geteuid() } != 0 {
                tracing::warn!("Not running as root; mount will likely be refused");
            }
            let mut flags = MsFlags::empty();
            if read_only {
                flags |= MsFlags::MS_RDONLY;
            }
            if no_exec {
                flags |= MsFlags::MS_NOEXEC;
            }
            MountManager::from_config(&config).mount(&device, &mountpoint, flags)?;
        }
        Command::Unmount { mountpoint } => {
            MountManager::from_config(&config).unmount(&mountpoint)?;
        }
    }

    Ok(())
}
