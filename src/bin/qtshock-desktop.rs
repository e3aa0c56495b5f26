#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::PathBuf;
use clap::Parser;
use log::info;
use msgbox::IconType;
use qtshock_desktop::{init_logging, run};
use qtshock_desktop::bridge::constants::DEFAULT_BACKEND;
use qtshock_desktop::error::{error_msgbox, AppRunError, SettingsError};

#[derive(Debug, Parser)]
#[command(name = "qtshock-desktop", version, about = "Desktop control panel for QTShock devices")]
struct Cli {
    /// Path to the backend helper executable.
    #[arg(long, default_value = DEFAULT_BACKEND)]
    backend: PathBuf,
}

fn main() -> Result<(), AppRunError> {
    let cli = Cli::parse();

    init_logging();
    info!(concat!("QTShock Desktop ", env!("CARGO_PKG_VERSION")));

    match run(cli.backend) {
        Err(AppRunError::SettingsError { source: SettingsError::CanNotLock { .. } }) => {
            msgbox::create(
                concat!("QTShock Desktop ", env!("CARGO_PKG_VERSION")),
                "This application has already been started",
                IconType::Error,
            ).expect("Could not create msgbox");
            Ok(())
        },
        Err(err) => {
            error_msgbox("Unexpected error", &err);
            Err(err)
        }
        Ok(_) => Ok(())
    }
}
