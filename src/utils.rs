use std::{env, io::Write, path::PathBuf};

use anyhow::Context;
use chrono::Utc;
use env_logger::Builder;
use log::LevelFilter;

use crate::HOME;

pub fn init_logger(systemd: bool) {
    let mut builder = Builder::new();

    if systemd {
        builder.format(|formatter, record| {
            writeln!(formatter, "[{}]: {}", record.level(), record.args())
        });
    } else {
        builder.format(|formatter, record| {
            writeln!(
                formatter,
                "{} [{}] ({}): {}",
                Utc::now().format("%Y-%m-%d %H:%M:%S %z"),
                record.level(),
                record.target(),
                record.args()
            )
        });
    }

    if let Ok(var) = env::var("RUST_LOG") {
        builder.parse_filters(&var);
    } else {
        // if no RUST_LOG provided, default to logging at the Info level
        builder.filter(None, LevelFilter::Info);
    }

    builder.init();
}

/// The platform data folder this application stores tournaments in.
///
/// # Errors
///
/// If the platform has no data directory.
pub fn data_folder() -> anyhow::Result<PathBuf> {
    let dir = dirs::data_dir().context("unable to locate the platform data directory")?;

    Ok(dir.join(HOME))
}
