//! Command implementations for rivulet-cmd

use std::{fs::File, io::BufReader};

use anyhow::{Context, Result};
use rivulet_container::ContainerReader;

use crate::utils;

pub mod dump;
pub mod export;
pub mod generate;
pub mod inspect;

/// Opens a container file and reads its header.
pub fn open_container(path: &str) -> Result<ContainerReader<BufReader<File>>> {
    utils::validate_file_exists(path)?;
    let file = File::open(path).with_context(|| format!("Failed to open {path}"))?;
    ContainerReader::open(BufReader::new(file))
        .with_context(|| format!("Failed to read the container header of {path}"))
}
