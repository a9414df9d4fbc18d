use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
pub struct Cli {
    /// Disk image file, created if it does not exist
    pub image: PathBuf,

    /// Number of 4 KiB blocks in the disk image
    pub blocks: usize,
}
