use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use darkmaker_core::io::{scan_descriptors, FitsStore};

#[derive(Args)]
pub struct InfoArgs {
    /// FITS files to describe
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let descriptors = scan_descriptors(&FitsStore, &args.files)?;

    println!(
        "{:<32} {:>11} {:>4} {:>9} {:>8} {:<10} {:<8}",
        "File", "Size", "Bin", "Exposure", "Temp", "Filter", "Type"
    );
    for d in &descriptors {
        println!(
            "{:<32} {:>11} {:>4} {:>8}s {:>7}C {:<10} {:<8}",
            d.name(),
            format!("{}x{}", d.width(), d.height()),
            d.binning(),
            d.exposure(),
            d.temperature(),
            d.filter(),
            d.frame_type()
        );
    }
    Ok(())
}
