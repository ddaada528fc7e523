//! CLI entry point for the photo mosaic composition tool

use clap::Parser;
use photomosaic::io::cli::{Cli, MosaicProcessor};

fn main() -> photomosaic::Result<()> {
    let cli = Cli::parse();
    let mut processor = MosaicProcessor::new(cli);
    processor.process()
}
