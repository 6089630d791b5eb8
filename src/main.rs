use std::path::PathBuf;
use std::process;

use clap::Parser;
use env_logger::Env;
use log::{debug, info};

#[derive(Parser, Debug)]
#[command(
    name = "gb2gff",
    version = env!("CARGO_PKG_VERSION"),
    about = "Convert a Genbank file to GFF3",
    long_about = None
)]
struct Args {
    /// Genbank file to read
    genbank_in_file: PathBuf,
    /// GFF3 file to write, replaced if it exists
    gff_out_name: PathBuf,
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    debug!("{:?}", args);

    match gb2gff::convert(&args.genbank_in_file, &args.gff_out_name) {
        Ok(summary) => {
            info!(
                "Converted {} records, {} features ({} skipped)",
                summary.records, summary.features, summary.skipped
            );
        }
        Err(e) => {
            debug!("{:?}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
