use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(about = "Builds and inspects simple-fs images")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Format an image and copy every regular file of a host directory into its root
    Pack {
        /// Host directory to copy from
        #[arg(long, short)]
        source: PathBuf,

        /// Image file to create
        #[arg(long, short)]
        image: PathBuf,

        /// Image size in blocks
        #[arg(long, short, default_value_t = 64)]
        blocks: usize,
    },
    /// List the root directory of an image
    Ls {
        #[arg(long, short)]
        image: PathBuf,
    },
    /// Report inconsistencies left behind by interrupted operations
    Check {
        #[arg(long, short)]
        image: PathBuf,
    },
}
