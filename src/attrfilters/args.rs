use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "attrfilters")]
#[command(about = "Compile and query category attribute filter rules", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Dir with gzipped CSV exports of the attribute tables (e.g. attribute.csv.gz)
    #[arg(short, long, global = true)]
    pub data: Option<PathBuf>,

    /// Category tree file in JSON format
    #[arg(short, long, global = true)]
    pub cats: Option<PathBuf>,

    /// Import the same data X times, making the catalog X times larger
    #[arg(long, global = true, default_value_t = 0)]
    pub expand_db: usize,

    /// Config directory (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import and compile the tables, then report what was loaded
    Import {
        /// Dump the rule of this category after importing
        #[arg(long)]
        dump: Option<u32>,
    },

    /// Show the visible attributes for a category
    Find {
        /// Category ID
        #[arg(long)]
        cid: u32,

        /// Selected option as <attribute>-<option> (repeatable)
        #[arg(short, long = "attr")]
        attributes: Vec<String>,

        /// Options per attribute (0 = default, max 1000)
        #[arg(long)]
        page: Option<usize>,

        /// Only show options of an attribute starting with a prefix, as <attribute>:<prefix>
        #[arg(long)]
        filter: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Dump compiled category rules
    Dump {
        /// Only this category
        #[arg(long)]
        cid: Option<u32>,

        /// Options listed per attribute
        #[arg(long)]
        max_lines: Option<usize>,
    },
}
