use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;

mod commands;
mod utils;

#[derive(Parser)]
#[command(name = "rivulet-cmd")]
#[command(about = "Command-line utility for rivulet container operations")]
#[command(version)]
struct Cli {
    /// Log progress at info level (ignores RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query against a SQLite database and write its result to a container
    Export {
        /// Path to the SQLite database file
        #[arg(long)]
        db: String,

        /// Query text
        #[arg(short, long, conflicts_with = "query_file", required_unless_present = "query_file")]
        query: Option<String>,

        /// File holding the query text
        #[arg(long)]
        query_file: Option<String>,

        /// Query time limit in seconds (0 for none)
        #[arg(long, default_value_t = 0)]
        timeout: u64,

        /// Record type name stored in the container schema
        #[arg(long, default_value = "query_result")]
        record_name: String,

        /// Target size of an encoded block, in bytes
        #[arg(long)]
        block_size: Option<usize>,

        /// Rename duplicate column labels instead of failing
        #[arg(long)]
        rename_duplicates: bool,

        /// Extra header property as NAME=VALUE (can be specified multiple times)
        #[arg(short, long = "property")]
        properties: Vec<String>,

        /// Output container path
        output: String,
    },

    /// Inspect a container and display summary information
    Inspect {
        /// Verify every block (reads the whole container)
        #[arg(long)]
        full: bool,

        /// Container path to inspect
        path: String,
    },

    /// Print the rows of a container as JSON lines
    Dump {
        /// Stop after this many rows
        #[arg(short = 'n', long)]
        limit: Option<u64>,

        /// Container path to read
        path: String,
    },

    /// Generate the synthetic test tables and stream their cross join
    Generate {
        /// Seed of the data generator
        #[arg(long, default_value_t = rivulet_testkit::data_gen::DEFAULT_SEED)]
        seed: u64,

        /// Row count of each of the three tables
        #[arg(short = 'n', long, default_value_t = 10)]
        size: usize,

        /// Project every column of the three tables plus a row number
        #[arg(long)]
        all_columns: bool,

        /// Also store the generated tables in this SQLite database file
        #[arg(long)]
        sqlite: Option<String>,

        /// Output container path
        output: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        env_logger::builder().filter_level(LevelFilter::Info).init();
    } else {
        env_logger::init();
    }

    match cli.command {
        Commands::Export {
            db,
            query,
            query_file,
            timeout,
            record_name,
            block_size,
            rename_duplicates,
            properties,
            output,
        } => commands::export::run(commands::export::ExportArgs {
            db,
            query,
            query_file,
            timeout,
            record_name,
            block_size,
            rename_duplicates,
            properties,
            output,
        }),
        Commands::Inspect { full, path } => commands::inspect::run(full, path),
        Commands::Dump { limit, path } => commands::dump::run(limit, path),
        Commands::Generate {
            seed,
            size,
            all_columns,
            sqlite,
            output,
        } => commands::generate::run(seed, size, all_columns, sqlite, output),
    }
}
