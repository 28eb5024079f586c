use anyhow::{Context, Result};
use clap::Parser;
use libbufrtree::decoder::DecodedMessage;
use libbufrtree::structs::versions::MessageVersion;
use libbufrtree::tables::TableLoader;
use libbufrtree::{BUFRFile, MessageBlock, parse};
use std::path::PathBuf;
use tablelib::Tables;
use tablelib::prelude::TablesConfig;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "bufrdump")]
#[command(about = "Decode BUFR messages into descriptor trees", long_about = None)]
struct Args {
    /// BUFR file, optionally gzipped
    #[arg(index = 1, required_unless_present = "write_config")]
    file: Option<PathBuf>,

    /// Directory holding the WMO CSV tables
    #[arg(short, long)]
    tables: Option<PathBuf>,

    /// TOML config with the tables directory and extra filename patterns
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write an example config to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,

    /// Only decode the message with this index (0-based)
    #[arg(short, long)]
    message: Option<usize>,

    /// Print sections 0 to 5 of every message
    #[arg(short, long)]
    sections: bool,

    /// Print the value grid of every subset instead of the tree
    #[arg(long)]
    values: bool,

    /// More logging (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

fn init_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let level = args.log_level();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("libbufrtree={0},bufrdump={0},tablelib={0}", level))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    if let Some(path) = &args.write_config {
        TablesConfig::default_example().save_to_file(path)?;
        println!("Example config written to {}", path.display());
        return Ok(());
    }

    let Some(path) = args.file.as_deref() else {
        return Ok(());
    };
    let file = parse(path).with_context(|| format!("Failed to read {}", path.display()))?;
    info!("Found {} messages in {}", file.message_count(), path.display());

    let config = args
        .config
        .as_ref()
        .map(TablesConfig::load_from_file)
        .transpose()?;
    let mut loader = TableLoader::from_config(config.as_ref(), args.tables.as_deref())?;

    let mut embedded = Tables::default();
    let table_messages = file.load_embedded_tables(&mut embedded);
    if table_messages > 0 {
        info!("Using tables from {} table-definition messages", table_messages);
    }

    for (index, block) in selected(&file, args.message) {
        println!("=== Message {} ===", index);
        if args.sections {
            println!("{}", block);
        }
        if block.is_table_definition() {
            println!("Table-definition message");
            continue;
        }

        let tables = if table_messages > 0 {
            &embedded
        } else {
            match loader.load(block.master_table_version()) {
                Ok(tables) => tables,
                Err(e) => {
                    error!("No tables for message {}: {}", index, e);
                    continue;
                }
            }
        };

        match block.decode(tables) {
            Ok(decoded) if args.values => print_values(&decoded),
            Ok(decoded) => print!("{}", decoded.tree),
            Err(e) => error!("Message {} at offset {} failed: {}", index, block.offset(), e),
        }
    }

    Ok(())
}

fn selected(file: &BUFRFile, only: Option<usize>) -> Vec<(usize, &MessageBlock)> {
    match only {
        Some(index) => match file.message_at(index) {
            Some(block) => vec![(index, block)],
            None => {
                warn!("Message {} not found, the file has {}", index, file.message_count());
                vec![]
            }
        },
        None => file.messages().iter().enumerate().collect(),
    }
}

fn print_values(decoded: &DecodedMessage) {
    for subset in 0..decoded.subset_grids() {
        let grid = decoded.project_values(subset);
        println!("--- Subset {} ({} x {}) ---", subset + 1, grid.rows(), grid.cols());
        for row in grid.iter_rows() {
            let Some(&node) = row.first() else {
                continue;
            };
            let item = decoded.tree.item(node);
            let values = (0..grid.cols())
                .map(|col| match decoded.value(node, col) {
                    Some(value) => value.to_string(),
                    None => "MISSING".to_string(),
                })
                .collect::<Vec<_>>()
                .join(" ");
            println!("{:<40} {} {}", item.name, values, item.unit);
        }
    }
}
