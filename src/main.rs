//! dsnparse - Specctra DSN inspector
//!
//! Parses a DSN file and prints its declaration tree.
//!
//! # Usage
//!
//! ```bash
//! dsnparse board.dsn --exclude placement --exclude wiring
//! dsnparse board.dsn --select network
//! ```

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use dsnparse::{dsn, error::Result, Circuit};
use tracing::{info, Level};

/// Specctra DSN inspector
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the DSN file
    #[arg(value_name = "DSN_FILE")]
    dsn_file: PathBuf,

    /// Print only declarations with this name, at any depth
    #[arg(short, long, value_name = "NAME")]
    select: Vec<String>,

    /// Skip declarations (and argument tokens) with this text while parsing
    #[arg(short = 'x', long, value_name = "NAME")]
    exclude: Vec<String>,

    /// Print declaration counts instead of the tree
    #[arg(short, long)]
    count: bool,

    /// Print the nets of the `network` section
    #[arg(short, long)]
    nets: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    // Parse, dropping excluded sections on the way
    info!(path = %args.dsn_file.display(), excluded = args.exclude.len(), "parsing");
    let tree = dsn::parse_file(&args.dsn_file, |literal| {
        !args.exclude.iter().any(|name| name == literal)
    })?;

    if args.nets {
        let circuit = Circuit::from_network(&tree)?;
        for conn in circuit.connections() {
            println!("{}", conn);
        }
        return Ok(());
    }

    let selected: Vec<_> = if args.select.is_empty() {
        tree.roots().collect()
    } else {
        tree.walk()
            .filter(|decl| args.select.iter().any(|name| name == decl.name()))
            .collect()
    };

    if args.count {
        println!("declarations: {}", tree.len());
        println!("top-level:    {}", tree.roots().len());
        println!("selected:     {}", selected.len());
        return Ok(());
    }

    for decl in selected {
        print!("{}", decl);
    }

    Ok(())
}
