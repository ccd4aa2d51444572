use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser)]
#[command(name = "trackfolio")]
#[command(version, about = "Investment portfolio tracker with simulated market data")]
#[command(
    long_about = "Track stock, crypto, ETF, bond and commodity holdings, value them against a simulated quote feed, and review allocation, performance and rebalancing suggestions."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Act as this user (defaults to $TRACKFOLIO_USER, the config file, or "local")
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Path to the TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the holdings database
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add, edit, list, import and export holdings
    Holdings {
        #[command(subcommand)]
        action: HoldingsCommands,
    },

    /// Portfolio valuation and analysis
    Portfolio {
        #[command(subcommand)]
        action: PortfolioCommands,
    },

    /// Simulated market quotes
    Market {
        #[command(subcommand)]
        action: MarketCommands,
    },
}

#[derive(Subcommand)]
pub enum HoldingsCommands {
    /// Add a new holding
    Add {
        /// Ticker symbol (e.g., AAPL, BTC)
        symbol: String,

        /// Display name
        #[arg(short, long, default_value = "")]
        name: String,

        /// Category: Stock, Crypto, ETF, Bond, Commodity, Other
        #[arg(short, long, default_value = "Stock")]
        category: String,

        /// Units held
        #[arg(short, long)]
        quantity: f64,

        /// Average cost per unit
        #[arg(long)]
        cost: f64,

        /// Purchase date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },

    /// Edit fields of an existing holding
    Edit {
        /// Holding ID (see `holdings list`)
        id: i64,

        #[arg(long)]
        symbol: Option<String>,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        quantity: Option<f64>,

        #[arg(long)]
        cost: Option<f64>,

        /// Purchase date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },

    /// Remove a holding
    Remove {
        /// Holding ID (see `holdings list`)
        id: i64,
    },

    /// List holdings with optional filters
    List {
        /// Case-insensitive match on symbol or name
        #[arg(short, long)]
        search: Option<String>,

        /// Only these categories (repeatable)
        #[arg(short, long)]
        category: Vec<String>,

        /// gainers, losers, highest-gain (>= 10%) or lowest-loss (<= -5%)
        #[arg(short, long)]
        performance: Option<String>,

        /// Group the output by category
        #[arg(short, long)]
        group: bool,
    },

    /// Import holdings from a JSON or CSV file
    Import {
        /// Path to the .json or .csv file
        file: PathBuf,

        /// Preview only, don't save to database
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Export holdings to a file
    Export {
        /// Output path (defaults to portfolio-assets-YYYY-MM-DD.<format>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = ExportFormatArg::Json)]
        format: ExportFormatArg,

        /// Write to stdout instead of a file
        #[arg(long)]
        stdout: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ExportFormatArg {
    Json,
    Csv,
}

#[derive(Subcommand)]
pub enum PortfolioCommands {
    /// Show totals, best/worst performers, allocation and positions
    Show,

    /// Simulated value history
    Performance {
        /// 1W, 1M or 3M
        #[arg(short, long, default_value = "1M")]
        range: String,
    },

    /// Suggest trades toward target weights
    Rebalance {
        /// SYMBOL=PERCENT (repeatable, e.g. --target AAPL=40)
        #[arg(short, long = "target")]
        targets: Vec<String>,
    },

    /// Keep the summary current as the quote feed ticks
    Watch {
        /// Stop after this many updates
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        ticks: Option<u64>,
    },

    /// Simulated holdings history next to market benchmarks
    Compare {
        /// SPY, QQQ or DIA (repeatable)
        #[arg(short, long = "benchmark", default_values = ["SPY", "QQQ"])]
        benchmarks: Vec<String>,

        /// Held symbols to include (defaults to every holding)
        #[arg(short, long = "symbol")]
        symbols: Vec<String>,

        /// 1W, 1M or 3M
        #[arg(short, long, default_value = "1M")]
        range: String,
    },
}

#[derive(Subcommand)]
pub enum MarketCommands {
    /// One snapshot of simulated quotes
    Quotes {
        /// Symbols to quote (defaults to the market overview list)
        symbols: Vec<String>,
    },

    /// Stream watchlist quotes until interrupted
    Watch {
        /// Stop after this many updates
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        ticks: Option<u64>,

        /// Symbols to watch (defaults to the configured watchlist)
        symbols: Vec<String>,
    },
}
