use clap::{Parser, Subcommand, ValueEnum};

pub mod commands;
pub mod output;

#[derive(Parser)]
#[command(
    name = "testlens",
    version,
    about = "Find test suites and tests in JS/TS files and open them in a browser test runner"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Path to a settings file (default: .testlens/settings.toml or testlens.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Enable debug logging for this run
    #[arg(long, global = true)]
    pub debug: bool,

    /// Override the test runner base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List suites and tests with their run actions
    Scan {
        /// Files or directories to scan (default: current directory)
        #[arg(default_value = ".")]
        paths: Vec<String>,
    },

    /// Open the runner filtered to every test in a suite
    RunModule {
        /// Full suite path, e.g. "Unit | Service > nested"
        suite_path: String,
        /// Print the URL instead of opening a browser
        #[arg(long)]
        print: bool,
    },

    /// Open the runner filtered to a single test
    RunTest {
        /// Full path of the enclosing suite
        suite_path: String,
        /// Test name
        test_name: String,
        /// Print the URL instead of opening a browser
        #[arg(long)]
        print: bool,
    },

    /// Print the runner URL for a suite, or for one test in it
    Url {
        suite_path: String,
        test_name: Option<String>,
    },

    /// Flip the persisted debug flag
    ToggleDebug,
}

#[derive(Clone, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Compact,
}
