use std::path::PathBuf;

use clap::{value_parser, ArgAction, Args, Parser, Subcommand, ValueEnum};
use lexi_core::FilterMode;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Admin tool for the lexi word-game data plane",
    long_about = "Imports upstream dictionaries through the provider pipeline, \
manages the language registry, and inspects the durable stores.",
    after_help = "Examples:\n  lexi languages\n  lexi import en-US <COMMIT> \
--dic-sha256 <HEX> --aff-sha256 <HEX> --enable\n  lexi --json jobs"
)]
pub struct LexiCli {
    #[arg(
        short,
        long,
        global = true,
        help = "Suppress human output (errors still print to stderr)"
    )]
    pub quiet: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Increase logging (-vv reaches trace)")]
    pub verbose: u8,
    #[arg(long, global = true, help = "Force trace logging regardless of -v/-q")]
    pub trace: bool,
    #[arg(
        long,
        global = true,
        help = "Emit {status,message,details} JSON envelopes"
    )]
    pub json: bool,
    #[arg(
        long,
        global = true,
        value_parser = value_parser!(PathBuf),
        help = "Data directory (overrides LEXI_DATA_PATH)"
    )]
    pub data_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(
        about = "Run the whole pipeline for one dictionary revision, tracked as a job.",
        override_usage = "lexi import <VARIANT> <COMMIT> --dic-sha256 <HEX> --aff-sha256 <HEX> [--enable]"
    )]
    Import(ImportArgs),
    #[command(
        about = "Stage 1: download and checksum-verify the pinned sources.",
        override_usage = "lexi fetch <VARIANT> <COMMIT> --dic-sha256 <HEX> --aff-sha256 <HEX>"
    )]
    Fetch(FetchArgs),
    #[command(about = "Stage 2: expand the affix dictionary into playable forms.")]
    Expand(StageArgs),
    #[command(about = "Stage 3: derive the guess and answer pools.")]
    Pool(StageArgs),
    #[command(about = "Stage 4: apply the family-safety filter to the answer pool.")]
    Filter(FilterArgs),
    #[command(
        about = "Activate a language from a completed import.",
        override_usage = "lexi enable <VARIANT> <COMMIT> [--min-length N]"
    )]
    Enable(EnableArgs),
    #[command(about = "Disable a language without deleting its artifacts.")]
    Disable {
        #[arg(value_name = "LANGUAGE")]
        id: String,
    },
    #[command(about = "List the language registry.")]
    Languages,
    #[command(about = "List import jobs, newest last.")]
    Jobs,
    #[command(subcommand, about = "Read or write app-config overrides")]
    Config(ConfigCommand),
}

#[derive(Args, Debug)]
pub struct StageArgs {
    #[arg(value_name = "VARIANT", help = "Language variant, e.g. en-US")]
    pub variant: String,
    #[arg(value_name = "COMMIT", help = "Full 40-hex upstream commit")]
    pub commit: String,
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    #[command(flatten)]
    pub stage: StageArgs,
    #[arg(long, value_name = "HEX")]
    pub dic_sha256: String,
    #[arg(long, value_name = "HEX")]
    pub aff_sha256: String,
}

#[derive(Args, Debug)]
pub struct FilterArgs {
    #[command(flatten)]
    pub stage: StageArgs,
    #[arg(long, value_enum, default_value_t = FilterModeCli::DenylistOnly)]
    pub mode: FilterModeCli,
}

#[derive(Args, Debug)]
pub struct EnableArgs {
    #[command(flatten)]
    pub stage: StageArgs,
    #[arg(long, value_name = "N", help = "Minimum secret-word length (3-10)")]
    pub min_length: Option<u8>,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    #[command(flatten)]
    pub fetch: FetchArgs,
    #[arg(long, value_enum, default_value_t = FilterModeCli::DenylistOnly)]
    pub filter_mode: FilterModeCli,
    #[arg(long, help = "Activate the language when every stage succeeds")]
    pub enable: bool,
    #[arg(long, value_name = "N")]
    pub min_length: Option<u8>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    Get {
        #[arg(value_name = "KEY")]
        key: String,
    },
    Set {
        #[arg(value_name = "KEY")]
        key: String,
        #[arg(value_name = "VALUE")]
        value: String,
    },
    Unset {
        #[arg(value_name = "KEY")]
        key: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum FilterModeCli {
    DenylistOnly,
    AllowlistRequired,
}

impl From<FilterModeCli> for FilterMode {
    fn from(mode: FilterModeCli) -> Self {
        match mode {
            FilterModeCli::DenylistOnly => FilterMode::DenylistOnly,
            FilterModeCli::AllowlistRequired => FilterMode::AllowlistRequired,
        }
    }
}
