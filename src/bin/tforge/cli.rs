use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tforge",
    about = "Inspect molecular topologies and trajectories",
    version,
    author,
    before_help = crate::display::banner_for_help(),
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub output: OutputOptions,
}

#[derive(Subcommand)]
pub enum Command {
    /// Summarize a topology and its first frame
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// Read every frame of a trajectory and report per-frame statistics
    #[command(visible_alias = "s")]
    Scan(ScanArgs),

    /// List registered formats and attribute kinds
    #[command(visible_alias = "f")]
    Formats(FormatsArgs),
}

/// Console options shared by all commands.
#[derive(Args)]
pub struct OutputOptions {
    /// Suppress banner, progress, and tables (for scripting)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Input options shared by info and scan.
#[derive(Args)]
#[command(next_help_heading = "Input")]
pub struct InputOptions {
    /// Topology file (format chosen by extension)
    #[arg(value_name = "TOPOLOGY")]
    pub topology: PathBuf,

    /// Trajectory file; "-" reads XYZ from stdin. Defaults to the topology file
    #[arg(short, long, value_name = "FILE")]
    pub trajectory: Option<PathBuf>,

    /// Topology format tag, overriding the extension
    #[arg(long = "topology-format", value_name = "TAG")]
    pub topology_format: Option<String>,

    /// Trajectory format tag, overriding the extension
    #[arg(long = "trajectory-format", value_name = "TAG")]
    pub trajectory_format: Option<String>,

    /// Ingestion settings (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl InputOptions {
    pub fn reads_stdin(&self) -> bool {
        self.trajectory.as_deref().is_some_and(|p| p.as_os_str() == "-")
    }
}

#[derive(Args)]
pub struct InfoArgs {
    #[command(flatten)]
    pub input: InputOptions,

    /// Print the first N rows of every attribute column
    #[arg(long, value_name = "N", default_value = "0")]
    pub head: usize,
}

#[derive(Args)]
pub struct ScanArgs {
    #[command(flatten)]
    pub input: InputOptions,

    /// Start at this frame (requires a seekable trajectory when > 0)
    #[arg(long, value_name = "INDEX", default_value = "0")]
    pub start: usize,

    /// Stop before this frame
    #[arg(long, value_name = "INDEX")]
    pub stop: Option<usize>,

    /// Visit every N-th frame
    #[arg(long, value_name = "N", default_value = "1", value_parser = parse_stride)]
    pub stride: usize,
}

#[derive(Args)]
pub struct FormatsArgs {
    /// Ingestion settings (TOML) whose attributes should be listed
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

fn parse_stride(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("stride must be at least 1".into()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("invalid stride: '{s}'")),
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn scan_arguments() {
        let cli = Cli::try_parse_from([
            "tforge", "-vv", "scan", "top.xyz", "-t", "-", "--stride", "2", "--stop", "10",
        ])
        .unwrap();
        assert_eq!(cli.output.verbose, 2);
        let Command::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert!(args.input.reads_stdin());
        assert_eq!(args.stride, 2);
        assert_eq!(args.stop, Some(10));
        assert_eq!(args.start, 0);
    }

    #[test]
    fn zero_stride_is_rejected() {
        assert!(Cli::try_parse_from(["tforge", "scan", "a.xyz", "--stride", "0"]).is_err());
    }

    #[test]
    fn info_with_config() {
        let cli = Cli::try_parse_from(["tforge", "info", "atoms.csv", "-c", "ingest.toml", "-q"])
            .unwrap();
        assert!(cli.output.quiet);
        let Command::Info(args) = cli.command else {
            panic!("expected info");
        };
        assert_eq!(args.input.config, Some(PathBuf::from("ingest.toml")));
        assert!(!args.input.reads_stdin());
    }
}
