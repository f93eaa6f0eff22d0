//! `fluentree` command line: load a file through the loader registry and run
//! a path query over it.

mod commands;
mod util;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

pub use commands::query::QueryArgs;

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "FLUENTREE_LOG";

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "fluentree", version, about = "Query CSV and JSON-ML data with path expressions")]
pub struct Cli {
    #[command(flatten)]
    pub query: QueryArgs,
    /// Log at debug level regardless of FLUENTREE_LOG.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let output = commands::query::run(&cli.query)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A second initialization (tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_full_command_line() {
        let cli = Cli::try_parse_from([
            "fluentree",
            "data.csv",
            "--type",
            "text/csv",
            "--query",
            "//_",
            "--no-header",
            "--field",
            "0=id",
            "--field",
            "1=name",
            "--delimiter",
            ";",
            "--unique",
            "--format",
            "json",
            "--namespace",
            "j=urn:j",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        let args = cli.query;
        assert_eq!(args.source.to_str(), Some("data.csv"));
        assert_eq!(args.header(), Some(false));
        assert_eq!(args.fields, vec![("0".into(), "id".into()), ("1".into(), "name".into())]);
        assert_eq!(args.delimiter, Some(';'));
        assert!(args.unique && !args.reverse && !args.fragment);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.namespaces, vec![("j".into(), "urn:j".into())]);
    }

    #[rstest]
    #[case(&["--header"], Some(true))]
    #[case(&["--no-header"], Some(false))]
    #[case(&[], None)]
    fn header_switches(#[case] extra: &[&str], #[case] expected: Option<bool>) {
        let mut argv = vec!["fluentree", "in.csv", "-t", "text/csv", "-q", "*"];
        argv.extend_from_slice(extra);
        let cli = Cli::try_parse_from(argv).unwrap();
        assert_eq!(cli.query.header(), expected);
    }

    #[rstest]
    #[case(&["fluentree", "in.csv", "-q", "*"])]
    #[case(&["fluentree", "in.csv", "-t", "text/csv"])]
    #[case(&["fluentree", "in.csv", "-t", "text/csv", "-q", "*", "--header", "--no-header"])]
    #[case(&["fluentree", "in.csv", "-t", "text/csv", "-q", "*", "--field", "broken"])]
    fn rejects_incomplete_or_conflicting(#[case] argv: &[&str]) {
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
