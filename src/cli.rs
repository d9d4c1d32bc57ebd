use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// elig: bulk loan-eligibility checker
#[derive(Parser)]
#[command(name = "elig", version, about)]
pub struct Cli {
    /// Keep the token in memory only for this invocation
    #[arg(long, global = true)]
    pub no_cache: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Get a token (cached if still valid, otherwise freshly generated)
    Token,

    /// List the rows parsed from a CSV file
    Rows {
        #[arg(long)]
        csv: PathBuf,
    },

    /// Print one row's request payload as editable JSON
    Payload {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        row: usize,
    },

    /// Check eligibility for a single payload
    Check(CheckArgs),

    /// Submit every row of a CSV file, one request at a time
    Bulk {
        #[arg(long)]
        csv: PathBuf,
        /// Write the result table to this CSV file
        #[arg(long, num_args = 0..=1, default_missing_value = crate::report::DEFAULT_EXPORT_FILE)]
        export: Option<PathBuf>,
        /// Also print each row's raw response
        #[arg(long)]
        raw: bool,
        /// Drop already collected results if the token expires mid-run
        #[arg(long)]
        discard_partial: bool,
    },
}

#[derive(Args)]
#[group(required = true, multiple = true)]
pub struct CheckArgs {
    /// Inline JSON payload
    #[arg(long, conflicts_with_all = ["payload_file", "row"])]
    pub payload: Option<String>,

    /// File holding a JSON payload (e.g. edited output of `elig payload`)
    #[arg(long, conflicts_with = "row")]
    pub payload_file: Option<PathBuf>,

    /// Take the payload of row N from --csv
    #[arg(long, requires = "csv")]
    pub row: Option<usize>,

    #[arg(long, requires = "row")]
    pub csv: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bulk_export_default_file() {
        let cli = Cli::parse_from(["elig", "bulk", "--csv", "in.csv", "--export"]);
        match cli.command {
            Commands::Bulk { export, .. } => {
                assert_eq!(export, Some(PathBuf::from("eligibility_results.csv")));
            }
            _ => panic!("expected bulk"),
        }
    }

    #[test]
    fn test_check_requires_a_payload_source() {
        assert!(Cli::try_parse_from(["elig", "check"]).is_err());
        assert!(Cli::try_parse_from(["elig", "check", "--payload", "{}"]).is_ok());
        assert!(Cli::try_parse_from(["elig", "check", "--row", "2"]).is_err());
        assert!(Cli::try_parse_from(["elig", "check", "--row", "2", "--csv", "a.csv"]).is_ok());
        assert!(Cli::try_parse_from([
            "elig", "check", "--payload", "{}", "--payload-file", "p.json"
        ])
        .is_err());
    }
}
