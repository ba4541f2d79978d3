pub mod output;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::Category;

#[derive(Parser)]
#[command(name = "branchwatch")]
#[command(author = "Branchwatch Team")]
#[command(version = "0.1.0")]
#[command(about = "Financial fan-out and health probing across retail branch databases", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config directory (default.toml + $BRANCHWATCH_ENV.toml)
    #[arg(short, long, default_value = "config", env = "BRANCHWATCH_CONFIG_DIR")]
    pub config: String,

    /// Emit JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service
    Serve {
        /// Override the configured listen port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run one sequential aggregation pass and print the report
    Aggregate {
        /// First day of the range (YYYY-MM-DD, inclusive)
        #[arg(long)]
        start: NaiveDate,
        /// Last day of the range (YYYY-MM-DD, inclusive)
        #[arg(long)]
        end: NaiveDate,
        /// Only visit branches of this category
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,
    },
    /// Probe every branch concurrently
    Probe {
        /// Probe a single branch by id
        #[arg(short, long)]
        branch: Option<String>,
    },
    /// Fleet statistics from a fresh probe pass
    Stats,
}

fn parse_category(s: &str) -> Result<Category, String> {
    s.parse::<Category>().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aggregate_command() {
        let cli = Cli::try_parse_from([
            "branchwatch",
            "aggregate",
            "--start",
            "2024-01-01",
            "--end",
            "2024-01-31",
            "--category",
            "hardware",
        ])
        .unwrap();

        match cli.command {
            Commands::Aggregate {
                start,
                end,
                category,
            } => {
                assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
                assert_eq!(end, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
                assert_eq!(category, Some(Category::HardwareStore));
            }
            _ => panic!("expected aggregate"),
        }
    }

    #[test]
    fn test_aggregate_requires_dates() {
        assert!(Cli::try_parse_from(["branchwatch", "aggregate", "--start", "2024-01-01"]).is_err());
    }

    #[test]
    fn test_probe_single_branch() {
        let cli = Cli::try_parse_from(["branchwatch", "--json", "probe", "--branch", "b-7"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Probe { branch: Some(ref id) } if id == "b-7"));
    }
}
