use clap::{ArgAction, Parser, Subcommand};

use crate::settings::SETTINGS_FILE;

#[derive(Parser)]
#[command(name = "slack-emoji-ranking")]
#[command(about = "Rank emoji reactions across Slack channels and post the results")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Settings file path
    #[arg(long, default_value = SETTINGS_FILE, global = true)]
    pub settings: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Tally reactions in every channel and post the ranking
    Rank {
        /// Print the report without posting it
        #[arg(long)]
        dry_run: bool,

        /// Channel to post the report to, overrides the settings file
        #[arg(short, long)]
        channel: Option<String>,

        /// Also write the full rankings as JSON to this path
        #[arg(short, long)]
        json: Option<String>,
    },

    /// List the channels that would be ranked
    ListChannels,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rank_defaults() {
        let cli = Cli::try_parse_from(["slack-emoji-ranking", "rank"]).unwrap();

        assert_eq!(cli.verbose, 0);
        assert_eq!(cli.settings, "settings.toml");
        assert!(matches!(
            cli.command,
            Commands::Rank {
                dry_run: false,
                channel: None,
                json: None
            }
        ));
    }

    #[test]
    fn test_parse_rank_with_options() {
        let cli = Cli::try_parse_from([
            "slack-emoji-ranking",
            "-vv",
            "rank",
            "--dry-run",
            "--channel",
            "#random",
            "--json",
            "ranking.json",
            "--settings",
            "other.toml",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.settings, "other.toml");
        match cli.command {
            Commands::Rank {
                dry_run,
                channel,
                json,
            } => {
                assert!(dry_run);
                assert_eq!(channel.as_deref(), Some("#random"));
                assert_eq!(json.as_deref(), Some("ranking.json"));
            }
            Commands::ListChannels => unreachable!("expected rank"),
        }
    }

    #[test]
    fn test_parse_list_channels() {
        let cli = Cli::try_parse_from(["slack-emoji-ranking", "list-channels"]).unwrap();
        assert!(matches!(cli.command, Commands::ListChannels));
    }

    #[test]
    fn test_parse_requires_subcommand() {
        assert!(Cli::try_parse_from(["slack-emoji-ranking"]).is_err());
    }
}
