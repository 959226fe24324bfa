use clap::Parser;
use slack_emoji_ranking::{Cli, Commands, commands, logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("rustls crypto provider already installed");
    }

    let result = match cli.command {
        Commands::Rank {
            dry_run,
            channel,
            json,
        } => commands::run_rank(&cli.settings, dry_run, channel, json).await,
        Commands::ListChannels => commands::run_list_channels(&cli.settings).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
