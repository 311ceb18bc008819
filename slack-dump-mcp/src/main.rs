use clap::Parser;
use std::process;

use slack_dump_mcp::api::slackdump::{CommandRunner, SlackdumpCli};
use slack_dump_mcp::cli::{self, Args, Mode};
use slack_dump_mcp::mcp::SlackDumpServer;
use slack_dump_mcp::services::Dumper;
use slack_dump_mcp::settings;

async fn run(args: Args) -> anyhow::Result<()> {
    let settings = settings::load_settings()?;
    let config = settings::merge_settings_with_args(&args, settings);

    let runner: Box<dyn CommandRunner> =
        Box::new(SlackdumpCli::new(config.slackdump_bin, config.timeout));
    let dumper = Dumper::new(runner, config.temp_dir);

    match args.command.unwrap_or(Mode::Serve) {
        Mode::Serve => SlackDumpServer::new(dumper).serve_stdio().await?,
        Mode::Dump { url } => {
            for line in dumper.dump(&url).await? {
                println!("{line}");
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    cli::init_logging(args.log_level);

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
