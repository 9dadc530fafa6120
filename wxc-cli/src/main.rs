//! WXC CLI - Command line tool for comparing historical weather between two locations.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "wxc-cli",
    version,
    about = "Compare historical weather between two locations"
)]
struct Cli {
    #[command(subcommand)]
    command: wxc_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    wxc_cmd::run(cli.command).await
}
