use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = decision_journal_cli::Cli::parse();
    decision_journal_cli::run_cli(cli)
}
