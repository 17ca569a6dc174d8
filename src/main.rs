use anyhow::Result;
use clap::Parser;
use tikv_jemallocator::Jemalloc;

use aksearch::cli::SubCommandExtend;
use aksearch::config::{Opts, SubCommand};

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let opts = Opts::parse();
    std::fs::create_dir_all(opts.conf_dir.path())?;

    match &opts.subcmd {
        SubCommand::Add(cmd) => cmd.run(&opts).await,
        SubCommand::Search(cmd) => cmd.run(&opts).await,
        SubCommand::Remove(cmd) => cmd.run(&opts).await,
        SubCommand::Server(cmd) => cmd.run(&opts).await,
    }
}
