// src/main.rs
// Process bootstrap: parse args, initialise logging, hand off to the
// library's `run`.

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = blockvote_node::Args::parse();
    blockvote_node::run(args).await
}
