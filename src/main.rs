use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cfg = attractor_studio::config::Config::parse();
    attractor_studio::app::run(cfg)
}
