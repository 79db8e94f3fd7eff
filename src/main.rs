use anyhow::Result;
use empic_rs::{run, Config};

fn main() -> Result<()> {
    let cfg = Config::new()?;
    run(cfg)
}
