use std::io::Write;

use anyhow::Context;
use flakeid::SnowflakeGenerator;

use crate::config::{CliConfig, Command};

/// Executes the configured command, writing results to `out`.
pub fn run(config: &CliConfig, out: &mut impl Write) -> anyhow::Result<()> {
    match &config.command {
        Command::Generate { count } => generate(config, *count, out),
        Command::Decode { id } => decode(config, id, out),
    }
}

fn generate(config: &CliConfig, count: usize, out: &mut impl Write) -> anyhow::Result<()> {
    let generator = SnowflakeGenerator::with_config(config.node, config.flake)?;
    tracing::debug!(node = config.node, count, "generating ids");

    for _ in 0..count {
        writeln!(out, "{}", config.format.render(generator.next_id()))?;
    }
    Ok(())
}

fn decode(config: &CliConfig, input: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let id = config
        .format
        .parse(input.trim())
        .with_context(|| format!("failed to decode {input:?}"))?;
    let parts = id.decode(&config.flake.layout());

    writeln!(out, "id:        {id}")?;
    writeln!(out, "timestamp: {}", parts.timestamp_ms)?;
    writeln!(out, "node:      {}", parts.node)?;
    writeln!(out, "sequence:  {}", parts.sequence)?;
    writeln!(out, "base64:    {}", id.to_base64())?;
    writeln!(out, "md5:       {}", id.to_md5())?;
    Ok(())
}
