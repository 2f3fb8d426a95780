mod cli;

use crate::cli::{Command, FormatArg, NextArgs, CLI};
use clap::Parser;
use snake_id::{
    AtomicCounter, FixedNumber, Id, SnakeIdGenerator, SnakeIdSettings, UdpProbeResolver,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = CLI::parse();

    match config.command {
        Command::Next(args) => {
            for id in mint(&args)? {
                println!("{}", render(id, args.format));
            }
        }
        Command::Encode { id, format } => {
            if id < 0 {
                return Err(format!("id must not be negative: {id}").into());
            }
            println!("{}", render(Id::new(id), format));
        }
        Command::Decode { text, format } => {
            let id = match format {
                FormatArg::Decimal => Id::new(text.parse()?),
                FormatArg::Short => Id::parse_short(&text)?,
                FormatArg::Pretty => Id::parse_pretty(&text)?,
            };
            println!("{id}");
        }
        Command::Inspect { id, layout } => {
            let generator = SnakeIdGenerator::with_sources(
                layout.shard_bits,
                layout.sequence_bits,
                Arc::new(FixedNumber(0)),
                Arc::new(FixedNumber(0)),
                Arc::new(FixedNumber(0)),
            )?;
            let parts = generator.decompose(Id::new(id));
            println!(
                "timestamp={} shard={} sequence={}",
                parts.timestamp, parts.shard, parts.sequence
            );
        }
    }

    Ok(())
}

fn mint(args: &NextArgs) -> Result<Vec<Id>, snake_id::Error> {
    let settings = SnakeIdSettings::builder()
        .shard_bits(args.layout.shard_bits)
        .sequence_bits(args.layout.sequence_bits)
        .precision(args.precision.into())
        .build();

    info!(
        shard_bits = settings.shard_bits,
        sequence_bits = settings.sequence_bits,
        precision = %args.precision,
        count = args.count,
        "minting ids"
    );

    let generator = match args.shard {
        Some(shard) => SnakeIdGenerator::new(
            settings,
            Arc::new(FixedNumber(shard)),
            Arc::new(AtomicCounter::new()),
        )?,
        None => SnakeIdGenerator::from_settings(settings, &UdpProbeResolver::default())?,
    };

    Ok((0..args.count).map(|_| generator.next_id()).collect())
}

fn render(id: Id, format: FormatArg) -> String {
    match format {
        FormatArg::Decimal => id.to_string(),
        FormatArg::Short => id.short_string(),
        FormatArg::Pretty => id.pretty_string(),
    }
}
