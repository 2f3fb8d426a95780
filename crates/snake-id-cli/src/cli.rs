use clap::{Args, Parser, Subcommand, ValueEnum};
use snake_id::{Precision, DEFAULT_SEQUENCE_BITS, DEFAULT_SHARD_BITS};
use std::fmt::{Display, Formatter};

pub const SHARD_BITS_ENV: &str = "SNAKE_ID_SHARD_BITS";
pub const SEQUENCE_BITS_ENV: &str = "SNAKE_ID_SEQUENCE_BITS";
pub const PRECISION_ENV: &str = "SNAKE_ID_PRECISION";
pub const SHARD_ENV: &str = "SNAKE_ID_SHARD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PrecisionArg {
    #[value(name = "seconds")]
    Seconds,
    #[value(name = "milliseconds")]
    Milliseconds,
}

impl From<PrecisionArg> for Precision {
    fn from(value: PrecisionArg) -> Self {
        match value {
            PrecisionArg::Seconds => Precision::Seconds,
            PrecisionArg::Milliseconds => Precision::Milliseconds,
        }
    }
}

impl Display for PrecisionArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Precision::from(*self).fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    #[value(name = "decimal")]
    Decimal,
    #[value(name = "short")]
    Short,
    #[value(name = "pretty")]
    Pretty,
}

impl Display for FormatArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatArg::Decimal => write!(f, "decimal"),
            FormatArg::Short => write!(f, "short"),
            FormatArg::Pretty => write!(f, "pretty"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "snake-id", about = "Mint, encode and decode snake ids")]
pub struct CLI {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Mint new ids
    Next(NextArgs),
    /// Render a decimal id in a text form
    Encode {
        id: i64,
        #[arg(long, value_enum, default_value_t = FormatArg::Short)]
        format: FormatArg,
    },
    /// Parse a text form back into a decimal id
    Decode {
        text: String,
        #[arg(long, value_enum, default_value_t = FormatArg::Short)]
        format: FormatArg,
    },
    /// Split an id into timestamp, shard and sequence
    Inspect {
        id: i64,
        #[command(flatten)]
        layout: LayoutArgs,
    },
}

#[derive(Debug, Args)]
pub struct LayoutArgs {
    #[arg(long, env = SHARD_BITS_ENV, default_value_t = DEFAULT_SHARD_BITS)]
    pub shard_bits: u32,

    #[arg(long, env = SEQUENCE_BITS_ENV, default_value_t = DEFAULT_SEQUENCE_BITS)]
    pub sequence_bits: u32,
}

#[derive(Debug, Args)]
pub struct NextArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,

    #[arg(
        long,
        env = PRECISION_ENV,
        value_enum,
        default_value_t = PrecisionArg::Milliseconds
    )]
    pub precision: PrecisionArg,

    /// Fixed shard number; resolved from the outbound address when absent
    #[arg(long, env = SHARD_ENV)]
    pub shard: Option<i64>,

    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: usize,

    #[arg(long, value_enum, default_value_t = FormatArg::Decimal)]
    pub format: FormatArg,
}
