use anyhow::bail;
use clap::{Parser, Subcommand, ValueEnum};
use flakeid::{DEFAULT_NODE_BITS, DEFAULT_STEP_BITS, FlakeConfig, FlakeId, TWITTER_EPOCH_MS};

/// Command-line arguments for the `flakeid` binary.
///
/// Every global option can also be supplied through the environment (or a
/// `.env` file). The layout options must match the ones IDs were generated
/// with, otherwise `decode` reports garbage fields.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "flakeid",
    version,
    about = "Generate and decode Snowflake-style IDs"
)]
pub struct CliArgs {
    /// Node id encoded into generated IDs.
    ///
    /// Environment variable: `FLAKEID_NODE`
    #[arg(
        long,
        env = "FLAKEID_NODE",
        default_value_t = 0,
        global = true,
        allow_negative_numbers = true
    )]
    pub node: i64,

    /// Epoch in milliseconds since 1970-01-01 UTC.
    ///
    /// Environment variable: `FLAKEID_EPOCH_MS`
    #[arg(
        long,
        env = "FLAKEID_EPOCH_MS",
        default_value_t = TWITTER_EPOCH_MS,
        global = true,
        allow_negative_numbers = true
    )]
    pub epoch_ms: i64,

    /// Bits reserved for the node id.
    ///
    /// Environment variable: `FLAKEID_NODE_BITS`
    #[arg(long, env = "FLAKEID_NODE_BITS", default_value_t = DEFAULT_NODE_BITS, global = true)]
    pub node_bits: u8,

    /// Bits reserved for the per-millisecond sequence.
    ///
    /// Environment variable: `FLAKEID_STEP_BITS`
    #[arg(long, env = "FLAKEID_STEP_BITS", default_value_t = DEFAULT_STEP_BITS, global = true)]
    pub step_bits: u8,

    /// Rendering used for printed and parsed IDs.
    #[arg(short, long, value_enum, default_value_t = Format::Decimal, global = true)]
    pub format: Format,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print freshly generated IDs, one per line.
    Generate {
        /// How many IDs to print.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
    /// Split an ID into timestamp, node and sequence.
    Decode {
        /// The ID, in the rendering selected by `--format`.
        #[arg(allow_negative_numbers = true)]
        id: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Decimal,
    Base2,
    Base36,
}

impl Format {
    pub fn render(self, id: FlakeId) -> String {
        match self {
            Self::Decimal => id.to_string(),
            Self::Base2 => id.to_base2(),
            Self::Base36 => id.to_base36(),
        }
    }

    pub fn parse(self, s: &str) -> Result<FlakeId, flakeid::ParseIdError> {
        match self {
            Self::Decimal => s.parse(),
            Self::Base2 => FlakeId::from_base2(s),
            Self::Base36 => FlakeId::from_base36(s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub flake: FlakeConfig,
    pub node: i64,
    pub format: Format,
    pub command: Command,
}

impl TryFrom<CliArgs> for CliConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let flake = FlakeConfig::new(args.epoch_ms, args.node_bits, args.step_bits);

        if !flake.is_valid() {
            bail!(
                "FLAKEID_NODE_BITS ({}) + FLAKEID_STEP_BITS ({}) exceeds {} bits",
                args.node_bits,
                args.step_bits,
                FlakeConfig::MAX_FIELD_BITS
            );
        }

        let layout = flake.layout();
        if !layout.contains_node(args.node) {
            return Err(flakeid::Error::InvalidNodeId {
                node: args.node,
                max: layout.node_max(),
            }
            .into());
        }

        if let Command::Generate { count: 0 } = args.command {
            bail!("--count must be greater than 0");
        }

        Ok(Self {
            flake,
            node: args.node,
            format: args.format,
            command: args.command,
        })
    }
}
