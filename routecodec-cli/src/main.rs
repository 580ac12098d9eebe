use anyhow::{bail, Context, Result};
use clap::Parser;
use routecodec_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use routecodec_core::schema::FieldRule;
use routecodec_core::{Codec, CodecConfig, Payload, Side, TextEncoding};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "routecodec")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file (defaults plus ROUTECODEC_* variables when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON schema definition for encoding
    #[arg(long)]
    outbound_schema: Option<PathBuf>,

    /// JSON schema definition for decoding
    #[arg(long)]
    inbound_schema: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<LogLevel>,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Encode a JSON payload and print it as text
    Encode {
        /// Dotted message route, e.g. chat.Message
        #[arg(short, long)]
        route: String,

        /// Payload as a JSON object
        #[arg(short, long)]
        payload: String,

        /// Text encoding (base64, base64url, hex, latin1)
        #[arg(short, long)]
        encoding: Option<TextEncoding>,
    },
    /// Decode text and print the payload as JSON
    Decode {
        /// Dotted message route, e.g. chat.Message
        #[arg(short, long)]
        route: String,

        /// Encoded message text
        #[arg(short, long)]
        text: String,

        /// Text encoding (base64, base64url, hex, latin1)
        #[arg(short, long)]
        encoding: Option<TextEncoding>,
    },
    /// Describe the message type a route resolves to
    Lookup {
        /// Schema side (outbound/server, inbound/client)
        #[arg(short, long)]
        side: Side,

        /// Dotted message route, e.g. chat.Message
        #[arg(short, long)]
        route: String,
    },
    /// Print the flat form of a route
    Normalize {
        route: String,
    },
}

fn load_config(args: &Args) -> Result<CodecConfig> {
    let mut config = match &args.config {
        Some(path) => CodecConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => CodecConfig::from_env()?,
    };

    if let Some(path) = &args.outbound_schema {
        config.codec.outbound_schema = Some(path.clone());
    }
    if let Some(path) = &args.inbound_schema {
        config.codec.inbound_schema = Some(path.clone());
    }
    if let Some(level) = args.log_level {
        config.logging.level = level.to_string();
    }
    if args.json_logs {
        config.logging.json_format = true;
    }

    config.validate()?;
    Ok(config)
}

fn run(command: Command, codec: &Codec) -> Result<String> {
    match command {
        Command::Encode { route, payload, encoding } => {
            let value: serde_json::Value =
                serde_json::from_str(&payload).context("payload is not valid JSON")?;
            let payload = match Payload::try_from(value) {
                Ok(payload) => payload,
                Err(other) => bail!("payload must be a JSON object, got {}", other),
            };
            Ok(codec.encode_to_text(&route, &payload, encoding)?)
        }
        Command::Decode { route, text, encoding } => {
            let payload = codec.decode_from_text(&route, &text, encoding)?;
            Ok(serde_json::to_string(&payload)?)
        }
        Command::Lookup { side, route } => {
            let descriptor = codec
                .lookup(side, &route)
                .with_context(|| format!("not such route {} in {} schema", route, side))?;
            let mut lines = vec![descriptor.full_name().to_string()];
            for field in descriptor.message_type().fields() {
                let rule = match field.rule() {
                    FieldRule::Required => "required ",
                    FieldRule::Repeated => "repeated ",
                    FieldRule::Optional => "",
                };
                lines.push(format!(
                    "  {}{} {} = {}",
                    rule,
                    descriptor.field_type_name(field),
                    field.name(),
                    field.number()
                ));
            }
            Ok(lines.join("\n"))
        }
        Command::Normalize { route } => Ok(Codec::normalize_route(&route)),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    let log_config = LogConfig::try_from(&config.logging)?;
    init_logging_with_config(log_config)?;

    debug!(?config, "Configuration loaded");
    let codec = Codec::from_config(&config)?;
    info!(
        outbound = codec.registry(Side::Outbound).is_loaded(),
        inbound = codec.registry(Side::Inbound).is_loaded(),
        "Codec ready"
    );

    let output = run(args.command, &codec)?;
    println!("{}", output);

    Ok(())
}
