//! Simple CLI for HL7 v2 messages
//!
//! A command-line interface for parsing, querying and acknowledging HL7 v2 messages.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use octofhir_hl7::{AckCode, Hl7Config, Message, Value, parse_timestamp};
use serde_json::json;
use std::fs;
use std::io::{self, Read};
use std::process;

#[derive(Parser)]
#[command(name = "octofhir-hl7")]
#[command(about = "Simple HL7 v2 CLI for parsing, querying and acknowledging messages")]
#[command(version)]
#[command(author = "OctoFHIR Team <funyloony@gmail.com>")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<String>,
    /// Drop empty trailing fields when printing messages
    #[arg(long, global = true)]
    compact: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a message and print a segment summary
    Parse {
        /// File containing the message (reads from stdin if not provided)
        #[arg(short, long)]
        file: Option<String>,
        /// Print only OK on success
        #[arg(short, long)]
        quiet: bool,
    },
    /// Read the value at a path such as PID.5.1 or PV1.7[2].3
    Get {
        /// Path to read
        path: String,
        /// File containing the message (reads from stdin if not provided)
        #[arg(short, long)]
        file: Option<String>,
    },
    /// Print a positive acknowledgment for a message
    Ack {
        /// File containing the message (reads from stdin if not provided)
        #[arg(short, long)]
        file: Option<String>,
    },
    /// Print a negative acknowledgment for a message
    Nack {
        /// Acknowledgment code
        #[arg(long, default_value = "AE")]
        code: String,
        /// Error text for MSA.3
        #[arg(long)]
        error: String,
        /// File containing the message (reads from stdin if not provided)
        #[arg(short, long)]
        file: Option<String>,
    },
    /// Dump the message tree as JSON
    Inspect {
        /// File containing the message (reads from stdin if not provided)
        #[arg(short, long)]
        file: Option<String>,
        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
    },
    /// Parse an HL7 timestamp
    Timestamp {
        /// Timestamp text, e.g. 20151231234500.1234-2358
        value: String,
    },
}

fn main() {
    human_panic::setup_panic!();
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config file '{path}'"))?;
            Hl7Config::from_json(&text).with_context(|| format!("parsing config file '{path}'"))?
        }
        None => Hl7Config::default(),
    };
    if cli.compact {
        config.serialize.compact = true;
    }

    match cli.command {
        Commands::Parse { file, quiet } => {
            let message = load_message(file.as_deref())?;
            if quiet {
                println!("OK");
            } else {
                print!("{}", summary(&message));
            }
        }
        Commands::Get { path, file } => {
            let message = load_message(file.as_deref())?;
            println!("{}", display_value(&message.value(&path)?));
        }
        Commands::Ack { file } => {
            let message = load_message(file.as_deref())?;
            let ack = message.build_ack(AckCode::AA, None, &config.ack)?;
            print!("{}", printable(&ack.serialize_with(&config.serialize)));
        }
        Commands::Nack { code, error, file } => {
            let code: AckCode = code.parse()?;
            let message = load_message(file.as_deref())?;
            let nack = message.build_ack(code, Some(&error), &config.ack)?;
            print!("{}", printable(&nack.serialize_with(&config.serialize)));
        }
        Commands::Inspect { file, pretty } => {
            let message = load_message(file.as_deref())?;
            let output = if pretty {
                serde_json::to_string_pretty(&message)?
            } else {
                serde_json::to_string(&message)?
            };
            println!("{output}");
        }
        Commands::Timestamp { value } => {
            let ts = parse_timestamp(&value)?;
            let output = json!({
                "datetime": ts.datetime.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
                "offset": ts.offset.map(|offset| offset.to_string()),
                "precision": ts.precision.to_string(),
                "hl7": ts.to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn load_message(file: Option<&str>) -> Result<Message> {
    let text = if let Some(filename) = file {
        fs::read_to_string(filename).with_context(|| format!("reading file '{filename}'"))?
    } else {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("reading from stdin")?;
        buffer
    };
    Ok(Message::parse(&text)?)
}

fn summary(message: &Message) -> String {
    let encoding = message.encoding();
    let mut out = format!(
        "{} segments, delimiters {}{}, terminator {}\n",
        message.segment_count(),
        encoding.field_separator(),
        encoding.encoding_characters(),
        encoding.segment_terminator()
    );
    for (i, segment) in message.all_segments().iter().enumerate() {
        out.push_str(&format!(
            "{:>4}  {:<4} {} fields\n",
            i + 1,
            segment.name(),
            segment.field_count()
        ));
    }
    out
}

fn display_value(value: &Value) -> String {
    match value.as_str() {
        Some(text) => text.to_string(),
        None => "<null>".to_string(),
    }
}

/// Carriage returns alone would overwrite each line on a terminal
fn printable(wire: &str) -> String {
    let mut out = wire.replace("\r\n", "\n").replace('\r', "\n");
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
