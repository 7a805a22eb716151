//! CLI tool for converting plato dialogues.
//!
//! Converts between PlatoText (storage), PlatoHtml (display) and CMJ
//! (chat-message JSON), batch-converts whole directories, and prepares or
//! folds in the payloads exchanged with a language-model executor.

mod config;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::warn;

use plato_serializer_core::{
    apply_reply, clean_text, cmj_json_to_text, convert, infer_role,
    pipeline::{convert_all, PipelineConfig, PipelineResult},
    text_to_cmj, AssistantReply, Conversion, Format, LlmRequest, LlmSettings,
};

use crate::config::{Loader, PlatoConfig};

/// Convert plato dialogues between text, markup and chat-message JSON.
#[derive(Parser, Debug)]
#[command(name = "plato-serialize")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file layered over the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Speaker treated as the assistant (overrides machine.name)
    #[arg(long, global = true)]
    assistant_name: Option<String>,

    /// Log dropped items and progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one dialogue
    Convert {
        /// Input file; stdin when omitted or "-"
        input: Option<PathBuf>,

        /// Source format (text, html, cmj); guessed from the input extension when omitted
        #[arg(long)]
        from: Option<Format>,

        /// Target format (text, html, cmj)
        #[arg(long)]
        to: Format,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail when any block, paragraph or message had to be dropped
        #[arg(long)]
        strict: bool,
    },

    /// Print the role each speaker gets
    Role {
        #[arg(required = true)]
        speakers: Vec<String>,
    },

    /// Convert every dialogue file under a directory
    Batch {
        /// Root directory containing dialogue files
        #[arg(long)]
        root: PathBuf,

        /// Output directory; the input tree is mirrored here
        #[arg(long)]
        output_dir: PathBuf,

        /// Source format; guessed per file when omitted
        #[arg(long)]
        from: Option<Format>,

        /// Target format
        #[arg(long)]
        to: Format,
    },

    /// Print the request payload for the model executor
    Request {
        /// PlatoText or PlatoHtml dialogue; stdin when omitted or "-"
        input: Option<PathBuf>,

        /// Source format (text or html); guessed from the extension when omitted
        #[arg(long)]
        from: Option<Format>,

        /// Extra sampling setting as key=value (repeatable)
        #[arg(long = "set", value_parser = parse_key_value)]
        settings: Vec<(String, String)>,
    },

    /// Append a model reply to a dialogue and print the new PlatoText
    Reply {
        /// Dialogue that was sent (PlatoText, PlatoHtml or CMJ)
        #[arg(long)]
        dialogue: PathBuf,

        /// Executor reply as JSON; stdin when omitted or "-"
        #[arg(long)]
        reply: Option<PathBuf>,

        /// Source format of the dialogue; guessed from the extension when omitted
        #[arg(long)]
        from: Option<Format>,

        /// Output file for the new PlatoText; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    Ok((key.trim().to_string(), value.to_string()))
}

fn load_config(args: &Args) -> Result<PlatoConfig, Box<dyn std::error::Error>> {
    let mut loader = Loader::new();
    if let Some(path) = &args.config {
        loader = loader.with_file(path);
    }
    loader = loader.with_env();
    if let Some(name) = &args.assistant_name {
        loader = loader.set_override("machine.name", name.as_str())?;
    }
    Ok(loader.build()?)
}

fn read_input(path: Option<&Path>) -> Result<String, Box<dyn std::error::Error>> {
    let text = match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .map_err(|e| format!("could not read {}: {e}", path.display()))?,
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(clean_text(&text))
}

fn write_output(path: Option<&Path>, text: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(path) => fs::write(path, text)
            .map_err(|e| format!("could not write {}: {e}", path.display()))?,
        None => {
            print!("{text}");
            if !text.is_empty() && !text.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}

fn resolve_format(explicit: Option<Format>, path: Option<&Path>) -> Result<Format, String> {
    explicit
        .or_else(|| path.and_then(Format::from_path))
        .ok_or_else(|| "cannot guess the input format; pass --from".to_string())
}

fn report<T>(converted: &Conversion<T>) {
    for diagnostic in &converted.diagnostics {
        warn!("dropped {diagnostic}");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(if args.verbose {
        "info"
    } else {
        "error"
    }))
    .format_timestamp(None)
    .init();

    let config = load_config(&args)?;
    let dialogue = config.dialogue();

    match args.command {
        Command::Convert {
            input,
            from,
            to,
            output,
            strict,
        } => {
            let from = resolve_format(from, input.as_deref())?;
            let source = read_input(input.as_deref())?;
            let converted = convert(&source, from, to, &dialogue)?;
            report(&converted);
            if strict && !converted.is_clean() {
                return Err(format!("{} items were dropped", converted.diagnostics.len()).into());
            }
            write_output(output.as_deref(), &converted.output)?;
        }

        Command::Role { speakers } => {
            for speaker in speakers {
                println!("{}\t{}", speaker, infer_role(&speaker, dialogue.assistant_name()));
            }
        }

        Command::Batch {
            root,
            output_dir,
            from,
            to,
        } => {
            let pipeline = PipelineConfig { from, to, dialogue };
            println!("Converting dialogues from {:?}...", root);
            let result: PipelineResult = convert_all(&root, &output_dir, &pipeline)?;

            println!("\n[summary]");
            println!("  Files found: {}", result.total_files);
            println!("  Converted: {}", result.converted_files);
            println!("  Failed: {}", result.failed_files);
            println!("  Dropped items: {}", result.total_diagnostics);
            println!("  Output: {:?}", output_dir);
        }

        Command::Request {
            input,
            from,
            settings,
        } => {
            let from = resolve_format(from, input.as_deref())?;
            let source = read_input(input.as_deref())?;
            let mut llm_settings = config.llm_settings();
            llm_settings.merge(LlmSettings::from_query_pairs(settings));

            let machine = config.machine();
            let request = match from {
                Format::Text => LlmRequest::from_text(&source, &machine, &llm_settings),
                Format::Html => LlmRequest::from_html(&source, &machine, &llm_settings),
                Format::Cmj => return Err("requests are built from text or html dialogues".into()),
            };
            report(&request);
            println!("{}", serde_json::to_string_pretty(&request.output)?);
        }

        Command::Reply {
            dialogue: dialogue_path,
            reply,
            from,
            output,
        } => {
            let from = resolve_format(from, Some(dialogue_path.as_path()))?;
            let source = read_input(Some(dialogue_path.as_path()))?;
            let text = match from {
                Format::Cmj => {
                    let converted = cmj_json_to_text(&source)?;
                    report(&converted);
                    converted.output
                }
                _ => convert(&source, from, Format::Text, &dialogue)?.output,
            };
            let messages = text_to_cmj(&text, &dialogue).output;

            let reply = AssistantReply::from_json(&read_input(reply.as_deref())?)?;
            let outcome = apply_reply(messages, &reply, &config.machine());
            if let Some(thoughts) = &outcome.thoughts {
                eprintln!("[thoughts]\n{thoughts}");
            }
            match outcome.plato_text {
                Some(text) => write_output(output.as_deref(), &text)?,
                None => eprintln!("The assistant passed; dialogue unchanged."),
            }
        }
    }

    Ok(())
}
