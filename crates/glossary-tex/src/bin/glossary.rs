//! glossary - command-line access to the glossary parser and format engine

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use glossary_tex::{
    format_text, parse_document, parse_fragment, write_document, FormatDescriptor, FormatType,
    GlossaryConfig,
};

#[derive(Parser)]
#[command(name = "glossary", version, about = "Parse and format LaTeX glossary entries")]
struct Cli {
    /// Configuration file (defaults to the user configuration directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a glossary document and report its categories and entries
    Import {
        file: PathBuf,
        /// Print the parsed document as JSON
        #[arg(long)]
        json: bool,
    },
    /// Re-export a glossary document in canonical layout
    Normalize {
        file: PathBuf,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Encode raw text into a field fragment
    Format {
        text: String,
        /// normal, bold, italic, math-bold, math-italic, escaped (or a command such as \textbf)
        #[arg(long = "type", default_value = "normal", value_parser = parse_format_type)]
        format_type: FormatType,
        #[arg(long)]
        math: bool,
        #[arg(long)]
        first_letter_bold: bool,
    },
    /// Decode a field fragment into raw text and a descriptor
    Decode { fragment: String },
}

fn parse_format_type(s: &str) -> Result<FormatType, String> {
    match s.to_lowercase().as_str() {
        "normal" => Ok(FormatType::Normal),
        "bold" => Ok(FormatType::Bold),
        "italic" => Ok(FormatType::Italic),
        "math-bold" => Ok(FormatType::MathBold),
        "math-italic" => Ok(FormatType::MathItalic),
        "escaped" => Ok(FormatType::EscapedBackslash),
        other if other.starts_with('\\') => Ok(FormatType::from_str(other)),
        other => Err(format!("unknown format type: {}", other)),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => GlossaryConfig::load(path)?,
        None => GlossaryConfig::load_or_default(),
    };

    match cli.command {
        Command::Import { file, json } => {
            let source = std::fs::read_to_string(&file)?;
            let result = parse_document(&source, &config);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                for category in &result.document.categories {
                    println!("{} ({} entries)", category.name, category.entries.len());
                }
                for error in &result.errors {
                    eprintln!("line {}: {}", error.line, error.message);
                }
            }
            Ok(if result.errors.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }
        Command::Normalize { file, output } => {
            let source = std::fs::read_to_string(&file)?;
            let result = parse_document(&source, &config);
            let content = write_document(&result.document, &config);
            match output {
                Some(path) => std::fs::write(path, content)?,
                None => print!("{}", content),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Format {
            text,
            format_type,
            math,
            first_letter_bold,
        } => {
            let descriptor = FormatDescriptor {
                format_type,
                is_math_mode: math,
                first_letter_bold,
            };
            println!("{}", format_text(&text, &descriptor));
            Ok(ExitCode::SUCCESS)
        }
        Command::Decode { fragment } => {
            let decoded = parse_fragment(&fragment)?;
            println!("{}", serde_json::to_string_pretty(&decoded)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
