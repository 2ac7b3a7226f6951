use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use richmark::{Converter, ConverterOptions, Tag, DEFAULT_MAX_INPUT_LEN};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "richmark")]
#[command(about = "Convert between Markdown and sanitized rich-text HTML")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert Markdown to sanitized HTML
    ToHtml(ConvertArgs),

    /// Convert HTML to Markdown
    ToMarkdown(ConvertArgs),

    /// Sanitize HTML against the allow-list
    Sanitize(ConvertArgs),

    /// Check text for script injection patterns (exit status 1 when unsafe)
    Check {
        /// Input file (stdin when omitted)
        input: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ConvertArgs {
    /// Input file (stdin when omitted)
    input: Option<PathBuf>,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Bullet list marker: '-', '*' or '+'
    #[arg(long, default_value_t = '-')]
    bullet: char,

    /// Emphasis delimiter: '_' or '*'
    #[arg(long, default_value_t = '_')]
    em_delimiter: char,

    /// Reject inputs longer than this many bytes
    #[arg(long, default_value_t = DEFAULT_MAX_INPUT_LEN)]
    max_input_len: usize,

    /// Remove a tag from the allow-list (repeatable)
    #[arg(long = "deny-tag", value_name = "TAG")]
    deny_tags: Vec<String>,
}

impl ConvertArgs {
    fn converter(&self) -> anyhow::Result<Converter> {
        if !matches!(self.bullet, '-' | '*' | '+') {
            bail!("invalid bullet marker {:?}, expected '-', '*' or '+'", self.bullet);
        }
        if !matches!(self.em_delimiter, '_' | '*') {
            bail!("invalid emphasis delimiter {:?}, expected '_' or '*'", self.em_delimiter);
        }

        let mut options = ConverterOptions::default();
        options.markdown.bullet_list_marker = self.bullet;
        options.markdown.em_delimiter = self.em_delimiter;
        options.max_input_len = self.max_input_len;

        for name in &self.deny_tags {
            let Some(tag) = Tag::from_name(name) else {
                bail!("unknown tag {name:?}");
            };
            debug!(tag = tag.name(), "denying tag");
            options.policy = options.policy.deny_tag(tag);
        }

        Ok(Converter::with_options(options))
    }
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ToHtml(args) => {
            let converter = args.converter()?;
            let input = read_input(args.input.as_deref())?;
            let html = converter.try_parse_from_markdown(&input)?;
            write_output(args.output.as_deref(), &html)?;
        }
        Commands::ToMarkdown(args) => {
            let converter = args.converter()?;
            let input = read_input(args.input.as_deref())?;
            let markdown = converter.try_render_to_markdown(&input)?;
            write_output(args.output.as_deref(), &markdown)?;
        }
        Commands::Sanitize(args) => {
            let converter = args.converter()?;
            let input = read_input(args.input.as_deref())?;
            if input.len() > args.max_input_len {
                bail!(
                    "input of {} bytes exceeds the {} byte limit",
                    input.len(),
                    args.max_input_len
                );
            }
            write_output(args.output.as_deref(), &converter.sanitize(&input))?;
        }
        Commands::Check { input } => {
            let input = read_input(input.as_deref())?;
            if !richmark::is_safe(input.as_str()) {
                println!("unsafe");
                return Ok(ExitCode::FAILURE);
            }
            println!("safe");
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("failed to read stdin")?;
            Ok(input)
        }
    }
}

fn write_output(path: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => fs::write(path, format!("{content}\n"))
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{content}").context("failed to write stdout")
        }
    }
}
