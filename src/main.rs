#![forbid(unsafe_code)]

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{Level as TraceLevel, debug, info};
use tracing_subscriber::FmtSubscriber;

use tome::config::ConfigStore;
use tome::constants::config::APP_DIR;
use tome::font::FontLibrary;
use tome::locale::ConfigLocale;
use tome::text::{Text, TextContext};

#[derive(Parser, Debug)]
#[command(name = "tome")]
#[command(about = "Inspect config files and lay out the texts they define")]
struct Args {
    /// Verbose logging (-v for debug, -vv for trace), overrides LOG_LEVEL
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every section and entry of a config file
    Dump {
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,

        /// Encryption key for encrypted files
        #[arg(long)]
        key: Option<String>,
    },

    /// Read one value
    Get {
        file: PathBuf,
        section: String,
        key: String,

        /// Type to read the value as
        #[arg(long = "as", value_enum, default_value_t = ReadAs::String)]
        read_as: ReadAs,

        /// List item to read
        #[arg(long)]
        index: Option<usize>,
    },

    /// Write an encrypted copy of a config file
    Encrypt {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        key: Option<String>,
    },

    /// Write a plain-text copy of an encrypted config file
    Decrypt {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        key: Option<String>,
    },

    /// Build the text defined by a config section and print its layout
    Layout {
        file: PathBuf,
        section: String,

        /// Wrap width, unconstrained when omitted
        #[arg(long)]
        width: Option<f32>,

        /// Truncation height, only applied with a width
        #[arg(long)]
        height: Option<f32>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ReadAs {
    String,
    S32,
    U32,
    Float,
    Bool,
    Vector,
}

fn init_logging(verbose: u8) -> Result<()> {
    let log_level = match verbose {
        0 => match std::env::var("LOG_LEVEL")
            .unwrap_or_else(|_| "info".to_string())
            .to_lowercase()
            .as_str()
        {
            "trace" => TraceLevel::TRACE,
            "debug" => TraceLevel::DEBUG,
            "warn" => TraceLevel::WARN,
            "error" => TraceLevel::ERROR,
            _ => TraceLevel::INFO,
        },
        1 => TraceLevel::DEBUG,
        _ => TraceLevel::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Relative paths are tried in the working directory, then in the user's
/// config directory
fn resolve_config_path(path: &Path) -> PathBuf {
    if path.is_absolute() || path.exists() {
        return path.to_path_buf();
    }

    match dirs::config_dir().map(|dir| dir.join(APP_DIR).join(path)) {
        Some(candidate) if candidate.exists() => {
            debug!(path = %candidate.display(), "Using config from user config directory");
            candidate
        }
        _ => path.to_path_buf(),
    }
}

fn load_store(file: &Path, key: Option<&str>) -> Result<ConfigStore> {
    let path = resolve_config_path(file);
    let mut store = ConfigStore::new();
    if key.is_some() {
        store.set_encryption_key(key);
    }
    store
        .load(&path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;
    Ok(store)
}

fn dump(file: &Path, json: bool, key: Option<&str>) -> Result<()> {
    let store = load_store(file, key)?;
    let snapshot = store.snapshot();

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    for section in &snapshot {
        match &section.parent {
            Some(parent) => println!("[{}@{}]", section.name, parent),
            None => println!("[{}]", section.name),
        }
        for (key, value) in &section.entries {
            println!("{key} = {value}");
        }
        println!();
    }
    Ok(())
}

fn get(file: &Path, section: &str, key: &str, read_as: ReadAs, index: Option<usize>) -> Result<()> {
    let mut store = load_store(file, None)?;
    if !store.has_section(section) {
        bail!("Section not found: {section}");
    }
    store.select_section(section)?;
    if !store.has_value(key) {
        bail!("Value not found: {section}.{key}");
    }

    let value = match (read_as, index) {
        (ReadAs::String, None) => store.get_string(key),
        (ReadAs::String, Some(i)) => store.get_list_string(key, i),
        (ReadAs::S32, None) => store.get_s32(key).to_string(),
        (ReadAs::S32, Some(i)) => store.get_list_s32(key, i).to_string(),
        (ReadAs::U32, None) => store.get_u32(key).to_string(),
        (ReadAs::U32, Some(i)) => store.get_list_u32(key, i).to_string(),
        (ReadAs::Float, None) => store.get_float(key).to_string(),
        (ReadAs::Float, Some(i)) => store.get_list_float(key, i).to_string(),
        (ReadAs::Bool, None) => store.get_bool(key).to_string(),
        (ReadAs::Bool, Some(i)) => store.get_list_bool(key, i).to_string(),
        (ReadAs::Vector, None) => store.get_vector(key).to_string(),
        (ReadAs::Vector, Some(i)) => store.get_list_vector(key, i).to_string(),
    };
    println!("{value}");
    Ok(())
}

fn convert(input: &Path, output: &Path, key: Option<&str>, encrypt: bool) -> Result<()> {
    let store = load_store(input, key)?;
    store
        .save(output, encrypt)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(
        input = %input.display(),
        output = %output.display(),
        encrypted = encrypt,
        "Converted config file"
    );
    Ok(())
}

#[derive(Serialize)]
struct LayoutReport<'a> {
    text: &'a Text,
    overflow: &'a str,
}

fn layout(file: &Path, section: &str, width: Option<f32>, height: Option<f32>, json: bool) -> Result<()> {
    let mut store = load_store(file, None)?;
    let mut fonts = FontLibrary::new();
    let locale = ConfigLocale::new();
    let mut ctx = TextContext::new(&mut store, &mut fonts, &locale);

    let mut text = Text::from_config(section, &mut ctx)
        .with_context(|| format!("Failed to build text from section {section}"))?;
    if let Some(width) = width {
        text.set_size(width, height.unwrap_or(0.0));
    }

    if json {
        let report = LayoutReport {
            overflow: text.overflow(),
            text: &text,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let (width, height) = text.size();
    println!("font: {}", text.font().map(|font| font.name()).unwrap_or("none"));
    println!("size: {width} x {height}");
    for (index, line) in text.lines().iter().enumerate() {
        let content = text.string().get(line.start..line.end).unwrap_or_default();
        println!("line {index}: {:?} ({} x {})", content, line.width, line.height);
    }
    for marker in text.markers() {
        println!("marker @{}: {}", marker.offset, serde_json::to_string(&marker.data)?);
    }
    if !text.overflow().is_empty() {
        println!("overflow: {:?}", text.overflow());
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    match args.command {
        Command::Dump { file, json, key } => dump(&file, json, key.as_deref()),
        Command::Get {
            file,
            section,
            key,
            read_as,
            index,
        } => get(&file, &section, &key, read_as, index),
        Command::Encrypt { input, output, key } => convert(&input, &output, key.as_deref(), true),
        Command::Decrypt { input, output, key } => convert(&input, &output, key.as_deref(), false),
        Command::Layout {
            file,
            section,
            width,
            height,
            json,
        } => layout(&file, &section, width, height, json),
    }
}
