//! # ucsconv CLI - iconv style character set converter
//!
//! Command-line interface for converting files between encodings, resolving
//! encoding aliases and building external `.cct` table files.

#[cfg(feature = "cli")]
use std::fs::{self, File};
#[cfg(feature = "cli")]
use std::io::{self, BufWriter, Read, Write};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use log::debug;
#[cfg(feature = "cli")]
use serde::Serialize;

#[cfg(feature = "cli")]
use ucsconv::ccs::{Bits, TableBuilder};
#[cfg(feature = "cli")]
use ucsconv::ces::{self, CesKind, Decoder};
#[cfg(feature = "cli")]
use ucsconv::external::TableFileWriter;
#[cfg(feature = "cli")]
use ucsconv::{
    Config, Direction, DiscardSink, Error as ConvError, Iconv, InputCursor, OutputCursor,
    Unmappable, aliases, tables,
};

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI features disabled. Enable with --features cli");
    std::process::exit(1);
}

/// ucsconv: character set conversion through UCS
#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "ucsconv")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Directory holding iconv_data/ (overrides NLSPATH)
    #[arg(long, global = true)]
    nls_path: Option<PathBuf>,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Convert a file between character encodings
    Convert(ConvertArgs),

    /// Show the canonical name of an encoding alias
    Resolve(ResolveArgs),

    /// List all known encodings
    List(ListArgs),

    /// Display detailed information about an encoding
    Info(InfoArgs),

    /// Check that a file is valid in an encoding
    Validate(ValidateArgs),

    /// Build an external .cct table from a mapping file
    Mktable(MktableArgs),
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ConvertArgs {
    /// Source encoding
    #[arg(short = 'f', long = "from")]
    from: String,

    /// Target encoding
    #[arg(short = 't', long = "to")]
    to: String,

    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Fail on characters the target cannot represent instead of writing '?'
    #[arg(short = 'c', long)]
    strict: bool,

    /// Read buffer size (KB)
    #[arg(long, default_value = "64")]
    buffer_size: usize,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ResolveArgs {
    /// Encoding alias
    alias: String,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ListArgs {
    /// Show aliases and table origin
    #[arg(long)]
    details: bool,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct InfoArgs {
    /// Encoding to describe
    encoding: String,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ValidateArgs {
    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Expected encoding
    #[arg(short, long)]
    encoding: String,

    /// Show position of first error
    #[arg(long)]
    show_errors: bool,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct MktableArgs {
    /// Character set name stored in the table
    name: String,

    /// Code width of the character set
    #[arg(long)]
    bits: TableBits,

    /// Mapping file with "0xCODE 0xUCS" lines
    mapfile: PathBuf,

    /// Output file (installed under the NLS path if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[cfg(feature = "cli")]
#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, Debug, ValueEnum)]
enum TableBits {
    #[value(name = "8")]
    Eight,
    #[value(name = "16")]
    Sixteen,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct ConversionResult {
    success: bool,
    from: String,
    to: String,
    bytes_processed: usize,
    bytes_written: usize,
    irreversible: usize,
    processing_time_ms: u64,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct EncodingInfo {
    name: &'static str,
    aliases: Vec<&'static str>,
    scheme: Option<CesKind>,
    builtin_table: bool,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct ValidationResult {
    encoding: String,
    valid: bool,
    bytes_checked: usize,
    error_offset: Option<usize>,
    error: Option<String>,
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match cli.nls_path {
        Some(ref path) => Config::with_nls_path(path),
        None => Config::from_env(),
    };
    debug!("configuration: {:?}", config);

    match cli.command {
        Commands::Convert(ref args) => convert_command(args, &cli, &config)?,
        Commands::Resolve(ref args) => resolve_command(args, &cli)?,
        Commands::List(ref args) => list_command(args, &cli)?,
        Commands::Info(ref args) => info_command(args, &cli, &config)?,
        Commands::Validate(ref args) => validate_command(args, &cli, &config)?,
        Commands::Mktable(ref args) => mktable_command(args, &cli, &config)?,
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>> {
    Ok(match path {
        Some(path) => Box::new(
            File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path.display()))?,
        ),
        None => Box::new(io::stdin().lock()),
    })
}

#[cfg(feature = "cli")]
fn read_all(path: Option<&Path>) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    open_input(path)?
        .read_to_end(&mut buffer)
        .context("Failed to read input")?;
    Ok(buffer)
}

#[cfg(feature = "cli")]
fn convert_command(args: &ConvertArgs, cli: &Cli, config: &Config) -> Result<()> {
    let start_time = std::time::Instant::now();

    let mut cd = Iconv::open_with(&args.to, &args.from, config).with_context(|| {
        format!(
            "Failed to open conversion from {} to {}",
            args.from, args.to
        )
    })?;
    if args.strict {
        cd.set_unmappable(Unmappable::Fail);
    }
    if cli.verbose {
        eprintln!("Converting from {} to {}", cd.from_name(), cd.to_name());
    }

    let mut reader = open_input(args.input.as_deref())?;
    let mut writer: Box<dyn Write> = match args.output {
        Some(ref path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create output file: {}", path.display())
        })?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let chunk = args.buffer_size.max(1) * 1024;
    let max_len = cd.max_char_len(Direction::FromUcs);
    let mut inbuf = vec![0u8; chunk];
    let mut outbuf = vec![0u8; chunk * max_len + max_len];
    // bytes of an incomplete character carried into the next read
    let mut pending: Vec<u8> = Vec::new();

    let mut processed = 0;
    let mut written = 0;
    let mut irreversible = 0;

    loop {
        let n = reader.read(&mut inbuf).context("Failed to read input")?;
        let eof = n == 0;
        pending.extend_from_slice(&inbuf[..n]);

        let mut input = InputCursor::new(&pending);
        loop {
            let mut out = OutputCursor::new(&mut outbuf);
            let result = cd.convert(&mut input, &mut out);
            writer
                .write_all(out.filled())
                .context("Failed to write output")?;
            written += out.filled().len();

            match result {
                Ok(count) => {
                    irreversible += count;
                    break;
                }
                Err(ConvError::OutputFull) => continue,
                Err(ConvError::BadSequence) if !eof => break,
                Err(err) => {
                    writer.flush().ok();
                    return Err(err).with_context(|| {
                        format!(
                            "Conversion failed at input byte {}",
                            processed + input.consumed()
                        )
                    });
                }
            }
        }

        let consumed = input.consumed();
        processed += consumed;
        pending.drain(..consumed);
        if eof {
            break;
        }
    }

    let mut out = OutputCursor::new(&mut outbuf);
    cd.reset(Some(&mut out))
        .context("Failed to write final shift sequence")?;
    writer.write_all(out.filled())?;
    written += out.filled().len();
    writer.flush().context("Failed to write output")?;
    cd.close()?;

    let processing_time = start_time.elapsed();

    if cli.verbose {
        eprintln!(
            "Processed {} bytes -> {} bytes in {:?} ({} substituted)",
            processed, written, processing_time, irreversible
        );
    }

    match cli.format {
        OutputFormat::Json => {
            let result = ConversionResult {
                success: true,
                from: args.from.clone(),
                to: args.to.clone(),
                bytes_processed: processed,
                bytes_written: written,
                irreversible,
                processing_time_ms: processing_time.as_millis() as u64,
            };
            eprintln!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => {
            if irreversible > 0 {
                eprintln!(
                    "warning: {} character(s) replaced with '?'",
                    irreversible
                );
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn resolve_command(args: &ResolveArgs, cli: &Cli) -> Result<()> {
    let canonical = aliases::resolve(&args.alias)
        .with_context(|| format!("Cannot resolve {}", args.alias))?;
    let scheme = ces::find(Direction::ToUcs, &canonical);

    match cli.format {
        OutputFormat::Json => {
            let result = serde_json::json!({
                "alias": args.alias,
                "canonical": canonical,
                "scheme": scheme,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => println!("{}", canonical),
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn encoding_infos() -> Vec<EncodingInfo> {
    aliases::records()
        .map(|(name, aliases)| EncodingInfo {
            name,
            aliases,
            scheme: ces::find(Direction::ToUcs, name),
            builtin_table: tables::builtins().iter().any(|t| t.name() == name),
        })
        .collect()
}

#[cfg(feature = "cli")]
fn list_command(args: &ListArgs, cli: &Cli) -> Result<()> {
    let encodings = encoding_infos();

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&encodings)?);
        }
        OutputFormat::Text => {
            println!("Supported Encodings ({} total):", encodings.len());
            println!();

            for info in encodings {
                let scheme = info
                    .scheme
                    .map(|k| format!("{:?}", k))
                    .unwrap_or_else(|| "-".to_string());
                println!("{:16} {}", info.name, scheme);

                if args.details {
                    println!("                 Aliases: {}", info.aliases.join(" "));
                    if matches!(info.scheme, Some(CesKind::Table | CesKind::TablePcs)) {
                        println!(
                            "                 Table: {}",
                            if info.builtin_table {
                                "built-in"
                            } else {
                                "external"
                            }
                        );
                    }
                    println!();
                }
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn info_command(args: &InfoArgs, cli: &Cli, config: &Config) -> Result<()> {
    let canonical = aliases::resolve(&args.encoding)
        .with_context(|| format!("Cannot resolve {}", args.encoding))?;
    let info = encoding_infos()
        .into_iter()
        .find(|info| info.name == canonical)
        .context("Encoding missing from the alias table")?;

    let decoder = Decoder::open(&canonical, config);
    let table_path = matches!(info.scheme, Some(CesKind::Table | CesKind::TablePcs))
        .then(|| config.table_path(&canonical));

    match cli.format {
        OutputFormat::Json => {
            let result = serde_json::json!({
                "encoding": info,
                "available": decoder.is_ok(),
                "max_char_len": decoder.as_ref().ok().map(|d| d.max_char_len()),
                "stateful": decoder.as_ref().ok().map(|d| d.is_stateful()),
                "table_path": table_path,
                "error": decoder.as_ref().err().map(|e| e.to_string()),
                "config": config,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => {
            println!("Encoding Information: {}", info.name);
            println!("Aliases: {}", info.aliases.join(" "));
            if let Some(scheme) = info.scheme {
                println!("Scheme: {:?}", scheme);
            }
            if let Some(ref path) = table_path {
                if info.builtin_table {
                    println!("Table: built-in");
                } else {
                    println!("Table: {}", path.display());
                }
            }
            match decoder {
                Ok(decoder) => {
                    println!("Max character length: {}", decoder.max_char_len());
                    println!(
                        "Stateful: {}",
                        if decoder.is_stateful() { "Yes" } else { "No" }
                    );
                }
                Err(err) => println!("Unavailable: {}", err),
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn validate_command(args: &ValidateArgs, cli: &Cli, config: &Config) -> Result<()> {
    let input_data = read_all(args.input.as_deref())?;

    let canonical = aliases::resolve(&args.encoding)
        .with_context(|| format!("Cannot resolve {}", args.encoding))?;
    // any Unicode scheme other than the source itself forces a full decode
    let target = if canonical == "utf_8" { "ucs_4" } else { "utf_8" };
    let mut cd = Iconv::open_with(target, &canonical, config)?;

    let mut input = InputCursor::new(&input_data);
    let mut sink = DiscardSink::unbounded();
    let outcome = cd.convert_with(&mut input, &mut sink, Unmappable::Fail);

    let result = ValidationResult {
        encoding: canonical,
        valid: outcome.is_ok(),
        bytes_checked: input.consumed(),
        error_offset: outcome.as_ref().err().map(|_| input.consumed()),
        error: outcome.as_ref().err().map(|e| e.to_string()),
    };

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => {
            if result.valid {
                println!("✓ File is valid {}", result.encoding);
            } else {
                println!("✗ File is not valid {}", result.encoding);
                if args.show_errors {
                    if let (Some(offset), Some(error)) = (result.error_offset, &result.error) {
                        println!("  Error at position {}: {}", offset, error);
                    }
                }
            }
        }
    }

    std::process::exit(if result.valid { 0 } else { 1 });
}

#[cfg(feature = "cli")]
fn parse_code(token: &str) -> Option<u16> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))?;
    u16::from_str_radix(digits, 16).ok()
}

#[cfg(feature = "cli")]
fn parse_mapping(text: &str, builder: &mut TableBuilder) -> Result<()> {
    for (lineno, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(ccs), Some(ucs)) = (fields.next(), fields.next()) else {
            anyhow::bail!("line {}: expected two codes", lineno + 1);
        };
        let ccs = parse_code(ccs)
            .with_context(|| format!("line {}: bad code {}", lineno + 1, ccs))?;
        let ucs = parse_code(ucs)
            .with_context(|| format!("line {}: bad code {}", lineno + 1, ucs))?;
        if builder.bits() == Bits::Eight && ccs > 0xFF {
            anyhow::bail!("line {}: code {:#X} does not fit 8 bits", lineno + 1, ccs);
        }
        builder.map(ccs, ucs);
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn mktable_command(args: &MktableArgs, cli: &Cli, config: &Config) -> Result<()> {
    let bits = match args.bits {
        TableBits::Eight => Bits::Eight,
        TableBits::Sixteen => Bits::Sixteen,
    };
    let text = fs::read_to_string(&args.mapfile)
        .with_context(|| format!("Failed to read mapping file: {}", args.mapfile.display()))?;

    let mut builder = TableBuilder::new(args.name.as_str(), bits);
    parse_mapping(&text, &mut builder)?;
    if builder.is_empty() {
        anyhow::bail!("{} contains no mappings", args.mapfile.display());
    }

    let writer = TableFileWriter::new(&builder);
    let path = match args.output {
        Some(ref path) => {
            writer.write_to(path)?;
            path.clone()
        }
        None => {
            writer.install(config)?;
            config.table_path(&args.name)
        }
    };

    match cli.format {
        OutputFormat::Json => {
            let result = serde_json::json!({
                "name": args.name,
                "bits": bits.as_u16(),
                "mappings": builder.len(),
                "path": path,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => {
            println!(
                "Wrote {} ({} mappings) to {}",
                args.name,
                builder.len(),
                path.display()
            );
        }
    }

    Ok(())
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mapping() {
        let text = "# sample\n0x41 0x0041\n\n0xA4 0x20AC  # euro\n";
        let mut builder = TableBuilder::new("sample", Bits::Eight);
        parse_mapping(text, &mut builder).unwrap();
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn test_parse_mapping_rejects() {
        let mut builder = TableBuilder::new("sample", Bits::Eight);
        assert!(parse_mapping("0x41\n", &mut builder).is_err());
        assert!(parse_mapping("41 0x41\n", &mut builder).is_err());
        assert!(parse_mapping("0x141 0x41\n", &mut builder).is_err());
        assert_eq!(parse_code("0XfF"), Some(0xFF));
    }
}
