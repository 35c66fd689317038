//! pdf2cursive CLI - PDF worksheets to cursive Word documents

mod page;
mod server;

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdf2cursive::{
    change_font, inspect_fonts, FontChoice, FontSize, FontSpec, Pdf2Cursive, RunFont,
    RunLocation, DOWNLOAD_FILE_NAME,
};

use server::ServerConfig;

#[derive(Parser)]
#[command(name = "pdf2cursive")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Convert PDF worksheets to Word documents in a handwriting font", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a PDF to a restyled Word document
    Convert {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file
        #[arg(short, long, value_name = "FILE", default_value = DOWNLOAD_FILE_NAME)]
        output: PathBuf,

        #[command(flatten)]
        font: FontArgs,

        /// Skip unreadable pages instead of failing
        #[arg(long)]
        lenient: bool,
    },

    /// Restyle an existing Word document in place
    Restyle {
        /// Word document to rewrite
        #[arg(value_name = "DOCX")]
        input: PathBuf,

        #[command(flatten)]
        font: FontArgs,
    },

    /// Show the fonts used by a Word document
    Inspect {
        /// Word document to inspect
        #[arg(value_name = "DOCX")]
        input: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the available fonts
    Fonts,

    /// Serve the web UI
    Serve {
        /// Address to listen on
        #[arg(long, env = "PDF2CURSIVE_ADDR", default_value = "127.0.0.1:8501")]
        addr: SocketAddr,

        /// Largest accepted upload in megabytes
        #[arg(long, env = "PDF2CURSIVE_MAX_UPLOAD_MB", default_value = "200")]
        max_upload_mb: usize,
    },

    /// Show version information
    Version,
}

#[derive(clap::Args)]
struct FontArgs {
    /// Font to apply (name or slug, see `pdf2cursive fonts`)
    #[arg(long, default_value = "Twinkl Cursive Looped")]
    font: FontChoice,

    /// Font size in points
    #[arg(long, default_value = "12", value_parser = clap::value_parser!(i64).range(8..=72))]
    size: i64,
}

impl FontArgs {
    fn spec(&self) -> pdf2cursive::Result<FontSpec> {
        Ok(FontSpec::new(self.font, FontSize::new(self.size)?))
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Convert {
            input,
            output,
            font,
            lenient,
        }) => cmd_convert(&input, &output, &font, lenient),
        Some(Commands::Restyle { input, font }) => cmd_restyle(&input, &font),
        Some(Commands::Inspect { input, json }) => cmd_inspect(&input, json),
        Some(Commands::Fonts) => {
            cmd_fonts();
            Ok(())
        }
        Some(Commands::Serve {
            addr,
            max_upload_mb,
        }) => cmd_serve(addr, max_upload_mb),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            if let Some(input) = cli.input {
                let defaults = FontArgs {
                    font: FontChoice::default(),
                    size: i64::from(FontSize::DEFAULT.points()),
                };
                cmd_convert(&input, Path::new(DOWNLOAD_FILE_NAME), &defaults, false)
            } else {
                println!("{}", "Usage: pdf2cursive <FILE>".yellow());
                println!("       pdf2cursive --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: An error occurred: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_convert(
    input: &Path,
    output: &Path,
    font: &FontArgs,
    lenient: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;

    let mut converter = Pdf2Cursive::new().with_spec(font.spec()?);
    if lenient {
        converter = converter.lenient();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Processing... extracting text and applying styles.");

    let result = converter.process_bytes(&data);
    pb.finish_and_clear();
    let deliverable = result?;

    fs::write(output, &deliverable.data)?;

    println!("{}", deliverable.success_message().green().bold());
    println!(
        "{} {} ({} page(s), {} run(s) restyled)",
        "Saved to".green(),
        output.display(),
        deliverable.pages,
        deliverable.stats.total()
    );
    println!("{}", deliverable.install_note().yellow());

    Ok(())
}

fn cmd_restyle(input: &Path, font: &FontArgs) -> Result<(), Box<dyn std::error::Error>> {
    let spec = font.spec()?;
    let stats = change_font(input, &spec)?;

    println!(
        "{} {} to {} ({} body run(s), {} table run(s))",
        "Restyled".green(),
        input.display(),
        spec,
        stats.body_runs,
        stats.table_runs
    );

    Ok(())
}

fn cmd_inspect(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let report = inspect_fonts(input)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Font Report".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    match &report.normal {
        Some(font) => println!("{}: {}", "Normal style".bold(), describe(font)),
        None => println!("{}: {}", "Normal style".bold(), "missing".dimmed()),
    }
    println!("{}: {}", "Body runs".bold(), report.body_run_count());
    println!("{}: {}", "Table runs".bold(), report.table_run_count());

    let names = report.run_font_names();
    if !names.is_empty() {
        println!("{}: {}", "Run fonts".bold(), names.join(", "));
    }

    println!();
    for entry in &report.runs {
        let location = match entry.location {
            RunLocation::Body => "body ",
            RunLocation::Table => "table",
        };
        println!(
            "  {} {} {}",
            location.dimmed(),
            describe(&entry.font),
            format!("{:?}", entry.text).dimmed()
        );
    }

    Ok(())
}

fn describe(font: &RunFont) -> String {
    let name = font.name.as_deref().unwrap_or("(inherited)");
    match font.size_points() {
        Some(size) => format!("{} {}pt", name, size),
        None => name.to_string(),
    }
}

fn cmd_fonts() {
    println!("{}", "Available fonts".cyan().bold());
    for (i, font) in FontChoice::ALL.iter().enumerate() {
        let marker = if i == 0 { " (default)".dimmed().to_string() } else { String::new() };
        println!("  {} {}{}", font.slug().bold(), font.name(), marker);
    }
    println!();
    println!(
        "Sizes: {}-{}pt, default {}pt",
        FontSize::MIN,
        FontSize::MAX,
        FontSize::DEFAULT
    );
}

fn cmd_serve(addr: SocketAddr, max_upload_mb: usize) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig {
        addr,
        max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
    };

    println!("{} http://{}", "Serving on".green().bold(), addr);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(server::serve(config))
}

fn cmd_version() {
    println!("{} {}", "pdf2cursive".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF worksheets to cursive Word documents");
    println!();
    println!("License: MIT");
}
