//! png-stego - hide encrypted files inside PNG images.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use png_stego::{Error, Stage, StegoConfig, StegoContainer};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use zeroize::Zeroize;

#[derive(Parser)]
#[command(name = "png-stego")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Hide encrypted files inside PNG images",
    long_about = "Compresses, double-encrypts and scatters a file over the least significant bits of a lossless PNG image."
)]
struct Cli {
    /// Passphrase (prompted without echo when omitted)
    #[arg(long, global = true)]
    key: Option<String>,

    /// JSON file overriding iteration counts and compression level
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Do not print progress stages
    #[arg(long, global = true)]
    silent: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hide a file inside a PNG container
    Hide {
        /// PNG image to hide the file in
        container: PathBuf,

        /// File to hide
        input: PathBuf,

        /// Output image (default: "<container> (copy).png")
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Extract a hidden file from a PNG container
    Reveal {
        /// PNG image holding the hidden file
        container: PathBuf,

        /// Where to write the file; the stored extension is appended
        output: PathBuf,
    },

    /// Show how many bytes a container can hold for a passphrase
    Capacity {
        /// PNG image to inspect
        container: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("png_stego=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(mut cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => StegoConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => StegoConfig::default(),
    };
    let key = cli.key.take();
    let silent = cli.silent;

    match cli.command {
        Commands::Hide {
            container,
            input,
            output,
        } => cmd_hide(&container, &input, output, key, config, silent),

        Commands::Reveal { container, output } => {
            cmd_reveal(&container, &output, key, config, silent)
        }

        Commands::Capacity { container } => cmd_capacity(&container, key, config),
    }
}

fn prompt_password(prompt: &str) -> anyhow::Result<String> {
    rpassword::prompt_password(prompt).context("reading passphrase")
}

/// Use the `--key` value or prompt for one, confirming it when `confirm` is set.
fn passphrase(key: Option<String>, confirm: bool) -> anyhow::Result<String> {
    if let Some(key) = key {
        return Ok(key);
    }

    let mut password = prompt_password("Passphrase: ")?;
    if confirm {
        let mut again = prompt_password("Confirm passphrase: ")?;
        let matches = password == again;
        again.zeroize();
        if !matches {
            password.zeroize();
            bail!("Passphrases do not match");
        }
    }
    Ok(password)
}

fn open(path: &Path, config: StegoConfig) -> anyhow::Result<StegoContainer> {
    let image = png_stego::CarrierImage::load(path)
        .with_context(|| format!("loading container {}", path.display()))?;
    Ok(StegoContainer::with_config(image, config)?)
}

fn print_stage(stage: Stage) {
    println!("{}", stage);
}

/// `cover.png` becomes `cover (copy).png`.
fn default_output(container: &Path) -> PathBuf {
    let stem = container
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match container.extension() {
        Some(ext) => format!("{} (copy).{}", stem, ext.to_string_lossy()),
        None => format!("{} (copy)", stem),
    };
    container.with_file_name(name)
}

fn cmd_hide(
    container: &Path,
    input: &Path,
    output: Option<PathBuf>,
    key: Option<String>,
    config: StegoConfig,
    silent: bool,
) -> anyhow::Result<()> {
    let mut stego = open(container, config)?;
    let output = output.unwrap_or_else(|| default_output(container));

    let mut password = passphrase(key, true)?;
    let observer = print_stage;
    let result = stego.encode_file(
        input,
        password.as_bytes(),
        if silent { None } else { Some(&observer) },
    );
    password.zeroize();
    result.with_context(|| format!("hiding {}", input.display()))?;

    if !silent {
        print_stage(Stage::Writing);
    }
    stego
        .save(&output)
        .with_context(|| format!("saving {}", output.display()))?;
    println!("Wrote {}", output.display());

    Ok(())
}

fn cmd_reveal(
    container: &Path,
    output: &Path,
    key: Option<String>,
    config: StegoConfig,
    silent: bool,
) -> anyhow::Result<()> {
    let stego = open(container, config)?;

    let mut password = passphrase(key, false)?;
    let mut backup = Vec::new();
    let observer = print_stage;
    let result = stego.decode_to_file(
        output,
        password.as_bytes(),
        Some(&mut backup),
        if silent { None } else { Some(&observer) },
    );
    password.zeroize();

    match result {
        Ok(path) => {
            println!("Wrote {}", path.display());
            Ok(())
        }
        Err(e @ Error::Write { .. }) if !backup.is_empty() => {
            eprintln!("Error: {}", e);
            eprintln!("Dumping the revealed data to stdout instead.");
            let mut stdout = io::stdout();
            stdout.write_all(&backup)?;
            stdout.flush()?;
            backup.zeroize();
            std::process::exit(1);
        }
        Err(e) => Err(e).with_context(|| format!("revealing from {}", container.display())),
    }
}

fn cmd_capacity(container: &Path, key: Option<String>, config: StegoConfig) -> anyhow::Result<()> {
    let stego = open(container, config)?;

    let mut password = passphrase(key, false)?;
    let capacity = stego.capacity_for(password.as_bytes());
    password.zeroize();

    let image = stego.image();
    println!("Container:  {}", container.display());
    println!("Dimensions: {}x{}", image.width(), image.height());
    println!("Capacity:   {} bytes", capacity?);
    println!("(compressed payload plus 32 bytes of authentication tags)");

    Ok(())
}
