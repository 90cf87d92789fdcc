//! Keepsake CLI - seal and open password-protected keepsake records
//!
//! Command-line interface for the sealing side (the record author) and a
//! terminal stand-in for the viewer.

use clap::{ArgAction, Parser, Subcommand};
use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use keepsake::consts::DEFAULT_MAX_ATTEMPTS;
use keepsake::file_ops;
use keepsake::password::{
    CachingPasswordReader, PasswordReader, ReaderPasswordReader, TerminalPasswordReader,
};
use keepsake::{KeepsakeError, Payload, check_password_strength, photo, record};

#[derive(Parser)]
#[command(name = "keepsake")]
#[command(version)]
#[command(about = "Password-sealed keepsake messages.", long_about = None)]
struct Cli {
    /// Read password from stdin instead of from terminal
    #[arg(long, global = true)]
    password_stdin: bool,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seal a message into a new record
    #[command(alias = "s")]
    Seal {
        #[command(flatten)]
        content: Content,

        /// Path to the file to write the record to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Viewer URL to build a share link from (the record id is appended as #fragment)
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },

    /// Open a record and show its contents
    #[command(alias = "o")]
    Open {
        /// Path to the record file
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Write the decrypted payload JSON here instead of printing a summary
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Password attempts before giving up (terminal input only)
        #[arg(long, env = "KEEPSAKE_MAX_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
        max_attempts: u32,
    },

    /// Replace an existing record's content, while validating that the
    /// password is not accidentally changed.
    #[command(alias = "r")]
    Reseal {
        #[command(flatten)]
        content: Content,

        /// Path to the existing record to replace
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
}

#[derive(clap::Args)]
struct Content {
    /// Recipient's name
    #[arg(short, long)]
    name: String,

    /// Personal message
    #[arg(short, long, default_value = "")]
    message: String,

    /// Directory of photos to embed (jpg, jpeg, png, gif, webp)
    #[arg(short, long, value_name = "DIR")]
    photos: Option<PathBuf>,
}

impl Content {
    fn into_payload(self) -> keepsake::Result<Payload> {
        let photos = match &self.photos {
            Some(dir) => photo::load_dir(dir)?,
            None => Vec::new(),
        };
        Payload::new(&self.name, &self.message, photos)
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Seal {
            content,
            output,
            base_url,
        } => {
            let reader = get_password_reader(cli.password_stdin);
            seal(content, &output, base_url.as_deref(), reader)
        }
        Commands::Open {
            input,
            output,
            max_attempts,
        } => {
            let mut reader = get_password_reader(cli.password_stdin);
            // stdin is read to EOF, so there is nothing left for a retry
            let max_attempts = if cli.password_stdin { 1 } else { max_attempts };
            open(&input, output.as_deref(), &mut *reader, max_attempts)
        }
        Commands::Reseal { content, output } => {
            let mut reader = get_password_reader(cli.password_stdin);
            content
                .into_payload()
                .and_then(|payload| file_ops::reseal_file(&payload, &output, &mut *reader))
                .map(|_| ())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", error_chain(&e));
        process::exit(1);
    }
}

fn seal(
    content: Content,
    output: &Path,
    base_url: Option<&str>,
    reader: Box<dyn PasswordReader>,
) -> keepsake::Result<()> {
    let payload = content.into_payload()?;

    // Read once up front for the strength check; seal_file reuses the cached value.
    let mut reader = CachingPasswordReader::new(reader);
    let password = reader.read_password()?;
    check_password_strength(password.as_str())?;
    drop(password);

    let record = file_ops::seal_file(&payload, output, &mut reader)?;
    let id = record::generate_id()?;

    println!("\"{}\": {},", id, record.to_json()?);
    if let Some(base_url) = base_url {
        println!("Share link: {}#{}", base_url, id);
        println!("Share the link and the password through separate channels.");
    }
    Ok(())
}

fn open(
    input: &Path,
    output: Option<&Path>,
    reader: &mut dyn PasswordReader,
    max_attempts: u32,
) -> keepsake::Result<()> {
    let payload = file_ops::open_file(input, reader, max_attempts)?;

    match output {
        Some(path) => {
            let json = payload.to_json()?;
            file_ops::write_file_secure(path, &json)?;
        }
        None => {
            println!("Name: {}", payload.name());
            if !payload.message().is_empty() {
                println!("Message: {}", payload.message());
            }
            println!("Photos: {}", payload.photos().len());
        }
    }
    Ok(())
}

fn get_password_reader(use_stdin: bool) -> Box<dyn PasswordReader> {
    if use_stdin {
        Box::new(ReaderPasswordReader::new(Box::new(std::io::stdin())))
    } else {
        Box::new(TerminalPasswordReader::default())
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn error_chain(err: &KeepsakeError) -> String {
    let mut out = err.to_string();
    let mut source = StdError::source(err);
    while let Some(inner) = source {
        out.push_str(": ");
        out.push_str(&inner.to_string());
        source = inner.source();
    }
    out
}
