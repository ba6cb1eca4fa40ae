use clap::{Parser, Subcommand};
use gitpdf::cli::{
    embed_repository, extract_repository, generate_key_file, show_info, EmbedOptions,
    ExtractOptions,
};
use gitpdf::container::DocumentText;
use gitpdf::key::load_key;
use gitpdf::orchestrator::{AttachmentLabel, Codec};
use gitpdf::{CipherSuite, Compression};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Version info from build.rs
const VERSION: &str = env!("GITPDF_VERSION");
const PROFILE: &str = env!("GITPDF_PROFILE");
const GIT_HASH: &str = env!("GITPDF_GIT_HASH");

/// Environment variable overriding the log filter
const LOG_ENV: &str = "GITPDF_LOG";

#[derive(Parser)]
#[command(name = "gitpdf")]
#[command(author, about = "Embed and extract git repositories from PDF attachments", long_about = None)]
struct Cli {
    /// Print version
    #[arg(short = 'V', long)]
    version: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed a git repository into a PDF
    Embed {
        /// Path to the git repository (local path or remote URL)
        #[arg(long)]
        repo: String,

        /// Path to the output PDF file
        #[arg(long)]
        output: PathBuf,

        /// Key file (32 raw bytes or 64 hex characters); falls back to GITPDF_KEY
        #[arg(long, env = "GITPDF_KEY_FILE")]
        key_file: Option<PathBuf>,

        /// Cipher suite: gcm (default, authenticated) or cfb (legacy iv(16) || AES-256-CFB layout)
        #[arg(long, default_value = "gcm", value_parser = parse_cipher)]
        cipher: CipherSuite,

        /// Compression algorithm
        #[arg(long, default_value = "zlib", value_parser = parse_compression)]
        compression: Compression,

        /// Filename recorded for the attachment
        #[arg(long, default_value = "report.csv")]
        attachment_name: String,

        /// Description recorded for the attachment
        #[arg(long, default_value = "Monthly Report")]
        description: String,

        /// Page heading
        #[arg(long, default_value = "Reports")]
        title: String,

        /// Page body text
        #[arg(long, default_value = "ACME Corp Monthly Report")]
        body: String,

        /// Overwrite the output file if it exists
        #[arg(long)]
        force: bool,
    },

    /// Extract and clone a git repository from a PDF
    Extract {
        /// Path to the input PDF file
        #[arg(long)]
        input: PathBuf,

        /// Directory to clone the repository into (must not exist or be empty)
        #[arg(long)]
        output: PathBuf,

        /// Key file (32 raw bytes or 64 hex characters); falls back to GITPDF_KEY
        #[arg(long, env = "GITPDF_KEY_FILE")]
        key_file: Option<PathBuf>,

        /// Cipher suite used when embedding; documents from the legacy tool need `--cipher cfb`
        #[arg(long, default_value = "gcm", value_parser = parse_cipher)]
        cipher: CipherSuite,

        /// Compression algorithm used when embedding
        #[arg(long, default_value = "zlib", value_parser = parse_compression)]
        compression: Compression,
    },

    /// List the attachments of a PDF
    #[command(alias = "i")]
    Info {
        /// PDF file to inspect
        file: PathBuf,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Generate a new random key file
    Keygen {
        /// Where to write the hex-encoded key
        #[arg(long)]
        output: PathBuf,
    },
}

fn parse_cipher(s: &str) -> Result<CipherSuite, String> {
    s.parse().map_err(|e| format!("{}", e))
}

fn parse_compression(s: &str) -> Result<Compression, String> {
    s.parse().map_err(|e| format!("{}", e))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("gitpdf={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        println!("gitpdf {} {} ({})", PROFILE, VERSION, GIT_HASH);
        return ExitCode::SUCCESS;
    }

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            use clap::CommandFactory;
            let _ = Cli::command().print_help();
            println!();
            return ExitCode::SUCCESS;
        }
    };

    init_logging(cli.verbose);

    let result = match command {
        Commands::Embed {
            repo,
            output,
            key_file,
            cipher,
            compression,
            attachment_name,
            description,
            title,
            body,
            force,
        } => {
            let options = EmbedOptions {
                codec: Codec { cipher, compression },
                label: AttachmentLabel {
                    filename: attachment_name,
                    description,
                },
                text: DocumentText { title, body },
                force,
                scratch_dir: None,
            };

            load_key(key_file.as_deref())
                .and_then(|key| embed_repository(&repo, &output, key, &options))
                .map(|report| {
                    println!(
                        "Embedded {} ({} bytes, {} byte attachment) into {}",
                        repo,
                        report.archive_bytes,
                        report.attachment_bytes,
                        output.display()
                    );
                })
        }

        Commands::Extract {
            input,
            output,
            key_file,
            cipher,
            compression,
        } => {
            let options = ExtractOptions {
                codec: Codec { cipher, compression },
                scratch_dir: None,
            };

            load_key(key_file.as_deref())
                .and_then(|key| extract_repository(&input, &output, key, &options))
                .map(|report| {
                    println!(
                        "Extracted {} ({} bytes) to {}",
                        report.attachment_name,
                        report.archive_bytes,
                        output.display()
                    );
                })
        }

        Commands::Info { file, json } => show_info(&file, json).map(|info| print!("{}", info)),

        Commands::Keygen { output } => generate_key_file(&output).map(|fingerprint| {
            println!("Wrote key {} to {}", fingerprint, output.display());
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
