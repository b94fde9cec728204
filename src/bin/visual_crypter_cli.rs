//! visual-crypter CLI: hide a message in a generated PNG, or recover it.
//! Build with: cargo build --release --bin visual-crypter

use anyhow::{Context, Result};
use base64::Engine;
use clap::{Args, Parser, Subcommand};
use log::info;
use std::fs;
use std::path::PathBuf;
use visual_crypter_lib::{
    decode_text, decrypt_from_image, encrypt_to_image, Settings, StegoDecodeResult,
    StegoEncodeResult, DEFAULT_ITERATIONS, DEFAULT_MAX_PAYLOAD_LEN,
};

#[derive(Parser, Debug)]
#[command(version, about = "Hide text inside images using AES encryption.", long_about = None)]
struct Cli {
    /// Print a JSON result object instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    /// PBKDF2 iterations. Not stored in the image: decrypt must use the same value
    #[arg(long, global = true, env = "VISUAL_CRYPTER_ITERATIONS", default_value_t = DEFAULT_ITERATIONS)]
    iterations: u32,

    /// Largest message accepted for encryption, in bytes
    #[arg(long, global = true, env = "VISUAL_CRYPTER_MAX_PAYLOAD", default_value_t = DEFAULT_MAX_PAYLOAD_LEN)]
    max_payload: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encrypt a message and generate an image
    Encrypt(EncryptArgs),
    /// Decrypt an image to reveal the original message
    Decrypt(DecryptArgs),
}

#[derive(Args, Debug)]
struct EncryptArgs {
    /// Message to encrypt
    #[arg(short, long, conflicts_with = "file", required_unless_present = "file")]
    message: Option<String>,

    /// Text file containing the message
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Password for encryption
    #[arg(short, long, env = "VISUAL_CRYPTER_PASSWORD", hide_env_values = true)]
    password: String,

    /// Output image file name
    #[arg(short, long, default_value = "encrypted.png")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct DecryptArgs {
    /// Input image file
    #[arg(short, long)]
    input: PathBuf,

    /// Password for decryption
    #[arg(short, long, env = "VISUAL_CRYPTER_PASSWORD", hide_env_values = true)]
    password: String,

    /// Output text file (prints to stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit the recovered bytes base64-encoded instead of requiring UTF-8 text
    #[arg(long)]
    base64: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let settings = Settings::default()
        .with_iterations(cli.iterations)
        .with_max_payload_len(cli.max_payload);

    match cli.command {
        Command::Encrypt(args) => {
            let result = run_encrypt(&args, &settings);
            if cli.json {
                let report = match &result {
                    Ok(size) => StegoEncodeResult {
                        ok: true,
                        path: Some(args.output.display().to_string()),
                        size: Some(*size),
                        error: None,
                    },
                    Err(e) => StegoEncodeResult {
                        ok: false,
                        path: None,
                        size: None,
                        error: Some(format!("{e:#}")),
                    },
                };
                print_json(&report);
            } else {
                match &result {
                    Ok(size) => println!(
                        "Encrypted image created: {} ({}x{})",
                        args.output.display(),
                        size,
                        size
                    ),
                    Err(e) => eprintln!("Error: {e:#}"),
                }
            }
            if result.is_err() {
                std::process::exit(1);
            }
        }
        Command::Decrypt(args) => {
            let result = run_decrypt(&args, &settings);
            if cli.json {
                let report = match &result {
                    Ok(text) => StegoDecodeResult {
                        ok: true,
                        payload: Some(text.clone()),
                        error: None,
                    },
                    Err(e) => StegoDecodeResult {
                        ok: false,
                        payload: None,
                        error: Some(format!("{e:#}")),
                    },
                };
                print_json(&report);
            } else {
                match (&result, &args.output) {
                    (Ok(_), Some(path)) => println!("Message saved to: {}", path.display()),
                    (Ok(text), None) => {
                        println!("\nOriginal Message:");
                        println!("{text}");
                    }
                    (Err(e), _) => eprintln!("Decryption failed: {e:#}"),
                }
            }
            if result.is_err() {
                std::process::exit(1);
            }
        }
    }
}

fn print_json<T: serde::Serialize>(report: &T) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("failed to serialize result: {e}");
            std::process::exit(1);
        }
    }
}

fn read_message(args: &EncryptArgs) -> Result<Vec<u8>> {
    match (&args.message, &args.file) {
        (Some(message), _) => Ok(message.clone().into_bytes()),
        (None, Some(path)) => fs::read(path)
            .with_context(|| format!("input file not found or unreadable: {}", path.display())),
        (None, None) => anyhow::bail!("provide a message (-m) or a text file (-f)"),
    }
}

fn run_encrypt(args: &EncryptArgs, settings: &Settings) -> Result<u32> {
    let message = read_message(args)?;
    info!("encrypting {} byte message into {}", message.len(), args.output.display());
    let size = encrypt_to_image(&message, args.password.as_bytes(), &args.output, settings)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    Ok(size)
}

fn run_decrypt(args: &DecryptArgs, settings: &Settings) -> Result<String> {
    info!("decrypting {}", args.input.display());
    let plaintext = decrypt_from_image(&args.input, args.password.as_bytes(), settings)?;
    let text = if args.base64 {
        base64::engine::general_purpose::STANDARD.encode(&plaintext)
    } else {
        decode_text(plaintext)?
    };
    if let Some(path) = &args.output {
        fs::write(path, &text).with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(text)
}
