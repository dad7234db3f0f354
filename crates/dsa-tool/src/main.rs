//! DSA Tool CLI
//!
//! Command-line interface for the DSA toolkit:
//! - Domain parameter generation
//! - Key generation, optionally passphrase protected
//! - Signing and verification of messages and files

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use dsa_core::{DomainSize, SignatureEncoding};
use dsa_keystore::{armor, Toolkit, ToolkitConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn, Level};

/// DSA Tool - keys, signatures and verification
#[derive(Parser)]
#[command(name = "dsa-tool")]
#[command(about = "DSA key generation, signing and verification")]
#[command(version)]
struct Cli {
    /// Directory key and parameter files are read from and written to
    #[arg(short, long, env = "DSA_KEY_DIR", default_value = "./keys")]
    key_dir: PathBuf,

    /// JSON settings file
    #[arg(short, long, env = "DSA_CONFIG")]
    config: Option<PathBuf>,

    /// Passphrase protecting private keys
    #[arg(long, env = "DSA_PASSPHRASE", hide_env_values = true)]
    passphrase: Option<String>,

    /// Hash function (sha256, sha512, sha3-256)
    #[arg(long)]
    hash: Option<String>,

    /// Signature encoding (binary, der)
    #[arg(long)]
    encoding: Option<SignatureEncoding>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate domain parameters
    Params {
        /// Bit length of p
        #[arg(short = 'L', long)]
        bits: Option<u64>,

        /// Bit length of q (defaults to the standard pairing for p)
        #[arg(short = 'N', long)]
        q_bits: Option<u64>,

        /// Output file name
        #[arg(short, long, default_value = "params.pem")]
        out: String,
    },

    /// Generate a keypair, writing <name>.pub and <name>.key
    Keygen {
        /// Base file name
        #[arg(short, long, default_value = "dsa")]
        name: String,

        /// Reuse existing domain parameters instead of generating new ones
        #[arg(short, long)]
        params: Option<String>,

        /// Bit length of p for freshly generated parameters
        #[arg(short = 'L', long)]
        bits: Option<u64>,
    },

    /// Sign a message or file, printing the hex signature
    Sign {
        /// Private key file
        #[arg(short, long, default_value = "dsa.key")]
        key: String,

        #[command(flatten)]
        input: Input,
    },

    /// Verify a hex signature; exits non-zero when it does not check out
    Verify {
        /// Public key file
        #[arg(short, long, default_value = "dsa.pub")]
        key: String,

        /// Hex signature
        #[arg(short, long)]
        signature: String,

        #[command(flatten)]
        input: Input,
    },

    /// Show sizes and fingerprint of a key or parameter file
    Info {
        /// Key or parameter file
        #[arg(default_value = "dsa.pub")]
        file: String,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct Input {
    /// Message given inline
    #[arg(short, long)]
    message: Option<String>,

    /// File whose contents are the message
    #[arg(short, long)]
    file: Option<String>,
}

fn main() -> Result<ExitCode> {
    // Logs go to stderr so stdout carries only results
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let toolkit = build_toolkit(&cli)?;

    match &cli.command {
        Commands::Params { bits, q_bits, out } => {
            run_params(&cli, toolkit, *bits, *q_bits, out)?;
        }
        Commands::Keygen { name, params, bits } => {
            run_keygen(&cli, toolkit, name, params.as_deref(), *bits)?;
        }
        Commands::Sign { key, input } => {
            run_sign(&cli, &toolkit, key, input)?;
        }
        Commands::Verify {
            key,
            signature,
            input,
        } => {
            if !run_verify(&cli, &toolkit, key, signature, input)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Info { file } => {
            show_info(&cli, file)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn build_toolkit(cli: &Cli) -> Result<Toolkit> {
    let mut config = match &cli.config {
        Some(path) => ToolkitConfig::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => ToolkitConfig::default(),
    };
    if let Some(hash) = &cli.hash {
        config.hash = hash.clone();
    }
    if let Some(encoding) = cli.encoding {
        config.encoding = encoding.to_string();
    }
    Ok(Toolkit::from_config(&config)?)
}

fn with_size(toolkit: Toolkit, bits: Option<u64>, q_bits: Option<u64>) -> Result<Toolkit> {
    let size = match (bits, q_bits) {
        (None, None) => return Ok(toolkit),
        (Some(p), Some(q)) => DomainSize::custom(p, q)?,
        (Some(p), None) => DomainSize::for_modulus(p)?,
        (None, Some(_)) => bail!("--q-bits needs --bits"),
    };
    let mut generation = toolkit.generation_config().clone();
    generation.size = size;
    Ok(toolkit.with_generation_config(generation))
}

fn run_params(
    cli: &Cli,
    toolkit: Toolkit,
    bits: Option<u64>,
    q_bits: Option<u64>,
    out: &str,
) -> Result<()> {
    let toolkit = with_size(toolkit, bits, q_bits)?;
    let size = toolkit.generation_config().size;
    info!(p_bits = size.p_bits, q_bits = size.q_bits, "Generating domain parameters");

    let domain = toolkit.generate_domain()?;
    let path = write_output(cli, out, &armor::encode_parameters(&domain)?, false)?;

    println!("Parameters written to {}", path.display());
    Ok(())
}

fn run_keygen(
    cli: &Cli,
    toolkit: Toolkit,
    name: &str,
    params: Option<&str>,
    bits: Option<u64>,
) -> Result<()> {
    let passphrase = cli.passphrase.as_deref();
    let (public_pem, private_pem) = match params {
        Some(params) => {
            let text = read_input(cli, params)?;
            let domain = Arc::new(armor::decode_parameters(&text)?);
            toolkit.generate_keypair_in(&domain, passphrase)?
        }
        None => with_size(toolkit, bits, None)?.generate_keypair(passphrase)?,
    };
    if passphrase.map_or(true, str::is_empty) {
        warn!("Private key written without passphrase protection");
    }

    let public_path = write_output(cli, &format!("{}.pub", name), &public_pem, false)?;
    let private_path = write_output(cli, &format!("{}.key", name), &private_pem, true)?;
    let fingerprint = armor::decode_public_key(&public_pem)?.fingerprint();

    info!(fingerprint = %fingerprint, "Keypair generated");
    println!("Public key:  {}", public_path.display());
    println!("Private key: {}", private_path.display());
    println!("Fingerprint: {}", fingerprint);
    Ok(())
}

fn run_sign(cli: &Cli, toolkit: &Toolkit, key: &str, input: &Input) -> Result<()> {
    let private_pem = read_input(cli, key)?;
    let passphrase = cli.passphrase.as_deref();

    let signature = match (&input.message, &input.file) {
        (Some(message), _) => toolkit.sign_message(message.as_bytes(), &private_pem, passphrase),
        (None, Some(file)) => toolkit.sign_file(file, &private_pem, passphrase),
        (None, None) => bail!("nothing to sign"),
    }
    .context("signing failed")?;

    println!("{}", signature);
    Ok(())
}

fn run_verify(
    cli: &Cli,
    toolkit: &Toolkit,
    key: &str,
    signature: &str,
    input: &Input,
) -> Result<bool> {
    let public_pem = read_input(cli, key)?;

    let valid = match (&input.message, &input.file) {
        (Some(message), _) => toolkit.verify_signature(message.as_bytes(), signature, &public_pem),
        (None, Some(file)) => toolkit.verify_signature_file(file, signature, &public_pem)?,
        (None, None) => bail!("nothing to verify"),
    };

    println!("{}", if valid { "Signature OK" } else { "Signature INVALID" });
    Ok(valid)
}

fn show_info(cli: &Cli, file: &str) -> Result<()> {
    let text = read_input(cli, file)?;
    let label = armor::peek_label(&text)?;

    let info = if label == armor::LABEL_PARAMETERS {
        let domain = armor::decode_parameters(&text)?;
        serde_json::json!({
            "type": label,
            "p_bits": domain.p().bits(),
            "q_bits": domain.q().bits(),
        })
    } else {
        let public = armor::public_part(&text)?;
        serde_json::json!({
            "type": label,
            "p_bits": public.domain().p().bits(),
            "q_bits": public.domain().q().bits(),
            "fingerprint": public.fingerprint(),
            "encrypted": label == armor::LABEL_ENCRYPTED_PRIVATE_KEY,
        })
    };

    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

fn resolve(cli: &Cli, name: &str) -> PathBuf {
    cli.key_dir.join(name)
}

fn read_input(cli: &Cli, name: &str) -> Result<String> {
    let path = resolve(cli, name);
    std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))
}

fn write_output(cli: &Cli, name: &str, contents: &str, secret: bool) -> Result<PathBuf> {
    std::fs::create_dir_all(&cli.key_dir)?;
    let path = resolve(cli, name);
    std::fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
    if secret {
        restrict_permissions(&path)?;
    }
    Ok(path)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
