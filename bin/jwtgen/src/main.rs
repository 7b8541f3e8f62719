//! Emits a long-lived service JWT for machine-to-machine API access.
//!
//! Signs with the same Ed25519 keypair the API verifies against, then
//! round-trips the token through verification before printing it.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use custodia_api::Claims;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::path::PathBuf;
use uuid::Uuid;

const DEFAULT_EXPIRY_DAYS: i64 = 365;

/// CLI arguments.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Service identifier the token is issued to.
    #[clap(long, short)]
    service: String,
    /// Path to the Ed25519 private key PEM signing JWTs.
    #[clap(long, env = "JWT_PRIVATE_KEY")]
    jwt_private_key: PathBuf,
    /// Path to the Ed25519 public key PEM verifying JWTs.
    #[clap(long, env = "JWT_PUBLIC_KEY")]
    jwt_public_key: PathBuf,
    /// Token lifetime in days.
    #[clap(long, default_value_t = DEFAULT_EXPIRY_DAYS)]
    expiry_days: i64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let now = Utc::now().timestamp();
    let claims = Claims {
        iss: format!("custodia-{}", env!("CARGO_PKG_VERSION")),
        sub: cli.service.clone(),
        jti: Uuid::new_v4().to_string(),
        service: true,
        iat: now,
        exp: now + cli.expiry_days * 24 * 60 * 60,
    };

    let private_pem =
        std::fs::read(&cli.jwt_private_key).context("could not read jwt private key")?;
    let encoding = EncodingKey::from_ed_pem(&private_pem)
        .context("private key is not an Ed25519 PEM")?;
    let token = encode(&Header::new(Algorithm::EdDSA), &claims, &encoding)
        .context("could not sign token")?;

    // Verify against the public half before handing the token out.
    let public_pem =
        std::fs::read(&cli.jwt_public_key).context("could not read jwt public key")?;
    let decoding =
        DecodingKey::from_ed_pem(&public_pem).context("public key is not an Ed25519 PEM")?;
    let verified = decode::<Claims>(&token, &decoding, &Validation::new(Algorithm::EdDSA))
        .context("could not verify freshly signed token")?;
    anyhow::ensure!(verified.claims.sub == cli.service, "claims mismatch after roundtrip");

    println!("{token}");
    Ok(())
}
