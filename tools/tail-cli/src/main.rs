//! tail-cli: register TAIL records from the command line.
//!
//! Fetches the signing challenge for an asset, prints the wallet command that
//! signs it, and submits the signed record.

mod interactive;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tail_registration::{
    decode_launcher_id, validate, Challenge, ChallengeKey, FormField, HttpRegistryClient,
    RegistrationConfig, TailForm, TailRegistrationApi, TailRegistrationService, WalletAccount,
    SUBMITTED_MESSAGE,
};
use tail_telemetry::{init_logging, log_event, TelemetryConfig};

/// TAIL registry command-line client
#[derive(Parser, Debug)]
#[command(name = "tail-cli")]
#[command(about = "Register TAIL records with a signed challenge")]
struct Cli {
    /// Authorization endpoint (overrides TAIL_AUTH_URL)
    #[arg(long, global = true)]
    auth_url: Option<String>,

    /// Add-TAIL endpoint (overrides TAIL_ADD_URL)
    #[arg(long = "add-url", global = true)]
    add_url: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a logo NFT id into its launcher id
    Decode {
        /// bech32m NFT id, e.g. nft1...
        nft_id: String,
    },

    /// Fetch the signing challenge for an asset hash and eve coin id
    Challenge {
        /// Asset hash (64 characters)
        #[arg(long)]
        hash: String,

        /// Eve coin id (64 characters)
        #[arg(long)]
        coin: String,

        /// Connected wallet account, namespace:reference:address
        #[arg(long)]
        account: Option<String>,
    },

    /// Validate, sign-check and submit a TAIL record
    Submit(SubmitArgs),

    /// Edit a registration line by line from stdin
    Interactive,
}

#[derive(Args, Debug)]
struct SubmitArgs {
    #[arg(long)]
    hash: String,

    #[arg(long)]
    name: String,

    #[arg(long)]
    code: String,

    /// One of the registry categories, e.g. meme
    #[arg(long)]
    category: String,

    /// Eve coin id
    #[arg(long)]
    coin: String,

    /// Logo NFT id
    #[arg(long)]
    logo: String,

    #[arg(long, default_value = "")]
    description: String,

    #[arg(long)]
    website_url: Option<String>,

    #[arg(long)]
    twitter_url: Option<String>,

    #[arg(long)]
    discord_url: Option<String>,

    /// Signature over the challenge message
    #[arg(long)]
    signature: String,

    /// Connected wallet account, namespace:reference:address
    #[arg(long)]
    account: Option<String>,
}

impl SubmitArgs {
    fn to_form(&self) -> TailForm {
        let mut form = TailForm::new()
            .with(FormField::Hash, &self.hash)
            .with(FormField::Name, &self.name)
            .with(FormField::Code, &self.code)
            .with(FormField::Category, &self.category)
            .with(FormField::Coin, &self.coin)
            .with(FormField::Logo, &self.logo)
            .with(FormField::Description, &self.description);
        let optional = [
            (FormField::WebsiteUrl, &self.website_url),
            (FormField::TwitterUrl, &self.twitter_url),
            (FormField::DiscordUrl, &self.discord_url),
        ];
        for (field, value) in optional {
            if let Some(value) = value {
                form.set(field, value);
            }
        }
        form
    }
}

type HttpService = TailRegistrationService<HttpRegistryClient, HttpRegistryClient>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut telemetry = TelemetryConfig::for_tool("tail-cli");
    if cli.verbose {
        telemetry = telemetry.with_log_level("debug");
    }
    init_logging(&telemetry).context("failed to initialize logging")?;

    match &cli.command {
        Command::Decode { nft_id } => decode(nft_id),
        Command::Challenge {
            hash,
            coin,
            account,
        } => {
            let service = build_service(&cli)?;
            challenge(&service, hash, coin, account.as_deref()).await
        }
        Command::Submit(args) => {
            let service = build_service(&cli)?;
            submit(&service, args).await
        }
        Command::Interactive => {
            let service = build_service(&cli)?;
            interactive::run(Arc::new(service)).await
        }
    }
}

fn build_service(cli: &Cli) -> Result<HttpService> {
    let mut config = RegistrationConfig::from_env()?;
    if let Some(url) = &cli.auth_url {
        config.auth_url = url.clone();
    }
    if let Some(url) = &cli.add_url {
        config.add_tail_url = url.clone();
    }
    config.validate()?;

    log_event!(
        debug,
        "tail-cli",
        "Using registry endpoints",
        auth_url = %config.auth_url,
        add_tail_url = %config.add_tail_url
    );

    let client = HttpRegistryClient::new(&config)?;
    Ok(TailRegistrationService::new(client.clone(), client))
}

fn decode(nft_id: &str) -> Result<()> {
    match decode_launcher_id(nft_id.trim()) {
        Ok(launcher_id) => {
            println!("{launcher_id}");
            Ok(())
        }
        Err(e) => bail!("Invalid NFT ID ({e})"),
    }
}

async fn challenge<S: TailRegistrationApi>(
    service: &S,
    hash: &str,
    coin: &str,
    account: Option<&str>,
) -> Result<()> {
    let key = ChallengeKey::new(hash, coin);
    if !key.is_complete() {
        bail!("hash and coin must both be exactly 64 characters");
    }

    let Some(challenge) = service.request_challenge(&key).await? else {
        println!("No signing challenge is available for this asset id and coin id");
        return Ok(());
    };

    if let Some(account) = account {
        check_account(&account.parse::<WalletAccount>()?, &challenge)?;
    }
    println!("Sign the challenge with:");
    println!("  {}", sign_command(&challenge));
    Ok(())
}

async fn submit<S: TailRegistrationApi>(service: &S, args: &SubmitArgs) -> Result<()> {
    let fields = match validate(&args.to_form()) {
        Ok(fields) => fields,
        Err(errors) => {
            for error in &errors {
                eprintln!("  {error}");
            }
            bail!("{} invalid field(s)", errors.len());
        }
    };

    let challenge = service
        .request_challenge(&fields.challenge_key())
        .await?
        .context("No signing challenge is available for this asset id and coin id")?;

    if let Some(account) = &args.account {
        check_account(&account.parse::<WalletAccount>()?, &challenge)?;
    }

    let receipt = service.submit(&fields, &challenge, &args.signature).await?;
    log_event!(info, "tail-cli", "Record accepted", tx_id = %receipt.tx_id);
    println!("{SUBMITTED_MESSAGE}");
    println!("  hash:  {}", receipt.hash);
    println!("  tx_id: {}", receipt.tx_id);
    Ok(())
}

/// Wallet command that signs `challenge`.
pub(crate) fn sign_command(challenge: &Challenge) -> String {
    format!(
        "chia wallet sign_message -a {} -m {}",
        challenge.signing_address(),
        challenge.message()
    )
}

/// The account must be a chia account holding the signing address.
pub(crate) fn check_account(account: &WalletAccount, challenge: &Challenge) -> Result<()> {
    if !account.is_chia() {
        bail!(
            "account {account} is on {}; only chia accounts can sign registry challenges",
            account.chain_id()
        );
    }
    if account.address != challenge.signing_address() {
        bail!(
            "challenge must be signed by {}, connected account is {}",
            challenge.signing_address(),
            account.address
        );
    }
    Ok(())
}
