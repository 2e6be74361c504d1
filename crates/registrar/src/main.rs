use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use pinata::PinataClient;
use registrar::asset_lock::AssetLockManager;
use registrar::discovery::{DiscoveryJob, DiscoverySettings};
use registrar::processed::ProcessedPostsStore;
use registrar::setup::run_setup;
use registrar::{
    AppConfig, DerivativeSubmission, ImageData, WatchConfig, Workflow, WorkflowOptions,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use story::{Address, IpGateway, StoryGateway, U256};
use timeline::TimelineClient;
use tracing::info;

/// Default revenue share for commercial remix terms, in percent
const REV_SHARE_PERCENT: u32 = 10;

/// How long a parent asset stays locked if a registration never releases it
const LOCK_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Parser)]
#[command(name = "registrar", about = "Register derivative IP assets on Story")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a parent asset and license terms, printing their IDs
    Setup,
    /// Register one derivative work
    Register {
        /// Image file to pin alongside the metadata
        #[arg(long)]
        file: Option<PathBuf>,
        /// Name of the work
        #[arg(long)]
        name: String,
        /// Description of the work
        #[arg(long)]
        description: String,
        /// Parent IP asset ID; falls back to PARENT_IP_ID
        #[arg(long)]
        parent: Option<Address>,
        /// Reuse an already-held license token instead of minting one
        #[arg(long)]
        license_token: Option<U256>,
        /// Where to write the registration record
        #[arg(long, default_value = "registration.json")]
        output: PathBuf,
    },
    /// Resolve the IP asset ID for an already-registered NFT, read-only
    Lookup {
        /// NFT token ID to resolve
        #[arg(long)]
        token_id: U256,
        /// NFT contract; falls back to TOKEN_CONTRACT_ADDRESS or the wallet
        #[arg(long)]
        contract: Option<Address>,
    },
    /// Poll a timeline on a schedule and register matching posts
    Watch,
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

fn workflow_options(config: &AppConfig, gateway: &StoryGateway) -> anyhow::Result<WorkflowOptions> {
    let receiver = gateway.wallet_address()?;
    Ok(WorkflowOptions {
        chain_id: gateway.chain_id(),
        // Without a dedicated NFT contract the wallet address stands in,
        // matching how the demo environment is provisioned
        token_contract: config.token_contract.unwrap_or(receiver),
        receiver,
        license_terms_id: config.license_terms_id,
        rev_share_percent: REV_SHARE_PERCENT,
        royalty_policy: gateway.royalty_policy(),
        currency_token: gateway.currency_token(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    registrar::logging::init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let gateway = StoryGateway::new(config.story.clone())?;

    match cli.command {
        Command::Setup => {
            let options = workflow_options(&config, &gateway)?;
            let outcome = run_setup(
                &gateway,
                options.chain_id,
                options.token_contract,
                REV_SHARE_PERCENT,
                options.royalty_policy,
                options.currency_token,
            )
            .await?;
            println!("PARENT_IP_ID={}", outcome.asset_id);
            println!("LICENSE_TERMS_ID={}", outcome.license_terms_id);
        }
        Command::Register {
            file,
            name,
            description,
            parent,
            license_token,
            output,
        } => {
            let Some(parent_asset) = parent.or(config.parent_asset) else {
                bail!("no parent asset given; pass --parent or set PARENT_IP_ID");
            };

            let image = match file {
                Some(ref path) => {
                    let bytes = std::fs::read(path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    let filename = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("upload")
                        .to_string();
                    Some(ImageData {
                        bytes,
                        content_type: content_type_for(path).to_string(),
                        filename,
                    })
                }
                None => None,
            };

            let pinning = Arc::new(PinataClient::new(config.pinata.clone()));
            let options = workflow_options(&config, &gateway)?;
            let workflow = Workflow::new(pinning.clone(), Arc::new(gateway), options);

            let record = workflow
                .run(DerivativeSubmission {
                    name,
                    description,
                    parent_asset,
                    image,
                    existing_license_token: license_token,
                    source_post_id: None,
                })
                .await?;

            record.save(&output)?;
            info!("Registration record written to {}", output.display());
            info!(
                "Metadata available at {}",
                pinning.gateway_url(&record.metadata_uri)
            );
            println!("{}", record.asset_id);
        }
        Command::Lookup { token_id, contract } => {
            let options = workflow_options(&config, &gateway)?;
            let contract = contract.unwrap_or(options.token_contract);
            let asset = gateway
                .asset_id(options.chain_id, contract, token_id)
                .await?;
            println!("{asset}");
        }
        Command::Watch => {
            let watch = WatchConfig::from_env()?;
            let Some(parent_asset) = config.parent_asset else {
                bail!("PARENT_IP_ID must be set to run the watcher");
            };

            let pinning = Arc::new(PinataClient::new(config.pinata.clone()));
            let timeline = Arc::new(TimelineClient::new(watch.timeline.clone()));
            let options = workflow_options(&config, &gateway)?;
            let processed = ProcessedPostsStore::load(&watch.processed_posts_path)?;
            info!(
                "Loaded {} previously processed post(s) from {}",
                processed.len(),
                watch.processed_posts_path
            );

            let job = DiscoveryJob::new(
                timeline,
                pinning,
                Arc::new(gateway),
                options,
                DiscoverySettings {
                    username: watch.username,
                    parent_asset,
                    keywords: watch.keywords,
                    interval: Duration::from_secs(watch.interval_secs),
                    max_results: watch.max_results,
                },
                processed,
                AssetLockManager::new(LOCK_TIMEOUT),
            );
            job.run().await?;
        }
    }

    Ok(())
}
