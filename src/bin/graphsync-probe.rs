// ABOUTME: Command-line probe for exercising the access layer against live upstream APIs
// ABOUTME: Collects paginated resources, resolves identities and forces token refreshes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Walk recent Instagram media for a connected account
//! GRAPHSYNC_ACCESS_TOKEN=EAAB... graphsync-probe collect --provider instagram \
//!     --subject 17841400000 --resource media --max-items 100
//!
//! # Reviews of a Google Business location from the last 30 days
//! graphsync-probe collect --provider google --subject acct-1 --resource reviews \
//!     --target accounts/123 --location 456 --since-days 30
//!
//! # Resolve another business account through business discovery
//! graphsync-probe resolve --provider instagram --owner 17841400000 --subject natgeo
//!
//! # Force a refresh of the stored credential
//! GRAPHSYNC_REFRESH_TOKEN=... graphsync-probe refresh --provider google --subject acct-1
//! ```

use std::env;
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use graphsync::config::AccessLayerConfig;
use graphsync::http::{client_from_config, BackoffFetcher, ReqwestTransport};
use graphsync::identity::StaleAwareResolverCache;
use graphsync::logging::{LogFormat, LoggingConfig};
use graphsync::models::{CollectionBounds, Credential};
use graphsync::oauth2_client::OAuth2RefreshClient;
use graphsync::pagination::{CollectionQuery, PaginatedCollector};
use graphsync::providers::{google_business, instagram, Provider};
use graphsync::stores::{InMemoryCredentialStore, InMemoryIdentityStore};
use graphsync::tokens::TokenRefreshCoordinator;
use serde_json::{json, Value};
use tracing::{info, warn};

const ACCESS_TOKEN_VAR: &str = "GRAPHSYNC_ACCESS_TOKEN";
const REFRESH_TOKEN_VAR: &str = "GRAPHSYNC_REFRESH_TOKEN";
const CLIENT_ID_VAR: &str = "GRAPHSYNC_CLIENT_ID";
const CLIENT_SECRET_VAR: &str = "GRAPHSYNC_CLIENT_SECRET";

#[derive(Parser)]
#[command(
    name = "graphsync-probe",
    about = "Graph API access layer probe",
    long_about = "Runs single access-layer operations against Instagram Graph or Google Business Profile and prints the result as JSON."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Upstream provider (instagram, google_business)
    #[arg(long, short = 'p', global = true, default_value = "instagram")]
    provider: String,

    /// Access token (falls back to GRAPHSYNC_ACCESS_TOKEN)
    #[arg(long, global = true)]
    access_token: Option<String>,

    /// Refresh token (falls back to GRAPHSYNC_REFRESH_TOKEN)
    #[arg(long, global = true)]
    refresh_token: Option<String>,

    /// Seconds until the access token expires; omit when unknown
    #[arg(long, global = true)]
    expires_in: Option<i64>,

    /// Emit JSON logs
    #[arg(long, global = true)]
    json_logs: bool,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Resource {
    /// Instagram media of the subject account
    Media,
    /// Instagram comments on the target media
    Comments,
    /// Google Business reviews of the target location
    Reviews,
    /// Google Business local posts of the target location
    LocalPosts,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Walk a paginated collection
    Collect {
        /// Subject whose credential is used
        #[arg(long)]
        subject: String,

        /// Collection to walk
        #[arg(long, value_enum)]
        resource: Resource,

        /// Media id (comments) or account resource name (Google); defaults to the subject
        #[arg(long)]
        target: Option<String>,

        /// Location id (Google collections)
        #[arg(long)]
        location: Option<String>,

        /// Page bound
        #[arg(long)]
        max_pages: Option<u32>,

        /// Item bound
        #[arg(long)]
        max_items: Option<usize>,

        /// Stop once items are older than this many days
        #[arg(long)]
        since_days: Option<i64>,
    },

    /// Resolve an identity through the stale-aware cache
    Resolve {
        /// Account whose credential scopes the lookup
        #[arg(long)]
        owner: String,

        /// Entity to resolve
        #[arg(long)]
        subject: String,
    },

    /// Force a credential refresh
    Refresh {
        /// Subject whose credential is refreshed
        #[arg(long)]
        subject: String,
    },
}

struct Components {
    fetcher: BackoffFetcher,
    tokens: Arc<TokenRefreshCoordinator>,
    config: AccessLayerConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if cli.verbose {
        "debug".clone_into(&mut logging.level);
    }
    if cli.json_logs {
        logging.format = LogFormat::Json;
    }
    logging.init()?;

    let provider: Provider = cli.provider.parse()?;
    info!(%provider, "graphsync probe starting");

    let credential_subject = match &cli.command {
        Command::Collect { subject, .. } | Command::Refresh { subject } => subject.clone(),
        Command::Resolve { owner, .. } => owner.clone(),
    };
    let components = build_components(&cli, provider, &credential_subject).await?;

    let output = match cli.command {
        Command::Collect {
            subject,
            resource,
            target,
            location,
            max_pages,
            max_items,
            since_days,
        } => {
            let query = collection_query(provider, resource, &subject, target, location)?;
            let defaults = components.config.pagination.default_bounds();
            let mut bounds = CollectionBounds::new(
                max_pages.unwrap_or(defaults.max_pages),
                max_items.unwrap_or(defaults.max_items),
            );
            if let Some(days) = since_days {
                bounds = bounds.since(Utc::now() - Duration::days(days));
            }
            let collector = PaginatedCollector::new(
                components.tokens,
                components.fetcher,
                components.config.pagination.clone(),
            );
            let result = collector.collect::<Value>(&subject, &query, &bounds).await?;
            if result.is_auth_rejected() {
                warn!(subject = %subject, "Upstream rejected the token; reconnect the account and retry");
            }
            serde_json::to_value(&result)?
        }
        Command::Resolve { owner, subject } => {
            let resolver = StaleAwareResolverCache::new(
                Arc::new(InMemoryIdentityStore::new()),
                components.tokens,
                components.fetcher,
                provider.identity_lookup(),
                components.config.identity.clone(),
            );
            let identity = resolver.resolve(&owner, &subject).await?;
            serde_json::to_value(&identity)?
        }
        Command::Refresh { subject } => {
            let refreshed = components.tokens.force_refresh(&subject).await?;
            json!({
                "subject_id": refreshed.subject_id,
                "expires_at": refreshed.expires_at,
                "has_refresh_token": refreshed.refresh_token.is_some(),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn build_components(cli: &Cli, provider: Provider, subject: &str) -> Result<Components> {
    let config = AccessLayerConfig::from_env()?;

    let Some(access_token) = cli
        .access_token
        .clone()
        .or_else(|| env::var(ACCESS_TOKEN_VAR).ok())
    else {
        bail!("an access token is required (--access-token or {ACCESS_TOKEN_VAR})");
    };
    let mut credential = Credential::new(subject, access_token);
    if let Some(refresh_token) = cli
        .refresh_token
        .clone()
        .or_else(|| env::var(REFRESH_TOKEN_VAR).ok())
    {
        credential = credential.with_refresh_token(refresh_token);
    }
    if let Some(seconds) = cli.expires_in {
        credential = credential.with_expires_at(Utc::now() + Duration::seconds(seconds));
    }

    let transport = ReqwestTransport::new(client_from_config(&config.http));
    let fetcher = BackoffFetcher::new(Arc::new(transport), config.retry.clone());

    let client_id = env::var(CLIENT_ID_VAR).unwrap_or_default();
    let client_secret = env::var(CLIENT_SECRET_VAR).unwrap_or_default();
    let refresher = OAuth2RefreshClient::new(
        provider.refresh_config(&client_id, &client_secret)?,
        config.tokens.clone(),
        fetcher.clone(),
    );

    let tokens = TokenRefreshCoordinator::new(
        Arc::new(InMemoryCredentialStore::new()),
        Arc::new(refresher),
        config.tokens.clone(),
    );
    tokens.store_credential(&credential).await?;

    Ok(Components {
        fetcher,
        tokens: Arc::new(tokens),
        config,
    })
}

fn collection_query(
    provider: Provider,
    resource: Resource,
    subject: &str,
    target: Option<String>,
    location: Option<String>,
) -> Result<CollectionQuery> {
    let target = target.unwrap_or_else(|| subject.to_owned());
    let query = match (provider, resource) {
        (Provider::Instagram, Resource::Media) => instagram::media_query(&target)?,
        (Provider::Instagram, Resource::Comments) => instagram::comments_query(&target)?,
        (Provider::GoogleBusiness, Resource::Reviews | Resource::LocalPosts) => {
            let Some(location) = location else {
                bail!("--location is required for Google Business collections");
            };
            let account = target.trim_start_matches("accounts/");
            if matches!(resource, Resource::Reviews) {
                google_business::reviews_query(account, &location)?
            } else {
                google_business::local_posts_query(account, &location)?
            }
        }
        _ => bail!("resource is not available for provider {provider}"),
    };
    Ok(query)
}
