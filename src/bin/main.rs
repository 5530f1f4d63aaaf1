use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use redis_enterprise_lookup::data_source::{DataSourceInput, FieldKind, Schema};
use redis_enterprise_lookup::databases::http::{DEFAULT_ENDPOINT, HttpDatabasesClient};
use redis_enterprise_lookup::http::client::HttpClient;
use redis_enterprise_lookup::http::config::{DEFAULT_CONNECT_TIMEOUT, HttpConfig, ProxyUrl};
use redis_enterprise_lookup::timeouts::{DEFAULT_READ_TIMEOUT, StopContext};
use redis_enterprise_lookup::token::{StaticTokenProvider, Token};
use redis_enterprise_lookup::{DATA_SOURCE_NAME, DatabaseDataSource, FeatureMode};
use std::error::Error;
use std::time::Duration;
use tracing::Level;

const MAX_TIMEOUT_SECS: u64 = 24 * 60 * 60;

#[derive(Parser, Debug)]
#[command(name = "redis-enterprise-lookup-cli")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Drop the deprecated fields, as the next major version will.
    #[arg(long, env = "ARM_FOURPOINTZERO_BETA", global = true)]
    four_point_oh_beta: bool,

    /// Maximum level of the logs written to stderr.
    #[arg(long, default_value = "warn", global = true)]
    log_level: Level,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Look up the access keys of a Redis Enterprise database and print them as JSON.
    Read(ReadArgs),
    /// Print the fields exposed by the data source.
    Schema,
}

#[derive(Args, Debug)]
struct ReadArgs {
    /// Name of the database
    #[arg(long)]
    name: String,

    /// Resource id of the Redis Enterprise cluster
    #[arg(long)]
    cluster_id: String,

    /// Bearer token for the management endpoint
    #[arg(long, env = "ARM_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,

    /// Expiration of the access token (RFC 3339)
    #[arg(long, value_parser = parse_expiration)]
    access_token_expires_at: Option<DateTime<Utc>>,

    #[arg(long, env = "ARM_RESOURCE_MANAGER_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Read timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_READ_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..=MAX_TIMEOUT_SECS)
    )]
    read_timeout: u64,

    /// Connect timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_CONNECT_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..=MAX_TIMEOUT_SECS)
    )]
    connect_timeout: u64,

    /// Proxy url. HTTPS_PROXY and HTTP_PROXY are used when unset.
    #[arg(long, default_value = "")]
    proxy_url: String,
}

fn parse_expiration(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp: {e}"))
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    let mode = FeatureMode::from_four_point_oh_beta(cli.four_point_oh_beta);

    match cli.command {
        Commands::Read(args) => read(args, mode),
        Commands::Schema => {
            let schema = Schema::new(mode, DEFAULT_READ_TIMEOUT);
            println!("{DATA_SOURCE_NAME} (read timeout: {:?})", schema.read_timeout());
            for field in schema.fields() {
                let kind = match field.kind {
                    FieldKind::Required => "required",
                    FieldKind::Computed => "computed",
                };
                let sensitive = if field.sensitive { ", sensitive" } else { "" };
                let deprecated = if field.deprecation.is_some() { ", deprecated" } else { "" };
                println!("  {} ({kind}{sensitive}{deprecated})", field.name);
            }
            Ok(())
        }
    }
}

fn read(args: ReadArgs, mode: FeatureMode) -> Result<(), Box<dyn Error>> {
    let read_timeout = Duration::from_secs(args.read_timeout);
    let http_config = HttpConfig::new(
        read_timeout,
        Duration::from_secs(args.connect_timeout),
        ProxyUrl::try_from(args.proxy_url.as_str())?,
    )
    .try_with_proxy_from_env()?;
    let http_client =
        HttpClient::new(http_config).map_err(|e| format!("error creating http client: {e}"))?;

    let token_provider = StaticTokenProvider::new(Token::new(
        args.access_token,
        args.access_token_expires_at,
    ));
    let client = HttpDatabasesClient::new(http_client, token_provider, &args.endpoint);
    let data_source = DatabaseDataSource::new(client, mode).with_read_timeout(read_timeout);

    let input = DataSourceInput {
        name: args.name,
        cluster_id: args.cluster_id,
        resource_group_name: None,
    };
    data_source.schema().validate(&input)?;

    let state = data_source.read(&input, &StopContext::new())?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}
