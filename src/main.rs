mod backend;
mod config;
mod error;
mod gateway;
mod models;
mod repositories;
mod server;
mod store;
mod synth;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::Request;
use clap::Parser;
use dotenvy::dotenv;
use hyper::Method;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use reqwest::Url;
use sentry::integrations::tower::{NewSentryLayer, SentryHttpLayer};
use std::error::Error;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::backend::LocalBackend;
use crate::config::{Config, StoreBackend};
use crate::gateway::{NetworkGateway, OutboundRequest, ReqwestTransport};
use crate::store::file_store::FileKeyValueStore;
use crate::store::memory_store::MemoryKeyValueStore;
use crate::store::sqlite_store::SqliteKeyValueStore;
use crate::store::{KeyValueStore, StoreAdapter};

#[derive(Parser)]
#[command(name = "local-backend", about = "Serves the prompt-manager remote API from local storage")]
enum Cli {
    /// Start the HTTP server (default when no subcommand is given)
    #[command(alias = "run")]
    Serve,
    /// Send one request through the network gateway and print the response
    Call {
        /// HTTP method, e.g. GET or POST
        method: String,
        /// Absolute request URL
        url: String,
        /// JSON request body
        #[arg(long)]
        body: Option<String>,
    },
    /// Print every stored collection as JSON
    Dump,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    // Default to Serve when no subcommand is given, but still allow --help
    // and --version to work.
    let args: Vec<String> = std::env::args().collect();
    let cli = if args.len() <= 1 { Cli::Serve } else { Cli::parse() };

    init_tracing();
    let config = Config::from_env();

    let _guard = sentry::init((
        config.sentry_dsn.clone().unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(config.environment.clone().into()),
            send_default_pii: true,
            traces_sample_rate: 0.2,
            enable_logs: true,
            ..Default::default()
        },
    ));

    match cli {
        Cli::Serve => run_server(config).await,
        Cli::Call { method, url, body } => {
            run_call(config, &method, &url, body).await?;
            Ok(())
        }
        Cli::Dump => {
            run_dump(config).await?;
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("local_backend=info,tower_http=warn,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true).with_bracketed_fields(false))
        .with(sentry::integrations::tracing::layer().event_filter(
            |metadata| match *metadata.level() {
                tracing::Level::ERROR => sentry::integrations::tracing::EventFilter::Event,
                tracing::Level::WARN | tracing::Level::INFO => {
                    sentry::integrations::tracing::EventFilter::Breadcrumb
                }
                _ => sentry::integrations::tracing::EventFilter::Ignore,
            },
        ))
        .init();
}

fn open_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match config.store_backend {
        StoreBackend::File => Arc::new(FileKeyValueStore::new(&config.data_dir, &config.store_namespace)),
        StoreBackend::Sqlite => {
            let path = config.data_dir.join("store.db");
            Arc::new(
                SqliteKeyValueStore::open(&path, &config.store_namespace)
                    .with_context(|| format!("failed to open sqlite store at {}", path.display()))?,
            )
        }
        StoreBackend::Memory => Arc::new(MemoryKeyValueStore::new()),
    };
    tracing::info!(
        backend = ?config.store_backend,
        data_dir = %config.data_dir.display(),
        namespace = %config.store_namespace,
        "store opened"
    );
    Ok(store)
}

async fn build_gateway(config: &Config) -> Result<(Arc<LocalBackend>, Arc<NetworkGateway>)> {
    let store = StoreAdapter::new(open_store(config)?);
    let backend = Arc::new(LocalBackend::new(store, config.api_prefix.clone()));
    backend.initialize().await;

    let transport = Arc::new(ReqwestTransport::new()?);
    let gateway = Arc::new(NetworkGateway::from_config(config, transport, backend.clone()));
    Ok((backend, gateway))
}

async fn run_server(config: Config) -> Result<(), Box<dyn Error>> {
    let (backend, gateway) = build_gateway(&config).await?;
    tracing::info!(
        blocked = ?config.blocked_hosts,
        allowed = ?config.allowed_hosts,
        max_depth = config.max_intercept_depth,
        "network gateway ready"
    );

    let app = server::create_app(server::AppState { backend, gateway })
        .layer(SentryHttpLayer::new().enable_transaction())
        .layer(NewSentryLayer::<Request<Body>>::new_from_top());

    let port = config.port;
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!("Listening on http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_call(config: Config, method: &str, url: &str, body: Option<String>) -> Result<()> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method: {method}"))?;
    let url = Url::parse(url).with_context(|| format!("invalid URL: {url}"))?;

    let mut request = OutboundRequest::new(method, url);
    if let Some(body) = body {
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        request = request.with_body(body);
    }

    let (_, gateway) = build_gateway(&config).await?;
    let resp = gateway.fetch(request).await?;

    println!("{}", resp.status);
    for (name, value) in &resp.headers {
        println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
    }
    println!();
    match resp.json() {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", String::from_utf8_lossy(&resp.body)),
    }
    Ok(())
}

async fn run_dump(config: Config) -> Result<()> {
    let store = StoreAdapter::new(open_store(&config)?);
    let snapshot = store.snapshot().await;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
