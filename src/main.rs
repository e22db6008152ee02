// SPDX-License-Identifier: MIT

use anyhow::{Context as _, Result};
use axum::{routing::get, Router};
use futures::StreamExt;
use kube::{
    api::ListParams,
    runtime::{watcher::Config, Controller},
    Api, Client,
};
use powerdns_operator::{
    config,
    constants::{METRICS_SERVER_PATH, TOKIO_WORKER_THREADS},
    context::{Context, Stores},
    crd::{ClusterRRset, ClusterZone, RRset, Zone},
    metrics,
    pdns::{PdnsClient, PdnsHttpClient},
    reconcilers::{
        error_policy, reconcile_cluster_rrset, reconcile_cluster_zone, reconcile_rrset,
        reconcile_zone,
    },
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("powerdns-operator")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

/// Initialize logging with custom format
///
/// Respects `RUST_LOG` environment variable if set, otherwise defaults to
/// INFO level. Respects `RUST_LOG_FORMAT` for output format (json or text).
fn initialize_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting PowerDNS operator");
}

async fn async_main() -> Result<()> {
    initialize_logging();

    let config = config::load()?;

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;

    ensure_crds_installed(&client).await?;

    let pdns_http = PdnsHttpClient::new(
        &config.pdns.api_url,
        &config.pdns.api_key,
        &config.pdns.vhost,
    )?;
    let pdns = PdnsClient::new(pdns_http);
    info!(
        api_url = %config.pdns.api_url,
        vhost = %config.pdns.vhost,
        "PowerDNS client initialized"
    );

    let _server_handle = start_metrics_server(config.metrics_bind_address.clone());

    run_controllers(client, pdns).await
}

/// Verify the four CRDs are queryable before starting any controller.
async fn ensure_crds_installed(client: &Client) -> Result<()> {
    let params = ListParams::default().limit(1);
    Api::<Zone>::all(client.clone())
        .list(&params)
        .await
        .context("Zone CRD is not queryable; is the CRD installed?")?;
    Api::<ClusterZone>::all(client.clone())
        .list(&params)
        .await
        .context("ClusterZone CRD is not queryable; is the CRD installed?")?;
    Api::<RRset>::all(client.clone())
        .list(&params)
        .await
        .context("RRset CRD is not queryable; is the CRD installed?")?;
    Api::<ClusterRRset>::all(client.clone())
        .list(&params)
        .await
        .context("ClusterRRset CRD is not queryable; is the CRD installed?")?;
    Ok(())
}

/// Start the Prometheus metrics HTTP server.
///
/// Serves `/metrics` in text exposition format plus `/healthz` and `/readyz`
/// liveness probes on the configured bind address.
fn start_metrics_server(bind_address: String) -> tokio::task::JoinHandle<()> {
    info!(bind_address = %bind_address, path = METRICS_SERVER_PATH, "Starting metrics HTTP server");

    tokio::spawn(async move {
        async fn metrics_handler() -> String {
            match metrics::gather_metrics() {
                Ok(metrics_text) => metrics_text,
                Err(e) => {
                    error!("Failed to gather metrics: {}", e);
                    String::from("# Error gathering metrics\n")
                }
            }
        }

        async fn health_handler() -> &'static str {
            "ok"
        }

        let app = Router::new()
            .route(METRICS_SERVER_PATH, get(metrics_handler))
            .route("/healthz", get(health_handler))
            .route("/readyz", get(health_handler));

        let listener = match tokio::net::TcpListener::bind(&bind_address).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind metrics server to {bind_address}: {e}");
                return;
            }
        };

        info!("Metrics server listening on http://{bind_address}{METRICS_SERVER_PATH}");

        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {e}");
        }
    })
}

/// Watcher configuration that only triggers on semantic changes, so status
/// patches written by the reconcilers do not retrigger themselves.
#[inline]
fn semantic_watcher_config() -> Config {
    Config::default().any_semantic()
}

/// Watcher configuration for owned resources: the zone must observe status
/// updates of its rrsets (the LastUpdateTime bump drives the serial refresh).
#[inline]
fn default_watcher_config() -> Config {
    Config::default()
}

/// Run the four controllers until a termination signal drains them.
async fn run_controllers(client: Client, pdns: PdnsClient) -> Result<()> {
    let zone_controller = Controller::new(Api::<Zone>::all(client.clone()), semantic_watcher_config())
        .owns(Api::<RRset>::all(client.clone()), default_watcher_config())
        .shutdown_on_signal();

    let cluster_zone_controller = Controller::new(
        Api::<ClusterZone>::all(client.clone()),
        semantic_watcher_config(),
    )
    .owns(Api::<RRset>::all(client.clone()), default_watcher_config())
    .owns(
        Api::<ClusterRRset>::all(client.clone()),
        default_watcher_config(),
    )
    .shutdown_on_signal();

    let rrset_controller = Controller::new(
        Api::<RRset>::all(client.clone()),
        semantic_watcher_config(),
    )
    .shutdown_on_signal();

    let cluster_rrset_controller = Controller::new(
        Api::<ClusterRRset>::all(client.clone()),
        semantic_watcher_config(),
    )
    .shutdown_on_signal();

    // The controller stores double as the secondary indexes for duplicate
    // detection, so they are collected before the controllers start.
    let stores = Stores {
        zones: zone_controller.store(),
        cluster_zones: cluster_zone_controller.store(),
        rrsets: rrset_controller.store(),
        cluster_rrsets: cluster_rrset_controller.store(),
    };

    let ctx = Arc::new(Context {
        client,
        stores,
        pdns,
    });

    info!("Starting controllers");

    tokio::join!(
        zone_controller
            .run(reconcile_zone, error_policy, ctx.clone())
            .for_each(|result| async move {
                match result {
                    Ok(obj) => debug!("Zone reconciled: {obj:?}"),
                    Err(err) => warn!("Zone reconcile dispatch error: {err:?}"),
                }
            }),
        cluster_zone_controller
            .run(reconcile_cluster_zone, error_policy, ctx.clone())
            .for_each(|result| async move {
                match result {
                    Ok(obj) => debug!("ClusterZone reconciled: {obj:?}"),
                    Err(err) => warn!("ClusterZone reconcile dispatch error: {err:?}"),
                }
            }),
        rrset_controller
            .run(reconcile_rrset, error_policy, ctx.clone())
            .for_each(|result| async move {
                match result {
                    Ok(obj) => debug!("RRset reconciled: {obj:?}"),
                    Err(err) => warn!("RRset reconcile dispatch error: {err:?}"),
                }
            }),
        cluster_rrset_controller
            .run(reconcile_cluster_rrset, error_policy, ctx.clone())
            .for_each(|result| async move {
                match result {
                    Ok(obj) => debug!("ClusterRRset reconciled: {obj:?}"),
                    Err(err) => warn!("ClusterRRset reconcile dispatch error: {err:?}"),
                }
            }),
    );

    info!("Controllers stopped, shutting down");
    Ok(())
}
