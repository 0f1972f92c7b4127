//! Binary entry point: loads a venue [`GatewayConfigFile`], launches a
//! [`FeedGateway`] for every configured instrument, and records every
//! [`Update`] a subscriber observes to NDJSON. Argument parsing follows
//! `exchange-sim/src/main.rs`'s manual `--flag value` loop over `env::args`
//! rather than pulling in a CLI-parsing crate — out of scope per spec §1.

use std::io;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use convex_gateway::config::{load_config, load_default_config};
use convex_gateway::infrastructure::RestClient;
use convex_gateway::{FeedGateway, Recorder, Subscriber, Supervisor};

fn print_help() {
    eprintln!(
        r#"convex-recorder - records a venue's order-book feed to NDJSON

USAGE:
    convex-recorder [OPTIONS]

OPTIONS:
    --config <PATH>     Load gateway configuration from a JSON file
                         (default: the embedded GDAX BTC-USD config)
    --help              Print this help message

Ctrl-C once requests a graceful shutdown; a second Ctrl-C forces it.
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "convex_recorder=info,convex_gateway=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => {
                i += 1;
                let Some(path) = args.get(i) else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                };
                config_path = Some(path.clone());
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = match &config_path {
        Some(path) => {
            tracing::info!(path, "loading gateway configuration");
            load_config(path)?
        }
        None => {
            tracing::info!("no --config given, using embedded GDAX BTC-USD default");
            load_default_config()?
        }
    };

    let gateway_config = config.gateway_config();
    let md_config = config.market_data_config();
    let fetcher = Arc::new(RestClient::new(gateway_config.rest_base_url.clone()));
    let gateway = FeedGateway::new(gateway_config, md_config.clone(), fetcher);

    let recorder = Arc::new(Recorder::new(io::stdout()));
    let mut drains = Vec::new();
    for instrument_cfg in &config.instruments {
        let instrument = convex_core::Instrument::new(
            &instrument_cfg.base_currency,
            &instrument_cfg.quote_currency,
            &config.venue_id,
        );
        let subscriber = Arc::new(Subscriber::new(md_config.update_cache_size));
        gateway.register(instrument.clone(), subscriber.clone());

        let recorder = Arc::clone(&recorder);
        drains.push(tokio::spawn(async move {
            loop {
                let update = subscriber.fetch().await;
                if let Err(err) = recorder.record(&update) {
                    tracing::error!(instrument = %instrument, error = %err, "failed to record update");
                }
            }
        }));
    }

    let supervisor = Supervisor::new(gateway);
    supervisor.run().await;

    for drain in drains {
        drain.abort();
    }
    recorder.flush()?;
    Ok(())
}
