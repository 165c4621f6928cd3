//! `smartpot` – SmartPot controller daemon.
//!
//! 1. Installs logging (and optional OTLP span export).
//! 2. Loads `~/.smartpot/config.toml`, writing the factory defaults on first
//!    run, and provisions the sensor registry and plant profile from it.
//! 3. Starts two independently supervised loops sharing one `Gateway`:
//!    the HTTP endpoint, and the pub/sub ingress (plus the MQTT bridge when
//!    enabled).
//! 4. Intercepts **Ctrl-C** and shuts every loop down gracefully.

mod config;
mod supervisor;
mod telemetry;

use std::process::ExitCode;
use std::sync::Arc;

use colored::Colorize;
use smartpot_endpoint::HttpEndpoint;
use smartpot_gateway::Gateway;
use smartpot_middleware::{BusAdapter, EventBus, MqttBridge, PubSubIngress, Topic};
use smartpot_types::{EventPayload, PotError, PotResult};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::supervisor::{supervise, RestartPolicy};

fn main() -> ExitCode {
    let _telemetry = telemetry::init_tracing("smartpot");

    print_banner();

    let cfg = match load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            println!("{}: {e}", "Config error".red());
            return ExitCode::FAILURE;
        }
    };
    let gateway = match cfg.provisioning() {
        Ok((registry, profile)) => {
            println!(
                "  {} sensor(s) provisioned, plant: {}",
                registry.len().to_string().bold(),
                if profile.is_provisioned() { profile.species.bold() } else { "none".dimmed() }
            );
            Arc::new(Gateway::new(registry, profile))
        }
        Err(e) => {
            println!("{}: {e}", "Provisioning error".red());
            return ExitCode::FAILURE;
        }
    };

    // ── Shutdown signal ───────────────────────────────────────────────────
    let (stop, shutdown) = watch::channel(false);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – shutting down …".yellow().bold());
        let _ = stop.send(true);
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler; graceful shutdown unavailable");
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cfg, gateway, shutdown)) {
        Ok(()) => {
            println!("{}", "  ✓ SmartPot stopped.".green());
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}: {e}", "Fatal".red());
            ExitCode::FAILURE
        }
    }
}

fn load_config() -> PotResult<Config> {
    match config::load()? {
        Some(cfg) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            Ok(cfg)
        }
        None => {
            let mut cfg = Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  {} Factory defaults written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => warn!(error = %e, "could not write default config"),
            }
            config::apply_env_overrides(&mut cfg);
            Ok(cfg)
        }
    }
}

async fn run(cfg: Config, gateway: Arc<Gateway>, shutdown: watch::Receiver<bool>) -> PotResult<()> {
    let policy = RestartPolicy::default();
    let mut tasks = JoinSet::new();

    // ── Request/response ingress ──────────────────────────────────────────
    let http = Arc::new(
        HttpEndpoint::new(Arc::clone(&gateway))
            .with_addr(cfg.http_addr()?)
            .with_workers(cfg.http_workers),
    );
    println!("  HTTP endpoint on {}", format!("http://{}", http.addr()).bold());
    tasks.spawn(supervise("http-endpoint".into(), shutdown.clone(), policy, move |rx| {
        let http = Arc::clone(&http);
        async move { http.run(rx).await }
    }));

    // ── Publish/subscribe ingress ─────────────────────────────────────────
    let bus = EventBus::new(cfg.bus_capacity);
    let mut adapters: Vec<Arc<dyn BusAdapter>> = vec![Arc::new(PubSubIngress::new(
        Arc::clone(&gateway),
        cfg.ingress_concurrency,
    ))];
    if cfg.mqtt.enabled {
        let settings = cfg.mqtt_settings();
        println!(
            "  MQTT bridge {} ⇄ {} via {}:{}",
            settings.inbound_topic.bold(),
            settings.outbound_topic.bold(),
            settings.host,
            settings.port
        );
        adapters.push(Arc::new(MqttBridge::new(settings)));
    }
    for adapter in adapters {
        let bus = bus.clone();
        tasks.spawn(supervise(adapter.name().to_string(), shutdown.clone(), policy, move |rx| {
            let adapter = Arc::clone(&adapter);
            let bus = bus.clone();
            async move { adapter.run(bus, rx).await }
        }));
    }
    tasks.spawn(log_alerts(bus.clone(), shutdown.clone()));

    println!();
    println!("  {}", "Press Ctrl-C to stop.".dimmed());

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "supervised task panicked");
            return Err(PotError::Transport(e.to_string()));
        }
    }
    info!("all tasks stopped");
    Ok(())
}

/// Surface alerts raised by inbound updates in the log.
async fn log_alerts(bus: EventBus, mut shutdown: watch::Receiver<bool>) -> usize {
    let mut alerts = bus.subscribe_to(Topic::Alerts);
    let mut seen = 0;
    loop {
        if *shutdown.borrow() || shutdown.has_changed().is_err() {
            return seen;
        }
        tokio::select! {
            _ = shutdown.changed() => {}
            received = alerts.recv() => match received {
                Ok(event) => {
                    if let EventPayload::Diagnostic { check, diagnosis } = event.payload {
                        seen += 1;
                        warn!(check = %check, detail = diagnosis.message(), "plant alert");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => warn!(dropped = n, "alert log lagged"),
                Err(broadcast::error::RecvError::Closed) => return seen,
            },
        }
    }
}

fn print_banner() {
    println!();
    println!("{}", r#"   ____                       __  ____        __ "#.bold().green());
    println!("{}", r#"  / __/_ _  ___ _____/ /_ / _ \___  / /_"#.bold().green());
    println!("{}", r#" _\ \/  ' \/ _ `/ __/ __// ___/ _ \/ __/"#.bold().green());
    println!("{}", r#"/___/_/_/_/\_,_/_/  \__//_/   \___/\__/ "#.bold().green());
    println!();
    println!(
        "  {} {}",
        "SmartPot".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Plant care controller");
    println!();
}
