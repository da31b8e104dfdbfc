use alm_engine::{
    clock::SystemClock,
    config::Config,
    lifecycle::{load_requests, AlarmHooks, AlarmLifecycle},
    notifications::Dispatcher,
    state::{AlarmFilter, EntityStore, InMemoryStore, StoreSeed},
    topology::{enrich_topology, InMemoryTopologyProvider, TopologyProvider},
};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "alm-engine")]
#[command(version, about = "Replay alarm writes through the alarm decision engines", long_about = None)]
struct Cli {
    /// Override configuration file (defaults to $ALM_CONFIG_PATH or config/alm.toml)
    #[arg(short, long, env = "ALM_CONFIG_PATH")]
    config: Option<String>,

    /// Seed file with rules, policies, windows, topologies and alarms
    #[arg(short, long)]
    seed: Option<PathBuf>,

    /// Write requests to replay, in order (YAML or JSON)
    #[arg(value_name = "REPLAY_FILE")]
    replay: Option<PathBuf>,

    /// Keep running after the replay so pending escalation steps can fire
    #[arg(long, default_value = "0")]
    linger_secs: u64,

    /// Print the Prometheus exposition on exit
    #[arg(long)]
    dump_metrics: bool,

    /// Print seeded topologies with the alarm overlay on exit
    #[arg(long)]
    dump_topology: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;

    init_tracing(&config);

    tracing::info!("Starting alm-engine v{}", env!("CARGO_PKG_VERSION"));

    if config.observability.prometheus_enabled {
        if let Err(e) = alm_engine::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
        }
    }

    let seed = match cli.seed.as_ref().or(config.state.seed_path.as_ref()) {
        Some(path) => {
            let seed = StoreSeed::from_path(path)
                .with_context(|| format!("failed to load seed {}", path.display()))?;
            seed.check()?;
            tracing::info!(
                path = %path.display(),
                rules = seed.correlation_rules.len(),
                escalation_policies = seed.escalation_policies.len(),
                notification_policies = seed.notification_policies.len(),
                windows = seed.maintenance_windows.len(),
                topologies = seed.topologies.len(),
                "Seed loaded"
            );
            seed
        }
        None => StoreSeed::default(),
    };

    let store = Arc::new(InMemoryStore::from_seed(&seed));
    let topology = Arc::new(InMemoryTopologyProvider::with_topologies(
        seed.topologies.iter().cloned(),
    ));
    let dispatcher = Arc::new(
        Dispatcher::new(&config.notifications).context("failed to build notification senders")?,
    );

    let provider: Option<Arc<dyn TopologyProvider>> = if topology.is_empty() {
        None
    } else {
        Some(topology.clone())
    };

    let hooks = Arc::new(AlarmHooks::new(
        &config,
        store.clone(),
        provider,
        dispatcher,
        Arc::new(SystemClock),
    ));
    let lifecycle = AlarmLifecycle::new(store.clone(), hooks.clone());

    if let Some(path) = &cli.replay {
        let requests = load_requests(path)
            .with_context(|| format!("failed to load replay file {}", path.display()))?;
        tracing::info!(count = requests.len(), "Replaying alarm writes");

        for request in requests {
            let action = request.action();
            match lifecycle.write(request).await {
                Ok(alarm) => tracing::info!(
                    alarm_id = %alarm.alarm_id,
                    action = %action,
                    state = %alarm.state,
                    root_cause = alarm.root_cause_alarm_id.as_deref().unwrap_or(""),
                    "Write applied"
                ),
                Err(e) => tracing::warn!(action = %action, code = e.error_code(), error = %e, "Write rejected"),
            }
        }
    }

    if cli.linger_secs > 0 {
        let pending = hooks.escalation().map(|s| s.active_count()).unwrap_or(0);
        tracing::info!(seconds = cli.linger_secs, pending_escalations = pending, "Lingering");

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(cli.linger_secs)) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
            }
        }
    }

    if cli.dump_topology {
        let alarms = store.list_alarms(&AlarmFilter::default()).await?;
        for mut topology in seed.topologies {
            enrich_topology(&mut topology, &alarms);
            println!("{}", serde_json::to_string_pretty(&topology)?);
        }
    }

    if cli.dump_metrics {
        print!("{}", alm_engine::metrics::gather_metrics());
    }

    tracing::info!("Shutting down");
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("alm_engine={}", config.observability.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);

    if config.observability.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
