//! Shared fixtures for the integration tests: a recording dispatch sink and
//! a lifecycle wired over the in-memory store.

#![allow(dead_code)]

use alm_engine::{
    clock::ManualClock,
    config::Config,
    error::Result,
    lifecycle::{AlarmHooks, AlarmLifecycle},
    models::{Alarm, NotificationChannel, Topology},
    notifications::{ChannelSender, Dispatcher},
    state::{InMemoryStore, StoreSeed},
    topology::{InMemoryTopologyProvider, TopologyProvider},
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// Captures every dispatched `(endpoint, message)` pair
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSender {
    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, m)| m.clone()).collect()
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(e, _)| e.clone()).collect()
    }
}

#[async_trait]
impl ChannelSender for RecordingSender {
    async fn send(&self, endpoint: &str, message: &str) -> Result<()> {
        self.sent
            .lock()
            .push((endpoint.to_string(), message.to_string()));
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Dispatcher routing every channel to one recorder
pub fn recording_dispatcher() -> (Arc<Dispatcher>, Arc<RecordingSender>) {
    let dispatcher = Dispatcher::logging_only();
    let recorder = Arc::new(RecordingSender::default());

    for channel in [
        NotificationChannel::Email,
        NotificationChannel::Webhook,
        NotificationChannel::Slack,
        NotificationChannel::Pagerduty,
        NotificationChannel::Custom,
    ] {
        dispatcher.register(channel, recorder.clone());
    }

    (Arc::new(dispatcher), recorder)
}

pub fn fixed_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
}

/// The full hook chain over an in-memory store
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub recorder: Arc<RecordingSender>,
    pub clock: ManualClock,
    pub hooks: Arc<AlarmHooks>,
    pub lifecycle: AlarmLifecycle,
}

impl Harness {
    pub fn new(seed: StoreSeed) -> Self {
        Self::at(seed, Utc::now())
    }

    pub fn at(seed: StoreSeed, now: DateTime<Utc>) -> Self {
        let store = Arc::new(InMemoryStore::from_seed(&seed));
        let (dispatcher, recorder) = recording_dispatcher();
        let clock = ManualClock::new(now);

        let provider: Option<Arc<dyn TopologyProvider>> = if seed.topologies.is_empty() {
            None
        } else {
            Some(Arc::new(InMemoryTopologyProvider::with_topologies(
                seed.topologies.iter().cloned(),
            )))
        };

        let hooks = Arc::new(AlarmHooks::new(
            &Config::default(),
            store.clone(),
            provider,
            dispatcher,
            Arc::new(clock.clone()),
        ));
        let lifecycle = AlarmLifecycle::new(store.clone(), hooks.clone());

        Self {
            store,
            recorder,
            clock,
            hooks,
            lifecycle,
        }
    }
}

/// Chain topology `n0 - n1 - ... - n{len-1}` of bidirectional links
pub fn chain_topology(len: usize) -> Topology {
    let mut topology = Topology::new("chain");
    for i in 0..len {
        topology.add_node(format!("n{}", i), "router");
    }
    for i in 1..len {
        topology.add_link(
            format!("l{}", i),
            format!("n{}", i - 1),
            format!("n{}", i),
            alm_engine::models::LinkDirection::Bidirectional,
        );
    }
    topology
}

pub fn alarm_on(id: &str, node: &str, name: &str, severity: alm_engine::models::Severity) -> Alarm {
    Alarm::new(id, "def-1", node, name, severity).with_node_name(node)
}
