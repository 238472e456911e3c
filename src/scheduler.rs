//! Periodic agent scheduler with coordinated shutdown
//!
//! Every registered agent runs on its own task: one cycle immediately, then
//! one cycle per `frequency` until shutdown is broadcast. A cycle already in
//! flight is never interrupted; the agent notices the shutdown once the cycle
//! returns, waits out the drain delay and reports its name on the completion
//! channel. [`SchedulerHandle::shutdown`] returns once every agent has
//! reported.
//!
//! A cycle that panics stops its own agent on the spot: the panic is logged
//! with the agent's name, the agent never reports completion, and the other
//! agents keep their schedules.

use crate::agent::{Agent, CycleOutcome};
use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Collects agents and starts them together
pub struct Scheduler {
    agents: Vec<Box<dyn Agent>>,
    drain_delay: Duration,
}

impl Scheduler {
    pub fn new(drain_delay: Duration) -> Self {
        Self {
            agents: Vec::new(),
            drain_delay,
        }
    }

    pub fn register(&mut self, agent: impl Agent + 'static) {
        self.register_boxed(Box::new(agent));
    }

    pub fn register_boxed(&mut self, agent: Box<dyn Agent>) {
        info!(
            worker = agent.name(),
            frequency_secs = agent.frequency().as_secs(),
            "Agent registered"
        );
        self.agents.push(agent);
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Spawn one task per agent. Must be called inside a tokio runtime.
    pub fn start(self) -> SchedulerHandle {
        let expected = self.agents.len();
        let drain_delay = self.drain_delay;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (finished_tx, finished_rx) = mpsc::channel(expected.max(1));

        let tasks = self
            .agents
            .into_iter()
            .map(|agent| {
                tokio::spawn(execute_agent(
                    agent,
                    shutdown_rx.clone(),
                    finished_tx.clone(),
                    drain_delay,
                ))
            })
            .collect();

        info!(agents = expected, "Scheduler started");

        SchedulerHandle {
            shutdown_tx,
            finished_rx,
            expected,
            tasks,
        }
    }

    /// Run all agents until `signal` resolves, then shut them down.
    ///
    /// Returns the names of the agents that reported completion.
    pub async fn run_until<F>(self, signal: F) -> Vec<String>
    where
        F: Future<Output = ()>,
    {
        let handle = self.start();
        signal.await;
        info!("Shutdown requested");
        handle.shutdown().await
    }
}

/// Control side of a started [`Scheduler`]
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    finished_rx: mpsc::Receiver<String>,
    expected: usize,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    pub fn agent_count(&self) -> usize {
        self.expected
    }

    /// Broadcast shutdown and wait for every agent to report completion
    pub async fn shutdown(mut self) -> Vec<String> {
        info!(agents = self.expected, "Stopping agents");

        self.shutdown_tx.send_replace(true);

        let mut finished = Vec::with_capacity(self.expected);
        while finished.len() < self.expected {
            match self.finished_rx.recv().await {
                Some(name) => {
                    info!(worker = %name, "Agent finished");
                    finished.push(name);
                }
                None => {
                    warn!(
                        finished = finished.len(),
                        expected = self.expected,
                        "Completion channel closed before all agents reported"
                    );
                    break;
                }
            }
        }

        for result in join_all(self.tasks).await {
            if let Err(e) = result {
                error!(error = %e, "Agent task failed");
            }
        }

        info!(finished = finished.len(), "All agents stopped");
        finished
    }
}

async fn execute_agent(
    mut agent: Box<dyn Agent>,
    mut shutdown: watch::Receiver<bool>,
    finished: mpsc::Sender<String>,
    drain_delay: Duration,
) {
    let name = agent.name().to_string();
    let frequency = agent.frequency();

    if run_cycle(agent.as_mut()).await.is_none() {
        return;
    }

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = tokio::time::sleep(frequency) => {
                if run_cycle(agent.as_mut()).await.is_none() {
                    return;
                }
            }
        }
    }

    info!(worker = %name, "Agent received shutdown signal");
    tokio::time::sleep(drain_delay).await;

    if finished.send(name.clone()).await.is_err() {
        warn!(worker = %name, "Nobody waiting for agent completion");
    }
}

/// Run one cycle inside its span. `None` means the cycle panicked.
async fn run_cycle(agent: &mut dyn Agent) -> Option<CycleOutcome> {
    let span = info_span!("agent", worker = %agent.name(), cycle_id = %Uuid::new_v4());
    let result = AssertUnwindSafe(agent.run_cycle())
        .catch_unwind()
        .instrument(span.clone())
        .await;

    span.in_scope(|| match result {
        Ok(outcome) if outcome.is_error() => {
            warn!(outcome = %outcome, "Cycle failed");
            Some(outcome)
        }
        Ok(outcome) => {
            debug!(outcome = %outcome, "Cycle finished");
            Some(outcome)
        }
        Err(panic) => {
            error!(panic = panic_message(&*panic), "Cycle panicked, agent stopped");
            None
        }
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

/// Resolves on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
