//! Teardown of supporting services

use crate::core::Invocation;
use crate::execution::{EventEmitter, ExecutionEvent};
use crate::process::CommandRunner;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{info, warn};

/// Stops supporting services started during a run
///
/// Services are registered as the stages that start them begin. `cleanup`
/// does its work at most once; later calls return without doing anything.
/// Teardown failures are logged and reported as events, never returned.
#[derive(Debug)]
pub struct CleanupHandler {
    teardown: Option<Invocation>,
    services: Mutex<Vec<String>>,
    done: AtomicBool,
}

impl CleanupHandler {
    pub fn new(teardown: Option<Invocation>) -> Self {
        Self {
            teardown,
            services: Mutex::new(Vec::new()),
            done: AtomicBool::new(false),
        }
    }

    /// Record a supporting service that now needs stopping
    pub fn register(&self, service: impl Into<String>) {
        let service = service.into();
        if let Ok(mut services) = self.services.lock() {
            if !services.contains(&service) {
                services.push(service);
            }
        }
    }

    /// Services registered so far
    pub fn services(&self) -> Vec<String> {
        self.services.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Whether `cleanup` has already run
    pub fn has_run(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// Tear down registered services
    ///
    /// Returns `false` when cleanup had already run.
    pub async fn cleanup(&self, runner: &dyn CommandRunner, events: &EventEmitter) -> bool {
        if self.done.swap(true, Ordering::SeqCst) {
            return false;
        }

        let services = self.services();
        events.emit(ExecutionEvent::CleanupStarted {
            services: services.clone(),
        });

        let error = match (&self.teardown, services.is_empty()) {
            (Some(teardown), false) => {
                info!("Stopping supporting services: {}", services.join(", "));
                match runner.run(teardown, None).await {
                    Ok(result) if result.success() => None,
                    Ok(result) => Some(format!(
                        "`{}` exited with code {}: {}",
                        teardown,
                        result.exit_code,
                        result.diagnostics()
                    )),
                    Err(e) => Some(e.to_string()),
                }
            }
            (None, false) => {
                warn!(
                    "No teardown configured; leaving services running: {}",
                    services.join(", ")
                );
                None
            }
            (_, true) => {
                info!("No supporting services to stop");
                None
            }
        };

        if let Some(err) = &error {
            warn!("Cleanup failed: {}", err);
        }
        events.emit(ExecutionEvent::CleanupFinished { error });
        true
    }
}

impl Drop for CleanupHandler {
    fn drop(&mut self) {
        if !self.has_run() {
            let services = self.services();
            if !services.is_empty() {
                warn!(
                    "Cleanup handler dropped before teardown; services may still be running: {}",
                    services.join(", ")
                );
            }
        }
    }
}
