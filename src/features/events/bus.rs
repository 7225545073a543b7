//! Event bus

use log::{debug, error};
use std::collections::HashMap;
use std::sync::atomic::Ordering;

use crate::commands::registry::Registry;
use crate::core::ErrorLog;
use crate::features::actions::{ActionRunner, Responder};
use crate::features::definitions::{normalize_event_name, EventDefinition};

/// Fires event definitions for gateway events
pub struct EventBus {
    registry: Registry<EventDefinition>,
    actions: ActionRunner,
    errors: ErrorLog,
}

impl EventBus {
    pub fn new(actions: ActionRunner, errors: ErrorLog) -> Self {
        Self {
            registry: Registry::new(),
            actions,
            errors,
        }
    }

    pub fn registry(&self) -> &Registry<EventDefinition> {
        &self.registry
    }

    /// Run every enabled listener for `event`; returns how many ran
    ///
    /// A failing listener is logged and does not stop the others.
    pub async fn emit(
        &self,
        event: &str,
        vars: &HashMap<String, String>,
        responder: &dyn Responder,
    ) -> usize {
        let event = normalize_event_name(event);
        let mut fired = 0;

        for listener in self.registry.list() {
            if listener.name != event || listener.disabled {
                continue;
            }
            if listener.once && listener.fired.swap(true, Ordering::SeqCst) {
                continue;
            }

            debug!("Firing listener for {event}");
            fired += 1;
            if let Err(e) = self.actions.run(&listener.action, vars, responder).await {
                error!("❌ Error executing event {event}: {e:#}");
                self.errors
                    .record(&format!("Error executing event {event}"), &e)
                    .await;
            }
        }

        fired
    }
}
