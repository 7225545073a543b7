//! Guarded dispatch
//!
//! Runs the guard chain shared by slash and prefix commands, then the action.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Cooldown is checked last so rejected attempts do not start one
//! - 1.0.0: Initial guard chain with audit and error logging

use log::{debug, error, warn};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::context::Invocation;
use super::handler::Guarded;
use super::prefix::{self, PrefixRoute};
use super::registry::Registry;
use crate::core::{AccessPolicy, ErrorLog};
use crate::features::actions::{ActionRunner, Responder};
use crate::features::audit::{AuditRecord, AuditSink};
use crate::features::cooldown::CooldownLedger;
use crate::features::definitions::{missing_permissions, PrefixCommand, SlashCommand};

/// Generic reply when an action fails
pub const FAILURE_REPLY: &str = "There was an error while executing this command!";

/// Why a guard refused to run a definition
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    Disabled,
    AdminOnly,
    OwnerOnly,
    MissingUserPermissions(Vec<String>),
    MissingBotPermissions(Vec<String>),
    Cooldown { command: String, remaining: Duration },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Disabled => write!(f, "This command is currently disabled."),
            Rejection::AdminOnly => {
                write!(f, "This command is admin-only. You cannot run this command.")
            }
            Rejection::OwnerOnly => {
                write!(f, "This command is owner-only. You cannot run this command.")
            }
            Rejection::MissingUserPermissions(perms) => write!(
                f,
                "You lack the necessary permissions to execute this command: **{}**",
                perms.join(", ")
            ),
            Rejection::MissingBotPermissions(perms) => write!(
                f,
                "I lack the necessary permissions to execute this command: **{}**",
                perms.join(", ")
            ),
            Rejection::Cooldown { command, remaining } => write!(
                f,
                "Please wait {:.1} more second(s) before reusing the `{}` command.",
                remaining.as_secs_f64(),
                command
            ),
        }
    }
}

/// Result of one dispatch
#[derive(Debug)]
pub enum DispatchOutcome {
    NotFound { suggestions: Vec<String> },
    Rejected(Rejection),
    Executed,
    Failed(anyhow::Error),
}

impl DispatchOutcome {
    pub fn is_executed(&self) -> bool {
        matches!(self, DispatchOutcome::Executed)
    }
}

pub struct Dispatcher {
    access: AccessPolicy,
    cooldowns: Arc<CooldownLedger>,
    actions: ActionRunner,
    audit: Arc<dyn AuditSink>,
    errors: ErrorLog,
}

impl Dispatcher {
    pub fn new(
        access: AccessPolicy,
        cooldowns: Arc<CooldownLedger>,
        actions: ActionRunner,
        audit: Arc<dyn AuditSink>,
        errors: ErrorLog,
    ) -> Self {
        Self {
            access,
            cooldowns,
            actions,
            audit,
            errors,
        }
    }

    pub fn cooldowns(&self) -> &Arc<CooldownLedger> {
        &self.cooldowns
    }

    /// Run the guard chain without executing anything
    ///
    /// Order: disabled, admin/owner, user permissions, bot permissions, cooldown.
    /// The cooldown stamp is only recorded once every other guard has passed.
    pub fn check<D: Guarded>(
        &self,
        definition: &D,
        invocation: &Invocation,
        now: Instant,
    ) -> Result<(), Rejection> {
        let policy = definition.policy();
        let user = invocation.user_id;

        if policy.disabled {
            return Err(Rejection::Disabled);
        }

        // The owner passes admin checks too
        if policy.admin_only && !self.access.is_admin(user) && !self.access.is_owner(user) {
            return Err(Rejection::AdminOnly);
        }
        if policy.owner_only && !self.access.is_owner(user) {
            return Err(Rejection::OwnerOnly);
        }

        let missing = missing_permissions(&policy.user_permissions, invocation.member_permissions);
        if !missing.is_empty() {
            return Err(Rejection::MissingUserPermissions(missing));
        }

        let missing = missing_permissions(&policy.bot_permissions, invocation.bot_permissions);
        if !missing.is_empty() {
            return Err(Rejection::MissingBotPermissions(missing));
        }

        let cooldown = Duration::from_secs(policy.cooldown);
        self.cooldowns
            .check(definition.name(), user, cooldown, now)
            .map_err(|remaining| Rejection::Cooldown {
                command: definition.name().to_string(),
                remaining,
            })
    }

    /// Guard, execute, then audit or report the failure
    ///
    /// Never returns an error: rejections and failures are answered through
    /// `responder` and described by the outcome.
    pub async fn dispatch<D: Guarded>(
        &self,
        definition: &D,
        invocation: &Invocation,
        responder: &dyn Responder,
    ) -> DispatchOutcome {
        let name = definition.name();
        let rid = invocation.request_id;
        debug!(
            "[{rid}] {} '{}' invoked by {} ({}) via {}",
            D::KIND,
            name,
            invocation.user_tag,
            invocation.user_id,
            invocation.trigger
        );

        if let Err(rejection) = self.check(definition, invocation, Instant::now()) {
            debug!("[{rid}] Rejected: {rejection:?}");
            if let Err(e) = responder.reply(&rejection.to_string(), true).await {
                warn!("[{rid}] Failed to send rejection for '{name}': {e}");
            }
            return DispatchOutcome::Rejected(rejection);
        }

        let vars = invocation.template_vars(name);
        match self.actions.run(definition.action(), &vars, responder).await {
            Ok(()) => {
                debug!("[{rid}] '{name}' completed");
                let record = AuditRecord::from_invocation(name, invocation);
                if let Err(e) = self.audit.record(&record).await {
                    warn!("[{rid}] Failed to record audit entry for '{name}': {e}");
                }
                DispatchOutcome::Executed
            }
            Err(e) => {
                error!("❌ [{rid}] Error executing {} '{}': {:#}", D::KIND, name, e);
                self.errors
                    .record(&format!("Error executing {} '{}'", D::KIND, name), &e)
                    .await;
                if let Err(reply_err) = responder.reply(FAILURE_REPLY, true).await {
                    warn!("[{rid}] Failed to send failure reply for '{name}': {reply_err}");
                }
                DispatchOutcome::Failed(e)
            }
        }
    }

    /// Look up a slash command by name and dispatch it
    pub async fn dispatch_slash(
        &self,
        registry: &Registry<SlashCommand>,
        name: &str,
        invocation: &Invocation,
        responder: &dyn Responder,
    ) -> DispatchOutcome {
        match registry.get(name) {
            Some(command) => self.dispatch(command.as_ref(), invocation, responder).await,
            None => {
                warn!("⚠️ Command \"{name}\" not found.");
                DispatchOutcome::NotFound {
                    suggestions: Vec::new(),
                }
            }
        }
    }

    /// Route a text message and dispatch it when it names a prefix command
    ///
    /// Returns `None` when the message is not addressed to the bot. Unknown
    /// triggers are answered with suggestions when there are any.
    pub async fn dispatch_prefix(
        &self,
        registry: &Registry<PrefixCommand>,
        command_prefix: &str,
        content: &str,
        mut invocation: Invocation,
        responder: &dyn Responder,
    ) -> Option<DispatchOutcome> {
        match prefix::route(registry, content, command_prefix) {
            PrefixRoute::NotPrefixed => None,
            PrefixRoute::Unknown {
                trigger,
                suggestions,
            } => {
                warn!("⚠️ Unknown command: \"{trigger}\"");
                if let Some(reply) = prefix::unknown_reply(&suggestions) {
                    if let Err(e) = responder.reply(&reply, false).await {
                        warn!("Failed to send suggestions: {e}");
                    }
                }
                Some(DispatchOutcome::NotFound { suggestions })
            }
            PrefixRoute::Matched { command, parsed } => {
                invocation.invoked_as = parsed.trigger;
                invocation.args = parsed.args;
                Some(self.dispatch(command.as_ref(), &invocation, responder).await)
            }
        }
    }
}
