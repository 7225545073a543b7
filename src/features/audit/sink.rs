//! Audit sinks

use crate::commands::context::{Invocation, Trigger};
use crate::core::embeds::audit_embed;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;
use serenity::http::Http;
use serenity::model::id::ChannelId;
use std::sync::Arc;

/// One successful invocation
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub actor: String,
    pub actor_id: u64,
    pub definition: String,
    pub trigger: Trigger,
    pub origin: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    pub fn from_invocation(definition: &str, invocation: &Invocation) -> Self {
        Self {
            actor: invocation.user_tag.clone(),
            actor_id: invocation.user_id,
            definition: definition.to_string(),
            trigger: invocation.trigger,
            origin: invocation.origin(),
            timestamp: Utc::now(),
        }
    }
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: &AuditRecord) -> Result<()>;
}

/// Writes audit records to the log only
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAuditSink;

#[async_trait]
impl AuditSink for LogAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<()> {
        info!(
            "📝 {} ({}) ran {} '{}' in {}",
            record.actor, record.actor_id, record.trigger, record.definition, record.origin
        );
        Ok(())
    }
}

/// Logs, then posts a "Command Executed" embed to a channel
pub struct ChannelAuditSink {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl ChannelAuditSink {
    pub fn new(http: Arc<Http>, channel_id: u64) -> Self {
        Self {
            http,
            channel_id: ChannelId(channel_id),
        }
    }
}

#[async_trait]
impl AuditSink for ChannelAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<()> {
        LogAuditSink.record(record).await?;
        let embed = audit_embed(record);
        self.channel_id
            .send_message(&self.http, |m| m.set_embed(embed))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Keeps records in memory
    #[derive(Default)]
    pub struct MemoryAuditSink {
        pub records: Mutex<Vec<AuditRecord>>,
    }

    impl MemoryAuditSink {
        pub fn definitions(&self) -> Vec<String> {
            self.records
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.definition.clone())
                .collect()
        }
    }

    #[async_trait]
    impl AuditSink for MemoryAuditSink {
        async fn record(&self, record: &AuditRecord) -> Result<()> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }
}
