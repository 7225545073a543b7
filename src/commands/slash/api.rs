//! Remote application command API

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use serenity::http::Http;
use std::sync::Arc;

/// A command as Discord knows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    pub id: u64,
    pub name: String,
}

/// The slice of Discord's HTTP API the registrar needs
#[async_trait]
pub trait CommandApi: Send + Sync {
    /// Replace every global command with `commands`
    async fn overwrite_global(&self, commands: &[Value]) -> Result<()>;

    /// Replace every command of one guild with `commands`
    async fn overwrite_guild(&self, guild_id: u64, commands: &[Value]) -> Result<()>;

    async fn list_global(&self) -> Result<Vec<RemoteCommand>>;

    async fn list_guild(&self, guild_id: u64) -> Result<Vec<RemoteCommand>>;

    async fn delete_global(&self, command_id: u64) -> Result<()>;

    async fn delete_guild(&self, guild_id: u64, command_id: u64) -> Result<()>;
}

/// `CommandApi` over serenity's HTTP client
///
/// The client must have the application id set.
pub struct SerenityCommandApi {
    http: Arc<Http>,
}

impl SerenityCommandApi {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

fn remote(commands: Vec<serenity::model::application::command::Command>) -> Vec<RemoteCommand> {
    commands
        .into_iter()
        .map(|c| RemoteCommand {
            id: c.id.0,
            name: c.name,
        })
        .collect()
}

#[async_trait]
impl CommandApi for SerenityCommandApi {
    async fn overwrite_global(&self, commands: &[Value]) -> Result<()> {
        let body = Value::Array(commands.to_vec());
        self.http.create_global_application_commands(&body).await?;
        Ok(())
    }

    async fn overwrite_guild(&self, guild_id: u64, commands: &[Value]) -> Result<()> {
        let body = Value::Array(commands.to_vec());
        self.http
            .create_guild_application_commands(guild_id, &body)
            .await?;
        Ok(())
    }

    async fn list_global(&self) -> Result<Vec<RemoteCommand>> {
        Ok(remote(self.http.get_global_application_commands().await?))
    }

    async fn list_guild(&self, guild_id: u64) -> Result<Vec<RemoteCommand>> {
        Ok(remote(
            self.http.get_guild_application_commands(guild_id).await?,
        ))
    }

    async fn delete_global(&self, command_id: u64) -> Result<()> {
        self.http.delete_global_application_command(command_id).await?;
        Ok(())
    }

    async fn delete_guild(&self, guild_id: u64, command_id: u64) -> Result<()> {
        self.http
            .delete_guild_application_command(guild_id, command_id)
            .await?;
        Ok(())
    }
}

/// Whether an API error means the configured application id is wrong
pub fn is_unknown_application(error: &anyhow::Error) -> bool {
    error
        .chain()
        .any(|cause| cause.to_string().contains("Unknown Application"))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;

    /// Records calls and keeps a fake remote command list
    #[derive(Default)]
    pub struct MockCommandApi {
        pub global: Mutex<Vec<RemoteCommand>>,
        pub guilds: Mutex<std::collections::HashMap<u64, Vec<RemoteCommand>>>,
        /// Names sent in each global overwrite, in call order
        pub global_pushes: Mutex<Vec<Vec<String>>>,
        pub guild_pushes: Mutex<Vec<(u64, Vec<String>)>>,
        pub deleted: Mutex<Vec<(Option<u64>, u64)>>,
        pub fail_overwrites: Mutex<bool>,
        /// Guilds whose overwrite and list calls fail, like a guild the bot left
        pub failing_guilds: Mutex<Vec<u64>>,
        next_id: Mutex<u64>,
    }

    impl MockCommandApi {
        pub fn with_global(names: &[&str]) -> Self {
            let api = Self::default();
            *api.global.lock().unwrap() = api.assign(names.iter().map(|n| n.to_string()));
            api
        }

        fn assign(&self, names: impl Iterator<Item = String>) -> Vec<RemoteCommand> {
            let mut next = self.next_id.lock().unwrap();
            names
                .map(|name| {
                    *next += 1;
                    RemoteCommand { id: *next, name }
                })
                .collect()
        }

        fn names(commands: &[Value]) -> Vec<String> {
            commands
                .iter()
                .filter_map(|c| c["name"].as_str().map(String::from))
                .collect()
        }

        fn check_guild(&self, guild_id: u64) -> Result<()> {
            if self.failing_guilds.lock().unwrap().contains(&guild_id) {
                return Err(anyhow!("Missing Access"));
            }
            Ok(())
        }

        pub fn global_names(&self) -> Vec<String> {
            self.global
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.name.clone())
                .collect()
        }
    }

    #[async_trait]
    impl CommandApi for MockCommandApi {
        async fn overwrite_global(&self, commands: &[Value]) -> Result<()> {
            if *self.fail_overwrites.lock().unwrap() {
                return Err(anyhow!("Unknown Application"));
            }
            let names = Self::names(commands);
            self.global_pushes.lock().unwrap().push(names.clone());
            let assigned = self.assign(names.into_iter());
            *self.global.lock().unwrap() = assigned;
            Ok(())
        }

        async fn overwrite_guild(&self, guild_id: u64, commands: &[Value]) -> Result<()> {
            self.check_guild(guild_id)?;
            let names = Self::names(commands);
            self.guild_pushes
                .lock()
                .unwrap()
                .push((guild_id, names.clone()));
            let assigned = self.assign(names.into_iter());
            self.guilds.lock().unwrap().insert(guild_id, assigned);
            Ok(())
        }

        async fn list_global(&self) -> Result<Vec<RemoteCommand>> {
            Ok(self.global.lock().unwrap().clone())
        }

        async fn list_guild(&self, guild_id: u64) -> Result<Vec<RemoteCommand>> {
            self.check_guild(guild_id)?;
            Ok(self
                .guilds
                .lock()
                .unwrap()
                .get(&guild_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn delete_global(&self, command_id: u64) -> Result<()> {
            self.deleted.lock().unwrap().push((None, command_id));
            self.global.lock().unwrap().retain(|c| c.id != command_id);
            Ok(())
        }

        async fn delete_guild(&self, guild_id: u64, command_id: u64) -> Result<()> {
            self.deleted
                .lock()
                .unwrap()
                .push((Some(guild_id), command_id));
            if let Some(list) = self.guilds.lock().unwrap().get_mut(&guild_id) {
                list.retain(|c| c.id != command_id);
            }
            Ok(())
        }
    }
}
