use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info, warn};
use serenity::async_trait;
use serenity::http::Http;
use serenity::model::application::interaction::Interaction;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::guild::{Guild, Member, UnavailableGuild};
use serenity::model::id::{ChannelId, GuildId, MessageId};
use serenity::model::user::User;
use serenity::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use discobase::command_handler::{user_vars, GuildLogChannels};
use discobase::commands::slash::{is_unknown_application, CommandRegistrar, SerenityCommandApi};
use discobase::commands::{CommandHandler, Dispatcher, Registry};
use discobase::core::{install_panic_hook, Config, ErrorLog};
use discobase::features::actions::{ActionRunner, ExecRunner};
use discobase::features::audit::{AuditSink, ChannelAuditSink, LogAuditSink};
use discobase::features::cooldown::{spawn_prune_loop, CooldownLedger, PRUNE_INTERVAL};
use discobase::features::events::EventBus;
use discobase::features::hot_reload::{DefinitionRoots, FileWatcher, HotReloader};

struct Handler {
    command_handler: Arc<CommandHandler>,
    registrar: Arc<CommandRegistrar>,
    reloader: Arc<HotReloader>,
    cooldowns: Arc<CooldownLedger>,
    watch_quiet: Duration,
    /// `ready` fires again after reconnects; background tasks start once
    started: AtomicBool,
    watcher: Mutex<Option<FileWatcher>>,
}

impl Handler {
    async fn start_background_tasks(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        match Arc::clone(&self.reloader).start(self.watch_quiet) {
            Ok((watcher, _task)) => {
                *self.watcher.lock().await = Some(watcher);
                info!("🔥 Hot reload enabled");
            }
            Err(e) => error!("❌ Failed to start file watcher, hot reload disabled: {e:#}"),
        }

        spawn_prune_loop(Arc::clone(&self.cooldowns), PRUNE_INTERVAL);
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);

        if let Err(e) = self
            .registrar
            .sync(self.command_handler.slash_registry())
            .await
        {
            if is_unknown_application(&e) {
                error!("❌ DISCORD_APPLICATION_ID does not match the bot token: {e:#}");
                std::process::exit(1);
            }
            error!("❌ Failed to register application (/) commands: {e:#}");
        }

        self.start_background_tasks().await;

        let vars = user_vars(ready.user.id.0, &ready.user.tag());
        self.command_handler.handle_event(&ctx, "ready", &vars).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::ApplicationCommand(command) = interaction {
            if let Err(e) = self
                .command_handler
                .handle_slash_command(&ctx, &command)
                .await
            {
                error!("Error handling slash command '{}': {e:#}", command.data.name);
            }
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if let Err(e) = self.command_handler.handle_message(&ctx, &msg).await {
            error!("Error handling message: {e:#}");
        }
    }

    async fn message_delete(
        &self,
        ctx: Context,
        channel_id: ChannelId,
        deleted_message_id: MessageId,
        guild_id: Option<GuildId>,
    ) {
        let mut vars = HashMap::from([
            ("channel_id".to_string(), channel_id.0.to_string()),
            ("message_id".to_string(), deleted_message_id.0.to_string()),
        ]);
        if let Some(guild_id) = guild_id {
            vars.insert("guild_id".to_string(), guild_id.0.to_string());
        }
        self.command_handler
            .handle_event(&ctx, "message_delete", &vars)
            .await;
    }

    async fn guild_create(&self, ctx: Context, guild: Guild, is_new: bool) {
        if is_new {
            self.command_handler.handle_guild_join(&ctx, &guild).await;
        } else {
            info!("📥 Guild available: {} ({})", guild.name, guild.id);
        }
    }

    async fn guild_delete(&self, ctx: Context, incomplete: UnavailableGuild, full: Option<Guild>) {
        // Outages also arrive as guild_delete with `unavailable` set
        if incomplete.unavailable {
            warn!("⚠️ Guild {} became unavailable", incomplete.id);
            return;
        }
        self.command_handler
            .handle_guild_leave(&ctx, incomplete.id, full.map(|g| g.name))
            .await;
    }

    async fn guild_member_addition(&self, ctx: Context, new_member: Member) {
        let mut vars = user_vars(new_member.user.id.0, &new_member.user.tag());
        vars.insert("guild_id".to_string(), new_member.guild_id.0.to_string());
        if let Some(name) = new_member.guild_id.name(&ctx.cache) {
            vars.insert("guild".to_string(), name);
        }
        self.command_handler
            .handle_event(&ctx, "guild_member_add", &vars)
            .await;
    }

    async fn guild_member_removal(
        &self,
        ctx: Context,
        guild_id: GuildId,
        user: User,
        _member_data_if_available: Option<Member>,
    ) {
        let mut vars = user_vars(user.id.0, &user.tag());
        vars.insert("guild_id".to_string(), guild_id.0.to_string());
        if let Some(name) = guild_id.name(&ctx.cache) {
            vars.insert("guild".to_string(), name);
        }
        self.command_handler
            .handle_event(&ctx, "guild_member_remove", &vars)
            .await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();
    install_panic_hook();

    info!("Starting discoBase bot...");

    let roots = DefinitionRoots::new(
        &config.commands_dir,
        &config.messages_dir,
        &config.events_dir,
    );
    let errors = ErrorLog::new(&config.errors_dir, config.error_logging_enabled);
    let actions = ActionRunner::new(ExecRunner::new(config.exec_allowed_commands.clone()));

    let slash = Arc::new(Registry::new());
    let prefix = Arc::new(Registry::new());
    let events = Arc::new(EventBus::new(actions.clone(), errors.clone()));

    let http = Arc::new(Http::new_with_application_id(
        &config.discord_token,
        config.application_id,
    ));
    let audit: Arc<dyn AuditSink> = match config.command_logs_channel_id {
        Some(channel_id) => Arc::new(ChannelAuditSink::new(Arc::clone(&http), channel_id)),
        None => Arc::new(LogAuditSink),
    };

    let cooldowns = Arc::new(CooldownLedger::new());
    let dispatcher = Arc::new(Dispatcher::new(
        config.access_policy(),
        Arc::clone(&cooldowns),
        actions,
        audit,
        errors,
    ));
    let registrar = Arc::new(CommandRegistrar::new(
        Arc::new(SerenityCommandApi::new(Arc::clone(&http))),
        config.developer_guild_ids.clone(),
    ));
    let reloader = Arc::new(HotReloader::new(
        roots,
        Arc::clone(&slash),
        Arc::clone(&prefix),
        Arc::clone(&events),
        Arc::clone(&registrar),
        config.register_debounce,
    ));
    // Prefix files load even when COMMAND_PREFIX is empty, matching what the
    // watcher does; the handler just never routes to them
    let loaded = reloader.load_all();
    info!("📦 {} definition(s) loaded, {} failed", loaded.loaded, loaded.failed);
    if !config.prefix_enabled() {
        info!("Prefix commands disabled (COMMAND_PREFIX is empty)");
    }

    let command_handler = Arc::new(CommandHandler::new(
        slash,
        prefix,
        events,
        dispatcher,
        config.prefix.clone(),
        GuildLogChannels {
            join: config.guild_join_logs_channel_id,
            leave: config.guild_leave_logs_channel_id,
        },
    ));

    let handler = Handler {
        command_handler,
        registrar,
        reloader,
        cooldowns,
        watch_quiet: config.watch_quiet_period,
        started: AtomicBool::new(false),
        watcher: Mutex::new(None),
    };

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .application_id(config.application_id)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Establishing WebSocket connection to Discord gateway...");
    info!("Gateway intents: {intents:?}");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
