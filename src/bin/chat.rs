//! `undox` terminal chat client.
//!
//! ```text
//! undox chat --category crypto
//! undox list
//! undox expire <ID> 24h
//! undox export --id <ID> --text
//! undox login <KEY>
//! ```

#![allow(clippy::print_stdout)]

use std::io::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use undox::chat::{Category, ConversationId, ExpiryOption, now_millis};
use undox::client::{Attachment, ChatSession, ClientConfig, TurnResult};
use undox::start_undox::init_tracing;
use undox::store::{
    ConversationSet, ConversationStore, PurgeSweep, SqliteRecordStore, StoreConfig,
    export_all, export_one, export_text, format_time_remaining, import, storage_stats,
};

#[derive(Parser, Debug)]
#[command(name = "undox", version, about = "Private AI chat with on-chain wallet context")]
struct Cli {
    /// Server address
    #[arg(long, env = "UNDOX_SERVER_URL", default_value = "http://127.0.0.1:3000")]
    server: String,
    /// Local database file
    #[arg(long, env = "UNDOX_DB_PATH", default_value = "undox.db")]
    db: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Chat interactively; Ctrl-C stops the reply being streamed
    Chat {
        /// Category of a new conversation
        #[arg(long, default_value = "general")]
        category: Category,
        /// Continue an existing conversation instead
        #[arg(long, value_name = "ID")]
        conversation: Option<ConversationId>,
    },
    /// List stored conversations
    List,
    /// Print one conversation as a transcript
    Show {
        /// Conversation id
        id: ConversationId,
    },
    /// List categories and their starter prompts
    Categories,
    /// Set when a conversation is deleted: never, 1h, 24h, 7d
    Expire {
        /// Conversation id
        id: ConversationId,
        /// Retention option
        option: ExpiryOption,
    },
    /// Delete one conversation, or all of them
    Delete {
        /// Conversation id
        id: Option<ConversationId>,
        /// Delete every conversation
        #[arg(long, conflicts_with = "id")]
        all: bool,
    },
    /// Remove expired conversations now
    Purge,
    /// Write conversations to a file
    Export {
        /// Export a single conversation
        #[arg(long, value_name = "ID")]
        id: Option<ConversationId>,
        /// Plain-text transcript instead of JSON (single conversation only)
        #[arg(long, requires = "id")]
        text: bool,
        /// Output directory
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Import conversations from an export file
    Import {
        /// File written by `export`
        file: PathBuf,
    },
    /// Show local storage usage
    Stats,
    /// Store your own model API key locally
    Login {
        /// API key
        key: String,
    },
    /// Forget the locally stored API key
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let store = StoreConfig::from_env().with_db_path(&cli.db);

    match cli.command {
        Commands::Chat {
            category,
            conversation,
        } => {
            let client = ClientConfig::from_env().with_server_url(&cli.server);
            let session = ChatSession::connect(&client, &store).await?;
            chat(&session, &store, category, conversation).await
        }
        Commands::List => {
            let set = open_set(&store)?;
            let now = now_millis();
            for c in set.list() {
                let expiry = c
                    .expires_at
                    .map_or_else(|| "-".to_string(), |at| format_time_remaining(at, now));
                println!(
                    "{}  {:<9} {:>3} msgs  {:>7}  {}",
                    c.id,
                    c.category,
                    c.messages.len(),
                    expiry,
                    c.title
                );
            }
            Ok(())
        }
        Commands::Show { id } => {
            let set = open_set(&store)?;
            let conversation = set.get(id).context("no such conversation")?;
            print!("{}", export_text(&conversation, now_millis().date_naive()).body);
            Ok(())
        }
        Commands::Categories => {
            for category in Category::ALL {
                let info = category.info();
                println!("{} {} ({category}): {}", info.icon, info.name, info.description);
                for starter in info.starters {
                    println!("    - {starter}");
                }
            }
            Ok(())
        }
        Commands::Expire { id, option } => {
            let set = open_set(&store)?;
            let expires_at = option.expires_at(now_millis());
            set.update(id, |c| c.expires_at = expires_at)
                .context("no such conversation")?;
            println!("{}: {}", id, option.label());
            Ok(())
        }
        Commands::Delete { id, all } => {
            let set = open_set(&store)?;
            match (id, all) {
                (_, true) => {
                    set.clear();
                    println!("Deleted all conversations");
                }
                (Some(id), false) => {
                    if !set.remove(id) {
                        bail!("no such conversation");
                    }
                    println!("Deleted {id}");
                }
                (None, false) => bail!("pass a conversation id or --all"),
            }
            Ok(())
        }
        Commands::Purge => {
            let set = open_set(&store)?;
            let removed = set.purge_expired(now_millis());
            println!("Purged {removed} expired conversation(s)");
            Ok(())
        }
        Commands::Export { id, text, dir } => {
            let set = open_set(&store)?;
            let today = now_millis().date_naive();
            let artifact = match id {
                Some(id) => {
                    let conversation = set.get(id).context("no such conversation")?;
                    if text {
                        export_text(&conversation, today)
                    } else {
                        export_one(&conversation, today)?
                    }
                }
                None => export_all(&set.list(), today)?,
            };
            let path = artifact.write_to(&dir)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
        Commands::Import { file } => {
            let set = open_set(&store)?;
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let added = set.import(import(&raw)?);
            println!("Imported {added} conversation(s)");
            Ok(())
        }
        Commands::Stats => {
            let stats = storage_stats(&open_set(&store)?.list());
            println!(
                "{} conversations, {} messages, {}",
                stats.conversation_count, stats.message_count, stats.storage_used
            );
            Ok(())
        }
        Commands::Login { key } => {
            let client = ClientConfig::from_env().with_server_url(&cli.server);
            let session = ChatSession::connect(&client, &store).await?;
            session.enroll(&key)?;
            println!("API key saved locally");
            Ok(())
        }
        Commands::Logout => {
            let client = ClientConfig::from_env().with_server_url(&cli.server);
            let session = ChatSession::connect(&client, &store).await?;
            session.logout();
            println!("Local API key removed");
            Ok(())
        }
    }
}

fn open_set(config: &StoreConfig) -> Result<ConversationSet> {
    config.validate()?;
    let records = SqliteRecordStore::open(&config.db_path)?.with_quota_bytes(config.quota_bytes);
    Ok(ConversationSet::open(
        ConversationStore::new(std::sync::Arc::new(records)),
        now_millis(),
    ))
}

async fn chat(
    session: &ChatSession,
    store: &StoreConfig,
    category: Category,
    conversation: Option<ConversationId>,
) -> Result<()> {
    let sweep = PurgeSweep::new(session.conversations().clone(), store.sweep);
    let stop_sweep = sweep.shutdown_notifier();
    let sweep_task = sweep.spawn();

    if session.credential_source().needs_enrollment() {
        println!("No API key available. Run `undox login <KEY>` first.");
    }

    let mut current = conversation;
    let category = match current.and_then(|id| session.get(id)) {
        Some(existing) => {
            println!("# {} ({})", existing.title, existing.category);
            existing.category
        }
        None if current.is_some() => bail!("no such conversation"),
        None => {
            println!("New {category} conversation. /attach <file>, /expire <never|1h|24h|7d>, /quit");
            category
        }
    };

    let mut pending_attachment: Option<Attachment> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else { break };
        let line = line.trim();

        if line == "/quit" {
            break;
        }
        if let Some(path) = line.strip_prefix("/attach ") {
            match load_attachment(path) {
                Ok(attachment) => {
                    println!("Attached {}", attachment.name);
                    pending_attachment = Some(attachment);
                }
                Err(err) => println!("Could not read {}: {err}", path.trim()),
            }
            continue;
        }
        if let Some(option) = line.strip_prefix("/expire ") {
            let Some(id) = current else {
                println!("Send a message first");
                continue;
            };
            match option.trim().parse::<ExpiryOption>() {
                Ok(option) => {
                    session.set_expiry(id, option, now_millis())?;
                    println!("Auto-delete: {}", option.label());
                }
                Err(err) => println!("{err}"),
            }
            continue;
        }
        if line.is_empty() && pending_attachment.is_none() {
            continue;
        }

        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };

        let mut printed = 0;
        let on_update = |text: &str| {
            print!("{}", &text[printed..]);
            let _ = std::io::stdout().flush();
            printed = text.len();
        };
        let attachment = pending_attachment.take();
        let result = match current {
            Some(id) => session.send(id, line, attachment.as_ref(), &cancel, on_update).await?,
            None => {
                let (id, result) = session
                    .start_conversation(category, line, attachment.as_ref(), &cancel, on_update)
                    .await?;
                current = Some(id);
                result
            }
        };
        watcher.abort();
        println!();

        match result {
            TurnResult::Completed(_) => {}
            TurnResult::Cancelled(_) => println!("[stopped]"),
            TurnResult::Failed(message) => println!("Something went wrong: {message}. Please try again."),
            TurnResult::EnrollmentRequired => {
                println!("Invalid API key. Run `undox login <KEY>` with a valid key.");
            }
        }
    }

    stop_sweep.notify_one();
    let _ = sweep_task.await;
    Ok(())
}

/// Read a text file for `/attach`, named after its file name.
fn load_attachment(path: &str) -> std::io::Result<Attachment> {
    let path = PathBuf::from(path.trim());
    let content = std::fs::read_to_string(&path)?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    Ok(Attachment::new(name, content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_attachment_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "gm").unwrap();

        let attachment = load_attachment(&format!(" {} ", file.display())).unwrap();
        assert_eq!(attachment, Attachment::new("notes.txt", "gm"));
    }

    #[test]
    fn test_missing_attachment_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.txt");
        assert!(load_attachment(&missing.display().to_string()).is_err());
    }
}
