//! Remote mirror commands.
//!
//! The one-time reconcile (empty remote receives the local data, non-empty
//! remote wins and replaces the local copy) runs only the first time a
//! given identity is synced; a kv marker records that it happened. Every
//! `sync now` after that treats local state as authoritative and pushes
//! whatever the remote is missing.

use clap::Subcommand;
use tomatick_core::{Config, Database, ReconcileOutcome, RemoteIdentity, RemoteStore, SyncError};

const SYNC_MARKER_KEY: &str = "sync_identity";

#[derive(Subcommand)]
pub enum SyncAction {
    /// Reconcile sessions and settings with the remote
    Now,
    /// Show the configured remote identity
    Status,
}

fn identity_marker(identity: &RemoteIdentity) -> String {
    format!("{}#{}", identity.base_url, identity.user_id)
}

pub fn run(action: SyncAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;

    match action {
        SyncAction::Now => {
            let identity =
                RemoteIdentity::from_config(&config.sync).ok_or(SyncError::NotConfigured)?;
            let db = Database::open()?;
            let marker = identity_marker(&identity);
            let reconciled = db.kv_get(SYNC_MARKER_KEY)?.as_deref() == Some(marker.as_str());
            let store = RemoteStore::new(identity);

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(async {
                if reconciled {
                    let pushed = store.push_missing_sessions(&db).await?;
                    println!("pushed {pushed} unmirrored session(s)");
                    store.push_settings(&config.timer).await?;
                    println!("uploaded local settings to remote");
                } else {
                    match store.reconcile_sessions(&db).await? {
                        ReconcileOutcome::UploadedLocal(n) => {
                            println!("remote was empty; uploaded {n} local session(s)");
                        }
                        ReconcileOutcome::RemoteWins(n) => {
                            println!("adopted {n} session(s) from remote");
                        }
                    }
                    if let Some(remote_settings) =
                        store.reconcile_settings(&config.timer).await?
                    {
                        config.timer = remote_settings;
                        config.save()?;
                        println!("adopted settings from remote");
                    } else {
                        println!("uploaded local settings to remote");
                    }
                    db.kv_set(SYNC_MARKER_KEY, &marker)?;
                }
                Ok::<(), Box<dyn std::error::Error>>(())
            })?;
        }
        SyncAction::Status => match RemoteIdentity::from_config(&config.sync) {
            Some(identity) => {
                println!("base url: {}", identity.base_url);
                println!("user id:  {}", identity.user_id);
                println!(
                    "token:    {}",
                    if identity.token.is_some() { "set" } else { "none" }
                );
            }
            None => println!("sync is not configured (set sync.base_url and sync.user_id)"),
        },
    }
    Ok(())
}
