//! Access ticket cache
//!
//! WSAA refuses a new login while a valid ticket for the same service
//! exists, so tickets are kept until shortly before they expire.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use crate::error::Result;
use crate::wsaa::{AccessTicket, Authenticator};

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn load(&self, service: &str) -> Result<Option<AccessTicket>>;
    async fn save(&self, service: &str, ticket: &AccessTicket) -> Result<()>;
}

/// Process-local store
#[derive(Default)]
pub struct MemoryTicketStore {
    tickets: RwLock<HashMap<String, AccessTicket>>,
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn load(&self, service: &str) -> Result<Option<AccessTicket>> {
        Ok(self.tickets.read().await.get(service).cloned())
    }

    async fn save(&self, service: &str, ticket: &AccessTicket) -> Result<()> {
        self.tickets
            .write()
            .await
            .insert(service.to_string(), ticket.clone());
        Ok(())
    }
}

/// One JSON file per service; survives restarts
pub struct FileTicketStore {
    dir: PathBuf,
}

impl FileTicketStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, service: &str) -> PathBuf {
        let name: String = service
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.dir.join(format!("ta-{name}.json"))
    }
}

#[async_trait]
impl TicketStore for FileTicketStore {
    async fn load(&self, service: &str) -> Result<Option<AccessTicket>> {
        let path = self.path(service);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot read ticket file");
                return Ok(None);
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(ticket) => Ok(Some(ticket)),
            Err(e) => {
                // A corrupt cache only costs a new login
                tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable ticket file");
                Ok(None)
            }
        }
    }

    async fn save(&self, service: &str, ticket: &AccessTicket) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path(service);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(ticket)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

/// Hands out cached tickets and logs in when they run out
pub struct TicketManager {
    auth: Arc<dyn Authenticator>,
    store: Arc<dyn TicketStore>,
    margin: chrono::Duration,
    // Serialises logins so concurrent callers share one ticket
    login_lock: Mutex<()>,
}

impl TicketManager {
    pub fn new(
        auth: Arc<dyn Authenticator>,
        store: Arc<dyn TicketStore>,
        margin: std::time::Duration,
    ) -> Self {
        Self {
            auth,
            store,
            margin: chrono::Duration::from_std(margin).unwrap_or(chrono::Duration::zero()),
            login_lock: Mutex::new(()),
        }
    }

    pub async fn ticket(&self, service: &str) -> Result<AccessTicket> {
        let _guard = self.login_lock.lock().await;

        if let Some(ticket) = self.store.load(service).await? {
            if ticket.is_fresh(Utc::now(), self.margin) {
                return Ok(ticket);
            }
            tracing::info!(service, expires_at = %ticket.expires_at, "Cached ticket expiring, renewing");
        }

        let ticket = self.auth.login(service).await?;
        self.store.save(service, &ticket).await?;
        Ok(ticket)
    }

    /// Replace a ticket the service refused.
    ///
    /// The cached ticket is only overwritten once the new login succeeds:
    /// WSAA answers `coe.alreadyAuthenticated` while its copy is still
    /// valid, and the old ticket is then the only usable one.
    pub async fn renew(&self, service: &str, rejected: &AccessTicket) -> Result<AccessTicket> {
        let _guard = self.login_lock.lock().await;

        // Another caller may have renewed while we waited
        if let Some(current) = self.store.load(service).await?
            && current != *rejected
            && current.is_fresh(Utc::now(), self.margin)
        {
            return Ok(current);
        }

        match self.auth.login(service).await {
            Ok(ticket) => {
                self.store.save(service, &ticket).await?;
                Ok(ticket)
            }
            Err(e) => {
                tracing::warn!(service, error = %e, "Ticket renewal failed, keeping cached ticket");
                Err(e)
            }
        }
    }
}
