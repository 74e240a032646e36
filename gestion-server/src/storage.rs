//! redb storage for providers, vendors and issued invoices
//!
//! Records are stored as JSON values keyed by id. The selected vendor
//! lives in a small key/value settings table.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::models::{InvoiceRecord, Provider, ProviderUpdate, Vendor};
use thiserror::Error;

/// Providers: key = provider id, value = JSON
const PROVIDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("providers");

/// Vendors: key = vendor id, value = JSON
const VENDORS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("vendors");

/// Issued invoices: key = record id, value = JSON
const INVOICES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("invoices");

const SETTINGS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("settings");

const SELECTED_VENDOR_KEY: &str = "selected_vendor";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Clone)]
pub struct Storage {
    db: Arc<Database>,
}

impl Storage {
    /// Open or create the database file, creating parent directories
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Database::create(path)?)
    }

    /// Open an in-memory database (tests)
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::init(Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PROVIDERS_TABLE)?;
            let _ = write_txn.open_table(VENDORS_TABLE)?;
            let _ = write_txn.open_table(INVOICES_TABLE)?;
            let _ = write_txn.open_table(SETTINGS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    fn put_json<T: serde::Serialize>(
        &self,
        table_def: TableDefinition<'static, &'static str, &'static [u8]>,
        id: &str,
        value: &T,
    ) -> StorageResult<()> {
        let bytes = serde_json::to_vec(value)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(table_def)?;
            table.insert(id, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        table_def: TableDefinition<'static, &'static str, &'static [u8]>,
        id: &str,
    ) -> StorageResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table_def)?;
        match table.get(id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    fn all_json<T: serde::de::DeserializeOwned>(
        &self,
        table_def: TableDefinition<'static, &'static str, &'static [u8]>,
    ) -> StorageResult<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table_def)?;
        let mut out = Vec::new();
        for result in table.iter()? {
            let (_, guard) = result?;
            out.push(serde_json::from_slice(guard.value())?);
        }
        Ok(out)
    }

    // ========== Providers ==========

    /// All providers, ordered by name (case-insensitive)
    pub fn list_providers(&self) -> StorageResult<Vec<Provider>> {
        let mut providers: Vec<Provider> = self.all_json(PROVIDERS_TABLE)?;
        providers.sort_by_key(|p| p.name.to_lowercase());
        Ok(providers)
    }

    pub fn get_provider(&self, id: &str) -> StorageResult<Option<Provider>> {
        self.get_json(PROVIDERS_TABLE, id)
    }

    pub fn insert_provider(&self, provider: &Provider) -> StorageResult<()> {
        self.put_json(PROVIDERS_TABLE, &provider.id, provider)
    }

    /// Apply a partial update in a single write transaction.
    /// Returns `None` when the provider does not exist.
    pub fn update_provider(
        &self,
        id: &str,
        update: ProviderUpdate,
        now: i64,
    ) -> StorageResult<Option<Provider>> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(PROVIDERS_TABLE)?;
            let bytes = match table.get(id)? {
                Some(guard) => guard.value().to_vec(),
                None => return Ok(None),
            };
            let mut provider: Provider = serde_json::from_slice(&bytes)?;
            provider.apply_update(update, now);
            let value = serde_json::to_vec(&provider)?;
            table.insert(id, value.as_slice())?;
            provider
        };
        write_txn.commit()?;
        Ok(Some(updated))
    }

    /// Returns whether a record was removed
    pub fn delete_provider(&self, id: &str) -> StorageResult<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(PROVIDERS_TABLE)?;
            table.remove(id)?.is_some()
        };
        write_txn.commit()?;
        Ok(removed)
    }

    // ========== Vendors ==========

    pub fn list_vendors(&self) -> StorageResult<Vec<Vendor>> {
        let mut vendors: Vec<Vendor> = self.all_json(VENDORS_TABLE)?;
        vendors.sort_by_key(|v| v.name.to_lowercase());
        Ok(vendors)
    }

    pub fn get_vendor(&self, id: &str) -> StorageResult<Option<Vendor>> {
        self.get_json(VENDORS_TABLE, id)
    }

    pub fn insert_vendor(&self, vendor: &Vendor) -> StorageResult<()> {
        self.put_json(VENDORS_TABLE, &vendor.id, vendor)
    }

    pub fn selected_vendor_id(&self) -> StorageResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SETTINGS_TABLE)?;
        Ok(table.get(SELECTED_VENDOR_KEY)?.map(|v| v.value().to_string()))
    }

    /// Store the selection; `None` clears it
    pub fn set_selected_vendor(&self, vendor_id: Option<&str>) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SETTINGS_TABLE)?;
            match vendor_id {
                Some(id) => {
                    table.insert(SELECTED_VENDOR_KEY, id)?;
                }
                None => {
                    table.remove(SELECTED_VENDOR_KEY)?;
                }
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    // ========== Invoices ==========

    pub fn insert_invoice(&self, record: &InvoiceRecord) -> StorageResult<()> {
        self.put_json(INVOICES_TABLE, &record.id, record)
    }

    /// Issued invoices, newest first
    pub fn list_invoices(&self) -> StorageResult<Vec<InvoiceRecord>> {
        let mut records: Vec<InvoiceRecord> = self.all_json(INVOICES_TABLE)?;
        records.sort_by_key(|r| std::cmp::Reverse(r.created_at));
        Ok(records)
    }
}
