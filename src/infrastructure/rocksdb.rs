use crate::domain::biller::BillerId;
use crate::domain::ports::{CommitOutcome, QuotaLedger, TransactionStore};
use crate::domain::quota::{DailyQuota, QuotaKey};
use crate::domain::transaction::Transaction;
use crate::error::{Result, RoutingError};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for daily quota rows.
pub const CF_QUOTAS: &str = "quotas";
/// Column Family for transaction history.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family indexing transaction codes by biller and creation time.
pub const CF_BILLER_INDEX: &str = "transactions_by_biller";

/// A persistent quota ledger and transaction log backed by RocksDB.
///
/// Quota rows and transactions live in separate Column Families, with a third one
/// ordering each biller's transaction codes by creation time. A commit reads the quota
/// row, checks the limit and writes all three rows in a single `WriteBatch` while
/// holding the commit lock, so concurrent charges never interleave and a crash never
/// leaves one row without the others.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBLedger {
    db: Arc<DB>,
    commit_lock: Arc<Mutex<()>>,
}

impl RocksDBLedger {
    /// Opens or creates a RocksDB instance at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_quotas = ColumnFamilyDescriptor::new(CF_QUOTAS, Options::default());
        let cf_transactions = ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default());
        let cf_biller_index = ColumnFamilyDescriptor::new(CF_BILLER_INDEX, Options::default());

        let db = DB::open_cf_descriptors(
            &opts,
            path,
            vec![cf_quotas, cf_transactions, cf_biller_index],
        )?;

        Ok(Self {
            db: Arc::new(db),
            commit_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            RoutingError::InternalError(Box::new(std::io::Error::other(format!(
                "{} column family not found",
                name
            ))))
        })
    }

    fn read_quota(&self, key: &QuotaKey) -> Result<Option<DailyQuota>> {
        let cf = self.cf(CF_QUOTAS)?;
        match self.db.get_cf(cf, quota_key_bytes(key))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn read_transaction(&self, code: &[u8]) -> Result<Option<Transaction>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        match self.db.get_cf(cf, code)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, cf_name: &str, prefix: &[u8]) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut rows = Vec::new();
        for item in self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward))
        {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            rows.push(decode(&value)?);
        }
        Ok(rows)
    }
}

/// Big-endian ids followed by the ISO date, so a biller's rows sort together.
fn quota_key_bytes(key: &QuotaKey) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(18);
    bytes.extend_from_slice(&key.biller_id.to_be_bytes());
    bytes.extend_from_slice(&key.gateway_id.to_be_bytes());
    bytes.extend_from_slice(key.quota_date.format("%Y-%m-%d").to_string().as_bytes());
    bytes
}

/// Big-endian biller id, then the creation time as sign-flipped seconds and nanoseconds,
/// so byte order matches chronological order within a biller.
fn biller_index_bound(biller_id: BillerId, at: NaiveDateTime) -> Vec<u8> {
    let at = at.and_utc();
    let seconds = (at.timestamp() as u64) ^ (1 << 63);
    let mut bytes = Vec::with_capacity(16);
    bytes.extend_from_slice(&biller_id.to_be_bytes());
    bytes.extend_from_slice(&seconds.to_be_bytes());
    bytes.extend_from_slice(&at.timestamp_subsec_nanos().to_be_bytes());
    bytes
}

fn biller_index_key(transaction: &Transaction) -> Vec<u8> {
    let mut bytes = biller_index_bound(transaction.biller_id, transaction.created_at);
    bytes.extend_from_slice(transaction.code.as_bytes());
    bytes
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| {
        RoutingError::InternalError(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Serialization error: {}", e),
        )))
    })
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        RoutingError::InternalError(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Deserialization error: {}", e),
        )))
    })
}

#[async_trait]
impl QuotaLedger for RocksDBLedger {
    async fn get(&self, key: &QuotaKey) -> Result<Option<DailyQuota>> {
        self.read_quota(key)
    }

    async fn for_biller(&self, biller_id: BillerId, date: NaiveDate) -> Result<Vec<DailyQuota>> {
        let quotas: Vec<DailyQuota> = self.scan(CF_QUOTAS, &biller_id.to_be_bytes())?;
        Ok(quotas
            .into_iter()
            .filter(|q| q.key.quota_date == date)
            .collect())
    }

    async fn commit(
        &self,
        transaction: Transaction,
        key: QuotaKey,
        daily_limit: Decimal,
    ) -> Result<CommitOutcome> {
        let _guard = self.commit_lock.lock().await;

        let mut quota = self
            .read_quota(&key)?
            .unwrap_or_else(|| DailyQuota::new(key, daily_limit));

        if !quota.can_absorb(transaction.amount) {
            return Ok(CommitOutcome::QuotaExceeded {
                remaining: quota.remaining(),
            });
        }
        quota.apply(transaction.amount);

        let mut batch = WriteBatch::default();
        batch.put_cf(
            self.cf(CF_TRANSACTIONS)?,
            transaction.code.as_bytes(),
            encode(&transaction)?,
        );
        batch.put_cf(
            self.cf(CF_BILLER_INDEX)?,
            biller_index_key(&transaction),
            transaction.code.as_bytes(),
        );
        batch.put_cf(self.cf(CF_QUOTAS)?, quota_key_bytes(&key), encode(&quota)?);
        self.db.write(batch)?;

        Ok(CommitOutcome::Committed(quota))
    }
}

#[async_trait]
impl TransactionStore for RocksDBLedger {
    async fn get(&self, code: &str) -> Result<Option<Transaction>> {
        self.read_transaction(code.as_bytes())
    }

    async fn for_biller(
        &self,
        biller_id: BillerId,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Transaction>> {
        let index = self.cf(CF_BILLER_INDEX)?;
        let start = biller_index_bound(biller_id, from);
        let end = biller_index_bound(biller_id, to);

        let mut found = Vec::new();
        for item in self
            .db
            .iterator_cf(index, IteratorMode::From(&start, Direction::Forward))
        {
            let (key, code) = item?;
            if key.as_ref() >= end.as_slice() {
                break;
            }
            if let Some(transaction) = self.read_transaction(&code)? {
                found.push(transaction);
            }
        }
        Ok(found)
    }
}
