//! redb-backed persistence for established agreements.

use crate::agreement::{AgreementFilter, EstablishedAgreement};
use crate::error::StoreError;
use crate::now_unix;
use pact_event::Deployment;
use pact_types::AgreementKey;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

const AGREEMENTS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("established_agreements");

/// Durable store of established agreements.
///
/// One embedded redb database, one table, bincode-encoded records
/// keyed by [`AgreementKey::slug`]. Cloning is cheap; clones share the
/// database. Every operation runs inside its own transaction, so
/// concurrent callers (the reconciler and the command processor)
/// serialize at the transaction boundary.
#[derive(Debug, Clone)]
pub struct AgreementStore {
    path: PathBuf,
    database: Arc<Mutex<Database>>,
}

impl AgreementStore {
    /// Opens (or creates) the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the database cannot be
    /// created or the table cannot be initialized.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let database = Database::create(&path).map_err(redb::Error::from)?;

        // Make sure the table exists before the first read.
        {
            let txn = database.begin_write().map_err(redb::Error::from)?;
            txn.open_table(AGREEMENTS_TABLE)
                .map_err(redb::Error::from)?;
            txn.commit().map_err(redb::Error::from)?;
        }

        debug!(path = %path.display(), "agreement store opened");

        Ok(Self {
            path,
            database: Arc::new(Mutex::new(database)),
        })
    }

    /// Returns the filesystem path of the backing database.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Inserts a new established agreement.
    ///
    /// Used by the agreement worker once a proposal has been made; the
    /// record enters governance when it becomes active (accepted with
    /// a known counter-party).
    ///
    /// # Errors
    ///
    /// [`StoreError::Duplicate`] if a record with the same
    /// `(protocol, agreement_id)` exists, [`StoreError::InvalidRecord`]
    /// if the key fields are empty or the time fields are out of order.
    pub async fn insert_established_agreement(
        &self,
        record: EstablishedAgreement,
    ) -> Result<(), StoreError> {
        if record.protocol.is_empty() || record.agreement_id.is_empty() {
            return Err(StoreError::InvalidRecord(
                "protocol and agreement id must be non-empty".into(),
            ));
        }
        if !record.times_are_monotonic() {
            return Err(StoreError::InvalidRecord(format!(
                "time fields out of order for {}",
                record.key()
            )));
        }

        let key = record.key();
        let slug = key.slug();
        let encoded = bincode::serialize(&record)?;

        self.with_write_txn(move |txn| {
            let mut table = txn.open_table(AGREEMENTS_TABLE).map_err(redb::Error::from)?;
            let exists = table
                .get(slug.as_str())
                .map_err(redb::Error::from)?
                .is_some();
            if exists {
                return Err(StoreError::Duplicate(key.clone()));
            }
            table
                .insert(slug.as_str(), encoded.as_slice())
                .map_err(redb::Error::from)?;
            Ok(())
        })
        .await?;

        debug!(agreement = %record.key(), "established agreement recorded");
        Ok(())
    }

    /// Returns all agreements of `protocol` passing every filter.
    ///
    /// Results are ordered by agreement id.
    pub async fn find_established_agreements(
        &self,
        protocol: &str,
        filters: &[AgreementFilter],
    ) -> Result<Vec<EstablishedAgreement>, StoreError> {
        let protocol = protocol.to_owned();
        let filters = filters.to_vec();

        self.with_read_txn(move |txn| {
            let table = txn.open_table(AGREEMENTS_TABLE).map_err(redb::Error::from)?;
            let mut found = Vec::new();
            for entry in table.iter().map_err(redb::Error::from)? {
                let (_, value) = entry.map_err(redb::Error::from)?;
                let record: EstablishedAgreement = bincode::deserialize(value.value())?;
                if record.protocol == protocol && filters.iter().all(|f| f.matches(&record)) {
                    found.push(record);
                }
            }
            found.sort_by(|a, b| a.agreement_id.cmp(&b.agreement_id));
            Ok(found)
        })
        .await
    }

    /// Returns a single agreement, or `None` if absent.
    pub async fn find_established_agreement(
        &self,
        protocol: &str,
        agreement_id: &str,
    ) -> Result<Option<EstablishedAgreement>, StoreError> {
        let slug = AgreementKey::new(protocol, agreement_id).slug();

        self.with_read_txn(move |txn| {
            let table = txn.open_table(AGREEMENTS_TABLE).map_err(redb::Error::from)?;
            match table.get(slug.as_str()).map_err(redb::Error::from)? {
                Some(value) => Ok(Some(bincode::deserialize(value.value())?)),
                None => Ok(None),
            }
        })
        .await
    }

    /// Marks an agreement as confirmed on the ledger.
    ///
    /// Sets `agreement_finalized_time` to now; calling again leaves
    /// the original confirmation time in place.
    pub async fn agreement_state_finalized(
        &self,
        protocol: &str,
        agreement_id: &str,
    ) -> Result<EstablishedAgreement, StoreError> {
        let record = self
            .update(&AgreementKey::new(protocol, agreement_id), |record| {
                if record.agreement_finalized_time == 0 {
                    record.agreement_finalized_time = now_unix();
                }
                Ok(())
            })
            .await?;
        debug!(agreement = %record.key(), "agreement finalized");
        Ok(record)
    }

    /// Marks an agreement's workloads as running and stores the
    /// deployment they run under.
    pub async fn agreement_state_execution_started(
        &self,
        protocol: &str,
        agreement_id: &str,
        deployment: Deployment,
    ) -> Result<EstablishedAgreement, StoreError> {
        let record = self
            .update(&AgreementKey::new(protocol, agreement_id), move |record| {
                if record.agreement_execution_start_time == 0 {
                    record.agreement_execution_start_time = now_unix();
                }
                record.current_deployment = deployment;
                Ok(())
            })
            .await?;
        debug!(agreement = %record.key(), "agreement execution started");
        Ok(record)
    }

    /// Marks an agreement as terminated.
    ///
    /// Returns the record and whether *this* call performed the
    /// transition. The flag is the one-shot guard for cancellation:
    /// only the caller that wins the transition announces it on the
    /// bus.
    pub async fn agreement_state_terminated(
        &self,
        protocol: &str,
        agreement_id: &str,
    ) -> Result<(EstablishedAgreement, bool), StoreError> {
        let key = AgreementKey::new(protocol, agreement_id);
        let slug = key.slug();

        let result = self
            .with_write_txn(move |txn| {
                let mut table = txn.open_table(AGREEMENTS_TABLE).map_err(redb::Error::from)?;
                let mut record = {
                    let value = table
                        .get(slug.as_str())
                        .map_err(redb::Error::from)?
                        .ok_or_else(|| StoreError::NotFound(key.clone()))?;
                    bincode::deserialize::<EstablishedAgreement>(value.value())?
                };

                let newly = record.agreement_terminated == 0;
                if newly {
                    record.agreement_terminated = now_unix();
                    let encoded = bincode::serialize(&record)?;
                    table
                        .insert(slug.as_str(), encoded.as_slice())
                        .map_err(redb::Error::from)?;
                }
                Ok((record, newly))
            })
            .await?;

        if result.1 {
            debug!(agreement = %result.0.key(), "agreement terminated");
        }
        Ok(result)
    }

    /// Removes a terminated agreement.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotTerminated`] while the record is still live;
    /// [`StoreError::NotFound`] if it does not exist.
    pub async fn delete_established_agreement(
        &self,
        protocol: &str,
        agreement_id: &str,
    ) -> Result<(), StoreError> {
        let key = AgreementKey::new(protocol, agreement_id);
        let slug = key.slug();

        self.with_write_txn(move |txn| {
            let mut table = txn.open_table(AGREEMENTS_TABLE).map_err(redb::Error::from)?;
            let record = {
                let value = table
                    .get(slug.as_str())
                    .map_err(redb::Error::from)?
                    .ok_or_else(|| StoreError::NotFound(key.clone()))?;
                bincode::deserialize::<EstablishedAgreement>(value.value())?
            };

            if record.agreement_terminated == 0 {
                return Err(StoreError::NotTerminated(key.clone()));
            }

            table.remove(slug.as_str()).map_err(redb::Error::from)?;
            Ok(())
        })
        .await?;

        debug!(protocol, agreement_id, "established agreement deleted");
        Ok(())
    }

    /// Read-modify-write of one record in a single transaction.
    ///
    /// Terminated records are immutable; any update against one fails
    /// with [`StoreError::Terminated`].
    async fn update<F>(
        &self,
        key: &AgreementKey,
        mutate: F,
    ) -> Result<EstablishedAgreement, StoreError>
    where
        F: FnOnce(&mut EstablishedAgreement) -> Result<(), StoreError> + Send,
    {
        let key = key.clone();
        let slug = key.slug();

        self.with_write_txn(move |txn| {
            let mut table = txn.open_table(AGREEMENTS_TABLE).map_err(redb::Error::from)?;
            let mut record = {
                let value = table
                    .get(slug.as_str())
                    .map_err(redb::Error::from)?
                    .ok_or_else(|| StoreError::NotFound(key.clone()))?;
                bincode::deserialize::<EstablishedAgreement>(value.value())?
            };

            if record.agreement_terminated != 0 {
                return Err(StoreError::Terminated(key.clone()));
            }

            mutate(&mut record)?;

            if !record.times_are_monotonic() {
                return Err(StoreError::InvalidRecord(format!(
                    "time fields out of order for {}",
                    key
                )));
            }

            let encoded = bincode::serialize(&record)?;
            table
                .insert(slug.as_str(), encoded.as_slice())
                .map_err(redb::Error::from)?;
            Ok(record)
        })
        .await
    }

    async fn with_write_txn<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&redb::WriteTransaction) -> Result<R, StoreError>,
    {
        let database = self.database.lock().await;
        let txn = database.begin_write().map_err(redb::Error::from)?;
        let result = f(&txn)?;
        txn.commit().map_err(redb::Error::from)?;
        Ok(result)
    }

    async fn with_read_txn<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&redb::ReadTransaction) -> Result<R, StoreError>,
    {
        let database = self.database.lock().await;
        let txn = database.begin_read().map_err(redb::Error::from)?;
        f(&txn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agreement::AgreementLifecycle;
    use pact_event::ServiceConfig;
    use serde_json::json;

    fn temp_store() -> (tempfile::TempDir, AgreementStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = AgreementStore::open(dir.path().join("agreements.redb")).expect("open");
        (dir, store)
    }

    fn active_record(id: &str) -> EstablishedAgreement {
        let mut ag = EstablishedAgreement::new("basic", id, "{}", "sig", 100);
        ag.agreement_accepted_time = 110;
        ag.counter_party_address = "0xAA".into();
        ag
    }

    fn deployment() -> Deployment {
        let mut d = Deployment::new();
        d.insert("svc".into(), ServiceConfig::new(json!({"image": "svc:1"})));
        d
    }

    #[tokio::test]
    async fn insert_and_find() {
        let (_dir, store) = temp_store();
        store
            .insert_established_agreement(active_record("ag-1"))
            .await
            .unwrap();

        let found = store
            .find_established_agreements("basic", &[AgreementFilter::Active])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].agreement_id, "ag-1");

        // a different protocol sees nothing
        let none = store
            .find_established_agreements("other", &[])
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn duplicate_key_rejected() {
        let (_dir, store) = temp_store();
        store
            .insert_established_agreement(active_record("ag-1"))
            .await
            .unwrap();

        let err = store
            .insert_established_agreement(active_record("ag-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn finalize_sets_time_once() {
        let (_dir, store) = temp_store();
        store
            .insert_established_agreement(active_record("ag-1"))
            .await
            .unwrap();

        let first = store
            .agreement_state_finalized("basic", "ag-1")
            .await
            .unwrap();
        assert_ne!(first.agreement_finalized_time, 0);
        assert_eq!(first.lifecycle(), AgreementLifecycle::Finalized);

        let second = store
            .agreement_state_finalized("basic", "ag-1")
            .await
            .unwrap();
        assert_eq!(
            second.agreement_finalized_time,
            first.agreement_finalized_time
        );
    }

    #[tokio::test]
    async fn execution_started_stores_deployment() {
        let (_dir, store) = temp_store();
        store
            .insert_established_agreement(active_record("ag-1"))
            .await
            .unwrap();
        store
            .agreement_state_finalized("basic", "ag-1")
            .await
            .unwrap();

        let record = store
            .agreement_state_execution_started("basic", "ag-1", deployment())
            .await
            .unwrap();
        assert_ne!(record.agreement_execution_start_time, 0);
        assert!(record.current_deployment.contains_key("svc"));
        assert!(record.times_are_monotonic());
    }

    #[tokio::test]
    async fn terminate_is_one_shot() {
        let (_dir, store) = temp_store();
        store
            .insert_established_agreement(active_record("ag-1"))
            .await
            .unwrap();

        let (record, newly) = store
            .agreement_state_terminated("basic", "ag-1")
            .await
            .unwrap();
        assert!(newly);
        assert_ne!(record.agreement_terminated, 0);

        let (again, newly_again) = store
            .agreement_state_terminated("basic", "ag-1")
            .await
            .unwrap();
        assert!(!newly_again);
        assert_eq!(again.agreement_terminated, record.agreement_terminated);
    }

    #[tokio::test]
    async fn terminated_record_is_immutable() {
        let (_dir, store) = temp_store();
        store
            .insert_established_agreement(active_record("ag-1"))
            .await
            .unwrap();
        store
            .agreement_state_terminated("basic", "ag-1")
            .await
            .unwrap();

        let err = store
            .agreement_state_finalized("basic", "ag-1")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Terminated(_)));

        let err = store
            .agreement_state_execution_started("basic", "ag-1", deployment())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Terminated(_)));
    }

    #[tokio::test]
    async fn delete_requires_termination() {
        let (_dir, store) = temp_store();
        store
            .insert_established_agreement(active_record("ag-1"))
            .await
            .unwrap();

        let err = store
            .delete_established_agreement("basic", "ag-1")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotTerminated(_)));

        store
            .agreement_state_terminated("basic", "ag-1")
            .await
            .unwrap();
        store
            .delete_established_agreement("basic", "ag-1")
            .await
            .unwrap();

        let gone = store
            .find_established_agreement("basic", "ag-1")
            .await
            .unwrap();
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn missing_record_errors() {
        let (_dir, store) = temp_store();

        let err = store
            .agreement_state_finalized("basic", "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        let err = store
            .delete_established_agreement("basic", "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn terminated_records_leave_active_set() {
        let (_dir, store) = temp_store();
        store
            .insert_established_agreement(active_record("ag-1"))
            .await
            .unwrap();
        store
            .insert_established_agreement(active_record("ag-2"))
            .await
            .unwrap();

        store
            .agreement_state_terminated("basic", "ag-1")
            .await
            .unwrap();

        let active = store
            .find_established_agreements("basic", &[AgreementFilter::Active])
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].agreement_id, "ag-2");
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agreements.redb");

        {
            let store = AgreementStore::open(&path).unwrap();
            store
                .insert_established_agreement(active_record("ag-1"))
                .await
                .unwrap();
        }

        let store = AgreementStore::open(&path).unwrap();
        let found = store
            .find_established_agreement("basic", "ag-1")
            .await
            .unwrap();
        assert!(found.is_some());
    }
}
