//! Shared harness for governance integration tests.
//!
//! Stubs record every collaborator call so tests can assert on the
//! exact traffic the governance worker generates.

use async_trait::async_trait;
use pact_protocol::{LedgerHandle, Proposal, ProtocolError, ProtocolHandler};
use pact_registry::{PutAgreementState, Registry, RegistryError};
use pact_runtime::{BusSubscription, EventBus, GovernanceHandle, GovernanceWorker};
use pact_store::{AgreementStore, EstablishedAgreement};
use pact_types::{CancellationReason, DeviceCredentials};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Scripted protocol handler.
#[derive(Default)]
pub struct StubProtocol {
    /// Per-agreement ledger verdicts; absent means "not recorded".
    pub recorded: Mutex<HashMap<String, bool>>,
    /// Terminations submitted: (counter_party, agreement_id, reason).
    pub terminations: Mutex<Vec<(String, String, CancellationReason)>>,
    /// Number of `verify_agreement_recorded` calls.
    pub verify_calls: AtomicUsize,
    /// Fail `init_base_contracts`, disabling the reconciler.
    pub fail_contract_init: bool,
}

impl StubProtocol {
    pub fn failing_init() -> Self {
        Self {
            fail_contract_init: true,
            ..Self::default()
        }
    }

    pub fn with_recorded(agreement_id: &str) -> Self {
        let stub = Self::default();
        stub.recorded.lock().insert(agreement_id.to_string(), true);
        stub
    }
}

#[async_trait]
impl ProtocolHandler for StubProtocol {
    async fn init_base_contracts(&self) -> Result<LedgerHandle, ProtocolError> {
        if self.fail_contract_init {
            return Err(ProtocolError::ContractInit(
                "directory lookup failed".into(),
            ));
        }
        Ok(LedgerHandle::new("0xbase"))
    }

    async fn verify_agreement_recorded(
        &self,
        agreement_id: &str,
        _counter_party: &str,
        _proposal_sig: &str,
        _ledger: &LedgerHandle,
    ) -> Result<bool, ProtocolError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        Ok(*self.recorded.lock().get(agreement_id).unwrap_or(&false))
    }

    fn validate_proposal(&self, serialized: &str) -> Result<Proposal, ProtocolError> {
        Ok(serde_json::from_str(serialized)?)
    }

    async fn terminate_agreement(
        &self,
        counter_party: &str,
        agreement_id: &str,
        reason: CancellationReason,
        _ledger: &LedgerHandle,
    ) -> Result<(), ProtocolError> {
        self.terminations.lock().push((
            counter_party.to_string(),
            agreement_id.to_string(),
            reason,
        ));
        Ok(())
    }
}

/// Recording registry with scriptable transient DELETE failures.
#[derive(Default)]
pub struct StubRegistry {
    /// Successful PUTs: (device_id, agreement_id, body).
    pub puts: Mutex<Vec<(String, String, PutAgreementState)>>,
    /// Successful DELETEs: (device_id, agreement_id).
    pub deletes: Mutex<Vec<(String, String)>>,
    /// Total DELETE attempts including failed ones.
    pub delete_attempts: AtomicUsize,
    /// Remaining DELETE attempts to fail with a transport error.
    pub delete_transient_failures: AtomicUsize,
}

impl StubRegistry {
    pub fn failing_deletes(count: usize) -> Self {
        Self {
            delete_transient_failures: AtomicUsize::new(count),
            ..Self::default()
        }
    }
}

/// Builds a genuine transport-class error without touching the
/// network: an URL with no host fails in the request builder.
async fn transport_error() -> RegistryError {
    reqwest::Client::new()
        .get("http://")
        .send()
        .await
        .expect_err("empty host must not produce a request")
        .into()
}

#[async_trait]
impl Registry for StubRegistry {
    async fn put_agreement_state(
        &self,
        device: &DeviceCredentials,
        agreement_id: &str,
        body: PutAgreementState,
    ) -> Result<(), RegistryError> {
        self.puts
            .lock()
            .push((device.device_id.clone(), agreement_id.to_string(), body));
        Ok(())
    }

    async fn delete_agreement(
        &self,
        device: &DeviceCredentials,
        agreement_id: &str,
    ) -> Result<(), RegistryError> {
        self.delete_attempts.fetch_add(1, Ordering::SeqCst);

        let remaining = &self.delete_transient_failures;
        if remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(transport_error().await);
        }

        self.deletes
            .lock()
            .push((device.device_id.clone(), agreement_id.to_string()));
        Ok(())
    }
}

/// A running governance worker plus everything the tests observe.
pub struct Harness {
    pub bus: EventBus,
    pub subscription: BusSubscription,
    pub store: AgreementStore,
    pub registry: Arc<StubRegistry>,
    pub protocol: Arc<StubProtocol>,
    /// Keeps the governance tasks owned for the test's lifetime.
    pub _handle: GovernanceHandle,
    _store_dir: tempfile::TempDir,
}

/// Starts a governance worker against stub collaborators.
pub async fn start_governance(
    agreement_timeout_s: u64,
    protocol: StubProtocol,
    registry: StubRegistry,
) -> Harness {
    let store_dir = tempfile::tempdir().expect("tempdir");
    let store = AgreementStore::open(store_dir.path().join("agreements.redb")).expect("store");

    let registry = Arc::new(registry);
    let protocol = Arc::new(protocol);
    let registry_dyn: Arc<dyn Registry> = registry.clone();
    let protocol_dyn: Arc<dyn ProtocolHandler> = protocol.clone();

    let bus = EventBus::new();
    let subscription = bus.subscribe();

    let worker = GovernanceWorker::new(
        "basic",
        agreement_timeout_s,
        store.clone(),
        registry_dyn,
        protocol_dyn,
        bus.clone(),
    );
    let handle = worker.start();

    Harness {
        bus,
        subscription,
        store,
        registry,
        protocol,
        _handle: handle,
        _store_dir: store_dir,
    }
}

/// Publishes device registration and lets the processor absorb it.
pub async fn register_device(harness: &Harness) {
    harness
        .bus
        .publish(pact_event::Message::edge_registered("dev-1", "tok-1"));
    tokio::time::sleep(Duration::from_secs(1)).await;
}

/// Polls `condition` until it holds, advancing virtual time.
///
/// Panics after a virtual minute.
pub async fn wait_until(description: &str, condition: impl Fn() -> bool) {
    for _ in 0..600 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("timed out waiting until {}", description);
}

/// Drains the subscription, returning the cancelation messages seen.
pub fn drain_cancelations(subscription: &mut BusSubscription) -> Vec<pact_event::Message> {
    let mut cancelations = Vec::new();
    while let Some(message) = subscription.try_recv() {
        if matches!(message, pact_event::Message::GovernanceCancelation { .. }) {
            cancelations.push(message);
        }
    }
    cancelations
}

/// A serialized proposal whose policy names one api spec.
pub fn proposal_json(agreement_id: &str, spec_ref: &str) -> String {
    let policy = serde_json::json!({
        "header": {"name": "workload", "version": "1.0"},
        "apiSpec": [{"specRef": spec_ref, "version": "1"}],
    });
    serde_json::json!({
        "agreementId": agreement_id,
        "tsandcs": policy.to_string(),
        "address": "0xAA",
    })
    .to_string()
}

/// An active (accepted, counter-party known) agreement record.
pub fn active_agreement(agreement_id: &str, creation: u64, accepted: u64) -> EstablishedAgreement {
    let mut agreement = EstablishedAgreement::new(
        "basic",
        agreement_id,
        proposal_json(agreement_id, "svc/x"),
        "sig",
        creation,
    );
    agreement.agreement_accepted_time = accepted;
    agreement.counter_party_address = "0xAA".into();
    agreement
}
