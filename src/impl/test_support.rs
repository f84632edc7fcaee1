//! In-memory fakes of the repository traits, shared by unit tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use fractic_server_error::ServerError;
use futures::{stream::BoxStream, StreamExt as _};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    domain::repositories::{
        chat_repository::ChatRepository, extraction_repository::ExtractionRepository,
        ledger_repository::LedgerRepository,
    },
    entities::{
        Account, AccountChange, AccountId, ContactInfo, EntryPatch, ExtractionResult,
        InboundMessage, LedgerEntry, LedgerEntryId, NewLedgerEntry, NumberStatus,
    },
    errors::{StoreQueryFailed, TransportRequestFailed},
};

pub(crate) fn account_id(n: u128) -> AccountId {
    AccountId(Uuid::from_u128(n))
}

pub(crate) fn account(n: u128, name: &str, phone: &str, address: Option<&str>) -> Account {
    Account {
        id: account_id(n),
        name: name.to_string(),
        phone: phone.to_string(),
        channel_address: address.map(str::to_string),
        auth_code: None,
    }
}

pub(crate) fn inbound(address: &str, body: &str) -> InboundMessage {
    InboundMessage {
        address: address.to_string(),
        author: None,
        body: body.to_string(),
        is_group: false,
        is_status: false,
    }
}

pub(crate) fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub(crate) fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

// Ledger.
// ---

pub(crate) struct FakeLedgerRepository {
    accounts: Mutex<Vec<Account>>,
    entries: Mutex<Vec<LedgerEntry>>,
    writes: AtomicUsize,
    failing_description: Mutex<Option<String>>,
    changes_tx: mpsc::UnboundedSender<AccountChange>,
    changes_rx: Mutex<Option<mpsc::UnboundedReceiver<AccountChange>>>,
    failing_subscribes: AtomicUsize,
    subscribe_attempts: AtomicUsize,
}

impl FakeLedgerRepository {
    pub(crate) fn with_accounts(accounts: Vec<Account>) -> Self {
        let (changes_tx, changes_rx) = mpsc::unbounded_channel();
        Self {
            accounts: Mutex::new(accounts),
            entries: Mutex::new(Vec::new()),
            writes: AtomicUsize::new(0),
            failing_description: Mutex::new(None),
            changes_tx,
            changes_rx: Mutex::new(Some(changes_rx)),
            failing_subscribes: AtomicUsize::new(0),
            subscribe_attempts: AtomicUsize::new(0),
        }
    }

    /// The next `n` subscriptions fail.
    pub(crate) fn fail_next_subscribes(&self, n: usize) {
        self.failing_subscribes.store(n, Ordering::SeqCst);
    }

    pub(crate) fn subscribe_attempts(&self) -> usize {
        self.subscribe_attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn account(&self, n: u128) -> Account {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == account_id(n))
            .cloned()
            .unwrap()
    }

    pub(crate) fn entries(&self) -> Vec<LedgerEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub(crate) fn entry(&self, id: LedgerEntryId) -> LedgerEntry {
        self.entries()
            .into_iter()
            .find(|e| e.id == id)
            .unwrap()
    }

    /// Number of store mutations performed so far.
    pub(crate) fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Inserts whose description equals `description` are rejected.
    pub(crate) fn fail_inserts_described(&self, description: &str) {
        *self.failing_description.lock().unwrap() = Some(description.to_string());
    }

    /// Seed an entry directly, bypassing the write counter.
    pub(crate) fn seed_entry(&self, account: u128, amount: &str, description: &str) -> LedgerEntryId {
        self.push_entry(NewLedgerEntry {
            account_id: account_id(account),
            kind: crate::entities::EntryKind::Expense,
            amount: dec(amount),
            description: description.to_string(),
            category: "Other".to_string(),
            date: date("2024-05-01"),
            channel_phone: "seed@c.us".to_string(),
        })
        .id
    }

    pub(crate) fn emit_change(&self, previous: Option<Account>, current: Option<Account>) {
        let _ = self.changes_tx.send(AccountChange { previous, current });
    }

    fn push_entry(&self, entry: NewLedgerEntry) -> LedgerEntry {
        let mut entries = self.entries.lock().unwrap();
        let seq = entries.len() as i64 + 1;
        let base: DateTime<Utc> = DateTime::from_timestamp(1_714_521_600, 0).unwrap();
        let stored = LedgerEntry {
            id: LedgerEntryId(seq),
            account_id: entry.account_id,
            kind: entry.kind,
            amount: entry.amount,
            description: entry.description,
            category: entry.category,
            date: entry.date,
            channel_phone: entry.channel_phone,
            created_at: base + Duration::seconds(seq),
        };
        entries.push(stored.clone());
        stored
    }
}

#[async_trait]
impl LedgerRepository for FakeLedgerRepository {
    async fn fetch_accounts(&self) -> Result<Vec<Account>, ServerError> {
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn fetch_account_by_channel_address(
        &self,
        address: &str,
    ) -> Result<Option<Account>, ServerError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.channel_address.as_deref() == Some(address))
            .cloned())
    }

    async fn bind_channel_address(
        &self,
        account_id: AccountId,
        address: &str,
    ) -> Result<bool, ServerError> {
        let mut accounts = self.accounts.lock().unwrap();
        match accounts
            .iter_mut()
            .find(|a| a.id == account_id && a.channel_address.is_none())
        {
            Some(a) => {
                self.writes.fetch_add(1, Ordering::SeqCst);
                a.channel_address = Some(address.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn rename_account(&self, account_id: AccountId, name: &str) -> Result<(), ServerError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut accounts = self.accounts.lock().unwrap();
        match accounts.iter_mut().find(|a| a.id == account_id) {
            Some(a) => {
                a.name = name.to_string();
                Ok(())
            }
            None => Err(StoreQueryFailed::new("rename_account")),
        }
    }

    async fn insert_entry(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, ServerError> {
        if self.failing_description.lock().unwrap().as_deref() == Some(entry.description.as_str()) {
            return Err(StoreQueryFailed::new("insert_entry"));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(self.push_entry(entry))
    }

    async fn find_latest_entry_id_by_amount(
        &self,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<Option<LedgerEntryId>, ServerError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.account_id == account_id && e.amount == amount)
            .max_by_key(|e| (e.created_at, e.id))
            .map(|e| e.id))
    }

    async fn update_entry(
        &self,
        account_id: AccountId,
        entry_id: LedgerEntryId,
        patch: &EntryPatch,
    ) -> Result<bool, ServerError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.lock().unwrap();
        let Some(entry) = entries
            .iter_mut()
            .find(|e| e.id == entry_id && e.account_id == account_id)
        else {
            return Ok(false);
        };
        if let Some(kind) = patch.kind {
            entry.kind = kind;
        }
        if let Some(amount) = patch.amount {
            entry.amount = amount;
        }
        if let Some(description) = &patch.description {
            entry.description = description.clone();
        }
        if let Some(category) = &patch.category {
            entry.category = category.clone();
        }
        if let Some(date) = patch.date {
            entry.date = date;
        }
        Ok(true)
    }

    async fn subscribe_account_changes(
        &self,
    ) -> Result<BoxStream<'static, AccountChange>, ServerError> {
        self.subscribe_attempts.fetch_add(1, Ordering::SeqCst);
        if self
            .failing_subscribes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StoreQueryFailed::new("subscribe_account_changes"));
        }
        let rx = self
            .changes_rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| StoreQueryFailed::new("subscribe_account_changes"))?;
        Ok(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|change| (change, rx))
        })
        .boxed())
    }
}

// Chat.
// ---

#[derive(Default)]
pub(crate) struct FakeChatRepository {
    sent: Mutex<Vec<(String, String)>>,
    contacts: Mutex<HashMap<String, ContactInfo>>,
    numbers: Mutex<HashMap<String, NumberStatus>>,
    fail_sends: AtomicBool,
    fail_number_checks: AtomicBool,
}

impl FakeChatRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_contact(&self, address: &str, contact: ContactInfo) {
        self.contacts
            .lock()
            .unwrap()
            .insert(address.to_string(), contact);
    }

    pub(crate) fn set_number_status(&self, phone: &str, id: &str) {
        self.numbers.lock().unwrap().insert(
            phone.to_string(),
            NumberStatus {
                number_exists: true,
                id: id.to_string(),
            },
        );
    }

    pub(crate) fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_number_checks(&self) {
        self.fail_number_checks.store(true, Ordering::SeqCst);
    }

    pub(crate) fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatRepository for FakeChatRepository {
    async fn send_text(&self, address: &str, text: &str) -> Result<(), ServerError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportRequestFailed::new("send-message"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((address.to_string(), text.to_string()));
        Ok(())
    }

    async fn check_number_status(&self, phone: &str) -> Result<NumberStatus, ServerError> {
        if self.fail_number_checks.load(Ordering::SeqCst) {
            return Err(TransportRequestFailed::new("check-number-status"));
        }
        Ok(self
            .numbers
            .lock()
            .unwrap()
            .get(phone)
            .cloned()
            .unwrap_or(NumberStatus {
                number_exists: false,
                id: String::new(),
            }))
    }

    async fn get_contact(&self, address: &str) -> Result<ContactInfo, ServerError> {
        Ok(self
            .contacts
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .unwrap_or_else(|| ContactInfo {
                id: address.to_string(),
                ..Default::default()
            }))
    }
}

// Extraction.
// ---

pub(crate) struct FakeExtractionRepository {
    result: ExtractionResult,
    calls: AtomicUsize,
}

impl FakeExtractionRepository {
    pub(crate) fn returning(result: ExtractionResult) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionRepository for FakeExtractionRepository {
    async fn extract(&self, _text: &str, _reference_date: NaiveDate) -> ExtractionResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}
