//! In-memory repositories for tests and local development.

pub mod collection;

use chrono::{DateTime, Utc};

use dentlab_auth::{LoginLog, NewUser, User, UserPatch, ensure_unique_name, find_by_credentials};
use dentlab_cases::{DentalCase, sort_newest_first};
use dentlab_core::{CaseId, InvoiceId, NotificationId, UserId};
use dentlab_invoicing::Invoice;
use dentlab_notifications::Notification;

pub use collection::InMemoryCollection;

use crate::error::{RepoResult, RepositoryError};
use crate::repository::{
    CaseChange, CaseRepository, InvoiceRepository, LoginLogRepository, NotificationRepository,
    UserRepository,
};

#[derive(Debug, Default)]
pub struct InMemoryCaseRepository {
    cases: InMemoryCollection<DentalCase>,
}

impl InMemoryCaseRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CaseRepository for InMemoryCaseRepository {
    async fn insert(&self, case: DentalCase) -> RepoResult<CaseId> {
        self.cases.insert(case)
    }

    async fn get(&self, id: CaseId) -> RepoResult<DentalCase> {
        self.cases.get(&id)
    }

    async fn list(&self) -> RepoResult<Vec<DentalCase>> {
        let mut all = self.cases.filter(|_| true)?;
        sort_newest_first(&mut all);
        Ok(all)
    }

    async fn list_by_dentist(&self, dentist_name: &str) -> RepoResult<Vec<DentalCase>> {
        let mut own = self.cases.filter(|c| c.dentist_name == dentist_name)?;
        sort_newest_first(&mut own);
        Ok(own)
    }

    async fn modify(&self, id: CaseId, change: CaseChange) -> RepoResult<DentalCase> {
        self.cases.modify(&id, change)
    }

    async fn delete(&self, id: CaseId) -> RepoResult<()> {
        self.cases.remove(&id).map(|_| ())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryInvoiceRepository {
    invoices: InMemoryCollection<Invoice>,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_invoices_first(invoices: &mut [Invoice]) {
    invoices.sort_by_key(|i| std::cmp::Reverse(i.created_at()));
}

#[async_trait::async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn save(&self, invoice: Invoice) -> RepoResult<InvoiceId> {
        self.invoices.insert(invoice)
    }

    async fn get(&self, id: InvoiceId) -> RepoResult<Invoice> {
        self.invoices.get(&id)
    }

    async fn list(&self) -> RepoResult<Vec<Invoice>> {
        let mut all = self.invoices.filter(|_| true)?;
        newest_invoices_first(&mut all);
        Ok(all)
    }

    async fn list_by_dentist(&self, dentist_name: &str) -> RepoResult<Vec<Invoice>> {
        let mut own = self.invoices.filter(|i| i.dentist_name() == dentist_name)?;
        newest_invoices_first(&mut own);
        Ok(own)
    }

    async fn delete(&self, id: InvoiceId) -> RepoResult<()> {
        self.invoices.remove(&id).map(|_| ())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: InMemoryCollection<User>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn list(&self) -> RepoResult<Vec<User>> {
        let mut all = self.users.filter(|_| true)?;
        all.sort_by_key(|u| u.name.to_lowercase());
        Ok(all)
    }

    async fn get(&self, id: UserId) -> RepoResult<User> {
        self.users.get(&id)
    }

    async fn add(&self, id: UserId, new_user: NewUser) -> RepoResult<User> {
        let user = User::create(id, new_user)?;
        let mut map = self.users.write()?;
        ensure_unique_name(map.values(), &user.name, None)?;
        map.insert(id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: UserId, patch: UserPatch) -> RepoResult<User> {
        let mut map = self.users.write()?;
        let mut next = map.get(&id).cloned().ok_or(RepositoryError::NotFound)?;
        next.apply_patch(patch)?;
        ensure_unique_name(map.values(), &next.name, Some(id))?;
        map.insert(id, next.clone());
        Ok(next)
    }

    async fn delete(&self, id: UserId) -> RepoResult<()> {
        self.users.remove(&id).map(|_| ())
    }

    async fn verify(&self, name: &str, password: &str) -> RepoResult<Option<User>> {
        let map = self.users.read()?;
        Ok(find_by_credentials(map.values(), name, password).cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryNotificationRepository {
    notifications: InMemoryCollection<Notification>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn create(&self, notification: Notification) -> RepoResult<NotificationId> {
        self.notifications.insert(notification)
    }

    async fn get(&self, id: NotificationId) -> RepoResult<Notification> {
        self.notifications.get(&id)
    }

    async fn unread_for(&self, recipient: &str) -> RepoResult<Vec<Notification>> {
        let mut unread = self
            .notifications
            .filter(|n| !n.read && n.recipient == recipient)?;
        unread.sort_by_key(|n| std::cmp::Reverse(n.created_at));
        Ok(unread)
    }

    async fn mark_read(&self, id: NotificationId) -> RepoResult<()> {
        self.notifications
            .modify(&id, |n: &mut Notification| {
                n.mark_read();
                Ok::<_, RepositoryError>(())
            })
            .map(|_| ())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryLoginLogRepository {
    entries: InMemoryCollection<LoginLog>,
}

impl InMemoryLoginLogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl LoginLogRepository for InMemoryLoginLogRepository {
    async fn record(&self, entry: LoginLog) -> RepoResult<()> {
        self.entries.upsert(entry)
    }

    async fn recent(&self, now: DateTime<Utc>) -> RepoResult<Vec<LoginLog>> {
        let mut map = self.entries.write()?;
        map.retain(|_, e| !e.is_expired(now));
        let mut recent: Vec<LoginLog> = map.values().cloned().collect();
        recent.sort_by_key(|e| std::cmp::Reverse(e.timestamp));
        Ok(recent)
    }
}
