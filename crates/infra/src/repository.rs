//! Async repository interfaces over the lab's collections.
//!
//! Every implementation is `Send + Sync` and shared behind `Arc<dyn _>`.
//! Listings come back newest first.

use chrono::{DateTime, Utc};

use dentlab_auth::{LoginLog, NewUser, User, UserPatch};
use dentlab_cases::{CasePatch, DentalCase};
use dentlab_core::{CaseId, DomainResult, InvoiceId, NotificationId, UserId};
use dentlab_invoicing::Invoice;
use dentlab_notifications::Notification;

use crate::error::RepoResult;

/// A read-modify-write step applied to one stored case.
pub type CaseChange = Box<dyn FnOnce(&mut DentalCase) -> DomainResult<()> + Send>;

#[async_trait::async_trait]
pub trait CaseRepository: Send + Sync {
    async fn insert(&self, case: DentalCase) -> RepoResult<CaseId>;

    async fn get(&self, id: CaseId) -> RepoResult<DentalCase>;

    async fn list(&self) -> RepoResult<Vec<DentalCase>>;

    async fn list_by_dentist(&self, dentist_name: &str) -> RepoResult<Vec<DentalCase>>;

    /// Load, change and store a case as one step. The stored case is left
    /// untouched when `change` fails.
    async fn modify(&self, id: CaseId, change: CaseChange) -> RepoResult<DentalCase>;

    /// Hard delete.
    async fn delete(&self, id: CaseId) -> RepoResult<()>;

    async fn update(&self, id: CaseId, patch: CasePatch) -> RepoResult<DentalCase> {
        self.modify(id, Box::new(move |case: &mut DentalCase| case.apply_patch(patch)))
            .await
    }
}

#[async_trait::async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn save(&self, invoice: Invoice) -> RepoResult<InvoiceId>;

    async fn get(&self, id: InvoiceId) -> RepoResult<Invoice>;

    async fn list(&self) -> RepoResult<Vec<Invoice>>;

    async fn list_by_dentist(&self, dentist_name: &str) -> RepoResult<Vec<Invoice>>;

    async fn delete(&self, id: InvoiceId) -> RepoResult<()>;
}

/// Doctor accounts. Names are unique ignoring case; `add` and `update`
/// check and write under one lock or transaction.
#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    async fn list(&self) -> RepoResult<Vec<User>>;

    async fn get(&self, id: UserId) -> RepoResult<User>;

    async fn add(&self, id: UserId, new_user: NewUser) -> RepoResult<User>;

    async fn update(&self, id: UserId, patch: UserPatch) -> RepoResult<User>;

    async fn delete(&self, id: UserId) -> RepoResult<()>;

    /// Case-insensitive name, exact password.
    async fn verify(&self, name: &str, password: &str) -> RepoResult<Option<User>>;
}

#[async_trait::async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: Notification) -> RepoResult<NotificationId>;

    async fn get(&self, id: NotificationId) -> RepoResult<Notification>;

    async fn unread_for(&self, recipient: &str) -> RepoResult<Vec<Notification>>;

    async fn mark_read(&self, id: NotificationId) -> RepoResult<()>;
}

#[async_trait::async_trait]
pub trait LoginLogRepository: Send + Sync {
    async fn record(&self, entry: LoginLog) -> RepoResult<()>;

    /// Drop entries older than the retention window, then list the rest.
    async fn recent(&self, now: DateTime<Utc>) -> RepoResult<Vec<LoginLog>>;
}
