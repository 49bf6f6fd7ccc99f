use std::sync::Arc;

use sqlx::PgPool;

use crate::memory::{
    InMemoryCaseRepository, InMemoryInvoiceRepository, InMemoryLoginLogRepository,
    InMemoryNotificationRepository, InMemoryUserRepository,
};
use crate::postgres::{
    PostgresCaseRepository, PostgresInvoiceRepository, PostgresLoginLogRepository,
    PostgresNotificationRepository, PostgresUserRepository,
};
use crate::repository::{
    CaseRepository, InvoiceRepository, LoginLogRepository, NotificationRepository, UserRepository,
};

/// One handle per collection, all on the same backend.
#[derive(Clone)]
pub struct Repositories {
    pub cases: Arc<dyn CaseRepository>,
    pub invoices: Arc<dyn InvoiceRepository>,
    pub users: Arc<dyn UserRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub login_logs: Arc<dyn LoginLogRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            cases: Arc::new(InMemoryCaseRepository::new()),
            invoices: Arc::new(InMemoryInvoiceRepository::new()),
            users: Arc::new(InMemoryUserRepository::new()),
            notifications: Arc::new(InMemoryNotificationRepository::new()),
            login_logs: Arc::new(InMemoryLoginLogRepository::new()),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            cases: Arc::new(PostgresCaseRepository::new(pool.clone())),
            invoices: Arc::new(PostgresInvoiceRepository::new(pool.clone())),
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            notifications: Arc::new(PostgresNotificationRepository::new(pool.clone())),
            login_logs: Arc::new(PostgresLoginLogRepository::new(pool)),
        }
    }
}
