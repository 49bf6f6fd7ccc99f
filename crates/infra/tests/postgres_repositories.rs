//! Postgres repositories against a live database.
//!
//! Skipped unless `DENTLAB_TEST_DATABASE_URL` points at a disposable database.

use chrono::{Duration, Utc};

use dentlab_auth::{LoginLog, NewUser, UserPatch};
use dentlab_cases::{CasePatch, DentalCase, LabCalendar, NewCase};
use dentlab_core::{CaseId, InvoiceId, Money, NotificationId, UserId};
use dentlab_infra::{Repositories, RepositoryError, postgres};
use dentlab_invoicing::{Invoice, InvoicePeriod, InvoiceRequest, PriceTable, compute_invoice};
use dentlab_notifications::Notification;

async fn repositories() -> Option<Repositories> {
    let url = std::env::var("DENTLAB_TEST_DATABASE_URL").ok()?;
    let pool = postgres::connect(&url, 2).await.expect("connect to test database");
    Some(Repositories::postgres(pool))
}

fn unique(prefix: &str) -> String {
    format!("{prefix} {}", uuid::Uuid::now_v7().simple())
}

fn case(dentist: &str) -> DentalCase {
    DentalCase::create(
        CaseId::new(),
        NewCase {
            patient_name: "Nour Aziz".to_string(),
            dentist_name: dentist.to_string(),
            tooth_numbers: "11,12,13".to_string(),
            prosthesis_type: "Bridge".to_string(),
            material: "Zirconia, Implant".to_string(),
            shade: "A2".to_string(),
            delivery_date: None,
            notes: Some("rush".to_string()),
            source: None,
            patient_number: Some("P-7".to_string()),
        },
        Utc::now(),
    )
    .unwrap()
}

#[tokio::test]
async fn cases_round_trip_and_patch_in_a_transaction() {
    let Some(repos) = repositories().await else { return };
    let dentist = unique("Dr. Test");

    let stored = case(&dentist);
    let id = repos.cases.insert(stored.clone()).await.unwrap();
    let loaded = repos.cases.get(id).await.unwrap();
    assert_eq!(loaded.material, stored.material);
    assert_eq!(loaded.patient_number.as_deref(), Some("P-7"));

    let patched = repos
        .cases
        .update(id, CasePatch::default().with_unit_price_input("12.50"))
        .await
        .unwrap();
    assert_eq!(patched.unit_price, Some(Money::from_minor(1250)));

    repos.cases.modify(id, Box::new(|c: &mut DentalCase| c.request_deletion())).await.unwrap();
    let again = repos.cases.modify(id, Box::new(|c: &mut DentalCase| c.request_deletion())).await;
    assert!(matches!(again, Err(RepositoryError::Conflict(_))));

    assert_eq!(repos.cases.list_by_dentist(&dentist).await.unwrap().len(), 1);
    repos.cases.delete(id).await.unwrap();
    assert!(matches!(repos.cases.get(id).await, Err(RepositoryError::NotFound)));
}

#[tokio::test]
async fn invoice_snapshot_survives_storage() {
    let Some(repos) = repositories().await else { return };
    let dentist = unique("Dr. Invoice");
    let request = InvoiceRequest {
        dentist_name: dentist.clone(),
        period: InvoicePeriod::default(),
        prices: PriceTable::default(),
        paid_amount: Money::from_major(40),
    };
    let draft = compute_invoice(&[case(&dentist)], &request, &LabCalendar::utc())
        .unwrap()
        .unwrap();
    let invoice = Invoice::issue(InvoiceId::new(), draft, Utc::now());

    let id = repos.invoices.save(invoice.clone()).await.unwrap();
    let loaded = repos.invoices.get(id).await.unwrap();
    assert_eq!(loaded.summary(), invoice.summary());
    assert_eq!(loaded.grand_total(), invoice.grand_total());
    assert_eq!(repos.invoices.list_by_dentist(&dentist).await.unwrap().len(), 1);

    repos.invoices.delete(id).await.unwrap();
    assert!(matches!(repos.invoices.delete(id).await, Err(RepositoryError::NotFound)));
}

#[tokio::test]
async fn user_names_are_unique_ignoring_case() {
    let Some(repos) = repositories().await else { return };
    let name = unique("Dr. User");
    let other = unique("Dr. Other");

    let user = repos
        .users
        .add(
            UserId::new(),
            NewUser {
                name: name.clone(),
                password: "pw".to_string(),
                welcome_message: None,
            },
        )
        .await
        .unwrap();
    let second = repos
        .users
        .add(
            UserId::new(),
            NewUser {
                name: other.clone(),
                password: "pw".to_string(),
                welcome_message: None,
            },
        )
        .await
        .unwrap();

    let dup = repos
        .users
        .add(
            UserId::new(),
            NewUser {
                name: name.to_uppercase(),
                password: "x".to_string(),
                welcome_message: None,
            },
        )
        .await;
    assert!(matches!(dup, Err(RepositoryError::Conflict(_))));

    let rename = repos
        .users
        .update(
            second.id,
            UserPatch {
                name: Some(name.to_lowercase()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(rename, Err(RepositoryError::Conflict(_))));

    let found = repos.users.verify(&name.to_lowercase(), "pw").await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(user.id));

    repos.users.delete(user.id).await.unwrap();
    repos.users.delete(second.id).await.unwrap();
}

#[tokio::test]
async fn inbox_and_login_log() {
    let Some(repos) = repositories().await else { return };
    let dentist = unique("Dr. Inbox");
    let now = Utc::now();

    let id = repos
        .notifications
        .create(Notification::new(NotificationId::new(), &dentist, "hello", now))
        .await
        .unwrap();
    assert_eq!(repos.notifications.unread_for(&dentist).await.unwrap().len(), 1);
    repos.notifications.mark_read(id).await.unwrap();
    assert!(repos.notifications.unread_for(&dentist).await.unwrap().is_empty());

    repos
        .login_logs
        .record(LoginLog::new(&dentist, now - Duration::hours(48)))
        .await
        .unwrap();
    repos.login_logs.record(LoginLog::new(&dentist, now)).await.unwrap();
    let recent: Vec<_> = repos
        .login_logs
        .recent(now)
        .await
        .unwrap()
        .into_iter()
        .filter(|l| l.dentist_name == dentist)
        .collect();
    assert_eq!(recent.len(), 1);
}
