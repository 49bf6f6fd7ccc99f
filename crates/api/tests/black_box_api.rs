use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use dentlab_api::app::{AppServices, build_app};
use dentlab_auth::{Hs256Jwt, LoginLog};
use dentlab_cases::LabCalendar;
use dentlab_infra::{LoginLogRepository, RepoResult, Repositories, RepositoryError};
use dentlab_notifications::{
    Channel, DeliveryReport, NotificationSender, Notifier, OutboundMessage, TwilioSettings,
    WhatsAppSender,
};

const JWT_SECRET: &str = "test-secret";
const OWNER_PASSWORD: &str = "owner-pass";
const HELP_URL: &str = "https://lab.example/grants";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(Repositories::in_memory()).await
    }

    async fn spawn_with(repos: Repositories) -> Self {
        Self::spawn_with_notifier(repos, Notifier::disabled()).await
    }

    async fn spawn_with_notifier(repos: Repositories, notifier: Notifier) -> Self {
        let services = Arc::new(AppServices {
            repos,
            calendar: LabCalendar::utc(),
            sessions: Arc::new(Hs256Jwt::new(JWT_SECRET)),
            token_ttl: ChronoDuration::minutes(30),
            owner_password: OWNER_PASSWORD.to_string(),
            notifier,
            permissions_help_url: Arc::from(HELP_URL),
        });

        // Same router as prod, bound to an ephemeral port.
        let app = build_app(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn owner_token(&self) -> String {
        let res = self
            .client
            .post(self.url("/auth/owner"))
            .json(&json!({ "password": OWNER_PASSWORD }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn add_doctor(&self, owner: &str, name: &str, password: &str) -> Value {
        let res = self
            .client
            .post(self.url("/users"))
            .bearer_auth(owner)
            .json(&json!({ "name": name, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        res.json().await.unwrap()
    }

    async fn doctor_token(&self, name: &str, password: &str) -> String {
        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "name": name, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_case(&self, token: &str, dentist: &str, patient: &str) -> reqwest::Response {
        self.client
            .post(self.url("/cases"))
            .bearer_auth(token)
            .json(&json!({
                "patientName": patient,
                "dentistName": dentist,
                "toothNumbers": "11,12,13",
                "prosthesisType": "Bridge",
                "material": "Zirconia",
                "shade": "A2",
                "source": "Mobile"
            }))
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(sub: &str, role: &str, issued_at: DateTime<Utc>, ttl: ChronoDuration) -> String {
    let claims = json!({
        "sub": sub,
        "role": role,
        "issued_at": issued_at,
        "expires_at": issued_at + ttl,
    });

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn health_is_public_and_everything_else_needs_a_token() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv.client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthenticated");

    let expired = mint_jwt("owner", "owner", Utc::now() - ChronoDuration::hours(2), ChronoDuration::minutes(10));
    let res = srv
        .client
        .get(srv.url("/cases"))
        .bearer_auth(expired)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn principal_is_derived_from_token() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt("owner", "owner", Utc::now(), ChronoDuration::minutes(10));

    let res = srv
        .client
        .get(srv.url("/whoami"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["role"], "owner");
    assert_eq!(body["inbox"], "owner");
    assert!(body["permissions"].as_array().unwrap().iter().any(|p| p == "*"));
}

#[tokio::test]
async fn owner_password_is_checked() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .post(srv.url("/auth/owner"))
        .json(&json!({ "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_credentials");
}

#[tokio::test]
async fn doctor_accounts_sign_in_and_are_logged() {
    let srv = TestServer::spawn().await;
    let owner = srv.owner_token().await;

    let user = srv.add_doctor(&owner, "Dr. Omar", "pw1").await;
    assert_eq!(user["welcomeMessage"], "Welcome, Dr. Omar");

    let res = srv
        .client
        .post(srv.url("/users"))
        .bearer_auth(&owner)
        .json(&json!({ "name": "dr. omar", "password": "pw2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = srv
        .client
        .post(srv.url("/auth/login"))
        .json(&json!({ "name": "DR. OMAR", "password": "pw1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let session: Value = res.json().await.unwrap();
    assert_eq!(session["name"], "Dr. Omar");
    assert_eq!(session["role"], "doctor");
    let doctor = session["token"].as_str().unwrap().to_string();

    let res = srv
        .client
        .post(srv.url("/auth/login"))
        .json(&json!({ "name": "Dr. Omar", "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Doctors cannot manage accounts or read the login log.
    let res = srv
        .client
        .get(srv.url("/users"))
        .bearer_auth(&doctor)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .get(srv.url("/login-logs"))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let logs: Value = res.json().await.unwrap();
    assert_eq!(logs.as_array().unwrap().len(), 1);
    assert_eq!(logs[0]["dentistName"], "Dr. Omar");

    let id = user["id"].as_str().unwrap();
    let res = srv
        .client
        .delete(srv.url(&format!("/users/{id}")))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn doctors_submit_their_own_cases_and_the_owner_is_notified() {
    let srv = TestServer::spawn().await;
    let owner = srv.owner_token().await;
    srv.add_doctor(&owner, "Dr. Omar", "pw").await;
    srv.add_doctor(&owner, "Dr. Lina", "pw").await;
    let omar = srv.doctor_token("Dr. Omar", "pw").await;
    let lina = srv.doctor_token("Dr. Lina", "pw").await;

    let res = srv.create_case(&omar, "Dr. Omar", "Nour Aziz").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let case: Value = res.json().await.unwrap();
    let case_id = case["id"].as_str().unwrap().to_string();

    let res = srv.create_case(&omar, "Dr. Lina", "Sami Haddad").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .post(srv.url("/cases"))
        .bearer_auth(&omar)
        .json(&json!({
            "patientName": "Nour Aziz",
            "dentistName": "Dr. Omar",
            "toothNumbers": " , ",
            "prosthesisType": "Bridge",
            "material": "Zirconia",
            "shade": "A2"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Other doctors neither list nor open the case.
    let res = srv.client.get(srv.url("/cases")).bearer_auth(&lina).send().await.unwrap();
    let listed: Value = res.json().await.unwrap();
    assert!(listed.as_array().unwrap().is_empty());
    let res = srv
        .client
        .get(srv.url(&format!("/cases/{case_id}")))
        .bearer_auth(&lina)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .get(srv.url("/cases?dentist=Dr.%20Omar&q=nour"))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    let listed: Value = res.json().await.unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let res = srv.client.get(srv.url("/notifications")).bearer_auth(&owner).send().await.unwrap();
    let inbox: Value = res.json().await.unwrap();
    assert_eq!(inbox.as_array().unwrap().len(), 1);
    assert_eq!(inbox[0]["message"], "New Case From Dr. Omar");
    let notice_id = inbox[0]["id"].as_str().unwrap().to_string();

    // A doctor cannot mark the owner's notice as read.
    let res = srv
        .client
        .post(srv.url(&format!("/notifications/{notice_id}/read")))
        .bearer_auth(&omar)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv
        .client
        .post(srv.url(&format!("/notifications/{notice_id}/read")))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = srv.client.get(srv.url("/notifications")).bearer_auth(&owner).send().await.unwrap();
    let inbox: Value = res.json().await.unwrap();
    assert!(inbox.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn dentist_name_is_trimmed_before_the_ownership_check() {
    let srv = TestServer::spawn().await;
    let owner = srv.owner_token().await;
    srv.add_doctor(&owner, "Dr. Omar", "pw").await;
    let omar = srv.doctor_token("Dr. Omar", "pw").await;

    let res = srv.create_case(&omar, "  Dr. Omar ", "Nour Aziz").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let case: Value = res.json().await.unwrap();
    assert_eq!(case["dentistName"], "Dr. Omar");

    // Blank falls back to the signed-in doctor.
    let res = srv.create_case(&omar, "   ", "Sami Haddad").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let case: Value = res.json().await.unwrap();
    assert_eq!(case["dentistName"], "Dr. Omar");

    let res = srv.client.get(srv.url("/cases")).bearer_auth(&omar).send().await.unwrap();
    let listed: Value = res.json().await.unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 2);
}

/// Fails every send after a delay longer than any request should take.
struct SlowFailingSender;

#[async_trait::async_trait]
impl NotificationSender for SlowFailingSender {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn send(&self, _message: &OutboundMessage) -> DeliveryReport {
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        DeliveryReport::failed(Channel::Email, "provider down")
    }
}

#[tokio::test]
async fn failing_alert_channels_never_block_case_creation() {
    let twilio = TwilioSettings {
        account_sid: Some("AC123".into()),
        auth_token: Some("token".into()),
        from: Some("+15550000".into()),
        to: Some("+15550001".into()),
    };
    // Nothing listens on port 9.
    let whatsapp = WhatsAppSender::with_api_base(reqwest::Client::new(), twilio, "http://127.0.0.1:9");
    let senders: Vec<Arc<dyn NotificationSender>> = vec![Arc::new(whatsapp), Arc::new(SlowFailingSender)];
    let notifier = Notifier::new(senders);
    let srv = TestServer::spawn_with_notifier(Repositories::in_memory(), notifier).await;
    let owner = srv.owner_token().await;

    let res = tokio::time::timeout(
        std::time::Duration::from_secs(2),
        srv.create_case(&owner, "Dr. Omar", "Nour Aziz"),
    )
    .await
    .expect("case creation waited on alert delivery");
    assert_eq!(res.status(), StatusCode::CREATED);
    let case: Value = res.json().await.unwrap();
    let case_id = case["id"].as_str().unwrap();

    let res = srv
        .client
        .get(srv.url(&format!("/cases/{case_id}")))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: Value = res.json().await.unwrap();
    assert_eq!(fetched["patientName"], "Nour Aziz");

    let res = srv.client.get(srv.url("/notifications")).bearer_auth(&owner).send().await.unwrap();
    let inbox: Value = res.json().await.unwrap();
    assert_eq!(inbox.as_array().unwrap().len(), 1);
    assert_eq!(inbox[0]["message"], "New Case From Dr. Omar");
}

#[tokio::test]
async fn deletion_request_lifecycle() {
    let srv = TestServer::spawn().await;
    let owner = srv.owner_token().await;
    srv.add_doctor(&owner, "Dr. Omar", "pw").await;
    let omar = srv.doctor_token("Dr. Omar", "pw").await;

    let case: Value = srv.create_case(&omar, "Dr. Omar", "Nour Aziz").await.json().await.unwrap();
    let id = case["id"].as_str().unwrap().to_string();

    let res = srv
        .client
        .post(srv.url(&format!("/cases/{id}/deletion-request")))
        .bearer_auth(&omar)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["deletionRequested"], true);

    let res = srv
        .client
        .post(srv.url(&format!("/cases/{id}/deletion-request")))
        .bearer_auth(&omar)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = srv.client.get(srv.url("/notifications")).bearer_auth(&owner).send().await.unwrap();
    let inbox: Value = res.json().await.unwrap();
    assert!(
        inbox
            .as_array()
            .unwrap()
            .iter()
            .any(|n| n["message"] == "Deletion Requested By Dr. Omar For Nour Aziz")
    );

    // Doctors may not carry out deletions themselves.
    let res = srv
        .client
        .post(srv.url(&format!("/cases/{id}/soft-delete")))
        .bearer_auth(&omar)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .post(srv.url(&format!("/cases/{id}/soft-delete")))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv.client.get(srv.url("/cases")).bearer_auth(&omar).send().await.unwrap();
    let listed: Value = res.json().await.unwrap();
    assert!(listed.as_array().unwrap().is_empty());
    let res = srv
        .client
        .get(srv.url(&format!("/cases/{id}")))
        .bearer_auth(&omar)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv
        .client
        .post(srv.url(&format!("/cases/{id}/restore")))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = srv.client.get(srv.url("/cases")).bearer_auth(&omar).send().await.unwrap();
    let listed: Value = res.json().await.unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn owner_edits_cases_with_typed_unit_price() {
    let srv = TestServer::spawn().await;
    let owner = srv.owner_token().await;

    let case: Value = srv.create_case(&owner, "Dr. Omar", "Nour Aziz").await.json().await.unwrap();
    let id = case["id"].as_str().unwrap().to_string();

    let res = srv
        .client
        .patch(srv.url(&format!("/cases/{id}")))
        .bearer_auth(&owner)
        .json(&json!({ "shade": "B1", "unitPriceInput": "12.50", "notes": null }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["shade"], "B1");
    assert_eq!(body["unitPrice"], 1250);

    let res = srv
        .client
        .patch(srv.url(&format!("/cases/{id}")))
        .bearer_auth(&owner)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv
        .client
        .patch(srv.url("/cases/not-a-uuid"))
        .bearer_auth(&owner)
        .json(&json!({ "shade": "B1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv
        .client
        .delete(srv.url(&format!("/cases/{id}")))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = srv
        .client
        .get(srv.url(&format!("/cases/{id}")))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invoices_are_previewed_issued_and_scoped() {
    let srv = TestServer::spawn().await;
    let owner = srv.owner_token().await;
    srv.add_doctor(&owner, "Dr. Omar", "pw").await;
    let omar = srv.doctor_token("Dr. Omar", "pw").await;
    assert_eq!(
        srv.create_case(&omar, "Dr. Omar", "Nour Aziz").await.status(),
        StatusCode::CREATED
    );

    let request = json!({
        "dentistName": "Dr. Omar",
        "prices": { "Zirconia": "30", "Unobtainium": "5" },
        "paidAmount": "40"
    });

    let res = srv
        .client
        .post(srv.url("/invoices/preview"))
        .bearer_auth(&omar)
        .json(&request)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let preview: Value = res.json().await.unwrap();
    assert_eq!(preview["summary"]["Zirconia"]["toothCount"], 3);
    assert_eq!(preview["summary"]["Zirconia"]["total"], 9000);
    assert_eq!(preview["subtotal"], 9000);
    assert_eq!(preview["grandTotal"], 5000);
    assert_eq!(preview["ignoredPrices"], json!(["Unobtainium"]));

    // Doctors preview but do not issue.
    let res = srv
        .client
        .post(srv.url("/invoices"))
        .bearer_auth(&omar)
        .json(&request)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .post(srv.url("/invoices"))
        .bearer_auth(&owner)
        .json(&request)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let invoice: Value = res.json().await.unwrap();
    let invoice_id = invoice["id"].as_str().unwrap().to_string();
    assert_eq!(invoice["cases"].as_array().unwrap().len(), 1);

    let res = srv.client.get(srv.url("/invoices")).bearer_auth(&omar).send().await.unwrap();
    let listed: Value = res.json().await.unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let res = srv
        .client
        .get(srv.url("/invoices?dentist=Dr.%20Lina"))
        .bearer_auth(&omar)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .post(srv.url("/invoices/preview"))
        .bearer_auth(&owner)
        .json(&json!({ "dentistName": "Dr. Omar", "fromDate": "2999-01-01" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "no_cases_in_range");

    let res = srv
        .client
        .delete(srv.url(&format!("/invoices/{invoice_id}")))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

struct DeniedLoginLogs;

#[async_trait::async_trait]
impl LoginLogRepository for DeniedLoginLogs {
    async fn record(&self, _entry: LoginLog) -> RepoResult<()> {
        Err(RepositoryError::PermissionDenied("login_logs: insufficient privilege".into()))
    }

    async fn recent(&self, _now: DateTime<Utc>) -> RepoResult<Vec<LoginLog>> {
        Err(RepositoryError::PermissionDenied("login_logs: insufficient privilege".into()))
    }
}

#[tokio::test]
async fn database_permission_errors_carry_a_help_link() {
    let mut repos = Repositories::in_memory();
    repos.login_logs = Arc::new(DeniedLoginLogs);
    let srv = TestServer::spawn_with(repos).await;
    let owner = srv.owner_token().await;

    let res = srv
        .client
        .get(srv.url("/login-logs"))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "permission_denied");
    assert_eq!(body["help_url"], HELP_URL);

    // A failing login log never blocks sign-in.
    srv.add_doctor(&owner, "Dr. Omar", "pw").await;
    srv.doctor_token("Dr. Omar", "pw").await;
}
