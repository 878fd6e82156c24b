use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use rust_decimal::dec;
use serde_json::{json, Value};

use ft_desk::error::DeskError;
use ft_desk::money::AmountMatcher;
use ft_desk::repositories::ft_repository::FtRepository;
use ft_desk::repositories::ledger::ConfirmationLedger;
use ft_desk::services::monitor_service::{MonitorService, MonitorSettings};
use ft_desk::services::reservation_service::{ConfirmationOutcome, ReservationService, Selector};

const API_KEY: &str = "k&y 1";
const ACCOUNT: &str = "4400-0003";

// Trailing commas on purpose, the real API sends them.
const TWO_RESERVATIONS: &str = r#"{
  "ReservationsOverview 0.9": {
    "Details": [
      {"RecordNumber": 1, "Res_code": "RC-SMALL", "Amount": "250000.00", "Currency": "USD", "AccountName": "Northwind Holdings", "AccountSignatory": "J. Doe",},
      {"RecordNumber": 2, "Res_code": "RC-1M", "Amount": "1,000,000.00", "Currency": "USD", "AccountName": "Northwind Holdings", "AccountSignatory": "J. Doe",},
    ]
  }
}"#;

#[derive(Clone)]
struct FtMock {
    reservations: Arc<Mutex<(StatusCode, String)>>,
    confirmations: Arc<Mutex<Vec<Value>>>,
    // queued confirmation replies; a JSON receipt once empty
    confirm_replies: Arc<Mutex<VecDeque<(StatusCode, String)>>>,
}

impl FtMock {
    fn new(body: &str) -> Self {
        Self {
            reservations: Arc::new(Mutex::new((StatusCode::OK, body.to_string()))),
            confirmations: Arc::new(Mutex::new(Vec::new())),
            confirm_replies: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    fn reply_to_next_confirmation(&self, status: StatusCode, body: &str) {
        self.confirm_replies
            .lock()
            .unwrap()
            .push_back((status, body.to_string()));
    }

    fn confirmations(&self) -> Vec<Value> {
        self.confirmations.lock().unwrap().clone()
    }
}

fn authorized(params: &HashMap<String, String>) -> bool {
    params.get("key").map(String::as_str) == Some(API_KEY)
}

async fn reservations(
    State(mock): State<FtMock>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    if !authorized(&params) {
        return (StatusCode::UNAUTHORIZED, "bad key".to_string());
    }
    if params.get("account").map(String::as_str) != Some(ACCOUNT) {
        return (StatusCode::OK, r#"{"Information":{"Info":"Unknown account"}}"#.to_string());
    }
    mock.reservations.lock().unwrap().clone()
}

async fn confirmation(State(mock): State<FtMock>, body: String) -> (StatusCode, String) {
    let value: Value = serde_json::from_str(&body).unwrap();
    mock.confirmations.lock().unwrap().push(value);
    mock.confirm_replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((StatusCode::OK, r#"{"Status": "Confirmed",}"#.to_string()))
}

async fn receiving(Query(params): Query<HashMap<String, String>>) -> (StatusCode, String) {
    if !authorized(&params) {
        return (StatusCode::UNAUTHORIZED, "bad key".to_string());
    }
    let body = json!({
        "Receiving": [
            {"Ref": "IN-1", "Amount": "12.00"},
            {"Ref": "IN-2", "Amount": "1000000.00"}
        ]
    });
    (StatusCode::OK, body.to_string())
}

async fn spawn_ft(mock: FtMock) -> String {
    let app = Router::new()
        .route("/reservation.asp", get(reservations))
        .route("/reservation_confirmation.asp", post(confirmation))
        .route("/receiving.asp", get(receiving))
        .with_state(mock);
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let server = axum::Server::bind(&addr).serve(app.into_make_service());
    let url = format!("http://{}/", server.local_addr());
    tokio::spawn(server);
    url
}

async fn service(mock: &FtMock, api_key: &str, ledger: ConfirmationLedger) -> ReservationService {
    let url = spawn_ft(mock.clone()).await;
    let repo = FtRepository::new(&url, api_key, Duration::from_secs(5)).unwrap();
    ReservationService::new(repo, ledger, ACCOUNT, "auth-123")
}

#[tokio::test]
async fn confirms_matching_reservation_once() {
    let mock = FtMock::new(TWO_RESERVATIONS);
    let service = service(&mock, API_KEY, ConfirmationLedger::in_memory()).await;
    let selector = Selector::Amount(AmountMatcher::million());

    let outcome = service.confirm(&selector, false).await.unwrap();
    let (request, response) = match outcome {
        ConfirmationOutcome::Confirmed { request, response } => (request, response),
        other => panic!("expected a confirmation, got {:?}", other),
    };
    assert_eq!(request.res_code, "RC-1M");
    assert_eq!(request.amount, "1000000.00");
    assert_eq!(request.account_number, ACCOUNT);
    assert_eq!(response, json!({"Status": "Confirmed"}));

    let sent = mock.confirmations();
    assert_eq!(sent.len(), 1);
    let details = &sent[0]["Reservation_confirmation v0.9"]["Details"];
    assert_eq!(details["authToken"], "auth-123");
    assert_eq!(details["Res_code"], "RC-1M");
    assert_eq!(details["AccountNumber"], ACCOUNT);
    assert_eq!(details["Amount"], "1000000.00");
    assert_eq!(details["DateTime"].as_str().unwrap().len(), 19);

    let again = service.confirm(&selector, false).await.unwrap();
    assert_eq!(again, ConfirmationOutcome::AlreadyConfirmed("RC-1M".to_string()));
    assert_eq!(mock.confirmations().len(), 1);
}

#[tokio::test]
async fn confirms_by_res_code() {
    let mock = FtMock::new(TWO_RESERVATIONS);
    let service = service(&mock, API_KEY, ConfirmationLedger::in_memory()).await;

    let outcome = service
        .confirm(&Selector::ResCode("RC-SMALL".to_string()), false)
        .await
        .unwrap();
    assert!(matches!(outcome, ConfirmationOutcome::Confirmed { ref request, .. } if request.amount == "250000.00"));

    let unknown = service
        .confirm(&Selector::ResCode("RC-OTHER".to_string()), false)
        .await
        .unwrap();
    assert_eq!(unknown, ConfirmationOutcome::NotFound { info: None });
    assert_eq!(mock.confirmations().len(), 1);
}

#[tokio::test]
async fn plain_text_confirmation_reply_is_kept() {
    let mock = FtMock::new(TWO_RESERVATIONS);
    mock.reply_to_next_confirmation(StatusCode::OK, "OK\r\n");
    let service = service(&mock, API_KEY, ConfirmationLedger::in_memory()).await;

    let outcome = service
        .confirm(&Selector::Amount(AmountMatcher::million()), false)
        .await
        .unwrap();
    match outcome {
        ConfirmationOutcome::Confirmed { request, response } => {
            assert_eq!(request.res_code, "RC-1M");
            assert_eq!(response, Value::String("OK".to_string()));
        }
        other => panic!("expected a confirmation, got {:?}", other),
    }
}

#[tokio::test]
async fn dry_run_sends_nothing() {
    let mock = FtMock::new(TWO_RESERVATIONS);
    let service = service(&mock, API_KEY, ConfirmationLedger::in_memory()).await;

    let outcome = service
        .confirm(&Selector::Amount(AmountMatcher::million()), true)
        .await
        .unwrap();
    assert!(matches!(outcome, ConfirmationOutcome::DryRun(ref request) if request.res_code == "RC-1M"));
    assert!(mock.confirmations().is_empty());
}

#[tokio::test]
async fn information_means_nothing_to_confirm() {
    let mock = FtMock::new(r#"{"Information":{"Info":"No reservations found",}}"#);
    let service = service(&mock, API_KEY, ConfirmationLedger::in_memory()).await;

    assert!(service.pending().await.unwrap().is_empty());
    let outcome = service
        .confirm(&Selector::Amount(AmountMatcher::million()), false)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ConfirmationOutcome::NotFound {
            info: Some("No reservations found".to_string())
        }
    );
}

#[tokio::test]
async fn api_failures_surface_as_errors() {
    let mock = FtMock::new(TWO_RESERVATIONS);
    let bad_key = service(&mock, "wrong", ConfirmationLedger::in_memory()).await;
    match bad_key.status().await {
        Err(DeskError::Status { status, body }) => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, "bad key");
        }
        other => panic!("unexpected {:?}", other),
    }

    *mock.reservations.lock().unwrap() = (StatusCode::OK, "<html>maintenance</html>".to_string());
    let service = service(&mock, API_KEY, ConfirmationLedger::in_memory()).await;
    assert!(matches!(
        service.status().await,
        Err(DeskError::MalformedPayload(_))
    ));
}

#[tokio::test]
async fn finds_target_in_reservations_and_feed() {
    let mock = FtMock::new(TWO_RESERVATIONS);
    let service = service(&mock, API_KEY, ConfirmationLedger::in_memory()).await;

    let found = service
        .find_match(&Selector::Amount(AmountMatcher::million()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.res_code, "RC-1M");
    assert_eq!(found.account_name, "Northwind Holdings");

    let mentions = service.scan_receiving(&AmountMatcher::million()).await.unwrap();
    assert_eq!(mentions.len(), 1);
    assert_eq!(mentions[0].pointer, "/Receiving/1/Amount");
}

#[tokio::test]
async fn monitor_auto_confirms_once() {
    let mock = FtMock::new(TWO_RESERVATIONS);
    let service = service(&mock, API_KEY, ConfirmationLedger::in_memory()).await;
    let settings = MonitorSettings {
        interval: Duration::from_millis(10),
        matcher: AmountMatcher::million(),
        auto_confirm: true,
        max_ticks: Some(3),
    };

    let report = MonitorService::new(service, None, settings)
        .run(std::future::pending::<()>())
        .await;
    assert_eq!(report.ticks, 3);
    assert_eq!(report.failed_ticks, 0);
    assert_eq!(report.confirmed, vec!["RC-1M".to_string()]);
    assert_eq!(mock.confirmations().len(), 1);
}

#[tokio::test]
async fn monitor_retries_failed_confirmation() {
    let mock = FtMock::new(TWO_RESERVATIONS);
    mock.reply_to_next_confirmation(StatusCode::INTERNAL_SERVER_ERROR, "database busy");
    let service = service(&mock, API_KEY, ConfirmationLedger::in_memory()).await;
    let settings = MonitorSettings {
        interval: Duration::from_millis(10),
        matcher: AmountMatcher::million(),
        auto_confirm: true,
        max_ticks: Some(3),
    };

    let report = MonitorService::new(service, None, settings)
        .run(std::future::pending::<()>())
        .await;
    assert_eq!(report.ticks, 3);
    assert_eq!(report.failed_ticks, 1);
    assert_eq!(report.confirmed, vec!["RC-1M".to_string()]);
    // one rejected POST, one accepted, nothing after
    assert_eq!(mock.confirmations().len(), 2);
}

#[tokio::test]
async fn monitor_tick_keeps_going_past_a_failed_confirmation() {
    let mock = FtMock::new(TWO_RESERVATIONS);
    mock.reply_to_next_confirmation(StatusCode::INTERNAL_SERVER_ERROR, "database busy");
    let service = service(&mock, API_KEY, ConfirmationLedger::in_memory()).await;
    let settings = MonitorSettings {
        interval: Duration::from_secs(60),
        matcher: AmountMatcher::new(dec!(600000), dec!(500000)),
        auto_confirm: true,
        max_ticks: None,
    };
    let mut monitor = MonitorService::new(service, None, settings);

    let first = monitor.tick().await.unwrap();
    assert_eq!(first.matched, vec!["RC-SMALL".to_string(), "RC-1M".to_string()]);
    assert_eq!(first.errors.len(), 1);
    assert!(first.errors[0].starts_with("RC-SMALL"));
    assert_eq!(first.confirmed, vec!["RC-1M".to_string()]);

    let second = monitor.tick().await.unwrap();
    assert!(second.errors.is_empty());
    assert_eq!(second.confirmed, vec!["RC-SMALL".to_string()]);
}

#[tokio::test]
async fn monitor_keeps_going_after_failures() {
    let mock = FtMock::new(TWO_RESERVATIONS);
    *mock.reservations.lock().unwrap() =
        (StatusCode::SERVICE_UNAVAILABLE, "try later".to_string());
    let service = service(&mock, API_KEY, ConfirmationLedger::in_memory()).await;
    let settings = MonitorSettings {
        interval: Duration::from_millis(10),
        matcher: AmountMatcher::million(),
        auto_confirm: false,
        max_ticks: Some(2),
    };

    let report = MonitorService::new(service, None, settings)
        .run(std::future::pending::<()>())
        .await;
    assert_eq!(report.ticks, 2);
    assert_eq!(report.failed_ticks, 2);
    assert!(mock.confirmations().is_empty());
}

#[tokio::test]
async fn monitor_tick_reports_new_codes_once() {
    let mock = FtMock::new(TWO_RESERVATIONS);
    let service = service(&mock, API_KEY, ConfirmationLedger::in_memory()).await;
    let settings = MonitorSettings {
        interval: Duration::from_secs(60),
        matcher: AmountMatcher::million(),
        auto_confirm: false,
        max_ticks: None,
    };
    let mut monitor = MonitorService::new(service, None, settings);

    let first = monitor.tick().await.unwrap();
    assert_eq!(first.pending, 2);
    assert_eq!(first.new_codes, vec!["RC-SMALL".to_string(), "RC-1M".to_string()]);
    assert_eq!(first.matched, vec!["RC-1M".to_string()]);

    let second = monitor.tick().await.unwrap();
    assert!(second.new_codes.is_empty());
    assert_eq!(second.matched, vec!["RC-1M".to_string()]);
    assert!(second.confirmed.is_empty());
}
