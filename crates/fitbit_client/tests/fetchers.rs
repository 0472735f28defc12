use chrono::{DateTime, Utc};
use fitbit_client::credentials::CredentialStore;
use fitbit_client::http_client::ReqwestFitbitClient;
use fitbit_client::results::ResultsLayout;
use fitbit_client::{ApiError, DateParam, FitbitClient, FitbitError, Period, utils};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer, dir: &tempfile::TempDir) -> ReqwestFitbitClient {
    let conf = dir.path().join("test_conf.json");
    let body = serde_json::json!({
        "access_token": "acc",
        "refresh_token": "ref",
        "client_id": "cid"
    });
    tokio::fs::write(&conf, body.to_string()).await.unwrap();
    let store = CredentialStore::load(&conf).await.expect("store");
    ReqwestFitbitClient::new(
        &server.uri(),
        store,
        ResultsLayout::new(dir.path().join("results")),
        utils::offset_from_hours(9).unwrap(),
    )
    .expect("client")
}

fn heart_body() -> serde_json::Value {
    serde_json::json!({
        "activities-heart": [{
            "dateTime": "2024-01-24",
            "value": {
                "customHeartRateZones": [],
                "heartRateZones": [
                    {
                        "caloriesOut": 1514.5,
                        "max": 115,
                        "min": 30,
                        "minutes": 1380,
                        "name": "Out of Range"
                    }
                ],
                "restingHeartRate": 58
            }
        }]
    })
}

#[tokio::test]
async fn heart_rate_saves_body_under_server_date() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/user/-/activities/heart/date/today/1d.json"))
        .and(header("authorization", "Bearer acc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(heart_body()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut client = client_for(&server, &dir).await;
    let record = client
        .heart_rate(DateParam::default(), Period::default())
        .await
        .expect("heart rate");

    let expected_path = dir.path().join("results").join("heartbeat").join("2024-01-24.json");
    assert_eq!(record.path, expected_path);

    let written = std::fs::read_to_string(&expected_path).unwrap();
    assert_eq!(written, serde_json::to_string_pretty(&heart_body()).unwrap());
    assert!(written.starts_with("{\n  \"activities-heart\": [\n    {\n      \"dateTime\""));
    assert_eq!(record.response.json().unwrap(), heart_body());
}

#[tokio::test]
async fn heart_rate_overwrites_existing_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/user/-/activities/heart/date/2024-01-24/7d.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(heart_body()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let heartbeat = dir.path().join("results").join("heartbeat");
    std::fs::create_dir_all(&heartbeat).unwrap();
    std::fs::write(heartbeat.join("2024-01-24.json"), "old").unwrap();

    let mut client = client_for(&server, &dir).await;
    let date: DateParam = "2024-01-24".parse().unwrap();
    client
        .heart_rate(date, Period::SevenDays)
        .await
        .expect("heart rate");

    let written = std::fs::read_to_string(heartbeat.join("2024-01-24.json")).unwrap();
    assert_ne!(written, "old");
}

#[tokio::test]
async fn heart_rate_without_date_time_is_missing_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/user/-/activities/heart/date/today/1d.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"activities-heart": []})),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut client = client_for(&server, &dir).await;
    let err = client
        .heart_rate(DateParam::Today, Period::OneDay)
        .await
        .unwrap_err();
    assert!(matches!(err, FitbitError::MissingField(_)));
}

#[tokio::test]
async fn api_error_body_is_not_saved() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/user/-/activities/heart/date/today/1d.json"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "errors": [{"errorType": "invalid_token", "message": "Access token invalid"}],
            "success": false
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut client = client_for(&server, &dir).await;
    let err = client
        .heart_rate(DateParam::Today, Period::OneDay)
        .await
        .unwrap_err();
    assert!(matches!(err, FitbitError::Api(ApiError::Other(_))));
    assert!(!dir.path().join("results").join("heartbeat").exists());
}

#[tokio::test]
async fn sleep_uses_local_date_in_plus_nine() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "sleep": [],
        "summary": {"totalMinutesAsleep": 0, "totalSleepRecords": 0, "totalTimeInBed": 0}
    });
    Mock::given(method("GET"))
        .and(path("/1.2/user/-/sleep/date/2024-01-02.json"))
        .and(header("authorization", "Bearer acc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut client = client_for(&server, &dir).await;
    let now: DateTime<Utc> = "2024-01-01T20:00:00Z".parse().unwrap();
    let record = client.sleep_at(now).await.expect("sleep");

    let expected_path = dir.path().join("results").join("sleepTime").join("2024-01-02.json");
    assert_eq!(record.path, expected_path);
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&expected_path).unwrap()).unwrap();
    assert_eq!(written, body);
}
