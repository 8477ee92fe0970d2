use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use reqwest::{Client, header, redirect};
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

const TOKEN: &str = "tok-123";
const PASSWORD: &str = "secret";

#[derive(Debug, Deserialize)]
struct ReportSummary {
    id: String,
    title: String,
    report_type: String,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));
static MOCK_BACKEND: Lazy<String> = Lazy::new(start_mock_backend);

#[cfg(unix)]
mod cleanup {
    use std::sync::Once;
    use std::sync::atomic::{AtomicI32, Ordering};

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn authorized(headers: &HeaderMap) -> Result<(), StatusCode> {
    let expected = format!("Bearer {TOKEN}");
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

fn mock_router() -> Router {
    Router::new()
        .route(
            "/api/Auth/login",
            post(|Json(body): Json<Value>| async move {
                if body["senha"] == PASSWORD {
                    Ok(Json(json!({
                        "token": TOKEN,
                        "expiresAt": "2030-01-01T00:00:00Z",
                        "usuario": { "id": 1, "nome": "Admin", "email": "admin@example.test" }
                    })))
                } else {
                    Err(StatusCode::UNAUTHORIZED)
                }
            }),
        )
        // Always rejects, standing in for an expired token.
        .route(
            "/api/Auth/me",
            get(|| async { StatusCode::UNAUTHORIZED }),
        )
        .route(
            "/api/Local/ListarLocal",
            get(|headers: HeaderMap| async move {
                authorized(&headers)?;
                Ok::<_, StatusCode>(Json(json!({
                    "arrLocal": [
                        { "idLocal": 1, "latitude": -23.55, "longitude": -46.63, "descricao": "Library", "avaliacaoAcessibilidade": 5.0 },
                        { "idLocal": 2, "latitude": -23.56, "longitude": -46.64, "descricao": "Station", "avaliacaoAcessibilidade": 3.0 },
                        { "idLocal": 3, "latitude": -23.57, "longitude": -46.65, "descricao": null, "avaliacaoAcessibilidade": 2.0 }
                    ]
                })))
            }),
        )
        .route(
            "/api/AvaliacaoLocal/ListarAvaliacoesCompletas",
            get(|headers: HeaderMap| async move {
                authorized(&headers)?;
                Ok::<_, StatusCode>(Json(json!({
                    "avaliacoesCompletas": [],
                    "total": 0,
                    "paginaAtual": 1,
                    "tamanhoPagina": 10,
                    "temProximaPagina": false
                })))
            }),
        )
        .route(
            "/api/Voluntario",
            get(|headers: HeaderMap| async move {
                authorized(&headers)?;
                Ok::<_, StatusCode>(Json(json!({ "arrVoluntario": null })))
            }),
        )
        .route(
            "/api/Voluntario/EstatisticasPorRegiao",
            get(|headers: HeaderMap| async move {
                authorized(&headers)?;
                Ok::<_, StatusCode>(Json(json!({
                    "estatisticas": [
                        { "regiao": null, "quantidade": 2, "percentualDisponivel": 50.0, "avaliacaoMedia": 4.0 }
                    ]
                })))
            }),
        )
}

fn start_mock_backend() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock backend");
    let port = listener.local_addr().unwrap().port();
    listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("mock backend runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).expect("mock listener");
            axum::serve(listener, mock_router()).await.expect("mock backend");
        });
    });

    format!("http://127.0.0.1:{port}/api")
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("access_admin_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/health")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_access_admin"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("BACKEND_API_URL", MOCK_BACKEND.as_str())
        .env("BACKEND_TIMEOUT_SECS", "5")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn login(client: &Client, base_url: &str) {
    let response = client
        .post(format!("{base_url}/api/login"))
        .json(&json!({ "email": "admin@example.test", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
}

async fn generate(client: &Client, base_url: &str, request: Value) -> ReportSummary {
    let response = client
        .post(format!("{base_url}/api/reports"))
        .json(&request)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    response.json().await.unwrap()
}

#[tokio::test]
async fn http_accessibility_report_lifecycle() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    login(&client, &server.base_url).await;

    let summary = generate(
        &client,
        &server.base_url,
        json!({ "type": "accessibility", "options": { "include_heatmap": false } }),
    )
    .await;
    assert_eq!(summary.title, "Accessibility Report");
    assert_eq!(summary.report_type, "accessibility");

    let download = client
        .get(format!("{}/api/reports/{}/download", server.base_url, summary.id))
        .send()
        .await
        .unwrap();
    assert!(download.status().is_success());
    let disposition = download
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.contains(&format!("Accessibility_Report_{}.html", summary.id)));

    let html = download.text().await.unwrap();
    assert!(html.contains("data-stat=\"total-locations\"><div class=\"stat-number\">3</div>"));
    assert!(html.contains("data-stat=\"accessible-locations\"><div class=\"stat-number\">1</div>"));
    assert!(html.contains("data-stat=\"non-accessible-locations\"><div class=\"stat-number\">2</div>"));
    assert!(!html.contains("id=\"heatmap\""));

    let deleted = client
        .delete(format!("{}/api/reports/{}", server.base_url, summary.id))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), reqwest::StatusCode::NO_CONTENT);

    let missing = client
        .get(format!("{}/api/reports/{}/download", server.base_url, summary.id))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    let again = client
        .delete(format!("{}/api/reports/{}", server.base_url, summary.id))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), reqwest::StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn http_full_report_summarises_empty_activity() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    login(&client, &server.base_url).await;

    let summary = generate(&client, &server.base_url, json!({ "type": "full" })).await;
    let html = client
        .get(format!("{}/api/reports/{}/download", server.base_url, summary.id))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(html.contains("data-stat=\"availability-rate\"><div class=\"stat-number\">0%</div>"));
    assert!(html.contains("Increase availability"));
    assert!(html.contains("Increase evaluations"));
    assert!(html.contains("<td>Unknown</td>"));
}

#[tokio::test]
async fn http_report_store_keeps_ten_newest_first() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    login(&client, &server.base_url).await;

    for _ in 0..11 {
        generate(&client, &server.base_url, json!({ "type": "volunteers" })).await;
    }

    let listed: Vec<Value> = client
        .get(format!("{}/api/reports", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 10);
    let stamps: Vec<DateTime<Utc>> = listed
        .iter()
        .map(|r| r["generated_at"].as_str().unwrap().parse().unwrap())
        .collect();
    assert!(stamps.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[tokio::test]
async fn http_rejects_bad_requests() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let wrong = client
        .post(format!("{}/api/login", server.base_url))
        .json(&json!({ "email": "admin@example.test", "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), reqwest::StatusCode::UNAUTHORIZED);

    login(&client, &server.base_url).await;
    let reversed = client
        .post(format!("{}/api/reports", server.base_url))
        .json(&json!({ "type": "full", "start_date": "2026-05-01", "end_date": "2026-01-01" }))
        .send()
        .await
        .unwrap();
    assert_eq!(reversed.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_backend_401_clears_session() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::builder()
        .redirect(redirect::Policy::none())
        .build()
        .unwrap();
    login(&client, &server.base_url).await;

    let me = client
        .get(format!("{}/api/me", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(me.status(), reqwest::StatusCode::UNAUTHORIZED);

    let reports = client
        .get(format!("{}/api/reports", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(reports.status(), reqwest::StatusCode::UNAUTHORIZED);

    let dashboard = client.get(format!("{}/", server.base_url)).send().await.unwrap();
    assert!(dashboard.status().is_redirection());
    assert_eq!(
        dashboard
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some("/login")
    );
}
