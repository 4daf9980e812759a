use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::{Value, json};
use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::time::sleep;

struct TestServer {
    base_url: String,
    run_dir: PathBuf,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.run_dir);
    }
}

#[cfg(unix)]
mod cleanup {
    use once_cell::sync::Lazy;
    use std::sync::{Mutex, Once};

    static REGISTER: Once = Once::new();
    static PIDS: Lazy<Mutex<Vec<i32>>> = Lazy::new(|| Mutex::new(Vec::new()));

    pub fn register(pid: u32) {
        REGISTER.call_once(|| unsafe {
            libc::atexit(on_exit);
        });
        PIDS.lock().unwrap().push(pid as i32);
    }

    extern "C" fn on_exit() {
        if let Ok(pids) = PIDS.lock() {
            for pid in pids.iter() {
                unsafe {
                    libc::kill(*pid, libc::SIGTERM);
                }
            }
        }
    }
}

static PORT_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

fn pick_free_port() -> u16 {
    let _guard = PORT_LOCK.lock().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_run_dir() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("mcas_tracker_http_{}_{}", std::process::id(), nanos));
    path
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/symptoms")).send().await {
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
    let run_dir = unique_run_dir();
    std::fs::create_dir_all(&run_dir).expect("create run dir");
    spawn_server_in(run_dir).await
}

async fn spawn_server_in(run_dir: PathBuf) -> TestServer {
    let port = pick_free_port();

    let child = Command::new(env!("CARGO_BIN_EXE_mcas_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", run_dir.join("tracker.json"))
        .env("ASSET_ROOT", run_dir.join("assets"))
        .env("CACHE_DIR", run_dir.join("cache"))
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer {
        base_url,
        run_dir,
        child,
    }
}

fn symptom_payload(timestamp: &str, symptom: &str) -> Value {
    json!({
        "timestamp": timestamp,
        "symptom_type": symptom,
        "severity": "6",
        "duration_minutes": "45",
        "associated_triggers": "heat, stress",
        "relief_measures": "cold shower"
    })
}

#[tokio::test]
async fn http_add_symptom_lists_newest_first() {
    let server = spawn_server().await;
    let client = Client::new();
    let url = format!("{}/api/symptoms", server.base_url);

    let before: Vec<Value> = client.get(&url).send().await.unwrap().json().await.unwrap();

    let stored: Value = client
        .post(&url)
        .json(&symptom_payload("2026-08-02T09:00", "Flushing"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored["log_id"], 1);
    assert_eq!(stored["associated_triggers"], json!(["heat", "stress"]));
    assert_eq!(stored["user_id"], "default_user");

    // Older entry submitted second must not displace the newest.
    client
        .post(&url)
        .json(&symptom_payload("2026-08-01T09:00", "Hives"))
        .send()
        .await
        .unwrap();

    let after: Vec<Value> = client.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(after.len(), before.len() + 2);
    assert_eq!(after[0]["timestamp"], "2026-08-02T09:00");
    assert_eq!(after[1]["timestamp"], "2026-08-01T09:00");
}

#[tokio::test]
async fn http_rejects_out_of_range_severity() {
    let server = spawn_server().await;
    let client = Client::new();

    let mut payload = symptom_payload("2026-08-02T09:00", "Flushing");
    payload["severity"] = json!("11");
    let response = client
        .post(format!("{}/api/symptoms", server.base_url))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let listed: Vec<Value> = client
        .get(format!("{}/api/symptoms", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn http_sleep_duration_derived_from_interval() {
    let server = spawn_server().await;
    let client = Client::new();
    let url = format!("{}/api/sleep", server.base_url);

    let stored: Value = client
        .post(&url)
        .json(&json!({
            "start_time": "2026-08-01T23:00",
            "end_time": "2026-08-02T07:30",
            "quality": "4",
            "disturbances": "itching",
            "notes": ""
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored["duration_hours"], json!(8.5));

    let inverted: Value = client
        .post(&url)
        .json(&json!({
            "start_time": "2026-08-02T07:30",
            "end_time": "2026-08-01T23:00",
            "quality": "2",
            "disturbances": "",
            "notes": ""
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(inverted["duration_hours"], Value::Null);
}

#[tokio::test]
async fn http_export_empty_collection_reports_no_data() {
    let server = spawn_server().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/api/mood/export", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    assert!(response.headers().get("content-disposition").is_none());
    let body = response.text().await.unwrap();
    assert!(body.contains("no mood entry data"), "body was: {body}");
}

#[tokio::test]
async fn http_export_diet_csv_escapes_fields() {
    let server = spawn_server().await;
    let client = Client::new();

    client
        .post(format!("{}/api/diet", server.base_url))
        .json(&json!({
            "timestamp": "2026-08-02T12:30",
            "meal_type": "Lunch",
            "foods": "milk, eggs",
            "perceived_histamine_level": "High",
            "notes": "ate out, \"spicy\" sauce"
        }))
        .send()
        .await
        .unwrap();

    let response = client
        .get(format!("{}/api/diet/export", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("mcas_diet_log.csv"));

    let body = response.text().await.unwrap();
    let mut lines = body.lines();
    assert_eq!(
        lines.next().unwrap(),
        "meal_id,user_id,timestamp,meal_type,foods,perceived_histamine_level,notes"
    );
    let row = lines.next().unwrap();
    assert!(row.contains("milk;eggs"), "row was: {row}");
    assert!(
        row.contains("\"ate out, \"\"spicy\"\" sauce\""),
        "row was: {row}"
    );
}

#[tokio::test]
async fn http_offline_serves_cached_shell() {
    let server = spawn_server().await;
    let client = Client::new();

    let script_before = client
        .get(format!("{}/app.js", server.base_url))
        .send()
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();

    // Take the origin away; the precached bucket must keep serving.
    std::fs::remove_dir_all(server.run_dir.join("assets")).unwrap();

    let page = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(page.status(), 200);
    let html = page.text().await.unwrap();
    assert!(html.contains("MCAS Tracker"));

    let script_after = client
        .get(format!("{}/app.js", server.base_url))
        .send()
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(script_before, script_after);
}

#[tokio::test]
async fn http_push_payload_resolves_with_defaults() {
    let server = spawn_server().await;
    let client = Client::new();

    let note: Value = client
        .post(format!("{}/api/push", server.base_url))
        .json(&json!({}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(note["title"], "MCAS Tracker Reminder");
    assert_eq!(note["url"], "/");

    let sync = client
        .post(format!("{}/api/sync", server.base_url))
        .json(&json!({ "tag": "sync-new-logs" }))
        .send()
        .await
        .unwrap();
    assert_eq!(sync.status(), 202);
}

#[tokio::test]
async fn http_unreadable_data_file_is_set_aside_before_first_persist() {
    let run_dir = unique_run_dir();
    std::fs::create_dir_all(&run_dir).unwrap();
    std::fs::write(
        run_dir.join("tracker.json"),
        "{not valid json: prior records",
    )
    .unwrap();

    let server = spawn_server_in(run_dir).await;
    let client = Client::new();

    client
        .post(format!("{}/api/mood", server.base_url))
        .json(&json!({
            "timestamp": "2026-08-02T18:00",
            "emotional_state": "Calm",
            "severity": "2",
            "cognitive_symptoms": "",
            "psychosocial_stressors": "",
            "notes": ""
        }))
        .send()
        .await
        .unwrap();

    // The old bytes must survive the write, under the quarantine name.
    let kept = std::fs::read_to_string(server.run_dir.join("tracker.json.corrupt")).unwrap();
    assert!(kept.contains("prior records"), "kept was: {kept}");

    let fresh = std::fs::read_to_string(server.run_dir.join("tracker.json")).unwrap();
    assert!(fresh.contains("Calm"), "fresh was: {fresh}");
}

#[tokio::test]
async fn http_records_survive_restart() {
    let mut server = spawn_server().await;
    let client = Client::new();

    client
        .post(format!("{}/api/mood", server.base_url))
        .json(&json!({
            "timestamp": "2026-08-02T18:00",
            "emotional_state": "Calm",
            "severity": "2",
            "cognitive_symptoms": "",
            "psychosocial_stressors": "",
            "notes": "quiet day"
        }))
        .send()
        .await
        .unwrap();

    // Restart against the same data file.
    let _ = server.child.kill();
    let _ = server.child.wait();
    let port = pick_free_port();
    server.child = Command::new(env!("CARGO_BIN_EXE_mcas_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", server.run_dir.join("tracker.json"))
        .env("ASSET_ROOT", server.run_dir.join("assets"))
        .env("CACHE_DIR", server.run_dir.join("cache"))
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to respawn server");
    server.base_url = format!("http://127.0.0.1:{port}");
    #[cfg(unix)]
    cleanup::register(server.child.id());
    wait_until_ready(&server.base_url).await;

    let listed: Vec<Value> = client
        .get(format!("{}/api/mood", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["mood_id"], 1);
    assert_eq!(listed[0]["notes"], "quiet day");
}
