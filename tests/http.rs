use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct CounterView {
    label: String,
    attempts: u64,
    locked: bool,
}

#[derive(Debug, Deserialize)]
struct TabView {
    id: u64,
    name: String,
    counters: Vec<CounterView>,
}

#[derive(Debug, Deserialize)]
struct TabsResponse {
    selected: Option<u64>,
    tabs: Vec<TabView>,
}

#[derive(Debug, Deserialize)]
struct SavedResponse {
    tab_name: String,
    file: String,
}

#[derive(Debug, Deserialize)]
struct RemovedResponse {
    tab_name: String,
    file_deleted: bool,
}

struct TestServer {
    base_url: String,
    save_dir: PathBuf,
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

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

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

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_save_dir() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "shiny_tracker_http_{}_{}",
        std::process::id(),
        nanos
    ));
    path
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/tabs")).send().await {
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
    let save_dir = unique_save_dir();
    let child = Command::new(env!("CARGO_BIN_EXE_shiny_tracker"))
        .env("PORT", port.to_string())
        .env("SHINY_SAVE_DIR", &save_dir)
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
        save_dir,
        child,
    }
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

async fn create_tab(client: &Client, base_url: &str, name: &str) -> TabView {
    client
        .post(format!("{base_url}/api/tabs"))
        .json(&serde_json::json!({ "name": name }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn add_counter(client: &Client, base_url: &str, tab: u64, name: &str) -> TabView {
    client
        .post(format!("{base_url}/api/tabs/{tab}/counters"))
        .json(&serde_json::json!({ "name": name }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn counter_op(
    client: &Client,
    base_url: &str,
    tab: u64,
    index: usize,
    op: &str,
) -> reqwest::Response {
    client
        .post(format!("{base_url}/api/tabs/{tab}/counters/{index}/{op}"))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_counter_increments_and_floors_at_zero() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let tab = create_tab(&client, &server.base_url, "Hunt Floor").await;
    add_counter(&client, &server.base_url, tab.id, "Gible").await;

    counter_op(&client, &server.base_url, tab.id, 0, "increment").await;
    counter_op(&client, &server.base_url, tab.id, 0, "increment").await;
    let after_dec: CounterView = counter_op(&client, &server.base_url, tab.id, 0, "decrement")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(after_dec.attempts, 1);

    counter_op(&client, &server.base_url, tab.id, 0, "decrement").await;
    let floored: CounterView = counter_op(&client, &server.base_url, tab.id, 0, "decrement")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(floored.attempts, 0);
    assert!(!floored.locked);
}

#[tokio::test]
async fn http_obtained_locks_with_announcement() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let tab = create_tab(&client, &server.base_url, "Hunt Lock").await;
    let with_counter = add_counter(&client, &server.base_url, tab.id, "Magikarp").await;
    assert_eq!(with_counter.counters.len(), 1);
    counter_op(&client, &server.base_url, tab.id, 0, "increment").await;

    let locked: CounterView = counter_op(&client, &server.base_url, tab.id, 0, "obtained")
        .await
        .json()
        .await
        .unwrap();
    assert!(locked.locked);
    assert_eq!(locked.label, "Shiny Magikarp obtained in 1 try!");

    let again = counter_op(&client, &server.base_url, tab.id, 0, "obtained").await;
    assert_eq!(again.status(), reqwest::StatusCode::CONFLICT);

    let frozen: CounterView = counter_op(&client, &server.base_url, tab.id, 0, "increment")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(frozen.attempts, 1);
}

#[tokio::test]
async fn http_save_writes_file_and_duplicate_load_is_rejected() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let tab = create_tab(&client, &server.base_url, "Hunt Saved").await;
    add_counter(&client, &server.base_url, tab.id, "Snorlax").await;

    let saved: SavedResponse = client
        .post(format!("{}/api/tabs/{}/save", server.base_url, tab.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(saved.tab_name, "Hunt Saved");
    assert!(server.save_dir.join("hunt_saved.json").exists());
    assert!(saved.file.ends_with("hunt_saved.json"));

    let response = client
        .post(format!("{}/api/tabs/load", server.base_url))
        .json(&serde_json::json!({ "file": "hunt_saved.json" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CONFLICT);

    // The rejected load re-selects the already-open tab.
    let tabs: TabsResponse = client
        .get(format!("{}/api/tabs", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tabs.selected, Some(tab.id));
}

#[tokio::test]
async fn http_remove_deletes_tab_and_save_file() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let tab = create_tab(&client, &server.base_url, "Hunt Removed").await;
    client
        .post(format!("{}/api/tabs/{}/save", server.base_url, tab.id))
        .send()
        .await
        .unwrap();
    assert!(server.save_dir.join("hunt_removed.json").exists());

    let removed: RemovedResponse = client
        .delete(format!("{}/api/tabs/{}", server.base_url, tab.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(removed.tab_name, "Hunt Removed");
    assert!(removed.file_deleted);
    assert!(!server.save_dir.join("hunt_removed.json").exists());

    let tabs: TabsResponse = client
        .get(format!("{}/api/tabs", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(tabs.tabs.iter().all(|t| t.name != "Hunt Removed"));
}

#[tokio::test]
async fn http_save_of_missing_tab_is_not_found() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/tabs/999999/save", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}
