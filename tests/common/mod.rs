#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Mutex;

use tempfile::TempDir;
use tokio::sync::oneshot;

use darshan::error::{DarshanError, Result};
use darshan::remote::{ListParams, Paginated, RemoteApi};
use darshan::types::{ItemId, Resource};

/// Test fixture that runs the binary against an isolated config root
pub struct DarshanTest {
    pub temp_dir: TempDir,
    pub binary_path: PathBuf,
}

impl DarshanTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        Self {
            temp_dir,
            binary_path: PathBuf::from(env!("CARGO_BIN_EXE_darshan")),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.temp_dir.path().join(".darshan")
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.binary_path);
        cmd.args(args)
            .current_dir(self.temp_dir.path())
            .env("DARSHAN_ROOT", self.root())
            .env("NO_COLOR", "1")
            .env_remove("DARSHAN_API_URL")
            .env_remove("DARSHAN_API_TOKEN")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Run a command and return the raw output
    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args).output().expect("Failed to execute command")
    }

    /// Run a command with extra environment variables
    pub fn run_with_env(&self, args: &[&str], envs: &[(&str, &str)]) -> Output {
        let mut cmd = self.command(args);
        for (key, value) in envs {
            cmd.env(key, value);
        }
        cmd.output().expect("Failed to execute command")
    }

    /// Run a command and assert it succeeds, returning stdout
    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command failed: {:?}\nstdout: {}\nstderr: {}",
                args,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Run a command and assert it fails, returning stderr
    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Expected command to fail: {:?}\nstdout: {}",
            args,
            String::from_utf8_lossy(&output.stdout)
        );
        String::from_utf8_lossy(&output.stderr).into_owned()
    }

    /// Run a command with `--json` and parse stdout
    pub fn run_json(&self, args: &[&str]) -> serde_json::Value {
        let mut full: Vec<&str> = args.to_vec();
        full.push("--json");
        let stdout = self.run_success(&full);
        serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("invalid JSON ({e}): {stdout}"))
    }

    /// Write a raw config file under the test root
    pub fn write_config(&self, contents: &str) {
        let root = self.root();
        fs::create_dir_all(&root).expect("Failed to create config root");
        fs::write(root.join("config.yaml"), contents).expect("Failed to write config");
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("config.yaml")
    }

    pub fn file_exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

impl Default for DarshanTest {
    fn default() -> Self {
        Self::new()
    }
}

type ListReply<T> = oneshot::Sender<Result<Paginated<T>>>;
type UpdateReply<T> = oneshot::Sender<Result<T>>;

/// Remote API whose calls stay pending until the test answers them.
///
/// Lets a test decide the order in which concurrent responses arrive.
pub struct GatedApi<T: Resource> {
    lists: Mutex<Vec<(ListParams, ListReply<T>)>>,
    updates: Mutex<Vec<(ItemId, UpdateReply<T>)>>,
    /// When set, list calls answer immediately with this page
    auto_list: Option<Paginated<T>>,
}

impl<T: Resource> GatedApi<T> {
    pub fn new() -> Self {
        Self {
            lists: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            auto_list: None,
        }
    }

    pub fn with_auto_list(page: Paginated<T>) -> Self {
        Self {
            auto_list: Some(page),
            ..Self::new()
        }
    }

    /// Pages of the list calls still waiting, in call order
    pub fn pending_list_pages(&self) -> Vec<u32> {
        self.lists.lock().unwrap().iter().map(|(p, _)| p.page).collect()
    }

    /// Ids of the update calls still waiting, in call order
    pub fn pending_update_ids(&self) -> Vec<ItemId> {
        self.updates.lock().unwrap().iter().map(|(id, _)| *id).collect()
    }

    /// Answer the oldest pending list call for `page`
    pub fn release_list(&self, page: u32, response: Result<Paginated<T>>) {
        let mut lists = self.lists.lock().unwrap();
        let index = lists
            .iter()
            .position(|(p, _)| p.page == page)
            .unwrap_or_else(|| panic!("no pending list call for page {page}"));
        let (_, reply) = lists.remove(index);
        let _ = reply.send(response);
    }

    /// Answer the oldest pending update call for `id`
    pub fn release_update(&self, id: ItemId, response: Result<T>) {
        let mut updates = self.updates.lock().unwrap();
        let index = updates
            .iter()
            .position(|(pending, _)| *pending == id)
            .unwrap_or_else(|| panic!("no pending update call for {id}"));
        let (_, reply) = updates.remove(index);
        let _ = reply.send(response);
    }
}

impl<T: Resource> Default for GatedApi<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn dropped() -> DarshanError {
    DarshanError::Network("response dropped by test".to_string())
}

impl<T: Resource> RemoteApi<T> for GatedApi<T> {
    async fn list(&self, params: &ListParams) -> Result<Paginated<T>> {
        if let Some(page) = &self.auto_list {
            return Ok(page.clone());
        }
        let (tx, rx) = oneshot::channel();
        self.lists.lock().unwrap().push((params.clone(), tx));
        rx.await.unwrap_or_else(|_| Err(dropped()))
    }

    async fn create(&self, _draft: &T::Draft) -> Result<T> {
        Err(DarshanError::Api("create is not gated".to_string()))
    }

    async fn update(&self, id: ItemId, _patch: &T::Patch) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.updates.lock().unwrap().push((id, tx));
        rx.await.unwrap_or_else(|_| Err(dropped()))
    }

    async fn delete(&self, id: ItemId) -> Result<()> {
        Err(DarshanError::NotFound(format!("{} {id}", T::NAME)))
    }
}

/// Yield to the runtime until `condition` holds
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
