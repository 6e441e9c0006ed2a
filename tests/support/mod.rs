use std::fs;
use std::path::Path;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// An isolated data directory plus a command factory bound to it.
pub struct TestHome {
    dir: TempDir,
}

impl TestHome {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A `dg` invocation isolated to this home's data directory.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("dg").expect("dg binary");
        cmd.env("DG_DATA_DIR", self.dir.path());
        cmd.env_remove("DG_USER");
        cmd
    }

    /// Create a task through the CLI and return its id.
    pub fn new_task(&self, args: &[&str]) -> String {
        let mut full: Vec<&str> = vec!["new"];
        full.extend_from_slice(args);
        full.push("--json");
        let envelope = self.run_json(&full);
        envelope["data"]["id"]
            .as_str()
            .expect("task id")
            .to_string()
    }

    /// Run a command expecting success and parse its JSON envelope.
    pub fn run_json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).expect("json envelope")
    }

    /// Run a command expecting failure and parse its JSON error envelope.
    pub fn run_json_err(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(args)
            .assert()
            .failure()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).expect("json error envelope")
    }

    /// Parse the persisted task collection.
    pub fn tasks_json(&self) -> Value {
        let raw = fs::read_to_string(self.dir.path().join("tasks.json"))
            .expect("tasks.json present");
        serde_json::from_str(&raw).expect("tasks.json parses")
    }

    /// Rewrite one task's deadline in place. Deadlines in the past cannot
    /// be created through the CLI, so expiry scenarios edit storage.
    pub fn rewrite_deadline(&self, task_id: &str, deadline: &str) {
        let mut collection = self.tasks_json();
        let tasks = collection["tasks"].as_array_mut().expect("tasks array");
        let task = tasks
            .iter_mut()
            .find(|t| t["id"] == task_id)
            .expect("task in collection");
        task["deadline"] = Value::String(deadline.to_string());
        fs::write(
            self.dir.path().join("tasks.json"),
            serde_json::to_string_pretty(&collection).expect("serialize"),
        )
        .expect("write tasks.json");
    }
}
