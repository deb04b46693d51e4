use serde_json::{Value, json};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// A throwaway git repository with one seed commit.
pub struct GitRepo {
    pub dir: TempDir,
}

impl GitRepo {
    pub fn new(branch: &str) -> Self {
        crate::test_log!("FIXTURE: Creating git repo on {}", branch);

        let dir = TempDir::new().expect("Failed to create temp dir");
        let repo = Self { dir };
        repo.git(&["init", "-q"]);
        repo.git(&["config", "user.email", "hooks@test.local"]);
        repo.git(&["config", "user.name", "Hook Tests"]);
        repo.git(&["config", "commit.gpgsign", "false"]);
        repo.git(&["symbolic-ref", "HEAD", &format!("refs/heads/{branch}")]);
        repo.write("README.md", "seed\n");
        repo.git(&["add", "README.md"]);
        repo.git(&["commit", "-q", "-m", "chore: seed"]);
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn git(&self, args: &[&str]) {
        let output = Command::new("git")
            .arg("-C")
            .arg(self.path())
            .args(args)
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, contents).expect("Failed to write file");
        path
    }

    pub fn commit(&self, relative: &str, contents: &str, message: &str) {
        self.write(relative, contents);
        self.git(&["add", relative]);
        self.git(&["commit", "-q", "-m", message]);
    }

    pub fn stage(&self, relative: &str, contents: &str) {
        self.write(relative, contents);
        self.git(&["add", relative]);
    }

    /// Write the three milestone documents with passing content.
    pub fn write_milestone_docs(&self, milestone: &str) {
        let body = format!("# Notes\n\n{}", "content ".repeat(20));
        self.write(&format!("milestones/{milestone}/scope.md"), &body);
        self.write(&format!("milestones/{milestone}/code_review.md"), &body);
        self.write(
            &format!("milestones/{milestone}/verification.md"),
            &format!("## Test Results\nok\n## Lint Results\nok\n## Build Results\nok\n{body}"),
        );
    }

    /// Run `mgate <args>` with `payload` on stdin from inside the repo.
    pub fn run_mgate(&self, args: &[&str], payload: &str) -> Output {
        let mut child = Command::new(env!("CARGO_BIN_EXE_mgate"))
            .args(args)
            .current_dir(self.path())
            .env_remove("MGATE_LOG_FILE")
            .env_remove("MGATE_PROTECTED_BRANCHES")
            .env_remove("MGATE_MILESTONE_PREFIX")
            .env_remove("MGATE_MIN_DOC_BYTES")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to start mgate");

        {
            let stdin = child.stdin.as_mut().expect("Failed to open stdin");
            stdin
                .write_all(payload.as_bytes())
                .expect("Failed to write hook input");
        }

        child.wait_with_output().expect("Failed to read mgate output")
    }

    pub fn hook(&self, payload: &Value) -> Output {
        self.run_mgate(&["hook"], &payload.to_string())
    }
}

pub fn bash_payload(command: &str) -> Value {
    json!({"tool_name": "Bash", "tool_input": {"command": command}})
}

pub fn write_payload(tool: &str, file_path: &str) -> Value {
    json!({"tool_name": tool, "tool_input": {"file_path": file_path, "content": "x"}})
}
