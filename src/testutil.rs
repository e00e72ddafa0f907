#![cfg(test)]

use chrono::{Duration, Utc};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread::JoinHandle;
use tempfile::TempDir;

pub struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn run_git(repo: &Path, args: &[&str], date: Option<&str>) {
        let mut cmd = Command::new("git");
        cmd.args(args)
            .current_dir(repo)
            .env("GIT_AUTHOR_NAME", "Test")
            .env("GIT_AUTHOR_EMAIL", "test@test.com")
            .env("GIT_COMMITTER_NAME", "Test")
            .env("GIT_COMMITTER_EMAIL", "test@test.com");
        if let Some(date) = date {
            cmd.env("GIT_AUTHOR_DATE", date).env("GIT_COMMITTER_DATE", date);
        }
        let output = cmd.output().expect("failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    pub fn create_repo(&self, name: &str) -> PathBuf {
        let repo_path = self.dir.path().join(name);
        std::fs::create_dir_all(&repo_path).unwrap();
        Self::run_git(&repo_path, &["init"], None);
        Self::run_git(&repo_path, &["commit", "--allow-empty", "-m", "initial"], None);
        repo_path
    }

    /// A repo whose only commit is `days` days in the past, for staleness
    /// scenarios.
    pub fn create_repo_last_commit_days_ago(&self, name: &str, days: i64) -> PathBuf {
        let repo_path = self.dir.path().join(name);
        std::fs::create_dir_all(&repo_path).unwrap();
        // Git's raw date format; RFC 3339 with fractional seconds is not
        // universally accepted by older gits.
        let date = format!("@{} +0000", (Utc::now() - Duration::days(days)).timestamp());
        Self::run_git(&repo_path, &["init"], None);
        Self::run_git(
            &repo_path,
            &["commit", "--allow-empty", "-m", "initial"],
            Some(&date),
        );
        repo_path
    }

    pub fn add_origin(&self, repo: &Path, url: &str) {
        Self::run_git(repo, &["remote", "add", "origin", url], None);
    }

    pub fn commit_count(&self, repo: &Path) -> usize {
        let output = Command::new("git")
            .args(["rev-list", "--count", "HEAD"])
            .current_dir(repo)
            .output()
            .expect("failed to run git rev-list");
        String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse()
            .expect("rev-list output was not a number")
    }
}

/// RAII guard that sets (or clears) environment variables for a test and
/// restores the previous values on drop. Tests using it must be `#[serial]`
/// because the environment is process-global.
pub struct EnvGuard {
    saved: Vec<(&'static str, Option<String>)>,
}

impl EnvGuard {
    pub fn set(vars: &[(&'static str, Option<&str>)]) -> Self {
        let mut saved = Vec::new();
        for (name, value) in vars {
            saved.push((*name, std::env::var(name).ok()));
            match value {
                Some(v) => std::env::set_var(name, v),
                None => std::env::remove_var(name),
            }
        }
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (name, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(name, v),
                None => std::env::remove_var(name),
            }
        }
    }
}

/// One-thread HTTP stub standing in for the enable-workflow endpoint.
/// Answers 204 to every request except paths containing "broken", which get
/// a 500 with a short body. `finish` joins the thread and returns the request
/// lines it saw.
pub struct StubApi {
    addr: std::net::SocketAddr,
    handle: JoinHandle<Vec<String>>,
}

impl StubApi {
    pub fn start(expected_requests: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind stub listener");
        let addr = listener.local_addr().unwrap();
        let handle = std::thread::spawn(move || {
            let mut request_lines = Vec::new();
            for _ in 0..expected_requests {
                let (mut stream, _) = listener.accept().expect("stub accept failed");
                let mut buf = vec![0u8; 8192];
                let mut read = 0;
                loop {
                    let n = stream.read(&mut buf[read..]).expect("stub read failed");
                    read += n;
                    if n == 0 || buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let request = String::from_utf8_lossy(&buf[..read]).to_string();
                let request_line = request.lines().next().unwrap_or("").to_string();
                let response: &str = if request_line.contains("broken") {
                    "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 4\r\nconnection: close\r\n\r\noops"
                } else {
                    "HTTP/1.1 204 No Content\r\nconnection: close\r\n\r\n"
                };
                stream
                    .write_all(response.as_bytes())
                    .expect("stub write failed");
                request_lines.push(request_line);
            }
            request_lines
        });
        Self { addr, handle }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn finish(self) -> Vec<String> {
        self.handle.join().expect("stub thread panicked")
    }
}
