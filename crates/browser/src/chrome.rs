//! Chrome process management - spawning and DevTools endpoint checking

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use serde::Deserialize;
use tempfile::TempDir;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use cartwheel_core::config::BrowserOptions;
use cartwheel_core::error::{Error, Result};

/// How long the DevTools endpoint gets to come up before launch fails.
const STARTUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Binaries tried on PATH when no explicit one is configured.
const CHROME_CANDIDATES: &[&str] = &["google-chrome", "chromium", "chromium-browser"];

/// Handle to a running Chrome process with its DevTools endpoint.
pub struct ChromeSession {
    child: Child,
    /// Profile directory, removed when the session is dropped.
    _profile: TempDir,
    pub port: u16,
    ws_url: String,
}

impl ChromeSession {
    /// Spawn Chrome with remote debugging on a free port and wait until
    /// the DevTools endpoint answers. Any failure here is fatal to the
    /// run; the caller does not retry.
    pub async fn launch(options: &BrowserOptions) -> Result<Self> {
        let binary = chrome_binary(options)?;
        let port = find_free_port()?;
        let profile = TempDir::new()?;

        info!("Spawning {} with DevTools on port {}", binary.display(), port);

        let mut cmd = Command::new(&binary);
        cmd.arg(format!("--remote-debugging-port={}", port))
            .arg(format!("--user-data-dir={}", profile.path().display()))
            .arg("--no-sandbox")
            .arg("--disable-webusb")
            .arg("--disable-gpu")
            .arg("--log-level=1")
            .arg("--window-size=1366,900")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        if options.headless {
            cmd.arg("--headless=new");
        }
        for extra in &options.extra_args {
            cmd.arg(extra);
        }
        cmd.arg("about:blank");

        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|e| {
            Error::Launch(format!("failed to spawn {}: {}", binary.display(), e))
        })?;

        let mut session = ChromeSession {
            child,
            _profile: profile,
            port,
            ws_url: String::new(),
        };

        if let Err(e) = session.wait_for_devtools(STARTUP_TIMEOUT).await {
            let _ = session.stop();
            return Err(e);
        }
        session.ws_url = session.first_page_target().await?;

        info!("DevTools ready at port {}", port);
        Ok(session)
    }

    /// WebSocket URL of the page target to drive.
    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Poll the version endpoint until DevTools answers.
    async fn wait_for_devtools(&self, timeout: Duration) -> Result<()> {
        let version_url = format!("http://127.0.0.1:{}/json/version", self.port);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| Error::Launch(e.to_string()))?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout {
            attempts += 1;

            match client.get(&version_url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                Ok(resp) => {
                    warn!("DevTools version check returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for Chrome to start...");
                    }
                    // Connection refused is expected while Chrome starts
                    if !e.is_connect() {
                        warn!("DevTools check error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        Err(Error::DevtoolsTimeout {
            seconds: timeout.as_secs(),
        })
    }

    /// Pick the first page target the browser exposes.
    async fn first_page_target(&self) -> Result<String> {
        #[derive(Deserialize)]
        struct Target {
            #[serde(rename = "type")]
            target_type: String,
            #[serde(rename = "webSocketDebuggerUrl")]
            ws_url: Option<String>,
        }

        let list_url = format!("http://127.0.0.1:{}/json/list", self.port);
        let targets: Vec<Target> = reqwest::get(&list_url)
            .await
            .map_err(|e| Error::Launch(format!("target list: {}", e)))?
            .json()
            .await
            .map_err(|e| Error::Launch(format!("target list: {}", e)))?;

        targets
            .into_iter()
            .find(|t| t.target_type == "page")
            .and_then(|t| t.ws_url)
            .ok_or_else(|| Error::Launch("no page target exposed by the browser".to_string()))
    }

    /// Stop the browser, SIGTERM first, then kill.
    pub fn stop(&mut self) -> Result<()> {
        debug!("Stopping Chrome (pid: {})", self.child.id());

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        let _ = self.child.kill();
        let _ = self.child.wait();

        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// The configured binary, or the first candidate found on PATH.
fn chrome_binary(options: &BrowserOptions) -> Result<PathBuf> {
    if let Some(binary) = &options.binary {
        return Ok(binary.clone());
    }
    for candidate in CHROME_CANDIDATES {
        if let Some(path) = search_path(candidate) {
            return Ok(path);
        }
    }
    Err(Error::Launch(
        "no Chrome binary on PATH; set browser.binary".to_string(),
    ))
}

fn search_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Find a free port to use
fn find_free_port() -> Result<u16> {
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_ports_are_unprivileged() {
        let port1 = find_free_port().unwrap();
        let port2 = find_free_port().unwrap();

        assert!(port1 > 1024);
        assert!(port2 > 1024);
    }

    #[test]
    fn explicit_binary_wins_over_path_search() {
        let mut options = BrowserOptions::default();
        options.binary = Some(PathBuf::from("/opt/chrome/chrome"));
        assert_eq!(
            chrome_binary(&options).unwrap(),
            PathBuf::from("/opt/chrome/chrome")
        );
    }
}
