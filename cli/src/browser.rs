//! The automation scripts attach to a browser through its remote debugger.
//! Before a single-video job, make sure one is listening, and start one if not.
//! Finished reports and downloads are shown with the desktop's own opener.

use std::{
    io,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};
use tokio::{net::TcpStream, process::Command, time};
use tracing::{debug, info};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
/// Time a freshly started browser needs before its debugger accepts connections.
pub const STARTUP_DELAY: Duration = Duration::from_secs(3);

pub async fn debugger_listening(port: u16) -> bool {
    match time::timeout(CONNECT_TIMEOUT, TcpStream::connect(("127.0.0.1", port))).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!(port, error = %e, "no browser debugger");
            false
        }
        Err(_) => false,
    }
}

/// The browser to start: `explicit` if it exists, otherwise the first
/// standard install location that does.
pub fn find_chrome(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()).filter(|path| path.exists()),
        None => default_locations().into_iter().find(|path| path.exists()),
    }
}

fn default_locations() -> Vec<PathBuf> {
    if cfg!(windows) {
        let mut paths = vec![
            PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
            PathBuf::from(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe"),
        ];
        if let Some(local) = std::env::var_os("LOCALAPPDATA") {
            paths.push(PathBuf::from(local).join(r"Google\Chrome\Application\chrome.exe"));
        }
        paths
    } else if cfg!(target_os = "macos") {
        vec![PathBuf::from(
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        )]
    } else {
        ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"]
            .iter()
            .map(|name| Path::new("/usr/bin").join(name))
            .collect()
    }
}

/// Start the browser with remote debugging on `port`, detached from us.
pub fn launch_chrome(chrome: &Path, port: u16, profile: &Path) -> io::Result<()> {
    let child = Command::new(chrome)
        .arg(format!("--remote-debugging-port={}", port))
        .arg(format!("--user-data-dir={}", profile.display()))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    info!(pid = ?child.id(), chrome = %chrome.display(), port, "started browser");
    Ok(())
}

fn desktop_opener() -> &'static str {
    if cfg!(windows) {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

/// Show a file or folder with the default application, without waiting for it.
pub fn open_with_desktop(path: &Path) -> io::Result<()> {
    let opener = desktop_opener();
    let child = Command::new(opener)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    debug!(pid = ?child.id(), opener, path = %path.display(), "opened with desktop");
    Ok(())
}
