use std::io::Write;
use std::process::{Command, ExitStatus, Stdio};

// ---------------------------------------------------------------------------
// Clipboard
// ---------------------------------------------------------------------------

/// Copy text to the system clipboard.
pub(crate) fn copy_to_clipboard(text: &str) -> Result<(), String> {
    let result = if cfg!(target_os = "macos") {
        pipe_to("pbcopy", &[], text)
    } else if cfg!(target_os = "linux") {
        // Try wl-copy under Wayland, then xclip, then xsel.
        pipe_to("wl-copy", &[], text)
            .or_else(|_| pipe_to("xclip", &["-selection", "clipboard"], text))
            .or_else(|_| pipe_to("xsel", &["--clipboard", "--input"], text))
    } else {
        return Err("Clipboard not supported on this platform".to_owned());
    };

    match result {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(format!("Clipboard command exited with {status}")),
        Err(e) => Err(format!("Failed to run clipboard command: {e}")),
    }
}

fn pipe_to(program: &str, args: &[&str], text: &str) -> std::io::Result<ExitStatus> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .spawn()?;
    if let Some(stdin) = child.stdin.as_mut() {
        stdin.write_all(text.as_bytes())?;
    }
    // Close stdin so the tool sees EOF.
    drop(child.stdin.take());
    child.wait()
}

// ---------------------------------------------------------------------------
// Open in browser
// ---------------------------------------------------------------------------

/// Open a URL in the default browser.
pub(crate) fn open_in_browser(url: &str) -> Result<(), String> {
    let result = if cfg!(target_os = "macos") {
        Command::new("open").arg(url).status()
    } else if cfg!(target_os = "linux") {
        Command::new("xdg-open").arg(url).status()
    } else {
        return Err("Browser open not supported on this platform".to_owned());
    };

    match result {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(format!("Browser command exited with {status}")),
        Err(e) => Err(format!("Failed to open browser: {e}")),
    }
}
