#[cfg(windows)]
use std::os::windows::process::CommandExt;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Keeps probe processes (such as `opencode -v`) from flashing a console
/// window on Windows. A no-op elsewhere.
pub trait HideWindow {
    fn hide_window(&mut self) -> &mut Self;
}

impl HideWindow for tokio::process::Command {
    #[cfg(windows)]
    fn hide_window(&mut self) -> &mut Self {
        self.creation_flags(CREATE_NO_WINDOW)
    }

    #[cfg(not(windows))]
    fn hide_window(&mut self) -> &mut Self {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::HideWindow;

    #[test]
    fn hide_window_returns_same_command_for_chaining() {
        let mut cmd = tokio::process::Command::new("opencode");
        let before = &mut cmd as *mut tokio::process::Command;
        let after = cmd.arg("-v").hide_window() as *mut tokio::process::Command;
        assert_eq!(before, after);
    }
}
