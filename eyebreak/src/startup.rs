/// Per-user launch-at-login registration.
///
/// Registration is a single line referencing the executable inside a
/// per-user autostart file:
///   - Windows: `open.bat` in the Start Menu `Startup` folder, line `start "" "<exe>"`.
///   - Elsewhere: an XDG autostart desktop entry, line `Exec="<exe>"`.
///
/// The file may hold entries for other programs. [`StartupEntry::add`] appends
/// only when the exact line is absent, and [`StartupEntry::remove`] deletes only
/// that line. A file left holding nothing but its preamble is deleted, so an
/// add followed by a remove leaves the disk as it was.
use std::io;
use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(
        "permission denied writing {}; run EyeBreak with sufficient privileges or fix the file's permissions",
        path.display()
    )]
    PermissionDenied { path: PathBuf },
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not locate the per-user autostart directory")]
    NoAutostartDir,
    #[error("failed to locate the running executable: {0}")]
    NoExecutable(#[source] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotPresent,
}

/// One launch line inside a shared autostart file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupEntry {
    path: PathBuf,
    line: String,
    /// Lines written ahead of the entry when the file is first created.
    preamble: Vec<String>,
}

// ── Platform layout ───────────────────────────────────────────────────────────

#[cfg(windows)]
mod imp {
    use std::path::{Path, PathBuf};

    pub const PREAMBLE: &[&str] = &[];

    /// `%APPDATA%\Microsoft\Windows\Start Menu\Programs\Startup\open.bat`
    pub fn autostart_file() -> Option<PathBuf> {
        dirs::data_dir().map(|appdata| {
            appdata
                .join("Microsoft")
                .join("Windows")
                .join("Start Menu")
                .join("Programs")
                .join("Startup")
                .join("open.bat")
        })
    }

    pub fn launch_line(exe: &Path) -> String {
        format!("start \"\" \"{}\"", exe.display())
    }
}

#[cfg(not(windows))]
mod imp {
    use std::path::{Path, PathBuf};

    /// The UI needs a tty, so the session must open a terminal for it.
    pub const PREAMBLE: &[&str] = &[
        "[Desktop Entry]",
        "Type=Application",
        "Name=EyeBreak",
        "Terminal=true",
    ];

    /// `$XDG_CONFIG_HOME/autostart/eyebreak.desktop`
    pub fn autostart_file() -> Option<PathBuf> {
        dirs::config_dir().map(|config| config.join("autostart").join("eyebreak.desktop"))
    }

    pub fn launch_line(exe: &Path) -> String {
        format!("Exec=\"{}\"", exe.display())
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

impl StartupEntry {
    pub fn new(path: impl Into<PathBuf>, line: impl Into<String>, preamble: &[&str]) -> Self {
        Self {
            path: path.into(),
            line: line.into(),
            preamble: preamble.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// The entry for the running binary in this platform's autostart file.
    pub fn for_current_exe() -> Result<Self, StartupError> {
        let exe = std::env::current_exe().map_err(StartupError::NoExecutable)?;
        Self::for_executable(&exe)
    }

    pub fn for_executable(exe: &Path) -> Result<Self, StartupError> {
        let path = imp::autostart_file().ok_or(StartupError::NoAutostartDir)?;
        Ok(Self::new(path, imp::launch_line(exe), imp::PREAMBLE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_registered(&self) -> Result<bool, StartupError> {
        Ok(self
            .read()?
            .is_some_and(|content| self.contained_in(&content)))
    }

    /// Appends the launch line unless an identical one is already there.
    pub fn add(&self) -> Result<AddOutcome, StartupError> {
        let content = match self.read()? {
            Some(content) if self.contained_in(&content) => {
                return Ok(AddOutcome::AlreadyPresent);
            }
            Some(mut content) if !content.trim().is_empty() => {
                if !content.ends_with('\n') {
                    content.push('\n');
                }
                content
            }
            // An empty file is treated like a missing one.
            Some(_) => self.preamble_text(),
            None => {
                if let Some(parent) = self.path.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
                }
                self.preamble_text()
            }
        };

        self.write(&format!("{content}{}\n", self.line))?;
        info!("[startup] Added to {}", self.path.display());
        Ok(AddOutcome::Added)
    }

    /// Removes every copy of the launch line, keeping all other lines intact.
    pub fn remove(&self) -> Result<RemoveOutcome, StartupError> {
        let Some(content) = self.read()? else {
            return Ok(RemoveOutcome::NotPresent);
        };
        if !self.contained_in(&content) {
            return Ok(RemoveOutcome::NotPresent);
        }

        let remaining: String = content
            .split_inclusive('\n')
            .filter(|l| l.trim_end() != self.line)
            .collect();

        let only_preamble = remaining
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .all(|l| self.preamble.iter().any(|p| p == l));

        if only_preamble {
            std::fs::remove_file(&self.path).map_err(|e| io_error(&self.path, e))?;
        } else {
            self.write(&remaining)?;
        }
        info!("[startup] Removed from {}", self.path.display());
        Ok(RemoveOutcome::Removed)
    }

    fn preamble_text(&self) -> String {
        self.preamble.iter().map(|l| format!("{l}\n")).collect()
    }

    fn contained_in(&self, content: &str) -> bool {
        content.lines().any(|l| l.trim_end() == self.line)
    }

    /// Returns `None` when the file does not exist.
    fn read(&self) -> Result<Option<String>, StartupError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&self.path, e)),
        }
    }

    fn write(&self, content: &str) -> Result<(), StartupError> {
        std::fs::write(&self.path, content).map_err(|e| io_error(&self.path, e))
    }
}

fn io_error(path: &Path, source: io::Error) -> StartupError {
    if source.kind() == io::ErrorKind::PermissionDenied {
        StartupError::PermissionDenied {
            path: path.to_path_buf(),
        }
    } else {
        StartupError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
