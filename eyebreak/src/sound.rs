/// Audible alert played when a reminder is presented.
///
/// Playback is fire-and-forget: [`play`] hands the work to a short-lived worker
/// thread and returns immediately. Failures are logged and never reach the
/// caller, so a broken sound setup cannot hold up a reminder.
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, error};
use thiserror::Error;

/// What to play for a reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundRef {
    /// An audio file handed to the platform player.
    File(PathBuf),
    /// A generated tone.
    Tone { frequency_hz: u32, duration_ms: u32 },
}

#[derive(Debug, Error)]
pub enum SoundError {
    #[error("sound file not found: {0} (check SOUND_FILE_PATH in the config file)")]
    MissingFile(PathBuf),
    #[error("no audio player available (tried: {0})")]
    NoPlayer(String),
    #[error("audio player '{player}' exited with {status}")]
    PlayerFailed { player: String, status: std::process::ExitStatus },
    #[error("failed to spawn sound worker: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("tone playback failed: {0}")]
    Tone(String),
    #[error("no tone device; the terminal bell stands in for tones")]
    NoToneDevice,
}

/// Whether `sound` is rendered as the terminal bell. The bell has to be
/// written by whoever owns the terminal, so [`play`] does not handle it.
pub fn rings_terminal_bell(sound: &SoundRef) -> bool {
    cfg!(not(windows)) && matches!(sound, SoundRef::Tone { .. })
}

/// Plays `sound` on a background thread.
pub fn play(sound: &SoundRef) {
    let sound = sound.clone();
    let spawned = std::thread::Builder::new()
        .name("sound".into())
        .spawn(move || {
            if let Err(e) = play_blocking(&sound) {
                error!("[sound] {e}");
            }
        });
    if let Err(e) = spawned {
        error!("[sound] {}", SoundError::Spawn(e));
    }
}

/// Plays `sound` on the current thread and waits for it to finish.
pub fn play_blocking(sound: &SoundRef) -> Result<(), SoundError> {
    match sound {
        SoundRef::File(path) => play_file(path),
        SoundRef::Tone {
            frequency_hz,
            duration_ms,
        } => play_tone(*frequency_hz, *duration_ms),
    }
}

fn play_file(path: &Path) -> Result<(), SoundError> {
    if !path.is_file() {
        return Err(SoundError::MissingFile(path.to_path_buf()));
    }

    let candidates = player_commands(path);
    for mut cmd in candidates {
        let player = cmd.get_program().to_string_lossy().into_owned();
        match cmd.status() {
            Ok(status) if status.success() => {
                debug!("[sound] Played {} with {player}", path.display());
                return Ok(());
            }
            Ok(status) => return Err(SoundError::PlayerFailed { player, status }),
            // Not installed; try the next one.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(SoundError::Spawn(e)),
        }
    }
    Err(SoundError::NoPlayer(player_names().join(", ")))
}

/// Platform audio players, in order of preference.
fn player_commands(path: &Path) -> Vec<Command> {
    #[cfg(windows)]
    {
        let script = format!(
            "(New-Object Media.SoundPlayer '{}').PlaySync()",
            path.display().to_string().replace('\'', "''")
        );
        let mut cmd = Command::new("powershell");
        cmd.args(["-NoProfile", "-NonInteractive", "-Command", script.as_str()]);
        vec![cmd]
    }
    #[cfg(target_os = "macos")]
    {
        let mut cmd = Command::new("afplay");
        cmd.arg(path);
        vec![cmd]
    }
    #[cfg(not(any(windows, target_os = "macos")))]
    {
        player_names()
            .iter()
            .map(|name| {
                let mut cmd = Command::new(name);
                if *name == "aplay" {
                    cmd.arg("-q");
                }
                cmd.arg(path);
                cmd
            })
            .collect()
    }
}

fn player_names() -> &'static [&'static str] {
    #[cfg(windows)]
    {
        &["powershell"]
    }
    #[cfg(target_os = "macos")]
    {
        &["afplay"]
    }
    #[cfg(not(any(windows, target_os = "macos")))]
    {
        &["paplay", "aplay"]
    }
}

#[cfg(windows)]
fn play_tone(frequency_hz: u32, duration_ms: u32) -> Result<(), SoundError> {
    use windows::Win32::System::Diagnostics::Debug::Beep;
    unsafe { Beep(frequency_hz, duration_ms) }.map_err(|e| SoundError::Tone(e.to_string()))
}

#[cfg(not(windows))]
fn play_tone(_frequency_hz: u32, _duration_ms: u32) -> Result<(), SoundError> {
    Err(SoundError::NoToneDevice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.wav");
        let err = play_blocking(&SoundRef::File(path.clone())).unwrap_err();
        assert!(matches!(err, SoundError::MissingFile(p) if p == path));
    }

    #[test]
    fn directory_is_not_a_sound_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = play_blocking(&SoundRef::File(dir.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, SoundError::MissingFile(_)));
    }

    #[test]
    fn missing_file_message_names_the_config_key() {
        let err = SoundError::MissingFile(PathBuf::from("x.wav"));
        assert!(err.to_string().contains("SOUND_FILE_PATH"));
    }

    #[test]
    fn play_returns_immediately_on_error() {
        // The worker logs the failure; the caller is never affected.
        play(&SoundRef::File(PathBuf::from("definitely/not/here.wav")));
    }

    #[cfg(not(windows))]
    #[test]
    fn tones_are_left_to_the_terminal_owner() {
        let tone = SoundRef::Tone {
            frequency_hz: 440,
            duration_ms: 200,
        };
        assert!(rings_terminal_bell(&tone));
        assert!(matches!(play_blocking(&tone), Err(SoundError::NoToneDevice)));
    }

    #[test]
    fn files_never_ring_the_bell() {
        assert!(!rings_terminal_bell(&SoundRef::File(PathBuf::from("a.wav"))));
    }

    #[test]
    fn every_platform_has_a_player_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        assert!(!player_commands(&path).is_empty());
        assert_eq!(player_commands(&path).len(), player_names().len());
    }
}
