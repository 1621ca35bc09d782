//! Notification sounds on light transitions.
//!
//! Playback is fire-and-forget: the player process is spawned and `play`
//! returns at once. Finished players are reaped on the next `play` and on
//! drop, so no exited child lingers. A failed spawn only logs a warning.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::debounce::LightEvent;

pub trait Chime {
    fn play(&mut self, event: LightEvent);
}

/// Plays nothing.
#[derive(Default)]
pub struct SilentChime;

impl Chime for SilentChime {
    fn play(&mut self, _event: LightEvent) {}
}

/// External player (e.g. `aplay`, `paplay`, `afplay`) and the sound file
/// for each event.
#[derive(Clone, Debug)]
pub struct ChimeSettings {
    pub program: String,
    pub on_sound: PathBuf,
    pub off_sound: PathBuf,
}

impl ChimeSettings {
    pub fn sound_for(&self, event: LightEvent) -> &Path {
        match event {
            LightEvent::On => self.on_sound.as_path(),
            LightEvent::Off => self.off_sound.as_path(),
        }
    }
}

/// Spawns the configured player for each event.
pub struct CommandChime {
    settings: ChimeSettings,
    children: Vec<Child>,
}

impl CommandChime {
    pub fn new(settings: ChimeSettings) -> Self {
        Self {
            settings,
            children: Vec::new(),
        }
    }

    /// Players spawned but not yet seen to exit.
    pub fn pending(&self) -> usize {
        self.children.len()
    }

    /// Collect exit status of finished players without blocking.
    pub fn reap(&mut self) {
        self.children.retain_mut(|child| match child.try_wait() {
            Ok(Some(_)) => false,
            Ok(None) => true,
            Err(e) => {
                log::warn!("chime: failed to poll player {}: {}", child.id(), e);
                false
            }
        });
    }
}

impl Chime for CommandChime {
    fn play(&mut self, event: LightEvent) {
        self.reap();
        let sound = self.settings.sound_for(event);
        let spawned = Command::new(&self.settings.program)
            .arg(sound)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(child) => self.children.push(child),
            Err(e) => log::warn!(
                "chime: failed to run {} {}: {}",
                self.settings.program,
                sound.display(),
                e
            ),
        }
    }
}

impl Drop for CommandChime {
    fn drop(&mut self) {
        self.reap();
        // Sounds are short; wait for the rest so they are not left unreaped.
        for mut child in self.children.drain(..) {
            if let Err(e) = child.wait() {
                log::warn!("chime: failed to wait for player {}: {}", child.id(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    /// Tests that spawn players count this process's children; run them one at a time.
    static SPAWN_LOCK: Mutex<()> = Mutex::new(());

    fn settings(program: &str) -> ChimeSettings {
        ChimeSettings {
            program: program.to_string(),
            on_sound: PathBuf::from("on.wav"),
            off_sound: PathBuf::from("off.wav"),
        }
    }

    /// Exited-but-unreaped children of this process.
    #[cfg(target_os = "linux")]
    fn zombie_children() -> usize {
        let me = std::process::id().to_string();
        let Ok(entries) = std::fs::read_dir("/proc") else {
            return 0;
        };
        entries
            .filter_map(|entry| std::fs::read_to_string(entry.ok()?.path().join("stat")).ok())
            .filter(|stat| {
                // Fields after the parenthesised command: state, ppid, ...
                let Some((_, rest)) = stat.rsplit_once(") ") else {
                    return false;
                };
                let mut fields = rest.split_whitespace();
                fields.next() == Some("Z") && fields.next() == Some(me.as_str())
            })
            .count()
    }

    #[test]
    fn picks_sound_per_event() {
        let settings = settings("aplay");
        assert_eq!(settings.sound_for(LightEvent::On), Path::new("on.wav"));
        assert_eq!(settings.sound_for(LightEvent::Off), Path::new("off.wav"));
    }

    #[test]
    fn missing_player_does_not_panic() {
        let mut chime = CommandChime::new(settings("definitely-not-a-sound-player"));
        chime.play(LightEvent::On);
        assert_eq!(chime.pending(), 0);
    }

    #[test]
    fn finished_players_are_reaped() {
        let _guard = SPAWN_LOCK.lock().unwrap();
        let mut chime = CommandChime::new(settings("true"));
        for _ in 0..5 {
            chime.play(LightEvent::On);
        }

        let deadline = Instant::now() + Duration::from_secs(5);
        while chime.pending() > 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
            chime.reap();
        }
        assert_eq!(chime.pending(), 0);

        #[cfg(target_os = "linux")]
        assert_eq!(zombie_children(), 0);
    }

    #[test]
    fn drop_waits_for_running_players() {
        let _guard = SPAWN_LOCK.lock().unwrap();
        let mut chime = CommandChime::new(settings("true"));
        chime.play(LightEvent::Off);
        chime.play(LightEvent::On);
        drop(chime);

        #[cfg(target_os = "linux")]
        assert_eq!(zombie_children(), 0);
    }
}
