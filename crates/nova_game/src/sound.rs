//! Named sound effects and one background music track.
//!
//! Mixing is left to an [`AudioBackend`]. With the `audio` feature,
//! [`RodioAudio`] plays through the default output device. [`SilentAudio`]
//! checks that files exist and logs what would play; the engine falls back
//! to it when no output device can be opened.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub trait AudioBackend {
    fn load(&mut self, name: &str, path: &Path) -> Result<(), String>;
    /// Play a loaded sound `repeats + 1` times.
    fn play(&mut self, name: &str, volume: f32, repeats: u32);
    fn play_music(&mut self, path: &Path, volume: f32, looping: bool) -> Result<(), String>;
    fn stop_music(&mut self);
    fn pause_music(&mut self);
    fn resume_music(&mut self);
    fn stop_all(&mut self);
}

#[derive(Debug, Default)]
pub struct SilentAudio;

impl AudioBackend for SilentAudio {
    fn load(&mut self, name: &str, path: &Path) -> Result<(), String> {
        if !path.is_file() {
            return Err(format!("Failed to read sound '{}' at {}", name, path.display()));
        }
        Ok(())
    }

    fn play(&mut self, name: &str, volume: f32, repeats: u32) {
        log::debug!(target: "SoundManager", "play '{}' volume {:.2} x{}", name, volume, repeats + 1);
    }

    fn play_music(&mut self, path: &Path, volume: f32, looping: bool) -> Result<(), String> {
        if !path.is_file() {
            return Err(format!("Failed to read music {}", path.display()));
        }
        log::debug!(
            target: "SoundManager",
            "music {} volume {:.2} looping {}",
            path.display(),
            volume,
            looping
        );
        Ok(())
    }

    fn stop_music(&mut self) {}

    fn pause_music(&mut self) {}

    fn resume_music(&mut self) {}

    fn stop_all(&mut self) {}
}

#[cfg(feature = "audio")]
pub use rodio_backend::RodioAudio;

#[cfg(feature = "audio")]
mod rodio_backend {
    use super::AudioBackend;
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
    use std::collections::HashMap;
    use std::fs::File;
    use std::io::{BufReader, Cursor};
    use std::path::Path;
    use std::sync::Arc;

    /// Sound effects are kept encoded in memory and decoded per play.
    pub struct RodioAudio {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sounds: HashMap<String, Arc<[u8]>>,
        effects: Vec<Sink>,
        music: Option<Sink>,
    }

    impl RodioAudio {
        /// Open the default output device.
        pub fn new() -> Result<Self, String> {
            let (stream, handle) = OutputStream::try_default()
                .map_err(|e| format!("Failed to open audio output: {}", e))?;
            Ok(Self {
                _stream: stream,
                handle,
                sounds: HashMap::new(),
                effects: Vec::new(),
                music: None,
            })
        }

        fn sink(&self) -> Option<Sink> {
            match Sink::try_new(&self.handle) {
                Ok(sink) => Some(sink),
                Err(e) => {
                    log::error!(target: "SoundManager", "Failed to create audio sink: {}", e);
                    None
                }
            }
        }
    }

    /// Read a sound file and make sure it decodes.
    pub(super) fn read_sound(path: &Path) -> Result<Arc<[u8]>, String> {
        let bytes: Arc<[u8]> = std::fs::read(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?
            .into();
        Decoder::new(Cursor::new(bytes.clone()))
            .map_err(|e| format!("Failed to decode {}: {}", path.display(), e))?;
        Ok(bytes)
    }

    impl AudioBackend for RodioAudio {
        fn load(&mut self, name: &str, path: &Path) -> Result<(), String> {
            let bytes = read_sound(path)?;
            self.sounds.insert(name.to_string(), bytes);
            Ok(())
        }

        fn play(&mut self, name: &str, volume: f32, repeats: u32) {
            let Some(bytes) = self.sounds.get(name).cloned() else {
                return;
            };
            let Some(sink) = self.sink() else {
                return;
            };
            sink.set_volume(volume);
            for _ in 0..=repeats {
                match Decoder::new(Cursor::new(bytes.clone())) {
                    Ok(source) => sink.append(source),
                    Err(e) => {
                        log::error!(target: "SoundManager", "Failed to decode '{}': {}", name, e);
                        return;
                    }
                }
            }
            self.effects.retain(|s| !s.empty());
            self.effects.push(sink);
        }

        fn play_music(&mut self, path: &Path, volume: f32, looping: bool) -> Result<(), String> {
            let file = File::open(path)
                .map_err(|e| format!("Failed to read music {}: {}", path.display(), e))?;
            let source = Decoder::new(BufReader::new(file))
                .map_err(|e| format!("Failed to decode music {}: {}", path.display(), e))?;
            let sink = self
                .sink()
                .ok_or_else(|| "No audio sink for music".to_string())?;
            sink.set_volume(volume);
            if looping {
                sink.append(source.repeat_infinite());
            } else {
                sink.append(source);
            }
            if let Some(old) = self.music.replace(sink) {
                old.stop();
            }
            Ok(())
        }

        fn stop_music(&mut self) {
            if let Some(music) = self.music.take() {
                music.stop();
            }
        }

        fn pause_music(&mut self) {
            if let Some(music) = &self.music {
                music.pause();
            }
        }

        fn resume_music(&mut self) {
            if let Some(music) = &self.music {
                music.play();
            }
        }

        fn stop_all(&mut self) {
            self.stop_music();
            for sink in self.effects.drain(..) {
                sink.stop();
            }
        }
    }
}

/// The default output device, or [`SilentAudio`] when the `audio` feature is
/// off or no device is available.
#[cfg(feature = "audio")]
pub fn default_backend() -> Box<dyn AudioBackend> {
    match RodioAudio::new() {
        Ok(backend) => Box::new(backend),
        Err(e) => {
            log::warn!(target: "SoundManager", "{}; sound disabled", e);
            Box::new(SilentAudio)
        }
    }
}

#[cfg(not(feature = "audio"))]
pub fn default_backend() -> Box<dyn AudioBackend> {
    Box::new(SilentAudio)
}

pub struct SoundManager {
    backend: Box<dyn AudioBackend>,
    sounds: HashMap<String, PathBuf>,
    music_playing: bool,
    music_paused: bool,
}

impl SoundManager {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            sounds: HashMap::new(),
            music_playing: false,
            music_paused: false,
        }
    }

    pub fn silent() -> Self {
        Self::new(Box::new(SilentAudio))
    }

    pub fn set_backend(&mut self, backend: Box<dyn AudioBackend>) {
        self.backend.stop_all();
        self.backend = backend;
        self.music_playing = false;
        self.music_paused = false;
        let sounds: Vec<(String, PathBuf)> = self.sounds.drain().collect();
        for (name, path) in sounds {
            if let Err(e) = self.load_sound(&name, &path) {
                log::error!(target: "SoundManager", "{}", e);
            }
        }
    }

    pub fn load_sound(&mut self, name: &str, path: impl AsRef<Path>) -> Result<(), String> {
        let path = path.as_ref();
        self.backend.load(name, path)?;
        self.sounds.insert(name.to_string(), path.to_path_buf());
        Ok(())
    }

    pub fn has_sound(&self, name: &str) -> bool {
        self.sounds.contains_key(name)
    }

    /// Unknown names are logged and ignored.
    pub fn play_sound(&mut self, name: &str, volume: f32, count: u32) {
        if !self.sounds.contains_key(name) {
            log::error!(target: "SoundManager", "Sound '{}' not found", name);
            return;
        }
        self.backend
            .play(name, volume.clamp(0.0, 1.0), count.saturating_sub(1));
    }

    pub fn play_music(&mut self, path: impl AsRef<Path>, volume: f32, looping: bool) {
        match self
            .backend
            .play_music(path.as_ref(), volume.clamp(0.0, 1.0), looping)
        {
            Ok(()) => {
                self.music_playing = true;
                self.music_paused = false;
            }
            Err(e) => log::error!(target: "SoundManager", "{}", e),
        }
    }

    pub fn stop_music(&mut self) {
        self.backend.stop_music();
        self.music_playing = false;
        self.music_paused = false;
    }

    pub fn pause_music(&mut self) {
        if self.music_playing && !self.music_paused {
            self.backend.pause_music();
            self.music_paused = true;
        }
    }

    pub fn continue_music(&mut self) {
        if self.music_paused {
            self.backend.resume_music();
            self.music_paused = false;
        }
    }

    pub fn stop_all(&mut self) {
        self.backend.stop_all();
        self.music_playing = false;
        self.music_paused = false;
    }

    pub fn is_music_playing(&self) -> bool {
        self.music_playing && !self.music_paused
    }
}

impl Default for SoundManager {
    fn default() -> Self {
        Self::silent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl AudioBackend for Recorder {
        fn load(&mut self, name: &str, _path: &Path) -> Result<(), String> {
            self.calls.borrow_mut().push(format!("load {name}"));
            Ok(())
        }
        fn play(&mut self, name: &str, volume: f32, repeats: u32) {
            self.calls
                .borrow_mut()
                .push(format!("play {name} {volume} {repeats}"));
        }
        fn play_music(&mut self, _path: &Path, _volume: f32, looping: bool) -> Result<(), String> {
            self.calls.borrow_mut().push(format!("music {looping}"));
            Ok(())
        }
        fn stop_music(&mut self) {
            self.calls.borrow_mut().push("stop_music".into());
        }
        fn pause_music(&mut self) {
            self.calls.borrow_mut().push("pause".into());
        }
        fn resume_music(&mut self) {
            self.calls.borrow_mut().push("resume".into());
        }
        fn stop_all(&mut self) {
            self.calls.borrow_mut().push("stop_all".into());
        }
    }

    fn manager() -> (SoundManager, Rc<RefCell<Vec<String>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let backend = Recorder {
            calls: calls.clone(),
        };
        (SoundManager::new(Box::new(backend)), calls)
    }

    #[test]
    fn unknown_sound_is_ignored() {
        let (mut sounds, calls) = manager();
        sounds.play_sound("boom", 1.0, 1);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn loaded_sound_plays_with_clamped_volume() {
        let (mut sounds, calls) = manager();
        sounds.load_sound("hit", "hit.wav").expect("load");
        sounds.play_sound("hit", 2.0, 3);
        assert_eq!(calls.borrow().last().map(String::as_str), Some("play hit 1 2"));
    }

    #[test]
    fn music_state_follows_pause_and_stop() {
        let (mut sounds, calls) = manager();
        sounds.play_music("theme.ogg", 0.5, true);
        assert!(sounds.is_music_playing());
        sounds.pause_music();
        sounds.pause_music();
        assert!(!sounds.is_music_playing());
        sounds.continue_music();
        assert!(sounds.is_music_playing());
        sounds.stop_all();
        assert!(!sounds.is_music_playing());
        let pauses = calls.borrow().iter().filter(|c| *c == "pause").count();
        assert_eq!(pauses, 1);
    }

    #[test]
    fn silent_backend_rejects_missing_files() {
        let mut sounds = SoundManager::silent();
        assert!(sounds.load_sound("x", "no/such/file.wav").is_err());
        assert!(!sounds.has_sound("x"));

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("blip.wav");
        std::fs::write(&path, b"RIFF").expect("write");
        sounds.load_sound("blip", &path).expect("existing file");
        assert!(sounds.has_sound("blip"));
        sounds.play_music(dir.path().join("missing.ogg"), 1.0, false);
        assert!(!sounds.is_music_playing());
    }

    /// 16-bit mono PCM WAV with `samples` zeroed frames.
    #[cfg(feature = "audio")]
    fn tiny_wav(samples: u32) -> Vec<u8> {
        let data_len = samples * 2;
        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + data_len).to_le_bytes());
        wav.extend_from_slice(b"WAVEfmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&8000u32.to_le_bytes());
        wav.extend_from_slice(&16000u32.to_le_bytes());
        wav.extend_from_slice(&2u16.to_le_bytes());
        wav.extend_from_slice(&16u16.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_len.to_le_bytes());
        wav.resize(wav.len() + data_len as usize, 0);
        wav
    }

    #[cfg(feature = "audio")]
    #[test]
    fn sound_files_must_decode() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = dir.path().join("blip.wav");
        std::fs::write(&good, tiny_wav(64)).expect("write");
        let bytes = rodio_backend::read_sound(&good).expect("decodes");
        assert_eq!(bytes.len(), 44 + 128);

        let junk = dir.path().join("junk.wav");
        std::fs::write(&junk, b"not audio at all").expect("write");
        assert!(rodio_backend::read_sound(&junk).is_err());
        assert!(rodio_backend::read_sound(&dir.path().join("missing.wav")).is_err());
    }
}
