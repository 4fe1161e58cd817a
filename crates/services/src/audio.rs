//! Background music for a game screen.
//!
//! Playback itself belongs to the platform; this module only tracks the
//! mute toggle and makes sure audio failures never interrupt a game.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Track looped while a level is being played.
pub const GAME_TRACK: &str = "music/tension.mp3";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AudioError {
    #[error("audio backend error: {0}")]
    Backend(String),
}

/// Platform audio player.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Load `track` on a loop, starting playback immediately when `play` is set.
    async fn load_looping(&self, track: &str, play: bool) -> Result<(), AudioError>;

    async fn set_playing(&self, playing: bool) -> Result<(), AudioError>;

    async fn unload(&self) -> Result<(), AudioError>;
}

/// Owns the soundtrack for the lifetime of one game screen.
pub struct SoundtrackController {
    backend: Arc<dyn AudioBackend>,
    muted: bool,
    loaded: bool,
}

impl SoundtrackController {
    #[must_use]
    pub fn new(backend: Arc<dyn AudioBackend>, muted: bool) -> Self {
        Self {
            backend,
            muted,
            loaded: false,
        }
    }

    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Load the game track. Failures are logged and the game continues silently.
    pub async fn load(&mut self, track: &str) {
        match self.backend.load_looping(track, !self.muted).await {
            Ok(()) => self.loaded = true,
            Err(err) => tracing::warn!(track, error = %err, "failed to load music"),
        }
    }

    /// Flip the mute state; ignored until the track has loaded.
    ///
    /// Returns the mute state after the call.
    pub async fn toggle_mute(&mut self) -> bool {
        if !self.loaded {
            return self.muted;
        }
        match self.backend.set_playing(self.muted).await {
            Ok(()) => self.muted = !self.muted,
            Err(err) => tracing::warn!(error = %err, "failed to toggle mute"),
        }
        self.muted
    }

    /// Release the track when leaving the screen.
    pub async fn unload(&mut self) {
        if !self.loaded {
            return;
        }
        if let Err(err) = self.backend.unload().await {
            tracing::warn!(error = %err, "failed to unload music");
        }
        self.loaded = false;
    }
}

/// A backend that plays nothing, for headless frontends.
///
/// It remembers the last requested playing state so callers can show it.
#[derive(Debug, Clone, Default)]
pub struct SilentBackend {
    playing: Arc<Mutex<Option<bool>>>,
}

impl SilentBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when nothing is loaded.
    #[must_use]
    pub fn playing(&self) -> Option<bool> {
        self.playing.lock().ok().and_then(|guard| *guard)
    }

    fn set(&self, value: Option<bool>) -> Result<(), AudioError> {
        let mut guard = self
            .playing
            .lock()
            .map_err(|e| AudioError::Backend(e.to_string()))?;
        *guard = value;
        Ok(())
    }
}

#[async_trait]
impl AudioBackend for SilentBackend {
    async fn load_looping(&self, _track: &str, play: bool) -> Result<(), AudioError> {
        self.set(Some(play))
    }

    async fn set_playing(&self, playing: bool) -> Result<(), AudioError> {
        self.set(Some(playing))
    }

    async fn unload(&self) -> Result<(), AudioError> {
        self.set(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingBackend;

    #[async_trait]
    impl AudioBackend for FailingBackend {
        async fn load_looping(&self, _track: &str, _play: bool) -> Result<(), AudioError> {
            Err(AudioError::Backend("no device".into()))
        }

        async fn set_playing(&self, _playing: bool) -> Result<(), AudioError> {
            Err(AudioError::Backend("no device".into()))
        }

        async fn unload(&self) -> Result<(), AudioError> {
            Err(AudioError::Backend("no device".into()))
        }
    }

    #[tokio::test]
    async fn muted_launch_loads_without_playing() {
        let backend = SilentBackend::new();
        let mut music = SoundtrackController::new(Arc::new(backend.clone()), true);
        music.load(GAME_TRACK).await;
        assert!(music.is_loaded());
        assert_eq!(backend.playing(), Some(false));

        assert!(!music.toggle_mute().await);
        assert_eq!(backend.playing(), Some(true));

        assert!(music.toggle_mute().await);
        assert_eq!(backend.playing(), Some(false));

        music.unload().await;
        assert_eq!(backend.playing(), None);
        assert!(!music.is_loaded());
    }

    #[tokio::test]
    async fn toggle_before_load_is_ignored() {
        let backend = SilentBackend::new();
        let mut music = SoundtrackController::new(Arc::new(backend.clone()), false);
        assert!(!music.toggle_mute().await);
        assert_eq!(backend.playing(), None);
    }

    #[tokio::test]
    async fn backend_failures_are_swallowed() {
        let mut music = SoundtrackController::new(Arc::new(FailingBackend), false);
        music.load(GAME_TRACK).await;
        assert!(!music.is_loaded());
        assert!(!music.toggle_mute().await);
        music.unload().await;
    }
}
