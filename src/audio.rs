//! Audio collaborator
//!
//! The engine only names sound effects; playback belongs to the host. The
//! mixer applies volume and mute before anything reaches the sink.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Bullet fired
    Fire,
    /// Asteroid destroyed
    Explosion,
    /// Ship destroyed
    ShipExplosion,
    /// Pill collected
    Powerup,
    /// Token collected
    TokenCollect,
    /// Ship pickup collected
    ExtraLife,
    /// Asteroid field cleared, new level
    LevelUp,
    /// Run ended
    GameOver,
}

/// Host-side playback. Fire-and-forget: failures stay on the host side.
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect, volume: f32);
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _effect: SoundEffect, _volume: f32) {}
}

impl<T: AudioSink> AudioSink for Rc<RefCell<T>> {
    fn play(&mut self, effect: SoundEffect, volume: f32) {
        self.borrow_mut().play(effect, volume);
    }
}

/// Sink that remembers what was played
#[derive(Debug, Default, Clone)]
pub struct RecordingAudio {
    pub played: Vec<(SoundEffect, f32)>,
}

impl RecordingAudio {
    pub fn count(&self, effect: SoundEffect) -> usize {
        self.played.iter().filter(|(e, _)| *e == effect).count()
    }
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, effect: SoundEffect, volume: f32) {
        self.played.push((effect, volume));
    }
}

/// Volume gate in front of the host sink
pub struct AudioMixer {
    sink: Box<dyn AudioSink>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl Default for AudioMixer {
    fn default() -> Self {
        Self::new(Box::new(NullAudio))
    }
}

impl AudioMixer {
    pub fn new(sink: Box<dyn AudioSink>) -> Self {
        Self {
            sink,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Get effective volume
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Play a sound effect (dropped when silent)
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        self.sink.play(effect, vol);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixer_scales_and_mutes() {
        let sink = Rc::new(RefCell::new(RecordingAudio::default()));
        let mut mixer = AudioMixer::new(Box::new(sink.clone()));
        mixer.set_master_volume(0.5);
        mixer.set_sfx_volume(0.5);
        mixer.play(SoundEffect::Fire);

        mixer.set_muted(true);
        mixer.play(SoundEffect::Explosion);

        let played = &sink.borrow().played;
        assert_eq!(played.len(), 1);
        assert_eq!(played[0], (SoundEffect::Fire, 0.25));
    }

    #[test]
    fn test_volume_clamped() {
        let mut mixer = AudioMixer::default();
        mixer.set_master_volume(3.0);
        mixer.set_sfx_volume(-1.0);
        assert_eq!(mixer.effective_volume(), 0.0);
        mixer.set_sfx_volume(1.0);
        assert_eq!(mixer.effective_volume(), 1.0);
    }
}
