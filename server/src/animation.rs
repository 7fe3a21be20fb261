//! Animation clip playback state for characters.
//!
//! The server does not render; it tracks which clip plays and for how
//! long so scenario logic can time follow-up events against playback
//! without polling, and so the client can mirror the pose.

use std::collections::HashMap;

/// Fade-out reserved at the end of a looping clip before the next one
/// blends in.
pub const CROSS_FADE_OUT: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct ActiveClip {
    pub name: String,
    pub time: f64,
    pub duration: f64,
    pub weight: f64,
    pub looping: bool,
    pub clamp_when_finished: bool,
}

/// A character's clip table plus the clip currently playing.
#[derive(Debug, Clone, Default)]
pub struct AnimationSet {
    clips: HashMap<String, f64>,
    active: Option<ActiveClip>,
}

impl AnimationSet {
    pub fn new(clips: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            clips: clips.into_iter().collect(),
            active: None,
        }
    }

    pub fn has_clip(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    /// Start playing a clip, returning its playable duration: the raw
    /// clip duration when non-looping, `duration - fade_in - 0.2` (never
    /// negative) when looping. Unknown clips are a logged error.
    pub fn set_animation(
        &mut self,
        name: &str,
        fade_in: f64,
        weight: f64,
        looping: bool,
        clamp_when_finished: bool,
    ) -> Option<f64> {
        let Some(&duration) = self.clips.get(name) else {
            tracing::error!(clip = name, "animation clip not found");
            return None;
        };

        self.active = Some(ActiveClip {
            name: name.to_string(),
            time: 0.0,
            duration,
            weight,
            looping,
            clamp_when_finished,
        });

        if looping {
            Some((duration - fade_in - CROSS_FADE_OUT).max(0.0))
        } else {
            Some(duration)
        }
    }

    /// Advance the active clip's time base by `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        let Some(clip) = self.active.as_mut() else {
            return;
        };
        clip.time += dt;
        if clip.looping {
            if clip.duration > 0.0 {
                clip.time %= clip.duration;
            }
        } else if clip.time >= clip.duration {
            if clip.clamp_when_finished {
                clip.time = clip.duration;
            } else {
                self.active = None;
            }
        }
    }

    pub fn active(&self) -> Option<&ActiveClip> {
        self.active.as_ref()
    }
}
