//! Crossfading animation state machine for the actor rig.
//!
//! One action is active at a time. A transition fades the old action out
//! while the new one fades in over the same window. Emotes are one-shot
//! overlays: when the emote that armed the return finishes, the controller
//! fades back to whatever locomotion state is recorded at that moment.

use std::collections::HashMap;

use thiserror::Error;

use crate::assets::ActorModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Idle,
    Walking,
    Running,
    Dance,
    Death,
    Sitting,
    Standing,
}

impl State {
    pub const ALL: [State; 7] = [
        State::Idle,
        State::Walking,
        State::Running,
        State::Dance,
        State::Death,
        State::Sitting,
        State::Standing,
    ];

    pub fn name(self) -> &'static str {
        match self {
            State::Idle => "Idle",
            State::Walking => "Walking",
            State::Running => "Running",
            State::Dance => "Dance",
            State::Death => "Death",
            State::Sitting => "Sitting",
            State::Standing => "Standing",
        }
    }

    /// Only the first four states repeat; the narrative ones hold their last pose.
    pub fn loops(self) -> bool {
        matches!(
            self,
            State::Idle | State::Walking | State::Running | State::Dance
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emote {
    Jump,
    Yes,
    No,
    Wave,
    Punch,
    ThumbsUp,
}

impl Emote {
    pub const ALL: [Emote; 6] = [
        Emote::Jump,
        Emote::Yes,
        Emote::No,
        Emote::Wave,
        Emote::Punch,
        Emote::ThumbsUp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Emote::Jump => "Jump",
            Emote::Yes => "Yes",
            Emote::No => "No",
            Emote::Wave => "Wave",
            Emote::Punch => "Punch",
            Emote::ThumbsUp => "ThumbsUp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    Repeat,
    /// Play once and clamp at the final pose.
    Once,
}

fn loop_mode_for(name: &str) -> LoopMode {
    match State::ALL.iter().find(|s| s.name() == name) {
        Some(state) if state.loops() => LoopMode::Repeat,
        _ => LoopMode::Once,
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum AnimError {
    #[error("animation clip '{0}' is missing from the model")]
    MissingClip(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fade {
    from: f32,
    to: f32,
    elapsed: f32,
    duration: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationAction {
    pub name: String,
    pub duration: f32,
    pub loop_mode: LoopMode,
    pub time: f32,
    pub weight: f32,
    pub time_scale: f32,
    pub playing: bool,
    pub finished: bool,
    fade: Option<Fade>,
}

impl AnimationAction {
    fn new(name: &str, duration: f32) -> Self {
        Self {
            name: name.to_string(),
            duration,
            loop_mode: loop_mode_for(name),
            time: 0.0,
            weight: 0.0,
            time_scale: 1.0,
            playing: false,
            finished: false,
            fade: None,
        }
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    fn reset(&mut self) {
        self.time = 0.0;
        self.finished = false;
        self.fade = None;
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn stop(&mut self) {
        self.playing = false;
        self.weight = 0.0;
        self.fade = None;
    }

    fn fade_to(&mut self, target: f32, duration: f32) {
        if duration <= 0.0 {
            self.weight = target;
            self.fade = None;
            if target == 0.0 {
                self.playing = false;
            }
            return;
        }
        self.fade = Some(Fade {
            from: self.weight,
            to: target,
            elapsed: 0.0,
            duration,
        });
    }

    /// Advances weight ramp and clip time. Returns true on the tick a once-clip finishes.
    fn advance(&mut self, dt: f32) -> bool {
        if let Some(mut fade) = self.fade {
            fade.elapsed += dt;
            let t = (fade.elapsed / fade.duration).clamp(0.0, 1.0);
            self.weight = fade.from + (fade.to - fade.from) * t;
            if t >= 1.0 {
                self.fade = None;
                if fade.to == 0.0 {
                    self.playing = false;
                }
            } else {
                self.fade = Some(fade);
            }
        }

        if !self.playing || self.finished {
            return false;
        }

        let next = self.time + dt * self.time_scale;
        match self.loop_mode {
            LoopMode::Repeat => {
                self.time = next.rem_euclid(self.duration);
                false
            }
            LoopMode::Once if next >= self.duration => {
                self.time = self.duration;
                self.finished = true;
                true
            }
            LoopMode::Once => {
                self.time = next;
                false
            }
        }
    }
}

pub struct AnimationController {
    actions: HashMap<String, AnimationAction>,
    active: String,
    previous: Option<String>,
    state: State,
    overlay: Option<Emote>,
    /// Emote whose completion fades back to `state`.
    pending_return: Option<Emote>,
    fade_duration: f32,
}

impl AnimationController {
    pub fn new(model: &ActorModel, fade_duration: f32) -> Result<Self, AnimError> {
        let mut actions: HashMap<String, AnimationAction> = model
            .clips
            .iter()
            .map(|clip| (clip.name.clone(), AnimationAction::new(&clip.name, clip.duration)))
            .collect();

        let start = State::Idle;
        let idle = actions
            .get_mut(start.name())
            .ok_or_else(|| AnimError::MissingClip(start.name().to_string()))?;
        idle.weight = 1.0;
        idle.play();

        Ok(Self {
            actions,
            active: start.name().to_string(),
            previous: None,
            state: start,
            overlay: None,
            pending_return: None,
            fade_duration,
        })
    }

    pub fn active(&self) -> &str {
        &self.active
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn overlay(&self) -> Option<Emote> {
        self.overlay
    }

    #[cfg(test)]
    pub fn pending_return(&self) -> Option<Emote> {
        self.pending_return
    }

    #[cfg(test)]
    pub fn action(&self, name: &str) -> Option<&AnimationAction> {
        self.actions.get(name)
    }

    #[cfg(test)]
    pub fn actions(&self) -> impl Iterator<Item = &AnimationAction> {
        self.actions.values()
    }

    /// Crossfades from the active action to `name`. No-op if `name` is already active.
    pub fn transition_to(&mut self, name: &str, duration: f32) -> Result<(), AnimError> {
        if !self.actions.contains_key(name) {
            return Err(AnimError::MissingClip(name.to_string()));
        }
        if self.active == name {
            return Ok(());
        }

        // at most one action fades out at a time
        if let Some(stale) = self.previous.take() {
            if stale != name {
                if let Some(action) = self.actions.get_mut(&stale) {
                    action.stop();
                }
            }
        }

        if let Some(old) = self.actions.get_mut(&self.active) {
            old.fade_to(0.0, duration);
        }
        if let Some(next) = self.actions.get_mut(name) {
            next.reset();
            next.fade_to(1.0, duration);
            next.play();
        }

        log::debug!("ANIM: {} -> {} over {:.2}s", self.active, name, duration);
        let old = std::mem::replace(&mut self.active, name.to_string());
        self.previous = Some(old);
        Ok(())
    }

    /// Records the locomotion state and fades to it, unless an emote is playing;
    /// then the fade waits until the emote returns.
    pub fn set_state(&mut self, state: State, duration: f32) -> Result<(), AnimError> {
        if !self.actions.contains_key(state.name()) {
            return Err(AnimError::MissingClip(state.name().to_string()));
        }
        self.state = state;
        if self.overlay.is_some() {
            return Ok(());
        }
        self.transition_to(state.name(), duration)
    }

    /// Starts a one-shot emote and arms the return to the locomotion state.
    pub fn play_emote(&mut self, emote: Emote, duration: f32) -> Result<(), AnimError> {
        if self.overlay == Some(emote) && self.active == emote.name() {
            // retrigger: restart in place
            let action = self
                .actions
                .get_mut(emote.name())
                .ok_or_else(|| AnimError::MissingClip(emote.name().to_string()))?;
            action.reset();
            action.weight = 1.0;
            action.play();
        } else {
            self.transition_to(emote.name(), duration)?;
        }
        self.overlay = Some(emote);
        self.pending_return = Some(emote);
        Ok(())
    }

    /// Advances every action by `dt`. Returns the emote that completed this tick, if any.
    pub fn update(&mut self, dt: f32) -> Result<Option<Emote>, AnimError> {
        let mut finished_active = false;
        for action in self.actions.values_mut() {
            let done = action.advance(dt);
            if done && action.name == self.active {
                finished_active = true;
            }
        }

        if let Some(prev) = &self.previous {
            let faded = self
                .actions
                .get(prev)
                .is_none_or(|a| !a.playing && !a.is_fading());
            if faded {
                self.previous = None;
            }
        }

        if !finished_active {
            return Ok(None);
        }

        match self.pending_return {
            Some(emote) if emote.name() == self.active => {
                self.pending_return = None;
                self.overlay = None;
                log::debug!("ANIM: emote {} finished, back to {}", emote.name(), self.state.name());
                self.transition_to(self.state.name(), self.fade_duration)?;
                Ok(Some(emote))
            }
            _ => Ok(None),
        }
    }
}
