/// Keys the simulation cares about. The window layer maps physical keys onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKey {
    Forward,
    Back,
    Left,
    Right,
    Sprint,
    Action,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InputState {
    // --- Held keys (true while pressed) ---
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub sprint: bool,

    // --- One-shot actions (cleared after each tick) ---
    pub action: bool,
}

impl InputState {
    pub fn on_key_down(&mut self, key: InputKey) {
        self.set(key, true);
    }

    pub fn on_key_up(&mut self, key: InputKey) {
        // a released action key never cancels a trigger that has not been consumed yet
        if key != InputKey::Action {
            self.set(key, false);
        }
    }

    fn set(&mut self, key: InputKey, down: bool) {
        match key {
            InputKey::Forward => self.forward = down,
            InputKey::Back => self.back = down,
            InputKey::Left => self.left = down,
            InputKey::Right => self.right = down,
            InputKey::Sprint => self.sprint = down,
            InputKey::Action => self.action = down,
        }
    }

    pub fn any_direction(&self) -> bool {
        self.forward || self.back || self.left || self.right
    }

    /// Call after every tick: resets one-shot actions only.
    pub fn clear_one_shots(&mut self) {
        self.action = false;
    }
}
