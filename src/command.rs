use crate::anim::{Emote, State};

/// Debug-panel requests, queued by the window and applied at the next tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetState(State),
    Emote(Emote),
    SetExpression { name: String, value: f32 },
}
