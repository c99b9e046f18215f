use crate::anim::{Emote, State};
use crate::command::Command;

/// Slider values cycle through these stops.
const SLIDER_STEP: f32 = 0.25;

/// Debug panel model: a state selector, one button per emote and a slider
/// per morph target. It only produces commands; the simulation applies them.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugPanel {
    sliders: Vec<(String, f32)>,
}

impl DebugPanel {
    pub fn new<'a>(morph_targets: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            sliders: morph_targets
                .into_iter()
                .map(|n| (n.to_string(), 0.0))
                .collect(),
        }
    }

    pub fn state_options(&self) -> &'static [State] {
        &State::ALL
    }

    pub fn emote_buttons(&self) -> &'static [Emote] {
        &Emote::ALL
    }

    pub fn sliders(&self) -> &[(String, f32)] {
        &self.sliders
    }

    pub fn select_state(&self, index: usize) -> Option<Command> {
        State::ALL.get(index).copied().map(Command::SetState)
    }

    pub fn press_emote(&self, index: usize) -> Option<Command> {
        Emote::ALL.get(index).copied().map(Command::Emote)
    }

    /// Advances a slider by one stop, wrapping from 1 back to 0.
    pub fn nudge_slider(&mut self, index: usize) -> Option<Command> {
        let (name, value) = self.sliders.get_mut(index)?;
        *value = if *value >= 1.0 {
            0.0
        } else {
            (*value + SLIDER_STEP).min(1.0)
        };
        Some(Command::SetExpression {
            name: name.clone(),
            value: *value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel() -> DebugPanel {
        DebugPanel::new(["Angry", "Surprised", "Sad"])
    }

    #[test]
    fn lists_all_states_and_emotes() {
        let panel = panel();
        assert_eq!(panel.state_options().len(), 7);
        assert_eq!(panel.emote_buttons().len(), 6);
        assert_eq!(panel.sliders().len(), 3);
    }

    #[test]
    fn selections_map_to_commands() {
        let panel = panel();
        assert_eq!(panel.select_state(3), Some(Command::SetState(State::Dance)));
        assert_eq!(panel.press_emote(0), Some(Command::Emote(Emote::Jump)));
        assert_eq!(panel.select_state(7), None);
        assert_eq!(panel.press_emote(6), None);
    }

    #[test]
    fn slider_cycles_through_unit_range() {
        let mut panel = panel();
        let values: Vec<f32> = (0..5)
            .filter_map(|_| match panel.nudge_slider(2) {
                Some(Command::SetExpression { value, .. }) => Some(value),
                _ => None,
            })
            .collect();
        assert_eq!(values, [0.25, 0.5, 0.75, 1.0, 0.0]);
        assert!(panel.nudge_slider(9).is_none());
    }
}
