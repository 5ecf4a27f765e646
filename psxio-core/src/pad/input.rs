//! Frame-to-frame button tracking

use psxio_protocol::pad::Buttons;

/// Button state carried across frames
///
/// Owned by the frame loop. Call [`InputState::update`] once per frame
/// with the freshly polled buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputState {
    previous: Buttons,
    current: Buttons,
}

impl InputState {
    pub const fn new() -> Self {
        Self {
            previous: Buttons::empty(),
            current: Buttons::empty(),
        }
    }

    /// Record this frame's buttons and return the ones newly pressed
    pub fn update(&mut self, buttons: Buttons) -> Buttons {
        self.previous = self.current;
        self.current = buttons;
        self.just_pressed()
    }

    /// Buttons held this frame
    pub fn pressed(&self) -> Buttons {
        self.current
    }

    /// Buttons pressed this frame but not the previous one
    pub fn just_pressed(&self) -> Buttons {
        self.current.just_pressed(self.previous)
    }

    /// Buttons released this frame
    pub fn just_released(&self) -> Buttons {
        self.current.just_released(self.previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_is_reported_once() {
        let mut input = InputState::new();

        assert_eq!(input.update(Buttons::CROSS), Buttons::CROSS);
        assert_eq!(input.update(Buttons::CROSS), Buttons::empty());
        assert_eq!(input.pressed(), Buttons::CROSS);

        assert_eq!(input.update(Buttons::empty()), Buttons::empty());
        assert_eq!(input.just_released(), Buttons::CROSS);

        assert_eq!(input.update(Buttons::CROSS | Buttons::UP), Buttons::CROSS | Buttons::UP);
    }
}
