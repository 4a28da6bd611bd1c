// editing mode state machine
//
// exactly one mode is active at a time and gates which mutations are legal:
// point clicks only land in AddPoints, brush strokes are committed when
// leaving a mask mode, and Running is entered and left only by the
// optimization driver.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditingMode {
    #[default]
    AddPoints,
    AddMask,
    RemoveMask,
    Running,
}

impl EditingMode {
    pub fn allows_point_clicks(self) -> bool {
        self == EditingMode::AddPoints
    }

    pub fn is_mask_edit(self) -> bool {
        matches!(self, EditingMode::AddMask | EditingMode::RemoveMask)
    }

    /// whether a user-triggered switch to `next` is legal from this mode.
    /// everything is reachable from the three editing modes; Running only
    /// returns to AddPoints, and only the driver performs that transition.
    pub fn user_can_switch_to(self, next: EditingMode) -> bool {
        match self {
            EditingMode::Running => false,
            _ => next != EditingMode::Running,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_clicks_only_in_add_points() {
        assert!(EditingMode::AddPoints.allows_point_clicks());
        assert!(!EditingMode::AddMask.allows_point_clicks());
        assert!(!EditingMode::RemoveMask.allows_point_clicks());
        assert!(!EditingMode::Running.allows_point_clicks());
    }

    #[test]
    fn test_no_user_transition_while_running() {
        for next in [
            EditingMode::AddPoints,
            EditingMode::AddMask,
            EditingMode::RemoveMask,
        ] {
            assert!(!EditingMode::Running.user_can_switch_to(next));
        }
    }

    #[test]
    fn test_editing_modes_fully_connected() {
        let modes = [
            EditingMode::AddPoints,
            EditingMode::AddMask,
            EditingMode::RemoveMask,
        ];
        for from in modes {
            for to in modes {
                assert!(from.user_can_switch_to(to), "{from:?} -> {to:?}");
            }
        }
    }
}
