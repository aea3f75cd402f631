use crate::keybinds::Trigger;
use std::collections::BTreeSet;

/// Returns true when every trigger key is held and the held mouse buttons are
/// exactly the trigger's buttons. Extra keys are tolerated, extra buttons are not.
pub fn is_active(
    trigger: &Trigger,
    current_keys: &BTreeSet<String>,
    current_mouse: &BTreeSet<String>,
) -> bool {
    trigger.keys.is_subset(current_keys) && trigger.mouse == *current_mouse
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matches_held_chord() {
        let trigger = Trigger::new(["ctrl", "alt"], ["x1"]);
        assert!(is_active(&trigger, &set(&["ctrl", "alt"]), &set(&["x1"])));
        assert!(!is_active(&trigger, &set(&["ctrl"]), &set(&["x1"])));
        assert!(!is_active(&trigger, &set(&["ctrl", "alt"]), &set(&[])));
    }

    #[test]
    fn extra_keys_never_break_a_match() {
        let trigger = Trigger::new(["ctrl", "alt"], ["x1"]);
        assert!(is_active(
            &trigger,
            &set(&["ctrl", "alt", "shift", "q", "f4"]),
            &set(&["x1"])
        ));
    }

    #[test]
    fn extra_buttons_always_break_a_match() {
        let trigger = Trigger::new(["ctrl", "alt"], ["x1"]);
        assert!(!is_active(&trigger, &set(&["ctrl", "alt"]), &set(&["x1", "x2"])));
    }

    #[test]
    fn empty_mouse_set_requires_no_buttons() {
        let trigger = Trigger::new(["ctrl", "alt"], Vec::<String>::new());
        assert!(is_active(&trigger, &set(&["ctrl", "alt", "p"]), &set(&[])));
        assert!(!is_active(&trigger, &set(&["ctrl", "alt"]), &set(&["x2"])));
    }
}
