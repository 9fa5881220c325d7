pub const BLUR: &str = "blur";
pub const CHANGE: &str = "change";
pub const CLICK: &str = "click";
pub const DOMREADY: &str = "domready";
pub const DOUBLE_CLICK: &str = "dblclick";
pub const FOCUS: &str = "focus";
pub const KEYDOWN: &str = "keydown";
pub const KEYPRESS: &str = "keypress";
pub const KEYUP: &str = "keyup";
pub const MOUSEOVER: &str = "mouseover";
pub const MOUSEOUT: &str = "mouseout";
pub const SELECT: &str = "select";
pub const SUBMIT: &str = "submit";

/// Events the client fires on its own rather than through a listener.
const NON_BINDABLE: &[&str] = &[DOMREADY];

/// Whether a listener can be bound for `event`. An unset event is bindable.
pub fn is_bindable_event(event: Option<&str>) -> bool {
    event.is_none_or(|e| !NON_BINDABLE.contains(&e))
}

/// The event as seen by an action handler.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AjaxEvent {
    pub event_type: Option<String>,
    /// Opaque sub-discriminator from the request, e.g. a key or button code.
    pub which: Option<String>,
}

impl AjaxEvent {
    pub fn new(event_type: Option<&str>, which: Option<&str>) -> Self {
        Self {
            event_type: event_type.map(str::to_string),
            which: which.map(str::to_string),
        }
    }

    pub fn is(&self, event_type: &str) -> bool {
        self.event_type
            .as_deref()
            .is_some_and(|e| e.eq_ignore_ascii_case(event_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domready_is_not_bindable() {
        assert!(!is_bindable_event(Some(DOMREADY)));
        assert!(is_bindable_event(Some(CLICK)));
        assert!(is_bindable_event(None));
    }
}
