use crate::binding::{BindingKey, InteractionBinding};
use crate::request::Request;
use indexmap::IndexMap;
use indexmap::map::Entry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// A binding with the same event type is already registered; the new one
    /// was dropped.
    Suppressed,
}

/// The bindings of one component, at most one per event type, in
/// registration order.
#[derive(Default)]
pub struct BindingSet {
    bindings: IndexMap<BindingKey, Box<dyn InteractionBinding>>,
}

impl BindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, binding: impl InteractionBinding + 'static) -> AddOutcome {
        self.add_boxed(Box::new(binding))
    }

    pub fn add_boxed(&mut self, binding: Box<dyn InteractionBinding>) -> AddOutcome {
        match self.bindings.entry(binding.key()) {
            Entry::Occupied(entry) => {
                log::debug!(
                    target: "behavior.registry",
                    "binding for event {:?} already registered; keeping the first",
                    entry.key().event_type()
                );
                AddOutcome::Suppressed
            }
            Entry::Vacant(entry) => {
                entry.insert(binding);
                AddOutcome::Added
            }
        }
    }

    pub fn get(&self, event_type: Option<&str>) -> Option<&dyn InteractionBinding> {
        self.bindings.get(&BindingKey::new(event_type)).map(|b| b.as_ref())
    }

    pub fn contains(&self, event_type: Option<&str>) -> bool {
        self.bindings.contains_key(&BindingKey::new(event_type))
    }

    pub fn remove(&mut self, event_type: Option<&str>) -> Option<Box<dyn InteractionBinding>> {
        self.bindings.shift_remove(&BindingKey::new(event_type))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn InteractionBinding> {
        self.bindings.values().map(|b| b.as_ref())
    }

    /// First binding, in registration order, that `request` targets.
    pub fn find_target(&self, request: &Request) -> Option<&dyn InteractionBinding> {
        self.iter().find(|b| b.is_request_target(request))
    }
}

impl std::fmt::Debug for BindingSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.bindings.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ajax::AjaxBinding;
    use crate::poll::PollBinding;
    use crate::template_binding::TemplateBinding;

    #[test]
    fn duplicate_event_types_keep_the_first_binding() {
        let mut set = BindingSet::new();
        let first = AjaxBinding::default().configure(|o| {
            o.url("/first");
        });
        let second = AjaxBinding::new("click").configure(|o| {
            o.url("/second");
        });
        assert_eq!(set.add(first), AddOutcome::Added);
        assert_eq!(set.add(second), AddOutcome::Suppressed);
        assert_eq!(set.add(AjaxBinding::new("change")), AddOutcome::Added);
        assert_eq!(set.len(), 2);
        assert!(set.contains(Some("click")));
    }

    #[test]
    fn removal_keeps_registration_order() {
        let mut set = BindingSet::new();
        set.add(AjaxBinding::new("click"));
        set.add(AjaxBinding::new("change"));
        set.add(TemplateBinding::new("/t.js"));
        assert!(set.remove(Some("click")).is_some());
        let keys: Vec<Option<&str>> = set.iter().map(|b| b.event_type()).collect();
        assert_eq!(keys, [Some("change"), None]);
    }

    #[test]
    fn target_is_first_matching_binding() {
        let mut set = BindingSet::new();
        set.add(AjaxBinding::new("change"));
        set.add(PollBinding::new());
        set.add(AjaxBinding::default());
        let event = |name: &str| Request::new("/p").with_param("event", name);
        let target = |request: &Request| set.find_target(request).and_then(|b| b.event_type());
        // The poll binding precedes the click binding but only answers its own event.
        assert_eq!(target(&event("Click")), Some("click"));
        assert_eq!(target(&event("domready")), Some("domready"));
        assert_eq!(target(&event("change")), Some("change"));
        assert!(target(&event("blur")).is_none());
    }
}
