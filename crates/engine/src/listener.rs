use erd_core::{ElementId, ElementKind, ListenerId, PropertyValue};

/// A property write that has already been applied to an element.
#[derive(Debug, Clone, Copy)]
pub struct PropertyChange<'a> {
    pub element: ElementId,
    pub kind: ElementKind,
    pub property: &'static str,
    /// `None` when the value before the write could not be read.
    pub old: Option<&'a PropertyValue>,
    pub new: &'a PropertyValue,
}

/// Callbacks for observers of a diagram graph.
///
/// The graph invokes exactly one notification per structural mutation,
/// synchronously and after the mutation is visible through the graph. Every
/// method defaults to doing nothing so observers implement only what they need.
pub trait GraphModificationListener {
    fn entity_added(&mut self, _element: ElementId) {}

    fn entity_removed(&mut self, _element: ElementId) {}

    fn relation_added(&mut self, _relation: ElementId) {}

    fn relation_removed(&mut self, _relation: ElementId) {}

    fn property_changed(&mut self, _change: PropertyChange<'_>) {}

    /// The graph is about to be modified through several related operations.
    fn starting_compound_operation(&mut self) {}

    fn finishing_compound_operation(&mut self) {}
}

/// Registered listeners of one graph, notified in registration order.
#[derive(Default)]
pub struct GraphListeners {
    listeners: Vec<(ListenerId, Box<dyn GraphModificationListener>)>,
}

impl GraphListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: Box<dyn GraphModificationListener>) -> ListenerId {
        let id = ListenerId::new();
        self.listeners.push((id, listener));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> Option<Box<dyn GraphModificationListener>> {
        let index = self.listeners.iter().position(|(lid, _)| *lid == id)?;
        Some(self.listeners.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn entity_added(&mut self, element: ElementId) {
        self.each(|l| l.entity_added(element));
    }

    pub fn entity_removed(&mut self, element: ElementId) {
        self.each(|l| l.entity_removed(element));
    }

    pub fn relation_added(&mut self, relation: ElementId) {
        self.each(|l| l.relation_added(relation));
    }

    pub fn relation_removed(&mut self, relation: ElementId) {
        self.each(|l| l.relation_removed(relation));
    }

    pub fn property_changed(&mut self, change: PropertyChange<'_>) {
        self.each(|l| l.property_changed(change));
    }

    pub fn starting_compound_operation(&mut self) {
        self.each(|l| l.starting_compound_operation());
    }

    pub fn finishing_compound_operation(&mut self) {
        self.each(|l| l.finishing_compound_operation());
    }

    fn each(&mut self, mut notify: impl FnMut(&mut dyn GraphModificationListener)) {
        for (_, listener) in &mut self.listeners {
            notify(listener.as_mut());
        }
    }
}

impl std::fmt::Debug for GraphListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphListeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}

/// A graph that owns a listener registry.
pub trait ObservableGraph {
    fn listeners_mut(&mut self) -> &mut GraphListeners;

    /// Run `operation` bracketed by compound-operation notifications so
    /// listeners can batch their work until it finishes.
    fn compound_operation<R>(&mut self, operation: impl FnOnce(&mut Self) -> R) -> R
    where
        Self: Sized,
    {
        self.listeners_mut().starting_compound_operation();
        let result = operation(self);
        self.listeners_mut().finishing_compound_operation();
        result
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        EntityAdded(ElementId),
        RelationRemoved(ElementId),
        Property(&'static str),
        Start,
        Finish,
    }

    struct Log {
        tag: &'static str,
        events: Rc<RefCell<Vec<(&'static str, Event)>>>,
    }

    impl GraphModificationListener for Log {
        fn entity_added(&mut self, element: ElementId) {
            self.events.borrow_mut().push((self.tag, Event::EntityAdded(element)));
        }

        fn relation_removed(&mut self, relation: ElementId) {
            self.events.borrow_mut().push((self.tag, Event::RelationRemoved(relation)));
        }

        fn property_changed(&mut self, change: PropertyChange<'_>) {
            self.events.borrow_mut().push((self.tag, Event::Property(change.property)));
        }

        fn starting_compound_operation(&mut self) {
            self.events.borrow_mut().push((self.tag, Event::Start));
        }

        fn finishing_compound_operation(&mut self) {
            self.events.borrow_mut().push((self.tag, Event::Finish));
        }
    }

    struct Graph {
        listeners: GraphListeners,
    }

    impl ObservableGraph for Graph {
        fn listeners_mut(&mut self) -> &mut GraphListeners {
            &mut self.listeners
        }
    }

    #[test]
    fn notifies_in_registration_order() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = GraphListeners::new();
        listeners.add_listener(Box::new(Log { tag: "a", events: events.clone() }));
        listeners.add_listener(Box::new(Log { tag: "b", events: events.clone() }));

        let id = ElementId::new();
        listeners.entity_added(id);

        assert_eq!(
            *events.borrow(),
            vec![("a", Event::EntityAdded(id)), ("b", Event::EntityAdded(id))]
        );
    }

    #[test]
    fn removed_listener_is_not_notified() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = GraphListeners::new();
        let a = listeners.add_listener(Box::new(Log { tag: "a", events: events.clone() }));
        listeners.add_listener(Box::new(Log { tag: "b", events: events.clone() }));

        assert!(listeners.remove_listener(a).is_some());
        assert!(listeners.remove_listener(a).is_none());
        assert_eq!(listeners.len(), 1);

        let id = ElementId::new();
        listeners.relation_removed(id);
        assert_eq!(*events.borrow(), vec![("b", Event::RelationRemoved(id))]);
    }

    #[test]
    fn unhandled_notifications_are_ignored() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = GraphListeners::new();
        listeners.add_listener(Box::new(Log { tag: "a", events: events.clone() }));

        listeners.entity_removed(ElementId::new());
        listeners.relation_added(ElementId::new());
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn compound_operation_brackets_mutations() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut graph = Graph {
            listeners: GraphListeners::new(),
        };
        graph
            .listeners
            .add_listener(Box::new(Log { tag: "a", events: events.clone() }));

        let old = PropertyValue::Null;
        let new = PropertyValue::text("orders");
        let value = graph.compound_operation(|g| {
            g.listeners.property_changed(PropertyChange {
                element: ElementId::new(),
                kind: ElementKind::Entity,
                property: "name",
                old: Some(&old),
                new: &new,
            });
            7
        });

        assert_eq!(value, 7);
        assert_eq!(
            *events.borrow(),
            vec![("a", Event::Start), ("a", Event::Property("name")), ("a", Event::Finish)]
        );
    }
}
