use std::fmt;
use std::rc::Rc;

use serde::Deserialize;

use crate::numeric::Real;
use crate::registry::{InstanceId, InstanceRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectIndex(pub u32);

impl fmt::Display for ObjectIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    BeginStep,
    Step,
    EndStep,
    Draw,
    Alarm(u8),
    User(u8),
}

pub type EventHandler = Rc<dyn Fn(&mut InstanceRegistry, InstanceId)>;

#[derive(Clone)]
pub struct EventBinding {
    pub category: EventCategory,
    pub handler: EventHandler,
}

impl EventBinding {
    pub fn new(
        category: EventCategory,
        handler: impl Fn(&mut InstanceRegistry, InstanceId) + 'static,
    ) -> Self {
        Self {
            category,
            handler: Rc::new(handler),
        }
    }
}

impl fmt::Debug for EventBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBinding")
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

/// Static template an instance is seeded from.
#[derive(Debug, Clone)]
pub struct ObjectDeclaration {
    pub name: String,
    pub solid: bool,
    pub visible: bool,
    pub persistent: bool,
    pub depth: Real,
    pub sprite_index: Real,
    pub mask_index: Real,
    pub events: Vec<EventBinding>,
}

impl ObjectDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            solid: false,
            visible: true,
            persistent: false,
            depth: 0.0,
            sprite_index: -1.0,
            mask_index: -1.0,
            events: Vec::new(),
        }
    }

    pub fn with_depth(mut self, depth: Real) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_event(
        mut self,
        category: EventCategory,
        handler: impl Fn(&mut InstanceRegistry, InstanceId) + 'static,
    ) -> Self {
        self.events.push(EventBinding::new(category, handler));
        self
    }

    pub fn declares(&self, category: EventCategory) -> bool {
        self.events.iter().any(|binding| binding.category == category)
    }
}

#[derive(Debug, Default, Clone)]
pub struct DeclarationTable {
    declarations: Vec<ObjectDeclaration>,
}

impl DeclarationTable {
    pub(crate) fn push(&mut self, declaration: ObjectDeclaration) -> ObjectIndex {
        let index = ObjectIndex(self.declarations.len() as u32);
        self.declarations.push(declaration);
        index
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn get(&self, index: ObjectIndex) -> Option<&ObjectDeclaration> {
        self.declarations.get(index.0 as usize)
    }

    pub fn index_by_name(&self, name: &str) -> Option<ObjectIndex> {
        self.declarations
            .iter()
            .position(|declaration| declaration.name == name)
            .map(|position| ObjectIndex(position as u32))
    }

    pub fn handler(&self, index: ObjectIndex, slot: usize) -> Option<EventHandler> {
        self.get(index)?
            .events
            .get(slot)
            .map(|binding| Rc::clone(&binding.handler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_issues_dense_indices_and_resolves_names() {
        let mut table = DeclarationTable::default();
        let wall = table.push(ObjectDeclaration::new("wall"));
        let player = table.push(ObjectDeclaration::new("player").with_depth(-10.0));
        assert_eq!(wall, ObjectIndex(0));
        assert_eq!(player, ObjectIndex(1));
        assert_eq!(table.index_by_name("player"), Some(player));
        assert_eq!(table.index_by_name("ghost"), None);
        assert_eq!(table.get(player).expect("declared").depth, -10.0);
    }

    #[test]
    fn handler_lookup_is_by_slot() {
        let mut table = DeclarationTable::default();
        let index = table.push(
            ObjectDeclaration::new("ticker")
                .with_event(EventCategory::Step, |_, _| {})
                .with_event(EventCategory::Draw, |_, _| {}),
        );
        assert!(table.handler(index, 1).is_some());
        assert!(table.handler(index, 2).is_none());
        assert!(table.handler(ObjectIndex(9), 0).is_none());
        assert!(table.get(index).expect("declared").declares(EventCategory::Draw));
    }

    #[test]
    fn categories_deserialize_in_snake_case() {
        let parsed: Vec<EventCategory> =
            serde_json::from_str(r#"["begin_step", "draw", {"alarm": 3}]"#).expect("parse");
        assert_eq!(
            parsed,
            vec![
                EventCategory::BeginStep,
                EventCategory::Draw,
                EventCategory::Alarm(3)
            ]
        );
    }
}
