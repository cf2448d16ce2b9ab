use crate::config::PropertyOrder;
use crate::error::CoreError;
use crate::ids::{ElementId, ElementKind};
use crate::value::PropertyValue;

pub type Getter<E> = fn(&E) -> Result<PropertyValue, CoreError>;
pub type Setter<E> = fn(&mut E, PropertyValue) -> Result<(), CoreError>;

/// An editable element of a diagram with a statically declared property table.
pub trait Element: 'static {
    const KIND: ElementKind;

    fn id(&self) -> ElementId;

    /// The property table for this type. Built once and shared by every instance.
    fn schema() -> &'static PropertySchema<Self>
    where
        Self: Sized;
}

pub struct PropertyDescriptor<E> {
    name: &'static str,
    getter: Option<Getter<E>>,
    setter: Option<Setter<E>>,
}

impl<E> PropertyDescriptor<E> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    pub fn read(&self, element: &E, type_name: &'static str) -> Result<PropertyValue, CoreError> {
        match self.getter {
            Some(get) => get(element),
            None => Err(CoreError::UnreadableProperty {
                type_name,
                property: self.name,
            }),
        }
    }

    /// Write `value` through the setter. Returns `Ok(false)` for read-only properties.
    pub fn write(&self, element: &mut E, value: PropertyValue) -> Result<bool, CoreError> {
        match self.setter {
            Some(set) => {
                set(element, value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Ordered property table of one element type.
///
/// Declaration order is significant: snapshots taken by a tracker are indexed
/// by position, and commands address properties by that same index.
pub struct PropertySchema<E> {
    type_name: &'static str,
    properties: Vec<PropertyDescriptor<E>>,
}

impl<E> PropertySchema<E> {
    pub fn builder(type_name: &'static str) -> PropertySchemaBuilder<E> {
        PropertySchemaBuilder {
            type_name,
            properties: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name == name)
    }

    pub fn get(&self, index: usize) -> Option<&PropertyDescriptor<E>> {
        self.properties.get(index)
    }

    pub fn find(&self, name: &str) -> Option<&PropertyDescriptor<E>> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyDescriptor<E>> {
        self.properties.iter()
    }

    pub fn read(&self, element: &E, name: &str) -> Result<PropertyValue, CoreError> {
        self.lookup(name)?.read(element, self.type_name)
    }

    pub fn write(&self, element: &mut E, name: &str, value: PropertyValue) -> Result<bool, CoreError> {
        self.lookup(name)?.write(element, value)
    }

    /// Properties sorted for presentation. Unlisted properties sort as index 0;
    /// ties keep declaration order.
    pub fn display_order(&self, order: &PropertyOrder) -> Vec<&PropertyDescriptor<E>> {
        let mut sorted: Vec<_> = self.properties.iter().collect();
        sorted.sort_by_key(|p| order.index(self.type_name, p.name));
        sorted
    }

    fn lookup(&self, name: &str) -> Result<&PropertyDescriptor<E>, CoreError> {
        self.find(name).ok_or_else(|| CoreError::UnknownProperty {
            type_name: self.type_name,
            property: name.to_string(),
        })
    }
}

pub struct PropertySchemaBuilder<E> {
    type_name: &'static str,
    properties: Vec<PropertyDescriptor<E>>,
}

impl<E> PropertySchemaBuilder<E> {
    pub fn property(mut self, name: &'static str, getter: Getter<E>, setter: Setter<E>) -> Self {
        self.properties.push(PropertyDescriptor {
            name,
            getter: Some(getter),
            setter: Some(setter),
        });
        self
    }

    pub fn read_only(mut self, name: &'static str, getter: Getter<E>) -> Self {
        self.properties.push(PropertyDescriptor {
            name,
            getter: Some(getter),
            setter: None,
        });
        self
    }

    pub fn write_only(mut self, name: &'static str, setter: Setter<E>) -> Self {
        self.properties.push(PropertyDescriptor {
            name,
            getter: None,
            setter: Some(setter),
        });
        self
    }

    pub fn build(self) -> PropertySchema<E> {
        debug_assert!(
            {
                let mut names: Vec<_> = self.properties.iter().map(|p| p.name).collect();
                names.sort_unstable();
                names.windows(2).all(|w| w[0] != w[1])
            },
            "duplicate property name in schema for {}",
            self.type_name
        );
        PropertySchema {
            type_name: self.type_name,
            properties: self.properties,
        }
    }
}
