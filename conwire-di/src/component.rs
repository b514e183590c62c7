//! One of the basic blocks of conditional registration is a [ComponentDeclaration] - a named
//! definition of a component pending registration in a
//! [ComponentDefinitionRegistry](crate::component_registry::ComponentDefinitionRegistry).
//!
//! ## Describing types
//!
//! Registration conditions reason about component types in terms of assignability, annotations
//! and generic containers. Since such information is not available at runtime, each declaration
//! carries an explicit [TypeDescriptor]:
//!
//! ```
//! use conwire_di::component::{Annotation, ComponentDeclaration, TypeDescriptor};
//!
//! let marker = Annotation::new("Marker");
//! let base = TypeDescriptor::new("ExampleBean").annotated_with(marker.clone());
//! let custom = TypeDescriptor::new("CustomExampleBean").extending(&base);
//!
//! assert!(custom.is_assignable_to(&base));
//! assert!(custom.has_annotation(&marker));
//!
//! // factories expose the type of the product they create
//! let factory = TypeDescriptor::new("ExampleFactory").into_factory(Some(base.clone()));
//! let declaration = ComponentDeclaration::new("exampleFactory", factory);
//!
//! assert_eq!(declaration.produced_type(), Some(&base));
//! ```
//!
//! ## Generic containers
//!
//! A type like `Container<X>` is described by a container descriptor with an element type, which
//! makes it possible to compare element types instead of container types:
//!
//! ```
//! use conwire_di::component::TypeDescriptor;
//!
//! let element = TypeDescriptor::new("ExampleBean");
//! let container = TypeDescriptor::new("Container").parameterized_with(element.clone());
//!
//! assert_eq!(container.element_type(), Some(&element));
//! assert!(container.is_assignable_to(&TypeDescriptor::new("Container")));
//! ```

use itertools::Itertools;
use std::any::type_name;
use std::borrow::Cow;
use std::fmt::{Display, Formatter};

/// Name of the default scope, containing a single instance of a component.
pub const SINGLETON: &str = "SINGLETON";

/// Name of the scope creating a new instance of a component on each request.
pub const PROTOTYPE: &str = "PROTOTYPE";

/// Prefix used to refer to a factory declaration itself, rather than to the product it creates.
pub const FACTORY_PREFIX: &str = "&";

/// Marker identifier attached to a type or a declaration.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Annotation(Cow<'static, str>);

impl Annotation {
    pub fn new<T: Into<Cow<'static, str>>>(name: T) -> Self {
        Self(name.into())
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for Annotation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Explicit description of a component type, used for type-based matching.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TypeDescriptor {
    name: Cow<'static, str>,
    // flattened, without the type itself
    supertypes: Vec<Cow<'static, str>>,
    annotations: Vec<Annotation>,
    element: Option<Box<TypeDescriptor>>,
    is_factory: bool,
    product: Option<Box<TypeDescriptor>>,
}

impl TypeDescriptor {
    /// Creates a descriptor of a plain type with given name.
    pub fn new<T: Into<Cow<'static, str>>>(name: T) -> Self {
        Self {
            name: name.into(),
            supertypes: vec![],
            annotations: vec![],
            element: None,
            is_factory: false,
            product: None,
        }
    }

    /// Creates a descriptor named after a Rust type.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(type_name::<T>())
    }

    /// Makes this type a subtype of `parent`, inheriting its supertypes and annotations.
    pub fn extending(mut self, parent: &TypeDescriptor) -> Self {
        self.add_supertype(parent.name.clone());
        for supertype in &parent.supertypes {
            self.add_supertype(supertype.clone());
        }

        for annotation in &parent.annotations {
            if !self.annotations.contains(annotation) {
                self.annotations.push(annotation.clone());
            }
        }

        self
    }

    /// Marks this type as assignable to a type with given name, e.g. an interface.
    pub fn implementing<T: Into<Cow<'static, str>>>(mut self, name: T) -> Self {
        self.add_supertype(name.into());
        self
    }

    pub fn annotated_with(mut self, annotation: Annotation) -> Self {
        if !self.annotations.contains(&annotation) {
            self.annotations.push(annotation);
        }

        self
    }

    /// Turns this type into a generic container of `element`.
    pub fn parameterized_with(mut self, element: TypeDescriptor) -> Self {
        self.element = Some(Box::new(element));
        self
    }

    /// Marks this type as a factory creating instances of `product`. A factory with an unknown
    /// product can only be matched by type when its declaration carries an object type hint.
    pub fn into_factory(mut self, product: Option<TypeDescriptor>) -> Self {
        self.is_factory = true;
        self.product = product.map(Box::new);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    #[inline]
    pub fn has_annotation(&self, annotation: &Annotation) -> bool {
        self.annotations.contains(annotation)
    }

    #[inline]
    pub fn element_type(&self) -> Option<&TypeDescriptor> {
        self.element.as_deref()
    }

    #[inline]
    pub fn is_factory(&self) -> bool {
        self.is_factory
    }

    #[inline]
    pub fn factory_product(&self) -> Option<&TypeDescriptor> {
        self.product.as_deref()
    }

    /// Checks if a value of this type can be used where `target` is expected. A container target
    /// with an element type only accepts containers with an equally named element type, while a
    /// raw container target accepts any element.
    pub fn is_assignable_to(&self, target: &TypeDescriptor) -> bool {
        let raw_match = self.name == target.name || self.supertypes.contains(&target.name);
        raw_match
            && match (&target.element, &self.element) {
                (None, _) => true,
                (Some(target_element), Some(element)) => target_element.name == element.name,
                (Some(_), None) => false,
            }
    }

    fn add_supertype(&mut self, name: Cow<'static, str>) {
        if name != self.name && !self.supertypes.contains(&name) {
            self.supertypes.push(name);
        }
    }
}

impl Display for TypeDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        if let Some(element) = &self.element {
            write!(f, "<{element}>")?;
        }

        Ok(())
    }
}

/// A named, optionally typed and annotated definition of a component pending registration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ComponentDeclaration {
    /// Name unique within a registry.
    pub name: String,

    /// Type of the declared object. For factories, this is the type of the factory itself.
    pub declared_type: Option<TypeDescriptor>,

    /// Explicit product type for factories which do not expose one in their type.
    pub object_type_hint: Option<TypeDescriptor>,

    /// Annotations attached to the declaration itself, in addition to those on its type.
    pub annotations: Vec<Annotation>,

    /// Name of the scope for resulting instances.
    pub scope: String,

    /// Can this component be selected when searching by type.
    pub is_autowire_candidate: bool,

    /// Is this component selected by default when searching by type.
    pub is_default_candidate: bool,
}

impl ComponentDeclaration {
    pub fn new<N: ToString>(name: N, declared_type: TypeDescriptor) -> Self {
        Self {
            declared_type: Some(declared_type),
            ..Self::untyped(name)
        }
    }

    /// Creates a declaration without a known type.
    pub fn untyped<N: ToString>(name: N) -> Self {
        Self {
            name: name.to_string(),
            declared_type: None,
            object_type_hint: None,
            annotations: vec![],
            scope: SINGLETON.to_string(),
            is_autowire_candidate: true,
            is_default_candidate: true,
        }
    }

    pub fn with_object_type_hint(mut self, object_type: TypeDescriptor) -> Self {
        self.object_type_hint = Some(object_type);
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_scope<T: ToString>(mut self, scope: T) -> Self {
        self.scope = scope.to_string();
        self
    }

    pub fn with_autowire_candidate(mut self, is_autowire_candidate: bool) -> Self {
        self.is_autowire_candidate = is_autowire_candidate;
        self
    }

    pub fn with_default_candidate(mut self, is_default_candidate: bool) -> Self {
        self.is_default_candidate = is_default_candidate;
        self
    }

    /// Returns the most specific known type of instances this declaration provides. For factories
    /// that's the hinted object type or the factory product, if any.
    pub fn produced_type(&self) -> Option<&TypeDescriptor> {
        match &self.declared_type {
            Some(declared_type) if declared_type.is_factory() => self
                .object_type_hint
                .as_ref()
                .or_else(|| declared_type.factory_product()),
            Some(declared_type) => Some(declared_type),
            None => self.object_type_hint.as_ref(),
        }
    }

    #[inline]
    pub fn is_factory(&self) -> bool {
        self.declared_type
            .as_ref()
            .map(TypeDescriptor::is_factory)
            .unwrap_or(false)
    }

    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.scope == SINGLETON
    }

    /// Annotations on the declaration and on its produced type.
    pub fn all_annotations(&self) -> Vec<Annotation> {
        self.annotations
            .iter()
            .chain(
                self.produced_type()
                    .map(TypeDescriptor::annotations)
                    .unwrap_or_default(),
            )
            .unique()
            .cloned()
            .collect()
    }
}
