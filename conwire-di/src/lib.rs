//! Component definition registry with conditional registration.
//!
//! Components are described by [ComponentDeclaration](component::ComponentDeclaration)s grouped
//! into [ComponentConfiguration](component_registry::ComponentConfiguration)s. Each declaration
//! can be guarded by [Condition](component_registry::conditional::Condition)s, evaluated against
//! definitions already present in a registry hierarchy. The most common conditions check for
//! existing components by name, type or annotation - see
//! [on_component](component_registry::conditional::on_component).
//!
//! ### Features
//!
//! * `threadsafe` - use threadsafe pointers and `Send + Sync` trait bounds

pub mod component;
pub mod component_registry;
pub mod error;
