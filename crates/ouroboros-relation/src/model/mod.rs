//! Model and association registry.
//!
//! Models are described by [`ModelDef`]s (built in code or deserialized from
//! YAML/JSON) and validated once into a [`Registry`]. Relations consult the
//! registry for fields, associations, through-indirections, scopes and
//! default includes; they never mutate it.

mod registry;
mod types;

pub use registry::{Model, Registry, RegistryBuilder};
pub use types::{
    AssociationDef, AssociationRef, FieldDef, JoinKeys, ModelDef, RegistryDef, Scope,
};
