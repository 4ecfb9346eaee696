//! Core data types: runtime values, union definitions, simulation time, and
//! the opaque event key.

pub mod key;
pub mod time;
pub mod union;
pub mod value;

pub use key::EventKey;
pub use time::{Deadline, Duration, MonotonicTime};
pub use union::{
    ElementType, UnionBuilder, UnionDefinition, UnionPayload, UnionRef, UnionValue,
    VariantDescriptor, VariantShape,
};
pub use value::Value;
