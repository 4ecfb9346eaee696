//! Runtime mirrors of the engine's tagged sum types.
//!
//! The engine represents application data as Rust-style enums: unit variants,
//! tuple variants of arbitrary arity, and struct variants with named fields,
//! nested to any depth. [`UnionDefinition`] is the client-side mirror of one
//! such enum, assembled declaratively through [`UnionBuilder`] and then
//! immutable for the life of the process. Values of a union are constructed
//! through the checked constructors on the definition and travel as
//! [`UnionValue`] inside [`Value`](crate::Value).
//!
//! A definition is built once, before any concurrent use, and shared by
//! `Arc`; encode and decode only ever read it, so no locking is needed.
//!
//! # Example
//!
//! ```rust
//! use benchlink::types::{ElementType, UnionDefinition};
//!
//! let command = UnionDefinition::builder("PumpCommand")
//!     .unit("Stop")
//!     .tuple("SetFlow", [ElementType::Float])
//!     .record("Calibrate", [("gain", ElementType::Float), ("offset", ElementType::Float)])
//!     .build()?;
//!
//! let value = command.tuple_value("SetFlow", [4.5e-6.into()])?;
//! assert_eq!(value.variant_name(), "SetFlow");
//! # Ok::<(), benchlink::CodecError>(())
//! ```

use std::fmt;
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;

use crate::error::CodecError;
use crate::types::value::Value;

/// The declared type of one field of a variant, and the expected-type
/// parameter of a decode call.
///
/// `Untyped` decodes to the canonical built-in representation without
/// recovering any union constructor.
#[derive(Debug, Clone)]
pub enum ElementType {
    /// Any wire value, decoded structurally.
    Untyped,
    /// A boolean.
    Bool,
    /// A signed integer.
    Int,
    /// A double-precision float. Wire integers are widened on decode.
    Float,
    /// A text string.
    Text,
    /// A byte string.
    Bytes,
    /// An ordered sequence of one element type.
    Seq(Box<ElementType>),
    /// A mapping from text keys to one element type.
    Map(Box<ElementType>),
    /// An optional value; wire null decodes to [`Value::Null`].
    Option(Box<ElementType>),
    /// A nested union, by direct reference.
    Union(Arc<UnionDefinition>),
    /// A nested union, by forward reference resolved lazily at use.
    Ref(UnionRef),
}

impl ElementType {
    /// A sequence of `inner` elements.
    pub fn seq(inner: ElementType) -> Self {
        ElementType::Seq(Box::new(inner))
    }

    /// A text-keyed mapping of `inner` values.
    pub fn map(inner: ElementType) -> Self {
        ElementType::Map(Box::new(inner))
    }

    /// An optional `inner` value.
    pub fn option(inner: ElementType) -> Self {
        ElementType::Option(Box::new(inner))
    }
}

impl From<&Arc<UnionDefinition>> for ElementType {
    fn from(def: &Arc<UnionDefinition>) -> Self {
        ElementType::Union(def.clone())
    }
}

/// A forward reference to a union that may not be defined yet.
///
/// Enables mutually referencing unions: create the ref first, use it as an
/// element type while declaring the unions, then bind it exactly once with
/// [`UnionRef::bind`]. Encoding or decoding through an unbound ref fails with
/// [`CodecError::UnboundRef`].
#[derive(Clone, Default)]
pub struct UnionRef(Arc<OnceLock<Arc<UnionDefinition>>>);

impl UnionRef {
    /// Creates a new, unbound forward reference.
    pub fn new() -> Self {
        Self(Arc::new(OnceLock::new()))
    }

    /// Binds the reference to its target union.
    ///
    /// Fails with [`CodecError::RefAlreadyBound`] on a second bind, and with
    /// [`CodecError::CyclicUnion`] if `def` contains this very reference
    /// directly as a variant element with no intervening container — such a
    /// declaration could never terminate on the wire.
    pub fn bind(&self, def: Arc<UnionDefinition>) -> Result<(), CodecError> {
        for variant in def.variants() {
            let direct: Vec<&ElementType> = match variant.shape() {
                VariantShape::Unit => Vec::new(),
                VariantShape::Positional(elems) => elems.iter().collect(),
                VariantShape::Named(fields) => fields.values().collect(),
            };
            for elem in direct {
                if let ElementType::Ref(other) = elem {
                    if Arc::ptr_eq(&self.0, &other.0) {
                        return Err(CodecError::CyclicUnion {
                            union: def.name().to_string(),
                            variant: variant.name().to_string(),
                        });
                    }
                }
            }
        }

        self.0
            .set(def)
            .map_err(|bound| CodecError::RefAlreadyBound(bound.name().to_string()))
    }

    /// The element type designating this reference.
    pub fn element(&self) -> ElementType {
        ElementType::Ref(self.clone())
    }

    pub(crate) fn resolve(&self) -> Result<&Arc<UnionDefinition>, CodecError> {
        self.0.get().ok_or(CodecError::UnboundRef)
    }
}

impl fmt::Debug for UnionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.get() {
            Some(def) => write!(f, "UnionRef({})", def.name()),
            None => write!(f, "UnionRef(<unbound>)"),
        }
    }
}

/// The payload shape of one variant.
///
/// A zero-element `Positional` is accepted and is distinct from `Unit`: both
/// serialize with an empty field list, but round-trip reconstruction must
/// invoke the constructor matching the declared shape.
#[derive(Debug, Clone)]
pub enum VariantShape {
    /// No payload.
    Unit,
    /// An ordered payload of declared element types (possibly empty).
    Positional(Vec<ElementType>),
    /// A named-field payload. Insertion order is the declaration order and is
    /// significant for construction, but not for wire identity.
    Named(IndexMap<String, ElementType>),
}

/// Metadata for one arm of a union: discriminant name, position among
/// siblings, and payload shape.
#[derive(Debug, Clone)]
pub struct VariantDescriptor {
    name: String,
    index: usize,
    shape: VariantShape,
}

impl VariantDescriptor {
    /// The wire discriminant of this variant.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ordinal position among siblings, assigned at declaration time and
    /// stable for the union's lifetime.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The payload shape.
    pub fn shape(&self) -> &VariantShape {
        &self.shape
    }

    /// The declared field count: zero for unit variants.
    pub fn arity(&self) -> usize {
        match &self.shape {
            VariantShape::Unit => 0,
            VariantShape::Positional(elems) => elems.len(),
            VariantShape::Named(fields) => fields.len(),
        }
    }
}

/// One closed sum-type definition: a non-empty, ordered set of variant
/// descriptors sharing one logical union.
///
/// Built once through [`UnionDefinition::builder`] and immutable afterwards;
/// every encode/decode call for the type references (never copies) the same
/// definition.
#[derive(Debug)]
pub struct UnionDefinition {
    name: String,
    variants: Vec<VariantDescriptor>,
}

impl UnionDefinition {
    /// Starts declaring a union with the given type name.
    pub fn builder(name: impl Into<String>) -> UnionBuilder {
        UnionBuilder {
            name: name.into(),
            variants: Vec::new(),
        }
    }

    /// The union's type name, used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The variant descriptors, in declaration order.
    pub fn variants(&self) -> &[VariantDescriptor] {
        &self.variants
    }

    /// Looks up a variant by discriminant name.
    pub fn variant(&self, name: &str) -> Option<&VariantDescriptor> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// The element type designating this union.
    pub fn element(self: &Arc<Self>) -> ElementType {
        ElementType::Union(self.clone())
    }

    fn descriptor(&self, name: &str) -> Result<&VariantDescriptor, CodecError> {
        self.variant(name).ok_or_else(|| CodecError::UnknownVariant {
            union: self.name.clone(),
            variant: name.to_string(),
        })
    }

    /// Constructs a value of a unit variant.
    pub fn unit_value(self: &Arc<Self>, name: &str) -> Result<UnionValue, CodecError> {
        let descriptor = self.descriptor(name)?;
        match descriptor.shape() {
            VariantShape::Unit => Ok(UnionValue {
                union: self.clone(),
                index: descriptor.index,
                payload: UnionPayload::Unit,
            }),
            _ => Err(CodecError::ShapeMismatch {
                variant: name.to_string(),
                expected: "unit",
            }),
        }
    }

    /// Constructs a value of a positional variant.
    ///
    /// A zero-arity positional variant is constructed with an empty iterator;
    /// it is not interchangeable with a unit variant.
    pub fn tuple_value(
        self: &Arc<Self>,
        name: &str,
        values: impl IntoIterator<Item = Value>,
    ) -> Result<UnionValue, CodecError> {
        let descriptor = self.descriptor(name)?;
        let VariantShape::Positional(elems) = descriptor.shape() else {
            return Err(CodecError::ShapeMismatch {
                variant: name.to_string(),
                expected: "tuple",
            });
        };

        let values: Vec<Value> = values.into_iter().collect();
        if values.len() != elems.len() {
            return Err(CodecError::ArityMismatch {
                variant: name.to_string(),
                expected: elems.len(),
                actual: values.len(),
            });
        }

        Ok(UnionValue {
            union: self.clone(),
            index: descriptor.index,
            payload: UnionPayload::Tuple(values),
        })
    }

    /// Constructs a value of a named-field variant.
    ///
    /// Fields may be supplied in any order; the stored payload follows the
    /// declaration order.
    pub fn record_value(
        self: &Arc<Self>,
        name: &str,
        fields: impl IntoIterator<Item = (impl Into<String>, Value)>,
    ) -> Result<UnionValue, CodecError> {
        let descriptor = self.descriptor(name)?;
        let VariantShape::Named(declared) = descriptor.shape() else {
            return Err(CodecError::ShapeMismatch {
                variant: name.to_string(),
                expected: "record",
            });
        };

        let mut supplied: IndexMap<String, Value> = IndexMap::new();
        for (field, value) in fields {
            let field = field.into();
            if supplied.insert(field.clone(), value).is_some() {
                return Err(CodecError::Malformed(format!("duplicate field `{field}`")));
            }
        }

        if let Some(field) = supplied.keys().find(|k| !declared.contains_key(*k)) {
            return Err(CodecError::UnknownField {
                variant: name.to_string(),
                field: field.clone(),
            });
        }
        if supplied.len() != declared.len() {
            return Err(CodecError::ArityMismatch {
                variant: name.to_string(),
                expected: declared.len(),
                actual: supplied.len(),
            });
        }

        let mut payload = IndexMap::with_capacity(declared.len());
        for field in declared.keys() {
            // Every declared key is present: supplied has no unknown keys and
            // the counts match.
            if let Some(value) = supplied.shift_remove(field) {
                payload.insert(field.clone(), value);
            }
        }

        Ok(UnionValue {
            union: self.clone(),
            index: descriptor.index,
            payload: UnionPayload::Record(payload),
        })
    }

    pub(crate) fn value_from_parts(
        self: &Arc<Self>,
        index: usize,
        payload: UnionPayload,
    ) -> UnionValue {
        UnionValue {
            union: self.clone(),
            index,
            payload,
        }
    }
}

/// Declarative builder assembling sibling variants into one
/// [`UnionDefinition`].
///
/// Variant order equals declaration order. [`UnionBuilder::build`] validates
/// name uniqueness and non-emptiness.
#[derive(Debug)]
pub struct UnionBuilder {
    name: String,
    variants: Vec<VariantDescriptor>,
}

impl UnionBuilder {
    /// Declares a no-payload variant.
    pub fn unit(self, name: impl Into<String>) -> Self {
        self.push(name.into(), VariantShape::Unit)
    }

    /// Declares a positional-payload variant with the given element types.
    ///
    /// Zero element types are accepted; the resulting variant is distinct
    /// from a unit variant even though both serialize with no fields.
    pub fn tuple(
        self,
        name: impl Into<String>,
        elements: impl IntoIterator<Item = ElementType>,
    ) -> Self {
        self.push(
            name.into(),
            VariantShape::Positional(elements.into_iter().collect()),
        )
    }

    /// Declares a named-field variant. Field order is the declaration order.
    pub fn record(
        self,
        name: impl Into<String>,
        fields: impl IntoIterator<Item = (impl Into<String>, ElementType)>,
    ) -> Self {
        self.push(
            name.into(),
            VariantShape::Named(
                fields
                    .into_iter()
                    .map(|(field, elem)| (field.into(), elem))
                    .collect(),
            ),
        )
    }

    fn push(mut self, name: String, shape: VariantShape) -> Self {
        let index = self.variants.len();
        self.variants.push(VariantDescriptor { name, index, shape });
        self
    }

    /// Closes the declaration and produces the immutable definition.
    pub fn build(self) -> Result<Arc<UnionDefinition>, CodecError> {
        if self.variants.is_empty() {
            return Err(CodecError::EmptyUnion(self.name));
        }
        for (i, variant) in self.variants.iter().enumerate() {
            if self.variants[..i].iter().any(|v| v.name == variant.name) {
                return Err(CodecError::DuplicateVariantName(variant.name.clone()));
            }
        }

        Ok(Arc::new(UnionDefinition {
            name: self.name,
            variants: self.variants,
        }))
    }
}

/// The payload carried by a [`UnionValue`], matching its variant's shape.
#[derive(Debug, Clone, PartialEq)]
pub enum UnionPayload {
    /// No payload.
    Unit,
    /// Ordered positional fields.
    Tuple(Vec<Value>),
    /// Named fields, in declaration order.
    Record(IndexMap<String, Value>),
}

/// A runtime instance of a declared union, tagged with the variant it was
/// constructed from.
///
/// Only the checked constructors on [`UnionDefinition`] (and the decoder)
/// produce these, so the payload always matches the variant's declared shape.
#[derive(Clone)]
pub struct UnionValue {
    union: Arc<UnionDefinition>,
    index: usize,
    payload: UnionPayload,
}

impl UnionValue {
    /// The union this value belongs to.
    pub fn union(&self) -> &Arc<UnionDefinition> {
        &self.union
    }

    /// The descriptor of the variant this value was constructed from.
    pub fn variant(&self) -> &VariantDescriptor {
        &self.union.variants()[self.index]
    }

    /// The wire discriminant of this value.
    pub fn variant_name(&self) -> &str {
        self.variant().name()
    }

    /// The payload, matching the variant's declared shape.
    pub fn payload(&self) -> &UnionPayload {
        &self.payload
    }

    /// The positional fields, if this is a tuple-shaped value.
    pub fn fields(&self) -> Option<&[Value]> {
        match &self.payload {
            UnionPayload::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Looks up a named field, if this is a record-shaped value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match &self.payload {
            UnionPayload::Record(fields) => fields.get(name),
            _ => None,
        }
    }
}

/// Equality is structural: same union name, same variant position, equal
/// payloads. Two values decoded against independently built but identical
/// definitions compare equal.
impl PartialEq for UnionValue {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
            && self.union.name == other.union.name
            && self.payload == other.payload
    }
}

impl fmt::Debug for UnionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.union.name(), self.variant_name())?;
        match &self.payload {
            UnionPayload::Unit => Ok(()),
            UnionPayload::Tuple(items) => {
                let mut tuple = f.debug_tuple("");
                for item in items {
                    tuple.field(item);
                }
                tuple.finish()
            },
            UnionPayload::Record(fields) => {
                let mut record = f.debug_struct("");
                for (name, value) in fields {
                    record.field(name, value);
                }
                record.finish()
            },
        }
    }
}
