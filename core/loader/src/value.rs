//! The exports value representation threaded through the Loader.
//!
//! The real embedding (an actual JavaScript engine) has a fully general
//! value type; this crate only needs enough of one to model what the
//! spec actually inspects or mutates: object-shaped exports that two
//! cyclically-dependent modules can hold live references into, and
//! callables that test code can invoke. See [`Environment`] for the
//! boundary where a real engine's values would be adapted to this type.
//!
//! [`Environment`]: crate::environment::Environment

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

/// A dynamically-typed exports value.
///
/// `Object` and `Function` carry reference semantics (`Rc`), which is
/// what makes the cycle-safety invariant in spec §3 work at all: two
/// modules that hold each other's `exports` see live, not snapshotted,
/// state.
#[derive(Clone)]
pub enum JsValue {
    /// The JavaScript `undefined` value.
    Undefined,
    /// The JavaScript `null` value.
    Null,
    /// A boolean.
    Boolean(bool),
    /// A double-precision number.
    Number(f64),
    /// An immutable string.
    String(Rc<str>),
    /// A property bag with reference semantics.
    Object(JsObject),
    /// A callable value.
    Function(JsFunction),
}

impl JsValue {
    /// Shorthand for constructing a string value.
    #[must_use]
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Self::String(s.into())
    }

    /// Returns `true` if this value is an object (exports containers are
    /// always objects; this is mostly useful in tests and shape
    /// extraction).
    #[must_use]
    pub fn as_object(&self) -> Option<&JsObject> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Returns `true` if this value is callable.
    #[must_use]
    pub fn as_function(&self) -> Option<&JsFunction> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }
}

impl Default for JsValue {
    fn default() -> Self {
        Self::Undefined
    }
}

impl fmt::Debug for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Object(o) => fmt::Debug::fmt(o, f),
            Self::Function(func) => fmt::Debug::fmt(func, f),
        }
    }
}

impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.is_same(b),
            (Self::Function(a), Self::Function(b)) => a.is_same(b),
            _ => false,
        }
    }
}

/// A property bag shared by reference.
///
/// This is the type a [`ModuleRecord`](crate::registry::ModuleRecord)'s
/// `exports` slot holds: it is pre-allocated empty before evaluation and
/// mutated in place, so every holder of a clone observes the same,
/// eventually-populated, data (the "mutable exports slot" design note
/// in spec §9).
#[derive(Clone, Default)]
pub struct JsObject(Rc<RefCell<IndexMap<Rc<str>, JsValue>>>);

impl JsObject {
    /// Creates a new, empty object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an object from an iterator of key/value pairs, preserving
    /// insertion order the way a real JS object literal would.
    pub fn from_entries(entries: impl IntoIterator<Item = (Rc<str>, JsValue)>) -> Self {
        Self(Rc::new(RefCell::new(entries.into_iter().collect())))
    }

    /// Reads a property, or `undefined` if absent.
    #[must_use]
    pub fn get(&self, key: &str) -> JsValue {
        self.0
            .borrow()
            .get(key)
            .cloned()
            .unwrap_or(JsValue::Undefined)
    }

    /// Sets a property.
    pub fn set(&self, key: impl Into<Rc<str>>, value: JsValue) {
        self.0.borrow_mut().insert(key.into(), value);
    }

    /// Returns `true` if the property is present.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    /// Returns the own property keys, in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<Rc<str>> {
        self.0.borrow().keys().cloned().collect()
    }

    /// Returns `true` if this and `other` refer to the same underlying
    /// object (identity, not structural equality).
    #[must_use]
    pub fn is_same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Returns the number of own properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Returns `true` if the object has no own properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

impl fmt::Debug for JsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.borrow().iter()).finish()
    }
}

/// A callable value.
#[derive(Clone)]
pub struct JsFunction(Rc<dyn Fn(&[JsValue]) -> crate::error::JsResult<JsValue>>);

impl JsFunction {
    /// Wraps a Rust closure as a callable [`JsValue`].
    pub fn new(f: impl Fn(&[JsValue]) -> crate::error::JsResult<JsValue> + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invokes the function.
    ///
    /// # Errors
    /// Propagates whatever the underlying closure returns, including a
    /// [`LoaderError::Thrown`](crate::error::LoaderError::Thrown) standing
    /// in for a user-module exception.
    pub fn call(&self, args: &[JsValue]) -> crate::error::JsResult<JsValue> {
        (self.0)(args)
    }

    /// Returns `true` if this and `other` wrap the same closure instance.
    #[must_use]
    pub fn is_same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for JsFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsFunction(..)")
    }
}
