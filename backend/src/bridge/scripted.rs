//! Scripted foreign objects
//!
//! [`ScriptedObject`] is an in-process [`ForeignObject`] assembled from
//! closures and constant attributes. Embedders use it to synthesize foreign
//! objects (e.g. replaying a recorded session); the test suites use it as the
//! foreign runtime.

use super::{BridgeError, ForeignObject, ForeignRef, ForeignValue, Member};
use std::any::Any;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

type MethodFn = Box<dyn Fn(&[ForeignValue]) -> Result<ForeignValue, BridgeError>>;

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

/// Foreign object backed by Rust closures
pub struct ScriptedObject {
    type_name: String,
    identity: u64,
    equality_key: Option<String>,
    repr: Option<String>,
    methods: BTreeMap<String, MethodFn>,
    attributes: BTreeMap<String, ForeignValue>,
}

impl ScriptedObject {
    /// Create an object with a fresh identity and no capabilities
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            identity: NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed),
            equality_key: None,
            repr: None,
            methods: BTreeMap::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Add a callable member
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[ForeignValue]) -> Result<ForeignValue, BridgeError> + 'static,
    {
        self.methods.insert(name.into(), Box::new(f));
        self
    }

    /// Add a callable member that always returns `value`
    pub fn returning(self, name: impl Into<String>, value: ForeignValue) -> Self {
        self.method(name, move |_| Ok(value.clone()))
    }

    /// Add a callable member that always raises
    pub fn failing(self, name: impl Into<String>, message: impl Into<String>) -> Self {
        let name = name.into();
        let message = message.into();
        let call_name = name.clone();
        self.method(name, move |_| {
            Err(BridgeError::CallFailed {
                name: call_name.clone(),
                message: message.clone(),
            })
        })
    }

    /// Add a plain (non-callable) attribute
    pub fn attribute(mut self, name: impl Into<String>, value: ForeignValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Foreign-side equality key: objects with the same key are equal on the
    /// foreign side even when their host identities differ.
    pub fn equality_key(mut self, key: impl Into<String>) -> Self {
        self.equality_key = Some(key.into());
        self
    }

    /// Reuse an existing identity (an alias of another handle)
    pub fn with_identity(mut self, identity: u64) -> Self {
        self.identity = identity;
        self
    }

    pub fn describe_as(mut self, repr: impl Into<String>) -> Self {
        self.repr = Some(repr.into());
        self
    }

    pub fn into_ref(self) -> ForeignRef {
        Rc::new(self)
    }
}

impl ForeignObject for ScriptedObject {
    fn type_name(&self) -> String {
        self.type_name.clone()
    }

    fn identity(&self) -> u64 {
        self.identity
    }

    fn has_capability(&self, name: &str) -> bool {
        self.methods.contains_key(name) || self.attributes.contains_key(name)
    }

    fn invoke(&self, name: &str, args: &[ForeignValue]) -> Result<ForeignValue, BridgeError> {
        if let Some(method) = self.methods.get(name) {
            return method(args);
        }
        if let Some(value) = self.attributes.get(name) {
            return Ok(value.clone());
        }
        Err(BridgeError::MissingCapability(name.to_string()))
    }

    fn foreign_eq(&self, other: &dyn ForeignObject) -> bool {
        match other.as_any().downcast_ref::<ScriptedObject>() {
            Some(other) => match (&self.equality_key, &other.equality_key) {
                (Some(a), Some(b)) => a == b,
                _ => self.identity == other.identity,
            },
            None => false,
        }
    }

    fn foreign_hash(&self) -> u64 {
        match &self.equality_key {
            Some(key) => {
                let mut hasher = DefaultHasher::new();
                key.hash(&mut hasher);
                hasher.finish()
            }
            None => self.identity,
        }
    }

    fn members(&self) -> Vec<Member> {
        let attributes = self.attributes.keys().map(|name| Member::attribute(name.clone()));
        let methods = self.methods.keys().map(|name| Member::method(name.clone()));
        attributes.chain(methods).collect()
    }

    fn describe(&self) -> String {
        match &self.repr {
            Some(repr) => repr.clone(),
            None => format!("<{} #{}>", self.type_name, self.identity),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
