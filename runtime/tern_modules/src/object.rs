//! Heap object model seen by the module layer.
//!
//! The evaluator owns language semantics; this layer only needs module
//! namespace objects with an export table, plus plain records so that
//! exports can point at other heap objects. Every `Value::Object` is a
//! traced edge and is forwarded when its referent moves.

use crate::id::ModuleId;
use crate::uri::ModuleUri;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tern_heap::{GcRef, RefVisitor, Trace};

/// A runtime value stored in an export table or record.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Undefined,
    Bool(bool),
    Int(i64),
    Str(Arc<str>),
    Object(GcRef),
}

impl Value {
    pub fn as_object(&self) -> Option<GcRef> {
        match self {
            Value::Object(r) => Some(*r),
            _ => None,
        }
    }
}

impl Trace for Value {
    #[inline]
    fn trace(&mut self, visitor: &mut dyn RefVisitor) {
        if let Value::Object(r) = self {
            visitor.visit(r);
        }
    }
}

/// A module namespace object.
#[derive(Debug)]
pub struct ModuleObject {
    id: ModuleId,
    uri: Option<ModuleUri>,
    exports: FxHashMap<String, Value>,
}

impl ModuleObject {
    /// Create an empty module namespace.
    ///
    /// `uri` is the location the module was loaded from; relative imports
    /// made by this module resolve against it.
    pub fn new(id: ModuleId, uri: Option<ModuleUri>) -> Self {
        ModuleObject {
            id,
            uri,
            exports: FxHashMap::default(),
        }
    }

    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    pub fn uri(&self) -> Option<&ModuleUri> {
        self.uri.as_ref()
    }

    pub fn export(&self, name: &str) -> Option<&Value> {
        self.exports.get(name)
    }

    pub fn set_export(&mut self, name: impl Into<String>, value: Value) {
        self.exports.insert(name.into(), value);
    }

    /// Export names in sorted order.
    pub fn export_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.exports.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Trace for ModuleObject {
    fn trace(&mut self, visitor: &mut dyn RefVisitor) {
        for value in self.exports.values_mut() {
            value.trace(visitor);
        }
    }
}

/// A plain property bag.
#[derive(Debug, Default)]
pub struct Record {
    properties: FxHashMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.properties.insert(name.into(), value);
    }
}

impl Trace for Record {
    fn trace(&mut self, visitor: &mut dyn RefVisitor) {
        for value in self.properties.values_mut() {
            value.trace(visitor);
        }
    }
}

/// Everything stored in a context's heap.
#[derive(Debug)]
pub enum HeapObject {
    Module(ModuleObject),
    Record(Record),
}

impl HeapObject {
    pub fn as_module(&self) -> Option<&ModuleObject> {
        match self {
            HeapObject::Module(module) => Some(module),
            HeapObject::Record(_) => None,
        }
    }

    pub fn as_module_mut(&mut self) -> Option<&mut ModuleObject> {
        match self {
            HeapObject::Module(module) => Some(module),
            HeapObject::Record(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            HeapObject::Record(record) => Some(record),
            HeapObject::Module(_) => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            HeapObject::Record(record) => Some(record),
            HeapObject::Module(_) => None,
        }
    }
}

impl Trace for HeapObject {
    fn trace(&mut self, visitor: &mut dyn RefVisitor) {
        match self {
            HeapObject::Module(module) => module.trace(visitor),
            HeapObject::Record(record) => record.trace(visitor),
        }
    }
}

impl From<ModuleObject> for HeapObject {
    fn from(module: ModuleObject) -> Self {
        HeapObject::Module(module)
    }
}

impl From<Record> for HeapObject {
    fn from(record: Record) -> Self {
        HeapObject::Record(record)
    }
}
