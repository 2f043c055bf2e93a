//! Object store for the reference runtime.

use super::value::{JsValue, ObjectId};
use crate::host::ClassId;
use std::collections::HashMap;

pub(crate) enum ObjectKind {
    Plain,
    Function { name: String },
    /// `opaque` holds a packed [`OpaqueKey`](crate::gc::OpaqueKey), the way an engine stores a pointer-sized word.
    Instance { class: ClassId, opaque: Option<u64> },
}

pub(crate) struct ObjectEntry {
    pub ref_count: u32,
    pub kind: ObjectKind,
    /// Owned reference to the prototype.
    pub proto: Option<ObjectId>,
    /// Property values are owned by the object.
    pub properties: HashMap<String, JsValue>,
}

impl ObjectEntry {
    /// Values this object owns, released when it is reclaimed.
    pub fn into_owned_values(self) -> Vec<JsValue> {
        let mut owned: Vec<JsValue> = self.properties.into_values().collect();
        if let Some(proto) = self.proto {
            owned.push(JsValue::Object(proto));
        }
        owned
    }
}

#[derive(Default)]
pub(crate) struct Heap {
    objects: HashMap<ObjectId, ObjectEntry>,
    next_id: u64,
}

impl Heap {
    /// Allocate with a reference count of one. `proto` must already be owned
    /// on behalf of the new object.
    pub fn alloc(&mut self, kind: ObjectKind, proto: Option<ObjectId>) -> ObjectId {
        self.next_id += 1;
        let id = ObjectId(self.next_id);

        self.objects.insert(
            id,
            ObjectEntry {
                ref_count: 1,
                kind,
                proto,
                properties: HashMap::new(),
            },
        );

        id
    }

    pub fn get(&self, id: ObjectId) -> Option<&ObjectEntry> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut ObjectEntry> {
        self.objects.get_mut(&id)
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<ObjectEntry> {
        self.objects.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Look `key` up on `id` and then along its prototype chain.
    pub fn lookup(&self, id: ObjectId, key: &str) -> Option<&JsValue> {
        let mut current = Some(id);

        while let Some(object_id) = current {
            let entry = self.objects.get(&object_id)?;
            if let Some(value) = entry.properties.get(key) {
                return Some(value);
            }
            current = entry.proto;
        }

        None
    }
}
