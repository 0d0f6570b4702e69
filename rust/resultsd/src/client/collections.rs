use super::normalize::{coerce_list, coerce_map};
use super::ResultsClient;
use crate::store::{sanitize_key, DbPath};
use serde_json::{Map, Value};
use tracing::{debug, warn};

const SESSIONS_PATH: &str = "sessions";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    List,
    Map,
}

/// The whole-value collections kept at fixed top-level paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Teachers,
    Students,
    Marks,
    DepartmentData,
    ClassSubjects,
    ProformaA,
    ProformaB,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Teachers,
        Collection::Students,
        Collection::Marks,
        Collection::DepartmentData,
        Collection::ClassSubjects,
        Collection::ProformaA,
        Collection::ProformaB,
    ];

    /// Tree path, which is also the collection's wire name.
    pub fn path(self) -> &'static str {
        match self {
            Collection::Teachers => "teachers",
            Collection::Students => "students",
            Collection::Marks => "marks",
            Collection::DepartmentData => "departmentData",
            Collection::ClassSubjects => "classSubjects",
            Collection::ProformaA => "proformaA",
            Collection::ProformaB => "proformaB",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.path() == name)
    }

    pub fn shape(self) -> Shape {
        match self {
            Collection::Teachers | Collection::Students | Collection::Marks => Shape::List,
            _ => Shape::Map,
        }
    }

    /// `[]` or `{}`.
    pub fn empty(self) -> Value {
        match self.shape() {
            Shape::List => Value::Array(Vec::new()),
            Shape::Map => Value::Object(Map::new()),
        }
    }

    pub fn normalize(self, value: Value) -> Value {
        match self.shape() {
            Shape::List => Value::Array(coerce_list(value)),
            Shape::Map => Value::Object(coerce_map(value)),
        }
    }

    fn db_path(self) -> DbPath {
        DbPath::top_level(self.path())
    }
}

/// Rekeys proforma-A entries with sanitized keys and keeps the original key
/// in each entry's `originalEmail`.
pub(crate) fn sanitize_proforma_a(value: Value) -> Value {
    let Value::Object(entries) = value else {
        return value;
    };
    let mut out = Map::new();
    for (key, entry) in entries {
        let entry = match entry {
            Value::Object(mut obj) => {
                obj.insert("originalEmail".into(), Value::String(key.clone()));
                Value::Object(obj)
            }
            Value::Null => continue,
            other => {
                let mut obj = Map::new();
                obj.insert("value".into(), other);
                obj.insert("originalEmail".into(), Value::String(key.clone()));
                Value::Object(obj)
            }
        };
        out.insert(sanitize_key(&key), entry);
    }
    Value::Object(out)
}

impl ResultsClient {
    /// Overwrites the collection. `false` when not connected or the write
    /// failed.
    pub fn save(&self, collection: Collection, value: Value) -> bool {
        let value = match collection {
            Collection::ProformaA => sanitize_proforma_a(value),
            _ => value,
        };
        let path = collection.db_path();
        let saved = self.guarded("set", &path, |s| s.set(&path, value)).is_ok();
        if saved {
            debug!(collection = collection.path(), "saved");
        }
        saved
    }

    /// Reads the collection, normalized to its shape. The empty default when
    /// absent, not connected, or the read failed.
    pub fn get(&self, collection: Collection) -> Value {
        let path = collection.db_path();
        match self.guarded("get", &path, |s| s.get(&path)) {
            Ok(value) => collection.normalize(value),
            Err(_) => collection.empty(),
        }
    }

    fn get_list(&self, collection: Collection) -> Vec<Value> {
        coerce_list(self.get(collection))
    }

    fn get_map(&self, collection: Collection) -> Map<String, Value> {
        coerce_map(self.get(collection))
    }

    pub fn save_teachers(&self, teachers: Vec<Value>) -> bool {
        self.save(Collection::Teachers, Value::Array(teachers))
    }

    pub fn get_teachers(&self) -> Vec<Value> {
        self.get_list(Collection::Teachers)
    }

    pub fn save_students(&self, students: Vec<Value>) -> bool {
        self.save(Collection::Students, Value::Array(students))
    }

    pub fn get_students(&self) -> Vec<Value> {
        self.get_list(Collection::Students)
    }

    pub fn save_marks(&self, marks: Vec<Value>) -> bool {
        self.save(Collection::Marks, Value::Array(marks))
    }

    pub fn get_marks(&self) -> Vec<Value> {
        self.get_list(Collection::Marks)
    }

    pub fn save_department_data(&self, data: Map<String, Value>) -> bool {
        self.save(Collection::DepartmentData, Value::Object(data))
    }

    pub fn get_department_data(&self) -> Map<String, Value> {
        self.get_map(Collection::DepartmentData)
    }

    pub fn save_class_subjects(&self, data: Map<String, Value>) -> bool {
        self.save(Collection::ClassSubjects, Value::Object(data))
    }

    pub fn get_class_subjects(&self) -> Map<String, Value> {
        self.get_map(Collection::ClassSubjects)
    }

    pub fn save_proforma_a(&self, data: Map<String, Value>) -> bool {
        self.save(Collection::ProformaA, Value::Object(data))
    }

    pub fn get_proforma_a(&self) -> Map<String, Value> {
        self.get_map(Collection::ProformaA)
    }

    pub fn save_proforma_b(&self, data: Map<String, Value>) -> bool {
        self.save(Collection::ProformaB, Value::Object(data))
    }

    pub fn get_proforma_b(&self) -> Map<String, Value> {
        self.get_map(Collection::ProformaB)
    }

    pub fn save_session(&self, session_id: &str, value: Value) -> bool {
        let path = match DbPath::parse(SESSIONS_PATH).and_then(|p| p.child(session_id)) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "rejected session id");
                return false;
            }
        };
        self.guarded("set", &path, |s| s.set(&path, value)).is_ok()
    }

    pub fn get_session(&self, session_id: &str) -> Option<Value> {
        let path = DbPath::parse(SESSIONS_PATH)
            .and_then(|p| p.child(session_id))
            .ok()?;
        let value = self.guarded("get", &path, |s| s.get(&path)).ok()?;
        (!value.is_null()).then_some(value)
    }

    /// Removes every session, not just one.
    pub fn clear_session(&self) -> bool {
        let path = match DbPath::parse(SESSIONS_PATH) {
            Ok(p) => p,
            Err(_) => return false,
        };
        self.guarded("remove", &path, |s| s.remove(&path)).is_ok()
    }
}
