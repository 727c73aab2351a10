//! Process-wide datasource kind registry.
//!
//! Hosts register remote kinds here; `to_object` descriptors then
//! round-trip back into live datasources. The registry is initialized
//! lazily with the built-in kinds and never torn down.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;

use super::{Datasource, TextDatasource};
use crate::error::{ButtercupError, Result};

/// Builds a datasource from its `to_object` descriptor.
pub type DatasourceFactory = Box<dyn Fn(&Value) -> Result<Box<dyn Datasource>> + Send + Sync>;

fn registry() -> &'static Mutex<HashMap<String, DatasourceFactory>> {
    static REGISTRY: OnceLock<Mutex<HashMap<String, DatasourceFactory>>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut kinds: HashMap<String, DatasourceFactory> = HashMap::new();
        kinds.insert(
            "text".to_string(),
            Box::new(|_| Ok(Box::new(TextDatasource::new()) as Box<dyn Datasource>)),
        );
        #[cfg(not(target_arch = "wasm32"))]
        kinds.insert(
            "file".to_string(),
            Box::new(|object| {
                let path = object
                    .get("path")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ButtercupError::UnrecognizedFormat(
                        "file datasource descriptor missing 'path'".into(),
                    ))?;
                Ok(Box::new(super::FileDatasource::new(path)) as Box<dyn Datasource>)
            }),
        );
        Mutex::new(kinds)
    })
}

/// Register a datasource kind. Replaces any previous factory for the kind.
pub fn register_datasource(kind: impl Into<String>, factory: DatasourceFactory) {
    registry()
        .lock()
        .expect("datasource registry poisoned")
        .insert(kind.into(), factory);
}

/// Rebuild a datasource from a `to_object` descriptor.
pub fn datasource_from_object(object: &Value) -> Result<Box<dyn Datasource>> {
    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ButtercupError::UnrecognizedFormat("datasource descriptor missing 'type'".into())
        })?;
    let registry = registry().lock().expect("datasource registry poisoned");
    let factory = registry.get(kind).ok_or_else(|| {
        ButtercupError::UnrecognizedFormat(format!("unknown datasource type '{kind}'"))
    })?;
    factory(object)
}
