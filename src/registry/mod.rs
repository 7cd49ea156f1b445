use std::any::Any;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

type BuiltSystem = Arc<dyn Any + Send + Sync>;
type Factory = Box<dyn Fn(&str, &Registry) -> anyhow::Result<BuiltSystem> + Send + Sync>;

struct SystemSpec {
    data_file: PathBuf,
    factory: Factory,
}

/// Process-wide lazy dependency container. Systems (the move catalogue, the
/// fighter catalogue, battle config, ...) are registered by name against a
/// JSON file and a factory; `get` builds and caches on first access.
pub struct Registry {
    data_root: PathBuf,
    specs: RwLock<HashMap<String, Arc<SystemSpec>>>,
    cache: RwLock<HashMap<String, BuiltSystem>>,
}

impl Registry {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Registry {
            data_root: data_root.into(),
            specs: RwLock::new(HashMap::new()),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Register a system under `name`, reading `data_file` from the
    /// registry's data root, parsing it as `T`, and handing the parsed
    /// config to `factory` to build the cached instance.
    pub fn add_spec<T, F, S>(
        &self,
        name: &str,
        data_file: impl Into<PathBuf>,
        factory: F,
    ) -> anyhow::Result<()>
    where
        T: serde::de::DeserializeOwned + 'static,
        F: Fn(T, &Registry) -> anyhow::Result<S> + Send + Sync + 'static,
        S: Send + Sync + 'static,
    {
        if self.specs.read().unwrap().contains_key(name) {
            anyhow::bail!("system already registered: {name}");
        }
        let owned_name = name.to_string();
        let wrapped: Factory = Box::new(move |raw, registry| {
            let parsed: T = serde_json::from_str(raw)
                .map_err(|e| anyhow::anyhow!("failed to parse {owned_name}: {e}"))?;
            let built = factory(parsed, registry)?;
            Ok(Arc::new(built) as BuiltSystem)
        });
        self.specs.write().unwrap().insert(
            name.to_string(),
            Arc::new(SystemSpec {
                data_file: data_file.into(),
                factory: wrapped,
            }),
        );
        Ok(())
    }

    /// Build (or return the cached) system for `name` as its type-erased
    /// `Arc`. Prefer [`Registry::get`] for a typed handle.
    pub fn build(&self, name: &str) -> anyhow::Result<BuiltSystem> {
        if let Some(existing) = self.cache.read().unwrap().get(name) {
            return Ok(existing.clone());
        }
        let spec = self
            .specs
            .read()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no system registered: {name}"))?;
        let path = self.data_root.join(&spec.data_file);
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        log::debug!("building system '{name}' from {}", path.display());
        let built = (spec.factory)(&raw, self)?;
        self.cache
            .write()
            .unwrap()
            .insert(name.to_string(), built.clone());
        Ok(built)
    }

    /// Build every registered system eagerly. Any single failure aborts
    /// the whole pass; no partial registry is left usable.
    pub fn build_all(&self) -> anyhow::Result<()> {
        let names: Vec<String> = self.specs.read().unwrap().keys().cloned().collect();
        for name in names {
            self.build(&name)?;
        }
        Ok(())
    }

    /// Build (on first call) and return a typed handle to system `name`.
    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> anyhow::Result<Arc<T>> {
        let built = self.build(name)?;
        built
            .downcast::<T>()
            .map_err(|_| anyhow::anyhow!("system '{name}' is not of the requested type"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(dir: &std::path::Path, name: &str, contents: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn build_caches_and_reuses() {
        let dir = std::env::temp_dir().join(format!("skirmish-registry-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        write_fixture(&dir, "count.json", "3");

        let registry = Registry::new(&dir);
        registry
            .add_spec::<i64, _, i64>("count", "count.json", |n, _| Ok(n))
            .unwrap();

        let first: Arc<i64> = registry.get("count").unwrap();
        let second: Arc<i64> = registry.get("count").unwrap();
        assert_eq!(*first, 3);
        assert!(Arc::ptr_eq(&first, &second));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn duplicate_name_fails() {
        let registry = Registry::new(".");
        registry
            .add_spec::<i64, _, i64>("dup", "a.json", |n, _| Ok(n))
            .unwrap();
        assert!(registry
            .add_spec::<i64, _, i64>("dup", "b.json", |n, _| Ok(n))
            .is_err());
    }

    #[test]
    fn unregistered_name_fails() {
        let registry = Registry::new(".");
        assert!(registry.build("missing").is_err());
    }
}
