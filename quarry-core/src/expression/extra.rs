use std::{
    any::Any,
    collections::BTreeMap,
    fmt::{self, Debug},
    sync::Arc,
};

/// Open, immutable map of dialect annotations attached to an expression node.
///
/// Adding a property copies the map, nodes sharing the previous map are not affected.
#[derive(Clone, Default)]
pub struct ExtraProperties(Option<Arc<BTreeMap<&'static str, Arc<dyn Any + Send + Sync>>>>);

impl ExtraProperties {
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.0.as_ref()?.get(key)?.downcast_ref::<T>()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.as_ref().is_some_and(|v| v.contains_key(key))
    }

    pub fn with<T: Any + Send + Sync>(&self, key: &'static str, value: T) -> Self {
        let mut map = self.0.as_deref().cloned().unwrap_or_default();
        map.insert(key, Arc::new(value));
        Self(Some(Arc::new(map)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.as_ref().is_none_or(|v| v.is_empty())
    }
}

impl Debug for ExtraProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.0.iter().flat_map(|v| v.keys()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_on_write() {
        let empty = ExtraProperties::default();
        let first = empty.with("lock", 1u8);
        let second = first.with("wait", "nowait");
        assert!(empty.is_empty());
        assert_eq!(first.get::<u8>("lock"), Some(&1));
        assert!(!first.contains("wait"));
        assert_eq!(second.get::<&str>("wait"), Some(&"nowait"));
        assert_eq!(second.get::<u16>("lock"), None);
    }
}
