use std::sync::Arc;

use fluentree_dom::{Document, Fragment};

use crate::error::LoadError;
use crate::loadable::{LoadSource, Loadable, LoaderOptions};

/// Inventory registration entry for [`Loadable`] implementations.
pub struct LoaderRegistration {
    pub loader: &'static dyn Loadable,
}

inventory::collect!(LoaderRegistration);

/// Iterate over all loaders registered at link time.
pub fn registered_loaders() -> impl Iterator<Item = &'static dyn Loadable> {
    inventory::iter::<LoaderRegistration>.into_iter().map(|entry| entry.loader)
}

/// Register a [`Loadable`] implementation with [`LoaderRegistry::discover`].
#[macro_export]
macro_rules! register_loader {
    ($loader:expr) => {
        inventory::submit! {
            $crate::LoaderRegistration { loader: $loader }
        }
    };
}

register_loader!(&crate::csv::CsvLoader);
register_loader!(&crate::jsonml::JsonMlLoader);

impl<L: Loadable + ?Sized> Loadable for &L {
    fn id(&self) -> &'static str {
        (**self).id()
    }

    fn supported_types(&self) -> &'static [&'static str] {
        (**self).supported_types()
    }

    fn supports(&self, content_type: &str) -> bool {
        (**self).supports(content_type)
    }

    fn load(
        &self,
        source: &LoadSource,
        content_type: &str,
        options: &LoaderOptions,
    ) -> Result<Option<Document>, LoadError> {
        (**self).load(source, content_type, options)
    }

    fn load_fragment(
        &self,
        source: &LoadSource,
        content_type: &str,
        options: &LoaderOptions,
    ) -> Result<Option<Fragment>, LoadError> {
        (**self).load_fragment(source, content_type, options)
    }
}

/// Ordered set of loaders; the first one that supports a content type wins.
#[derive(Clone, Default)]
pub struct LoaderRegistry {
    loaders: Vec<Arc<dyn Loadable>>,
}

impl std::fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.loaders.iter().map(|loader| loader.id())).finish()
    }
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `loader`, replacing an earlier loader with the same id in place.
    pub fn with(mut self, loader: impl Loadable + 'static) -> Self {
        let loader: Arc<dyn Loadable> = Arc::new(loader);
        match self.loaders.iter_mut().find(|existing| existing.id() == loader.id()) {
            Some(slot) => *slot = loader,
            None => self.loaders.push(loader),
        }
        self
    }

    /// All loaders submitted through [`register_loader!`](crate::register_loader),
    /// ordered by id since link order is unspecified.
    pub fn discover() -> Self {
        let mut found: Vec<_> = registered_loaders().collect();
        found.sort_by_key(|loader| loader.id());
        let registry = found.into_iter().fold(Self::new(), |registry, loader| registry.with(loader));
        tracing::debug!(loaders = ?registry, "discovered loaders");
        registry
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.loaders.iter().map(|loader| loader.id())
    }

    pub fn get(&self, id: &str) -> Option<&dyn Loadable> {
        self.loaders.iter().find(|loader| loader.id() == id).map(|loader| &**loader)
    }

    /// First loader supporting `content_type`.
    pub fn select(&self, content_type: &str) -> Option<&dyn Loadable> {
        let selected = self.loaders.iter().find(|loader| loader.supports(content_type));
        match selected {
            Some(loader) => tracing::debug!(content_type, loader = loader.id(), "selected loader"),
            None => tracing::debug!(content_type, "no loader supports content type"),
        }
        selected.map(|loader| &**loader)
    }

    pub fn supports(&self, content_type: &str) -> bool {
        self.loaders.iter().any(|loader| loader.supports(content_type))
    }

    pub fn load(
        &self,
        source: &LoadSource,
        content_type: &str,
        options: &LoaderOptions,
    ) -> Result<Option<Document>, LoadError> {
        match self.select(content_type) {
            Some(loader) => loader.load(source, content_type, options),
            None => Ok(None),
        }
    }

    pub fn load_fragment(
        &self,
        source: &LoadSource,
        content_type: &str,
        options: &LoaderOptions,
    ) -> Result<Option<Fragment>, LoadError> {
        match self.select(content_type) {
            Some(loader) => loader.load_fragment(source, content_type, options),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_loaders_are_discovered() {
        let registry = LoaderRegistry::discover();
        let ids: Vec<_> = registry.ids().collect();
        assert_eq!(ids, vec!["csv", "jsonml"]);
        assert_eq!(registry.select("text/csv").map(|l| l.id()), Some("csv"));
        assert_eq!(registry.select("application/jsonml+json").map(|l| l.id()), Some("jsonml"));
    }

    #[test]
    fn same_id_replaces_in_place() {
        let registry = LoaderRegistry::new()
            .with(crate::csv::CsvLoader)
            .with(crate::jsonml::JsonMlLoader)
            .with(crate::csv::CsvLoader);
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["csv", "jsonml"]);
    }

    #[test]
    fn empty_registry_supports_nothing() {
        let registry = LoaderRegistry::new();
        assert!(!registry.supports("text/csv"));
        assert!(registry.get("csv").is_none());
    }
}
