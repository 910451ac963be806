//! Shared, hot-reloadable access to the rule catalog.

use crate::rules::catalog::TaxRuleCatalog;
use crate::rules::config::{self, LoadError};
use arc_swap::ArcSwap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Holds the current catalog. Readers take an `Arc` snapshot per request and
/// keep using it even if a reload lands mid-computation.
pub struct CatalogHandle {
    current: ArcSwap<TaxRuleCatalog>,
    source: Option<PathBuf>,
}

impl CatalogHandle {
    pub fn new(catalog: TaxRuleCatalog) -> Self {
        CatalogHandle {
            current: ArcSwap::from_pointee(catalog),
            source: None,
        }
    }

    /// Load from a JSON rule file; `reload` re-reads the same file.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let catalog = config::catalog_from_path(path)?;
        Ok(CatalogHandle {
            current: ArcSwap::from_pointee(catalog),
            source: Some(path.to_path_buf()),
        })
    }

    #[inline]
    pub fn get(&self) -> Arc<TaxRuleCatalog> {
        self.current.load_full()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Re-read the source file and swap it in once fully validated. A failed
    /// reload keeps the current catalog.
    pub fn reload(&self) -> Result<Arc<TaxRuleCatalog>, LoadError> {
        let Some(path) = &self.source else {
            log::debug!("Catalog has no source file; reload skipped");
            return Ok(self.get());
        };
        match config::catalog_from_path(path) {
            Ok(catalog) => Ok(self.swap(catalog)),
            Err(err) => {
                log::error!("Rule reload from {} rejected: {}", path.display(), err);
                Err(err)
            }
        }
    }

    /// Swap in an already validated catalog.
    pub fn replace(&self, catalog: TaxRuleCatalog) -> Arc<TaxRuleCatalog> {
        self.swap(catalog)
    }

    fn swap(&self, catalog: TaxRuleCatalog) -> Arc<TaxRuleCatalog> {
        let next = Arc::new(catalog);
        self.current.store(Arc::clone(&next));
        log::info!(
            "Rule catalog swapped: {} version(s), digest {}",
            next.len(),
            next.digest().unwrap_or("none")
        );
        next
    }
}
