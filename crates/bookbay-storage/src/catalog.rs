use crate::traits::CatalogStore;
use bookbay_core::catalog::{categories, sample_books};
use bookbay_core::{Book, Category, MarketError, Result};
use std::path::Path;

/// Immutable catalog loaded once at start-up.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    books: Vec<Book>,
    categories: Vec<Category>,
}

impl StaticCatalog {
    pub fn new(books: Vec<Book>) -> Self {
        Self {
            books,
            categories: categories(),
        }
    }

    pub fn sample() -> Self {
        Self::new(sample_books())
    }

    /// Loads a JSON array of books in the listing format.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path)
            .map_err(|e| MarketError::Internal(format!("read {}: {}", path.display(), e)))?;
        let books: Vec<Book> = serde_json::from_slice(&raw)
            .map_err(|e| MarketError::Invalid(format!("catalog {}: {}", path.display(), e)))?;
        tracing::info!(books = books.len(), path = %path.display(), "catalog loaded");
        Ok(Self::new(books))
    }
}

impl CatalogStore for StaticCatalog {
    fn books(&self) -> &[Book] {
        &self.books
    }

    fn categories(&self) -> &[Category] {
        &self.categories
    }
}
