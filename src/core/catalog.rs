use crate::core::registry::PatronRegistry;
use crate::domain::model::{Book, BookId, Patron};
use crate::utils::error::{LibraryError, Result};

/// 館藏：擁有所有在架上的書，並負責發放書籍識別碼
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    available: Vec<Book>,
    next_id: u64,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            available: Vec::new(),
            next_id: 1,
        }
    }

    pub(crate) fn from_parts(available: Vec<Book>, next_id: u64) -> Self {
        Self { available, next_id }
    }

    /// 在架書籍，依加入順序
    pub fn list_available(&self) -> &[Book] {
        &self.available
    }

    pub fn get(&self, id: BookId) -> Option<&Book> {
        self.available.iter().find(|book| book.id() == id)
    }

    pub fn contains(&self, id: BookId) -> bool {
        self.get(id).is_some()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub(crate) fn add(&mut self, title: String, author: String, description: String) -> BookId {
        let id = BookId(self.next_id);
        self.next_id += 1;
        self.available.push(Book::new(id, title, author, description));
        id
    }

    pub(crate) fn remove(&mut self, id: BookId) -> Result<Book> {
        let position = self.position(id)?;
        Ok(self.available.remove(position))
    }

    pub(crate) fn take_for_loan(&mut self, id: BookId) -> Result<Book> {
        self.remove(id)
    }

    /// 歸還的書接在最後，不回到原本位置
    pub(crate) fn return_to_shelf(&mut self, mut book: Book) {
        book.clear_loan();
        self.available.push(book);
    }

    fn position(&self, id: BookId) -> Result<usize> {
        self.available
            .iter()
            .position(|book| book.id() == id)
            .ok_or_else(|| LibraryError::not_found("available book", id))
    }
}

/// `all_books` 中的一筆：書本身以及目前持有它的讀者
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry<'a> {
    pub book: &'a Book,
    pub borrower: Option<&'a Patron>,
}

impl CatalogEntry<'_> {
    pub fn is_available(&self) -> bool {
        self.borrower.is_none()
    }
}

/// 在架書籍在前，接著依讀者註冊順序列出各讀者借出的書。每次呼叫都重新計算。
pub fn all_books<'a>(catalog: &'a Catalog, registry: &'a PatronRegistry) -> Vec<CatalogEntry<'a>> {
    let on_shelf = catalog.list_available().iter().map(|book| CatalogEntry {
        book,
        borrower: None,
    });

    let on_loan = registry.all().iter().flat_map(|patron| {
        patron.borrowed().iter().map(move |book| CatalogEntry {
            book,
            borrower: Some(patron),
        })
    });

    on_shelf.chain(on_loan).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_with(titles: &[&str]) -> Catalog {
        let mut catalog = Catalog::new();
        for title in titles {
            catalog.add(title.to_string(), "Author".into(), String::new());
        }
        catalog
    }

    #[test]
    fn test_add_assigns_fresh_ids_in_order() {
        let mut catalog = Catalog::new();
        let a = catalog.add("A".into(), "X".into(), String::new());
        let b = catalog.add("A".into(), "X".into(), String::new());

        assert_ne!(a, b);
        let ids: Vec<_> = catalog.list_available().iter().map(Book::id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn test_remove_unknown_is_not_found() {
        let mut catalog = catalog_with(&["A"]);
        let err = catalog.remove(BookId(99)).unwrap_err();
        assert!(matches!(err, LibraryError::NotFound { .. }));
        assert_eq!(catalog.list_available().len(), 1);
    }

    #[test]
    fn test_take_and_return_appends() {
        let mut catalog = catalog_with(&["A", "B"]);
        let first = catalog.list_available()[0].id();

        let mut book = catalog.take_for_loan(first).unwrap();
        assert!(!catalog.contains(first));

        book.stamp_loan(chrono::Utc::now());
        catalog.return_to_shelf(book);

        let titles: Vec<_> = catalog.list_available().iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A"]);
        assert!(catalog.get(first).unwrap().loan_date().is_none());
    }

    #[test]
    fn test_all_books_lists_shelf_first() {
        let mut catalog = catalog_with(&["A", "B"]);
        let mut registry = PatronRegistry::default();
        registry.register("alice", crate::domain::model::Role::Member).unwrap();

        let id = catalog.list_available()[0].id();
        let mut book = catalog.take_for_loan(id).unwrap();
        book.stamp_loan(chrono::Utc::now());
        registry.find_by_name_mut("alice").unwrap().push_loan(book);

        let entries = all_books(&catalog, &registry);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].book.title, "B");
        assert!(entries[0].is_available());
        assert_eq!(entries[1].book.title, "A");
        assert_eq!(entries[1].borrower.map(Patron::name), Some("alice"));
    }
}
