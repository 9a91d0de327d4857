//! 查詢與報表。所有函式都是純函式，不修改館藏或名冊。

use chrono::{DateTime, Duration, Utc};

use crate::core::catalog::{all_books, Catalog, CatalogEntry};
use crate::core::registry::PatronRegistry;
use crate::domain::model::{Book, BookId, LoanTerm, Patron};
use crate::utils::error::{LibraryError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
    Title,
    Author,
}

impl BookField {
    fn key<'a>(&self, book: &'a Book) -> &'a str {
        match self {
            BookField::Title => &book.title,
            BookField::Author => &book.author,
        }
    }
}

/// 一筆借閱：書、借閱人與到期資訊
#[derive(Debug, Clone, Copy)]
pub struct LoanView<'a> {
    pub book: &'a Book,
    pub borrower: &'a Patron,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub overdue: bool,
    /// 距離到期的時間；逾期時為負值
    pub remaining: Duration,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn search_by_title<'a>(
    catalog: &'a Catalog,
    registry: &'a PatronRegistry,
    term: &str,
) -> Vec<CatalogEntry<'a>> {
    search(catalog, registry, BookField::Title, term)
}

pub fn search_by_author<'a>(
    catalog: &'a Catalog,
    registry: &'a PatronRegistry,
    term: &str,
) -> Vec<CatalogEntry<'a>> {
    search(catalog, registry, BookField::Author, term)
}

pub fn search<'a>(
    catalog: &'a Catalog,
    registry: &'a PatronRegistry,
    field: BookField,
    term: &str,
) -> Vec<CatalogEntry<'a>> {
    let matches: Vec<_> = all_books(catalog, registry)
        .into_iter()
        .filter(|entry| contains_ignore_case(field.key(entry.book), term))
        .collect();
    tracing::debug!("🔍 {:?} search for '{}' matched {} book(s)", field, term, matches.len());
    matches
}

/// 不分大小寫的穩定排序，相同鍵值保留原本相對順序
pub fn sort_by<'a>(
    catalog: &'a Catalog,
    registry: &'a PatronRegistry,
    field: BookField,
) -> Vec<CatalogEntry<'a>> {
    let mut entries = all_books(catalog, registry);
    entries.sort_by_cached_key(|entry| field.key(entry.book).to_lowercase());
    entries
}

pub fn book_details<'a>(
    catalog: &'a Catalog,
    registry: &'a PatronRegistry,
    id: BookId,
) -> Result<CatalogEntry<'a>> {
    all_books(catalog, registry)
        .into_iter()
        .find(|entry| entry.book.id() == id)
        .ok_or_else(|| LibraryError::not_found("book", id))
}

pub(crate) fn search_patrons_by_name<'a>(registry: &'a PatronRegistry, term: &str) -> Vec<&'a Patron> {
    registry
        .all()
        .iter()
        .filter(|patron| contains_ignore_case(patron.name(), term))
        .collect()
}

pub(crate) fn loans_of(patron: &Patron, term: LoanTerm, now: DateTime<Utc>) -> Vec<LoanView<'_>> {
    patron
        .borrowed()
        .iter()
        .filter_map(|book| {
            let loan_date = book.loan_date()?;
            let due_date = term.due_date(loan_date);
            Some(LoanView {
                book,
                borrower: patron,
                loan_date,
                due_date,
                overdue: term.is_overdue(book, now),
                remaining: due_date.signed_duration_since(now),
            })
        })
        .collect()
}

pub(crate) fn all_loans(registry: &PatronRegistry, term: LoanTerm, now: DateTime<Utc>) -> Vec<LoanView<'_>> {
    registry
        .all()
        .iter()
        .flat_map(|patron| loans_of(patron, term, now))
        .collect()
}
