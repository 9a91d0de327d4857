//! 快照的明確編碼與解碼：館藏 + 名冊 <-> `Snapshot`

use std::collections::{HashMap, HashSet};

use crate::core::catalog::Catalog;
use crate::core::registry::PatronRegistry;
use crate::domain::model::{Book, BookId, Patron};
use crate::domain::snapshot::{BookRecord, PatronRecord, Snapshot, SNAPSHOT_VERSION};
use crate::utils::error::{LibraryError, Result};

fn book_record(book: &Book, borrower: Option<&Patron>) -> BookRecord {
    BookRecord {
        id: book.id(),
        title: book.title.clone(),
        author: book.author.clone(),
        description: book.description.clone(),
        loan_date: book.loan_date(),
        borrower: borrower.map(|p| p.name().to_string()),
    }
}

pub fn capture(catalog: &Catalog, registry: &PatronRegistry) -> Snapshot {
    let mut books: Vec<BookRecord> = catalog
        .list_available()
        .iter()
        .map(|book| book_record(book, None))
        .collect();

    let mut patrons = Vec::with_capacity(registry.len());
    for patron in registry.all() {
        books.extend(patron.borrowed().iter().map(|book| book_record(book, Some(patron))));
        patrons.push(PatronRecord {
            name: patron.name().to_string(),
            role: patron.role(),
            borrowed: patron.borrowed().iter().map(Book::id).collect(),
        });
    }

    Snapshot {
        version: SNAPSHOT_VERSION,
        next_book_id: catalog.next_id(),
        books,
        patrons,
    }
}

pub fn restore(snapshot: Snapshot) -> Result<(Catalog, PatronRegistry)> {
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(LibraryError::corrupt(format!(
            "unsupported snapshot version {}",
            snapshot.version
        )));
    }

    // next_book_id 之後還要能再配發
    if snapshot.next_book_id == u64::MAX {
        return Err(LibraryError::corrupt("next_book_id is exhausted"));
    }

    let mut seen = HashSet::new();
    let mut available = Vec::new();
    let mut on_loan: HashMap<BookId, (String, Book)> = HashMap::new();

    for record in snapshot.books {
        if !seen.insert(record.id) {
            return Err(LibraryError::corrupt(format!("book {} listed twice", record.id)));
        }
        if record.id.0 >= snapshot.next_book_id {
            return Err(LibraryError::corrupt(format!(
                "book {} is not below next_book_id {}",
                record.id, snapshot.next_book_id
            )));
        }

        let mut book = Book::new(record.id, record.title, record.author, record.description);
        match (record.loan_date, record.borrower) {
            (None, None) => available.push(book),
            (Some(loan_date), Some(borrower)) => {
                book.stamp_loan(loan_date);
                on_loan.insert(record.id, (borrower, book));
            }
            _ => {
                return Err(LibraryError::corrupt(format!(
                    "book {} must have both a loan date and a borrower, or neither",
                    record.id
                )))
            }
        }
    }

    let mut registry = PatronRegistry::new();
    for record in snapshot.patrons {
        let mut patron = Patron::new(record.name, record.role);
        for id in record.borrowed {
            let (borrower, book) = on_loan
                .remove(&id)
                .ok_or_else(|| LibraryError::corrupt(format!("'{}' holds unknown loan {}", patron.name(), id)))?;
            if borrower != patron.name() {
                return Err(LibraryError::corrupt(format!(
                    "book {} is recorded as borrowed by '{}' but listed under '{}'",
                    id,
                    borrower,
                    patron.name()
                )));
            }
            patron.push_loan(book);
        }
        registry
            .insert(patron)
            .map_err(|e| LibraryError::corrupt(e.to_string()))?;
    }

    if let Some((id, (borrower, _))) = on_loan.into_iter().next() {
        return Err(LibraryError::corrupt(format!(
            "book {} is on loan to '{}' but no patron lists it",
            id, borrower
        )));
    }

    tracing::debug!(
        "Restored {} available book(s) and {} patron(s)",
        available.len(),
        registry.len()
    );
    Ok((Catalog::from_parts(available, snapshot.next_book_id), registry))
}
