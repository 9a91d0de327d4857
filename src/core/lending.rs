use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::catalog::Catalog;
use crate::core::query::{self, LoanView};
use crate::core::registry::PatronRegistry;
use crate::core::snapshot::{capture, restore};
use crate::domain::model::{Book, BookId, LoanTerm, Patron};
use crate::domain::ports::Clock;
use crate::domain::snapshot::Snapshot;
use crate::utils::error::{LibraryError, Result};

/// 已登入的讀者；只能透過 `LendingEngine::login` 取得
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    patron: String,
}

impl Session {
    pub fn patron_name(&self) -> &str {
        &self.patron
    }
}

/// 借還書狀態機：
///
/// ```text
/// AVAILABLE --borrow(patron)--> ON_LOAN(patron, loan_date)
/// ON_LOAN(patron, loan_date) --return(index)--> AVAILABLE
/// ```
///
/// 每個轉換都是全有或全無；失敗時館藏與名冊都不會被修改。
pub struct LendingEngine {
    catalog: Catalog,
    registry: PatronRegistry,
    loan_term: LoanTerm,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for LendingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LendingEngine")
            .field("catalog", &self.catalog)
            .field("registry", &self.registry)
            .field("loan_term", &self.loan_term)
            .finish_non_exhaustive()
    }
}

impl LendingEngine {
    pub fn new(
        catalog: Catalog,
        registry: PatronRegistry,
        loan_term: LoanTerm,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            registry,
            loan_term,
            clock,
        }
    }

    pub fn from_snapshot(
        snapshot: Snapshot,
        loan_term: LoanTerm,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let (catalog, registry) = restore(snapshot)?;
        Ok(Self::new(catalog, registry, loan_term, clock))
    }

    pub fn snapshot(&self) -> Snapshot {
        capture(&self.catalog, &self.registry)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn registry(&self) -> &PatronRegistry {
        &self.registry
    }

    pub fn loan_term(&self) -> LoanTerm {
        self.loan_term
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn login(&self, name: &str) -> Result<Session> {
        let patron = self.registry.find_by_name(name)?;
        tracing::info!("👤 {} '{}' logged in", patron.role(), patron.name());
        Ok(Session {
            patron: patron.name().to_string(),
        })
    }

    pub fn current_patron(&self, session: &Session) -> Result<&Patron> {
        self.registry.find_by_name(&session.patron)
    }

    pub fn borrow(&mut self, session: &Session, id: BookId) -> Result<&Book> {
        // 先確認讀者存在，避免書已下架卻找不到借閱人
        let patron = self.registry.find_by_name_mut(&session.patron)?;
        let mut book = self.catalog.take_for_loan(id)?;

        book.stamp_loan(self.clock.now());
        tracing::info!("📕 '{}' borrowed \"{}\" ({})", patron.name(), book.title, id);
        patron.push_loan(book);

        let borrowed = patron.borrowed();
        Ok(&borrowed[borrowed.len() - 1])
    }

    /// `index` 為該讀者借閱清單中的位置（從 0 起算）
    pub fn return_book(&mut self, session: &Session, index: usize) -> Result<BookId> {
        let patron = self.registry.find_by_name_mut(&session.patron)?;
        let len = patron.borrowed().len();
        let book = patron
            .take_loan(index)
            .ok_or(LibraryError::IndexOutOfRange { index, len })?;

        let id = book.id();
        tracing::info!("📗 '{}' returned \"{}\" ({})", patron.name(), book.title, id);
        self.catalog.return_to_shelf(book);
        Ok(id)
    }

    pub fn is_overdue(&self, book: &Book) -> bool {
        self.loan_term.is_overdue(book, self.clock.now())
    }

    /// 登入時提醒用：目前讀者已逾期的書
    pub fn overdue_notices(&self, session: &Session) -> Result<Vec<&Book>> {
        let patron = self.current_patron(session)?;
        Ok(patron
            .borrowed()
            .iter()
            .filter(|book| self.is_overdue(book))
            .collect())
    }

    pub fn my_loans(&self, session: &Session) -> Result<Vec<LoanView<'_>>> {
        let patron = self.current_patron(session)?;
        Ok(query::loans_of(patron, self.loan_term, self.clock.now()))
    }

    pub fn add_book(
        &mut self,
        session: &Session,
        title: impl Into<String>,
        author: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<BookId> {
        self.require_librarian(session, "add books")?;
        let id = self
            .catalog
            .add(title.into(), author.into(), description.into());
        tracing::info!("➕ '{}' added book {}", session.patron, id);
        Ok(id)
    }

    /// 只能移除在架上的書；借出中的書回傳 `NotFound`
    pub fn remove_book(&mut self, session: &Session, id: BookId) -> Result<Book> {
        self.require_librarian(session, "remove books")?;
        let book = self.catalog.remove(id)?;
        tracing::info!("➖ '{}' removed \"{}\" ({})", session.patron, book.title, id);
        Ok(book)
    }

    pub fn list_patrons(&self, session: &Session) -> Result<&[Patron]> {
        self.require_librarian(session, "list patrons")?;
        Ok(self.registry.all())
    }

    pub fn all_loans(&self, session: &Session) -> Result<Vec<LoanView<'_>>> {
        self.require_librarian(session, "list all loans")?;
        Ok(query::all_loans(
            &self.registry,
            self.loan_term,
            self.clock.now(),
        ))
    }

    pub fn search_patrons(&self, session: &Session, term: &str) -> Result<Vec<&Patron>> {
        self.require_librarian(session, "search patrons")?;
        Ok(query::search_patrons_by_name(&self.registry, term))
    }

    pub fn loans_of(&self, session: &Session, patron_name: &str) -> Result<Vec<LoanView<'_>>> {
        self.require_librarian(session, "view another patron's loans")?;
        let patron = self.registry.find_by_name(patron_name)?;
        Ok(query::loans_of(patron, self.loan_term, self.clock.now()))
    }

    pub fn require_librarian(&self, session: &Session, action: &'static str) -> Result<&Patron> {
        let patron = self.current_patron(session)?;
        if self.registry.is_librarian(patron) {
            Ok(patron)
        } else {
            tracing::warn!("🚫 '{}' tried to {} without librarian role", patron.name(), action);
            Err(LibraryError::Unauthorized {
                patron: patron.name().to_string(),
                action,
            })
        }
    }
}
