use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 書籍的穩定識別碼（書名不保證唯一）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub u64);

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    id: BookId,
    pub title: String,
    pub author: String,
    pub description: String,
    loan_date: Option<DateTime<Utc>>,
}

impl Book {
    pub(crate) fn new(id: BookId, title: String, author: String, description: String) -> Self {
        Self {
            id,
            title,
            author,
            description,
            loan_date: None,
        }
    }

    pub fn id(&self) -> BookId {
        self.id
    }

    /// 只有借出中的書才有借閱日期
    pub fn loan_date(&self) -> Option<DateTime<Utc>> {
        self.loan_date
    }

    pub fn is_on_loan(&self) -> bool {
        self.loan_date.is_some()
    }

    pub(crate) fn stamp_loan(&mut self, at: DateTime<Utc>) {
        self.loan_date = Some(at);
    }

    pub(crate) fn clear_loan(&mut self) {
        self.loan_date = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Librarian,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Member => "member",
            Role::Librarian => "librarian",
        };
        write!(f, "{}", label)
    }
}

/// 讀者；借閱中的書由讀者本身持有，順序即借閱順序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patron {
    name: String,
    role: Role,
    borrowed: Vec<Book>,
}

impl Patron {
    pub(crate) fn new(name: String, role: Role) -> Self {
        Self {
            name,
            role,
            borrowed: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_librarian(&self) -> bool {
        self.role == Role::Librarian
    }

    pub fn borrowed(&self) -> &[Book] {
        &self.borrowed
    }

    pub(crate) fn push_loan(&mut self, book: Book) {
        self.borrowed.push(book);
    }

    /// 穩定移除：剩餘書籍保持原本順序
    pub(crate) fn take_loan(&mut self, index: usize) -> Option<Book> {
        if index < self.borrowed.len() {
            Some(self.borrowed.remove(index))
        } else {
            None
        }
    }
}

/// 借閱期限；超過 `loan_date + term` 即逾期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanTerm(Duration);

impl LoanTerm {
    pub const DEFAULT_SECONDS: u64 = 30;

    pub fn from_secs(seconds: u64) -> Self {
        let seconds = i64::try_from(seconds).unwrap_or(i64::MAX);
        Self(Duration::try_seconds(seconds).unwrap_or(Duration::MAX))
    }

    pub fn due_date(&self, loan_date: DateTime<Utc>) -> DateTime<Utc> {
        loan_date
            .checked_add_signed(self.0)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// 剛好到期的那一刻不算逾期
    pub fn is_overdue(&self, book: &Book, now: DateTime<Utc>) -> bool {
        match book.loan_date() {
            Some(loan_date) => now > self.due_date(loan_date),
            None => false,
        }
    }
}

impl Default for LoanTerm {
    fn default() -> Self {
        Self::from_secs(Self::DEFAULT_SECONDS)
    }
}
