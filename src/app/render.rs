use chrono::{DateTime, Duration, Utc};

use crate::core::catalog::CatalogEntry;
use crate::core::query::LoanView;
use crate::domain::model::{Book, Patron};

pub fn book_line(book: &Book) -> String {
    format!("\"{}\" by {}", book.title, book.author)
}

pub fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// 例如 `1d 2h 3m 4s`；不足一秒顯示 `0s`
pub fn duration(span: Duration) -> String {
    let total = span.num_seconds().max(0);
    let (days, rest) = (total / 86_400, total % 86_400);
    let (hours, rest) = (rest / 3_600, rest % 3_600);
    let (minutes, seconds) = (rest / 60, rest % 60);

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{}s", seconds));
    }
    parts.join(" ")
}

pub fn book_details(entry: &CatalogEntry<'_>) -> Vec<String> {
    let mut lines = vec![
        format!("Title: {}", entry.book.title),
        format!("Author: {}", entry.book.author),
        format!("Description: {}", entry.book.description),
        format!("Available: {}", entry.is_available()),
    ];
    if let Some(borrower) = entry.borrower {
        lines.push(format!("Borrowed by: {}", borrower.name()));
    }
    lines
}

pub fn loan_details(loan: &LoanView<'_>) -> Vec<String> {
    let status = if loan.overdue {
        " (Is overdue!)".to_string()
    } else {
        format!(" (To be returned in: {})", duration(loan.remaining))
    };
    vec![
        format!("Title: {}", loan.book.title),
        format!("Author: {}", loan.book.author),
        format!("Loan date: {}", timestamp(loan.loan_date)),
        format!("Return date: {}{}", timestamp(loan.due_date), status),
    ]
}

pub fn patron_line(patron: &Patron) -> String {
    if patron.is_librarian() {
        format!("{} (librarian)", patron.name())
    } else {
        patron.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_formatting() {
        assert_eq!(duration(Duration::seconds(0)), "0s");
        assert_eq!(duration(Duration::seconds(29)), "29s");
        assert_eq!(duration(Duration::seconds(3_600)), "1h");
        assert_eq!(duration(Duration::seconds(93_784)), "1d 2h 3m 4s");
        assert_eq!(duration(Duration::seconds(-5)), "0s");
    }
}
