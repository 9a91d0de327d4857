use crate::core::catalog::Catalog;
use crate::core::registry::PatronRegistry;
use crate::domain::model::Role;
use crate::utils::error::Result;

const DEFAULT_BOOKS: [(&str, &str); 5] = [
    ("Harry Potter and the Philosopher's Stone", "Rowling, J.K."),
    ("A Confederacy of Dunces", "Toole, John Kennedy"),
    ("The Lord of the Rings", "Tolkien, J. R. R."),
    ("Effective Java", "Bloch, Joshua"),
    ("Nineteen Eighty Four", "Orwell, George"),
];

const DEFAULT_PATRONS: [(&str, Role); 4] = [
    ("johan", Role::Member),
    ("peter", Role::Member),
    ("kalle", Role::Member),
    ("admin", Role::Librarian),
];

/// 第一次啟動、尚無快照時使用的預設資料
pub fn default_library() -> Result<(Catalog, PatronRegistry)> {
    let mut catalog = Catalog::new();
    for (title, author) in DEFAULT_BOOKS {
        catalog.add(title.to_string(), author.to_string(), "Bla bla bla...".to_string());
    }

    let mut registry = PatronRegistry::new();
    for (name, role) in DEFAULT_PATRONS {
        registry.register(name, role)?;
    }

    tracing::info!(
        "📚 Seeded default library with {} books and {} patrons",
        catalog.list_available().len(),
        registry.len()
    );
    Ok((catalog, registry))
}
