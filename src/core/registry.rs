use crate::domain::model::{Patron, Role};
use crate::utils::error::{LibraryError, Result};

/// 讀者名冊，依註冊順序保存。名稱即帳號，必須唯一。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatronRegistry {
    patrons: Vec<Patron>,
}

impl PatronRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, role: Role) -> Result<&Patron> {
        self.insert(Patron::new(name.into(), role))
    }

    pub(crate) fn insert(&mut self, patron: Patron) -> Result<&Patron> {
        if self.patrons.iter().any(|p| p.name() == patron.name()) {
            return Err(LibraryError::DuplicatePatron {
                name: patron.name().to_string(),
            });
        }
        tracing::debug!("Registered {} '{}'", patron.role(), patron.name());
        self.patrons.push(patron);
        let index = self.patrons.len() - 1;
        Ok(&self.patrons[index])
    }

    /// 精確比對（區分大小寫）
    pub fn find_by_name(&self, name: &str) -> Result<&Patron> {
        self.patrons
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| LibraryError::not_found("patron", name))
    }

    pub(crate) fn find_by_name_mut(&mut self, name: &str) -> Result<&mut Patron> {
        self.patrons
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| LibraryError::not_found("patron", name))
    }

    pub fn all(&self) -> &[Patron] {
        &self.patrons
    }

    pub fn is_librarian(&self, patron: &Patron) -> bool {
        patron.role() == Role::Librarian
    }

    pub fn len(&self) -> usize {
        self.patrons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patrons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_rejects_duplicate_names() {
        let mut registry = PatronRegistry::new();
        registry.register("johan", Role::Member).unwrap();

        let err = registry.register("johan", Role::Librarian).unwrap_err();
        assert!(matches!(err, LibraryError::DuplicatePatron { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_find_by_name_is_case_sensitive() {
        let mut registry = PatronRegistry::new();
        registry.register("admin", Role::Librarian).unwrap();

        assert!(registry.find_by_name("admin").is_ok());
        assert!(matches!(
            registry.find_by_name("Admin"),
            Err(LibraryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_all_keeps_registration_order() {
        let mut registry = PatronRegistry::new();
        for name in ["peter", "admin", "kalle"] {
            registry.register(name, Role::Member).unwrap();
        }
        let names: Vec<_> = registry.all().iter().map(Patron::name).collect();
        assert_eq!(names, vec!["peter", "admin", "kalle"]);
    }

    #[test]
    fn test_is_librarian() {
        let mut registry = PatronRegistry::new();
        registry.register("admin", Role::Librarian).unwrap();
        registry.register("johan", Role::Member).unwrap();

        assert!(registry.is_librarian(registry.find_by_name("admin").unwrap()));
        assert!(!registry.is_librarian(registry.find_by_name("johan").unwrap()));
    }
}
