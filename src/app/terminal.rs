use std::io::{BufRead, Write};

use crate::app::render;
use crate::core::catalog::all_books;
use crate::core::lending::{LendingEngine, Session};
use crate::core::query::{self, BookField};
use crate::core::PersistenceGateway;
use crate::domain::model::BookId;
use crate::utils::error::{LibraryError, Result};

/// 文字選單分派器：讀取使用者輸入，每個指令呼叫一次核心操作
pub struct Terminal<R: BufRead, W: Write> {
    input: R,
    output: W,
}

enum Choice {
    Index(usize),
    Back,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// 登入迴圈；空白使用者名稱或輸入結束時離開。每次登出都會儲存快照。
    pub async fn run<G>(&mut self, engine: &mut LendingEngine, gateway: &G) -> Result<()>
    where
        G: PersistenceGateway + ?Sized,
    {
        writeln!(self.output, "Welcome to Library Program")?;
        writeln!(self.output, "NOTE: Program state is only saved when logging out!")?;
        writeln!(self.output, "Please login...")?;

        let mut unsaved: Option<LibraryError> = None;

        loop {
            let Some(username) = self.prompt("Enter username (or empty string to quit): ")? else {
                break;
            };
            if username.trim().is_empty() {
                break;
            }

            let session = match engine.login(&username) {
                Ok(session) => session,
                Err(LibraryError::NotFound { .. }) => {
                    writeln!(self.output, "ERROR! Wrong username. Try again!")?;
                    continue;
                }
                Err(e) => return Err(e),
            };

            self.show_login_messages(engine, &session)?;
            self.main_menu(engine, &session)?;

            match gateway.save(&engine.snapshot()).await {
                Ok(()) => unsaved = None,
                Err(e) => {
                    tracing::error!("❌ Failed to save library state: {}", e);
                    writeln!(self.output, "ERROR: {}", e.user_friendly_message())?;
                    writeln!(self.output, "Changes are kept in memory until the next logout.")?;
                    unsaved = Some(e);
                }
            }
        }

        match unsaved {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn show_login_messages(&mut self, engine: &LendingEngine, session: &Session) -> Result<()> {
        for book in engine.overdue_notices(session)? {
            writeln!(self.output, "MESSAGE: \"{}\" is overdue!", book.title)?;
        }
        Ok(())
    }

    fn main_menu(&mut self, engine: &mut LendingEngine, session: &Session) -> Result<()> {
        loop {
            let is_librarian = engine.current_patron(session)?.is_librarian();

            writeln!(self.output)?;
            writeln!(self.output, "Main menu")?;
            writeln!(self.output, "1. Show all books")?;
            writeln!(self.output, "2. Show book details")?;
            writeln!(self.output, "3. Borrow book")?;
            writeln!(self.output, "4. Return book")?;
            writeln!(self.output, "5. Show my borrowed books")?;
            writeln!(self.output, "6. Search book")?;
            writeln!(self.output, "7. Show available books")?;
            writeln!(self.output, "8. Sort books")?;
            if is_librarian {
                writeln!(self.output, "9. Show all borrowed books          (Librarian only)")?;
                writeln!(self.output, "10. Add new book                    (Librarian only)")?;
                writeln!(self.output, "11. Remove book                     (Librarian only)")?;
                writeln!(self.output, "12. Show all users                  (Librarian only)")?;
                writeln!(self.output, "13. Search for user                 (Librarian only)")?;
                writeln!(self.output, "14. Show books borrowed by a user   (Librarian only)")?;
            }
            writeln!(self.output, "0. Logout")?;

            let Some(choice) = self.read_integer("Enter option: ")? else {
                return Ok(());
            };
            writeln!(self.output)?;

            let outcome = match choice {
                0 => return Ok(()),
                1 => self.show_all_books(engine),
                2 => self.show_book_details(engine),
                3 => self.borrow_book(engine, session),
                4 => self.return_book(engine, session),
                5 => self.show_my_loans(engine, session),
                6 => self.search_books(engine),
                7 => self.show_available_books(engine),
                8 => self.sort_books(engine),
                9 => self.show_all_loans(engine, session),
                10 => self.add_book(engine, session),
                11 => self.remove_book(engine, session),
                12 => self.show_all_patrons(engine, session),
                13 => self.search_patrons(engine, session),
                14 => self.show_loans_of_patron(engine, session),
                _ => {
                    writeln!(self.output, "ERROR: Invalid choice! Try again!")?;
                    Ok(())
                }
            };

            if let Err(e) = outcome {
                self.report(e)?;
            }
        }
    }

    /// 可復原的錯誤顯示後回到選單，其餘往上傳遞
    fn report(&mut self, error: LibraryError) -> Result<()> {
        if !error.is_recoverable() {
            return Err(error);
        }
        tracing::debug!("Rejected command: {}", error);
        writeln!(self.output, "ERROR: {}", error.user_friendly_message())?;
        Ok(())
    }

    fn show_all_books(&mut self, engine: &LendingEngine) -> Result<()> {
        for entry in all_books(engine.catalog(), engine.registry()) {
            writeln!(self.output, "{}", render::book_line(entry.book))?;
        }
        Ok(())
    }

    fn show_book_details(&mut self, engine: &LendingEngine) -> Result<()> {
        let ids: Vec<BookId> = {
            let entries = all_books(engine.catalog(), engine.registry());
            for (i, entry) in entries.iter().enumerate() {
                writeln!(self.output, "{}. {}", i + 1, render::book_line(entry.book))?;
            }
            entries.iter().map(|entry| entry.book.id()).collect()
        };

        let Choice::Index(index) =
            self.choose("Enter index of book to see its detailed info: ", ids.len())?
        else {
            return Ok(());
        };

        let entry = query::book_details(engine.catalog(), engine.registry(), ids[index])?;
        writeln!(self.output)?;
        for line in render::book_details(&entry) {
            writeln!(self.output, "{}", line)?;
        }
        Ok(())
    }

    fn borrow_book(&mut self, engine: &mut LendingEngine, session: &Session) -> Result<()> {
        let available = engine.catalog().list_available();
        if available.is_empty() {
            writeln!(self.output, "There are no books in the library!")?;
            return Ok(());
        }

        for (i, book) in available.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, render::book_line(book))?;
        }
        let ids: Vec<BookId> = available.iter().map(|book| book.id()).collect();

        let Choice::Index(index) = self.choose("Enter index of book to borrow: ", ids.len())? else {
            return Ok(());
        };

        let book = engine.borrow(session, ids[index])?;
        writeln!(self.output, "You borrowed {}", render::book_line(book))?;
        Ok(())
    }

    fn return_book(&mut self, engine: &mut LendingEngine, session: &Session) -> Result<()> {
        let borrowed = engine.current_patron(session)?.borrowed();
        if borrowed.is_empty() {
            writeln!(self.output, "You have not borrowed any books!")?;
            return Ok(());
        }

        for (i, book) in borrowed.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, book.title)?;
        }
        let len = borrowed.len();

        let Choice::Index(index) = self.choose("Enter index of book to return: ", len)? else {
            return Ok(());
        };

        let id = engine.return_book(session, index)?;
        if let Some(book) = engine.catalog().get(id) {
            writeln!(self.output, "You returned {}", render::book_line(book))?;
        }
        Ok(())
    }

    fn show_my_loans(&mut self, engine: &LendingEngine, session: &Session) -> Result<()> {
        let loans = engine.my_loans(session)?;
        if loans.is_empty() {
            writeln!(self.output, "You have not borrowed any books!")?;
            return Ok(());
        }

        for loan in &loans {
            for line in render::loan_details(loan) {
                writeln!(self.output, "{}", line)?;
            }
            writeln!(self.output)?;
        }
        Ok(())
    }

    fn search_books(&mut self, engine: &LendingEngine) -> Result<()> {
        let Some(field) = self.choose_field("Search by:", "Enter choice: ")? else {
            return Ok(());
        };
        let Some(term) = self.prompt("Enter search string: ")? else {
            return Ok(());
        };

        let hits = query::search(engine.catalog(), engine.registry(), field, &term);
        writeln!(self.output, "\nResult:")?;
        if hits.is_empty() {
            writeln!(self.output, "No results matched your criteria!")?;
        }
        for entry in hits {
            writeln!(self.output, "{}", render::book_line(entry.book))?;
        }
        Ok(())
    }

    fn show_available_books(&mut self, engine: &LendingEngine) -> Result<()> {
        for book in engine.catalog().list_available() {
            writeln!(self.output, "{}", render::book_line(book))?;
        }
        Ok(())
    }

    fn sort_books(&mut self, engine: &LendingEngine) -> Result<()> {
        let Some(field) = self.choose_field("Sort by:", "Sort by: ")? else {
            return Ok(());
        };

        for entry in query::sort_by(engine.catalog(), engine.registry(), field) {
            writeln!(self.output, "{}", render::book_line(entry.book))?;
        }
        Ok(())
    }

    fn show_all_loans(&mut self, engine: &LendingEngine, session: &Session) -> Result<()> {
        let loans = engine.all_loans(session)?;
        if loans.is_empty() {
            writeln!(self.output, "No books are currently borrowed.")?;
        }
        for loan in loans {
            let overdue = if loan.overdue { " (overdue)" } else { "" };
            writeln!(
                self.output,
                "\"{}\" borrowed by {}{}",
                loan.book.title,
                loan.borrower.name(),
                overdue
            )?;
        }
        Ok(())
    }

    fn add_book(&mut self, engine: &mut LendingEngine, session: &Session) -> Result<()> {
        engine.require_librarian(session, "add books")?;

        let Some(title) = self.prompt("Enter title: ")? else {
            return Ok(());
        };
        let Some(author) = self.prompt("Enter author: ")? else {
            return Ok(());
        };
        let Some(description) = self.prompt("Enter description: ")? else {
            return Ok(());
        };

        let id = engine.add_book(session, title, author, description)?;
        if let Some(book) = engine.catalog().get(id) {
            writeln!(self.output, "Added {}", render::book_line(book))?;
        }
        Ok(())
    }

    fn remove_book(&mut self, engine: &mut LendingEngine, session: &Session) -> Result<()> {
        engine.require_librarian(session, "remove books")?;

        let available = engine.catalog().list_available();
        for (i, book) in available.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, render::book_line(book))?;
        }
        let ids: Vec<BookId> = available.iter().map(|book| book.id()).collect();

        let Choice::Index(index) = self.choose("Enter index of book to remove: ", ids.len())? else {
            return Ok(());
        };

        let removed = engine.remove_book(session, ids[index])?;
        writeln!(self.output, "Removed {}", render::book_line(&removed))?;
        Ok(())
    }

    fn show_all_patrons(&mut self, engine: &LendingEngine, session: &Session) -> Result<()> {
        for patron in engine.list_patrons(session)? {
            writeln!(self.output, "{}", render::patron_line(patron))?;
        }
        Ok(())
    }

    fn search_patrons(&mut self, engine: &LendingEngine, session: &Session) -> Result<()> {
        engine.require_librarian(session, "search patrons")?;

        let Some(term) = self.prompt("Enter search string: ")? else {
            return Ok(());
        };
        let hits = engine.search_patrons(session, &term)?;
        if hits.is_empty() {
            writeln!(self.output, "No user with that name exist!")?;
        }
        for patron in hits {
            writeln!(self.output, "{}", patron.name())?;
        }
        Ok(())
    }

    fn show_loans_of_patron(&mut self, engine: &LendingEngine, session: &Session) -> Result<()> {
        let patrons = engine.list_patrons(session)?;
        for (i, patron) in patrons.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, patron.name())?;
        }
        let names: Vec<String> = patrons.iter().map(|p| p.name().to_string()).collect();

        let Choice::Index(index) = self.choose("Enter index of user: ", names.len())? else {
            return Ok(());
        };

        let loans = engine.loans_of(session, &names[index])?;
        if loans.is_empty() {
            writeln!(self.output, "This user has not borrowed any books!")?;
        }
        for loan in loans {
            writeln!(self.output, "{}", loan.book.title)?;
        }
        Ok(())
    }

    fn choose_field(&mut self, heading: &str, prompt: &str) -> Result<Option<BookField>> {
        loop {
            writeln!(self.output, "{}", heading)?;
            writeln!(self.output, "1. Title")?;
            writeln!(self.output, "2. Author")?;
            writeln!(self.output, "0. Exit")?;

            match self.read_integer(prompt)? {
                None | Some(0) => return Ok(None),
                Some(1) => return Ok(Some(BookField::Title)),
                Some(2) => return Ok(Some(BookField::Author)),
                Some(_) => writeln!(self.output, "ERROR: Invalid choice! Try again!")?,
            }
        }
    }

    /// 1 起算的序號，0 代表返回
    fn choose(&mut self, prompt: &str, len: usize) -> Result<Choice> {
        writeln!(self.output, "0. Exit")?;
        loop {
            match self.read_integer(prompt)? {
                None | Some(0) => return Ok(Choice::Back),
                Some(n) => match usize::try_from(n) {
                    Ok(n) if n <= len => return Ok(Choice::Index(n - 1)),
                    _ => writeln!(self.output, "ERROR: Invalid index! Try again!")?,
                },
            }
        }
    }

    fn read_integer(&mut self, prompt: &str) -> Result<Option<i64>> {
        loop {
            let Some(line) = self.prompt(prompt)? else {
                return Ok(None);
            };
            match line.trim().parse::<i64>() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => writeln!(self.output, "ERROR: Invalid integer. Try again!")?,
            }
        }
    }

    /// 輸入結束時回傳 `None`
    fn prompt(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
    }
}
