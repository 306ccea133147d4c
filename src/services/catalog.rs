//! Catalog browsing and editing service

use chrono::NaiveDate;

use crate::{
    error::AppResult,
    models::{
        author::{AuthorFormValues, CreateAuthor, UpdateAuthor},
        book::{display_genre, BookForm},
        Author, AuthorDetail, Book, BookDetail, BookShort, LoanStatus, Page,
    },
    repository::Repository,
};

/// Word whose occurrences in titles the summary reports
pub const TITLE_WORD: &str = "Warcraft";

/// Record counts shown on the catalog home page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogCounts {
    pub books: i64,
    pub instances: i64,
    pub instances_available: i64,
    pub authors: i64,
    pub genres: i64,
    pub books_with_title_word: i64,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Round-trip to the database
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.repository.pool).await?;
        Ok(())
    }

    pub async fn counts(&self) -> AppResult<CatalogCounts> {
        let repo = &self.repository;
        Ok(CatalogCounts {
            books: repo.books.count().await?,
            instances: repo.instances.count().await?,
            instances_available: repo.instances.count_with_status(LoanStatus::Available).await?,
            authors: repo.authors.count().await?,
            genres: repo.books.count_genres().await?,
            books_with_title_word: repo.books.count_title_containing(TITLE_WORD).await?,
        })
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    pub async fn list_books(&self, page: Option<i64>) -> AppResult<(Vec<BookShort>, Page)> {
        let total = self.repository.books.count().await?;
        let page = Page::resolve(page, total)?;
        let books = self.repository.books.list(&page).await?;
        Ok((books, page))
    }

    /// Book with its author, language, genres and copies, overdue as of `today`
    pub async fn get_book(&self, id: i32, today: NaiveDate) -> AppResult<BookDetail> {
        let book = self.repository.books.get_by_id(id).await?;

        let author = match book.author_id {
            Some(author_id) => self.repository.books.get_author(author_id).await?,
            None => None,
        };
        let language = match book.language_id {
            Some(language_id) => self.repository.books.get_language(language_id).await?,
            None => None,
        };
        let genres = self.repository.books.get_genres(id).await?;
        let mut instances = self.repository.instances.list_for_book(id).await?;
        for instance in &mut instances {
            instance.mark_overdue(today);
        }

        Ok(BookDetail {
            id: book.id,
            title: book.title,
            summary: book.summary,
            isbn: book.isbn,
            author,
            language,
            genre_display: display_genre(&genres),
            genres,
            instances,
        })
    }

    /// Current values of every editable book field
    pub async fn book_form(&self, id: i32) -> AppResult<BookForm> {
        let book = self.repository.books.get_by_id(id).await?;
        let genre_ids = self
            .repository
            .books
            .get_genres(id)
            .await?
            .into_iter()
            .map(|g| g.id)
            .collect();
        Ok(BookForm::from_book(&book, genre_ids))
    }

    pub async fn create_book(&self, mut form: BookForm) -> AppResult<Book> {
        form.clean()?;
        let book = self.repository.books.create(&form).await?;
        tracing::info!("Created book id={} title={:?}", book.id, book.title);
        Ok(book)
    }

    pub async fn update_book(&self, id: i32, mut form: BookForm) -> AppResult<Book> {
        form.clean()?;
        let book = self.repository.books.update(id, &form).await?;
        tracing::info!("Updated book id={}", book.id);
        Ok(book)
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!("Deleted book id={}", id);
        Ok(())
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    pub async fn list_authors(&self, page: Option<i64>) -> AppResult<(Vec<Author>, Page)> {
        let total = self.repository.authors.count().await?;
        let page = Page::resolve(page, total)?;
        let authors = self.repository.authors.list(&page).await?;
        Ok((authors, page))
    }

    /// Author with the books attributed to them
    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetail> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.books.list_by_author(id).await?;
        Ok(AuthorDetail::new(author, books))
    }

    pub async fn author_form(&self, id: i32) -> AppResult<AuthorFormValues> {
        let author = self.repository.authors.get_by_id(id).await?;
        Ok(author.into())
    }

    pub async fn create_author(&self, mut author: CreateAuthor) -> AppResult<Author> {
        author.clean()?;
        let author = self.repository.authors.create(&author).await?;
        tracing::info!("Created author id={} ({})", author.id, author.display_name());
        Ok(author)
    }

    /// Apply the submitted fields; absent fields keep their value
    pub async fn update_author(&self, id: i32, changes: UpdateAuthor) -> AppResult<Author> {
        let current = self.repository.authors.get_by_id(id).await?;
        let merged = changes.merge(&current)?;
        let author = self.repository.authors.update(&merged).await?;
        tracing::info!("Updated author id={}", author.id);
        Ok(author)
    }

    /// Delete an author; their books stay, without an author
    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!("Deleted author id={}", id);
        Ok(())
    }
}
