//! Books repository for database operations

use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{reference_error, AppError, AppResult},
    models::{
        book::{BookAuthor, BookForm},
        Book, BookShort, Genre, Language, Page,
    },
};

const BOOK_SHORT_SELECT: &str = r#"
    SELECT b.id, b.title, b.author_id,
           a.last_name || ', ' || a.first_name AS author_name
    FROM books b
    LEFT JOIN authors a ON a.id = b.author_id
"#;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            "SELECT id, title, author_id, summary, isbn, language_id FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// One page of books ordered by title
    pub async fn list(&self, page: &Page) -> AppResult<Vec<BookShort>> {
        let query = format!("{} ORDER BY b.title, b.id LIMIT $1 OFFSET $2", BOOK_SHORT_SELECT);
        let books = sqlx::query_as::<_, BookShort>(&query)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// All books attributed to an author
    pub async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<BookShort>> {
        let query = format!("{} WHERE b.author_id = $1 ORDER BY b.title, b.id", BOOK_SHORT_SELECT);
        let books = sqlx::query_as::<_, BookShort>(&query)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    pub async fn get_author(&self, author_id: i32) -> AppResult<Option<BookAuthor>> {
        let author = sqlx::query_as::<_, BookAuthor>(
            "SELECT id, first_name, last_name FROM authors WHERE id = $1",
        )
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(author)
    }

    pub async fn get_language(&self, language_id: i32) -> AppResult<Option<Language>> {
        let language = sqlx::query_as::<_, Language>("SELECT id, name FROM languages WHERE id = $1")
            .bind(language_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(language)
    }

    /// Genres of a book in the order they were given
    pub async fn get_genres(&self, book_id: i32) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(
            r#"
            SELECT g.id, g.name
            FROM book_genres bg
            JOIN genres g ON g.id = bg.genre_id
            WHERE bg.book_id = $1
            ORDER BY bg.position, g.id
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }

    // =========================================================================
    // COUNTS
    // =========================================================================

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Books whose title contains `word`, ignoring case
    pub async fn count_title_containing(&self, word: &str) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books WHERE title ILIKE '%' || $1 || '%'",
        )
        .bind(escape_like(word))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn count_genres(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM genres")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    /// Create a new book with its genres
    pub async fn create(&self, form: &BookForm) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author_id, summary, isbn, language_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, author_id, summary, isbn, language_id
            "#,
        )
        .bind(&form.title)
        .bind(form.author_id)
        .bind(&form.summary)
        .bind(&form.isbn)
        .bind(form.language_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| reference_error(e, "author or language"))?;

        replace_genres(&mut tx, book.id, &form.distinct_genre_ids()).await?;
        tx.commit().await?;

        Ok(book)
    }

    /// Overwrite every field of a book, genres included
    pub async fn update(&self, id: i32, form: &BookForm) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, author_id = $2, summary = $3, isbn = $4, language_id = $5
            WHERE id = $6
            RETURNING id, title, author_id, summary, isbn, language_id
            "#,
        )
        .bind(&form.title)
        .bind(form.author_id)
        .bind(&form.summary)
        .bind(&form.isbn)
        .bind(form.language_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| reference_error(e, "author or language"))?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        replace_genres(&mut tx, id, &form.distinct_genre_ids()).await?;
        tx.commit().await?;

        Ok(book)
    }

    /// Delete a book; its copies and genre links go with it
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }
}

async fn replace_genres(
    tx: &mut Transaction<'_, Postgres>,
    book_id: i32,
    genre_ids: &[i32],
) -> AppResult<()> {
    sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
        .bind(book_id)
        .execute(&mut **tx)
        .await?;

    for (position, genre_id) in genre_ids.iter().enumerate() {
        sqlx::query("INSERT INTO book_genres (book_id, genre_id, position) VALUES ($1, $2, $3)")
            .bind(book_id)
            .bind(genre_id)
            .bind(position as i16)
            .execute(&mut **tx)
            .await
            .map_err(|e| reference_error(e, "genre"))?;
    }
    Ok(())
}

/// Escape LIKE wildcards so `word` matches literally
fn escape_like(word: &str) -> String {
    word.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
