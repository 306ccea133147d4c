//! Data models for the Local Library

pub mod activation;
pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;
pub mod page;
pub mod user;

// Re-export commonly used types
pub use activation::UserActivation;
pub use author::{Author, AuthorDetail};
pub use book::{Book, BookDetail, BookShort};
pub use book_instance::{BookInstance, BorrowedInstance, LoanStatus};
pub use genre::{Genre, Language};
pub use page::{Page, PageQuery, PAGE_SIZE};
pub use user::{Caller, Identity, Permission, User};
