//! 书目存储：单个 JSON 文件落盘，内存表 + 写锁串行化所有变更

use super::models::{Book, CreateBookRequest, UpdateBookRequest};
use crate::error::{CoreError, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{info, instrument};

/// 书目存储
#[derive(Debug)]
pub struct BookStore {
    /// 书目数据文件路径
    path: PathBuf,
    /// 内存表（id -> 条目）
    books: RwLock<HashMap<String, Book>>,
}

impl BookStore {
    /// 打开数据目录并加载已有书目
    pub async fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let dir = data_dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join("books.json");

        let mut books = HashMap::new();
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            let data = tokio::fs::read(&path).await?;
            let list: Vec<Book> = serde_json::from_slice(&data)?;
            for book in list {
                books.insert(book.id.clone(), book);
            }
        }

        Ok(Self {
            path,
            books: RwLock::new(books),
        })
    }

    /// 落盘（调用方须持有写锁）
    async fn persist(&self, books: &HashMap<String, Book>) -> Result<()> {
        let mut list: Vec<&Book> = books.values().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        let data = serde_json::to_vec_pretty(&list)?;
        tokio::fs::write(&self.path, data).await?;
        Ok(())
    }

    /// 列出所有条目（按创建时间排序）
    #[instrument(skip(self))]
    pub async fn list(&self) -> Vec<Book> {
        let books = self.books.read().await;
        let mut list: Vec<Book> = books.values().cloned().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        list
    }

    /// 获取单个条目
    pub async fn get(&self, id: &str) -> Result<Book> {
        let books = self.books.read().await;
        books
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::BookNotFound(id.to_string()))
    }

    /// 创建条目
    #[instrument(skip(self, req))]
    pub async fn create(&self, req: CreateBookRequest) -> Result<Book> {
        if req.title.trim().is_empty() {
            return Err(CoreError::Validation("title must not be empty".into()));
        }
        if req.author.trim().is_empty() {
            return Err(CoreError::Validation("author must not be empty".into()));
        }

        let book = Book {
            id: uuid::Uuid::new_v4().to_string(),
            title: req.title,
            author: req.author,
            year: req.year,
            created_at: Some(Utc::now()),
        };

        let mut books = self.books.write().await;
        books.insert(book.id.clone(), book.clone());
        if let Err(e) = self.persist(&books).await {
            books.remove(&book.id);
            return Err(e);
        }

        info!(book_id = %book.id, title = %book.title, "created book");
        Ok(book)
    }

    /// 更新条目（缺省字段保持不变）
    #[instrument(skip(self, req))]
    pub async fn update(&self, id: &str, req: UpdateBookRequest) -> Result<Book> {
        // 先校验再改，避免校验失败时留下改了一半的条目
        if matches!(&req.title, Some(t) if t.trim().is_empty()) {
            return Err(CoreError::Validation("title must not be empty".into()));
        }
        if matches!(&req.author, Some(a) if a.trim().is_empty()) {
            return Err(CoreError::Validation("author must not be empty".into()));
        }

        let mut books = self.books.write().await;
        let current = books
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::BookNotFound(id.to_string()))?;

        let mut updated = current.clone();
        if let Some(title) = req.title {
            updated.title = title;
        }
        if let Some(author) = req.author {
            updated.author = author;
        }
        if let Some(year) = req.year {
            updated.year = year;
        }

        books.insert(updated.id.clone(), updated.clone());
        if let Err(e) = self.persist(&books).await {
            // 落盘失败回滚，内存表不保留未持久化的修改
            books.insert(current.id.clone(), current);
            return Err(e);
        }

        info!(book_id = %id, "updated book");
        Ok(updated)
    }

    /// 删除条目
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let mut books = self.books.write().await;
        let Some(removed) = books.remove(id) else {
            return Err(CoreError::BookNotFound(id.to_string()));
        };
        if let Err(e) = self.persist(&books).await {
            books.insert(removed.id.clone(), removed);
            return Err(e);
        }

        info!(book_id = %id, "deleted book");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_request(title: &str) -> CreateBookRequest {
        CreateBookRequest {
            title: title.to_string(),
            author: "Stanisław Lem".to_string(),
            year: Some(1961),
        }
    }

    #[tokio::test]
    async fn create_and_list() {
        let dir = TempDir::new().unwrap();
        let store = BookStore::open(dir.path()).await.unwrap();

        store.create(create_request("Solaris")).await.unwrap();
        store.create(create_request("Fiasco")).await.unwrap();

        let list = store.list().await;
        assert_eq!(list.len(), 2);
        assert!(list.iter().any(|b| b.title == "Solaris"));
        assert!(list.iter().any(|b| b.title == "Fiasco"));
    }

    #[tokio::test]
    async fn create_validates_fields() {
        let dir = TempDir::new().unwrap();
        let store = BookStore::open(dir.path()).await.unwrap();

        let mut req = create_request("Solaris");
        req.title = "  ".to_string();
        assert!(matches!(
            store.create(req).await.unwrap_err(),
            CoreError::Validation(_)
        ));

        let mut req = create_request("Solaris");
        req.author = String::new();
        assert!(matches!(
            store.create(req).await.unwrap_err(),
            CoreError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn update_keeps_missing_fields() {
        let dir = TempDir::new().unwrap();
        let store = BookStore::open(dir.path()).await.unwrap();
        let book = store.create(create_request("Solaris")).await.unwrap();

        let updated = store
            .update(
                &book.id,
                UpdateBookRequest {
                    title: Some("Solaris (wyd. II)".to_string()),
                    author: None,
                    year: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Solaris (wyd. II)");
        assert_eq!(updated.author, "Stanisław Lem");
        assert_eq!(updated.year, Some(1961));
    }

    #[tokio::test]
    async fn update_can_clear_year() {
        let dir = TempDir::new().unwrap();
        let store = BookStore::open(dir.path()).await.unwrap();
        let book = store.create(create_request("Solaris")).await.unwrap();
        assert_eq!(book.year, Some(1961));

        let updated = store
            .update(
                &book.id,
                UpdateBookRequest {
                    title: None,
                    author: None,
                    year: Some(None),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.year, None);
        assert_eq!(store.get(&book.id).await.unwrap().year, None);
    }

    #[tokio::test]
    async fn failed_persist_keeps_memory_unchanged() {
        let dir = TempDir::new().unwrap();
        let store = BookStore::open(dir.path()).await.unwrap();
        let book = store.create(create_request("Solaris")).await.unwrap();

        // 数据文件换成同名目录，之后的落盘必然失败
        let path = dir.path().join("books.json");
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let err = store
            .update(
                &book.id,
                UpdateBookRequest {
                    title: Some("Fiasco".to_string()),
                    author: None,
                    year: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
        assert_eq!(store.get(&book.id).await.unwrap().title, "Solaris");

        let err = store.delete(&book.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
        assert_eq!(store.list().await.len(), 1);

        assert!(store.create(create_request("Fiasco")).await.is_err());
        assert_eq!(store.list().await.len(), 1);
    }

    #[tokio::test]
    async fn failed_update_leaves_book_unchanged() {
        let dir = TempDir::new().unwrap();
        let store = BookStore::open(dir.path()).await.unwrap();
        let book = store.create(create_request("Solaris")).await.unwrap();

        let err = store
            .update(
                &book.id,
                UpdateBookRequest {
                    title: Some("Fiasco".to_string()),
                    author: Some("  ".to_string()),
                    year: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let unchanged = store.get(&book.id).await.unwrap();
        assert_eq!(unchanged.title, "Solaris");
        assert_eq!(unchanged.author, "Stanisław Lem");
    }

    #[tokio::test]
    async fn get_and_delete_require_existing() {
        let dir = TempDir::new().unwrap();
        let store = BookStore::open(dir.path()).await.unwrap();

        let err = store.get("missing").await.unwrap_err();
        assert!(matches!(err, CoreError::BookNotFound(_)));
        let err = store.delete("missing").await.unwrap_err();
        assert!(matches!(err, CoreError::BookNotFound(_)));

        let book = store.create(create_request("Solaris")).await.unwrap();
        store.delete(&book.id).await.unwrap();
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn reopen_loads_persisted_books() {
        let dir = TempDir::new().unwrap();
        let id = {
            let store = BookStore::open(dir.path()).await.unwrap();
            store.create(create_request("Solaris")).await.unwrap().id
        };

        let reopened = BookStore::open(dir.path()).await.unwrap();
        let book = reopened.get(&id).await.unwrap();
        assert_eq!(book.title, "Solaris");
    }
}
