//! 账户存储：单个 JSON 文件落盘，内存表 + 写锁串行化所有变更

use super::models::Account;
use crate::error::{CoreError, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::instrument;

/// 账户查询条件（等值匹配）
#[derive(Debug, Clone)]
pub enum AccountFilter<'a> {
    ById(&'a str),
    ByLogin(&'a str),
    ByEmail(&'a str),
}

impl AccountFilter<'_> {
    fn matches(&self, account: &Account) -> bool {
        match self {
            AccountFilter::ById(id) => account.id == *id,
            AccountFilter::ByLogin(login) => account.login == *login,
            AccountFilter::ByEmail(email) => account.email == *email,
        }
    }
}

/// 账户存储
#[derive(Debug)]
pub struct AccountStore {
    /// 账户数据文件路径
    path: PathBuf,
    /// 内存表（id -> 账户）
    accounts: RwLock<HashMap<String, Account>>,
}

impl AccountStore {
    /// 打开数据目录并加载已有账户
    pub async fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let dir = data_dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join("accounts.json");

        let mut accounts = HashMap::new();
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            let data = tokio::fs::read(&path).await?;
            let list: Vec<Account> = serde_json::from_slice(&data)?;
            for account in list {
                accounts.insert(account.id.clone(), account);
            }
        }

        Ok(Self {
            path,
            accounts: RwLock::new(accounts),
        })
    }

    /// 落盘（调用方须持有写锁）
    async fn persist(&self, accounts: &HashMap<String, Account>) -> Result<()> {
        let mut list: Vec<&Account> = accounts.values().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        let data = serde_json::to_vec_pretty(&list)?;
        tokio::fs::write(&self.path, data).await?;
        Ok(())
    }

    /// 插入新账户；登录名查重与写入在同一临界区内完成
    #[instrument(skip(self, account))]
    pub async fn insert(&self, account: Account) -> Result<Account> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.login == account.login) {
            return Err(CoreError::DuplicateLogin(account.login));
        }
        accounts.insert(account.id.clone(), account.clone());
        if let Err(e) = self.persist(&accounts).await {
            accounts.remove(&account.id);
            return Err(e);
        }
        Ok(account)
    }

    /// 按条件查找单个账户
    pub async fn find(&self, filter: AccountFilter<'_>) -> Option<Account> {
        let accounts = self.accounts.read().await;
        accounts.values().find(|a| filter.matches(a)).cloned()
    }

    /// 条件更新：匹配、修改、落盘在同一写锁临界区内完成，
    /// 并发调用之间不会交错。无匹配时返回 None。
    pub async fn update_one<F>(&self, filter: AccountFilter<'_>, apply: F) -> Result<Option<Account>>
    where
        F: FnOnce(&mut Account),
    {
        let mut accounts = self.accounts.write().await;
        let Some(current) = accounts.values().find(|a| filter.matches(a)).cloned() else {
            return Ok(None);
        };

        let mut updated = current.clone();
        apply(&mut updated);
        updated.updated_at = Some(Utc::now());

        accounts.insert(updated.id.clone(), updated.clone());
        if let Err(e) = self.persist(&accounts).await {
            // 落盘失败回滚，内存表不保留未持久化的修改
            accounts.insert(current.id.clone(), current);
            return Err(e);
        }
        Ok(Some(updated))
    }

    /// 当前账户数量
    pub async fn count(&self) -> usize {
        self.accounts.read().await.len()
    }
}
