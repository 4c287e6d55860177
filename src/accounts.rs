use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::OutboundPolicy;
use crate::mail::{OutboundConfig, ServerConfig};

/// A registered mail account, as stored in `accounts.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub label: String,
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub user: String,
    pub pass: String,
    /// Explicit outbound host. Older stores lack it.
    #[serde(default)]
    pub smtp_host: String,
}

impl Account {
    pub fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn server(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            secure: self.secure,
            user: self.user.clone(),
            pass: self.pass.clone(),
        }
    }

    pub fn outbound(&self, policy: &OutboundPolicy) -> OutboundConfig {
        OutboundConfig {
            host: self.smtp_host.clone(),
            port: policy.port,
            implicit_tls: policy.implicit_tls,
            user: self.user.clone(),
            pass: self.pass.clone(),
        }
    }
}

/// Flat JSON file holding every account. Each save rewrites the whole file.
pub struct AccountStore {
    path: PathBuf,
}

impl AccountStore {
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::data_dir().ok_or_else(|| anyhow!("no data dir"))?;
        Ok(dir.join("tidemail").join("accounts.json"))
    }

    pub fn open_default() -> Result<Self> {
        Ok(Self::at(Self::default_path()?))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored accounts, or none when the file is missing or
    /// unreadable.
    pub fn load(&self) -> Vec<Account> {
        let data = match fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return vec![],
            Err(e) => {
                log::error!("failed to read {}: {e}", self.path.display());
                return vec![];
            }
        };

        match serde_json::from_str(&data) {
            Ok(accounts) => accounts,
            Err(e) => {
                log::error!("failed to parse {}: {e}", self.path.display());
                vec![]
            }
        }
    }

    // Plain overwrite, not crash-atomic.
    pub fn save(&self, accounts: &[Account]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(accounts)?;
        fs::write(&self.path, json)?;
        log::debug!("saved {} accounts to {}", accounts.len(), self.path.display());
        Ok(())
    }

    pub fn add(&self, accounts: &mut Vec<Account>, account: Account) -> Result<()> {
        accounts.push(account);
        self.save(accounts)
    }

    /// Replaces the account with the same id.
    pub fn update(&self, accounts: &mut [Account], account: Account) -> Result<()> {
        let slot = accounts
            .iter_mut()
            .find(|a| a.id == account.id)
            .ok_or_else(|| anyhow!("no account with id {}", account.id))?;
        *slot = account;
        self.save(accounts)
    }

    /// Removes the account with `id`. Returns whether one was removed.
    pub fn remove(&self, accounts: &mut Vec<Account>, id: &str) -> Result<bool> {
        let before = accounts.len();
        accounts.retain(|a| a.id != id);
        let removed = accounts.len() != before;
        if removed {
            self.save(accounts)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use assertables::*;
    use rstest::*;
    use tempfile::TempDir;

    use super::*;

    #[fixture]
    fn dir() -> TempDir {
        tempfile::tempdir().unwrap()
    }

    fn account(id: &str, label: &str) -> Account {
        Account {
            id: id.into(),
            label: label.into(),
            host: "imap.example.com".into(),
            port: 993,
            secure: true,
            user: "a@x.com".into(),
            pass: "secret".into(),
            smtp_host: "smtp.example.com".into(),
        }
    }

    #[rstest]
    fn test_missing_file_loads_empty(dir: TempDir) {
        let store = AccountStore::at(dir.path().join("accounts.json"));
        assert!(store.load().is_empty());
    }

    #[rstest]
    fn test_garbage_file_loads_empty(dir: TempDir) {
        let path = dir.path().join("accounts.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(AccountStore::at(path).load().is_empty());
    }

    #[rstest]
    fn test_save_then_load_keeps_order(dir: TempDir) {
        let store = AccountStore::at(dir.path().join("nested").join("accounts.json"));
        let accounts = vec![account("1", "work"), account("2", "home")];
        store.save(&accounts).unwrap();

        assert_eq!(store.load(), accounts);
    }

    #[rstest]
    fn test_add_update_remove(dir: TempDir) {
        let store = AccountStore::at(dir.path().join("accounts.json"));
        let mut accounts = vec![];

        store.add(&mut accounts, account("1", "work")).unwrap();
        store.add(&mut accounts, account("2", "home")).unwrap();
        store.update(&mut accounts, account("1", "office")).unwrap();
        assert!(store.remove(&mut accounts, "2").unwrap());
        assert!(!store.remove(&mut accounts, "nope").unwrap());

        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].label, "office");
    }

    #[rstest]
    fn test_update_unknown_id_fails(dir: TempDir) {
        let store = AccountStore::at(dir.path().join("accounts.json"));
        let mut accounts = vec![account("1", "work")];
        assert_err!(store.update(&mut accounts, account("9", "ghost")));
    }

    #[rstest]
    fn test_legacy_record_without_smtp_host(dir: TempDir) {
        let path = dir.path().join("accounts.json");
        fs::write(
            &path,
            r#"[{"id":"k3j","user":"a@x.com","pass":"p","host":"imap.x.com","port":993,"secure":true,"label":"a@x.com"}]"#,
        )
        .unwrap();
        let loaded = AccountStore::at(path).load();

        assert_eq!(loaded.len(), 1);
        assert_is_empty!(loaded[0].smtp_host);
    }

    #[rstest]
    fn test_outbound_uses_policy_not_account() {
        let a = account("1", "work");
        let out = a.outbound(&OutboundPolicy { port: 587, implicit_tls: false });
        assert_eq!(out.host, "smtp.example.com");
        assert_eq!(out.port, 587);
        assert!(!out.implicit_tls);
    }

    #[rstest]
    fn test_ids_are_unique() {
        assert_ne!(Account::new_id(), Account::new_id());
    }
}
