//! Account credentials from the logins file.
//!
//! The logins file holds one `account:secret` pair per line. Lines starting
//! with `#` and blank lines are ignored. The secret is everything after the
//! first `:`. Secrets are zeroized on drop and never printed.

use crate::error::CredentialError;
use quarry_core::AccountId;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::info;
use zeroize::Zeroizing;

/// Opaque credential material for one account.
#[derive(Clone)]
pub struct Credential(Zeroizing<String>);

impl Credential {
    /// Wrap a secret.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// Expose the secret to a session connector.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// All configured accounts and their credentials.
#[derive(Debug, Clone, Default)]
pub struct CredentialBook {
    entries: BTreeMap<AccountId, Credential>,
}

impl CredentialBook {
    /// Read and parse a logins file.
    ///
    /// # Errors
    /// Returns `CredentialError::Io` if the file can't be read and
    /// `CredentialError::Format` if any line is malformed.
    pub fn load(path: &Path) -> Result<Self, CredentialError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CredentialError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let book = Self::parse(&contents)?;
        info!(accounts = book.len(), path = %path.display(), "loaded account credentials");
        Ok(book)
    }

    /// Parse logins file contents.
    ///
    /// # Errors
    /// Returns `CredentialError::Format` with the 1-based line number of the
    /// first malformed line.
    pub fn parse(contents: &str) -> Result<Self, CredentialError> {
        let mut entries = BTreeMap::new();

        for (index, raw) in contents.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }

            let (account, secret) = line.split_once(':').ok_or_else(|| CredentialError::Format {
                line: line_no,
                reason: "expected `account:secret`".to_string(),
            })?;

            let account = AccountId::new(account.trim()).map_err(|e| CredentialError::Format {
                line: line_no,
                reason: e.to_string(),
            })?;

            if secret.is_empty() {
                return Err(CredentialError::Format {
                    line: line_no,
                    reason: format!("empty secret for account {account}"),
                });
            }

            if entries.contains_key(&account) {
                return Err(CredentialError::Format {
                    line: line_no,
                    reason: format!("duplicate account {account}"),
                });
            }

            entries.insert(account, Credential::new(secret));
        }

        Ok(Self { entries })
    }

    /// Add or replace one account.
    pub fn insert(&mut self, account: AccountId, credential: Credential) {
        self.entries.insert(account, credential);
    }

    /// Credential of one account.
    #[must_use]
    pub fn get(&self, account: &AccountId) -> Option<&Credential> {
        self.entries.get(account)
    }

    /// Configured account ids in order.
    pub fn account_ids(&self) -> impl Iterator<Item = &AccountId> {
        self.entries.keys()
    }

    /// Number of configured accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no accounts are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let contents = "# scraper accounts\n\na@example.com:hunter2\nb@example.com:pa:ss\r\n";
        let book = CredentialBook::parse(contents).expect("parse logins");

        assert_eq!(book.len(), 2);
        let b = AccountId::new("b@example.com").expect("valid account ID");
        // Everything after the first colon is the secret
        assert_eq!(book.get(&b).map(Credential::expose), Some("pa:ss"));
    }

    #[test]
    fn test_parse_skips_indented_comments() {
        let contents = "a@example.com:hunter2\n    # rotated 2024-03\n\t# b@example.com:old\n";
        let book = CredentialBook::parse(contents).expect("indented comments are comments");
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_parse_rejects_line_without_separator() {
        let err = CredentialBook::parse("a@example.com:x\nbroken-line\n")
            .expect_err("malformed line");
        assert!(matches!(err, CredentialError::Format { line: 2, .. }));
    }

    #[test]
    fn test_parse_rejects_empty_secret_and_duplicates() {
        assert!(CredentialBook::parse("a@example.com:\n").is_err());
        let err = CredentialBook::parse("a:x\na:y\n").expect_err("duplicate account");
        assert!(err.to_string().contains("duplicate account a"));
    }

    #[test]
    fn test_debug_never_prints_secret() {
        let credential = Credential::new("hunter2");
        assert_eq!(format!("{credential:?}"), "Credential(***)");
        let book = CredentialBook::parse("a:hunter2").expect("parse logins");
        assert!(!format!("{book:?}").contains("hunter2"));
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("input.txt");
        std::fs::write(&path, "a@example.com:one\nb@example.com:two\n").expect("write logins");

        let book = CredentialBook::load(&path).expect("load logins");
        let ids: Vec<_> = book.account_ids().map(AccountId::as_str).collect();
        assert_eq!(ids, vec!["a@example.com", "b@example.com"]);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let tmp = TempDir::new().expect("create temp dir");
        let err = CredentialBook::load(&tmp.path().join("absent.txt")).expect_err("missing file");
        assert!(matches!(err, CredentialError::Io { .. }));
    }
}
