//! Local identity provider
//!
//! The primary credential is an identity given on the command line (or via
//! `RECRUIT_IDENTITY`). Without one, an anonymous identity is minted once and
//! kept in the data directory so later runs find the same tree.

use async_trait::async_trait;
use recruit_sync::{AuthError, Identity, IdentityProvider};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::watch;

/// File under the data directory holding the anonymous identity
pub const ANONYMOUS_ID_FILE: &str = "anonymous-id";

#[derive(Debug)]
pub struct LocalIdentityProvider {
    explicit: Option<String>,
    anonymous_file: PathBuf,
    changes: watch::Sender<Option<Identity>>,
}

impl LocalIdentityProvider {
    #[must_use]
    pub fn new(data_dir: &Path, explicit: Option<String>) -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            explicit: explicit.filter(|raw| !raw.trim().is_empty()),
            anonymous_file: data_dir.join(ANONYMOUS_ID_FILE),
            changes,
        }
    }

    fn announce(&self, identity: &Identity) {
        self.changes.send_replace(Some(identity.clone()));
    }

    async fn stored_anonymous(&self) -> Result<Option<Identity>, AuthError> {
        match tokio::fs::read_to_string(&self.anonymous_file).await {
            Ok(raw) if !raw.trim().is_empty() => Ok(Some(Identity::new(raw.trim()))),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AuthError::Unavailable(e.to_string())),
        }
    }

    async fn mint_anonymous(&self) -> Result<Identity, AuthError> {
        let identity = Identity::new(format!(
            "anon-{}",
            ulid::Ulid::new().to_string().to_lowercase()
        ));
        if let Some(parent) = self.anonymous_file.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AuthError::Unavailable(e.to_string()))?;
        }
        tokio::fs::write(&self.anonymous_file, identity.as_str())
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;
        tracing::info!(identity = %identity, "created anonymous identity");
        Ok(identity)
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn authenticate(&self) -> Result<Identity, AuthError> {
        let identity = self
            .explicit
            .as_deref()
            .map(|raw| Identity::new(raw.trim()))
            .ok_or(AuthError::NoCredential)?;
        self.announce(&identity);
        Ok(identity)
    }

    async fn authenticate_anonymously(&self) -> Result<Identity, AuthError> {
        let identity = match self.stored_anonymous().await? {
            Some(identity) => identity,
            None => self.mint_anonymous().await?,
        };
        self.announce(&identity);
        Ok(identity)
    }

    fn identity_changes(&self) -> watch::Receiver<Option<Identity>> {
        self.changes.subscribe()
    }
}
