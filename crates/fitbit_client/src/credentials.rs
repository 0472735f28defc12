//! Flat-file credential store.
//!
//! The file is a JSON object holding `access_token`, `refresh_token` and
//! `client_id`. Any other keys are carried through untouched when the
//! file is rewritten after a refresh.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::FitbitError;

/// On-disk shape of the config file.
#[derive(Deserialize, Serialize)]
struct CredentialsFile {
    access_token: String,
    refresh_token: String,
    client_id: String,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug)]
pub struct Credentials {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub client_id: String,
}

#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    credentials: Credentials,
    extra: serde_json::Map<String, serde_json::Value>,
}

impl CredentialStore {
    /// Read and parse the credential file at `path`.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, FitbitError> {
        let path = path.into();
        let contents = tokio::fs::read_to_string(&path).await.map_err(|e| {
            FitbitError::Credentials(format!("cannot read {}: {e}", path.display()))
        })?;
        let file: CredentialsFile = serde_json::from_str(&contents).map_err(|e| {
            FitbitError::Credentials(format!("cannot parse {}: {e}", path.display()))
        })?;

        Ok(Self {
            path,
            credentials: Credentials {
                access_token: SecretString::from(file.access_token),
                refresh_token: SecretString::from(file.refresh_token),
                client_id: file.client_id,
            },
            extra: file.extra,
        })
    }

    /// Rewrite the whole file, pretty-printed with 2-space indentation.
    ///
    /// The JSON goes to a sibling `.tmp` file first and is renamed over
    /// the target, so the file on disk is never half-written.
    pub async fn save(&self) -> Result<(), FitbitError> {
        let file = CredentialsFile {
            access_token: self.credentials.access_token.expose_secret().to_string(),
            refresh_token: self.credentials.refresh_token.expose_secret().to_string(),
            client_id: self.credentials.client_id.clone(),
            extra: self.extra.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, json).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Replace both tokens in memory. Call [`save`](Self::save) to persist.
    pub fn update_tokens(&mut self, access_token: String, refresh_token: String) {
        self.credentials.access_token = SecretString::from(access_token);
        self.credentials.refresh_token = SecretString::from(refresh_token);
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
