// 身份存储 - 本地 JSON 文件
//
// The client id is an opaque UUID generated on first run and reused for
// every later run from the same work directory. The last chosen role is kept
// alongside it.

use crate::config::{ClientConfig, ClientContext};
use crate::error::ClientResult;
use serde::{Deserialize, Serialize};
use shared::models::Role;
use shared::util::now_millis;
use std::fs;
use std::path::{Path, PathBuf};

/// Identity file name inside the work directory
pub const IDENTITY_FILE: &str = "identity.json";

/// 身份结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub client_id: String,
    #[serde(default)]
    pub role: Role,
    pub created_at: i64,
}

impl Identity {
    pub fn generate(role: Role) -> Self {
        Self {
            client_id: uuid::Uuid::new_v4().to_string(),
            role,
            created_at: now_millis(),
        }
    }
}

/// 身份存储
#[derive(Debug, Clone)]
pub struct IdentityStorage {
    path: PathBuf,
}

impl IdentityStorage {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: work_dir.into().join(IDENTITY_FILE),
        }
    }

    /// 确保目录存在
    pub fn ensure_dir(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    pub fn save(&self, identity: &Identity) -> ClientResult<()> {
        self.ensure_dir()?;
        let json = serde_json::to_string_pretty(identity)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Load the stored identity; a missing file is `None`
    pub fn load(&self) -> ClientResult<Option<Identity>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// Load, or create and persist on first run
    ///
    /// A role given here replaces the stored one and is persisted.
    pub fn load_or_create(&self, role: Option<Role>) -> ClientResult<Identity> {
        match self.load()? {
            Some(mut identity) => {
                if let Some(role) = role
                    && role != identity.role
                {
                    tracing::info!(from = %identity.role, to = %role, "Client role changed");
                    identity.role = role;
                    self.save(&identity)?;
                }
                Ok(identity)
            }
            None => {
                let identity = Identity::generate(role.unwrap_or_default());
                self.save(&identity)?;
                tracing::info!(client_id = %identity.client_id, path = %self.path.display(), "New client identity created");
                Ok(identity)
            }
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Build the client context from config plus persisted identity
pub fn resolve_context(config: &ClientConfig) -> ClientResult<ClientContext> {
    let identity = IdentityStorage::new(&config.work_dir).load_or_create(config.role)?;
    Ok(ClientContext::new(identity.client_id, identity.role)
        .with_zone(config.zone)
        .with_customer_name(config.customer_name.clone()))
}
