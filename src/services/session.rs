use crate::entities::{prelude::*, *};
use crate::error::SyncResult;
use crate::models::SessionHandle;
use crate::utils::clock::Clock;
use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;

/// Resolves credentials for remote drive calls. Expired sessions are never
/// returned.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Session of the account that created the local file at `local_uri`.
    async fn get_active_session_for_creator(
        &self,
        local_uri: &str,
    ) -> SyncResult<Option<SessionHandle>>;

    async fn get_session(&self, session_id: &str) -> SyncResult<Option<SessionHandle>>;
}

pub struct SeaOrmSessionProvider {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl SeaOrmSessionProvider {
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }
}

impl From<sessions::Model> for SessionHandle {
    fn from(session: sessions::Model) -> Self {
        SessionHandle {
            session_id: session.id,
            access_token: session.access_token,
            expires_at: session.expires_at,
        }
    }
}

#[async_trait]
impl SessionProvider for SeaOrmSessionProvider {
    async fn get_active_session_for_creator(
        &self,
        local_uri: &str,
    ) -> SyncResult<Option<SessionHandle>> {
        let creator = LocalFiles::find()
            .filter(local_files::Column::Uri.eq(local_uri))
            .one(&self.db)
            .await?
            .and_then(|f| f.creator_id);

        let Some(account_id) = creator else {
            tracing::debug!(local_uri, "Local file has no known creator");
            return Ok(None);
        };

        let session = Sessions::find()
            .filter(sessions::Column::AccountId.eq(account_id.as_str()))
            .filter(sessions::Column::ExpiresAt.gte(self.clock.now()))
            .order_by_desc(sessions::Column::ExpiresAt)
            .one(&self.db)
            .await?;

        Ok(session.map(SessionHandle::from))
    }

    async fn get_session(&self, session_id: &str) -> SyncResult<Option<SessionHandle>> {
        let session = Sessions::find_by_id(session_id.to_string())
            .filter(sessions::Column::ExpiresAt.gte(self.clock.now()))
            .one(&self.db)
            .await?;
        Ok(session.map(SessionHandle::from))
    }
}
