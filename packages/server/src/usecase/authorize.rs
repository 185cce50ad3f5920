//! UseCase: 呼び出し元の識別と管理者認可
//!
//! 識別は次のどちらかで行う。
//!
//! 1. `Authorization: Bearer <sessionId>` のセッションを解決する
//! 2. 内部シークレットが一致する場合、信頼された呼び出し元が指定したユーザー ID を使う
//!
//! 管理者操作はすべて「識別 → `is_admin` による認可」の 1 本のパイプラインを通る。

use std::sync::Arc;

use crate::domain::{AdminDirectory, Identity, IdentityResolver, UserId};

use super::error::AuthError;

/// リクエストから取り出した認証情報
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Bearer トークンとして渡されたセッション ID
    pub session_id: Option<String>,
    /// 内部呼び出し用のシークレット
    pub internal_secret: Option<String>,
    /// 内部呼び出し元が代理で指定するユーザー ID
    pub acting_user_id: Option<String>,
    /// 内部呼び出し元が代理で指定する表示名
    pub acting_username: Option<String>,
}

/// 識別・認可のユースケース
pub struct AuthorizeUseCase {
    identity_resolver: Arc<dyn IdentityResolver>,
    admin_directory: Arc<dyn AdminDirectory>,
    internal_secret: Option<String>,
}

impl AuthorizeUseCase {
    pub fn new(
        identity_resolver: Arc<dyn IdentityResolver>,
        admin_directory: Arc<dyn AdminDirectory>,
        internal_secret: Option<String>,
    ) -> Self {
        Self {
            identity_resolver,
            admin_directory,
            internal_secret: internal_secret.filter(|s| !s.is_empty()),
        }
    }

    /// 呼び出し元を識別する（識別できなければ `None`）
    pub async fn identify(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<Identity>, AuthError> {
        if let Some(session_id) = credentials.session_id.as_deref() {
            let identity = self
                .identity_resolver
                .resolve_session(session_id)
                .await
                .map_err(AuthError::Storage)?;
            if identity.is_none() {
                tracing::debug!("Session could not be resolved");
            }
            return Ok(identity);
        }

        if self.is_trusted_caller(credentials) {
            let identity = credentials
                .acting_user_id
                .clone()
                .and_then(|id| UserId::new(id).ok())
                .map(|user_id| Identity {
                    username: credentials
                        .acting_username
                        .as_deref()
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .unwrap_or(user_id.as_str())
                        .to_string(),
                    user_id,
                    session_id: None,
                });
            return Ok(identity);
        }

        Ok(None)
    }

    /// 呼び出し元を識別し、識別できなければ匿名ユーザーとして扱う
    pub async fn identify_or_anonymous(
        &self,
        credentials: &Credentials,
    ) -> Result<Identity, AuthError> {
        Ok(self
            .identify(credentials)
            .await?
            .unwrap_or_else(|| Identity {
                user_id: UserId::anonymous(),
                username: UserId::anonymous().into_string(),
                session_id: None,
            }))
    }

    /// 管理者であることを確認する
    ///
    /// # Returns
    ///
    /// * `Ok(Identity)` - 管理者
    /// * `Err(AuthError::Unauthenticated)` - 識別できない
    /// * `Err(AuthError::Forbidden)` - 管理者ではない
    pub async fn authorize_admin(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let identity = self
            .identify(credentials)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        if !self.admin_directory.is_admin(&identity.user_id).await {
            tracing::warn!("User '{}' attempted an admin operation", identity.user_id);
            return Err(AuthError::Forbidden(identity.user_id.into_string()));
        }
        Ok(identity)
    }

    fn is_trusted_caller(&self, credentials: &Credentials) -> bool {
        match (&self.internal_secret, &credentials.internal_secret) {
            (Some(expected), Some(given)) => expected == given,
            _ => false,
        }
    }
}
