use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::token::errors::TokenError;
use crate::domain::token::models::Token;
use crate::domain::token::models::TokenFilter;
use crate::domain::token::ports::TokenRepository;

/// Token ledger held in process memory.
///
/// Rows are kept in insertion order, so `find_one` returns the oldest match.
/// Useful for tests and single-process development setups; nothing survives
/// a restart.
#[derive(Default)]
pub struct InMemoryTokenRepository {
    rows: RwLock<Vec<Token>>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently recorded.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn insert(&self, token: Token) -> Result<Token, TokenError> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|row| row.id == token.id) {
            return Err(TokenError::Ledger(format!("duplicate token id {}", token.id)));
        }
        rows.push(token.clone());
        Ok(token)
    }

    async fn bulk_insert(&self, tokens: Vec<Token>) -> Result<Vec<Token>, TokenError> {
        let mut rows = self.rows.write().await;
        for (i, token) in tokens.iter().enumerate() {
            let clashes = rows.iter().chain(&tokens[..i]).any(|row| row.id == token.id);
            if clashes {
                return Err(TokenError::Ledger(format!("duplicate token id {}", token.id)));
            }
        }
        rows.extend(tokens.iter().cloned());
        Ok(tokens)
    }

    async fn find_one(&self, filter: &TokenFilter) -> Result<Option<Token>, TokenError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|row| filter.matches(row)).cloned())
    }

    async fn find_many(&self, filter: &TokenFilter) -> Result<Vec<Token>, TokenError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|row| filter.matches(row)).cloned().collect())
    }

    async fn delete_where(&self, filter: &TokenFilter) -> Result<Vec<Token>, TokenError> {
        if filter.is_empty() {
            return Err(TokenError::Ledger("refusing to delete without a filter".to_string()));
        }

        let mut rows = self.rows.write().await;
        let mut deleted = Vec::new();
        rows.retain(|row| {
            if filter.matches(row) {
                deleted.push(row.clone());
                false
            } else {
                true
            }
        });
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use auth::TokenPurpose;
    use chrono::Duration;
    use chrono::Utc;

    use super::*;
    use crate::domain::token::models::TokenId;
    use crate::domain::user::models::UserId;

    fn token(user_id: UserId, purpose: TokenPurpose, value: &str) -> Token {
        let now = Utc::now();
        Token {
            id: TokenId::new(),
            value: value.to_string(),
            user_id,
            purpose,
            expires_at: now + Duration::minutes(5),
            revoked: false,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repository = InMemoryTokenRepository::new();
        let user_id = UserId::new();
        let row = repository
            .insert(token(user_id, TokenPurpose::Access, "a1"))
            .await
            .unwrap();

        let found = repository
            .find_one(&TokenFilter::by_value("a1", TokenPurpose::Access))
            .await
            .unwrap();
        assert_eq!(found, Some(row));

        let missing = repository
            .find_one(&TokenFilter::by_value("a1", TokenPurpose::Refresh))
            .await
            .unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_no_uniqueness_on_owner_and_purpose() {
        let repository = InMemoryTokenRepository::new();
        let user_id = UserId::new();

        repository
            .bulk_insert(vec![
                token(user_id, TokenPurpose::Refresh, "r1"),
                token(user_id, TokenPurpose::Refresh, "r2"),
            ])
            .await
            .unwrap();

        let rows = repository
            .find_many(&TokenFilter::by_owner(user_id, TokenPurpose::Refresh))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_bulk_insert_is_all_or_nothing() {
        let repository = InMemoryTokenRepository::new();
        let user_id = UserId::new();
        let first = token(user_id, TokenPurpose::Access, "a1");
        let mut duplicate = token(user_id, TokenPurpose::Refresh, "r1");
        duplicate.id = first.id;

        let result = repository.bulk_insert(vec![first, duplicate]).await;
        assert!(matches!(result, Err(TokenError::Ledger(_))));
        assert!(repository.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_where() {
        let repository = InMemoryTokenRepository::new();
        let user_id = UserId::new();
        let other = UserId::new();

        let rows = repository
            .bulk_insert(vec![
                token(user_id, TokenPurpose::Access, "a1"),
                token(user_id, TokenPurpose::Refresh, "r1"),
                token(other, TokenPurpose::Access, "a2"),
            ])
            .await
            .unwrap();

        let deleted = repository
            .delete_where(&TokenFilter::by_owner(user_id, TokenPurpose::Access))
            .await
            .unwrap();
        assert_eq!(deleted, vec![rows[0].clone()]);
        assert_eq!(repository.len().await, 2);

        let refused = repository.delete_where(&TokenFilter::default()).await;
        assert!(matches!(refused, Err(TokenError::Ledger(_))));
        assert_eq!(repository.len().await, 2);
    }
}
