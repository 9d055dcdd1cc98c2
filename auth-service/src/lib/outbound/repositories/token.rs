use async_trait::async_trait;
use auth::TokenPurpose;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;
use sqlx::Postgres;
use sqlx::QueryBuilder;
use uuid::Uuid;

use crate::domain::token::errors::TokenError;
use crate::domain::token::models::Token;
use crate::domain::token::models::TokenFilter;
use crate::domain::token::models::TokenId;
use crate::domain::token::ports::TokenRepository;
use crate::domain::user::models::UserId;

const TOKEN_COLUMNS: &str = "id, token, user_id, purpose, expires_at, revoked, created_at";

#[derive(Debug, FromRow)]
struct TokenRow {
    id: Uuid,
    token: String,
    user_id: Uuid,
    purpose: String,
    expires_at: DateTime<Utc>,
    revoked: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<TokenRow> for Token {
    type Error = TokenError;

    fn try_from(row: TokenRow) -> Result<Self, Self::Error> {
        let purpose = row
            .purpose
            .parse::<TokenPurpose>()
            .map_err(|e| TokenError::Ledger(e.to_string()))?;

        Ok(Token {
            id: TokenId(row.id),
            value: row.token,
            user_id: UserId(row.user_id),
            purpose,
            expires_at: row.expires_at,
            revoked: row.revoked,
            created_at: row.created_at,
        })
    }
}

/// Append the filter as a WHERE clause. Every condition is bound, never inlined.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &TokenFilter) {
    builder.push(" WHERE TRUE");

    if let Some(id) = filter.id {
        builder.push(" AND id = ").push_bind(id.0);
    }
    if let Some(value) = &filter.value {
        builder.push(" AND token = ").push_bind(value.clone());
    }
    if let Some(user_id) = filter.user_id {
        builder.push(" AND user_id = ").push_bind(user_id.0);
    }
    if let Some(purpose) = filter.purpose {
        builder.push(" AND purpose = ").push_bind(purpose.as_str());
    }
    if let Some(revoked) = filter.revoked {
        builder.push(" AND revoked = ").push_bind(revoked);
    }
    if let Some(at) = filter.expires_before {
        builder.push(" AND expires_at < ").push_bind(at);
    }
}

fn ledger_error(e: sqlx::Error) -> TokenError {
    TokenError::Ledger(e.to_string())
}

pub struct PostgresTokenRepository {
    pool: PgPool,
}

impl PostgresTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PostgresTokenRepository {
    async fn insert(&self, token: Token) -> Result<Token, TokenError> {
        sqlx::query(
            r#"
            INSERT INTO tokens (id, token, user_id, purpose, expires_at, revoked, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(token.id.0)
        .bind(&token.value)
        .bind(token.user_id.0)
        .bind(token.purpose.as_str())
        .bind(token.expires_at)
        .bind(token.revoked)
        .bind(token.created_at)
        .execute(&self.pool)
        .await
        .map_err(ledger_error)?;

        Ok(token)
    }

    async fn bulk_insert(&self, tokens: Vec<Token>) -> Result<Vec<Token>, TokenError> {
        if tokens.is_empty() {
            return Ok(tokens);
        }

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("INSERT INTO tokens ({}) ", TOKEN_COLUMNS));
        builder.push_values(tokens.iter(), |mut row, token| {
            row.push_bind(token.id.0)
                .push_bind(token.value.clone())
                .push_bind(token.user_id.0)
                .push_bind(token.purpose.as_str())
                .push_bind(token.expires_at)
                .push_bind(token.revoked)
                .push_bind(token.created_at);
        });

        builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(ledger_error)?;

        Ok(tokens)
    }

    async fn find_one(&self, filter: &TokenFilter) -> Result<Option<Token>, TokenError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM tokens", TOKEN_COLUMNS));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at LIMIT 1");

        let row: Option<TokenRow> = builder
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(ledger_error)?;

        row.map(Token::try_from).transpose()
    }

    async fn find_many(&self, filter: &TokenFilter) -> Result<Vec<Token>, TokenError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM tokens", TOKEN_COLUMNS));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at");

        let rows: Vec<TokenRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(ledger_error)?;

        rows.into_iter().map(Token::try_from).collect()
    }

    async fn delete_where(&self, filter: &TokenFilter) -> Result<Vec<Token>, TokenError> {
        if filter.is_empty() {
            return Err(TokenError::Ledger(
                "refusing to delete without a filter".to_string(),
            ));
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("DELETE FROM tokens");
        push_filter(&mut builder, filter);
        builder.push(" RETURNING ");
        builder.push(TOKEN_COLUMNS);

        let rows: Vec<TokenRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(ledger_error)?;

        rows.into_iter().map(Token::try_from).collect()
    }
}
