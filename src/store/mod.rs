/// 영속 저장소 인터페이스와 PostgreSQL 구현체
// region:    --- Imports
use crate::auction::model::{Bid, Comment, ListingDraft};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
// endregion: --- Imports

// region:    --- Store Results

/// 저장소 오류
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Username already taken.")]
    UsernameTaken,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// 입찰 원장 기록 결과
#[derive(Debug)]
pub enum LedgerWrite {
    /// 원장이 갱신되었고 해당 행의 최신 상태를 담는다
    Applied(Bid),
    /// 제출 금액이 더 이상 최고가가 아님 (동시 입찰에 추월당한 경우 포함)
    Outbid { current: Decimal },
}

/// 위시리스트 토글 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistState {
    Added,
    Removed,
}

// endregion: --- Store Results

// region:    --- Market Store Trait

/// 영속 저장소 트레이트
#[async_trait]
pub trait MarketStore {
    async fn insert_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<i64, StoreError>;

    async fn insert_listing(&self, seller_id: i64, draft: &ListingDraft)
        -> Result<i64, StoreError>;

    /// 원장 갱신: 상품당 한 행을 조건부로 덮어쓴다 (기존 금액보다 클 때만)
    async fn record_bid(
        &self,
        listing_id: i64,
        buyer_id: i64,
        amount: Decimal,
        placed_at: DateTime<Utc>,
    ) -> Result<LedgerWrite, StoreError>;

    async fn toggle_wishlist(
        &self,
        user_id: i64,
        listing_id: i64,
    ) -> Result<WishlistState, StoreError>;

    /// 종료 시각을 앞당긴다. 이미 비활성이면 아무 것도 바꾸지 않고 false
    async fn close_listing(&self, listing_id: i64, at: DateTime<Utc>) -> Result<bool, StoreError>;

    async fn insert_comment(
        &self,
        user_id: i64,
        listing_id: i64,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<Comment, StoreError>;
}

// endregion: --- Market Store Trait

// region:    --- Postgres Implementation

/// PostgreSQL 저장소 구현체
pub struct PgMarketStore {
    pool: Arc<PgPool>,
}

impl PgMarketStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

/// 입찰 원장 조건부 갱신
/// UNIQUE (auction_id) 제약이 상품당 한 행을 보장하고,
/// WHERE bids.amount < EXCLUDED.amount 조건이 원자적 비교-갱신을 수행한다
const UPSERT_BID: &str = r#"
    INSERT INTO bids (auction_id, buyer_id, amount, placed_at)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (auction_id) DO UPDATE
    SET buyer_id = EXCLUDED.buyer_id, amount = EXCLUDED.amount, placed_at = EXCLUDED.placed_at
    WHERE bids.amount < EXCLUDED.amount
    RETURNING id, auction_id, buyer_id, amount, placed_at
"#;

#[async_trait]
impl MarketStore for PgMarketStore {
    async fn insert_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<i64, StoreError> {
        info!("{:<12} --> 사용자 등록: {}", "Store", username);
        let result = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&*self.pool)
        .await;

        match result {
            Ok(id) => Ok(id),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::UsernameTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_listing(
        &self,
        seller_id: i64,
        draft: &ListingDraft,
    ) -> Result<i64, StoreError> {
        info!("{:<12} --> 상품 등록: {}", "Store", draft.title);
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO listings
                (seller_id, title, description, start_time, end_time, start_price, image_url, category)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(seller_id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.start_time)
        .bind(draft.end_time)
        .bind(draft.start_price)
        .bind(&draft.image_url)
        .bind(&draft.category)
        .fetch_one(&*self.pool)
        .await?;
        Ok(id)
    }

    async fn record_bid(
        &self,
        listing_id: i64,
        buyer_id: i64,
        amount: Decimal,
        placed_at: DateTime<Utc>,
    ) -> Result<LedgerWrite, StoreError> {
        info!(
            "{:<12} --> 원장 갱신 시도: listing={}, amount={}",
            "Store", listing_id, amount
        );
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Bid>(UPSERT_BID)
            .bind(listing_id)
            .bind(buyer_id)
            .bind(amount)
            .bind(placed_at)
            .fetch_optional(&mut *tx)
            .await?;

        match updated {
            Some(bid) => {
                tx.commit().await?;
                Ok(LedgerWrite::Applied(bid))
            }
            None => {
                // 같은 트랜잭션 안에서 추월한 현재 최고가를 읽어 거절 사유에 쓴다
                let current = sqlx::query_scalar::<_, Decimal>(
                    "SELECT amount FROM bids WHERE auction_id = $1",
                )
                .bind(listing_id)
                .fetch_one(&mut *tx)
                .await?;
                tx.commit().await?;
                Ok(LedgerWrite::Outbid { current })
            }
        }
    }

    async fn toggle_wishlist(
        &self,
        user_id: i64,
        listing_id: i64,
    ) -> Result<WishlistState, StoreError> {
        info!(
            "{:<12} --> 위시리스트 토글: user={}, item={}",
            "Store", user_id, listing_id
        );
        let deleted = sqlx::query("DELETE FROM wishlists WHERE user_id = $1 AND item_id = $2")
            .bind(user_id)
            .bind(listing_id)
            .execute(&*self.pool)
            .await?;

        if deleted.rows_affected() > 0 {
            return Ok(WishlistState::Removed);
        }

        sqlx::query(
            "INSERT INTO wishlists (user_id, item_id) VALUES ($1, $2)
             ON CONFLICT (user_id, item_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(listing_id)
        .execute(&*self.pool)
        .await?;
        Ok(WishlistState::Added)
    }

    async fn close_listing(&self, listing_id: i64, at: DateTime<Utc>) -> Result<bool, StoreError> {
        info!("{:<12} --> 경매 조기 종료: listing={}", "Store", listing_id);
        let updated =
            sqlx::query("UPDATE listings SET end_time = $2 WHERE id = $1 AND end_time > $2")
                .bind(listing_id)
                .bind(at)
                .execute(&*self.pool)
                .await?;
        Ok(updated.rows_affected() > 0)
    }

    async fn insert_comment(
        &self,
        user_id: i64,
        listing_id: i64,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<Comment, StoreError> {
        info!("{:<12} --> 댓글 등록: listing={}", "Store", listing_id);
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (user_id, listing_id, content, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, listing_id, content, created_at
            "#,
        )
        .bind(user_id)
        .bind(listing_id)
        .bind(content)
        .bind(at)
        .fetch_one(&*self.pool)
        .await?;
        Ok(comment)
    }
}

// endregion: --- Postgres Implementation
