// region:    --- Imports
use super::queries;
use crate::auction::model::{Bid, Comment, Listing, ListingSummary, User, WishlistEntry};
use crate::database::DatabaseManager;
use chrono::{DateTime, Utc};
use sqlx::Error as SqlxError;
use tracing::info;
// endregion: --- Imports

// region:    --- Query Handlers

/// 활성 경매 목록 조회
pub async fn get_active_listings(
    db_manager: &DatabaseManager,
    now: DateTime<Utc>,
) -> Result<Vec<ListingSummary>, SqlxError> {
    info!("{:<12} --> 활성 경매 목록 조회", "Query");
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, ListingSummary>(queries::GET_ACTIVE_LISTINGS)
                    .bind(now)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 종료된 경매 목록 조회
pub async fn get_past_listings(
    db_manager: &DatabaseManager,
    now: DateTime<Utc>,
) -> Result<Vec<ListingSummary>, SqlxError> {
    info!("{:<12} --> 종료된 경매 목록 조회", "Query");
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, ListingSummary>(queries::GET_PAST_LISTINGS)
                    .bind(now)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 상품 조회
pub async fn get_listing(
    db_manager: &DatabaseManager,
    listing_id: i64,
) -> Result<Option<Listing>, SqlxError> {
    info!("{:<12} --> 상품 조회 id: {}", "Query", listing_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Listing>(queries::GET_LISTING)
                    .bind(listing_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 모든 상품 조회
pub async fn get_all_listings(db_manager: &DatabaseManager) -> Result<Vec<Listing>, SqlxError> {
    info!("{:<12} --> 모든 상품 조회", "Query");
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Listing>(queries::GET_ALL_LISTINGS)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 최고 입찰 조회
pub async fn get_highest_bid(
    db_manager: &DatabaseManager,
    listing_id: i64,
) -> Result<Option<Bid>, SqlxError> {
    info!("{:<12} --> 최고 입찰 조회 id: {}", "Query", listing_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Bid>(queries::GET_HIGHEST_BID)
                    .bind(listing_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 댓글 조회
pub async fn get_comments(
    db_manager: &DatabaseManager,
    listing_id: i64,
) -> Result<Vec<Comment>, SqlxError> {
    info!("{:<12} --> 댓글 조회 id: {}", "Query", listing_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Comment>(queries::GET_COMMENTS)
                    .bind(listing_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 위시리스트 포함 여부 조회
pub async fn get_wishlist_entry(
    db_manager: &DatabaseManager,
    user_id: i64,
    listing_id: i64,
) -> Result<Option<WishlistEntry>, SqlxError> {
    info!(
        "{:<12} --> 위시리스트 조회: user={}, item={}",
        "Query", user_id, listing_id
    );
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, WishlistEntry>(queries::GET_WISHLIST_ENTRY)
                    .bind(user_id)
                    .bind(listing_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 위시리스트 상품 목록 조회
pub async fn get_wishlist_listings(
    db_manager: &DatabaseManager,
    user_id: i64,
) -> Result<Vec<ListingSummary>, SqlxError> {
    info!("{:<12} --> 위시리스트 목록 조회: user={}", "Query", user_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, ListingSummary>(queries::GET_WISHLIST_LISTINGS)
                    .bind(user_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 카테고리별 상품 조회
pub async fn get_listings_by_category(
    db_manager: &DatabaseManager,
    category: String,
) -> Result<Vec<ListingSummary>, SqlxError> {
    info!("{:<12} --> 카테고리별 조회: {}", "Query", category);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, ListingSummary>(queries::GET_LISTINGS_BY_CATEGORY)
                    .bind(category)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 사용자 조회
pub async fn get_user_by_username(
    db_manager: &DatabaseManager,
    username: String,
) -> Result<Option<User>, SqlxError> {
    info!("{:<12} --> 사용자 조회: {}", "Query", username);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, User>(queries::GET_USER_BY_USERNAME)
                    .bind(username)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

// endregion: --- Query Handlers
