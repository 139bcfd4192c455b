use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// 사용자 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

// 경매 상품 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Listing {
    pub id: i64,
    pub seller_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub start_price: Decimal,
    pub image_url: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// 폼 검증을 통과한 신규 상품 초안 (카테고리는 소문자로 정규화된 상태)
#[derive(Debug, Clone)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub start_price: Decimal,
    pub image_url: String,
    pub category: String,
}

// 입찰 원장 모델
// 상품당 한 행만 존재하며, 더 높은 입찰이 수락되면 제자리에서 갱신된다
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub buyer_id: Option<i64>,
    pub amount: Decimal,
    pub placed_at: DateTime<Utc>,
}

// 댓글 모델 (등록 순서 유지, 수정/삭제 없음)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub user_id: Option<i64>,
    pub listing_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// 위시리스트 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WishlistEntry {
    pub id: i64,
    pub user_id: i64,
    pub item_id: i64,
}

// 목록 화면용 상품 모델 (현재 최고가 포함)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ListingSummary {
    pub id: i64,
    pub seller_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub start_price: Decimal,
    pub image_url: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub current_price: Option<Decimal>,
}
