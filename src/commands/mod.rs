/// 쓰기 명령 처리
/// 1. 입찰
/// 2. 조기 종료
/// 3. 위시리스트 토글
/// 4. 상품 등록
/// 5. 댓글 등록
// region:    --- Imports
use crate::auction::model::{Bid, Comment, Listing, ListingDraft};
use crate::auction::rules::{self, BidRejection, CloseRejection};
use crate::store::{LedgerWrite, MarketStore, StoreError, WishlistState};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
// endregion: --- Imports

// region:    --- Commands

/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub listing_id: i64,
    pub bidder_id: i64,
    pub amount: Decimal,
}

/// 입찰 실패
#[derive(Debug, thiserror::Error)]
pub enum PlaceBidError {
    #[error(transparent)]
    Rejected(#[from] BidRejection),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 조기 종료 실패
#[derive(Debug, thiserror::Error)]
pub enum CloseError {
    #[error(transparent)]
    Rejected(#[from] CloseRejection),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 조기 종료 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    /// 이미 비활성 상태라 아무 것도 바꾸지 않음
    AlreadyEnded,
}

/// 1. 입찰
/// 규칙 검증을 통과한 입찰만 원장에 조건부로 기록한다.
/// 기록 시점에 더 높은 입찰이 끼어들었으면 새 최고가 기준으로 다시 거절한다.
pub async fn place_bid(
    cmd: PlaceBidCommand,
    listing: &Listing,
    current_highest: Option<Decimal>,
    now: DateTime<Utc>,
    store: &impl MarketStore,
) -> Result<Bid, PlaceBidError> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);

    rules::validate_bid(listing, current_highest, cmd.bidder_id, cmd.amount, now)?;

    match store
        .record_bid(cmd.listing_id, cmd.bidder_id, cmd.amount, now)
        .await?
    {
        LedgerWrite::Applied(bid) => {
            info!(
                "{:<12} --> 입찰 수락: listing={}, amount={}",
                "Command", bid.auction_id, bid.amount
            );
            Ok(bid)
        }
        LedgerWrite::Outbid { current } => {
            warn!(
                "{:<12} --> 동시 입찰에 추월됨: listing={}, current={}",
                "Command", cmd.listing_id, current
            );
            Err(BidRejection::BelowHighestBid(current).into())
        }
    }
}

/// 2. 조기 종료 (판매자 전용, 비활성 상품은 no-op)
pub async fn close_auction(
    listing: &Listing,
    requester_id: i64,
    now: DateTime<Utc>,
    store: &impl MarketStore,
) -> Result<CloseOutcome, CloseError> {
    info!(
        "{:<12} --> 조기 종료 요청: listing={}, requester={}",
        "Command", listing.id, requester_id
    );

    rules::validate_close(listing, requester_id)?;

    if !rules::is_active(listing, now) {
        return Ok(CloseOutcome::AlreadyEnded);
    }

    // 저장소 조건부 갱신이 동시 종료 요청과의 경합을 정리한다
    if store.close_listing(listing.id, now).await? {
        Ok(CloseOutcome::Closed)
    } else {
        Ok(CloseOutcome::AlreadyEnded)
    }
}

/// 3. 위시리스트 토글: 있으면 제거, 없으면 추가
pub async fn toggle_wishlist(
    user_id: i64,
    listing_id: i64,
    store: &impl MarketStore,
) -> Result<WishlistState, StoreError> {
    info!(
        "{:<12} --> 위시리스트 토글 요청: user={}, item={}",
        "Command", user_id, listing_id
    );
    store.toggle_wishlist(user_id, listing_id).await
}

/// 4. 상품 등록 (초안은 폼 검증을 이미 통과한 상태)
pub async fn create_listing(
    seller_id: i64,
    draft: ListingDraft,
    store: &impl MarketStore,
) -> Result<i64, StoreError> {
    info!(
        "{:<12} --> 상품 등록 요청: seller={}, title={}",
        "Command", seller_id, draft.title
    );
    store.insert_listing(seller_id, &draft).await
}

/// 5. 댓글 등록
pub async fn post_comment(
    user_id: i64,
    listing_id: i64,
    content: &str,
    now: DateTime<Utc>,
    store: &impl MarketStore,
) -> Result<Comment, StoreError> {
    info!(
        "{:<12} --> 댓글 등록 요청: user={}, listing={}",
        "Command", user_id, listing_id
    );
    store.insert_comment(user_id, listing_id, content, now).await
}

// endregion: --- Commands
