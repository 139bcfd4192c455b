/// 경매 규칙 엔진
/// 1. 입찰 검증
/// 2. 조기 종료 검증
/// 3. 활성 여부 / 카테고리 인덱스 계산
// region:    --- Imports
use crate::auction::model::Listing;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
// endregion: --- Imports

// region:    --- Rejections

/// 입찰 거절 사유
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BidRejection {
    #[error("You can not bid your own auction")]
    OwnAuction,
    #[error("Auction has not started yet")]
    NotStarted,
    #[error("Auction has already ended")]
    AlreadyEnded,
    #[error("Your bid must be larger than {}", gbp(.0))]
    BelowHighestBid(Decimal),
    #[error("Your bid must be equal or larger than {}", gbp(.0))]
    BelowStartPrice(Decimal),
}

impl BidRejection {
    /// 응답용 오류 코드
    pub fn code(&self) -> &'static str {
        match self {
            BidRejection::OwnAuction => "OWN_AUCTION",
            BidRejection::NotStarted => "NOT_STARTED",
            BidRejection::AlreadyEnded => "ALREADY_ENDED",
            BidRejection::BelowHighestBid(_) | BidRejection::BelowStartPrice(_) => "LOW_BID",
        }
    }
}

/// 조기 종료 거절 사유
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CloseRejection {
    #[error("Only the seller can end this auction")]
    NotSeller,
}

/// 금액을 £0.00 형식으로 표시
fn gbp(amount: &Decimal) -> String {
    let mut amount = *amount;
    amount.rescale(2);
    format!("£{amount}")
}

// endregion: --- Rejections

// region:    --- Rules

/// 입찰 검증
/// 판매자 본인 -> 시작 전 -> 종료 후 -> 금액 순으로 평가하고 첫 위반 사유를 돌려준다
pub fn validate_bid(
    listing: &Listing,
    current_highest: Option<Decimal>,
    bidder_id: i64,
    amount: Decimal,
    now: DateTime<Utc>,
) -> Result<(), BidRejection> {
    if listing.seller_id == Some(bidder_id) {
        return Err(BidRejection::OwnAuction);
    }

    // 시작 시각과 같은 순간부터 입찰 가능
    if listing.start_time > now {
        return Err(BidRejection::NotStarted);
    }

    if listing.end_time <= now {
        return Err(BidRejection::AlreadyEnded);
    }

    match current_highest {
        // 기존 최고가가 있으면 그보다 엄격히 커야 한다
        Some(current) if amount <= current => Err(BidRejection::BelowHighestBid(current)),
        // 첫 입찰은 시작가 이상이면 수락
        None if amount < listing.start_price => {
            Err(BidRejection::BelowStartPrice(listing.start_price))
        }
        _ => Ok(()),
    }
}

/// 경매 활성 여부 (종료 시각이 아직 지나지 않았는가)
pub fn is_active(listing: &Listing, now: DateTime<Utc>) -> bool {
    listing.end_time > now
}

/// 조기 종료 검증: 판매자 본인만 가능
pub fn validate_close(listing: &Listing, requester_id: i64) -> Result<(), CloseRejection> {
    if listing.seller_id != Some(requester_id) {
        return Err(CloseRejection::NotSeller);
    }
    Ok(())
}

/// 카테고리 인덱스 계산: 소문자 정규화 후 중복 제거, 오름차순
pub fn category_index<'a, I>(listings: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a Listing>,
{
    listings
        .into_iter()
        .map(|listing| listing.category.to_lowercase())
        .collect()
}

// endregion: --- Rules

// region:    --- Tests


// endregion: --- Tests
