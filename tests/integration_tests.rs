use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use marketplace_service::auction::model::{Bid, Comment, Listing, ListingDraft};
use marketplace_service::auction::rules::BidRejection;
use marketplace_service::commands::{
    self, CloseError, CloseOutcome, PlaceBidCommand, PlaceBidError,
};
use marketplace_service::database::DatabaseManager;
use marketplace_service::handlers;
use marketplace_service::session::SessionManager;
use marketplace_service::store::{LedgerWrite, MarketStore, StoreError, WishlistState};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

// region:    --- Memory Store

/// 테스트용 인메모리 저장소
/// 원장 갱신이 뮤텍스 하나로 직렬화되어 Postgres 구현의 조건부 upsert와 같은 보장을 준다
#[derive(Default)]
struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    users: HashMap<String, i64>,
    listings: HashMap<i64, Listing>,
    ledger: HashMap<i64, Bid>,
    wishlists: HashSet<(i64, i64)>,
    comments: Vec<Comment>,
}

impl MemoryStore {
    fn listing(&self, listing_id: i64) -> Option<Listing> {
        self.state.lock().listings.get(&listing_id).cloned()
    }

    fn ledger_row(&self, listing_id: i64) -> Option<Bid> {
        self.state.lock().ledger.get(&listing_id).cloned()
    }

    fn wishlisted(&self, user_id: i64, listing_id: i64) -> bool {
        self.state.lock().wishlists.contains(&(user_id, listing_id))
    }

    fn comments_for(&self, listing_id: i64) -> Vec<Comment> {
        self.state
            .lock()
            .comments
            .iter()
            .filter(|comment| comment.listing_id == listing_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn insert_user(
        &self,
        username: &str,
        _email: &str,
        _password_hash: &str,
    ) -> Result<i64, StoreError> {
        let mut state = self.state.lock();
        if state.users.contains_key(username) {
            return Err(StoreError::UsernameTaken);
        }
        state.next_id += 1;
        let id = state.next_id;
        state.users.insert(username.to_string(), id);
        Ok(id)
    }

    async fn insert_listing(
        &self,
        seller_id: i64,
        draft: &ListingDraft,
    ) -> Result<i64, StoreError> {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = state.next_id;
        let listing = Listing {
            id,
            seller_id: Some(seller_id),
            title: draft.title.clone(),
            description: draft.description.clone(),
            start_time: draft.start_time,
            end_time: draft.end_time,
            start_price: draft.start_price,
            image_url: draft.image_url.clone(),
            category: draft.category.clone(),
            created_at: draft.start_time,
        };
        state.listings.insert(id, listing);
        Ok(id)
    }

    async fn record_bid(
        &self,
        listing_id: i64,
        buyer_id: i64,
        amount: Decimal,
        placed_at: DateTime<Utc>,
    ) -> Result<LedgerWrite, StoreError> {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = state.next_id;
        match state.ledger.get_mut(&listing_id) {
            // 기존 행보다 클 때만 제자리 갱신
            Some(row) => {
                if row.amount < amount {
                    row.buyer_id = Some(buyer_id);
                    row.amount = amount;
                    row.placed_at = placed_at;
                    Ok(LedgerWrite::Applied(row.clone()))
                } else {
                    Ok(LedgerWrite::Outbid {
                        current: row.amount,
                    })
                }
            }
            None => {
                let bid = Bid {
                    id,
                    auction_id: listing_id,
                    buyer_id: Some(buyer_id),
                    amount,
                    placed_at,
                };
                state.ledger.insert(listing_id, bid.clone());
                Ok(LedgerWrite::Applied(bid))
            }
        }
    }

    async fn toggle_wishlist(
        &self,
        user_id: i64,
        listing_id: i64,
    ) -> Result<WishlistState, StoreError> {
        let mut state = self.state.lock();
        if state.wishlists.remove(&(user_id, listing_id)) {
            Ok(WishlistState::Removed)
        } else {
            state.wishlists.insert((user_id, listing_id));
            Ok(WishlistState::Added)
        }
    }

    async fn close_listing(&self, listing_id: i64, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut state = self.state.lock();
        match state.listings.get_mut(&listing_id) {
            Some(listing) if listing.end_time > at => {
                listing.end_time = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_comment(
        &self,
        user_id: i64,
        listing_id: i64,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<Comment, StoreError> {
        let mut state = self.state.lock();
        state.next_id += 1;
        let comment = Comment {
            id: state.next_id,
            user_id: Some(user_id),
            listing_id,
            content: content.to_string(),
            created_at: at,
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }
}

// endregion: --- Memory Store

// region:    --- Helpers

/// 테스트용 상품 생성 (한 시간 전에 시작해 두 시간 뒤에 끝나는 활성 경매)
fn test_listing(id: i64, seller_id: i64, start_price: Decimal, now: DateTime<Utc>) -> Listing {
    Listing {
        id,
        seller_id: Some(seller_id),
        title: format!("Test listing {id}"),
        description: "Integration test listing".to_string(),
        start_time: now - Duration::hours(1),
        end_time: now + Duration::hours(2),
        start_price,
        image_url: String::new(),
        category: "collectables".to_string(),
        created_at: now - Duration::hours(1),
    }
}

/// 테스트용 등록 초안 생성
fn test_draft(start_price: Decimal, now: DateTime<Utc>) -> ListingDraft {
    ListingDraft {
        title: "Test listing".to_string(),
        description: String::new(),
        start_time: now - Duration::hours(1),
        end_time: now + Duration::hours(2),
        start_price,
        image_url: String::new(),
        category: "collectables".to_string(),
    }
}

// endregion: --- Helpers

// region:    --- Bidding Tests

/// 첫 입찰은 시작가와 같으면 수락된다
#[tokio::test]
async fn first_bid_at_start_price_is_accepted() {
    let store = MemoryStore::default();
    let now = Utc::now();
    let listing = test_listing(1, 1, dec!(10.00), now);

    let cmd = PlaceBidCommand {
        listing_id: 1,
        bidder_id: 2,
        amount: dec!(10.00),
    };
    let bid = commands::place_bid(cmd, &listing, None, now, &store)
        .await
        .unwrap();

    assert_eq!(bid.amount, dec!(10.00));
    let row = store.ledger_row(1).unwrap();
    assert_eq!(row.buyer_id, Some(2));
    assert_eq!(row.amount, dec!(10.00));
}

/// 시작가 미만 첫 입찰은 거절되고 상태가 바뀌지 않는다
#[tokio::test]
async fn first_bid_below_start_price_is_rejected() {
    let store = MemoryStore::default();
    let now = Utc::now();
    let listing = test_listing(1, 1, dec!(10.00), now);

    let cmd = PlaceBidCommand {
        listing_id: 1,
        bidder_id: 2,
        amount: dec!(9.99),
    };
    let error = commands::place_bid(cmd, &listing, None, now, &store)
        .await
        .unwrap_err();

    match error {
        PlaceBidError::Rejected(rejection) => {
            assert_eq!(
                rejection.to_string(),
                "Your bid must be equal or larger than £10.00"
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(store.ledger_row(1).is_none());
}

/// 스펙 시나리오: 9.99 거절 -> 10.00 수락 -> 10.00 거절 -> 10.01 수락
#[tokio::test]
async fn bidding_scenario_walks_the_ledger_forward() {
    let store = MemoryStore::default();
    let now = Utc::now();
    let listing = test_listing(1, 1, dec!(10.00), now);
    let bid_of = |bidder_id, amount| PlaceBidCommand {
        listing_id: 1,
        bidder_id,
        amount,
    };

    // 시작가 미만 거절
    let error = commands::place_bid(bid_of(2, dec!(9.99)), &listing, None, now, &store)
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        PlaceBidError::Rejected(BidRejection::BelowStartPrice(_))
    ));

    // 시작가 입찰 수락
    commands::place_bid(bid_of(2, dec!(10.00)), &listing, None, now, &store)
        .await
        .unwrap();
    let first_row = store.ledger_row(1).unwrap();
    assert_eq!(first_row.buyer_id, Some(2));

    // 같은 금액 재입찰 거절
    let error = commands::place_bid(
        bid_of(3, dec!(10.00)),
        &listing,
        Some(dec!(10.00)),
        now,
        &store,
    )
    .await
    .unwrap_err();
    match error {
        PlaceBidError::Rejected(rejection) => {
            assert_eq!(rejection.to_string(), "Your bid must be larger than £10.00");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // 1페니 높은 입찰 수락, 원장 행은 제자리 갱신
    commands::place_bid(
        bid_of(3, dec!(10.01)),
        &listing,
        Some(dec!(10.00)),
        now,
        &store,
    )
    .await
    .unwrap();
    let second_row = store.ledger_row(1).unwrap();
    assert_eq!(second_row.id, first_row.id);
    assert_eq!(second_row.buyer_id, Some(3));
    assert_eq!(second_row.amount, dec!(10.01));
}

/// 판매자는 금액과 무관하게 자기 경매에 입찰할 수 없다
#[tokio::test]
async fn seller_bid_is_rejected_regardless_of_amount() {
    let store = MemoryStore::default();
    let now = Utc::now();
    let listing = test_listing(1, 1, dec!(10.00), now);

    let cmd = PlaceBidCommand {
        listing_id: 1,
        bidder_id: 1,
        amount: dec!(999.00),
    };
    let error = commands::place_bid(cmd, &listing, None, now, &store)
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        PlaceBidError::Rejected(BidRejection::OwnAuction)
    ));
    assert!(store.ledger_row(1).is_none());
}

/// 시작 전 입찰은 거절되고, 시작 시각 정각부터는 수락된다
#[tokio::test]
async fn bid_validity_starts_exactly_at_start_time() {
    let store = MemoryStore::default();
    let now = Utc::now();
    let mut listing = test_listing(1, 1, dec!(10.00), now);

    listing.start_time = now + Duration::seconds(1);
    let cmd = PlaceBidCommand {
        listing_id: 1,
        bidder_id: 2,
        amount: dec!(10.00),
    };
    let error = commands::place_bid(cmd.clone(), &listing, None, now, &store)
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        PlaceBidError::Rejected(BidRejection::NotStarted)
    ));

    listing.start_time = now;
    commands::place_bid(cmd, &listing, None, now, &store)
        .await
        .unwrap();
    assert_eq!(store.ledger_row(1).unwrap().amount, dec!(10.00));
}

/// 동시 입찰 50건이 몰려도 원장에는 최고가 한 건만 남는다
#[tokio::test]
async fn concurrent_bids_record_a_single_winner() {
    let store = Arc::new(MemoryStore::default());
    let now = Utc::now();
    let listing = test_listing(1, 1, dec!(1.00), now);

    // 전부 같은 (비어 있는) 원장 스냅샷을 보고 입찰한다
    let mut handles = vec![];
    for i in 1..=50i64 {
        let store = Arc::clone(&store);
        let listing = listing.clone();
        let handle = tokio::spawn(async move {
            let cmd = PlaceBidCommand {
                listing_id: listing.id,
                bidder_id: 100 + i,
                amount: Decimal::new(i * 100, 2),
            };
            commands::place_bid(cmd, &listing, None, now, &*store).await
        });
        handles.push(handle);
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(PlaceBidError::Rejected(BidRejection::BelowHighestBid(_))) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert!(accepted >= 1);
    let row = store.ledger_row(1).unwrap();
    assert_eq!(row.amount, dec!(50.00));
    assert_eq!(row.buyer_id, Some(150));
}

// endregion: --- Bidding Tests

// region:    --- Lifecycle / Wishlist / Comment Tests

/// 위시리스트 토글을 두 번 하면 원래 상태로 돌아온다
#[tokio::test]
async fn toggle_wishlist_is_its_own_inverse() {
    let store = MemoryStore::default();

    let first = commands::toggle_wishlist(1, 42, &store).await.unwrap();
    assert_eq!(first, WishlistState::Added);
    assert!(store.wishlisted(1, 42));

    let second = commands::toggle_wishlist(1, 42, &store).await.unwrap();
    assert_eq!(second, WishlistState::Removed);
    assert!(!store.wishlisted(1, 42));
}

/// 판매자가 조기 종료하면 종료 시각이 현재로 당겨진다
#[tokio::test]
async fn seller_can_close_an_active_auction_early() {
    let store = MemoryStore::default();
    let now = Utc::now();
    let listing_id = store.insert_listing(1, &test_draft(dec!(10.00), now)).await.unwrap();
    let listing = store.listing(listing_id).unwrap();

    let outcome = commands::close_auction(&listing, 1, now, &store)
        .await
        .unwrap();

    assert_eq!(outcome, CloseOutcome::Closed);
    assert_eq!(store.listing(listing_id).unwrap().end_time, now);
}

/// 이미 종료된 경매의 조기 종료는 아무 것도 바꾸지 않는다
#[tokio::test]
async fn closing_an_ended_auction_changes_nothing() {
    let store = MemoryStore::default();
    let now = Utc::now();
    let mut draft = test_draft(dec!(10.00), now);
    draft.end_time = now - Duration::hours(1);
    let listing_id = store.insert_listing(1, &draft).await.unwrap();
    let listing = store.listing(listing_id).unwrap();

    let outcome = commands::close_auction(&listing, 1, now, &store)
        .await
        .unwrap();

    assert_eq!(outcome, CloseOutcome::AlreadyEnded);
    assert_eq!(
        store.listing(listing_id).unwrap().end_time,
        now - Duration::hours(1)
    );
}

/// 판매자가 아니면 조기 종료할 수 없다
#[tokio::test]
async fn only_the_seller_can_close_early() {
    let store = MemoryStore::default();
    let now = Utc::now();
    let listing_id = store.insert_listing(1, &test_draft(dec!(10.00), now)).await.unwrap();
    let listing = store.listing(listing_id).unwrap();
    let original_end = listing.end_time;

    let error = commands::close_auction(&listing, 2, now, &store)
        .await
        .unwrap_err();

    assert!(matches!(error, CloseError::Rejected(_)));
    assert_eq!(store.listing(listing_id).unwrap().end_time, original_end);
}

/// 댓글은 등록한 순서대로 쌓인다
#[tokio::test]
async fn comments_are_kept_in_submission_order() {
    let store = MemoryStore::default();
    let now = Utc::now();

    commands::post_comment(1, 42, "First!", now, &store)
        .await
        .unwrap();
    commands::post_comment(2, 42, "Looks great.", now + Duration::seconds(1), &store)
        .await
        .unwrap();

    let comments = store.comments_for(42);
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].content, "First!");
    assert_eq!(comments[1].content, "Looks great.");
}

/// 중복 사용자명 등록은 거절된다
#[tokio::test]
async fn duplicate_username_is_rejected() {
    let store = MemoryStore::default();

    store
        .insert_user("alice", "alice@example.com", "hash")
        .await
        .unwrap();
    let error = store
        .insert_user("alice", "other@example.com", "hash")
        .await
        .unwrap_err();

    assert!(matches!(error, StoreError::UsernameTaken));
}

// endregion: --- Lifecycle / Wishlist / Comment Tests

// region:    --- HTTP Round Trip

/// HTTP 왕복 테스트: 가입 -> 등록 -> 입찰 거절/수락 -> 상세 조회
/// DATABASE_URL이 없으면 건너뛴다
#[tokio::test]
async fn http_round_trip() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL 미설정: http_round_trip 건너뜀");
        return;
    }

    let db_manager = Arc::new(DatabaseManager::new().await);
    db_manager.initialize_database().await.unwrap();
    let session_manager = Arc::new(SessionManager::new());
    let app = handlers::app(Arc::clone(&db_manager), session_manager);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });

    let client = reqwest::Client::new();

    // 판매자, 구매자 가입
    let seller: Value = client
        .post(format!("{base}/register"))
        .json(&json!({
            "username": "seller",
            "email": "seller@example.com",
            "password": "pw",
            "confirmation": "pw"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let seller_token = seller["token"].as_str().unwrap().to_string();

    let buyer: Value = client
        .post(format!("{base}/register"))
        .json(&json!({
            "username": "buyer",
            "email": "buyer@example.com",
            "password": "pw",
            "confirmation": "pw"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let buyer_token = buyer["token"].as_str().unwrap().to_string();

    // 상품 등록
    let end = (Utc::now() + Duration::days(3)).to_rfc3339();
    let response = client
        .post(format!("{base}/listings"))
        .bearer_auth(&seller_token)
        .json(&json!({
            "title": "Vintage radio",
            "description": "Bakelite, working condition.",
            "end": end,
            "start_price": "10.00",
            "category": "Electronics"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    let listing_id = created["id"].as_i64().unwrap();

    // 시작가 미만 입찰 거절
    let response = client
        .post(format!("{base}/listings/{listing_id}/bid"))
        .bearer_auth(&buyer_token)
        .json(&json!({ "bid": "9.99" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Your bid must be equal or larger than £10.00");

    // 시작가 입찰 수락
    let response = client
        .post(format!("{base}/listings/{listing_id}/bid"))
        .bearer_auth(&buyer_token)
        .json(&json!({ "bid": "10.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    // 판매자 본인 입찰 거절
    let response = client
        .post(format!("{base}/listings/{listing_id}/bid"))
        .bearer_auth(&seller_token)
        .json(&json!({ "bid": "11.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "OWN_AUCTION");

    // 상세 조회: 최고 입찰과 활성 여부 확인
    let detail: Value = client
        .get(format!("{base}/listings/{listing_id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["is_active"], true);
    assert_eq!(detail["highest_bid"]["amount"], "10.00");

    // 카테고리 인덱스는 소문자로 정규화된다
    let categories: Value = client
        .get(format!("{base}/categories"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(categories
        .as_array()
        .unwrap()
        .iter()
        .any(|category| category.as_str() == Some("electronics")));
}

// endregion: --- HTTP Round Trip
