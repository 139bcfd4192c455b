// region:    --- Imports
use crate::auction::rules;
use crate::commands::{self, CloseError, CloseOutcome, PlaceBidCommand, PlaceBidError};
use crate::database::DatabaseManager;
use crate::forms::{BidForm, CommentForm, CreateListingForm, LoginForm, RegisterForm};
use crate::query;
use crate::session::{self, SessionManager};
use crate::store::{MarketStore, PgMarketStore, StoreError, WishlistState};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use validator::{Validate, ValidationErrors};
// endregion: --- Imports

// region:    --- Router

/// 라우터 구성
pub fn app(db_manager: Arc<DatabaseManager>, session_manager: Arc<SessionManager>) -> Router {
    Router::new()
        .route("/register", post(handle_register))
        .route("/login", post(handle_login))
        .route("/logout", post(handle_logout))
        .route(
            "/listings",
            get(handle_get_active_listings).post(handle_create_listing),
        )
        .route("/listings/past", get(handle_get_past_listings))
        .route("/listings/:id", get(handle_get_listing))
        .route("/listings/:id/bid", post(handle_place_bid))
        .route("/listings/:id/wishlist", post(handle_toggle_wishlist))
        .route("/listings/:id/close", post(handle_close_auction))
        .route("/listings/:id/comments", post(handle_post_comment))
        .route("/wishlist", get(handle_get_wishlist))
        .route("/categories", get(handle_get_categories))
        .route("/categories/:category", get(handle_get_category_listings))
        .with_state((db_manager, session_manager))
}

// endregion: --- Router

// region:    --- Auth Handlers

/// 회원 가입 처리 (성공 시 바로 로그인)
pub async fn handle_register(
    State((db_manager, session_manager)): State<(Arc<DatabaseManager>, Arc<SessionManager>)>,
    Json(form): Json<RegisterForm>,
) -> impl IntoResponse {
    info!("{:<12} --> 회원 가입 요청: {}", "Command", form.username);

    if let Err(errors) = form.validated() {
        return validation_failed(errors);
    }

    let password_hash = match session::hash_password(&form.password) {
        Ok(hash) => hash,
        Err(e) => return internal_error(e),
    };

    let store = PgMarketStore::new(db_manager.get_pool());
    match store
        .insert_user(&form.username, &form.email, &password_hash)
        .await
    {
        Ok(user_id) => {
            let token = session_manager.open_session(user_id);
            (
                axum::http::StatusCode::CREATED,
                Json(json!({
                    "token": token,
                    "user": { "id": user_id, "username": form.username }
                })),
            )
                .into_response()
        }
        Err(StoreError::UsernameTaken) => (
            axum::http::StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Username already taken.",
                "code": "USERNAME_TAKEN"
            })),
        )
            .into_response(),
        Err(e) => internal_error(e),
    }
}

/// 로그인 처리
pub async fn handle_login(
    State((db_manager, session_manager)): State<(Arc<DatabaseManager>, Arc<SessionManager>)>,
    Json(form): Json<LoginForm>,
) -> impl IntoResponse {
    info!("{:<12} --> 로그인 요청: {}", "Command", form.username);

    let user = match query::handlers::get_user_by_username(&db_manager, form.username).await {
        Ok(user) => user,
        Err(e) => return internal_error(e),
    };

    if let Some(user) = user {
        match session::verify_password(&form.password, &user.password_hash) {
            Ok(true) => {
                let token = session_manager.open_session(user.id);
                return Json(json!({
                    "token": token,
                    "user": { "id": user.id, "username": user.username }
                }))
                .into_response();
            }
            Ok(false) => {}
            Err(e) => return internal_error(e),
        }
    }

    (
        axum::http::StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "Invalid username and/or password.",
            "code": "INVALID_CREDENTIALS"
        })),
    )
        .into_response()
}

/// 로그아웃 처리
pub async fn handle_logout(
    State((_, session_manager)): State<(Arc<DatabaseManager>, Arc<SessionManager>)>,
    headers: HeaderMap,
) -> impl IntoResponse {
    info!("{:<12} --> 로그아웃 요청", "Command");

    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    if let Some(token) = token {
        session_manager.close_session(token);
    }

    Json(json!({ "message": "Logged out." })).into_response()
}

// endregion: --- Auth Handlers

// region:    --- Command Handlers

/// 상품 등록 요청 처리
pub async fn handle_create_listing(
    State((db_manager, session_manager)): State<(Arc<DatabaseManager>, Arc<SessionManager>)>,
    headers: HeaderMap,
    Json(form): Json<CreateListingForm>,
) -> impl IntoResponse {
    info!("{:<12} --> 상품 등록 요청 처리 시작", "Command");

    let Some(seller_id) = session_manager.authenticate(&headers) else {
        return unauthenticated();
    };

    let now = Utc::now();
    let draft = match form.cleaned(now) {
        Ok(draft) => draft,
        Err(errors) => return validation_failed(errors),
    };

    let store = PgMarketStore::new(db_manager.get_pool());
    match commands::create_listing(seller_id, draft, &store).await {
        Ok(listing_id) => (
            axum::http::StatusCode::CREATED,
            Json(json!({ "id": listing_id })),
        )
            .into_response(),
        Err(e) => internal_error(e),
    }
}

/// 입찰 요청 처리
pub async fn handle_place_bid(
    State((db_manager, session_manager)): State<(Arc<DatabaseManager>, Arc<SessionManager>)>,
    Path(listing_id): Path<i64>,
    headers: HeaderMap,
    Json(form): Json<BidForm>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> 입찰 요청 처리 시작: listing={}",
        "Command", listing_id
    );

    let Some(bidder_id) = session_manager.authenticate(&headers) else {
        return unauthenticated();
    };

    let amount = match form.cleaned() {
        Ok(amount) => amount,
        Err(errors) => return validation_failed(errors),
    };

    let listing = match query::handlers::get_listing(&db_manager, listing_id).await {
        Ok(Some(listing)) => listing,
        Ok(None) => return listing_not_found(),
        Err(e) => return internal_error(e),
    };

    let highest_bid = match query::handlers::get_highest_bid(&db_manager, listing_id).await {
        Ok(bid) => bid,
        Err(e) => return internal_error(e),
    };

    let store = PgMarketStore::new(db_manager.get_pool());
    let cmd = PlaceBidCommand {
        listing_id,
        bidder_id,
        amount,
    };

    match commands::place_bid(
        cmd,
        &listing,
        highest_bid.map(|bid| bid.amount),
        Utc::now(),
        &store,
    )
    .await
    {
        Ok(bid) => Json(json!({
            "message": "Bid placed successfully.",
            "current_price": bid.amount
        }))
        .into_response(),
        Err(PlaceBidError::Rejected(rejection)) => (
            axum::http::StatusCode::BAD_REQUEST,
            Json(json!({
                "error": rejection.to_string(),
                "code": rejection.code()
            })),
        )
            .into_response(),
        Err(PlaceBidError::Store(e)) => internal_error(e),
    }
}

/// 위시리스트 토글 요청 처리
pub async fn handle_toggle_wishlist(
    State((db_manager, session_manager)): State<(Arc<DatabaseManager>, Arc<SessionManager>)>,
    Path(listing_id): Path<i64>,
    headers: HeaderMap,
) -> impl IntoResponse {
    info!(
        "{:<12} --> 위시리스트 토글 요청: listing={}",
        "Command", listing_id
    );

    let Some(user_id) = session_manager.authenticate(&headers) else {
        return unauthenticated();
    };

    match query::handlers::get_listing(&db_manager, listing_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return listing_not_found(),
        Err(e) => return internal_error(e),
    }

    let store = PgMarketStore::new(db_manager.get_pool());
    match commands::toggle_wishlist(user_id, listing_id, &store).await {
        Ok(state) => Json(json!({ "wishlisted": state == WishlistState::Added })).into_response(),
        Err(e) => internal_error(e),
    }
}

/// 경매 조기 종료 요청 처리
pub async fn handle_close_auction(
    State((db_manager, session_manager)): State<(Arc<DatabaseManager>, Arc<SessionManager>)>,
    Path(listing_id): Path<i64>,
    headers: HeaderMap,
) -> impl IntoResponse {
    info!(
        "{:<12} --> 조기 종료 요청 처리 시작: listing={}",
        "Command", listing_id
    );

    let Some(requester_id) = session_manager.authenticate(&headers) else {
        return unauthenticated();
    };

    let listing = match query::handlers::get_listing(&db_manager, listing_id).await {
        Ok(Some(listing)) => listing,
        Ok(None) => return listing_not_found(),
        Err(e) => return internal_error(e),
    };

    let store = PgMarketStore::new(db_manager.get_pool());
    match commands::close_auction(&listing, requester_id, Utc::now(), &store).await {
        Ok(CloseOutcome::Closed) => Json(json!({ "message": "Auction ended." })).into_response(),
        Ok(CloseOutcome::AlreadyEnded) => {
            Json(json!({ "message": "Auction has already ended." })).into_response()
        }
        Err(CloseError::Rejected(rejection)) => (
            axum::http::StatusCode::FORBIDDEN,
            Json(json!({
                "error": rejection.to_string(),
                "code": "NOT_SELLER"
            })),
        )
            .into_response(),
        Err(CloseError::Store(e)) => internal_error(e),
    }
}

/// 댓글 등록 요청 처리
pub async fn handle_post_comment(
    State((db_manager, session_manager)): State<(Arc<DatabaseManager>, Arc<SessionManager>)>,
    Path(listing_id): Path<i64>,
    headers: HeaderMap,
    Json(form): Json<CommentForm>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> 댓글 등록 요청 처리 시작: listing={}",
        "Command", listing_id
    );

    let Some(user_id) = session_manager.authenticate(&headers) else {
        return unauthenticated();
    };

    if let Err(errors) = form.validate() {
        return validation_failed(errors);
    }

    match query::handlers::get_listing(&db_manager, listing_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return listing_not_found(),
        Err(e) => return internal_error(e),
    }

    let store = PgMarketStore::new(db_manager.get_pool());
    match commands::post_comment(user_id, listing_id, &form.comment, Utc::now(), &store).await {
        Ok(comment) => (axum::http::StatusCode::CREATED, Json(comment)).into_response(),
        Err(e) => internal_error(e),
    }
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 활성 경매 목록 조회
pub async fn handle_get_active_listings(
    State((db_manager, _)): State<(Arc<DatabaseManager>, Arc<SessionManager>)>,
) -> impl IntoResponse {
    info!("{:<12} --> 활성 경매 목록 조회", "HandlerQuery");
    match query::handlers::get_active_listings(&db_manager, Utc::now()).await {
        Ok(listings) => Json(listings).into_response(),
        Err(e) => internal_error(e),
    }
}

/// 종료된 경매 목록 조회
pub async fn handle_get_past_listings(
    State((db_manager, _)): State<(Arc<DatabaseManager>, Arc<SessionManager>)>,
) -> impl IntoResponse {
    info!("{:<12} --> 종료된 경매 목록 조회", "HandlerQuery");
    match query::handlers::get_past_listings(&db_manager, Utc::now()).await {
        Ok(listings) => Json(listings).into_response(),
        Err(e) => internal_error(e),
    }
}

/// 상품 상세 조회 (최고 입찰, 활성 여부, 댓글, 위시리스트 여부 포함)
pub async fn handle_get_listing(
    State((db_manager, session_manager)): State<(Arc<DatabaseManager>, Arc<SessionManager>)>,
    Path(listing_id): Path<i64>,
    headers: HeaderMap,
) -> impl IntoResponse {
    info!("{:<12} --> 상품 상세 조회 id: {}", "HandlerQuery", listing_id);

    let listing = match query::handlers::get_listing(&db_manager, listing_id).await {
        Ok(Some(listing)) => listing,
        Ok(None) => return listing_not_found(),
        Err(e) => return internal_error(e),
    };

    let highest_bid = match query::handlers::get_highest_bid(&db_manager, listing_id).await {
        Ok(bid) => bid,
        Err(e) => return internal_error(e),
    };

    let comments = match query::handlers::get_comments(&db_manager, listing_id).await {
        Ok(comments) => comments,
        Err(e) => return internal_error(e),
    };

    // 로그인한 사용자에게만 위시리스트 여부를 알려준다
    let wishlisted = match session_manager.authenticate(&headers) {
        Some(user_id) => {
            match query::handlers::get_wishlist_entry(&db_manager, user_id, listing_id).await {
                Ok(entry) => Some(entry.is_some()),
                Err(e) => return internal_error(e),
            }
        }
        None => None,
    };

    Json(json!({
        "listing": listing,
        "highest_bid": highest_bid,
        "is_active": rules::is_active(&listing, Utc::now()),
        "comments": comments,
        "wishlisted": wishlisted
    }))
    .into_response()
}

/// 위시리스트 목록 조회
pub async fn handle_get_wishlist(
    State((db_manager, session_manager)): State<(Arc<DatabaseManager>, Arc<SessionManager>)>,
    headers: HeaderMap,
) -> impl IntoResponse {
    info!("{:<12} --> 위시리스트 목록 조회", "HandlerQuery");

    let Some(user_id) = session_manager.authenticate(&headers) else {
        return unauthenticated();
    };

    match query::handlers::get_wishlist_listings(&db_manager, user_id).await {
        Ok(listings) => Json(listings).into_response(),
        Err(e) => internal_error(e),
    }
}

/// 카테고리 인덱스 조회
pub async fn handle_get_categories(
    State((db_manager, _)): State<(Arc<DatabaseManager>, Arc<SessionManager>)>,
) -> impl IntoResponse {
    info!("{:<12} --> 카테고리 인덱스 조회", "HandlerQuery");
    match query::handlers::get_all_listings(&db_manager).await {
        Ok(listings) => Json(rules::category_index(listings.iter())).into_response(),
        Err(e) => internal_error(e),
    }
}

/// 카테고리별 상품 조회
pub async fn handle_get_category_listings(
    State((db_manager, _)): State<(Arc<DatabaseManager>, Arc<SessionManager>)>,
    Path(category): Path<String>,
) -> impl IntoResponse {
    info!("{:<12} --> 카테고리별 조회: {}", "HandlerQuery", category);
    match query::handlers::get_listings_by_category(&db_manager, category.to_lowercase()).await {
        Ok(listings) => Json(listings).into_response(),
        Err(e) => internal_error(e),
    }
}

// endregion: --- Query Handlers

// region:    --- Responses

/// 인증 필요 응답
fn unauthenticated() -> axum::response::Response {
    (
        axum::http::StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "Authentication required.",
            "code": "UNAUTHENTICATED"
        })),
    )
        .into_response()
}

/// 상품 없음 응답
fn listing_not_found() -> axum::response::Response {
    (
        axum::http::StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Listing not found.",
            "code": "NOT_FOUND"
        })),
    )
        .into_response()
}

/// 폼 검증 실패 응답 (필드 단위 오류 포함)
fn validation_failed(errors: ValidationErrors) -> axum::response::Response {
    (
        axum::http::StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "error": "Validation failed.",
            "fields": errors
        })),
    )
        .into_response()
}

/// 내부 오류 응답
fn internal_error<E: std::fmt::Display>(e: E) -> axum::response::Response {
    error!("{:<12} --> 내부 오류: {}", "Handler", e);
    (
        axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        Json(e.to_string()),
    )
        .into_response()
}

// endregion: --- Responses
