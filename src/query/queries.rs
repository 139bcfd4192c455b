/// 활성 경매 목록 조회 (현재 최고가 포함)
pub const GET_ACTIVE_LISTINGS: &str = r#"
    SELECT l.id, l.seller_id, l.title, l.description, l.start_time, l.end_time,
           l.start_price, l.image_url, l.category, l.created_at,
           b.amount AS current_price
    FROM listings l
    LEFT JOIN bids b ON b.auction_id = l.id
    WHERE l.end_time > $1
    ORDER BY l.id DESC
"#;

/// 종료된 경매 목록 조회 (낙찰가 포함)
pub const GET_PAST_LISTINGS: &str = r#"
    SELECT l.id, l.seller_id, l.title, l.description, l.start_time, l.end_time,
           l.start_price, l.image_url, l.category, l.created_at,
           b.amount AS current_price
    FROM listings l
    LEFT JOIN bids b ON b.auction_id = l.id
    WHERE l.end_time <= $1
    ORDER BY l.id DESC
"#;

/// 상품 조회
pub const GET_LISTING: &str = "SELECT id, seller_id, title, description, start_time, end_time, start_price, image_url, category, created_at FROM listings WHERE id = $1";

/// 모든 상품 조회 (카테고리 인덱스 계산용)
pub const GET_ALL_LISTINGS: &str = "SELECT id, seller_id, title, description, start_time, end_time, start_price, image_url, category, created_at FROM listings ORDER BY id DESC";

/// 최고 입찰 조회 (상품당 원장 한 행)
pub const GET_HIGHEST_BID: &str =
    "SELECT id, auction_id, buyer_id, amount, placed_at FROM bids WHERE auction_id = $1";

/// 댓글 조회 (등록 순서)
pub const GET_COMMENTS: &str = r#"
    SELECT id, user_id, listing_id, content, created_at
    FROM comments
    WHERE listing_id = $1
    ORDER BY created_at ASC, id ASC
"#;

/// 위시리스트 항목 조회
pub const GET_WISHLIST_ENTRY: &str =
    "SELECT id, user_id, item_id FROM wishlists WHERE user_id = $1 AND item_id = $2";

/// 위시리스트 상품 목록 조회 (현재 최고가 포함)
pub const GET_WISHLIST_LISTINGS: &str = r#"
    SELECT l.id, l.seller_id, l.title, l.description, l.start_time, l.end_time,
           l.start_price, l.image_url, l.category, l.created_at,
           b.amount AS current_price
    FROM wishlists w
    JOIN listings l ON l.id = w.item_id
    LEFT JOIN bids b ON b.auction_id = l.id
    WHERE w.user_id = $1
    ORDER BY w.id DESC
"#;

/// 카테고리별 상품 조회 (현재 최고가 포함)
pub const GET_LISTINGS_BY_CATEGORY: &str = r#"
    SELECT l.id, l.seller_id, l.title, l.description, l.start_time, l.end_time,
           l.start_price, l.image_url, l.category, l.created_at,
           b.amount AS current_price
    FROM listings l
    LEFT JOIN bids b ON b.auction_id = l.id
    WHERE l.category = $1
    ORDER BY l.id DESC
"#;

/// 사용자 조회 (로그인용)
pub const GET_USER_BY_USERNAME: &str =
    "SELECT id, username, email, password_hash, created_at FROM users WHERE username = $1";
