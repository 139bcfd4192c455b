/// 세션 및 비밀번호 처리
/// 규칙 엔진은 여기서 해석된 사용자 id만 전달받는다
// region:    --- Imports
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::http::{header, HeaderMap};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;
// endregion: --- Imports

// region:    --- Passwords

/// 비밀번호 해시 (argon2id, 랜덤 솔트)
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// 저장된 해시에 대한 비밀번호 검증
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

// endregion: --- Passwords

// region:    --- Session Manager

/// 로그인 세션 관리자 (토큰 -> 사용자 id)
pub struct SessionManager {
    tokens: RwLock<HashMap<String, i64>>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        SessionManager {
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// 세션 생성 후 토큰 반환
    pub fn open_session(&self, user_id: i64) -> String {
        let token = Uuid::new_v4().to_string();
        self.tokens.write().insert(token.clone(), user_id);
        info!("{:<12} --> 세션 생성: user={}", "Session", user_id);
        token
    }

    /// 세션 종료
    pub fn close_session(&self, token: &str) -> bool {
        let removed = self.tokens.write().remove(token).is_some();
        if removed {
            info!("{:<12} --> 세션 종료", "Session");
        }
        removed
    }

    /// Authorization 헤더의 Bearer 토큰으로 현재 사용자 확인
    pub fn authenticate(&self, headers: &HeaderMap) -> Option<i64> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        let token = value.strip_prefix("Bearer ")?;
        self.tokens.read().get(token).copied()
    }
}

// endregion: --- Session Manager

// region:    --- Tests


// endregion: --- Tests
