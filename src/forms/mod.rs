/// 입력 폼 검증 계층
/// 필드 단위 검증만 담당하고, 경매 규칙 판정은 rules 모듈에 맡긴다
// region:    --- Imports
use crate::auction::model::ListingDraft;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};
// endregion: --- Imports

// region:    --- Helpers

/// 필드 오류 생성
fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// 금액을 소수점 2자리로 맞춘다
fn rescaled(mut amount: Decimal) -> Decimal {
    amount.rescale(2);
    amount
}

/// 시작가 검증: £0.99 ~ £999999.99, 소수점 2자리까지
fn check_start_price(value: Decimal, errors: &mut ValidationErrors) {
    if value < Decimal::new(99, 2) {
        errors.add(
            "start_price",
            field_error("min_value", "Starting price must be at least £0.99."),
        );
    } else if value > Decimal::new(99_999_999, 2) {
        errors.add(
            "start_price",
            field_error("max_value", "Starting price can NOT be larger than £999999.99."),
        );
    } else if value.normalize().scale() > 2 {
        errors.add(
            "start_price",
            field_error("decimal_places", "Starting price can have at most 2 decimal places."),
        );
    }
}

/// 입찰 금액 검증: 0 이상, £999999.99 이하, 소수점 2자리까지
fn check_bid_amount(value: Decimal, errors: &mut ValidationErrors) {
    if value.is_sign_negative() {
        errors.add("bid", field_error("min_value", "Your bid can NOT be negative."));
    } else if value > Decimal::new(99_999_999, 2) {
        errors.add(
            "bid",
            field_error("max_value", "Your bid can NOT be larger than £999999.99."),
        );
    } else if value.normalize().scale() > 2 {
        errors.add(
            "bid",
            field_error("decimal_places", "Your bid can have at most 2 decimal places."),
        );
    }
}

// endregion: --- Helpers

// region:    --- Forms

/// 상품 등록 폼
#[derive(Debug, Deserialize, Validate)]
pub struct CreateListingForm {
    #[validate(length(
        min = 3,
        max = 96,
        message = "Title must be between 3 and 96 characters long."
    ))]
    pub title: String,
    #[validate(length(max = 1024, message = "Description can NOT be longer than 1024 characters."))]
    #[serde(default)]
    pub description: String,
    /// 생략하면 제출 시각이 시작 시각이 된다
    pub start: Option<DateTime<Utc>>,
    pub end: DateTime<Utc>,
    pub start_price: Decimal,
    #[validate(
        url(message = "Image must be a valid URL."),
        length(max = 1024, message = "This URL is too long. Max valid length is 1024 characters.")
    )]
    pub image: Option<String>,
    #[validate(length(
        min = 3,
        max = 96,
        message = "Category must be between 3 and 96 characters long."
    ))]
    pub category: String,
}

impl CreateListingForm {
    /// 검증 후 등록 초안으로 변환
    /// 카테고리는 소문자로 정규화하고, 시작가는 소수점 2자리로 맞춘다
    pub fn cleaned(self, now: DateTime<Utc>) -> Result<ListingDraft, ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);

        check_start_price(self.start_price, &mut errors);

        let start = self.start.unwrap_or(now);
        if start < now {
            errors.add(
                "start",
                field_error("start_in_past", "Listing's START Date can NOT be in the past."),
            );
        }
        if self.end <= now {
            errors.add(
                "end",
                field_error("end_not_future", "Listing's END Date must be in the future."),
            );
        }

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        Ok(ListingDraft {
            title: self.title,
            description: self.description,
            start_time: start,
            end_time: self.end,
            start_price: rescaled(self.start_price),
            image_url: self.image.unwrap_or_default(),
            category: self.category.to_lowercase(),
        })
    }
}

/// 입찰 폼
#[derive(Debug, Deserialize)]
pub struct BidForm {
    pub bid: Decimal,
}

impl BidForm {
    /// 검증 후 소수점 2자리로 맞춘 금액을 돌려준다
    pub fn cleaned(&self) -> Result<Decimal, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_bid_amount(self.bid, &mut errors);
        if !errors.errors().is_empty() {
            return Err(errors);
        }
        Ok(rescaled(self.bid))
    }
}

/// 댓글 폼
#[derive(Debug, Deserialize, Validate)]
pub struct CommentForm {
    #[validate(length(
        min = 1,
        max = 1024,
        message = "Comment must be between 1 and 1024 characters long."
    ))]
    pub comment: String,
}

/// 회원 가입 폼
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 1, max = 150, message = "Please enter a username."))]
    pub username: String,
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "Please enter a password."))]
    pub password: String,
    #[serde(default)]
    pub confirmation: String,
}

impl RegisterForm {
    /// 필드 검증과 비밀번호 확인 일치 여부까지 확인한다
    pub fn validated(&self) -> Result<(), ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);

        if self.password != self.confirmation {
            errors.add(
                "confirmation",
                field_error("password_mismatch", "Passwords must match."),
            );
        }

        if !errors.errors().is_empty() {
            return Err(errors);
        }
        Ok(())
    }
}

/// 로그인 폼
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// endregion: --- Forms

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    /// 유효한 등록 폼 생성
    fn valid_form(now: DateTime<Utc>) -> CreateListingForm {
        CreateListingForm {
            title: "Walnut chess set".to_string(),
            description: "Hand carved, 1960s.".to_string(),
            start: None,
            end: now + Duration::days(7),
            start_price: dec!(25.00),
            image: None,
            category: "Games".to_string(),
        }
    }

    #[test]
    fn cleaned_normalizes_category_and_price() {
        let now = Utc::now();
        let mut form = valid_form(now);
        form.start_price = dec!(25);

        let draft = form.cleaned(now).unwrap();
        assert_eq!(draft.category, "games");
        assert_eq!(draft.start_price.to_string(), "25.00");
        assert_eq!(draft.start_time, now);
    }

    #[test]
    fn short_title_is_rejected() {
        let now = Utc::now();
        let mut form = valid_form(now);
        form.title = "ab".to_string();

        let errors = form.cleaned(now).unwrap_err();
        assert!(errors.errors().contains_key("title"));
    }

    #[test]
    fn start_price_below_minimum_is_rejected() {
        let now = Utc::now();
        let mut form = valid_form(now);
        form.start_price = dec!(0.98);

        let errors = form.cleaned(now).unwrap_err();
        assert!(errors.errors().contains_key("start_price"));
    }

    #[test]
    fn start_price_with_three_decimals_is_rejected() {
        let now = Utc::now();
        let mut form = valid_form(now);
        form.start_price = dec!(10.001);

        let errors = form.cleaned(now).unwrap_err();
        assert!(errors.errors().contains_key("start_price"));
    }

    #[test]
    fn end_in_the_past_is_rejected() {
        let now = Utc::now();
        let mut form = valid_form(now);
        form.end = now - Duration::hours(1);

        let errors = form.cleaned(now).unwrap_err();
        assert!(errors.errors().contains_key("end"));
    }

    #[test]
    fn start_in_the_past_is_rejected() {
        let now = Utc::now();
        let mut form = valid_form(now);
        form.start = Some(now - Duration::hours(1));

        let errors = form.cleaned(now).unwrap_err();
        assert!(errors.errors().contains_key("start"));
    }

    #[test]
    fn invalid_image_url_is_rejected() {
        let now = Utc::now();
        let mut form = valid_form(now);
        form.image = Some("not a url".to_string());

        let errors = form.cleaned(now).unwrap_err();
        assert!(errors.errors().contains_key("image"));
    }

    #[test]
    fn bid_form_rejects_three_decimal_places() {
        let form = BidForm { bid: dec!(10.015) };
        assert!(form.cleaned().is_err());
    }

    #[test]
    fn bid_form_rejects_negative_amounts() {
        let form = BidForm { bid: dec!(-1.00) };
        assert!(form.cleaned().is_err());
    }

    #[test]
    fn bid_form_rescales_to_two_decimal_places() {
        let form = BidForm { bid: dec!(10) };
        assert_eq!(form.cleaned().unwrap().to_string(), "10.00");
    }

    #[test]
    fn register_form_requires_matching_passwords() {
        let form = RegisterForm {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "secret".to_string(),
            confirmation: "different".to_string(),
        };

        let errors = form.validated().unwrap_err();
        assert!(errors.errors().contains_key("confirmation"));
    }

    #[test]
    fn comment_form_rejects_empty_content() {
        let form = CommentForm {
            comment: String::new(),
        };
        assert!(form.validate().is_err());
    }
}

// endregion: --- Tests
