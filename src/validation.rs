//! Ordered validation rules for inbound bookmarks.
//!
//! Each rule inspects the raw payload and either passes or names the field
//! and reason it rejected. [`validate`] stops at the first failure, which is
//! what the HTTP surface reports; [`validate_all`] collects every failure.

use serde_json::Value as JsonValue;
use url::Url;

use crate::error::ValidationError;
use crate::model::{CreateBookmark, NewBookmark};

pub const MIN_RATING: i64 = 0;
pub const MAX_RATING: i64 = 5;

pub struct Rule {
    pub name: &'static str,
    check: fn(&CreateBookmark) -> Result<(), ValidationError>,
}

impl Rule {
    pub fn check(&self, input: &CreateBookmark) -> Result<(), ValidationError> {
        (self.check)(input)
    }
}

pub const RULES: &[Rule] = &[
    Rule {
        name: "title_required",
        check: title_required,
    },
    Rule {
        name: "url_required",
        check: url_required,
    },
    Rule {
        name: "rating_required",
        check: rating_required,
    },
    Rule {
        name: "rating_in_range",
        check: rating_in_range,
    },
    Rule {
        name: "url_is_web_uri",
        check: url_is_web_uri,
    },
];

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

fn title_required(input: &CreateBookmark) -> Result<(), ValidationError> {
    if is_blank(&input.title) {
        return Err(ValidationError {
            field: "title",
            message: "Title is required.",
        });
    }
    Ok(())
}

fn url_required(input: &CreateBookmark) -> Result<(), ValidationError> {
    if is_blank(&input.url) {
        return Err(ValidationError {
            field: "url",
            message: "URL is required.",
        });
    }
    Ok(())
}

fn rating_required(input: &CreateBookmark) -> Result<(), ValidationError> {
    match input.rating {
        None | Some(JsonValue::Null) => Err(ValidationError {
            field: "rating",
            message: "Rating is required.",
        }),
        Some(_) => Ok(()),
    }
}

fn rating_in_range(input: &CreateBookmark) -> Result<(), ValidationError> {
    checked_rating(input).map(|_| ())
}

fn checked_rating(input: &CreateBookmark) -> Result<i64, ValidationError> {
    input.rating.as_ref().and_then(parse_rating).ok_or(ValidationError {
        field: "rating",
        message: "Rating must be an integer between 0 and 5.",
    })
}

fn url_is_web_uri(input: &CreateBookmark) -> Result<(), ValidationError> {
    if input.url.as_deref().is_some_and(is_web_uri) {
        return Ok(());
    }
    Err(ValidationError {
        field: "url",
        message: "URL must be valid.",
    })
}

/// Integral JSON numbers in range, including `4.0`. Strings never count.
pub fn parse_rating(value: &JsonValue) -> Option<i64> {
    let n = value.as_number()?;
    let rating = match n.as_i64() {
        Some(i) => i,
        None => {
            let f = n.as_f64()?;
            if f.fract() != 0.0 {
                return None;
            }
            f as i64
        }
    };
    (MIN_RATING..=MAX_RATING).contains(&rating).then_some(rating)
}

/// Absolute http(s) URI with a non-empty host.
pub fn is_web_uri(raw: &str) -> bool {
    if raw.trim() != raw {
        return false;
    }
    match Url::parse(raw) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

pub fn validate(input: CreateBookmark) -> Result<NewBookmark, ValidationError> {
    for rule in RULES {
        if let Err(e) = rule.check(&input) {
            tracing::error!(rule = rule.name, field = e.field, "{}", e.message);
            return Err(e);
        }
    }

    let rating = checked_rating(&input)?;

    Ok(NewBookmark {
        title: input.title.unwrap_or_default(),
        url: input.url.unwrap_or_default(),
        description: input.description,
        rating,
    })
}

pub fn validate_all(input: &CreateBookmark) -> Vec<ValidationError> {
    RULES.iter().filter_map(|rule| rule.check(input).err()).collect()
}
