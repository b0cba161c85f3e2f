//! Form-level input checks for sign-up, checkout delivery details and listings.

use crate::errors::{MarketError, Result};
use crate::model::{Condition, DeliveryAddress, ListingDraft};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_LISTING_IMAGES: usize = 5;

fn min_len(field: &str, value: &str, min: usize) -> Result<()> {
    if value.trim().chars().count() < min {
        return Err(MarketError::Invalid(format!(
            "{} must be at least {} characters",
            field, min
        )));
    }
    Ok(())
}

/// `local@domain.tld` with no whitespace.
pub fn is_email(s: &str) -> bool {
    let s = s.trim();
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .map(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
                    .unwrap_or(false)
        }
        None => false,
    }
}

pub fn sign_up(email: &str, password: &str, full_name: &str) -> Result<()> {
    if !is_email(email) {
        return Err(MarketError::Invalid("invalid email address".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(MarketError::Invalid(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    min_len("name", full_name, 2)
}

pub fn delivery(addr: &DeliveryAddress) -> Result<()> {
    min_len("name", &addr.name, 2)?;
    if !is_email(&addr.email) {
        return Err(MarketError::Invalid("invalid email address".into()));
    }
    min_len("address", &addr.address, 5)?;
    min_len("city", &addr.city, 2)?;
    min_len("state", &addr.state, 2)?;
    min_len("zip code", &addr.zip_code, 5)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidListing {
    pub condition: Condition,
    pub price: f64,
}

pub fn listing(draft: &ListingDraft) -> Result<ValidListing> {
    if draft.images.is_empty() {
        return Err(MarketError::Invalid(
            "at least one image of the book is required".into(),
        ));
    }
    if draft.images.len() > MAX_LISTING_IMAGES {
        return Err(MarketError::Invalid(format!(
            "a listing can have at most {} images",
            MAX_LISTING_IMAGES
        )));
    }
    min_len("title", &draft.title, 2)?;
    min_len("author", &draft.author, 2)?;
    min_len("description", &draft.description, 10)?;
    if draft.category.trim().is_empty() {
        return Err(MarketError::Invalid("please select a category".into()));
    }
    let condition = draft.condition.trim().parse::<Condition>()?;
    let price = draft
        .price
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p > 0.0)
        .ok_or_else(|| MarketError::Invalid("price must be a positive number".into()))?;
    Ok(ValidListing { condition, price })
}
