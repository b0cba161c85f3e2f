use crate::errors::{MarketError, Result};
use crate::model::{Book, BookId, OrderLine};
use crate::util::round_cents;
use serde::{Deserialize, Serialize};

pub const SHIPPING: f64 = 4.99;
pub const COUPON_CODE: &str = "BOOKBAY10";
pub const COUPON_PERCENT: f64 = 10.0;
/// Upper bound for the copies of one book in a cart.
pub const MAX_QUANTITY: u32 = 99;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub book_id: BookId,
    pub quantity: u32,
}

/// Book id to quantity, kept in insertion order. Quantities are always at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub coupon: Option<String>,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn quantity_of(&self, book_id: &str) -> Option<u32> {
        self.items
            .iter()
            .find(|i| i.book_id == book_id)
            .map(|i| i.quantity)
    }

    /// Adds `quantity` copies, incrementing an existing entry. Zero is treated as one.
    /// The cart is left unchanged when the line would exceed `MAX_QUANTITY`.
    pub fn add(&mut self, book_id: &str, quantity: u32) -> Result<()> {
        let quantity = quantity.max(1);
        let current = self.quantity_of(book_id).unwrap_or(0);
        let wanted = current.saturating_add(quantity);
        check_quantity(wanted)?;
        match self.items.iter_mut().find(|i| i.book_id == book_id) {
            Some(item) => item.quantity = wanted,
            None => self.items.push(CartItem {
                book_id: book_id.to_string(),
                quantity,
            }),
        }
        Ok(())
    }

    /// Returns false when nothing changed: unknown book or a quantity below 1.
    pub fn set_quantity(&mut self, book_id: &str, quantity: u32) -> Result<bool> {
        if quantity < 1 {
            return Ok(false);
        }
        check_quantity(quantity)?;
        match self.items.iter_mut().find(|i| i.book_id == book_id) {
            Some(item) => {
                item.quantity = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn decrement(&mut self, book_id: &str) -> bool {
        match self.items.iter_mut().find(|i| i.book_id == book_id) {
            Some(item) if item.quantity > 1 => {
                item.quantity -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, book_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.book_id != book_id);
        self.items.len() != before
    }

    pub fn apply_coupon(&mut self, code: &str) -> Result<()> {
        if !coupon_matches(code) {
            return Err(MarketError::Invalid(format!("unknown coupon '{}'", code.trim())));
        }
        self.coupon = Some(COUPON_CODE.to_string());
        Ok(())
    }

    pub fn clear_coupon(&mut self) {
        self.coupon = None;
    }

    /// Takes the copies in `ordered` out of the cart. Lines added or raised after
    /// the order was priced keep the difference. An order that used the coupon
    /// consumes it.
    pub fn settle(&mut self, ordered: &[OrderLine], coupon_used: bool) {
        for line in ordered {
            if let Some(item) = self.items.iter_mut().find(|i| i.book_id == line.book_id) {
                item.quantity = item.quantity.saturating_sub(line.quantity);
            }
        }
        self.items.retain(|i| i.quantity > 0);
        if coupon_used {
            self.coupon = None;
        }
    }

    /// Prices the cart against `catalog`. Entries whose book is gone are skipped.
    pub fn summarize(&self, catalog: &[Book]) -> CartSummary {
        let lines: Vec<CartLine> = self
            .items
            .iter()
            .filter_map(|item| {
                let book = catalog.iter().find(|b| b.id == item.book_id)?;
                Some(CartLine {
                    line_total: round_cents(book.price * item.quantity as f64),
                    book: book.clone(),
                    quantity: item.quantity,
                })
            })
            .collect();
        let subtotal = round_cents(lines.iter().map(|l| l.book.price * l.quantity as f64).sum());
        let discount = match &self.coupon {
            Some(code) if coupon_matches(code) => round_cents(subtotal * COUPON_PERCENT / 100.0),
            _ => 0.0,
        };
        let item_count = lines
            .iter()
            .fold(0u32, |acc, l| acc.saturating_add(l.quantity));
        CartSummary {
            total: round_cents(subtotal + SHIPPING - discount),
            lines,
            subtotal,
            shipping: SHIPPING,
            discount,
            coupon: self.coupon.clone(),
            item_count,
        }
    }
}

fn check_quantity(quantity: u32) -> Result<()> {
    if quantity > MAX_QUANTITY {
        return Err(MarketError::Invalid(format!(
            "at most {} copies of a book per order",
            MAX_QUANTITY
        )));
    }
    Ok(())
}

pub fn coupon_matches(code: &str) -> bool {
    code.trim().eq_ignore_ascii_case(COUPON_CODE)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub book: Book,
    pub quantity: u32,
    pub line_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    pub subtotal: f64,
    pub shipping: f64,
    pub discount: f64,
    pub total: f64,
    pub coupon: Option<String>,
    pub item_count: u32,
}

impl CartSummary {
    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.lines
            .iter()
            .map(|l| OrderLine {
                book_id: l.book.id.clone(),
                title: l.book.title.clone(),
                author: l.book.author.clone(),
                unit_price: l.book.price,
                quantity: l.quantity,
            })
            .collect()
    }
}
