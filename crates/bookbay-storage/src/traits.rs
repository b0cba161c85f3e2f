use bookbay_core::{Book, Cart, Category, MarketError, Message, Order, Result, Session, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// In-place change to one cart. Returning an error discards the change.
pub type CartEdit = Box<dyn FnOnce(&mut Cart) -> Result<()> + Send>;

#[async_trait::async_trait]
pub trait Storage: Send + Sync + 'static {
    // Accounts
    async fn create_user(&self, user: User) -> Result<User>;
    async fn get_user(&self, id: &str) -> Result<User>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn list_users(&self) -> Result<Vec<User>>;

    // Sessions
    async fn put_session(&self, session: Session) -> Result<()>;
    async fn get_session(&self, id: &str) -> Result<Session>;
    async fn delete_session(&self, id: &str) -> Result<()>;
    async fn sweep_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64>; // returns removed count

    // Carts; a user without a stored cart has an empty one
    async fn get_cart(&self, user_id: &str) -> Result<Cart>;
    async fn put_cart(&self, user_id: &str, cart: Cart) -> Result<()>;
    /// Read-modify-write of one cart, atomic with respect to other writes.
    async fn update_cart(&self, user_id: &str, edit: CartEdit) -> Result<Cart>;

    // Orders
    async fn append_order(&self, order: Order) -> Result<Order>;
    async fn list_orders(&self, user_id: &str) -> Result<Vec<Order>>;

    // Inboxes
    async fn push_message(&self, recipient: &str, message: Message) -> Result<Message>;
    async fn list_messages(&self, user_id: &str) -> Result<Vec<Message>>;
    async fn mark_message_read(&self, user_id: &str, id: &str) -> Result<Message>;
    async fn delete_message(&self, user_id: &str, id: &str) -> Result<()>;

    // Admin
    async fn admin_snapshot(&self) -> Result<String>;
    async fn admin_manifest(&self) -> Result<serde_json::Value>;

    fn stats(&self) -> StoreStats {
        StoreStats::default()
    }
}

/// Read-only access to the listings that can be searched and bought.
pub trait CatalogStore: Send + Sync + 'static {
    fn books(&self) -> &[Book];
    fn categories(&self) -> &[Category];

    fn book(&self, id: &str) -> Result<&Book> {
        self.books()
            .iter()
            .find(|b| b.id == id)
            .ok_or(MarketError::NotFound)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StoreStats {
    pub users: usize,
    pub sessions: usize,
    pub carts: usize,
    pub orders: usize,
    pub messages: usize,
}
