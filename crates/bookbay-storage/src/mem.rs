use crate::traits::{CartEdit, Storage, StoreStats};
use crate::wal::Record;
use bookbay_core::{Cart, MarketError, Message, Order, Result, Session, SessionId, User, UserId};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, User>,
    // lowercased email -> user id
    email_index: HashMap<String, UserId>,
    sessions: HashMap<SessionId, Session>,
    carts: HashMap<UserId, Cart>,
    // per-user lists in insertion order
    orders: HashMap<UserId, Vec<Order>>,
    inboxes: HashMap<UserId, Vec<Message>>,
}

impl Inner {
    fn apply(&mut self, rec: Record) {
        match rec {
            Record::UserPut { user } => {
                self.email_index
                    .insert(user.email.to_lowercase(), user.id.clone());
                self.users.insert(user.id.clone(), user);
            }
            Record::SessionPut { session } => {
                self.sessions.insert(session.id.clone(), session);
            }
            Record::SessionDelete { id } => {
                self.sessions.remove(&id);
            }
            Record::CartPut { user_id, cart } => {
                self.carts.insert(user_id, cart);
            }
            Record::OrderPut { order } => {
                self.orders
                    .entry(order.user_id.clone())
                    .or_default()
                    .push(order);
            }
            Record::MessagePut { recipient, message } => {
                self.inboxes.entry(recipient).or_default().push(message);
            }
            Record::MessageRead { user_id, id } => {
                if let Some(m) = self
                    .inboxes
                    .get_mut(&user_id)
                    .and_then(|inbox| inbox.iter_mut().find(|m| m.id == id))
                {
                    m.unread = false;
                }
            }
            Record::MessageDelete { user_id, id } => {
                if let Some(inbox) = self.inboxes.get_mut(&user_id) {
                    inbox.retain(|m| m.id != id);
                }
            }
        }
    }

    fn check_new_user(&self, user: &User) -> Result<()> {
        if self.email_index.contains_key(&user.email.to_lowercase()) {
            return Err(MarketError::Conflict("email already registered".into()));
        }
        if self.users.contains_key(&user.id) {
            return Err(MarketError::Conflict("user id taken".into()));
        }
        Ok(())
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a logged mutation without validation. Used for replay.
    pub fn apply(&self, rec: Record) {
        self.inner.write().apply(rec);
    }

    /// The whole state as records that rebuild it when applied in order.
    pub fn records(&self) -> Vec<Record> {
        let inner = self.inner.read();
        let mut users: Vec<&User> = inner.users.values().collect();
        users.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        let mut out: Vec<Record> = users
            .into_iter()
            .map(|u| Record::UserPut { user: u.clone() })
            .collect();
        out.extend(inner.sessions.values().map(|s| Record::SessionPut {
            session: s.clone(),
        }));
        out.extend(inner.carts.iter().map(|(user_id, cart)| Record::CartPut {
            user_id: user_id.clone(),
            cart: cart.clone(),
        }));
        for orders in inner.orders.values() {
            out.extend(orders.iter().map(|o| Record::OrderPut { order: o.clone() }));
        }
        for (recipient, inbox) in inner.inboxes.iter() {
            out.extend(inbox.iter().map(|m| Record::MessagePut {
                recipient: recipient.clone(),
                message: m.clone(),
            }));
        }
        out
    }

    /// Rejects a user whose email or id is already registered.
    pub fn check_new_user(&self, user: &User) -> Result<()> {
        self.inner.read().check_new_user(user)
    }

    pub fn insert_user(&self, user: User) -> Result<User> {
        let mut inner = self.inner.write();
        inner.check_new_user(&user)?;
        inner.apply(Record::UserPut { user: user.clone() });
        Ok(user)
    }

    pub fn user(&self, id: &str) -> Result<User> {
        self.inner
            .read()
            .users
            .get(id)
            .cloned()
            .ok_or(MarketError::NotFound)
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        let inner = self.inner.read();
        inner
            .email_index
            .get(&email.trim().to_lowercase())
            .and_then(|id| inner.users.get(id))
            .cloned()
    }

    pub fn users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.inner.read().users.values().cloned().collect();
        users.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        users
    }

    pub fn insert_session(&self, session: Session) {
        self.inner.write().apply(Record::SessionPut { session });
    }

    pub fn session(&self, id: &str) -> Result<Session> {
        self.inner
            .read()
            .sessions
            .get(id)
            .cloned()
            .ok_or(MarketError::NotFound)
    }

    pub fn remove_session(&self, id: &str) -> Result<()> {
        self.inner
            .write()
            .sessions
            .remove(id)
            .map(|_| ())
            .ok_or(MarketError::NotFound)
    }

    pub fn expired_sessions(&self, now: DateTime<Utc>) -> Vec<SessionId> {
        self.inner
            .read()
            .sessions
            .values()
            .filter(|s| s.is_expired(now))
            .map(|s| s.id.clone())
            .collect()
    }

    /// Drops sessions expired at `now`; returns their ids.
    pub fn remove_expired_sessions(&self, now: DateTime<Utc>) -> Vec<SessionId> {
        let mut inner = self.inner.write();
        let dead: Vec<SessionId> = inner
            .sessions
            .values()
            .filter(|s| s.is_expired(now))
            .map(|s| s.id.clone())
            .collect();
        for id in &dead {
            inner.sessions.remove(id);
        }
        dead
    }

    pub fn cart(&self, user_id: &str) -> Cart {
        self.inner
            .read()
            .carts
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_cart(&self, user_id: &str, cart: Cart) {
        self.inner.write().apply(Record::CartPut {
            user_id: user_id.to_string(),
            cart,
        });
    }

    /// Runs `edit` on the user's cart under the write lock. An error leaves the cart as it was.
    pub fn edit_cart(&self, user_id: &str, edit: CartEdit) -> Result<Cart> {
        let mut inner = self.inner.write();
        let mut cart = inner.carts.get(user_id).cloned().unwrap_or_default();
        edit(&mut cart)?;
        inner.carts.insert(user_id.to_string(), cart.clone());
        Ok(cart)
    }

    pub fn insert_order(&self, order: Order) -> Order {
        self.inner.write().apply(Record::OrderPut {
            order: order.clone(),
        });
        order
    }

    pub fn orders(&self, user_id: &str) -> Vec<Order> {
        self.inner
            .read()
            .orders
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn check_recipient(&self, recipient: &str) -> Result<()> {
        if !self.inner.read().users.contains_key(recipient) {
            return Err(MarketError::NotFound);
        }
        Ok(())
    }

    pub fn insert_message(&self, recipient: &str, message: Message) -> Result<Message> {
        let mut inner = self.inner.write();
        if !inner.users.contains_key(recipient) {
            return Err(MarketError::NotFound);
        }
        inner.apply(Record::MessagePut {
            recipient: recipient.to_string(),
            message: message.clone(),
        });
        Ok(message)
    }

    pub fn messages(&self, user_id: &str) -> Vec<Message> {
        self.inner
            .read()
            .inboxes
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn message(&self, user_id: &str, id: &str) -> Result<Message> {
        self.inner
            .read()
            .inboxes
            .get(user_id)
            .and_then(|inbox| inbox.iter().find(|m| m.id == id))
            .cloned()
            .ok_or(MarketError::NotFound)
    }

    pub fn set_message_read(&self, user_id: &str, id: &str) -> Result<Message> {
        let mut inner = self.inner.write();
        let msg = inner
            .inboxes
            .get_mut(user_id)
            .and_then(|inbox| inbox.iter_mut().find(|m| m.id == id))
            .ok_or(MarketError::NotFound)?;
        msg.unread = false;
        Ok(msg.clone())
    }

    pub fn remove_message(&self, user_id: &str, id: &str) -> Result<()> {
        let mut inner = self.inner.write();
        let inbox = inner.inboxes.get_mut(user_id).ok_or(MarketError::NotFound)?;
        let before = inbox.len();
        inbox.retain(|m| m.id != id);
        if inbox.len() == before {
            return Err(MarketError::NotFound);
        }
        Ok(())
    }

    pub fn snapshot_stats(&self) -> StoreStats {
        let inner = self.inner.read();
        StoreStats {
            users: inner.users.len(),
            sessions: inner.sessions.len(),
            carts: inner.carts.len(),
            orders: inner.orders.values().map(Vec::len).sum(),
            messages: inner.inboxes.values().map(Vec::len).sum(),
        }
    }
}

#[async_trait::async_trait]
impl Storage for InMemoryStore {
    async fn create_user(&self, user: User) -> Result<User> {
        self.insert_user(user)
    }

    async fn get_user(&self, id: &str) -> Result<User> {
        self.user(id)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.user_by_email(email))
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.users())
    }

    async fn put_session(&self, session: Session) -> Result<()> {
        self.insert_session(session);
        Ok(())
    }

    async fn get_session(&self, id: &str) -> Result<Session> {
        self.session(id)
    }

    async fn delete_session(&self, id: &str) -> Result<()> {
        self.remove_session(id)
    }

    async fn sweep_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        Ok(self.remove_expired_sessions(now).len() as u64)
    }

    async fn get_cart(&self, user_id: &str) -> Result<Cart> {
        Ok(self.cart(user_id))
    }

    async fn put_cart(&self, user_id: &str, cart: Cart) -> Result<()> {
        self.set_cart(user_id, cart);
        Ok(())
    }

    async fn update_cart(&self, user_id: &str, edit: CartEdit) -> Result<Cart> {
        self.edit_cart(user_id, edit)
    }

    async fn append_order(&self, order: Order) -> Result<Order> {
        Ok(self.insert_order(order))
    }

    async fn list_orders(&self, user_id: &str) -> Result<Vec<Order>> {
        Ok(self.orders(user_id))
    }

    async fn push_message(&self, recipient: &str, message: Message) -> Result<Message> {
        self.insert_message(recipient, message)
    }

    async fn list_messages(&self, user_id: &str) -> Result<Vec<Message>> {
        Ok(self.messages(user_id))
    }

    async fn mark_message_read(&self, user_id: &str, id: &str) -> Result<Message> {
        self.set_message_read(user_id, id)
    }

    async fn delete_message(&self, user_id: &str, id: &str) -> Result<()> {
        self.remove_message(user_id, id)
    }

    async fn admin_snapshot(&self) -> Result<String> {
        Err(MarketError::Invalid("not persistent".into()))
    }

    async fn admin_manifest(&self) -> Result<serde_json::Value> {
        Ok(serde_json::json!({"mode": "memory", "stats": self.snapshot_stats()}))
    }

    fn stats(&self) -> StoreStats {
        self.snapshot_stats()
    }
}
