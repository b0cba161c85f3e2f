use crate::snapshot::{read_snapshot, write_snapshot};
use crate::traits::{CartEdit, Storage, StoreStats};
use crate::wal::{self, Record, Wal};
use crate::InMemoryStore;
use bookbay_core::{Cart, MarketError, Message, Order, Result, Session, User};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Manifest {
    pub version: u32,
    pub current_snapshot: Option<String>,
    pub last_snapshot_at: Option<DateTime<Utc>>,
    // live WAL segments, oldest first; the last one takes appends
    pub segments: Vec<String>,
}

impl Manifest {
    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join("manifest.json")
    }

    /// A missing or unreadable manifest falls back to every segment found on disk.
    pub fn load(data_dir: &Path) -> Self {
        let raw = match std::fs::read(Self::path(data_dir)) {
            Ok(raw) => raw,
            Err(_) => return Self::discover(data_dir),
        };
        match serde_json::from_slice(&raw) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "manifest unreadable, rescanning wal directory");
                Self::discover(data_dir)
            }
        }
    }

    fn discover(data_dir: &Path) -> Self {
        Self {
            version: MANIFEST_VERSION,
            segments: wal::list_segments(&data_dir.join("wal")),
            ..Default::default()
        }
    }

    pub fn persist(&self, data_dir: &Path) -> std::io::Result<()> {
        let tmp = data_dir.join("manifest.json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(self)?)?;
        std::fs::rename(tmp, Self::path(data_dir))
    }
}

/// Rebuilds the store state found in `data_dir` without opening it for writes.
pub fn load_state(data_dir: &Path) -> std::io::Result<(InMemoryStore, Manifest)> {
    let manifest = Manifest::load(data_dir);
    let mem = InMemoryStore::new();
    if let Some(snap) = &manifest.current_snapshot {
        let path = data_dir.join("snapshots").join(snap);
        match read_snapshot(&path) {
            Ok(recs) => recs.into_iter().for_each(|r| mem.apply(r)),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "snapshot unreadable, replaying wal only"),
        }
    }
    let wal_dir = data_dir.join("wal");
    for seg in &manifest.segments {
        let path = wal::segment_path(&wal_dir, seg);
        if !path.exists() {
            tracing::warn!(segment = %seg, "wal segment listed in manifest is missing");
            continue;
        }
        for rec in wal::replay(&path)? {
            mem.apply(rec);
        }
    }
    Ok((mem, manifest))
}

/// In-memory state made durable by a write-ahead log and periodic snapshots.
pub struct PersistentStore {
    mem: InMemoryStore,
    wal: Mutex<Wal>,
    manifest: RwLock<Manifest>,
    data_dir: PathBuf,
}

impl PersistentStore {
    pub fn open(data_dir: PathBuf) -> std::io::Result<Self> {
        std::fs::create_dir_all(data_dir.join("wal"))?;
        std::fs::create_dir_all(data_dir.join("snapshots"))?;
        let (mem, mut manifest) = load_state(&data_dir)?;
        let wal_dir = data_dir.join("wal");
        let wal = match manifest.segments.last() {
            Some(seg) => Wal::open(&wal_dir, seg.clone())?,
            None => {
                let w = Wal::create(&wal_dir)?;
                manifest.segments.push(w.segment().to_string());
                w
            }
        };
        manifest.version = MANIFEST_VERSION;
        manifest.persist(&data_dir)?;
        tracing::info!(
            dir = %data_dir.display(),
            segments = manifest.segments.len(),
            stats = ?mem.snapshot_stats(),
            "persistent store opened"
        );
        Ok(Self {
            mem,
            wal: Mutex::new(wal),
            manifest: RwLock::new(manifest),
            data_dir,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Writes the full state to a new snapshot, rotates to a fresh WAL segment and
    /// drops the segments and snapshot the new one supersedes.
    pub fn snapshot(&self) -> std::io::Result<String> {
        // holding the wal lock keeps writers out until rotation is done
        let mut wal = self.wal.lock();
        wal.sync()?;
        let name = format!("snap-{}.zst", ulid::Ulid::new());
        let snap_dir = self.data_dir.join("snapshots");
        write_snapshot(&snap_dir.join(&name), &self.mem.records())?;

        let wal_dir = self.data_dir.join("wal");
        *wal = Wal::create(&wal_dir)?;
        let mut m = self.manifest.write();
        let old_segments = std::mem::replace(&mut m.segments, vec![wal.segment().to_string()]);
        let old_snapshot = m.current_snapshot.replace(name.clone());
        m.last_snapshot_at = Some(Utc::now());
        m.persist(&self.data_dir)?;

        for seg in old_segments {
            let _ = std::fs::remove_file(wal_dir.join(seg));
        }
        if let Some(old) = old_snapshot {
            let _ = std::fs::remove_file(snap_dir.join(old));
        }
        Ok(name)
    }

    /// Appends `rec` and applies it only once the append succeeded, so memory
    /// never runs ahead of the log. Callers hold the wal lock across their checks.
    fn commit(&self, wal: &mut Wal, rec: Record) -> Result<()> {
        wal.append(&rec)
            .map_err(|e| MarketError::Internal(format!("wal append: {}", e)))?;
        self.mem.apply(rec);
        Ok(())
    }
}

#[async_trait::async_trait]
impl Storage for PersistentStore {
    async fn create_user(&self, user: User) -> Result<User> {
        let mut wal = self.wal.lock();
        self.mem.check_new_user(&user)?;
        self.commit(&mut wal, Record::UserPut { user: user.clone() })?;
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> Result<User> {
        self.mem.user(id)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.mem.user_by_email(email))
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.mem.users())
    }

    async fn put_session(&self, session: Session) -> Result<()> {
        let mut wal = self.wal.lock();
        self.commit(&mut wal, Record::SessionPut { session })
    }

    async fn get_session(&self, id: &str) -> Result<Session> {
        self.mem.session(id)
    }

    async fn delete_session(&self, id: &str) -> Result<()> {
        let mut wal = self.wal.lock();
        self.mem.session(id)?;
        self.commit(&mut wal, Record::SessionDelete { id: id.to_string() })
    }

    async fn sweep_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut wal = self.wal.lock();
        let mut removed = 0;
        for id in self.mem.expired_sessions(now) {
            self.commit(&mut wal, Record::SessionDelete { id })?;
            removed += 1;
        }
        Ok(removed)
    }

    async fn get_cart(&self, user_id: &str) -> Result<Cart> {
        Ok(self.mem.cart(user_id))
    }

    async fn put_cart(&self, user_id: &str, cart: Cart) -> Result<()> {
        let mut wal = self.wal.lock();
        self.commit(
            &mut wal,
            Record::CartPut {
                user_id: user_id.to_string(),
                cart,
            },
        )
    }

    async fn update_cart(&self, user_id: &str, edit: CartEdit) -> Result<Cart> {
        let mut wal = self.wal.lock();
        let mut cart = self.mem.cart(user_id);
        edit(&mut cart)?;
        self.commit(
            &mut wal,
            Record::CartPut {
                user_id: user_id.to_string(),
                cart: cart.clone(),
            },
        )?;
        Ok(cart)
    }

    async fn append_order(&self, order: Order) -> Result<Order> {
        let mut wal = self.wal.lock();
        self.commit(&mut wal, Record::OrderPut { order: order.clone() })?;
        Ok(order)
    }

    async fn list_orders(&self, user_id: &str) -> Result<Vec<Order>> {
        Ok(self.mem.orders(user_id))
    }

    async fn push_message(&self, recipient: &str, message: Message) -> Result<Message> {
        let mut wal = self.wal.lock();
        self.mem.check_recipient(recipient)?;
        self.commit(
            &mut wal,
            Record::MessagePut {
                recipient: recipient.to_string(),
                message: message.clone(),
            },
        )?;
        Ok(message)
    }

    async fn list_messages(&self, user_id: &str) -> Result<Vec<Message>> {
        Ok(self.mem.messages(user_id))
    }

    async fn mark_message_read(&self, user_id: &str, id: &str) -> Result<Message> {
        let mut wal = self.wal.lock();
        let mut msg = self.mem.message(user_id, id)?;
        self.commit(
            &mut wal,
            Record::MessageRead {
                user_id: user_id.to_string(),
                id: id.to_string(),
            },
        )?;
        msg.unread = false;
        Ok(msg)
    }

    async fn delete_message(&self, user_id: &str, id: &str) -> Result<()> {
        let mut wal = self.wal.lock();
        self.mem.message(user_id, id)?;
        self.commit(
            &mut wal,
            Record::MessageDelete {
                user_id: user_id.to_string(),
                id: id.to_string(),
            },
        )
    }

    async fn admin_snapshot(&self) -> Result<String> {
        self.snapshot()
            .map_err(|e| MarketError::Internal(e.to_string()))
    }

    async fn admin_manifest(&self) -> Result<serde_json::Value> {
        let m = self.manifest.read().clone();
        let mut v = serde_json::to_value(m).map_err(|e| MarketError::Internal(e.to_string()))?;
        if let serde_json::Value::Object(ref mut map) = v {
            map.insert("mode".into(), "persistent".into());
            map.insert(
                "stats".into(),
                serde_json::to_value(self.mem.snapshot_stats()).unwrap_or_default(),
            );
        }
        Ok(v)
    }

    fn stats(&self) -> StoreStats {
        self.mem.snapshot_stats()
    }
}
