//! The local store: every replicated collection behind one write lock.
//!
//! Three call sites mutate it (the optimistic mutation engine, the
//! reconciliation layer, the full resync) and all go through
//! [`LocalStore::write`], so a compound update is atomic to every reader.
//! The write guard tracks which collections were touched and persists
//! exactly those on drop.

use crate::backend::StorageBackend;
use crate::error::StoreError;
use lectern_model::profile::build_user_directory;
use lectern_model::{
    Chat, Lesson, Notification, Post, Slot, StudentProfile, SyncSnapshot, TeacherProfile,
    UserSummary,
};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::ops::Deref;
use std::sync::Arc;
use tracing::{debug, warn};

/// One replicated collection, used for dirty tracking and persistence keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Slots,
    Lessons,
    Chats,
    Posts,
    Notifications,
    Students,
    Teachers,
    Users,
}

impl Collection {
    /// Key suffix under which the collection is persisted.
    fn key(self) -> &'static str {
        match self {
            Collection::Slots => "slots",
            Collection::Lessons => "lessons",
            Collection::Chats => "chats",
            Collection::Posts => "posts",
            Collection::Notifications => "notifications",
            Collection::Students => "students",
            Collection::Teachers => "teachers",
            Collection::Users => "users",
        }
    }
}

/// All replicated collections plus the derived user directory.
#[derive(Clone, Debug, Default)]
pub struct Collections {
    pub slots: Vec<Slot>,
    pub lessons: Vec<Lesson>,
    pub chats: Vec<Chat>,
    pub posts: Vec<Post>,
    pub notifications: Vec<Notification>,
    pub students: HashMap<String, StudentProfile>,
    pub teachers: HashMap<String, TeacherProfile>,
    pub users: Vec<UserSummary>,
}

/// Durable per-collection cache with load/seed fallback.
pub struct LocalStore {
    backend: Arc<dyn StorageBackend>,
    prefix: String,
    state: RwLock<Collections>,
}

impl LocalStore {
    /// Load each collection from the backend: persisted value if present
    /// and parsable, else empty.
    pub fn open(backend: Arc<dyn StorageBackend>, prefix: impl Into<String>) -> Self {
        Self::open_with_seed(backend, prefix, SyncSnapshot::default())
    }

    /// Like [`LocalStore::open`], but collections with no persisted value
    /// fall back to the seed instead of starting empty.
    pub fn open_with_seed(
        backend: Arc<dyn StorageBackend>,
        prefix: impl Into<String>,
        seed: SyncSnapshot,
    ) -> Self {
        let prefix = prefix.into();

        fn load<T: DeserializeOwned>(
            backend: &dyn StorageBackend,
            prefix: &str,
            collection: Collection,
        ) -> Option<T> {
            load_collection(backend, &full_key(prefix, collection))
        }

        let b = backend.as_ref();
        let mut state = Collections {
            slots: load(b, &prefix, Collection::Slots).unwrap_or(seed.time_slots),
            lessons: load(b, &prefix, Collection::Lessons).unwrap_or(seed.lessons),
            chats: load(b, &prefix, Collection::Chats).unwrap_or(seed.chats),
            posts: load(b, &prefix, Collection::Posts).unwrap_or(seed.posts),
            notifications: load(b, &prefix, Collection::Notifications).unwrap_or_default(),
            students: load(b, &prefix, Collection::Students).unwrap_or(seed.student_profiles),
            teachers: load(b, &prefix, Collection::Teachers).unwrap_or(seed.teacher_profiles),
            users: Vec::new(),
        };
        state.users = load(b, &prefix, Collection::Users)
            .unwrap_or_else(|| build_user_directory(&state.teachers, &state.students));

        LocalStore {
            backend,
            prefix,
            state: RwLock::new(state),
        }
    }

    /// Read access to every collection.
    pub fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.state.read()
    }

    /// Exclusive write access. Collections touched through the guard's
    /// `*_mut` accessors are persisted when the guard drops.
    pub fn write(&self) -> StoreWriter<'_> {
        StoreWriter {
            store: self,
            guard: self.state.write(),
            dirty: HashSet::new(),
        }
    }

    /// Replace every replicated collection with the authoritative snapshot
    /// and rebuild the derived user directory. Notifications are delivered
    /// per-user over the transport, not snapshotted, and are left alone.
    pub fn replace_all(&self, snapshot: SyncSnapshot) {
        let mut writer = self.write();
        *writer.slots_mut() = snapshot.time_slots;
        *writer.lessons_mut() = snapshot.lessons;
        *writer.chats_mut() = snapshot.chats;
        *writer.posts_mut() = snapshot.posts;
        *writer.students_mut() = snapshot.student_profiles;
        *writer.teachers_mut() = snapshot.teacher_profiles;
        writer.rebuild_users();
    }

    fn persist(&self, collection: Collection, state: &Collections) {
        let serialized = match collection {
            Collection::Slots => serde_json::to_string(&state.slots),
            Collection::Lessons => serde_json::to_string(&state.lessons),
            Collection::Chats => serde_json::to_string(&state.chats),
            Collection::Posts => serde_json::to_string(&state.posts),
            Collection::Notifications => serde_json::to_string(&state.notifications),
            Collection::Students => serde_json::to_string(&state.students),
            Collection::Teachers => serde_json::to_string(&state.teachers),
            Collection::Users => serde_json::to_string(&state.users),
        };

        let key = full_key(&self.prefix, collection);
        let result = serialized
            .map_err(StoreError::from)
            .and_then(|raw| self.backend.save(&key, &raw));

        // A failed save must not abort the caller: the in-memory state
        // stays authoritative for the session.
        if let Err(err) = result {
            warn!(key = %key, error = %err, "failed to persist collection");
        } else {
            debug!(key = %key, "collection persisted");
        }
    }
}

fn full_key(prefix: &str, collection: Collection) -> String {
    format!("{}.{}", prefix, collection.key())
}

fn load_collection<T: DeserializeOwned>(backend: &dyn StorageBackend, key: &str) -> Option<T> {
    let raw = backend.load(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key = %key, error = %err, "discarding unreadable persisted collection");
            None
        }
    }
}

/// Write guard over [`Collections`] with per-collection dirty tracking.
pub struct StoreWriter<'a> {
    store: &'a LocalStore,
    guard: RwLockWriteGuard<'a, Collections>,
    dirty: HashSet<Collection>,
}

impl StoreWriter<'_> {
    pub fn slots_mut(&mut self) -> &mut Vec<Slot> {
        self.dirty.insert(Collection::Slots);
        &mut self.guard.slots
    }

    pub fn lessons_mut(&mut self) -> &mut Vec<Lesson> {
        self.dirty.insert(Collection::Lessons);
        &mut self.guard.lessons
    }

    pub fn chats_mut(&mut self) -> &mut Vec<Chat> {
        self.dirty.insert(Collection::Chats);
        &mut self.guard.chats
    }

    pub fn posts_mut(&mut self) -> &mut Vec<Post> {
        self.dirty.insert(Collection::Posts);
        &mut self.guard.posts
    }

    pub fn notifications_mut(&mut self) -> &mut Vec<Notification> {
        self.dirty.insert(Collection::Notifications);
        &mut self.guard.notifications
    }

    pub fn students_mut(&mut self) -> &mut HashMap<String, StudentProfile> {
        self.dirty.insert(Collection::Students);
        &mut self.guard.students
    }

    pub fn teachers_mut(&mut self) -> &mut HashMap<String, TeacherProfile> {
        self.dirty.insert(Collection::Teachers);
        &mut self.guard.teachers
    }

    pub fn users_mut(&mut self) -> &mut Vec<UserSummary> {
        self.dirty.insert(Collection::Users);
        &mut self.guard.users
    }

    /// Rebuild the derived user directory from the profile maps.
    pub fn rebuild_users(&mut self) {
        let users = build_user_directory(&self.guard.teachers, &self.guard.students);
        *self.users_mut() = users;
    }
}

impl Deref for StoreWriter<'_> {
    type Target = Collections;

    fn deref(&self) -> &Collections {
        &self.guard
    }
}

impl Drop for StoreWriter<'_> {
    fn drop(&mut self) {
        for collection in self.dirty.drain() {
            self.store.persist(collection, &self.guard);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use lectern_model::{NewSlot, SlotFormat};
    use parking_lot::Mutex;

    fn new_slot(teacher: &str) -> Slot {
        NewSlot {
            teacher_id: teacher.to_string(),
            teacher_name: "Vera".to_string(),
            date: "2025-01-10".to_string(),
            start_time: "10:00".to_string(),
            end_time: "11:00".to_string(),
            subject: "Math".to_string(),
            price: 1000,
            format: SlotFormat::Online,
            capacity: 1,
        }
        .into_slot()
    }

    #[test]
    fn test_mutations_survive_reopen() {
        let backend = Arc::new(MemoryBackend::new());

        {
            let store = LocalStore::open(backend.clone(), "lectern");
            store.write().slots_mut().push(new_slot("T1"));
        }

        let store = LocalStore::open(backend, "lectern");
        assert_eq!(store.read().slots.len(), 1);
    }

    #[test]
    fn test_unreadable_value_falls_back_to_default() {
        let backend = Arc::new(MemoryBackend::new());
        backend.save("lectern.slots", "{ not json").unwrap();

        let store = LocalStore::open(backend, "lectern");
        assert!(store.read().slots.is_empty());
    }

    #[test]
    fn test_seed_applies_only_when_nothing_persisted() {
        let backend = Arc::new(MemoryBackend::new());
        backend.save("lectern.lessons", "[]").unwrap();

        let seed = SyncSnapshot {
            time_slots: vec![new_slot("T1")],
            lessons: vec![Lesson::from_slot(&new_slot("T2"), "S1", "Alice")],
            ..Default::default()
        };
        let store = LocalStore::open_with_seed(backend, "lectern", seed);

        let state = store.read();
        assert_eq!(state.slots.len(), 1, "no persisted slots, seed applies");
        assert!(state.lessons.is_empty(), "persisted lessons win over seed");
    }

    #[test]
    fn test_untouched_collections_are_not_rewritten() {
        struct CountingBackend {
            inner: MemoryBackend,
            saves: Mutex<Vec<String>>,
        }

        impl StorageBackend for CountingBackend {
            fn load(&self, key: &str) -> Option<String> {
                self.inner.load(key)
            }

            fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
                self.saves.lock().push(key.to_string());
                self.inner.save(key, value)
            }
        }

        let backend = Arc::new(CountingBackend {
            inner: MemoryBackend::new(),
            saves: Mutex::new(Vec::new()),
        });
        let store = LocalStore::open(backend.clone(), "lectern");

        store.write().slots_mut().push(new_slot("T1"));

        let saves = backend.saves.lock();
        assert_eq!(saves.as_slice(), ["lectern.slots"]);
    }

    #[test]
    fn test_failed_save_keeps_in_memory_state() {
        struct FailingBackend;

        impl StorageBackend for FailingBackend {
            fn load(&self, _key: &str) -> Option<String> {
                None
            }

            fn save(&self, key: &str, _value: &str) -> Result<(), StoreError> {
                Err(StoreError::Backend {
                    key: key.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "quota exceeded"),
                })
            }
        }

        let store = LocalStore::open(Arc::new(FailingBackend), "lectern");
        store.write().slots_mut().push(new_slot("T1"));

        assert_eq!(store.read().slots.len(), 1);
    }

    #[test]
    fn test_replace_all_rebuilds_user_directory() {
        let store = LocalStore::open(Arc::new(MemoryBackend::new()), "lectern");
        store.write().notifications_mut().push(Notification::new(
            "S1",
            lectern_model::NotificationKind::System,
            "hi",
        ));

        let mut snapshot = SyncSnapshot {
            time_slots: vec![new_slot("T1")],
            ..Default::default()
        };
        snapshot.teacher_profiles.insert(
            "T1".to_string(),
            TeacherProfile {
                id: "T1".to_string(),
                name: "Vera".to_string(),
                email: String::new(),
                about: String::new(),
                subjects: vec!["Math".to_string()],
                hourly_rate: 1000,
                experience_years: 7,
            },
        );
        store.replace_all(snapshot);

        let state = store.read();
        assert_eq!(state.slots.len(), 1);
        assert_eq!(state.users.len(), 1);
        assert_eq!(state.users[0].id, "T1");
        assert_eq!(state.notifications.len(), 1, "notifications are not snapshotted");
    }
}
