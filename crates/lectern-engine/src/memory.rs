//! In-memory coordinating server for tests and simulations.
//!
//! [`MemoryHub`] plays the role of the real pub/sub endpoint: every
//! operation a client emits is translated into the corresponding broadcast
//! event and delivered to all registered clients, including the originator
//! (the echo case the reconciler must absorb). The hub can be switched
//! offline to simulate an outage, and doubles as a [`ServerApi`] serving a
//! settable snapshot.

use crate::api::ServerApi;
use crate::error::{ApiError, TransportError};
use crate::transport::{LinkEvent, SocketConnector, SocketLink};
use async_trait::async_trait;
use lectern_model::{ClientOp, ServerEvent, SyncSnapshot};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

struct Peer {
    tx: mpsc::UnboundedSender<LinkEvent>,
    subscribed_user: Option<String>,
}

struct HubInner {
    online: AtomicBool,
    next_id: AtomicU64,
    peers: RwLock<HashMap<u64, Peer>>,
    /// Toggle state per (post, user); the hub starts from "not bookmarked".
    bookmarks: Mutex<HashMap<(String, String), bool>>,
    snapshot: RwLock<SyncSnapshot>,
    op_log: Mutex<Vec<ClientOp>>,
}

/// An in-process stand-in for the coordinating server.
#[derive(Clone)]
pub struct MemoryHub {
    inner: Arc<HubInner>,
}

impl Default for MemoryHub {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHub {
    pub fn new() -> Self {
        MemoryHub {
            inner: Arc::new(HubInner {
                online: AtomicBool::new(true),
                next_id: AtomicU64::new(0),
                peers: RwLock::new(HashMap::new()),
                bookmarks: Mutex::new(HashMap::new()),
                snapshot: RwLock::new(SyncSnapshot::default()),
                op_log: Mutex::new(Vec::new()),
            }),
        }
    }

    /// A connector for one client. Each `open` registers a fresh link.
    pub fn connector(&self) -> MemoryConnector {
        MemoryConnector {
            hub: self.inner.clone(),
        }
    }

    /// A [`ServerApi`] whose probe tracks the hub's online flag and whose
    /// snapshot is whatever was last set with [`MemoryHub::set_snapshot`].
    pub fn api(&self) -> MemoryApi {
        MemoryApi {
            hub: self.inner.clone(),
        }
    }

    /// Simulate an outage (dropping every live link) or a recovery.
    pub fn set_online(&self, online: bool) {
        self.inner.online.store(online, Ordering::SeqCst);
        if !online {
            let mut peers = self.inner.peers.write();
            for (_, peer) in peers.drain() {
                let _ = peer.tx.send(LinkEvent::Dropped);
            }
        }
    }

    pub fn is_online(&self) -> bool {
        self.inner.online.load(Ordering::SeqCst)
    }

    /// Set the authoritative snapshot served to resync requests.
    pub fn set_snapshot(&self, snapshot: SyncSnapshot) {
        *self.inner.snapshot.write() = snapshot;
    }

    /// Push an arbitrary server event to every connected client.
    pub fn broadcast(&self, event: ServerEvent) {
        self.inner.broadcast(event);
    }

    /// Every operation any client has emitted, in arrival order.
    pub fn sent_ops(&self) -> Vec<ClientOp> {
        self.inner.op_log.lock().clone()
    }

    /// Number of currently registered links.
    pub fn connected_clients(&self) -> usize {
        self.inner.peers.read().len()
    }
}

impl HubInner {
    fn broadcast(&self, event: ServerEvent) {
        let peers = self.peers.read();
        for peer in peers.values() {
            let _ = peer.tx.send(LinkEvent::Message(event.clone()));
        }
    }

    fn deliver_notification(&self, notification: lectern_model::Notification) {
        let peers = self.peers.read();
        for peer in peers.values() {
            if peer.subscribed_user.as_deref() == Some(notification.user_id.as_str()) {
                let _ = peer
                    .tx
                    .send(LinkEvent::Message(ServerEvent::NewNotification(
                        notification.clone(),
                    )));
            }
        }
    }

    fn handle_op(&self, origin: u64, op: ClientOp) {
        self.op_log.lock().push(op.clone());

        match op {
            ClientOp::SubscribeNotifications(user_id) => {
                if let Some(peer) = self.peers.write().get_mut(&origin) {
                    peer.subscribed_user = Some(user_id);
                }
            }
            ClientOp::CreateNotification(notification) => {
                self.deliver_notification(notification);
            }
            ClientOp::BookmarkPost { post_id, user_id } => {
                let bookmarked = {
                    let mut bookmarks = self.bookmarks.lock();
                    let entry = bookmarks
                        .entry((post_id.clone(), user_id.clone()))
                        .or_insert(false);
                    *entry = !*entry;
                    *entry
                };
                self.broadcast(ServerEvent::PostBookmarkUpdated {
                    post_id,
                    user_id,
                    bookmarked,
                });
            }
            other => {
                if let Some(event) = echo_event(other) {
                    self.broadcast(event);
                }
            }
        }
    }
}

/// Map an operation to the broadcast event the server would publish for it.
fn echo_event(op: ClientOp) -> Option<ServerEvent> {
    Some(match op {
        ClientOp::CreateSlot(slot) => ServerEvent::SlotCreated(slot),
        ClientOp::BookSlot(booking) => ServerEvent::SlotBooked(booking),
        ClientOp::CancelSlot(cancellation) => ServerEvent::SlotCancelled(cancellation),
        ClientOp::DeleteSlot { slot_id } => ServerEvent::SlotDeleted { slot_id },
        ClientOp::CreateChat(chat) => ServerEvent::ChatCreated(chat),
        ClientOp::SendMessage { chat_id, message } => {
            ServerEvent::ReceiveMessage { chat_id, message }
        }
        ClientOp::MarkChatAsRead { chat_id } => ServerEvent::ChatMarkedAsRead { chat_id },
        ClientOp::ClearChatMessages { chat_id } => ServerEvent::ChatMessagesCleared { chat_id },
        ClientOp::ArchiveChat { chat_id } => ServerEvent::ChatArchived { chat_id },
        ClientOp::UnarchiveChat { chat_id } => ServerEvent::ChatUnarchived { chat_id },
        ClientOp::DeleteChat { chat_id } => ServerEvent::ChatDeleted { chat_id },
        ClientOp::CreatePost(post) => ServerEvent::PostCreated(post),
        ClientOp::AddReaction {
            post_id,
            reaction_type,
            user_id,
        } => ServerEvent::PostReactionUpdated {
            post_id,
            reaction_type,
            user_id,
        },
        ClientOp::AddComment { post_id, comment } => {
            ServerEvent::PostCommentAdded { post_id, comment }
        }
        ClientOp::EditPost { post_id, new_text } => ServerEvent::PostEdited { post_id, new_text },
        ClientOp::DeletePost { post_id } => ServerEvent::PostDeleted { post_id },
        ClientOp::UpdateStudentProfile {
            student_id,
            profile,
        } => ServerEvent::StudentProfileUpdated {
            student_id,
            profile,
        },
        ClientOp::UpdateTeacherProfile {
            teacher_id,
            profile,
        } => ServerEvent::TeacherProfileUpdated {
            teacher_id,
            profile,
        },
        ClientOp::MarkNotificationAsRead(id) => ServerEvent::NotificationMarkedAsRead(id),
        ClientOp::MarkAllNotificationsAsRead(user_id) => {
            ServerEvent::AllNotificationsMarkedAsRead(user_id)
        }
        ClientOp::SubscribeNotifications(_)
        | ClientOp::CreateNotification(_)
        | ClientOp::BookmarkPost { .. } => return None,
    })
}

/// Connector handed to one client.
#[derive(Clone)]
pub struct MemoryConnector {
    hub: Arc<HubInner>,
}

#[async_trait]
impl SocketConnector for MemoryConnector {
    async fn open(&self) -> Result<Box<dyn SocketLink>, TransportError> {
        if !self.hub.online.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionFailed("hub offline".to_string()));
        }

        let id = self.hub.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.hub.peers.write().insert(
            id,
            Peer {
                tx,
                subscribed_user: None,
            },
        );

        Ok(Box::new(MemoryLink {
            hub: self.hub.clone(),
            id,
            incoming: Mutex::new(Some(rx)),
        }))
    }
}

struct MemoryLink {
    hub: Arc<HubInner>,
    id: u64,
    incoming: Mutex<Option<mpsc::UnboundedReceiver<LinkEvent>>>,
}

#[async_trait]
impl SocketLink for MemoryLink {
    async fn emit(&self, op: ClientOp) -> Result<(), TransportError> {
        if !self.hub.online.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.hub.handle_op(self.id, op);
        Ok(())
    }

    fn incoming(&self) -> mpsc::UnboundedReceiver<LinkEvent> {
        self.incoming
            .lock()
            .take()
            .expect("incoming can only be taken once")
    }

    async fn close(&self) {
        self.hub.peers.write().remove(&self.id);
    }
}

/// [`ServerApi`] stand-in backed by the hub.
#[derive(Clone)]
pub struct MemoryApi {
    hub: Arc<HubInner>,
}

#[async_trait]
impl ServerApi for MemoryApi {
    async fn probe(&self) -> bool {
        self.hub.online.load(Ordering::SeqCst)
    }

    async fn fetch_snapshot(&self) -> Result<SyncSnapshot, ApiError> {
        if !self.hub.online.load(Ordering::SeqCst) {
            return Err(ApiError::Unreachable("hub offline".to_string()));
        }
        Ok(self.hub.snapshot.read().clone())
    }
}
