//! The reconciliation layer: applies every inbound server event to the
//! local store.
//!
//! The dispatch is a total match over [`ServerEvent`], so adding a wire
//! event without a handler is a compile error. Handlers are idempotent per
//! entity ID: creations insert only if the ID is absent (which absorbs the
//! server echoing back locally originated entities under at-least-once
//! delivery), updates overwrite wholesale (last-writer-wins), deletions
//! treat an already-missing ID as success. Compound events touch every
//! affected collection under one write guard, so no reader can observe a
//! half-applied booking or cancellation.

use lectern_model::{
    Lesson, ProfileUpdate, ServerEvent, SlotBooking, SlotCancellation, StudentProfile,
    TeacherProfile, UserRole,
};
use lectern_store::{LocalStore, StoreWriter};
use std::sync::Arc;
use tracing::{debug, warn};

/// Applies inbound replica events to the local store.
pub struct Reconciler {
    store: Arc<LocalStore>,
}

impl Reconciler {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Reconciler { store }
    }

    /// Apply one event. Touched collections are re-persisted when the
    /// write guard drops.
    pub fn apply(&self, event: ServerEvent) {
        debug!(event = event.name(), "reconciling");
        let mut w = self.store.write();

        match event {
            ServerEvent::SlotCreated(slot) => {
                if !w.slots.iter().any(|s| s.id == slot.id) {
                    w.slots_mut().push(slot);
                }
            }
            ServerEvent::SlotBooked(booking) => apply_booking(&mut w, booking),
            ServerEvent::SlotCancelled(cancellation) => apply_cancellation(&mut w, cancellation),
            ServerEvent::SlotDeleted { slot_id } => {
                w.slots_mut().retain(|s| s.id != slot_id);
            }
            ServerEvent::AllSlots(slots) => {
                *w.slots_mut() = slots;
            }

            ServerEvent::ChatCreated(chat) => {
                if !w.chats.iter().any(|c| c.id == chat.id) {
                    w.chats_mut().push(chat);
                }
            }
            ServerEvent::ReceiveMessage { chat_id, message } => {
                if let Some(chat) = w.chats_mut().iter_mut().find(|c| c.id == chat_id) {
                    if !chat.messages.iter().any(|m| m.id == message.id) {
                        chat.messages.push(message);
                    }
                }
            }
            ServerEvent::ChatDeleted { chat_id } => {
                w.chats_mut().retain(|c| c.id != chat_id);
            }
            ServerEvent::ChatMarkedAsRead { chat_id } => {
                if let Some(chat) = w.chats_mut().iter_mut().find(|c| c.id == chat_id) {
                    for message in &mut chat.messages {
                        message.is_read = true;
                    }
                }
            }
            ServerEvent::ChatMessagesCleared { chat_id } => {
                if let Some(chat) = w.chats_mut().iter_mut().find(|c| c.id == chat_id) {
                    chat.messages.clear();
                }
            }
            ServerEvent::ChatArchived { chat_id } => {
                if let Some(chat) = w.chats_mut().iter_mut().find(|c| c.id == chat_id) {
                    chat.archived = true;
                }
            }
            ServerEvent::ChatUnarchived { chat_id } => {
                if let Some(chat) = w.chats_mut().iter_mut().find(|c| c.id == chat_id) {
                    chat.archived = false;
                }
            }

            ServerEvent::PostCreated(post) => {
                if !w.posts.iter().any(|p| p.id == post.id) {
                    w.posts_mut().push(post);
                }
            }
            ServerEvent::PostReactionUpdated {
                post_id,
                reaction_type,
                user_id,
            } => {
                if let Some(post) = w.posts_mut().iter_mut().find(|p| p.id == post_id) {
                    match reaction_type {
                        Some(kind) => {
                            post.reactions.insert(user_id, kind);
                        }
                        None => {
                            post.reactions.remove(&user_id);
                        }
                    }
                }
            }
            ServerEvent::PostCommentAdded { post_id, comment } => {
                if let Some(post) = w.posts_mut().iter_mut().find(|p| p.id == post_id) {
                    if !post.comments.iter().any(|c| c.id == comment.id) {
                        post.comments.push(comment);
                    }
                }
            }
            ServerEvent::PostEdited { post_id, new_text } => {
                if let Some(post) = w.posts_mut().iter_mut().find(|p| p.id == post_id) {
                    post.edit(new_text);
                }
            }
            ServerEvent::PostDeleted { post_id } => {
                w.posts_mut().retain(|p| p.id != post_id);
            }
            ServerEvent::PostBookmarkUpdated {
                post_id,
                user_id,
                bookmarked,
            } => {
                if let Some(post) = w.posts_mut().iter_mut().find(|p| p.id == post_id) {
                    if bookmarked {
                        post.bookmarks.insert(user_id);
                    } else {
                        post.bookmarks.remove(&user_id);
                    }
                }
            }

            ServerEvent::NewNotification(notification) => {
                if !w.notifications.iter().any(|n| n.id == notification.id) {
                    w.notifications_mut().push(notification);
                }
            }
            ServerEvent::NotificationMarkedAsRead(id) => {
                // Monotonic: read notifications never become unread again.
                if let Some(n) = w.notifications_mut().iter_mut().find(|n| n.id == id) {
                    n.is_read = true;
                }
            }
            ServerEvent::AllNotificationsMarkedAsRead(user_id) => {
                for n in w.notifications_mut().iter_mut() {
                    if n.user_id == user_id {
                        n.is_read = true;
                    }
                }
            }

            ServerEvent::TeacherProfileUpdated {
                teacher_id,
                profile,
            } => {
                w.teachers_mut().insert(teacher_id, profile);
                w.rebuild_users();
            }
            ServerEvent::StudentProfileUpdated {
                student_id,
                profile,
            } => {
                w.students_mut().insert(student_id, profile);
                w.rebuild_users();
            }
            ServerEvent::ProfileUpdated(update) | ServerEvent::UserRegistered(update) => {
                apply_profile_document(&mut w, update);
            }
            ServerEvent::AllUsers(users) => {
                *w.users_mut() = users;
            }

            ServerEvent::AllLessons(lessons) => {
                *w.lessons_mut() = lessons;
            }
            ServerEvent::DataUpdated(bulk) => {
                let mut profiles_changed = false;
                if let Some(slots) = bulk.time_slots {
                    *w.slots_mut() = slots;
                }
                if let Some(lessons) = bulk.lessons {
                    *w.lessons_mut() = lessons;
                }
                if let Some(chats) = bulk.chats {
                    *w.chats_mut() = chats;
                }
                if let Some(posts) = bulk.posts {
                    *w.posts_mut() = posts;
                }
                if let Some(teachers) = bulk.teacher_profiles {
                    *w.teachers_mut() = teachers;
                    profiles_changed = true;
                }
                if let Some(students) = bulk.student_profiles {
                    *w.students_mut() = students;
                    profiles_changed = true;
                }
                if profiles_changed {
                    w.rebuild_users();
                }
            }
        }
    }
}

/// A booking confirmation: the lesson appears and the slot flips in the
/// same step, so no observer sees one without the other.
fn apply_booking(w: &mut StoreWriter<'_>, booking: SlotBooking) {
    let SlotBooking {
        slot_id,
        lesson,
        booked_student_id,
    } = booking;

    insert_lesson(w, lesson);
    if let Some(slot) = w.slots_mut().iter_mut().find(|s| s.id == slot_id) {
        slot.is_booked = true;
        slot.booked_student_id = Some(booked_student_id);
    }
}

/// A cancellation removes the lesson and releases the slot together.
fn apply_cancellation(w: &mut StoreWriter<'_>, cancellation: SlotCancellation) {
    let SlotCancellation { slot_id, lesson_id } = cancellation;

    w.lessons_mut().retain(|l| l.id != lesson_id);
    if let Some(slot) = w.slots_mut().iter_mut().find(|s| s.id == slot_id) {
        slot.is_booked = false;
        slot.booked_student_id = None;
    }
}

fn insert_lesson(w: &mut StoreWriter<'_>, lesson: Lesson) {
    if !w.lessons.iter().any(|l| l.id == lesson.id) {
        w.lessons_mut().push(lesson);
    }
}

/// Decode a role-generic profile document and apply it wholesale. An
/// undecodable document is logged and skipped, never an error.
fn apply_profile_document(w: &mut StoreWriter<'_>, update: ProfileUpdate) {
    let ProfileUpdate {
        user_id,
        role,
        profile,
    } = update;

    match role {
        UserRole::Teacher => match serde_json::from_value::<TeacherProfile>(profile) {
            Ok(profile) => {
                w.teachers_mut().insert(user_id, profile);
                w.rebuild_users();
            }
            Err(err) => {
                warn!(user = %user_id, error = %err, "skipping undecodable teacher profile");
            }
        },
        UserRole::Student => match serde_json::from_value::<StudentProfile>(profile) {
            Ok(profile) => {
                w.students_mut().insert(user_id, profile);
                w.rebuild_users();
            }
            Err(err) => {
                warn!(user = %user_id, error = %err, "skipping undecodable student profile");
            }
        },
    }
}
