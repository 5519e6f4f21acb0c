//! The optimistic mutation surface: one method per entity-type action.
//!
//! Every mutation follows the same contract: validate trivial
//! preconditions, generate IDs client-side, apply the change to the local
//! store synchronously (the caller observes the new state immediately),
//! then forward the operation over the transport - which silently drops it
//! when offline. Nothing here returns a transport or persistence error.
//!
//! Compound mutations (booking, cancellation, rebooking) touch both
//! affected collections under a single write guard, so they are atomic
//! from every reader's perspective.

use crate::client::SyncClient;
use lectern_model::{
    Chat, ChatMessage, ClientOp, Comment, Lesson, NewSlot, Notification, NotificationKind, Post,
    ReactionKind, Slot, SlotBooking, SlotCancellation, StudentProfile, TeacherProfile,
};

impl SyncClient {
    // ── Slots and lessons ──────────────────────────────────────────────

    /// Publish a new bookable slot.
    pub fn create_slot(&self, draft: NewSlot) -> Slot {
        let slot = draft.into_slot();
        self.store.write().slots_mut().push(slot.clone());
        self.adapter.send(ClientOp::CreateSlot(slot.clone()));
        slot
    }

    /// Delete an unbooked slot. Deleting a booked slot (or an unknown ID)
    /// is a silent no-op; cancel the lesson first.
    pub fn delete_slot(&self, slot_id: &str) -> bool {
        {
            let mut w = self.store.write();
            let deletable = w
                .slots
                .iter()
                .any(|s| s.id == slot_id && !s.is_booked);
            if !deletable {
                return false;
            }
            w.slots_mut().retain(|s| s.id != slot_id);
        }
        self.adapter.send(ClientOp::DeleteSlot {
            slot_id: slot_id.to_string(),
        });
        true
    }

    /// Book a slot for a student: creates the lesson, flips the slot, and
    /// opens the teacher-student chat if none exists - all in one step.
    /// Booking an already-booked slot is a silent no-op: no lesson is
    /// created and no event is sent.
    pub fn book_lesson(
        &self,
        slot_id: &str,
        student_id: &str,
        student_name: &str,
    ) -> Option<Lesson> {
        let (lesson, new_chat) = {
            let mut w = self.store.write();
            let idx = w.slots.iter().position(|s| s.id == slot_id)?;
            if w.slots[idx].is_booked {
                return None;
            }

            let lesson = Lesson::from_slot(&w.slots[idx], student_id, student_name);
            {
                let slot = &mut w.slots_mut()[idx];
                slot.is_booked = true;
                slot.booked_student_id = Some(student_id.to_string());
            }
            w.lessons_mut().push(lesson.clone());

            let new_chat = if w
                .chats
                .iter()
                .any(|c| c.connects(&lesson.teacher_id, student_id))
            {
                None
            } else {
                let chat = Chat::between(lesson.teacher_id.clone(), student_id);
                w.chats_mut().push(chat.clone());
                Some(chat)
            };

            (lesson, new_chat)
        };

        self.adapter.send(ClientOp::BookSlot(SlotBooking {
            slot_id: slot_id.to_string(),
            lesson: lesson.clone(),
            booked_student_id: student_id.to_string(),
        }));
        if let Some(chat) = new_chat {
            self.adapter.send(ClientOp::CreateChat(chat));
        }

        Some(lesson)
    }

    /// Cancel a lesson: removes it and releases its slot in one step.
    pub fn cancel_lesson(&self, lesson_id: &str) -> bool {
        let slot_id = {
            let mut w = self.store.write();
            let idx = match w.lessons.iter().position(|l| l.id == lesson_id) {
                Some(idx) => idx,
                None => return false,
            };
            let lesson = w.lessons_mut().remove(idx);
            if let Some(slot) = w.slots_mut().iter_mut().find(|s| s.id == lesson.slot_id) {
                slot.is_booked = false;
                slot.booked_student_id = None;
            }
            lesson.slot_id
        };

        self.adapter.send(ClientOp::CancelSlot(SlotCancellation {
            slot_id,
            lesson_id: lesson_id.to_string(),
        }));
        true
    }

    /// Move a booking to another published slot: releases the old slot,
    /// takes the new one, and re-derives the lesson's schedule - all in
    /// one step. A no-op if the target slot is already booked.
    pub fn reschedule_lesson(&self, lesson_id: &str, new_slot_id: &str) -> Option<Lesson> {
        let (old_slot_id, lesson) = {
            let mut w = self.store.write();
            let lesson_idx = w.lessons.iter().position(|l| l.id == lesson_id)?;
            let new_idx = w.slots.iter().position(|s| s.id == new_slot_id)?;
            if w.slots[new_idx].is_booked {
                return None;
            }

            let old_slot_id = w.lessons[lesson_idx].slot_id.clone();
            let student_id = w.lessons[lesson_idx].student_id.clone();

            if let Some(old) = w.slots_mut().iter_mut().find(|s| s.id == old_slot_id) {
                old.is_booked = false;
                old.booked_student_id = None;
            }
            {
                let new_slot = &mut w.slots_mut()[new_idx];
                new_slot.is_booked = true;
                new_slot.booked_student_id = Some(student_id);
            }

            let new_slot = w.slots[new_idx].clone();
            let lesson = {
                let lesson = &mut w.lessons_mut()[lesson_idx];
                lesson.move_to_slot(&new_slot);
                lesson.clone()
            };

            (old_slot_id, lesson)
        };

        self.adapter.send(ClientOp::CancelSlot(SlotCancellation {
            slot_id: old_slot_id,
            lesson_id: lesson_id.to_string(),
        }));
        self.adapter.send(ClientOp::BookSlot(SlotBooking {
            slot_id: new_slot_id.to_string(),
            lesson: lesson.clone(),
            booked_student_id: lesson.student_id.clone(),
        }));

        Some(lesson)
    }

    // ── Chats ──────────────────────────────────────────────────────────

    /// Open a chat with another user, or return the existing one.
    pub fn create_chat(&self, other_user_id: &str) -> Chat {
        let (chat, created) = {
            let mut w = self.store.write();
            match w
                .chats
                .iter()
                .find(|c| c.connects(&self.config.user_id, other_user_id))
            {
                Some(existing) => (existing.clone(), false),
                None => {
                    let chat = Chat::between(self.config.user_id.clone(), other_user_id);
                    w.chats_mut().push(chat.clone());
                    (chat, true)
                }
            }
        };

        if created {
            self.adapter.send(ClientOp::CreateChat(chat.clone()));
        }
        chat
    }

    /// Append a message from the active user. `None` if the chat is
    /// unknown locally.
    pub fn send_message(&self, chat_id: &str, text: &str) -> Option<ChatMessage> {
        let message = {
            let mut w = self.store.write();
            let chat = w.chats_mut().iter_mut().find(|c| c.id == chat_id)?;
            let message = ChatMessage::new(self.config.user_id.clone(), text);
            chat.messages.push(message.clone());
            message
        };

        self.adapter.send(ClientOp::SendMessage {
            chat_id: chat_id.to_string(),
            message: message.clone(),
        });
        Some(message)
    }

    pub fn mark_chat_as_read(&self, chat_id: &str) -> bool {
        {
            let mut w = self.store.write();
            let chat = match w.chats_mut().iter_mut().find(|c| c.id == chat_id) {
                Some(chat) => chat,
                None => return false,
            };
            for message in &mut chat.messages {
                message.is_read = true;
            }
        }
        self.adapter.send(ClientOp::MarkChatAsRead {
            chat_id: chat_id.to_string(),
        });
        true
    }

    pub fn clear_chat_messages(&self, chat_id: &str) -> bool {
        {
            let mut w = self.store.write();
            match w.chats_mut().iter_mut().find(|c| c.id == chat_id) {
                Some(chat) => chat.messages.clear(),
                None => return false,
            }
        }
        self.adapter.send(ClientOp::ClearChatMessages {
            chat_id: chat_id.to_string(),
        });
        true
    }

    pub fn archive_chat(&self, chat_id: &str) -> bool {
        self.set_chat_archived(chat_id, true)
    }

    pub fn unarchive_chat(&self, chat_id: &str) -> bool {
        self.set_chat_archived(chat_id, false)
    }

    fn set_chat_archived(&self, chat_id: &str, archived: bool) -> bool {
        {
            let mut w = self.store.write();
            match w.chats_mut().iter_mut().find(|c| c.id == chat_id) {
                Some(chat) => chat.archived = archived,
                None => return false,
            }
        }
        let op = if archived {
            ClientOp::ArchiveChat {
                chat_id: chat_id.to_string(),
            }
        } else {
            ClientOp::UnarchiveChat {
                chat_id: chat_id.to_string(),
            }
        };
        self.adapter.send(op);
        true
    }

    pub fn delete_chat(&self, chat_id: &str) -> bool {
        {
            let mut w = self.store.write();
            if !w.chats.iter().any(|c| c.id == chat_id) {
                return false;
            }
            w.chats_mut().retain(|c| c.id != chat_id);
        }
        self.adapter.send(ClientOp::DeleteChat {
            chat_id: chat_id.to_string(),
        });
        true
    }

    // ── Posts ──────────────────────────────────────────────────────────

    /// Publish a feed post authored by the active user.
    pub fn create_post(&self, text: &str) -> Post {
        let post = Post::new(
            self.config.user_id.clone(),
            self.config.user_name.clone(),
            text,
        );
        self.store.write().posts_mut().push(post.clone());
        self.adapter.send(ClientOp::CreatePost(post.clone()));
        post
    }

    /// Set or clear the active user's reaction. `None` clears it.
    pub fn add_reaction(&self, post_id: &str, reaction: Option<ReactionKind>) -> bool {
        {
            let mut w = self.store.write();
            let post = match w.posts_mut().iter_mut().find(|p| p.id == post_id) {
                Some(post) => post,
                None => return false,
            };
            match reaction {
                Some(kind) => {
                    post.reactions.insert(self.config.user_id.clone(), kind);
                }
                None => {
                    post.reactions.remove(&self.config.user_id);
                }
            }
        }
        self.adapter.send(ClientOp::AddReaction {
            post_id: post_id.to_string(),
            reaction_type: reaction,
            user_id: self.config.user_id.clone(),
        });
        true
    }

    pub fn add_comment(&self, post_id: &str, text: &str) -> Option<Comment> {
        let comment = {
            let mut w = self.store.write();
            let post = w.posts_mut().iter_mut().find(|p| p.id == post_id)?;
            let comment = Comment::new(
                self.config.user_id.clone(),
                self.config.user_name.clone(),
                text,
            );
            post.comments.push(comment.clone());
            comment
        };

        self.adapter.send(ClientOp::AddComment {
            post_id: post_id.to_string(),
            comment: comment.clone(),
        });
        Some(comment)
    }

    /// Replace a post's text, re-deriving its tag list.
    pub fn edit_post(&self, post_id: &str, new_text: &str) -> bool {
        {
            let mut w = self.store.write();
            match w.posts_mut().iter_mut().find(|p| p.id == post_id) {
                Some(post) => post.edit(new_text),
                None => return false,
            }
        }
        self.adapter.send(ClientOp::EditPost {
            post_id: post_id.to_string(),
            new_text: new_text.to_string(),
        });
        true
    }

    pub fn delete_post(&self, post_id: &str) -> bool {
        {
            let mut w = self.store.write();
            if !w.posts.iter().any(|p| p.id == post_id) {
                return false;
            }
            w.posts_mut().retain(|p| p.id != post_id);
        }
        self.adapter.send(ClientOp::DeletePost {
            post_id: post_id.to_string(),
        });
        true
    }

    /// Toggle the active user's bookmark; returns the new state, or `None`
    /// for an unknown post.
    pub fn toggle_bookmark(&self, post_id: &str) -> Option<bool> {
        let bookmarked = {
            let mut w = self.store.write();
            let post = w.posts_mut().iter_mut().find(|p| p.id == post_id)?;
            if post.bookmarks.remove(&self.config.user_id) {
                false
            } else {
                post.bookmarks.insert(self.config.user_id.clone());
                true
            }
        };

        self.adapter.send(ClientOp::BookmarkPost {
            post_id: post_id.to_string(),
            user_id: self.config.user_id.clone(),
        });
        Some(bookmarked)
    }

    // ── Profiles ───────────────────────────────────────────────────────

    /// Replace a student's profile document wholesale.
    pub fn update_student_profile(&self, profile: StudentProfile) {
        let student_id = profile.id.clone();
        {
            let mut w = self.store.write();
            w.students_mut().insert(student_id.clone(), profile.clone());
            w.rebuild_users();
        }
        self.adapter.send(ClientOp::UpdateStudentProfile {
            student_id,
            profile,
        });
    }

    /// Replace a teacher's profile document wholesale.
    pub fn update_teacher_profile(&self, profile: TeacherProfile) {
        let teacher_id = profile.id.clone();
        {
            let mut w = self.store.write();
            w.teachers_mut().insert(teacher_id.clone(), profile.clone());
            w.rebuild_users();
        }
        self.adapter.send(ClientOp::UpdateTeacherProfile {
            teacher_id,
            profile,
        });
    }

    // ── Notifications ──────────────────────────────────────────────────

    /// Create a notification for some user. Applied locally only when it
    /// addresses the active user; delivery to other users is the server's
    /// job.
    pub fn create_notification(
        &self,
        user_id: &str,
        kind: NotificationKind,
        text: &str,
    ) -> Notification {
        let notification = Notification::new(user_id, kind, text);
        if user_id == self.config.user_id {
            self.store
                .write()
                .notifications_mut()
                .push(notification.clone());
        }
        self.adapter
            .send(ClientOp::CreateNotification(notification.clone()));
        notification
    }

    pub fn mark_notification_as_read(&self, notification_id: &str) -> bool {
        {
            let mut w = self.store.write();
            match w
                .notifications_mut()
                .iter_mut()
                .find(|n| n.id == notification_id)
            {
                Some(n) => n.is_read = true,
                None => return false,
            }
        }
        self.adapter
            .send(ClientOp::MarkNotificationAsRead(notification_id.to_string()));
        true
    }

    /// Mark every notification addressed to the active user as read.
    pub fn mark_all_notifications_as_read(&self) {
        {
            let mut w = self.store.write();
            for n in w.notifications_mut().iter_mut() {
                if n.user_id == self.config.user_id {
                    n.is_read = true;
                }
            }
        }
        self.adapter.send(ClientOp::MarkAllNotificationsAsRead(
            self.config.user_id.clone(),
        ));
    }

    /// Ask the server to route the active user's notifications to this
    /// connection. Re-sent automatically on every reconnect.
    pub fn subscribe_notifications(&self) {
        self.adapter.send(ClientOp::SubscribeNotifications(
            self.config.user_id.clone(),
        ));
    }
}
