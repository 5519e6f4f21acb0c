//! # Lectern Demo
//!
//! A standalone CLI walkthrough of the Lectern sync engine. Two clients -
//! a teacher and a student - share an in-memory hub standing in for the
//! coordinating server, so every scenario runs without any network.
//!
//! Scenarios:
//! - `booking`: publish → book → cancel, with both replicas converging
//! - `offline`: probe failure, local-only mutations, resync on recovery
//! - `feed`: posts, reactions, comments and bookmarks across replicas

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::*;
use lectern_engine::{ClientConfig, MemoryHub, SyncClient};
use lectern_model::{NewSlot, ReactionKind, SlotFormat};
use lectern_store::{LocalStore, MemoryBackend};

// ─── CLI ───────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "lectern-demo")]
#[command(about = "Optimistic-sync walkthrough for the Lectern engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Booking flow: a slot is published, booked and cancelled across two clients
    Booking,
    /// Offline mode: mutations against an unreachable server, then resync
    Offline,
    /// Social feed: posts, reactions, comments and bookmarks
    Feed,
}

// ─── Pretty printing ──────────────────────────────────────────────────────

fn header(text: &str) {
    let bar = "═".repeat(60);
    println!("\n{}", bar.bright_cyan());
    println!("  {}", text.bold().bright_white());
    println!("{}", bar.bright_cyan());
}

fn section(text: &str) {
    println!("\n{} {}", "▸".bright_yellow(), text.bold());
}

fn step(text: &str) {
    println!("  {} {}", "•".bright_green(), text);
}

fn show_store(label: &str, client: &SyncClient) {
    let store = client.store();
    let state = store.read();
    println!(
        "  {} slots: {} (booked: {}) | lessons: {} | chats: {} | posts: {}",
        format!("[{}]", label).bright_magenta(),
        state.slots.len(),
        state.slots.iter().filter(|s| s.is_booked).count(),
        state.lessons.len(),
        state.chats.len(),
        state.posts.len(),
    );
}

// ─── Setup ────────────────────────────────────────────────────────────────

fn new_client(hub: &MemoryHub, user_id: &str, user_name: &str) -> SyncClient {
    let store = Arc::new(LocalStore::open(Arc::new(MemoryBackend::new()), "lectern"));
    let config = ClientConfig {
        user_id: user_id.to_string(),
        user_name: user_name.to_string(),
        reconnect_delay: Duration::from_millis(100),
        ..Default::default()
    };
    let client = SyncClient::new(
        config,
        store,
        Arc::new(hub.connector()),
        Arc::new(hub.api()),
    );
    client.init();
    client
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(150)).await;
}

fn math_slot() -> NewSlot {
    NewSlot {
        teacher_id: "T1".to_string(),
        teacher_name: "Vera".to_string(),
        date: "2025-01-10".to_string(),
        start_time: "10:00".to_string(),
        end_time: "11:00".to_string(),
        subject: "Math".to_string(),
        price: 1000,
        format: SlotFormat::Online,
        capacity: 1,
    }
}

// ─── Scenarios ────────────────────────────────────────────────────────────

async fn booking_demo() {
    header("Booking Flow: publish → book → cancel");

    let hub = MemoryHub::new();
    let teacher = new_client(&hub, "T1", "Vera");
    let student = new_client(&hub, "S1", "Alice");
    teacher.connect().await;
    student.connect().await;

    section("Teacher publishes a Math slot");
    let slot = teacher.create_slot(math_slot());
    step(&format!("created {}", slot.id));
    settle().await;
    show_store("teacher", &teacher);
    show_store("student", &student);

    section("Student books it");
    let lesson = student
        .book_lesson(&slot.id, "S1", "Alice")
        .expect("slot should be free");
    step(&format!(
        "lesson {} scheduled for {} at {}",
        lesson.id, lesson.date, lesson.start_time
    ));
    step("a teacher-student chat was opened automatically");
    settle().await;
    show_store("teacher", &teacher);
    show_store("student", &student);

    section("Booking again is a silent no-op");
    let denied = student.book_lesson(&slot.id, "S2", "Bob");
    step(&format!("second booking returned: {:?}", denied.is_some()));

    section("Student cancels");
    student.cancel_lesson(&lesson.id);
    settle().await;
    show_store("teacher", &teacher);
    show_store("student", &student);

    teacher.dispose().await;
    student.dispose().await;
    println!("\n{}", "✓ Both replicas converged at every step".bright_green());
}

async fn offline_demo() {
    header("Offline Mode: probe failure, local edits, resync");

    let hub = MemoryHub::new();
    hub.set_online(false);

    let teacher = new_client(&hub, "T1", "Vera");

    section("Server unreachable: probe fails before any socket attempt");
    teacher.connect().await;
    step(&format!("connected = {}", teacher.connected()));

    section("Mutations keep working locally");
    let slot = teacher.create_slot(math_slot());
    step(&format!("created {} while offline", slot.id));
    let post = teacher.create_post("free trial lesson this week #math");
    step(&format!("posted {} while offline", post.id));
    show_store("teacher", &teacher);

    section("Server recovers with its own authoritative state");
    hub.set_snapshot(Default::default());
    hub.set_online(true);
    teacher.connect().await;
    settle().await;
    step(&format!("connected = {}", teacher.connected()));
    show_store("teacher", &teacher);
    println!(
        "\n  {}",
        "note: the resync replaced collections wholesale - offline edits that"
            .dimmed()
    );
    println!(
        "  {}",
        "were never transmitted are superseded by the snapshot".dimmed()
    );

    teacher.dispose().await;
}

async fn feed_demo() {
    header("Social Feed: posts, reactions, comments, bookmarks");

    let hub = MemoryHub::new();
    let teacher = new_client(&hub, "T1", "Vera");
    let student = new_client(&hub, "S1", "Alice");
    teacher.connect().await;
    student.connect().await;

    section("Teacher posts an announcement");
    let post = teacher.create_post("Open seats for #math and #physics prep!");
    step(&format!("tags derived from text: {:?}", post.tags));
    settle().await;

    section("Student reacts, comments and bookmarks");
    student.add_reaction(&post.id, Some(ReactionKind::Love));
    student.add_comment(&post.id, "Is the physics group still open?");
    student.toggle_bookmark(&post.id);
    settle().await;

    {
        let store = teacher.store();
        let state = store.read();
        let p = &state.posts[0];
        step(&format!(
            "teacher sees: {} reaction(s), {} comment(s), {} bookmark(s)",
            p.reactions.len(),
            p.comments.len(),
            p.bookmarks.len()
        ));
    }

    section("Teacher edits the post; tags re-derive everywhere");
    teacher.edit_post(&post.id, "Physics group is full - #math only now");
    settle().await;
    {
        let store = student.store();
        let state = store.read();
        step(&format!("student sees tags: {:?}", state.posts[0].tags));
    }

    show_store("teacher", &teacher);
    show_store("student", &student);

    teacher.dispose().await;
    student.dispose().await;
}

// ─── Entry point ──────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Booking => booking_demo().await,
        Commands::Offline => offline_demo().await,
        Commands::Feed => feed_demo().await,
    }
}
