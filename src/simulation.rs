//! Multi-client replication simulation over the in-memory hub.
//!
//! Drives a fleet of teacher and student clients through publish/book/chat
//! churn, then checks that every replica converged to the same collections.

use chrono::{Duration as ChronoDuration, Utc};
use futures::future::join_all;
use lectern_engine::{ClientConfig, MemoryHub, SyncClient};
use lectern_model::{NewSlot, SlotFormat, SyncSnapshot};
use lectern_store::{LocalStore, MemoryBackend};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Statistics collected during a simulation run.
#[derive(Clone, Debug)]
pub struct SimulationStats {
    pub clients: usize,
    pub slots_published: usize,
    pub lessons_booked: usize,
    pub messages_sent: usize,
    pub total_time: Duration,
    pub converged: bool,
}

impl SimulationStats {
    pub fn print(&self) {
        println!("\n╔════════════════════════════════════════════════════════════╗");
        println!("║              Simulation Statistics                         ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║  Clients:                   {:>30} ║", self.clients);
        println!("║  Slots Published:           {:>30} ║", self.slots_published);
        println!("║  Lessons Booked:            {:>30} ║", self.lessons_booked);
        println!("║  Messages Sent:             {:>30} ║", self.messages_sent);
        println!(
            "║  Total Time:                {:>29}s ║",
            format!("{:.3}", self.total_time.as_secs_f64())
        );
        println!(
            "║  All Replicas Converged:    {:>30} ║",
            if self.converged { "yes" } else { "NO" }
        );
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

fn spawn_client(hub: &MemoryHub, user_id: &str, user_name: &str) -> Arc<SyncClient> {
    let store = Arc::new(LocalStore::open(Arc::new(MemoryBackend::new()), "lectern"));
    let config = ClientConfig {
        user_id: user_id.to_string(),
        user_name: user_name.to_string(),
        reconnect_delay: Duration::from_millis(100),
        ..Default::default()
    };
    let client = Arc::new(SyncClient::new(
        config,
        store,
        Arc::new(hub.connector()),
        Arc::new(hub.api()),
    ));
    client.init();
    client
}

/// Serialize the replicated collections in a canonical order so replicas
/// can be compared for convergence.
fn fingerprint(client: &SyncClient) -> String {
    let store = client.store();
    let state = store.read();
    let mut slots = state.slots.clone();
    slots.sort_by(|a, b| a.id.cmp(&b.id));
    let mut lessons = state.lessons.clone();
    lessons.sort_by(|a, b| a.id.cmp(&b.id));
    let mut chats = state.chats.clone();
    chats.sort_by(|a, b| a.id.cmp(&b.id));
    serde_json::to_string(&(slots, lessons, chats)).unwrap_or_default()
}

async fn settle(clients: &[Arc<SyncClient>], deadline: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        let mut prints = clients.iter().map(|c| fingerprint(c));
        if let Some(first) = prints.next() {
            if prints.all(|p| p == first) {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    false
}

/// Marketplace churn: teachers publish, students book and chat, everyone
/// must converge through broadcast alone.
pub async fn simulate_marketplace(
    teachers: usize,
    students: usize,
    slots_per_teacher: usize,
) -> SimulationStats {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║        Marketplace Churn Simulation                        ║");
    println!(
        "║  Teachers: {} | Students: {} | Slots/Teacher: {}           ║",
        teachers, students, slots_per_teacher
    );
    println!("╚════════════════════════════════════════════════════════════╝");

    let start = Instant::now();
    let hub = MemoryHub::new();
    let mut rng = StdRng::from_entropy();

    let teacher_clients: Vec<_> = (0..teachers)
        .map(|i| {
            spawn_client(
                &hub,
                &format!("T{}", i + 1),
                &format!("Teacher {}", i + 1),
            )
        })
        .collect();
    let student_clients: Vec<_> = (0..students)
        .map(|i| {
            spawn_client(
                &hub,
                &format!("S{}", i + 1),
                &format!("Student {}", i + 1),
            )
        })
        .collect();

    let all: Vec<_> = teacher_clients
        .iter()
        .chain(student_clients.iter())
        .cloned()
        .collect();
    join_all(all.iter().map(|c| c.connect())).await;

    println!("\n[Phase 1/3] Teachers publish slots...");
    let subjects = ["Math", "Physics", "English", "History"];
    let mut slots_published = 0;
    for (t, client) in teacher_clients.iter().enumerate() {
        for day in 0..slots_per_teacher {
            let date = (Utc::now() + ChronoDuration::days(day as i64 + 1))
                .format("%Y-%m-%d")
                .to_string();
            let hour = 9 + rng.gen_range(0..8);
            client.create_slot(NewSlot {
                teacher_id: format!("T{}", t + 1),
                teacher_name: format!("Teacher {}", t + 1),
                date,
                start_time: format!("{:02}:00", hour),
                end_time: format!("{:02}:00", hour + 1),
                subject: subjects[rng.gen_range(0..subjects.len())].to_string(),
                price: 500 + 100 * rng.gen_range(0..10),
                format: SlotFormat::Online,
                capacity: 1,
            });
            slots_published += 1;
        }
    }
    settle(&all, Duration::from_secs(5)).await;

    println!("[Phase 2/3] Students book and open chats...");
    let mut lessons_booked = 0;
    let mut messages_sent = 0;
    for (s, client) in student_clients.iter().enumerate() {
        let student_id = format!("S{}", s + 1);
        let available: Vec<String> = {
            let store = client.store();
            let state = store.read();
            state
                .slots
                .iter()
                .filter(|slot| !slot.is_booked)
                .map(|slot| slot.id.clone())
                .collect()
        };
        if available.is_empty() {
            continue;
        }
        let slot_id = &available[rng.gen_range(0..available.len())];
        if let Some(lesson) = client.book_lesson(slot_id, &student_id, &format!("Student {}", s + 1))
        {
            lessons_booked += 1;
            let chat_id = {
                let store = client.store();
                let state = store.read();
                state
                    .chats
                    .iter()
                    .find(|c| c.connects(&lesson.teacher_id, &student_id))
                    .map(|c| c.id.clone())
            };
            if let Some(chat_id) = chat_id {
                if client.send_message(&chat_id, "Hi! Looking forward to it.").is_some() {
                    messages_sent += 1;
                }
            }
        }
        // Let bookings propagate so later students see taken slots.
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    println!("[Phase 3/3] Waiting for convergence...");
    let converged = settle(&all, Duration::from_secs(10)).await;

    for client in &all {
        client.dispose().await;
    }

    SimulationStats {
        clients: all.len(),
        slots_published,
        lessons_booked,
        messages_sent,
        total_time: start.elapsed(),
        converged,
    }
}

/// Offline fallback and resync: a client keeps working against an
/// unreachable hub, then reconnects and is superseded by the authoritative
/// snapshot.
pub async fn simulate_offline_resync() {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║        Offline Fallback & Full Resync                      ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    let hub = MemoryHub::new();
    hub.set_online(false);

    let client = spawn_client(&hub, "T1", "Teacher 1");
    client.connect().await;
    println!(
        "\n  Probe failed, connected = {} (local-only mode)",
        client.connected()
    );

    client.create_slot(NewSlot {
        teacher_id: "T1".to_string(),
        teacher_name: "Teacher 1".to_string(),
        date: (Utc::now() + ChronoDuration::days(1))
            .format("%Y-%m-%d")
            .to_string(),
        start_time: "10:00".to_string(),
        end_time: "11:00".to_string(),
        subject: "Math".to_string(),
        price: 1000,
        format: SlotFormat::Online,
        capacity: 1,
    });
    println!(
        "  Created a slot offline; local slots = {}",
        client.store().read().slots.len()
    );

    // The server comes back with its own authoritative state.
    hub.set_snapshot(SyncSnapshot::default());
    hub.set_online(true);
    client.connect().await;

    let deadline = Instant::now() + Duration::from_secs(5);
    while !client.connected() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!(
        "  Reconnected, resynced; local slots = {} (offline edit superseded by snapshot)",
        client.store().read().slots.len()
    );

    client.dispose().await;
}
