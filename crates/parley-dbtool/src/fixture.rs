//! Random pending data for `generate`.

use chrono::{Duration, Utc};
use parley_shared::types::generate_message_id;
use parley_shared::SyncStatus;
use parley_store::{Channel, Message, User};
use rand::seq::SliceRandom;
use rand::Rng;

const WORDS: &[&str] = &[
    "offline", "hello", "sync", "later", "queued", "retry", "ping", "draft", "coffee", "ship",
];

pub struct Fixture {
    pub users: Vec<User>,
    pub channels: Vec<Channel>,
    pub messages: Vec<Message>,
}

/// `count` pending channels with `members` users each, and one pending
/// message per member.
pub fn build(count: usize, members: usize) -> Fixture {
    let mut rng = rand::thread_rng();
    let now = Utc::now();
    let suffix: u32 = rng.gen();

    let users: Vec<User> = (0..members.max(1))
        .map(|i| User {
            name: Some(format!("Member {i}")),
            ..User::new(format!("member-{suffix:08x}-{i}"))
        })
        .collect();

    let mut channels = Vec::with_capacity(count);
    let mut messages = Vec::with_capacity(count * users.len());
    for c in 0..count {
        let mut channel = Channel {
            created_by_user_id: users[0].id.clone(),
            member_count: users.len() as i32,
            created_at: Some(now),
            sync_status: SyncStatus::SyncNeeded,
            ..Channel::new("messaging", format!("dbtool-{suffix:08x}-{c}"))
        };

        for (m, author) in users.iter().enumerate() {
            let text: Vec<&str> = (0..rng.gen_range(2..6))
                .filter_map(|_| WORDS.choose(&mut rng).copied())
                .collect();
            let at = now + Duration::milliseconds(m as i64);
            let message = Message {
                id: generate_message_id(&author.id),
                cid: channel.cid.clone(),
                user: author.clone(),
                text: text.join(" "),
                created_locally_at: Some(at),
                sync_status: SyncStatus::SyncNeeded,
                ..Default::default()
            };
            channel.last_message_id = Some(message.id.clone());
            channel.last_message_at = Some(at);
            messages.push(message);
        }
        channels.push(channel);
    }

    Fixture {
        users,
        channels,
        messages,
    }
}
