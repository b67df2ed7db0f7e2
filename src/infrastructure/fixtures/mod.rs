//! Demo data used when no seed file is configured

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::domain::entities::{
    Conversation, Item, ItemKind, Message, MessageStatus, Notification, NotificationKind, Role, User,
};
use crate::infrastructure::storage::SeedData;

pub fn users() -> Vec<User> {
    vec![
        User::new("user-1", "Kwame Asante")
            .with_email("kwame.asante@st.ug.edu.gh")
            .with_avatar("/avatars/kwame.png")
            .verified(),
        User::new("user-2", "Ama Serwaa")
            .with_email("ama.serwaa@st.ug.edu.gh")
            .with_avatar("/avatars/ama.png")
            .verified(),
        User::new("user-3", "Kofi Mensah")
            .with_email("kofi.mensah@st.ug.edu.gh")
            .with_avatar("/avatars/kofi.png"),
        User::new("user-4", "Abena Osei")
            .with_email("abena.osei@st.ug.edu.gh")
            .with_avatar("/avatars/abena.png")
            .verified(),
        User::new("admin-1", "Admin User")
            .with_email("admin@ug.edu.gh")
            .verified()
            .with_role(Role::Admin),
    ]
}

pub fn user(id: &str) -> Option<User> {
    users().into_iter().find(|u| u.id == id)
}

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn message(
    id: &str,
    conversation_id: &str,
    sender_id: &str,
    content: &str,
    timestamp: DateTime<Utc>,
    status: MessageStatus,
) -> Message {
    Message::new(conversation_id, sender_id, content)
        .with_id(id)
        .with_timestamp(timestamp)
        .with_status(status)
}

/// Two conversations for `user-1`: with Ama Serwaa about a found ID card and
/// with Kofi Mensah about a lost backpack.
pub fn seed() -> SeedData {
    let people = users();
    let (kwame, ama, kofi) = (people[0].clone(), people[1].clone(), people[2].clone());

    let id_card = Item::new("item-2", "University Student ID Card", ItemKind::Found, "user-2")
        .with_description("Found a student ID card near the Night Market.")
        .with_location("Night Market");
    let backpack = Item::new("item-3", "Black Jansport Backpack", ItemKind::Lost, "user-3")
        .with_description("Black backpack with a laptop charger and notebooks.")
        .with_location("JQB");

    let messages = vec![
        message(
            "msg-1",
            "conv-1",
            "user-1",
            "Hi! I think the ID card you found might be mine.",
            at(2025, 2, 2, 14, 45),
            MessageStatus::Read,
        ),
        message(
            "msg-2",
            "conv-1",
            "user-1",
            "Can we meet to verify?",
            at(2025, 2, 2, 14, 46),
            MessageStatus::Read,
        ),
        message(
            "msg-3",
            "conv-1",
            "user-2",
            "Yes, come to Volta Hall reception at 4pm!",
            at(2025, 2, 2, 15, 30),
            MessageStatus::Read,
        ),
        message(
            "msg-4",
            "conv-2",
            "user-1",
            "Hi Kofi, saw your post about the lost backpack.",
            at(2025, 2, 3, 10, 0),
            MessageStatus::Read,
        ),
        message(
            "msg-5",
            "conv-2",
            "user-3",
            "Have you seen my backpack by any chance?",
            at(2025, 2, 3, 10, 15),
            MessageStatus::Delivered,
        ),
    ];

    let conversations = vec![
        Conversation::new("conv-1")
            .with_participants(vec![kwame.clone(), ama])
            .with_item(id_card)
            .with_last_message(messages[2].clone()),
        Conversation::new("conv-2")
            .with_participants(vec![kwame, kofi])
            .with_item(backpack)
            .with_last_message(messages[4].clone())
            .with_unread_count(1),
    ];

    SeedData {
        conversations,
        messages,
    }
}

/// The three notifications a fresh inbox starts with.
pub fn notifications() -> Vec<Notification> {
    let now = Utc::now();
    vec![
        Notification {
            id: "notif-1".to_string(),
            kind: NotificationKind::Claim,
            title: "New Claim Request".to_string(),
            description: "Someone claimed your lost iPhone 14 Pro".to_string(),
            timestamp: now - Duration::minutes(30),
            read: false,
            link: Some("/my-claims".to_string()),
        },
        Notification {
            id: "notif-2".to_string(),
            kind: NotificationKind::Message,
            title: "New Message".to_string(),
            description: "Sarah sent you a message about MacBook".to_string(),
            timestamp: now - Duration::hours(2),
            read: false,
            link: Some("/messages".to_string()),
        },
        Notification {
            id: "notif-3".to_string(),
            kind: NotificationKind::Item,
            title: "Item Match Found".to_string(),
            description: "A found item matches your lost AirPods".to_string(),
            timestamp: now - Duration::hours(5),
            read: true,
            link: Some("/browse".to_string()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_is_consistent() {
        let seed = seed();
        for conv in &seed.conversations {
            let last = conv.last_message.as_ref().unwrap();
            assert_eq!(last.conversation_id, conv.id);
            assert!(seed.messages.iter().any(|m| m.id == last.id));
        }
        let unread: u32 = seed.conversations.iter().map(|c| c.unread_count()).sum();
        assert_eq!(unread, 1);
    }

    #[test]
    fn lookup_user() {
        assert_eq!(user("user-2").map(|u| u.name), Some("Ama Serwaa".to_string()));
        assert!(user("user-99").is_none());
        assert_eq!(user("user-3").and_then(|u| u.avatar).as_deref(), Some("/avatars/kofi.png"));
    }

    #[test]
    fn two_default_notifications_unread() {
        assert_eq!(notifications().iter().filter(|n| !n.read).count(), 2);
    }
}
