//! Fixed question categories used for keyword scoring and canned answers

use serde::{Deserialize, Serialize};

/// A question category the knowledge base answers directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Address,
    Contact,
    Reservation,
    Hours,
    Price,
    Menu,
}

/// Terms that mark a chunk as carrying concrete contact, price or opening-hours data
pub const INFO_MARKERS: &[&str] = &[
    "địa chỉ",
    "address",
    "hotline",
    "điện thoại",
    "giá",
    "price",
    "giờ mở cửa",
    "mở cửa",
    "hours",
];

impl Topic {
    /// Classification order; the first topic with a matching trigger wins
    pub const ALL: [Topic; 6] = [
        Topic::Address,
        Topic::Contact,
        Topic::Reservation,
        Topic::Hours,
        Topic::Price,
        Topic::Menu,
    ];

    /// Phrases in a lowercased question that select this topic
    pub fn triggers(&self) -> &'static [&'static str] {
        match self {
            Topic::Address => &["địa chỉ", "ở đâu", "address", "where"],
            Topic::Contact => &["hotline", "số điện thoại", "liên hệ", "phone", "contact"],
            Topic::Reservation => &["đặt bàn", "đặt chỗ", "reservation", "reserve", "book"],
            Topic::Hours => &["giờ", "mở cửa", "hours", "open"],
            Topic::Price => &["giá", "bao nhiêu", "price", "how much", "cost"],
            Topic::Menu => &["món", "ăn", "thực đơn", "menu", "dish"],
        }
    }

    /// Terms that make a chunk relevant to this topic
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Topic::Address => &["địa chỉ", "cơ sở", "đường", "quận", "address"],
            Topic::Contact => &["hotline", "điện thoại", "liên hệ", "zalo", "phone"],
            Topic::Reservation => &["đặt bàn", "đặt chỗ", "hotline", "reservation"],
            Topic::Hours => &["giờ", "mở cửa", "đóng cửa", "hours", "open"],
            Topic::Price => &["giá", "000đ", "vnđ", "price"],
            Topic::Menu => &["món", "thực đơn", "cá", "menu"],
        }
    }

    /// Whether the lowercased question mentions one of this topic's triggers
    pub fn matches(&self, question_lower: &str) -> bool {
        self.triggers().iter().any(|t| question_lower.contains(t))
    }

    /// Every topic the question mentions, in classification order
    pub fn detect_all(question_lower: &str) -> Vec<Topic> {
        Self::ALL
            .into_iter()
            .filter(|topic| topic.matches(question_lower))
            .collect()
    }

    /// First matching topic for a question (any casing)
    pub fn classify(question: &str) -> Option<Topic> {
        let question_lower = question.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|topic| topic.matches(&question_lower))
    }
}
