//! Offline rule-based answers for the restaurant knowledge base

use crate::types::Topic;

/// Returned when nothing at all can be said about a question
pub const GENERIC_APOLOGY: &str = "Xin lỗi, tôi không có thông tin về câu hỏi này. Vui lòng liên hệ hotline: 0382 699 866 để được hỗ trợ trực tiếp.";

/// Returned when the completion service fails
pub const COMPLETION_APOLOGY: &str =
    "Xin lỗi, đã có lỗi xảy ra khi tạo câu trả lời. Vui lòng thử lại sau.";

/// Returned when vector retrieval finds no chunks
pub const NO_RELEVANT_CHUNKS: &str = "Tôi không tìm thấy thông tin liên quan trong tài liệu. Vui lòng thử câu hỏi khác hoặc tải lên PDF mới.";

/// Returned when neither the knowledge base nor the index has content
pub const NO_DOCUMENTS: &str = "Không tìm thấy thông tin liên quan trong tài liệu. Vui lòng thử câu hỏi khác hoặc xử lý file trước.";

/// Characters of joined chunks echoed back when no topic matches
const EXCERPT_CHARS: usize = 200;

impl Topic {
    /// Fixed answer for this topic
    pub fn canned_answer(&self) -> &'static str {
        match self {
            Topic::Address => "Nhà hàng Ngư Quán có 2 cơ sở:\n- Cơ sở 1: 123 Đường ABC, Quận 1, TP.HCM\n- Cơ sở 2: 456 Đường XYZ, Quận 7, TP.HCM",
            Topic::Contact => "Hotline đặt bàn: 0382 699 866",
            Topic::Reservation => "Quý khách vui lòng gọi hotline 0382 699 866 để đặt bàn.",
            Topic::Hours => "Giờ mở cửa: 10:00 - 22:00 (Thứ 2 - Chủ nhật)",
            Topic::Price => "Giá các món ăn dao động từ 50.000đ - 500.000đ. Vui lòng liên hệ hotline để biết thêm chi tiết.",
            Topic::Menu => "Nhà hàng chuyên về các món cá sông tươi ngon như: cá lăng, cá chình, cá trắm, cá quả...",
        }
    }
}

/// Deterministic answer without any network call: the topic's canned
/// answer, else an excerpt of the chunks, else the generic apology
pub fn rule_based_answer<S: AsRef<str>>(question: &str, chunks: &[S]) -> String {
    if let Some(topic) = Topic::classify(question) {
        return topic.canned_answer().to_string();
    }

    let combined = chunks
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ");

    if combined.is_empty() {
        return GENERIC_APOLOGY.to_string();
    }

    match combined.char_indices().nth(EXCERPT_CHARS) {
        Some((idx, _)) => format!("{}...", &combined[..idx]),
        None => combined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_answers() {
        assert_eq!(
            rule_based_answer("Số điện thoại là gì?", &["x"]),
            "Hotline đặt bàn: 0382 699 866"
        );
        assert!(rule_based_answer("Nhà hàng ở đâu?", &[] as &[&str]).starts_with("Nhà hàng Ngư Quán có 2 cơ sở"));
        assert!(rule_based_answer("Mấy giờ mở cửa?", &["x"]).contains("10:00 - 22:00"));
    }

    #[test]
    fn test_excerpt_when_no_topic() {
        let chunks = ["Không gian rộng rãi.", "Có chỗ đậu xe."];
        assert_eq!(
            rule_based_answer("xin chào", &chunks),
            "Không gian rộng rãi. Có chỗ đậu xe."
        );
    }

    #[test]
    fn test_excerpt_truncated_on_char_boundary() {
        let long = "đ".repeat(250);
        let answer = rule_based_answer("xin chào", &[long]);
        assert_eq!(answer.chars().count(), 203);
        assert!(answer.ends_with("..."));
    }

    #[test]
    fn test_apology_without_chunks() {
        assert_eq!(rule_based_answer("xin chào", &[] as &[&str]), GENERIC_APOLOGY);
    }
}
