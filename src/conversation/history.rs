//! Synthetic older history for pagination.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::conversation::types::{Message, SenderKind};
use crate::core::config::HistoryConfig;

/// Generate one page of messages strictly older than `before`.
///
/// Messages are spaced `spacing_seconds` apart going backwards and are
/// returned oldest first, ready to prepend.
#[must_use]
pub fn generate_page<R: Rng + ?Sized>(
    before: DateTime<Utc>,
    config: &HistoryConfig,
    rng: &mut R,
) -> Vec<Message> {
    let spacing = Duration::seconds(i64::try_from(config.spacing_seconds).unwrap_or(i64::MAX));

    let mut page: Vec<Message> = (1..=config.batch_size)
        .map(|n| {
            let offset = i32::try_from(n).map_or(spacing, |n| spacing * n);
            let timestamp = before.checked_sub_signed(offset).unwrap_or(before);
            let content = format!("This is an older message {n}");
            if rng.gen_bool(0.5) {
                Message::user(content, None, timestamp)
            } else {
                Message::assistant(content, timestamp)
            }
        })
        .collect();

    page.reverse();
    page
}

/// Count of each sender in a page, for logging.
#[must_use]
pub fn sender_mix(page: &[Message]) -> (usize, usize) {
    let users = page.iter().filter(|m| m.sender == SenderKind::User).count();
    (users, page.len() - users)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_page_is_chronological_and_older() {
        let before = Utc::now();
        let mut rng = StdRng::seed_from_u64(11);
        let page = generate_page(before, &HistoryConfig::default(), &mut rng);

        assert_eq!(page.len(), 20);
        assert!(page.iter().all(|m| m.timestamp < before));
        assert!(page.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(page[19].timestamp, before - Duration::hours(1));
        assert_eq!(page[0].timestamp, before - Duration::hours(20));
        assert_eq!(page[19].content, "This is an older message 1");
    }

    #[test]
    fn test_sender_mix_counts() {
        let mut rng = StdRng::seed_from_u64(2);
        let page = generate_page(Utc::now(), &HistoryConfig::default(), &mut rng);
        let (users, assistants) = sender_mix(&page);
        assert_eq!(users + assistants, page.len());
    }
}
