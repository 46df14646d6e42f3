//! Title search over the chatroom list.

use crate::conversation::types::Chatroom;

/// Chatrooms whose title contains `query`, ignoring case.
///
/// A blank query returns every chatroom. Order is never changed.
#[must_use]
pub fn filter_chatrooms<'a>(chatrooms: &'a [Chatroom], query: &str) -> Vec<&'a Chatroom> {
    if query.trim().is_empty() {
        return chatrooms.iter().collect();
    }

    let needle = query.to_lowercase();
    chatrooms
        .iter()
        .filter(|room| room.title.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rooms(titles: &[&str]) -> Vec<Chatroom> {
        titles.iter().map(|t| Chatroom::new(*t)).collect()
    }

    #[test]
    fn test_blank_query_returns_all_in_order() {
        let list = rooms(&["Work", "Travel", "Recipes"]);
        let titles: Vec<&str> = filter_chatrooms(&list, "   ")
            .iter()
            .map(|r| r.title.as_str())
            .collect();
        assert_eq!(titles, ["Work", "Travel", "Recipes"]);
    }

    #[test]
    fn test_case_insensitive_substring_keeps_order() {
        let list = rooms(&["Rust help", "Groceries", "TRUSTED notes", "misc"]);
        let titles: Vec<&str> = filter_chatrooms(&list, "RuSt")
            .iter()
            .map(|r| r.title.as_str())
            .collect();
        assert_eq!(titles, ["Rust help", "TRUSTED notes"]);
    }

    #[test]
    fn test_no_match() {
        let list = rooms(&["Work"]);
        assert!(filter_chatrooms(&list, "play").is_empty());
    }
}
