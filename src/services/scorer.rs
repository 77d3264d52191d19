// src/services/scorer.rs

//! Engagement scoring.

use crate::models::PostRecord;

/// Weighted engagement metric for a post.
///
/// Weights are fixed: like=1, retweet=2, reply=3 — shares and replies
/// signal more engagement than likes. Saturates at `u64::MAX` so no
/// count combination can abort the item being scored.
pub fn engagement_score(record: &PostRecord) -> u64 {
    record
        .likes
        .saturating_add(record.retweets.saturating_mul(2))
        .saturating_add(record.replies.saturating_mul(3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record_with_counts(likes: u64, retweets: u64, replies: u64) -> PostRecord {
        PostRecord {
            text: "test".to_string(),
            author: "@a".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            likes,
            retweets,
            replies,
        }
    }

    #[test]
    fn weights_likes_retweets_replies() {
        assert_eq!(engagement_score(&record_with_counts(10, 3, 2)), 22);
    }

    #[test]
    fn zero_counts_score_zero() {
        assert_eq!(engagement_score(&record_with_counts(0, 0, 0)), 0);
    }

    #[test]
    fn extreme_counts_saturate_instead_of_overflowing() {
        let record = record_with_counts(u64::MAX, u64::MAX, u64::MAX);
        assert_eq!(engagement_score(&record), u64::MAX);

        let record = record_with_counts(1, u64::MAX / 2 + 1, 0);
        assert_eq!(engagement_score(&record), u64::MAX);
    }
}
