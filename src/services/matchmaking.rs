use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

use crate::models::{attendee_profile::AttendeeProfile, networking::MatchSuggestion};

/// Rounded percentage of interests two attendees share out of all the
/// interests either of them has. Comparison ignores case.
pub fn match_score(a: &[String], b: &[String]) -> i32 {
    let a: HashSet<String> = a.iter().map(|i| i.trim().to_lowercase()).collect();
    let b: HashSet<String> = b.iter().map(|i| i.trim().to_lowercase()).collect();

    let union = a.union(&b).count();
    if union == 0 {
        return 0;
    }
    let shared = a.intersection(&b).count();

    ((100.0 * shared as f64) / union as f64).round() as i32
}

/// Scored pairs worth suggesting, each pair once
pub fn score_pairs(profiles: &[(Uuid, Vec<String>)]) -> Vec<(Uuid, Uuid, i32)> {
    let mut pairs = Vec::new();
    for (i, (first, first_interests)) in profiles.iter().enumerate() {
        for (second, second_interests) in &profiles[i + 1..] {
            if first == second {
                continue;
            }
            let score = match_score(first_interests, second_interests);
            if score > 0 {
                pairs.push((*first, *second, score));
            }
        }
    }
    pairs
}

/// Suggests matches among an event's open profiles. Returns the number of new
/// suggestions stored.
#[tracing::instrument(skip(pool))]
pub async fn suggest_for_event(pool: &PgPool, event_id: Uuid) -> Result<u64, sqlx::Error> {
    let profiles = AttendeeProfile::list_open_for_event(pool, event_id).await?;

    let mut scored = Vec::with_capacity(profiles.len());
    for profile in profiles {
        let interests = AttendeeProfile::list_interests(pool, profile.id).await?;
        scored.push((profile.id, interests));
    }

    let mut created = 0;
    for (a, b, score) in score_pairs(&scored) {
        if MatchSuggestion::insert_if_absent(pool, event_id, a, b, score).await? {
            created += 1;
        }
    }

    tracing::debug!(profiles = scored.len(), created, "Match suggestions refreshed");

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_jaccard_score() {
        assert_eq!(match_score(&tags(&["AI", "Fintech"]), &tags(&["ai", "fintech"])), 100);
        // 1 shared out of 3
        assert_eq!(match_score(&tags(&["AI", "Fintech"]), &tags(&["AI", "Health"])), 33);
        // 2 shared out of 3
        assert_eq!(
            match_score(&tags(&["AI", "Fintech", "Health"]), &tags(&["AI", "Fintech"])),
            67
        );
        assert_eq!(match_score(&tags(&["AI"]), &tags(&["Agritech"])), 0);
        assert_eq!(match_score(&[], &[]), 0);
    }

    #[test]
    fn test_score_pairs_skips_zero_and_duplicates() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let profiles = vec![
            (a, tags(&["AI", "Fintech"])),
            (b, tags(&["AI"])),
            (c, tags(&["Agritech"])),
        ];

        let pairs = score_pairs(&profiles);
        assert_eq!(pairs, vec![(a, b, 50)]);
    }
}
