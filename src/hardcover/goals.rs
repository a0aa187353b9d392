use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{json, Value};

use super::HardcoverClient;
use crate::domain::dates::parse_timestamp_or_min;
use crate::domain::ReadingGoal;

/// One activity-feed row. The `data` payload is left loose: goal
/// snapshots inside it have no stable shape and go through the tolerant
/// decoder instead of serde derive.
#[derive(Debug, Clone, Deserialize)]
pub struct GoalActivity {
    pub event: String,
    pub data: Option<Value>,
    pub created_at: Option<String>,
}

#[derive(Deserialize)]
struct ActivitiesData {
    activities: Option<Vec<GoalActivity>>,
}

const ACTIVITIES_QUERY: &str = "query ReadingGoals($userId: Int!) {
  activities(
    where: { user_id: { _eq: $userId }, event: { _eq: \"GoalActivity\" } },
    order_by: { created_at: desc },
    limit: 500
  ) {
    id
    event
    data
    created_at
  }
}";

const FINISHED_READS_QUERY: &str = "query FinishedReads($userId: Int!, $start: date!, $end: date!) {
  user_book_reads(
    where: {
      finished_at: { _is_null: false, _gte: $start, _lte: $end },
      user_book: { user_id: { _eq: $userId } }
    }
  ) {
    id
    user_book_id
    finished_at
  }
}";

/// Reduce the activity feed to the authoritative goal set: goal events
/// only, tolerant-decoded, one survivor per goal id. The snapshot with
/// the latest parseable creation timestamp wins, regardless of feed
/// order.
/// Unparsable timestamps sort earliest-possible but are never dropped.
pub fn latest_goal_snapshots(activities: &[GoalActivity]) -> Vec<ReadingGoal> {
    let mut latest: HashMap<i64, (ReadingGoal, chrono::DateTime<chrono::Utc>)> = HashMap::new();

    for activity in activities {
        if activity.event != "GoalActivity" {
            continue;
        }
        let Some(goal_value) = activity.data.as_ref().and_then(|d| d.get("goal")) else {
            continue;
        };
        let goal = match ReadingGoal::from_value(goal_value) {
            Ok(goal) => goal,
            Err(e) => {
                tracing::debug!(error = %e, "skipping undecodable goal snapshot");
                continue;
            }
        };
        let created_at = parse_timestamp_or_min(activity.created_at.as_deref().unwrap_or(""));

        match latest.get(&goal.id) {
            Some((_, existing)) if created_at <= *existing => {}
            _ => {
                latest.insert(goal.id, (goal, created_at));
            }
        }
    }

    let mut goals: Vec<ReadingGoal> = latest.into_values().map(|(goal, _)| goal).collect();
    goals.sort_by(|a, b| (&b.end_date, b.id).cmp(&(&a.end_date, a.id)));
    goals
}

impl HardcoverClient {
    /// The user's reading goals, deduplicated to the latest snapshot per
    /// goal and, for book-metric goals, self-healed against the actual
    /// finished-read count. Healing never lowers a counter and never
    /// fails the call: if a count can't be fetched, the unhealed goal is
    /// returned as-is.
    pub async fn fetch_reading_goals(&self) -> Vec<ReadingGoal> {
        if !self.ensure_authenticated() {
            return Vec::new();
        }
        let Some(user_id) = self.fetch_user_id().await else {
            return Vec::new();
        };

        let data = match self
            .graphql
            .execute_as::<ActivitiesData>(ACTIVITIES_QUERY, json!({"userId": user_id}))
            .await
        {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, "goal activities query failed");
                return Vec::new();
            }
        };

        let activities = data.activities.unwrap_or_default();
        tracing::debug!(count = activities.len(), "fetched goal activities");
        let goals = latest_goal_snapshots(&activities);

        if !self.settings.self_heal_goals {
            return goals;
        }

        let mut healed = Vec::with_capacity(goals.len());
        for goal in goals {
            if !goal.is_book_metric() {
                healed.push(goal);
                continue;
            }
            match self
                .count_finished_reads(user_id, &goal.start_date, &goal.end_date)
                .await
            {
                Some(count) if count > goal.progress => {
                    tracing::info!(
                        goal_id = goal.id,
                        snapshot = goal.progress,
                        counted = count,
                        "goal progress healed from finished-read count"
                    );
                    healed.push(goal.healed(count));
                }
                Some(_) => healed.push(goal),
                // Healing must not fail the call.
                None => healed.push(goal),
            }
        }
        healed
    }

    /// Authoritative finished count inside a goal window. With
    /// `count_rereads` every finished read row counts, so a reread is a
    /// separate completion; otherwise distinct user-books count once.
    async fn count_finished_reads(
        &self,
        user_id: i64,
        start_date: &str,
        end_date: &str,
    ) -> Option<i64> {
        #[derive(Deserialize)]
        struct Read {
            user_book_id: Option<i64>,
        }
        #[derive(Deserialize)]
        struct ReadsData {
            user_book_reads: Option<Vec<Read>>,
        }

        let data = match self
            .graphql
            .execute_as::<ReadsData>(
                FINISHED_READS_QUERY,
                json!({"userId": user_id, "start": start_date, "end": end_date}),
            )
            .await
        {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, "finished-reads count failed");
                return None;
            }
        };

        let reads = data.user_book_reads.unwrap_or_default();
        if self.settings.count_rereads {
            Some(reads.len() as i64)
        } else {
            let unique: std::collections::HashSet<i64> =
                reads.iter().filter_map(|r| r.user_book_id).collect();
            Some(unique.len() as i64)
        }
    }
}
