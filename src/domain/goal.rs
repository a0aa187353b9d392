use std::collections::BTreeMap;

use serde_json::Value;

use crate::app::Result;
use crate::graphql::decode::FieldReader;

/// A reading goal as snapshotted inside a goal-activity event.
///
/// The activity feed embeds these with no stable shape: key spelling and
/// value types vary between snapshots, so decoding goes through
/// [`FieldReader`] instead of serde derive.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingGoal {
    pub id: i64,
    /// Target magnitude, e.g. 52 books.
    pub goal: i64,
    /// `"book"` or `"page"`; compared case-insensitively.
    pub metric: String,
    pub start_date: String,
    pub end_date: String,
    pub progress: i64,
    pub conditions: Option<BTreeMap<String, String>>,
    pub description: Option<String>,
    /// Always in [0, 1]; derived from `progress / goal` when the server
    /// omits it.
    pub percent_complete: f64,
    pub privacy_setting_id: i64,
}

impl ReadingGoal {
    pub fn from_value(value: &Value) -> Result<Self> {
        let reader = FieldReader::new(value)?;

        let id = reader.int("id", &["id"])?;
        let goal = reader.int("goal", &["goal"])?;
        let metric = reader.string("metric", &["metric"])?;
        let start_date = reader.string("startDate", &["startDate", "start_date"])?;
        let end_date = reader.string("endDate", &["endDate", "end_date"])?;
        let progress = reader.int_or("progress", &["progress"], 0);
        let description = reader.opt_string(&["description", "name", "title"]);
        let conditions = reader.string_map(&["conditions"]);
        let privacy_setting_id =
            reader.int_or("privacySettingId", &["privacySettingId", "privacy_setting_id"], 1);

        let percent_complete = match reader
            .float("percentComplete", &["percentComplete", "percent_complete"])
        {
            Ok(p) => p.clamp(0.0, 1.0),
            Err(_) => derived_percent(progress, goal),
        };

        Ok(Self {
            id,
            goal,
            metric,
            start_date,
            end_date,
            progress,
            conditions,
            description,
            percent_complete,
            privacy_setting_id,
        })
    }

    pub fn is_book_metric(&self) -> bool {
        self.metric.eq_ignore_ascii_case("book")
    }

    /// Copy with the progress counter replaced by an independently
    /// computed finished count. Healing never lowers progress; when the
    /// count doesn't exceed the snapshot, the snapshot wins unchanged.
    pub fn healed(&self, authoritative_count: i64) -> Self {
        if authoritative_count <= self.progress {
            return self.clone();
        }
        let mut healed = self.clone();
        healed.progress = authoritative_count;
        healed.percent_complete = derived_percent(authoritative_count, self.goal);
        healed
    }
}

fn derived_percent(progress: i64, goal: i64) -> f64 {
    (progress as f64 / goal.max(1) as f64).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn goal_value() -> Value {
        json!({
            "id": 7,
            "goal": 20,
            "metric": "book",
            "start_date": "2025-01-01",
            "end_date": "2025-12-31",
            "progress": 10,
            "percentComplete": 0.5,
            "privacy_setting_id": 1
        })
    }

    #[test]
    fn test_decode_mixed_conventions() {
        // Snake-case percent as a string, numeric start date: both coerce.
        let value = json!({
            "id": "7",
            "goal": 20,
            "metric": "book",
            "start_date": 5,
            "endDate": "2025-12-31",
            "progress": 10,
            "percent_complete": "0.5"
        });
        let goal = ReadingGoal::from_value(&value).unwrap();
        assert_eq!(goal.id, 7);
        assert_eq!(goal.start_date, "5");
        assert_eq!(goal.percent_complete, 0.5);
        assert_eq!(goal.privacy_setting_id, 1);
    }

    #[test]
    fn test_percent_derived_when_absent() {
        let mut value = goal_value();
        value.as_object_mut().unwrap().remove("percentComplete");
        let goal = ReadingGoal::from_value(&value).unwrap();
        assert_eq!(goal.percent_complete, 0.5);
    }

    #[test]
    fn test_percent_clamped() {
        let mut value = goal_value();
        value["percentComplete"] = json!(1.7);
        assert_eq!(ReadingGoal::from_value(&value).unwrap().percent_complete, 1.0);

        let mut value = goal_value();
        value.as_object_mut().unwrap().remove("percentComplete");
        value["progress"] = json!(50);
        assert_eq!(ReadingGoal::from_value(&value).unwrap().percent_complete, 1.0);
    }

    #[test]
    fn test_zero_goal_does_not_divide_by_zero() {
        let mut value = goal_value();
        value["goal"] = json!(0);
        value.as_object_mut().unwrap().remove("percentComplete");
        let goal = ReadingGoal::from_value(&value).unwrap();
        assert_eq!(goal.percent_complete, 1.0);
    }

    #[test]
    fn test_missing_metric_is_an_error() {
        let mut value = goal_value();
        value.as_object_mut().unwrap().remove("metric");
        let err = ReadingGoal::from_value(&value).unwrap_err();
        assert!(err.to_string().contains("metric"));
    }

    #[test]
    fn test_description_aliases() {
        let mut value = goal_value();
        value["name"] = json!("52 in 2025");
        let goal = ReadingGoal::from_value(&value).unwrap();
        assert_eq!(goal.description.as_deref(), Some("52 in 2025"));
    }

    #[test]
    fn test_healed_raises_progress_and_percent() {
        let goal = ReadingGoal::from_value(&goal_value()).unwrap();
        let healed = goal.healed(15);
        assert_eq!(healed.progress, 15);
        assert_eq!(healed.percent_complete, 0.75);
        // Everything else untouched.
        assert_eq!(healed.id, goal.id);
        assert_eq!(healed.start_date, goal.start_date);
        assert_eq!(healed.end_date, goal.end_date);
    }

    #[test]
    fn test_healed_never_lowers_progress() {
        let goal = ReadingGoal::from_value(&goal_value()).unwrap();
        for count in [0, 5, 10] {
            let healed = goal.healed(count);
            assert_eq!(healed, goal);
        }
    }

    #[test]
    fn test_book_metric_case_insensitive() {
        let mut value = goal_value();
        value["metric"] = json!("Book");
        assert!(ReadingGoal::from_value(&value).unwrap().is_book_metric());
        value["metric"] = json!("page");
        assert!(!ReadingGoal::from_value(&value).unwrap().is_book_metric());
    }
}
