// ✅ Household Tasks
//
// Chores shared by the household. A task is open until completed_at is set.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdTask {
    pub id: String,
    pub household_id: String,
    pub title: String,

    /// user_id of the member responsible, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl HouseholdTask {
    pub fn new(household_id: &str, title: &str, assigned_to: Option<&str>, due_date: Option<NaiveDate>) -> Self {
        HouseholdTask {
            id: uuid::Uuid::new_v4().to_string(),
            household_id: household_id.to_string(),
            title: title.trim().to_string(),
            assigned_to: assigned_to.map(str::trim).filter(|a| !a.is_empty()).map(str::to_string),
            due_date,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.is_empty() {
            return Err(PlannerError::invalid("title", "task title is empty"));
        }
        Ok(())
    }
}

/// Task as submitted by a client
#[derive(Debug, Clone, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl TaskDraft {
    pub fn into_task(self, household_id: &str) -> Result<HouseholdTask> {
        let task = HouseholdTask::new(household_id, &self.title, self.assigned_to.as_deref(), self.due_date);
        task.validate()?;
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_is_open_and_trimmed() {
        let task = HouseholdTask::new("house", "  Take out bins ", Some(" "), None);
        assert_eq!(task.title, "Take out bins");
        assert_eq!(task.assigned_to, None);
        assert!(!task.is_done());
    }

    #[test]
    fn test_draft_requires_title() {
        let draft: TaskDraft = serde_json::from_str(r#"{"title": "   ", "due_date": "2025-03-07"}"#).unwrap();
        assert!(matches!(draft.into_task("house"), Err(PlannerError::Invalid { field: "title", .. })));
    }
}
