//! # Meal Plans
//!
//! A household proposes meals for upcoming events and votes on them.
//!
//! ```text
//! MealPlan (awaiting_votes ──finalize──► finalized)
//!  └── MealPlanEvent (dinner, Tue 18:00-20:00)
//!       └── MealPlanOption (Meal × scale)
//!            └── MealPlanOptionVote (rank, by user)
//! ```
//!
//! Once finalized, a plan is followed up with a grocery list and prep tasks
//! (see [`grocery_lists`](super::grocery_lists) and
//! [`meal_plan_tasks`](super::meal_plan_tasks)); the two flags on
//! [`MealPlan`] record whether that has happened.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::meals::Meal;

string_enum! {
    MealPlanStatus as "meal plan status" {
        AwaitingVotes => "awaiting_votes",
        Finalized => "finalized",
    }
}

string_enum! {
    MealName as "meal name" {
        Breakfast => "breakfast",
        SecondBreakfast => "second_breakfast",
        Brunch => "brunch",
        Lunch => "lunch",
        Supper => "supper",
        Dinner => "dinner",
    }
}

string_enum! {
    ValidElectionMethod as "election method" {
        Schulze => "schulze",
        InstantRunoff => "instant-runoff",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: String,
    pub notes: String,
    pub status: MealPlanStatus,
    pub voting_deadline: DateTime<Utc>,
    pub election_method: ValidElectionMethod,
    pub belongs_to_household: String,
    pub created_by_user: String,
    pub grocery_list_initialized: bool,
    pub tasks_created: bool,
    pub events: Vec<MealPlanEvent>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanDatabaseCreationInput {
    pub notes: String,
    pub voting_deadline: DateTime<Utc>,
    pub election_method: ValidElectionMethod,
    pub belongs_to_household: String,
    pub created_by_user: String,
    pub events: Vec<MealPlanEventDatabaseCreationInput>,
}

impl MealPlanDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.belongs_to_household.is_empty() {
            return Err(ValidationError::required("belongs_to_household"));
        }
        for event in &self.events {
            event.validate()?;
        }
        Ok(())
    }
}

// =============================================================================
// Events
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanEvent {
    pub id: String,
    pub notes: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub meal_name: MealName,
    pub belongs_to_meal_plan: String,
    pub options: Vec<MealPlanOption>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanEventDatabaseCreationInput {
    pub notes: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub meal_name: MealName,
    pub belongs_to_meal_plan: String,
    pub options: Vec<MealPlanOptionDatabaseCreationInput>,
}

impl MealPlanEventDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ends_at < self.starts_at {
            return Err(ValidationError::InvertedRange {
                field: "event window".to_string(),
                min: self.starts_at.timestamp() as f64,
                max: self.ends_at.timestamp() as f64,
            });
        }
        for option in &self.options {
            option.validate()?;
        }
        Ok(())
    }
}

// =============================================================================
// Options
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealPlanOption {
    pub id: String,
    /// The meal without its components.
    pub meal: Meal,
    pub notes: String,
    pub meal_scale: f32,
    pub chosen: bool,
    pub tiebroken: bool,
    pub assigned_cook: Option<String>,
    pub assigned_dishwasher: Option<String>,
    pub belongs_to_meal_plan_event: String,
    pub votes: Vec<MealPlanOptionVote>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanOptionDatabaseCreationInput {
    pub meal_id: String,
    pub notes: String,
    pub meal_scale: f32,
    pub assigned_cook: Option<String>,
    pub assigned_dishwasher: Option<String>,
    pub belongs_to_meal_plan_event: String,
}

impl MealPlanOptionDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.meal_id.is_empty() {
            return Err(ValidationError::required("meal_id"));
        }
        if self.meal_scale <= 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "meal_scale".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Votes
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanOptionVote {
    pub id: String,
    pub rank: u8,
    pub abstain: bool,
    pub notes: String,
    pub by_user: String,
    pub belongs_to_meal_plan_option: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealPlanOptionVoteCreationInput {
    pub rank: u8,
    pub abstain: bool,
    pub notes: String,
    pub belongs_to_meal_plan_option: String,
}

/// A user's ballot for one event: one vote per option.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealPlanOptionVotesDatabaseCreationInput {
    pub by_user: String,
    pub votes: Vec<MealPlanOptionVoteCreationInput>,
}

// =============================================================================
// Finalization
// =============================================================================

/// The option an election picked for one event.
///
/// Tallying happens outside the store; finalization only records results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealPlanOptionWinner {
    pub meal_plan_event_id: String,
    pub meal_plan_option_id: String,
    /// Set when the election ended in a tie and a winner was drawn.
    pub tiebroken: bool,
}

impl MealPlan {
    /// Votes cast by `user_id` across every option of every event.
    pub fn votes_by(&self, user_id: &str) -> impl Iterator<Item = &MealPlanOptionVote> + '_ {
        let user_id = user_id.to_string();
        self.events
            .iter()
            .flat_map(|event| event.options.iter())
            .flat_map(|option| option.votes.iter())
            .filter(move |vote| vote.by_user == user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_event_window_must_be_ordered() {
        let starts_at = Utc::now();
        let event = MealPlanEventDatabaseCreationInput {
            notes: String::new(),
            starts_at,
            ends_at: starts_at - Duration::hours(1),
            meal_name: MealName::Dinner,
            belongs_to_meal_plan: "plan".to_string(),
            options: vec![],
        };
        assert!(event.validate().is_err());
    }

    #[test]
    fn test_votes_by_spans_every_event() {
        let now = Utc::now();
        let vote = |id: &str, by_user: &str| MealPlanOptionVote {
            id: id.to_string(),
            rank: 0,
            abstain: false,
            notes: String::new(),
            by_user: by_user.to_string(),
            belongs_to_meal_plan_option: "option".to_string(),
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        };
        let option = |votes: Vec<MealPlanOptionVote>| MealPlanOption {
            id: "option".to_string(),
            meal: Meal::default(),
            notes: String::new(),
            meal_scale: 1.0,
            chosen: false,
            tiebroken: false,
            assigned_cook: None,
            assigned_dishwasher: None,
            belongs_to_meal_plan_event: "event".to_string(),
            votes,
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        };
        let event = |options: Vec<MealPlanOption>| MealPlanEvent {
            id: "event".to_string(),
            notes: String::new(),
            starts_at: now,
            ends_at: now,
            meal_name: MealName::Dinner,
            belongs_to_meal_plan: "plan".to_string(),
            options,
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        };
        let plan = MealPlan {
            id: "plan".to_string(),
            notes: String::new(),
            status: MealPlanStatus::AwaitingVotes,
            voting_deadline: now,
            election_method: ValidElectionMethod::Schulze,
            belongs_to_household: "household".to_string(),
            created_by_user: "alice".to_string(),
            grocery_list_initialized: false,
            tasks_created: false,
            events: vec![
                event(vec![option(vec![vote("1", "alice"), vote("2", "bob")])]),
                event(vec![option(vec![vote("3", "alice")])]),
            ],
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        };

        let ids: Vec<&str> = plan.votes_by("alice").map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(plan.votes_by("carol").count(), 0);
    }

    #[test]
    fn test_election_method_names() {
        assert_eq!(ValidElectionMethod::InstantRunoff.as_str(), "instant-runoff");
        assert_eq!(
            "second_breakfast".parse::<MealName>().unwrap(),
            MealName::SecondBreakfast
        );
    }
}
