// 🏠 Household membership
//
// Creating a household makes the creator its owner. Others join through a
// single-use invitation code that expires after a week.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::{PlannerError, Result};
use crate::models::household::hash_code;
use crate::models::{Household, HouseholdMember, Invitation, MemberRole};
use crate::store::{Event, GroceryStore, SqliteStore};

pub fn create_household(
    store: &SqliteStore,
    name: &str,
    owner_user_id: &str,
    owner_name: &str,
) -> Result<Household> {
    if name.trim().is_empty() {
        return Err(PlannerError::invalid("household name", "name is empty"));
    }

    let household = Household::new(name);
    let owner = HouseholdMember {
        household_id: household.id.clone(),
        user_id: owner_user_id.to_string(),
        display_name: owner_name.to_string(),
        role: MemberRole::Owner,
        joined_at: household.created_at,
    };
    store.insert_household(&household, &owner)?;

    info!(household_id = %household.id, name = %household.name, "created household");
    Ok(household)
}

/// Issue an invitation. The returned code is the only copy of it.
pub fn invite(
    store: &SqliteStore,
    household_id: &str,
    email: &str,
    now: DateTime<Utc>,
) -> Result<(Invitation, String)> {
    if !email.contains('@') {
        return Err(PlannerError::invalid("email", format!("'{email}' is not an address")));
    }
    store.get_household(household_id)?;

    let (invitation, code) = Invitation::issue(household_id, email, now);
    store.insert_invitation(&invitation)?;

    info!(household_id, invitation_id = %invitation.id, "issued invitation");
    Ok((invitation, code))
}

pub fn accept_invitation(
    store: &SqliteStore,
    code: &str,
    user_id: &str,
    display_name: &str,
    now: DateTime<Utc>,
) -> Result<HouseholdMember> {
    let invitation = store
        .find_invitation_by_hash(&hash_code(code))?
        .ok_or_else(|| PlannerError::not_found("invitation", "code"))?;

    if invitation.is_accepted() {
        return Err(PlannerError::invalid("invitation", "already accepted"));
    }
    if invitation.is_expired(now) {
        return Err(PlannerError::invalid("invitation", "expired"));
    }

    let members = store.household_members(&invitation.household_id)?;
    if members.iter().any(|m| m.user_id == user_id) {
        return Err(PlannerError::invalid("invitation", "already a member of this household"));
    }

    let member = HouseholdMember {
        household_id: invitation.household_id.clone(),
        user_id: user_id.to_string(),
        display_name: display_name.to_string(),
        role: MemberRole::Member,
        joined_at: now,
    };
    store.accept_invitation(&invitation.id, &member, now)?;

    let event = Event::new(
        "member_joined",
        "household",
        &invitation.household_id,
        serde_json::json!({"user_id": user_id, "invitation_id": invitation.id}),
        user_id,
    );
    // member is committed by now; event failures are only logged
    if let Err(e) = store.record_event(&event) {
        warn!(household_id = %member.household_id, user_id, error = %e, "failed to record event");
    }

    info!(household_id = %member.household_id, user_id, "member joined household");
    Ok(member)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::household::INVITATION_TTL_DAYS;
    use chrono::Duration;

    fn setup() -> (SqliteStore, Household) {
        let store = SqliteStore::open_in_memory().unwrap();
        let household = create_household(&store, "Maple Street", "alex", "Alex").unwrap();
        (store, household)
    }

    #[test]
    fn test_creator_is_owner() {
        let (store, household) = setup();
        let members = store.household_members(&household.id).unwrap();

        assert_eq!(members.len(), 1);
        assert_eq!(members[0].user_id, "alex");
        assert_eq!(members[0].role, MemberRole::Owner);
    }

    #[test]
    fn test_invite_and_accept() {
        let (store, household) = setup();
        let now = Utc::now();

        let (_, code) = invite(&store, &household.id, "jo@example.com", now).unwrap();
        let member = accept_invitation(&store, &code.to_lowercase(), "jo", "Jo", now).unwrap();

        assert_eq!(member.role, MemberRole::Member);
        assert_eq!(store.household_members(&household.id).unwrap().len(), 2);

        let events = store.events_for_entity("household", &household.id).unwrap();
        assert_eq!(events[0].event_type, "member_joined");
    }

    #[test]
    fn test_code_is_single_use() {
        let (store, household) = setup();
        let now = Utc::now();
        let (_, code) = invite(&store, &household.id, "jo@example.com", now).unwrap();

        accept_invitation(&store, &code, "jo", "Jo", now).unwrap();
        let again = accept_invitation(&store, &code, "sam", "Sam", now);
        assert!(matches!(again, Err(PlannerError::Invalid { .. })));
    }

    #[test]
    fn test_expired_code_is_rejected() {
        let (store, household) = setup();
        let now = Utc::now();
        let (_, code) = invite(&store, &household.id, "jo@example.com", now).unwrap();

        let later = now + Duration::days(INVITATION_TTL_DAYS + 1);
        let result = accept_invitation(&store, &code, "jo", "Jo", later);
        assert!(matches!(result, Err(PlannerError::Invalid { .. })));
        assert_eq!(store.household_members(&household.id).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_code_and_bad_email() {
        let (store, household) = setup();
        assert!(matches!(
            accept_invitation(&store, "NOPE0000", "jo", "Jo", Utc::now()),
            Err(PlannerError::NotFound { .. })
        ));
        assert!(invite(&store, &household.id, "not-an-email", Utc::now()).is_err());
        assert!(matches!(
            invite(&store, "missing", "a@b.c", Utc::now()),
            Err(PlannerError::NotFound { .. })
        ));
    }

    #[test]
    fn test_existing_member_cannot_accept() {
        let (store, household) = setup();
        let (_, code) = invite(&store, &household.id, "alex@example.com", Utc::now()).unwrap();
        assert!(accept_invitation(&store, &code, "alex", "Alex", Utc::now()).is_err());
    }

    #[test]
    fn test_accept_succeeds_when_event_write_fails() {
        let (store, household) = setup();
        let now = Utc::now();
        let (_, code) = invite(&store, &household.id, "jo@example.com", now).unwrap();

        store.connection().execute_batch("DROP TABLE events").unwrap();

        let member = accept_invitation(&store, &code, "jo", "Jo", now).unwrap();
        assert_eq!(member.user_id, "jo");
        assert_eq!(store.household_members(&household.id).unwrap().len(), 2);
    }
}
