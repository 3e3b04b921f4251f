use axum::extract::FromRef;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};
use tracing::info;

use crate::{
    auth::services::SessionManager,
    leads::{
        query::LeadQuery,
        repo_types::{LeadSource, LeadStatus, NewLead},
        services::LeadService,
    },
    state::AppState,
    validation::normalize_email,
};

pub const DEMO_EMAIL: &str = "test@example.com";
pub const DEMO_PASSWORD: &str = "password123";
const LEAD_COUNT: i64 = 50;
const STATES: [&str; 10] = ["CA", "NY", "TX", "FL", "IL", "OH", "GA", "NC", "MI", "WA"];

/// Demo lead `i`; deterministic so repeated seeds look the same.
fn demo_lead(i: i64, now: OffsetDateTime) -> NewLead {
    let idx = i as usize;
    NewLead {
        first_name: format!("First{i}"),
        last_name: format!("Last{i}"),
        email: format!("lead{i}@example.com"),
        phone: Some(format!("555-{}-{}", 100 + i, 1000 + i)),
        company: Some(format!("Company {i}")),
        city: Some(format!("City {}", i % 10)),
        state: Some(STATES[idx % STATES.len()].to_string()),
        source: LeadSource::ALL[idx % LeadSource::ALL.len()],
        status: LeadStatus::ALL[idx % LeadStatus::ALL.len()],
        score: Some((i % 101) as i32),
        lead_value: Some(Decimal::new(i * 100 * 100, 2)),
        last_activity_at: Some(now - Duration::days(i)),
        is_qualified: i % 4 == 0,
    }
}

/// Ensures the demo user exists and owns a set of demo leads. Safe to rerun.
pub async fn seed(state: &AppState) -> anyhow::Result<()> {
    info!("starting seed");
    let user = match state.users.find_by_email(&normalize_email(DEMO_EMAIL)).await? {
        Some(user) => {
            info!(email = %user.email, "demo user found");
            user
        }
        None => {
            let session = SessionManager::from_ref(state)
                .register("Test", "User", DEMO_EMAIL, DEMO_PASSWORD)
                .await?;
            info!(email = %session.user.email, "demo user created");
            session.user
        }
    };

    let leads = LeadService::from_ref(state);
    let existing = leads.list_query(user.id, &LeadQuery::default()).await?;
    if existing.total > 0 {
        info!(count = existing.total, "leads already exist, skipping seeding");
        return Ok(());
    }

    let now = OffsetDateTime::now_utc();
    for i in 0..LEAD_COUNT {
        leads.insert(user.id, &demo_lead(i, now)).await?;
    }
    info!(count = LEAD_COUNT, "leads seeded");
    Ok(())
}
