//! Integration tests for `DieselSessionRepository` against embedded PostgreSQL.

use std::sync::Arc;

use chrono::{TimeDelta, TimeZone, Utc};
use rstest::{fixture, rstest};
use snippetbox::domain::ports::SessionRepository;
use snippetbox::outbound::persistence::DieselSessionRepository;
use snippetbox::test_support::MutableClock;

#[path = "support/pg_embed.rs"]
mod pg_embed;

use pg_embed::{Database, handle_cluster_setup_failure};

struct TestContext {
    db: Database,
    clock: Arc<MutableClock>,
    repository: DieselSessionRepository,
}

fn setup_context() -> Result<TestContext, String> {
    let db = pg_embed::database()?;
    let start = Utc
        .with_ymd_and_hms(2026, 3, 17, 10, 15, 0)
        .single()
        .ok_or("invalid start time")?;
    let clock = Arc::new(MutableClock::new(start));
    let repository = DieselSessionRepository::new(db.pool.clone(), clock.clone());
    Ok(TestContext {
        db,
        clock,
        repository,
    })
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

#[rstest]
fn sessions_are_stored_updated_and_deleted(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: sessions_are_stored_updated_and_deleted skipped");
        return;
    };
    let repository = &context.repository;
    let runtime = &context.db.runtime;

    runtime
        .block_on(repository.insert("tok", "{}", TimeDelta::hours(1)))
        .expect("insert");
    assert_eq!(
        runtime.block_on(repository.find("tok")),
        Ok(Some("{}".to_owned()))
    );

    assert_eq!(
        runtime.block_on(repository.update("tok", r#"{"flash":"\"hi\""}"#, TimeDelta::hours(1))),
        Ok(true)
    );
    assert_eq!(
        runtime.block_on(repository.find("tok")),
        Ok(Some(r#"{"flash":"\"hi\""}"#.to_owned()))
    );

    runtime
        .block_on(repository.delete("tok"))
        .expect("delete");
    assert_eq!(runtime.block_on(repository.find("tok")), Ok(None));
    assert_eq!(
        runtime.block_on(repository.update("tok", "{}", TimeDelta::hours(1))),
        Ok(false)
    );
}

#[rstest]
fn expiry_hides_sessions_until_touched_or_purged(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: expiry_hides_sessions_until_touched_or_purged skipped");
        return;
    };
    let repository = &context.repository;
    let runtime = &context.db.runtime;

    runtime.block_on(async {
        repository
            .insert("short", "{}", TimeDelta::minutes(5))
            .await
            .expect("insert short");
        repository
            .insert("kept", "{}", TimeDelta::minutes(5))
            .await
            .expect("insert kept");
    });

    context.clock.advance(TimeDelta::minutes(4));
    runtime
        .block_on(repository.touch("kept", TimeDelta::minutes(5)))
        .expect("touch");
    context.clock.advance(TimeDelta::minutes(2));

    assert_eq!(runtime.block_on(repository.find("short")), Ok(None));
    assert!(matches!(runtime.block_on(repository.find("kept")), Ok(Some(_))));
    assert_eq!(runtime.block_on(repository.delete_expired()), Ok(1));
    assert!(matches!(runtime.block_on(repository.find("kept")), Ok(Some(_))));
}
