//! Lifecycle tests for the async session manager

use anyhow::anyhow;
use std::error::Error;
use std::time::Duration;

use super::mocks::{test_params, Call, Faults, MockAsyncDriver};
use crate::database::{AsyncDatabaseManager, AsyncSessionManager, BaseSessionManager};
use crate::errors::messages;

fn open_manager() -> (AsyncDatabaseManager<MockAsyncDriver>, MockAsyncDriver) {
    let driver = MockAsyncDriver::default();
    (AsyncDatabaseManager::new(test_params(), &driver), driver)
}

fn cause_of(err: &crate::errors::ServiceError) -> String {
    err.source().map(ToString::to_string).unwrap_or_default()
}

#[tokio::test]
async fn test_new_does_not_touch_database() {
    let (manager, driver) = open_manager();

    assert!(manager.is_open());
    assert!(manager.sessionmaker().is_some());
    assert_eq!(manager.create_url(), test_params().create_url());
    assert!(driver.log().calls().is_empty());
}

#[tokio::test]
async fn test_connect_commits_on_success() {
    let (manager, driver) = open_manager();

    let rows = manager
        .connect(|conn| Box::pin(async move { conn.execute("SELECT 1") }))
        .await
        .unwrap();

    assert_eq!(rows, 1);
    assert_eq!(
        driver.log().calls(),
        vec![Call::Begin, Call::Execute, Call::Commit]
    );
}

#[tokio::test]
async fn test_connect_rolls_back_on_failure() {
    let (manager, driver) = open_manager();

    let err = manager
        .connect(|conn| Box::pin(async move { conn.execute("DELETE FAIL") }))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), messages::CONNECTION_FAILED);
    assert!(cause_of(&err).contains("DELETE FAIL"));
    assert_eq!(
        driver.log().calls(),
        vec![Call::Begin, Call::Execute, Call::ConnectionRollback]
    );
}

#[tokio::test]
async fn test_connect_without_engine_fails() {
    let driver = MockAsyncDriver::with_faults(Faults {
        engine: true,
        ..Faults::default()
    });
    let manager = AsyncDatabaseManager::new(test_params(), &driver);

    let err = manager
        .connect(|conn| Box::pin(async move { conn.execute("SELECT 1") }))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), messages::ENGINE_NOT_INITIALIZED);
    assert!(err.is_lifecycle());
}

#[tokio::test]
async fn test_session_rolls_back_then_closes_on_failure() {
    let (manager, driver) = open_manager();

    let err = manager
        .session(|_session| Box::pin(async move { Err::<(), _>(anyhow!("constraint violated")) }))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), messages::SESSION_FAILED);
    assert_eq!(cause_of(&err), "constraint violated");
    assert_eq!(
        driver.log().calls(),
        vec![Call::SessionCreated, Call::SessionRollback, Call::SessionClose]
    );
}

#[tokio::test]
async fn test_session_without_sessionmaker_creates_nothing() {
    let driver = MockAsyncDriver::with_faults(Faults {
        sessionmaker: true,
        ..Faults::default()
    });
    let manager = AsyncDatabaseManager::new(test_params(), &driver);

    let err = manager
        .session(|session| Box::pin(async move { session.execute("SELECT 1") }))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), messages::SESSIONMAKER_NOT_INITIALIZED);
    assert_eq!(driver.log().count(Call::SessionCreated), 0);
}

#[tokio::test]
async fn test_concurrent_sessions_are_independent() {
    let (manager, driver) = open_manager();

    let scopes = (0..4).map(|_| {
        manager.session(|session| {
            Box::pin(async move {
                tokio::task::yield_now().await;
                session.execute("SELECT 1")
            })
        })
    });
    let results = futures_util::future::join_all(scopes).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(driver.log().count(Call::SessionCreated), 4);
    assert_eq!(driver.log().count(Call::SessionClose), 4);
}

#[tokio::test]
async fn test_cancelled_session_is_released() {
    let (manager, driver) = open_manager();

    let scope = manager.session(|_session| {
        Box::pin(async move {
            futures_util::future::pending::<()>().await;
            Ok(())
        })
    });
    let timed_out = tokio::time::timeout(Duration::from_millis(20), scope).await;

    assert!(timed_out.is_err());
    assert_eq!(
        driver.log().calls(),
        vec![Call::SessionCreated, Call::SessionDropped]
    );
}

#[tokio::test]
async fn test_cancelled_connection_is_released() {
    let (manager, driver) = open_manager();

    let scope = manager.connect(|_conn| {
        Box::pin(async move {
            futures_util::future::pending::<()>().await;
            Ok(())
        })
    });
    let timed_out = tokio::time::timeout(Duration::from_millis(20), scope).await;

    assert!(timed_out.is_err());
    assert_eq!(
        driver.log().calls(),
        vec![Call::Begin, Call::ConnectionDropped]
    );
}

#[tokio::test]
async fn test_close_twice_fails() {
    let (manager, driver) = open_manager();

    manager.close().await.unwrap();
    let err = manager.close().await.unwrap_err();

    assert_eq!(err.to_string(), messages::ENGINE_NOT_INITIALIZED);
    assert!(manager.engine().is_none());
    assert_eq!(driver.log().count(Call::Dispose), 1);
}

#[tokio::test]
async fn test_dispose_failure_still_closes() {
    let driver = MockAsyncDriver::with_faults(Faults {
        dispose: true,
        ..Faults::default()
    });
    let manager = AsyncDatabaseManager::new(test_params(), &driver);

    let err = manager.close().await.unwrap_err();

    assert_eq!(err.to_string(), messages::CLOSE_FAILED);
    assert!(!manager.is_open());

    let err = manager
        .session(|session| Box::pin(async move { session.execute("SELECT 1") }))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), messages::SESSIONMAKER_NOT_INITIALIZED);
}
