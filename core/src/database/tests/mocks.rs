//! Recording driver doubles for the manager tests

use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use wu_shared::config::{ConnectionParameters, DatabaseUrl};

use crate::database::{
    AsyncConnection, AsyncDriver, AsyncEngine, AsyncSession, AsyncSessionFactory, Connection,
    Driver, DriverError, Engine, Session, SessionFactory,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Begin,
    Execute,
    Commit,
    ConnectionRollback,
    ConnectionDropped,
    SessionCreated,
    SessionRollback,
    SessionClose,
    SessionDropped,
    Dispose,
}

/// Shared, ordered record of everything the doubles were asked to do
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls().into_iter().filter(|c| *c == call).count()
    }
}

/// Which driver steps should fail
#[derive(Clone, Copy, Default)]
pub struct Faults {
    pub engine: bool,
    pub sessionmaker: bool,
    pub begin: bool,
    pub commit: bool,
    pub dispose: bool,
    pub session_close: bool,
}

pub fn test_params() -> ConnectionParameters {
    ConnectionParameters::new("postgresql+asyncpg", "user", "pass", "localhost", "testdb", 5432)
}

fn fail_if(flag: bool, what: &str) -> Result<(), DriverError> {
    if flag {
        Err(anyhow!("{} failed", what))
    } else {
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockDriver {
    pub log: CallLog,
    pub faults: Faults,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_faults(faults: Faults) -> Self {
        Self {
            log: CallLog::default(),
            faults,
        }
    }

    fn engine(&self, url: &DatabaseUrl) -> Result<MockEngine, DriverError> {
        fail_if(self.faults.engine, "engine creation")?;
        Ok(MockEngine {
            label: url.to_string(),
            log: self.log.clone(),
            faults: self.faults,
        })
    }

    fn factory(&self, engine: &MockEngine) -> Result<MockSessionFactory, DriverError> {
        fail_if(self.faults.sessionmaker, "sessionmaker creation")?;
        Ok(MockSessionFactory {
            log: engine.log.clone(),
            faults: self.faults,
        })
    }
}

/// Same doubles, exposed through the async contracts
#[derive(Clone, Default)]
pub struct MockAsyncDriver(pub MockDriver);

impl MockAsyncDriver {
    pub fn with_faults(faults: Faults) -> Self {
        Self(MockDriver::with_faults(faults))
    }

    pub fn log(&self) -> &CallLog {
        &self.0.log
    }
}

#[derive(Clone)]
pub struct MockEngine {
    label: String,
    log: CallLog,
    faults: Faults,
}

impl fmt::Display for MockEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Engine({})", self.label)
    }
}

pub struct MockConnection {
    log: CallLog,
    faults: Faults,
    finished: bool,
}

impl MockConnection {
    /// Statements containing `FAIL` are rejected
    pub fn execute(&mut self, sql: &str) -> Result<u64, DriverError> {
        self.log.push(Call::Execute);
        if sql.contains("FAIL") {
            return Err(anyhow!("syntax error near {}", sql));
        }
        Ok(1)
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        if !self.finished {
            self.log.push(Call::ConnectionDropped);
        }
    }
}

#[derive(Clone)]
pub struct MockSessionFactory {
    log: CallLog,
    faults: Faults,
}

pub struct MockSession {
    log: CallLog,
    faults: Faults,
    closed: bool,
}

impl MockSession {
    pub fn execute(&mut self, sql: &str) -> Result<u64, DriverError> {
        self.log.push(Call::Execute);
        if sql.contains("FAIL") {
            return Err(anyhow!("syntax error near {}", sql));
        }
        Ok(1)
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        if !self.closed {
            self.log.push(Call::SessionDropped);
        }
    }
}

impl Driver for MockDriver {
    type Engine = MockEngine;
    type SessionFactory = MockSessionFactory;

    fn create_engine(&self, url: &DatabaseUrl) -> Result<MockEngine, DriverError> {
        self.engine(url)
    }

    fn create_sessionmaker(&self, engine: &MockEngine) -> Result<MockSessionFactory, DriverError> {
        self.factory(engine)
    }
}

impl Engine for MockEngine {
    type Connection = MockConnection;

    fn begin(&self) -> Result<MockConnection, DriverError> {
        fail_if(self.faults.begin, "begin")?;
        self.log.push(Call::Begin);
        Ok(MockConnection {
            log: self.log.clone(),
            faults: self.faults,
            finished: false,
        })
    }

    fn dispose(&self) -> Result<(), DriverError> {
        self.log.push(Call::Dispose);
        fail_if(self.faults.dispose, "dispose")
    }
}

impl Connection for MockConnection {
    fn commit(&mut self) -> Result<(), DriverError> {
        fail_if(self.faults.commit, "commit")?;
        self.log.push(Call::Commit);
        self.finished = true;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.log.push(Call::ConnectionRollback);
        self.finished = true;
        Ok(())
    }
}

impl SessionFactory for MockSessionFactory {
    type Session = MockSession;

    fn create(&self) -> MockSession {
        self.log.push(Call::SessionCreated);
        MockSession {
            log: self.log.clone(),
            faults: self.faults,
            closed: false,
        }
    }
}

impl Session for MockSession {
    fn rollback(&mut self) -> Result<(), DriverError> {
        self.log.push(Call::SessionRollback);
        Ok(())
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.log.push(Call::SessionClose);
        self.closed = true;
        fail_if(self.faults.session_close, "session close")
    }
}

impl AsyncDriver for MockAsyncDriver {
    type Engine = MockEngine;
    type SessionFactory = MockSessionFactory;

    fn create_engine(&self, url: &DatabaseUrl) -> Result<MockEngine, DriverError> {
        self.0.engine(url)
    }

    fn create_sessionmaker(&self, engine: &MockEngine) -> Result<MockSessionFactory, DriverError> {
        self.0.factory(engine)
    }
}

#[async_trait]
impl AsyncEngine for MockEngine {
    type Connection = MockConnection;

    async fn begin(&self) -> Result<MockConnection, DriverError> {
        Engine::begin(self)
    }

    async fn dispose(&self) -> Result<(), DriverError> {
        Engine::dispose(self)
    }
}

#[async_trait]
impl AsyncConnection for MockConnection {
    async fn commit(&mut self) -> Result<(), DriverError> {
        Connection::commit(self)
    }

    async fn rollback(&mut self) -> Result<(), DriverError> {
        Connection::rollback(self)
    }
}

impl AsyncSessionFactory for MockSessionFactory {
    type Session = MockSession;

    fn create(&self) -> MockSession {
        SessionFactory::create(self)
    }
}

#[async_trait]
impl AsyncSession for MockSession {
    async fn rollback(&mut self) -> Result<(), DriverError> {
        Session::rollback(self)
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        Session::close(self)
    }
}
