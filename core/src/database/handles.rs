use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{error, info};

use super::DriverError;

/// Engine and session factory owned by a manager
///
/// Both are cleared together on close. The factory is only present when the
/// engine is.
pub(crate) struct Handles<E, F> {
    pub(crate) engine: Option<E>,
    pub(crate) sessionmaker: Option<F>,
}

impl<E: fmt::Display, F> Handles<E, F> {
    /// Run driver setup, logging instead of failing
    pub(crate) fn open(
        create_engine: impl FnOnce() -> Result<E, DriverError>,
        create_sessionmaker: impl FnOnce(&E) -> Result<F, DriverError>,
    ) -> Self {
        let engine = match create_engine() {
            Ok(engine) => engine,
            Err(err) => {
                error!(error = %format_args!("{:#}", err), "Engine setup failed");
                return Self::empty();
            }
        };

        let sessionmaker = match create_sessionmaker(&engine) {
            Ok(factory) => {
                info!(engine = %engine, "Engine setup correctly");
                Some(factory)
            }
            Err(err) => {
                error!(
                    engine = %engine,
                    error = %format_args!("{:#}", err),
                    "Sessionmaker setup failed, engine has no sessionmaker"
                );
                None
            }
        };

        Self {
            engine: Some(engine),
            sessionmaker,
        }
    }

    fn empty() -> Self {
        Self {
            engine: None,
            sessionmaker: None,
        }
    }
}

/// Lock shared by both manager flavours
///
/// Never held across an await point. A poisoned lock is recovered since the
/// handles are replaced atomically and cannot be left half-written.
pub(crate) struct HandleCell<E, F>(RwLock<Handles<E, F>>);

impl<E, F> HandleCell<E, F> {
    pub(crate) fn new(handles: Handles<E, F>) -> Self {
        Self(RwLock::new(handles))
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Handles<E, F>> {
        self.0.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Handles<E, F>> {
        self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<E: Clone, F: Clone> HandleCell<E, F> {
    pub(crate) fn engine(&self) -> Option<E> {
        self.read().engine.clone()
    }

    pub(crate) fn sessionmaker(&self) -> Option<F> {
        self.read().sessionmaker.clone()
    }

    /// Take both handles, leaving the manager closed
    pub(crate) fn take_engine(&self) -> Option<E> {
        let mut handles = self.write();
        let engine = handles.engine.take()?;
        handles.sessionmaker = None;
        Some(engine)
    }
}

impl<E: fmt::Display, F> HandleCell<E, F> {
    /// Engine representation for log context, `None` once closed
    pub(crate) fn engine_label(&self) -> String {
        self.read()
            .engine
            .as_ref()
            .map_or_else(|| String::from("None"), ToString::to_string)
    }
}
