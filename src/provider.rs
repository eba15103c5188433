use std::panic::{resume_unwind, AssertUnwindSafe};

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::Instrument;

use crate::error::{Error, Result};
use crate::session::{Connector, Session};

/// Owns at most one live session for the scope of one scenario.
pub struct SessionProvider {
    connector: Box<dyn Connector>,
    active: Option<Box<dyn Session>>,
}

impl SessionProvider {
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Return the active session, connecting first if there is none.
    pub async fn acquire(&mut self) -> Result<&dyn Session> {
        if self.active.is_none() {
            tracing::info!("setting up session");
            self.active = Some(self.connector.connect().await?);
        }
        self.session()
    }

    pub fn session(&self) -> Result<&dyn Session> {
        self.active
            .as_deref()
            .ok_or_else(|| Error::SessionUnavailable("no session has been acquired".into()))
    }

    /// Close and forget the active session. Does nothing when idle.
    pub async fn release(&mut self) -> Result<()> {
        match self.active.take() {
            Some(session) => {
                tracing::info!("tearing down session");
                session.quit().await
            }
            None => Ok(()),
        }
    }

    /// Run `scenario` against a fresh session and release it afterwards.
    ///
    /// A session acquired before the call is released first, so the scenario
    /// never inherits app state from earlier work.
    ///
    /// The session is released whether the scenario returns normally, returns
    /// an error, or panics on a failed assertion; a panic is re-raised once the
    /// session is gone.
    pub async fn run<T, F>(&mut self, name: &str, scenario: F) -> Result<T>
    where
        F: for<'s> FnOnce(&'s dyn Session) -> BoxFuture<'s, Result<T>>,
    {
        let span = tracing::info_span!("scenario", name);
        async move {
            tracing::info!("starting");
            if self.is_active() {
                tracing::debug!("releasing the previously acquired session");
                self.release().await?;
            }
            let outcome = {
                let session = self.acquire().await?;
                AssertUnwindSafe(scenario(session)).catch_unwind().await
            };
            let released = self.release().await;

            let result = match outcome {
                Ok(result) => result,
                Err(panic) => {
                    if let Err(e) = released {
                        tracing::error!("session release failed after panic: {e}");
                    }
                    resume_unwind(panic);
                }
            };

            match (result, released) {
                (Ok(value), Ok(())) => {
                    tracing::info!("completed");
                    Ok(value)
                }
                (Ok(_), Err(e)) => Err(e),
                (Err(e), released) => {
                    if let Err(release_err) = released {
                        tracing::error!("session release failed: {release_err}");
                    }
                    tracing::info!("failed: {e}");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::locator::Locator;
    use crate::testing::{ScriptedConnector, ScriptedSession};

    #[tokio::test]
    async fn acquire_is_idempotent_and_release_is_safe_when_idle() {
        let connector = ScriptedConnector::new(ScriptedSession::new);
        let connects = connector.connects();
        let quits = connector.quits();
        let mut provider = SessionProvider::new(connector);

        provider.release().await.unwrap();
        assert!(matches!(provider.session(), Err(Error::SessionUnavailable(_))));

        provider.acquire().await.unwrap();
        provider.acquire().await.unwrap();
        assert_eq!(connects.load(Ordering::SeqCst), 1);

        provider.release().await.unwrap();
        provider.release().await.unwrap();
        assert_eq!(quits.load(Ordering::SeqCst), 1);
        assert!(!provider.is_active());
    }

    #[tokio::test]
    async fn run_releases_after_an_error() {
        let connector = ScriptedConnector::new(ScriptedSession::new);
        let quits = connector.quits();
        let mut provider = SessionProvider::new(connector);

        let result: Result<()> = provider
            .run("missing element", |session| {
                async move {
                    session
                        .find_element(&Locator::id("org.wikipedia:id/nowhere"))
                        .await?;
                    Ok::<_, Error>(())
                }
                .boxed()
            })
            .await;

        assert!(matches!(result, Err(Error::ElementNotFound { .. })));
        assert_eq!(quits.load(Ordering::SeqCst), 1);
        assert!(!provider.is_active());
    }

    #[tokio::test]
    async fn run_releases_before_resuming_a_panic() {
        let connector = ScriptedConnector::new(ScriptedSession::new);
        let quits = connector.quits();
        let mut provider = SessionProvider::new(connector);

        let outcome = AssertUnwindSafe(provider.run("assertion failure", |_session| {
            async move {
                assert_eq!(1 + 1, 3, "scenario assertion");
                Ok(())
            }
            .boxed()
        }))
        .catch_unwind()
        .await;

        assert!(outcome.is_err());
        assert_eq!(quits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn run_replaces_a_session_acquired_beforehand() {
        let connector = ScriptedConnector::new(ScriptedSession::new);
        let connects = connector.connects();
        let quits = connector.quits();
        let mut provider = SessionProvider::new(connector);

        provider.acquire().await.unwrap();
        provider
            .run("fresh session", |session| {
                async move { session.current_package().await.map(|_| ()) }.boxed()
            })
            .await
            .unwrap();

        assert_eq!(connects.load(Ordering::SeqCst), 2);
        assert_eq!(quits.load(Ordering::SeqCst), 2);
        assert!(!provider.is_active());
    }

    #[tokio::test]
    async fn each_run_gets_its_own_session() {
        let connector = ScriptedConnector::new(ScriptedSession::new);
        let connects = connector.connects();
        let mut provider = SessionProvider::new(connector);

        for name in ["first", "second"] {
            provider
                .run(name, |session| {
                    async move { session.current_package().await.map(|_| ()) }.boxed()
                })
                .await
                .unwrap();
        }
        assert_eq!(connects.load(Ordering::SeqCst), 2);
    }
}
