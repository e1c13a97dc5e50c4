//! Background environment for running [`Task`]s.

use std::{
    error::Error,
    future::{Future, IntoFuture},
};

use derive_more::Debug;
use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _,
};

#[cfg(doc)]
use crate::Task;

/// Background environment for running [`Task`]s.
///
/// Spawned [`Task`]s are only driven once the [`Background`] itself is
/// awaited, so dropping it without awaiting (e.g. in tests) runs nothing.
#[derive(Debug, Default)]
pub struct Background {
    /// [`Task`]s to drive.
    #[debug(skip)]
    tasks: Vec<LocalBoxFuture<'static, Result<(), Box<dyn Error + 'static>>>>,
}

impl Background {
    /// Spawns a new [`Task`] inside the [`Background`] environment.
    pub fn spawn<F, E>(&mut self, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        self.tasks.push(
            future
                .map(|r| {
                    r.map_err(|e| {
                        let e: Box<dyn Error + 'static> = Box::new(e);
                        e
                    })
                })
                .boxed_local(),
        );
    }
}

impl IntoFuture for Background {
    type Output = Result<(), Box<dyn Error>>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        future::try_join_all(self.tasks)
            .map(|r| r.map(drop))
            .boxed_local()
    }
}
