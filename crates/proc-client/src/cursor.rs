//! Paginated results.
//!
//! A [`Cursor`] holds one page of values and, when the evaluator reported more,
//! a continuation that fetches the next page. Pages are fetched one at a time
//! and only when the values before them have been consumed.

use std::fmt;

use futures::future::BoxFuture;
use futures::stream::{self, BoxStream, StreamExt};
use proc_core::ProcResult;
use serde_json::Value;
use tracing::trace;

use crate::client::Output;

/// Fetches the page after the current one.
pub type Continuation = Box<dyn FnOnce() -> BoxFuture<'static, ProcResult<Output>> + Send>;

pub struct Cursor {
    values: Vec<Value>,
    next: Option<Continuation>,
}

impl Cursor {
    /// A final page.
    pub fn page(values: Vec<Value>) -> Self {
        Self { values, next: None }
    }

    /// A page followed by whatever `next` fetches.
    pub fn with_continuation(values: Vec<Value>, next: Continuation) -> Self {
        Self {
            values,
            next: Some(next),
        }
    }

    /// Values of the current page.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Fetches the next page, or `None` on the final page.
    pub async fn next_page(self) -> ProcResult<Option<Cursor>> {
        match self.next {
            Some(next) => {
                trace!("fetching next page");
                Ok(Some(next().await?.into_cursor()))
            }
            None => Ok(None),
        }
    }

    /// Streams every value across all pages.
    ///
    /// The stream ends after yielding the first error.
    pub fn into_stream(self) -> BoxStream<'static, ProcResult<Value>> {
        let state = Some((self.values.into_iter(), self.next));
        stream::unfold(state, |state| async move {
            let (mut values, mut next) = state?;
            loop {
                if let Some(value) = values.next() {
                    return Some((Ok(value), Some((values, next))));
                }
                let continuation = next.take()?;
                trace!("fetching next page");
                match continuation().await {
                    Ok(output) => {
                        let page = output.into_cursor();
                        values = page.values.into_iter();
                        next = page.next;
                    }
                    Err(error) => return Some((Err(error), None)),
                }
            }
        })
        .boxed()
    }

    /// Drains every page into a single vector.
    pub async fn collect_all(self) -> ProcResult<Vec<Value>> {
        let Cursor { mut values, mut next } = self;
        while let Some(continuation) = next.take() {
            trace!("fetching next page");
            let page = continuation().await?.into_cursor();
            values.extend(page.values);
            next = page.next;
        }
        Ok(values)
    }

    /// Calls `f` with each value until it returns `false` or the values run out.
    ///
    /// Once `f` returns `false` no further pages are fetched.
    pub async fn each<F>(self, mut f: F) -> ProcResult<()>
    where
        F: FnMut(Value) -> bool,
    {
        let mut page = self;
        loop {
            let Cursor { values, next } = page;
            for value in values {
                if !f(value) {
                    return Ok(());
                }
            }
            match next {
                Some(next) => {
                    trace!("fetching next page");
                    page = next().await?.into_cursor();
                }
                None => return Ok(()),
            }
        }
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("values", &self.values)
            .field("has_next", &self.has_next())
            .finish()
    }
}
