use std::sync::Arc;

use async_trait::async_trait;

use crate::{adapters::request::ApiRequest, core::envelope::HandlerResult};

/// Handler defines the port for anything that can answer an API call:
/// a terminal controller, or a filter that already wraps one.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Handle one request
    ///
    /// # Arguments
    /// * `request` - The request envelope; filters may read headers, the
    ///   terminal handler consumes the body
    ///
    /// # Returns
    /// The payload to place under `data`, or the single error for this call
    async fn call(&self, request: &mut ApiRequest) -> HandlerResult;
}

/// Middleware turns a handler into another handler, e.g. by authenticating
/// the caller before delegating.
pub trait Middleware: Send + Sync + 'static {
    /// Wrap `next`; the returned handler decides whether `next` runs.
    fn wrap(&self, next: Arc<dyn Handler>) -> Arc<dyn Handler>;
}

/// Pass-through middleware.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Middleware for Identity {
    fn wrap(&self, next: Arc<dyn Handler>) -> Arc<dyn Handler> {
        next
    }
}

/// Ordered composition: the first middleware added runs first.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    layers: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, middleware: impl Middleware) -> Self {
        self.layers.push(Arc::new(middleware));
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Middleware for MiddlewareChain {
    fn wrap(&self, next: Arc<dyn Handler>) -> Arc<dyn Handler> {
        self.layers
            .iter()
            .rev()
            .fold(next, |inner, layer| layer.wrap(inner))
    }
}
