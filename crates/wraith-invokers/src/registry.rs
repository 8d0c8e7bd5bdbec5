//! Invoker registry — maps handler types to the invoker that drives them.
//!
//! New application surfaces plug in here; nothing in the engine grows a
//! switch statement when one is added.

use std::collections::HashMap;
use std::sync::Arc;

use wraith_core::HandlerType;
use wraith_engine::ActionInvoker;

use crate::http::HttpInvoker;
use crate::shell::ShellInvoker;

/// Registry of action invokers, keyed by handler type.
pub struct InvokerRegistry {
    invokers: HashMap<HandlerType, Arc<dyn ActionInvoker>>,
}

impl InvokerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            invokers: HashMap::new(),
        }
    }

    /// Registry with the built-in invokers: shells for command handlers,
    /// HTTP for the browser and curl handlers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(HandlerType::Command, Arc::new(ShellInvoker::new()));
        registry.register(HandlerType::Bash, Arc::new(ShellInvoker::new()));
        registry.register(
            HandlerType::PowerShell,
            Arc::new(ShellInvoker::with_shell("pwsh")),
        );
        registry.register(HandlerType::Curl, Arc::new(HttpInvoker::new()));
        registry.register(HandlerType::BrowserChrome, Arc::new(HttpInvoker::new()));
        registry.register(HandlerType::BrowserFirefox, Arc::new(HttpInvoker::new()));
        registry
    }

    /// Register (or replace) the invoker for a handler type.
    pub fn register(&mut self, handler_type: HandlerType, invoker: Arc<dyn ActionInvoker>) {
        tracing::info!("🔌 Registered {} invoker for {handler_type}", invoker.name());
        self.invokers.insert(handler_type, invoker);
    }

    /// Look up the invoker for a handler type.
    pub fn get(&self, handler_type: HandlerType) -> Option<Arc<dyn ActionInvoker>> {
        self.invokers.get(&handler_type).cloned()
    }

    /// Number of registered invokers.
    pub fn count(&self) -> usize {
        self.invokers.len()
    }
}

impl Default for InvokerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
