//! Registration of user workflow and activity functions.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use taskmux_core::RemoteError;

use super::context::{ActivityContext, WorkflowContext};
use super::outcome::WorkflowOutcome;

/// Trait form of a workflow implementation, for types carrying their own
/// state or dependencies.
#[async_trait]
pub trait WorkflowHandler: Send + Sync + 'static {
    /// Type name the engine dispatches on.
    fn workflow_type(&self) -> &str;

    async fn execute(&self, ctx: WorkflowContext) -> WorkflowOutcome;
}

/// Trait form of an activity implementation.
#[async_trait]
pub trait ActivityHandler: Send + Sync + 'static {
    /// Type name the engine dispatches on.
    fn activity_type(&self) -> &str;

    async fn execute(&self, ctx: ActivityContext) -> Result<Option<Vec<u8>>, RemoteError>;
}

type BoxedWorkflowFuture = Pin<Box<dyn Future<Output = WorkflowOutcome> + Send>>;
type BoxedActivityFuture =
    Pin<Box<dyn Future<Output = Result<Option<Vec<u8>>, RemoteError>> + Send>>;

pub(crate) type WorkflowFn = Arc<dyn Fn(WorkflowContext) -> BoxedWorkflowFuture + Send + Sync>;
pub(crate) type ActivityFn = Arc<dyn Fn(ActivityContext) -> BoxedActivityFuture + Send + Sync>;

/// Lookup table from type name to registered function.
///
/// Populated before the worker starts; proxy invocations naming an
/// unregistered type fail back to the engine rather than panicking the
/// dispatcher.
#[derive(Default)]
pub struct WorkerRegistry {
    workflows: DashMap<String, WorkflowFn>,
    activities: DashMap<String, ActivityFn>,
}

impl WorkerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a workflow function under its type name. Overwrites any
    /// previous registration of the same name.
    pub fn register_workflow<F, Fut>(&self, workflow_type: impl Into<String>, func: F)
    where
        F: Fn(WorkflowContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = WorkflowOutcome> + Send + 'static,
    {
        let func: WorkflowFn = Arc::new(move |ctx| {
            let fut: BoxedWorkflowFuture = Box::pin(func(ctx));
            fut
        });
        self.workflows.insert(workflow_type.into(), func);
    }

    /// Registers an activity function under its type name.
    pub fn register_activity<F, Fut>(&self, activity_type: impl Into<String>, func: F)
    where
        F: Fn(ActivityContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<Vec<u8>>, RemoteError>> + Send + 'static,
    {
        let func: ActivityFn = Arc::new(move |ctx| {
            let fut: BoxedActivityFuture = Box::pin(func(ctx));
            fut
        });
        self.activities.insert(activity_type.into(), func);
    }

    /// Registers a [`WorkflowHandler`] under its self-reported type name.
    pub fn register_workflow_handler(&self, handler: Arc<dyn WorkflowHandler>) {
        let workflow_type = handler.workflow_type().to_string();
        let func: WorkflowFn = Arc::new(move |ctx| {
            let handler = handler.clone();
            let fut: BoxedWorkflowFuture = Box::pin(async move { handler.execute(ctx).await });
            fut
        });
        self.workflows.insert(workflow_type, func);
    }

    /// Registers an [`ActivityHandler`] under its self-reported type name.
    pub fn register_activity_handler(&self, handler: Arc<dyn ActivityHandler>) {
        let activity_type = handler.activity_type().to_string();
        let func: ActivityFn = Arc::new(move |ctx| {
            let handler = handler.clone();
            let fut: BoxedActivityFuture = Box::pin(async move { handler.execute(ctx).await });
            fut
        });
        self.activities.insert(activity_type, func);
    }

    pub(crate) fn workflow(&self, workflow_type: &str) -> Option<WorkflowFn> {
        self.workflows.get(workflow_type).map(|f| f.value().clone())
    }

    pub(crate) fn activity(&self, activity_type: &str) -> Option<ActivityFn> {
        self.activities.get(activity_type).map(|f| f.value().clone())
    }

    #[must_use]
    pub fn workflow_count(&self) -> usize {
        self.workflows.len()
    }

    #[must_use]
    pub fn activity_count(&self) -> usize {
        self.activities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_and_lookup() {
        let registry = WorkerRegistry::new();
        registry.register_workflow("Echo", |_ctx| async { WorkflowOutcome::Completed(None) });
        registry.register_activity("Noop", |_ctx| async { Ok(None) });

        assert!(registry.workflow("Echo").is_some());
        assert!(registry.workflow("Missing").is_none());
        assert!(registry.activity("Noop").is_some());
        assert_eq!(registry.workflow_count(), 1);
        assert_eq!(registry.activity_count(), 1);
    }

    #[test]
    fn handler_traits_register_under_their_type_names() {
        struct Renewal;

        #[async_trait]
        impl WorkflowHandler for Renewal {
            fn workflow_type(&self) -> &str {
                "Renewal"
            }

            async fn execute(&self, _ctx: WorkflowContext) -> WorkflowOutcome {
                WorkflowOutcome::Completed(None)
            }
        }

        let registry = WorkerRegistry::new();
        registry.register_workflow_handler(Arc::new(Renewal));
        assert!(registry.workflow("Renewal").is_some());
    }

    #[test]
    fn re_registration_overwrites() {
        let registry = WorkerRegistry::new();
        registry.register_workflow("Echo", |_ctx| async { WorkflowOutcome::Completed(None) });
        registry.register_workflow("Echo", |_ctx| async {
            WorkflowOutcome::Completed(Some(b"v2".to_vec()))
        });
        assert_eq!(registry.workflow_count(), 1);
    }
}
