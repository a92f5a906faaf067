//! Worker lifecycle request/reply pairs.

use super::PayloadSchema;
use crate::properties::PropertyBag;
use crate::types::WorkerOptions;

/// Declares that the host can execute workflows and activities for a
/// domain/task-list pair. The proxy answers with the engine-assigned
/// worker id used by [`StopWorkerRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewWorkerRequest {
    pub domain: Option<String>,
    pub task_list: Option<String>,
    pub options: Option<WorkerOptions>,
}

impl PayloadSchema for NewWorkerRequest {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_opt_string("Domain", self.domain.clone());
        bag.set_opt_string("TaskList", self.task_list.clone());
        bag.set_json("Options", self.options.as_ref());
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            domain: bag.get_opt_string("Domain"),
            task_list: bag.get_opt_string("TaskList"),
            options: bag.get_json("Options"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NewWorkerReply {
    pub worker_id: i64,
}

impl PayloadSchema for NewWorkerReply {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_i64("WorkerId", self.worker_id);
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            worker_id: bag.get_i64("WorkerId"),
        }
    }
}

/// Stops a running worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopWorkerRequest {
    pub worker_id: i64,
}

impl PayloadSchema for StopWorkerRequest {
    fn write(&self, bag: &mut PropertyBag) {
        bag.set_i64("WorkerId", self.worker_id);
    }

    fn read(bag: &PropertyBag) -> Self {
        Self {
            worker_id: bag.get_i64("WorkerId"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopWorkerReply;

impl PayloadSchema for StopWorkerReply {
    fn write(&self, _bag: &mut PropertyBag) {}
    fn read(_bag: &PropertyBag) -> Self {
        Self
    }
}
