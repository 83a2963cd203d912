/*
 *  Copyright 2026 Taskforge Contributors
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Data Access Layer for the trigger pipeline.
//!
//! The [`DAL`] aggregates per-entity accessors, each borrowing the shared
//! handle. Async methods run their queries inside `interact` closures on
//! pooled connections; the synchronous free functions in the entity modules
//! are meant for composition inside an already-open write transaction.

pub mod background_worker;
pub mod batch_task_run;
pub mod counter;
pub mod run_queue;
pub mod tag;
pub mod task_run;
pub mod task_run_attempt;

pub use background_worker::BackgroundWorkerDAL;
pub use batch_task_run::BatchTaskRunDAL;
pub use counter::RunCounterDAL;
pub use run_queue::RunQueueDAL;
pub use tag::TaskRunTagDAL;
pub use task_run::TaskRunDAL;
pub use task_run_attempt::TaskRunAttemptDAL;

use crate::database::Database;

/// Data access layer entry point.
#[derive(Clone)]
pub struct DAL {
    pub(crate) database: Database,
}

impl DAL {
    /// Creates a new DAL over the given database pool.
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn task_runs(&self) -> TaskRunDAL<'_> {
        TaskRunDAL::new(self)
    }

    pub fn attempts(&self) -> TaskRunAttemptDAL<'_> {
        TaskRunAttemptDAL::new(self)
    }

    pub fn batches(&self) -> BatchTaskRunDAL<'_> {
        BatchTaskRunDAL::new(self)
    }

    pub fn workers(&self) -> BackgroundWorkerDAL<'_> {
        BackgroundWorkerDAL::new(self)
    }

    pub fn tags(&self) -> TaskRunTagDAL<'_> {
        TaskRunTagDAL::new(self)
    }

    pub fn counters(&self) -> RunCounterDAL<'_> {
        RunCounterDAL::new(self)
    }

    pub fn run_queue(&self) -> RunQueueDAL<'_> {
        RunQueueDAL::new(self)
    }
}
