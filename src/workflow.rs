//! The publish workflow: one linear pass over at most one media item.
//!
//! ```text
//! LIST -> (empty: stop) -> CREATE_CONTAINER -> POLL -> PUBLISH -> DELETE_SOURCE
//! ```
//!
//! Any failure up to and including PUBLISH stops the run and leaves the
//! source untouched. Deleting the source only happens after a confirmed
//! publish and is best-effort: a failed delete is reported but the run still
//! succeeds. Re-running after a crash between PUBLISH and DELETE_SOURCE will
//! publish the same item again.

use std::fmt;

use crate::error::RunError;
use crate::poller::{await_ready, PollPolicy, Sleeper};
use crate::publisher::{ContainerId, PublicationId, PublishingService};
use crate::store::{MediaItem, MediaStore};
use crate::util::display_stem;

/// Per-run inputs, derived once from `Settings`.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub folder_id: String,
    pub caption_template: String,
    pub poll: PollPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    List,
    CreateContainer,
    Poll,
    Publish,
    DeleteSource,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunStage::List => "list",
            RunStage::CreateContainer => "create_container",
            RunStage::Poll => "poll",
            RunStage::Publish => "publish",
            RunStage::DeleteSource => "delete_source",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub item: MediaItem,
    pub container_id: ContainerId,
    pub publication_id: PublicationId,
    pub poll_attempts: u32,
    /// False when the post-publish delete failed and the source was kept.
    pub source_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    NothingToDo,
    Published(PublishReport),
}

pub struct PublishWorkflow<'a> {
    store: &'a dyn MediaStore,
    publisher: &'a dyn PublishingService,
    sleeper: &'a dyn Sleeper,
}

impl<'a> PublishWorkflow<'a> {
    pub fn new(
        store: &'a dyn MediaStore,
        publisher: &'a dyn PublishingService,
        sleeper: &'a dyn Sleeper,
    ) -> Self {
        Self {
            store,
            publisher,
            sleeper,
        }
    }

    pub fn run(&self, plan: &RunPlan) -> Result<RunOutcome, RunError> {
        tracing::info!(stage = %RunStage::List, folder_id = plan.folder_id.as_str(), "run started");
        let Some(item) = self.store.find_oldest_media(&plan.folder_id)? else {
            tracing::info!(folder_id = plan.folder_id.as_str(), "no pending media");
            return Ok(RunOutcome::NothingToDo);
        };
        tracing::info!(
            stage = %RunStage::CreateContainer,
            item_id = item.id.as_str(),
            name = item.name.as_str(),
            "selected oldest media item"
        );

        let caption = render_caption(&plan.caption_template, &item);
        let container_id = self
            .publisher
            .create_container(&item.download_ref, &caption)?;
        tracing::info!(
            stage = %RunStage::Poll,
            container_id = %container_id,
            max_attempts = plan.poll.max_attempts,
            interval_secs = plan.poll.interval.as_secs(),
            "container created"
        );

        let poll = await_ready(self.publisher, self.sleeper, &container_id, plan.poll)?;

        tracing::info!(stage = %RunStage::Publish, container_id = %container_id, "container ready");
        let publication_id = self.publisher.publish(&container_id)?;
        tracing::info!(
            stage = %RunStage::DeleteSource,
            publication_id = %publication_id,
            item_id = item.id.as_str(),
            "published"
        );

        let source_deleted = match self.store.delete_source(&item.id) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    item_id = item.id.as_str(),
                    error = %err,
                    "published but could not delete source; it will be picked up again"
                );
                false
            }
        };

        Ok(RunOutcome::Published(PublishReport {
            item,
            container_id,
            publication_id,
            poll_attempts: poll.attempts,
            source_deleted,
        }))
    }
}

/// Expand `{name}` in the caption template to the item's name without extension.
pub fn render_caption(template: &str, item: &MediaItem) -> String {
    template.replace("{name}", display_stem(&item.name))
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
