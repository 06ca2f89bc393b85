//! In-memory stand-ins for the remote services, recording every call.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use crate::error::{ApiError, PublishError, StoreError, UploadError};
use crate::poller::Sleeper;
use crate::publisher::{ContainerId, ContainerStatus, PublicationId, PublishingService};
use crate::store::{MediaItem, MediaStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(String),
    Delete(String),
    Create { download_ref: String, caption: String },
    Status(String),
    Publish(String),
    Sleep(Duration),
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

pub fn new_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn count(log: &CallLog, predicate: impl Fn(&Call) -> bool) -> usize {
    log.borrow().iter().filter(|call| predicate(call)).count()
}

fn server_error(endpoint: &'static str) -> ApiError {
    ApiError::Status {
        endpoint,
        status: 500,
        body: r#"{"error":{"message":"backend unavailable"}}"#.to_string(),
    }
}

pub fn item(id: &str, name: &str) -> MediaItem {
    MediaItem {
        id: id.to_string(),
        name: name.to_string(),
        download_ref: format!("https://drive.google.com/uc?export=download&id={id}"),
    }
}

pub struct FakeStore {
    pub log: CallLog,
    /// Items in creation order; the first is the oldest.
    pub items: Vec<MediaItem>,
    pub fail_list: bool,
    pub fail_delete: bool,
}

impl FakeStore {
    pub fn new(log: &CallLog, items: Vec<MediaItem>) -> Self {
        Self {
            log: Rc::clone(log),
            items,
            fail_list: false,
            fail_delete: false,
        }
    }
}

impl MediaStore for FakeStore {
    fn find_oldest_media(&self, folder_id: &str) -> Result<Option<MediaItem>, StoreError> {
        self.log.borrow_mut().push(Call::List(folder_id.to_string()));
        if self.fail_list {
            return Err(StoreError::List {
                folder_id: folder_id.to_string(),
                source: server_error("list files"),
            });
        }
        Ok(self.items.first().cloned())
    }

    fn delete_source(&self, item_id: &str) -> Result<(), StoreError> {
        self.log.borrow_mut().push(Call::Delete(item_id.to_string()));
        if self.fail_delete {
            return Err(StoreError::Delete {
                file_id: item_id.to_string(),
                source: server_error("delete file"),
            });
        }
        Ok(())
    }
}

pub enum CreateOutcome {
    Created(&'static str),
    MissingId,
    Rejected,
}

pub struct FakePublisher {
    pub log: CallLog,
    pub create: CreateOutcome,
    /// Scripted status replies; once drained every query reports `IN_PROGRESS`.
    pub statuses: RefCell<VecDeque<Result<&'static str, ()>>>,
    pub fail_publish: bool,
}

impl FakePublisher {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: Rc::clone(log),
            create: CreateOutcome::Created("container-1"),
            statuses: RefCell::new(VecDeque::new()),
            fail_publish: false,
        }
    }

    pub fn with_statuses(self, statuses: &[Result<&'static str, ()>]) -> Self {
        *self.statuses.borrow_mut() = statuses.iter().cloned().collect();
        self
    }

    /// Report `FINISHED` on query number `attempt` (1-based).
    pub fn finishing_on(self, attempt: usize) -> Self {
        let mut statuses = vec![Ok("IN_PROGRESS"); attempt.saturating_sub(1)];
        statuses.push(Ok("FINISHED"));
        self.with_statuses(&statuses)
    }
}

impl PublishingService for FakePublisher {
    fn create_container(
        &self,
        download_ref: &str,
        caption: &str,
    ) -> Result<ContainerId, UploadError> {
        self.log.borrow_mut().push(Call::Create {
            download_ref: download_ref.to_string(),
            caption: caption.to_string(),
        });
        match self.create {
            CreateOutcome::Created(id) => Ok(ContainerId::new(id)),
            CreateOutcome::MissingId => Err(UploadError(ApiError::MissingField {
                endpoint: "create container",
                field: "id",
                body: "{}".to_string(),
            })),
            CreateOutcome::Rejected => Err(UploadError(server_error("create container"))),
        }
    }

    fn container_status(&self, container_id: &ContainerId) -> Result<ContainerStatus, ApiError> {
        self.log
            .borrow_mut()
            .push(Call::Status(container_id.as_str().to_string()));
        match self.statuses.borrow_mut().pop_front() {
            Some(Ok(code)) => Ok(ContainerStatus::new(code)),
            Some(Err(())) => Err(server_error("container status")),
            None => Ok(ContainerStatus::new("IN_PROGRESS")),
        }
    }

    fn publish(&self, container_id: &ContainerId) -> Result<PublicationId, PublishError> {
        self.log
            .borrow_mut()
            .push(Call::Publish(container_id.as_str().to_string()));
        if self.fail_publish {
            return Err(PublishError(server_error("publish")));
        }
        Ok(PublicationId::new("media-42"))
    }
}

pub struct FakeSleeper {
    pub log: CallLog,
}

impl FakeSleeper {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: Rc::clone(log),
        }
    }
}

impl Sleeper for FakeSleeper {
    fn sleep(&self, duration: Duration) {
        self.log.borrow_mut().push(Call::Sleep(duration));
    }
}
