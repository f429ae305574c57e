mod source;

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use std::task::{Context, Poll, ready};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use futures::future::{AbortHandle, Abortable, Aborted, BoxFuture};
use tracing::{debug, warn};

pub use source::{FileHandle, FileId, FileReadError, FileSource};

pub const DEFAULT_ACCEPT: [&str; 4] = [".jpg", ".jpeg", ".png", ".gif"];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PreviewTicket(pub u64);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PreviewStatus {
    Resolved,
    Failed,
    Cancelled,
    Superseded,
}

/// The file currently chosen in a picker.
#[derive(Clone, Debug, PartialEq)]
pub struct FileSelection {
    pub handle: FileHandle,
    pub display_name: String,
    pub preview_data_uri: Option<String>,
}

impl FileSelection {
    fn new(handle: FileHandle) -> Self {
        Self {
            display_name: handle.name().to_string(),
            handle,
            preview_data_uri: None,
        }
    }
}

/// Pending preview read. Drive it on the UI executor; nothing else waits for
/// it. A newer selection or a reset aborts it. Dropping it unfinished
/// abandons the read, and the picker may start a fresh one later.
#[must_use = "a preview task does nothing unless it is polled"]
pub struct PreviewTask {
    ticket: PreviewTicket,
    inner: BoxFuture<'static, PreviewStatus>,
    picker: ImagePicker,
    done: bool,
}

impl PreviewTask {
    pub fn ticket(&self) -> PreviewTicket {
        self.ticket
    }
}

impl Future for PreviewTask {
    type Output = PreviewStatus;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let status = ready!(self.inner.as_mut().poll(cx));
        self.done = true;
        Poll::Ready(status)
    }
}

impl Drop for PreviewTask {
    fn drop(&mut self) {
        if !self.done {
            self.picker.abandon(self.ticket.0);
        }
    }
}

#[derive(Default)]
struct PickerState {
    ticket: u64,
    selection: Option<FileSelection>,
    preview: Option<String>,
    pending: Option<AbortHandle>,
}

impl PickerState {
    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(ticket = self.ticket, "cancelling pending preview");
            pending.abort();
        }
    }
}

#[derive(Clone)]
pub struct ImagePicker {
    accept: Arc<[String]>,
    state: Arc<RwLock<PickerState>>,
}

impl Default for ImagePicker {
    fn default() -> Self {
        Self::new(DEFAULT_ACCEPT)
    }
}

impl ImagePicker {
    pub fn new<I, S>(accept: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accept: accept.into_iter().map(Into::into).collect(),
            state: Arc::new(RwLock::new(PickerState::default())),
        }
    }

    /// Accepted extensions as a file-input hint, e.g. `.jpg, .png`.
    pub fn accept(&self) -> String {
        self.accept.join(", ")
    }

    /// Replaces the selection. Any previous preview is dropped and its
    /// pending read aborted; the returned task resolves the new preview.
    pub fn select(&self, handle: Option<FileHandle>) -> Option<PreviewTask> {
        let mut state = self.write_state();
        state.cancel_pending();
        state.ticket += 1;
        state.preview = None;
        state.selection = handle.map(FileSelection::new);
        let handle = state.selection.as_ref()?.handle.clone();
        debug!(file = handle.name(), ticket = state.ticket, "file selected");
        Some(self.start_preview(&mut state, handle))
    }

    /// Starts a preview of `handle` unless one for it is already resolved or
    /// in flight. A different handle replaces the selection.
    pub fn preview_file(&self, handle: &FileHandle) -> Option<PreviewTask> {
        let mut state = self.write_state();
        let same = state
            .selection
            .as_ref()
            .is_some_and(|selection| selection.handle == *handle);
        if same && (state.preview.is_some() || state.pending.is_some()) {
            return None;
        }
        state.cancel_pending();
        state.ticket += 1;
        state.preview = None;
        state.selection = Some(FileSelection::new(handle.clone()));
        Some(self.start_preview(&mut state, handle.clone()))
    }

    pub fn preview(&self) -> Option<PreviewTask> {
        let handle = self.selection()?.handle;
        self.preview_file(&handle)
    }

    /// Forgets the selected file but keeps the preview on display, including
    /// one that is still resolving.
    pub fn release_selection(&self) {
        self.write_state().selection = None;
    }

    pub fn reset(&self) {
        let mut state = self.write_state();
        state.cancel_pending();
        state.ticket += 1;
        state.selection = None;
        state.preview = None;
    }

    pub fn selection(&self) -> Option<FileSelection> {
        self.read_state(|state| state.selection.clone())
    }

    pub fn preview_data_uri(&self) -> Option<String> {
        self.read_state(|state| state.preview.clone())
    }

    pub fn is_pending(&self) -> bool {
        self.read_state(|state| state.pending.is_some())
    }

    fn start_preview(&self, state: &mut PickerState, handle: FileHandle) -> PreviewTask {
        let ticket = state.ticket;
        let (abort_handle, registration) = AbortHandle::new_pair();
        state.pending = Some(abort_handle);

        let picker = self.clone();
        let owner = self.clone();
        let read = Abortable::new(handle.read(), registration);
        let inner = Box::pin(async move {
            match read.await {
                Err(Aborted) => PreviewStatus::Cancelled,
                Ok(Err(error)) => {
                    warn!(file = handle.name(), %error, "preview read failed");
                    picker.finish(ticket, None);
                    PreviewStatus::Failed
                }
                Ok(Ok(bytes)) => {
                    let uri = data_uri(handle.mime_type(), &bytes);
                    if picker.finish(ticket, Some(uri)) {
                        PreviewStatus::Resolved
                    } else {
                        PreviewStatus::Superseded
                    }
                }
            }
        });
        PreviewTask {
            ticket: PreviewTicket(ticket),
            inner,
            picker: owner,
            done: false,
        }
    }

    fn abandon(&self, ticket: u64) {
        let mut state = self.write_state();
        if state.ticket == ticket && state.pending.is_some() {
            debug!(ticket, "preview task dropped before it finished");
            state.cancel_pending();
        }
    }

    fn finish(&self, ticket: u64, preview: Option<String>) -> bool {
        let mut state = self.write_state();
        if state.ticket != ticket {
            return false;
        }
        state.pending = None;
        let Some(uri) = preview else {
            return true;
        };
        if let Some(selection) = state.selection.as_mut() {
            selection.preview_data_uri = Some(uri.clone());
        }
        state.preview = Some(uri);
        true
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, PickerState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn read_state<R>(&self, f: impl FnOnce(&PickerState) -> R) -> R {
        match self.state.read() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }
}

pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests;
