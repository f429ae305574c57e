use super::*;
use futures::channel::oneshot;
use futures::executor::block_on;
use futures::future::{self, BoxFuture, FutureExt};
use std::sync::Mutex;

struct GatedSource {
    bytes: Mutex<Option<oneshot::Receiver<Vec<u8>>>>,
}

impl FileSource for GatedSource {
    fn read(&self) -> BoxFuture<'static, Result<Vec<u8>, FileReadError>> {
        let receiver = self.bytes.lock().expect("gate lock").take();
        Box::pin(async move {
            match receiver {
                Some(receiver) => receiver
                    .await
                    .map_err(|_| FileReadError::Unavailable("gated".to_string())),
                None => Err(FileReadError::Unavailable("gated".to_string())),
            }
        })
    }
}

struct BrokenSource;

impl FileSource for BrokenSource {
    fn read(&self) -> BoxFuture<'static, Result<Vec<u8>, FileReadError>> {
        Box::pin(future::ready(Err(FileReadError::Unavailable(
            "revoked".to_string(),
        ))))
    }
}

fn gated(name: &str) -> (FileHandle, oneshot::Sender<Vec<u8>>) {
    let (sender, receiver) = oneshot::channel();
    let handle = FileHandle::new(
        name,
        GatedSource {
            bytes: Mutex::new(Some(receiver)),
        },
    );
    (handle, sender)
}

#[test]
fn selection_resolves_png_data_uri() {
    let picker = ImagePicker::default();
    let task = picker
        .select(Some(FileHandle::from_bytes("avatar.PNG", vec![1, 2, 3])))
        .expect("task for selected file");
    assert!(picker.is_pending());
    assert_eq!(picker.preview_data_uri(), None);

    assert_eq!(block_on(task), PreviewStatus::Resolved);
    assert_eq!(
        picker.preview_data_uri().as_deref(),
        Some("data:image/png;base64,AQID")
    );
    let selection = picker.selection().expect("selection kept");
    assert_eq!(selection.display_name, "avatar.PNG");
    assert_eq!(
        selection.preview_data_uri.as_deref(),
        Some("data:image/png;base64,AQID")
    );
    assert!(!picker.is_pending());
}

#[test]
fn empty_selection_has_no_task_and_no_selection() {
    let picker = ImagePicker::default();
    assert!(picker.select(None).is_none());
    assert!(picker.selection().is_none());
    assert!(picker.preview_data_uri().is_none());
}

#[test]
fn newer_selection_cancels_older_preview() {
    let picker = ImagePicker::default();
    let (first, first_gate) = gated("first.jpg");
    let (second, second_gate) = gated("second.gif");

    let first_task = picker.select(Some(first)).expect("first task");
    let second_task = picker.select(Some(second)).expect("second task");
    assert!(second_task.ticket() > first_task.ticket());

    second_gate.send(vec![9]).expect("second gate open");
    assert_eq!(block_on(second_task), PreviewStatus::Resolved);

    let _ = first_gate.send(vec![1]);
    assert_eq!(block_on(first_task), PreviewStatus::Cancelled);
    assert_eq!(
        picker.preview_data_uri().as_deref(),
        Some("data:image/gif;base64,CQ==")
    );
    assert_eq!(
        picker.selection().map(|selection| selection.display_name),
        Some("second.gif".to_string())
    );
}

#[test]
fn reset_aborts_pending_preview() {
    let picker = ImagePicker::default();
    let (handle, gate) = gated("late.png");
    let task = picker.select(Some(handle)).expect("task");

    picker.reset();
    let _ = gate.send(vec![1, 2]);
    assert_eq!(block_on(task), PreviewStatus::Cancelled);
    assert!(picker.preview_data_uri().is_none());
    assert!(picker.selection().is_none());
}

#[test]
fn failed_read_leaves_preview_absent() {
    let picker = ImagePicker::default();
    let task = picker
        .select(Some(FileHandle::new("gone.png", BrokenSource)))
        .expect("task");
    assert_eq!(block_on(task), PreviewStatus::Failed);
    assert!(picker.preview_data_uri().is_none());
    assert!(picker.selection().is_some());
    assert!(!picker.is_pending());
}

#[test]
fn missing_path_fails_quietly() {
    let picker = ImagePicker::default();
    let task = picker
        .select(Some(FileHandle::from_path(
            "/definitely/not/here/regform-preview.png",
        )))
        .expect("task");
    assert_eq!(block_on(task), PreviewStatus::Failed);
    assert!(picker.preview_data_uri().is_none());
}

#[test]
fn preview_is_not_restarted_for_resolved_selection() {
    let picker = ImagePicker::default();
    let handle = FileHandle::from_bytes("a.jpeg", vec![0xff]);
    let task = picker.select(Some(handle.clone())).expect("task");
    assert!(picker.preview_file(&handle).is_none(), "already in flight");
    assert_eq!(block_on(task), PreviewStatus::Resolved);
    assert!(picker.preview().is_none(), "already resolved");

    let other = FileHandle::from_bytes("b.bin", vec![0]);
    let task = picker.preview_file(&other).expect("different file starts a task");
    assert_eq!(block_on(task), PreviewStatus::Resolved);
    assert_eq!(
        picker.preview_data_uri().as_deref(),
        Some("data:application/octet-stream;base64,AA==")
    );
}

#[test]
fn released_selection_keeps_resolving_preview() {
    let picker = ImagePicker::default();
    let (handle, gate) = gated("kept.png");
    let task = picker.select(Some(handle)).expect("task");

    picker.release_selection();
    assert!(picker.selection().is_none());
    gate.send(vec![7]).expect("gate open");

    assert_eq!(task.now_or_never(), Some(PreviewStatus::Resolved));
    assert_eq!(
        picker.preview_data_uri().as_deref(),
        Some("data:image/png;base64,Bw==")
    );
}

#[test]
fn dropped_task_lets_the_preview_start_again() {
    let picker = ImagePicker::default();
    let handle = FileHandle::from_bytes("dropped.png", vec![5]);
    drop(picker.select(Some(handle.clone())));
    assert!(!picker.is_pending());
    assert!(picker.preview_data_uri().is_none());

    let task = picker.preview_file(&handle).expect("read starts again");
    assert_eq!(block_on(task), PreviewStatus::Resolved);
    assert_eq!(
        picker.preview_data_uri().as_deref(),
        Some("data:image/png;base64,BQ==")
    );
}

#[test]
fn dropping_a_superseded_task_keeps_the_newer_read() {
    let picker = ImagePicker::default();
    let (first, _first_gate) = gated("first.png");
    let (second, second_gate) = gated("second.png");
    let first_task = picker.select(Some(first)).expect("first task");
    let second_task = picker.select(Some(second)).expect("second task");

    drop(first_task);
    assert!(picker.is_pending());
    second_gate.send(vec![2]).expect("second gate open");
    assert_eq!(block_on(second_task), PreviewStatus::Resolved);
}

#[test]
fn accept_hint_lists_image_extensions() {
    assert_eq!(ImagePicker::default().accept(), ".jpg, .jpeg, .png, .gif");
}
