//! Avatar downloads on a worker thread, handed back through a oneshot
//! channel and dropped when a newer render has superseded them.

use std::sync::Arc;
use std::thread;

use tokio::sync::oneshot;

use crate::rendering::{AvatarSlot, GenerationToken};
use crate::{Error, ProfileSource, Result};

/// Avatar download running on a dedicated worker thread.
///
/// The worker owns a clone of the source and reports through a oneshot
/// channel, so callers can either block (`wait`) or `.await` the result
/// from async code. The worker skips the download when its slot has already
/// been superseded by a newer render.
pub struct AvatarTask {
    slot: AvatarSlot,
    rx: oneshot::Receiver<Result<Vec<u8>>>,
}

impl AvatarTask {
    pub fn spawn<S>(source: Arc<S>, slot: AvatarSlot, generation: GenerationToken) -> Self
    where
        S: ProfileSource + ?Sized + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let url = slot.url.clone();
        let wanted = slot.generation;

        thread::spawn(move || {
            let res = if !generation.is_current(wanted) {
                Err(Error::Render("avatar superseded before download".into()))
            } else if url.is_empty() {
                Err(Error::Decode("profile has no avatar URL".into()))
            } else {
                source.fetch_avatar(&url)
            };
            // Receiver may be gone if the caller stopped caring
            let _ = tx.send(res);
        });

        Self { slot, rx }
    }

    pub fn slot(&self) -> &AvatarSlot {
        &self.slot
    }

    /// Block the current (non-async) thread until the download finishes.
    pub fn wait(self) -> (AvatarSlot, Result<Vec<u8>>) {
        let res = self
            .rx
            .blocking_recv()
            .unwrap_or_else(|e| Err(Error::Network(format!("Avatar worker vanished: {}", e))));
        (self.slot, res)
    }

    /// Async counterpart of [`wait`](Self::wait).
    pub async fn finish(self) -> (AvatarSlot, Result<Vec<u8>>) {
        let res = self
            .rx
            .await
            .unwrap_or_else(|e| Err(Error::Network(format!("Avatar worker vanished: {}", e))));
        (self.slot, res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::sample_profile;
    use crate::rendering::paint::DisplayList;
    use crate::rendering::CardCanvas;
    use crate::{CardSize, ProfileRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSource {
        avatar_calls: AtomicUsize,
    }

    impl ProfileSource for CountingSource {
        fn fetch(&self, _identifier: &str) -> Result<ProfileRecord> {
            Ok(sample_profile())
        }

        fn fetch_avatar(&self, url: &str) -> Result<Vec<u8>> {
            self.avatar_calls.fetch_add(1, Ordering::SeqCst);
            Ok(url.as_bytes().to_vec())
        }
    }

    #[test]
    fn current_slot_is_downloaded_and_painted() {
        let source = Arc::new(CountingSource::default());
        let mut canvas = CardCanvas::new(DisplayList::new(), CardSize::default());
        let slot = canvas.render(&sample_profile());

        let (slot, bytes) = AvatarTask::spawn(source.clone(), slot, canvas.generation()).wait();
        let bytes = bytes.unwrap();
        assert_eq!(bytes, sample_profile().avatar_url.into_bytes());
        assert!(canvas.paint_avatar(&slot, &bytes));
        assert_eq!(source.avatar_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn superseded_slot_skips_download() {
        let source = Arc::new(CountingSource::default());
        let mut canvas = CardCanvas::new(DisplayList::new(), CardSize::default());
        let stale = canvas.render(&sample_profile());
        canvas.render(&sample_profile());

        let (_, res) = AvatarTask::spawn(source.clone(), stale, canvas.generation()).wait();
        assert!(res.is_err());
        assert_eq!(source.avatar_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn task_can_be_awaited() {
        let source = Arc::new(CountingSource::default());
        let mut canvas = CardCanvas::new(DisplayList::new(), CardSize::default());
        let slot = canvas.render(&sample_profile());
        let (_, res) = AvatarTask::spawn(source, slot, canvas.generation()).finish().await;
        assert!(res.is_ok());
    }
}
