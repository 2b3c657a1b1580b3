use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::context::RenderError;
use crate::format::Frame;

/// What happened to a submitted frame.
#[derive(Debug)]
pub enum Outcome {
    Presented,
    /// Not drawn: the render thread was stopping.
    Skipped,
    Failed(RenderError),
}

/// Reply to one submission; hands the frame back to its owner.
#[derive(Debug)]
pub struct Completion {
    pub frame: Frame,
    pub outcome: Outcome,
}

/// The render thread is gone. Carries the frame if it was never taken.
#[derive(Debug)]
pub struct Disconnected(pub Option<Frame>);

/// Creates a connected submitter / source pair.
pub fn handoff() -> (Submitter, FrameSource) {
    let (request_tx, request_rx) = bounded(1);
    let (completion_tx, completion_rx) = bounded(1);

    (
        Submitter {
            requests: request_tx,
            completions: completion_rx,
        },
        FrameSource {
            requests: request_rx,
            completions: completion_tx,
        },
    )
}

/// Delivery side of the handoff.
pub struct Submitter {
    requests: Sender<Frame>,
    completions: Receiver<Completion>,
}

impl Submitter {
    /// Hands `frame` to the render thread and blocks until it is done.
    pub fn submit(&mut self, frame: Frame) -> Result<Completion, Disconnected> {
        self.requests
            .send(frame)
            .map_err(|e| Disconnected(Some(e.into_inner())))?;

        self.completions.recv().map_err(|_| Disconnected(None))
    }
}

/// Render side of the handoff.
pub struct FrameSource {
    requests: Receiver<Frame>,
    completions: Sender<Completion>,
}

/// Result of [`FrameSource::wait`].
pub enum Wait {
    Frame(PendingFrame),
    /// Nothing arrived within the timeout.
    Idle,
    /// The submitter was dropped.
    Closed,
}

impl FrameSource {
    pub fn wait(&self, timeout: Duration) -> Wait {
        match self.requests.recv_timeout(timeout) {
            Ok(frame) => Wait::Frame(PendingFrame {
                frame,
                completions: Some(self.completions.clone()),
            }),
            Err(RecvTimeoutError::Timeout) => Wait::Idle,
            Err(RecvTimeoutError::Disconnected) => Wait::Closed,
        }
    }
}

/// A received frame that still owes its submitter a completion.
///
/// Dropping it without calling [`complete`](Self::complete) replies
/// [`Outcome::Skipped`].
pub struct PendingFrame {
    frame: Frame,
    /// Taken by the first reply.
    completions: Option<Sender<Completion>>,
}

impl PendingFrame {
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn complete(mut self, outcome: Outcome) {
        self.reply(outcome);
    }

    fn reply(&mut self, outcome: Outcome) {
        if let Some(completions) = self.completions.take() {
            let frame = std::mem::take(&mut self.frame);
            // The submitter may have given up; nothing else to do then.
            let _ = completions.send(Completion { frame, outcome });
        }
    }
}

impl Drop for PendingFrame {
    fn drop(&mut self) {
        self.reply(Outcome::Skipped);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use super::*;

    const POLL: Duration = Duration::from_millis(5);

    #[test]
    fn n_submissions_yield_n_draws_one_at_a_time() {
        const N: usize = 25;

        let (mut submitter, source) = handoff();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let draws = Arc::new(AtomicUsize::new(0));

        let consumer = {
            let in_flight = in_flight.clone();
            let draws = draws.clone();
            thread::spawn(move || loop {
                match source.wait(POLL) {
                    Wait::Frame(pending) => {
                        assert_eq!(in_flight.fetch_add(1, Ordering::SeqCst), 0, "two frames in flight");
                        thread::sleep(Duration::from_micros(200));
                        draws.fetch_add(1, Ordering::SeqCst);
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        pending.complete(Outcome::Presented);
                    }
                    Wait::Idle => continue,
                    Wait::Closed => break,
                }
            })
        };

        for i in 0..N {
            let completion = submitter.submit(Frame::new(vec![i as u8; 4])).unwrap();
            assert!(matches!(completion.outcome, Outcome::Presented));
            assert_eq!(completion.frame.as_bytes(), &[i as u8; 4]);
            assert_eq!(draws.load(Ordering::SeqCst), i + 1);
        }

        drop(submitter);
        consumer.join().unwrap();
        assert_eq!(draws.load(Ordering::SeqCst), N);
    }

    #[test]
    fn dropped_pending_frame_replies_skipped() {
        let (mut submitter, source) = handoff();

        let consumer = thread::spawn(move || {
            if let Wait::Frame(pending) = source.wait(Duration::from_secs(5)) {
                drop(pending);
            }
        });

        let completion = submitter.submit(Frame::new(vec![7; 3])).unwrap();
        assert!(matches!(completion.outcome, Outcome::Skipped));
        assert_eq!(completion.frame.into_inner(), vec![7; 3]);
        consumer.join().unwrap();
    }

    #[test]
    fn wait_times_out_then_sees_close() {
        let (submitter, source) = handoff();
        assert!(matches!(source.wait(POLL), Wait::Idle));
        drop(submitter);
        assert!(matches!(source.wait(POLL), Wait::Closed));
    }

    #[test]
    fn submit_after_source_dropped_returns_frame() {
        let (mut submitter, source) = handoff();
        drop(source);

        match submitter.submit(Frame::new(vec![1, 2])) {
            Err(Disconnected(Some(frame))) => assert_eq!(frame.as_bytes(), &[1, 2]),
            other => panic!("unexpected {other:?}"),
        }
    }
}
