//! Producer/consumer runtime: stream input -> queue -> worker pool ->
//! stream output.
//!
//! One producer thread decodes requests and enqueues them on the
//! lock-free queue; `workers` consumer threads dequeue and execute them.
//! A `DONE` record makes the producer wait until every accepted request
//! has drained, then flag shutdown. With one worker the queue and the
//! pool are skipped entirely and the producer dispatches inline.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::thread;

use ripple_core::{Feed, LockFreeQueue, WaitGroup};
use serde_json::Deserializer;
use tracing::{debug, error};

use crate::dispatch::execute;
use crate::error::ServerError;
use crate::protocol::{Command, Request, ResponseWriter};

/// Runtime configuration.
///
/// `workers <= 1` selects sequential mode; anything above spawns that many
/// consumer threads.
pub struct ServerConfig {
    pub workers: usize,
}

// Producer/consumer coordination.
//
// The condition variable is pure wake-up machinery: the lock-free queue
// carries the actual data, and `pending` carries the drain accounting.
// The mutex critical sections are a handful of instructions; the producer
// notifies while holding the mutex so a consumer that just saw the queue
// empty cannot sleep through the wake-up for the record it missed.
struct SyncContext {
    idle: Mutex<()>,
    task_ready: Condvar,
    pending: WaitGroup,
    shutdown: AtomicBool,
}

impl SyncContext {
    fn new() -> Self {
        SyncContext {
            idle: Mutex::new(()),
            task_ready: Condvar::new(),
            pending: WaitGroup::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    // Wake idle consumers after an enqueue.
    fn notify_task(&self) {
        let _guard = self.idle.lock().unwrap();
        self.task_ready.notify_all();
    }

    // Flag shutdown and wake everyone so they can observe it.
    fn begin_shutdown(&self) {
        let _guard = self.idle.lock().unwrap();
        self.shutdown.store(true, Ordering::Release);
        self.task_ready.notify_all();
    }

    // Park until a request is available or shutdown is flagged.
    fn wait_for_task(&self, queue: &LockFreeQueue<Request>) -> Option<Request> {
        let mut guard = self.idle.lock().unwrap();
        loop {
            if let Some(request) = queue.dequeue() {
                return Some(request);
            }
            if self.shutdown.load(Ordering::Acquire) {
                return None;
            }
            guard = self.task_ready.wait(guard).unwrap();
        }
    }
}

/// Run the server until `DONE`, end-of-input or a decode error.
///
/// The feed, the input stream and the output encoder are created by the
/// caller and passed in; the runtime owns no global state. Returns after
/// all accepted requests have been executed and all workers have exited.
pub fn run<F, R, W>(
    feed: &F,
    config: &ServerConfig,
    input: R,
    output: &ResponseWriter<W>,
) -> Result<(), ServerError>
where
    F: Feed,
    R: Read,
    W: Write + Send,
{
    if config.workers <= 1 {
        return run_sequential(feed, input, output);
    }

    let queue = LockFreeQueue::new();
    let ctx = SyncContext::new();

    thread::scope(|scope| {
        for worker in 0..config.workers {
            let queue = &queue;
            let ctx = &ctx;
            scope.spawn(move || consumer(feed, output, queue, ctx, worker));
        }

        producer(input, &queue, &ctx)
    })
}

// Single producer: decode, account, enqueue, signal. `DONE` (or running
// out of input) drains outstanding work before flagging shutdown; a
// decode error drains too, then surfaces.
fn producer<R: Read>(
    input: R,
    queue: &LockFreeQueue<Request>,
    ctx: &SyncContext,
) -> Result<(), ServerError> {
    let mut result = Ok(());

    for record in Deserializer::from_reader(input).into_iter::<Request>() {
        match record {
            Ok(request) => {
                if request.command == Command::Done {
                    break;
                }
                ctx.pending.add(1);
                queue.enqueue(request);
                ctx.notify_task();
            }
            Err(err) => {
                error!("failed to decode request: {err}");
                result = Err(ServerError::Decode(err));
                break;
            }
        }
    }

    ctx.pending.wait();
    ctx.begin_shutdown();
    result
}

// Consumer loop: poll the queue, park when it runs dry, execute what
// comes out. An output error takes this worker down; the rest keep going.
fn consumer<F: Feed, W: Write>(
    feed: &F,
    output: &ResponseWriter<W>,
    queue: &LockFreeQueue<Request>,
    ctx: &SyncContext,
    worker: usize,
) {
    loop {
        let request = match queue.dequeue() {
            Some(request) => request,
            None => match ctx.wait_for_task(queue) {
                Some(request) => request,
                None => {
                    debug!(worker, "shutting down");
                    return;
                }
            },
        };

        let result = execute(feed, output, request);
        // Account for the task before bailing out, or the drain wait
        // would hang on this worker's failure.
        ctx.pending.done();

        if let Err(err) = result {
            error!(worker, "worker terminating: {err}");
            return;
        }
    }
}

// Sequential mode: the producer dispatches inline; no queue, no workers.
fn run_sequential<F: Feed, R: Read, W: Write>(
    feed: &F,
    input: R,
    output: &ResponseWriter<W>,
) -> Result<(), ServerError> {
    for record in Deserializer::from_reader(input).into_iter::<Request>() {
        let request = record.map_err(|err| {
            error!("failed to decode request: {err}");
            ServerError::Decode(err)
        })?;

        if request.command == Command::Done {
            return Ok(());
        }

        execute(feed, output, request)?;
    }

    Ok(())
}
