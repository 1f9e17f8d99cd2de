//! Deferred work, for events that must fire after the current call stack unwinds.

use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use std::{collections::VecDeque, rc::Rc};
use tracing::{trace, trace_span};

type Task = Box<dyn FnOnce()>;

#[derive(Default)]
struct Queue {
	tasks: RefCell<VecDeque<Task>>,
	/// Automatic flushing, through the host's microtask queue where there is one.
	microtask: bool,
	flush_scheduled: Cell<bool>,
	depth: Cell<usize>,
	running: Cell<bool>,
}

/// A FIFO of deferred tasks.
///
/// Manual schedulers (from [`Scheduler::new`]) run only when [`Scheduler::run_pending`] is called.
/// [`Scheduler::microtask`] schedulers flush themselves: on `wasm32` from the window's microtask queue,
/// elsewhere when the outermost [`Batch`] ends.
#[derive(Clone, Default)]
pub struct Scheduler(Rc<Queue>);
impl Debug for Scheduler {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Scheduler")
			.field("pending", &self.pending())
			.field("microtask", &self.0.microtask)
			.field("depth", &self.0.depth.get())
			.finish()
	}
}

/// Marks a call that defers work. See [`Scheduler::batch`].
#[must_use = "a batch ends when dropped"]
pub struct Batch(Scheduler);
impl Debug for Batch {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Batch").field(&self.0).finish()
	}
}
impl Drop for Batch {
	fn drop(&mut self) {
		let queue = &(self.0).0;
		let depth = queue.depth.get().saturating_sub(1);
		queue.depth.set(depth);
		if depth == 0 && queue.microtask && !queue.flush_scheduled.get() && !queue.running.get() && self.0.pending() > 0 {
			trace!("Flushing at the end of the outermost batch.");
			self.0.run_pending();
		}
	}
}

impl Scheduler {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// A scheduler that flushes itself after the current task on `wasm32`,
	/// and when the outermost [`Batch`] ends on hosts without a microtask queue.
	#[must_use]
	pub fn microtask() -> Self {
		Self(Rc::new(Queue {
			microtask: true,
			..Queue::default()
		}))
	}

	/// Starts a batch, which ends when the returned guard is dropped. Batches nest.
	///
	/// Without a host microtask queue, a [`Scheduler::microtask`] scheduler runs its pending tasks
	/// once the outermost batch ends. Manual schedulers ignore batches.
	pub fn batch(&self) -> Batch {
		self.0.depth.set(self.0.depth.get() + 1);
		Batch(self.clone())
	}

	pub fn defer(&self, task: impl FnOnce() + 'static) {
		self.0.tasks.borrow_mut().push_back(Box::new(task));
		if self.0.microtask && !self.0.flush_scheduled.replace(true) {
			self.schedule_flush();
		}
	}

	#[must_use]
	pub fn pending(&self) -> usize {
		self.0.tasks.borrow().len()
	}

	/// Runs deferred tasks until none are left, including ones deferred meanwhile. Returns how many ran.
	pub fn run_pending(&self) -> usize {
		let _span = trace_span!("run_pending").entered();
		self.0.flush_scheduled.set(false);
		let was_running = self.0.running.replace(true);
		let mut count = 0;
		loop {
			// Not held across the call, so tasks can defer more work.
			let task = self.0.tasks.borrow_mut().pop_front();
			match task {
				Some(task) => {
					task();
					count += 1;
				}
				None => break,
			}
		}
		self.0.running.set(was_running);
		count
	}

	#[cfg(target_arch = "wasm32")]
	fn schedule_flush(&self) {
		use tracing::warn;
		use wasm_bindgen::{closure::Closure, JsCast};

		let window = match web_sys::window() {
			Some(window) => window,
			None => {
				warn!("No window to queue a microtask on. Deferred tasks run when the outermost batch ends.");
				self.0.flush_scheduled.set(false);
				return;
			}
		};
		let scheduler = self.clone();
		let flush = Closure::once_into_js(move || {
			scheduler.run_pending();
		});
		window.queue_microtask(flush.unchecked_ref());
	}

	#[cfg(not(target_arch = "wasm32"))]
	fn schedule_flush(&self) {
		self.0.flush_scheduled.set(false);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tracing_test::traced_test;

	#[test]
	fn fifo_including_nested() {
		let scheduler = Scheduler::new();
		let log = Rc::new(RefCell::new(Vec::new()));
		{
			let log = Rc::clone(&log);
			let inner = scheduler.clone();
			scheduler.defer(move || {
				log.borrow_mut().push(1);
				let log = Rc::clone(&log);
				inner.defer(move || log.borrow_mut().push(3));
			});
		}
		{
			let log = Rc::clone(&log);
			scheduler.defer(move || log.borrow_mut().push(2));
		}
		assert_eq!(scheduler.pending(), 2);
		assert!(log.borrow().is_empty());
		assert_eq!(scheduler.run_pending(), 3);
		assert_eq!(*log.borrow(), vec![1, 2, 3]);
		assert_eq!(scheduler.run_pending(), 0);
	}

	#[test]
	#[traced_test]
	fn microtask_scheduler_flushes_when_the_outermost_batch_ends() {
		let scheduler = Scheduler::microtask();
		let ran = Rc::new(Cell::new(0));
		{
			let _outer = scheduler.batch();
			{
				let _inner = scheduler.batch();
				let ran = Rc::clone(&ran);
				scheduler.defer(move || ran.set(ran.get() + 1));
			}
			assert_eq!(scheduler.pending(), 1);
			assert_eq!(ran.get(), 0);
		}
		assert_eq!(scheduler.pending(), 0);
		assert_eq!(ran.get(), 1);
		assert!(logs_contain("Flushing at the end of the outermost batch."));
	}

	#[test]
	fn repeated_batches_leave_nothing_pending() {
		let scheduler = Scheduler::microtask();
		for _ in 0..100 {
			let _batch = scheduler.batch();
			scheduler.defer(|| ());
			scheduler.defer(|| ());
		}
		assert_eq!(scheduler.pending(), 0);
	}

	#[test]
	fn tasks_may_batch_while_flushing() {
		let scheduler = Scheduler::microtask();
		let log = Rc::new(RefCell::new(Vec::new()));
		{
			let _batch = scheduler.batch();
			let inner = scheduler.clone();
			let first = Rc::clone(&log);
			scheduler.defer(move || {
				let _nested = inner.batch();
				let nested = Rc::clone(&first);
				inner.defer(move || nested.borrow_mut().push(3));
				first.borrow_mut().push(1);
			});
			let second = Rc::clone(&log);
			scheduler.defer(move || second.borrow_mut().push(2));
		}
		assert_eq!(*log.borrow(), vec![1, 2, 3]);
	}

	#[test]
	fn manual_schedulers_ignore_batches() {
		let scheduler = Scheduler::new();
		{
			let _batch = scheduler.batch();
			scheduler.defer(|| ());
		}
		assert_eq!(scheduler.pending(), 1);
	}
}
