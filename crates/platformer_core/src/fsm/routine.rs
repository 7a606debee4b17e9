//! Cooperative coroutine scheduler
//!
//! A [`Routine`] runs a stack of [`Coroutine`]s, one step per frame. A
//! coroutine is any value that can be resumed with its owner and context and
//! reports how it wants to be suspended through a [`Yield`]. Closures work
//! for single-step behavior; multi-step choreography is written as a small
//! struct holding its own step counter.
//!
//! The routine usually lives inside the object it drives, so its methods are
//! associated functions taking the owner plus an accessor that borrows the
//! routine back out of it. This lets a coroutine mutate its owner freely
//! while it runs, including restarting or clearing the very routine it runs
//! on. A generation counter (`run_id`) detects that case: a coroutine whose
//! routine was restarted during its own step is dropped instead of resumed.

/// Suspension requested by a coroutine step
pub enum Yield<O, C> {
    /// Resume again immediately within the same update
    Continue,
    /// Resume on the next update
    Frame,
    /// Resume after the given number of seconds
    Wait(f32),
    /// Run a child to completion, then resume
    Run(Box<dyn Coroutine<O, C>>),
    /// Resume once the predicate returns true
    Until(Box<dyn FnMut(&O, &C) -> bool>),
    /// Finished; the parent (if any) resumes immediately
    Done,
}

impl<O, C> std::fmt::Debug for Yield<O, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Continue => write!(f, "Continue"),
            Self::Frame => write!(f, "Frame"),
            Self::Wait(seconds) => write!(f, "Wait({seconds})"),
            Self::Run(_) => write!(f, "Run(..)"),
            Self::Until(_) => write!(f, "Until(..)"),
            Self::Done => write!(f, "Done"),
        }
    }
}

impl<O: 'static, C: 'static> Yield<O, C> {
    /// Run `child` as a sub-coroutine
    pub fn run(child: impl Coroutine<O, C> + 'static) -> Self {
        Self::Run(Box::new(child))
    }

    /// Block until `predicate` holds
    pub fn until(predicate: impl FnMut(&O, &C) -> bool + 'static) -> Self {
        Self::Until(Box::new(predicate))
    }
}

/// A resumable unit of work driven by a [`Routine`]
pub trait Coroutine<O, C> {
    /// Run until the next suspension point
    fn resume(&mut self, owner: &mut O, ctx: &mut C) -> Yield<O, C>;
}

impl<O, C, F> Coroutine<O, C> for F
where
    F: FnMut(&mut O, &mut C) -> Yield<O, C>,
{
    fn resume(&mut self, owner: &mut O, ctx: &mut C) -> Yield<O, C> {
        self(owner, ctx)
    }
}

/// Boxed coroutine
pub type BoxedCoroutine<O, C> = Box<dyn Coroutine<O, C>>;

/// Borrows the routine back out of its owner
pub type RoutineAccess<O, C> = fn(&mut O) -> &mut Routine<O, C>;

/// Coroutine that waits `seconds` once and then finishes
pub struct WaitFor {
    seconds: f32,
    started: bool,
}

impl WaitFor {
    /// Wait for `seconds`
    pub fn new(seconds: f32) -> Self {
        Self {
            seconds,
            started: false,
        }
    }
}

impl<O, C> Coroutine<O, C> for WaitFor {
    fn resume(&mut self, _owner: &mut O, _ctx: &mut C) -> Yield<O, C> {
        if self.started {
            Yield::Done
        } else {
            self.started = true;
            Yield::Wait(self.seconds)
        }
    }
}

/// Frame-stepped executor for a stack of coroutines
pub struct Routine<O, C> {
    stack: Vec<BoxedCoroutine<O, C>>,
    wait: f32,
    until: Option<Box<dyn FnMut(&O, &C) -> bool>>,
    run_id: u64,
}

impl<O, C> Default for Routine<O, C> {
    fn default() -> Self {
        Self {
            stack: Vec::new(),
            wait: 0.0,
            until: None,
            run_id: 0,
        }
    }
}

impl<O, C> Routine<O, C> {
    /// Create an idle routine
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any coroutine is in flight
    pub fn is_running(&self) -> bool {
        !self.stack.is_empty()
    }

    /// Seconds left on the current wait
    pub fn waiting(&self) -> f32 {
        self.wait.max(0.0)
    }

    /// Generation counter, bumped on every run and clear
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    /// Drop all in-flight work
    pub fn clear(&mut self) {
        if self.is_running() {
            log::trace!("Routine cleared with {} coroutine(s) in flight", self.stack.len());
        }
        self.stack.clear();
        self.wait = 0.0;
        self.until = None;
        self.run_id = self.run_id.wrapping_add(1);
    }

    /// Replace any running work with `coroutine` and step it immediately
    pub fn run(owner: &mut O, ctx: &mut C, access: RoutineAccess<O, C>, coroutine: BoxedCoroutine<O, C>) {
        let routine = access(owner);
        routine.clear();
        routine.stack.push(coroutine);
        Self::step(owner, ctx, access);
    }

    /// Advance by one frame of `delta` seconds
    pub fn update(owner: &mut O, ctx: &mut C, access: RoutineAccess<O, C>, delta: f32) {
        let routine = access(owner);
        if routine.wait > 0.0 {
            routine.wait -= delta;
            return;
        }

        if let Some(mut predicate) = routine.until.take() {
            let run_id = routine.run_id;
            if !predicate(owner, ctx) {
                let routine = access(owner);
                if routine.run_id == run_id {
                    routine.until = Some(predicate);
                }
                return;
            }
        }

        Self::step(owner, ctx, access);
    }

    fn step(owner: &mut O, ctx: &mut C, access: RoutineAccess<O, C>) {
        loop {
            let routine = access(owner);
            let Some(mut current) = routine.stack.pop() else {
                return;
            };
            let run_id = routine.run_id;

            let yielded = current.resume(owner, ctx);

            let routine = access(owner);
            if routine.run_id != run_id {
                log::debug!("Discarding coroutine continuation after its routine was restarted");
                return;
            }

            match yielded {
                Yield::Continue => routine.stack.push(current),
                Yield::Frame => {
                    routine.stack.push(current);
                    return;
                }
                Yield::Wait(seconds) => {
                    routine.stack.push(current);
                    routine.wait = seconds;
                    return;
                }
                Yield::Run(child) => {
                    routine.stack.push(current);
                    routine.stack.push(child);
                }
                Yield::Until(predicate) => {
                    routine.stack.push(current);
                    routine.until = Some(predicate);
                    return;
                }
                Yield::Done => {}
            }
        }
    }
}
