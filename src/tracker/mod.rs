//! periodic display tick and the running loop while an activity is tracked

use std::io::{self, BufRead};
use std::sync::{Arc, atomic::AtomicBool, atomic::Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error};

/* thread::sleep is no accurate measure of time passed, so ticks never count
 * sleeps; every tick reports the elapsed time since the ticker started
 * according to Instant, and the next tick is scheduled relative to the
 * start as well (no drift accumulating over a long session)
 *
 * what actually gets logged is decided by the START/PAUSE timestamps in the
 * db module, the ticker only feeds the display and never touches storage
 */

// granularity at which the ticker thread checks whether it should stop
const POLL : Duration = Duration::from_millis(100);

/// handle to a running ticker; stopping (or dropping) it joins the thread,
/// so no callback runs after stop() returns
pub struct TickerHandle
{
    shouldrun : Arc<AtomicBool>,
    thread    : Option<JoinHandle<()>>,
    started   : Instant,
}

impl TickerHandle
{
    /// time since the ticker was spawned
    pub fn elapsed(&self) -> Duration
    {
        self.started.elapsed()
    }

    /// stop ticking; returns the total elapsed time
    pub fn stop(mut self) -> Duration
    {
        self.halt();
        self.started.elapsed()
    }

    fn halt(&mut self)
    {
        self.shouldrun.store(false, Ordering::SeqCst); // AtomicBool to false

        if let Some(thread) = self.thread.take()
        {
            if let Err(e) = thread.join()
            {
                error!("Timer thread error: {:?}", e);
            }
        }
    }
}

impl Drop for TickerHandle
{
    fn drop(&mut self)
    {
        self.halt();
    }
}

/// call `on_tick` every `interval` on a dedicated thread w/ the elapsed time;
/// callbacks run one after another on that thread, never overlapping
pub fn spawn<F>(interval : Duration, mut on_tick : F) -> TickerHandle
where
    F: FnMut(Duration) + Send + 'static,
{
    let shouldrun = Arc::new(AtomicBool::new(true));
    let started = Instant::now();

    // variables to be captured by timer_thread closure
    let shouldrun_clone = Arc::clone(&shouldrun);

    let timer_thread = thread::spawn(move || {
        let mut ticks : u32 = 0;

        while shouldrun_clone.load(Ordering::SeqCst)
        {
            let next = started + interval * (ticks + 1);
            let now = Instant::now();

            if now < next
            {
                thread::sleep((next - now).min(POLL));
                continue;
            }

            ticks += 1;
            on_tick(started.elapsed());
        }

        debug!("ticker stopped after {ticks} ticks");
    });

    TickerHandle {
        shouldrun,
        thread : Some(timer_thread),
        started,
    }
}

/// user input while the timer runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle
{
    /// Enter; switch between running and paused
    Switch,
    /// q-Enter (or end of input); stop tracking
    Quit,
}

/// block until the user presses Enter or q-Enter; other input is ignored
pub fn wait_for_toggle<R : BufRead>(input : &mut R) -> io::Result<Toggle>
{
    let mut line = String::new();

    loop
    {
        line.clear(); // necessary, read_line() doesn't do this by itself!

        if input.read_line(&mut line)? == 0
        {
            return Ok(Toggle::Quit);
        }

        match line.trim()
        {
            ""  => return Ok(Toggle::Switch),
            "q" => return Ok(Toggle::Quit),
            _   => (),
        }
    }
}

/// running loop while a timer is shown; `on_tick` redraws the display,
/// returns what ended the loop and how long it ran
pub fn workloop<R, F>(input : &mut R, on_tick : F)
    -> io::Result<(Toggle, Duration)>
where
    R: BufRead,
    F: FnMut(Duration) + Send + 'static,
{
    let ticker = spawn(Duration::from_secs(1), on_tick);
    let toggle = wait_for_toggle(input);
    let elapsed = ticker.stop();

    Ok((toggle?, elapsed))
}
