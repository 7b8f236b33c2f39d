use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use cubetimer::input::{InputTranslator, ReleaseDetection};
use cubetimer::runtime::{
    FixedTicker, Runner, TestEventSource, Ticker, TimerEvent, TimerEventSource,
};
use cubetimer::scramble::ScrambleSource;
use cubetimer::session::Phase;
use cubetimer::timer::Timer;

// Headless integration using the internal runtime + Timer without a TTY.
// A producer thread plays keystrokes in real time while the test drives the
// same loop the binary runs: translate input, feed the timer, run frames.

#[derive(Debug, Default)]
struct Numbered(usize);

impl ScrambleSource for Numbered {
    fn next_scramble(&mut self) -> String {
        self.0 += 1;
        format!("scramble {}", self.0)
    }
}

fn key(code: KeyCode, kind: KeyEventKind) -> TimerEvent {
    TimerEvent::Key(KeyEvent {
        code,
        modifiers: KeyModifiers::NONE,
        kind,
        state: KeyEventState::NONE,
    })
}

fn space(kind: KeyEventKind) -> TimerEvent {
    key(KeyCode::Char(' '), kind)
}

/// Sends each event after its delay, measured from the previous one.
fn play(tx: Sender<TimerEvent>, script: Vec<(u64, TimerEvent)>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for (delay, event) in script {
            thread::sleep(Duration::from_millis(delay));
            if tx.send(event).is_err() {
                return;
            }
        }
    })
}

/// Runs the event loop until `done` holds or the step budget runs out.
fn drive<E: TimerEventSource, T: Ticker>(
    runner: &mut Runner<E, T>,
    timer: &mut Timer,
    input: &mut InputTranslator,
    done: impl Fn(&Timer) -> bool,
) {
    for _ in 0..2000u32 {
        let now = Instant::now();
        match runner.step() {
            TimerEvent::Tick => {
                if let Some((gesture, at)) = input.poll(now) {
                    timer.handle(gesture, at);
                }
                timer.on_frame(now);
            }
            TimerEvent::Key(key) => {
                if let Some(gesture) = input.key(&key, now) {
                    timer.handle(gesture, now);
                }
            }
            TimerEvent::Mouse(mouse) => {
                if let Some(gesture) = input.mouse(&mouse) {
                    timer.handle(gesture, now);
                }
            }
            TimerEvent::Resize => {}
        }
        if done(timer) {
            return;
        }
    }
}

#[test]
fn headless_hold_solve_and_stop() {
    let mut timer = Timer::new(Box::new(Numbered::default()));
    let mut input = InputTranslator::new(ReleaseDetection::Native);

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    let producer = play(
        tx,
        vec![
            (0, space(KeyEventKind::Press)),
            (400, space(KeyEventKind::Release)),
            (250, space(KeyEventKind::Press)),
            (20, space(KeyEventKind::Release)),
        ],
    );

    drive(&mut runner, &mut timer, &mut input, |t| {
        t.history().len() == 1 && !t.press().awaiting_release
    });
    producer.join().unwrap();

    assert_eq!(timer.phase(), Phase::Stopped);
    assert_eq!(timer.history().len(), 1);

    let solve = timer.history().last().unwrap().duration;
    assert!(solve >= Duration::from_millis(200), "solve was {solve:?}");
    assert!(solve < Duration::from_secs(5), "solve was {solve:?}");
    assert_eq!(timer.displayed(), solve);

    assert_eq!(timer.scrambles().current(), "scramble 2");
    assert_eq!(timer.scrambles().previous(), "scramble 1");
    assert!(!timer.is_animating());
}

#[test]
fn headless_short_tap_never_starts() {
    let mut timer = Timer::new(Box::new(Numbered::default()));
    let mut input = InputTranslator::new(ReleaseDetection::Native);

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    let producer = play(
        tx,
        vec![
            (0, space(KeyEventKind::Press)),
            (50, space(KeyEventKind::Release)),
        ],
    );

    let deadline = Instant::now() + Duration::from_millis(300);
    drive(&mut runner, &mut timer, &mut input, |_| {
        Instant::now() >= deadline
    });
    producer.join().unwrap();

    assert_eq!(timer.phase(), Phase::Idle);
    assert!(timer.history().is_empty());
    assert_eq!(timer.press().down_at, None);
}

#[test]
fn headless_inferred_release_starts_from_repeats() {
    let mut timer = Timer::new(Box::new(Numbered::default()));
    let mut input = InputTranslator::new(ReleaseDetection::Inferred {
        gap: Duration::from_millis(150),
    });

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    // a held space on a terminal that only reports presses
    let mut script = vec![(0, space(KeyEventKind::Press))];
    script.extend((0..15).map(|_| (30, space(KeyEventKind::Press))));
    let producer = play(tx.clone(), script);

    drive(&mut runner, &mut timer, &mut input, |t| {
        t.phase() == Phase::Running
    });
    producer.join().unwrap();

    assert_eq!(timer.phase(), Phase::Running);

    tx.send(key(KeyCode::Char('x'), KeyEventKind::Press)).unwrap();
    drive(&mut runner, &mut timer, &mut input, |t| {
        t.phase() == Phase::Stopped
    });

    assert_eq!(timer.history().len(), 1);
}

#[test]
fn headless_escape_clears_after_stop() {
    let mut timer = Timer::new(Box::new(Numbered::default()));
    let mut input = InputTranslator::new(ReleaseDetection::Native);

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    let producer = play(
        tx,
        vec![
            (0, space(KeyEventKind::Press)),
            (350, space(KeyEventKind::Release)),
            (100, key(KeyCode::Esc, KeyEventKind::Press)),
            (10, key(KeyCode::Esc, KeyEventKind::Release)),
            (10, key(KeyCode::Esc, KeyEventKind::Press)),
        ],
    );

    drive(&mut runner, &mut timer, &mut input, |t| {
        t.history().len() == 1 && t.phase() == Phase::Idle
    });
    producer.join().unwrap();

    assert_eq!(timer.phase(), Phase::Idle);
    assert_eq!(timer.displayed(), Duration::ZERO);
    // reset keeps the recorded solve
    assert_eq!(timer.history().len(), 1);
}
