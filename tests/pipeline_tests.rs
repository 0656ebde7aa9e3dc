//! End-to-end tests: tick → policy → queue → engine → release.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use watchbell::alert::{AlertMode, AlertPolicy, Selection};
use watchbell::bells::{bells_at, Bell, DaySeconds};
use watchbell::config::Config;
use watchbell::dispatcher::AlertDispatcher;
use watchbell::errors::{PlaybackError, SpeechError, WatchError};
use watchbell::notifier::Notifier;
use watchbell::player::{EffectPlayer, PlaybackEngine, SpeechSynth, Utterance};
use watchbell::queue::SoundQueue;
use watchbell::service::{Control, WatchService};
use watchbell::sound::{PlaybackRequest, SoundEffect};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Heard {
    Effect(SoundEffect),
    Speech(String),
}

#[derive(Default)]
struct Ears {
    log: Mutex<Vec<(Instant, Heard)>>,
}

impl Ears {
    fn heard(&self) -> Vec<Heard> {
        self.log.lock().unwrap().iter().map(|(_, h)| h.clone()).collect()
    }

    fn times(&self) -> Vec<Instant> {
        self.log.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    fn push(&self, heard: Heard) {
        self.log.lock().unwrap().push((Instant::now(), heard));
    }
}

struct FakePlayer(Arc<Ears>);

impl EffectPlayer for FakePlayer {
    fn play(&self, effect: SoundEffect) -> Result<(), PlaybackError> {
        self.0.push(Heard::Effect(effect));
        Ok(())
    }
}

struct FakeSpeech {
    ears: Arc<Ears>,
    talk: Duration,
}

impl SpeechSynth for FakeSpeech {
    fn speak(&self, text: &str) -> Result<Utterance, SpeechError> {
        self.ears.push(Heard::Speech(text.to_string()));
        let (done, utterance) = Utterance::channel();
        let talk = self.talk;
        tokio::spawn(async move {
            tokio::time::sleep(talk).await;
            done.complete();
        });
        Ok(utterance)
    }
}

struct Rig {
    dispatcher: AlertDispatcher,
    queue: Arc<SoundQueue>,
    ears: Arc<Ears>,
}

fn rig(chimes: bool, mode: AlertMode) -> Rig {
    let ears = Arc::new(Ears::default());
    let engine = PlaybackEngine::new(
        Arc::new(FakePlayer(ears.clone())),
        Arc::new(FakeSpeech {
            ears: ears.clone(),
            talk: Duration::from_secs(2),
        }),
        Duration::from_secs(30),
    );
    let queue = Arc::new(SoundQueue::start(engine, 16));
    let policy = Arc::new(AlertPolicy::new(chimes, mode));
    let dispatcher = AlertDispatcher::new(policy, queue.clone(), Notifier::new(false));
    Rig {
        dispatcher,
        queue,
        ears,
    }
}

fn counter() -> (Arc<AtomicU32>, impl FnOnce() + Send + 'static) {
    let calls = Arc::new(AtomicU32::new(0));
    let seen = calls.clone();
    (calls, move || {
        seen.fetch_add(1, Ordering::SeqCst);
    })
}

#[tokio::test(start_paused = true)]
async fn midnight_chimes_eight_bells_then_releases() {
    let rig = rig(true, AlertMode::Off);
    let (released, release) = counter();

    let selection = rig.dispatcher.on_tick(0, 0, release).unwrap();
    assert_eq!(selection, Selection::Chime(Bell::EIGHT));
    assert_eq!(released.load(Ordering::SeqCst), 0, "released before playback");

    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(released.load(Ordering::SeqCst), 1);
    assert_eq!(rig.ears.heard(), vec![Heard::Effect(SoundEffect::DoubleBell); 4]);
    rig.queue.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn release_waits_for_the_last_delay() {
    let rig = rig(true, AlertMode::Off);
    let start = Instant::now();
    let released_at = Arc::new(Mutex::new(None));
    let slot = released_at.clone();

    // 01:00 is two bells: one double stroke, then the 3s post delay
    rig.dispatcher
        .on_tick(0, 3_600, move || *slot.lock().unwrap() = Some(Instant::now()))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;

    let at = released_at.lock().unwrap().expect("released") - start;
    assert_eq!(at, Duration::from_secs(3));
    rig.queue.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn second_dog_watch_ends_on_eight_bells() {
    let rig = rig(true, AlertMode::Off);
    let (released, release) = counter();

    let selection = rig.dispatcher.on_tick(0, 64_800, release).unwrap();
    assert_eq!(selection, Selection::Chime(Bell::EIGHT));
    assert_eq!(bells_at(DaySeconds::new(64_800).unwrap()).count(), 8);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(released.load(Ordering::SeqCst), 1);
    rig.queue.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn repeat_alert_rings_once() {
    let rig = rig(false, AlertMode::Every10);
    let (released, release) = counter();

    let selection = rig.dispatcher.on_tick(0, 600, release).unwrap();
    assert_eq!(selection, Selection::Repeat);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(rig.ears.heard(), vec![Heard::Effect(SoundEffect::Ring)]);
    assert_eq!(released.load(Ordering::SeqCst), 1);
    rig.queue.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn quiet_tick_releases_synchronously() {
    let rig = rig(true, AlertMode::Every15);
    let (released, release) = counter();

    let selection = rig.dispatcher.on_tick(0, 601, release).unwrap();
    assert_eq!(selection, Selection::None);
    assert_eq!(released.load(Ordering::SeqCst), 1);
    assert_eq!(rig.queue.pending(), 0);
    rig.queue.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn out_of_range_tick_is_rejected_but_released() {
    let rig = rig(true, AlertMode::Every5);

    for bad in [-1, 86_400, 100_000] {
        let (released, release) = counter();
        let result = rig.dispatcher.on_tick(0, bad, release);
        assert_eq!(result, Err(WatchError::DayOutOfRange(bad)));
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(rig.ears.heard().is_empty());
    rig.queue.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn producers_on_other_threads_keep_fifo_without_overlap() {
    let rig = rig(false, AlertMode::Off);
    let finished = Arc::new(Mutex::new(Vec::new()));

    for (i, text) in ["one", "two", "three"].into_iter().enumerate() {
        let queue = rig.queue.clone();
        let finished = finished.clone();
        std::thread::spawn(move || {
            queue.enqueue(
                PlaybackRequest::announcement(SoundEffect::Buzzer, text)
                    .on_complete(move |_| finished.lock().unwrap().push((i, Instant::now()))),
            );
        })
        .join()
        .unwrap();
    }

    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(
        rig.ears.heard(),
        vec![
            Heard::Effect(SoundEffect::Buzzer),
            Heard::Speech("one".into()),
            Heard::Effect(SoundEffect::Buzzer),
            Heard::Speech("two".into()),
            Heard::Effect(SoundEffect::Buzzer),
            Heard::Speech("three".into()),
        ]
    );

    let finished = finished.lock().unwrap().clone();
    assert_eq!(finished.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1, 2]);

    // each request starts only after the previous one completed
    let times = rig.ears.times();
    assert!(times[2] >= finished[0].1);
    assert!(times[4] >= finished[1].1);
    rig.queue.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn text_alert_waits_behind_a_chime() {
    let rig = rig(true, AlertMode::Off);
    let (released, release) = counter();

    rig.dispatcher.on_tick(0, 1_800 * 3, release).unwrap();
    rig.dispatcher.text_alert("depth under keel two metres");

    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(
        rig.ears.heard(),
        vec![
            Heard::Effect(SoundEffect::DoubleBell),
            Heard::Effect(SoundEffect::SingleBell),
            Heard::Speech("depth under keel two metres".into()),
        ]
    );
    assert_eq!(released.load(Ordering::SeqCst), 1);
    rig.queue.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_still_releases_pending_ticks() {
    let rig = rig(true, AlertMode::Every5);
    let (first, release_first) = counter();
    let (second, release_second) = counter();

    rig.dispatcher.on_tick(0, 0, release_first).unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    rig.dispatcher.on_tick(0, 300, release_second).unwrap();

    rig.queue.shutdown().await;

    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 1);
    assert_eq!(rig.ears.heard(), vec![Heard::Effect(SoundEffect::DoubleBell); 4]);
}

#[tokio::test(start_paused = true)]
async fn service_controls_adjust_the_policy() {
    let ears = Arc::new(Ears::default());
    let config = Config::parse("watch:\n  chimes: false\n  alert_mode: every_15\n").unwrap();
    let service = WatchService::with_players(
        config,
        Arc::new(FakePlayer(ears.clone())),
        Arc::new(FakeSpeech {
            ears,
            talk: Duration::from_secs(1),
        }),
    );
    let dispatcher = service.dispatcher();

    service.apply(Control::CycleAlertMode);
    assert_eq!(dispatcher.policy().mode(), AlertMode::Off);
    service.apply(Control::ToggleChimes);
    assert!(dispatcher.policy().chime_enabled());

    dispatcher.set_alert_mode(AlertMode::Every5);
    dispatcher.set_chime_enabled(false);
    let (released, release) = counter();
    assert_eq!(dispatcher.on_tick(0, 300, release).unwrap(), Selection::Repeat);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(released.load(Ordering::SeqCst), 1);
}
