use crate::{
    Error, FlakeConfig, FlakeId, Layout, Poll, SnowflakeGenerator, SystemClock, TWITTER_EPOCH_MS,
    TimeSource,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::thread::scope;

struct FixedTime {
    millis: i64,
}

impl TimeSource for FixedTime {
    fn current_millis(&self) -> i64 {
        self.millis
    }
}

/// A clock tests can move by hand.
#[derive(Default)]
struct MockTime {
    millis: AtomicI64,
}

impl MockTime {
    fn at(millis: i64) -> Arc<Self> {
        Arc::new(Self {
            millis: AtomicI64::new(millis),
        })
    }

    fn set(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl TimeSource for MockTime {
    fn current_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}

/// Returns `before` for the first `switch_after` reads, `after` from then on.
struct ScriptedTime {
    reads: AtomicUsize,
    switch_after: usize,
    before: i64,
    after: i64,
}

impl ScriptedTime {
    fn new(switch_after: usize, before: i64, after: i64) -> Self {
        Self {
            reads: AtomicUsize::new(0),
            switch_after,
            before,
            after,
        }
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl TimeSource for ScriptedTime {
    fn current_millis(&self) -> i64 {
        let read = self.reads.fetch_add(1, Ordering::SeqCst);
        if read < self.switch_after {
            self.before
        } else {
            self.after
        }
    }
}

trait PollExt {
    fn unwrap_ready(self) -> FlakeId;
    fn unwrap_pending(self) -> i64;
}

impl PollExt for Poll {
    fn unwrap_ready(self) -> FlakeId {
        match self {
            Self::Ready { id } => id,
            Self::Pending { yield_for } => panic!("unexpected pending (yield for: {yield_for})"),
        }
    }

    fn unwrap_pending(self) -> i64 {
        match self {
            Self::Ready { id } => panic!("unexpected ready ({id})"),
            Self::Pending { yield_for } => yield_for,
        }
    }
}

const T0: i64 = TWITTER_EPOCH_MS + 42;

#[test]
fn sequence_increments_within_same_millisecond() {
    let generator =
        SnowflakeGenerator::with_clock(1, FlakeConfig::default(), FixedTime { millis: T0 })
            .unwrap();
    let layout = *generator.layout();

    let id1 = generator.next_id();
    let id2 = generator.next_id();
    let id3 = generator.next_id();

    for id in [id1, id2, id3] {
        assert_eq!(id.timestamp(&layout), T0);
        assert_eq!(id.node(&layout), 1);
    }
    assert_eq!(id1.sequence(&layout), 0);
    assert_eq!(id2.sequence(&layout), 1);
    assert_eq!(id3.sequence(&layout), 2);
    assert!(id1 < id2 && id2 < id3);
}

#[test]
fn same_millisecond_ids_differ_by_one() {
    let config = FlakeConfig::new(1_288_834_974_657, 10, 12);
    let generator = SnowflakeGenerator::with_clock(5, config, FixedTime { millis: T0 }).unwrap();

    let a = generator.next_id();
    let b = generator.next_id();

    assert_eq!(b.as_i64() - a.as_i64(), 1);
    assert_eq!(a.as_i64(), (42 << 22) | (5 << 12));
}

#[test]
fn new_millisecond_resets_sequence() {
    let clock = MockTime::at(T0);
    let generator =
        SnowflakeGenerator::with_clock(3, FlakeConfig::default(), Arc::clone(&clock)).unwrap();
    let layout = *generator.layout();

    generator.next_id();
    generator.next_id();
    clock.set(T0 + 1);
    let id = generator.next_id();

    assert_eq!(id.timestamp(&layout), T0 + 1);
    assert_eq!(id.sequence(&layout), 0);
}

#[test]
fn rollover_waits_for_the_next_millisecond() {
    // 2 sequence bits: 4 IDs per millisecond. The 5th call wraps, then spins
    // through three more stale reads before the clock advances.
    let config = FlakeConfig::default().with_step_bits(2);
    let clock = ScriptedTime::new(8, T0, T0 + 1);
    let generator = SnowflakeGenerator::with_clock(7, config, &clock).unwrap();
    let layout = *generator.layout();

    for seq in 0..4 {
        let id = generator.next_id();
        assert_eq!(id.timestamp(&layout), T0);
        assert_eq!(id.sequence(&layout), seq);
    }

    let id = generator.next_id();
    assert_eq!(id.timestamp(&layout), T0 + 1);
    assert_eq!(id.sequence(&layout), 0);
    assert_eq!(id.node(&layout), 7);
    assert_eq!(clock.reads(), 9);
}

#[test]
fn rollover_with_default_layout() {
    let clock = ScriptedTime::new(4097, T0, T0 + 1);
    let generator = SnowflakeGenerator::with_clock(1, FlakeConfig::default(), &clock).unwrap();
    let layout = *generator.layout();

    let mut last = None;
    for seq in 0..=layout.step_mask() {
        let id = generator.next_id();
        assert_eq!(id.sequence(&layout), seq);
        assert_eq!(id.timestamp(&layout), T0);
        assert!(last < Some(id));
        last = Some(id);
    }

    let id = generator.next_id();
    assert_eq!(id.timestamp(&layout), T0 + 1);
    assert_eq!(id.sequence(&layout), 0);
    assert!(last < Some(id));
}

#[test]
fn clock_regression_accepts_earlier_timestamp() {
    let clock = MockTime::at(T0 + 100);
    let generator =
        SnowflakeGenerator::with_clock(2, FlakeConfig::default(), Arc::clone(&clock)).unwrap();
    let layout = *generator.layout();

    generator.next_id();
    let before = generator.next_id();
    assert_eq!(before.sequence(&layout), 1);

    clock.set(T0 + 50);
    let after = generator.next_id();
    assert_eq!(after.timestamp(&layout), T0 + 50);
    assert_eq!(after.sequence(&layout), 0);
    assert!(after < before);

    // The earlier millisecond is now the reference point.
    let next = generator.next_id();
    assert_eq!(next.timestamp(&layout), T0 + 50);
    assert_eq!(next.sequence(&layout), 1);
}

#[test]
fn poll_returns_pending_when_sequence_exhausted() {
    let config = FlakeConfig::default().with_step_bits(1);
    let clock = MockTime::at(T0);
    let generator = SnowflakeGenerator::with_clock(0, config, Arc::clone(&clock)).unwrap();
    let layout = *generator.layout();

    assert_eq!(generator.poll_id().unwrap_ready().sequence(&layout), 0);
    assert_eq!(generator.poll_id().unwrap_ready().sequence(&layout), 1);
    assert_eq!(generator.poll_id().unwrap_pending(), 1);
    assert_eq!(generator.poll_id().unwrap_pending(), 1);

    clock.set(T0 + 1);
    let id = generator.poll_id().unwrap_ready();
    assert_eq!(id.timestamp(&layout), T0 + 1);
    assert_eq!(id.sequence(&layout), 0);
}

#[test]
fn poll_and_next_agree() {
    let polled =
        SnowflakeGenerator::with_clock(9, FlakeConfig::default(), FixedTime { millis: T0 })
            .unwrap();
    let blocking =
        SnowflakeGenerator::with_clock(9, FlakeConfig::default(), FixedTime { millis: T0 })
            .unwrap();

    for _ in 0..100 {
        assert_eq!(polled.poll_id().unwrap_ready(), blocking.next_id());
    }
}

#[test]
fn next_id_with_backs_off_until_ready() {
    let config = FlakeConfig::default().with_step_bits(0);
    let clock = MockTime::at(T0);
    let generator = SnowflakeGenerator::with_clock(0, config, Arc::clone(&clock)).unwrap();
    let layout = *generator.layout();

    let first = generator.next_id_with(|_| unreachable!());
    assert_eq!(first.timestamp(&layout), T0);

    let mut backoffs = Vec::new();
    let second = generator.next_id_with(|ms| {
        backoffs.push(ms);
        clock.set(T0 + 1);
    });
    assert_eq!(backoffs, vec![1]);
    assert_eq!(second.timestamp(&layout), T0 + 1);
}

#[test]
fn node_range_is_validated() {
    let layout = Layout::default();
    let max = layout.node_max();

    assert!(SnowflakeGenerator::new(0).is_ok());
    assert_eq!(SnowflakeGenerator::new(max).unwrap().node(), max);
    assert_eq!(
        SnowflakeGenerator::new(max + 1).unwrap_err(),
        Error::InvalidNodeId { node: max + 1, max }
    );
    assert_eq!(
        SnowflakeGenerator::new(-1).unwrap_err(),
        Error::InvalidNodeId { node: -1, max }
    );
}

#[test]
fn node_range_follows_config() {
    let config = FlakeConfig::default().with_node_bits(3);
    assert!(SnowflakeGenerator::with_config(7, config).is_ok());

    let err = SnowflakeGenerator::with_config(8, config).unwrap_err();
    assert_eq!(err, Error::InvalidNodeId { node: 8, max: 7 });
    assert_eq!(
        err.to_string(),
        "node id 8 is out of range, must be between 0 and 7"
    );
}

#[test]
#[should_panic(expected = "exceeds 63 bits")]
fn oversized_config_panics_on_construction() {
    let _ = SnowflakeGenerator::with_config(0, FlakeConfig::new(0, 32, 32));
}

#[test]
fn custom_epoch_is_subtracted() {
    let epoch = 1_700_000_000_000;
    let config = FlakeConfig::default().with_epoch_ms(epoch);
    let generator =
        SnowflakeGenerator::with_clock(4, config, FixedTime { millis: epoch + 10 }).unwrap();
    let layout = *generator.layout();

    let id = generator.next_id();
    assert_eq!(id.as_i64(), (10 << 22) | (4 << 12));
    assert_eq!(id.timestamp(&layout), epoch + 10);
}

#[test]
fn generated_fields_round_trip() {
    let config = FlakeConfig::new(TWITTER_EPOCH_MS, 6, 9);
    let generator = SnowflakeGenerator::with_config(33, config).unwrap();
    let layout = *generator.layout();

    for _ in 0..10_000 {
        let id = generator.next_id();
        let rebuilt = layout.compose(id.timestamp(&layout), id.node(&layout), id.sequence(&layout));
        assert_eq!(rebuilt, id);
        assert_eq!(id.decode(&layout).compose(&layout), id);
    }
}

#[test]
fn distinct_nodes_never_collide() {
    let a = SnowflakeGenerator::with_clock(1, FlakeConfig::default(), FixedTime { millis: T0 })
        .unwrap();
    let b = SnowflakeGenerator::with_clock(2, FlakeConfig::default(), FixedTime { millis: T0 })
        .unwrap();

    let mut seen = HashSet::new();
    for _ in 0..1_000 {
        assert!(seen.insert(a.next_id()));
        assert!(seen.insert(b.next_id()));
    }
}

#[test]
fn system_clock_ids_are_monotonic() {
    const TOTAL_IDS: usize = 4096 * 64;

    let generator = SnowflakeGenerator::new(1).unwrap();
    let layout = *generator.layout();

    let mut last = generator.next_id();
    for _ in 1..TOTAL_IDS {
        let id = generator.next_id();
        assert!(id > last, "{id} not greater than {last}");
        assert_eq!(id.node(&layout), 1);
        last = id;
    }
}

#[test]
fn threaded_ids_are_unique() {
    const THREADS: usize = 8;
    const TOTAL_IDS: usize = 4096 * 64;
    const IDS_PER_THREAD: usize = TOTAL_IDS / THREADS;

    let generator = SnowflakeGenerator::with_clock(0, FlakeConfig::default(), SystemClock).unwrap();

    let ids: Vec<Vec<FlakeId>> = scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    let mut ids = Vec::with_capacity(IDS_PER_THREAD);
                    let mut last = None;
                    for _ in 0..IDS_PER_THREAD {
                        let id = generator.next_id();
                        // Each thread observes its own IDs in increasing order.
                        assert!(last < Some(id));
                        last = Some(id);
                        ids.push(id);
                    }
                    ids
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let seen: HashSet<FlakeId> = ids.into_iter().flatten().collect();
    assert_eq!(seen.len(), TOTAL_IDS, "Expected {TOTAL_IDS} unique IDs");
}
