// Table engine scenario suite (consolidated).
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Bookkeeping: len() equals successful inserts minus removals.
// - Idempotence: byte-identical {key, yield} pairs insert once.
// - Canonicalization: both orientations of a connection are one key.
// - Growth: rehash preserves membership and does not change len().
// - Strategy independence: behavior is identical under LCG, Zobrist,
//   and keyed-digest hashing; only bucket placement differs.
use std::rc::Rc;

use flow_table::{
    Conn, ConnStats, HashFn, Object, ObjectKind, Table, TableConfig, TableError,
};

fn conn_counter_table(hash_fn: HashFn) -> Table {
    Table::new(
        TableConfig::new(ObjectKind::Conn, ObjectKind::U32),
        Rc::new(hash_fn),
    )
}

fn all_strategies() -> Vec<HashFn> {
    vec![
        HashFn::lcg(),
        HashFn::zobrist(16),
        HashFn::keyed_digest(),
    ]
}

// Test: the bidirectional-flow scenario.
// Assumes: canonicalization folds both orientations onto one key.
// Verifies: inserting a flow and its reverse with distinct yields gives
// count_entries == 2 on either orientation; a wildcard-yield remove on
// either orientation removes both.
#[test]
fn reverse_orientation_shares_one_key() {
    for hash_fn in all_strategies() {
        let mut t = conn_counter_table(hash_fn);
        let fwd = Conn::new(0x0102_0304, 0x0506_0708, 101, 102, 11);
        let rev = fwd.reversed();

        t.insert(Rc::new(fwd.into()), Rc::new(Object::U32(1)))
            .unwrap();
        t.insert(Rc::new(rev.into()), Rc::new(Object::U32(11)))
            .unwrap();
        assert_eq!(t.len(), 2);

        assert_eq!(t.count_entries(Some(&Object::Conn(fwd))), 2);
        assert_eq!(t.count_entries(Some(&Object::Conn(rev))), 2);

        assert_eq!(t.remove(Some(&Object::Conn(rev)), None), 2);
        assert!(t.is_empty());
        assert!(!t.exists(Some(&Object::Conn(fwd)), None));
    }
}

// Test: one-sided connection keys keep the two half-connections apart.
// Verifies: forward and reverse orientations are distinct keys under the
// one-sided kind.
#[test]
fn one_sided_keys_stay_directional() {
    let mut t = Table::new(
        TableConfig::new(ObjectKind::OneSidedConn, ObjectKind::U32),
        Rc::new(HashFn::lcg()),
    );
    let fwd = Conn::new(0x0102_0304, 0x0506_0708, 101, 102, 11);
    let rev = fwd.reversed();

    t.insert(Rc::new(fwd.into()), Rc::new(Object::U32(1)))
        .unwrap();
    assert!(!t.exists(Some(&Object::Conn(rev)), None));

    t.insert(Rc::new(rev.into()), Rc::new(Object::U32(2)))
        .unwrap();
    assert_eq!(t.count_entries(Some(&Object::Conn(fwd))), 1);
    assert_eq!(t.count_entries(Some(&Object::Conn(rev))), 1);
    assert_eq!(t.len(), 2);
}

// Test: duplicate {key, yield} pairs are soft-rejected under every
// strategy; len() is unchanged by the failed insert.
#[test]
fn duplicate_insert_is_a_noop() {
    for hash_fn in all_strategies() {
        let mut t = conn_counter_table(hash_fn);
        let c = Conn::new(0x0a00_0001, 0x0a00_0002, 1000, 53, 17);
        t.insert(Rc::new(c.into()), Rc::new(Object::U32(7)))
            .unwrap();
        assert_eq!(
            t.insert(Rc::new(c.into()), Rc::new(Object::U32(7))),
            Err(TableError::AlreadyExists)
        );
        // The reverse orientation with the same yield is the same pair.
        assert_eq!(
            t.insert(Rc::new(c.reversed().into()), Rc::new(Object::U32(7))),
            Err(TableError::AlreadyExists)
        );
        assert_eq!(t.len(), 1);
    }
}

// Test: growth-triggering insert sequences leave every prior pair
// findable; len() reflects inserts minus removals throughout.
#[test]
fn growth_preserves_membership() {
    for hash_fn in all_strategies() {
        let mut t = Table::new(
            TableConfig {
                initial_buckets: 16,
                ..TableConfig::new(ObjectKind::Conn, ObjectKind::U32)
            },
            Rc::new(hash_fn),
        );

        // 100 distinct flows force several doublings past 16 buckets.
        for i in 0..100u32 {
            let c = Conn::new(0x0a00_0000 + i, 0x0b00_0000 + i, 1000, 80, 6);
            t.insert(Rc::new(c.into()), Rc::new(Object::U32(i)))
                .unwrap();
        }
        assert_eq!(t.len(), 100);
        assert!(t.nbuckets() >= 256);

        for i in 0..100u32 {
            let c = Conn::new(0x0a00_0000 + i, 0x0b00_0000 + i, 1000, 80, 6);
            assert!(
                t.exists(Some(&Object::Conn(c)), Some(&Object::U32(i))),
                "flow {} lost after growth",
                i
            );
        }

        assert_eq!(t.remove(None, None), 100);
        assert!(t.is_empty());
    }
}

// Test: the removal scenario. Three items share one key with distinct
// yields; a wildcard-yield remove drops all three.
#[test]
fn remove_key_with_wildcard_yield() {
    let mut t = conn_counter_table(HashFn::zobrist(16));
    let c = Conn::new(0x0102_0304, 0x0506_0708, 101, 102, 11);
    for y in [1u32, 2, 3] {
        t.insert(Rc::new(c.into()), Rc::new(Object::U32(y)))
            .unwrap();
    }
    assert_eq!(t.len(), 3);

    assert_eq!(t.remove(Some(&Object::Conn(c)), None), 3);
    assert_eq!(t.len(), 0);
    assert_eq!(t.lookup(Some(&Object::Conn(c)), None), None);
}

// Test: lookup with a yield filter selects among items sharing a key.
#[test]
fn lookup_filters_on_yield() {
    let mut t = conn_counter_table(HashFn::lcg());
    let c = Conn::new(0x0102_0304, 0x0506_0708, 101, 102, 11);
    for y in [1u32, 2, 3] {
        t.insert(Rc::new(c.into()), Rc::new(Object::U32(y)))
            .unwrap();
    }

    let h = t
        .lookup(Some(&Object::Conn(c)), Some(&Object::U32(2)))
        .expect("yield 2 present");
    match h.yield_ref(&t) {
        Some(Object::U32(2)) => {}
        other => panic!("unexpected yield: {:?}", other),
    }
    assert_eq!(t.lookup(Some(&Object::Conn(c)), Some(&Object::U32(9))), None);
}

// Test: per-flow statistics accumulate through yield_mut.
// Assumes: Stats yields are legal while keys stay unique (the Stats
// comparator must never run).
#[test]
fn stats_yields_accumulate_per_flow() {
    let mut t = Table::new(
        TableConfig::new(ObjectKind::Conn, ObjectKind::Stats),
        Rc::new(HashFn::keyed_digest()),
    );
    let c = Conn::new(0x0a00_0001, 0x0a00_0002, 40000, 443, 6);
    let initial = ConnStats {
        pkts: 1,
        pkts_fwd: 1,
        pkts_bwd: 0,
        bytes: 60.0,
        bytes_fwd: 60.0,
        bytes_bwd: 0.0,
    };
    let h = t
        .insert(Rc::new(c.into()), Rc::new(initial.into()))
        .unwrap();

    // A packet in the reverse direction updates the same item.
    let h2 = t
        .lookup(Some(&Object::Conn(c.reversed())), None)
        .expect("reverse orientation finds the flow");
    assert_eq!(h, h2);
    match h2.yield_mut(&mut t) {
        Some(Object::Stats(stats)) => stats.add(&ConnStats {
            pkts: 1,
            pkts_fwd: 0,
            pkts_bwd: 1,
            bytes: 1500.0,
            bytes_fwd: 0.0,
            bytes_bwd: 1500.0,
        }),
        other => panic!("unexpected yield: {:?}", other),
    }

    match h.yield_ref(&t) {
        Some(Object::Stats(stats)) => {
            assert_eq!(stats.pkts, 2);
            assert_eq!(stats.pkts_bwd, 1);
            assert_eq!(stats.bytes, 1560.0);
        }
        other => panic!("unexpected yield: {:?}", other),
    }
}

// Test: u32 and f64 key kinds work end to end (addresses and metrics,
// not just connections).
#[test]
fn scalar_key_kinds() {
    let mut by_addr = Table::new(
        TableConfig::new(ObjectKind::U32, ObjectKind::Double),
        Rc::new(HashFn::lcg()),
    );
    by_addr
        .insert(Rc::new(Object::U32(0x0a00_0001)), Rc::new(Object::Double(0.25)))
        .unwrap();
    assert!(by_addr.exists(Some(&Object::U32(0x0a00_0001)), None));
    assert!(!by_addr.exists(Some(&Object::U32(0x0a00_0002)), None));

    let mut by_metric = Table::new(
        TableConfig::new(ObjectKind::Double, ObjectKind::U32),
        Rc::new(HashFn::lcg()),
    );
    by_metric
        .insert(Rc::new(Object::Double(3.5)), Rc::new(Object::U32(1)))
        .unwrap();
    assert!(by_metric.exists(Some(&Object::Double(3.5)), None));
}

// Test: an explicit rebuild relinks items without changing membership,
// and iteration after the rebuild still visits every item once.
#[test]
fn explicit_rebuild_then_iterate() {
    let mut t = conn_counter_table(HashFn::zobrist(16));
    for i in 0..20u32 {
        let c = Conn::new(0x0a00_0000 + i, 0x0b00_0000 + i, 1000, 80, 6);
        t.insert(Rc::new(c.into()), Rc::new(Object::U32(i)))
            .unwrap();
    }

    t.rebuild(4096);
    assert_eq!(t.len(), 20);
    assert_eq!(t.nbuckets(), 4096);

    let mut visited = 0;
    let mut cursor = t.next_matching(None, None);
    while let Some(h) = cursor {
        visited += 1;
        cursor = t.next_matching(Some(h), None);
    }
    assert_eq!(visited, 20);
}
