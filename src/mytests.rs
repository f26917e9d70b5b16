use crate::*;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::HashMap;

fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn keys<K: Clone, V, const M: usize>(m: &bt::BTMap<K, V, M>) -> Vec<K> {
    m.entries().into_iter().map(|(k, _)| k.clone()).collect()
}

/// Map with keys 1..=n, value is ten times the key.
fn upto(n: i32) -> BTMap<i32, i32> {
    let mut m = BTMap::new();
    for i in 1..=n {
        m.insert(i, i * 10);
        m.check().unwrap();
    }
    m
}

#[test]
fn empty_map_test() {
    let mut m = BTMap::<i32, &str>::new();
    assert!(m.is_empty());
    assert_eq!(m.height(), 1);
    assert_eq!(m.get(&1), None);
    assert_eq!(m.remove(&1), None);
    assert_eq!(m.dump(), "[]\n");
    m.check().unwrap();
}

#[test]
fn insert_get_test() {
    let mut m = BTMap::new();
    for i in 0..100 {
        assert_eq!(m.insert(i, i.to_string()), None);
    }
    assert_eq!(m.len(), 100);
    for i in 0..100 {
        assert_eq!(m.get(&i), Some(&i.to_string()));
        assert!(m.contains_key(&i));
    }
    assert_eq!(m.get(&100), None);
    m.check().unwrap();
}

#[test]
fn overwrite_test() {
    let mut m = upto(10);
    let before = m.dump();
    assert_eq!(m.insert(7, 700), Some(70));
    assert_eq!(m.len(), 10);
    assert_eq!(m.get(&7), Some(&700));
    // Overwriting never changes shape.
    assert_eq!(m.dump(), before);

    // Key held in an internal node.
    assert_eq!(m.insert(4, 400), Some(40));
    assert_eq!(m.get(&4), Some(&400));
    assert_eq!(m.len(), 10);
    m.check().unwrap();
}

#[test]
fn remove_test() {
    let mut m = upto(20);
    assert_eq!(m.remove(&13), Some(130));
    assert_eq!(m.get(&13), None);
    assert_eq!(m.len(), 19);
    assert_eq!(m.remove_entry(&14), Some((14, 140)));
    assert_eq!(m.len(), 18);
    m.check().unwrap();
}

#[test]
fn remove_absent_test() {
    let mut m = upto(20);
    let before = m.dump();
    assert_eq!(m.remove(&0), None);
    assert_eq!(m.remove(&21), None);
    assert_eq!(m.len(), 20);
    assert_eq!(m.dump(), before);
    assert_eq!(m.remove(&5), Some(50));
    assert_eq!(m.remove(&5), None);
    assert_eq!(m.len(), 19);
    m.check().unwrap();
}

#[test]
fn one_to_five_test() {
    init_log();
    let mut m = BTMap::new();
    m.insert(1, ());
    m.insert(2, ());
    assert_eq!(m.height(), 1);
    m.insert(3, ());
    assert_eq!(m.dump(), "[2]\n[1] [3] \n");
    m.insert(4, ());
    m.insert(5, ());
    assert_eq!(m.height(), 2);
    assert_eq!(m.dump(), "[2,4]\n[1] [3] [5] \n");
    assert_eq!(keys(&m), [1, 2, 3, 4, 5]);

    m.remove(&3);
    m.check().unwrap();
    assert_eq!(keys(&m), [1, 2, 4, 5]);
    assert_eq!(m.dump(), "[2]\n[1] [4,5] \n");
}

#[test]
fn internal_remove_test() {
    init_log();
    let mut m = upto(5);
    // 4 is in the root, it is replaced by its predecessor 3.
    assert_eq!(m.remove(&4), Some(40));
    m.check().unwrap();
    assert_eq!(m.dump(), "[2]\n[1] [3,5] \n");

    // Predecessor taken from a leaf with a spare element.
    let mut m = upto(5);
    m.insert(0, 0);
    assert_eq!(m.dump(), "[2,4]\n[0,1] [3] [5] \n");
    assert_eq!(m.remove(&2), Some(20));
    assert_eq!(m.dump(), "[1,4]\n[0] [3] [5] \n");
    m.check().unwrap();
}

#[test]
fn borrow_right_test() {
    let mut m = upto(4);
    assert_eq!(m.dump(), "[2]\n[1] [3,4] \n");
    m.remove(&1);
    assert_eq!(m.dump(), "[3]\n[2] [4] \n");
    m.check().unwrap();
}

#[test]
fn borrow_left_test() {
    let mut m = upto(3);
    m.insert(0, 0);
    assert_eq!(m.dump(), "[2]\n[0,1] [3] \n");
    m.remove(&3);
    assert_eq!(m.dump(), "[1]\n[0] [2] \n");
    m.check().unwrap();
}

#[test]
fn merge_left_collapse_test() {
    init_log();
    let mut m = upto(3);
    m.remove(&3);
    assert_eq!(m.height(), 1);
    assert_eq!(m.dump(), "[1,2]\n");
    m.check().unwrap();
}

#[test]
fn merge_left_internal_test() {
    // Underflow in the last child of an internal node whose left sibling is poor.
    let mut m = upto(7);
    assert_eq!(m.dump(), "[4]\n[2] [6] \n[1] [3] [5] [7] \n");
    m.remove(&7);
    assert_eq!(m.dump(), "[2,4]\n[1] [3] [5,6] \n");
    m.check().unwrap();
    assert_eq!(keys(&m), [1, 2, 3, 4, 5, 6]);
}

#[test]
fn remove_all_fwd_test() {
    let n = 1000;
    let mut m = upto(n);
    for i in 1..=n {
        assert_eq!(m.remove(&i), Some(i * 10));
        m.check().unwrap();
    }
    assert!(m.is_empty());
    assert_eq!(m.height(), 1);
    assert_eq!(m.dump(), "[]\n");
}

#[test]
fn remove_all_rev_test() {
    let n = 1000;
    let mut m = upto(n);
    for i in (1..=n).rev() {
        assert_eq!(m.remove(&i), Some(i * 10));
        m.check().unwrap();
    }
    assert!(m.is_empty());
    assert_eq!(m.height(), 1);
}

#[test]
fn remove_middle_out_test() {
    let n = 1001;
    let mut m = upto(n);
    let mid = n / 2 + 1;
    for d in 0..=n / 2 {
        for k in [mid - d, mid + d] {
            m.remove(&k);
            m.check().unwrap();
        }
    }
    assert!(m.is_empty());
}

/// Random inserts and removes on a bounded key range, checked against a HashMap.
fn stress<const M: usize>(seed: u64, ops: usize, range: i64) {
    init_log();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut m = bt::BTMap::<i64, u64, M>::new();
    let mut model = HashMap::new();
    for _ in 0..ops {
        let k = rng.gen_range(0..range);
        if rng.gen_bool(0.6) {
            let v = rng.gen::<u64>();
            assert_eq!(m.insert(k, v), model.insert(k, v));
        } else {
            assert_eq!(m.remove(&k), model.remove(&k));
        }
        if let Err(e) = m.check() {
            panic!("order {} seed {}: {}\n{}", M, seed, e, m.dump());
        }
        assert_eq!(m.len(), model.len());
    }
    let mut expected: Vec<(i64, u64)> = model.into_iter().collect();
    expected.sort();
    let got: Vec<(i64, u64)> = m.entries().into_iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(got, expected);
}

#[test]
fn stress_order3_test() {
    for seed in 0..4 {
        stress::<3>(seed, 10_000, 500);
    }
}

#[test]
fn stress_order5_test() {
    for seed in 0..4 {
        stress::<5>(seed, 10_000, 800);
    }
}

#[test]
fn stress_order7_test() {
    stress::<7>(42, 20_000, 2000);
}

#[test]
fn stress_small_range_test() {
    // Few distinct keys, so the tree repeatedly grows and collapses.
    stress::<3>(7, 10_000, 12);
}

#[test]
fn order5_shape_test() {
    let mut m = bt::BTMap::<i32, (), 5>::new();
    for i in 1..=5 {
        m.insert(i, ());
    }
    assert_eq!(m.dump(), "[3]\n[1,2] [4,5] \n");
    m.remove(&1);
    assert_eq!(m.dump(), "[2,3,4,5]\n");
    m.check().unwrap();
}

#[test]
fn borrowed_key_test() {
    let mut m = BTMap::new();
    m.insert("alpha".to_string(), 1);
    m.insert("beta".to_string(), 2);
    m.insert("gamma".to_string(), 3);
    assert_eq!(m.get("beta"), Some(&2));
    assert_eq!(m["gamma"], 3);
    *m.get_mut("alpha").unwrap() += 10;
    assert_eq!(m.get_key_value("alpha"), Some((&"alpha".to_string(), &11)));
    assert_eq!(m.remove("beta"), Some(2));
    assert!(!m.contains_key("beta"));
    assert_eq!(m.dump(), "[alpha,gamma]\n");
}

#[test]
#[should_panic(expected = "no entry found for key")]
fn index_missing_test() {
    let m = upto(3);
    let _v = m[&4];
}

#[test]
fn collect_test() {
    let m: BTMap<i32, i32> = (0..10).rev().map(|x| (x, x * x)).collect();
    assert_eq!(m.len(), 10);
    assert_eq!(m[&9], 81);
    m.check().unwrap();

    let mut a = BTMap::from([(1, 2), (3, 4)]);
    a.extend([(3, 5), (6, 7)]);
    assert_eq!(format!("{:?}", a), "{1: 2, 3: 5, 6: 7}");

    let b = a.clone();
    assert_eq!(a, b);
    a.remove(&6);
    assert_ne!(a, b);
}

#[test]
fn clear_test() {
    let mut m = upto(100);
    m.clear();
    assert!(m.is_empty());
    assert_eq!(m.height(), 1);
    assert_eq!(m.get(&1), None);
    m.insert(1, 1);
    assert_eq!(m.len(), 1);
    m.check().unwrap();
}

#[test]
fn check_detects_faults_test() {
    let mut m = upto(7);
    m.len = 8;
    assert_eq!(m.check(), Err(CheckError::LenMismatch { len: 8, counted: 7 }));

    let mut m = upto(7);
    m.root.c[0].c[0].v[0].0 = 3;
    assert_eq!(m.check(), Err(CheckError::OutOfRange { depth: 2 }));

    let mut m = upto(7);
    m.root.c[1].c.pop();
    assert_eq!(
        m.check(),
        Err(CheckError::ChildCount {
            depth: 1,
            elements: 1,
            children: 1
        })
    );

    let mut m = upto(3);
    m.root.c[0].v.pop();
    let e = m.check().unwrap_err();
    assert_eq!(e, CheckError::Underfull { depth: 1, len: 0 });
    assert_eq!(e.to_string(), "node at depth 1 holds only 0 elements");

    let mut m = upto(4);
    m.root.c[1].v.swap(0, 1);
    assert_eq!(m.check(), Err(CheckError::Unsorted { depth: 1 }));

    let mut m = upto(4);
    let moved = std::mem::take(&mut m.root.c[1]);
    m.root.c[0].c.push(moved);
    assert!(m.check().is_err());
}
