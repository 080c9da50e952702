//! End-to-end scenarios against known root hashes, mirroring the upstream
//! `tests/tests.py` suite (`test_insert_get_many`, `test_delete_many`,
//! `test_insert_get_lots`/`test_delete_lots`) this crate was distilled from.

use hex_literal::hex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use patricia_merkle_trie::{MemoryNodeStore, Trie, EMPTY_ROOT_HASH};

fn new_trie() -> Trie<MemoryNodeStore> {
    Trie::new(MemoryNodeStore::new(), false)
}

/// S1: do/dog/doge/horse against the textbook Ethereum root.
#[test]
fn s1_do_dog_doge_horse() {
    let mut trie = new_trie();
    trie.put(b"do", b"verb".to_vec()).unwrap();
    trie.put(b"dog", b"puppy".to_vec()).unwrap();
    trie.put(b"doge", b"coin".to_vec()).unwrap();
    trie.put(b"horse", b"stallion".to_vec()).unwrap();

    assert_eq!(
        trie.root_hash(),
        hex!("5991bb8c6514148a29db676a14ac506cd2cd5775ace63c30a4fe457715e9ac84")
    );
}

/// S2: two intermediate roots as keys are added one at a time.
#[test]
fn s2_incremental_roots() {
    let mut trie = new_trie();
    trie.put(b"doge", b"coin".to_vec()).unwrap();
    trie.put(b"do", b"verb".to_vec()).unwrap();

    assert_eq!(
        trie.root_hash(),
        hex!("f803dfcb7e8f1afd45e88eedb4699a7138d6c07b71243d9ae9bff720c99925f9")
    );

    trie.put(b"done", b"finished".to_vec()).unwrap();

    assert_eq!(
        trie.root_hash(),
        hex!("409cff4d820b394ed3fb1cd4497bdd19ffa68d30ae34157337a7043c94a3e8cb")
    );
}

/// S3: deleting back down to a prior key set reproduces that set's root,
/// independent of the insert/delete order taken to get there.
#[test]
fn s3_delete_back_to_saved_root() {
    let mut trie = new_trie();
    trie.put(b"do", b"verb".to_vec()).unwrap();
    trie.put(b"dog", b"puppy".to_vec()).unwrap();
    trie.put(b"doge", b"coin".to_vec()).unwrap();
    trie.put(b"horse", b"stallion".to_vec()).unwrap();

    let saved_root = trie.root_hash();

    trie.put(b"a", b"aaa".to_vec()).unwrap();
    trie.put(b"some_key", b"some_value".to_vec()).unwrap();
    trie.put(b"dodog", b"do_dog".to_vec()).unwrap();

    trie.delete(b"a").unwrap();
    trie.delete(b"some_key").unwrap();
    trie.delete(b"dodog").unwrap();

    assert_eq!(trie.root_hash(), saved_root);
}

/// S4: a seeded sweep of pseudo-random numeric keys, each mapped to its own
/// bytes doubled, fully round-tripped and then fully deleted.
#[test]
fn s4_random_numeric_key_sweep() {
    std::env::set_var("RUST_LOG", "trace");
    env_logger::init();

    let mut rng = StdRng::seed_from_u64(42);
    let mut keys = std::collections::BTreeSet::new();
    while keys.len() < 100 {
        keys.insert(rng.gen_range(1..=1_000_000u32));
    }
    let keys: Vec<Vec<u8>> = keys.into_iter().map(|n| n.to_string().into_bytes()).collect();

    let mut trie = new_trie();
    for key in &keys {
        let mut value = key.clone();
        value.extend_from_slice(key);
        trie.put(key, value).unwrap();
    }

    for key in &keys {
        let mut expected = key.clone();
        expected.extend_from_slice(key);
        assert_eq!(trie.get(key).unwrap(), expected);
    }

    for key in &keys {
        trie.delete(key).unwrap();
    }

    assert_eq!(trie.root_hash(), EMPTY_ROOT_HASH);
    assert!(trie.root().is_empty());
}

/// S5: secure mode hashes every key before it touches the trie structure,
/// so two tries built from the same (key, value) pairs but different
/// `secure` flags diverge, while each remains internally self-consistent.
#[test]
fn s5_secure_mode_round_trips() {
    let mut trie = Trie::new(MemoryNodeStore::new(), true);
    trie.put(b"do", b"verb".to_vec()).unwrap();
    trie.put(b"dog", b"puppy".to_vec()).unwrap();
    trie.put(b"doge", b"coin".to_vec()).unwrap();
    trie.put(b"horse", b"stallion".to_vec()).unwrap();

    assert_eq!(trie.get(b"do").unwrap(), b"verb");
    assert_eq!(trie.get(b"dog").unwrap(), b"puppy");
    assert_eq!(trie.get(b"doge").unwrap(), b"coin");
    assert_eq!(trie.get(b"horse").unwrap(), b"stallion");

    let insecure_root = {
        let mut t = new_trie();
        t.put(b"do", b"verb".to_vec()).unwrap();
        t.put(b"dog", b"puppy".to_vec()).unwrap();
        t.put(b"doge", b"coin".to_vec()).unwrap();
        t.put(b"horse", b"stallion".to_vec()).unwrap();
        t.root_hash()
    };
    assert_ne!(trie.root_hash(), insecure_root);

    trie.delete(b"do").unwrap();
    trie.delete(b"dog").unwrap();
    trie.delete(b"doge").unwrap();
    trie.delete(b"horse").unwrap();
    assert_eq!(trie.root_hash(), EMPTY_ROOT_HASH);
}
