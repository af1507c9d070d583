//! The serialized fast path must agree with decoding the node and stepping
//! through it, for every node shape and every probe key.

use blinkdb::index::btree::{Node, NodeFlags, NodeSerializer, Step};
use blinkdb::serializer::{
    BytesSerializer, DeltaU64Serializer, GroupSerializer, KeySerializer, PrefixSerializer,
    U64Serializer,
};
use blinkdb::{RecordId, StrictMode};
use proptest::prelude::*;

/// Flags, sorted distinct keys and the entry count they require.
fn arb_shape<K, S>(keys: S) -> impl Strategy<Value = (NodeFlags, Vec<K>, usize)>
where
    K: Ord + Clone + std::fmt::Debug,
    S: Strategy<Value = std::collections::BTreeSet<K>>,
{
    (0u8..16, keys).prop_filter_map("entry count must be valid", |(bits, keys)| {
        let flags = NodeFlags::from_bits(bits)?;
        if flags.is_directory() && flags.is_last_key_duplicated() {
            return None;
        }
        let count = flags.entry_count(keys.len())?;
        Some((flags, keys.into_iter().collect(), count))
    })
}

fn arb_node<K, S>(keys: S) -> impl Strategy<Value = Node<K, Vec<u8>>>
where
    K: Ord + Clone + std::fmt::Debug,
    S: Strategy<Value = std::collections::BTreeSet<K>>,
{
    arb_shape(keys)
        .prop_flat_map(|(flags, keys, count)| {
            (
                Just(flags),
                Just(keys),
                1..=RecordId::MAX.0,
                proptest::collection::vec(1..=RecordId::MAX.0, count),
                proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..8), count),
            )
        })
        .prop_map(|(flags, keys, link, children, values)| {
            let link = if flags.is_right_edge() { RecordId::NONE } else { RecordId(link) };
            if flags.is_directory() {
                let children = children.into_iter().map(RecordId).collect();
                Node::directory(flags, link, keys, children).unwrap()
            } else {
                Node::leaf(flags, link, keys, values).unwrap()
            }
        })
}

type Outcome = blinkdb::Result<Step<Vec<u8>>>;

/// Materialized and serialized outcomes for one probe.
fn both_paths<KS>(
    codec: &NodeSerializer<KS, BytesSerializer>,
    node: &Node<KS::Item, Vec<u8>>,
    key: &KS::Item,
) -> (Outcome, Outcome)
where
    KS: KeySerializer,
{
    let bytes = codec.serialize(node).unwrap();
    let decoded = codec.deserialize(&bytes).unwrap();
    let materialized = decoded
        .step(codec.key_serializer(), key)
        .map(Step::cloned);
    let fast = codec.binary_step(&bytes, key);
    (materialized, fast)
}

fn check_all_probes<KS>(
    codec: &NodeSerializer<KS, BytesSerializer>,
    node: &Node<KS::Item, Vec<u8>>,
    extra: &[KS::Item],
) -> Result<(), TestCaseError>
where
    KS: KeySerializer,
    KS::Item: Clone + std::fmt::Debug,
{
    for key in node.keys().iter().chain(extra) {
        match both_paths(codec, node, key) {
            (Ok(materialized), Ok(fast)) => {
                prop_assert_eq!(materialized, fast, "key {:?} in {:?}", key, node);
            }
            // a right-edge directory with no children routes nowhere
            (Err(a), Err(b)) => {
                prop_assert!(a.is_corruption() && b.is_corruption(), "{} / {}", a, b);
                prop_assert!(node.is_directory() && node.is_right_edge());
            }
            (a, b) => prop_assert!(false, "key {:?}: {:?} vs {:?}", key, a, b),
        }
    }
    Ok(())
}

/// A valid node whose keys were shuffled afterwards, serialized without
/// order checks, plus any junk appended after it.
fn arb_unchecked_bytes() -> impl Strategy<Value = (Node<u64, Vec<u8>>, Vec<u8>)> {
    arb_node(proptest::collection::btree_set(0u64..100, 0..10))
        .prop_flat_map(|node| {
            let keys = node.keys().to_vec();
            (
                Just(node),
                Just(keys).prop_shuffle(),
                proptest::collection::vec(any::<u8>(), 0..3),
            )
        })
        .prop_map(|(node, keys, junk)| {
            let shuffled = Node::new(node.flags(), node.link(), keys, node.entries().clone()).unwrap();
            let mut bytes = NodeSerializer::new(U64Serializer, BytesSerializer)
                .serialize(&shuffled)
                .unwrap();
            bytes.extend_from_slice(&junk);
            (shuffled, bytes)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn prop_fixed_u64_keys_agree(
        node in arb_node(proptest::collection::btree_set(0u64..200, 0..12)),
        probes in proptest::collection::vec(0u64..210, 0..8),
    ) {
        let codec = NodeSerializer::new(U64Serializer, BytesSerializer);
        check_all_probes(&codec, &node, &probes)?;
    }

    #[test]
    fn prop_delta_u64_keys_agree(
        node in arb_node(proptest::collection::btree_set(any::<u64>(), 0..12)),
        probes in proptest::collection::vec(any::<u64>(), 0..8),
    ) {
        let codec = NodeSerializer::new(DeltaU64Serializer, BytesSerializer);
        let edges = [0, u64::MAX];
        check_all_probes(&codec, &node, &probes)?;
        check_all_probes(&codec, &node, &edges)?;
    }

    #[test]
    fn prop_byte_keys_agree(
        node in arb_node(proptest::collection::btree_set(
            proptest::collection::vec(any::<u8>(), 0..4),
            0..10,
        )),
        probes in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..4), 0..8),
    ) {
        let codec = NodeSerializer::new(BytesSerializer, BytesSerializer);
        check_all_probes(&codec, &node, &probes)?;
    }

    #[test]
    fn prop_tuple_keys_agree(
        node in arb_node(proptest::collection::btree_set((0u64..3, 0u64..50), 0..12)),
        probes in proptest::collection::vec((0u64..4, 0u64..55), 0..8),
    ) {
        let codec = NodeSerializer::new(PrefixSerializer::new(U64Serializer, DeltaU64Serializer), BytesSerializer);
        check_all_probes(&codec, &node, &probes)?;
    }

    #[test]
    fn prop_paranoid_paths_reject_the_same_records(
        (node, bytes) in arb_unchecked_bytes(),
        probes in proptest::collection::vec(0u64..110, 1..8),
    ) {
        let codec = NodeSerializer::new(U64Serializer, BytesSerializer)
            .with_strict_mode(StrictMode::Paranoid);
        let well_formed = codec.deserialize(&bytes).is_ok();
        let ascending = node.keys().windows(2).all(|w| w[0] < w[1]);
        prop_assert!(!well_formed || ascending);

        for key in node.keys().iter().chain(&probes) {
            let materialized = codec
                .deserialize(&bytes)
                .and_then(|decoded| decoded.step(codec.key_serializer(), key).map(Step::cloned));
            let fast = codec.binary_step(&bytes, key);
            match (materialized, fast) {
                (Ok(a), Ok(b)) => prop_assert_eq!(a, b, "key {}", key),
                (Err(a), Err(b)) => {
                    prop_assert!(a.is_corruption() && b.is_corruption(), "{} / {}", a, b);
                    prop_assert!(well_formed || a.to_string() == b.to_string(), "{} / {}", a, b);
                }
                (a, b) => prop_assert!(false, "key {}: {:?} vs {:?}", key, a, b),
            }
        }
    }
}

#[test]
fn test_value_codec_is_only_asked_for_one_value() {
    /// Refuses to decode whole arrays.
    struct SingleValue;

    impl GroupSerializer for SingleValue {
        type Item = u64;

        fn serialize_array(
            &self,
            out: &mut blinkdb::encoding::ByteWriter,
            items: &[u64],
        ) -> blinkdb::Result<()> {
            U64Serializer.serialize_array(out, items)
        }

        fn deserialize_array(
            &self,
            _input: &mut blinkdb::encoding::ByteReader<'_>,
            _count: usize,
        ) -> blinkdb::Result<Vec<u64>> {
            panic!("fast path decoded the whole value array");
        }

        fn get_serialized(
            &self,
            input: &mut blinkdb::encoding::ByteReader<'_>,
            count: usize,
            index: usize,
        ) -> blinkdb::Result<u64> {
            U64Serializer.get_serialized(input, count, index)
        }
    }

    let codec = NodeSerializer::new(U64Serializer, SingleValue);
    let flags = NodeFlags::empty().with_left_edge().with_right_edge();
    let keys: Vec<u64> = (0..100).collect();
    let values: Vec<u64> = keys.iter().map(|k| k + 1000).collect();
    let node = Node::leaf(flags, RecordId::NONE, keys, values).unwrap();
    let bytes = codec.serialize(&node).unwrap();

    assert_eq!(codec.binary_step(&bytes, &42).unwrap(), Step::Found(1042));
    assert_eq!(codec.binary_step(&bytes, &100).unwrap(), Step::Absent);
}
