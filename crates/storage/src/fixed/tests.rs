//! Tests for fixed-keys storages

use super::*;
use crate::traits::AnnotationStorage;
use proptest::prelude::*;
use rstest::rstest;
use std::collections::BTreeSet;

fn boolean_layer(count: usize) -> LayerManifest {
    (0..count).fold(LayerManifest::new("flags"), |layer, i| {
        layer.with_key(KeyManifest::new(format!("k{i:02}"), ValueType::Boolean))
    })
}

fn attach<L: SlotLayout>(layer: &LayerManifest) -> FixedKeysStorage<u32, L> {
    let mut storage = FixedKeysStorage::new(16, 8);
    storage.add_notify(layer).unwrap();
    storage
}

fn pos_lemma() -> LayerManifest {
    LayerManifest::new("tokens")
        .with_key(KeyManifest::new("pos", ValueType::Boolean))
        .with_key(KeyManifest::new("lemma", ValueType::Boolean))
}

#[test]
fn packed_boolean_pos_lemma_scenario() {
    let mut storage = attach::<PackedBooleans>(&pos_lemma());

    assert!(storage.add_item(&7));
    storage.set_boolean_value(&7, "pos", true).unwrap();
    assert_eq!(storage.annotated_keys(&7), vec![AnnotationKey::from("pos")]);
    assert!(!storage.get_boolean_value(&7, "lemma").unwrap());

    assert!(storage.remove_item(&7));
    assert!(!storage.get_boolean_value(&7, "pos").unwrap());
    assert!(!storage.has_annotations_for(&7));
}

#[test]
fn packed_boolean_rejects_more_than_31_keys() {
    let mut storage = PackedBooleanStorage::<u32>::new(16, 8);
    storage.add_notify(&boolean_layer(MAX_PACKED_KEYS)).unwrap();

    let mut storage = PackedBooleanStorage::<u32>::new(16, 8);
    let err = storage.add_notify(&boolean_layer(MAX_PACKED_KEYS + 1)).unwrap_err();
    assert!(matches!(
        err,
        Error::CapacityExceeded {
            key_count: 32,
            max: 31,
            ..
        }
    ));
}

#[test]
fn packed_boolean_compares_against_default_pattern() {
    let layer = LayerManifest::new("flags")
        .with_key(KeyManifest::new("a", ValueType::Boolean).with_no_entry(true))
        .with_key(KeyManifest::new("b", ValueType::Boolean));
    let mut storage = attach::<PackedBooleans>(&layer);
    assert_eq!(storage.base().unwrap().layout().pattern(), 0b01);

    assert!(storage.add_item(&1));
    assert!(!storage.add_item(&1));
    assert!(storage.get_boolean_value(&1, "a").unwrap());
    assert!(!storage.has_annotations_for(&1));

    storage.set_boolean_value(&1, "a", false).unwrap();
    assert!(storage.has_annotations_for(&1));
    assert_eq!(storage.annotated_keys(&1), vec![AnnotationKey::from("a")]);

    storage.set_boolean_value(&1, "a", true).unwrap();
    assert!(!storage.contains_item(&1));
}

#[rstest]
#[case::packed(true)]
#[case::bitset(false)]
fn boolean_variants_reject_other_types(#[case] packed: bool) {
    let layer = LayerManifest::new("t")
        .with_key(KeyManifest::new("flag", ValueType::Boolean))
        .with_key(KeyManifest::new("count", ValueType::Integer));
    let err = if packed {
        PackedBooleanStorage::<u32>::new(4, 8).add_notify(&layer)
    } else {
        BitSetBooleanStorage::<u32>::new(4, 8).add_notify(&layer)
    }
    .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn bitset_boolean_has_no_ceiling() {
    let layer = boolean_layer(100);
    let mut storage = attach::<BitSetBooleans>(&layer);

    storage.set_boolean_value(&1, "k99", true).unwrap();
    storage.set_boolean_value(&1, "k03", true).unwrap();
    assert_eq!(
        storage.annotated_keys(&1),
        vec![AnnotationKey::from("k03"), AnnotationKey::from("k99")]
    );
    assert!(storage.get_integer_value(&1, "k03").unwrap_err().is_type_mismatch());

    storage.remove_all_values_for_key("k99").unwrap();
    assert_eq!(storage.annotated_keys(&1), vec![AnnotationKey::from("k03")]);
    storage.remove_all_values_for_key("k03").unwrap();
    assert!(!storage.contains_item(&1));
}

#[test]
fn int_array_widens_and_narrows() {
    let layer = LayerManifest::new("deps")
        .with_key(KeyManifest::new("head", ValueType::Integer).with_no_entry(-1))
        .with_key(KeyManifest::new("depth", ValueType::Integer));
    let mut storage = attach::<IntArray>(&layer);

    assert_eq!(storage.get_integer_value(&1, "head").unwrap(), -1);
    storage.set_integer_value(&1, "head", 4).unwrap();
    assert_eq!(storage.get_long_value(&1, "head").unwrap(), 4);
    assert_eq!(storage.get_double_value(&1, "head").unwrap(), 4.0);
    assert!(storage.get_boolean_value(&1, "head").unwrap_err().is_type_mismatch());

    storage.set_long_value(&1, "depth", 12).unwrap();
    assert_eq!(storage.get_integer_value(&1, "depth").unwrap(), 12);
    assert!(matches!(
        storage.set_long_value(&1, "depth", i64::MAX),
        Err(Error::Overflow { .. })
    ));
    assert!(storage.set_double_value(&1, "depth", 1.0).unwrap_err().is_type_mismatch());
}

#[test]
fn int_array_requires_integer_keys() {
    let layer = LayerManifest::new("t")
        .with_key(KeyManifest::new("head", ValueType::Integer))
        .with_key(KeyManifest::new("score", ValueType::Double));
    let mut storage = IntArrayStorage::<u32>::new(4, 8);
    assert!(storage.add_notify(&layer).unwrap_err().is_configuration());
}

#[test]
fn mixed_storage_holds_every_type() {
    let layer = LayerManifest::new("tokens")
        .with_key(KeyManifest::new("upos", ValueType::Text))
        .with_key(KeyManifest::new("head", ValueType::Integer).with_no_entry(-1))
        .with_key(KeyManifest::new("score", ValueType::Double))
        .with_key(KeyManifest::new("root", ValueType::Boolean));
    let mut storage = attach::<MixedSlots>(&layer);
    let mask = storage.base().unwrap().layout().primitive_mask().to_vec();
    // slots follow sorted key order: head, root, score, upos
    assert_eq!(mask, vec![true, true, true, false]);

    storage.set_value(&1, "upos", Value::from("NOUN")).unwrap();
    storage.set_integer_value(&1, "head", 0).unwrap();
    storage.set_double_value(&1, "score", 0.25).unwrap();

    assert_eq!(storage.get_value(&1, "upos").unwrap(), Value::from("NOUN"));
    assert_eq!(storage.get_integer_value(&1, "head").unwrap(), 0);
    assert_eq!(storage.get_double_value(&1, "score").unwrap(), 0.25);
    assert!(!storage.get_boolean_value(&1, "root").unwrap());
    assert_eq!(
        storage.annotated_keys(&1),
        vec![
            AnnotationKey::from("head"),
            AnnotationKey::from("score"),
            AnnotationKey::from("upos")
        ]
    );

    assert!(storage
        .set_value(&1, "head", Value::from("x"))
        .unwrap_err()
        .is_type_mismatch());

    storage.set_value(&1, "upos", Value::Null).unwrap();
    storage.set_integer_value(&1, "head", -1).unwrap();
    storage.set_double_value(&1, "score", 0.0).unwrap();
    assert!(!storage.contains_item(&1));
}

#[test]
fn unknown_keys_name_the_valid_set() {
    let storage = attach::<PackedBooleans>(&pos_lemma());
    match storage.get_boolean_value(&1, "feats").unwrap_err() {
        Error::InvalidKey {
            key,
            valid_keys,
            layer,
        } => {
            assert_eq!(key, "feats");
            assert_eq!(valid_keys, vec!["lemma".to_string(), "pos".to_string()]);
            assert_eq!(layer.as_deref(), Some("tokens"));
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn default_writes_do_not_materialise_items() {
    let mut storage = attach::<PackedBooleans>(&pos_lemma());
    storage.set_boolean_value(&3, "pos", false).unwrap();
    assert!(!storage.contains_item(&3));
    assert!(!storage.has_annotations());
}

#[test]
fn missing_items_read_the_default_buffer() {
    let layer = LayerManifest::new("flags")
        .with_key(KeyManifest::new("a", ValueType::Boolean).with_no_entry(true))
        .with_key(KeyManifest::new("b", ValueType::Boolean));
    let mut base = FixedKeysBase::<u32, PackedBooleans>::attach(&layer, 4, 8).unwrap();

    assert_eq!(*base.buffer(&9), 0b01);
    assert_eq!(*base.get_buffer(&9, false), 0b01);
    assert!(!base.contains(&9));
    assert_eq!(base.read(&9, 0), Value::Boolean(true));

    assert_eq!(*base.get_buffer(&9, true), 0b01);
    assert!(base.contains(&9));

    let ints = LayerManifest::new("ids")
        .with_key(KeyManifest::new("head", ValueType::Integer).with_no_entry(-1))
        .with_key(KeyManifest::new("dep", ValueType::Integer));
    let base = FixedKeysBase::<u32, IntArray>::attach(&ints, 4, 8).unwrap();
    let head = base.check_key_and_get_index("head").unwrap();
    let dep = base.check_key_and_get_index("dep").unwrap();
    assert_eq!(base.buffer(&1)[head], -1);
    assert_eq!(base.buffer(&1)[dep], 0);
}

#[test]
fn bulk_removal() {
    let mut storage = attach::<BitSetBooleans>(&pos_lemma());
    for item in 0..4 {
        storage.set_boolean_value(&item, "pos", true).unwrap();
    }
    storage.remove_all_values_for_items(&[0, 1]);
    assert!(!storage.contains_item(&0));
    assert!(storage.contains_item(&2));
    storage.remove_all_values();
    assert!(!storage.has_annotations());
}

#[test]
fn bitset_grows_and_truncates() {
    let mut bits = BitSet::with_len(3);
    bits.set(70, true);
    assert_eq!(bits.len(), 71);
    assert!(bits.get(70));
    assert!(!bits.get(200));
    bits.set(1, true);
    assert_eq!(bits.ones().collect::<Vec<_>>(), vec![1, 70]);
    bits.resize(2);
    assert_eq!(bits.count_ones(), 1);
    bits.resize(71);
    assert!(!bits.get(70));
}

proptest! {
    #[test]
    fn packed_subsets_round_trip(count in 1usize..=31, mask in any::<u32>()) {
        let layer = boolean_layer(count);
        let mut storage = attach::<PackedBooleans>(&layer);
        let expected: BTreeSet<AnnotationKey> = (0..count)
            .filter(|i| mask & (1 << i) != 0)
            .map(|i| AnnotationKey::from(format!("k{i:02}")))
            .collect();
        for key in &expected {
            storage.set_boolean_value(&1, key, true).unwrap();
        }
        let collected: BTreeSet<AnnotationKey> = storage.annotated_keys(&1).into_iter().collect();
        prop_assert_eq!(collected, expected.clone());
        prop_assert_eq!(storage.has_annotations_for(&1), !expected.is_empty());
    }

    #[test]
    fn bitset_matches_vec_of_bools(values in proptest::collection::vec(any::<bool>(), 0..200)) {
        let bits: BitSet = values.iter().copied().collect();
        prop_assert_eq!(bits.len(), values.len());
        for (i, v) in values.iter().enumerate() {
            prop_assert_eq!(bits.get(i), *v);
        }
        prop_assert_eq!(bits.count_ones(), values.iter().filter(|v| **v).count());
    }
}
