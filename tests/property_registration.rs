//! Property-based tests for registration uniqueness.
//!
//! A random sequence of registrations and unregistrations is replayed against
//! a container and a plain `HashMap` model; both must agree after every step.
use ferrous_ioc::{Container, DiError, Resolver, TypeToken};
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum Op {
    Register(Option<u8>, u32),
    Unregister(Option<u8>),
}

const KEYS: [&str; 4] = ["a", "b", "c", "d"];

fn key_name(key: Option<u8>) -> Option<&'static str> {
    key.map(|k| KEYS[k as usize])
}

fn arb_key() -> impl Strategy<Value = Option<u8>> {
    prop::option::of(0u8..4)
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (arb_key(), any::<u32>()).prop_map(|(key, value)| Op::Register(key, value)),
        arb_key().prop_map(Op::Unregister),
    ]
}

proptest! {
    #[test]
    fn at_most_one_record_per_key(ops in prop::collection::vec(arb_op(), 1..40)) {
        let container = Container::new();
        let mut model: HashMap<Option<u8>, u32> = HashMap::new();

        for op in &ops {
            match *op {
                Op::Register(key, value) => {
                    let result = container.register_instance(value, key_name(key));
                    if model.contains_key(&key) {
                        prop_assert!(matches!(result, Err(DiError::DuplicateRegistration(_))));
                    } else {
                        prop_assert!(result.is_ok());
                        model.insert(key, value);
                    }
                }
                Op::Unregister(key) => {
                    let result = container.unregister_token(TypeToken::of::<u32>(), key_name(key));
                    if model.remove(&key).is_some() {
                        prop_assert!(result.is_ok());
                    } else {
                        prop_assert!(matches!(result, Err(DiError::NotFound(_))));
                    }
                }
            }

            prop_assert_eq!(container.registration_count(), model.len());
        }

        // Rejected registrations never replaced the stored value
        for (key, value) in &model {
            let resolved = match key_name(*key) {
                Some(name) => container.resolve_keyed::<u32>(name),
                None => container.resolve::<u32>(),
            };
            prop_assert_eq!(*resolved.unwrap(), *value);
        }
    }
}

proptest! {
    #[test]
    fn duplicate_registration_keeps_original(first in any::<u32>(), second in any::<u32>()) {
        let container = Container::new();
        container.register_instance(first, Some("slot")).unwrap();

        prop_assert!(container.register_instance(second, Some("slot")).is_err());
        prop_assert_eq!(*container.resolve_keyed::<u32>("slot").unwrap(), first);
        prop_assert_eq!(container.registration_count(), 1);
    }
}

proptest! {
    #[test]
    fn distinct_keys_coexist(count in 1usize..20) {
        let container = Container::new();
        let keys: Vec<String> = (0..count).map(|i| format!("key-{}", i)).collect();

        for (i, key) in keys.iter().enumerate() {
            container.register_instance(i, Some(key)).unwrap();
        }

        prop_assert_eq!(container.registration_count(), count);
        for (i, key) in keys.iter().enumerate() {
            prop_assert_eq!(*container.resolve_keyed::<usize>(key).unwrap(), i);
        }
    }
}
