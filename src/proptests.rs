use super::*;

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use proptest::prelude::*;

/// Linear-scan reference implementation. One binding per trie path: a path
/// is identified by family, prefix length, and the leading `len` bits, so
/// two prefixes that differ only in host bits occupy the same slot.
#[derive(Default)]
struct NaiveLpm {
    bindings: Vec<(IpNet, String)>,
}

fn same_path(a: &IpNet, b: &IpNet) -> bool {
    a.prefix_len() == b.prefix_len() && a.trunc() == b.trunc()
}

impl NaiveLpm {
    fn insert(&mut self, prefix: IpNet, value: String) {
        if let Some(slot) = self
            .bindings
            .iter_mut()
            .find(|(held, _)| same_path(held, &prefix))
        {
            *slot = (prefix, value);
        } else {
            self.bindings.push((prefix, value));
        }
    }

    fn get(&self, addr: IpAddr) -> Option<String> {
        self.bindings
            .iter()
            .filter(|(prefix, _)| prefix.contains(&addr))
            .max_by_key(|(prefix, _)| prefix.prefix_len())
            .map(|(_, value)| value.clone())
    }

    fn remove(&mut self, prefix: &IpNet) -> bool {
        match self.bindings.iter().position(|(held, _)| held == prefix) {
            Some(i) => {
                self.bindings.remove(i);
                true
            }
            None => false,
        }
    }

    fn remove_value(&mut self, value: &str) {
        self.bindings.retain(|(_, held)| held != value);
    }

    fn distinct_values(&self) -> usize {
        self.bindings
            .iter()
            .map(|(_, value)| value.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Checks the map against the model after a mutation: emptiness agrees, and
/// the registry holds exactly the values that still have a binding.
fn check_invariants(map: &PrefixMap<String>, model: &NaiveLpm) {
    assert_eq!(map.is_empty(), model.bindings.is_empty());
    let distinct = model.distinct_values();
    assert_eq!(map.registry_sizes(), (distinct, distinct));
}

#[derive(Clone, Debug)]
enum Op {
    Insert(IpNet, String),
    Remove(IpNet),
    RemoveValue(String),
    Get(IpAddr),
}

// A small octet alphabet makes overlapping and identical prefixes likely;
// uniform addresses would almost never collide.
fn octet() -> impl Strategy<Value = u8> + Clone {
    prop::sample::select(vec![0u8, 1, 2, 10, 128, 192, 255])
}

fn v4_net() -> impl Strategy<Value = IpNet> {
    (octet(), octet(), octet(), octet(), 0u8..=32).prop_map(|(a, b, c, d, len)| {
        IpNet::V4(Ipv4Net::new(Ipv4Addr::new(a, b, c, d), len).expect("len <= 32"))
    })
}

fn v6_net() -> impl Strategy<Value = IpNet> {
    (octet(), octet(), octet(), 0u8..=128).prop_map(|(a, b, c, len)| {
        let mut octets = [0u8; 16];
        octets[0] = a;
        octets[1] = b;
        octets[15] = c;
        IpNet::V6(Ipv6Net::new(Ipv6Addr::from(octets), len).expect("len <= 128"))
    })
}

fn any_net() -> impl Strategy<Value = IpNet> {
    prop_oneof![v4_net(), v6_net()]
}

fn value() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "d"]).prop_map(str::to_string)
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any_net(), value()).prop_map(|(prefix, v)| Op::Insert(prefix, v)),
        2 => any_net().prop_map(Op::Remove),
        1 => value().prop_map(Op::RemoveValue),
        3 => any_net().prop_map(|net| Op::Get(net.addr())),
    ]
}

proptest! {
    #[test]
    fn prop_matches_linear_scan_model(ops in prop::collection::vec(op(), 1..100)) {
        let map: PrefixMap<String> = PrefixMap::new();
        let mut model = NaiveLpm::default();

        for op in ops {
            match op {
                Op::Insert(prefix, v) => {
                    map.insert(prefix, v.clone());
                    model.insert(prefix, v);
                }
                Op::Remove(prefix) => {
                    prop_assert_eq!(map.remove(&prefix), model.remove(&prefix));
                }
                Op::RemoveValue(v) => {
                    map.remove_value(&v);
                    model.remove_value(&v);
                }
                Op::Get(addr) => {
                    prop_assert_eq!(map.get(addr), model.get(addr));
                }
            }
            prop_assert_eq!(map.is_empty(), model.bindings.is_empty());
            let distinct = model.distinct_values();
            prop_assert_eq!(map.registry_sizes(), (distinct, distinct));
        }

        // Every surviving binding's own address resolves identically.
        for (prefix, _) in &model.bindings {
            prop_assert_eq!(map.get(prefix.addr()), model.get(prefix.addr()));
        }
    }

    #[test]
    fn prop_teardown_leaves_nothing(prefixes in prop::collection::vec((any_net(), value()), 1..40)) {
        let map: PrefixMap<String> = PrefixMap::new();
        let mut model = NaiveLpm::default();
        for (prefix, v) in &prefixes {
            map.insert(*prefix, v.clone());
            model.insert(*prefix, v.clone());
        }

        for v in ["a", "b", "c", "d"] {
            map.remove_value(&v.to_string());
        }
        prop_assert!(map.is_empty());
        prop_assert_eq!(map.registry_sizes(), (0, 0));
        for (prefix, _) in &model.bindings {
            prop_assert_eq!(map.get(prefix.addr()), None);
        }
    }
}

#[test]
fn test_randomized_against_model() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const OCTETS: [u8; 7] = [0, 1, 2, 10, 128, 192, 255];
    const VALUES: [&str; 5] = ["a", "b", "c", "d", "e"];

    fn pick(rng: &mut StdRng) -> u8 {
        OCTETS[rng.gen_range(0..OCTETS.len())]
    }

    fn random_net(rng: &mut StdRng) -> IpNet {
        if rng.gen_bool(0.5) {
            let addr = Ipv4Addr::new(pick(rng), pick(rng), pick(rng), pick(rng));
            IpNet::V4(Ipv4Net::new(addr, rng.gen_range(0..=32)).expect("len <= 32"))
        } else {
            let mut octets = [0u8; 16];
            octets[0] = pick(rng);
            octets[1] = pick(rng);
            octets[15] = pick(rng);
            IpNet::V6(Ipv6Net::new(Ipv6Addr::from(octets), rng.gen_range(0..=128)).expect("len <= 128"))
        }
    }

    let mut rng = StdRng::seed_from_u64(7);
    let map: PrefixMap<String> = PrefixMap::new();
    let mut model = NaiveLpm::default();

    for _ in 0..10_000 {
        let value = VALUES[rng.gen_range(0..VALUES.len())].to_string();
        match rng.gen_range(0..100) {
            0..=44 => {
                let prefix = random_net(&mut rng);
                map.insert(prefix, value.clone());
                model.insert(prefix, value);
            }
            45..=69 => {
                let prefix = random_net(&mut rng);
                assert_eq!(map.remove(&prefix), model.remove(&prefix));
            }
            70..=79 => {
                map.remove_value(&value);
                model.remove_value(&value);
            }
            _ => {
                let addr = random_net(&mut rng).addr();
                assert_eq!(map.get(addr), model.get(addr), "query {addr}");
            }
        }
    }
    check_invariants(&map, &model);

    for v in VALUES {
        map.remove_value(&v.to_string());
        model.remove_value(v);
        check_invariants(&map, &model);
    }
    assert!(map.is_empty());
}
