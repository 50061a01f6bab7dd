use chrono::{DateTime, TimeZone, Utc};
use query_state::{StateMap, StateValue, clear_caches, decode, encode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// macro for testing roundtrip encoding and decoding
///
/// Runs each check twice, the second time with cold caches, since the
/// output must not depend on what is cached.
macro_rules! roundtrip_test {
    (
        $data:expr
    ) => {
        let data: StateValue = $data.into();

        for cold in [false, true] {
            if cold {
                clear_caches();
            }
            let encoded = encode(&data);
            let decoded = decode(&encoded);
            pretty_assertions::assert_eq!(Some(&data), decoded.as_ref(), "encoded as {encoded}");
        }
    };
}

// ========== PRIMITIVES ==========

#[test]
fn strings() {
    roundtrip_test!("john");
    roundtrip_test!("john doe");
    roundtrip_test!("a&b=c+d#e?f/g");
    roundtrip_test!("100%");
    roundtrip_test!("café ☕");
    roundtrip_test!("");
}

#[test]
fn numbers() {
    roundtrip_test!(0);
    roundtrip_test!(42);
    roundtrip_test!(-7);
    roundtrip_test!(0.5);
    roundtrip_test!(-123.456);
    roundtrip_test!(1e21);
    roundtrip_test!(2.5e-8);
    roundtrip_test!(9_007_199_254_740_993u64);
}

#[test]
fn booleans() {
    roundtrip_test!(true);
    roundtrip_test!(false);
}

#[test]
fn null_encodes_empty() {
    assert_eq!(encode(&StateValue::Null), "");
    assert_eq!(query_state::encode_opt(None), "");
}

// ========== COMPOSITES ==========

#[test]
fn arrays() {
    roundtrip_test!(StateValue::array([1, 2, 3]));
    roundtrip_test!(StateValue::array(["a", "b c", "true", "7"]));
    roundtrip_test!(StateValue::array([
        StateValue::Null,
        StateValue::from(false),
        StateValue::from(0.25)
    ]));
    roundtrip_test!(StateValue::array([-978854534.3528825, 0.1 + 0.2, 5e-324]));
    roundtrip_test!(StateValue::array(Vec::<StateValue>::new()));
}

#[test]
fn nested_objects() {
    roundtrip_test!(StateValue::object([
        ("search", StateValue::from("john")),
        (
            "filters",
            StateValue::object([
                ("roles", StateValue::array(["admin", "dev"])),
                ("active", StateValue::from(true)),
                ("minAge", StateValue::Null),
            ])
        ),
        ("page", StateValue::from(2)),
    ]));
    roundtrip_test!(StateValue::from(StateMap::new()));
}

#[test]
fn dollar_keys_are_plain_data() {
    roundtrip_test!(StateValue::object([("$date", "2024-03-01T00:00:00Z")]));
    roundtrip_test!(StateValue::object([
        ("$date", StateValue::from("2024-03-01T00:00:00Z")),
        ("$$ref", StateValue::from(1)),
        ("$", StateValue::array(["$date"])),
    ]));
}

#[test]
fn dates() {
    let date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
    roundtrip_test!(date);

    let precise = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
    roundtrip_test!(precise);

    roundtrip_test!(StateValue::object([
        ("from", StateValue::Date(date)),
        ("to", StateValue::Date(precise)),
    ]));
}

// ========== WIRE FORMAT ==========

#[test]
fn wire_format() {
    insta::assert_snapshot!(encode(&"john doe".into()), @"john%20doe");
    insta::assert_snapshot!(encode(&0.5.into()), @"0.5");
    insta::assert_snapshot!(encode(&StateValue::array([1, 2])), @"%5B1%2C2%5D");
    insta::assert_snapshot!(
        encode(&StateValue::object([("q", "a b")])),
        @"%7B%22q%22%3A%22a%20b%22%7D"
    );
    insta::assert_snapshot!(
        encode(&Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap().into()),
        @"%7B%22%24date%22%3A%222024-03-01T00%3A00%3A00Z%22%7D"
    );
    insta::assert_snapshot!(
        encode(&StateValue::object([("$date", "x")])),
        @"%7B%22%24%24date%22%3A%22x%22%7D"
    );
}

#[test]
fn string_literals_decode_as_typed() {
    // the wire format does not quote strings, so these read as their
    // typed meaning
    assert_eq!(decode(&encode(&"true".into())), Some(StateValue::Bool(true)));
    assert_eq!(decode(&encode(&"12".into())), Some(StateValue::from(12)));
    assert_eq!(decode(&encode(&"undefined".into())), None);
    // non-canonical numbers stay strings
    assert_eq!(decode(&encode(&"012".into())), Some(StateValue::from("012")));
}

#[test]
fn decoding_twice_is_stable() {
    for value in [
        StateValue::from("john doe"),
        StateValue::from(3),
        StateValue::from(true),
    ] {
        let once = decode(&encode(&value)).unwrap();
        let twice = decode(&once.to_string()).unwrap();
        assert_eq!(once, twice);
    }
}

// ========== RANDOMIZED ==========

const ALPHABET: &[char] = &[
    'a', 'Z', '0', '9', ' ', '&', '=', '+', '%', '#', '?', '/', '"', '\'', '[', ']', '{', '}',
    ',', ':', 'é', '☕', '\\',
];

/// Strings start with an uppercase letter so they cannot read as a
/// keyword, a number or structural text.
fn random_string(rng: &mut StdRng) -> String {
    let len = rng.random_range(0..12);
    let mut s = String::with_capacity(len + 1);
    s.push(char::from(b'A' + rng.random_range(0..26u8)));
    for _ in 0..len {
        s.push(ALPHABET[rng.random_range(0..ALPHABET.len())]);
    }
    s
}

fn random_number(rng: &mut StdRng) -> f64 {
    if rng.random_bool(0.5) {
        rng.random_range(-100_000i64..100_000) as f64
    } else {
        rng.random_range(-1e9..1e9)
    }
}

fn random_value(rng: &mut StdRng, depth: usize) -> StateValue {
    let kinds = if depth == 0 { 5 } else { 7 };
    match rng.random_range(0..kinds) {
        0 => StateValue::Null,
        1 => StateValue::Bool(rng.random_bool(0.5)),
        2 => StateValue::Number(random_number(rng)),
        3 => StateValue::String(random_string(rng)),
        4 => StateValue::Date(
            DateTime::from_timestamp_millis(rng.random_range(0..4_102_444_800_000i64))
                .unwrap_or_default(),
        ),
        5 => StateValue::array(
            (0..rng.random_range(0..4))
                .map(|_| random_value(rng, depth - 1))
                .collect::<Vec<_>>(),
        ),
        _ => StateValue::object(
            (0..rng.random_range(0..4))
                .map(|_| (random_string(rng), random_value(rng, depth - 1)))
                .collect::<Vec<_>>(),
        ),
    }
}

#[test]
fn random_values() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..500 {
        let value = random_value(&mut rng, 3);
        if value.is_null() {
            // a bare null encodes to the empty string, tested above
            continue;
        }
        let encoded = encode(&value);
        assert_eq!(decode(&encoded), Some(value), "encoded as {encoded}");
    }
}
