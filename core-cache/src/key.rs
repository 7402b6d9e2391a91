//! Deterministic cache key derivation.
//!
//! Keys are `"{prefix}_{hash}"` where `hash` is a 32-bit rolling hash of the
//! prefix followed by the canonical JSON form of the parameters, rendered in
//! base 36. The hash is not cryptographic; collisions are accepted and the
//! prefix keeps data kinds apart.

use serde_json::Value;

/// Derives the cache key for `params` under `prefix`.
///
/// Object keys are sorted at every depth before hashing, so two parameter
/// objects that differ only in property order map to the same key.
pub fn generate_key(prefix: &str, params: &Value) -> String {
    let mut input = String::from(prefix);
    write_canonical(params, &mut input);
    format!("{}_{}", prefix, to_base36(rolling_hash(&input).unsigned_abs()))
}

/// `hash = hash * 31 + unit` over UTF-16 code units, wrapping at 32 bits.
fn rolling_hash(input: &str) -> i32 {
    input
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(unit as i32))
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::with_capacity(7);
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (key, value)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(value, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
