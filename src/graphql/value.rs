use serde_json::Value;

/// Walk a dotted path through nested JSON objects, returning `None` on
/// any missing step. Mutation responses are shallow and vary too much to
/// be worth typed models; this keeps their handling explicit without
/// dynamic casts scattered through the call sites.
pub fn pluck<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

pub fn pluck_str<'a>(value: &'a Value, path: &str) -> Option<&'a str> {
    pluck(value, path)?.as_str()
}

pub fn pluck_i64(value: &Value, path: &str) -> Option<i64> {
    pluck(value, path)?.as_i64()
}

/// Shared success check for Hardcover mutations: the payload at `op` must
/// exist, its `error` field must be empty, and the expected result object
/// must be present.
pub fn mutation_ok(data: &Value, op: &str, result_key: &str) -> bool {
    let Some(payload) = pluck(data, op) else {
        return false;
    };
    if let Some(err) = pluck_str(payload, "error") {
        if !err.is_empty() {
            tracing::warn!(op, error = err, "mutation reported an error");
            return false;
        }
    }
    matches!(pluck(payload, result_key), Some(v) if !v.is_null())
}
