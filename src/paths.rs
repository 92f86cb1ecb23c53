use log::debug;
use serde_json::Value;

pub const RESPONSE_ROOT: &str = "response";

/// Arrays stand for "repeat of the first element" and never get an index
/// segment. Empty arrays, scalars and null end the walk at the current path.
pub fn paths_of(value: &Value, prefix: &str) -> Vec<String> {
    let mut paths = vec![];
    walk(value, prefix.to_string(), &mut paths);
    if paths.is_empty() {
        paths.push(prefix.to_string());
    }
    paths
}

fn walk(value: &Value, path: String, paths: &mut Vec<String>) {
    match value {
        Value::Object(obj) => obj.iter().for_each(|(k, v)| {
            let next = if path.is_empty() {
                k.clone()
            } else {
                format!("{}.{}", path, k)
            };
            walk(v, next, paths);
        }),
        Value::Array(arr) => match arr.first() {
            Some(first) => walk(first, path, paths),
            None => paths.push(path),
        },
        _ => paths.push(path),
    }
}

pub fn response_paths(text: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(text) {
        Ok(v) => paths_of(&v, RESPONSE_ROOT),
        Err(e) => {
            debug!("Sample response is not JSON ({}), offering root only", e);
            vec![RESPONSE_ROOT.to_string()]
        }
    }
}
