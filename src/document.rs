use crate::types::Variable;
use log::warn;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariablesLocation {
    Card,
    Root,
    Template,
}

impl VariablesLocation {
    const PROBE_ORDER: [Self; 3] = [Self::Card, Self::Root, Self::Template];

    fn pointer(self) -> &'static str {
        match self {
            Self::Card => "/card/variables",
            Self::Root => "/variables",
            Self::Template => "/template/variables",
        }
    }

    /// First location holding an array wins.
    pub fn resolve(doc: &Value) -> Option<Self> {
        Self::PROBE_ORDER
            .into_iter()
            .find(|loc| doc.pointer(loc.pointer()).is_some_and(Value::is_array))
    }
}

pub fn variables(doc: &Value) -> Option<&Vec<Value>> {
    let loc = VariablesLocation::resolve(doc)?;
    doc.pointer(loc.pointer())?.as_array()
}

pub fn variables_mut(doc: &mut Value) -> Option<&mut Vec<Value>> {
    let loc = VariablesLocation::resolve(doc)?;
    doc.pointer_mut(loc.pointer())?.as_array_mut()
}

/// Entries that are not variables become blank placeholders so positions
/// keep lining up with the document.
pub fn declared_variables(doc: &Value) -> Vec<Variable> {
    variables(doc)
        .map(|entries| {
            entries
                .iter()
                .enumerate()
                .map(|(i, entry)| {
                    Variable::deserialize(entry).unwrap_or_else(|e| {
                        warn!("Variable #{} is malformed: {}", i, e);
                        Variable::default()
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}
