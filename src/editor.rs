use crate::{
    document::{self, declared_variables},
    paths::response_paths,
    suggest::{self, filter_suggestions, SuggestionList},
    types::{Template, TemplateType, Variable, ARRAY_KEY_NAME},
};
use log::debug;
use serde_json::{Map, Value};
use std::{collections::BTreeMap, time::Instant};

pub const DEFAULT_RESPONSE: &str = r#"{
  "data": {
    "name": "Example Name",
    "discount": "Get 10% Off",
    "items": []
  }
}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Enter,
    Escape,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    Input {
        key: String,
        text: String,
        caret: usize,
    },
    KeyDown(Key),
    Click {
        index: usize,
    },
    Blur {
        at: Instant,
    },
    Tick {
        now: Instant,
    },
    RenameArrayKey {
        index: usize,
        name: String,
    },
    SetResponse(String),
    SetMode(TemplateType),
    SetValue {
        name: String,
        value: Value,
    },
    SetItemField {
        name: String,
        item: usize,
        field: String,
        value: Value,
    },
    AddItem {
        name: String,
    },
    RemoveItem {
        name: String,
        item: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Unbound,
    Typing,
    Bound,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FocusedField {
    pub key: String,
    pub caret: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EditorState {
    pub variables: Vec<Variable>,
    pub mode: TemplateType,
    pub key_overrides: BTreeMap<usize, String>,
    pub mappings: BTreeMap<String, String>,
    pub response_text: String,
    pub focus: Option<FocusedField>,
    pub suggestions: SuggestionList,
    pub values: Map<String, Value>,
    pub status: Option<StatusMessage>,
}

impl EditorState {
    pub fn new(variables: Vec<Variable>, mode: TemplateType) -> Self {
        let values = variables
            .iter()
            .map(|v| (v.name.clone(), v.value.clone()))
            .collect();
        Self {
            variables,
            mode,
            key_overrides: BTreeMap::new(),
            mappings: BTreeMap::new(),
            response_text: DEFAULT_RESPONSE.to_string(),
            focus: None,
            suggestions: SuggestionList::default(),
            values,
            status: None,
        }
    }

    /// Editor for a template: variables come from the static document,
    /// existing bindings from the dynamic one (falling back to static).
    pub fn from_template(template: &Template) -> Self {
        let variables = declared_variables(&template.static_template_json);
        let mut state = Self::new(variables, template.template_type);
        state.load_bindings(template);
        state
    }

    /// Only values that already look like placeholders become mappings.
    fn load_bindings(&mut self, template: &Template) {
        let Some(entries) = template.working_document().and_then(document::variables) else {
            return;
        };
        let mut overrides = BTreeMap::new();
        let mut mappings = BTreeMap::new();
        for (index, variable) in self.variables.iter().enumerate() {
            let Some(entry) = entries.get(index) else {
                continue;
            };
            let key_name = entry
                .get(ARRAY_KEY_NAME)
                .and_then(Value::as_str)
                .filter(|n| !n.is_empty());
            if let Some(name) = key_name.filter(|_| variable.is_array()) {
                overrides.insert(index, name.to_string());
            }
            let prefix = match key_name {
                Some(name) if variable.is_array() => name,
                _ => variable.name.as_str(),
            };
            let first = entry
                .get("value")
                .and_then(|v| v.get(0))
                .and_then(Value::as_object)
                .filter(|_| variable.is_array());
            match first {
                Some(row) => row.iter().for_each(|(field, v)| {
                    mappings.insert(format!("{}.{}", prefix, field), placeholder(Some(v)));
                }),
                None => {
                    mappings.insert(prefix.to_string(), placeholder(entry.get("value")));
                }
            }
        }
        self.key_overrides = overrides;
        self.mappings = mappings;
    }

    pub fn key_override(&self, index: usize) -> Option<&str> {
        self.key_overrides
            .get(&index)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn mapping_key(&self, index: usize) -> String {
        let variable = &self.variables[index];
        match self.key_override(index) {
            Some(name) if variable.is_array() => name.to_string(),
            _ => variable.name.clone(),
        }
    }

    pub fn field_key(&self, index: usize, field: &str) -> String {
        format!("{}.{}", self.mapping_key(index), field)
    }

    pub fn slots(&self) -> Vec<String> {
        self.variables
            .iter()
            .enumerate()
            .flat_map(|(i, v)| match v.first_item() {
                Some(first) => first.keys().map(|f| self.field_key(i, f)).collect::<Vec<_>>(),
                None => vec![self.mapping_key(i)],
            })
            .collect()
    }

    pub fn mapping(&self, key: &str) -> Option<&str> {
        self.mappings
            .get(key)
            .map(String::as_str)
            .filter(|m| !m.is_empty())
    }

    pub fn binding(&self, key: &str) -> Binding {
        let typing = self.suggestions.open && self.focus.as_ref().is_some_and(|f| f.key == key);
        if typing {
            Binding::Typing
        } else if self.mapping(key).is_none() {
            Binding::Unbound
        } else {
            Binding::Bound
        }
    }

    pub fn candidates(&self) -> Vec<String> {
        filter_suggestions(
            &response_paths(&self.response_text),
            &self.suggestions.filter,
        )
    }

    pub fn apply(&mut self, action: EditorAction) {
        match action {
            EditorAction::Input { key, text, caret } => {
                match suggest::active_filter(&text, caret) {
                    Some(filter) => self.suggestions.show(filter),
                    None => self.suggestions.dismiss(),
                }
                self.mappings.insert(key.clone(), text);
                self.focus = Some(FocusedField { key, caret });
            }
            EditorAction::KeyDown(key) => {
                if !self.suggestions.open || self.focus.is_none() {
                    return;
                }
                let candidates = self.candidates();
                match key {
                    Key::Down => self.suggestions.move_down(candidates.len()),
                    Key::Up => self.suggestions.move_up(),
                    Key::Enter => {
                        if let Some(c) = candidates.get(self.suggestions.active) {
                            self.commit(c);
                        }
                    }
                    Key::Escape => self.suggestions.dismiss(),
                }
            }
            EditorAction::Click { index } => {
                if !self.suggestions.open {
                    return;
                }
                if let Some(c) = self.candidates().get(index) {
                    self.commit(c);
                }
            }
            EditorAction::Blur { at } => self.suggestions.schedule_dismiss(at),
            EditorAction::Tick { now } => self.suggestions.tick(now),
            EditorAction::RenameArrayKey { index, name } => self.rename_array_key(index, name),
            EditorAction::SetResponse(text) => self.response_text = text,
            EditorAction::SetMode(mode) => self.mode = mode,
            EditorAction::SetValue { name, value } => {
                self.values.insert(name, value);
            }
            EditorAction::SetItemField {
                name,
                item,
                field,
                value,
            } => {
                let row = self
                    .values
                    .get_mut(&name)
                    .and_then(|v| v.get_mut(item))
                    .and_then(Value::as_object_mut);
                if let Some(row) = row {
                    row.insert(field, value);
                }
            }
            EditorAction::AddItem { name } => {
                let list = self
                    .values
                    .entry(name)
                    .or_insert_with(|| Value::Array(vec![]));
                if !list.is_array() {
                    *list = Value::Array(vec![]);
                }
                if let Value::Array(items) = list {
                    let row = blank_like(items.first());
                    items.push(row);
                }
            }
            EditorAction::RemoveItem { name, item } => {
                if let Some(Value::Array(items)) = self.values.get_mut(&name) {
                    if item < items.len() {
                        items.remove(item);
                    }
                }
            }
        }
    }

    fn commit(&mut self, candidate: &str) {
        let Some(focus) = self.focus.as_mut() else {
            return;
        };
        let text = self.mappings.get(&focus.key).cloned().unwrap_or_default();
        if let Some((text, caret)) = suggest::insert_suggestion(&text, focus.caret, candidate) {
            focus.caret = caret;
            self.mappings.insert(focus.key.clone(), text);
        }
        self.suggestions.dismiss();
    }

    /// Moves the variable's existing field bindings under the new name when
    /// both names are set. Clearing the name leaves them where they were.
    fn rename_array_key(&mut self, index: usize, name: String) {
        let Some(variable) = self.variables.get(index) else {
            return;
        };
        if !variable.is_array() {
            debug!("Variable {} is not an array, ignoring rename", variable.name);
            return;
        }
        let fields: Vec<String> = variable
            .first_item()
            .map(|first| first.keys().cloned().collect())
            .unwrap_or_default();
        let old = self.key_overrides.insert(index, name.clone()).unwrap_or_default();
        if old.is_empty() || name.is_empty() {
            return;
        }
        for field in fields {
            let old_key = format!("{}.{}", old, field);
            if self.mappings.get(&old_key).is_some_and(|m| !m.is_empty()) {
                if let Some(m) = self.mappings.remove(&old_key) {
                    self.mappings.insert(format!("{}.{}", name, field), m);
                }
            }
        }
    }

    /// The dynamic document with every non-empty binding written in.
    /// `None` when the document has no variables array.
    pub fn splice_mappings(&self, template: &Template) -> Option<Value> {
        let mut doc = template.working_document()?.clone();
        let entries = document::variables_mut(&mut doc)?;
        for (index, variable) in self.variables.iter().enumerate() {
            let Some(Value::Object(entry)) = entries.get_mut(index) else {
                continue;
            };
            if variable.is_array() {
                match self.key_override(index) {
                    Some(name) => entry.insert(ARRAY_KEY_NAME.to_string(), name.into()),
                    None => entry.shift_remove(ARRAY_KEY_NAME),
                };
            }
            match variable.first_item() {
                Some(first) => {
                    for field in first.keys() {
                        let Some(mapping) = self.mapping(&self.field_key(index, field)) else {
                            continue;
                        };
                        let row = entry
                            .get_mut("value")
                            .and_then(|v| v.get_mut(0))
                            .and_then(Value::as_object_mut);
                        if let Some(row) = row {
                            row.insert(field.clone(), mapping.into());
                        }
                    }
                }
                None => {
                    if let Some(mapping) = self.mapping(&self.mapping_key(index)) {
                        entry.insert("value".to_string(), mapping.into());
                    }
                }
            }
        }
        Some(doc)
    }

    pub fn splice_values(&self, template: &Template) -> Option<Value> {
        let mut doc = template.document_for(self.mode)?.clone();
        if let Some(entries) = document::variables_mut(&mut doc) {
            for entry in entries.iter_mut().filter_map(Value::as_object_mut) {
                let edited = entry
                    .get("name")
                    .and_then(Value::as_str)
                    .and_then(|name| self.values.get(name))
                    .cloned();
                if let Some(value) = edited {
                    entry.insert("value".to_string(), value);
                }
            }
        }
        Some(doc)
    }
}

pub fn reduce(mut state: EditorState, action: EditorAction) -> EditorState {
    state.apply(action);
    state
}

fn placeholder(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .filter(|s| s.contains("{{"))
        .map(str::to_string)
        .unwrap_or_default()
}

fn blank_like(template: Option<&Value>) -> Value {
    let row = template
        .and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .map(|(k, v)| {
                    let blank = match v {
                        Value::String(_) => Value::from(""),
                        Value::Number(_) => Value::from(0),
                        Value::Bool(_) => Value::Bool(false),
                        Value::Array(_) => Value::Array(vec![]),
                        Value::Object(_) => Value::Object(Map::new()),
                        Value::Null => Value::from(""),
                    };
                    (k.clone(), blank)
                })
                .collect()
        })
        .unwrap_or_default();
    Value::Object(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn variables(v: Value) -> Vec<Variable> {
        serde_json::from_value(v).unwrap()
    }

    fn offers_template() -> Template {
        Template {
            template_id: "t1".into(),
            static_template_json: json!({"card": {"variables": [
                {"name": "title", "type": "string", "value": "Hello"},
                {"name": "offers", "type": "array", "value": [
                    {"price": 0, "label": "a"},
                    {"price": 5, "label": "b"}
                ]}
            ]}}),
            ..Template::default()
        }
    }

    fn typed(state: &mut EditorState, key: &str, text: &str) {
        state.apply(EditorAction::Input {
            key: key.into(),
            text: text.into(),
            caret: text.chars().count(),
        });
    }

    #[test]
    fn scalar_mapping_replaces_the_value() {
        let template = Template {
            static_template_json: json!({"variables": [{"name": "title", "type": "string"}]}),
            ..Template::default()
        };
        let mut state = EditorState::from_template(&template);
        state.mappings.insert("title".into(), "{{response.name}}".into());
        let doc = state.splice_mappings(&template).unwrap();
        assert_eq!(doc["variables"][0]["value"], "{{response.name}}");
    }

    #[test]
    fn array_mapping_touches_first_row_only() {
        let template = Template {
            static_template_json: json!({"variables": [
                {"name": "offers", "type": "array", "value": [{"price": 0}, {"price": 9}]}
            ]}),
            ..Template::default()
        };
        let mut state = EditorState::from_template(&template);
        state.apply(EditorAction::RenameArrayKey {
            index: 0,
            name: "items".into(),
        });
        state
            .mappings
            .insert("items.price".into(), "{{response.cost}}".into());
        let doc = state.splice_mappings(&template).unwrap();
        let entry = &doc["variables"][0];
        assert_eq!(entry["arrayKeyName"], "items");
        assert_eq!(entry["value"][0]["price"], "{{response.cost}}");
        assert_eq!(entry["value"][1]["price"], 9);
    }

    #[test]
    fn cleared_override_removes_array_key_name() {
        let mut template = offers_template();
        template.dynamic_template_json = template.static_template_json.clone();
        template.dynamic_template_json["card"]["variables"][1]["arrayKeyName"] = json!("deals");
        let mut state = EditorState::from_template(&template);
        assert_eq!(state.key_override(1), Some("deals"));
        state.apply(EditorAction::RenameArrayKey {
            index: 1,
            name: String::new(),
        });
        let doc = state.splice_mappings(&template).unwrap();
        assert!(doc["card"]["variables"][1].get("arrayKeyName").is_none());
    }

    #[test]
    fn empty_mappings_leave_values_alone() {
        let template = offers_template();
        let state = EditorState::from_template(&template);
        let doc = state.splice_mappings(&template).unwrap();
        assert_eq!(doc, template.static_template_json);
    }

    #[test]
    fn splice_without_variables_is_none() {
        let template = Template {
            static_template_json: json!({"card": {"states": []}}),
            ..Template::default()
        };
        let state = EditorState::new(vec![], TemplateType::Dynamic);
        assert!(state.splice_mappings(&template).is_none());
        assert!(state.splice_mappings(&Template::default()).is_none());
    }

    #[test]
    fn rename_migrates_existing_bindings() {
        let mut state = EditorState::new(
            variables(json!([{"name": "list", "type": "array", "value": [{"x": 1}]}])),
            TemplateType::Dynamic,
        );
        state.key_overrides.insert(0, "old".into());
        state
            .mappings
            .insert("old.x".into(), "{{response.x}}".into());
        state.apply(EditorAction::RenameArrayKey {
            index: 0,
            name: "new".into(),
        });
        let expected: BTreeMap<String, String> =
            [("new.x".to_string(), "{{response.x}}".to_string())].into();
        assert_eq!(state.mappings, expected);
    }

    #[test]
    fn clearing_then_renaming_orphans_bindings() {
        let mut state = EditorState::new(
            variables(json!([{"name": "list", "type": "array", "value": [{"x": 1}]}])),
            TemplateType::Dynamic,
        );
        state.key_overrides.insert(0, "old".into());
        state
            .mappings
            .insert("old.x".into(), "{{response.x}}".into());
        state.apply(EditorAction::RenameArrayKey {
            index: 0,
            name: String::new(),
        });
        state.apply(EditorAction::RenameArrayKey {
            index: 0,
            name: "n".into(),
        });
        assert_eq!(state.mapping("old.x"), Some("{{response.x}}"));
        assert_eq!(state.mapping("n.x"), None);
        assert_eq!(state.key_override(0), Some("n"));
    }

    #[test]
    fn loads_only_placeholder_values() {
        let mut template = offers_template();
        let mut dynamic = template.static_template_json.clone();
        dynamic["card"]["variables"][0]["value"] = json!("{{response.data.name}}");
        dynamic["card"]["variables"][1]["arrayKeyName"] = json!("deals");
        dynamic["card"]["variables"][1]["value"][0]["label"] = json!("{{response.items.label}}");
        template.dynamic_template_json = dynamic;

        let state = EditorState::from_template(&template);
        assert_eq!(state.mapping("title"), Some("{{response.data.name}}"));
        assert_eq!(state.mapping("deals.label"), Some("{{response.items.label}}"));
        assert_eq!(state.mappings.get("deals.price"), Some(&String::new()));
        assert_eq!(state.binding("deals.price"), Binding::Unbound);
        assert_eq!(state.binding("title"), Binding::Bound);
        assert_eq!(state.slots(), vec!["title", "deals.price", "deals.label"]);
    }

    #[test]
    fn typing_opens_filtered_suggestions() {
        let mut state = EditorState::from_template(&offers_template());
        typed(&mut state, "title", "{{response.data.n");
        assert!(state.suggestions.open);
        assert_eq!(state.binding("title"), Binding::Typing);
        assert_eq!(state.candidates(), vec!["response.data.name"]);

        typed(&mut state, "title", "literal");
        assert!(!state.suggestions.open);
        assert_eq!(state.binding("title"), Binding::Bound);
    }

    #[test]
    fn keyboard_selects_and_commits() {
        let mut state = EditorState::from_template(&offers_template());
        typed(&mut state, "title", "Hi {{response.");
        assert_eq!(state.candidates().len(), 3);
        state.apply(EditorAction::KeyDown(Key::Down));
        state.apply(EditorAction::KeyDown(Key::Down));
        state.apply(EditorAction::KeyDown(Key::Down));
        assert_eq!(state.suggestions.active, 2);
        state.apply(EditorAction::KeyDown(Key::Up));
        state.apply(EditorAction::KeyDown(Key::Enter));
        assert_eq!(state.mapping("title"), Some("Hi {{response.data.discount}}"));
        assert!(!state.suggestions.open);
        assert_eq!(state.focus.as_ref().map(|f| f.caret), Some(29));
    }

    #[test]
    fn escape_dismisses_without_commit() {
        let mut state = EditorState::from_template(&offers_template());
        typed(&mut state, "title", "{{response.da");
        state.apply(EditorAction::KeyDown(Key::Escape));
        assert!(!state.suggestions.open);
        assert_eq!(state.mapping("title"), Some("{{response.da"));
        state.apply(EditorAction::KeyDown(Key::Enter));
        assert_eq!(state.mapping("title"), Some("{{response.da"));
    }

    #[test]
    fn click_after_blur_still_commits() {
        let mut state = EditorState::from_template(&offers_template());
        state.apply(EditorAction::SetResponse(r#"{"user": {"id": 1}}"#.into()));
        typed(&mut state, "title", "{{response.u");
        let t0 = Instant::now();
        state.apply(EditorAction::Blur { at: t0 });
        state.apply(EditorAction::Tick {
            now: t0 + Duration::from_millis(10),
        });
        state.apply(EditorAction::Click { index: 0 });
        assert_eq!(state.mapping("title"), Some("{{response.user.id}}"));
    }

    #[test]
    fn blur_dismisses_after_grace() {
        let mut state = EditorState::from_template(&offers_template());
        typed(&mut state, "title", "{{response.");
        let t0 = Instant::now();
        state.apply(EditorAction::Blur { at: t0 });
        state.apply(EditorAction::Tick {
            now: t0 + suggest::BLUR_GRACE,
        });
        state.apply(EditorAction::Click { index: 0 });
        assert_eq!(state.mapping("title"), Some("{{response."));
    }

    #[test]
    fn static_value_editing() {
        let template = offers_template();
        let mut state = reduce(
            EditorState::from_template(&template),
            EditorAction::SetMode(TemplateType::Static),
        );
        state.apply(EditorAction::SetValue {
            name: "title".into(),
            value: json!("Welcome"),
        });
        state.apply(EditorAction::AddItem {
            name: "offers".into(),
        });
        state.apply(EditorAction::SetItemField {
            name: "offers".into(),
            item: 2,
            field: "label".into(),
            value: json!("c"),
        });
        state.apply(EditorAction::RemoveItem {
            name: "offers".into(),
            item: 0,
        });
        state.apply(EditorAction::RemoveItem {
            name: "offers".into(),
            item: 10,
        });

        let doc = state.splice_values(&template).unwrap();
        let vars = &doc["card"]["variables"];
        assert_eq!(vars[0]["value"], "Welcome");
        assert_eq!(
            vars[1]["value"],
            json!([{"price": 5, "label": "b"}, {"price": 0, "label": "c"}])
        );
    }

    #[test]
    fn blank_rows_follow_the_first_row() {
        let row = blank_like(Some(&json!({"s": "x", "n": 3, "b": true, "a": [1], "o": {"k": 1}, "z": null})));
        assert_eq!(row, json!({"s": "", "n": 0, "b": false, "a": [], "o": {}, "z": ""}));
        assert_eq!(blank_like(None), json!({}));
    }

    #[test]
    fn dynamic_value_save_needs_a_dynamic_document() {
        let template = offers_template();
        let state = EditorState::new(vec![], TemplateType::Dynamic);
        assert!(state.splice_values(&template).is_none());
    }
}
