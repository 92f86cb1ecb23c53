use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};

/// Backends send `null` for unset fields; read it as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub const ARRAY_KEY_NAME: &str = "arrayKeyName";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum VariableType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Dict,
    Array,
    Color,
    Url,
    Other(String),
}

impl Default for VariableType {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for VariableType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "string" => Self::String,
            "number" => Self::Number,
            "integer" => Self::Integer,
            "boolean" => Self::Boolean,
            "object" => Self::Object,
            "dict" => Self::Dict,
            "array" => Self::Array,
            "color" => Self::Color,
            "url" => Self::Url,
            _ => Self::Other(s),
        }
    }
}

impl From<VariableType> for String {
    fn from(t: VariableType) -> Self {
        t.to_string()
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Dict => "dict",
            Self::Array => "array",
            Self::Color => "color",
            Self::Url => "url",
            Self::Other(s) => s,
        };
        f.write_str(s)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Variable {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: VariableType,
    #[serde(default)]
    pub value: Value,
}

impl Variable {
    pub fn is_array(&self) -> bool {
        self.kind == VariableType::Array
    }

    /// First record of an array variable, the structural template for its
    /// field mappings.
    pub fn first_item(&self) -> Option<&Map<String, Value>> {
        if !self.is_array() {
            return None;
        }
        self.value.as_array()?.first()?.as_object()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    #[default]
    Static,
    Dynamic,
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => f.write_str("static"),
            Self::Dynamic => f.write_str("dynamic"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default, deserialize_with = "null_as_default")]
    pub template_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub template_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub template_type: TemplateType,
    #[serde(default)]
    pub static_template_json: Value,
    #[serde(default)]
    pub dynamic_template_json: Value,
}

impl Template {
    pub fn working_document(&self) -> Option<&Value> {
        [&self.dynamic_template_json, &self.static_template_json]
            .into_iter()
            .find(|doc| !doc.is_null())
    }

    pub fn document_for(&self, mode: TemplateType) -> Option<&Value> {
        let doc = match mode {
            TemplateType::Static => &self.static_template_json,
            TemplateType::Dynamic => &self.dynamic_template_json,
        };
        (!doc.is_null()).then_some(doc)
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_type: Option<TemplateType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_template_json: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_template_json: Option<Value>,
}

impl TemplatePatch {
    pub fn dynamic_document(doc: Value) -> Self {
        Self {
            dynamic_template_json: Some(doc),
            ..Self::default()
        }
    }

    pub fn mode(mode: TemplateType) -> Self {
        Self {
            template_type: Some(mode),
            ..Self::default()
        }
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplate {
    pub template_name: String,
    pub template_json: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }

    pub fn has_body(&self) -> bool {
        *self != Self::Get
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            _ => Err(format!("unsupported http method: {}", s)),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    pub key: String,
    pub value: String,
}

/// Drops rows whose key is blank.
pub fn header_json(headers: &[Header]) -> Map<String, Value> {
    headers
        .iter()
        .filter(|h| !h.key.trim().is_empty())
        .map(|h| (h.key.clone(), Value::String(h.value.clone())))
        .collect()
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DynamicSettings {
    #[serde(default, deserialize_with = "null_as_default")]
    pub endpoint: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub http_method: HttpMethod,
    #[serde(default)]
    pub request_json: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub header_json: Map<String, Value>,
}

impl DynamicSettings {
    pub fn headers(&self) -> Vec<Header> {
        self.header_json
            .iter()
            .map(|(k, v)| Header {
                key: k.clone(),
                value: match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
            })
            .collect()
    }
}

#[derive(Deserialize, Debug)]
pub struct Envelope<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}
