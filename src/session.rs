use crate::{
    client::TemplateStore,
    editor::{EditorState, StatusMessage},
    error::SessionError,
    types::{header_json, DynamicSettings, Header, HttpMethod, Template, TemplatePatch, TemplateType},
};
use log::{info, warn};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    NoVariables,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiSettingsDraft {
    pub endpoint: String,
    pub method: HttpMethod,
    pub request_text: String,
    pub headers: Vec<Header>,
}

fn template_id(template: &Template) -> Result<&str, SessionError> {
    let id = template.template_id.as_str();
    if id.is_empty() {
        return Err(SessionError::MissingTemplateId);
    }
    Ok(id)
}

fn report<T>(
    state: &mut EditorState,
    result: Result<T, SessionError>,
    success: &str,
) -> Result<T, SessionError> {
    match &result {
        Ok(_) => state.status = Some(StatusMessage::success(success)),
        Err(e) => {
            warn!("{}", e);
            state.status = Some(StatusMessage::error(e.to_string()));
        }
    }
    result
}

/// Writes the current bindings into the dynamic document and pushes it.
/// A document without a variables array is left alone: no call, no status.
pub fn save_mappings<S: TemplateStore>(
    store: &S,
    state: &mut EditorState,
    template: &Template,
    on_saved: impl FnOnce(),
) -> Result<SaveOutcome, SessionError> {
    let result = template_id(template).map(|id| (id, state.splice_mappings(template)));
    let result = match result {
        Ok((id, None)) => {
            info!("{} has no variables array, nothing to save", id);
            return Ok(SaveOutcome::NoVariables);
        }
        Ok((id, Some(doc))) => store
            .update_template(id, &TemplatePatch::dynamic_document(doc))
            .map(|_| {
                info!("Saved mappings of {}", id);
                SaveOutcome::Saved
            })
            .map_err(SessionError::from),
        Err(e) => Err(e),
    };
    let result = report(state, result, "Variable mappings saved successfully!");
    if result.is_ok() {
        on_saved();
    }
    result
}

pub fn save_values<S: TemplateStore>(
    store: &S,
    state: &mut EditorState,
    template: &Template,
    on_saved: impl FnOnce(),
) -> Result<SaveOutcome, SessionError> {
    let result = template_id(template).and_then(|id| {
        let doc = state
            .splice_values(template)
            .ok_or(SessionError::MissingDocument(state.mode))?;
        let patch = match state.mode {
            TemplateType::Static => TemplatePatch {
                static_template_json: Some(doc),
                template_type: Some(TemplateType::Static),
                ..TemplatePatch::default()
            },
            TemplateType::Dynamic => TemplatePatch {
                dynamic_template_json: Some(doc),
                template_type: Some(TemplateType::Dynamic),
                ..TemplatePatch::default()
            },
        };
        store.update_template(id, &patch)?;
        Ok(SaveOutcome::Saved)
    });
    let result = report(state, result, "Template updated successfully!");
    if result.is_ok() {
        on_saved();
    }
    result
}

pub fn save_api_settings<S: TemplateStore>(
    store: &S,
    state: &mut EditorState,
    template: &Template,
    draft: &ApiSettingsDraft,
    on_saved: impl FnOnce(),
) -> Result<DynamicSettings, SessionError> {
    let result = template_id(template).and_then(|id| {
        let request_json: Value =
            serde_json::from_str(&draft.request_text).map_err(SessionError::InvalidRequestJson)?;
        let settings = DynamicSettings {
            endpoint: draft.endpoint.clone(),
            http_method: draft.method,
            request_json,
            header_json: header_json(&draft.headers),
        };
        store.update_template(id, &TemplatePatch::mode(TemplateType::Dynamic))?;
        store.create_dynamic_settings(id, &settings)?;
        Ok(settings)
    });
    let result = report(state, result, "API settings saved successfully!");
    if result.is_ok() {
        state.mode = TemplateType::Dynamic;
        on_saved();
    }
    result
}
