use sdui_mapper::{
    client::{BackendClient, TemplateStore},
    config::Config,
    editor::{EditorAction, EditorState, Key, StatusKind, DEFAULT_RESPONSE},
    fs::{
        open_json, open_mapping_file, open_settings_file, read_text, write_json, write_text,
    },
    paths::response_paths,
    preview::{export_file_name, fetch_preview, Device, PreviewSource},
    session::{save_api_settings, save_mappings, save_values, ApiSettingsDraft, SaveOutcome},
    sync::{sync, SyncRequest},
    types::{HttpMethod, NewTemplate, TemplateType},
};
use anyhow::{bail, Context as _, Result};
use log::{debug, info, warn};
use seahorse::Context;
use serde_json::Value;
use std::process;

fn run(result: Result<()>) {
    if let Err(e) = result {
        eprintln!("\x1b[31mError\x1b[m: {:#}", e);
        process::exit(1);
    }
}

fn client(c: &Context) -> Result<BackendClient> {
    let config = Config::from_env()?.with_api(c.string_flag("api").ok());
    debug!("Backend at {}", config.api_url);
    Ok(BackendClient::new(&config)?)
}

fn arg<'a>(c: &'a Context, i: usize, what: &str) -> Result<&'a str> {
    c.args
        .get(i)
        .map(String::as_str)
        .with_context(|| format!("Missing argument: {}", what))
}

fn print_status(state: &EditorState) {
    if let Some(status) = &state.status {
        match status.kind {
            StatusKind::Success => println!("\x1b[32m{}\x1b[m", status.text),
            StatusKind::Error => println!("\x1b[31m{}\x1b[m", status.text),
        }
    }
}

fn refresh_preview(client: &BackendClient, id: &str) {
    match client.fetch_component(id) {
        Ok(_) => info!("Preview of {} refreshed", id),
        Err(e) => warn!("Preview refresh failed: {}", e),
    }
}

pub fn action_list(c: &Context) {
    run(list(c))
}

fn list(c: &Context) -> Result<()> {
    let templates = client(c)?.list_templates()?;
    if templates.is_empty() {
        println!("No templates yet.");
    }
    for t in templates {
        println!(
            "\x1b[35m{}\x1b[m  {}  \x1b[36m{}\x1b[m",
            t.template_id, t.template_name, t.template_type
        );
    }
    Ok(())
}

pub fn action_show(c: &Context) {
    run(show(c))
}

fn show(c: &Context) -> Result<()> {
    let id = arg(c, 0, "template id")?;
    let template = client(c)?.get_template(id)?;
    println!("\x1b[32mName\x1b[m: \x1b[35m{}\x1b[m", template.template_name);
    println!("\x1b[32mMode\x1b[m: \x1b[36m{}\x1b[m", template.template_type);
    let state = EditorState::from_template(&template);
    println!();
    for (i, v) in state.variables.iter().enumerate() {
        match state.key_override(i) {
            Some(key) => println!("  {} ({}) as {}", v.name, v.kind, key),
            None => println!("  {} ({})", v.name, v.kind),
        }
    }
    println!();
    for key in state.slots() {
        println!(
            "  \x1b[34m{}\x1b[m = {} [{:?}]",
            key,
            state.mapping(&key).unwrap_or("-"),
            state.binding(&key)
        );
    }
    Ok(())
}

pub fn action_create(c: &Context) {
    run(create(c))
}

fn create(c: &Context) -> Result<()> {
    let name = arg(c, 0, "template name")?;
    if name.trim().is_empty() {
        bail!("Template name must not be blank");
    }
    let template_json = open_json(arg(c, 1, "template json file")?)?;
    let new = NewTemplate {
        template_name: name.to_string(),
        template_json,
    };
    let created = client(c)?.create_template(&new)?;
    match created.as_ref().and_then(|d| d.get("templateId")) {
        Some(id) => println!("Created \x1b[35m{}\x1b[m", id),
        None => println!("Created {}", name),
    }
    Ok(())
}

pub fn action_delete(c: &Context) {
    run(delete(c))
}

fn delete(c: &Context) -> Result<()> {
    let id = arg(c, 0, "template id")?;
    client(c)?
        .delete_template(id)
        .with_context(|| "Failed to delete template. Please try again.")?;
    println!("Deleted {}", id);
    Ok(())
}

pub fn action_paths(c: &Context) {
    run(paths(c))
}

fn paths(c: &Context) -> Result<()> {
    let text = read_text(arg(c, 0, "response file")?)?;
    response_paths(&text).iter().for_each(|p| println!("{}", p));
    Ok(())
}

pub fn action_suggest(c: &Context) {
    run(suggest(c))
}

fn suggest(c: &Context) -> Result<()> {
    let text = arg(c, 0, "field text")?;
    let caret = c
        .int_flag("caret")
        .map(|n| n.max(0) as usize)
        .unwrap_or_else(|_| text.chars().count());
    let response = match c.string_flag("response") {
        Ok(path) => read_text(path)?,
        Err(_) => DEFAULT_RESPONSE.to_string(),
    };
    let mut state = EditorState::new(vec![], TemplateType::Dynamic);
    state.apply(EditorAction::SetResponse(response));
    state.apply(EditorAction::Input {
        key: "field".to_string(),
        text: text.to_string(),
        caret,
    });
    if !state.suggestions.open {
        println!("No open {{{{response. token before the caret.");
        return Ok(());
    }
    let candidates = state.candidates();
    for (i, p) in candidates.iter().enumerate() {
        println!("{:>3}  {}", i, p);
    }
    if let Ok(pick) = c.int_flag("pick") {
        if pick < 0 || pick as usize >= candidates.len() {
            bail!("No candidate #{}", pick);
        }
        (0..pick).for_each(|_| state.apply(EditorAction::KeyDown(Key::Down)));
        state.apply(EditorAction::KeyDown(Key::Enter));
        println!();
        println!("{}", state.mapping("field").unwrap_or_default());
    }
    Ok(())
}

pub fn action_map(c: &Context) {
    run(map(c))
}

fn map(c: &Context) -> Result<()> {
    let id = arg(c, 0, "template id")?;
    let file = open_mapping_file(arg(c, 1, "mapping file")?)?;
    let client = client(c)?;
    let template = client.get_template(id)?;
    let mut state = EditorState::from_template(&template);
    if let Ok(path) = c.string_flag("response") {
        state.apply(EditorAction::SetResponse(read_text(path)?));
    }
    for key in file.apply_to(&mut state)? {
        warn!("{} is not a mapping field of this template", key);
    }
    let slots = state.slots();
    let paths = response_paths(&state.response_text);
    for key in &slots {
        if let Some(path) = state.mapping(key).and_then(placeholder_path) {
            if !paths.iter().any(|p| p == path) {
                warn!("{} points at {}, which the sample response does not have", key, path);
            }
        }
    }

    if c.bool_flag("dry-run") {
        match state.splice_mappings(&template) {
            Some(doc) => println!("{}", serde_json::to_string_pretty(&doc)?),
            None => println!("Template has no variables array."),
        }
        return Ok(());
    }
    let outcome = save_mappings(&client, &mut state, &template, || {
        refresh_preview(&client, id)
    })?;
    if outcome == SaveOutcome::NoVariables {
        warn!("Template has no variables array; nothing was saved");
    }
    print_status(&state);
    Ok(())
}

/// `response.a.b` of a text that is exactly one `{{response.a.b}}` token.
fn placeholder_path(text: &str) -> Option<&str> {
    text.trim()
        .strip_prefix("{{")?
        .strip_suffix("}}")
        .filter(|p| p.starts_with("response"))
}

pub fn action_values(c: &Context) {
    run(values(c))
}

fn values(c: &Context) -> Result<()> {
    let id = arg(c, 0, "template id")?;
    let edits = match open_json(arg(c, 1, "values file")?)? {
        Value::Object(obj) => obj,
        _ => bail!("Values file must be an object of variable name to value"),
    };
    let client = client(c)?;
    let template = client.get_template(id)?;
    let mut state = EditorState::from_template(&template);
    if let Ok(mode) = c.string_flag("mode") {
        let mode = match mode.as_str() {
            "static" => TemplateType::Static,
            "dynamic" => TemplateType::Dynamic,
            other => bail!("Unknown mode: {}", other),
        };
        state.apply(EditorAction::SetMode(mode));
    }
    for (name, value) in edits {
        state.apply(EditorAction::SetValue { name, value });
    }
    save_values(&client, &mut state, &template, || refresh_preview(&client, id))?;
    print_status(&state);
    Ok(())
}

pub fn action_settings(c: &Context) {
    run(settings(c))
}

fn settings(c: &Context) -> Result<()> {
    let id = arg(c, 0, "template id")?;
    match client(c)?.list_dynamic_settings(id)? {
        Some(s) => println!("{}", serde_json::to_string_pretty(&s)?),
        None => println!("No dynamic settings for {}", id),
    }
    Ok(())
}

pub fn action_settings_save(c: &Context) {
    run(settings_save(c))
}

fn settings_save(c: &Context) -> Result<()> {
    let id = arg(c, 0, "template id")?;
    let file = open_settings_file(arg(c, 1, "settings file")?)?;
    let request_text = match c.string_flag("body") {
        Ok(path) => read_text(path)?,
        Err(_) => serde_json::to_string_pretty(&file.settings.request_json)?,
    };
    let headers = if file.headers.is_empty() {
        file.settings.headers()
    } else {
        file.headers
    };
    let draft = ApiSettingsDraft {
        endpoint: file.settings.endpoint,
        method: file.settings.http_method,
        request_text,
        headers,
    };
    let client = client(c)?;
    let template = client.get_template(id)?;
    let mut state = EditorState::from_template(&template);
    save_api_settings(&client, &mut state, &template, &draft, || {
        refresh_preview(&client, id)
    })?;
    print_status(&state);
    Ok(())
}

pub fn action_sync(c: &Context) {
    run(sync_response(c))
}

fn sync_response(c: &Context) -> Result<()> {
    let client = client(c)?;
    let stored = match c.args.first() {
        Some(id) => client.list_dynamic_settings(id)?,
        None => None,
    };
    let mut request = match stored {
        Some(settings) => SyncRequest::from_settings(&settings),
        None => SyncRequest {
            endpoint: String::new(),
            method: Default::default(),
            headers: vec![],
            body: String::new(),
        },
    };
    if let Ok(endpoint) = c.string_flag("endpoint") {
        request.endpoint = endpoint;
    }
    if let Ok(method) = c.string_flag("method") {
        request.method = method.parse::<HttpMethod>().map_err(anyhow::Error::msg)?;
    }
    if let Ok(path) = c.string_flag("body") {
        request.body = read_text(path)?;
    }
    let synced = sync(client.http(), &request)?;
    println!(
        "\x1b[32mSuccessfully synced response ({} {})\x1b[m",
        synced.status, synced.reason
    );
    match c.string_flag("out") {
        Ok(path) => {
            write_text(&path, &synced.display)?;
            info!("Sample response written to {}", path);
        }
        Err(_) => println!("{}", synced.display),
    }
    Ok(())
}

pub fn action_preview(c: &Context) {
    run(preview(c))
}

fn preview(c: &Context) -> Result<()> {
    let id = arg(c, 0, "template id")?;
    let device: Device = match c.string_flag("device") {
        Ok(d) => d.parse::<Device>().map_err(anyhow::Error::msg)?,
        Err(_) => Device::default(),
    };
    let client = client(c)?;
    let template = client.get_template(id)?;
    let preview = fetch_preview(
        &client,
        &template.template_id,
        Some(&template.static_template_json),
    )?;
    println!("\x1b[32mDevice\x1b[m: {}", device);
    if let PreviewSource::StaticFallback { reason } = &preview.source {
        println!("\x1b[33mShowing static template\x1b[m: {}", reason);
    }
    match c.string_flag("out") {
        Ok(dir) => {
            let name = export_file_name(id, chrono::Local::now().date_naive());
            let path = write_json(&dir, &name, &preview.data)?;
            println!("Exported {}", path.display());
        }
        Err(_) => println!("{}", serde_json::to_string_pretty(&preview.data)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_paths() {
        assert_eq!(placeholder_path("{{response.a.b}}"), Some("response.a.b"));
        assert_eq!(placeholder_path(" {{response}} "), Some("response"));
        assert_eq!(placeholder_path("Hi {{response.a}}"), None);
        assert_eq!(placeholder_path("{{other.a}}"), None);
    }
}
