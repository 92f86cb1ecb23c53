use crate::{
    config::Config,
    error::ClientError,
    types::{DynamicSettings, Envelope, NewTemplate, Template, TemplatePatch},
};
use log::{debug, info};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub type Result<T> = std::result::Result<T, ClientError>;

pub trait TemplateStore {
    fn update_template(&self, id: &str, patch: &TemplatePatch) -> Result<()>;
    fn create_dynamic_settings(&self, id: &str, settings: &DynamicSettings) -> Result<()>;
    fn fetch_component(&self, id: &str) -> Result<Value>;
}

pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn http(&self) -> &Client {
        &self.client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn list_templates(&self) -> Result<Vec<Template>> {
        let response = self.client.get(self.url("/templates")).send()?;
        let (status, body) = read(response)?;
        if !(200..300).contains(&status) {
            return Err(ClientError::HttpStatus { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub fn get_template(&self, id: &str) -> Result<Template> {
        debug!("GET /templates/{}", id);
        let response = self.client.get(self.url(&format!("/templates/{}", id))).send()?;
        envelope(response)?.into_data()
    }

    pub fn create_template(&self, new: &NewTemplate) -> Result<Option<Value>> {
        let response = self.client.post(self.url("/templates")).json(new).send()?;
        let created = envelope::<Value>(response)?;
        info!("Created template {}", new.template_name);
        Ok(created.data)
    }

    pub fn delete_template(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/templates/{}", id)))
            .send()?;
        let (status, body) = read(response)?;
        if !(200..300).contains(&status) {
            return Err(ClientError::HttpStatus { status, body });
        }
        Ok(())
    }

    /// `None` when the template has no stored settings yet.
    pub fn list_dynamic_settings(&self, id: &str) -> Result<Option<DynamicSettings>> {
        let response = self
            .client
            .get(self.url(&format!("/templates/{}/dynamic-settings", id)))
            .send()?;
        Ok(envelope(response)?.data)
    }
}

impl TemplateStore for BackendClient {
    fn update_template(&self, id: &str, patch: &TemplatePatch) -> Result<()> {
        debug!("PUT /templates/{}", id);
        let response = self
            .client
            .put(self.url(&format!("/templates/{}", id)))
            .json(patch)
            .send()?;
        envelope::<Value>(response).map(|_| ())
    }

    fn create_dynamic_settings(&self, id: &str, settings: &DynamicSettings) -> Result<()> {
        let response = self
            .client
            .post(self.url(&format!("/templates/{}/dynamic-settings", id)))
            .json(settings)
            .send()?;
        envelope::<Value>(response).map(|_| ())
    }

    fn fetch_component(&self, id: &str) -> Result<Value> {
        let response = self
            .client
            .get(self.url(&format!("/sdui/component/{}", id)))
            .send()?;
        envelope(response)?.into_data()
    }
}

fn read(response: Response) -> Result<(u16, String)> {
    let status = response.status().as_u16();
    let body = response.text()?;
    Ok((status, body))
}

fn envelope<T: DeserializeOwned>(response: Response) -> Result<Envelope<T>> {
    let (status, body) = read(response)?;
    parse_envelope(status, &body)
}

pub(crate) fn parse_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<Envelope<T>> {
    if !(200..300).contains(&status) {
        return Err(ClientError::HttpStatus {
            status,
            body: body.to_string(),
        });
    }
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    if !envelope.success {
        let message = envelope
            .message
            .unwrap_or_else(|| "Request was not successful".to_string());
        return Err(ClientError::Rejected(message));
    }
    Ok(envelope)
}

impl<T> Envelope<T> {
    pub fn into_data(self) -> Result<T> {
        self.data.ok_or(ClientError::MissingData)
    }
}
