use crate::client::TemplateStore;
use chrono::NaiveDate;
use log::warn;
use serde_json::Value;
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Mobile,
    Tablet,
    Web,
}

impl Device {
    /// Frame width in px; `None` means the full available width.
    pub fn width(&self) -> Option<u32> {
        match self {
            Self::Mobile => Some(375),
            Self::Tablet => Some(768),
            Self::Web => None,
        }
    }

    pub fn height(&self) -> (u32, Option<u32>) {
        match self {
            Self::Mobile => (667, Some(844)),
            Self::Tablet => (1024, Some(1366)),
            Self::Web => (600, None),
        }
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mobile" => Ok(Self::Mobile),
            "tablet" => Ok(Self::Tablet),
            "web" => Ok(Self::Web),
            _ => Err(format!("unknown device: {} (mobile, tablet, web)", s)),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .width()
            .map_or_else(|| "full width".to_string(), |w| format!("{}px", w));
        let (min, max) = self.height();
        let name = match self {
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
            Self::Web => "web",
        };
        match max {
            Some(max) => write!(f, "{} ({}, {}-{}px tall)", name, width, min, max),
            None => write!(f, "{} ({}, min {}px tall)", name, width, min),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreviewSource {
    Live,
    /// The component endpoint failed; the static document is shown instead.
    StaticFallback { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub data: Value,
    pub source: PreviewSource,
}

pub fn fetch_preview<S: TemplateStore>(
    store: &S,
    id: &str,
    fallback: Option<&Value>,
) -> crate::client::Result<Preview> {
    match store.fetch_component(id) {
        Ok(data) => Ok(Preview {
            data,
            source: PreviewSource::Live,
        }),
        Err(e) => match fallback.filter(|doc| !doc.is_null()) {
            Some(doc) => {
                warn!("Preview of {} failed ({}), using static template", id, e);
                Ok(Preview {
                    data: doc.clone(),
                    source: PreviewSource::StaticFallback {
                        reason: e.to_string(),
                    },
                })
            }
            None => Err(e),
        },
    }
}

pub fn export_file_name(id: &str, date: NaiveDate) -> String {
    format!("template-{}-{}.json", id, date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ClientError,
        types::{DynamicSettings, TemplatePatch},
    };
    use serde_json::json;

    struct Component(Option<Value>);

    impl TemplateStore for Component {
        fn update_template(&self, _: &str, _: &TemplatePatch) -> crate::client::Result<()> {
            Ok(())
        }

        fn create_dynamic_settings(&self, _: &str, _: &DynamicSettings) -> crate::client::Result<()> {
            Ok(())
        }

        fn fetch_component(&self, _: &str) -> crate::client::Result<Value> {
            self.0.clone().ok_or(ClientError::Rejected("Template not found".into()))
        }
    }

    #[test]
    fn live_component_wins() {
        let store = Component(Some(json!({"card": {"log_id": "live"}})));
        let preview = fetch_preview(&store, "t", Some(&json!({"card": {}}))).unwrap();
        assert_eq!(preview.source, PreviewSource::Live);
        assert_eq!(preview.data["card"]["log_id"], "live");
    }

    #[test]
    fn falls_back_to_static_document() {
        let store = Component(None);
        let preview = fetch_preview(&store, "t", Some(&json!({"card": {}}))).unwrap();
        assert_eq!(
            preview.source,
            PreviewSource::StaticFallback {
                reason: "Template not found".into()
            }
        );
        assert!(fetch_preview(&store, "t", None).is_err());
        assert!(fetch_preview(&store, "t", Some(&Value::Null)).is_err());
    }

    #[test]
    fn device_frames() {
        assert_eq!("Tablet".parse::<Device>(), Ok(Device::Tablet));
        assert!("watch".parse::<Device>().is_err());
        assert_eq!(Device::Web.width(), None);
        assert_eq!(Device::Mobile.to_string(), "mobile (375px, 667-844px tall)");
        assert_eq!(Device::Web.to_string(), "web (full width, min 600px tall)");
    }

    #[test]
    fn export_name_is_dated() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(export_file_name("promo", date), "template-promo-2026-10-16.json");
    }
}
