//! Query parameter models: the default context and custom dimensions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One query parameter. Items with no value are left out of the hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryItem {
    pub name: String,
    pub value: Option<String>,
}

impl QueryItem {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    pub fn optional(name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            value: value.map(Into::into),
        }
    }
}

/// Anything that contributes ordered parameters to a hit.
pub trait QueryItems {
    fn query_items(&self) -> Vec<QueryItem>;
}

impl<T: QueryItems + ?Sized> QueryItems for &T {
    fn query_items(&self) -> Vec<QueryItem> {
        (**self).query_items()
    }
}

/// Ordered event parameters, built by the caller.
///
/// ```rust
/// use measurement::Params;
///
/// let params = Params::new()
///     .set("t", "event")
///     .set("ec", "video")
///     .set_opt("el", None::<String>);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    items: Vec<QueryItem>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.items.push(QueryItem::new(name, value));
        self
    }

    /// Append a parameter that is dropped from the hit when `None`.
    pub fn set_opt(mut self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        self.items.push(QueryItem::optional(name, value));
        self
    }
}

impl QueryItems for Params {
    fn query_items(&self) -> Vec<QueryItem> {
        self.items.clone()
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(|(k, v)| QueryItem::new(k, v)).collect(),
        }
    }
}

/// Who the hits belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Identifier {
    /// Anonymous identifier of the user.
    Client(Uuid),
    /// Known identifier associated with the user.
    User(String),
}

impl Identifier {
    /// A fresh random client id.
    pub fn anonymous() -> Self {
        Identifier::Client(Uuid::new_v4())
    }

    pub fn user(id: impl Into<String>) -> Self {
        Identifier::User(id.into())
    }
}

impl QueryItems for Identifier {
    fn query_items(&self) -> Vec<QueryItem> {
        match self {
            Identifier::Client(id) => vec![QueryItem::new("cid", id.hyphenated().to_string())],
            Identifier::User(id) => vec![QueryItem::new("uid", id.as_str())],
        }
    }
}

/// Application name, identifier and version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl AppInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: None,
            version: None,
        }
    }

    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

impl QueryItems for AppInfo {
    fn query_items(&self) -> Vec<QueryItem> {
        vec![
            QueryItem::new("an", self.name.as_str()),
            QueryItem::optional("aid", self.identifier.as_deref()),
            QueryItem::optional("av", self.version.as_deref()),
        ]
    }
}

/// One custom dimension and one custom metric attached to a hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomDimensions {
    pub dimension_index: u32,
    pub dimension_value: String,
    pub metric_index: u32,
    pub metric_value: i64,
}

impl QueryItems for CustomDimensions {
    fn query_items(&self) -> Vec<QueryItem> {
        vec![
            QueryItem::new(
                format!("cd{}", self.dimension_index),
                self.dimension_value.as_str(),
            ),
            QueryItem::new(
                format!("cm{}", self.metric_index),
                self.metric_value.to_string(),
            ),
        ]
    }
}

/// Parameters prepended to every hit of a tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultContext {
    pub(crate) tracking_id: String,
    pub(crate) identifier: Identifier,
    pub(crate) app_info: Option<AppInfo>,
    pub(crate) data_source: Option<String>,
    pub(crate) user_language: Option<String>,
}

/// Measurement Protocol version.
pub const PROTOCOL_VERSION: &str = "1";

impl DefaultContext {
    pub fn new(tracking_id: impl Into<String>, identifier: Identifier) -> Self {
        Self {
            tracking_id: tracking_id.into(),
            identifier,
            app_info: None,
            data_source: None,
            user_language: None,
        }
    }

    pub fn tracking_id(&self) -> &str {
        &self.tracking_id
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn app_info(&self) -> Option<&AppInfo> {
        self.app_info.as_ref()
    }

    pub fn data_source(&self) -> Option<&str> {
        self.data_source.as_deref()
    }

    pub fn user_language(&self) -> Option<&str> {
        self.user_language.as_deref()
    }
}

impl QueryItems for DefaultContext {
    fn query_items(&self) -> Vec<QueryItem> {
        let mut items = vec![QueryItem::new("v", PROTOCOL_VERSION)];
        if let Some(app) = &self.app_info {
            items.extend(app.query_items());
        }
        items.extend(self.identifier.query_items());
        items.push(QueryItem::new("tid", self.tracking_id.as_str()));
        items.push(QueryItem::optional("ds", self.data_source.as_deref()));
        items.push(QueryItem::optional("ul", self.user_language.as_deref()));
        items
    }
}
