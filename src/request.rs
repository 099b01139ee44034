//! Request boundary: untyped tool arguments to typed [`QueryOptions`].
//!
//! Outer protocol layers hand over a JSON object of loosely typed values.
//! Everything is checked here, once, so the pipeline only ever sees closed
//! enumerations and known filter values.

use serde_json::{Map, Value};

use crate::config::EngineConfig;
use crate::enums::{FrameworkFilter, Verbosity};
use crate::error::RequestError;
use crate::query::QueryOptions;

/// Parameters accepted in a query request, in the order they are reported.
pub const ALLOWED_PARAMETERS: &[&str] = &[
    "context",
    "language",
    "framework",
    "verbosity",
    "category",
    "limit",
];

/// Shape-checked query arguments, not yet checked against an engine's
/// supported vocabularies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryArguments {
    pub context: String,
    pub language: Option<String>,
    pub framework: Option<String>,
    pub category: Option<String>,
    pub limit: Option<usize>,
    pub verbosity: Option<String>,
}

impl QueryArguments {
    /// Read arguments from a JSON object.
    ///
    /// Rejects non-objects, unknown keys and values of the wrong type. A
    /// `null` value counts as absent. Empty strings for optional filters are
    /// treated as absent too.
    pub fn from_value(value: &Value) -> Result<Self, RequestError> {
        let object = value.as_object().ok_or(RequestError::NotAnObject)?;

        if let Some(name) = object
            .keys()
            .find(|k| !ALLOWED_PARAMETERS.contains(&k.as_str()))
        {
            return Err(RequestError::UnknownParameter {
                name: name.clone(),
                allowed: ALLOWED_PARAMETERS.join(", "),
            });
        }

        Ok(Self {
            context: string_field(object, "context")?.unwrap_or_default(),
            language: non_empty(string_field(object, "language")?),
            framework: non_empty(string_field(object, "framework")?),
            category: non_empty(string_field(object, "category")?),
            limit: limit_field(object)?,
            verbosity: non_empty(string_field(object, "verbosity")?),
        })
    }

    /// Check against `config` and convert to pipeline options.
    pub fn into_options(self, config: &EngineConfig) -> Result<QueryOptions, RequestError> {
        if self.context.trim().is_empty() {
            return Err(RequestError::EmptyContext);
        }

        if let Some(language) = &self.language {
            if !contains_ignore_case(&config.supported_languages, language) {
                return Err(RequestError::UnsupportedLanguage {
                    value: language.clone(),
                    supported: config.supported_languages.join(", "),
                });
            }
        }

        let framework = match &self.framework {
            None => None,
            Some(name) => {
                let filter = FrameworkFilter::from(name.as_str());
                if let FrameworkFilter::Named(named) = &filter {
                    if !contains_ignore_case(&config.supported_frameworks, named) {
                        let mut supported = config.supported_frameworks.clone();
                        supported.push("any".to_string());
                        return Err(RequestError::UnsupportedFramework {
                            value: name.clone(),
                            supported: supported.join(", "),
                        });
                    }
                }
                Some(filter)
            }
        };

        let verbosity = match &self.verbosity {
            None => Verbosity::default(),
            Some(v) => v
                .parse::<Verbosity>()
                .map_err(|_| RequestError::InvalidVerbosity(v.clone()))?,
        };

        Ok(QueryOptions {
            context: self.context,
            language: self.language,
            framework,
            category: self.category,
            limit: self.limit.unwrap_or(0),
            verbosity,
        })
    }
}

fn string_field(object: &Map<String, Value>, field: &'static str) -> Result<Option<String>, RequestError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(RequestError::InvalidType {
            field,
            expected: "string",
        }),
    }
}

fn limit_field(object: &Map<String, Value>) -> Result<Option<usize>, RequestError> {
    match object.get("limit") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| RequestError::InvalidLimit(n.to_string())),
        Some(_) => Err(RequestError::InvalidType {
            field: "limit",
            expected: "non-negative integer",
        }),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn contains_ignore_case(list: &[String], value: &str) -> bool {
    let value = value.trim().to_lowercase();
    list.iter().any(|item| item.to_lowercase() == value)
}
