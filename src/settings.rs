//! Display settings and the endpoints for reading and updating them.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, json};

use crate::{
    Error,
    app_state::DocumentState,
    extract::ApiJson,
    payload::Payload,
    store::Collection,
    user::CurrentUser,
};

/// The date format used when no setting has been saved.
pub const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD";
/// The currency used when no setting has been saved.
pub const DEFAULT_CURRENCY: &str = "ILS";

fn default_allowed_currencies() -> Vec<String> {
    vec!["ILS".to_owned(), "USD".to_owned()]
}

/// A user's display settings.
///
/// Keys the client stored that are not known here are kept in `extra` so
/// that updating the known keys does not drop them.
///
/// Stored settings are read leniently: a known key that is missing or has the
/// wrong type (e.g. `"currency": null`) takes its default, and the other keys
/// are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Map<String, Value>")]
pub struct Settings {
    /// How dates are displayed, e.g. "YYYY-MM-DD".
    pub date_format: String,
    /// The currency amounts are displayed in.
    pub currency: String,
    /// The currencies the user can pick from.
    pub allowed_currencies: Vec<String>,
    /// Any other keys the client stored.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_owned(),
            currency: DEFAULT_CURRENCY.to_owned(),
            allowed_currencies: default_allowed_currencies(),
            extra: Map::new(),
        }
    }
}

impl From<Map<String, Value>> for Settings {
    fn from(mut fields: Map<String, Value>) -> Self {
        let defaults = Settings::default();

        let date_format = take_known(&mut fields, "dateFormat").unwrap_or(defaults.date_format);
        let currency = take_known(&mut fields, "currency").unwrap_or(defaults.currency);
        let allowed_currencies =
            take_known(&mut fields, "allowedCurrencies").unwrap_or(defaults.allowed_currencies);

        Self {
            date_format,
            currency,
            allowed_currencies,
            extra: fields,
        }
    }
}

/// Remove `key` from `fields` and parse it, `None` if it is absent or has the
/// wrong type.
fn take_known<T: DeserializeOwned>(fields: &mut Map<String, Value>, key: &str) -> Option<T> {
    let value = fields.shift_remove(key)?;

    serde_json::from_value(value)
        .inspect_err(|error| tracing::warn!("ignoring stored setting {key:?}: {error}"))
        .ok()
}

/// A partial update to [Settings], every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    /// The new date format, if it changes.
    pub date_format: Option<String>,
    /// The new currency, if it changes.
    pub currency: Option<String>,
    /// The new list of currencies to pick from, if it changes.
    pub allowed_currencies: Option<Vec<String>>,
}

impl Settings {
    /// Apply the fields present in `update`, keeping the rest.
    pub fn merge(mut self, update: SettingsUpdate) -> Self {
        if let Some(date_format) = update.date_format {
            self.date_format = date_format;
        }
        if let Some(currency) = update.currency {
            self.currency = currency;
        }
        if let Some(allowed_currencies) = update.allowed_currencies {
            self.allowed_currencies = allowed_currencies;
        }

        self
    }
}

/// Parse the `settings` object of a request body.
///
/// A missing `settings` key is an empty update.
///
/// # Errors
/// Returns [Error::InvalidPayload] if `settings` is not an object, or if one
/// of the known keys has the wrong type.
pub(crate) fn parse_settings_update(payload: &Payload) -> Result<SettingsUpdate, Error> {
    match payload.get("settings") {
        None | Some(Value::Null) => Ok(SettingsUpdate::default()),
        Some(settings @ Value::Object(_)) => serde_json::from_value(settings.clone())
            .map_err(|error| Error::InvalidPayload(format!("invalid 'settings': {error}"))),
        Some(_) => Err(Error::InvalidPayload(
            "'settings' must be an object".to_owned(),
        )),
    }
}

/// Get the user's settings, or the defaults if none are saved.
pub async fn get_settings(
    State(state): State<DocumentState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Settings>, Error> {
    state.store.ensure_user(&user)?;

    Ok(Json(
        state
            .store
            .read::<Settings>(&user, Collection::Settings)
            .into_value(),
    ))
}

/// Update the known settings keys from `{"settings": {...}}`.
pub async fn update_settings(
    State(state): State<DocumentState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<Payload>,
) -> Result<Json<Value>, Error> {
    let update = parse_settings_update(&payload)?;
    state.store.ensure_user(&user)?;

    let settings = state
        .store
        .read::<Settings>(&user, Collection::Settings)
        .into_writable(Collection::Settings)?
        .merge(update);

    state
        .store
        .write(&user, Collection::Settings, &settings)
        .inspect_err(|error| tracing::error!("could not save settings for {user}: {error}"))?;

    Ok(Json(json!({ "ok": true })))
}

#[cfg(test)]
mod settings_tests {
    use serde_json::json;

    use crate::settings::{Settings, SettingsUpdate, parse_settings_update};

    #[test]
    fn defaults_match_new_user_settings() {
        let settings = serde_json::to_value(Settings::default()).unwrap();

        assert_eq!(
            settings,
            json!({
                "dateFormat": "YYYY-MM-DD",
                "currency": "ILS",
                "allowedCurrencies": ["ILS", "USD"],
            })
        );
    }

    #[test]
    fn merge_keeps_unset_fields() {
        let settings = Settings::default().merge(SettingsUpdate {
            currency: Some("USD".to_owned()),
            ..Default::default()
        });

        assert_eq!(settings.currency, "USD");
        assert_eq!(settings.date_format, "YYYY-MM-DD");
    }

    #[test]
    fn unknown_keys_survive_a_round_trip() {
        let settings: Settings = serde_json::from_value(json!({
            "dateFormat": "DD/MM/YYYY",
            "currency": "ILS",
            "allowedCurrencies": ["ILS"],
            "theme": "dark",
        }))
        .unwrap();

        let value = serde_json::to_value(settings).unwrap();

        assert_eq!(value["theme"], "dark");
    }

    #[test]
    fn wrongly_typed_known_keys_take_defaults() {
        let settings: Settings = serde_json::from_value(json!({
            "dateFormat": "DD/MM/YYYY",
            "currency": null,
            "allowedCurrencies": "ILS",
            "theme": "dark",
        }))
        .unwrap();

        assert_eq!(settings.date_format, "DD/MM/YYYY");
        assert_eq!(settings.currency, "ILS");
        assert_eq!(settings.allowed_currencies, vec!["ILS", "USD"]);
        assert_eq!(settings.extra.get("theme"), Some(&json!("dark")));
    }

    #[test]
    fn rejects_non_object_settings() {
        let payload = serde_json::from_value(json!({"settings": ["USD"]})).unwrap();

        assert!(parse_settings_update(&payload).is_err());
    }
}
