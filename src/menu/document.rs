use serde::{Deserialize, Deserializer};

use crate::error::Result;

/// Body of the site's `GetMenus` call. Holds every period published for the
/// day, so stations and products must be filtered by period id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MenuDocument {
    #[serde(rename = "Menu")]
    pub menu: Menu,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Menu {
    #[serde(rename = "MenuPeriods", default, deserialize_with = "nullable")]
    pub periods: Vec<MenuPeriod>,
    #[serde(rename = "MenuStations", default, deserialize_with = "nullable")]
    pub stations: Vec<MenuStation>,
    #[serde(rename = "MenuProducts", default, deserialize_with = "nullable")]
    pub products: Vec<MenuProduct>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MenuPeriod {
    #[serde(rename = "PeriodId", default, deserialize_with = "nullable")]
    pub period_id: String,
    #[serde(rename = "Name", default, deserialize_with = "nullable")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MenuStation {
    #[serde(rename = "PeriodId", default, deserialize_with = "nullable")]
    pub period_id: String,
    #[serde(rename = "StationId", default, deserialize_with = "nullable")]
    pub station_id: String,
    #[serde(rename = "Name", default, deserialize_with = "nullable")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MenuProduct {
    #[serde(rename = "PeriodId", default, deserialize_with = "nullable")]
    pub period_id: String,
    #[serde(rename = "StationId", default, deserialize_with = "nullable")]
    pub station_id: String,
    #[serde(rename = "Product", default, deserialize_with = "nullable")]
    pub product: Product,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Product {
    #[serde(rename = "MarketingName", default, deserialize_with = "nullable")]
    pub marketing_name: String,
    #[serde(rename = "ShortDescription", default, deserialize_with = "nullable")]
    pub short_description: String,
    // calories arrive as a string and may be empty or non-numeric
    #[serde(rename = "Calories", default, deserialize_with = "nullable")]
    pub calories: String,
}

/// The API sends `null` for missing lists and strings.
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl MenuDocument {
    pub fn parse(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(From::from)
    }
}
