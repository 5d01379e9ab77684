use std::collections::HashMap;

use super::{dish_name::clean_dish_name, MenuDocument, StationSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dish {
    pub name: String,
    /// Calorie text as published, `None` when the site sent nothing.
    pub calories_text: Option<String>,
    /// Parsed calories; `None` for empty or non-numeric text.
    pub calories: Option<u32>,
}

impl Dish {
    fn new(marketing_name: &str, calories: &str) -> Self {
        let calories = calories.trim();
        Self {
            name: clean_dish_name(marketing_name),
            calories_text: (!calories.is_empty()).then(|| calories.to_owned()),
            calories: calories.parse().ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationMenu {
    pub station: StationSpec,
    pub dishes: Vec<Dish>,
    pub total_calories: u32,
}

impl StationMenu {
    fn new(station: StationSpec) -> Self {
        Self {
            station,
            dishes: Vec::new(),
            total_calories: 0,
        }
    }

    fn push(&mut self, dish: Dish) {
        self.total_calories = self
            .total_calories
            .saturating_add(dish.calories.unwrap_or(0));
        self.dishes.push(dish);
    }

    /// The total for the header, if this station shows one at all.
    pub fn displayed_total(&self) -> Option<u32> {
        (self.station.show_total && self.total_calories > 0).then_some(self.total_calories)
    }
}

/// One entry per allow-listed station, in allow-list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuDigest {
    pub stations: Vec<StationMenu>,
}

impl MenuDigest {
    pub fn is_empty(&self) -> bool {
        self.stations.iter().all(|s| s.dishes.is_empty())
    }
}

/// Station id -> index into the allow-list, for the resolved period only.
#[derive(Debug, Default)]
struct StationRegistry<'a> {
    by_id: HashMap<&'a str, usize>,
}

impl<'a> StationRegistry<'a> {
    fn build(document: &'a MenuDocument, period_id: &str, allow_list: &[StationSpec]) -> Self {
        // duplicate rows under one name each keep their own id, and a
        // repeated id takes the last row's name
        let mut by_id = HashMap::new();
        for station in &document.menu.stations {
            if station.period_id != period_id {
                continue;
            }
            if let Some(idx) = allow_list.iter().position(|s| s.name == station.name) {
                by_id.insert(station.station_id.as_str(), idx);
            }
        }
        Self { by_id }
    }

    fn get(&self, station_id: &str) -> Option<usize> {
        self.by_id.get(station_id).copied()
    }
}

fn resolve_period_id<'a>(document: &'a MenuDocument, target_period: &str) -> Option<&'a str> {
    document
        .menu
        .periods
        .iter()
        .find(|p| p.name == target_period)
        .map(|p| p.period_id.as_str())
}

/// Folds the raw document into per-station dish lists for `target_period`.
///
/// A period that isn't published yet is not an error: nothing matches and
/// every station comes back empty.
pub fn extract(
    document: &MenuDocument,
    target_period: &str,
    allow_list: &[StationSpec],
) -> MenuDigest {
    let mut stations: Vec<StationMenu> = allow_list.iter().cloned().map(StationMenu::new).collect();
    let Some(period_id) = resolve_period_id(document, target_period) else {
        log::warn!("No period named {target_period:?} in the menu");
        return MenuDigest { stations };
    };
    log::info!("Resolved period {target_period:?} to id {period_id:?}");

    let registry = StationRegistry::build(document, period_id, allow_list);

    for product in &document.menu.products {
        if product.period_id != period_id {
            continue;
        }
        if let Some(idx) = registry.get(&product.station_id) {
            stations[idx].push(Dish::new(
                &product.product.marketing_name,
                &product.product.calories,
            ));
        }
    }

    MenuDigest { stations }
}
