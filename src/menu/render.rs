use std::{borrow::Cow, fmt::Write};

use super::{Dish, MenuDigest, StationMenu};

pub const GREETING: &str = "Good afternoon! Here are the dishes for today:";
pub const NO_MEALS_NOTICE: &str = "No meals available";

/// Escapes the characters Telegram's HTML parse mode treats as markup.
pub fn escape_html(s: &str) -> Cow<'_, str> {
    if !s.contains(&['&', '<', '>'][..]) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn render_dish(out: &mut String, dish: &Dish) {
    let _ = write!(out, "— {}", escape_html(&dish.name));
    if let Some(calories) = &dish.calories_text {
        let _ = write!(out, " ({} cal)", escape_html(calories));
    }
    out.push('\n');
}

pub fn render_station(station: &StationMenu) -> String {
    let mut out = format!("<b>{}", escape_html(&station.station.name));
    if let Some(total) = station.displayed_total() {
        let _ = write!(out, " ({total} cal)");
    }
    out.push_str("</b>\n");
    for dish in &station.dishes {
        render_dish(&mut out, dish);
    }
    out
}

/// Station blocks separated by a blank line, without a trailing one.
pub fn render_digest(digest: &MenuDigest) -> String {
    digest
        .stations
        .iter()
        .map(render_station)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end_matches('\n')
        .to_owned()
}

pub fn menu_message(digest: &MenuDigest) -> String {
    format!("{GREETING}\n\n{}", render_digest(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::StationSpec;

    fn dish(name: &str, calories: &str) -> Dish {
        Dish {
            name: name.to_owned(),
            calories_text: (!calories.is_empty()).then(|| calories.to_owned()),
            calories: calories.parse().ok(),
        }
    }

    fn station(spec: StationSpec, dishes: Vec<Dish>) -> StationMenu {
        let total_calories = dishes.iter().filter_map(|d| d.calories).sum();
        StationMenu {
            station: spec,
            dishes,
            total_calories,
        }
    }

    #[test]
    fn test_render_dinner() {
        let digest = MenuDigest {
            stations: vec![
                station(
                    StationSpec::new("Home Zone 1"),
                    vec![dish("Grilled Chicken", "450")],
                ),
                station(StationSpec::new("True Balance"), vec![dish("Rice Bowl", "300")]),
                station(StationSpec::new("Soup Station").without_total(), vec![]),
            ],
        };
        assert_eq!(
            render_digest(&digest),
            "<b>Home Zone 1 (450 cal)</b>\n\
             — Grilled Chicken (450 cal)\n\
             \n\
             <b>True Balance (300 cal)</b>\n\
             — Rice Bowl (300 cal)\n\
             \n\
             <b>Soup Station</b>"
        );
    }

    #[test]
    fn test_render_station_totals() {
        let cases = [
            (StationSpec::new("Grill"), vec![dish("Burger", "700")], "<b>Grill (700 cal)</b>\n— Burger (700 cal)\n"),
            (StationSpec::new("Grill"), vec![dish("Burger", "")], "<b>Grill</b>\n— Burger\n"),
            (StationSpec::new("Grill"), vec![dish("Burger", "N/A")], "<b>Grill</b>\n— Burger (N/A cal)\n"),
            (
                StationSpec::new("Soup").without_total(),
                vec![dish("Chili", "300"), dish("Bisque", "200")],
                "<b>Soup</b>\n— Chili (300 cal)\n— Bisque (200 cal)\n",
            ),
            (StationSpec::new("Grill"), vec![], "<b>Grill</b>\n"),
        ];
        for (spec, dishes, expected) in cases {
            assert_eq!(render_station(&station(spec, dishes)), expected);
        }
    }

    #[test]
    fn test_render_escapes_markup() {
        let digest = MenuDigest {
            stations: vec![station(
                StationSpec::new("Mac & Cheese <Bar>"),
                vec![dish("Fish & Chips", "")],
            )],
        };
        assert_eq!(
            render_digest(&digest),
            "<b>Mac &amp; Cheese &lt;Bar&gt;</b>\n— Fish &amp; Chips"
        );
    }

    #[test]
    fn test_menu_message_all_empty() {
        let digest = MenuDigest {
            stations: StationSpec::defaults()
                .into_iter()
                .map(|spec| station(spec, vec![]))
                .collect(),
        };
        assert_eq!(
            menu_message(&digest),
            "Good afternoon! Here are the dishes for today:\n\n\
             <b>Home Zone 1</b>\n\n<b>True Balance</b>\n\n<b>Soup Station</b>"
        );
    }
}
