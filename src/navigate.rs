use std::fmt::{self, Display, Formatter};

use crate::{
    browser::Page,
    error::{Error, Result},
};

pub const MENU_WRAPPER: &str = ".MenuWrapperDaily";
pub const MENU_WRAPPER_NOTE: &str = ".MenuWrapperDaily p";
pub const MEAL_SELECTION_BUTTON: &str = "button.DateMealFilterButton";
pub const MEAL_INPUT: &str = "#aria-meal-input";
pub const DONE_BUTTON: &str = ".Done";
pub const NO_MENU_TEXT: &str =
    "There are currently no menus available for this meal period and date.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Loaded,
    MealPeriodSelecting,
    MealPeriodConfirming,
    Settled,
}

impl Display for Step {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loaded => "loaded",
            Self::MealPeriodSelecting => "meal period selection",
            Self::MealPeriodConfirming => "meal period confirmation",
            Self::Settled => "settled",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The site says nothing is published; no menu request will be made.
    NoMenu,
    /// The period was confirmed and the page went quiet.
    Settled,
}

async fn require<P: Page + ?Sized>(page: &P, step: Step, selector: &'static str) -> Result<()> {
    if page.find(selector).await? {
        Ok(())
    } else {
        Err(Error::NavigationFailed { step, selector })
    }
}

/// A missing paragraph just means the menu is there.
async fn no_menu_published<P: Page + ?Sized>(page: &P) -> Result<bool> {
    let note = page.text(MENU_WRAPPER_NOTE).await?;
    Ok(note.is_some_and(|text| text.trim() == NO_MENU_TEXT))
}

/// Drives the menu UI until the site asks its API for `period`.
///
/// Does not retry: a missing element fails the whole run with the step it
/// failed at.
pub async fn navigate<P: Page + ?Sized>(page: &P, period: &str) -> Result<Outcome> {
    let mut step = Step::Loaded;
    loop {
        log::debug!("Navigation step: {step}");
        step = match step {
            Step::Loaded => {
                require(page, step, MENU_WRAPPER).await?;
                if no_menu_published(page).await? {
                    return Ok(Outcome::NoMenu);
                }
                Step::MealPeriodSelecting
            }
            Step::MealPeriodSelecting => {
                require(page, step, MEAL_SELECTION_BUTTON).await?;
                page.click(MEAL_SELECTION_BUTTON).await?;
                Step::MealPeriodConfirming
            }
            Step::MealPeriodConfirming => {
                require(page, step, MEAL_INPUT).await?;
                page.type_text(MEAL_INPUT, period).await?;
                page.press_enter(MEAL_INPUT).await?;
                require(page, step, DONE_BUTTON).await?;
                page.click(DONE_BUTTON).await?;
                Step::Settled
            }
            Step::Settled => {
                page.wait_stable().await?;
                return Ok(Outcome::Settled);
            }
        };
    }
}
