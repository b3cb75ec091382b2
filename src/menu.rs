use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use url::Url;

// menu bodies, rendered as html
pub const FIRST_MENU: &str = "<b>Menu 1</b>\n\nA beautiful menu with a shiny inline button.";
pub const SECOND_MENU: &str =
    "<b>Menu 2</b>\n\nA better menu with even more shiny inline buttons.";

// button texts, also used as callback data for the navigation buttons
pub const NEXT_BUTTON: &str = "Next";
pub const BACK_BUTTON: &str = "Back";
pub const TUTORIAL_BUTTON: &str = "Tutorial";
pub const GOOGLE_BUTTON: &str = "Search something ?";
pub const YOUTUBE_BUTTON: &str = "Watch some video mate :D";
pub const BUY_BUTTON: &str = "Buy";
pub const BUY_BUTTON_DATA: &str = "/buy";

const GOOGLE_URL: &str = "https://www.google.com/";
const YOUTUBE_URL: &str = "https://www.youtube.com/";
const TUTORIAL_URL: &str = "https://core.telegram.org/bots/api";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Menu {
    First,
    Second,
}

impl Menu {
    /// maps a pressed button's data to the menu it leads to
    pub fn from_callback_data(data: &str) -> Option<Menu> {
        match data {
            NEXT_BUTTON => Some(Menu::Second),
            BACK_BUTTON => Some(Menu::First),
            _ => None,
        }
    }

    pub fn body(&self) -> &'static str {
        match self {
            Menu::First => FIRST_MENU,
            Menu::Second => SECOND_MENU,
        }
    }

    pub fn keyboard(&self) -> InlineKeyboardMarkup {
        match self {
            Menu::First => InlineKeyboardMarkup::new(vec![
                vec![InlineKeyboardButton::callback(NEXT_BUTTON, NEXT_BUTTON)],
                vec![link_button(GOOGLE_BUTTON, GOOGLE_URL)],
                vec![link_button(YOUTUBE_BUTTON, YOUTUBE_URL)],
                vec![InlineKeyboardButton::callback(BUY_BUTTON, BUY_BUTTON_DATA)],
            ]),
            Menu::Second => InlineKeyboardMarkup::new(vec![
                vec![InlineKeyboardButton::callback(BACK_BUTTON, BACK_BUTTON)],
                vec![link_button(TUTORIAL_BUTTON, TUTORIAL_URL)],
            ]),
        }
    }
}

/// body and keyboard shown after a button with `data` was pressed
///
/// Unknown data renders an empty body with an empty keyboard.
pub fn render_for_callback(data: &str) -> (&'static str, InlineKeyboardMarkup) {
    match Menu::from_callback_data(data) {
        Some(menu) => (menu.body(), menu.keyboard()),
        None => ("", empty_keyboard()),
    }
}

pub fn empty_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(Vec::<Vec<InlineKeyboardButton>>::new())
}

fn link_button(text: &str, url: &'static str) -> InlineKeyboardButton {
    // menu urls are compile-time constants
    InlineKeyboardButton::url(text, Url::parse(url).expect("static menu url is valid"))
}
