use std::{fmt::Display, str::FromStr};

use crate::models::MovieId;

/// Everything an inline button can ask for, encoded as Telegram callback data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Menu,
    Add,
    List,
    Random,
    Clear,
    ClearOne,
    ClearWatched,
    ClearAll,
    ClearAllConfirmed,
    Watched(MovieId),
    Delete(MovieId),
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Menu => write!(f, "menu"),
            Action::Add => write!(f, "add"),
            Action::List => write!(f, "list"),
            Action::Random => write!(f, "random"),
            Action::Clear => write!(f, "clear"),
            Action::ClearOne => write!(f, "clear_one"),
            Action::ClearWatched => write!(f, "clear_watched"),
            Action::ClearAll => write!(f, "clear_all"),
            Action::ClearAllConfirmed => write!(f, "clear_all_yes"),
            Action::Watched(id) => write!(f, "watched:{}", id),
            Action::Delete(id) => write!(f, "delete:{}", id),
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let action = match data {
            "menu" => Action::Menu,
            "add" => Action::Add,
            "list" => Action::List,
            "random" => Action::Random,
            "clear" => Action::Clear,
            "clear_one" => Action::ClearOne,
            "clear_watched" => Action::ClearWatched,
            "clear_all" => Action::ClearAll,
            "clear_all_yes" => Action::ClearAllConfirmed,
            other => {
                let (kind, id) = other
                    .split_once(':')
                    .ok_or_else(|| format!("unknown button: {}", other))?;
                let id: MovieId = id
                    .parse()
                    .map_err(|_| format!("bad movie id in button: {}", other))?;
                match kind {
                    "watched" => Action::Watched(id),
                    "delete" => Action::Delete(id),
                    _ => return Err(format!("unknown button: {}", other)),
                }
            }
        };

        Ok(action)
    }
}
