//! Line-based command parsing.
use tower_core::Direction;

/// One line of player input.
#[derive(Clone, Debug, PartialEq)]
pub enum Input {
    Move(Direction),
    Next,
    Prev,
    Choose(usize),
    Close,
    Story(String),
    Restart,
    SetAttributes {
        hp: Option<f64>,
        atk: Option<f64>,
        def: Option<f64>,
    },
    Grant {
        gid: String,
        count: f64,
        name: Option<String>,
    },
    Inventory,
    Journal,
    Help,
    Quit,
}

pub const HELP: &str = "\
w/a/s/d or up/down/left/right  move
n / p                          next / previous dialogue line
1-9                            pick a dialogue choice
c                              close the dialogue
story <id>                     start a story
r                              restart from the spawn point
i / j                          inventory / journal
set hp=<n> atk=<n> def=<n>     debug: overwrite attributes
give <gid> [count] [name]      debug: grant an item
q                              quit";

/// Parses a command line; `None` for anything unrecognised.
pub fn parse(line: &str) -> Option<Input> {
    let mut words = line.split_whitespace();
    let head = words.next()?.to_ascii_lowercase();

    let input = match head.as_str() {
        "w" | "up" => Input::Move(Direction::Up),
        "s" | "down" => Input::Move(Direction::Down),
        "a" | "left" => Input::Move(Direction::Left),
        "d" | "right" => Input::Move(Direction::Right),
        "n" | "next" => Input::Next,
        "p" | "prev" => Input::Prev,
        "c" | "close" => Input::Close,
        "r" | "restart" => Input::Restart,
        "i" | "inventory" => Input::Inventory,
        "j" | "journal" => Input::Journal,
        "?" | "help" => Input::Help,
        "q" | "quit" | "exit" => Input::Quit,
        "story" => Input::Story(words.next()?.to_string()),
        "set" => {
            let mut hp = None;
            let mut atk = None;
            let mut def = None;
            for pair in words {
                let (key, value) = pair.split_once('=')?;
                let value = value.parse::<f64>().ok()?;
                match key.to_ascii_lowercase().as_str() {
                    "hp" => hp = Some(value),
                    "atk" => atk = Some(value),
                    "def" => def = Some(value),
                    _ => return None,
                }
            }
            Input::SetAttributes { hp, atk, def }
        }
        "give" => {
            let gid = words.next()?.to_string();
            let rest: Vec<&str> = words.collect();
            let (count, name_words) = match rest.first().and_then(|w| w.parse::<f64>().ok()) {
                Some(count) => (count, &rest[1..]),
                None => (1.0, &rest[..]),
            };
            let name = (!name_words.is_empty()).then(|| name_words.join(" "));
            Input::Grant { gid, count, name }
        }
        digits => {
            let choice = digits.parse::<usize>().ok().filter(|n| (1..=9).contains(n))?;
            Input::Choose(choice - 1)
        }
    };
    Some(input)
}
