//! Text rendering for the terminal client.
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tower_core::{Cell, Direction, ItemKind, Level, MarkerLayer, PlayerState, Position};
use tower_runtime::{DialogueState, GameSnapshot, JournalEntry, UiHooks};

/// Bounded buffer of messages waiting to be printed.
#[derive(Clone, Debug)]
pub struct MessageLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl MessageLog {
    pub fn new(capacity: usize) -> Self {
        let bounded_capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(bounded_capacity),
            capacity: bounded_capacity,
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(message.into());
    }

    pub fn drain(&mut self) -> Vec<String> {
        self.entries.drain(..).collect()
    }
}

/// [`UiHooks`] implementation that buffers output until the app prints it.
///
/// The runtime calls the hooks from its worker task; the app drains them
/// after each command returns.
#[derive(Debug)]
pub struct TerminalUi {
    inner: Mutex<Pending>,
}

#[derive(Debug)]
struct Pending {
    log: MessageLog,
    level_name: Option<String>,
}

impl TerminalUi {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Pending {
                log: MessageLog::new(capacity),
                level_name: None,
            }),
        }
    }

    pub fn take_messages(&self) -> Vec<String> {
        self.lock().log.drain()
    }

    /// Level name announced since the last call, if any.
    pub fn take_level_name(&self) -> Option<String> {
        self.lock().level_name.take()
    }

    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UiHooks for TerminalUi {
    fn post_message(&self, message: &str) {
        self.lock().log.push(message);
    }

    // The status line is rebuilt from the snapshot after every command.
    fn update_stats(&self, _player: &PlayerState) {}

    fn update_level_name(&self, name: &str) {
        self.lock().level_name = Some(name.to_string());
    }
}

const PLAYER_UP: char = '^';
const PLAYER_DOWN: char = 'v';
const PLAYER_LEFT: char = '<';
const PLAYER_RIGHT: char = '>';

fn player_glyph(facing: Direction) -> char {
    match facing {
        Direction::Up => PLAYER_UP,
        Direction::Down => PLAYER_DOWN,
        Direction::Left => PLAYER_LEFT,
        Direction::Right => PLAYER_RIGHT,
    }
}

fn cell_glyph(level: &Level, position: Position, cell: &Cell) -> char {
    match cell {
        Cell::Wall => '#',
        Cell::Door(_) => '+',
        Cell::Item(item) => match item.kind {
            ItemKind::Key => 'k',
            ItemKind::Hp => 'h',
            ItemKind::Atk => 'a',
            ItemKind::Def => 'd',
        },
        Cell::Monster(_) => 'M',
        Cell::Stairs(_) => '%',
        Cell::Floor => {
            if level.story_trigger(position.key()).is_some() {
                '!'
            } else if level.has_marker(MarkerLayer::Entities, position) {
                'o'
            } else {
                '.'
            }
        }
    }
}

/// Draws the level as one character per cell, row by row.
pub fn render_map(level: &Level, player: &PlayerState) -> String {
    let mut out = String::with_capacity(((level.width() + 1) * level.height()) as usize);
    for y in 0..level.height() as i32 {
        for x in 0..level.width() as i32 {
            let position = Position::new(x, y);
            let glyph = if position == player.position {
                player_glyph(player.walk.facing)
            } else {
                level
                    .cell(position)
                    .map_or(' ', |cell| cell_glyph(level, position, cell))
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}

pub fn render_status(snapshot: &GameSnapshot) -> String {
    let player = &snapshot.player;
    let mut line = match snapshot.floor {
        Some(floor) => format!("[{} | floor {floor}]", snapshot.level.name()),
        None => format!("[{}]", snapshot.level.name()),
    };
    let _ = write!(
        line,
        " {}  HP {}  ATK {}  DEF {}  Keys {}",
        player.name, player.hp, player.atk, player.def, player.keys
    );
    line
}

pub fn render_dialogue(dialogue: &DialogueState) -> String {
    let mut out = String::new();
    if dialogue.speaker.is_empty() {
        let _ = writeln!(out, "{}", dialogue.text);
    } else {
        let _ = writeln!(out, "{}: {}", dialogue.speaker, dialogue.text);
    }
    for (index, option) in dialogue.options.iter().enumerate() {
        let _ = writeln!(out, "  {}) {option}", index + 1);
    }

    let mut controls = Vec::new();
    if dialogue.can_prev {
        controls.push("[p]rev");
    }
    if dialogue.can_next {
        controls.push("[n]ext");
    }
    if dialogue.show_close {
        controls.push("[c]lose");
    }
    if !controls.is_empty() {
        let _ = writeln!(out, "  {}", controls.join("  "));
    }
    out
}

pub fn render_inventory(snapshot: &GameSnapshot) -> String {
    if snapshot.inventory.is_empty() {
        return "Inventory is empty.".to_string();
    }
    snapshot
        .inventory
        .iter()
        .map(|entry| format!("{} x{} ({})", entry.name, entry.count, entry.gid))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_journal(entries: &[JournalEntry]) -> String {
    if entries.is_empty() {
        return "No articles unlocked yet.".to_string();
    }
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| format!("{}. {}", index + 1, entry.title))
        .collect::<Vec<_>>()
        .join("\n")
}
