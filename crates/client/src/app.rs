//! Read-eval-print loop over a [`RuntimeHandle`].
use std::io::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use tower_core::{Direction, HpLoss, forecast};
use tower_runtime::{
    BattleProvider, BattleRequest, FormulaBattleProvider, InputOutcome, RuntimeHandle,
};

use crate::input::{self, HELP, Input};
use crate::presentation::{
    TerminalUi, render_dialogue, render_inventory, render_journal, render_map, render_status,
};

type StdinLines = Lines<BufReader<Stdin>>;

pub struct CliApp {
    handle: RuntimeHandle,
    ui: Arc<TerminalUi>,
    battles: Option<mpsc::Receiver<BattleRequest>>,
    lines: StdinLines,
}

impl CliApp {
    pub fn new(
        handle: RuntimeHandle,
        ui: Arc<TerminalUi>,
        battles: Option<mpsc::Receiver<BattleRequest>>,
    ) -> Self {
        Self {
            handle,
            ui,
            battles,
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Runs until `q` or end of input.
    pub async fn run(mut self) -> Result<()> {
        self.render().await?;
        println!("Type ? for help.");

        loop {
            prompt("> ")?;
            let Some(line) = self.lines.next_line().await.context("failed to read stdin")? else {
                break;
            };
            let Some(command) = input::parse(&line) else {
                if !line.trim().is_empty() {
                    println!("Unknown command. Type ? for help.");
                }
                continue;
            };

            match command {
                Input::Quit => break,
                Input::Help => println!("{HELP}"),
                Input::Inventory => {
                    let snapshot = self.handle.snapshot().await?;
                    println!("{}", render_inventory(&snapshot));
                }
                Input::Journal => {
                    let snapshot = self.handle.snapshot().await?;
                    println!("{}", render_journal(&snapshot.journal));
                }
                other => {
                    self.dispatch(other).await?;
                    self.render().await?;
                }
            }
        }

        debug!("input loop finished");
        Ok(())
    }

    async fn dispatch(&mut self, command: Input) -> Result<()> {
        match command {
            Input::Move(direction) => {
                let outcome = self.move_player(direction).await?;
                if outcome == InputOutcome::Ignored {
                    println!("Close the dialogue first.");
                }
            }
            Input::Next => self.handle.story_next().await?,
            Input::Prev => self.handle.story_prev().await?,
            Input::Choose(index) => self.handle.story_choose(index).await?,
            Input::Close => self.handle.story_close().await?,
            Input::Story(id) => {
                if !self.handle.start_story(id.as_str()).await? {
                    println!("No story named {id}.");
                }
            }
            Input::Restart => self.handle.restart().await?,
            Input::SetAttributes { hp, atk, def } => {
                self.handle.debug_set_attributes(hp, atk, def).await?
            }
            Input::Grant { gid, count, name } => {
                if !self.handle.debug_grant_item(gid, count, name).await? {
                    println!("Nothing granted.");
                }
            }
            Input::Inventory | Input::Journal | Input::Help | Input::Quit => {}
        }
        Ok(())
    }

    /// Sends the move and answers any battle it triggers while waiting.
    async fn move_player(&mut self, direction: Direction) -> Result<InputOutcome> {
        let Self {
            handle,
            battles,
            lines,
            ..
        } = self;
        let Some(requests) = battles.as_mut() else {
            return Ok(handle.move_player(direction).await?);
        };

        let pending = handle.move_player(direction);
        tokio::pin!(pending);
        loop {
            tokio::select! {
                outcome = &mut pending => return Ok(outcome?),
                Some(request) = requests.recv() => answer_battle(request, lines).await?,
            }
        }
    }

    async fn render(&self) -> Result<()> {
        if let Some(name) = self.ui.take_level_name() {
            println!("== {name} ==");
        }
        for message in self.ui.take_messages() {
            println!("* {message}");
        }

        let snapshot = self.handle.snapshot().await?;
        print!("{}", render_map(&snapshot.level, &snapshot.player));
        println!("{}", render_status(&snapshot));
        if let Some(dialogue) = &snapshot.dialogue {
            print!("{}", render_dialogue(dialogue));
        }
        Ok(())
    }
}

async fn answer_battle(request: BattleRequest, lines: &mut StdinLines) -> Result<()> {
    let context = &request.context;
    let monster = context.monster.as_monster_stats();
    let stats = &context.player.stats;
    let preview = forecast(stats.hp, stats.atk, stats.def, &monster);
    let loss = match preview.hp_loss {
        HpLoss::Finite(loss) => loss.to_string(),
        HpLoss::Unbounded => "all".to_string(),
    };
    println!(
        "{} blocks the way (HP {} ATK {} DEF {}). Expected HP loss: {loss}.",
        monster.name, monster.hp, monster.atk, monster.def
    );
    if let Some(descriptor) = &request.descriptor {
        println!("Mini-game: {} ({})", descriptor.name, descriptor.url);
    }
    prompt("[f]ight / [r]un: ")?;

    let answer = lines.next_line().await.context("failed to read stdin")?;
    if request.is_closed() {
        println!("Too late, the battle was called off.");
        return Ok(());
    }

    let fight = answer.is_some_and(|line| line.trim().eq_ignore_ascii_case("f"));
    let result = if fight {
        match FormulaBattleProvider.run_battle(request.context.clone()).await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "formula battle failed");
                None
            }
        }
    } else {
        None
    };
    if !request.respond(result) {
        debug!("battle response dropped");
    }
    Ok(())
}

fn prompt(text: &str) -> Result<()> {
    print!("{text}");
    std::io::stdout().flush().context("failed to flush stdout")
}
