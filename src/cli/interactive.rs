use super::ui;
use crate::core::{CurrencyCode, EngineHandle};
use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands:
  send <amount>       set the amount you send
  receive <amount>    set the amount the receiver gets
  pair <FROM> <TO>    choose both currencies, e.g. `pair EUR GBP`
  reverse             swap the two sides
  dismiss             hide the no-connection message
  show                print the current state
  help                show this help
  quit                leave";

#[derive(Debug, PartialEq)]
pub enum InteractiveCommand {
    Send(String),
    Receive(String),
    Pair(CurrencyCode, CurrencyCode),
    Reverse,
    Dismiss,
    Show,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<InteractiveCommand> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(InteractiveCommand::Show);
    };
    let rest: Vec<&str> = words.collect();

    let parsed = match (command.to_lowercase().as_str(), rest.as_slice()) {
        ("send" | "s", [amount]) => InteractiveCommand::Send(amount.to_string()),
        ("receive" | "r", [amount]) => InteractiveCommand::Receive(amount.to_string()),
        ("pair" | "p", [from, to]) => InteractiveCommand::Pair(
            from.to_uppercase()
                .parse()
                .with_context(|| format!("Cannot send from {from}"))?,
            to.to_uppercase()
                .parse()
                .with_context(|| format!("Cannot send to {to}"))?,
        ),
        ("reverse" | "swap", []) => InteractiveCommand::Reverse,
        ("dismiss", []) => InteractiveCommand::Dismiss,
        ("show", []) => InteractiveCommand::Show,
        ("help" | "?", []) => InteractiveCommand::Help,
        ("quit" | "exit" | "q", []) => InteractiveCommand::Quit,
        ("send" | "s" | "receive" | "r" | "pair" | "p", _) => {
            bail!("Wrong number of arguments for `{command}`, see `help`")
        }
        _ => bail!("Unknown command `{command}`, see `help`"),
    };
    Ok(parsed)
}

/// Forwards a command to the engine. When edits are not debounced the
/// matching conversion is requested right away.
fn dispatch(engine: &EngineHandle, command: InteractiveCommand, convert_on_edit: bool) {
    match command {
        InteractiveCommand::Send(amount) => {
            engine.set_amount_from(&amount);
            if convert_on_edit {
                engine.convert_forward();
            }
        }
        InteractiveCommand::Receive(amount) => {
            engine.set_amount_to(&amount);
            if convert_on_edit {
                engine.convert_reverse();
            }
        }
        InteractiveCommand::Pair(from, to) => {
            engine.set_currency_pair(from, to);
            engine.convert_forward();
        }
        InteractiveCommand::Reverse => engine.reverse(),
        InteractiveCommand::Dismiss => engine.dismiss_no_network_banner(),
        InteractiveCommand::Show => println!("{}", ui::render_state(&engine.state())),
        InteractiveCommand::Help => println!("{HELP}"),
        InteractiveCommand::Quit => {}
    }
}

/// Reads commands from stdin until `quit` or end of input, printing every
/// new snapshot the engine publishes.
pub async fn run(engine: EngineHandle, convert_on_edit: bool) -> Result<()> {
    println!("{}", ui::style_text("xfx interactive", ui::StyleType::Title));
    println!("{HELP}\n");
    println!("{}", ui::render_state(&engine.state()));

    let mut updates = engine.subscribe();
    let renderer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            println!("\n{}", ui::render_state(&state));
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        match parse_command(&line) {
            Ok(InteractiveCommand::Quit) => break,
            Ok(command) => dispatch(&engine, command, convert_on_edit),
            Err(e) => println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error)),
        }
    }

    engine.shutdown();
    renderer.abort();
    Ok(())
}
