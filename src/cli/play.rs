//! Play command implementation.
//!
//! Interactive game session on stdin/stdout. Commands are accepted in any
//! order during a turn; `roll` moves the player once (again on doubles) and
//! `next` hands the dice over.

// Seed derivation truncates wall-clock nanos on purpose
#![allow(clippy::cast_possible_truncation)]

use super::CliError;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use watopoly::game::{
    degrade, improve, mortgage, propose_trade, respond_trade, token_name, transfer_estate,
    unmortgage, Decision, DecisionRequest, GameState, JailRelease, LiquidationAction, Money, Step,
    Token, TradeSide, Turn, TurnEvent, TurnReport, COOP_FEE, JAIL_FEE, MAX_PLAYERS, MIN_PLAYERS,
    PASS_BONUS, TOKENS,
};
use watopoly::render::{render_all, render_assets, render_board};
use watopoly::save::{load_game, save_game};

/// Execute the play command.
///
/// # Errors
///
/// Returns an error if a save file fails to load or stdin closes while a
/// decision is still owed.
pub(crate) fn execute(
    load: Option<PathBuf>,
    testing: bool,
    seed: Option<u64>,
) -> Result<(), CliError> {
    // Generate seed if not provided
    let seed = seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    });

    let mut input = io::stdin().lock();

    let mut state = match load {
        Some(path) => load_game(&path, seed)?,
        None => setup_game(seed, &mut input)?,
    };

    if testing {
        println!("Testing mode: roll accepts two dice values, e.g. roll 3 4");
    }

    run_loop(&mut state, testing, &mut input)
}

/// Prompt for the roster and start a fresh game.
fn setup_game(seed: u64, input: &mut impl BufRead) -> Result<GameState, CliError> {
    let count = loop {
        print!("Number of players ({MIN_PLAYERS}-{MAX_PLAYERS}): ");
        io::stdout().flush()?;
        let Some(line) = read_line(input)? else {
            return Err(CliError::new("input ended during setup"));
        };
        match line.parse::<usize>() {
            Ok(n) if (MIN_PLAYERS..=MAX_PLAYERS).contains(&n) => break n,
            _ => println!("Enter a number from {MIN_PLAYERS} to {MAX_PLAYERS}."),
        }
    };

    println!("Available tokens:");
    for token in TOKENS {
        if let Some(name) = token_name(token) {
            println!("  {token}  {name}");
        }
    }

    let mut roster: Vec<(Token, String)> = Vec::with_capacity(count);
    for number in 1..=count {
        let name = loop {
            print!("Player {number} name: ");
            io::stdout().flush()?;
            let Some(line) = read_line(input)? else {
                return Err(CliError::new("input ended during setup"));
            };
            let Some(first) = line.split_whitespace().next() else {
                continue;
            };
            if first == "BANK" {
                println!("That name is reserved.");
            } else if roster.iter().any(|(_, taken)| taken == first) {
                println!("That name is taken.");
            } else {
                break first.to_string();
            }
        };
        let token = loop {
            print!("Player {number} token: ");
            io::stdout().flush()?;
            let Some(line) = read_line(input)? else {
                return Err(CliError::new("input ended during setup"));
            };
            let mut chars = line.chars();
            match (chars.next(), chars.next()) {
                (Some(token), None) if token_name(token).is_some() => {
                    if roster.iter().any(|(taken, _)| *taken == token) {
                        println!("That token is taken.");
                    } else {
                        break token;
                    }
                }
                _ => println!("Pick a single character from the token list."),
            }
        };
        roster.push((token, name));
    }

    let seats: Vec<(Token, &str)> = roster.iter().map(|(t, n)| (*t, n.as_str())).collect();
    Ok(GameState::new(seed, &seats)?)
}

/// Drive the command loop until someone wins or stdin closes.
fn run_loop(
    state: &mut GameState,
    testing: bool,
    input: &mut impl BufRead,
) -> Result<(), CliError> {
    println!("{}", render_board(state));
    let mut rolled = false;
    let mut extra_roll = false;

    loop {
        if let Some(token) = state.winner() {
            println!("Game over: {} ({token}) wins!", player_name(state, token));
            return Ok(());
        }

        let current = state.current_player();
        print!("[{} ({}) ${}] > ", current.name, current.token, current.money);
        io::stdout().flush()?;
        let Some(line) = read_line(input)? else {
            println!();
            return Ok(());
        };
        let fields: Vec<&str> = line.split_whitespace().collect();
        let Some(&command) = fields.first() else {
            continue;
        };

        let token = state.current_token();
        match command {
            "roll" if rolled && !extra_roll => {
                println!("Already rolled; type next to end the turn.");
            }
            "roll" => {
                let forced = if testing { parse_dice(&fields[1..]) } else { None };
                let extra = take_turn(state, token, forced, input)?;
                rolled = true;
                extra_roll = extra;
                println!("{}", render_board(state));
                if state.current_player().bankrupt {
                    state.advance_turn();
                    rolled = false;
                    extra_roll = false;
                } else if extra_roll {
                    println!("Doubles! Roll again.");
                }
            }
            "next" if !rolled => println!("Roll before ending the turn."),
            "next" if extra_roll => println!("Doubles! Roll again before ending the turn."),
            "next" => {
                state.advance_turn();
                rolled = false;
                println!("{}", render_board(state));
            }
            "trade" => handle_trade(state, token, &fields[1..], input)?,
            "improve" => handle_improve(state, token, &fields[1..]),
            "mortgage" => match fields.get(1) {
                Some(&property) => match mortgage(state, token, property) {
                    Ok(value) => println!("Mortgaged {property} for ${value}."),
                    Err(e) => println!("{e}"),
                },
                None => println!("Usage: mortgage <property>"),
            },
            "unmortgage" => match fields.get(1) {
                Some(&property) => match unmortgage(state, token, property) {
                    Ok(cost) => println!("Lifted the mortgage on {property} for ${cost}."),
                    Err(e) => println!("{e}"),
                },
                None => println!("Usage: unmortgage <property>"),
            },
            "assets" => println!("{}", render_assets(state.current_player(), &state.board)),
            "all" => println!("{}", render_all(state)),
            "bankrupt" => {
                let name = player_name(state, token);
                match transfer_estate(state, token, None) {
                    Ok(()) => {
                        println!("{name} declares bankruptcy. Assets return to the bank.");
                        state.advance_turn();
                        rolled = false;
                        extra_roll = false;
                    }
                    Err(e) => println!("{e}"),
                }
            }
            "save" => match fields.get(1) {
                Some(&file) => match save_game(state, Path::new(file)) {
                    Ok(()) => println!("Saved to {file}."),
                    Err(e) => println!("{e}"),
                },
                None => println!("Usage: save <file>"),
            },
            _ => println!("Unknown command. Try again."),
        }
    }
}

/// Run one movement for `token`, prompting for decisions as they come up.
///
/// Returns whether doubles earned another roll.
fn take_turn(
    state: &mut GameState,
    token: Token,
    forced: Option<(u8, u8)>,
    input: &mut impl BufRead,
) -> Result<bool, CliError> {
    let (mut turn, mut step) = Turn::begin(state, token, forced)?;
    loop {
        match step {
            Step::Complete(report) => {
                print_report(state, &report);
                return Ok(report.extra_turn);
            }
            Step::Pending(request) => {
                let decision = prompt_decision(state, request, input)?;
                match turn.resume(state, &decision) {
                    Ok(next) => step = next,
                    Err(e) => {
                        println!("{e}");
                        step = Step::Pending(request);
                    }
                }
            }
        }
    }
}

fn print_report(state: &GameState, report: &TurnReport) {
    let (first, second) = report.dice;
    println!("Rolled {first} and {second}.");
    for event in &report.events {
        print_event(state, *event);
    }
}

fn print_event(state: &GameState, event: TurnEvent) {
    match event {
        TurnEvent::Moved { to, .. } => println!("Landed on {}.", square_name(state, to)),
        TurnEvent::OsapCollected => println!("Collected ${PASS_BONUS} from OSAP."),
        TurnEvent::Purchased { property, price } => println!("Bought {property} for ${price}."),
        TurnEvent::RentPaid { to, amount } => {
            println!("Paid ${amount} rent to {}.", player_name(state, to));
        }
        TurnEvent::AuctionWon {
            property,
            winner,
            price,
        } => {
            println!(
                "{} won the auction for {property} at ${price}.",
                player_name(state, winner)
            );
        }
        TurnEvent::AuctionUnsold { property } => {
            println!("No bids; {property} stays with the bank.");
        }
        TurnEvent::TuitionPaid { amount } => println!("Paid ${amount} tuition."),
        TurnEvent::CoopFeePaid => println!("Paid the ${COOP_FEE} Coop fee."),
        TurnEvent::MoneyDrawn { delta } => {
            if delta < 0 {
                println!("Needles Hall charges ${}.", -delta);
            } else {
                println!("Needles Hall pays ${delta}.");
            }
        }
        TurnEvent::CupWon => println!("Won a Roll Up the Rim cup!"),
        TurnEvent::Relocated { to } => println!("Whisked away to {}.", square_name(state, to)),
        TurnEvent::Jailed => println!("Sent to the DC Tims Line."),
        TurnEvent::StayedInJail { attempt } => {
            println!("No doubles; stuck in line (attempt {attempt}).");
        }
        TurnEvent::Released(release) => match release {
            JailRelease::Cup => println!("Spent a Roll Up the Rim cup to get out."),
            JailRelease::Fee => println!("Paid the ${JAIL_FEE} fee to get out."),
            JailRelease::Doubles => println!("Rolled doubles and walked free."),
            JailRelease::ForcedFee => println!("Out of attempts; paid the ${JAIL_FEE} fee."),
        },
        TurnEvent::Bankrupted { creditor } => match creditor {
            Some(to) => println!("Bankrupt! The estate goes to {}.", player_name(state, to)),
            None => println!("Bankrupt! Assets return to the bank."),
        },
    }
}

/// Ask the prompted player for a decision, retrying until the answer parses.
fn prompt_decision(
    state: &GameState,
    request: DecisionRequest,
    input: &mut impl BufRead,
) -> Result<Decision, CliError> {
    loop {
        match request {
            DecisionRequest::JailChoice {
                token,
                cup_available,
                fee_affordable,
            } => {
                let mut options = vec!["roll"];
                if fee_affordable {
                    options.push("pay");
                }
                if cup_available {
                    options.push("cup");
                }
                print!(
                    "[{}] Escape the line ({})? ",
                    player_name(state, token),
                    options.join("/")
                );
                io::stdout().flush()?;
                match read_field(input)?.as_str() {
                    "roll" => return Ok(Decision::RollForRelease),
                    "pay" => return Ok(Decision::PayJailFee),
                    "cup" => return Ok(Decision::UseCup),
                    _ => println!("Answer {}.", options.join(", ")),
                }
            }
            DecisionRequest::Purchase {
                token,
                property,
                price,
            } => {
                print!(
                    "[{}] Buy {property} for ${price}? (y/n) ",
                    player_name(state, token)
                );
                io::stdout().flush()?;
                match read_field(input)?.as_str() {
                    "y" | "yes" => return Ok(Decision::Buy),
                    "n" | "no" => return Ok(Decision::Decline),
                    _ => println!("Answer y or n."),
                }
            }
            DecisionRequest::Tuition {
                token,
                flat,
                percent_due,
            } => {
                print!(
                    "[{}] Tuition: flat ${flat} or 10% of net worth (${percent_due})? (flat/percent) ",
                    player_name(state, token)
                );
                io::stdout().flush()?;
                match read_field(input)?.as_str() {
                    "flat" => return Ok(Decision::TuitionFlat),
                    "percent" => return Ok(Decision::TuitionPercent),
                    _ => println!("Answer flat or percent."),
                }
            }
            DecisionRequest::AuctionBid {
                bidder,
                property,
                high_bid,
            } => {
                print!(
                    "[{}] Auction on {property}, high bid ${high_bid}. Bid amount or pass: ",
                    player_name(state, bidder)
                );
                io::stdout().flush()?;
                let answer = read_field(input)?;
                if answer == "pass" {
                    return Ok(Decision::Pass);
                }
                match answer.parse::<Money>() {
                    Ok(amount) => return Ok(Decision::Bid(amount)),
                    Err(_) => println!("Enter a dollar amount or pass."),
                }
            }
            DecisionRequest::Liquidate {
                debtor,
                owed,
                shortfall,
                creditor,
            } => {
                println!(
                    "[{}] ${owed} due to {}; short ${shortfall}.",
                    player_name(state, debtor),
                    creditor_label(state, creditor)
                );
                print!("sell <building> / mortgage <property> / surrender: ");
                io::stdout().flush()?;
                let Some(line) = read_line(input)? else {
                    return Err(CliError::new("input ended during a decision"));
                };
                let fields: Vec<&str> = line.split_whitespace().collect();
                match fields.as_slice() {
                    ["sell", property] => {
                        return Ok(Decision::Liquidate(LiquidationAction::SellImprovement(
                            (*property).to_string(),
                        )));
                    }
                    ["mortgage", property] => {
                        return Ok(Decision::Liquidate(LiquidationAction::Mortgage(
                            (*property).to_string(),
                        )));
                    }
                    ["surrender"] => {
                        return Ok(Decision::Liquidate(LiquidationAction::Surrender));
                    }
                    _ => println!("Answer sell <building>, mortgage <property>, or surrender."),
                }
            }
        }
    }
}

/// Negotiate `trade <player> <give> <receive>`; the counterparty answers on
/// the same stream.
fn handle_trade(
    state: &mut GameState,
    from: Token,
    args: &[&str],
    input: &mut impl BufRead,
) -> Result<(), CliError> {
    let &[counterparty, give, receive] = args else {
        println!("Usage: trade <player> <give> <receive>");
        return Ok(());
    };
    let Some(to) = resolve_player(state, counterparty) else {
        println!("No player called {counterparty}.");
        return Ok(());
    };
    let offer = match propose_trade(state, from, to, trade_side(give), trade_side(receive)) {
        Ok(offer) => offer,
        Err(e) => {
            println!("{e}");
            return Ok(());
        }
    };
    let accepted = loop {
        print!("[{}] Accept the trade? (y/n) ", player_name(state, to));
        io::stdout().flush()?;
        match read_field(input)?.as_str() {
            "y" | "yes" => break true,
            "n" | "no" => break false,
            _ => println!("Answer y or n."),
        }
    };
    match respond_trade(state, &offer, accepted) {
        Ok(()) if accepted => println!("Trade completed."),
        Ok(()) => println!("Trade rejected."),
        Err(e) => println!("{e}"),
    }
    Ok(())
}

/// Apply `improve <building> buy|sell` for the current player.
fn handle_improve(state: &mut GameState, token: Token, args: &[&str]) {
    let &[property, action] = args else {
        println!("Usage: improve <building> buy|sell");
        return;
    };
    let outcome = match action {
        "buy" => {
            improve(state, token, property).map(|cost| format!("Improved {property} for ${cost}."))
        }
        "sell" => degrade(state, token, property)
            .map(|refund| format!("Sold an improvement on {property} for ${refund}.")),
        _ => {
            println!("Usage: improve <building> buy|sell");
            return;
        }
    };
    match outcome {
        Ok(message) => println!("{message}"),
        Err(e) => println!("{e}"),
    }
}

/// A bare number trades as cash; anything else names a property.
fn trade_side(field: &str) -> TradeSide {
    field
        .parse::<Money>()
        .map_or_else(|_| TradeSide::Property(field.to_string()), TradeSide::Cash)
}

/// Find a solvent player by exact name, falling back to a bare token letter.
fn resolve_player(state: &GameState, field: &str) -> Option<Token> {
    if let Some(player) = state
        .players
        .iter()
        .find(|player| !player.bankrupt && player.name == field)
    {
        return Some(player.token);
    }
    let mut chars = field.chars();
    if let (Some(token), None) = (chars.next(), chars.next()) {
        return state
            .get_player(token)
            .filter(|player| !player.bankrupt)
            .map(|player| player.token);
    }
    None
}

fn parse_dice(args: &[&str]) -> Option<(u8, u8)> {
    let first = args.first()?.parse().ok()?;
    let second = args.get(1)?.parse().ok()?;
    Some((first, second))
}

fn player_name(state: &GameState, token: Token) -> String {
    state
        .get_player(token)
        .map_or_else(|| token.to_string(), |player| player.name.clone())
}

fn square_name(state: &GameState, position: u8) -> &'static str {
    state
        .board
        .square(position)
        .map_or("?", |square| square.name)
}

fn creditor_label(state: &GameState, creditor: Option<Token>) -> String {
    creditor.map_or_else(|| "the bank".to_string(), |token| player_name(state, token))
}

/// Read one line, trimmed. `None` means stdin closed.
fn read_line(input: &mut impl BufRead) -> Result<Option<String>, CliError> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Read one line and keep its first word; errors when stdin closes.
fn read_field(input: &mut impl BufRead) -> Result<String, CliError> {
    let Some(line) = read_line(input)? else {
        return Err(CliError::new("input ended during a decision"));
    };
    Ok(line.split_whitespace().next().unwrap_or("").to_string())
}
