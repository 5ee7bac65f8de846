//! Multi-turn integration tests for game mechanics.
//!
//! These tests drive whole turns through the public API: forced dice for the
//! deterministic flows, scripted policies for full games.
//!
//! Run with: cargo test --release game_integration

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use tempfile::NamedTempFile;
use watopoly::game::{
    check_invariants, transfer_estate, unmortgage_cost, Decision, DecisionRequest, GameState,
    LiquidationAction, Step, Token, Turn, TurnEvent, JAIL_FEE, JAIL_POSITION, RESIDENCE_PRICE,
    STARTING_MONEY, TUITION_FLAT,
};
use watopoly::save::{load_game, save_game};
use watopoly::sim::{FrugalPolicy, GreedyPolicy, Policy, PolicyKind, SimConfig};

fn two_players() -> GameState {
    GameState::new(11, &[('G', "Goose"), ('B', "Bridge")]).unwrap()
}

fn money(state: &GameState, token: Token) -> i64 {
    state.get_player(token).unwrap().money
}

/// Drive one roll, answering decisions with `policy`.
fn drive_turn(state: &mut GameState, policy: &mut impl Policy) -> bool {
    let token = state.current_token();
    let (mut turn, mut step) = Turn::begin(state, token, None).unwrap();
    loop {
        match step {
            Step::Complete(report) => return report.extra_turn,
            Step::Pending(request) => {
                let decision = policy.decide(state, &request);
                step = match turn.resume(state, &decision) {
                    Ok(next) => next,
                    Err(_) => turn.resume(state, &fallback(&request)).unwrap(),
                };
            }
        }
    }
}

/// The always-legal answer for each request.
fn fallback(request: &DecisionRequest) -> Decision {
    match request {
        DecisionRequest::JailChoice { .. } => Decision::RollForRelease,
        DecisionRequest::Purchase { .. } => Decision::Decline,
        DecisionRequest::Tuition { .. } => Decision::TuitionFlat,
        DecisionRequest::AuctionBid { .. } => Decision::Pass,
        DecisionRequest::Liquidate { .. } => Decision::Liquidate(LiquidationAction::Surrender),
    }
}

/// Play up to `rolls` dice rolls, rotating seats between turns.
fn play_rolls(state: &mut GameState, policy: &mut impl Policy, rolls: u32) {
    for _ in 0..rolls {
        if state.is_game_over() {
            break;
        }
        let extra = drive_turn(state, policy);
        if state.is_game_over() {
            break;
        }
        if !extra {
            state.advance_turn();
        }
    }
}

/// Run a turn with forced dice, answering decisions from a script.
fn forced_turn(state: &mut GameState, dice: (u8, u8), answers: &[Decision]) -> Vec<TurnEvent> {
    let token = state.current_token();
    let (mut turn, mut step) = Turn::begin(state, token, Some(dice)).unwrap();
    let mut remaining = answers.iter();
    loop {
        match step {
            Step::Complete(report) => return report.events,
            Step::Pending(_) => {
                let decision = remaining.next().expect("script ran out of answers");
                step = turn.resume(state, decision).unwrap();
            }
        }
    }
}

#[test]
fn test_buying_a_landed_property() {
    let mut state = two_players();
    let events = forced_turn(&mut state, (1, 2), &[Decision::Buy]);

    assert!(events
        .iter()
        .any(|e| matches!(e, TurnEvent::Purchased { property: "ML", price: 60 })));
    assert_eq!(money(&state, 'G'), STARTING_MONEY - 60);
    assert!(state.get_player('G').unwrap().owns("ML"));
    assert_eq!(state.board.property("ML").unwrap().owner, Some('G'));
}

#[test]
fn test_declined_property_goes_to_auction() {
    let mut state = two_players();
    // G declines; bidding starts with B, who takes it for 10
    let events = forced_turn(
        &mut state,
        (1, 2),
        &[Decision::Decline, Decision::Bid(10), Decision::Pass],
    );

    assert!(events.iter().any(|e| matches!(
        e,
        TurnEvent::AuctionWon {
            property: "ML",
            winner: 'B',
            price: 10
        }
    )));
    assert_eq!(money(&state, 'B'), STARTING_MONEY - 10);
    assert_eq!(state.board.property("ML").unwrap().owner, Some('B'));
}

#[test]
fn test_auction_with_no_bids_ends_free_for_the_survivor() {
    let mut state = two_players();
    // G declines; B passes, leaving G the sole bidder at no cost
    let events = forced_turn(&mut state, (1, 2), &[Decision::Decline, Decision::Pass]);

    assert!(events.iter().any(|e| matches!(
        e,
        TurnEvent::AuctionWon {
            property: "ML",
            winner: 'G',
            price: 0
        }
    )));
    assert_eq!(state.board.property("ML").unwrap().owner, Some('G'));
    assert!(state.get_player('G').unwrap().owns("ML"));
    assert_eq!(money(&state, 'G'), STARTING_MONEY);
    assert_eq!(money(&state, 'B'), STARTING_MONEY);
}

#[test]
fn test_rent_moves_money_to_the_owner() {
    let mut state = two_players();
    state.transfer_property("ML", Some('G')).unwrap();
    state.advance_turn();

    let events = forced_turn(&mut state, (1, 2), &[]);

    assert!(events
        .iter()
        .any(|e| matches!(e, TurnEvent::RentPaid { to: 'G', amount: 4 })));
    assert_eq!(money(&state, 'B'), STARTING_MONEY - 4);
    assert_eq!(money(&state, 'G'), STARTING_MONEY + 4);
}

#[test]
fn test_improved_monopoly_charges_the_higher_rent() {
    let mut state = two_players();
    for name in ["ECH", "PAS", "HH"] {
        state.transfer_property(name, Some('G')).unwrap();
    }
    let cost = watopoly::game::improve(&mut state, 'G', "ECH").unwrap();
    state.advance_turn();

    // B lands on ECH with one improvement
    let events = forced_turn(&mut state, (2, 4), &[]);

    assert!(events
        .iter()
        .any(|e| matches!(e, TurnEvent::RentPaid { to: 'G', amount: 30 })));
    assert_eq!(money(&state, 'B'), STARTING_MONEY - 30);
    assert_eq!(money(&state, 'G'), STARTING_MONEY - cost + 30);
}

#[test]
fn test_tuition_percent_charges_net_worth_share() {
    let mut state = two_players();
    state.get_player_mut('G').unwrap().position = 1;

    let events = forced_turn(&mut state, (1, 2), &[Decision::TuitionPercent]);

    assert!(events
        .iter()
        .any(|e| matches!(e, TurnEvent::TuitionPaid { amount: 150 })));
    assert_eq!(money(&state, 'G'), STARTING_MONEY - 150);
}

#[test]
fn test_tuition_flat_charges_the_fixed_amount() {
    let mut state = two_players();
    state.get_player_mut('G').unwrap().position = 1;

    forced_turn(&mut state, (1, 2), &[Decision::TuitionFlat]);

    assert_eq!(money(&state, 'G'), STARTING_MONEY - TUITION_FLAT);
}

#[test]
fn test_go_to_tims_square_jails_the_player() {
    let mut state = two_players();
    state.get_player_mut('G').unwrap().position = 24;

    let events = forced_turn(&mut state, (2, 4), &[]);

    assert!(events.iter().any(|e| matches!(e, TurnEvent::Jailed)));
    let goose = state.get_player('G').unwrap();
    assert!(goose.in_jail);
    assert_eq!(goose.position, JAIL_POSITION);
}

#[test]
fn test_paying_the_fee_releases_and_moves() {
    let mut state = two_players();
    state.get_player_mut('G').unwrap().go_to_jail();

    let events = forced_turn(&mut state, (2, 3), &[Decision::PayJailFee, Decision::Buy]);

    assert!(events
        .iter()
        .any(|e| matches!(e, TurnEvent::Released(watopoly::game::JailRelease::Fee))));
    let goose = state.get_player('G').unwrap();
    assert!(!goose.in_jail);
    assert_eq!(goose.position, 15);
    assert_eq!(goose.money, STARTING_MONEY - JAIL_FEE - RESIDENCE_PRICE);
    assert!(goose.owns("UWP"));
}

#[test]
fn test_third_consecutive_doubles_jails_without_moving() {
    let mut state = two_players();

    // (5,5) stops on the visiting side of the line
    let first = forced_turn(&mut state, (5, 5), &[]);
    assert!(!first.iter().any(|e| matches!(e, TurnEvent::Jailed)));

    // (1,1) lands on PAC; declined, B passes, G takes it free
    forced_turn(&mut state, (1, 1), &[Decision::Decline, Decision::Pass]);

    // third doubles goes straight to the line
    let third = forced_turn(&mut state, (4, 4), &[]);
    assert!(third.iter().any(|e| matches!(e, TurnEvent::Jailed)));
    assert!(!third.iter().any(|e| matches!(e, TurnEvent::Moved { .. })));
    let goose = state.get_player('G').unwrap();
    assert!(goose.in_jail);
    assert_eq!(goose.position, JAIL_POSITION);
}

#[test]
fn test_doubles_report_an_extra_turn() {
    let mut state = two_players();
    let (_, step) = Turn::begin(&mut state, 'G', Some((5, 5))).unwrap();
    let Step::Complete(report) = step else {
        panic!("no decision expected on the visiting square");
    };
    assert!(report.extra_turn);
}

#[test]
fn test_mortgage_cycle_costs_the_premium() {
    for name in ["AL", "ML", "MKV", "PAC", "DC"] {
        let mut state = two_players();
        state.transfer_property(name, Some('G')).unwrap();
        let value = watopoly::game::mortgage(&mut state, 'G', name).unwrap();
        let cost = watopoly::game::unmortgage(&mut state, 'G', name).unwrap();

        assert_eq!(cost, unmortgage_cost(state.board.property(name).unwrap()));
        assert_eq!(money(&state, 'G'), STARTING_MONEY + value - cost);
        assert!(!state.board.property(name).unwrap().mortgaged);
    }
}

#[test]
fn test_trade_swaps_cash_for_a_title() {
    let mut state = two_players();
    state.transfer_property("ML", Some('G')).unwrap();

    let offer = watopoly::game::propose_trade(
        &mut state,
        'G',
        'B',
        watopoly::game::TradeSide::Property("ML".to_string()),
        watopoly::game::TradeSide::Cash(100),
    )
    .unwrap();
    watopoly::game::respond_trade(&mut state, &offer, true).unwrap();

    assert_eq!(money(&state, 'G'), STARTING_MONEY + 100);
    assert_eq!(money(&state, 'B'), STARTING_MONEY - 100);
    assert_eq!(state.board.property("ML").unwrap().owner, Some('B'));
    assert!(state.get_player('B').unwrap().owns("ML"));
    assert!(!state.get_player('G').unwrap().owns("ML"));
}

#[test]
fn test_rejected_trade_changes_nothing() {
    let mut state = two_players();
    state.transfer_property("ML", Some('G')).unwrap();

    let offer = watopoly::game::propose_trade(
        &mut state,
        'G',
        'B',
        watopoly::game::TradeSide::Property("ML".to_string()),
        watopoly::game::TradeSide::Cash(100),
    )
    .unwrap();
    watopoly::game::respond_trade(&mut state, &offer, false).unwrap();

    assert_eq!(money(&state, 'G'), STARTING_MONEY);
    assert_eq!(money(&state, 'B'), STARTING_MONEY);
    assert_eq!(state.board.property("ML").unwrap().owner, Some('G'));
}

#[test]
fn test_voluntary_bankruptcy_ends_a_two_player_game() {
    let mut state = two_players();
    state.transfer_property("ML", Some('G')).unwrap();
    transfer_estate(&mut state, 'G', None).unwrap();

    assert!(state.get_player('G').unwrap().bankrupt);
    assert_eq!(state.board.property("ML").unwrap().owner, None);
    assert!(state.is_game_over());
    assert_eq!(state.winner(), Some('B'));
}

#[test]
fn test_scripted_games_across_seeds() {
    for seed in 0..50 {
        let config = SimConfig::new(vec![PolicyKind::Greedy, PolicyKind::Frugal]);
        let outcome = watopoly::sim::run_game(&config, seed);
        assert!(
            outcome.is_ok(),
            "seed {} caused error: {:?}",
            seed,
            outcome.err()
        );
    }
}

#[test]
fn test_four_player_scripted_game() {
    let config = SimConfig::new(vec![
        PolicyKind::Greedy,
        PolicyKind::Frugal,
        PolicyKind::Greedy,
        PolicyKind::Frugal,
    ]);
    let outcome = watopoly::sim::run_game(&config, 9999).unwrap();
    assert!(outcome.turns <= config.max_turns);
    assert_eq!(outcome.final_worth.len(), 4);
}

#[test]
fn test_eight_player_scripted_game() {
    let config = SimConfig::new(vec![PolicyKind::Greedy; 8]);
    let outcome = watopoly::sim::run_game(&config, 4242).unwrap();
    assert_eq!(outcome.final_worth.len(), 8);
}

#[test]
fn test_invariants_hold_through_a_long_game() {
    let mut state = GameState::new(77, &[('G', "Goose"), ('B', "Bridge"), ('D', "Dome")]).unwrap();
    let mut policy = GreedyPolicy;

    for _ in 0..300 {
        if state.is_game_over() {
            break;
        }
        let extra = drive_turn(&mut state, &mut policy);
        let violations = check_invariants(&state);
        assert!(
            violations.is_empty(),
            "violations after a turn: {violations:?}"
        );
        if state.is_game_over() {
            break;
        }
        if !extra {
            state.advance_turn();
        }
    }
}

#[test]
fn test_save_and_reload_mid_game() {
    let mut state = GameState::new(123, &[('G', "Goose"), ('B', "Bridge")]).unwrap();
    let mut greedy = GreedyPolicy;
    let mut frugal = FrugalPolicy;
    play_rolls(&mut state, &mut greedy, 20);
    play_rolls(&mut state, &mut frugal, 20);

    let file = NamedTempFile::new().unwrap();
    save_game(&state, file.path()).unwrap();
    let loaded = load_game(file.path(), 999).unwrap();

    assert!(check_invariants(&loaded).is_empty());
    for player in state.players.iter().filter(|p| !p.bankrupt) {
        let restored = loaded.get_player(player.token).unwrap();
        assert_eq!(restored.name, player.name);
        assert_eq!(restored.money, player.money);
        assert_eq!(restored.position, player.position);
        assert_eq!(restored.in_jail, player.in_jail);
        assert_eq!(restored.cups, player.cups);

        let mut held = player.properties.clone();
        let mut reloaded = restored.properties.clone();
        held.sort_unstable();
        reloaded.sort_unstable();
        assert_eq!(held, reloaded);
    }
    for (position, square) in state.board.iter() {
        let restored = loaded.board.square(position).unwrap();
        assert_eq!(restored.owner, square.owner);
        assert_eq!(restored.mortgaged, square.mortgaged);
        assert_eq!(restored.improvements, square.improvements);
    }
}
