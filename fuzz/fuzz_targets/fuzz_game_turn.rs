#![no_main]

//! Full turn sequence fuzzer.
//!
//! Feeds arbitrary decision streams into the turn engine, legal or not.
//! Rejected answers must leave the game untouched and answerable, and the
//! books must balance after every turn.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use watopoly::game::{
    check_invariants, Decision, DecisionRequest, GameState, LiquidationAction, Step, Token, Turn,
    TOKENS,
};

const NAMES: [&str; 8] = [
    "Goose", "Bridge", "Dome", "Plaza", "Spire", "Vault", "Lane", "Tower",
];

/// A fuzzer-generated answer, mapped onto a decision without looking at
/// whether the engine asked for one of this shape.
#[derive(Arbitrary, Debug, Clone, Copy)]
enum FuzzDecision {
    UseCup,
    PayFee,
    Roll,
    Buy,
    Decline,
    Flat,
    Percent,
    Bid(u16),
    Pass,
    Sell(u8),
    Mortgage(u8),
    Surrender,
}

/// Structured input for turn fuzzing.
#[derive(Arbitrary, Debug)]
struct TurnInput {
    /// RNG seed for the game.
    seed: u64,
    /// Number of seats (mapped into 2-8).
    players: u8,
    /// Decision stream, consumed one answer per request.
    decisions: Vec<FuzzDecision>,
    /// Number of dice rolls to drive (capped).
    rolls: u8,
}

fuzz_target!(|input: TurnInput| {
    let count = 2 + usize::from(input.players % 7);
    let roster: Vec<(Token, &str)> = TOKENS
        .iter()
        .zip(NAMES.iter())
        .take(count)
        .map(|(&token, &name)| (token, name))
        .collect();
    let Ok(mut state) = GameState::new(input.seed, &roster) else {
        return;
    };

    let mut feed = input.decisions.into_iter().take(256);
    let rolls = u32::from(input.rolls % 60) + 1;

    for _ in 0..rolls {
        if state.is_game_over() {
            break;
        }
        let token = state.current_token();
        let Ok((mut turn, mut step)) = Turn::begin(&mut state, token, None) else {
            break;
        };
        let extra = loop {
            match step {
                Step::Complete(report) => break report.extra_turn,
                Step::Pending(request) => {
                    let mut answered = false;
                    for _ in 0..3 {
                        let Some(raw) = feed.next() else { break };
                        let decision = realize(&state, &request, raw);
                        if let Ok(next) = turn.resume(&mut state, &decision) {
                            step = next;
                            answered = true;
                            break;
                        }
                    }
                    if !answered {
                        // the conservative answer is legal in every phase
                        step = turn
                            .resume(&mut state, &fallback(&request))
                            .expect("fallback decision must be accepted");
                    }
                }
            }
        };

        let violations = check_invariants(&state);
        assert!(
            violations.is_empty(),
            "Invariants violated after a turn: {violations:?}"
        );

        if state.is_game_over() {
            break;
        }
        if !extra {
            state.advance_turn();
        }
    }

    let violations = check_invariants(&state);
    assert!(
        violations.is_empty(),
        "Invariants violated at end: {violations:?}"
    );
});

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

/// Turn a raw fuzz answer into a concrete decision.
fn realize(state: &GameState, request: &DecisionRequest, raw: FuzzDecision) -> Decision {
    match raw {
        FuzzDecision::UseCup => Decision::UseCup,
        FuzzDecision::PayFee => Decision::PayJailFee,
        FuzzDecision::Roll => Decision::RollForRelease,
        FuzzDecision::Buy => Decision::Buy,
        FuzzDecision::Decline => Decision::Decline,
        FuzzDecision::Flat => Decision::TuitionFlat,
        FuzzDecision::Percent => Decision::TuitionPercent,
        FuzzDecision::Bid(amount) => Decision::Bid(i64::from(amount)),
        FuzzDecision::Pass => Decision::Pass,
        FuzzDecision::Sell(pick) => holding_action(state, request, pick, true),
        FuzzDecision::Mortgage(pick) => holding_action(state, request, pick, false),
        FuzzDecision::Surrender => Decision::Liquidate(LiquidationAction::Surrender),
    }
}

/// Pick one of the acting player's titles for a liquidation answer.
fn holding_action(state: &GameState, request: &DecisionRequest, pick: u8, sell: bool) -> Decision {
    let actor = match *request {
        DecisionRequest::Liquidate { debtor, .. } => debtor,
        DecisionRequest::JailChoice { token, .. }
        | DecisionRequest::Purchase { token, .. }
        | DecisionRequest::Tuition { token, .. } => token,
        DecisionRequest::AuctionBid { bidder, .. } => bidder,
    };
    let Some(player) = state.get_player(actor) else {
        return Decision::Liquidate(LiquidationAction::Surrender);
    };
    if player.properties.is_empty() {
        return Decision::Liquidate(LiquidationAction::Surrender);
    }
    let name = player.properties[usize::from(pick) % player.properties.len()];
    let action = if sell {
        LiquidationAction::SellImprovement(name.to_string())
    } else {
        LiquidationAction::Mortgage(name.to_string())
    };
    Decision::Liquidate(action)
}
