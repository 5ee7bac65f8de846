#![no_main]

//! Economy operation fuzzer.
//!
//! Random sequences of transfers, improvements, mortgages, and trades must
//! either apply cleanly or be rejected without touching the books.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use watopoly::game::{
    check_invariants, degrade, improve, mortgage, propose_trade, respond_trade, transfer_estate,
    unmortgage, GameState, Money, Token, TradeSide,
};

const SEATS: [Token; 3] = ['G', 'B', 'D'];

/// A fuzzer-generated economy operation.
#[derive(Arbitrary, Debug, Clone, Copy)]
enum EconomyOp {
    /// Hand a bank title to a player.
    Assign { property: u8, seat: u8 },
    /// Buy one improvement.
    Improve { property: u8, seat: u8 },
    /// Sell one improvement.
    Degrade { property: u8, seat: u8 },
    /// Mortgage a title.
    Mortgage { property: u8, seat: u8 },
    /// Lift a mortgage.
    Unmortgage { property: u8, seat: u8 },
    /// Offer a title for cash and accept.
    TradeCash {
        from: u8,
        to: u8,
        property: u8,
        cash: u16,
    },
    /// Offer a title for cash and reject.
    TradeRejected {
        from: u8,
        to: u8,
        property: u8,
        cash: u16,
    },
    /// Grant cash so later purchases can succeed.
    Credit { seat: u8, amount: u16 },
    /// Retire a player, estate to the bank.
    Bankrupt { seat: u8 },
}

/// Structured input for economy fuzzing.
#[derive(Arbitrary, Debug)]
struct EconomyInput {
    /// RNG seed for the game.
    seed: u64,
    /// Operation sequence (capped).
    ops: Vec<EconomyOp>,
}

fuzz_target!(|input: EconomyInput| {
    let Ok(mut state) = GameState::new(
        input.seed,
        &[('G', "Goose"), ('B', "Bridge"), ('D', "Dome")],
    ) else {
        return;
    };
    let properties: Vec<&'static str> = state
        .board
        .iter()
        .filter(|(_, square)| square.is_ownable())
        .map(|(_, square)| square.name)
        .collect();

    for op in input.ops.into_iter().take(64) {
        apply_op(&mut state, &properties, op);
        let violations = check_invariants(&state);
        assert!(
            violations.is_empty(),
            "Invariants violated after {op:?}: {violations:?}"
        );
    }
});

/// Apply one fuzzer op through the public API, ignoring rejections.
fn apply_op(state: &mut GameState, properties: &[&'static str], op: EconomyOp) {
    match op {
        EconomyOp::Assign { property, seat } => {
            let name = pick(properties, property);
            let token = seat_token(seat);
            // keep the raw handoff itself consistent: no bankrupt owners,
            // no improved blocks split by the transfer
            let solvent = state.get_player(token).is_some_and(|p| !p.bankrupt);
            let block_clear = state.board.property(name).is_none_or(|square| {
                square.improvements == 0
                    && square
                        .block()
                        .is_none_or(|block| !state.board.block_improved(block))
            });
            if solvent && block_clear {
                let _ = state.transfer_property(name, Some(token));
            }
        }
        EconomyOp::Improve { property, seat } => {
            let _ = improve(state, seat_token(seat), pick(properties, property));
        }
        EconomyOp::Degrade { property, seat } => {
            let _ = degrade(state, seat_token(seat), pick(properties, property));
        }
        EconomyOp::Mortgage { property, seat } => {
            let _ = mortgage(state, seat_token(seat), pick(properties, property));
        }
        EconomyOp::Unmortgage { property, seat } => {
            let _ = unmortgage(state, seat_token(seat), pick(properties, property));
        }
        EconomyOp::TradeCash {
            from,
            to,
            property,
            cash,
        } => {
            trade(
                state,
                from,
                to,
                pick(properties, property),
                i64::from(cash),
                true,
            );
        }
        EconomyOp::TradeRejected {
            from,
            to,
            property,
            cash,
        } => {
            trade(
                state,
                from,
                to,
                pick(properties, property),
                i64::from(cash),
                false,
            );
        }
        EconomyOp::Credit { seat, amount } => {
            if let Some(player) = state.get_player_mut(seat_token(seat)) {
                player.credit(i64::from(amount));
            }
        }
        EconomyOp::Bankrupt { seat } => {
            let token = seat_token(seat);
            let solvent = state.get_player(token).is_some_and(|p| !p.bankrupt);
            // keep at least two players standing so later ops stay alive
            if solvent && state.solvent_players().count() > 2 {
                transfer_estate(state, token, None)
                    .expect("estate transfer to the bank must succeed");
            }
        }
    }
}

/// Offer `name` for cash between two seats and settle the response.
fn trade(state: &mut GameState, from: u8, to: u8, name: &str, cash: Money, accept: bool) {
    let giver = seat_token(from);
    let taker = seat_token(to);
    if let Ok(offer) = propose_trade(
        state,
        giver,
        taker,
        TradeSide::Property(name.to_string()),
        TradeSide::Cash(cash),
    ) {
        let _ = respond_trade(state, &offer, accept);
    }
}

fn seat_token(seat: u8) -> Token {
    SEATS[usize::from(seat) % SEATS.len()]
}

fn pick(properties: &[&'static str], index: u8) -> &'static str {
    properties[usize::from(index) % properties.len()]
}
