//! The board: canonical square layout and per-property title state.

use crate::game::{Money, Token};

/// Number of squares on the board.
pub const BOARD_SIZE: u8 = 40;

/// Position of DC Tims Line, where jailed players sit.
pub const JAIL_POSITION: u8 = 10;

/// Highest improvement level an academic building can reach.
pub const MAX_IMPROVEMENTS: u8 = 5;

/// Purchase price of every residence.
pub const RESIDENCE_PRICE: Money = 200;

/// Purchase price of every gym.
pub const GYM_PRICE: Money = 150;

/// Monopoly block an academic building belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Block {
    /// AL, ML.
    Arts1,
    /// ECH, PAS, HH.
    Arts2,
    /// RCH, DWE, CPH.
    Engineering,
    /// LHI, BMH, OPT.
    Health,
    /// EV1, EV2, EV3.
    Environment,
    /// PHYS, B1, B2.
    Science1,
    /// EIT, ESC, C2.
    Science2,
    /// MC, DC.
    Math,
}

impl Block {
    /// All blocks, in board order.
    pub const ALL: [Block; 8] = [
        Block::Arts1,
        Block::Arts2,
        Block::Engineering,
        Block::Health,
        Block::Environment,
        Block::Science1,
        Block::Science2,
        Block::Math,
    ];

    /// Cost of one improvement for buildings in this block.
    #[must_use]
    pub const fn improvement_cost(self) -> Money {
        match self {
            Block::Arts1 | Block::Arts2 => 50,
            Block::Engineering | Block::Health => 100,
            Block::Environment | Block::Science1 => 150,
            Block::Science2 | Block::Math => 200,
        }
    }
}

/// What a square does when landed on, plus its static rent data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquareKind {
    /// Academic building: improvable, rent from a fixed six-entry table.
    Academic {
        /// Monopoly block this building belongs to.
        block: Block,
        /// Rent by improvement level 0..=5.
        rent: [Money; 6],
    },
    /// Residence: rent scales with how many the owner holds.
    Residence,
    /// Gym: rent is a multiple of the dice roll that landed here.
    Gym,
    /// COLLECT OSAP corner.
    CollectOsap,
    /// DC Tims Line corner: jail, or just visiting.
    DcTimsLine,
    /// Goose Nesting corner: nothing happens.
    GooseNesting,
    /// GO TO TIMS corner: sends the lander to DC Tims Line.
    GoToTims,
    /// Tuition: pay a flat fee or a share of net worth.
    Tuition,
    /// Coop fee: pay a fixed fee.
    CoopFee,
    /// Student Life Centre: random relocation.
    Slc,
    /// Needles Hall: random money event.
    NeedlesHall,
}

impl SquareKind {
    /// Whether squares of this kind can be bought and owned.
    #[must_use]
    pub const fn is_ownable(self) -> bool {
        matches!(
            self,
            SquareKind::Academic { .. } | SquareKind::Residence | SquareKind::Gym
        )
    }
}

/// A single square on the board.
///
/// Name, kind, and price come from the canonical layout. Owner, mortgage
/// flag, and improvement level are the mutable title state and are only
/// meaningful for ownable squares.
#[derive(Debug, Clone, Copy)]
pub struct Square {
    /// Display name. Unique among ownable squares only.
    pub name: &'static str,
    /// What the square is and does.
    pub kind: SquareKind,
    /// Purchase price (zero for action squares).
    pub price: Money,
    /// Current owner (None = bank).
    pub owner: Option<Token>,
    /// Whether the title is mortgaged.
    pub mortgaged: bool,
    /// Improvement level (academic buildings only).
    pub improvements: u8,
}

impl Square {
    const fn new(name: &'static str, kind: SquareKind, price: Money) -> Self {
        Self {
            name,
            kind,
            price,
            owner: None,
            mortgaged: false,
            improvements: 0,
        }
    }

    const fn academic(name: &'static str, block: Block, price: Money, rent: [Money; 6]) -> Self {
        Self::new(name, SquareKind::Academic { block, rent }, price)
    }

    const fn residence(name: &'static str) -> Self {
        Self::new(name, SquareKind::Residence, RESIDENCE_PRICE)
    }

    const fn gym(name: &'static str) -> Self {
        Self::new(name, SquareKind::Gym, GYM_PRICE)
    }

    const fn action(name: &'static str, kind: SquareKind) -> Self {
        Self::new(name, kind, 0)
    }

    /// Whether this square can be bought and owned.
    #[must_use]
    pub const fn is_ownable(&self) -> bool {
        self.kind.is_ownable()
    }

    /// Monopoly block, for academic buildings.
    #[must_use]
    pub const fn block(&self) -> Option<Block> {
        match self.kind {
            SquareKind::Academic { block, .. } => Some(block),
            _ => None,
        }
    }

    /// Rent table, for academic buildings.
    #[must_use]
    pub const fn rent_table(&self) -> Option<&[Money; 6]> {
        match &self.kind {
            SquareKind::Academic { rent, .. } => Some(rent),
            _ => None,
        }
    }

    /// Cost of one improvement here, for academic buildings.
    #[must_use]
    pub const fn improvement_cost(&self) -> Option<Money> {
        match self.block() {
            Some(block) => Some(block.improvement_cost()),
            None => None,
        }
    }

    /// Money credited when mortgaging: half the purchase price.
    #[must_use]
    pub const fn mortgage_value(&self) -> Money {
        self.price / 2
    }
}

/// The playing board.
#[derive(Debug, Clone)]
pub struct Board {
    /// Squares indexed by position.
    squares: Vec<Square>,
}

impl Board {
    /// Create a board with the canonical layout, every title held by the bank.
    #[must_use]
    pub fn new() -> Self {
        Self {
            squares: CANONICAL.to_vec(),
        }
    }

    /// Get the square at a position.
    #[must_use]
    pub fn square(&self, position: u8) -> Option<&Square> {
        self.squares.get(usize::from(position))
    }

    /// Get the square at a position, mutably.
    #[must_use]
    pub fn square_mut(&mut self, position: u8) -> Option<&mut Square> {
        self.squares.get_mut(usize::from(position))
    }

    /// Look up an ownable property by name.
    ///
    /// Action squares share names (there are three SLC squares) and cannot
    /// be looked up this way.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Square> {
        self.squares.iter().find(|s| s.is_ownable() && s.name == name)
    }

    /// Look up an ownable property by name, mutably.
    #[must_use]
    pub fn property_mut(&mut self, name: &str) -> Option<&mut Square> {
        self.squares
            .iter_mut()
            .find(|s| s.is_ownable() && s.name == name)
    }

    /// Position of an ownable property.
    #[must_use]
    pub fn property_position(&self, name: &str) -> Option<u8> {
        self.squares
            .iter()
            .position(|s| s.is_ownable() && s.name == name)
            .and_then(|i| u8::try_from(i).ok())
    }

    /// Iterate over all squares with their positions.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &Square)> {
        (0..BOARD_SIZE).map(|p| (p, &self.squares[usize::from(p)]))
    }

    /// Iterate over the properties owned by a player.
    pub fn owned_by(&self, token: Token) -> impl Iterator<Item = &Square> {
        self.squares.iter().filter(move |s| s.owner == Some(token))
    }

    /// Count residences owned by a player.
    #[must_use]
    pub fn residences_owned(&self, token: Token) -> usize {
        self.owned_by(token)
            .filter(|s| s.kind == SquareKind::Residence)
            .count()
    }

    /// Count gyms owned by a player.
    #[must_use]
    pub fn gyms_owned(&self, token: Token) -> usize {
        self.owned_by(token)
            .filter(|s| s.kind == SquareKind::Gym)
            .count()
    }

    /// Iterate over the academic buildings in a block.
    pub fn in_block(&self, block: Block) -> impl Iterator<Item = &Square> {
        self.squares.iter().filter(move |s| s.block() == Some(block))
    }

    /// Whether a player owns every building in a block.
    #[must_use]
    pub fn has_monopoly(&self, token: Token, block: Block) -> bool {
        self.in_block(block).all(|s| s.owner == Some(token))
    }

    /// Whether any building in a block carries improvements.
    #[must_use]
    pub fn block_improved(&self, block: Block) -> bool {
        self.in_block(block).any(|s| s.improvements > 0)
    }

    /// Whether any building in a block is mortgaged.
    #[must_use]
    pub fn block_mortgaged(&self, block: Block) -> bool {
        self.in_block(block).any(|s| s.mortgaged)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// The canonical Watopoly layout.
const CANONICAL: [Square; BOARD_SIZE as usize] = [
    Square::action("COLLECT OSAP", SquareKind::CollectOsap),
    Square::academic("AL", Block::Arts1, 40, [2, 10, 30, 90, 160, 250]),
    Square::action("SLC", SquareKind::Slc),
    Square::academic("ML", Block::Arts1, 60, [4, 20, 60, 180, 320, 450]),
    Square::action("TUITION", SquareKind::Tuition),
    Square::residence("MKV"),
    Square::academic("ECH", Block::Arts2, 100, [6, 30, 90, 270, 400, 550]),
    Square::action("NEEDLES HALL", SquareKind::NeedlesHall),
    Square::academic("PAS", Block::Arts2, 100, [6, 30, 90, 270, 400, 550]),
    Square::academic("HH", Block::Arts2, 120, [8, 40, 100, 300, 450, 600]),
    Square::action("DC TIMS LINE", SquareKind::DcTimsLine),
    Square::academic("RCH", Block::Engineering, 140, [10, 50, 150, 450, 625, 750]),
    Square::gym("PAC"),
    Square::academic("DWE", Block::Engineering, 140, [10, 50, 150, 450, 625, 750]),
    Square::academic("CPH", Block::Engineering, 160, [12, 60, 180, 500, 700, 900]),
    Square::residence("UWP"),
    Square::academic("LHI", Block::Health, 180, [14, 70, 200, 550, 750, 950]),
    Square::action("SLC", SquareKind::Slc),
    Square::academic("BMH", Block::Health, 180, [14, 70, 200, 550, 750, 950]),
    Square::academic("OPT", Block::Health, 200, [16, 80, 220, 600, 800, 1000]),
    Square::action("GOOSE NESTING", SquareKind::GooseNesting),
    Square::academic("EV1", Block::Environment, 220, [18, 90, 250, 700, 875, 1050]),
    Square::action("NEEDLES HALL", SquareKind::NeedlesHall),
    Square::academic("EV2", Block::Environment, 220, [18, 90, 250, 700, 875, 1050]),
    Square::academic("EV3", Block::Environment, 240, [20, 100, 300, 750, 925, 1100]),
    Square::residence("V1"),
    Square::academic("PHYS", Block::Science1, 260, [22, 110, 330, 800, 975, 1150]),
    Square::academic("B1", Block::Science1, 260, [22, 110, 330, 800, 975, 1150]),
    Square::gym("CIF"),
    Square::academic("B2", Block::Science1, 280, [24, 120, 360, 850, 1025, 1200]),
    Square::action("GO TO TIMS", SquareKind::GoToTims),
    Square::academic("EIT", Block::Science2, 300, [26, 130, 390, 900, 1100, 1275]),
    Square::academic("ESC", Block::Science2, 300, [26, 130, 390, 900, 1100, 1275]),
    Square::action("SLC", SquareKind::Slc),
    Square::academic("C2", Block::Science2, 320, [28, 150, 450, 1000, 1200, 1400]),
    Square::residence("REV"),
    Square::action("NEEDLES HALL", SquareKind::NeedlesHall),
    Square::academic("MC", Block::Math, 350, [35, 175, 500, 1100, 1300, 1500]),
    Square::action("COOP FEE", SquareKind::CoopFee),
    Square::academic("DC", Block::Math, 400, [50, 200, 600, 1400, 1700, 2000]),
];
