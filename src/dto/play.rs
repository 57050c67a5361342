use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::validation::validate_wallet_address,
    payments::TransferReceipt,
    state::{
        board::Card,
        inventory::{Inventory, PowerUpKind},
        session::SessionSnapshot,
        state_machine::{FlipOutcome, TurnPhase},
    },
};

/// Payload opening a new play for a wallet.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartPlayRequest {
    /// Wallet address of the player.
    pub user_id: String,
}

impl Validate for StartPlayRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_wallet_address(&self.user_id) {
            errors.add("user_id", e);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Card position to flip.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct FlipRequest {
    /// Position on the board, 0 to 15.
    #[validate(range(max = 15))]
    pub index: usize,
}

/// Payload for `POST /plays/{id}/powerups/use`.
///
/// Only stocked charges can be used here; a direct use always goes through a purchase.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UsePowerUpRequest {
    /// Power-up to spend from the inventory.
    pub kind: PowerUpKind,
}

/// Payload for `POST /plays/{id}/powerups/purchase`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PurchasePowerUpRequest {
    /// Power-up to buy.
    pub kind: PowerUpKind,
}

/// Card as exposed to clients; face-down cards hide their value.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    /// Position on the board.
    pub id: u8,
    /// Pair value, only sent while the card is face-up or matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<u8>,
    /// Whether the card is currently face-up.
    pub is_revealed: bool,
    /// Whether the card belongs to a found pair.
    pub is_matched: bool,
}

impl From<&Card> for CardView {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id,
            value: (card.is_revealed || card.is_matched).then_some(card.value),
            is_revealed: card.is_revealed,
            is_matched: card.is_matched,
        }
    }
}

/// Public state of a play.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaySnapshot {
    /// Play record the session is currently bound to.
    pub play_id: Uuid,
    /// Wallet address of the player.
    pub user_id: String,
    /// The 16 cards in board order.
    pub cards: Vec<CardView>,
    /// Turn phase derived from the board and locks.
    pub phase: TurnPhase,
    /// Whether the timer is running.
    pub is_running: bool,
    /// Whether every pair has been found.
    pub is_complete: bool,
    /// Time since the first flip, without penalties.
    pub elapsed_ms: u64,
    /// Accumulated power-up penalties.
    pub penalties_ms: u64,
    /// Elapsed time plus penalties.
    pub running_time_ms: u64,
    /// Whether the timer has been started.
    pub first_flip_happened: bool,
    /// Cards face-up in the current turn, 0 or 1.
    pub flips_this_turn: u8,
    /// Pairs found so far.
    pub pairs_matched: u8,
    /// In-memory power-up stock.
    pub inventory: Inventory,
    /// Whether flipping is unlocked.
    pub has_entry_paid: bool,
    /// Epoch milliseconds of the first flip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    /// Frozen once every pair is found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_time_ms: Option<u64>,
    /// Number of resets this session went through.
    pub generation: u64,
}

impl PlaySnapshot {
    /// Public view of `snapshot` for the given play.
    pub fn new(play_id: Uuid, user_id: &str, snapshot: &SessionSnapshot) -> Self {
        Self {
            play_id,
            user_id: user_id.to_owned(),
            cards: snapshot.cards.iter().map(CardView::from).collect(),
            phase: snapshot.phase,
            is_running: snapshot.is_running,
            is_complete: snapshot.is_complete,
            elapsed_ms: snapshot.elapsed_ms,
            penalties_ms: snapshot.penalties_ms,
            running_time_ms: snapshot.running_time_ms(),
            first_flip_happened: snapshot.first_flip_happened,
            flips_this_turn: snapshot.flips_this_turn,
            pairs_matched: snapshot.pairs_matched,
            inventory: snapshot.inventory,
            has_entry_paid: snapshot.has_entry_paid,
            started_at_ms: snapshot.started_at_ms,
            final_time_ms: snapshot.final_time_ms,
            generation: snapshot.generation,
        }
    }
}

/// Score accepted for a finished play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    /// Accepted final time, penalties included.
    pub final_time_ms: u64,
    /// Penalties derived from power-up usage.
    pub penalties_ms: u64,
}

/// What a flip did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FlipResult {
    /// Nothing changed.
    Ignored,
    /// First card of a turn turned face-up.
    Revealed,
    /// Second card completed a pair.
    Matched,
    /// Second card differs; the board is locked for the cooldown.
    Mismatched,
}

impl From<&FlipOutcome> for FlipResult {
    fn from(outcome: &FlipOutcome) -> Self {
        match outcome {
            FlipOutcome::Ignored => FlipResult::Ignored,
            FlipOutcome::Revealed { .. } => FlipResult::Revealed,
            FlipOutcome::Matched { .. } => FlipResult::Matched,
            FlipOutcome::Mismatched { .. } => FlipResult::Mismatched,
        }
    }
}

/// Response of `POST /plays/{id}/flip`.
#[derive(Debug, Serialize, ToSchema)]
pub struct FlipResponse {
    /// What the flip did.
    pub result: FlipResult,
    /// Present when this flip completed the board and the score was recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<ScoreSubmission>,
    /// State after the flip.
    pub play: PlaySnapshot,
}

/// Response of a power-up use.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PowerUpResponse {
    /// False when the use had no effect and no charge was spent.
    pub applied: bool,
    /// Penalty charged by this use.
    pub penalty_ms: u64,
    /// Present when this use completed the board and the score was recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<ScoreSubmission>,
    /// State after the use.
    pub play: PlaySnapshot,
}

/// Response of a power-up purchase.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    /// Settled payment.
    pub receipt: TransferReceipt,
    /// False when the charge went to the inventory.
    pub used_immediately: bool,
    /// Present when the immediate use completed the board.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<ScoreSubmission>,
    /// State after the purchase.
    pub play: PlaySnapshot,
}

/// Response of an entry fee payment.
#[derive(Debug, Serialize, ToSchema)]
pub struct EntryResponse {
    /// Settled entry fee.
    pub receipt: TransferReceipt,
    /// State with flipping unlocked.
    pub play: PlaySnapshot,
}
