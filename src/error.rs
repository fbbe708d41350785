use thiserror::Error;

/// A refused player action. The message is what the player sees; nothing about
/// the game state changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum Rejection {
    #[error("You can't do that while you're dead.")]
    Dead,
    #[error("Vault already used today. Come back tomorrow.")]
    VaultUsedToday,
    #[error("You need ${needed} on hand to deposit.")]
    NotEnoughToDeposit { needed: i64 },
    #[error("A content job is already running.")]
    JobAlreadyRunning,
    #[error("No content job running. Start one at the studio.")]
    NoJobRunning,
    #[error("Job still rendering: {remaining} left.")]
    JobNotReady { remaining: String },
    #[error("Get to the studio to start a content job.")]
    NotAtStudio,
    #[error("Not enough money (${needed}).")]
    NotEnoughMoney { needed: i64 },
    #[error("Too tired. Need {needed} stamina.")]
    NotEnoughStamina { needed: i64 },
    #[error("You've been evicted. The locks are changed.")]
    Evicted,
    #[error("Hand out the flyers at the park first.")]
    FlyersNotDelivered,
    #[error("The stage is dark. Shows run around 8PM.")]
    ShowClosed,
    #[error("Nothing to do here.")]
    NothingHere,
}
