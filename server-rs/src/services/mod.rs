pub mod boosts;
pub mod clock;
pub mod entitlements;
pub mod gate;
pub mod likes;
