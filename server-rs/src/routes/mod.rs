pub mod boosts;
pub mod health;
pub mod likes;
pub mod limits;
