pub mod export;
pub mod health;
pub mod instructor;
pub mod student;
