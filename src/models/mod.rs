// src/models/mod.rs

pub mod attempt;
pub mod definition;
pub mod question;
