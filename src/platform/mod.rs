//! Platform abstraction layer
//!
//! Handles browser/native differences for key-value storage (LocalStorage on
//! web). Native builds have no LocalStorage; reads come back empty and writes
//! are dropped.

pub mod storage;
