//! Seams of the transport layer: controller driver, admission filter,
//! transmit modes and frame consumers.
pub mod can_controller;
pub mod consumer;
pub mod rx_filter;
pub mod transmit;
