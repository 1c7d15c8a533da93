//! Core qrgate library (session gate, QR configuration, render/export pipeline).

pub mod config;
pub mod generator;
pub mod logging;
pub mod notify;
pub mod qr;
pub mod render;
pub mod session;
