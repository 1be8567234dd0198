//! viewfinder library crate.
//!
//! A live video capture controller: owns a capture session, selects and
//! switches between physical camera devices, streams decoded frames to a
//! registered observer as they become available, and exposes a live
//! preview handle for a hosting UI.

pub mod camera;
pub mod capture;
pub mod config;
pub mod preview;
pub mod registry;
