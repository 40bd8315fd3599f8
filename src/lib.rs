//! Measurement overlay engine for lawn estimates.
//!
//! A host loads a raster image (typically a satellite photo), feeds raw pointer,
//! touch and wheel events into the engine, and reads back the geometry the user
//! has drawn: one calibration segment that maps surface pixels to a real-world
//! length, and any number of polygons outlining mowable area. From those the
//! engine derives total area and perimeter, which the pricing layer turns into
//! a bid. Rendering, image decoding and the surrounding UI belong to the host.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`input`] | Modes, host events and the gesture state machine types |
//! | [`view`] | Pan/zoom transform, render surface and coordinate conversions |
//! | [`geometry`] | Points, distances and polygon area/perimeter/center |
//! | [`calibration`] | Reference line, known length and derived scale factor |
//! | [`polygons`] | Committed polygons plus the polygon being drawn |
//! | [`hit`] | Screen-space hit-testing for vertices, endpoints and the length label |
//! | [`metrics`] | Real-world area/perimeter totals |
//! | [`estimate`] | Cost estimate from totals, rates and site complexity |
//! | [`snapshot`] | Serializable read-only view of engine state for the host |
//! | [`config`] | Engine tunables with environment overrides |
//! | [`consts`] | Shared numeric defaults (hit radii, zoom limits, thresholds) |

pub mod calibration;
pub mod config;
pub mod consts;
pub mod engine;
pub mod estimate;
pub mod geometry;
pub mod hit;
pub mod input;
pub mod metrics;
pub mod polygons;
pub mod snapshot;
pub mod view;
